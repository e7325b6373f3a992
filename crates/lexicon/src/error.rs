use std::{error, fmt};

use crate::span::Spanned;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Problems found while compiling a single rule.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RuleError {
    /// `*` with no token or group before it.
    DanglingStar,
    UnterminatedLiteral,
    /// A `)` without its `(` or the other way around.
    UnbalancedGroup,
    /// The rule, one of its alternatives or one of its groups has no elements.
    EmptyRule,
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            RuleError::DanglingStar => "'*' is not placed after a token or group",
            RuleError::UnterminatedLiteral => "unterminated string literal",
            RuleError::UnbalancedGroup => "unbalanced parentheses",
            RuleError::EmptyRule => "empty rule",
        };
        f.write_str(message)
    }
}

/// Why a rule-file line could not be split into a key and a rule.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LineError {
    MissingArrow,
    EmptyKey,
    MultiWordKey,
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            LineError::MissingArrow => "expected `KEY -> RULE`",
            LineError::EmptyKey => "missing token key",
            LineError::MultiWordKey => "token key must be a single word",
        };
        f.write_str(message)
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Error {
    DuplicateKey {
        key: String,
    },
    /// Token codes are `i16` and the registry ran out of them.
    TooManyTokens,
    MalformedLine {
        /// 1-based line number.
        line: usize,
        text: String,
        reason: LineError,
    },
    Rule {
        key: String,
        error: Spanned<RuleError>,
    },
    UnknownKey {
        key: String,
    },
    UnknownCode {
        code: i16,
    },
    /// A reference names neither a token nor a built-in character class.
    UnresolvedReference {
        expression: String,
        reference: String,
    },
    /// A reference names a token that has nothing to match with.
    NoMatcher {
        expression: String,
        reference: String,
    },
    /// A reference was evaluated before its expression was linked.
    Unlinked {
        reference: String,
    },
    /// The dictionary changed since the last `link`.
    NotLinked,
    /// A scan was started inside a multi-byte character.
    NotCharBoundary {
        offset: usize,
    },
    Unscannable {
        offset: usize,
        line: usize,
        column: usize,
        found: char,
    },
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DuplicateKey { key } => {
                write!(f, "Dictionary already contains token `{key}`")
            }
            Error::TooManyTokens => write!(f, "Dictionary cannot hold more than {} tokens", i16::MAX),
            Error::MalformedLine { line, text, reason } => {
                write!(f, "Line {line}: {reason}\n  {text}")
            }
            Error::Rule { key, error } => {
                write!(f, "Rule `{key}` at {}: {}", error.span, error.inner)
            }
            Error::UnknownKey { key } => write!(f, "Unexpected key `{key}`"),
            Error::UnknownCode { code } => write!(f, "Unexpected code {code}"),
            Error::UnresolvedReference {
                expression,
                reference,
            } => {
                write!(f, "Expression `{expression}` references unknown `{reference}`")
            }
            Error::NoMatcher {
                expression,
                reference,
            } => {
                write!(
                    f,
                    "Expression `{expression}` references `{reference}` which cannot be scanned"
                )
            }
            Error::Unlinked { reference } => {
                write!(f, "Expression requires linking, `{reference}` is unresolved")
            }
            Error::NotLinked => write!(f, "Dictionary must be linked before scanning"),
            Error::NotCharBoundary { offset } => {
                write!(f, "Offset {offset} is not on a character boundary")
            }
            Error::Unscannable {
                offset,
                line,
                column,
                found,
            } => {
                write!(
                    f,
                    "Unable to find scannable token at {line}:{column} (offset {offset}), found {found:?}"
                )
            }
        }
    }
}
