//! The token dictionary: named, coded tokens in registration order.
//!
//! Rule files contain one token per line:
//!
//! ```text
//! KW_IF -> "if"
//! !Number -> Digit Digit*
//! Digit -> "0" | "1" | "2" | "3" | "4" | "5" | "6" | "7" | "8" | "9"
//! ```
//!
//! A leading `!` keeps the scanned text of the token in the token sequence, otherwise only the
//! fact that the token matched is recorded.

use std::collections::HashMap;

use cranelift_entity::{entity_impl, EntityRef, PrimaryMap};
use serde::{Deserialize, Serialize};

use crate::{
    builtin::Builtin,
    error::{Error, LineError, Result},
    expr::{ExprHandle, Expression, ExpressionSet, ScanFn, Target},
    link::Lookup,
};

/// Index of a registered token, equal to its code.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct TokenId(u32);

entity_impl! { TokenId }

#[derive(Clone, Copy, Debug)]
pub enum Matcher {
    Expression(ExprHandle),
    Primitive(ScanFn),
    /// Sentinels and empty tokens, never produced by scanning a registered rule.
    None,
}

#[derive(Clone, Debug)]
pub struct Token {
    key: Box<str>,
    code: i16,
    matcher: Matcher,
    keep_text: bool,
}

impl Token {
    pub fn key(&self) -> &str {
        &self.key
    }
    pub fn code(&self) -> i16 {
        self.code
    }
    pub fn matcher(&self) -> Matcher {
        self.matcher
    }
    /// Whether scanning stores the matched substring alongside this token.
    pub fn keep_text(&self) -> bool {
        self.keep_text
    }
    pub fn builtin(&self) -> Option<Builtin> {
        match self.code < 0 {
            true => Builtin::from_code(self.code),
            false => None,
        }
    }
    fn from_builtin(builtin: Builtin) -> Token {
        let matcher = match builtin.class() {
            Some(class) => Matcher::Primitive(class.scan_fn()),
            None => Matcher::None,
        };
        Token {
            key: builtin.key().into(),
            code: builtin.code(),
            matcher,
            keep_text: false,
        }
    }
}

#[derive(Clone, Debug)]
enum TokenBody {
    Rule(String),
    Primitive(ScanFn),
    Empty,
}

/// A token about to be registered. The dictionary assigns its code.
#[derive(Clone, Debug)]
pub struct TokenDef {
    key: String,
    body: TokenBody,
    keep_text: bool,
}

impl TokenDef {
    pub fn rule(key: impl Into<String>, rule: impl Into<String>) -> TokenDef {
        Self::new(key.into(), TokenBody::Rule(rule.into()))
    }
    pub fn primitive(key: impl Into<String>, scan: ScanFn) -> TokenDef {
        Self::new(key.into(), TokenBody::Primitive(scan))
    }
    /// A token without scanning support.
    pub fn empty(key: impl Into<String>) -> TokenDef {
        Self::new(key.into(), TokenBody::Empty)
    }
    pub fn keep_text(mut self, keep: bool) -> TokenDef {
        self.keep_text = keep;
        self
    }
    fn new(key: String, body: TokenBody) -> TokenDef {
        TokenDef {
            key,
            body,
            keep_text: false,
        }
    }
}

/// Which layout characters are reported as tokens instead of being skipped.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub keep_whitespace: bool,
    pub keep_tabs: bool,
    pub keep_newlines: bool,
}

impl ScanConfig {
    pub fn keeps(&self, builtin: Builtin) -> bool {
        match builtin {
            Builtin::Whitespace => self.keep_whitespace,
            Builtin::Tab => self.keep_tabs,
            Builtin::Newline => self.keep_newlines,
            _ => false,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DictionaryState {
    /// Tokens were registered since the last link, references may be unresolved.
    Building,
    Linked,
}

#[derive(Clone, Debug)]
pub struct Dictionary {
    tokens: PrimaryMap<TokenId, Token>,
    by_key: HashMap<Box<str>, TokenId>,
    builtins: Vec<Token>,
    expressions: ExpressionSet,
    config: ScanConfig,
    state: DictionaryState,
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

/// A rule-file line split into its parts.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RuleLine<'a> {
    pub key: &'a str,
    pub rule: &'a str,
    pub keep_text: bool,
}

impl<'a> RuleLine<'a> {
    /// Splits `[!]KEY -> RULE`. Returns `None` for blank lines.
    pub fn parse(line: &'a str) -> Result<Option<RuleLine<'a>>, LineError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (head, rule) = line.split_once("->").ok_or(LineError::MissingArrow)?;
        let head = head.trim();
        let (keep_text, key) = match head.strip_prefix('!') {
            Some(key) => (true, key.trim_start()),
            None => (false, head),
        };

        if key.is_empty() {
            return Err(LineError::EmptyKey);
        }
        if key.contains(char::is_whitespace) {
            return Err(LineError::MultiWordKey);
        }

        Ok(Some(RuleLine {
            key,
            rule: rule.trim(),
            keep_text,
        }))
    }
}

impl Dictionary {
    pub fn new() -> Dictionary {
        Dictionary {
            tokens: PrimaryMap::new(),
            by_key: HashMap::new(),
            builtins: Builtin::ALL.into_iter().map(Token::from_builtin).collect(),
            expressions: ExpressionSet::new(),
            config: ScanConfig::default(),
            state: DictionaryState::Building,
        }
    }

    pub fn with_config(mut self, config: ScanConfig) -> Dictionary {
        self.config = config;
        self
    }

    /// Imports and links the rule lines.
    pub fn from_rules<I, S>(lines: I) -> Result<Dictionary>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut this = Dictionary::new();
        this.import(lines)?;
        this.link()?;
        Ok(this)
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ScanConfig {
        &mut self.config
    }

    pub fn state(&self) -> DictionaryState {
        self.state
    }

    pub fn is_linked(&self) -> bool {
        self.state == DictionaryState::Linked
    }

    /// Adds a token, its code is the number of tokens registered before it.
    pub fn register(&mut self, def: TokenDef) -> Result<TokenId> {
        let TokenDef {
            key,
            body,
            keep_text,
        } = def;

        if self.by_key.contains_key(key.as_str()) || Builtin::from_key(&key).is_some() {
            return Err(Error::DuplicateKey { key });
        }
        let code = i16::try_from(self.tokens.len()).map_err(|_| Error::TooManyTokens)?;

        let matcher = match body {
            TokenBody::Rule(rule) => Matcher::Expression(self.expressions.define(&key, &rule)?),
            TokenBody::Primitive(scan) => Matcher::Primitive(scan),
            TokenBody::Empty => Matcher::None,
        };

        let id = self.tokens.push(Token {
            key: key.as_str().into(),
            code,
            matcher,
            keep_text,
        });
        self.by_key.insert(key.into_boxed_str(), id);
        self.state = DictionaryState::Building;

        log::debug!("Registered token `{}` with code {code}", self.tokens[id].key());
        Ok(id)
    }

    /// Registers a token for every `[!]KEY -> RULE` line, skipping blank lines. Stops at the
    /// first malformed line or rule.
    pub fn import<I, S>(&mut self, lines: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut count = 0;
        for (index, line) in lines.into_iter().enumerate() {
            let line = line.as_ref();
            let parsed = RuleLine::parse(line).map_err(|reason| Error::MalformedLine {
                line: index + 1,
                text: line.to_owned(),
                reason,
            })?;
            let Some(RuleLine {
                key,
                rule,
                keep_text,
            }) = parsed
            else {
                continue;
            };

            self.register(TokenDef::rule(key, rule).keep_text(keep_text))?;
            count += 1;
        }
        log::debug!("Imported {count} tokens");
        Ok(count)
    }

    /// Resolves the references of every rule to the tokens of this dictionary, falling back to
    /// the built-in character classes.
    pub fn link(&mut self) -> Result<()> {
        let tokens = &self.tokens;
        let by_key = &self.by_key;

        self.expressions.link_with(|key| match by_key.get(key) {
            Some(&id) => match tokens[id].matcher {
                Matcher::Expression(handle) => Lookup::Found(Target::Expression(handle)),
                Matcher::Primitive(scan) => Lookup::Found(Target::Primitive(scan)),
                Matcher::None => Lookup::NotScannable,
            },
            None => Lookup::builtin(key),
        })?;

        self.state = DictionaryState::Linked;
        Ok(())
    }

    pub fn lookup_by_key(&self, key: &str) -> Result<&Token> {
        if let Some(&id) = self.by_key.get(key) {
            return Ok(&self.tokens[id]);
        }
        match Builtin::from_key(key) {
            Some(builtin) => Ok(self.builtin(builtin)),
            None => Err(Error::UnknownKey {
                key: key.to_owned(),
            }),
        }
    }

    pub fn lookup_by_code(&self, code: i16) -> Result<&Token> {
        let token = match usize::try_from(code) {
            Ok(index) => self.tokens.get(TokenId::new(index)),
            Err(_) => Builtin::from_code(code).map(|b| self.builtin(b)),
        };
        token.ok_or(Error::UnknownCode { code })
    }

    pub fn token(&self, id: TokenId) -> &Token {
        &self.tokens[id]
    }

    pub fn builtin(&self, builtin: Builtin) -> &Token {
        &self.builtins[builtin.index()]
    }

    /// Registered tokens in registration order.
    pub fn tokens(&self) -> impl ExactSizeIterator<Item = &Token> + '_ {
        self.tokens.values()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The compiled expression behind a token, `None` for tokens without one.
    pub fn expression(&self, key: &str) -> Result<Option<&Expression>> {
        match self.lookup_by_key(key)?.matcher {
            Matcher::Expression(handle) => Ok(self.expressions.get(handle)),
            Matcher::Primitive(_) | Matcher::None => Ok(None),
        }
    }

    pub fn expressions(&self) -> &ExpressionSet {
        &self.expressions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{builtin::scan_letter, error::RuleError};

    #[test]
    fn codes_follow_registration_order() {
        let mut dict = Dictionary::new();
        dict.register(TokenDef::rule("KW_IF", "\"if\"")).unwrap();
        dict.register(TokenDef::rule("KW_DO", "\"do\"")).unwrap();
        dict.register(TokenDef::empty("EOF")).unwrap();

        assert_eq!(dict.lookup_by_key("KW_IF").unwrap().code(), 0);
        assert_eq!(dict.lookup_by_key("KW_DO").unwrap().code(), 1);
        assert_eq!(dict.lookup_by_code(2).unwrap().key(), "EOF");

        let keys: Vec<_> = dict.tokens().map(Token::key).collect();
        assert_eq!(keys, ["KW_IF", "KW_DO", "EOF"]);
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let mut dict = Dictionary::new();
        dict.register(TokenDef::rule("A", "\"a\"")).unwrap();
        let err = dict.register(TokenDef::rule("A", "\"b\"")).unwrap_err();
        assert_eq!(err, Error::DuplicateKey { key: "A".into() });

        let err = dict.register(TokenDef::empty("digit")).unwrap_err();
        assert_eq!(err, Error::DuplicateKey { key: "digit".into() });
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn lookups() {
        let dict = Dictionary::new();
        assert_eq!(dict.lookup_by_key("newline").unwrap().code(), -3);
        assert_eq!(dict.lookup_by_code(-5).unwrap().key(), "finished");
        assert_eq!(
            dict.lookup_by_key("nope").unwrap_err(),
            Error::UnknownKey { key: "nope".into() }
        );
        assert_eq!(
            dict.lookup_by_code(0).unwrap_err(),
            Error::UnknownCode { code: 0 }
        );
        assert_eq!(
            dict.lookup_by_code(-100).unwrap_err(),
            Error::UnknownCode { code: -100 }
        );
    }

    #[test]
    fn rule_lines() {
        let line = RuleLine::parse("  !Number -> Digit Digit* ").unwrap().unwrap();
        assert_eq!(
            line,
            RuleLine {
                key: "Number",
                rule: "Digit Digit*",
                keep_text: true
            }
        );

        let line = RuleLine::parse("ARROW -> \"->\"").unwrap().unwrap();
        assert_eq!(line.key, "ARROW");
        assert_eq!(line.rule, "\"->\"");
        assert!(!line.keep_text);

        assert_eq!(RuleLine::parse("   \t").unwrap(), None);
        assert_eq!(RuleLine::parse("A \"a\""), Err(LineError::MissingArrow));
        assert_eq!(RuleLine::parse("BAD KEY -> \"x\""), Err(LineError::MultiWordKey));
        assert_eq!(RuleLine::parse("! -> \"x\""), Err(LineError::EmptyKey));
    }

    #[test]
    fn import_reports_the_offending_line() {
        let mut dict = Dictionary::new();
        let err = dict
            .import(["A -> \"a\"", "", "BAD KEY -> \"x\""])
            .unwrap_err();
        assert_eq!(
            err,
            Error::MalformedLine {
                line: 3,
                text: "BAD KEY -> \"x\"".into(),
                reason: LineError::MultiWordKey
            }
        );

        let err = Dictionary::from_rules(["NoArrow"]).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedLine {
                line: 1,
                reason: LineError::MissingArrow,
                ..
            }
        ));
    }

    #[test]
    fn import_reports_rule_errors() {
        let err = Dictionary::from_rules(["Star -> * \"a\""]).unwrap_err();
        let Error::Rule { key, error } = err else {
            panic!("expected rule error");
        };
        assert_eq!(key, "Star");
        assert_eq!(error.inner, RuleError::DanglingStar);
    }

    #[test]
    fn linking_state() {
        let mut dict = Dictionary::new();
        assert_eq!(dict.state(), DictionaryState::Building);

        dict.import(["Ident -> Start letter*", "Start -> \"_\" | letter"])
            .unwrap();
        dict.link().unwrap();
        assert!(dict.is_linked());

        dict.register(TokenDef::primitive("Letter", scan_letter))
            .unwrap();
        assert_eq!(dict.state(), DictionaryState::Building);
        dict.link().unwrap();
        assert!(dict.is_linked());
    }

    #[test]
    fn references_to_primitive_and_empty_tokens() {
        let mut dict = Dictionary::new();
        dict.register(TokenDef::primitive("L", scan_letter)).unwrap();
        dict.register(TokenDef::rule("Word", "L L*")).unwrap();
        dict.link().unwrap();

        let word = dict.expression("Word").unwrap().unwrap();
        assert_eq!(word.capture_all(dict.expressions(), "ab1").unwrap(), Some(2));
        assert!(dict.expression("L").unwrap().is_none());

        let mut dict = Dictionary::new();
        dict.register(TokenDef::empty("Nothing")).unwrap();
        dict.register(TokenDef::rule("Uses", "Nothing")).unwrap();
        assert_eq!(
            dict.link().unwrap_err(),
            Error::NoMatcher {
                expression: "Uses".into(),
                reference: "Nothing".into()
            }
        );
    }

    #[test]
    fn tokens_reference_builtin_classes() {
        let dict = Dictionary::from_rules(["Digit -> digit", "Number -> Digit Digit*"]).unwrap();
        let number = dict.expression("Number").unwrap().unwrap();
        assert_eq!(
            number.capture_all(dict.expressions(), "123x").unwrap(),
            Some(3)
        );
    }

    #[test]
    fn config_defaults() {
        let config: ScanConfig = Default::default();
        assert!(!config.keep_whitespace && !config.keep_tabs && !config.keep_newlines);
        assert!(!config.keeps(Builtin::Reserved));

        let dict = Dictionary::new().with_config(ScanConfig {
            keep_newlines: true,
            ..Default::default()
        });
        assert!(dict.config().keeps(Builtin::Newline));
        assert!(!dict.config().keeps(Builtin::Tab));
    }
}
