use std::fmt::{self, Display};

use crate::{
    builtin::Builtin,
    dictionary::{Dictionary, Token},
    error::{Error, Result},
    span::line_column,
};

/// A token produced by [`Dictionary::analyze`], with its text when the token keeps it.
#[derive(Clone, Debug)]
pub struct ScannedToken<'d> {
    token: &'d Token,
    text: Option<Box<str>>,
}

impl<'d> ScannedToken<'d> {
    pub fn key(&self) -> &'d str {
        self.token.key()
    }
    pub fn code(&self) -> i16 {
        self.token.code()
    }
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
    pub fn token(&self) -> &'d Token {
        self.token
    }
}

impl Display for ScannedToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.text {
            Some(text) => write!(f, "{} {}", self.key(), text),
            None => write!(f, "{}", self.key()),
        }
    }
}

/// Tokens in the order they were scanned.
#[derive(Clone, Default, Debug)]
pub struct TokenSequence<'d> {
    tokens: Vec<ScannedToken<'d>>,
}

impl<'d> TokenSequence<'d> {
    pub fn new() -> TokenSequence<'d> {
        TokenSequence { tokens: Vec::new() }
    }
    fn push(&mut self, token: &'d Token, text: Option<&str>) {
        self.tokens.push(ScannedToken {
            token,
            text: text.map(Into::into),
        });
    }
    pub fn iter(&self) -> std::slice::Iter<'_, ScannedToken<'d>> {
        self.tokens.iter()
    }
    pub fn len(&self) -> usize {
        self.tokens.len()
    }
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
    pub fn keys(&self) -> impl Iterator<Item = &'d str> + '_ {
        self.tokens.iter().map(ScannedToken::key)
    }
}

impl Display for TokenSequence<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{token}")?;
        }
        Ok(())
    }
}

impl<'d> IntoIterator for TokenSequence<'d> {
    type Item = ScannedToken<'d>;
    type IntoIter = std::vec::IntoIter<ScannedToken<'d>>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.into_iter()
    }
}

impl<'a, 'd> IntoIterator for &'a TokenSequence<'d> {
    type Item = &'a ScannedToken<'d>;
    type IntoIter = std::slice::Iter<'a, ScannedToken<'d>>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

impl Dictionary {
    /// Scans all of `text` into a token sequence, failing at the first position no token
    /// matches.
    pub fn analyze(&self, text: &str) -> Result<TokenSequence<'_>> {
        let mut sequence = TokenSequence::new();
        let mut position = 0;

        loop {
            let step = self.scan_next(text, position)?;
            let Some(next) = step.next else {
                let (line, column) = line_column(text, step.start);
                let found = text[step.start..]
                    .chars()
                    .next()
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                return Err(Error::Unscannable {
                    offset: step.start,
                    line,
                    column,
                    found,
                });
            };

            match step.builtin() {
                Some(Builtin::Finished) => break,
                Some(builtin) if builtin.is_layout() => {
                    if self.config().keeps(builtin) {
                        sequence.push(step.token, None);
                    }
                }
                _ => {
                    let text = step.token.keep_text().then(|| &text[step.start..next]);
                    sequence.push(step.token, text);
                }
            }
            position = next;
        }

        log::debug!("Analyzed {} bytes into {} tokens", text.len(), sequence.len());
        Ok(sequence)
    }
}

pub fn analyze<'d>(dictionary: &'d Dictionary, text: &str) -> Result<TokenSequence<'d>> {
    dictionary.analyze(text)
}

/// Builds a dictionary from rule lines and renders the analysis of `text`.
pub fn analyze_lines<I, S>(rules: I, text: &str) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let dictionary = Dictionary::from_rules(rules)?;
    let sequence = dictionary.analyze(text)?;
    Ok(sequence.to_string())
}

#[cfg(test)]
mod tests {
    use cranelift_entity::EntityRef;

    use super::*;
    use crate::dictionary::{ScanConfig, TokenId};

    const RULES: [&str; 4] = [
        "KW_IF -> \"if\"",
        "KW_DO -> \"do\"",
        "Number -> Digit Digit*",
        "Digit -> \"0\" | \"1\" | \"2\" | \"3\" | \"4\" | \"5\" | \"6\" | \"7\" | \"8\" | \"9\"",
    ];

    #[test]
    fn keywords_and_numbers() {
        let dict = Dictionary::from_rules(RULES).unwrap();
        let sequence = dict.analyze("if 1 do 1 2 3").unwrap();
        assert_eq!(
            sequence.to_string(),
            "KW_IF, Number, KW_DO, Number, Number, Number"
        );
        assert_eq!(sequence.len(), 6);
        let first = sequence.iter().next().unwrap();
        assert!(std::ptr::eq(first.token(), dict.token(TokenId::new(0))));
        assert_eq!(sequence.iter().map(ScannedToken::code).collect::<Vec<_>>(), [0, 2, 1, 2, 2, 2]);
    }

    #[test]
    fn kept_text() {
        let mut rules = RULES;
        rules[2] = "!Number -> Digit Digit*";
        let rendered = analyze_lines(rules, "if 12 do 3").unwrap();
        assert_eq!(rendered, "KW_IF, Number 12, KW_DO, Number 3");
    }

    #[test]
    fn longest_match_then_registration_order() {
        let dict = Dictionary::from_rules([
            "KW_IF -> \"if\"",
            "!Ident -> letter alphanumeric*",
            "Assign -> \"=\"",
            "Eq -> \"==\"",
        ])
        .unwrap();
        let sequence = analyze(&dict, "if iffy == x=if").unwrap();
        assert_eq!(
            sequence.to_string(),
            "KW_IF, Ident iffy, Eq, Ident x, Assign, KW_IF"
        );
    }

    #[test]
    fn only_newlines_are_kept() {
        let dict = Dictionary::from_rules(["A -> \"a\"", "B -> \"b\"", "C -> \"c\""])
            .unwrap()
            .with_config(ScanConfig {
                keep_newlines: true,
                ..Default::default()
            });
        let sequence = dict.analyze("a\tb\nc").unwrap();
        assert_eq!(sequence.keys().collect::<Vec<_>>(), ["A", "B", "newline", "C"]);
        assert_eq!(sequence.iter().nth(2).unwrap().code(), -3);
    }

    #[test]
    fn empty_and_blank_input() {
        let dict = Dictionary::from_rules(RULES).unwrap();
        assert!(dict.analyze("").unwrap().is_empty());
        assert!(dict.analyze(" \t\r\n ").unwrap().is_empty());
    }

    #[test]
    fn unscannable_position() {
        let dict = Dictionary::from_rules(RULES).unwrap();
        let err = dict.analyze("if 1\ndo ?").unwrap_err();
        assert_eq!(
            err,
            Error::Unscannable {
                offset: 8,
                line: 2,
                column: 4,
                found: '?'
            }
        );
    }

    #[test]
    fn owned_iteration() {
        let dict = Dictionary::from_rules(["!W -> letter letter*"]).unwrap();
        let texts: Vec<_> = dict
            .analyze("ab cd")
            .unwrap()
            .into_iter()
            .map(|token| token.text().unwrap().to_owned())
            .collect();
        assert_eq!(texts, ["ab", "cd"]);
    }

    #[test]
    fn dictionary_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Dictionary>();
        assert_send_sync::<TokenSequence<'static>>();
    }
}
