//! Longest-match scanning of a single token.

use crate::{
    builtin::Builtin,
    dictionary::{Dictionary, Matcher, Token},
    error::{Error, Result},
};

/// Result of [`Dictionary::scan_next`].
#[derive(Clone, Copy, Debug)]
pub struct ScanStep<'d> {
    /// Where the token starts, after skipped layout.
    pub start: usize,
    /// Where scanning continues, `None` when nothing matched (`token` is then
    /// [`Builtin::Reserved`]).
    pub next: Option<usize>,
    pub token: &'d Token,
}

impl ScanStep<'_> {
    pub fn builtin(&self) -> Option<Builtin> {
        self.token.builtin()
    }
}

/// The layout token starting at the front of `rest`, with its length in bytes.
fn layout(rest: &str) -> Option<(Builtin, usize)> {
    let c = rest.chars().next()?;
    let layout = match c {
        '\t' => (Builtin::Tab, 1),
        '\r' if rest[1..].starts_with('\n') => (Builtin::Newline, 2),
        '\r' | '\n' => (Builtin::Newline, 1),
        c if c.is_whitespace() => (Builtin::Whitespace, c.len_utf8()),
        _ => return None,
    };
    Some(layout)
}

impl Dictionary {
    /// Scans one token of `text` at `start`, which must lie on a character boundary. Offsets past
    /// the end of `text` report [`Builtin::Finished`].
    ///
    /// Layout the configuration does not keep is skipped first; layout it does keep is returned
    /// as the corresponding built-in token. Otherwise every registered token is tried and the
    /// one consuming the most text wins, ties going to the token registered first.
    pub fn scan_next(&self, text: &str, start: usize) -> Result<ScanStep<'_>> {
        if !self.is_linked() {
            return Err(Error::NotLinked);
        }

        let mut position = start.min(text.len());
        if !text.is_char_boundary(position) {
            return Err(Error::NotCharBoundary { offset: start });
        }
        while let Some((builtin, len)) = layout(&text[position..]) {
            if self.config().keeps(builtin) {
                return Ok(ScanStep {
                    start: position,
                    next: Some(position + len),
                    token: self.builtin(builtin),
                });
            }
            position += len;
        }

        if position >= text.len() {
            return Ok(ScanStep {
                start: position,
                next: Some(position),
                token: self.builtin(Builtin::Finished),
            });
        }

        let mut best: Option<(usize, &Token)> = None;
        for token in self.tokens() {
            let Some(end) = self.capture_token(token, text, position)? else {
                continue;
            };
            // empty matches would never advance the scan
            if end <= position {
                continue;
            }
            if best.map_or(true, |(best_end, _)| end > best_end) {
                best = Some((end, token));
            }
        }

        let step = match best {
            Some((end, token)) => ScanStep {
                start: position,
                next: Some(end),
                token,
            },
            None => ScanStep {
                start: position,
                next: None,
                token: self.builtin(Builtin::Reserved),
            },
        };
        log::trace!(
            "Scanned `{}` at {}..{:?}",
            step.token.key(),
            step.start,
            step.next
        );
        Ok(step)
    }

    fn capture_token(&self, token: &Token, text: &str, start: usize) -> Result<Option<usize>> {
        match token.matcher() {
            Matcher::Expression(handle) => {
                self.expressions()
                    .capture(handle, text, start, text.len())
            }
            Matcher::Primitive(scan) => Ok(scan(text, start, text.len())),
            Matcher::None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::{ScanConfig, TokenDef};

    fn dictionary(rules: &[&str]) -> Dictionary {
        Dictionary::from_rules(rules).unwrap()
    }

    fn scan<'d>(dict: &'d Dictionary, text: &str, start: usize) -> (usize, Option<usize>, &'d str) {
        let step = dict.scan_next(text, start).unwrap();
        (step.start, step.next, step.token.key())
    }

    #[test]
    fn longest_match_wins() {
        let dict = dictionary(&["Short -> \"=\"", "Long -> \"==\""]);
        assert_eq!(scan(&dict, "==", 0), (0, Some(2), "Long"));
        assert_eq!(scan(&dict, "=x", 0), (0, Some(1), "Short"));
    }

    #[test]
    fn earliest_registration_wins_ties() {
        let dict = dictionary(&["KW_IF -> \"if\"", "Ident -> letter letter*"]);
        assert_eq!(scan(&dict, "if", 0), (0, Some(2), "KW_IF"));
        assert_eq!(scan(&dict, "iffy", 0), (0, Some(4), "Ident"));

        let dict = dictionary(&["Ident -> letter letter*", "KW_IF -> \"if\""]);
        assert_eq!(scan(&dict, "if", 0), (0, Some(2), "Ident"));
    }

    #[test]
    fn skips_layout() {
        let dict = dictionary(&["A -> \"a\""]);
        assert_eq!(scan(&dict, " \t\r\n\r a", 0), (6, Some(7), "A"));
        assert_eq!(scan(&dict, "a  ", 1), (3, Some(3), "finished"));
        assert_eq!(scan(&dict, "", 0), (0, Some(0), "finished"));
    }

    #[test]
    fn kept_layout_is_returned() {
        let mut dict = dictionary(&["A -> \"a\""]);
        *dict.config_mut() = ScanConfig {
            keep_newlines: true,
            ..Default::default()
        };
        assert_eq!(scan(&dict, " \t\r\na", 0), (2, Some(4), "newline"));
        assert_eq!(scan(&dict, "\ra", 0), (0, Some(1), "newline"));

        dict.config_mut().keep_tabs = true;
        assert_eq!(scan(&dict, " \ta", 0), (1, Some(2), "tab"));

        dict.config_mut().keep_whitespace = true;
        assert_eq!(scan(&dict, "\u{3000}a", 0), (0, Some(3), "whitespace"));
    }

    #[test]
    fn no_match_reports_reserved() {
        let dict = dictionary(&["A -> \"a\""]);
        let step = dict.scan_next("  ?", 0).unwrap();
        assert_eq!(step.start, 2);
        assert_eq!(step.next, None);
        assert_eq!(step.builtin(), Some(Builtin::Reserved));
        assert_eq!(step.token.code(), -4);
    }

    #[test]
    fn empty_matches_are_not_tokens() {
        let dict = dictionary(&["Maybe -> \"a\"*", "B -> \"b\""]);
        assert_eq!(scan(&dict, "b", 0), (0, Some(1), "B"));
        assert_eq!(scan(&dict, "c", 0), (0, None, "reserved"));
    }

    #[test]
    fn primitive_tokens() {
        let mut dict = Dictionary::new();
        dict.register(TokenDef::primitive("Any", |text, start, end| {
            text.get(start..end)?.chars().next().map(|c| start + c.len_utf8())
        }))
        .unwrap();
        dict.link().unwrap();
        assert_eq!(scan(&dict, "ü", 0), (0, Some(2), "Any"));
    }

    #[test]
    fn start_inside_a_character() {
        let dict = dictionary(&["A -> \"a\""]);
        assert_eq!(
            dict.scan_next("éa", 1).unwrap_err(),
            Error::NotCharBoundary { offset: 1 }
        );
        assert_eq!(scan(&dict, "éa", 2), (2, Some(3), "A"));
        assert_eq!(scan(&dict, "éa", 10), (3, Some(3), "finished"));
    }

    #[test]
    fn requires_linking() {
        let mut dict = Dictionary::new();
        dict.register(TokenDef::rule("A", "\"a\"")).unwrap();
        assert_eq!(dict.scan_next("a", 0).unwrap_err(), Error::NotLinked);
    }
}
