//! Tokens every dictionary has without registering them: the layout and sentinel tokens the
//! scanner reports, and the character classes rules can reference by name.
//!
//! `digit` is the ASCII digits only, `letter` and `alphanumeric` follow Unicode.

use crate::expr::ScanFn;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum CharacterClass {
    Digit,
    Letter,
    Alphanumeric,
}

impl CharacterClass {
    pub fn matches(self, c: char) -> bool {
        match self {
            CharacterClass::Digit => c.is_ascii_digit(),
            CharacterClass::Letter => c.is_alphabetic(),
            CharacterClass::Alphanumeric => c.is_alphanumeric(),
        }
    }
    pub fn scan_fn(self) -> ScanFn {
        match self {
            CharacterClass::Digit => scan_digit,
            CharacterClass::Letter => scan_letter,
            CharacterClass::Alphanumeric => scan_alphanumeric,
        }
    }
}

/// Consumes exactly one character of `class` at `start`, never reading past `end`.
fn scan_class(class: CharacterClass, text: &str, start: usize, end: usize) -> Option<usize> {
    if start >= end {
        return None;
    }
    let c = text.get(start..end)?.chars().next()?;
    match class.matches(c) {
        true => Some(start + c.len_utf8()),
        false => None,
    }
}

pub fn scan_digit(text: &str, start: usize, end: usize) -> Option<usize> {
    scan_class(CharacterClass::Digit, text, start, end)
}

pub fn scan_letter(text: &str, start: usize, end: usize) -> Option<usize> {
    scan_class(CharacterClass::Letter, text, start, end)
}

pub fn scan_alphanumeric(text: &str, start: usize, end: usize) -> Option<usize> {
    scan_class(CharacterClass::Alphanumeric, text, start, end)
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Builtin {
    Whitespace,
    Tab,
    Newline,
    /// Reported when nothing matches at the current position.
    Reserved,
    /// Reported at the end of the input.
    Finished,
    Digit,
    Letter,
    Alphanumeric,
}

impl Builtin {
    pub const ALL: [Builtin; 8] = [
        Builtin::Whitespace,
        Builtin::Tab,
        Builtin::Newline,
        Builtin::Reserved,
        Builtin::Finished,
        Builtin::Digit,
        Builtin::Letter,
        Builtin::Alphanumeric,
    ];

    /// Built-in codes are negative, registered tokens count up from zero.
    pub const fn code(self) -> i16 {
        -(self as i16) - 1
    }
    pub const fn key(self) -> &'static str {
        match self {
            Builtin::Whitespace => "whitespace",
            Builtin::Tab => "tab",
            Builtin::Newline => "newline",
            Builtin::Reserved => "reserved",
            Builtin::Finished => "finished",
            Builtin::Digit => "digit",
            Builtin::Letter => "letter",
            Builtin::Alphanumeric => "alphanumeric",
        }
    }
    pub fn from_code(code: i16) -> Option<Builtin> {
        Self::ALL.into_iter().find(|b| b.code() == code)
    }
    pub fn from_key(key: &str) -> Option<Builtin> {
        Self::ALL.into_iter().find(|b| b.key() == key)
    }
    pub fn class(self) -> Option<CharacterClass> {
        match self {
            Builtin::Digit => Some(CharacterClass::Digit),
            Builtin::Letter => Some(CharacterClass::Letter),
            Builtin::Alphanumeric => Some(CharacterClass::Alphanumeric),
            _ => None,
        }
    }
    /// Whitespace, tabs and newlines, which the scanner skips or reports depending on the
    /// dictionary configuration.
    pub fn is_layout(self) -> bool {
        matches!(self, Builtin::Whitespace | Builtin::Tab | Builtin::Newline)
    }
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}
