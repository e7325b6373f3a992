//! Rule-driven lexical analysis.
//!
//! Tokens are declared as `KEY -> RULE` lines where a rule is built from quoted literals,
//! references to other tokens or built-in character classes (`digit`, `letter`,
//! `alphanumeric`), juxtaposition, `|` alternation, `*` repetition and parenthesized groups.
//! Scanning picks the longest match among all tokens at each position.
//!
//! ```
//! let dictionary = lexicon::Dictionary::from_rules([
//!     "KW_IF -> \"if\"",
//!     "!Number -> digit digit*",
//! ])
//! .unwrap();
//! let tokens = dictionary.analyze("if 42").unwrap();
//! assert_eq!(tokens.to_string(), "KW_IF, Number 42");
//! ```

pub mod builtin;
pub mod dictionary;
pub mod error;
pub mod expr;
pub mod link;
pub mod scan;
pub mod sequence;
pub mod span;

pub use builtin::{Builtin, CharacterClass};
pub use dictionary::{Dictionary, DictionaryState, ScanConfig, Token, TokenDef, TokenId};
pub use error::{Error, Result};
pub use expr::{ExprHandle, Expression, ExpressionSet, ScanFn};
pub use scan::ScanStep;
pub use sequence::{analyze, analyze_lines, ScannedToken, TokenSequence};
