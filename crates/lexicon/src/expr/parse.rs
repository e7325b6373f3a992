//! Rule text to [`Node`] tree.
//!
//! Parsing happens in two passes over the same quote/bracket state machine. The first pass
//! splits the rule on `|` outside of strings and groups; if it finds any, every alternative is
//! parsed again as a rule of its own. Otherwise the second pass splits the rule into sequence
//! elements on whitespace and `*`, recursing into each top-level group.

use crate::{
    error::RuleError,
    span::{Span, Spanned},
};

use super::{Element, ExprHandle, Node, Reference, Target};

type ParseResult<T> = Result<T, Spanned<RuleError>>;

/// Where we are relative to string literals.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Quote {
    Outside,
    String,
    /// Right after a backslash.
    Escape,
    /// Inside `\uXXXX`, counting the hex digits still to come.
    Unicode(u8),
}

impl Quote {
    fn advance(self, c: char) -> Quote {
        match self {
            Quote::Outside => match c {
                '"' => Quote::String,
                _ => Quote::Outside,
            },
            Quote::String => match c {
                '"' => Quote::Outside,
                '\\' => Quote::Escape,
                _ => Quote::String,
            },
            Quote::Escape => match c {
                'u' => Quote::Unicode(4),
                _ => Quote::String,
            },
            Quote::Unicode(1) => Quote::String,
            Quote::Unicode(n) => Quote::Unicode(n - 1),
        }
    }
}

struct RuleCx<'a> {
    /// Key of the expression being compiled, references to it resolve to `this`.
    key: &'a str,
    this: ExprHandle,
}

pub(super) fn parse_rule(key: &str, this: ExprHandle, rule: &str) -> ParseResult<Node> {
    let cx = RuleCx { key, this };
    cx.parse(rule, 0)
}

fn error(error: RuleError, span: Span) -> Spanned<RuleError> {
    Spanned::new(error, span)
}

fn span(offset: usize, range: std::ops::Range<usize>) -> Span {
    Span::from_range(offset + range.start..offset + range.end)
}

/// Strips surrounding whitespace, returning the remainder and how far it starts into `text`.
fn trim_with_offset(text: &str) -> (usize, &str) {
    let start = text.len() - text.trim_start().len();
    (start, text.trim())
}

impl RuleCx<'_> {
    /// `offset` is the position of `rule` inside the outermost rule, for error spans.
    fn parse(&self, rule: &str, offset: usize) -> ParseResult<Node> {
        let alternatives = split_alternatives(rule, offset)?;
        if alternatives.len() == 1 {
            return self.parse_sequence(rule, offset);
        }

        let mut nodes = Vec::with_capacity(alternatives.len());
        for (start, alternative) in alternatives {
            let (trimmed_start, trimmed) = trim_with_offset(alternative);
            let start = start + trimmed_start;
            if trimmed.is_empty() {
                return Err(error(RuleError::EmptyRule, span(offset, start..start)));
            }
            nodes.push(self.parse(trimmed, offset + start)?);
        }
        Ok(Node::Alternation(nodes))
    }

    fn parse_sequence(&self, rule: &str, offset: usize) -> ParseResult<Node> {
        let mut elements: Vec<Element> = Vec::new();
        let mut quote = Quote::Outside;
        let mut depth = 0u32;

        // start of the identifier being read
        let mut word: Option<usize> = None;
        // start of the contents of the current string literal or top-level group
        let mut opened = 0;

        let push = |elements: &mut Vec<Element>, node: Node| {
            elements.push(Element {
                node,
                repeat: false,
            })
        };

        for (i, c) in rule.char_indices() {
            match quote {
                Quote::Outside if depth == 0 => {
                    if c.is_whitespace() || matches!(c, '*' | '"' | '(' | ')') {
                        if let Some(start) = word.take() {
                            push(&mut elements, self.reference(&rule[start..i]));
                        }
                    }
                    match c {
                        '*' => match elements.last_mut() {
                            Some(last) => last.repeat = true,
                            None => {
                                return Err(error(RuleError::DanglingStar, span(offset, i..i + 1)))
                            }
                        },
                        '"' => opened = i + 1,
                        '(' => {
                            depth = 1;
                            opened = i + 1;
                        }
                        ')' => {
                            return Err(error(RuleError::UnbalancedGroup, span(offset, i..i + 1)))
                        }
                        c if c.is_whitespace() => {}
                        _ => {
                            word.get_or_insert(i);
                        }
                    }
                }
                Quote::Outside => match c {
                    '(' => depth += 1,
                    ')' => {
                        depth -= 1;
                        if depth == 0 {
                            let (trimmed_start, group) = trim_with_offset(&rule[opened..i]);
                            let group_offset = offset + opened + trimmed_start;
                            if group.is_empty() {
                                return Err(error(
                                    RuleError::EmptyRule,
                                    span(offset, opened - 1..i + 1),
                                ));
                            }
                            push(&mut elements, self.parse(group, group_offset)?);
                        }
                    }
                    _ => {}
                },
                Quote::String if c == '"' && depth == 0 => {
                    push(&mut elements, Node::Literal(rule[opened..i].into()));
                }
                _ => {}
            }
            quote = quote.advance(c);
        }

        if quote != Quote::Outside {
            // `opened` is the start of the innermost top-level construct, good enough to point at
            let start = opened.saturating_sub(1);
            return Err(error(
                RuleError::UnterminatedLiteral,
                span(offset, start..rule.len()),
            ));
        }
        if depth != 0 {
            return Err(error(
                RuleError::UnbalancedGroup,
                span(offset, opened - 1..rule.len()),
            ));
        }
        if let Some(start) = word {
            push(&mut elements, self.reference(&rule[start..]));
        }

        match elements.len() {
            0 => Err(error(RuleError::EmptyRule, span(offset, 0..rule.len()))),
            1 if !elements[0].repeat => Ok(elements.remove(0).node),
            _ => Ok(Node::Sequence(elements)),
        }
    }

    fn reference(&self, key: &str) -> Node {
        let reference = match key == self.key {
            true => Reference::resolved(key, Target::Expression(self.this)),
            false => Reference::unresolved(key),
        };
        Node::Reference(reference)
    }
}

/// Splits `rule` on top-level `|`, returning each piece with its start position. Always returns
/// at least one piece.
fn split_alternatives(rule: &str, offset: usize) -> ParseResult<Vec<(usize, &str)>> {
    let mut pieces = Vec::new();
    let mut quote = Quote::Outside;
    let mut depth = 0u32;
    let mut start = 0;

    for (i, c) in rule.char_indices() {
        if quote == Quote::Outside {
            match c {
                '|' if depth == 0 => {
                    pieces.push((start, &rule[start..i]));
                    start = i + 1;
                }
                '(' => depth += 1,
                ')' => match depth.checked_sub(1) {
                    Some(d) => depth = d,
                    None => {
                        return Err(error(RuleError::UnbalancedGroup, span(offset, i..i + 1)))
                    }
                },
                _ => {}
            }
        }
        quote = quote.advance(c);
    }
    pieces.push((start, &rule[start..]));

    Ok(pieces)
}
