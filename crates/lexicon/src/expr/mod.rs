//! Compiled rules.
//!
//! A rule is written in a small regular-expression language:
//! - a string in quotes such as `"while"`
//! - the name of another expression, for example `Digit`
//! - a sequence of the above separated by whitespace, representing their concatenation
//! - alternatives separated by `|`, the first one that matches wins
//! - a group in parentheses
//! - `*` after a name, string or group for zero or more occurrences
//!
//! Expressions live in an [`ExpressionSet`] arena and refer to each other through
//! [`ExprHandle`]s, which makes recursive and mutually recursive rules plain data.

mod capture;
mod display;
mod parse;

use std::collections::HashMap;

use cranelift_entity::{entity_impl, PrimaryMap};

use crate::error::{Error, Result};

/// A raw matching function: given `(text, start, end)` returns the end of the match.
pub type ScanFn = fn(&str, usize, usize) -> Option<usize>;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ExprHandle(u32);

entity_impl! { ExprHandle }

/// What a reference points to once linked.
#[derive(Clone, Copy, Debug)]
pub enum Target {
    Expression(ExprHandle),
    Primitive(ScanFn),
}

#[derive(Clone, Debug)]
pub struct Reference {
    key: Box<str>,
    target: Option<Target>,
}

impl Reference {
    pub fn key(&self) -> &str {
        &self.key
    }
    pub fn target(&self) -> Option<Target> {
        self.target
    }
    pub fn is_resolved(&self) -> bool {
        self.target.is_some()
    }
}

/// One item of a sequence.
#[derive(Clone, Debug)]
pub struct Element {
    pub node: Node,
    /// `*`, zero or more occurrences.
    pub repeat: bool,
}

#[derive(Clone, Debug)]
pub enum Node {
    Literal(Box<str>),
    Reference(Reference),
    Sequence(Vec<Element>),
    /// Ordered choice.
    Alternation(Vec<Node>),
}

impl Node {
    fn visit_impl(&self, f: &mut dyn FnMut(&Node)) {
        match self {
            Node::Sequence(elements) => {
                for element in elements {
                    element.node.visit_impl(f);
                }
            }
            Node::Alternation(nodes) => {
                for node in nodes {
                    node.visit_impl(f);
                }
            }
            Node::Literal(_) | Node::Reference(_) => {}
        }
        f(self)
    }
    pub fn visit(&self, mut f: impl FnMut(&Node)) {
        self.visit_impl(&mut f)
    }
    fn visit_mut_impl(&mut self, f: &mut dyn FnMut(&mut Node)) {
        match self {
            Node::Sequence(elements) => {
                for element in elements {
                    element.node.visit_mut_impl(f);
                }
            }
            Node::Alternation(nodes) => {
                for node in nodes {
                    node.visit_mut_impl(f);
                }
            }
            Node::Literal(_) | Node::Reference(_) => {}
        }
        f(self)
    }
    pub fn visit_mut(&mut self, mut f: impl FnMut(&mut Node)) {
        self.visit_mut_impl(&mut f)
    }
}

/// A named, reusable matching rule.
#[derive(Clone, Debug)]
pub struct Expression {
    key: Box<str>,
    root: Node,
}

impl Expression {
    pub fn key(&self) -> &str {
        &self.key
    }
    pub fn root(&self) -> &Node {
        &self.root
    }
    /// Capture from `start` up to `end` (exclusive), see [`Node::capture`].
    pub fn capture(
        &self,
        set: &ExpressionSet,
        text: &str,
        start: usize,
        end: usize,
    ) -> Result<Option<usize>> {
        self.root.capture(set, text, start, end)
    }
    pub fn capture_all(&self, set: &ExpressionSet, text: &str) -> Result<Option<usize>> {
        self.capture(set, text, 0, text.len())
    }
}

#[derive(Clone, Default, Debug)]
pub struct ExpressionSet {
    exprs: PrimaryMap<ExprHandle, Expression>,
    pub(crate) by_key: HashMap<Box<str>, ExprHandle>,
}

impl ExpressionSet {
    pub fn new() -> ExpressionSet {
        Self::default()
    }

    /// Compiles `rule` into a new expression. References to `key` itself are resolved
    /// immediately, everything else waits for [`ExpressionSet::link_with`]. Keys are unique
    /// within a set.
    pub fn define(&mut self, key: &str, rule: &str) -> Result<ExprHandle> {
        if self.by_key.contains_key(key) {
            return Err(Error::DuplicateKey {
                key: key.to_owned(),
            });
        }
        let handle = self.exprs.next_key();
        let root = parse::parse_rule(key, handle, rule).map_err(|error| Error::Rule {
            key: key.to_owned(),
            error,
        })?;

        let pushed = self.exprs.push(Expression {
            key: key.into(),
            root,
        });
        debug_assert_eq!(pushed, handle);
        self.by_key.insert(key.into(), pushed);
        Ok(pushed)
    }

    pub fn get(&self, handle: ExprHandle) -> Option<&Expression> {
        self.exprs.get(handle)
    }

    pub fn find(&self, key: &str) -> Option<ExprHandle> {
        self.by_key.get(key).copied()
    }

    pub fn iter(&self) -> cranelift_entity::Iter<'_, ExprHandle, Expression> {
        self.exprs.iter()
    }

    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    pub(crate) fn iter_mut(&mut self) -> cranelift_entity::IterMut<'_, ExprHandle, Expression> {
        self.exprs.iter_mut()
    }
}

impl Expression {
    pub(crate) fn parts_mut(&mut self) -> (&str, &mut Node) {
        (&self.key, &mut self.root)
    }
}

impl Reference {
    pub(crate) fn unresolved(key: &str) -> Reference {
        Reference {
            key: key.into(),
            target: None,
        }
    }
    pub(crate) fn resolved(key: &str, target: Target) -> Reference {
        Reference {
            key: key.into(),
            target: Some(target),
        }
    }
    pub(crate) fn resolve(&mut self, target: Target) {
        self.target = Some(target);
    }
}
