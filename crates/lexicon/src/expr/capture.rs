use crate::error::{Error, Result};

use super::{ExprHandle, ExpressionSet, Node, Target};

impl ExpressionSet {
    pub fn capture(
        &self,
        handle: ExprHandle,
        text: &str,
        start: usize,
        end: usize,
    ) -> Result<Option<usize>> {
        self.exprs[handle].capture(self, text, start, end)
    }

    pub fn capture_all(&self, handle: ExprHandle, text: &str) -> Result<Option<usize>> {
        self.capture(handle, text, 0, text.len())
    }
}

impl Node {
    /// Attempts to match this node against `text` from `start` up to `end` (exclusive),
    /// returning where the match ends or `None` if the text there is incompatible with the rule.
    ///
    /// Alternation is an ordered choice and repetition is greedy without backtracking: once a
    /// `*` element stops matching, the rest of the sequence has to match from there.
    pub fn capture(
        &self,
        set: &ExpressionSet,
        text: &str,
        start: usize,
        end: usize,
    ) -> Result<Option<usize>> {
        let end = end.min(text.len());
        match self {
            Node::Literal(literal) => {
                let literal_end = start + literal.len();
                if literal_end > end {
                    return Ok(None);
                }
                let matches = text.as_bytes().get(start..literal_end) == Some(literal.as_bytes());
                Ok(matches.then_some(literal_end))
            }
            Node::Reference(reference) => match reference.target() {
                Some(Target::Expression(handle)) => set.capture(handle, text, start, end),
                Some(Target::Primitive(scan)) => Ok(scan(text, start, end)),
                None => Err(Error::Unlinked {
                    reference: reference.key().to_owned(),
                }),
            },
            Node::Alternation(nodes) => {
                for node in nodes {
                    if let Some(next) = node.capture(set, text, start, end)? {
                        return Ok(Some(next));
                    }
                }
                Ok(None)
            }
            Node::Sequence(elements) => {
                let mut position = start;
                for element in elements {
                    match element.node.capture(set, text, position, end)? {
                        Some(next) => position = next,
                        None if element.repeat => continue,
                        None => return Ok(None),
                    }
                    if element.repeat {
                        while let Some(next) = element.node.capture(set, text, position, end)? {
                            // an element matching nothing would repeat forever
                            if next == position {
                                break;
                            }
                            position = next;
                        }
                    }
                }
                Ok(Some(position))
            }
        }
    }
}
