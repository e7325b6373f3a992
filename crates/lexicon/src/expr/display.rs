use std::fmt::Write;

use super::{ExpressionSet, Node, Reference, Target};

impl Reference {
    pub fn display_into(&self, buf: &mut dyn Write, set: &ExpressionSet) -> std::fmt::Result {
        write!(buf, "Reference({}", self.key())?;
        match self.target() {
            Some(Target::Expression(handle)) => match set.get(handle) {
                Some(expr) => write!(buf, " -> {}", expr.key())?,
                None => write!(buf, " -> {handle:?}")?,
            },
            Some(Target::Primitive(_)) => write!(buf, " -> primitive")?,
            None => write!(buf, ", unresolved")?,
        }
        write!(buf, ")")
    }
}

impl Node {
    pub fn display_into_indent(
        &self,
        buf: &mut dyn Write,
        set: &ExpressionSet,
        indent: u32,
    ) -> std::fmt::Result {
        for _ in 0..indent {
            write!(buf, "  ")?;
        }
        match self {
            Node::Literal(literal) => write!(buf, "Literal({literal:?})\n"),
            Node::Reference(reference) => {
                reference.display_into(buf, set)?;
                write!(buf, "\n")
            }
            Node::Sequence(elements) => {
                write!(buf, "Sequence\n")?;
                for element in elements {
                    if element.repeat {
                        for _ in 0..(indent + 1) {
                            write!(buf, "  ")?;
                        }
                        write!(buf, "ZeroOrMore\n")?;
                        element.node.display_into_indent(buf, set, indent + 2)?;
                    } else {
                        element.node.display_into_indent(buf, set, indent + 1)?;
                    }
                }
                Ok(())
            }
            Node::Alternation(nodes) => {
                write!(buf, "Alternation\n")?;
                for node in nodes {
                    node.display_into_indent(buf, set, indent + 1)?;
                }
                Ok(())
            }
        }
    }
    pub fn display_into(&self, buf: &mut dyn Write, set: &ExpressionSet) -> std::fmt::Result {
        self.display_into_indent(buf, set, 0)
    }
}

impl ExpressionSet {
    pub fn display_into(&self, buf: &mut dyn Write) -> std::fmt::Result {
        for (_, expr) in self.iter() {
            write!(buf, "{} =\n", expr.key())?;
            expr.root().display_into_indent(buf, self, 1)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::expr::ExpressionSet;

    #[test]
    fn display_linked_tree() {
        let mut set = ExpressionSet::new();
        set.define("Digit", "digit").unwrap();
        set.define("Number", "Digit (\"_\" | Digit)*").unwrap();
        set.link_local().unwrap();

        let mut out = String::new();
        set.display_into(&mut out).unwrap();

        let expected = "\
Digit =
  Reference(digit -> primitive)
Number =
  Sequence
    Reference(Digit -> Digit)
    ZeroOrMore
      Alternation
        Literal(\"_\")
        Reference(Digit -> Digit)
";
        assert_eq!(out, expected);
    }

    #[test]
    fn display_unresolved() {
        let mut set = ExpressionSet::new();
        let handle = set.define("Word", "Word* Missing").unwrap();

        let mut out = String::new();
        set.get(handle).unwrap().root().display_into(&mut out, &set).unwrap();

        let expected = "\
Sequence
  ZeroOrMore
    Reference(Word -> Word)
  Reference(Missing, unresolved)
";
        assert_eq!(out, expected);
    }
}
