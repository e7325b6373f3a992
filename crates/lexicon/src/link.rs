//! Resolves every reference in an [`ExpressionSet`] by key. There are no scopes nor shadowing:
//! a key names whatever the lookup says it names, and references to the expression's own key
//! were already resolved when it was parsed.

use crate::{
    builtin::Builtin,
    error::{Error, Result},
    expr::{ExpressionSet, Node, Target},
};

/// Answer of a lookup function for a single key.
#[derive(Clone, Copy, Debug)]
pub enum Lookup {
    Found(Target),
    /// The key exists but has no expression or scan function, like a token created empty.
    NotScannable,
    Missing,
}

impl Lookup {
    /// The built-in character classes, for keys nothing else claims.
    pub fn builtin(key: &str) -> Lookup {
        match Builtin::from_key(key) {
            Some(builtin) => match builtin.class() {
                Some(class) => Lookup::Found(Target::Primitive(class.scan_fn())),
                None => Lookup::NotScannable,
            },
            None => Lookup::Missing,
        }
    }
}

impl ExpressionSet {
    /// Resolves all references through `lookup`. Linking again re-resolves every reference, so
    /// it is safe to repeat after more expressions were defined. Returns the number of
    /// references resolved.
    pub fn link_with(&mut self, mut lookup: impl FnMut(&str) -> Lookup) -> Result<usize> {
        let mut resolved = 0;

        for (_, expr) in self.iter_mut() {
            let (key, root) = expr.parts_mut();
            let mut result = Ok(());

            root.visit_mut(|node| {
                let Node::Reference(reference) = node else {
                    return;
                };
                if result.is_err() || reference.key() == key {
                    return;
                }

                match lookup(reference.key()) {
                    Lookup::Found(target) => {
                        log::trace!("{key}: resolved `{}` to {target:?}", reference.key());
                        reference.resolve(target);
                        resolved += 1;
                    }
                    Lookup::NotScannable => {
                        result = Err(Error::NoMatcher {
                            expression: key.to_owned(),
                            reference: reference.key().to_owned(),
                        })
                    }
                    Lookup::Missing => {
                        result = Err(Error::UnresolvedReference {
                            expression: key.to_owned(),
                            reference: reference.key().to_owned(),
                        })
                    }
                }
            });

            result?;
        }

        log::debug!(
            "Linked {} expressions, {resolved} references",
            self.len()
        );
        Ok(resolved)
    }

    /// Links the set against itself, falling back to the built-in character classes.
    pub fn link_local(&mut self) -> Result<usize> {
        let keys = self.by_key.clone();

        self.link_with(|key| match keys.get(key) {
            Some(&handle) => Lookup::Found(Target::Expression(handle)),
            None => Lookup::builtin(key),
        })
    }
}
