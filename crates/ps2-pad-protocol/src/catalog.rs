//! Command catalog: static definition tables and load-time validation.
//!
//! A [`CommandDefinition`] describes one named operation: the bytes to send
//! (possibly by reference to other definitions) and the response pattern the
//! device must answer with. Definitions are pure data; the catalog validates
//! them once at construction so that resolution and execution can assume
//! every reference exists and no definition can recurse into itself.

use std::collections::HashMap;

use crate::error::{CatalogError, CatalogResult};

/// One element of a definition's send sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendElement {
    /// A literal byte written to the device as-is.
    Byte(u8),
    /// A reference to another definition, expanded at resolve time with
    /// `args` appended to the referenced command's own send queue.
    Call {
        name: &'static str,
        args: &'static [u8],
    },
}

/// One element of a definition's expected-response pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectElement {
    /// The response byte must equal this value.
    Byte(u8),
    /// Wildcard: any single response byte matches.
    Any,
}

/// Static template for a named device operation.
#[derive(Debug, Clone, Copy)]
pub struct CommandDefinition {
    /// Unique name the operator types at the prompt.
    pub name: &'static str,
    /// One-line help text.
    pub description: &'static str,
    /// Ordered bytes and command references to transmit.
    pub send: &'static [SendElement],
    /// Ordered response pattern the device must produce.
    pub expect: &'static [ExpectElement],
    /// Argument byte values with their meanings. Documentation only; the
    /// engine does not reject undocumented values.
    pub arg_labels: &'static [(u8, &'static str)],
}

/// Name-indexed, validated set of command definitions.
#[derive(Debug, Clone)]
pub struct CommandCatalog {
    by_name: HashMap<&'static str, &'static CommandDefinition>,
}

impl CommandCatalog {
    /// Index and validate a definition table.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateName`] when two definitions share a
    /// name, [`CatalogError::UnknownReference`] when a send sequence calls a
    /// name that is not in the table, and [`CatalogError::CyclicDefinition`]
    /// when following references can revisit a definition. Resolution relies
    /// on the last check to terminate.
    pub fn new(definitions: &'static [CommandDefinition]) -> CatalogResult<Self> {
        let mut by_name = HashMap::with_capacity(definitions.len());
        for def in definitions {
            if by_name.insert(def.name, def).is_some() {
                return Err(CatalogError::DuplicateName { name: def.name });
            }
        }
        let catalog = Self { by_name };
        catalog.check_references()?;
        catalog.check_cycles()?;
        Ok(catalog)
    }

    /// The built-in table covering base PS/2 and BYD vendor commands.
    ///
    /// # Errors
    ///
    /// Fails only if the built-in table itself is malformed; covered by a
    /// unit test so callers normally just propagate.
    pub fn builtin() -> CatalogResult<Self> {
        Self::new(crate::builtin::BUILTIN_COMMANDS)
    }

    /// Look up a definition by name.
    pub fn get(&self, name: &str) -> Option<&'static CommandDefinition> {
        self.by_name.get(name).copied()
    }

    /// All definitions, sorted by name for stable help output.
    pub fn iter(&self) -> impl Iterator<Item = &'static CommandDefinition> + '_ {
        let mut defs: Vec<_> = self.by_name.values().copied().collect();
        defs.sort_by_key(|def| def.name);
        defs.into_iter()
    }

    /// All command names, sorted. Used by the shell completer.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.by_name.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    fn check_references(&self) -> CatalogResult<()> {
        for def in self.by_name.values() {
            for element in def.send {
                if let SendElement::Call { name, .. } = element {
                    if !self.by_name.contains_key(name) {
                        return Err(CatalogError::UnknownReference {
                            from: def.name,
                            to: name,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn check_cycles(&self) -> CatalogResult<()> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit(
            catalog: &CommandCatalog,
            name: &'static str,
            marks: &mut HashMap<&'static str, Mark>,
        ) -> CatalogResult<()> {
            match marks.get(name) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => {
                    return Err(CatalogError::CyclicDefinition { name });
                }
                None => {}
            }
            marks.insert(name, Mark::Visiting);
            if let Some(def) = catalog.get(name) {
                for element in def.send {
                    if let SendElement::Call { name: target, .. } = element {
                        visit(catalog, target, marks)?;
                    }
                }
            }
            marks.insert(name, Mark::Done);
            Ok(())
        }

        let mut marks = HashMap::with_capacity(self.by_name.len());
        let mut roots: Vec<_> = self.by_name.keys().copied().collect();
        roots.sort_unstable();
        for name in roots {
            visit(self, name, &mut marks)?;
        }
        Ok(())
    }
}
