//! Command-tree resolution.

use std::collections::VecDeque;

use crate::catalog::{CommandCatalog, ExpectElement, SendElement};
use crate::error::{ResolveError, ResolveResult};

/// One element of a resolved command's send queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendItem {
    /// A literal byte to transmit.
    Byte(u8),
    /// A nested command to descend into before continuing.
    Nested(Box<ResolvedCommand>),
}

/// A runtime instance of a command definition.
///
/// `to_send` and `expect` are consumed as the exchange progresses; `received`
/// accumulates the bytes matched so far. Nested references stay nested so the
/// session can descend into them one at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand {
    pub name: &'static str,
    pub to_send: VecDeque<SendItem>,
    pub expect: VecDeque<ExpectElement>,
    pub received: Vec<u8>,
}

impl ResolvedCommand {
    /// Remaining literal bytes in traversal order, descending into nested
    /// commands.
    pub fn literal_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        self.collect_literals(&mut bytes);
        bytes
    }

    fn collect_literals(&self, out: &mut Vec<u8>) {
        for item in &self.to_send {
            match item {
                SendItem::Byte(byte) => out.push(*byte),
                SendItem::Nested(child) => child.collect_literals(out),
            }
        }
    }
}

/// Expands `name` into an executable command tree.
///
/// Caller-supplied `args` append as trailing literal bytes to the root node
/// only; nested references carry their own argument bytes from the catalog.
/// Resolution is pure and performs no I/O. Depth is bounded because the
/// catalog rejects cyclic definitions at construction.
pub fn resolve(
    catalog: &CommandCatalog,
    name: &str,
    args: &[u8],
) -> ResolveResult<ResolvedCommand> {
    let def = catalog
        .get(name)
        .ok_or_else(|| ResolveError::UnknownCommand(name.to_owned()))?;
    let mut to_send = VecDeque::with_capacity(def.send.len() + args.len());
    for element in def.send {
        match element {
            SendElement::Byte(byte) => to_send.push_back(SendItem::Byte(*byte)),
            SendElement::Call { name, args } => {
                let child = resolve(catalog, name, args)?;
                to_send.push_back(SendItem::Nested(Box::new(child)));
            }
        }
    }
    to_send.extend(args.iter().copied().map(SendItem::Byte));
    Ok(ResolvedCommand {
        name: def.name,
        to_send,
        expect: def.expect.iter().copied().collect(),
        received: Vec::new(),
    })
}
