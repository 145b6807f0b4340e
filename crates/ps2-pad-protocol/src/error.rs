//! Protocol error types.

use thiserror::Error;

/// Catalog construction failures.
///
/// All three variants are programming errors in a definition table and are
/// caught before any device I/O can happen.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("duplicate command definition: {name}")]
    DuplicateName { name: &'static str },

    #[error("command {from} references unknown command {to}")]
    UnknownReference {
        from: &'static str,
        to: &'static str,
    },

    #[error("command {name} participates in a reference cycle")]
    CyclicDefinition { name: &'static str },
}

/// Command resolution failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("unable to resolve command: {0}")]
    UnknownCommand(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;
pub type ResolveResult<T> = Result<T, ResolveError>;
