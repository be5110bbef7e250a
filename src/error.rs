//! Error types for tag registration and class hierarchy construction.

use thiserror::Error;

use crate::registry::Owner;

/// Errors raised by tag registration and lookup.
///
/// `UndeclaredTag` and `AccessorCollision` are configuration mistakes and are
/// surfaced at the offending call. Missing values are never errors: lookups
/// return `Ok(None)` instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    /// The authority neither declared the tag nor enabled the wildcard.
    #[error("tag '{tag}' is not declared by authority '{authority}'")]
    UndeclaredTag { authority: String, tag: String },
    /// The name is already bound to an entity the authority does not own.
    #[error("'{name}' in '{authority}' is already bound to {owner}")]
    AccessorCollision {
        authority: String,
        name: String,
        owner: Owner,
    },
    /// The target is neither a type nor an instance with an owning type.
    #[error("target is neither a type nor a taggable instance")]
    UntagableTarget,
    /// The type was never declared as a tag authority.
    #[error("'{0}' is not a tag authority")]
    NotAnAuthority(String),
    /// The tag name is reserved for authority bookkeeping.
    #[error("tag name '{0}' is reserved")]
    ReservedTag(String),
}

/// Errors raised while building or extending a [`ClassGraph`](crate::ClassGraph).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("empty class name is not allowed")]
    EmptyName,
    #[error("duplicate class: {0}")]
    Duplicate(String),
    #[error("class '{class}' lists parent '{parent}' more than once")]
    DuplicateParent { class: String, parent: String },
    #[error("missing parent for '{class}': '{parent}'")]
    MissingParent { class: String, parent: String },
    #[error("inheritance cycle through '{0}'")]
    Cycle(String),
    #[error("class '{class}' is already registered with parents {existing:?}")]
    ParentMismatch {
        class: String,
        existing: Vec<String>,
    },
}
