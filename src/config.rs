//! Registry configuration.

use serde::{Deserialize, Serialize};

/// Default name of the bootstrap authority.
pub const DEFAULT_BOOTSTRAP: &str = "Class::Tag";

/// Runtime configuration for a [`TagRegistry`](crate::TagRegistry).
///
/// Deserializable so hosts can keep it next to their other settings; missing
/// fields take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Name of the always-present authority that marks other authorities.
    pub bootstrap: String,
    /// Validate a whole batch before writing any of it.
    ///
    /// When `false`, a batch is applied in order and stops at the first
    /// failing tag, leaving earlier tags applied.
    pub atomic_batches: bool,
    /// Whether the bootstrap authority accepts any tag name.
    pub bootstrap_wildcard: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            bootstrap: DEFAULT_BOOTSTRAP.to_string(),
            atomic_batches: true,
            bootstrap_wildcard: true,
        }
    }
}
