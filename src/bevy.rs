//! Bevy integration for class tags.
//!
//! Provides:
//! - `TaggerPlugin`: builder-pattern plugin that installs the registry as a Resource
//! - `Instance` as a component, so entities can carry per-instance overrides
//!
//! # Example
//!
//! ```ignore
//! use bevy::prelude::*;
//! use class_tag::bevy::*;
//! use class_tag_macro::hierarchy;
//!
//! hierarchy! {
//!     pub mod Classes {
//!         Weapon;
//!         Sword: Weapon;
//!     }
//! }
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(TaggerPlugin::from_definitions(Classes::DEFINITIONS))
//!         .add_systems(Startup, declare_tags)
//!         .run();
//! }
//!
//! fn declare_tags(mut registry: ResMut<TagRegistry>) {
//!     let mut loot = registry.declare_authority("Loot").unwrap();
//!     loot.declare(["rarity"]).unwrap();
//!     loot.tag(Classes::Weapon::NAME, [("rarity", "common")]).unwrap();
//! }
//! ```

use bevy::prelude::*;

use crate::{
    config::RegistryConfig,
    hierarchy::{ClassDef, ClassGraph, Mro},
    registry::TagRegistry,
};

pub use crate::target::Instance;

// =============================================================================
// Plugin
// =============================================================================

/// Bevy plugin for the class tag registry.
///
/// Use the builder pattern to configure:
///
/// ```ignore
/// App::new()
///     .add_plugins(
///         TaggerPlugin::from_definitions(Classes::DEFINITIONS)
///             .with_mro(Mro::C3)
///     )
/// ```
#[derive(Default)]
pub struct TaggerPlugin {
    definitions: Option<&'static [ClassDef]>,
    mro: Mro,
    config: RegistryConfig,
}

impl TaggerPlugin {
    /// Create a new plugin with an empty class graph.
    ///
    /// Classes can still be registered at runtime through
    /// `registry.hierarchy_mut()`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a plugin from static class definitions (from `hierarchy!` macro).
    pub fn from_definitions(definitions: &'static [ClassDef]) -> Self {
        Self {
            definitions: Some(definitions),
            ..Self::default()
        }
    }

    /// Select the method-resolution order for inherited lookups.
    ///
    /// Default: `Mro::Dfs`
    pub fn with_mro(mut self, mro: Mro) -> Self {
        self.mro = mro;
        self
    }

    pub fn with_config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }
}

impl Plugin for TaggerPlugin {
    fn build(&self, app: &mut App) {
        let graph = match self.definitions.map(ClassGraph::build).transpose() {
            Ok(graph) => graph.unwrap_or_else(ClassGraph::new),
            Err(err) => {
                tracing::error!(%err, "invalid class definitions, starting from an empty graph");
                ClassGraph::new()
            }
        };

        app.insert_resource(TagRegistry::with_config(
            graph.with_mro(self.mro),
            self.config.clone(),
        ));
    }
}

// =============================================================================
// Resource impl for TagRegistry
// =============================================================================

impl Resource for TagRegistry {}

// =============================================================================
// Tests
// =============================================================================
