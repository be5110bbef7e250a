//! # Class Tags (class-tag)
//!
//! Attaches named, authority-scoped metadata to types and instances, with
//! lookups that fall back through the type's inheritance chain.
//!
//! ## Design
//!
//! Every tag value lives under a `(authority, tag, type)` slot:
//!
//! ```text
//! ┌──────────────┐   declares   ┌────────┐   tags   ┌──────────────┐
//! │  Authority   │ ───────────▶ │  Tag   │ ───────▶ │ Type / Inst  │
//! │ (Awesome)    │              │ (class)│          │ (Foo, Bar..) │
//! └──────────────┘              └────────┘          └──────────────┘
//! ```
//!
//! - An authority may only write tags it has declared (or any tag, after
//!   declaring `AUTOLOAD`).
//! - Declaring a tag is the same operation as tagging the authority itself,
//!   so the bootstrap authority `Class::Tag` declares itself.
//! - Reads walk the type's ancestors (see [`Hierarchy`]) until a value is
//!   found; structured instances may override a value copy-on-write.
//!
//! ```ignore
//! use class_tag::{ClassGraph, TagRegistry, TagValue};
//!
//! let mut graph = ClassGraph::new();
//! graph.register("Bar", &["Foo"])?;
//!
//! let mut registry = TagRegistry::new(graph);
//! let mut awesome = registry.declare_authority("Awesome")?;
//! awesome.declare("class")?;
//! awesome.tag("Foo", [("class", "is awesome")])?;
//!
//! assert_eq!(
//!     registry.get("Awesome", "class", "Bar")?,
//!     Some(&TagValue::from("is awesome"))
//! );
//! ```

pub mod accessor;
pub mod bevy;
pub mod config;
pub mod error;
pub mod hierarchy;
pub mod registry;
pub mod shared;
pub mod tag_set;
pub mod target;
pub mod traits;
pub mod value;

pub use accessor::{assign, query, Accessor, Authority};
pub use self::bevy::TaggerPlugin;
pub use config::{RegistryConfig, DEFAULT_BOOTSTRAP};
pub use error::{HierarchyError, TagError};
pub use hierarchy::{ClassDef, ClassEntry, ClassGraph, Hierarchy, Mro};
pub use registry::{Owner, Slot, TagRegistry, TAGGER_CLASS, WILDCARD};
pub use shared::SharedRegistry;
pub use tag_set::{TagSet, DEFAULT_TAG};
pub use target::{field_key, Instance, Target, TargetMut};
pub use traits::ClassMarker;
pub use value::TagValue;
