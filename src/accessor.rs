//! Accessor surface: per-authority handles and per-tag accessors.
//!
//! [`Authority`] is the handle every authority gets, the bootstrap included,
//! so there is exactly one registration protocol. [`Accessor`] is a value
//! standing for one `(authority, tag)` pair; calling it without a value reads
//! and calling it with a value writes.

use crate::error::TagError;
use crate::hierarchy::{ClassGraph, Hierarchy};
use crate::registry::{TagRegistry, WILDCARD};
use crate::tag_set::TagSet;
use crate::target::{Target, TargetMut};
use crate::value::TagValue;

/// Mutable handle on one authority of a registry.
///
/// Obtained from [`TagRegistry::declare_authority`],
/// [`TagRegistry::authority`] or [`TagRegistry::bootstrap`].
pub struct Authority<'r, H = ClassGraph> {
    registry: &'r mut TagRegistry<H>,
    name: String,
}

impl<'r, H: Hierarchy> Authority<'r, H> {
    pub(crate) fn new(registry: &'r mut TagRegistry<H>, name: String) -> Self {
        Self { registry, name }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn registry(&self) -> &TagRegistry<H> {
        &*self.registry
    }

    /// Declare tag names this authority may put on other types.
    ///
    /// A mapping stores its values as the authority's own values for those
    /// tags. Declaring `AUTOLOAD` enables every tag name.
    pub fn declare(&mut self, tags: impl Into<TagSet>) -> Result<&mut Self, TagError> {
        self.registry.tag(&self.name, self.name.as_str(), tags)?;
        Ok(self)
    }

    /// Shorthand for declaring the wildcard.
    pub fn declare_wildcard(&mut self) -> Result<&mut Self, TagError> {
        self.declare(WILDCARD)
    }

    pub fn tag<'t>(
        &mut self,
        target: impl Into<TargetMut<'t>>,
        tags: impl Into<TagSet>,
    ) -> Result<(), TagError> {
        self.registry.tag(&self.name, target, tags)
    }

    pub fn untag<'t>(
        &mut self,
        target: impl Into<TargetMut<'t>>,
        tags: impl Into<TagSet>,
    ) -> Result<(), TagError> {
        self.registry.untag(&self.name, target, tags)
    }

    pub fn get<'a>(
        &'a self,
        tag: &str,
        target: impl Into<Target<'a>>,
    ) -> Result<Option<&'a TagValue>, TagError> {
        self.registry.get(&self.name, tag, target)
    }

    pub fn set<'t>(
        &mut self,
        tag: &str,
        target: impl Into<TargetMut<'t>>,
        value: impl Into<TagValue>,
    ) -> Result<TagValue, TagError> {
        self.registry.set(&self.name, tag, target, value)
    }

    pub fn accessor(&mut self, tag: &str) -> Result<Accessor, TagError> {
        self.registry.accessor(&self.name, tag)
    }

    pub fn is_declared(&self, tag: &str) -> bool {
        self.registry.is_declared(&self.name, tag)
    }

    pub fn is_wildcard(&self) -> bool {
        self.registry.is_wildcard(&self.name)
    }

    pub fn declared_tags(&self) -> Vec<&str> {
        self.registry.declared_tags(&self.name)
    }
}

impl<H> std::fmt::Debug for Authority<'_, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authority").field("name", &self.name).finish()
    }
}

/// Entry point for one tag of one authority.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Accessor {
    authority: String,
    tag: String,
}

impl Accessor {
    pub(crate) fn new(authority: &str, tag: &str) -> Self {
        Self {
            authority: authority.to_string(),
            tag: tag.to_string(),
        }
    }

    #[inline]
    pub fn authority(&self) -> &str {
        &self.authority
    }

    #[inline]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Inheritance-aware read on `target`.
    pub fn get<'a, H: Hierarchy>(
        &self,
        registry: &'a TagRegistry<H>,
        target: impl Into<Target<'a>>,
    ) -> Result<Option<&'a TagValue>, TagError> {
        registry.get(&self.authority, &self.tag, target)
    }

    /// The authority's own value for this tag, without inheritance.
    pub fn own<'a, H: Hierarchy>(&self, registry: &'a TagRegistry<H>) -> Option<&'a TagValue> {
        registry.direct(&self.authority, &self.tag, &self.authority)
    }

    pub fn set<'t, H: Hierarchy>(
        &self,
        registry: &mut TagRegistry<H>,
        target: impl Into<TargetMut<'t>>,
        value: impl Into<TagValue>,
    ) -> Result<TagValue, TagError> {
        registry.set(&self.authority, &self.tag, target, value)
    }

    /// Combined getter/setter.
    ///
    /// - no target: direct call on the authority itself, no inheritance
    /// - target, no value: inheritance-aware read
    /// - value: write, returning the stored value
    pub fn call<'t, H: Hierarchy>(
        &self,
        registry: &mut TagRegistry<H>,
        target: Option<TargetMut<'t>>,
        value: Option<TagValue>,
    ) -> Result<Option<TagValue>, TagError> {
        match (target, value) {
            (None, None) => Ok(self.own(registry).cloned()),
            (None, Some(value)) => {
                let authority = self.authority.clone();
                self.set(registry, authority.as_str(), value).map(Some)
            }
            (Some(target), None) => Ok(self.get(registry, target.as_target())?.cloned()),
            (Some(target), Some(value)) => self.set(registry, target, value).map(Some),
        }
    }
}

/// `tag(authority, target)` call order: inheritance-aware read.
pub fn query<'a, H: Hierarchy>(
    registry: &'a TagRegistry<H>,
    tag: &str,
    authority: &str,
    target: impl Into<Target<'a>>,
) -> Result<Option<&'a TagValue>, TagError> {
    registry.get(authority, tag, target)
}

/// `tag(authority, target, value)` call order: write.
pub fn assign<'t, H: Hierarchy>(
    registry: &mut TagRegistry<H>,
    tag: &str,
    authority: &str,
    target: impl Into<TargetMut<'t>>,
    value: impl Into<TagValue>,
) -> Result<TagValue, TagError> {
    registry.set(authority, tag, target, value)
}
