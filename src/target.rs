//! Tag targets: the types and instances that receive tag values.
//!
//! A target is one of:
//!
//! - a bare type name, tagged in the registry itself
//! - a structured [`Instance`] with private field storage, which can shadow
//!   its class's values without mutating them (copy-on-write)
//! - an opaque instance that only knows its owning class, and always falls
//!   back to that class
//! - an unowned value with no class at all, which cannot be tagged

use std::collections::HashMap;

use bevy::prelude::*;

use crate::value::TagValue;

/// Leading token of every instance field that stores a tag override.
///
/// Starts with NUL, so only a host that spells out a derived key on purpose
/// reaches the override namespace. Such a key is an override, not a field.
const FIELD_NAMESPACE: &str = "\u{0}class-tag\u{0}";

/// Separates authority and tag inside a derived field key. Authority names
/// may contain `::`, so a printable separator would be ambiguous.
const FIELD_SEPARATOR: char = '\u{1f}';

/// Derive the private field key under which an instance stores its override
/// for `(authority, tag)`.
pub fn field_key(authority: &str, tag: &str) -> String {
    let mut key = String::with_capacity(FIELD_NAMESPACE.len() + authority.len() + tag.len() + 1);
    key.push_str(FIELD_NAMESPACE);
    key.push_str(authority);
    key.push(FIELD_SEPARATOR);
    key.push_str(tag);
    key
}

#[inline]
fn is_tag_field(key: &str) -> bool {
    key.starts_with(FIELD_NAMESPACE)
}

/// A structured instance: an owning class plus private field storage.
///
/// Usable as a Bevy component so entities can carry per-instance overrides.
#[derive(Component, Clone, Debug, Default, PartialEq)]
pub struct Instance {
    class: String,
    fields: HashMap<String, TagValue>,
}

impl Instance {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            fields: HashMap::new(),
        }
    }

    /// Builder method: set an ordinary field and return self.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<TagValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    #[inline]
    pub fn class(&self) -> &str {
        &self.class
    }

    #[inline]
    pub fn field(&self, name: &str) -> Option<&TagValue> {
        self.fields.get(name)
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<TagValue>) -> Option<TagValue> {
        self.fields.insert(name.into(), value.into())
    }

    pub fn remove_field(&mut self, name: &str) -> Option<TagValue> {
        self.fields.remove(name)
    }

    /// Ordinary fields, excluding stored tag overrides.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &TagValue)> {
        self.fields
            .iter()
            .filter(|(k, _)| !is_tag_field(k))
            .map(|(k, v)| (k.as_str(), v))
    }

    /// Number of tag overrides held privately by this instance.
    pub fn override_count(&self) -> usize {
        self.fields.keys().filter(|k| is_tag_field(k)).count()
    }

    pub(crate) fn tag_override(&self, authority: &str, tag: &str) -> Option<&TagValue> {
        self.fields.get(&field_key(authority, tag))
    }

    pub(crate) fn set_tag_override(&mut self, authority: &str, tag: &str, value: TagValue) {
        self.fields.insert(field_key(authority, tag), value);
    }

    pub(crate) fn remove_tag_override(&mut self, authority: &str, tag: &str) -> Option<TagValue> {
        self.fields.remove(&field_key(authority, tag))
    }
}

/// A read-only tag target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Target<'a> {
    /// A bare type name.
    Type(&'a str),
    /// An instance with private field storage.
    Structured(&'a Instance),
    /// An instance without field storage; only its owning class is known.
    Opaque(&'a str),
    /// A value that belongs to no class.
    Unowned,
}

/// A mutable tag target, used by registration calls.
#[derive(Debug)]
pub enum TargetMut<'a> {
    Type(&'a str),
    Structured(&'a mut Instance),
    Opaque(&'a str),
    Unowned,
}

impl<'a> Target<'a> {
    /// The owning class, if any.
    pub fn class(&self) -> Option<&'a str> {
        match *self {
            Target::Type(ty) | Target::Opaque(ty) => Some(ty),
            Target::Structured(instance) => Some(instance.class()),
            Target::Unowned => None,
        }
    }
}

impl TargetMut<'_> {
    /// Reborrow as a read-only target.
    pub fn as_target(&self) -> Target<'_> {
        match self {
            TargetMut::Type(ty) => Target::Type(ty),
            TargetMut::Structured(instance) => Target::Structured(&**instance),
            TargetMut::Opaque(ty) => Target::Opaque(ty),
            TargetMut::Unowned => Target::Unowned,
        }
    }
}

impl<'a> From<&'a str> for Target<'a> {
    fn from(ty: &'a str) -> Self {
        Target::Type(ty)
    }
}

impl<'a> From<&'a String> for Target<'a> {
    fn from(ty: &'a String) -> Self {
        Target::Type(ty)
    }
}

impl<'a> From<&'a Instance> for Target<'a> {
    fn from(instance: &'a Instance) -> Self {
        Target::Structured(instance)
    }
}

impl<'a> From<&'a str> for TargetMut<'a> {
    fn from(ty: &'a str) -> Self {
        TargetMut::Type(ty)
    }
}

impl<'a> From<&'a String> for TargetMut<'a> {
    fn from(ty: &'a String) -> Self {
        TargetMut::Type(ty)
    }
}

impl<'a> From<&'a mut Instance> for TargetMut<'a> {
    fn from(instance: &'a mut Instance) -> Self {
        TargetMut::Structured(instance)
    }
}
