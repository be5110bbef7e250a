//! Tag registry: storage, declaration gate and inheritance-aware lookup.
//!
//! Every value lives under a `(authority, tag)` slot of a target type. An
//! authority is just a type tagged `tagger_class` under the bootstrap
//! authority, and its vocabulary is just the set of tags it holds on itself.
//! Declaring a tag and tagging yourself are therefore the same write, and
//! the bootstrap authority hosts its own `tagger_class` declaration.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::accessor::{Accessor, Authority};
use crate::config::RegistryConfig;
use crate::error::TagError;
use crate::hierarchy::{ClassGraph, Hierarchy};
use crate::tag_set::TagSet;
use crate::target::{Target, TargetMut};
use crate::value::TagValue;

/// Reserved tag marking a type as an authority (held under the bootstrap).
pub const TAGGER_CLASS: &str = "tagger_class";

/// Declaring this tag lets an authority accept any tag name.
pub const WILDCARD: &str = "AUTOLOAD";

/// Storage slot of one tag within one authority's namespace.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot {
    pub authority: String,
    pub tag: String,
}

impl Slot {
    pub fn new(authority: &str, tag: &str) -> Self {
        Self {
            authority: authority.to_string(),
            tag: tag.to_string(),
        }
    }
}

/// Who owns a name bound in an authority's namespace.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Owner {
    /// A tag accessor (or other entity) installed by this authority.
    Authority(String),
    /// An ordinary member of the host type.
    Host,
}

impl std::fmt::Display for Owner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Owner::Authority(name) => write!(f, "authority '{name}'"),
            Owner::Host => f.write_str("a host member"),
        }
    }
}

/// A name bound in an authority's namespace.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Binding {
    Accessor(Accessor),
    Member(Owner),
}

impl Binding {
    fn owner(&self) -> Owner {
        match self {
            Binding::Accessor(accessor) => Owner::Authority(accessor.authority().to_string()),
            Binding::Member(owner) => owner.clone(),
        }
    }

    fn is_owned_by(&self, authority: &str) -> bool {
        match self {
            Binding::Accessor(accessor) => accessor.authority() == authority,
            Binding::Member(Owner::Authority(owner)) => owner == authority,
            Binding::Member(Owner::Host) => false,
        }
    }
}

/// Registry of tag values.
///
/// Provides:
/// - Authority bootstrap and declaration gating
/// - Set / get / unset of `(authority, tag, target)` values
/// - Inheritance walk through the host [`Hierarchy`] on lookup
/// - Copy-on-write overrides on structured instances
///
/// One registry is meant to live for the whole process. Share it by
/// reference, as a Bevy resource, or through
/// [`SharedRegistry`](crate::SharedRegistry).
#[derive(Clone, Debug)]
pub struct TagRegistry<H = ClassGraph> {
    config: RegistryConfig,
    hierarchy: H,
    /// Target type → slot → value.
    entries: HashMap<String, HashMap<Slot, TagValue>>,
    /// Names bound in each authority's namespace, keyed by (authority, name).
    bindings: HashMap<Slot, Binding>,
}

impl Default for TagRegistry<ClassGraph> {
    fn default() -> Self {
        Self::new(ClassGraph::new())
    }
}

impl<H: Hierarchy> TagRegistry<H> {
    pub fn new(hierarchy: H) -> Self {
        Self::with_config(hierarchy, RegistryConfig::default())
    }

    /// Create a registry and bootstrap its root authority.
    pub fn with_config(hierarchy: H, config: RegistryConfig) -> Self {
        let mut registry = Self {
            config,
            hierarchy,
            entries: HashMap::new(),
            bindings: HashMap::new(),
        };

        // The root authority marks itself and declares `tagger_class` in one
        // write, since both are the slot (root, tagger_class) on root.
        let root = registry.config.bootstrap.clone();
        registry.install(&root, TAGGER_CLASS, &root, TagValue::default());
        if registry.config.bootstrap_wildcard {
            registry.install(&root, WILDCARD, &root, TagValue::default());
        }
        debug!(bootstrap = %root, wildcard = registry.config.bootstrap_wildcard, "tag registry bootstrapped");

        registry
    }

    #[inline]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    #[inline]
    pub fn hierarchy(&self) -> &H {
        &self.hierarchy
    }

    #[inline]
    pub fn hierarchy_mut(&mut self) -> &mut H {
        &mut self.hierarchy
    }

    /// Name of the bootstrap authority.
    #[inline]
    pub fn bootstrap_name(&self) -> &str {
        &self.config.bootstrap
    }

    // =========================================================================
    // Authorities
    // =========================================================================

    /// Handle on the bootstrap authority.
    pub fn bootstrap(&mut self) -> Authority<'_, H> {
        let name = self.config.bootstrap.clone();
        Authority::new(self, name)
    }

    /// Mark `ty` as an authority and return its handle.
    ///
    /// Idempotent. The new authority starts with an empty vocabulary; declare
    /// tags on it before tagging other types.
    pub fn declare_authority(&mut self, ty: &str) -> Result<Authority<'_, H>, TagError> {
        let root = self.config.bootstrap.clone();
        self.set(&root, TAGGER_CLASS, ty, TagValue::default())?;
        debug!(authority = ty, "authority declared");
        Ok(Authority::new(self, ty.to_string()))
    }

    /// Handle on an existing authority.
    pub fn authority(&mut self, ty: &str) -> Result<Authority<'_, H>, TagError> {
        if !self.is_authority(ty) {
            return Err(TagError::NotAnAuthority(ty.to_string()));
        }
        Ok(Authority::new(self, ty.to_string()))
    }

    /// Whether `ty` is directly marked as an authority.
    ///
    /// The bootstrap authority always is, even after its own marker has been
    /// removed.
    pub fn is_authority(&self, ty: &str) -> bool {
        ty == self.config.bootstrap || self.direct(&self.config.bootstrap, TAGGER_CLASS, ty).is_some()
    }

    /// All authorities, sorted by name.
    pub fn authorities(&self) -> Vec<&str> {
        let marker = Slot::new(&self.config.bootstrap, TAGGER_CLASS);
        let mut names: Vec<&str> = self
            .entries
            .iter()
            .filter(|(_, slots)| slots.contains_key(&marker))
            .map(|(ty, _)| ty.as_str())
            .collect();
        names.push(&self.config.bootstrap);
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Whether `authority` may tag other types with `tag`.
    ///
    /// The bootstrap authority always declares `tagger_class`.
    pub fn is_declared(&self, authority: &str, tag: &str) -> bool {
        (tag == TAGGER_CLASS && authority == self.config.bootstrap)
            || self.direct(authority, tag, authority).is_some()
            || self.is_wildcard(authority)
    }

    /// Whether `authority` declared the wildcard.
    pub fn is_wildcard(&self, authority: &str) -> bool {
        self.direct(authority, WILDCARD, authority).is_some()
    }

    /// Tags `authority` declared explicitly, sorted. Excludes the wildcard.
    pub fn declared_tags(&self, authority: &str) -> Vec<&str> {
        let mut tags: Vec<&str> = self
            .entries
            .get(authority)
            .into_iter()
            .flat_map(|slots| slots.keys())
            .filter(|slot| slot.authority == authority && slot.tag != WILDCARD)
            .map(|slot| slot.tag.as_str())
            .collect();
        tags.sort_unstable();
        tags
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Value of `tag` for `target`, walking ancestors when `target` has no
    /// value of its own.
    ///
    /// Structured instances consult their private override first and then
    /// their class. Absence is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`TagError::UntagableTarget`] for a target with no class.
    pub fn get<'a>(
        &'a self,
        authority: &str,
        tag: &str,
        target: impl Into<Target<'a>>,
    ) -> Result<Option<&'a TagValue>, TagError> {
        let target: Target<'a> = target.into();
        match target {
            Target::Type(ty) | Target::Opaque(ty) => Ok(self.resolve(authority, tag, ty).map(|(_, v)| v)),
            Target::Structured(instance) => Ok(instance
                .tag_override(authority, tag)
                .or_else(|| self.resolve(authority, tag, instance.class()).map(|(_, v)| v))),
            Target::Unowned => Err(TagError::UntagableTarget),
        }
    }

    /// Like [`get`](Self::get) but without the inheritance walk.
    pub fn get_direct<'a>(
        &'a self,
        authority: &str,
        tag: &str,
        target: impl Into<Target<'a>>,
    ) -> Result<Option<&'a TagValue>, TagError> {
        let target: Target<'a> = target.into();
        match target {
            Target::Type(ty) | Target::Opaque(ty) => Ok(self.direct(authority, tag, ty)),
            Target::Structured(instance) => Ok(instance
                .tag_override(authority, tag)
                .or_else(|| self.direct(authority, tag, instance.class()))),
            Target::Unowned => Err(TagError::UntagableTarget),
        }
    }

    /// The type whose own entry answers a lookup of `tag` on `ty`: `ty`
    /// itself or the first ancestor that holds the tag.
    pub fn source_of(&self, authority: &str, tag: &str, ty: &str) -> Option<&str> {
        self.resolve(authority, tag, ty).map(|(source, _)| source)
    }

    /// Direct entries of `authority` on `ty`, sorted by tag name.
    pub fn tags_of(&self, authority: &str, ty: &str) -> Vec<(&str, &TagValue)> {
        let mut tags: Vec<(&str, &TagValue)> = self
            .entries
            .get(ty)
            .into_iter()
            .flat_map(|slots| slots.iter())
            .filter(|(slot, _)| slot.authority == authority)
            .map(|(slot, value)| (slot.tag.as_str(), value))
            .collect();
        tags.sort_unstable_by_key(|(tag, _)| *tag);
        tags
    }

    /// Direct entry of `ty`, borrowed from the registry alone.
    pub(crate) fn direct(&self, authority: &str, tag: &str, ty: &str) -> Option<&TagValue> {
        self.entries.get(ty)?.get(&Slot::new(authority, tag))
    }

    fn resolve(&self, authority: &str, tag: &str, ty: &str) -> Option<(&str, &TagValue)> {
        let slot = Slot::new(authority, tag);
        let hit = |name: &str| {
            self.entries
                .get_key_value(name)
                .and_then(|(owner, slots)| slots.get(&slot).map(|v| (owner.as_str(), v)))
        };

        if let Some(found) = hit(ty) {
            return Some(found);
        }
        let found = self.hierarchy.ancestors(ty).iter().find_map(|ancestor| hit(ancestor.as_str()));
        if let Some((source, _)) = found {
            trace!(authority, tag, target = ty, source, "tag inherited");
        }
        found
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Store `value` for `tag` on `target` and return it.
    ///
    /// Setting a tag on the authority itself is a declaration and bypasses the
    /// declaration gate. Opaque instances write to their class.
    ///
    /// # Errors
    ///
    /// - [`TagError::NotAnAuthority`] if `authority` was never declared
    /// - [`TagError::ReservedTag`] for `tagger_class` outside the bootstrap
    /// - [`TagError::UndeclaredTag`] if the tag is not declared and no wildcard
    /// - [`TagError::AccessorCollision`] if the name is bound to a foreign entity
    /// - [`TagError::UntagableTarget`] for a target with no class
    pub fn set<'t>(
        &mut self,
        authority: &str,
        tag: &str,
        target: impl Into<TargetMut<'t>>,
        value: impl Into<TagValue>,
    ) -> Result<TagValue, TagError> {
        let mut target: TargetMut<'t> = target.into();
        self.check_write(authority, tag, &target)?;
        self.write(authority, tag, &mut target, value.into())
    }

    /// Remove the direct value of `tag` on `target`.
    ///
    /// Ancestor values are untouched. Removing a missing value is a no-op.
    pub fn unset<'t>(
        &mut self,
        authority: &str,
        tag: &str,
        target: impl Into<TargetMut<'t>>,
    ) -> Result<Option<TagValue>, TagError> {
        let target: TargetMut<'t> = target.into();
        match target {
            TargetMut::Type(ty) | TargetMut::Opaque(ty) => {
                let Some(slots) = self.entries.get_mut(ty) else {
                    return Ok(None);
                };
                let removed = slots.remove(&Slot::new(authority, tag));
                if slots.is_empty() {
                    self.entries.remove(ty);
                }
                Ok(removed)
            }
            TargetMut::Structured(instance) => Ok(instance.remove_tag_override(authority, tag)),
            TargetMut::Unowned => Err(TagError::UntagableTarget),
        }
    }

    /// Apply a batch of tags to `target`.
    ///
    /// With `atomic_batches` (the default) every tag is validated before any
    /// is written, so a failing batch leaves no trace. Otherwise tags are
    /// applied in order and the batch stops at the first failure.
    pub fn tag<'t>(
        &mut self,
        authority: &str,
        target: impl Into<TargetMut<'t>>,
        tags: impl Into<TagSet>,
    ) -> Result<(), TagError> {
        let mut target: TargetMut<'t> = target.into();
        let tags: TagSet = tags.into();
        let tags = tags.into_entries();
        let atomic = self.config.atomic_batches;

        if atomic {
            for tag in tags.keys() {
                self.check_write(authority, tag, &target)?;
            }
        }
        for (tag, value) in tags {
            if !atomic {
                self.check_write(authority, &tag, &target)?;
            }
            self.write(authority, &tag, &mut target, value)?;
        }

        debug!(authority, target = ?target.as_target().class(), "tags applied");
        Ok(())
    }

    /// Remove a batch of tags from `target`. Values in the set are ignored.
    pub fn untag<'t>(
        &mut self,
        authority: &str,
        target: impl Into<TargetMut<'t>>,
        tags: impl Into<TagSet>,
    ) -> Result<(), TagError> {
        let mut target: TargetMut<'t> = target.into();
        let tags: TagSet = tags.into();
        for tag in tags.into_entries().keys() {
            self.unset(authority, tag, reborrow(&mut target))?;
        }
        Ok(())
    }

    /// Cached accessor for `tag` under `authority`.
    ///
    /// Wildcard authorities produce accessors for any name on demand; they
    /// share storage with explicitly declared tags of the same name.
    pub fn accessor(&mut self, authority: &str, tag: &str) -> Result<Accessor, TagError> {
        if !self.is_authority(authority) {
            return Err(TagError::NotAnAuthority(authority.to_string()));
        }
        if !self.is_declared(authority, tag) {
            return Err(TagError::UndeclaredTag {
                authority: authority.to_string(),
                tag: tag.to_string(),
            });
        }
        self.check_collision(authority, tag)?;
        Ok(self.bind_accessor(authority, tag))
    }

    /// Bind a non-tag entity called `name` in `ty`'s namespace.
    ///
    /// A later tag declaration of the same name by any authority other than
    /// `owner` fails with [`TagError::AccessorCollision`].
    pub fn bind_member(&mut self, ty: &str, name: &str, owner: Owner) -> Result<(), TagError> {
        let slot = Slot::new(ty, name);
        if let Some(existing) = self.bindings.get(&slot) {
            let owned = match &owner {
                Owner::Authority(authority) => existing.is_owned_by(authority),
                Owner::Host => existing.owner() == Owner::Host,
            };
            if !owned {
                return Err(TagError::AccessorCollision {
                    authority: ty.to_string(),
                    name: name.to_string(),
                    owner: existing.owner(),
                });
            }
        }
        self.bindings.insert(slot, Binding::Member(owner));
        Ok(())
    }

    fn check_write(&self, authority: &str, tag: &str, target: &TargetMut<'_>) -> Result<(), TagError> {
        let class = match target {
            TargetMut::Type(ty) | TargetMut::Opaque(ty) => Some(*ty),
            TargetMut::Structured(_) => None,
            TargetMut::Unowned => return Err(TagError::UntagableTarget),
        };

        if !self.is_authority(authority) {
            return Err(TagError::NotAnAuthority(authority.to_string()));
        }
        if tag == TAGGER_CLASS && authority != self.config.bootstrap {
            return Err(TagError::ReservedTag(tag.to_string()));
        }
        // Tagging yourself is declaring, which is always allowed.
        if class != Some(authority) && !self.is_declared(authority, tag) {
            return Err(TagError::UndeclaredTag {
                authority: authority.to_string(),
                tag: tag.to_string(),
            });
        }
        self.check_collision(authority, tag)
    }

    fn check_collision(&self, authority: &str, tag: &str) -> Result<(), TagError> {
        let owner = match self.bindings.get(&Slot::new(authority, tag)) {
            Some(binding) if binding.is_owned_by(authority) => return Ok(()),
            Some(binding) => binding.owner(),
            None if self.hierarchy.has_member(authority, tag) => Owner::Host,
            None => return Ok(()),
        };
        Err(TagError::AccessorCollision {
            authority: authority.to_string(),
            name: tag.to_string(),
            owner,
        })
    }

    fn write(
        &mut self,
        authority: &str,
        tag: &str,
        target: &mut TargetMut<'_>,
        value: TagValue,
    ) -> Result<TagValue, TagError> {
        match target {
            TargetMut::Type(ty) | TargetMut::Opaque(ty) => {
                let ty = *ty;
                self.install(authority, tag, ty, value.clone());
            }
            TargetMut::Structured(instance) => {
                instance.set_tag_override(authority, tag, value.clone());
                self.bind_accessor(authority, tag);
            }
            TargetMut::Unowned => return Err(TagError::UntagableTarget),
        }
        Ok(value)
    }

    /// Unchecked write of a type entry plus its accessor binding.
    fn install(&mut self, authority: &str, tag: &str, ty: &str, value: TagValue) {
        if ty == authority {
            debug!(authority, tag, "tag declared");
        }
        self.entries
            .entry(ty.to_string())
            .or_default()
            .insert(Slot::new(authority, tag), value);
        self.bind_accessor(authority, tag);
    }

    fn bind_accessor(&mut self, authority: &str, tag: &str) -> Accessor {
        let binding = self
            .bindings
            .entry(Slot::new(authority, tag))
            .or_insert_with(|| Binding::Accessor(Accessor::new(authority, tag)));
        match binding {
            Binding::Accessor(accessor) => accessor.clone(),
            // A member owned by the authority itself; hand out a fresh accessor.
            Binding::Member(_) => Accessor::new(authority, tag),
        }
    }
}

/// Shorten a mutable target's borrow for one call inside a loop.
fn reborrow<'s>(target: &'s mut TargetMut<'_>) -> TargetMut<'s> {
    match target {
        TargetMut::Type(ty) => TargetMut::Type(*ty),
        TargetMut::Structured(instance) => TargetMut::Structured(&mut **instance),
        TargetMut::Opaque(ty) => TargetMut::Opaque(*ty),
        TargetMut::Unowned => TargetMut::Unowned,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::ClassDef;
    use crate::target::Instance;

    const CLASSES: &[ClassDef] = &[
        ClassDef::new("Foo", &[]),
        ClassDef::new("Bar", &["Foo"]),
        ClassDef::new("Baz", &["Bar"]),
        ClassDef::new("Awesome", &[]).with_members(&["import"]),
    ];

    fn registry() -> TagRegistry {
        TagRegistry::new(ClassGraph::build(CLASSES).unwrap())
    }

    fn awesome(reg: &mut TagRegistry) {
        reg.declare_authority("Awesome").unwrap();
        reg.tag("Awesome", "Awesome", ["class", "pureperl", "inherits"]).unwrap();
    }

    #[test]
    fn bootstrap_is_self_hosted() {
        let reg = registry();
        assert!(reg.is_authority("Class::Tag"));
        assert!(reg.is_declared("Class::Tag", TAGGER_CLASS));
        assert!(reg.is_wildcard("Class::Tag"));
        assert_eq!(reg.authorities(), vec!["Class::Tag"]);
        assert_eq!(reg.declared_tags("Class::Tag"), vec![TAGGER_CLASS]);
    }

    #[test]
    fn bootstrap_without_wildcard_only_knows_tagger_class() {
        let config = RegistryConfig {
            bootstrap_wildcard: false,
            ..RegistryConfig::default()
        };
        let mut reg = TagRegistry::with_config(ClassGraph::new(), config);
        assert!(!reg.is_wildcard("Class::Tag"));
        assert!(matches!(
            reg.tag("Class::Tag", "Foo", TagSet::new()),
            Err(TagError::UndeclaredTag { .. })
        ));
        // Authorities can still be created.
        reg.declare_authority("Awesome").unwrap();
        assert!(reg.is_authority("Awesome"));
    }

    #[test]
    fn declaration_is_self_tagging() {
        let mut reg = registry();
        awesome(&mut reg);

        assert!(reg.is_declared("Awesome", "class"));
        assert!(!reg.is_declared("Awesome", "author"));
        assert_eq!(reg.declared_tags("Awesome"), vec!["class", "inherits", "pureperl"]);
        assert_eq!(reg.get_direct("Awesome", "class", "Awesome").unwrap(), Some(&TagValue::Int(1)));
    }

    #[test]
    fn default_tag_is_is() {
        let mut reg = registry();
        reg.tag("Class::Tag", "Foo", TagSet::new()).unwrap();
        assert_eq!(reg.get("Class::Tag", "is", "Foo").unwrap(), Some(&TagValue::Int(1)));
    }

    #[test]
    fn inherited_lookup_and_override() {
        let mut reg = registry();
        reg.tag("Class::Tag", "Foo", TagSet::new()).unwrap();

        assert_eq!(reg.get("Class::Tag", "is", "Baz").unwrap(), Some(&TagValue::Int(1)));
        assert_eq!(reg.source_of("Class::Tag", "is", "Baz"), Some("Foo"));
        assert_eq!(reg.get_direct("Class::Tag", "is", "Baz").unwrap(), None);

        reg.set("Class::Tag", "is", "Bar", 0).unwrap();
        assert_eq!(reg.get("Class::Tag", "is", "Bar").unwrap(), Some(&TagValue::Int(0)));
        assert_eq!(reg.get("Class::Tag", "is", "Baz").unwrap(), Some(&TagValue::Int(0)));
        assert_eq!(reg.source_of("Class::Tag", "is", "Baz"), Some("Bar"));
        assert_eq!(reg.get("Class::Tag", "is", "Foo").unwrap(), Some(&TagValue::Int(1)));
    }

    #[test]
    fn undeclared_tag_is_rejected_without_writes() {
        let mut reg = registry();
        awesome(&mut reg);

        let err = reg
            .tag("Awesome", "Foo", [("class", "is awesome"), ("author", "metadoo")])
            .unwrap_err();
        assert_eq!(
            err,
            TagError::UndeclaredTag {
                authority: "Awesome".into(),
                tag: "author".into()
            }
        );
        assert_eq!(reg.get("Awesome", "class", "Foo").unwrap(), None);
        assert!(reg.tags_of("Awesome", "Foo").is_empty());
    }

    #[test]
    fn non_atomic_batches_keep_earlier_tags() {
        let config = RegistryConfig {
            atomic_batches: false,
            ..RegistryConfig::default()
        };
        let mut reg = TagRegistry::with_config(ClassGraph::build(CLASSES).unwrap(), config);
        awesome(&mut reg);

        assert!(reg
            .tag("Awesome", "Foo", [("class", "is awesome"), ("author", "metadoo")])
            .is_err());
        assert_eq!(
            reg.get("Awesome", "class", "Foo").unwrap(),
            Some(&TagValue::from("is awesome"))
        );
        assert_eq!(reg.get("Awesome", "author", "Foo").unwrap(), None);
    }

    #[test]
    fn set_returns_stored_value() {
        let mut reg = registry();
        awesome(&mut reg);
        reg.tag("Awesome", "Foo", [("class", "is awesome")]).unwrap();

        let stored = reg.set("Awesome", "class", "Foo", "is pure-perl").unwrap();
        assert_eq!(stored, TagValue::from("is pure-perl"));
        assert_eq!(
            reg.get("Awesome", "class", "Foo").unwrap(),
            Some(&TagValue::from("is pure-perl"))
        );
    }

    #[test]
    fn unset_only_touches_direct_entry() {
        let mut reg = registry();
        awesome(&mut reg);
        reg.tag("Awesome", "Foo", "inherits").unwrap();
        reg.tag("Awesome", "Bar", [("inherits", 2)]).unwrap();

        assert_eq!(reg.unset("Awesome", "inherits", "Bar").unwrap(), Some(TagValue::Int(2)));
        assert_eq!(reg.unset("Awesome", "inherits", "Bar").unwrap(), None);
        assert_eq!(reg.get_direct("Awesome", "inherits", "Bar").unwrap(), None);
        assert_eq!(reg.get("Awesome", "inherits", "Bar").unwrap(), Some(&TagValue::Int(1)));
    }

    #[test]
    fn undeclaring_keeps_authority() {
        let mut reg = registry();
        awesome(&mut reg);
        reg.untag("Awesome", "Awesome", ["class", "pureperl", "inherits"]).unwrap();

        assert!(reg.declared_tags("Awesome").is_empty());
        assert!(reg.is_authority("Awesome"));
        assert!(matches!(
            reg.tag("Awesome", "Foo", "class"),
            Err(TagError::UndeclaredTag { .. })
        ));
    }

    #[test]
    fn removing_bootstrap_marker_keeps_bootstrap_working() {
        for bootstrap_wildcard in [true, false] {
            let config = RegistryConfig {
                bootstrap_wildcard,
                ..RegistryConfig::default()
            };
            let mut reg = TagRegistry::with_config(ClassGraph::build(CLASSES).unwrap(), config);
            reg.untag("Class::Tag", "Class::Tag", TAGGER_CLASS).unwrap();

            assert_eq!(reg.get_direct("Class::Tag", TAGGER_CLASS, "Class::Tag").unwrap(), None);
            assert!(reg.is_authority("Class::Tag"));
            assert!(reg.is_declared("Class::Tag", TAGGER_CLASS));
            assert_eq!(reg.authorities(), vec!["Class::Tag"]);

            reg.declare_authority("Awesome").unwrap().declare("class").unwrap();
            assert_eq!(reg.authorities(), vec!["Awesome", "Class::Tag"]);
            reg.tag("Awesome", "Foo", "class").unwrap();
        }
    }

    #[test]
    fn revoking_an_authority_marker() {
        let mut reg = registry();
        awesome(&mut reg);
        reg.untag("Class::Tag", "Awesome", TAGGER_CLASS).unwrap();

        assert!(!reg.is_authority("Awesome"));
        // Its declarations are independent entries and stay behind.
        assert_eq!(reg.declared_tags("Awesome"), vec!["class", "inherits", "pureperl"]);
        assert_eq!(
            reg.tag("Awesome", "Foo", "class"),
            Err(TagError::NotAnAuthority("Awesome".into()))
        );
    }

    #[test]
    fn non_atomic_batch_stops_at_collision() {
        let config = RegistryConfig {
            atomic_batches: false,
            ..RegistryConfig::default()
        };
        let mut reg = TagRegistry::with_config(ClassGraph::build(CLASSES).unwrap(), config);
        reg.declare_authority("Awesome").unwrap().declare_wildcard().unwrap();

        let result = reg.tag(
            "Awesome",
            "Foo",
            [("class", "is awesome"), ("import", "shadowed"), ("pureperl", "yes")],
        );
        assert_eq!(
            result,
            Err(TagError::AccessorCollision {
                authority: "Awesome".into(),
                name: "import".into(),
                owner: Owner::Host,
            })
        );
        assert_eq!(
            reg.get("Awesome", "class", "Foo").unwrap(),
            Some(&TagValue::from("is awesome"))
        );
        assert_eq!(reg.get("Awesome", "import", "Foo").unwrap(), None);
        assert_eq!(reg.get("Awesome", "pureperl", "Foo").unwrap(), None);
    }

    #[test]
    fn untag_batch_on_structured_instance() {
        let mut reg = registry();
        awesome(&mut reg);
        reg.tag("Awesome", "Foo", [("class", "is awesome")]).unwrap();

        let mut bar = Instance::new("Bar");
        reg.tag("Awesome", &mut bar, [("class", "is special"), ("pureperl", "yes")])
            .unwrap();
        assert_eq!(bar.override_count(), 2);

        reg.untag("Awesome", &mut bar, ["class", "pureperl"]).unwrap();
        assert_eq!(bar.override_count(), 0);
        assert_eq!(
            reg.get("Awesome", "class", &bar).unwrap(),
            Some(&TagValue::from("is awesome"))
        );
        assert_eq!(reg.get("Awesome", "pureperl", &bar).unwrap(), None);
    }

    #[test]
    fn non_authority_cannot_tag() {
        let mut reg = registry();
        assert_eq!(
            reg.tag("Foo", "Bar", "is"),
            Err(TagError::NotAnAuthority("Foo".into()))
        );
        assert!(reg.authority("Foo").is_err());
    }

    #[test]
    fn tagger_class_is_reserved() {
        let mut reg = registry();
        reg.declare_authority("Awesome").unwrap();
        reg.tag("Awesome", "Awesome", WILDCARD).unwrap();

        assert_eq!(
            reg.tag("Awesome", "Foo", TAGGER_CLASS),
            Err(TagError::ReservedTag(TAGGER_CLASS.into()))
        );
        assert_eq!(
            reg.tag("Awesome", "Awesome", TAGGER_CLASS),
            Err(TagError::ReservedTag(TAGGER_CLASS.into()))
        );
        assert!(!reg.is_authority("Foo"));
    }

    #[test]
    fn host_member_collides_with_declaration() {
        let mut reg = registry();
        reg.declare_authority("Awesome").unwrap();

        let err = reg.tag("Awesome", "Awesome", "import").unwrap_err();
        assert_eq!(
            err,
            TagError::AccessorCollision {
                authority: "Awesome".into(),
                name: "import".into(),
                owner: Owner::Host,
            }
        );
        assert!(!reg.is_declared("Awesome", "import"));
    }

    #[test]
    fn bound_member_collides_unless_owned() {
        let mut reg = registry();
        reg.declare_authority("Awesome").unwrap();
        reg.bind_member("Awesome", "version", Owner::Host).unwrap();
        reg.bind_member("Awesome", "label", Owner::Authority("Awesome".into()))
            .unwrap();

        assert!(matches!(
            reg.tag("Awesome", "Awesome", "version"),
            Err(TagError::AccessorCollision { .. })
        ));
        reg.tag("Awesome", "Awesome", "label").unwrap();
        assert!(reg.is_declared("Awesome", "label"));

        // A declared accessor cannot be rebound to a foreign owner.
        assert!(matches!(
            reg.bind_member("Awesome", "label", Owner::Host),
            Err(TagError::AccessorCollision { .. })
        ));
    }

    #[test]
    fn namespaces_are_isolated() {
        let mut reg = registry();
        for name in ["X", "Y"] {
            reg.declare_authority(name).unwrap();
            reg.tag(name, name, WILDCARD).unwrap();
        }
        reg.set("X", "color", "Foo", "red").unwrap();
        reg.set("Y", "color", "Foo", "blue").unwrap();

        assert_eq!(reg.get("X", "color", "Foo").unwrap(), Some(&TagValue::from("red")));
        assert_eq!(reg.get("Y", "color", "Foo").unwrap(), Some(&TagValue::from("blue")));
        assert_eq!(reg.get("Class::Tag", "color", "Foo").unwrap(), None);
    }

    #[test]
    fn structured_instance_copy_on_write() {
        let mut reg = registry();
        awesome(&mut reg);
        reg.tag("Awesome", "Foo", [("class", "is awesome")]).unwrap();

        let mut foo = Instance::new("Foo");
        assert_eq!(
            reg.get("Awesome", "class", &foo).unwrap(),
            Some(&TagValue::from("is awesome"))
        );

        reg.set("Awesome", "class", &mut foo, "just this one").unwrap();
        assert_eq!(
            reg.get("Awesome", "class", &foo).unwrap(),
            Some(&TagValue::from("just this one"))
        );
        // The class is untouched.
        assert_eq!(
            reg.get("Awesome", "class", "Foo").unwrap(),
            Some(&TagValue::from("is awesome"))
        );

        reg.untag("Awesome", &mut foo, "class").unwrap();
        assert_eq!(
            reg.get("Awesome", "class", &foo).unwrap(),
            Some(&TagValue::from("is awesome"))
        );
    }

    #[test]
    fn opaque_instance_uses_class() {
        let mut reg = registry();
        awesome(&mut reg);
        reg.set("Awesome", "class", TargetMut::Opaque("Bar"), "via instance").unwrap();

        assert_eq!(
            reg.get("Awesome", "class", "Bar").unwrap(),
            Some(&TagValue::from("via instance"))
        );
        assert_eq!(
            reg.get("Awesome", "class", Target::Opaque("Baz")).unwrap(),
            Some(&TagValue::from("via instance"))
        );
    }

    #[test]
    fn unowned_target_is_untagable() {
        let mut reg = registry();
        assert_eq!(
            reg.get("Class::Tag", "is", Target::Unowned),
            Err(TagError::UntagableTarget)
        );
        assert_eq!(
            reg.set("Class::Tag", "is", TargetMut::Unowned, 1),
            Err(TagError::UntagableTarget)
        );
        assert_eq!(
            reg.unset("Class::Tag", "is", TargetMut::Unowned),
            Err(TagError::UntagableTarget)
        );
    }

    #[test]
    fn accessor_requires_declaration() {
        let mut reg = registry();
        awesome(&mut reg);

        let accessor = reg.accessor("Awesome", "class").unwrap();
        assert_eq!(accessor, reg.accessor("Awesome", "class").unwrap());
        assert!(matches!(
            reg.accessor("Awesome", "author"),
            Err(TagError::UndeclaredTag { .. })
        ));
        assert!(reg.accessor("Class::Tag", "anything").is_ok());
    }
}
