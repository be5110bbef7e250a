//! Shared registry for multi-threaded hosts.
//!
//! Registration happens mostly at startup while lookups happen everywhere,
//! so the whole registry sits behind one reader-writer lock.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::TagError;
use crate::hierarchy::{ClassGraph, Hierarchy};
use crate::registry::TagRegistry;
use crate::tag_set::TagSet;
use crate::target::{Target, TargetMut};
use crate::value::TagValue;

/// Cloneable handle to a registry guarded by a single `RwLock`.
pub struct SharedRegistry<H = ClassGraph> {
    inner: Arc<RwLock<TagRegistry<H>>>,
}

impl<H> Clone for SharedRegistry<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H: Hierarchy> SharedRegistry<H> {
    pub fn new(registry: TagRegistry<H>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    /// Lock for reading. Hold the guard only for the duration of a lookup.
    pub fn read(&self) -> RwLockReadGuard<'_, TagRegistry<H>> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, TagRegistry<H>> {
        self.inner.write()
    }

    /// Inheritance-aware lookup returning an owned value.
    pub fn get<'a>(
        &self,
        authority: &str,
        tag: &str,
        target: impl Into<Target<'a>>,
    ) -> Result<Option<TagValue>, TagError> {
        let target: Target<'a> = target.into();
        Ok(self.read().get(authority, tag, target)?.cloned())
    }

    pub fn set<'t>(
        &self,
        authority: &str,
        tag: &str,
        target: impl Into<TargetMut<'t>>,
        value: impl Into<TagValue>,
    ) -> Result<TagValue, TagError> {
        self.write().set(authority, tag, target, value)
    }

    pub fn tag<'t>(
        &self,
        authority: &str,
        target: impl Into<TargetMut<'t>>,
        tags: impl Into<TagSet>,
    ) -> Result<(), TagError> {
        self.write().tag(authority, target, tags)
    }

    pub fn untag<'t>(
        &self,
        authority: &str,
        target: impl Into<TargetMut<'t>>,
        tags: impl Into<TagSet>,
    ) -> Result<(), TagError> {
        self.write().untag(authority, target, tags)
    }

    /// Run `f` with exclusive access, e.g. to declare an authority and its
    /// vocabulary in one critical section.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut TagRegistry<H>) -> R) -> R {
        f(&mut self.write())
    }
}

impl<H> From<TagRegistry<H>> for SharedRegistry<H> {
    fn from(registry: TagRegistry<H>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn readers_see_writes_across_threads() {
        let mut graph = ClassGraph::new();
        graph.register("Bar", &["Foo"]).unwrap();
        let shared = SharedRegistry::new(TagRegistry::new(graph));

        shared
            .with_mut(|reg| -> Result<(), TagError> {
                reg.declare_authority("Awesome")?.declare("class")?;
                reg.tag("Awesome", "Foo", [("class", "is awesome")])
            })
            .unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || shared.get("Awesome", "class", "Bar").unwrap())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some(TagValue::from("is awesome")));
        }
    }

    #[test]
    fn errors_surface_through_lock() {
        let shared = SharedRegistry::from(TagRegistry::default());
        assert_eq!(
            shared.tag("Nobody", "Foo", "is"),
            Err(TagError::NotAnAuthority("Nobody".into()))
        );
        assert_eq!(shared.set("Class::Tag", "is", "Foo", 3).unwrap(), TagValue::Int(3));
        shared.untag("Class::Tag", "Foo", "is").unwrap();
        assert_eq!(shared.get("Class::Tag", "is", "Foo").unwrap(), None);
    }
}
