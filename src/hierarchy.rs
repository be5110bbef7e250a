//! Class hierarchy: the "is-a" relation the registry walks on lookup.
//!
//! The registry only needs [`Hierarchy::ancestors`]. [`ClassGraph`] is the
//! bundled implementation: single or multiple inheritance, built from a static
//! [`ClassDef`] table (usually emitted by the `hierarchy!` macro) and
//! extensible at runtime.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::HierarchyError;

/// Host-supplied inheritance accessor.
pub trait Hierarchy {
    /// Ancestors of `ty` in method-resolution order, excluding `ty` itself.
    ///
    /// Must be deterministic and free of duplicates. Unknown types have no
    /// ancestors.
    fn ancestors(&self, ty: &str) -> Vec<String>;

    /// Whether `ty` itself defines a non-tag member called `name`.
    ///
    /// Used to reject tag accessors that would clash with existing members.
    fn has_member(&self, _ty: &str, _name: &str) -> bool {
        false
    }
}

/// Any `Fn(&str) -> Vec<String>` is a hierarchy without members.
impl<F> Hierarchy for F
where
    F: Fn(&str) -> Vec<String>,
{
    fn ancestors(&self, ty: &str) -> Vec<String> {
        self(ty)
    }
}

/// Method-resolution order used by [`ClassGraph`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mro {
    /// Depth-first, left-to-right, first occurrence wins.
    #[default]
    Dfs,
    /// C3 linearization; falls back to `Dfs` on an inconsistent hierarchy.
    C3,
}

/// Definition of a class (used for graph building from macro).
#[derive(Clone, Copy, Debug)]
pub struct ClassDef {
    pub name: &'static str,
    pub parents: &'static [&'static str],
    pub members: &'static [&'static str],
}

impl ClassDef {
    pub const fn new(name: &'static str, parents: &'static [&'static str]) -> Self {
        Self {
            name,
            parents,
            members: &[],
        }
    }

    pub const fn with_members(mut self, members: &'static [&'static str]) -> Self {
        self.members = members;
        self
    }
}

/// Runtime entry for a registered class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassEntry {
    pub name: String,
    pub parents: Vec<String>,
    pub members: HashSet<String>,
    /// True if this class was registered at runtime (not from macro).
    pub is_dynamic: bool,
}

/// Class graph with multiple inheritance.
///
/// Provides:
/// - Name → parents lookup
/// - Ancestor linearization (DFS or C3)
/// - Dynamic class registration at runtime
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClassGraph {
    mro: Mro,
    entries: Vec<ClassEntry>,
    name_to_idx: HashMap<String, usize>,
}

impl ClassGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from class definitions (from macro).
    ///
    /// Every parent must be defined in the same table and the graph must be
    /// acyclic.
    pub fn build(defs: &[ClassDef]) -> Result<Self, HierarchyError> {
        Self::validate_defs(defs)?;

        let mut graph = Self::new();
        for def in defs {
            graph.push_entry(
                def.name.to_string(),
                def.parents.iter().map(|p| p.to_string()).collect(),
                def.members.iter().map(|m| m.to_string()).collect(),
                false,
            );
        }

        if let Some(name) = graph.find_cycle() {
            return Err(HierarchyError::Cycle(name));
        }
        Ok(graph)
    }

    /// Builder method: select the method-resolution order.
    pub fn with_mro(mut self, mro: Mro) -> Self {
        self.mro = mro;
        self
    }

    #[inline]
    pub fn mro(&self) -> Mro {
        self.mro
    }

    #[inline]
    pub fn set_mro(&mut self, mro: Mro) {
        self.mro = mro;
    }

    /// Register a class at runtime.
    ///
    /// Unknown parents are created as root classes. Registering the same
    /// class again with identical parents is a no-op.
    ///
    /// # Errors
    ///
    /// - Returns error if the name is empty
    /// - Returns error if the class lists itself as a parent
    /// - Returns error if the class exists with different parents
    pub fn register(&mut self, name: &str, parents: &[&str]) -> Result<(), HierarchyError> {
        if name.is_empty() || parents.iter().any(|p| p.is_empty()) {
            return Err(HierarchyError::EmptyName);
        }
        if parents.contains(&name) {
            return Err(HierarchyError::Cycle(name.to_string()));
        }
        check_distinct_parents(name, parents)?;

        if let Some(&idx) = self.name_to_idx.get(name) {
            let existing = &self.entries[idx].parents;
            if existing.iter().map(String::as_str).eq(parents.iter().copied()) {
                return Ok(());
            }
            return Err(HierarchyError::ParentMismatch {
                class: name.to_string(),
                existing: existing.clone(),
            });
        }

        for parent in parents {
            if !self.name_to_idx.contains_key(*parent) {
                self.push_entry(parent.to_string(), Vec::new(), HashSet::new(), true);
            }
        }
        self.push_entry(
            name.to_string(),
            parents.iter().map(|p| p.to_string()).collect(),
            HashSet::new(),
            true,
        );
        Ok(())
    }

    /// Record a non-tag member defined by `ty`. Unknown classes are created
    /// as roots.
    pub fn add_member(&mut self, ty: &str, member: &str) {
        let idx = match self.name_to_idx.get(ty) {
            Some(&idx) => idx,
            None => self.push_entry(ty.to_string(), Vec::new(), HashSet::new(), true),
        };
        self.entries[idx].members.insert(member.to_string());
    }

    #[inline]
    pub fn contains(&self, ty: &str) -> bool {
        self.name_to_idx.contains_key(ty)
    }

    #[inline]
    pub fn get(&self, ty: &str) -> Option<&ClassEntry> {
        self.name_to_idx.get(ty).map(|&i| &self.entries[i])
    }

    /// Direct parents of `ty`, in declaration order.
    pub fn parents(&self, ty: &str) -> &[String] {
        self.get(ty).map(|e| e.parents.as_slice()).unwrap_or(&[])
    }

    /// Total number of registered classes.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate all entries in registration order.
    pub fn entries(&self) -> &[ClassEntry] {
        &self.entries
    }

    /// Whether `candidate` is `ancestor` or inherits from it.
    pub fn is_a(&self, candidate: &str, ancestor: &str) -> bool {
        candidate == ancestor || self.ancestors(candidate).iter().any(|a| a == ancestor)
    }

    fn push_entry(
        &mut self,
        name: String,
        parents: Vec<String>,
        members: HashSet<String>,
        is_dynamic: bool,
    ) -> usize {
        let idx = self.entries.len();
        self.name_to_idx.insert(name.clone(), idx);
        self.entries.push(ClassEntry {
            name,
            parents,
            members,
            is_dynamic,
        });
        idx
    }

    fn validate_defs(defs: &[ClassDef]) -> Result<(), HierarchyError> {
        let mut names = HashSet::new();
        for def in defs {
            if def.name.is_empty() {
                return Err(HierarchyError::EmptyName);
            }
            if !names.insert(def.name) {
                return Err(HierarchyError::Duplicate(def.name.to_string()));
            }
        }
        for def in defs {
            check_distinct_parents(def.name, def.parents)?;
            for parent in def.parents {
                if !names.contains(parent) {
                    return Err(HierarchyError::MissingParent {
                        class: def.name.to_string(),
                        parent: parent.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Three-colour DFS; returns a class on the first cycle found.
    fn find_cycle(&self) -> Option<String> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            Active,
            Done,
        }

        fn visit(graph: &ClassGraph, idx: usize, marks: &mut [Mark]) -> Option<String> {
            marks[idx] = Mark::Active;
            for parent in &graph.entries[idx].parents {
                let Some(&p) = graph.name_to_idx.get(parent) else {
                    continue;
                };
                match marks[p] {
                    Mark::Active => return Some(parent.clone()),
                    Mark::New => {
                        if let Some(name) = visit(graph, p, marks) {
                            return Some(name);
                        }
                    }
                    Mark::Done => {}
                }
            }
            marks[idx] = Mark::Done;
            None
        }

        let mut marks = vec![Mark::New; self.entries.len()];
        (0..self.entries.len()).find_map(|idx| match marks[idx] {
            Mark::New => visit(self, idx, &mut marks),
            _ => None,
        })
    }

    fn dfs_ancestors(&self, ty: &str) -> Vec<String> {
        fn walk(graph: &ClassGraph, ty: &str, seen: &mut HashSet<String>, out: &mut Vec<String>) {
            for parent in graph.parents(ty) {
                if seen.insert(parent.clone()) {
                    out.push(parent.clone());
                    walk(graph, parent, seen, out);
                }
            }
        }

        let mut seen = HashSet::from([ty.to_string()]);
        let mut out = Vec::new();
        walk(self, ty, &mut seen, &mut out);
        out
    }

    /// C3 linearization of `ty`, including `ty` itself.
    ///
    /// Returns `None` if no consistent order exists.
    fn c3_linearize(&self, ty: &str) -> Option<Vec<String>> {
        let mut memo = HashMap::new();
        self.c3_memoized(ty, &mut memo)
    }

    /// Each class is linearized once per lookup; shared ancestors reuse the
    /// memoized result.
    fn c3_memoized<'g>(
        &'g self,
        ty: &'g str,
        memo: &mut HashMap<&'g str, Option<Vec<String>>>,
    ) -> Option<Vec<String>> {
        if let Some(done) = memo.get(ty) {
            return done.clone();
        }

        let parents = self.parents(ty);
        let mut sequences: Vec<Vec<String>> = Vec::with_capacity(parents.len() + 1);
        for parent in parents {
            match self.c3_memoized(parent, memo) {
                Some(order) => sequences.push(order),
                None => {
                    memo.insert(ty, None);
                    return None;
                }
            }
        }
        sequences.push(parents.to_vec());

        let order = Self::c3_merge(ty, sequences);
        memo.insert(ty, order.clone());
        order
    }

    fn c3_merge(ty: &str, sequences: Vec<Vec<String>>) -> Option<Vec<String>> {
        // Sequences are consumed front to back through a cursor per sequence.
        let mut cursors = vec![0usize; sequences.len()];
        let mut out = vec![ty.to_string()];
        loop {
            let live: Vec<usize> = (0..sequences.len())
                .filter(|&i| cursors[i] < sequences[i].len())
                .collect();
            if live.is_empty() {
                return Some(out);
            }
            // A head is a valid candidate if it appears in no tail.
            let head = live.iter().map(|&i| &sequences[i][cursors[i]]).find(|candidate| {
                live.iter()
                    .all(|&j| !sequences[j][cursors[j] + 1..].contains(candidate))
            })?;
            let head = head.clone();
            for &i in &live {
                if sequences[i][cursors[i]] == head {
                    cursors[i] += 1;
                }
            }
            out.push(head);
        }
    }
}

fn check_distinct_parents(class: &str, parents: &[&str]) -> Result<(), HierarchyError> {
    for (i, parent) in parents.iter().enumerate() {
        if parents[..i].contains(parent) {
            return Err(HierarchyError::DuplicateParent {
                class: class.to_string(),
                parent: parent.to_string(),
            });
        }
    }
    Ok(())
}

impl Hierarchy for ClassGraph {
    fn ancestors(&self, ty: &str) -> Vec<String> {
        match self.mro {
            Mro::Dfs => self.dfs_ancestors(ty),
            Mro::C3 => match self.c3_linearize(ty) {
                Some(mut order) => {
                    order.remove(0);
                    order
                }
                None => {
                    warn!(class = ty, "inconsistent hierarchy for C3, falling back to DFS order");
                    self.dfs_ancestors(ty)
                }
            },
        }
    }

    fn has_member(&self, ty: &str, name: &str) -> bool {
        self.get(ty).is_some_and(|e| e.members.contains(name))
    }
}

// =============================================================================
// Tests
// =============================================================================
