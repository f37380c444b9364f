//! Backing stores: the in-memory shapes of the three lock formats.
//!
//! The `LockStore` trait abstracts over them so the walker never branches on
//! format. Each store picks its own node handle type:
//!
//! - [`GraphStore`] (npm): an arena of nodes with ordered out-edges and a
//!   side index of metadata keyed by install location.
//! - [`FlatStore`] (Yarn classic): entries keyed by `name@spec` descriptors.
//! - [`PathStore`] (pnpm): entries keyed by `/name/version`, with a
//!   name → versions index built on first use.

use std::collections::HashMap;

use serde::Serialize;

use crate::package::DependencyKind;

pub mod flat;
pub mod graph;
pub mod path;

pub use flat::{FlatEntry, FlatStore};
pub use graph::{GraphStore, NodeId};
pub use path::{PathEntry, PathStore, Resolution};

/// Which lock format a store was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LockKind {
    Npm,
    Yarn,
    Pnpm,
}

impl std::fmt::Display for LockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            LockKind::Npm => "npm",
            LockKind::Yarn => "yarn",
            LockKind::Pnpm => "pnpm",
        })
    }
}

/// A dependency to resolve, before and after alias rewriting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request<'a> {
    /// Name as declared by the dependent (the install name).
    pub declared_name: &'a str,
    /// Spec as declared by the dependent.
    pub declared_spec: &'a str,
    /// Canonical target name.
    pub name: &'a str,
    /// Canonical target range.
    pub spec: &'a str,
}

/// A successfully located lock entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locked<N> {
    pub node: N,
    pub version: String,
    /// Store-specific position, used in error messages.
    pub location: Option<String>,
}

/// Resolution failed; `present` lists versions that were in the store for
/// the requested name but were rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Unresolved {
    pub present: Vec<String>,
}

impl Unresolved {
    pub fn missing() -> Self {
        Unresolved::default()
    }

    pub fn rejected(present: Vec<String>) -> Self {
        Unresolved { present }
    }
}

/// Integrity and origin data for a locked node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeMeta {
    pub integrity: Option<String>,
    pub resolved: Option<String>,
    pub dev: bool,
    pub optional: bool,
}

/// An outgoing dependency of a locked node, in store order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEdge {
    pub name: String,
    pub spec: String,
    pub kind: DependencyKind,
}

impl ChildEdge {
    pub fn new(name: impl Into<String>, spec: impl Into<String>, kind: DependencyKind) -> Self {
        ChildEdge {
            name: name.into(),
            spec: spec.into(),
            kind,
        }
    }
}

/// Package name → every version present in a store.
///
/// Built once per walk and only read afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateIndex {
    versions: HashMap<String, Vec<String>>,
}

impl CandidateIndex {
    /// Versions recorded for `name`, in store order.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.versions.get(name).map(Vec::as_slice)
    }

    /// Number of distinct package names.
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

impl FromIterator<(String, String)> for CandidateIndex {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut versions: HashMap<String, Vec<String>> = HashMap::new();
        for (name, version) in iter {
            let list = versions.entry(name).or_default();
            if !list.contains(&version) {
                list.push(version);
            }
        }
        CandidateIndex { versions }
    }
}

/// Uniform capability over one lock format.
///
/// `parent` is `None` for dependencies declared in the manifest and the
/// dependent's handle otherwise.
pub trait LockStore {
    /// Handle to one locked entry.
    type Node;

    /// The format this store was built from.
    fn kind(&self) -> LockKind;

    /// Build the name → versions index. Stores that resolve without one
    /// keep the default empty index.
    fn candidate_index(&self) -> CandidateIndex {
        CandidateIndex::default()
    }

    /// Locate the entry a request refers to.
    fn resolve(
        &self,
        parent: Option<&Self::Node>,
        request: &Request<'_>,
        index: &CandidateIndex,
    ) -> Result<Locked<Self::Node>, Unresolved>;

    /// Integrity and origin for a located entry; `None` if the store has no
    /// content record for it.
    fn metadata(&self, node: &Self::Node) -> Option<NodeMeta>;

    /// Outgoing dependencies, in store order.
    fn children(&self, node: &Self::Node) -> Vec<ChildEdge>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_index_groups_by_name() {
        let index: CandidateIndex = [
            ("a".to_string(), "1.0.0".to_string()),
            ("b".to_string(), "2.0.0".to_string()),
            ("a".to_string(), "1.2.0".to_string()),
            ("a".to_string(), "1.0.0".to_string()),
        ]
        .into_iter()
        .collect();

        assert_eq!(index.len(), 2);
        assert_eq!(index.get("a").unwrap(), ["1.0.0", "1.2.0"]);
        assert_eq!(index.get("c"), None);
    }
}
