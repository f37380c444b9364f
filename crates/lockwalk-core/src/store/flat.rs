//! Flat store for Yarn classic lock records.
//!
//! Every entry is reachable through one or more `name@spec` descriptors, the
//! same way the lock file groups them (`"a@^1.0.0", "a@^1.1.0":`). Yarn has
//! already picked a version per descriptor, so resolution is a key lookup.

use std::collections::HashMap;

use super::{CandidateIndex, ChildEdge, LockKind, LockStore, Locked, NodeMeta, Request, Unresolved};
use crate::package::DependencyKind;

/// One locked package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatEntry {
    pub name: String,
    pub version: String,
    pub resolved: Option<String>,
    pub integrity: Option<String>,
    /// `dependencies`, in file order.
    pub dependencies: Vec<(String, String)>,
    /// `optionalDependencies`, in file order.
    pub optional_dependencies: Vec<(String, String)>,
}

/// Descriptor-keyed Yarn entries.
#[derive(Debug, Clone, Default)]
pub struct FlatStore {
    entries: Vec<FlatEntry>,
    keys: HashMap<String, usize>,
}

fn descriptor(name: &str, spec: &str) -> String {
    format!("{name}@{spec}")
}

impl FlatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry under every descriptor that points at it.
    pub fn insert<I, S>(&mut self, descriptors: I, entry: FlatEntry) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = self.entries.len();
        self.entries.push(entry);
        for key in descriptors {
            self.keys.insert(key.into(), id);
        }
        id
    }

    /// Entry for an exact `name@spec` descriptor.
    pub fn get(&self, name: &str, spec: &str) -> Option<&FlatEntry> {
        self.keys.get(&descriptor(name, spec)).map(|&id| &self.entries[id])
    }

    pub fn entry(&self, id: usize) -> &FlatEntry {
        &self.entries[id]
    }

    pub fn entries(&self) -> &[FlatEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, name: &str, spec: &str) -> Option<usize> {
        self.keys.get(&descriptor(name, spec)).copied()
    }
}

impl LockStore for FlatStore {
    type Node = usize;

    fn kind(&self) -> LockKind {
        LockKind::Yarn
    }

    fn resolve(
        &self,
        _parent: Option<&usize>,
        request: &Request<'_>,
        _index: &CandidateIndex,
    ) -> Result<Locked<usize>, Unresolved> {
        // Yarn keys aliased entries by the declared descriptor
        // (`alias@npm:real@1.0.0`), so try that before the canonical one.
        let id = self
            .lookup(request.declared_name, request.declared_spec)
            .or_else(|| self.lookup(request.name, request.spec))
            .ok_or_else(|| {
                let mut present: Vec<String> = self
                    .entries
                    .iter()
                    .filter(|e| e.name == request.name)
                    .map(|e| e.version.clone())
                    .collect();
                present.sort();
                present.dedup();
                Unresolved::rejected(present)
            })?;

        let entry = &self.entries[id];
        Ok(Locked {
            node: id,
            version: entry.version.clone(),
            location: Some(descriptor(&entry.name, &entry.version)),
        })
    }

    fn metadata(&self, node: &usize) -> Option<NodeMeta> {
        let entry = &self.entries[*node];
        Some(NodeMeta {
            integrity: entry.integrity.clone(),
            resolved: entry.resolved.clone(),
            ..NodeMeta::default()
        })
    }

    fn children(&self, node: &usize) -> Vec<ChildEdge> {
        let entry = &self.entries[*node];
        let prod = entry
            .dependencies
            .iter()
            .map(|(name, spec)| ChildEdge::new(name.as_str(), spec.as_str(), DependencyKind::Prod));
        let optional = entry.optional_dependencies.iter().map(|(name, spec)| {
            ChildEdge::new(name.as_str(), spec.as_str(), DependencyKind::Optional)
        });
        prod.chain(optional).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> FlatStore {
        let mut store = FlatStore::new();
        store.insert(
            ["a@^1.0.0", "a@^1.1.0"],
            FlatEntry {
                name: "a".into(),
                version: "1.2.0".into(),
                integrity: Some("sha512-a".into()),
                dependencies: vec![("b".into(), "^2.0.0".into())],
                optional_dependencies: vec![("fsevents".into(), "^2.3.0".into())],
                ..FlatEntry::default()
            },
        );
        store.insert(
            ["b@^2.0.0"],
            FlatEntry {
                name: "b".into(),
                version: "2.0.1".into(),
                ..FlatEntry::default()
            },
        );
        store.insert(
            ["table-types@npm:@types/table@6.0.0"],
            FlatEntry {
                name: "@types/table".into(),
                version: "6.0.0".into(),
                ..FlatEntry::default()
            },
        );
        store
    }

    fn request<'a>(name: &'a str, spec: &'a str) -> Request<'a> {
        Request {
            declared_name: name,
            declared_spec: spec,
            name,
            spec,
        }
    }

    #[test]
    fn every_descriptor_reaches_the_entry() {
        let store = store();
        let index = CandidateIndex::default();
        let first = store.resolve(None, &request("a", "^1.0.0"), &index).unwrap();
        let second = store.resolve(None, &request("a", "^1.1.0"), &index).unwrap();
        assert_eq!(first.node, second.node);
        assert_eq!(first.version, "1.2.0");
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn aliased_descriptor_is_tried_first() {
        let store = store();
        let req = Request {
            declared_name: "table-types",
            declared_spec: "npm:@types/table@6.0.0",
            name: "@types/table",
            spec: "6.0.0",
        };
        let locked = store.resolve(None, &req, &CandidateIndex::default()).unwrap();
        assert_eq!(store.entry(locked.node).name, "@types/table");
    }

    #[test]
    fn unknown_descriptor_lists_present_versions() {
        let store = store();
        let err = store
            .resolve(None, &request("a", "^3.0.0"), &CandidateIndex::default())
            .unwrap_err();
        assert_eq!(err.present, ["1.2.0"]);
        let err = store
            .resolve(None, &request("nope", "*"), &CandidateIndex::default())
            .unwrap_err();
        assert!(err.present.is_empty());
    }

    #[test]
    fn present_versions_are_listed_once() {
        let mut store = store();
        for (descriptor, version) in [("a@~1.3.0", "1.3.0"), ("a@git+ssh://host/a", "1.2.0")] {
            store.insert(
                [descriptor],
                FlatEntry {
                    name: "a".into(),
                    version: version.into(),
                    ..FlatEntry::default()
                },
            );
        }
        let err = store
            .resolve(None, &request("a", "^3.0.0"), &CandidateIndex::default())
            .unwrap_err();
        assert_eq!(err.present, ["1.2.0", "1.3.0"]);
    }

    #[test]
    fn children_put_optional_last() {
        let store = store();
        let id = store.resolve(None, &request("a", "^1.0.0"), &CandidateIndex::default()).unwrap().node;
        let children = store.children(&id);
        assert_eq!(children[0], ChildEdge::new("b", "^2.0.0", DependencyKind::Prod));
        assert_eq!(children[1].kind, DependencyKind::Optional);
        assert_eq!(store.metadata(&id).unwrap().integrity.as_deref(), Some("sha512-a"));
    }
}
