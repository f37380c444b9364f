//! Path-keyed store for pnpm lock records.
//!
//! Entries are keyed `/name/version`, scoped names included
//! (`/@scope/pkg/1.0.0`). Child dependencies carry exact versions, sometimes
//! with a peer suffix (`1.0.9_request@2.88.0`), which is why an exact textual
//! hit in the candidate list wins before any range matching.

use std::collections::BTreeMap;

use tracing::trace;

use super::{CandidateIndex, ChildEdge, LockKind, LockStore, Locked, NodeMeta, Request, Unresolved};
use crate::package::DependencyKind;
use crate::version;

/// `resolution:` block of a pnpm entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub integrity: Option<String>,
    pub tarball: Option<String>,
}

/// One locked package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathEntry {
    /// Absent for entries pnpm could not record content for.
    pub resolution: Option<Resolution>,
    pub dependencies: Vec<(String, String)>,
    pub optional_dependencies: Vec<(String, String)>,
    pub dev: bool,
    pub optional: bool,
}

/// pnpm `packages:` map.
#[derive(Debug, Clone, Default)]
pub struct PathStore {
    packages: BTreeMap<String, PathEntry>,
}

/// `/name/version` for a package.
pub fn package_key(name: &str, version: &str) -> String {
    format!("/{name}/{version}")
}

/// Split a `/name/version` key. Returns `None` for anything else.
///
/// A parenthesized peer suffix may itself contain scoped names, so only the
/// part before it is searched for the separator.
pub fn split_key(key: &str) -> Option<(&str, &str)> {
    let rest = key.strip_prefix('/')?;
    let plain = &rest[..rest.find('(').unwrap_or(rest.len())];
    let slash = plain.rfind('/')?;
    let (name, version) = (&rest[..slash], &rest[slash + 1..]);
    (!name.is_empty() && !version.is_empty()).then_some((name, version))
}

/// Drop a peer suffix: `1.0.9_request@2.88.0` and `1.0.9(request@2.88.0)`
/// both become `1.0.9`.
fn peerless(version: &str) -> &str {
    let end = version.find(['_', '(']).unwrap_or(version.len());
    &version[..end]
}

impl PathStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, entry: PathEntry) {
        self.packages.insert(key.into(), entry);
    }

    pub fn get(&self, key: &str) -> Option<&PathEntry> {
        self.packages.get(key)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    fn pick(candidates: &[String], spec: &str) -> Option<String> {
        if let Some(exact) = candidates.iter().find(|c| c.as_str() == spec) {
            return Some(exact.clone());
        }
        if let Some(found) = version::resolve(candidates, spec) {
            return Some(found);
        }
        // Peer-suffixed keys do not parse as versions; match on the base.
        let bases: Vec<&str> = candidates.iter().map(|c| peerless(c)).collect();
        let base = version::resolve(bases.as_slice(), peerless(spec))?;
        candidates.iter().find(|c| peerless(c) == base).cloned()
    }
}

impl LockStore for PathStore {
    type Node = String;

    fn kind(&self) -> LockKind {
        LockKind::Pnpm
    }

    fn candidate_index(&self) -> CandidateIndex {
        self.packages
            .keys()
            .filter_map(|key| split_key(key))
            .map(|(name, version)| (name.to_string(), version.to_string()))
            .collect()
    }

    fn resolve(
        &self,
        _parent: Option<&String>,
        request: &Request<'_>,
        index: &CandidateIndex,
    ) -> Result<Locked<String>, Unresolved> {
        let candidates = index.get(request.name).ok_or_else(Unresolved::missing)?;
        let version = Self::pick(candidates, request.spec).ok_or_else(|| {
            trace!(name = request.name, spec = request.spec, ?candidates, "no candidate satisfies");
            Unresolved::rejected(candidates.to_vec())
        })?;

        let key = package_key(request.name, &version);
        if !self.packages.contains_key(&key) {
            return Err(Unresolved::missing());
        }
        Ok(Locked {
            node: key.clone(),
            version,
            location: Some(key),
        })
    }

    fn metadata(&self, node: &String) -> Option<NodeMeta> {
        let entry = self.packages.get(node)?;
        let resolution = entry.resolution.as_ref()?;
        Some(NodeMeta {
            integrity: resolution.integrity.clone(),
            resolved: resolution.tarball.clone(),
            dev: entry.dev,
            optional: entry.optional,
        })
    }

    fn children(&self, node: &String) -> Vec<ChildEdge> {
        let Some(entry) = self.packages.get(node) else {
            return Vec::new();
        };
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
