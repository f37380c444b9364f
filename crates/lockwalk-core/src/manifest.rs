//! The manifest's declared dependency groups, and how hard to try for each.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::package::{DependencyKind, DependencySpec};
use crate::policy::Requiredness;

/// Declared name → range maps, in declaration order, as read from a
/// `package.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestView {
    pub dependencies: IndexMap<String, String>,
    pub peer_dependencies: IndexMap<String, String>,
    pub dev_dependencies: IndexMap<String, String>,
    /// Peers flagged `peerDependenciesMeta.<name>.optional`.
    pub optional_peers: BTreeSet<String>,
}

/// Requiredness per dependency group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GroupPolicy {
    pub production: Requiredness,
    pub peer: Requiredness,
    pub dev: Requiredness,
}

impl Default for GroupPolicy {
    fn default() -> Self {
        GroupPolicy {
            production: Requiredness::Require,
            peer: Requiredness::BestEffort,
            dev: Requiredness::BestEffort,
        }
    }
}

impl ManifestView {
    /// Flatten the groups into top-level specs: production, then peer, then
    /// dev, each in declaration order. Groups whose policy is `Skip` are left
    /// out entirely. Optional peers become `PeerOptional` specs that the
    /// walker skips.
    pub fn specs(&self, policy: &GroupPolicy) -> Vec<DependencySpec> {
        let groups = [
            (&self.dependencies, policy.production, DependencyKind::Prod),
            (&self.peer_dependencies, policy.peer, DependencyKind::Peer),
            (&self.dev_dependencies, policy.dev, DependencyKind::Dev),
        ];

        let mut specs = Vec::new();
        for (group, requiredness, kind) in groups {
            if requiredness == Requiredness::Skip {
                continue;
            }
            for (name, range) in group {
                let kind = if kind == DependencyKind::Peer && self.optional_peers.contains(name) {
                    DependencyKind::PeerOptional
                } else {
                    kind
                };
                specs.push(DependencySpec::new(name, range, requiredness.for_edge(kind), kind));
            }
        }
        specs
    }

    /// Total number of declared dependencies across all groups.
    pub fn len(&self) -> usize {
        self.dependencies.len() + self.peer_dependencies.len() + self.dev_dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
