//! Dependency specs and emitted package records.

use serde::{Deserialize, Serialize};

use crate::policy::Requiredness;

/// Which kind of group or edge a dependency came from.
///
/// Not portable across lock formats: pnpm and Yarn do not record peer
/// edges, and only the npm graph distinguishes optional peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyKind {
    /// `dependencies`
    Prod,
    /// `peerDependencies`
    Peer,
    /// `devDependencies`
    Dev,
    /// `optionalDependencies`
    Optional,
    /// `peerDependencies` flagged optional in `peerDependenciesMeta`
    PeerOptional,
}

impl DependencyKind {
    /// Edges of this kind may legitimately be absent from a lock record.
    pub fn is_optional(self) -> bool {
        matches!(self, DependencyKind::Optional | DependencyKind::PeerOptional)
    }

    /// The manifest field this kind is declared in.
    pub fn field_name(self) -> &'static str {
        match self {
            DependencyKind::Prod => "dependencies",
            DependencyKind::Peer | DependencyKind::PeerOptional => "peerDependencies",
            DependencyKind::Dev => "devDependencies",
            DependencyKind::Optional => "optionalDependencies",
        }
    }
}

impl std::fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DependencyKind::Prod => "prod",
            DependencyKind::Peer => "peer",
            DependencyKind::Dev => "dev",
            DependencyKind::Optional => "optional",
            DependencyKind::PeerOptional => "peer-optional",
        })
    }
}

/// A declared top-level dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpec {
    pub name: String,
    /// Range or alias spec as written in the manifest.
    pub range: String,
    pub requiredness: Requiredness,
    pub kind: DependencyKind,
}

impl DependencySpec {
    pub fn new(
        name: impl Into<String>,
        range: impl Into<String>,
        requiredness: Requiredness,
        kind: DependencyKind,
    ) -> Self {
        DependencySpec {
            name: name.into(),
            range: range.into(),
            requiredness,
            kind,
        }
    }
}

/// One emitted edge of the reconstructed tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageNode {
    /// Package name after alias rewriting.
    pub name: String,
    /// Requested range after alias rewriting.
    pub spec: String,
    /// Locked version.
    pub version: String,
    /// Where the artifact comes from (tarball URL, `local-path:` locator).
    pub resolved: Option<String>,
    /// Content integrity token, e.g. `sha512-...`.
    pub integrity: Option<String>,
    pub kind: DependencyKind,
    /// The name already appears among the ancestors; the node is not expanded.
    pub is_cycle: bool,
    /// 1 for a declared dependency, ancestors + 1 below it.
    pub depth: usize,
}

impl PackageNode {
    /// `name@version`
    pub fn id(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_kinds() {
        assert!(DependencyKind::Optional.is_optional());
        assert!(DependencyKind::PeerOptional.is_optional());
        assert!(!DependencyKind::Peer.is_optional());
        assert!(!DependencyKind::Prod.is_optional());
        assert!(!DependencyKind::Dev.is_optional());
    }

    #[test]
    fn kind_serializes_kebab_case() {
        let json = serde_json::to_string(&DependencyKind::PeerOptional).unwrap();
        assert_eq!(json, "\"peer-optional\"");
        assert_eq!(DependencyKind::PeerOptional.to_string(), "peer-optional");
        assert_eq!(DependencyKind::PeerOptional.field_name(), "peerDependencies");
    }

    #[test]
    fn node_id() {
        let node = PackageNode {
            name: "a".to_string(),
            spec: "^1.0.0".to_string(),
            version: "1.0.0".to_string(),
            resolved: None,
            integrity: None,
            kind: DependencyKind::Prod,
            is_cycle: false,
            depth: 1,
        };
        assert_eq!(node.id(), "a@1.0.0");
    }
}
