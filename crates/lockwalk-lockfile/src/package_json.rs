//! `package.json` manifests.

use std::path::Path;

use indexmap::IndexMap;
use lockwalk_core::ManifestView;
use serde::{Deserialize, Deserializer};

use crate::error::{read_to_string, LockfileError, Result};

/// The parts of a `package.json` the walk needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PackageJson {
    pub name: Option<String>,
    pub version: Option<String>,
    #[serde(deserialize_with = "string_map")]
    pub dependencies: IndexMap<String, String>,
    #[serde(deserialize_with = "string_map")]
    pub peer_dependencies: IndexMap<String, String>,
    #[serde(deserialize_with = "string_map")]
    pub dev_dependencies: IndexMap<String, String>,
    #[serde(deserialize_with = "string_map")]
    pub optional_dependencies: IndexMap<String, String>,
    pub peer_dependencies_meta: IndexMap<String, PeerMeta>,
    pub workspaces: Option<Workspaces>,
}

/// `peerDependenciesMeta` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PeerMeta {
    pub optional: bool,
}

/// `workspaces`, either a plain pattern list or Yarn's object form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Workspaces {
    Patterns(Vec<String>),
    Object {
        #[serde(default)]
        packages: Vec<String>,
    },
}

/// Keep string values in file order, drop anything else (`"foo": null` and the like).
pub(crate) fn string_map<'de, D>(deserializer: D) -> std::result::Result<IndexMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<IndexMap<String, serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(name, value)| match value {
            serde_json::Value::String(spec) => Some((name, spec)),
            _ => None,
        })
        .collect())
}

impl PackageJson {
    /// Parse a manifest from a string. `path` is only used in errors.
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|source| LockfileError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn read(path: &Path) -> Result<Self> {
        Self::parse(path, &read_to_string(path)?)
    }

    /// Read `<dir>/package.json`.
    pub fn read_dir(dir: &Path) -> Result<Self> {
        Self::read(&dir.join("package.json"))
    }

    /// Declared groups for the walker.
    pub fn manifest(&self) -> ManifestView {
        ManifestView {
            dependencies: self.dependencies.clone(),
            peer_dependencies: self.peer_dependencies.clone(),
            dev_dependencies: self.dev_dependencies.clone(),
            optional_peers: self
                .peer_dependencies
                .keys()
                .filter(|name| self.is_optional_peer(name))
                .cloned()
                .collect(),
        }
    }

    /// Whether a peer dependency is flagged optional.
    pub fn is_optional_peer(&self, name: &str) -> bool {
        self.peer_dependencies_meta
            .get(name)
            .is_some_and(|meta| meta.optional)
    }

    /// Workspace glob patterns, `!` excludes included.
    pub fn workspace_patterns(&self) -> &[String] {
        match &self.workspaces {
            Some(Workspaces::Patterns(patterns)) => patterns,
            Some(Workspaces::Object { packages }) => packages,
            None => &[],
        }
    }

    /// Whether any declared dependency uses the `workspace:` protocol.
    pub fn uses_workspace_protocol(&self) -> bool {
        [
            &self.dependencies,
            &self.peer_dependencies,
            &self.dev_dependencies,
            &self.optional_dependencies,
        ]
        .into_iter()
        .flat_map(IndexMap::values)
        .any(|spec| spec.starts_with("workspace:"))
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("root")
    }

    pub fn display_version(&self) -> &str {
        self.version.as_deref().unwrap_or("0.0.0")
    }
}
