//! `pnpm-lock.yaml`.
//!
//! Version 5 keys packages `/name/version`. Version 6 writes `/name@version`
//! and version 9 drops the leading slash and moves dependency lists into a
//! `snapshots` map; all of them are canonicalized to `/name/version`, child
//! alias values included. Version 9 writes an aliased child as
//! `alias: real@1.0.0`, without the slash earlier versions used.

use std::collections::BTreeMap;
use std::path::Path;

use indexmap::IndexMap;
use lockwalk_core::{PathEntry, PathStore, Resolution};
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use crate::error::{read_to_string, LockfileError, Result};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawLock {
    lockfile_version: Option<serde_yaml::Value>,
    packages: IndexMap<String, RawPackage>,
    snapshots: IndexMap<String, RawSnapshot>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawPackage {
    resolution: Option<RawResolution>,
    #[serde(deserialize_with = "yaml_string_map")]
    dependencies: IndexMap<String, String>,
    #[serde(deserialize_with = "yaml_string_map")]
    optional_dependencies: IndexMap<String, String>,
    dev: Option<bool>,
    optional: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawSnapshot {
    #[serde(deserialize_with = "yaml_string_map")]
    dependencies: IndexMap<String, String>,
    #[serde(deserialize_with = "yaml_string_map")]
    optional_dependencies: IndexMap<String, String>,
    optional: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawResolution {
    integrity: Option<String>,
    tarball: Option<String>,
}

/// YAML reads `1.0` as a number; keep every scalar as text, in file order.
fn yaml_string_map<'de, D>(deserializer: D) -> std::result::Result<IndexMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<IndexMap<String, serde_yaml::Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(name, value)| scalar(&value).map(|spec| (name, spec)))
        .collect())
}

fn scalar(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Major lock file version.
fn major_version(value: Option<&serde_yaml::Value>) -> Option<u32> {
    let text = scalar(value?)?;
    let major = text.split('.').next()?;
    major.trim().parse().ok()
}

/// `/name@version`, `name@version` or `/name/version` → `/name/version`.
///
/// The split is at the first `@` after the name's scope marker, so peer
/// suffixes such as `(react@18.2.0)` stay with the version.
pub fn canonical_key(key: &str, major: u32) -> String {
    let bare = key.strip_prefix('/').unwrap_or(key);
    if major < 6 {
        return format!("/{bare}");
    }
    let at = bare
        .char_indices()
        .skip(1)
        .find(|&(_, c)| c == '@')
        .map(|(index, _)| index);
    match at {
        Some(index) => format!("/{}/{}", &bare[..index], &bare[index + 1..]),
        None => format!("/{bare}"),
    }
}

/// Whether a version 9 dependency value names another package
/// (`string-width@4.2.3`) rather than a version (`18.2.0(react@18.2.0)`).
fn is_bare_alias(spec: &str) -> bool {
    let version = spec.split('(').next().unwrap_or(spec);
    version.char_indices().skip(1).any(|(_, c)| c == '@')
}

fn canonical_deps(deps: IndexMap<String, String>, major: u32) -> Vec<(String, String)> {
    deps.into_iter()
        .map(|(name, spec)| {
            let spec = if spec.starts_with('/') || (major >= 9 && is_bare_alias(&spec)) {
                canonical_key(&spec, major)
            } else {
                spec
            };
            (name, spec)
        })
        .collect()
}

pub fn load(path: &Path) -> Result<PathStore> {
    parse(path, &read_to_string(path)?)
}

/// Parse lock file content. `path` is only used in errors.
pub fn parse(path: &Path, content: &str) -> Result<PathStore> {
    let raw: RawLock = serde_yaml::from_str(content).map_err(|source| LockfileError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    let major = major_version(raw.lockfile_version.as_ref())
        .ok_or_else(|| LockfileError::parse(path, "missing or invalid lockfileVersion"))?;
    if major < 5 {
        return Err(LockfileError::Unsupported {
            path: path.to_path_buf(),
            detail: format!("lockfileVersion {major} is older than 5"),
        });
    }
    if major > 6 {
        warn!(path = %path.display(), major, "newer pnpm lock file, reading with version 6 rules");
    }

    let mut store = PathStore::new();
    let has_snapshots = !raw.snapshots.is_empty();
    let mut resolutions: BTreeMap<String, Option<Resolution>> = BTreeMap::new();

    for (key, package) in raw.packages {
        let key = canonical_key(&key, major);
        let resolution = package.resolution.map(|r| Resolution {
            integrity: r.integrity,
            tarball: r.tarball,
        });
        if has_snapshots {
            resolutions.insert(key, resolution);
            continue;
        }
        store.insert(
            key,
            PathEntry {
                resolution,
                dependencies: canonical_deps(package.dependencies, major),
                optional_dependencies: canonical_deps(package.optional_dependencies, major),
                dev: package.dev.unwrap_or(false),
                optional: package.optional,
            },
        );
    }

    // Snapshot keys carry peer suffixes; their content record is under the
    // bare package key.
    for (key, snapshot) in raw.snapshots {
        let key = canonical_key(&key, major);
        let base = key.split('(').next().unwrap_or(&key);
        let resolution = resolutions.get(base).cloned().flatten();
        store.insert(
            key.clone(),
            PathEntry {
                resolution,
                dependencies: canonical_deps(snapshot.dependencies, major),
                optional_dependencies: canonical_deps(snapshot.optional_dependencies, major),
                dev: false,
                optional: snapshot.optional,
            },
        );
    }

    debug!(path = %path.display(), major, packages = store.len(), "read pnpm lock file");
    Ok(store)
}
