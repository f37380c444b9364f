//! `package-lock.json` and `npm-shrinkwrap.json`.
//!
//! Lock file versions 2 and 3 list every install location in a flat
//! `packages` map (`""` is the project itself). Version 1 nests
//! `dependencies` objects instead; those are flattened into the same
//! location-keyed shape first, with the project's own edges taken from
//! `package.json`.
//!
//! Edges are bound the way Node finds modules: from the dependent's location,
//! try `<location>/node_modules/<name>` and walk up to the root.

use std::path::Path;

use indexmap::IndexMap;
use lockwalk_core::{DependencyKind, GraphStore, NodeMeta};
use serde::Deserialize;
use tracing::{debug, trace, warn};

use crate::error::{read_to_string, LockfileError, Result};
use crate::package_json::{string_map, PackageJson, PeerMeta};

const NODE_MODULES: &str = "node_modules/";

/// Maps are kept in file order so edges are walked as declared.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawLock {
    name: Option<String>,
    version: Option<String>,
    lockfile_version: Option<u32>,
    packages: IndexMap<String, RawPackage>,
    dependencies: IndexMap<String, RawV1Dependency>,
}

/// One entry of the v2/v3 `packages` map.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawPackage {
    name: Option<String>,
    version: Option<String>,
    resolved: Option<String>,
    integrity: Option<String>,
    link: bool,
    dev: bool,
    optional: bool,
    dev_optional: bool,
    #[serde(deserialize_with = "string_map")]
    dependencies: IndexMap<String, String>,
    #[serde(deserialize_with = "string_map")]
    optional_dependencies: IndexMap<String, String>,
    #[serde(deserialize_with = "string_map")]
    peer_dependencies: IndexMap<String, String>,
    peer_dependencies_meta: IndexMap<String, PeerMeta>,
    #[serde(deserialize_with = "string_map")]
    dev_dependencies: IndexMap<String, String>,
}

/// One nested entry of a v1 `dependencies` tree.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawV1Dependency {
    version: Option<String>,
    resolved: Option<String>,
    integrity: Option<String>,
    dev: bool,
    optional: bool,
    #[serde(deserialize_with = "string_map")]
    requires: IndexMap<String, String>,
    dependencies: IndexMap<String, RawV1Dependency>,
}

/// Read a lock file and build its graph. `manifest` supplies the root's
/// edges for version 1 files.
pub fn load(path: &Path, manifest: &PackageJson) -> Result<GraphStore> {
    parse(path, &read_to_string(path)?, manifest)
}

/// Parse lock file content. `path` is only used in errors.
pub fn parse(path: &Path, content: &str, manifest: &PackageJson) -> Result<GraphStore> {
    let raw: RawLock = serde_json::from_str(content).map_err(|source| LockfileError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let version = raw.lockfile_version.unwrap_or(1);
    if version > 3 {
        warn!(path = %path.display(), version, "newer lock file version, reading as version 3");
    }

    let root_name = raw
        .name
        .as_deref()
        .unwrap_or_else(|| manifest.display_name())
        .to_string();
    let root_version = raw
        .version
        .as_deref()
        .unwrap_or_else(|| manifest.display_version())
        .to_string();

    let packages = if version >= 2 && !raw.packages.is_empty() {
        raw.packages
    } else if !raw.dependencies.is_empty() || version == 1 {
        flatten_v1(raw.dependencies, manifest)
    } else {
        return Err(LockfileError::parse(path, "no packages or dependencies"));
    };

    debug!(path = %path.display(), version, locations = packages.len(), "read npm lock file");
    Ok(build_graph(&packages, &root_name, &root_version))
}

/// Turn a v1 dependency tree into v2-style locations.
fn flatten_v1(
    dependencies: IndexMap<String, RawV1Dependency>,
    manifest: &PackageJson,
) -> IndexMap<String, RawPackage> {
    let mut packages = IndexMap::new();
    packages.insert(
        String::new(),
        RawPackage {
            dependencies: manifest.dependencies.clone(),
            dev_dependencies: manifest.dev_dependencies.clone(),
            optional_dependencies: manifest.optional_dependencies.clone(),
            peer_dependencies: manifest.peer_dependencies.clone(),
            peer_dependencies_meta: manifest.peer_dependencies_meta.clone(),
            ..RawPackage::default()
        },
    );

    let mut stack: Vec<(String, IndexMap<String, RawV1Dependency>)> =
        vec![(String::new(), dependencies)];
    while let Some((parent, dependencies)) = stack.pop() {
        for (name, dependency) in dependencies {
            let location = child_location(&parent, &name);
            let RawV1Dependency {
                version,
                resolved,
                integrity,
                dev,
                optional,
                requires,
                dependencies: nested,
            } = dependency;

            // Aliases record their target as `npm:real@1.0.0`.
            let alias = version.as_deref().filter(|v| v.starts_with("npm:"));
            let (real_name, version) = match alias.map(|spec| lockwalk_core::normalize(&name, spec)) {
                Some(normalized) => (Some(normalized.name), Some(normalized.spec)),
                None => (None, version),
            };

            packages.insert(
                location.clone(),
                RawPackage {
                    name: real_name,
                    version,
                    resolved,
                    integrity,
                    dev,
                    optional,
                    dependencies: requires,
                    ..RawPackage::default()
                },
            );
            if !nested.is_empty() {
                stack.push((location, nested));
            }
        }
    }
    packages
}

fn child_location(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        format!("{NODE_MODULES}{name}")
    } else {
        format!("{parent}/{NODE_MODULES}{name}")
    }
}

/// The location whose `node_modules` contains `location`, or `""`.
fn parent_location(location: &str) -> &str {
    match location.rfind(NODE_MODULES) {
        Some(index) => location[..index].trim_end_matches('/'),
        None => "",
    }
}

/// Package name implied by an install location.
fn name_from_location(location: &str) -> &str {
    match location.rfind(NODE_MODULES) {
        Some(index) => &location[index + NODE_MODULES.len()..],
        None => location.rsplit('/').next().unwrap_or(location),
    }
}

fn build_graph(
    packages: &IndexMap<String, RawPackage>,
    root_name: &str,
    root_version: &str,
) -> GraphStore {
    let mut store = GraphStore::new(root_name, root_version);

    for (location, package) in packages {
        if location.is_empty() || package.link {
            continue;
        }
        let name = package
            .name
            .as_deref()
            .unwrap_or_else(|| name_from_location(location));
        store.add_node(name, package.version.as_deref().unwrap_or_default(), location);
        store.set_meta(
            location,
            NodeMeta {
                integrity: package.integrity.clone(),
                resolved: package.resolved.clone(),
                dev: package.dev || package.dev_optional,
                optional: package.optional || package.dev_optional,
            },
        );
    }

    let root = RawPackage::default();
    add_edges(&mut store, packages, "", packages.get("").unwrap_or(&root));
    for (location, package) in packages {
        if !location.is_empty() && !package.link {
            add_edges(&mut store, packages, location, package);
        }
    }
    store
}

/// Bind the declared dependencies of the package at `location`. The root
/// also gets its dev dependencies.
fn add_edges(
    store: &mut GraphStore,
    packages: &IndexMap<String, RawPackage>,
    location: &str,
    package: &RawPackage,
) {
    let is_root = location.is_empty();
    let from = if is_root {
        Some(store.root())
    } else {
        store.find(location)
    };
    let Some(from) = from else {
        return;
    };

    let mut groups = vec![(&package.dependencies, DependencyKind::Prod)];
    if is_root {
        groups.push((&package.dev_dependencies, DependencyKind::Dev));
    }
    groups.push((&package.optional_dependencies, DependencyKind::Optional));

    let mut edges: Vec<(&str, &str, DependencyKind)> = Vec::new();
    for (group, kind) in groups {
        edges.extend(group.iter().map(|(n, s)| (n.as_str(), s.as_str(), kind)));
    }
    for (name, spec) in &package.peer_dependencies {
        let optional = package
            .peer_dependencies_meta
            .get(name)
            .is_some_and(|meta| meta.optional);
        let kind = if optional {
            DependencyKind::PeerOptional
        } else {
            DependencyKind::Peer
        };
        edges.push((name.as_str(), spec.as_str(), kind));
    }

    for (name, spec, kind) in edges {
        let target = lookup(packages, location, name).and_then(|found| store.find(found));
        if target.is_none() {
            trace!(from = location, name, "no installed package for edge");
        }
        store.add_edge(from, name, spec, kind, target);
    }
}

/// Find the location Node would load `name` from when required at `from`,
/// following `link` entries to their target.
fn lookup<'p>(packages: &'p IndexMap<String, RawPackage>, from: &str, name: &str) -> Option<&'p str> {
    let mut base = from;
    loop {
        let candidate = child_location(base, name);
        if let Some((location, package)) = packages.get_key_value(&candidate) {
            if package.link {
                let target = package.resolved.as_deref()?;
                return packages.get_key_value(target).map(|(k, _)| k.as_str());
            }
            return Some(location.as_str());
        }
        if base.is_empty() {
            return None;
        }
        base = parent_location(base);
    }
}
