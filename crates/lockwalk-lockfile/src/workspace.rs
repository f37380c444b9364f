//! Workspace package discovery for `workspace:` specs.
//!
//! The workspace root is the nearest directory at or above the package that
//! has a `pnpm-workspace.yaml`, or a `package.json` with a `workspaces`
//! field. Its member patterns are globs relative to that root; patterns
//! starting with `!` exclude.

use std::path::{Component, Path, PathBuf};

use glob::Pattern;
use lockwalk_core::{WorkspaceIndex, WorkspacePackage};
use serde::Deserialize;
use tracing::{debug, trace};

use crate::error::{read_to_string, LockfileError, Result};
use crate::package_json::PackageJson;

const PNPM_WORKSPACE: &str = "pnpm-workspace.yaml";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PnpmWorkspace {
    packages: Vec<String>,
}

/// A workspace root and its member patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceRoot {
    pub dir: PathBuf,
    pub patterns: Vec<String>,
}

/// Find the workspace root for `package_dir`, if any.
pub fn find_root(package_dir: &Path) -> Result<Option<WorkspaceRoot>> {
    let start = package_dir
        .canonicalize()
        .map_err(|source| LockfileError::Io {
            path: package_dir.to_path_buf(),
            source,
        })?;

    for dir in start.ancestors() {
        let pnpm = dir.join(PNPM_WORKSPACE);
        if pnpm.is_file() {
            let content = read_to_string(&pnpm)?;
            let parsed: Option<PnpmWorkspace> =
                serde_yaml::from_str(&content).map_err(|source| LockfileError::Yaml {
                    path: pnpm.clone(),
                    source,
                })?;
            return Ok(Some(WorkspaceRoot {
                dir: dir.to_path_buf(),
                patterns: parsed.unwrap_or_default().packages,
            }));
        }

        let manifest = dir.join("package.json");
        if manifest.is_file() {
            let package = PackageJson::read(&manifest)?;
            if package.workspaces.is_some() {
                return Ok(Some(WorkspaceRoot {
                    dir: dir.to_path_buf(),
                    patterns: package.workspace_patterns().to_vec(),
                }));
            }
        }
    }
    Ok(None)
}

/// Build the workspace index for `package_dir`. Empty when the package is
/// not inside a workspace.
pub fn discover(package_dir: &Path) -> Result<WorkspaceIndex> {
    let Some(root) = find_root(package_dir)? else {
        debug!(dir = %package_dir.display(), "not inside a workspace");
        return Ok(WorkspaceIndex::new());
    };
    let base = package_dir
        .canonicalize()
        .map_err(|source| LockfileError::Io {
            path: package_dir.to_path_buf(),
            source,
        })?;

    let mut index = WorkspaceIndex::new();
    for member in collect_members(&root)? {
        let package = PackageJson::read(&member.join("package.json"))?;
        let (Some(name), Some(version)) = (package.name, package.version) else {
            trace!(dir = %member.display(), "workspace member without name or version");
            continue;
        };
        index.insert(WorkspacePackage {
            name,
            version,
            dir: relative_path(&member, &base),
        });
    }
    debug!(root = %root.dir.display(), packages = index.len(), "discovered workspace");
    Ok(index)
}

/// Member directories that hold a `package.json`, in pattern order.
fn collect_members(root: &WorkspaceRoot) -> Result<Vec<PathBuf>> {
    let (excludes, includes): (Vec<&String>, Vec<&String>) =
        root.patterns.iter().partition(|p| p.starts_with('!'));

    let mut excluded = Vec::new();
    for pattern in excludes {
        let pattern = pattern.trim_start_matches('!').trim_end_matches('/');
        excluded.push(Pattern::new(pattern).map_err(|err| {
            LockfileError::parse(&root.dir, format!("invalid workspace pattern '!{pattern}': {err}"))
        })?);
    }

    let mut members = Vec::new();
    for pattern in includes {
        let pattern = pattern.trim_end_matches('/');
        let joined = root.dir.join(pattern).join("package.json");
        let glob_str = joined.to_str().ok_or_else(|| {
            LockfileError::parse(&root.dir, format!("invalid UTF-8 in workspace pattern '{pattern}'"))
        })?;
        let entries = glob::glob(glob_str).map_err(|err| {
            LockfileError::parse(&root.dir, format!("invalid workspace pattern '{pattern}': {err}"))
        })?;

        for entry in entries {
            let manifest = entry.map_err(|err| {
                LockfileError::parse(&root.dir, format!("glob error for pattern '{pattern}': {err}"))
            })?;
            let Some(dir) = manifest.parent() else {
                continue;
            };
            let relative = relative_path(dir, &root.dir);
            if relative.split('/').any(|part| part == "node_modules") {
                continue;
            }
            if excluded.iter().any(|p| p.matches(&relative)) {
                trace!(dir = %relative, "excluded workspace member");
                continue;
            }
            if !members.iter().any(|m: &PathBuf| m == dir) {
                members.push(dir.to_path_buf());
            }
        }
    }
    Ok(members)
}

/// `path` relative to `base`, with `/` separators. Both must be absolute.
fn relative_path(path: &Path, base: &Path) -> String {
    let path: Vec<Component<'_>> = path.components().collect();
    let base: Vec<Component<'_>> = base.components().collect();
    let common = path
        .iter()
        .zip(&base)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    parts.extend(std::iter::repeat("..".to_string()).take(base.len() - common));
    parts.extend(
        path[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}
