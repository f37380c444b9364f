//! Local workspace packages that `workspace:` specs resolve against.

use std::collections::BTreeMap;

use crate::version;

/// One package found in the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspacePackage {
    pub name: String,
    pub version: String,
    /// Directory relative to the package being walked.
    pub dir: String,
}

/// Workspace packages grouped by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspaceIndex {
    packages: BTreeMap<String, Vec<WorkspacePackage>>,
}

impl WorkspaceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, package: WorkspacePackage) {
        self.packages
            .entry(package.name.clone())
            .or_default()
            .push(package);
    }

    /// All packages published under `name`.
    pub fn get(&self, name: &str) -> &[WorkspacePackage] {
        self.packages.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The lowest-versioned package named `name` that satisfies `range`.
    pub fn resolve(&self, name: &str, range: &str) -> Option<&WorkspacePackage> {
        let candidates = self.get(name);
        let versions: Vec<&str> = candidates.iter().map(|p| p.version.as_str()).collect();
        let chosen = version::resolve(versions.as_slice(), range)?;
        candidates.iter().find(|p| p.version == chosen)
    }

    /// Versions recorded for `name`.
    pub fn versions(&self, name: &str) -> Vec<String> {
        self.get(name).iter().map(|p| p.version.clone()).collect()
    }

    /// Number of packages.
    pub fn len(&self) -> usize {
        self.packages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkspacePackage> {
        self.packages.values().flatten()
    }
}

impl FromIterator<WorkspacePackage> for WorkspaceIndex {
    fn from_iter<I: IntoIterator<Item = WorkspacePackage>>(iter: I) -> Self {
        let mut index = WorkspaceIndex::new();
        for package in iter {
            index.insert(package);
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(name: &str, version: &str, dir: &str) -> WorkspacePackage {
        WorkspacePackage {
            name: name.to_string(),
            version: version.to_string(),
            dir: dir.to_string(),
        }
    }

    #[test]
    fn resolves_lowest_matching() {
        let index: WorkspaceIndex = [
            package("core", "2.0.0", "../core-next"),
            package("core", "1.4.0", "../core"),
            package("cli", "0.1.0", "../cli"),
        ]
        .into_iter()
        .collect();

        assert_eq!(index.len(), 3);
        assert_eq!(index.resolve("core", "*").unwrap().dir, "../core");
        assert_eq!(index.resolve("core", "^2.0.0").unwrap().version, "2.0.0");
        assert!(index.resolve("core", "^3.0.0").is_none());
        assert!(index.resolve("nope", "*").is_none());
        assert_eq!(index.versions("core"), ["2.0.0", "1.4.0"]);
    }
}
