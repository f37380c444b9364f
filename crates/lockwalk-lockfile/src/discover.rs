//! Lock file discovery.

use std::path::{Path, PathBuf};

use lockwalk_core::LockKind;
use tracing::debug;

use crate::error::{LockfileError, Result};

/// Lock file names in precedence order.
pub const LOCKFILE_NAMES: [&str; 4] = [
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "npm-shrinkwrap.json",
];

/// A recognized lock file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockfileKind {
    PackageLock,
    Shrinkwrap,
    Yarn,
    Pnpm,
}

impl LockfileKind {
    /// Kind for a lock file path, by file name.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.file_name()?.to_str()? {
            "package-lock.json" => Some(LockfileKind::PackageLock),
            "npm-shrinkwrap.json" => Some(LockfileKind::Shrinkwrap),
            "yarn.lock" => Some(LockfileKind::Yarn),
            "pnpm-lock.yaml" => Some(LockfileKind::Pnpm),
            _ => None,
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            LockfileKind::PackageLock => "package-lock.json",
            LockfileKind::Shrinkwrap => "npm-shrinkwrap.json",
            LockfileKind::Yarn => "yarn.lock",
            LockfileKind::Pnpm => "pnpm-lock.yaml",
        }
    }

    /// The in-memory store this file loads into.
    pub fn lock_kind(self) -> LockKind {
        match self {
            LockfileKind::PackageLock | LockfileKind::Shrinkwrap => LockKind::Npm,
            LockfileKind::Yarn => LockKind::Yarn,
            LockfileKind::Pnpm => LockKind::Pnpm,
        }
    }
}

/// Find the highest-precedence lock file directly inside `dir`.
pub fn find_lockfile(dir: &Path) -> Result<PathBuf> {
    if !dir.is_dir() {
        return Err(LockfileError::NotFound {
            path: dir.to_path_buf(),
        });
    }
    for name in LOCKFILE_NAMES {
        let candidate = dir.join(name);
        if candidate.is_file() {
            debug!(path = %candidate.display(), "found lock file");
            return Ok(candidate);
        }
    }
    Err(LockfileError::NoLockfile {
        dir: dir.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["npm-shrinkwrap.json", "pnpm-lock.yaml", "yarn.lock"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        assert_eq!(find_lockfile(dir.path()).unwrap(), dir.path().join("yarn.lock"));

        std::fs::write(dir.path().join("package-lock.json"), "{}").unwrap();
        assert_eq!(
            find_lockfile(dir.path()).unwrap(),
            dir.path().join("package-lock.json")
        );
    }

    #[test]
    fn empty_and_missing_dirs() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            find_lockfile(dir.path()),
            Err(LockfileError::NoLockfile { .. })
        ));
        assert!(matches!(
            find_lockfile(&dir.path().join("nope")),
            Err(LockfileError::NotFound { .. })
        ));
    }

    #[test]
    fn kinds_by_file_name() {
        assert_eq!(
            LockfileKind::from_path(Path::new("a/b/npm-shrinkwrap.json")),
            Some(LockfileKind::Shrinkwrap)
        );
        assert_eq!(LockfileKind::Shrinkwrap.lock_kind(), LockKind::Npm);
        assert_eq!(LockfileKind::from_path(Path::new("Cargo.lock")), None);
        for name in LOCKFILE_NAMES {
            let kind = LockfileKind::from_path(Path::new(name)).unwrap();
            assert_eq!(kind.file_name(), name);
        }
    }
}
