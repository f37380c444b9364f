//! Loading a project: manifest, lock file, and workspace packages.

use std::path::{Path, PathBuf};

use lockwalk_core::{
    DependencySpec, EventSink, FlatStore, GraphStore, LockKind, PathStore, TreeWalker, WalkConfig,
    WorkspaceIndex,
};
use tracing::{debug, info};

use crate::discover::{find_lockfile, LockfileKind};
use crate::error::{LockfileError, Result};
use crate::package_json::PackageJson;
use crate::{npm, pnpm, workspace, yarn};

/// A loaded lock file, in the store shape of its format.
#[derive(Debug, Clone)]
pub enum LoadedLock {
    Graph(GraphStore),
    Flat(FlatStore),
    Path(PathStore),
}

impl LoadedLock {
    pub fn kind(&self) -> LockKind {
        match self {
            LoadedLock::Graph(_) => LockKind::Npm,
            LoadedLock::Flat(_) => LockKind::Yarn,
            LoadedLock::Path(_) => LockKind::Pnpm,
        }
    }

    /// Number of locked packages.
    pub fn len(&self) -> usize {
        match self {
            // The graph always holds the root node.
            LoadedLock::Graph(store) => store.len().saturating_sub(1),
            LoadedLock::Flat(store) => store.len(),
            LoadedLock::Path(store) => store.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Walk `specs` against whichever store this is.
    pub fn walk<E: EventSink>(
        &self,
        specs: &[DependencySpec],
        config: WalkConfig,
        workspace: Option<&WorkspaceIndex>,
        sink: E,
    ) -> lockwalk_core::Result<()> {
        match self {
            LoadedLock::Graph(store) => walk_store(store, specs, config, workspace, sink),
            LoadedLock::Flat(store) => walk_store(store, specs, config, workspace, sink),
            LoadedLock::Path(store) => walk_store(store, specs, config, workspace, sink),
        }
    }
}

fn walk_store<S: lockwalk_core::LockStore, E: EventSink>(
    store: &S,
    specs: &[DependencySpec],
    config: WalkConfig,
    workspace: Option<&WorkspaceIndex>,
    sink: E,
) -> lockwalk_core::Result<()> {
    let mut walker = TreeWalker::new(store).with_config(config);
    if let Some(index) = workspace {
        walker = walker.with_workspace(index);
    }
    walker.walk(specs, sink)
}

/// Load a lock file, choosing the loader by file name.
pub fn load_lockfile(path: &Path, manifest: &PackageJson) -> Result<LoadedLock> {
    let kind = LockfileKind::from_path(path).ok_or_else(|| LockfileError::Unsupported {
        path: path.to_path_buf(),
        detail: "unrecognized lock file name".to_string(),
    })?;
    if !path.is_file() {
        return Err(LockfileError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let lock = match kind.lock_kind() {
        LockKind::Npm => LoadedLock::Graph(npm::load(path, manifest)?),
        LockKind::Yarn => LoadedLock::Flat(yarn::load(path)?),
        LockKind::Pnpm => LoadedLock::Path(pnpm::load(path)?),
    };
    info!(path = %path.display(), kind = %lock.kind(), packages = lock.len(), "loaded lock file");
    Ok(lock)
}

/// Everything read from disk for one package directory.
#[derive(Debug, Clone)]
pub struct Project {
    pub dir: PathBuf,
    pub lockfile: PathBuf,
    pub manifest: PackageJson,
    pub lock: LoadedLock,
    /// Present only when the manifest uses `workspace:` specs.
    pub workspace: Option<WorkspaceIndex>,
}

impl Project {
    /// Load the project in `dir`. `lockfile` overrides discovery.
    pub fn load(dir: &Path, lockfile: Option<&Path>) -> Result<Self> {
        if !dir.is_dir() {
            return Err(LockfileError::NotFound {
                path: dir.to_path_buf(),
            });
        }
        let manifest = PackageJson::read_dir(dir)?;
        let lockfile = match lockfile {
            Some(path) => path.to_path_buf(),
            None => find_lockfile(dir)?,
        };
        let lock = load_lockfile(&lockfile, &manifest)?;

        let workspace = if manifest.uses_workspace_protocol() {
            Some(workspace::discover(dir)?)
        } else {
            None
        };
        debug!(
            dir = %dir.display(),
            workspace_packages = workspace.as_ref().map_or(0, WorkspaceIndex::len),
            "loaded project"
        );

        Ok(Project {
            dir: dir.to_path_buf(),
            lockfile,
            manifest,
            lock,
            workspace,
        })
    }

    /// Walk the given top-level specs.
    pub fn walk<E: EventSink>(
        &self,
        specs: &[DependencySpec],
        config: WalkConfig,
        sink: E,
    ) -> lockwalk_core::Result<()> {
        self.lock.walk(specs, config, self.workspace.as_ref(), sink)
    }
}
