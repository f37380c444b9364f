//! Lock-file discovery and loading for npm, Yarn classic, and pnpm.
//!
//! Reads a package directory's `package.json` and lock file into one of the
//! `lockwalk-core` stores, and discovers workspace packages when the
//! manifest refers to them with `workspace:` specs.
//!
//! # Architecture
//!
//! - [`discover`]: lock file names and their precedence
//! - [`npm`], [`yarn`], [`pnpm`]: one loader per lock format
//! - [`package_json`]: manifest reading
//! - [`workspace`]: workspace root and member discovery
//! - [`load`]: [`Project`] ties the above together

pub mod discover;
pub mod error;
pub mod load;
pub mod npm;
pub mod package_json;
pub mod pnpm;
pub mod workspace;
pub mod yarn;

// Re-exports for convenience.
pub use discover::{find_lockfile, LockfileKind, LOCKFILE_NAMES};
pub use error::{LockfileError, Result};
pub use load::{load_lockfile, LoadedLock, Project};
pub use package_json::{PackageJson, Workspaces};
pub use workspace::{discover as discover_workspace, find_root as find_workspace_root, WorkspaceRoot};
