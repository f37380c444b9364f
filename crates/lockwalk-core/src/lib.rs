//! Lock-record dependency tree reconstruction.
//!
//! Replays a resolution that npm, Yarn, or pnpm already computed and wrote
//! to a lock file. Given a manifest's declared dependencies and one of the
//! in-memory lock shapes in [`store`], [`TreeWalker`] emits every reachable
//! dependency edge with its locked version, integrity token, and ancestor
//! chain.
//!
//! # Architecture
//!
//! - [`version`]: minimum-satisfying version selection over npm range syntax
//! - [`alias`]: `workspace:`, `npm:` and `/name/version` rewriting
//! - [`store`]: the [`LockStore`] trait and one store per lock format
//! - [`walker`]: depth-first traversal with cycle and depth limits
//! - [`policy`]: how a failed resolution is treated per branch
//! - [`events`]: the observer interface the walk reports through
//!
//! The crate performs no I/O; loading lock files is left to callers.

pub mod alias;
pub mod error;
pub mod events;
pub mod manifest;
pub mod package;
pub mod policy;
pub mod render;
pub mod store;
pub mod version;
pub mod walker;
pub mod workspace;

// Re-exports for convenience.
pub use alias::{normalize, AliasKind, Normalized};
pub use error::{ErrorCode, Result, WalkError};
pub use events::{Emission, EventSink, Notice, Recorder};
pub use manifest::{GroupPolicy, ManifestView};
pub use package::{DependencyKind, DependencySpec, PackageNode};
pub use policy::Requiredness;
pub use render::{chain_line, format_chains, format_tree};
pub use store::{
    CandidateIndex, ChildEdge, FlatEntry, FlatStore, GraphStore, LockKind, LockStore, NodeId,
    NodeMeta, PathEntry, PathStore, Resolution,
};
pub use walker::{TreeWalker, WalkConfig, DEFAULT_MAX_DEPTH};
pub use workspace::{WorkspaceIndex, WorkspacePackage};
