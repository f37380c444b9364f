//! Depth-first replay of a lock record.
//!
//! Every declared dependency is walked as its own root. Per edge the walker
//! rewrites aliases, resolves the edge against the store (or the workspace
//! index for `workspace:` specs), classifies failures through
//! [`Requiredness`], emits one [`PackageNode`], then descends into the
//! store's children unless the node closes a cycle.
//!
//! The ancestor path is a single stack shared by the whole walk: a node is
//! pushed before its children are visited and popped afterwards. Observers
//! see it as a borrowed slice.

use std::cell::OnceCell;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::alias::{self, AliasKind};
use crate::error::{Result, WalkError};
use crate::events::{EventSink, Notice};
use crate::package::{DependencyKind, DependencySpec, PackageNode};
use crate::policy::{Disposition, Requiredness};
use crate::store::{CandidateIndex, LockStore, Request};
use crate::workspace::WorkspaceIndex;

/// Default limit on nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Walk limits and failure handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct WalkConfig {
    /// Deepest depth that may be emitted. Entering a deeper node is fatal.
    pub max_depth: usize,
    /// Continue with the next root after a fatal failure. The first failure
    /// is still returned once every root has been walked.
    pub keep_going: bool,
}

impl Default for WalkConfig {
    fn default() -> Self {
        WalkConfig {
            max_depth: DEFAULT_MAX_DEPTH,
            keep_going: false,
        }
    }
}

/// Replays a [`LockStore`] for a list of declared dependencies.
#[derive(Debug)]
pub struct TreeWalker<'s, S> {
    store: &'s S,
    workspace: Option<&'s WorkspaceIndex>,
    config: WalkConfig,
}

impl<'s, S: LockStore> TreeWalker<'s, S> {
    pub fn new(store: &'s S) -> Self {
        TreeWalker {
            store,
            workspace: None,
            config: WalkConfig::default(),
        }
    }

    pub fn with_config(mut self, config: WalkConfig) -> Self {
        self.config = config;
        self
    }

    /// Index used for `workspace:` specs. Without one they never resolve.
    pub fn with_workspace(mut self, workspace: &'s WorkspaceIndex) -> Self {
        self.workspace = Some(workspace);
        self
    }

    pub fn config(&self) -> &WalkConfig {
        &self.config
    }

    /// Walk every spec in order. Specs whose requiredness is `Skip` are not
    /// attempted.
    ///
    /// The candidate index is built at most once and shared by all roots.
    pub fn walk<E: EventSink>(&self, specs: &[DependencySpec], mut sink: E) -> Result<()> {
        let index = OnceCell::new();
        let mut first_error = None;

        for spec in specs {
            if spec.requiredness == Requiredness::Skip {
                trace!(name = %spec.name, "skipping root");
                continue;
            }
            debug!(name = %spec.name, range = %spec.range, kind = %spec.kind, "walking root");

            let mut walk = Walk {
                store: self.store,
                workspace: self.workspace,
                config: self.config,
                index: &index,
                sink: &mut sink,
                path: Vec::new(),
                visited: HashSet::new(),
            };
            let edge = Edge {
                name: &spec.name,
                spec: &spec.range,
                kind: spec.kind,
            };
            if let Err(error) = walk.visit(None, edge, spec.requiredness) {
                if !self.config.keep_going {
                    return Err(error);
                }
                debug!(%error, "continuing after fatal failure");
                first_error.get_or_insert(error);
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Walk a single declared dependency.
    pub fn walk_root<E: EventSink>(&self, spec: &DependencySpec, sink: E) -> Result<()> {
        self.walk(std::slice::from_ref(spec), sink)
    }
}

#[derive(Debug, Clone, Copy)]
struct Edge<'a> {
    name: &'a str,
    spec: &'a str,
    kind: DependencyKind,
}

/// State of one root's traversal.
struct Walk<'w, 's, S: LockStore, E> {
    store: &'s S,
    workspace: Option<&'s WorkspaceIndex>,
    config: WalkConfig,
    index: &'w OnceCell<CandidateIndex>,
    sink: &'w mut E,
    /// Ancestors of the edge being visited, root first.
    path: Vec<PackageNode>,
    /// Names on `path`.
    visited: HashSet<String>,
}

impl<S: LockStore, E: EventSink> Walk<'_, '_, S, E> {
    fn visit(
        &mut self,
        parent: Option<&S::Node>,
        edge: Edge<'_>,
        requiredness: Requiredness,
    ) -> Result<()> {
        let depth = self.path.len() + 1;
        if depth > self.config.max_depth {
            let error = WalkError::DepthExceeded {
                name: edge.name.to_string(),
                depth,
                limit: self.config.max_depth,
            };
            self.sink.on_error(&error);
            return Err(error);
        }

        let normalized = alias::normalize(edge.name, edge.spec);
        if let Some(kind) = normalized.alias {
            self.sink.on_info(&Notice::Alias {
                kind,
                from_name: edge.name.to_string(),
                from_spec: edge.spec.to_string(),
                to_name: normalized.name.clone(),
                to_spec: normalized.spec.clone(),
            });
        }

        if normalized.alias == Some(AliasKind::Workspace) {
            return self.visit_workspace(&normalized.name, &normalized.spec, edge.kind, requiredness);
        }

        let index = self.index.get_or_init(|| {
            let index = self.store.candidate_index();
            debug!(names = index.len(), "built candidate index");
            index
        });
        let request = Request {
            declared_name: edge.name,
            declared_spec: edge.spec,
            name: &normalized.name,
            spec: &normalized.spec,
        };
        let locked = match self.store.resolve(parent, &request, index) {
            Ok(locked) => locked,
            Err(unresolved) => {
                return self.fail(
                    WalkError::NotResolved {
                        name: normalized.name,
                        range: normalized.spec,
                        present: unresolved.present,
                    },
                    requiredness,
                );
            }
        };

        let Some(meta) = self.store.metadata(&locked.node) else {
            return self.fail(
                WalkError::NoMeta {
                    name: normalized.name,
                    version: locked.version,
                    location: locked.location,
                },
                requiredness,
            );
        };

        let is_cycle = self.visited.contains(&normalized.name);
        let node = PackageNode {
            name: normalized.name,
            spec: normalized.spec,
            version: locked.version,
            resolved: meta.resolved,
            integrity: meta.integrity,
            kind: edge.kind,
            is_cycle,
            depth,
        };
        trace!(id = %node.id(), depth, is_cycle, "emit");
        self.sink.on_package(&self.path, &node);

        if is_cycle {
            return Ok(());
        }
        let children = self.store.children(&locked.node);
        if children.is_empty() {
            return Ok(());
        }

        let name = node.name.clone();
        self.visited.insert(name.clone());
        self.path.push(node);
        let result = children.iter().try_for_each(|child| {
            let edge = Edge {
                name: &child.name,
                spec: &child.spec,
                kind: child.kind,
            };
            self.visit(Some(&locked.node), edge, requiredness.for_edge(child.kind))
        });
        self.path.pop();
        self.visited.remove(&name);
        result
    }

    /// `workspace:` specs resolve to a local directory and are not expanded.
    fn visit_workspace(
        &mut self,
        name: &str,
        range: &str,
        kind: DependencyKind,
        requiredness: Requiredness,
    ) -> Result<()> {
        let found = self
            .workspace
            .and_then(|workspace| workspace.resolve(name, range));
        let Some(package) = found else {
            let present = self
                .workspace
                .map(|workspace| workspace.versions(name))
                .unwrap_or_default();
            return self.fail(
                WalkError::NotResolved {
                    name: name.to_string(),
                    range: range.to_string(),
                    present,
                },
                requiredness,
            );
        };

        let node = PackageNode {
            name: name.to_string(),
            spec: range.to_string(),
            version: package.version.clone(),
            resolved: Some(format!("local-path:{}", package.dir)),
            integrity: None,
            kind,
            is_cycle: self.visited.contains(name),
            depth: self.path.len() + 1,
        };
        trace!(id = %node.id(), dir = %package.dir, "emit workspace package");
        self.sink.on_package(&self.path, &node);
        Ok(())
    }

    fn fail(&mut self, error: WalkError, requiredness: Requiredness) -> Result<()> {
        match requiredness.on_failure() {
            Disposition::Fatal => {
                self.sink.on_error(&error);
                Err(error)
            }
            Disposition::Silent => {
                trace!(%error, "pruned optional branch");
                Ok(())
            }
            Disposition::Notice => {
                self.sink.on_info(&Notice::Unresolved(error));
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Recorder;
    use crate::store::{FlatEntry, FlatStore, GraphStore, NodeMeta, PathEntry, PathStore, Resolution};
    use crate::workspace::WorkspacePackage;

    fn resolved(integrity: &str) -> Option<Resolution> {
        Some(Resolution {
            integrity: Some(integrity.to_string()),
            tarball: None,
        })
    }

    fn pnpm(entries: &[(&str, &[(&str, &str)])]) -> PathStore {
        let mut store = PathStore::new();
        for (key, deps) in entries {
            store.insert(
                *key,
                PathEntry {
                    resolution: resolved(&format!("sha512-{key}")),
                    dependencies: deps
                        .iter()
                        .map(|(n, v)| (n.to_string(), v.to_string()))
                        .collect(),
                    ..PathEntry::default()
                },
            );
        }
        store
    }

    fn prod(name: &str, range: &str, requiredness: Requiredness) -> DependencySpec {
        DependencySpec::new(name, range, requiredness, DependencyKind::Prod)
    }

    #[test]
    fn pre_order_and_depths() {
        let store = pnpm(&[
            ("/a/1.0.0", &[("b", "1.0.0"), ("c", "1.0.0")]),
            ("/b/1.0.0", &[("d", "1.0.0")]),
            ("/c/1.0.0", &[]),
            ("/d/1.0.0", &[]),
        ]);
        let mut recorder = Recorder::new();
        TreeWalker::new(&store)
            .walk(&[prod("a", "^1.0.0", Requiredness::Require)], &mut recorder)
            .unwrap();

        let seen: Vec<_> = recorder.nodes().map(|n| (n.name.as_str(), n.depth)).collect();
        assert_eq!(seen, [("a", 1), ("b", 2), ("d", 3), ("c", 2)]);
        for emission in &recorder.packages {
            assert_eq!(emission.node.depth, emission.ancestors.len() + 1);
        }
        assert_eq!(recorder.packages[2].chain(), ["a@1.0.0", "b@1.0.0", "d@1.0.0"]);
    }

    #[test]
    fn optional_children_fail_silently() {
        let mut store = pnpm(&[("/a/1.0.0", &[])]);
        store.insert(
            "/a/1.0.0",
            PathEntry {
                resolution: resolved("sha512-a"),
                optional_dependencies: vec![("fsevents".into(), "^2.0.0".into())],
                ..PathEntry::default()
            },
        );
        let mut recorder = Recorder::new();
        TreeWalker::new(&store)
            .walk(&[prod("a", "1.0.0", Requiredness::Require)], &mut recorder)
            .unwrap();
        assert_eq!(recorder.packages.len(), 1);
        assert!(recorder.errors.is_empty());
        assert!(recorder.notices.is_empty());
    }

    #[test]
    fn requiredness_is_inherited() {
        let store = pnpm(&[("/a/1.0.0", &[("missing", "^1.0.0")])]);

        let mut recorder = Recorder::new();
        TreeWalker::new(&store)
            .walk(&[prod("a", "1.0.0", Requiredness::BestEffort)], &mut recorder)
            .unwrap();
        assert_eq!(recorder.packages.len(), 1);
        assert_eq!(recorder.notices.len(), 1);

        let mut recorder = Recorder::new();
        let err = TreeWalker::new(&store)
            .walk(&[prod("a", "1.0.0", Requiredness::Require)], &mut recorder)
            .unwrap_err();
        assert_eq!(err.package_name(), "missing");
        assert_eq!(recorder.errors, [err]);
    }

    #[test]
    fn missing_metadata_is_classified() {
        let mut store = pnpm(&[]);
        store.insert("/a/1.0.0", PathEntry::default());
        let mut recorder = Recorder::new();
        let err = TreeWalker::new(&store)
            .walk(&[prod("a", "^1.0.0", Requiredness::Require)], &mut recorder)
            .unwrap_err();
        assert_eq!(
            err,
            WalkError::NoMeta {
                name: "a".into(),
                version: "1.0.0".into(),
                location: Some("/a/1.0.0".into()),
            }
        );
        assert!(recorder.packages.is_empty());
    }

    #[test]
    fn keep_going_walks_remaining_roots() {
        let store = pnpm(&[("/b/1.0.0", &[])]);
        let specs = [
            prod("a", "^1.0.0", Requiredness::Require),
            prod("b", "^1.0.0", Requiredness::Require),
        ];

        let mut recorder = Recorder::new();
        assert!(TreeWalker::new(&store).walk(&specs, &mut recorder).is_err());
        assert!(recorder.packages.is_empty());

        let mut recorder = Recorder::new();
        let config = WalkConfig {
            keep_going: true,
            ..WalkConfig::default()
        };
        let err = TreeWalker::new(&store)
            .with_config(config)
            .walk(&specs, &mut recorder)
            .unwrap_err();
        assert_eq!(err.package_name(), "a");
        assert_eq!(recorder.packages.len(), 1);
    }

    #[test]
    fn path_alias_emits_notice() {
        let store = pnpm(&[
            ("/a/1.0.0", &[("js-yaml", "/@zkochan/js-yaml/0.0.5")]),
            ("/@zkochan/js-yaml/0.0.5", &[]),
        ]);
        let mut recorder = Recorder::new();
        TreeWalker::new(&store)
            .walk(&[prod("a", "1.0.0", Requiredness::Require)], &mut recorder)
            .unwrap();

        assert_eq!(recorder.packages[1].node.name, "@zkochan/js-yaml");
        assert_eq!(recorder.packages[1].node.version, "0.0.5");
        assert_eq!(recorder.notices.len(), 1);
        assert!(matches!(
            recorder.notices[0],
            Notice::Alias {
                kind: AliasKind::Path,
                ..
            }
        ));
    }

    #[test]
    fn npm_alias_in_yarn_store() {
        let mut store = FlatStore::new();
        store.insert(
            ["table-types@npm:@types/table@6.0.0"],
            FlatEntry {
                name: "@types/table".into(),
                version: "6.0.0".into(),
                integrity: Some("sha512-t".into()),
                ..FlatEntry::default()
            },
        );
        let mut recorder = Recorder::new();
        TreeWalker::new(&store)
            .walk(
                &[prod("table-types", "npm:@types/table@6.0.0", Requiredness::Require)],
                &mut recorder,
            )
            .unwrap();
        let node = recorder.nodes().next().unwrap();
        assert_eq!(node.name, "@types/table");
        assert_eq!(node.spec, "6.0.0");
        assert_eq!(node.integrity.as_deref(), Some("sha512-t"));
        assert_eq!(recorder.notices.len(), 1);
    }

    #[test]
    fn workspace_specs_use_the_index() {
        let store = pnpm(&[]);
        let workspace: WorkspaceIndex = [WorkspacePackage {
            name: "shared".into(),
            version: "0.3.0".into(),
            dir: "../shared".into(),
        }]
        .into_iter()
        .collect();

        let mut recorder = Recorder::new();
        TreeWalker::new(&store)
            .with_workspace(&workspace)
            .walk(&[prod("shared", "workspace:^0.3.0", Requiredness::Require)], &mut recorder)
            .unwrap();
        let node = recorder.nodes().next().unwrap();
        assert_eq!(node.resolved.as_deref(), Some("local-path:../shared"));
        assert_eq!(node.integrity, None);
        assert_eq!(node.spec, "^0.3.0");

        let mut recorder = Recorder::new();
        let err = TreeWalker::new(&store)
            .walk(&[prod("shared", "workspace:*", Requiredness::Require)], &mut recorder)
            .unwrap_err();
        assert!(matches!(err, WalkError::NotResolved { .. }));
    }

    #[test]
    fn graph_store_walk_uses_locked_edges() {
        let mut store = GraphStore::new("app", "1.0.0");
        let a = store.add_node("a", "1.0.0", "node_modules/a");
        let b = store.add_node("b", "2.0.0", "node_modules/a/node_modules/b");
        store.add_edge(store.root(), "a", "^1.0.0", DependencyKind::Prod, Some(a));
        store.add_edge(a, "b", "^2.0.0", DependencyKind::Peer, Some(b));
        store.set_meta("node_modules/a", NodeMeta::default());
        store.set_meta("node_modules/a/node_modules/b", NodeMeta::default());

        let mut recorder = Recorder::new();
        TreeWalker::new(&store)
            .walk(&[prod("a", "^1.0.0", Requiredness::Require)], &mut recorder)
            .unwrap();
        let kinds: Vec<_> = recorder.nodes().map(|n| n.kind).collect();
        assert_eq!(kinds, [DependencyKind::Prod, DependencyKind::Peer]);
    }
}
