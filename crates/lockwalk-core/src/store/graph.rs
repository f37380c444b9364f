//! Graph-shaped store for npm lock records.
//!
//! Nodes live in an arena; node 0 is the project root. Every node keeps its
//! out-edges in declaration order, and edges already point at the node npm
//! installed for them. Integrity and origin live in a separate side index
//! keyed by install location (`node_modules/a/node_modules/b`), so a node can
//! exist without metadata.

use std::collections::HashMap;

use tracing::trace;

use super::{CandidateIndex, ChildEdge, LockKind, LockStore, Locked, NodeMeta, Request, Unresolved};
use crate::package::DependencyKind;
use crate::version;

/// Index of a node in a [`GraphStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// An installed package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub name: String,
    pub version: String,
    /// Install location relative to the project root; empty for the root.
    pub location: String,
    pub edges: Vec<GraphEdge>,
}

/// A dependency edge and the node that satisfies it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphEdge {
    pub name: String,
    pub spec: String,
    pub kind: DependencyKind,
    pub target: Option<NodeId>,
}

/// npm dependency graph with a location-keyed metadata index.
#[derive(Debug, Clone)]
pub struct GraphStore {
    nodes: Vec<GraphNode>,
    by_location: HashMap<String, NodeId>,
    meta: HashMap<String, NodeMeta>,
}

impl GraphStore {
    /// Create a store holding only the project root.
    pub fn new(root_name: &str, root_version: &str) -> Self {
        let mut store = GraphStore {
            nodes: Vec::new(),
            by_location: HashMap::new(),
            meta: HashMap::new(),
        };
        store.add_node(root_name, root_version, "");
        store
    }

    /// The project root.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Add a node at an install location. Adding the same location twice
    /// returns the existing node.
    pub fn add_node(&mut self, name: &str, version: &str, location: &str) -> NodeId {
        if let Some(&id) = self.by_location.get(location) {
            return id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(GraphNode {
            name: name.to_string(),
            version: version.to_string(),
            location: location.to_string(),
            edges: Vec::new(),
        });
        self.by_location.insert(location.to_string(), id);
        id
    }

    /// Append an out-edge to `from`. `target` is `None` when the lock record
    /// has nothing installed for the dependency.
    pub fn add_edge(
        &mut self,
        from: NodeId,
        name: &str,
        spec: &str,
        kind: DependencyKind,
        target: Option<NodeId>,
    ) {
        self.nodes[from.0].edges.push(GraphEdge {
            name: name.to_string(),
            spec: spec.to_string(),
            kind,
            target,
        });
    }

    /// Record metadata for an install location.
    pub fn set_meta(&mut self, location: &str, meta: NodeMeta) {
        self.meta.insert(location.to_string(), meta);
    }

    pub fn node(&self, id: NodeId) -> &GraphNode {
        &self.nodes[id.0]
    }

    /// Node installed at `location`, if any.
    pub fn find(&self, location: &str) -> Option<NodeId> {
        self.by_location.get(location).copied()
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl LockStore for GraphStore {
    type Node = NodeId;

    fn kind(&self) -> LockKind {
        LockKind::Npm
    }

    fn resolve(
        &self,
        parent: Option<&NodeId>,
        request: &Request<'_>,
        _index: &CandidateIndex,
    ) -> Result<Locked<NodeId>, Unresolved> {
        let from = parent.copied().unwrap_or_else(|| self.root());
        let edge = self
            .node(from)
            .edges
            .iter()
            .find(|edge| edge.name == request.declared_name)
            .ok_or_else(Unresolved::missing)?;
        let target = edge.target.ok_or_else(Unresolved::missing)?;
        let node = self.node(target);

        // Edges below the root were settled by npm; only the manifest's own
        // ranges are checked against what got locked.
        if parent.is_none() {
            let locked = std::slice::from_ref(&node.version);
            if version::resolve(locked, request.spec).is_none() {
                trace!(
                    name = request.name,
                    spec = request.spec,
                    locked = %node.version,
                    "locked root version rejected"
                );
                return Err(Unresolved::rejected(vec![node.version.clone()]));
            }
        }

        Ok(Locked {
            node: target,
            version: node.version.clone(),
            location: Some(node.location.clone()),
        })
    }

    fn metadata(&self, node: &NodeId) -> Option<NodeMeta> {
        self.meta.get(&self.node(*node).location).cloned()
    }

    fn children(&self, node: &NodeId) -> Vec<ChildEdge> {
        self.node(*node)
            .edges
            .iter()
            .map(|edge| ChildEdge::new(edge.name.as_str(), edge.spec.as_str(), edge.kind))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request<'a>(name: &'a str, spec: &'a str) -> Request<'a> {
        Request {
            declared_name: name,
            declared_spec: spec,
            name,
            spec,
        }
    }

    fn sample() -> (GraphStore, NodeId, NodeId) {
        let mut store = GraphStore::new("app", "1.0.0");
        let a = store.add_node("a", "1.0.0", "node_modules/a");
        let b = store.add_node("b", "2.0.0", "node_modules/b");
        store.add_edge(store.root(), "a", "^1.0.0", DependencyKind::Prod, Some(a));
        store.add_edge(a, "b", "^2.0.0", DependencyKind::Prod, Some(b));
        store.add_edge(a, "gone", "^1.0.0", DependencyKind::Optional, None);
        store.set_meta(
            "node_modules/a",
            NodeMeta {
                integrity: Some("sha512-a".to_string()),
                ..NodeMeta::default()
            },
        );
        (store, a, b)
    }

    #[test]
    fn resolves_root_edge_by_install_name() {
        let (store, a, _) = sample();
        let locked = store
            .resolve(None, &request("a", "^1.0.0"), &CandidateIndex::default())
            .unwrap();
        assert_eq!(locked.node, a);
        assert_eq!(locked.version, "1.0.0");
        assert_eq!(locked.location.as_deref(), Some("node_modules/a"));
    }

    #[test]
    fn root_range_is_checked() {
        let (store, _, _) = sample();
        let err = store
            .resolve(None, &request("a", "^2.0.0"), &CandidateIndex::default())
            .unwrap_err();
        assert_eq!(err.present, ["1.0.0"]);
    }

    #[test]
    fn nested_edges_trust_the_lock() {
        let (store, a, b) = sample();
        let locked = store
            .resolve(Some(&a), &request("b", "^9.0.0"), &CandidateIndex::default())
            .unwrap();
        assert_eq!(locked.node, b);
    }

    #[test]
    fn missing_target_is_unresolved() {
        let (store, a, _) = sample();
        let err = store
            .resolve(Some(&a), &request("gone", "^1.0.0"), &CandidateIndex::default())
            .unwrap_err();
        assert!(err.present.is_empty());
        assert!(store
            .resolve(None, &request("zzz", "*"), &CandidateIndex::default())
            .is_err());
    }

    #[test]
    fn metadata_comes_from_side_index() {
        let (store, a, b) = sample();
        assert_eq!(store.metadata(&a).unwrap().integrity.as_deref(), Some("sha512-a"));
        assert_eq!(store.metadata(&b), None);
    }

    #[test]
    fn children_keep_edge_order() {
        let (store, a, _) = sample();
        let names: Vec<_> = store.children(&a).into_iter().map(|c| c.name).collect();
        assert_eq!(names, ["b", "gone"]);
        assert_eq!(store.children(&a)[1].kind, DependencyKind::Optional);
    }

    #[test]
    fn add_node_is_idempotent_per_location() {
        let (mut store, a, _) = sample();
        assert_eq!(store.add_node("a", "1.0.0", "node_modules/a"), a);
        assert_eq!(store.find("node_modules/b"), Some(NodeId(2)));
        assert_eq!(store.len(), 3);
    }
}
