//! Observer callbacks for a walk.
//!
//! The walker pushes three kinds of events: every visited edge
//! (`on_package`), fatal failures (`on_error`), and informational notices
//! for alias rewrites and downgraded failures (`on_info`).

use crate::alias::AliasKind;
use crate::error::WalkError;
use crate::package::PackageNode;

/// A non-fatal, informational event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// An alias spec was rewritten before resolution.
    Alias {
        kind: AliasKind,
        from_name: String,
        from_spec: String,
        to_name: String,
        to_spec: String,
    },
    /// A best-effort branch failed to resolve and was pruned.
    Unresolved(WalkError),
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::Alias {
                kind,
                from_name,
                from_spec,
                to_name,
                to_spec,
            } => write!(
                f,
                "found {kind} alias from {from_name}@{from_spec} to {to_name} @ {to_spec}"
            ),
            Notice::Unresolved(error) => write!(f, "skipped: {error}"),
        }
    }
}

/// Receives walk events.
pub trait EventSink {
    /// Called once per visited edge, cycle-terminal nodes included.
    /// `ancestors` runs from the declared dependency down to the parent.
    fn on_package(&mut self, ancestors: &[PackageNode], node: &PackageNode);

    /// Called for a fatal failure, right before the walk returns it.
    fn on_error(&mut self, _error: &WalkError) {}

    /// Called for alias rewrites and best-effort failures.
    fn on_info(&mut self, _notice: &Notice) {}
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn on_package(&mut self, ancestors: &[PackageNode], node: &PackageNode) {
        (**self).on_package(ancestors, node)
    }

    fn on_error(&mut self, error: &WalkError) {
        (**self).on_error(error)
    }

    fn on_info(&mut self, notice: &Notice) {
        (**self).on_info(notice)
    }
}

/// One recorded `on_package` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emission {
    pub ancestors: Vec<PackageNode>,
    pub node: PackageNode,
}

impl Emission {
    /// `name@version` for every ancestor and then the node itself.
    pub fn chain(&self) -> Vec<String> {
        self.ancestors
            .iter()
            .chain(std::iter::once(&self.node))
            .map(PackageNode::id)
            .collect()
    }
}

/// A sink that keeps every event, in order.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub packages: Vec<Emission>,
    pub errors: Vec<WalkError>,
    pub notices: Vec<Notice>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The emitted nodes without their ancestors.
    pub fn nodes(&self) -> impl Iterator<Item = &PackageNode> {
        self.packages.iter().map(|e| &e.node)
    }
}

impl EventSink for Recorder {
    fn on_package(&mut self, ancestors: &[PackageNode], node: &PackageNode) {
        self.packages.push(Emission {
            ancestors: ancestors.to_vec(),
            node: node.clone(),
        });
    }

    fn on_error(&mut self, error: &WalkError) {
        self.errors.push(error.clone());
    }

    fn on_info(&mut self, notice: &Notice) {
        self.notices.push(notice.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::DependencyKind;

    fn node(name: &str, depth: usize) -> PackageNode {
        PackageNode {
            name: name.to_string(),
            spec: "*".to_string(),
            version: "1.0.0".to_string(),
            resolved: None,
            integrity: None,
            kind: DependencyKind::Prod,
            is_cycle: false,
            depth,
        }
    }

    #[test]
    fn recorder_keeps_order_and_ancestors() {
        let mut recorder = Recorder::new();
        let a = node("a", 1);
        let b = node("b", 2);
        recorder.on_package(&[], &a);
        recorder.on_package(std::slice::from_ref(&a), &b);

        assert_eq!(recorder.packages.len(), 2);
        assert_eq!(recorder.packages[1].chain(), vec!["a@1.0.0", "b@1.0.0"]);
        let names: Vec<_> = recorder.nodes().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn sink_through_mutable_reference() {
        fn feed(mut sink: impl EventSink) {
            sink.on_info(&Notice::Unresolved(WalkError::NotResolved {
                name: "x".to_string(),
                range: "^1".to_string(),
                present: Vec::new(),
            }));
        }
        let mut recorder = Recorder::new();
        feed(&mut recorder);
        assert_eq!(recorder.notices.len(), 1);
        assert!(recorder.notices[0].to_string().starts_with("skipped: "));
    }

    #[test]
    fn alias_notice_text() {
        let notice = Notice::Alias {
            kind: AliasKind::Path,
            from_name: "js-yaml".to_string(),
            from_spec: "/@zkochan/js-yaml/0.0.5".to_string(),
            to_name: "@zkochan/js-yaml".to_string(),
            to_spec: "0.0.5".to_string(),
        };
        assert_eq!(
            notice.to_string(),
            "found path alias from js-yaml@/@zkochan/js-yaml/0.0.5 to @zkochan/js-yaml @ 0.0.5"
        );
    }
}
