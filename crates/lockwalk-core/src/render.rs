//! Text renderings of a recorded walk.
//!
//! Chains, one line per emitted edge:
//! ```text
//! a@1.0.0 + integrity sha512-...
//! a@1.0.0 b@2.0.0 + integrity sha512-...
//! a@1.0.0 b@2.0.0 a@1.0.0 + integrity sha512-... (cycle)
//! ```
//!
//! Tree:
//! ```text
//! app v0.1.0
//! ├── a v1.0.0
//! │   └── b v2.0.0
//! │       └── a v1.0.0 (cycle)
//! └── c v0.4.1
//! ```

use std::collections::HashSet;

use crate::events::Recorder;
use crate::package::PackageNode;

const LOCAL_PATH: &str = "local-path:";

/// One chain line for an emitted edge, without a trailing newline.
///
/// Local workspace packages carry no integrity, so their locator is printed
/// as well.
pub fn chain_line(ancestors: &[PackageNode], node: &PackageNode) -> String {
    let mut line = ancestors
        .iter()
        .chain(std::iter::once(node))
        .map(PackageNode::id)
        .collect::<Vec<_>>()
        .join(" ");

    line.push_str(" + integrity ");
    line.push_str(node.integrity.as_deref().unwrap_or("null"));
    if let Some(resolved) = node.resolved.as_deref().filter(|r| r.starts_with(LOCAL_PATH)) {
        line.push_str(" + resolved ");
        line.push_str(resolved);
    }
    if node.is_cycle {
        line.push_str(" (cycle)");
    }
    line
}

/// Every recorded emission as a chain line.
pub fn format_chains(recorder: &Recorder) -> String {
    let mut out = String::new();
    for emission in &recorder.packages {
        out.push_str(&chain_line(&emission.ancestors, &emission.node));
        out.push('\n');
    }
    out
}

/// Format recorded emissions as an ASCII tree under the project root.
pub fn format_tree(root_name: &str, root_version: &str, recorder: &Recorder) -> String {
    let nodes: Vec<&PackageNode> = recorder.nodes().collect();
    let is_last = last_flags(&nodes);

    let mut out = format!("{root_name} v{root_version}\n");
    // lasts[d] is whether the open ancestor at depth d + 1 was a last child.
    let mut lasts: Vec<bool> = Vec::new();
    for (node, &last) in nodes.iter().zip(&is_last) {
        lasts.truncate(node.depth.saturating_sub(1));
        let prefix: String = lasts
            .iter()
            .map(|&l| if l { "    " } else { "│   " })
            .collect();
        let connector = if last { "└── " } else { "├── " };
        let cycle_marker = if node.is_cycle { " (cycle)" } else { "" };
        out.push_str(&format!(
            "{prefix}{connector}{} v{}{cycle_marker}\n",
            node.name, node.version
        ));
        lasts.push(last);
    }

    let unique: HashSet<String> = nodes.iter().map(|n| n.id()).collect();
    out.push_str(&format!(
        "\n{} packages ({} unique)\n",
        nodes.len(),
        unique.len()
    ));
    out
}

/// For pre-order nodes, whether each is the last child of its parent.
fn last_flags(nodes: &[&PackageNode]) -> Vec<bool> {
    let mut flags = vec![false; nodes.len()];
    // pending[d]: a later sibling at depth d is still to come.
    let mut pending: Vec<bool> = Vec::new();
    for (i, node) in nodes.iter().enumerate().rev() {
        let depth = node.depth;
        if pending.len() <= depth {
            pending.resize(depth + 1, false);
        }
        flags[i] = !pending[depth];
        pending[depth] = true;
        for deeper in pending.iter_mut().skip(depth + 1) {
            *deeper = false;
        }
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventSink;
    use crate::package::DependencyKind;

    fn node(name: &str, version: &str, depth: usize) -> PackageNode {
        PackageNode {
            name: name.to_string(),
            spec: "*".to_string(),
            version: version.to_string(),
            resolved: None,
            integrity: Some(format!("sha512-{name}")),
            kind: DependencyKind::Prod,
            is_cycle: false,
            depth,
        }
    }

    fn recorded() -> Recorder {
        let a = node("a", "1.0.0", 1);
        let b = node("b", "2.0.0", 2);
        let mut cycle = node("a", "1.0.0", 3);
        cycle.is_cycle = true;
        let c = node("c", "0.4.1", 1);

        let mut recorder = Recorder::new();
        recorder.on_package(&[], &a);
        recorder.on_package(&[a.clone()], &b);
        recorder.on_package(&[a, b], &cycle);
        recorder.on_package(&[], &c);
        recorder
    }

    #[test]
    fn chains() {
        let out = format_chains(&recorded());
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines[0], "a@1.0.0 + integrity sha512-a");
        assert_eq!(
            lines[2],
            "a@1.0.0 b@2.0.0 a@1.0.0 + integrity sha512-a (cycle)"
        );
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn local_path_locator_is_printed() {
        let mut shared = node("shared", "0.3.0", 1);
        shared.integrity = None;
        shared.resolved = Some("local-path:../shared".to_string());
        assert_eq!(
            chain_line(&[], &shared),
            "shared@0.3.0 + integrity null + resolved local-path:../shared"
        );

        let mut remote = node("x", "1.0.0", 1);
        remote.resolved = Some("https://registry.npmjs.org/x/-/x-1.0.0.tgz".to_string());
        assert!(!chain_line(&[], &remote).contains("resolved"));
    }

    #[test]
    fn tree() {
        let out = format_tree("app", "0.1.0", &recorded());
        let expected = "\
app v0.1.0
├── a v1.0.0
│   └── b v2.0.0
│       └── a v1.0.0 (cycle)
└── c v0.4.1

4 packages (3 unique)
";
        assert_eq!(out, expected);
    }

    #[test]
    fn empty_tree() {
        let out = format_tree("app", "0.1.0", &Recorder::new());
        assert!(out.starts_with("app v0.1.0\n"));
        assert!(out.contains("0 packages (0 unique)"));
    }
}
