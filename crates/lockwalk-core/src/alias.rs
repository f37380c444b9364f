//! Alias rewriting for `(name, spec)` pairs.
//!
//! Three alias grammars are recognized, tried in this order:
//!
//! ```text
//! workspace:^1.0.0        satisfied by a local workspace package
//! npm:@types/table@6.0.0  installed under another package name
//! /@zkochan/js-yaml/0.0.5 pnpm path-keyed reference to an exact entry
//! ```

use serde::Serialize;

const WORKSPACE_PREFIX: &str = "workspace:";
const NPM_PREFIX: &str = "npm:";

/// Which alias grammar matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AliasKind {
    /// `workspace:<range>`
    Workspace,
    /// `npm:<name>@<spec>`
    Npm,
    /// `/<name>/<version>`
    Path,
}

impl std::fmt::Display for AliasKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            AliasKind::Workspace => "workspace",
            AliasKind::Npm => "npm",
            AliasKind::Path => "path",
        })
    }
}

/// A canonical `(name, spec)` pair, and the alias that produced it if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub name: String,
    pub spec: String,
    pub alias: Option<AliasKind>,
}

impl Normalized {
    fn canonical(name: &str, spec: &str) -> Self {
        Normalized {
            name: name.to_string(),
            spec: spec.to_string(),
            alias: None,
        }
    }

    fn aliased(kind: AliasKind, name: &str, spec: &str) -> Self {
        Normalized {
            name: name.to_string(),
            spec: spec.to_string(),
            alias: Some(kind),
        }
    }

    /// Whether the dependency is satisfied from the workspace index rather than
    /// the lock record.
    pub fn is_workspace(&self) -> bool {
        self.alias == Some(AliasKind::Workspace)
    }
}

/// Rewrite an alias-style `(name, spec)` to the canonical pair.
///
/// Pure: the same input always yields the same output, and a pair that is
/// already canonical comes back unchanged with `alias: None`.
pub fn normalize(name: &str, spec: &str) -> Normalized {
    if let Some(range) = spec.strip_prefix(WORKSPACE_PREFIX) {
        let range = match range.trim() {
            "" | "*" | "^" | "~" => "*",
            other => other,
        };
        return Normalized::aliased(AliasKind::Workspace, name, range);
    }

    if let Some(target) = spec.strip_prefix(NPM_PREFIX) {
        // Split on the last '@' so scoped targets keep their scope.
        return match target.rfind('@') {
            Some(idx) if idx > 0 => {
                Normalized::aliased(AliasKind::Npm, &target[..idx], &target[idx + 1..])
            }
            _ => Normalized::aliased(AliasKind::Npm, target, "*"),
        };
    }

    if let Some(path) = spec.strip_prefix('/') {
        if let Some((target, version)) = path.rsplit_once('/') {
            if !target.is_empty() && !version.is_empty() {
                return Normalized::aliased(AliasKind::Path, target, version);
            }
        }
    }

    Normalized::canonical(name, spec)
}
