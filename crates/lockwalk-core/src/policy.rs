//! Requiredness and failure classification.
//!
//! | requiredness | on failure                          |
//! |--------------|-------------------------------------|
//! | `Require`    | fatal: `on_error`, walk aborts      |
//! | `Skip`       | silent: branch pruned               |
//! | `BestEffort` | notice: one `on_info`, branch pruned|

use serde::{Deserialize, Serialize};

use crate::package::DependencyKind;

/// How hard to try for a dependency branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Requiredness {
    /// Must resolve; a failure aborts the walk.
    Require,
    /// Never attempted as a top-level group; failures below are silent.
    Skip,
    /// Attempted; a failure becomes an informational notice.
    BestEffort,
}

/// What the walker does with a failed resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Fatal,
    Silent,
    Notice,
}

impl Requiredness {
    /// Requiredness for an edge of `kind` below a branch with `self`.
    ///
    /// Inherited unchanged, except optional and optional-peer edges, which
    /// are always `Skip`.
    pub fn for_edge(self, kind: DependencyKind) -> Requiredness {
        if kind.is_optional() {
            Requiredness::Skip
        } else {
            self
        }
    }

    /// Classify a failure on a branch with this requiredness.
    pub fn on_failure(self) -> Disposition {
        match self {
            Requiredness::Require => Disposition::Fatal,
            Requiredness::Skip => Disposition::Silent,
            Requiredness::BestEffort => Disposition::Notice,
        }
    }
}

impl std::fmt::Display for Requiredness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Requiredness::Require => "require",
            Requiredness::Skip => "skip",
            Requiredness::BestEffort => "best-effort",
        })
    }
}

impl std::str::FromStr for Requiredness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "require" | "required" | "true" => Ok(Requiredness::Require),
            "skip" | "false" => Ok(Requiredness::Skip),
            "best-effort" | "besteffort" => Ok(Requiredness::BestEffort),
            other => Err(format!(
                "unknown requiredness '{other}' (expected require, skip, or best-effort)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_table() {
        assert_eq!(Requiredness::Require.on_failure(), Disposition::Fatal);
        assert_eq!(Requiredness::Skip.on_failure(), Disposition::Silent);
        assert_eq!(Requiredness::BestEffort.on_failure(), Disposition::Notice);
    }

    #[test]
    fn inherited_for_regular_edges() {
        for kind in [DependencyKind::Prod, DependencyKind::Peer, DependencyKind::Dev] {
            assert_eq!(Requiredness::Require.for_edge(kind), Requiredness::Require);
            assert_eq!(Requiredness::BestEffort.for_edge(kind), Requiredness::BestEffort);
        }
    }

    #[test]
    fn optional_edges_are_skipped() {
        for kind in [DependencyKind::Optional, DependencyKind::PeerOptional] {
            assert_eq!(Requiredness::Require.for_edge(kind), Requiredness::Skip);
            assert_eq!(Requiredness::BestEffort.for_edge(kind), Requiredness::Skip);
        }
    }

    #[test]
    fn parse_and_display() {
        for r in [Requiredness::Require, Requiredness::Skip, Requiredness::BestEffort] {
            assert_eq!(r.to_string().parse::<Requiredness>().unwrap(), r);
        }
        assert!("maybe".parse::<Requiredness>().is_err());
    }
}
