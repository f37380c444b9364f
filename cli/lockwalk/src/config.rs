//! `.lockwalk.toml` configuration.
//!
//! ```toml
//! [walk]
//! max-depth = 50
//! keep-going = true
//! peer = "skip"
//! dev = "best-effort"
//! format = "tree"
//! ```
//!
//! Every key is optional; command-line flags win over the file.

use std::path::Path;

use anyhow::{Context, Result};
use lockwalk_core::{GroupPolicy, Requiredness, WalkConfig};
use serde::Deserialize;

use crate::output::OutputFormat;

pub const CONFIG_FILE: &str = ".lockwalk.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LockwalkConfig {
    pub walk: WalkSection,
}

/// `[walk]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct WalkSection {
    pub max_depth: Option<usize>,
    pub keep_going: Option<bool>,
    pub peer: Option<Requiredness>,
    pub dev: Option<Requiredness>,
    pub format: Option<OutputFormat>,
}

/// Values given on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overrides {
    pub max_depth: Option<usize>,
    pub keep_going: bool,
    pub peer: Option<Requiredness>,
    pub dev: Option<Requiredness>,
    pub format: Option<OutputFormat>,
}

/// Final settings for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub walk: WalkConfig,
    pub policy: GroupPolicy,
    pub format: OutputFormat,
}

impl LockwalkConfig {
    /// Load `.lockwalk.toml` from `dir`, or the defaults when there is none.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Parse a config from a TOML string.
    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing .lockwalk.toml")
    }

    /// Merge with command-line values.
    pub fn settings(&self, overrides: Overrides) -> Settings {
        let defaults = GroupPolicy::default();
        let walk = &self.walk;
        Settings {
            walk: WalkConfig {
                max_depth: overrides
                    .max_depth
                    .or(walk.max_depth)
                    .unwrap_or(lockwalk_core::DEFAULT_MAX_DEPTH),
                keep_going: overrides.keep_going || walk.keep_going.unwrap_or(false),
            },
            policy: GroupPolicy {
                production: Requiredness::Require,
                peer: overrides.peer.or(walk.peer).unwrap_or(defaults.peer),
                dev: overrides.dev.or(walk.dev).unwrap_or(defaults.dev),
            },
            format: overrides.format.or(walk.format).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let config = LockwalkConfig::from_str(
            r#"
[walk]
max-depth = 50
keep-going = true
peer = "skip"
dev = "require"
format = "tree"
"#,
        )
        .unwrap();
        assert_eq!(config.walk.max_depth, Some(50));
        assert_eq!(config.walk.peer, Some(Requiredness::Skip));

        let settings = config.settings(Overrides::default());
        assert_eq!(settings.walk.max_depth, 50);
        assert!(settings.walk.keep_going);
        assert_eq!(settings.policy.peer, Requiredness::Skip);
        assert_eq!(settings.policy.dev, Requiredness::Require);
        assert_eq!(settings.format, OutputFormat::Tree);
    }

    #[test]
    fn defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = LockwalkConfig::load(dir.path()).unwrap();
        assert_eq!(config, LockwalkConfig::default());

        let settings = config.settings(Overrides::default());
        assert_eq!(settings.walk, WalkConfig::default());
        assert_eq!(settings.policy, GroupPolicy::default());
        assert_eq!(settings.format, OutputFormat::Chains);
    }

    #[test]
    fn flags_win_over_file() {
        let config = LockwalkConfig::from_str("[walk]\nmax-depth = 50\npeer = \"skip\"\n").unwrap();
        let settings = config.settings(Overrides {
            max_depth: Some(7),
            peer: Some(Requiredness::BestEffort),
            format: Some(OutputFormat::Json),
            ..Overrides::default()
        });
        assert_eq!(settings.walk.max_depth, 7);
        assert_eq!(settings.policy.peer, Requiredness::BestEffort);
        assert_eq!(settings.format, OutputFormat::Json);
    }

    #[test]
    fn reject_unknown_keys() {
        assert!(LockwalkConfig::from_str("[walk]\ndepth = 3\n").is_err());
        assert!(LockwalkConfig::from_str("this is not valid toml [[[").is_err());
    }

    #[test]
    fn load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[walk]\nkeep-going = true\n").unwrap();
        let config = LockwalkConfig::load(dir.path()).unwrap();
        assert_eq!(config.walk.keep_going, Some(true));
    }
}
