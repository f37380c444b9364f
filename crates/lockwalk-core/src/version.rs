//! npm-style version ranges and minimum-satisfying selection.
//!
//! Range syntax (unions with `||`, hyphen ranges, partial versions, `x`
//! wildcards) is npm's, parsed by `deno_semver`. Dist-tags other than
//! `latest` name no fixed version, so they never match a lock record.

/// A parsed semantic version.
pub type Version = deno_semver::Version;

/// Error returned when a range string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid version range '{range}': {reason}")]
pub struct RangeError {
    pub range: String,
    pub reason: String,
}

/// An npm version range such as `^1.2.0`, `1.x || >=3`, or `1.0.0 - 1.4.0`.
#[derive(Debug, Clone)]
pub struct VersionRange {
    raw: String,
    req: deno_semver::VersionReq,
}

impl VersionRange {
    /// Parse an npm range expression.
    pub fn parse(raw: &str) -> Result<Self, RangeError> {
        let error = |reason: String| RangeError {
            range: raw.to_string(),
            reason,
        };
        let text = match raw.trim() {
            "" | "latest" => "*",
            text => text,
        };
        let req = deno_semver::VersionReq::parse_from_npm(text).map_err(|e| error(e.to_string()))?;
        if let Some(tag) = req.tag() {
            return Err(error(format!("dist-tag '{tag}' names no fixed version")));
        }
        Ok(VersionRange {
            raw: raw.to_string(),
            req,
        })
    }

    /// The range as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Check if a version satisfies this range.
    pub fn matches(&self, version: &Version) -> bool {
        self.req.matches(version)
    }
}

impl std::fmt::Display for VersionRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Parse a locked version string, tolerating a leading `v` or `=`.
pub fn parse_version(s: &str) -> Option<Version> {
    let s = s.trim();
    let s = s.strip_prefix('=').unwrap_or(s);
    let s = s
        .strip_prefix('v')
        .or_else(|| s.strip_prefix('V'))
        .unwrap_or(s);
    Version::parse_from_npm(s).ok()
}

/// Check if a version string satisfies a range string.
///
/// Returns `false` when either side does not parse.
pub fn satisfies(version: &str, range: &str) -> bool {
    match (parse_version(version), VersionRange::parse(range)) {
        (Some(version), Ok(range)) => range.matches(&version),
        _ => false,
    }
}

/// Pick the lowest candidate that satisfies `range`.
///
/// A lock record already fixes what was installed, so the lowest
/// satisfying version is the one the record refers to. A single candidate
/// that is textually identical to `range` is returned without parsing, since
/// some locked versions (pnpm peer suffixes such as `1.0.9_request@2.88.0`)
/// are not valid range syntax. Candidates that fail to parse are ignored.
pub fn resolve<S: AsRef<str>>(candidates: &[S], range: &str) -> Option<String> {
    if let [only] = candidates {
        if only.as_ref() == range {
            return Some(range.to_string());
        }
    }

    let range = VersionRange::parse(range).ok()?;
    candidates
        .iter()
        .filter_map(|candidate| {
            let candidate = candidate.as_ref();
            parse_version(candidate)
                .filter(|version| range.matches(version))
                .map(|version| (version, candidate))
        })
        .min_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, candidate)| candidate.to_string())
}
