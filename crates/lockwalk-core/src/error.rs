//! Walk error types.

use serde::Serialize;

/// Errors raised while replaying a lock record.
///
/// A `NotResolved` or `NoMeta` failure is only an error when the branch it
/// occurred on is required; otherwise it is downgraded to a notice or
/// dropped. `DepthExceeded` is always fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalkError {
    /// No locked version satisfies the requested range, or an alias target
    /// is missing from the lock record.
    #[error(
        "cannot resolve version for package {name}. specified {range}{}",
        present_suffix(.present)
    )]
    NotResolved {
        name: String,
        range: String,
        /// Versions that were present but rejected by the range.
        present: Vec<String>,
    },

    /// A version was chosen but the lock record holds no integrity/content
    /// record for it.
    #[error("no metadata for {name}@{version}{}", location_suffix(.location))]
    NoMeta {
        name: String,
        version: String,
        location: Option<String>,
    },

    /// The walk descended past the configured depth limit.
    #[error("dependency depth {depth} exceeds limit {limit} at package {name}")]
    DepthExceeded {
        name: String,
        depth: usize,
        limit: usize,
    },
}

/// Stable numeric codes for [`WalkError`] kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    NotResolved = 1,
    NoMeta = 2,
    DepthExceeded = 3,
}

impl WalkError {
    /// The numeric code for this error kind.
    pub fn code(&self) -> ErrorCode {
        match self {
            WalkError::NotResolved { .. } => ErrorCode::NotResolved,
            WalkError::NoMeta { .. } => ErrorCode::NoMeta,
            WalkError::DepthExceeded { .. } => ErrorCode::DepthExceeded,
        }
    }

    /// Name of the package the error is about.
    pub fn package_name(&self) -> &str {
        match self {
            WalkError::NotResolved { name, .. }
            | WalkError::NoMeta { name, .. }
            | WalkError::DepthExceeded { name, .. } => name,
        }
    }
}

fn present_suffix(present: &[String]) -> String {
    if present.is_empty() {
        String::new()
    } else {
        format!(". locked {}", present.join(", "))
    }
}

fn location_suffix(location: &Option<String>) -> String {
    match location {
        Some(location) => format!(" at {location}"),
        None => String::new(),
    }
}

/// Result type alias for walk operations.
pub type Result<T> = std::result::Result<T, WalkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_resolved_message_names_locked_version() {
        let err = WalkError::NotResolved {
            name: "left-pad".to_string(),
            range: "^2.0.0".to_string(),
            present: vec!["1.3.0".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "cannot resolve version for package left-pad. specified ^2.0.0. locked 1.3.0"
        );
        assert_eq!(err.code(), ErrorCode::NotResolved);
        assert_eq!(err.code() as u8, 1);
    }

    #[test]
    fn not_resolved_without_candidates() {
        let err = WalkError::NotResolved {
            name: "ghost".to_string(),
            range: "*".to_string(),
            present: Vec::new(),
        };
        assert_eq!(
            err.to_string(),
            "cannot resolve version for package ghost. specified *"
        );
    }

    #[test]
    fn no_meta_message() {
        let err = WalkError::NoMeta {
            name: "a".to_string(),
            version: "1.0.0".to_string(),
            location: Some("node_modules/a".to_string()),
        };
        assert_eq!(err.to_string(), "no metadata for a@1.0.0 at node_modules/a");
        assert_eq!(err.code() as u8, 2);
        assert_eq!(err.package_name(), "a");
    }

    #[test]
    fn depth_exceeded_code() {
        let err = WalkError::DepthExceeded {
            name: "deep".to_string(),
            depth: 101,
            limit: 100,
        };
        assert_eq!(err.code(), ErrorCode::DepthExceeded);
        assert!(err.to_string().contains("101"));
    }
}
