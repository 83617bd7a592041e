//! Query evaluation errors.
//!
//! # Responsibility
//! - Classify every evaluation failure into a small, stable `ErrorKind`.
//! - Carry breadcrumbs naming the link, node and tether that failed.
//!
//! # Invariants
//! - `StoreError::NodeNotFound` maps to `ErrorKind::NotFound`; every other
//!   store failure maps to `ErrorKind::Uncategorized` and is kept as `source`.

use crate::store::StoreError;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by path evaluation.
pub type PathResult<T> = Result<T, PathError>;

/// Stable error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A single node was required but several matched.
    AmbiguousPath,
    /// Nothing matched, or an anchor/node does not exist.
    NotFound,
    /// The root is unreachable from a node (orphan or parent cycle).
    InvalidParent,
    /// Input contained the same node twice.
    DuplicateNode,
    /// Any other failure.
    Uncategorized,
}

impl ErrorKind {
    /// Returns the snake_case name used in logs and serialized output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AmbiguousPath => "ambiguous_path",
            Self::NotFound => "not_found",
            Self::InvalidParent => "invalid_parent",
            Self::DuplicateNode => "duplicate_node",
            Self::Uncategorized => "uncategorized",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evaluation error with diagnostic breadcrumbs.
#[derive(Debug)]
pub struct PathError {
    kind: ErrorKind,
    message: String,
    breadcrumbs: Vec<(String, String)>,
    source: Option<StoreError>,
}

impl PathError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            breadcrumbs: Vec::new(),
            source: None,
        }
    }

    pub fn ambiguous_path(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AmbiguousPath, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn invalid_parent(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParent, message)
    }

    pub fn duplicate_node(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateNode, message)
    }

    pub fn uncategorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Uncategorized, message)
    }

    /// Appends one `key=value` breadcrumb.
    pub fn with_breadcrumb(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.breadcrumbs.push((key.into(), value.to_string()));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn breadcrumbs(&self) -> &[(String, String)] {
        &self.breadcrumbs
    }

    /// Returns the first breadcrumb value recorded under `key`.
    pub fn breadcrumb(&self, key: &str) -> Option<&str> {
        self.breadcrumbs
            .iter()
            .find(|(current, _)| current == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn store_error(&self) -> Option<&StoreError> {
        self.source.as_ref()
    }
}

impl Display for PathError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        for (key, value) in &self.breadcrumbs {
            write!(f, " {key}={value}")?;
        }
        Ok(())
    }
}

impl Error for PathError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_ref().map(|err| err as &(dyn Error + 'static))
    }
}

impl From<StoreError> for PathError {
    fn from(value: StoreError) -> Self {
        let kind = match value {
            StoreError::NodeNotFound(_) => ErrorKind::NotFound,
            _ => ErrorKind::Uncategorized,
        };
        Self {
            kind,
            message: value.to_string(),
            breadcrumbs: Vec::new(),
            source: Some(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, PathError};
    use crate::store::StoreError;
    use std::error::Error;
    use uuid::Uuid;

    #[test]
    fn store_errors_map_to_kinds_and_keep_source() {
        let missing: PathError = StoreError::NodeNotFound(Uuid::new_v4()).into();
        assert_eq!(missing.kind(), ErrorKind::NotFound);
        assert!(missing.source().is_some());

        let other: PathError = StoreError::RootImmutable.into();
        assert_eq!(other.kind(), ErrorKind::Uncategorized);
        assert!(matches!(other.store_error(), Some(StoreError::RootImmutable)));
    }

    #[test]
    fn breadcrumbs_render_in_display() {
        let err = PathError::not_found("no match")
            .with_breadcrumb("link", "child('a')")
            .with_breadcrumb("node", 7);
        assert_eq!(err.breadcrumb("node"), Some("7"));
        assert_eq!(err.to_string(), "not_found: no match link=child('a') node=7");
    }
}
