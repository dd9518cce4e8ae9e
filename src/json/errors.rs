use thiserror::Error;

/// Reasons a selector path failed to resolve against a JSON value.
///
/// `at` fields hold the JSONPath-style location (`$.a[0]`) of the value the
/// failing segment was applied to.
#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },
    #[error("key '{key}' not found at {at}")]
    MissingKey { key: String, at: String },
    #[error("index {index} out of bounds at {at} (length {len})")]
    IndexOutOfBounds { index: usize, len: usize, at: String },
    #[error("'{segment}' is not an array index at {at}")]
    NotAnIndex { segment: String, at: String },
    #[error("index [{index}] applied to an Object at {at}")]
    IndexIntoObject { index: usize, at: String },
    #[error("cannot descend into {found} at {at} with '{segment}'")]
    NotAContainer {
        segment: String,
        found: &'static str,
        at: String,
    },
    #[error("failed to parse JSONPath query")]
    Query(#[from] serde_json_path::ParseError),
    #[error("match for {path} not found")]
    NoMatch { path: String },
    #[error("more than one match for {path} ({count} matches)")]
    MultipleMatches { path: String, count: usize },
}

/// A single value was requested but the selection is composite or null
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("expected a single String, Number or Bool value but found {found}")]
pub struct NotScalarError {
    pub found: &'static str,
}
