//! Error types for include resolution, parameter parsing and document loading.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single walk step while reading resource metadata.
///
/// The extractor never surfaces these to its caller; they end the pass
/// they occurred in and are logged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("resource of type '{resource_type}' has no property '{property}'")]
    PropertyNotFound {
        resource_type: String,
        property: String,
    },

    #[error("property '{property}' of type '{resource_type}' is not a relationship: got {actual}")]
    NotARelationship {
        resource_type: String,
        property: String,
        actual: String,
    },

    #[error("id of type '{resource_type}' must be a string or number, got {actual}")]
    InvalidId {
        resource_type: String,
        actual: String,
    },

    #[error("no resource registered for handle {handle}")]
    UnknownResource { handle: String },
}

/// Inconsistencies in a resource registry or resource graph.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("resource type '{resource_type}' is registered twice")]
    DuplicateType { resource_type: String },

    #[error("class '{class}' is registered twice")]
    DuplicateClass { class: String },

    #[error("resource key '{key}' is used twice")]
    DuplicateKey { key: String },

    #[error("resource '{from}' property '{property}' references unknown resource '{target}'")]
    DanglingReference {
        from: String,
        property: String,
        target: String,
    },

    #[error("no resource with handle {handle}")]
    UnknownNode { handle: String },
}

/// Errors while parsing `include` query parameters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParamsError {
    #[error("malformed include parameter '{key}': expected include[<type>]")]
    MalformedKey { key: String },

    #[error("include parameter '{key}' names no resource type")]
    EmptyResourceType { key: String },

    #[error("bare include parameter needs a resource type (no element name given)")]
    MissingElementName,
}

impl ParamsError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Errors while loading a resource document.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid document: {message}")]
    InvalidDocument { message: String },

    #[error(transparent)]
    Document(#[from] DocumentError),
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors during document validation.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("validation failed with {} error(s)", errors.len())]
    Invalid { errors: Vec<SchemaError> },
}

/// Single validation error with path context.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SchemaError {
    /// JSON Pointer (RFC 6901) to the invalid value.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::Load(e) => e.exit_code(),
            ValidateError::Invalid { .. } => 1,
        }
    }
}
