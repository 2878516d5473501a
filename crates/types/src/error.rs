//! Error types for the iPXE distributor

use crate::QueryKind;
use thiserror::Error;

/// Configuration specific errors
///
/// Every variant is fatal: the loader never hands out a partially built
/// configuration alongside one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// File not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// File exists but could not be read
    #[error("Can't read configuration file {path}: {message}")]
    ReadFailed { path: String, message: String },

    /// YAML syntax error
    #[error("Configuration parse error: {0}")]
    ParseError(String),

    /// Top-level document is not a mapping
    #[error("Invalid configuration document: expected a mapping at the top level, found {found}")]
    InvalidDocument { found: String },

    /// A value has the wrong shape for the key it is stored under
    #[error("Invalid type for {path}: expected {expected}, found {found}")]
    InvalidType {
        path: String,
        expected: String,
        found: String,
    },

    /// A mapping key is not a string
    #[error("Invalid key type in {section}: expected string, found {found}")]
    InvalidKey { section: String, found: String },

    /// Missing required field
    #[error("Missing required configuration field: {field}")]
    MissingField { field: String },

    /// Base URL could not be parsed
    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    /// Base URL uses something other than plain http
    #[error("Invalid or unsupported scheme {scheme}")]
    UnsupportedScheme { scheme: String },

    /// Invalid value
    #[error("Invalid configuration value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Process settings could not be extracted from defaults and environment
    #[error("Invalid service settings: {0}")]
    InvalidSettings(String),
}

/// Lookup failures raised while resolving a boot script
///
/// Each variant corresponds to one stage of the resolution pipeline so that
/// operators can tell an unknown identity apart from a broken node entry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The identity is not present in the index for its kind
    #[error("no node label for {kind} {identity}")]
    NoLabel { kind: QueryKind, identity: String },

    /// The index points at a label the node registry doesn't know
    #[error("label {label} has no node data")]
    NoNodeData { label: String },

    /// The node exists but names no image
    #[error("node {label} has no image configured")]
    NoImage { label: String },

    /// The node names an image that isn't defined
    #[error("image {image} referenced by label {label} does not exist")]
    MissingImage { image: String, label: String },
}

impl LookupError {
    /// Node label involved in the failure, if the lookup got that far
    pub fn label(&self) -> Option<&str> {
        match self {
            LookupError::NoLabel { .. } => None,
            LookupError::NoNodeData { label }
            | LookupError::NoImage { label }
            | LookupError::MissingImage { label, .. } => Some(label),
        }
    }
}

/// Result type alias for configuration loading
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for boot script lookups
pub type LookupResult<T> = std::result::Result<T, LookupError>;
