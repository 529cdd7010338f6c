//! Error types for schema loading, reference resolution and generation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while loading documents or resolving references.
#[derive(Debug, Error)]
pub enum ResolveError {
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

    // Schema errors (exit code 2)
    #[error("invalid schema id \"{id}\": {message}")]
    InvalidId { id: String, message: String },

    #[error("unresolved reference: {reference}")]
    UnresolvedReference { reference: String },

    #[error("pointer {pointer} not found in {document}")]
    PointerNotFound { document: String, pointer: String },

    #[error("cannot load {url}: unsupported scheme")]
    UnsupportedScheme { url: String },
}

impl ResolveError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ResolveError::FileNotFound { .. } | ResolveError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            ResolveError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors during type generation.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("unknown type \"{type_name}\" in {schema}")]
    UnknownType { type_name: String, schema: String },

    #[error("referenced schema has no type name: {reference}")]
    UnnamedReference { reference: String },
}

impl GenerateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            GenerateError::Resolve(e) => e.exit_code(),
            _ => 2,
        }
    }
}

/// Errors loading a generator config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    InvalidConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no input schemas given")]
    NoSources,
}

impl ConfigError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConfigError::ReadError { .. } => 3,
            _ => 2,
        }
    }
}
