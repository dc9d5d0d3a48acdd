//! Oak Parser Library
//!
//! Turns a directory of YAML documents into a [`ContentTree`](oak_core::ContentTree).
//!
//! - [`document`] - a single YAML document grafted onto a tree node
//! - [`loader`] - directory walking, one branch per directory

pub mod document;
pub mod loader;

use std::path::PathBuf;

pub use document::DocumentBuilder;
pub use loader::ContentLoader;
use oak_core::TreeError;
use thiserror::Error;

/// Parser errors.
#[derive(Debug, Error)]
pub enum ParserError {
    /// IO error.
    #[error("IO error in {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed YAML.
    #[error("YAML error in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Well-formed YAML that cannot be mapped onto the tree.
    #[error("invalid document {path}: {message}")]
    InvalidDocument { path: PathBuf, message: String },

    /// The tree rejected a node (duplicate or invalid name).
    #[error("content error in {path}: {source}")]
    Tree {
        path: PathBuf,
        #[source]
        source: TreeError,
    },
}

impl ParserError {
    pub(crate) fn invalid(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for parser operations.
pub type Result<T> = std::result::Result<T, ParserError>;
