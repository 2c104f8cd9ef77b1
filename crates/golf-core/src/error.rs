//! Error types for the Golf compiler.
//!
//! Every variant is fatal: compilation is all-or-nothing and no partial
//! server is ever emitted. Non-fatal issues are collected separately as
//! [`Diagnostics`](crate::diagnostics::Diagnostics).

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::category::ComponentCategory;

/// Result type alias for Golf operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while compiling a Golf project
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The project root or a category root is structurally invalid.
    #[error("Discovery error at {}: {message}", path.display())]
    Discovery {
        /// Offending directory
        path: PathBuf,
        /// What went wrong
        message: String,
    },

    /// A component (or shared-code) file failed to load or has no usable entry point.
    #[error("Invalid {category} component {}: {message}", path.display())]
    InvalidComponent {
        /// Category whose tree contains the file
        category: ComponentCategory,
        /// Offending file
        path: PathBuf,
        /// Which rule was violated
        message: String,
    },

    /// Two distinct files in one category derive the same identifier.
    #[error(
        "Duplicate {category} id '{id}': {} and {} resolve to the same id",
        first.display(),
        second.display()
    )]
    DuplicateId {
        /// Category in which the collision happened
        category: ComponentCategory,
        /// The colliding identifier
        id: String,
        /// File that claimed the id first
        first: PathBuf,
        /// File that tried to claim it again
        second: PathBuf,
    },

    /// Configuration and registry cannot be combined into a server.
    #[error("Compilation error: {message}")]
    Compilation {
        /// What made the combination unemittable
        message: String,
    },

    /// Configuration file is missing or invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },

    /// I/O error tied to a specific path.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Creates a discovery error for a directory.
    pub fn discovery(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Discovery {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid-component error naming the file and the violated rule.
    pub fn invalid_component(
        category: ComponentCategory,
        path: impl Into<PathBuf>,
        message: impl Into<String>,
    ) -> Self {
        Error::InvalidComponent {
            category,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a compilation error.
    pub fn compilation(message: impl Into<String>) -> Self {
        Error::Compilation {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Wraps an I/O error with the path it occurred on.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Returns the file or directory the error is about, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Error::Discovery { path, .. }
            | Error::InvalidComponent { path, .. }
            | Error::Io { path, .. } => Some(path),
            Error::DuplicateId { second, .. } => Some(second),
            Error::Compilation { .. } | Error::Config { .. } | Error::Json(_) => None,
        }
    }

    /// Returns the component category the error is about, if any.
    pub fn category(&self) -> Option<ComponentCategory> {
        match self {
            Error::InvalidComponent { category, .. } | Error::DuplicateId { category, .. } => {
                Some(*category)
            }
            _ => None,
        }
    }
}
