//! Error types for golf-mcp, and their mapping onto MCP protocol errors.

use rmcp::model::ErrorData;
use thiserror::Error;

/// Result type alias for golf-mcp operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while composing or running an emitted server
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from golf-core
    #[error(transparent)]
    Core(#[from] golf_core::Error),

    /// A resource URI template cannot be matched against.
    #[error("Invalid URI template '{template}': {message}")]
    UriTemplate {
        /// The offending template
        template: String,
        /// What is wrong with it
        message: String,
    },
}

impl Error {
    /// Creates a URI template error.
    pub fn uri_template(template: impl Into<String>, message: impl Into<String>) -> Self {
        Error::UriTemplate {
            template: template.into(),
            message: message.into(),
        }
    }
}

/// A failure raised by an entry point while it ran.
///
/// Passed back to MCP clients as a failed result rather than a protocol error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct InvocationError {
    /// What the entry point reported.
    pub message: String,
}

impl InvocationError {
    /// Creates an invocation error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Conversion of Golf errors into MCP [`ErrorData`].
pub trait McpErrorExt {
    /// Map to the MCP error a client should see.
    fn to_mcp_error(&self) -> ErrorData;
}

impl McpErrorExt for golf_core::Error {
    fn to_mcp_error(&self) -> ErrorData {
        match self {
            golf_core::Error::InvalidComponent { .. } | golf_core::Error::Config { .. } => {
                ErrorData::invalid_params(self.to_string(), None)
            }
            _ => ErrorData::internal_error(self.to_string(), None),
        }
    }
}

impl McpErrorExt for Error {
    fn to_mcp_error(&self) -> ErrorData {
        match self {
            Error::Core(inner) => inner.to_mcp_error(),
            _ => ErrorData::internal_error(self.to_string(), None),
        }
    }
}
