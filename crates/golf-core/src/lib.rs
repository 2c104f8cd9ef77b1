//! Golf Core - shared types, errors, diagnostics, and configuration.
//!
//! This crate provides the foundational types used across all Golf crates.
//! It has no internal Golf dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`category`]: Component categories and resolved component paths
//! - [`config`]: Server configuration consumed by the emitter
//! - [`diagnostics`]: Non-fatal build warnings
//! - [`error`]: Error types and Result alias
//! - [`ids`]: Path-derived component identifiers and collision detection

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod category;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod ids;

#[cfg(test)]
mod proptests;

// Re-export key types at crate root for convenience
pub use category::{ComponentCategory, ComponentPath};
pub use config::{ExporterKind, HealthCheckConfig, ServerConfig, TracingConfig, Transport};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::{Error, Result};
pub use ids::{derive_id, IdAllocator};
