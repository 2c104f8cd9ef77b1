//! Golf Compiler - turn a project directory into a component registry.
//!
//! The compiler never executes component code. Each Python source under
//! `tools/`, `resources/` and `prompts/` is parsed statically, its
//! `export`-bound entry point is described, and the result lands in an
//! immutable [`Registry`].
//!
//! # Pipeline
//!
//! ```text
//! PathResolver ──► SharedResolver::preload ──► MetadataExtractor (parallel)
//!                                                     │
//!                     Registry ◄── RegistryBuilder ◄── IdAllocator
//! ```
//!
//! # Modules
//!
//! - [`discovery`]: category roots and file eligibility
//! - [`extractor`]: entry point, parameters, description, output schema
//! - [`pipeline`]: the [`Compiler`] driving every stage
//! - [`python`]: module outlines and signature expressions from the Python AST
//! - [`registry`]: component descriptors and the registry
//! - [`schema`]: annotation-to-JSON-Schema mapping
//! - [`shared`]: `common.py` resolution and the load-once cache

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod discovery;
pub mod extractor;
pub mod pipeline;
pub mod python;
pub mod registry;
pub mod schema;
pub mod shared;

pub use discovery::{DiscoveredProject, PathResolver};
pub use extractor::{ExtractedComponent, Extraction, MetadataExtractor};
pub use pipeline::{default_resource_uri, Compilation, Compiler};
pub use registry::{
    ComponentDescriptor, DefaultValue, EntryPoint, Parameter, Registry, RegistryBuilder,
    ResourceBinding,
};
pub use schema::{Primitive, TypeMap, TypeMapping};
pub use shared::{SharedModule, SharedModuleCache, SharedResolver, SHARED_MODULE_FILE};
