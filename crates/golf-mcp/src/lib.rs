//! Emitter and composed MCP server for compiled Golf projects.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        golf-mcp                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Emitter - Registry + ServerConfig → ServerArtifact         │
//! │  ServerManifest - serializable server description           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ComposedServer - tools, resources, prompts, HTTP routes    │
//! │  ToolRegistry trait - tool definitions and dispatch         │
//! │  EntryPointInvoker trait - bridge to the component runtime  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TelemetryPlan - exporter resolution, dispatch/HTTP spans   │
//! │  McpErrorExt - golf_core::Error → rmcp::ErrorData           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use golf_compiler::Compiler;
//! use golf_core::ServerConfig;
//! use golf_mcp::Emitter;
//!
//! let config = ServerConfig::load(&root)?;
//! let compilation = Compiler::new(&root).compile()?;
//! let artifact = Emitter::new(config).with_process_env().emit(&compilation.registry)?;
//! artifact.write_to(&root.join("dist"))?;
//!
//! let server = artifact.compose(Arc::new(my_runtime))?;
//! let app = server.router();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

mod dispatch;

pub mod emitter;
pub mod error;
pub mod health;
pub mod invoker;
pub mod manifest;
pub mod registry;
pub mod server;
pub mod telemetry;
pub mod template;

// Re-exports - emitter
pub use emitter::{validate_config, Emitter};
pub use manifest::{
    ComponentEntry, HealthRoute, ServerArtifact, ServerManifest, ServerSection, SharedModuleEntry,
    MANIFEST_FILE, MANIFEST_VERSION,
};

// Re-exports - server
pub use dispatch::prepare_arguments;
pub use invoker::{EntryPointInvoker, Invocation, InvokeFuture};
pub use registry::{tool_definition, ComponentTools, ToolRegistry, ToolResult};
pub use server::{
    ComposedServer, GeneratedPrompt, PromptArgumentInfo, PromptInfo, PromptMessage,
    ResourceContents, ResourceInfo,
};
pub use template::UriTemplate;

// Re-exports - telemetry
pub use telemetry::{BatchSettings, TelemetryPlan, TelemetryResolution};

// Re-exports - error
pub use error::{Error, InvocationError, McpErrorExt, Result};
