//! The emitted server artifact.
//!
//! A [`ServerManifest`] is everything a runtime needs to stand the server
//! up: server settings, the health route, the telemetry plan, and one
//! entry per registered component with its externally visible contract.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use golf_compiler::{ComponentDescriptor, EntryPoint, Parameter};
use golf_core::{ComponentCategory, Diagnostics, Error, Result, Transport};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::invoker::EntryPointInvoker;
use crate::server::ComposedServer;
use crate::telemetry::TelemetryPlan;

/// File name of a written manifest.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Manifest format version.
pub const MANIFEST_VERSION: u32 = 1;

/// Server-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSection {
    /// Server name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Wire transport.
    pub transport: Transport,
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Serve streamable HTTP without session state.
    pub stateless_http: bool,
}

/// The health-check route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthRoute {
    /// Route path.
    pub path: String,
    /// Body returned on success.
    pub response: String,
}

/// One registered component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentEntry {
    /// Externally visible name.
    pub id: String,
    /// Externally visible description.
    pub description: String,
    /// Advertised parameters.
    pub parameters: Vec<Parameter>,
    /// JSON Schema built from the parameters.
    pub input_schema: Value,
    /// Structured output schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
    /// Callable the runtime invokes.
    pub entry_point: EntryPoint,
    /// URI or URI template, for resources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Dotted name of the shared module in scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_module: Option<String>,
}

impl ComponentEntry {
    /// Build the entry for a compiled component.
    pub fn from_descriptor(descriptor: &ComponentDescriptor) -> Self {
        Self {
            id: descriptor.id.clone(),
            description: descriptor.description.clone(),
            parameters: descriptor.parameters.clone(),
            input_schema: descriptor.input_schema(),
            output_schema: descriptor.output_schema.clone(),
            entry_point: descriptor.entry_point.clone(),
            uri: descriptor.resource.as_ref().map(|r| r.uri.clone()),
            shared_module: descriptor
                .shared_dependency
                .as_ref()
                .map(|m| m.module.clone()),
        }
    }

    /// Parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// A shared module referenced by at least one component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedModuleEntry {
    /// Project-relative path.
    pub path: PathBuf,
    /// Dotted module name.
    pub module: String,
}

/// The full description of an emitted server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerManifest {
    /// Format version.
    pub version: u32,
    /// Server settings.
    pub server: ServerSection,
    /// Health route, when enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check: Option<HealthRoute>,
    /// Telemetry plan, when tracing is enabled and resolvable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telemetry: Option<TelemetryPlan>,
    /// Tools, in registry order.
    #[serde(default)]
    pub tools: Vec<ComponentEntry>,
    /// Resources, in registry order.
    #[serde(default)]
    pub resources: Vec<ComponentEntry>,
    /// Prompts, in registry order.
    #[serde(default)]
    pub prompts: Vec<ComponentEntry>,
    /// Shared modules, each once.
    #[serde(default)]
    pub shared_modules: Vec<SharedModuleEntry>,
}

impl ServerManifest {
    /// Entries of one category.
    pub fn entries(&self, category: ComponentCategory) -> &[ComponentEntry] {
        match category {
            ComponentCategory::Tool => &self.tools,
            ComponentCategory::Resource => &self.resources,
            ComponentCategory::Prompt => &self.prompts,
        }
    }

    /// Total number of components.
    pub fn component_count(&self) -> usize {
        self.tools.len() + self.resources.len() + self.prompts.len()
    }

    /// Read a manifest written by [`ServerArtifact::write_to`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, [`Error::Json`] if
    /// it does not parse, or [`Error::Config`] for an unknown version.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        let manifest: Self = serde_json::from_str(&content)?;
        if manifest.version != MANIFEST_VERSION {
            return Err(Error::config(format!(
                "{} has manifest version {}, expected {MANIFEST_VERSION}",
                path.display(),
                manifest.version
            )));
        }
        Ok(manifest)
    }
}

/// Emitter output: the manifest plus emit-time warnings.
#[derive(Debug, Clone)]
pub struct ServerArtifact {
    /// The composed server description.
    pub manifest: ServerManifest,
    /// Warnings raised while emitting.
    pub diagnostics: Diagnostics,
}

impl ServerArtifact {
    /// Write `manifest.json` into `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the directory or file cannot be written.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir).map_err(|e| Error::io_with_path(e, dir))?;
        let path = dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(&self.manifest)?;
        std::fs::write(&path, json + "\n").map_err(|e| Error::io_with_path(e, &path))?;
        log::info!("Wrote {}", path.display());
        Ok(path)
    }

    /// Build a runnable server over `invoker`.
    ///
    /// # Errors
    ///
    /// Returns an error if a resource URI template does not compile.
    pub fn compose(&self, invoker: Arc<dyn EntryPointInvoker>) -> crate::Result<ComposedServer> {
        ComposedServer::new(self.manifest.clone(), invoker)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn manifest() -> ServerManifest {
        ServerManifest {
            version: MANIFEST_VERSION,
            server: ServerSection {
                name: "demo".into(),
                description: None,
                transport: Transport::StreamableHttp,
                host: "127.0.0.1".into(),
                port: 3000,
                stateless_http: false,
            },
            health_check: Some(HealthRoute {
                path: "/health".into(),
                response: "OK".into(),
            }),
            telemetry: None,
            tools: vec![ComponentEntry {
                id: "hello".into(),
                description: "Hello World tool".into(),
                parameters: Vec::new(),
                input_schema: json!({"type": "object", "properties": {}}),
                output_schema: None,
                entry_point: EntryPoint {
                    module: "tools.hello".into(),
                    symbol: "hello".into(),
                    source: PathBuf::from("tools/hello.py"),
                    is_async: false,
                    line: 10,
                },
                uri: None,
                shared_module: None,
            }],
            resources: Vec::new(),
            prompts: Vec::new(),
            shared_modules: Vec::new(),
        }
    }

    #[test]
    fn test_write_and_load() {
        let dir = TempDir::new().unwrap();
        let artifact = ServerArtifact {
            manifest: manifest(),
            diagnostics: Diagnostics::new(),
        };
        let path = artifact.write_to(&dir.path().join("dist")).unwrap();
        assert!(path.ends_with("dist/manifest.json"));

        let loaded = ServerManifest::load(&path).unwrap();
        assert_eq!(loaded, artifact.manifest);
        assert_eq!(loaded.component_count(), 1);
        assert_eq!(loaded.entries(ComponentCategory::Tool)[0].id, "hello");
    }

    #[test]
    fn test_json_shape() {
        let value = serde_json::to_value(manifest()).unwrap();
        assert_eq!(value["server"]["transport"], "streamable-http");
        assert_eq!(value["health_check"]["path"], "/health");
        assert!(value.get("telemetry").is_none());
        assert!(value["tools"][0].get("uri").is_none());
    }

    #[test]
    fn test_load_rejects_unknown_version() {
        let dir = TempDir::new().unwrap();
        let mut m = manifest();
        m.version = 99;
        let path = dir.path().join(MANIFEST_FILE);
        std::fs::write(&path, serde_json::to_string(&m).unwrap()).unwrap();
        let err = ServerManifest::load(&path).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
