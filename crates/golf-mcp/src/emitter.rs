//! Emitter: combine a registry and a server configuration into one artifact.

use std::collections::HashMap;

use golf_compiler::Registry;
use golf_core::{
    ComponentCategory, Diagnostic, DiagnosticKind, Diagnostics, Error, Result, ServerConfig,
    Transport,
};

use crate::manifest::{
    ComponentEntry, HealthRoute, ServerArtifact, ServerManifest, ServerSection, SharedModuleEntry,
    MANIFEST_VERSION,
};
use crate::telemetry::{EnvVars, TelemetryPlan, TelemetryResolution};
use crate::template::UriTemplate;

/// Builds a [`ServerArtifact`] from a compiled [`Registry`].
///
/// # Example
///
/// ```rust,ignore
/// let compilation = Compiler::new(root).compile()?;
/// let artifact = Emitter::new(ServerConfig::load(root)?)
///     .with_process_env()
///     .emit(&compilation.registry)?;
/// artifact.write_to(&root.join("dist"))?;
/// ```
#[derive(Debug, Clone)]
pub struct Emitter {
    config: ServerConfig,
    env: EnvVars,
}

impl Emitter {
    /// Emitter for `config`, with an empty environment.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            env: EnvVars::new(),
        }
    }

    /// Add environment variables consulted for telemetry.
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Snapshot the process environment.
    pub fn with_process_env(self) -> Self {
        self.with_env(std::env::vars())
    }

    /// Configuration being emitted.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Validate and emit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Compilation`] if the configuration and registry
    /// cannot be combined into a server. No artifact is produced.
    pub fn emit(&self, registry: &Registry) -> Result<ServerArtifact> {
        validate_config(&self.config)?;
        validate_resources(registry)?;

        let mut diagnostics = Diagnostics::new();
        let telemetry = if self.config.tracing.enabled {
            match TelemetryPlan::resolve(
                &self.config.name,
                self.config.tracing.default_exporter,
                &self.env,
            ) {
                TelemetryResolution::Enabled(plan) => {
                    log::info!("Tracing enabled with the {} exporter", plan.exporter);
                    Some(plan)
                }
                TelemetryResolution::Disabled { reason } => {
                    diagnostics.push(Diagnostic::global(DiagnosticKind::TracingDisabled, reason));
                    None
                }
            }
        } else {
            None
        };

        let entries = |category: ComponentCategory| -> Vec<ComponentEntry> {
            registry
                .list(category)
                .map(ComponentEntry::from_descriptor)
                .collect()
        };
        let health = &self.config.health_check;

        let manifest = ServerManifest {
            version: MANIFEST_VERSION,
            server: ServerSection {
                name: self.config.name.clone(),
                description: self.config.description.clone(),
                transport: self.config.transport,
                host: self.config.host.clone(),
                port: self.config.port,
                stateless_http: self.config.stateless_http,
            },
            health_check: health.enabled.then(|| HealthRoute {
                path: health.path.clone(),
                response: health.response.clone(),
            }),
            telemetry,
            tools: entries(ComponentCategory::Tool),
            resources: entries(ComponentCategory::Resource),
            prompts: entries(ComponentCategory::Prompt),
            shared_modules: registry
                .shared_modules()
                .iter()
                .map(|m| SharedModuleEntry {
                    path: m.path.clone(),
                    module: m.module.clone(),
                })
                .collect(),
        };

        log::info!(
            "Emitted server '{}' with {} component(s) over {}",
            manifest.server.name,
            manifest.component_count(),
            manifest.server.transport
        );
        Ok(ServerArtifact {
            manifest,
            diagnostics,
        })
    }
}

/// Reject transport and feature combinations that cannot be served.
///
/// # Errors
///
/// Returns [`Error::Compilation`] naming the first violated rule.
pub fn validate_config(config: &ServerConfig) -> Result<()> {
    if config.name.trim().is_empty() {
        return Err(Error::compilation("server name must not be empty"));
    }

    let transport = config.transport;
    if transport.is_http() {
        if config.host.trim().is_empty() {
            return Err(Error::compilation(format!(
                "transport {transport} needs a host to bind"
            )));
        }
        if config.port == 0 {
            return Err(Error::compilation(format!(
                "transport {transport} needs a non-zero port"
            )));
        }
    }

    if config.stateless_http && transport != Transport::StreamableHttp {
        return Err(Error::compilation(format!(
            "stateless_http requires the streamable-http transport, not {transport}"
        )));
    }

    let health = &config.health_check;
    if health.enabled {
        if !transport.is_http() {
            return Err(Error::compilation(format!(
                "health check route needs an HTTP transport, not {transport}"
            )));
        }
        if !health.path.starts_with('/') {
            return Err(Error::compilation(format!(
                "health check path '{}' must start with '/'",
                health.path
            )));
        }
        if let Some(problem) = route_syntax_problem(&health.path) {
            return Err(Error::compilation(format!(
                "health check path '{}' must be a literal route: {problem}",
                health.path
            )));
        }
        let path = normalize_route(&health.path);
        if let Some(route) = transport
            .reserved_routes()
            .iter()
            .find(|route| path == **route || path.starts_with(&format!("{route}/")))
        {
            return Err(Error::compilation(format!(
                "health check path '{}' collides with the {transport} route {route}",
                health.path
            )));
        }
    }
    Ok(())
}

/// Every resource URI compiles and no two resources share one.
fn validate_resources(registry: &Registry) -> Result<()> {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for descriptor in registry.list(ComponentCategory::Resource) {
        let Some(binding) = &descriptor.resource else {
            continue;
        };
        UriTemplate::parse(&binding.uri).map_err(|e| {
            Error::compilation(format!("resource '{}': {e}", descriptor.id))
        })?;
        if let Some(first) = seen.insert(binding.uri.as_str(), descriptor.id.as_str()) {
            return Err(Error::compilation(format!(
                "resources '{first}' and '{}' share the URI {}",
                descriptor.id, binding.uri
            )));
        }
    }
    Ok(())
}

/// Why `path` is not a plain literal route, if it is not.
///
/// The router reads `{name}` as a capture and rejects segments starting with
/// `:` or `*`; a `?` or `#` can never match a request path.
fn route_syntax_problem(path: &str) -> Option<String> {
    if let Some(c) = path.chars().find(|c| matches!(c, '{' | '}' | '?' | '#')) {
        return Some(format!("'{c}' is not allowed"));
    }
    path.split('/')
        .find(|segment| segment.starts_with(':') || segment.starts_with('*'))
        .map(|segment| format!("segment '{segment}' would be read as a capture"))
}

fn normalize_route(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}
