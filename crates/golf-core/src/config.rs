//! Server configuration consumed by the emitter.
//!
//! A project keeps its configuration in `golf.toml` at the project root
//! (`golf.json` is accepted as a fallback):
//!
//! ```toml
//! name = "payments-server"
//! description = "Payment tools"
//! transport = "streamable-http"
//! port = 3000
//!
//! [health_check]
//! enabled = true
//! path = "/health"
//! response = "OK"
//!
//! [tracing]
//! enabled = true
//! default_exporter = "console"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default bind host.
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default bind port.
pub const DEFAULT_PORT: u16 = 3000;
/// Default health check route.
pub const DEFAULT_HEALTH_PATH: &str = "/health";
/// Default health check body.
pub const DEFAULT_HEALTH_RESPONSE: &str = "OK";

/// Wire transport the composed server will be served over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Transport {
    /// Server-sent events.
    Sse,
    /// Streamable HTTP.
    #[default]
    StreamableHttp,
    /// Standard input/output.
    Stdio,
}

impl Transport {
    /// Configuration spelling of the transport.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sse => "sse",
            Self::StreamableHttp => "streamable-http",
            Self::Stdio => "stdio",
        }
    }

    /// Whether the transport listens on a host/port.
    pub fn is_http(self) -> bool {
        !matches!(self, Self::Stdio)
    }

    /// Routes owned by the transport itself.
    pub fn reserved_routes(self) -> &'static [&'static str] {
        match self {
            Self::Sse => &["/sse", "/messages"],
            Self::StreamableHttp => &["/mcp"],
            Self::Stdio => &[],
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Span exporter used by emitted tracing wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExporterKind {
    /// Write spans to stderr.
    #[default]
    Console,
    /// Ship spans to an OTLP/HTTP collector.
    OtlpHttp,
}

impl ExporterKind {
    /// Configuration spelling of the exporter.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Console => "console",
            Self::OtlpHttp => "otlp_http",
        }
    }
}

impl fmt::Display for ExporterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExporterKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "console" => Ok(Self::Console),
            "otlp_http" | "otlp-http" | "otlp" => Ok(Self::OtlpHttp),
            other => Err(format!("unknown span exporter '{other}'")),
        }
    }
}

/// Health check route settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Whether to register the route.
    pub enabled: bool,
    /// Route path, e.g. `/health`.
    pub path: String,
    /// Body returned on success.
    pub response: String,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: DEFAULT_HEALTH_PATH.to_string(),
            response: DEFAULT_HEALTH_RESPONSE.to_string(),
        }
    }
}

/// Tracing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Whether to wrap every entry point in a span.
    pub enabled: bool,
    /// Exporter used unless `OTEL_TRACES_EXPORTER` overrides it.
    pub default_exporter: ExporterKind,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Resolved server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server name (required, non-empty).
    pub name: String,
    /// Optional human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Bind host for HTTP transports.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port for HTTP transports.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Wire transport.
    #[serde(default)]
    pub transport: Transport,
    /// Serve streamable HTTP without session state.
    #[serde(default)]
    pub stateless_http: bool,
    /// Health check route.
    #[serde(default)]
    pub health_check: HealthCheckConfig,
    /// Tracing instrumentation.
    #[serde(default)]
    pub tracing: TracingConfig,
}

impl ServerConfig {
    /// Preferred configuration file name.
    pub const TOML_FILE: &'static str = "golf.toml";
    /// Fallback configuration file name.
    pub const JSON_FILE: &'static str = "golf.json";

    /// Configuration with defaults for everything but the name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            host: default_host(),
            port: default_port(),
            transport: Transport::default(),
            stateless_http: false,
            health_check: HealthCheckConfig::default(),
            tracing: TracingConfig::default(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the transport.
    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// Enable the health check route.
    pub fn with_health_check(mut self, path: impl Into<String>, response: impl Into<String>) -> Self {
        self.health_check = HealthCheckConfig {
            enabled: true,
            path: path.into(),
            response: response.into(),
        };
        self
    }

    /// Enable tracing with the given default exporter.
    pub fn with_tracing(mut self, exporter: ExporterKind) -> Self {
        self.tracing = TracingConfig {
            enabled: true,
            default_exporter: exporter,
        };
        self
    }

    /// Parse and validate TOML configuration.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| Error::config(format!("Invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate JSON configuration.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| Error::config(format!("Invalid JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Locate the configuration file in a project root.
    pub fn find(project_root: &Path) -> Option<PathBuf> {
        [Self::TOML_FILE, Self::JSON_FILE]
            .into_iter()
            .map(|name| project_root.join(name))
            .find(|path| path.is_file())
    }

    /// Load configuration from a project root.
    ///
    /// Tries `golf.toml`, then `golf.json`.
    pub fn load(project_root: &Path) -> Result<Self> {
        let path = Self::find(project_root).ok_or_else(|| {
            Error::config(format!(
                "No {} or {} found in {}",
                Self::TOML_FILE,
                Self::JSON_FILE,
                project_root.display()
            ))
        })?;
        Self::load_file(&path)
    }

    /// Load configuration from an explicit file, choosing the format by extension.
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        log::debug!("Loading configuration from {}", path.display());
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }

    /// Serialize to pretty TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Check field-level constraints.
    ///
    /// Cross-field transport/feature checks happen at emission time.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::config("Server name must not be empty"));
        }
        if self.host.trim().is_empty() {
            return Err(Error::config("Host must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_from_minimal_toml() {
        let config = ServerConfig::from_toml_str("name = \"demo\"").unwrap();
        assert_eq!(config.name, "demo");
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.transport, Transport::StreamableHttp);
        assert!(!config.stateless_http);
        assert!(!config.health_check.enabled);
        assert_eq!(config.health_check.path, "/health");
        assert_eq!(config.health_check.response, "OK");
        assert!(!config.tracing.enabled);
        assert_eq!(config.tracing.default_exporter, ExporterKind::Console);
    }

    #[test]
    fn test_full_toml() {
        let toml = r#"
name = "payments"
description = "Payment tools"
host = "0.0.0.0"
port = 8080
transport = "sse"

[health_check]
enabled = true
path = "/healthz"
response = "alive"

[tracing]
enabled = true
default_exporter = "otlp_http"
"#;
        let config = ServerConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.description.as_deref(), Some("Payment tools"));
        assert_eq!(config.port, 8080);
        assert_eq!(config.transport, Transport::Sse);
        assert_eq!(config.health_check.path, "/healthz");
        assert_eq!(config.health_check.response, "alive");
        assert_eq!(config.tracing.default_exporter, ExporterKind::OtlpHttp);
    }

    #[test]
    fn test_json_config() {
        let json = r#"{"name": "demo", "transport": "stdio", "stateless_http": false}"#;
        let config = ServerConfig::from_json_str(json).unwrap();
        assert_eq!(config.transport, Transport::Stdio);
    }

    #[test]
    fn test_missing_name_rejected() {
        let err = ServerConfig::from_toml_str("port = 3000").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = ServerConfig::from_toml_str("name = \"  \"").unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn test_unknown_transport_rejected() {
        let err = ServerConfig::from_toml_str("name = \"x\"\ntransport = \"carrier-pigeon\"");
        assert!(err.is_err());
    }

    #[test]
    fn test_load_prefers_toml() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("golf.toml"), "name = \"from-toml\"").unwrap();
        std::fs::write(dir.path().join("golf.json"), r#"{"name": "from-json"}"#).unwrap();

        let config = ServerConfig::load(dir.path()).unwrap();
        assert_eq!(config.name, "from-toml");
    }

    #[test]
    fn test_load_falls_back_to_json() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("golf.json"), r#"{"name": "from-json"}"#).unwrap();

        let config = ServerConfig::load(dir.path()).unwrap();
        assert_eq!(config.name, "from-json");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = ServerConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = ServerConfig::new("demo")
            .with_description("A demo")
            .with_health_check("/health", "OK")
            .with_tracing(ExporterKind::Console);
        let toml = config.to_toml_string().unwrap();
        assert_eq!(ServerConfig::from_toml_str(&toml).unwrap(), config);
    }

    #[test]
    fn test_transport_properties() {
        assert!(Transport::Sse.is_http());
        assert!(!Transport::Stdio.is_http());
        assert_eq!(Transport::StreamableHttp.reserved_routes(), ["/mcp"]);
        assert_eq!(Transport::StreamableHttp.to_string(), "streamable-http");
    }

    #[test]
    fn test_exporter_from_str() {
        assert_eq!("OTLP_HTTP".parse::<ExporterKind>(), Ok(ExporterKind::OtlpHttp));
        assert_eq!("console".parse::<ExporterKind>(), Ok(ExporterKind::Console));
        assert!("jaeger".parse::<ExporterKind>().is_err());
    }
}
