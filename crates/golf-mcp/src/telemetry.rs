//! Telemetry wiring for emitted servers.
//!
//! At emit time the environment is resolved into a [`TelemetryPlan`]: which
//! exporter to use, where it sends spans, and the resource attributes that
//! identify the service. At request time every dispatch runs inside a
//! `tracing` span named after the component ([`span_name`]), and HTTP
//! requests get a span of their own ([`trace_http`]).

use std::collections::BTreeMap;

use axum::extract::{Query, Request};
use axum::middleware::Next;
use axum::response::Response;
use golf_core::{ComponentCategory, ExporterKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::field::Empty;
use tracing::{Instrument, Span};

use crate::error::InvocationError;

/// Selects the exporter, overriding the configured default.
pub const ENV_TRACES_EXPORTER: &str = "OTEL_TRACES_EXPORTER";
/// Collector endpoint; required by `otlp_http`.
pub const ENV_OTLP_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";
/// Extra exporter headers, `k=v` pairs separated by commas.
pub const ENV_OTLP_HEADERS: &str = "OTEL_EXPORTER_OTLP_HEADERS";
/// Overrides the service name.
pub const ENV_SERVICE_NAME: &str = "OTEL_SERVICE_NAME";
/// Service version resource attribute.
pub const ENV_SERVICE_VERSION: &str = "SERVICE_VERSION";
/// Service instance resource attribute.
pub const ENV_SERVICE_INSTANCE_ID: &str = "SERVICE_INSTANCE_ID";
/// Golf platform key; selects the platform collector.
pub const ENV_GOLF_API_KEY: &str = "GOLF_API_KEY";
/// Golf platform server id.
pub const ENV_GOLF_SERVER_ID: &str = "GOLF_SERVER_ID";

/// Collector used when a platform key is set and no endpoint is.
pub const GOLF_PLATFORM_ENDPOINT: &str = "http://localhost:8000/api/v1/otel";
/// Header carrying the platform key.
pub const GOLF_KEY_HEADER: &str = "X-Golf-Key";

const DEFAULT_SERVICE_VERSION: &str = "1.0.0";
const DEFAULT_SERVICE_INSTANCE_ID: &str = "default";

/// Environment snapshot consulted when resolving telemetry.
pub type EnvVars = BTreeMap<String, String>;

/// Span batching parameters handed to the exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSettings {
    /// Spans buffered before new ones are dropped.
    pub max_queue_size: usize,
    /// Delay between exports, in milliseconds.
    pub schedule_delay_ms: u64,
    /// Spans per export.
    pub max_export_batch_size: usize,
    /// Export timeout, in milliseconds.
    pub export_timeout_ms: u64,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            max_queue_size: 2048,
            schedule_delay_ms: 1000,
            max_export_batch_size: 512,
            export_timeout_ms: 5000,
        }
    }
}

/// Resolved exporter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryPlan {
    /// Exporter kind.
    pub exporter: ExporterKind,
    /// Collector endpoint, for `otlp_http`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Headers sent with every export.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// OpenTelemetry resource attributes.
    pub resource_attributes: BTreeMap<String, String>,
    /// Batching parameters.
    pub batch: BatchSettings,
    /// Whether the Golf platform collector was selected.
    #[serde(default)]
    pub platform: bool,
}

/// Outcome of resolving telemetry against an environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetryResolution {
    /// Tracing is wired with this plan.
    Enabled(TelemetryPlan),
    /// Tracing was requested but cannot be wired.
    Disabled {
        /// Why, for the build warning.
        reason: String,
    },
}

impl TelemetryPlan {
    /// Resolve the exporter for `server_name` from `env`, falling back to
    /// `default_exporter` when the environment does not choose one.
    pub fn resolve(
        server_name: &str,
        default_exporter: ExporterKind,
        env: &EnvVars,
    ) -> TelemetryResolution {
        let get = |key: &str| env.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        let api_key = get(ENV_GOLF_API_KEY);
        let platform = api_key.is_some() && get(ENV_OTLP_ENDPOINT).is_none();

        let (exporter, endpoint, headers) = match api_key {
            Some(key) if platform => {
                log::info!("Telemetry will export to the Golf platform collector");
                let headers = BTreeMap::from([(GOLF_KEY_HEADER.to_string(), key.to_string())]);
                (
                    ExporterKind::OtlpHttp,
                    Some(GOLF_PLATFORM_ENDPOINT.to_string()),
                    headers,
                )
            }
            _ => {
                let exporter = match get(ENV_TRACES_EXPORTER) {
                    Some(raw) => raw.parse().unwrap_or_else(|_| {
                        log::warn!("Unknown {ENV_TRACES_EXPORTER} '{raw}'; using console");
                        ExporterKind::Console
                    }),
                    None => default_exporter,
                };
                let headers = get(ENV_OTLP_HEADERS).map(parse_headers).unwrap_or_default();
                (exporter, get(ENV_OTLP_ENDPOINT).map(str::to_string), headers)
            }
        };

        if exporter == ExporterKind::OtlpHttp && endpoint.is_none() {
            return TelemetryResolution::Disabled {
                reason: format!(
                    "tracing is disabled: {ENV_OTLP_ENDPOINT} is not set for the {exporter} exporter"
                ),
            };
        }

        let mut resource_attributes = BTreeMap::from([
            (
                "service.name".to_string(),
                get(ENV_SERVICE_NAME).unwrap_or(server_name).to_string(),
            ),
            (
                "service.version".to_string(),
                get(ENV_SERVICE_VERSION)
                    .unwrap_or(DEFAULT_SERVICE_VERSION)
                    .to_string(),
            ),
            (
                "service.instance.id".to_string(),
                get(ENV_SERVICE_INSTANCE_ID)
                    .unwrap_or(DEFAULT_SERVICE_INSTANCE_ID)
                    .to_string(),
            ),
        ]);
        if api_key.is_some() {
            if let Some(server_id) = get(ENV_GOLF_SERVER_ID) {
                resource_attributes.insert("golf.server.id".to_string(), server_id.to_string());
            }
            resource_attributes.insert("golf.platform.enabled".to_string(), "true".to_string());
        }

        TelemetryResolution::Enabled(TelemetryPlan {
            exporter,
            endpoint: if exporter == ExporterKind::OtlpHttp {
                endpoint
            } else {
                None
            },
            headers: if exporter == ExporterKind::OtlpHttp {
                headers
            } else {
                BTreeMap::new()
            },
            resource_attributes,
            batch: BatchSettings::default(),
            platform,
        })
    }

    /// The `service.name` resource attribute.
    pub fn service_name(&self) -> &str {
        self.resource_attributes
            .get("service.name")
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// Parse `k=v,k2=v2`; entries without `=` are skipped.
pub fn parse_headers(raw: &str) -> BTreeMap<String, String> {
    raw.split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .collect()
}

// ============================================================================
// Dispatch spans
// ============================================================================

/// OpenTelemetry span name for one dispatch.
pub fn span_name(category: ComponentCategory, id: &str, is_template: bool) -> String {
    match category {
        ComponentCategory::Tool => format!("mcp.tool.{id}.execute"),
        ComponentCategory::Resource if is_template => "mcp.resource.template.read".to_string(),
        ComponentCategory::Resource => "mcp.resource.static.read".to_string(),
        ComponentCategory::Prompt => format!("mcp.prompt.{id}.generate"),
    }
}

/// What a dispatch span is opened for.
#[derive(Debug, Clone, Copy)]
pub struct DispatchTarget<'a> {
    /// Component category.
    pub category: ComponentCategory,
    /// Component id.
    pub id: &'a str,
    /// Entry-point function name.
    pub function: &'a str,
    /// Whether the entry point is `async def`.
    pub is_async: bool,
    /// Resource URI, for resources.
    pub uri: Option<&'a str>,
    /// Whether the resource URI is a template.
    pub is_template: bool,
}

/// Open the span wrapping one dispatch.
pub fn dispatch_span(target: DispatchTarget<'_>, arguments: &Map<String, Value>) -> Span {
    let name = span_name(target.category, target.id, target.is_template);
    let rendered = Value::Object(arguments.clone()).to_string();
    tracing::info_span!(
        "mcp.dispatch",
        otel.name = %name,
        otel.status_code = Empty,
        mcp.component.type = target.category.as_str(),
        mcp.component.name = %target.id,
        mcp.function = %target.function,
        mcp.resource.uri = target.uri,
        mcp.resource.is_template = target.is_template,
        mcp.execution.async = target.is_async,
        mcp.execution.kwargs_count = arguments.len(),
        mcp.arguments = %rendered,
        mcp.result.type = Empty,
        mcp.result.count = Empty,
        mcp.error = Empty,
    )
}

/// Record a dispatch outcome on `span`.
pub fn record_outcome(span: &Span, outcome: &Result<Value, InvocationError>) {
    match outcome {
        Ok(value) => {
            span.record("otel.status_code", "OK");
            span.record("mcp.result.type", value_type(value));
            match value {
                Value::Array(items) => {
                    span.record("mcp.result.count", items.len());
                }
                Value::Object(map) => {
                    span.record("mcp.result.count", map.len());
                }
                _ => {}
            }
        }
        Err(error) => {
            span.record("otel.status_code", "ERROR");
            span.record("mcp.error", error.message.as_str());
        }
    }
}

fn value_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// HTTP spans
// ============================================================================

/// Operation label for an HTTP path.
pub fn http_operation(path: &str) -> &'static str {
    if path.contains("/mcp") {
        "mcp.request"
    } else if path.contains("/sse") {
        "sse.stream"
    } else if path.contains("/auth") {
        "auth"
    } else {
        "unknown"
    }
}

#[derive(Debug, Deserialize)]
struct SessionQuery {
    session_id: Option<String>,
}

/// Session id from the `session_id` query parameter or `x-session-id` header.
///
/// The query value is percent-decoded; a malformed query falls back to the header.
fn session_id(request: &Request) -> Option<String> {
    let from_query = Query::<SessionQuery>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(query)| query.session_id);
    from_query.or_else(|| {
        request
            .headers()
            .get("x-session-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    })
}

/// axum middleware wrapping each HTTP request in a span.
pub async fn trace_http(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let span = tracing::info_span!(
        "http.request",
        otel.name = %format!("{}.{}", http_operation(&path), method.to_lowercase()),
        otel.status_code = Empty,
        http.method = %method,
        http.target = %path,
        http.status_code = Empty,
        mcp.session.id = session_id(&request).as_deref(),
    );

    tracing::debug!(parent: &span, "http.request.started");
    let response = next.run(request).instrument(span.clone()).await;

    let status = response.status();
    span.record("http.status_code", status.as_u16());
    span.record(
        "otel.status_code",
        if status.is_client_error() || status.is_server_error() {
            "ERROR"
        } else {
            "OK"
        },
    );
    response
}
