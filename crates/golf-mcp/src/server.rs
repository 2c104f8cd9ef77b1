//! The composed server.
//!
//! [`ComposedServer`] wires every manifest entry to its dispatch
//! mechanism: tools through [`ComponentTools`], resources by URI or
//! template expansion, prompts by name. Transport framing is left to the
//! caller; [`ComposedServer::router`] carries the HTTP routes the server
//! owns itself.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Router;
use golf_compiler::default_resource_uri;
use golf_core::ComponentCategory;
use rmcp::model::ErrorData;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::dispatch::{prepare_arguments, Dispatcher};
use crate::error::Result;
use crate::health::health_router;
use crate::invoker::EntryPointInvoker;
use crate::manifest::{ComponentEntry, ServerManifest};
use crate::registry::ComponentTools;
use crate::telemetry::trace_http;
use crate::template::UriTemplate;

const TEXT_MIME: &str = "text/plain";
const JSON_MIME: &str = "application/json";

/// A listed resource or resource template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInfo {
    /// URI, or URI template.
    pub uri: String,
    /// Resource id.
    pub name: String,
    /// Description, possibly empty.
    pub description: String,
    /// Whether `uri` contains placeholders.
    pub is_template: bool,
}

/// The result of reading a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceContents {
    /// The concrete URI that was read.
    pub uri: String,
    /// `text/plain` for string results, `application/json` otherwise.
    pub mime_type: String,
    /// Rendered contents.
    pub text: String,
}

/// One argument a prompt accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptArgumentInfo {
    /// Argument name.
    pub name: String,
    /// Argument description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the caller must supply it.
    pub required: bool,
}

/// A listed prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptInfo {
    /// Prompt id.
    pub name: String,
    /// Description, possibly empty.
    pub description: String,
    /// Accepted arguments.
    pub arguments: Vec<PromptArgumentInfo>,
}

/// A single prompt message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    /// `user` or `assistant`.
    pub role: String,
    /// Message text.
    pub text: String,
}

/// A generated prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedPrompt {
    /// Prompt description.
    pub description: String,
    /// Generated messages.
    pub messages: Vec<PromptMessage>,
}

struct ResourceRoute {
    entry: Arc<ComponentEntry>,
    template: UriTemplate,
}

/// A runnable server assembled from a manifest and an invoker.
pub struct ComposedServer {
    manifest: ServerManifest,
    dispatcher: Arc<Dispatcher>,
    tools: ComponentTools,
    resources: Vec<ResourceRoute>,
    prompts: Vec<Arc<ComponentEntry>>,
}

impl std::fmt::Debug for ComposedServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposedServer")
            .field("name", &self.manifest.server.name)
            .field("tools", &self.manifest.tools.len())
            .field("resources", &self.resources.len())
            .field("prompts", &self.prompts.len())
            .field("traced", &self.dispatcher.is_traced())
            .finish()
    }
}

impl ComposedServer {
    /// Compose a server. Tracing is on when the manifest carries a
    /// telemetry plan.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UriTemplate`] if a resource URI does not
    /// compile.
    pub fn new(manifest: ServerManifest, invoker: Arc<dyn EntryPointInvoker>) -> Result<Self> {
        let dispatcher = Arc::new(Dispatcher::new(invoker, manifest.telemetry.is_some()));
        let tools = ComponentTools::new(&manifest.tools, Arc::clone(&dispatcher));

        let resources = manifest
            .resources
            .iter()
            .map(|entry| {
                let uri = entry
                    .uri
                    .clone()
                    .unwrap_or_else(|| default_resource_uri(&entry.id));
                Ok(ResourceRoute {
                    template: UriTemplate::parse(&uri)?,
                    entry: Arc::new(entry.clone()),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let prompts = manifest.prompts.iter().cloned().map(Arc::new).collect();

        log::debug!(
            "Composed server '{}' with {} components",
            manifest.server.name,
            manifest.component_count()
        );
        Ok(Self {
            manifest,
            dispatcher,
            tools,
            resources,
            prompts,
        })
    }

    /// The manifest this server was composed from.
    pub fn manifest(&self) -> &ServerManifest {
        &self.manifest
    }

    /// Whether dispatches run inside tracing spans.
    pub fn is_traced(&self) -> bool {
        self.dispatcher.is_traced()
    }

    /// The tool registry.
    pub fn tools(&self) -> &ComponentTools {
        &self.tools
    }

    /// Resources with a fixed URI.
    pub fn list_resources(&self) -> Vec<ResourceInfo> {
        self.resource_infos(false)
    }

    /// Resources addressed by URI template.
    pub fn list_resource_templates(&self) -> Vec<ResourceInfo> {
        self.resource_infos(true)
    }

    fn resource_infos(&self, templates: bool) -> Vec<ResourceInfo> {
        self.resources
            .iter()
            .filter(|r| r.template.is_template() == templates)
            .map(|r| ResourceInfo {
                uri: r.template.as_str().to_string(),
                name: r.entry.id.clone(),
                description: r.entry.description.clone(),
                is_template: templates,
            })
            .collect()
    }

    /// Read the resource at `uri`.
    ///
    /// Fixed URIs are matched before templates. Template placeholders are
    /// passed as arguments, converted to the parameter's declared type
    /// where possible.
    ///
    /// # Errors
    ///
    /// Returns a resource-not-found error when nothing matches, an
    /// invalid-params error when a required argument is missing, and an
    /// internal error when the entry point fails.
    pub async fn read_resource(&self, uri: &str) -> std::result::Result<ResourceContents, ErrorData> {
        let (entry, arguments) = self.match_resource(uri).ok_or_else(|| {
            ErrorData::resource_not_found(format!("no resource matches '{uri}'"), None)
        })?;

        let arguments = prepare_arguments(ComponentCategory::Resource, &entry, arguments)?;
        let value = self
            .dispatcher
            .dispatch(ComponentCategory::Resource, entry, arguments)
            .await
            .map_err(|e| ErrorData::internal_error(e.message, None))?;

        let (mime_type, text) = match value {
            Value::String(text) => (TEXT_MIME, text),
            other => (
                JSON_MIME,
                serde_json::to_string_pretty(&other)
                    .map_err(|e| ErrorData::internal_error(e.to_string(), None))?,
            ),
        };
        Ok(ResourceContents {
            uri: uri.to_string(),
            mime_type: mime_type.to_string(),
            text,
        })
    }

    fn match_resource(&self, uri: &str) -> Option<(Arc<ComponentEntry>, Value)> {
        if let Some(route) = self
            .resources
            .iter()
            .find(|r| !r.template.is_template() && r.template.as_str() == uri)
        {
            return Some((Arc::clone(&route.entry), Value::Null));
        }

        self.resources
            .iter()
            .filter(|r| r.template.is_template())
            .find_map(|r| {
                let captures = r.template.matches(uri)?;
                Some((Arc::clone(&r.entry), template_arguments(&r.entry, captures)))
            })
    }

    /// Prompts with their arguments.
    pub fn list_prompts(&self) -> Vec<PromptInfo> {
        self.prompts
            .iter()
            .map(|entry| PromptInfo {
                name: entry.id.clone(),
                description: entry.description.clone(),
                arguments: entry
                    .parameters
                    .iter()
                    .map(|p| PromptArgumentInfo {
                        name: p.name.clone(),
                        description: p.description.clone(),
                        required: p.required,
                    })
                    .collect(),
            })
            .collect()
    }

    /// Generate the prompt `name`.
    ///
    /// A string result becomes one user message. A list result becomes one
    /// message per item, where an item is a string or an object with
    /// `role` and `content`. Any other result is rendered as JSON text.
    ///
    /// # Errors
    ///
    /// Returns invalid-params for an unknown prompt or missing arguments,
    /// and an internal error when the entry point fails.
    pub async fn get_prompt(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> std::result::Result<GeneratedPrompt, ErrorData> {
        let entry = self
            .prompts
            .iter()
            .find(|p| p.id == name)
            .map(Arc::clone)
            .ok_or_else(|| ErrorData::invalid_params(format!("unknown prompt '{name}'"), None))?;

        let description = entry.description.clone();
        let arguments =
            prepare_arguments(ComponentCategory::Prompt, &entry, Value::Object(arguments))?;
        let value = self
            .dispatcher
            .dispatch(ComponentCategory::Prompt, entry, arguments)
            .await
            .map_err(|e| ErrorData::internal_error(e.message, None))?;

        Ok(GeneratedPrompt {
            description,
            messages: prompt_messages(value),
        })
    }

    /// HTTP routes owned by the server: the health route when enabled,
    /// wrapped in request spans when tracing is on.
    pub fn router(&self) -> Router {
        let mut router = Router::new();
        if let Some(health) = &self.manifest.health_check {
            router = router.merge(health_router(health));
        }
        if self.is_traced() {
            router = router.layer(axum::middleware::from_fn(trace_http));
        }
        router
    }
}

/// Convert captured placeholder text to each parameter's schema type.
/// Values that do not convert stay strings and are left to the runtime.
fn template_arguments(entry: &ComponentEntry, captures: BTreeMap<String, String>) -> Value {
    let arguments = captures
        .into_iter()
        .map(|(name, raw)| {
            let kind = entry
                .parameter(&name)
                .and_then(|p| p.schema.get("type"))
                .and_then(Value::as_str);
            let value = match kind {
                Some("integer") => raw.parse::<i64>().map(Value::from).ok(),
                Some("number") => raw.parse::<f64>().ok().map(Value::from),
                Some("boolean") => raw.parse::<bool>().map(Value::Bool).ok(),
                _ => None,
            }
            .unwrap_or(Value::String(raw));
            (name, value)
        })
        .collect();
    Value::Object(arguments)
}

fn prompt_messages(value: Value) -> Vec<PromptMessage> {
    let user = |text: String| PromptMessage {
        role: "user".into(),
        text,
    };
    match value {
        Value::String(text) => vec![user(text)],
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(text) => user(text),
                Value::Object(mut map) => {
                    let role = map
                        .remove("role")
                        .and_then(|r| r.as_str().map(str::to_string))
                        .unwrap_or_else(|| "user".into());
                    let text = match map.remove("content") {
                        Some(Value::String(text)) => text,
                        Some(other) => other.to_string(),
                        None => Value::Object(map).to_string(),
                    };
                    PromptMessage { role, text }
                }
                other => user(other.to_string()),
            })
            .collect(),
        other => vec![user(other.to_string())],
    }
}
