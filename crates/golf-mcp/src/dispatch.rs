//! Argument preparation and traced dispatch shared by every category.

use std::future::Future;
use std::sync::Arc;

use golf_compiler::DefaultValue;
use golf_core::ComponentCategory;
use rmcp::model::ErrorData;
use serde_json::{Map, Value};
use tracing::{Instrument, Span};

use crate::error::InvocationError;
use crate::invoker::{EntryPointInvoker, Invocation};
use crate::manifest::ComponentEntry;
use crate::telemetry::{dispatch_span, record_outcome, DispatchTarget};

/// Check required arguments and fill literal defaults.
///
/// `null` counts as no arguments. Defaults that are not constants are left
/// for the runtime to evaluate.
///
/// # Errors
///
/// Returns an invalid-params error if `arguments` is not an object or a
/// required parameter is missing.
pub fn prepare_arguments(
    category: ComponentCategory,
    entry: &ComponentEntry,
    arguments: Value,
) -> Result<Map<String, Value>, ErrorData> {
    let mut arguments = match arguments {
        Value::Null => Map::new(),
        Value::Object(map) => map,
        other => {
            return Err(ErrorData::invalid_params(
                format!(
                    "arguments for {category} '{}' must be an object, got {other}",
                    entry.id
                ),
                None,
            ));
        }
    };

    let mut missing = Vec::new();
    for param in &entry.parameters {
        if arguments.contains_key(&param.name) {
            continue;
        }
        match &param.default {
            Some(DefaultValue::Literal(value)) => {
                arguments.insert(param.name.clone(), value.clone());
            }
            Some(DefaultValue::Expression(_)) => {}
            None if param.required => missing.push(param.name.as_str()),
            None => {}
        }
    }

    if !missing.is_empty() {
        return Err(ErrorData::invalid_params(
            format!(
                "missing required argument(s) for {category} '{}': {}",
                entry.id,
                missing.join(", ")
            ),
            None,
        ));
    }
    Ok(arguments)
}

/// Hands validated calls to the invoker, inside a span when tracing is on.
pub(crate) struct Dispatcher {
    invoker: Arc<dyn EntryPointInvoker>,
    traced: bool,
}

impl Dispatcher {
    pub(crate) fn new(invoker: Arc<dyn EntryPointInvoker>, traced: bool) -> Self {
        Self { invoker, traced }
    }

    pub(crate) fn is_traced(&self) -> bool {
        self.traced
    }

    /// Invoke `entry`. The result or failure is returned unchanged.
    pub(crate) fn dispatch(
        &self,
        category: ComponentCategory,
        entry: Arc<ComponentEntry>,
        arguments: Map<String, Value>,
    ) -> impl Future<Output = Result<Value, InvocationError>> + Send + 'static {
        let span = if self.traced {
            dispatch_span(
                DispatchTarget {
                    category,
                    id: &entry.id,
                    function: &entry.entry_point.symbol,
                    is_async: entry.entry_point.is_async,
                    uri: entry.uri.as_deref(),
                    is_template: entry.uri.as_deref().is_some_and(|u| u.contains('{')),
                },
                &arguments,
            )
        } else {
            Span::none()
        };

        let invoker = Arc::clone(&self.invoker);
        async move {
            tracing::debug!("{category} '{}' started", entry.id);
            let outcome = invoker
                .invoke(Invocation {
                    category,
                    id: entry.id.clone(),
                    entry_point: entry.entry_point.clone(),
                    arguments,
                })
                .await;
            record_outcome(&Span::current(), &outcome);
            match &outcome {
                Ok(_) => tracing::debug!("{category} '{}' completed", entry.id),
                Err(e) => tracing::debug!("{category} '{}' failed: {e}", entry.id),
            }
            outcome
        }
        .instrument(span)
    }
}
