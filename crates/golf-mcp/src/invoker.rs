//! The bridge to whatever actually runs entry points.
//!
//! Golf compiles component metadata; executing the Python callables is
//! left to a runtime behind [`EntryPointInvoker`]. The composed server
//! validates arguments, fills defaults, and traces each call before
//! handing it over.

use std::future::Future;
use std::pin::Pin;

use golf_compiler::EntryPoint;
use golf_core::ComponentCategory;
use serde_json::{Map, Value};

use crate::error::InvocationError;

/// Type alias for async invocation results.
pub type InvokeFuture = Pin<Box<dyn Future<Output = Result<Value, InvocationError>> + Send>>;

/// One call to an entry point.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Category of the called component.
    pub category: ComponentCategory,
    /// Component id.
    pub id: String,
    /// Callable to run.
    pub entry_point: EntryPoint,
    /// Validated keyword arguments, defaults filled in.
    pub arguments: Map<String, Value>,
}

/// Runs entry points on behalf of a composed server.
///
/// Implementations must be safe to call concurrently; requests in flight
/// may invoke the same entry point at once.
///
/// Any `Fn(Invocation) -> InvokeFuture` closure is an invoker:
///
/// ```rust,ignore
/// let echo = |call: Invocation| -> InvokeFuture {
///     Box::pin(async move { Ok(Value::Object(call.arguments)) })
/// };
/// let server = artifact.compose(Arc::new(echo))?;
/// ```
pub trait EntryPointInvoker: Send + Sync {
    /// Run the entry point and return its result.
    fn invoke(&self, invocation: Invocation) -> InvokeFuture;
}

impl<F> EntryPointInvoker for F
where
    F: Fn(Invocation) -> InvokeFuture + Send + Sync,
{
    fn invoke(&self, invocation: Invocation) -> InvokeFuture {
        self(invocation)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn invocation() -> Invocation {
        Invocation {
            category: ComponentCategory::Tool,
            id: "hello".to_string(),
            entry_point: EntryPoint {
                module: "tools.hello".to_string(),
                symbol: "hello".to_string(),
                source: PathBuf::from("tools/hello.py"),
                is_async: false,
                line: 1,
            },
            arguments: json!({"name": "Ada"}).as_object().unwrap().clone(),
        }
    }

    #[tokio::test]
    async fn test_closure_invoker() {
        let invoker = |call: Invocation| -> InvokeFuture {
            Box::pin(async move { Ok(json!(format!("{}:{}", call.entry_point.module, call.id))) })
        };
        let result = invoker.invoke(invocation()).await.unwrap();
        assert_eq!(result, json!("tools.hello:hello"));
    }

    #[tokio::test]
    async fn test_failure_passes_through() {
        let invoker = |_: Invocation| -> InvokeFuture {
            Box::pin(async { Err(InvocationError::new("boom")) })
        };
        let err = invoker.invoke(invocation()).await.unwrap_err();
        assert_eq!(err.message, "boom");
    }

    #[test]
    fn test_trait_object_safety() {
        fn _assert_object_safe(_: &dyn EntryPointInvoker) {}
    }
}
