//! Fixtures shared by the server integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Arc;

use golf_compiler::Compiler;
use golf_core::ServerConfig;
use golf_mcp::{
    EntryPointInvoker, Emitter, Invocation, InvocationError, InvokeFuture, ServerArtifact,
};
use serde_json::{json, Value};
use tempfile::TempDir;

pub const HELLO_TOOL: &str = r#""""Hello World tool"""

from pydantic import BaseModel


class Output(BaseModel):
    message: str


def hello(name: str = "World", greeting: str = "Hello") -> Output:
    return Output(message=f"{greeting}, {name}!")


export = hello
"#;

pub const FORECAST_RESOURCE: &str = r#""""Weather forecast for a city."""

resource_uri = "weather://{city}/forecast"


def forecast(city: str) -> dict:
    return {"city": city}


export = forecast
"#;

pub const GREET_PROMPT: &str = r#""""Greeting conversation."""


def greet(name: str) -> list:
    return [f"Hello {name}"]


export = greet
"#;

/// Write `files` under a fresh temp directory.
pub fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (rel, src) in files {
        let path = dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, src).unwrap();
    }
    dir
}

/// Compile and emit `root` with an empty environment.
pub fn build(root: &Path, config: ServerConfig) -> ServerArtifact {
    let compilation = Compiler::new(root).compile().unwrap();
    Emitter::new(config)
        .with_env(Vec::<(String, String)>::new())
        .emit(&compilation.registry)
        .unwrap()
}

/// A runtime standing in for the Python side.
///
/// `hello` formats a greeting, `forecast` echoes its arguments, `greet`
/// returns a message list, and anything else fails.
pub fn fake_runtime() -> Arc<dyn EntryPointInvoker> {
    Arc::new(|call: Invocation| -> InvokeFuture {
        Box::pin(async move {
            let arg = |name: &str| call.arguments.get(name).and_then(Value::as_str).unwrap_or("").to_string();
            match call.id.as_str() {
                "hello" => Ok(json!({"message": format!("{}, {}!", arg("greeting"), arg("name"))})),
                "forecast" => Ok(Value::Object(call.arguments.clone())),
                "greet" => Ok(json!([format!("Hello {}", arg("name"))])),
                other => Err(InvocationError::new(format!("{other} is not available"))),
            }
        })
    })
}
