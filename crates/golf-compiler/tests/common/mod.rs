//! Project fixtures shared by the compiler integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// The canonical hello-world tool.
pub const HELLO_TOOL: &str = r#""""Hello World tool"""

from pydantic import BaseModel


class Output(BaseModel):
    message: str


def hello(name: str = "World", greeting: str = "Hello") -> Output:
    return Output(message=f"{greeting}, {name}!")


export = hello
"#;

/// A payments client shared by everything under `tools/payments/`.
pub const PAYMENTS_COMMON: &str = r#""""Payments helpers."""

from pydantic import BaseModel


class PaymentResult(BaseModel):
    payment_id: str
    status: str
    amount: float


class PaymentClient:
    def __init__(self, api_key: str):
        self.api_key = api_key


client = PaymentClient("sk-test")
"#;

/// A tool returning a record declared in the shared module.
pub const PAYMENTS_SUBMIT: &str = r#""""Submit a payment."""

from typing import Annotated

from pydantic import Field

from .common import PaymentResult, client


async def submit(
    amount: Annotated[float, Field(description="Amount in dollars")],
    currency: str = "USD",
) -> PaymentResult:
    return PaymentResult(payment_id="p_1", status="ok", amount=amount)


export = submit
"#;

/// A temporary Golf project.
pub struct Project {
    dir: TempDir,
}

impl Project {
    /// Empty project.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// Write a file relative to the project root.
    pub fn write(&self, rel: &str, source: &str) -> &Self {
        let path = self.dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, source).unwrap();
        self
    }

    /// Create an empty directory relative to the project root.
    pub fn mkdir(&self, rel: &str) -> &Self {
        fs::create_dir_all(self.dir.path().join(rel)).unwrap();
        self
    }

    /// Project root.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of a project file.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}
