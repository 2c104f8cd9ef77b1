//! Non-fatal build diagnostics.
//!
//! Warnings are accumulated across the whole pipeline and surfaced
//! together at the end of a successful build. They never block emission.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::category::{ComponentCategory, ComponentPath};

/// Kind of non-fatal issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// One or more entry-point parameters have no type annotation.
    MissingTypeHint,
    /// The module has no documentation string.
    MissingDescription,
    /// An annotation names a type the type map cannot resolve.
    UnresolvedType,
    /// `*args` / `**kwargs` were dropped from the advertised schema.
    VariadicParameter,
    /// Tracing was requested but the chosen exporter is not configured.
    TracingDisabled,
}

impl DiagnosticKind {
    /// Display label used in build output.
    pub fn label(self) -> &'static str {
        match self {
            Self::MissingTypeHint => "MissingTypeHintWarning",
            Self::MissingDescription => "MissingDescriptionWarning",
            Self::UnresolvedType => "UnresolvedTypeWarning",
            Self::VariadicParameter => "VariadicParameterWarning",
            Self::TracingDisabled => "TracingDisabledWarning",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single warning, optionally tied to a component file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// What kind of issue this is.
    pub kind: DiagnosticKind,
    /// Category of the affected component, if any.
    pub category: Option<ComponentCategory>,
    /// Project-relative path of the affected file, if any.
    pub path: Option<PathBuf>,
    /// Human-readable detail.
    pub message: String,
}

impl Diagnostic {
    /// A warning about a specific component.
    pub fn component(kind: DiagnosticKind, path: &ComponentPath, message: impl Into<String>) -> Self {
        Self {
            kind,
            category: Some(path.category()),
            path: Some(path.relative_path()),
            message: message.into(),
        }
    }

    /// A warning that is not tied to any component.
    pub fn global(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            category: None,
            path: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "warning[{}]", self.kind)?;
        if let Some(category) = self.category {
            write!(f, " {category}")?;
        }
        if let Some(path) = &self.path {
            write!(f, " {}", path.display())?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Ordered accumulator of diagnostics.
///
/// Identical diagnostics are recorded once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic unless an identical one is already present.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        if !self.entries.contains(&diagnostic) {
            log::warn!("{diagnostic}");
            self.entries.push(diagnostic);
        }
    }

    /// Append every diagnostic from `other`, preserving order.
    pub fn extend(&mut self, other: Diagnostics) {
        for diagnostic in other.entries {
            self.push(diagnostic);
        }
    }

    /// Iterate in recording order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Diagnostics of one kind.
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.kind == kind)
    }

    /// Diagnostics attached to a project-relative path.
    pub fn for_path<'a>(&'a self, path: &'a Path) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.entries
            .iter()
            .filter(move |d| d.path.as_deref() == Some(path))
    }

    /// Number of recorded diagnostics.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume into the underlying list.
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
