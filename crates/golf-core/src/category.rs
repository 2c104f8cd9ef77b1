//! Component categories and resolved component paths.
//!
//! A Golf project keeps each kind of component under its own root
//! directory (`tools/`, `resources/`, `prompts/`). A [`ComponentPath`]
//! records where a component file sits relative to its category root.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The closed set of component kinds a project can define.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentCategory {
    /// Callable tool, dispatched by tool invocation.
    Tool,
    /// Readable resource, dispatched by URI read or template expansion.
    Resource,
    /// Prompt generator, dispatched by prompt generation.
    Prompt,
}

impl ComponentCategory {
    /// All categories, in scan and emission order.
    pub const ALL: [ComponentCategory; 3] = [
        ComponentCategory::Tool,
        ComponentCategory::Resource,
        ComponentCategory::Prompt,
    ];

    /// Name of the category root directory under the project root.
    pub fn directory(self) -> &'static str {
        match self {
            Self::Tool => "tools",
            Self::Resource => "resources",
            Self::Prompt => "prompts",
        }
    }

    /// Singular lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tool => "tool",
            Self::Resource => "resource",
            Self::Prompt => "prompt",
        }
    }

    /// Looks up a category by its root directory name.
    pub fn from_directory(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.directory() == name)
    }
}

impl fmt::Display for ComponentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tool" | "tools" => Ok(Self::Tool),
            "resource" | "resources" => Ok(Self::Resource),
            "prompt" | "prompts" => Ok(Self::Prompt),
            other => Err(format!("unknown component category '{other}'")),
        }
    }
}

/// Location of a component source file within its category tree.
///
/// Produced once per discovered file and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentPath {
    category: ComponentCategory,
    category_root: PathBuf,
    file: PathBuf,
    stem: String,
    /// Directory names between the category root and the file, innermost first.
    ancestors: Vec<String>,
}

impl ComponentPath {
    /// Resolves `file` against `category_root`.
    ///
    /// Returns `None` if the file is not inside the root, has no stem, or
    /// any path segment is not valid UTF-8.
    ///
    /// # Examples
    ///
    /// ```
    /// use golf_core::{ComponentCategory, ComponentPath};
    ///
    /// let path = ComponentPath::new(
    ///     ComponentCategory::Tool,
    ///     "/project/tools",
    ///     "/project/tools/payments/submit.py",
    /// )
    /// .unwrap();
    /// assert_eq!(path.stem(), "submit");
    /// assert_eq!(path.ancestors(), ["payments"]);
    /// ```
    pub fn new(
        category: ComponentCategory,
        category_root: impl Into<PathBuf>,
        file: impl Into<PathBuf>,
    ) -> Option<Self> {
        let category_root = category_root.into();
        let file = file.into();

        let relative = file.strip_prefix(&category_root).ok()?;
        let stem = relative.file_stem()?.to_str()?.to_string();

        let mut ancestors = Vec::new();
        if let Some(parent) = relative.parent() {
            for component in parent.components() {
                match component {
                    Component::Normal(name) => ancestors.push(name.to_str()?.to_string()),
                    Component::CurDir => {}
                    _ => return None,
                }
            }
        }
        ancestors.reverse();

        Some(Self {
            category,
            category_root,
            file,
            stem,
            ancestors,
        })
    }

    /// Component category.
    pub fn category(&self) -> ComponentCategory {
        self.category
    }

    /// Root directory of the category tree (e.g. `<project>/tools`).
    pub fn category_root(&self) -> &Path {
        &self.category_root
    }

    /// Full path to the source file.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// File name without extension.
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Ancestor directory names between the category root and the file,
    /// nearest first.
    pub fn ancestors(&self) -> &[String] {
        &self.ancestors
    }

    /// Nesting depth below the category root (0 for top-level files).
    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }

    /// Directory containing the source file.
    pub fn directory(&self) -> &Path {
        self.file.parent().unwrap_or(&self.category_root)
    }

    /// Path relative to the project root, e.g. `tools/payments/submit.py`.
    pub fn relative_path(&self) -> PathBuf {
        let mut path = PathBuf::from(self.category.directory());
        for dir in self.ancestors.iter().rev() {
            path.push(dir);
        }
        match self.file.file_name() {
            Some(name) => path.join(name),
            None => path,
        }
    }

    /// Dotted module name, e.g. `tools.payments.submit`.
    pub fn module_name(&self) -> String {
        let mut parts = vec![self.category.directory().to_string()];
        parts.extend(self.ancestors.iter().rev().cloned());
        parts.push(self.stem.clone());
        parts.join(".")
    }
}

impl fmt::Display for ComponentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.relative_path().display())
    }
}
