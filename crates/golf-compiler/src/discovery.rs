//! Path resolution: find component and shared-code files in a project.

use std::path::{Component, Path, PathBuf};

use golf_core::{ComponentCategory, ComponentPath, Error, Result};

use crate::extractor::is_component_file;
use crate::shared::SHARED_MODULE_FILE;

/// Files found under a project's category roots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredProject {
    /// Component files: categories in scan order, paths sorted within each.
    pub components: Vec<ComponentPath>,
    /// `common.py` files, in the same order.
    pub shared: Vec<ComponentPath>,
}

impl DiscoveredProject {
    /// Number of components in one category.
    pub fn count(&self, category: ComponentCategory) -> usize {
        self.components
            .iter()
            .filter(|p| p.category() == category)
            .count()
    }

    /// Whether no component files were found.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Walks `tools/`, `resources/` and `prompts/` under a project root.
#[derive(Debug, Clone)]
pub struct PathResolver {
    project_root: PathBuf,
}

impl PathResolver {
    /// Resolver for a project root.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
        }
    }

    /// Project root directory.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Root directory of one category.
    pub fn category_root(&self, category: ComponentCategory) -> PathBuf {
        self.project_root.join(category.directory())
    }

    /// Discover every component and shared-code file.
    ///
    /// A missing category root is an empty category.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Discovery`] if the project root is not a directory,
    /// a category root exists but is not a directory, or a path is not
    /// valid UTF-8; [`Error::Io`] if a directory cannot be read.
    pub fn discover(&self) -> Result<DiscoveredProject> {
        if !self.project_root.is_dir() {
            return Err(Error::discovery(
                &self.project_root,
                "project root is not a directory",
            ));
        }

        let mut project = DiscoveredProject::default();
        for category in ComponentCategory::ALL {
            let root = self.category_root(category);
            if !root.exists() {
                log::debug!("No {} directory; skipping {category}s", category.directory());
                continue;
            }
            if !root.is_dir() {
                return Err(Error::discovery(&root, "category root is not a directory"));
            }

            let (mut components, mut shared) = scan_category(category, &root)?;
            components.sort_by(|a, b| a.file().cmp(b.file()));
            shared.sort_by(|a, b| a.file().cmp(b.file()));
            log::debug!(
                "Found {} {category} file(s) and {} shared module(s) under {}",
                components.len(),
                shared.len(),
                root.display()
            );
            project.components.extend(components);
            project.shared.extend(shared);
        }

        log::info!(
            "Discovered {} component(s) in {}",
            project.components.len(),
            self.project_root.display()
        );
        Ok(project)
    }
}

fn scan_category(
    category: ComponentCategory,
    root: &Path,
) -> Result<(Vec<ComponentPath>, Vec<ComponentPath>)> {
    let root_str = root
        .to_str()
        .ok_or_else(|| Error::discovery(root, "path is not valid UTF-8"))?;
    let pattern = format!("{}/**/*.py", glob::Pattern::escape(root_str));
    let entries = glob::glob(&pattern)
        .map_err(|e| Error::discovery(root, format!("invalid search pattern: {e}")))?;

    let mut components = Vec::new();
    let mut shared = Vec::new();
    for entry in entries {
        let file = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            let source: std::io::Error = e.into();
            Error::io_with_path(source, path)
        })?;
        if !file.is_file() || is_hidden(root, &file) {
            continue;
        }

        let is_shared = file.file_name().is_some_and(|n| n == SHARED_MODULE_FILE);
        if !is_shared && !is_component_file(&file) {
            continue;
        }
        let path = ComponentPath::new(category, root, &file)
            .ok_or_else(|| Error::discovery(&file, "path is not valid UTF-8"))?;

        if is_shared {
            shared.push(path);
        } else {
            components.push(path);
        }
    }
    Ok((components, shared))
}

/// Whether any directory between `root` and `file` is hidden or a bytecode cache.
fn is_hidden(root: &Path, file: &Path) -> bool {
    let Ok(relative) = file.strip_prefix(root) else {
        return true;
    };
    relative
        .parent()
        .into_iter()
        .flat_map(Path::components)
        .any(|c| match c {
            Component::Normal(name) => {
                let name = name.to_string_lossy();
                name.starts_with('.') || name == "__pycache__"
            }
            _ => false,
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn relative(paths: &[ComponentPath]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.relative_path().display().to_string())
            .collect()
    }

    #[test]
    fn test_discover_categories_in_order() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "prompts/welcome.py");
        touch(dir.path(), "tools/zeta.py");
        touch(dir.path(), "tools/payments/submit.py");
        touch(dir.path(), "tools/alpha.py");
        touch(dir.path(), "resources/info.py");

        let project = PathResolver::new(dir.path()).discover().unwrap();
        assert_eq!(
            relative(&project.components),
            [
                "tools/alpha.py",
                "tools/payments/submit.py",
                "tools/zeta.py",
                "resources/info.py",
                "prompts/welcome.py",
            ]
        );
        assert_eq!(project.count(ComponentCategory::Tool), 3);
    }

    #[test]
    fn test_shared_and_private_files_are_not_components() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "tools/payments/common.py");
        touch(dir.path(), "tools/payments/submit.py");
        touch(dir.path(), "tools/__init__.py");
        touch(dir.path(), "tools/_helpers.py");
        touch(dir.path(), "tools/README.md");
        touch(dir.path(), "tools/__pycache__/submit.py");
        touch(dir.path(), "tools/.venv/lib/site.py");

        let project = PathResolver::new(dir.path()).discover().unwrap();
        assert_eq!(relative(&project.components), ["tools/payments/submit.py"]);
        assert_eq!(relative(&project.shared), ["tools/payments/common.py"]);
    }

    #[test]
    fn test_missing_categories_are_empty() {
        let dir = TempDir::new().unwrap();
        let project = PathResolver::new(dir.path()).discover().unwrap();
        assert!(project.is_empty());
    }

    #[test]
    fn test_empty_category_directory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("prompts")).unwrap();
        let project = PathResolver::new(dir.path()).discover().unwrap();
        assert_eq!(project.count(ComponentCategory::Prompt), 0);
    }

    #[test]
    fn test_category_root_that_is_a_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("tools"), "not a directory").unwrap();
        let err = PathResolver::new(dir.path()).discover().unwrap_err();
        assert!(matches!(err, Error::Discovery { .. }));
        assert_eq!(err.path(), Some(dir.path().join("tools").as_path()));
    }

    #[test]
    fn test_missing_project_root() {
        let dir = TempDir::new().unwrap();
        let err = PathResolver::new(dir.path().join("nope")).discover().unwrap_err();
        assert!(err.to_string().contains("project root is not a directory"));
    }

    #[test]
    fn test_deeply_nested() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "tools/a/b/c/d/e/leaf.py");
        let project = PathResolver::new(dir.path()).discover().unwrap();
        assert_eq!(project.components[0].depth(), 5);
    }
}
