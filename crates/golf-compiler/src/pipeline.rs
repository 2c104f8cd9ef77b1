//! The compilation pipeline: discover, extract, allocate ids, build the registry.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use golf_core::{ComponentCategory, ComponentPath, Diagnostics, IdAllocator, Result};

use crate::discovery::PathResolver;
use crate::extractor::{Extraction, MetadataExtractor};
use crate::registry::{ComponentDescriptor, Registry, RegistryBuilder, ResourceBinding};
use crate::schema::TypeMap;
use crate::shared::SharedResolver;

/// Scheme of the URI given to resources that do not declare one.
pub const DEFAULT_RESOURCE_SCHEME: &str = "resource";

/// Output of a successful compilation.
#[derive(Debug, Clone)]
pub struct Compilation {
    /// Every compiled component.
    pub registry: Registry,
    /// Warnings collected along the way.
    pub diagnostics: Diagnostics,
}

/// Compiles a project directory into a [`Registry`].
///
/// # Example
///
/// ```no_run
/// use golf_compiler::Compiler;
///
/// let compilation = Compiler::new("my-project").with_parallelism(4).compile()?;
/// println!("{} component(s)", compilation.registry.len());
/// # Ok::<(), golf_core::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Compiler {
    project_root: PathBuf,
    type_map: TypeMap,
    parallelism: usize,
}

impl Compiler {
    /// Compiler for a project root, with the builtin type map and one
    /// extraction thread per available core.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            type_map: TypeMap::default(),
            parallelism: std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
        }
    }

    /// Replace the annotation-to-schema table.
    pub fn with_type_map(mut self, type_map: TypeMap) -> Self {
        self.type_map = type_map;
        self
    }

    /// Number of extraction threads; `0` and `1` both mean sequential.
    pub fn with_parallelism(mut self, threads: usize) -> Self {
        self.parallelism = threads.max(1);
        self
    }

    /// Project root.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Run the pipeline.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error: discovery, an invalid component or
    /// shared module, or a duplicate id. Nothing is returned on failure.
    pub fn compile(&self) -> Result<Compilation> {
        log::info!("Compiling {}", self.project_root.display());

        let project = PathResolver::new(&self.project_root).discover()?;
        let resolver = SharedResolver::new();
        resolver.preload(&project.shared)?;

        let extractions = self.extract_all(&project.components, &resolver)?;

        let mut diagnostics = Diagnostics::new();
        let mut ids = IdAllocator::new();
        let mut builder = RegistryBuilder::new();
        for (path, extraction) in project.components.iter().zip(extractions) {
            let id = ids.allocate(path)?;
            diagnostics.extend(extraction.diagnostics);

            let component = extraction.component;
            let resource = match path.category() {
                ComponentCategory::Resource => Some(
                    component
                        .resource
                        .unwrap_or_else(|| ResourceBinding::parse(default_resource_uri(&id))),
                ),
                _ => None,
            };

            builder.insert(ComponentDescriptor {
                id,
                category: path.category(),
                description: component.description,
                parameters: component.parameters,
                output_schema: component.output_schema,
                entry_point: component.entry_point,
                resource,
                shared_dependency: resolver.resolve(path)?,
                path: path.clone(),
            })?;
        }

        let registry = builder.build();
        log::info!(
            "Compiled {} tool(s), {} resource(s), {} prompt(s) with {} warning(s)",
            registry.count(ComponentCategory::Tool),
            registry.count(ComponentCategory::Resource),
            registry.count(ComponentCategory::Prompt),
            diagnostics.len()
        );
        Ok(Compilation {
            registry,
            diagnostics,
        })
    }

    /// Extract every component, returning results in `paths` order.
    fn extract_all(
        &self,
        paths: &[ComponentPath],
        resolver: &SharedResolver,
    ) -> Result<Vec<Extraction>> {
        let extractor = MetadataExtractor::new(&self.type_map);
        let extract = |path: &ComponentPath| -> Result<Extraction> {
            let shared = resolver.resolve(path)?;
            extractor.extract(path, shared.as_deref())
        };

        if self.parallelism <= 1 || paths.len() <= 1 {
            return paths.iter().map(extract).collect();
        }

        let chunk_size = paths.len().div_ceil(self.parallelism);
        log::debug!(
            "Extracting {} component(s) on {} thread(s)",
            paths.len(),
            paths.len().div_ceil(chunk_size)
        );
        let chunks: Vec<Result<Vec<Extraction>>> = std::thread::scope(|scope| {
            let handles: Vec<_> = paths
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || chunk.iter().map(extract).collect::<Result<Vec<_>>>())
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        });

        let mut extractions = Vec::with_capacity(paths.len());
        for chunk in chunks {
            extractions.extend(chunk?);
        }
        Ok(extractions)
    }
}

/// URI of a resource that does not declare `resource_uri`.
pub fn default_resource_uri(id: &str) -> String {
    format!("{DEFAULT_RESOURCE_SCHEME}://{id}")
}
