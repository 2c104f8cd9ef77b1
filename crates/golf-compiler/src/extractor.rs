//! Metadata extraction for a single component file.
//!
//! The component is parsed, never executed: its entry point is the
//! function bound to `export`, its description is the module docstring,
//! and its parameter and output schemas come from annotations.

use std::path::Path;

use golf_core::{ComponentCategory, ComponentPath, Diagnostic, DiagnosticKind, Diagnostics, Error, Result};
use serde_json::Value;

use crate::python::{literal_value, parse_module, Expr, FunctionDef, ModuleOutline, ParamKind};
use crate::registry::{DefaultValue, EntryPoint, Parameter, ResourceBinding};
use crate::schema::{any_schema, field_meta, FieldDefault, RecordScope, SchemaInference, TypeMap};
use crate::shared::SharedModule;

/// Reserved name whose binding selects the entry point.
pub const EXPORT_NAME: &str = "export";

/// Optional module-level binding that sets a resource's URI.
pub const RESOURCE_URI_NAME: &str = "resource_uri";

/// Annotation names injected by the runtime rather than supplied by callers.
const CONTEXT_TYPES: &[&str] = &["Context"];

/// Everything extracted from one component source.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedComponent {
    /// Trimmed module docstring; empty if absent.
    pub description: String,
    /// Advertised parameters.
    pub parameters: Vec<Parameter>,
    /// Structured output schema.
    pub output_schema: Option<Value>,
    /// Entry-point reference.
    pub entry_point: EntryPoint,
    /// Explicit `resource_uri`, for resources that declare one.
    pub resource: Option<ResourceBinding>,
}

/// Result of extracting one file: the component plus its warnings.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Extracted metadata.
    pub component: ExtractedComponent,
    /// Non-fatal issues found in this file.
    pub diagnostics: Diagnostics,
}

/// Extracts [`ExtractedComponent`]s using a type map.
#[derive(Debug, Clone, Copy)]
pub struct MetadataExtractor<'a> {
    type_map: &'a TypeMap,
}

impl<'a> MetadataExtractor<'a> {
    /// Create an extractor over `type_map`.
    pub fn new(type_map: &'a TypeMap) -> Self {
        Self { type_map }
    }

    /// Read and extract a component file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidComponent`] naming the file if it cannot be
    /// read or is not UTF-8, otherwise as
    /// [`extract_source`](Self::extract_source).
    pub fn extract(&self, path: &ComponentPath, shared: Option<&SharedModule>) -> Result<Extraction> {
        let invalid = |message: String| Error::invalid_component(path.category(), path.file(), message);
        let bytes = std::fs::read(path.file())
            .map_err(|e| invalid(format!("failed to read component: {e}")))?;
        let source = String::from_utf8(bytes)
            .map_err(|e| invalid(format!("source is not valid UTF-8: {}", e.utf8_error())))?;
        self.extract_source(path, &source, shared)
    }

    /// Extract a component from its source text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidComponent`] if the source does not parse, has
    /// no usable `export` binding, or declares a resource URI template
    /// with placeholders that are not parameters.
    pub fn extract_source(
        &self,
        path: &ComponentPath,
        source: &str,
        shared: Option<&SharedModule>,
    ) -> Result<Extraction> {
        let invalid = |message: String| Error::invalid_component(path.category(), path.file(), message);

        let outline = parse_module(source).map_err(|e| invalid(format!("syntax error at {e}")))?;
        let function = entry_point(&outline).map_err(invalid)?;
        let mut diagnostics = Diagnostics::new();

        let description = outline
            .docstring
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        if description.is_empty() {
            diagnostics.push(Diagnostic::component(
                DiagnosticKind::MissingDescription,
                path,
                "module has no docstring; description is empty",
            ));
        }

        let scope = RecordScope::new(&outline, shared.map(|s| &s.outline));
        let mut inference = SchemaInference::new(self.type_map, &scope);

        let mut parameters = Vec::new();
        let mut untyped = Vec::new();
        let mut variadic = Vec::new();
        for param in &function.params {
            if param.kind.is_variadic() {
                let stars = if param.kind == ParamKind::VarKeyword { "**" } else { "*" };
                variadic.push(format!("{stars}{}", param.name));
                continue;
            }
            if param.annotation.as_ref().is_some_and(is_context) {
                continue;
            }

            let schema = match &param.annotation {
                Some(annotation) => inference.infer(annotation),
                None => {
                    untyped.push(param.name.clone());
                    any_schema()
                }
            };

            let meta = field_meta(param.annotation.as_ref(), param.default.as_ref());
            let default = match meta.default {
                FieldDefault::Required => None,
                FieldDefault::Factory => Some(DefaultValue::Expression(factory_text(param.default.as_ref()))),
                FieldDefault::Value(expr) => Some(match literal_value(expr) {
                    Some(value) => DefaultValue::Literal(value),
                    None if param.default.as_ref().is_some_and(|d| std::ptr::eq(d, expr)) => {
                        DefaultValue::Expression(param.default_text.clone().unwrap_or_else(|| expr.render()))
                    }
                    None => DefaultValue::Expression(expr.render()),
                }),
            };

            parameters.push(Parameter {
                name: param.name.clone(),
                schema,
                required: default.is_none(),
                default,
                description: meta.description,
            });
        }

        let output_schema = function
            .returns
            .as_ref()
            .and_then(|returns| inference.output_schema(returns));

        if !untyped.is_empty() {
            diagnostics.push(Diagnostic::component(
                DiagnosticKind::MissingTypeHint,
                path,
                format!(
                    "`{}` parameters without type hints are advertised as any-type: {}",
                    function.name,
                    untyped.join(", ")
                ),
            ));
        }
        if !variadic.is_empty() {
            diagnostics.push(Diagnostic::component(
                DiagnosticKind::VariadicParameter,
                path,
                format!("variadic parameters are not advertised: {}", variadic.join(", ")),
            ));
        }
        for name in inference.unresolved() {
            diagnostics.push(Diagnostic::component(
                DiagnosticKind::UnresolvedType,
                path,
                format!("cannot resolve type `{name}`; treating it as any-type"),
            ));
        }

        let resource = match path.category() {
            ComponentCategory::Resource => resource_binding(&outline, &parameters).map_err(invalid)?,
            _ => None,
        };

        Ok(Extraction {
            component: ExtractedComponent {
                description,
                parameters,
                output_schema,
                entry_point: EntryPoint {
                    module: path.module_name(),
                    symbol: function.name.clone(),
                    source: path.relative_path(),
                    is_async: function.is_async,
                    line: function.line,
                },
                resource,
            },
            diagnostics,
        })
    }
}

/// The function selected by `export`.
fn entry_point(outline: &ModuleOutline) -> std::result::Result<&FunctionDef, String> {
    let mut target: Option<&str> = None;
    for binding in outline.assignments_to(EXPORT_NAME) {
        let name = match &binding.value {
            Expr::Name(name) if !name.contains('.') => name.as_str(),
            other => {
                return Err(format!(
                    "`{EXPORT_NAME}` on line {} must name a function defined in this module, found `{}`",
                    binding.line,
                    other.render()
                ));
            }
        };
        match target {
            Some(existing) if existing != name => {
                return Err(format!(
                    "conflicting `{EXPORT_NAME}` bindings: `{existing}` and `{name}`"
                ));
            }
            _ => target = Some(name),
        }
    }

    let name = target.ok_or_else(|| format!("no `{EXPORT_NAME}` binding found"))?;
    outline.function(name).ok_or_else(|| {
        format!("`{EXPORT_NAME}` refers to `{name}`, which is not a function defined in this module")
    })
}

fn is_context(annotation: &Expr) -> bool {
    let name = match annotation {
        Expr::Subscript { value, .. } => value.base_name(),
        Expr::Str(text) => Some(text.rsplit('.').next().unwrap_or(text)),
        other => other.base_name(),
    };
    name.is_some_and(|n| CONTEXT_TYPES.contains(&n))
}

fn factory_text(default: Option<&Expr>) -> String {
    match default.and_then(|d| d.kwarg("default_factory")) {
        Some(factory) => format!("{}()", factory.render()),
        None => String::new(),
    }
}

fn resource_binding(
    outline: &ModuleOutline,
    parameters: &[Parameter],
) -> std::result::Result<Option<ResourceBinding>, String> {
    let Some(assignment) = outline.assignments_to(RESOURCE_URI_NAME).last() else {
        return Ok(None);
    };
    let Expr::Str(uri) = &assignment.value else {
        return Err(format!(
            "`{RESOURCE_URI_NAME}` on line {} must be a string literal",
            assignment.line
        ));
    };
    if uri.trim().is_empty() {
        return Err(format!("`{RESOURCE_URI_NAME}` must not be empty"));
    }

    let binding = ResourceBinding::parse(uri.clone());
    let unknown: Vec<&str> = binding
        .template_params
        .iter()
        .filter(|p| !parameters.iter().any(|param| &param.name == *p))
        .map(String::as_str)
        .collect();
    if !unknown.is_empty() {
        return Err(format!(
            "URI template `{uri}` uses placeholders that are not entry-point parameters: {}",
            unknown.join(", ")
        ));
    }
    Ok(Some(binding))
}

/// Whether a file name denotes a component source (not shared code, not private).
pub fn is_component_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".py") && !name.starts_with('_') && !name.starts_with('.') && name != crate::shared::SHARED_MODULE_FILE
}
