//! Component registry: the intermediate representation handed to the emitter.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use golf_core::{ComponentCategory, ComponentPath, Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::parameters_schema;
use crate::shared::SharedModule;

/// Default value of an advertised parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DefaultValue {
    /// A constant, carried as JSON.
    Literal(Value),
    /// Any other expression, verbatim from the source.
    Expression(String),
}

impl DefaultValue {
    /// The JSON value, if the default is a constant.
    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            Self::Literal(value) => Some(value),
            Self::Expression(_) => None,
        }
    }
}

/// One advertised entry-point parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Inferred JSON Schema.
    pub schema: Value,
    /// Whether callers must supply it.
    pub required: bool,
    /// Default, when optional.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    /// Description from field metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Reference to the callable the runtime invokes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryPoint {
    /// Dotted module name, e.g. `tools.payments.submit`.
    pub module: String,
    /// Function name within the module.
    pub symbol: String,
    /// Project-relative source path.
    pub source: PathBuf,
    /// Declared `async def`.
    pub is_async: bool,
    /// 1-based line of the definition.
    pub line: usize,
}

/// How a resource is addressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceBinding {
    /// URI or URI template.
    pub uri: String,
    /// `{name}` placeholders, in order of appearance; empty for static URIs.
    pub template_params: Vec<String>,
}

impl ResourceBinding {
    /// Parse `{name}` placeholders out of a URI.
    pub fn parse(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        let mut template_params = Vec::new();
        let mut rest = uri.as_str();
        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else { break };
            let name = after[..close].trim_start_matches('*');
            if !name.is_empty() && !template_params.iter().any(|p| p == name) {
                template_params.push(name.to_string());
            }
            rest = &after[close + 1..];
        }
        Self {
            uri,
            template_params,
        }
    }

    /// Whether the URI has placeholders.
    pub fn is_template(&self) -> bool {
        !self.template_params.is_empty()
    }
}

/// A fully resolved component.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentDescriptor {
    /// Identifier, unique within its category.
    pub id: String,
    /// Category.
    pub category: ComponentCategory,
    /// Module docstring, trimmed; empty if absent.
    pub description: String,
    /// Advertised parameters, in declaration order.
    pub parameters: Vec<Parameter>,
    /// Structured output schema, if the entry point returns a record.
    pub output_schema: Option<Value>,
    /// Callable reference.
    pub entry_point: EntryPoint,
    /// Resource addressing, for resources only.
    pub resource: Option<ResourceBinding>,
    /// Shared module visible to the component.
    pub shared_dependency: Option<Arc<SharedModule>>,
    /// Source location.
    pub path: ComponentPath,
}

impl ComponentDescriptor {
    /// Input schema built from the parameters.
    pub fn input_schema(&self) -> Value {
        parameters_schema(&self.parameters)
    }

    /// Parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// Append-only builder; the only way to populate a [`Registry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    descriptors: Vec<ComponentDescriptor>,
    index: HashMap<(ComponentCategory, String), usize>,
}

impl RegistryBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateId`] if the category already holds the id.
    pub fn insert(&mut self, descriptor: ComponentDescriptor) -> Result<()> {
        let key = (descriptor.category, descriptor.id.clone());
        if let Some(&existing) = self.index.get(&key) {
            return Err(Error::DuplicateId {
                category: descriptor.category,
                id: descriptor.id,
                first: self.descriptors[existing].path.file().to_path_buf(),
                second: descriptor.path.file().to_path_buf(),
            });
        }
        self.index.insert(key, self.descriptors.len());
        self.descriptors.push(descriptor);
        Ok(())
    }

    /// Freeze into a read-only registry.
    pub fn build(self) -> Registry {
        Registry {
            descriptors: self.descriptors,
            index: self.index,
        }
    }
}

/// Immutable table of compiled components, in insertion order.
///
/// Ids are unique within a category only: a tool and a prompt may both be
/// `hello`, so lookups always take the category as well as the id.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    descriptors: Vec<ComponentDescriptor>,
    index: HashMap<(ComponentCategory, String), usize>,
}

impl Registry {
    /// Descriptor by category and id; the same id may exist in another category.
    pub fn get(&self, category: ComponentCategory, id: &str) -> Option<&ComponentDescriptor> {
        self.index
            .get(&(category, id.to_string()))
            .map(|&i| &self.descriptors[i])
    }

    /// Descriptors of one category, in insertion order.
    pub fn list(&self, category: ComponentCategory) -> impl Iterator<Item = &ComponentDescriptor> {
        self.descriptors.iter().filter(move |d| d.category == category)
    }

    /// All descriptors, in insertion order.
    pub fn all(&self) -> &[ComponentDescriptor] {
        &self.descriptors
    }

    /// Number of descriptors in one category.
    pub fn count(&self, category: ComponentCategory) -> usize {
        self.list(category).count()
    }

    /// Total number of descriptors.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Shared modules referenced by at least one component, each once,
    /// in first-reference order.
    pub fn shared_modules(&self) -> Vec<Arc<SharedModule>> {
        let mut modules: Vec<Arc<SharedModule>> = Vec::new();
        for module in self.descriptors.iter().filter_map(|d| d.shared_dependency.as_ref()) {
            if !modules.iter().any(|m| Arc::ptr_eq(m, module)) {
                modules.push(Arc::clone(module));
            }
        }
        modules
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn descriptor(category: ComponentCategory, rel: &str) -> ComponentDescriptor {
        let root = PathBuf::from("/project").join(category.directory());
        let path = ComponentPath::new(category, &root, root.join(rel)).unwrap();
        ComponentDescriptor {
            id: golf_core::derive_id(&path),
            category,
            description: String::new(),
            parameters: Vec::new(),
            output_schema: None,
            entry_point: EntryPoint {
                module: path.module_name(),
                symbol: "run".to_string(),
                source: path.relative_path(),
                is_async: false,
                line: 1,
            },
            resource: None,
            shared_dependency: None,
            path,
        }
    }

    #[test]
    fn test_get_list_all() {
        let mut builder = RegistryBuilder::new();
        builder.insert(descriptor(ComponentCategory::Tool, "hello.py")).unwrap();
        builder
            .insert(descriptor(ComponentCategory::Prompt, "hello.py"))
            .unwrap();
        builder
            .insert(descriptor(ComponentCategory::Tool, "payments/submit.py"))
            .unwrap();
        let registry = builder.build();

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.count(ComponentCategory::Tool), 2);
        assert!(registry.get(ComponentCategory::Tool, "submit_payments").is_some());
        assert!(registry.get(ComponentCategory::Resource, "hello").is_none());
        let ids: Vec<_> = registry
            .list(ComponentCategory::Tool)
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(ids, ["hello", "submit_payments"]);
        assert_eq!(registry.all()[1].category, ComponentCategory::Prompt);
    }

    #[test]
    fn test_same_id_in_two_categories() {
        let mut builder = RegistryBuilder::new();
        builder.insert(descriptor(ComponentCategory::Tool, "hello.py")).unwrap();
        builder
            .insert(descriptor(ComponentCategory::Prompt, "hello.py"))
            .unwrap();
        let registry = builder.build();

        let tool = registry.get(ComponentCategory::Tool, "hello").unwrap();
        let prompt = registry.get(ComponentCategory::Prompt, "hello").unwrap();
        assert_eq!(tool.category, ComponentCategory::Tool);
        assert_eq!(prompt.category, ComponentCategory::Prompt);
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let mut builder = RegistryBuilder::new();
        builder.insert(descriptor(ComponentCategory::Tool, "hello.py")).unwrap();
        let err = builder
            .insert(descriptor(ComponentCategory::Tool, "hello.py"))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateId { .. }));
    }

    #[test]
    fn test_input_schema() {
        let mut d = descriptor(ComponentCategory::Tool, "hello.py");
        d.parameters = vec![
            Parameter {
                name: "name".into(),
                schema: json!({"type": "string"}),
                required: false,
                default: Some(DefaultValue::Literal(json!("World"))),
                description: Some("Who to greet".into()),
            },
            Parameter {
                name: "when".into(),
                schema: json!({}),
                required: true,
                default: None,
                description: None,
            },
        ];
        assert_eq!(
            d.input_schema(),
            json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "default": "World", "description": "Who to greet"},
                    "when": {},
                },
                "required": ["when"],
            })
        );
    }

    #[test]
    fn test_resource_binding_parse() {
        let binding = ResourceBinding::parse("weather://{city}/forecast/{days}");
        assert_eq!(binding.template_params, ["city", "days"]);
        assert!(binding.is_template());
        assert!(!ResourceBinding::parse("info://static").is_template());
    }

    #[test]
    fn test_default_value_serde() {
        let json = serde_json::to_value(DefaultValue::Expression("datetime.now()".into())).unwrap();
        assert_eq!(json, json!({"kind": "expression", "value": "datetime.now()"}));
    }
}
