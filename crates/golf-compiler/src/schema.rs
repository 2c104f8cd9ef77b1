//! Annotation-to-schema inference.
//!
//! Source annotations are mapped to JSON Schema through an explicit
//! [`TypeMap`]. Inference is total: anything the map cannot resolve
//! becomes the any-type schema (`{}`) and is reported through
//! [`SchemaInference::unresolved`].

use std::collections::HashMap;

use serde_json::{json, Map, Value};

use crate::python::outline::base_of;
use crate::python::{literal_value, parse_expression, ClassDef, ClassField, Expr, ModuleOutline};
use crate::registry::Parameter;

/// Record nesting depth past which fields fall back to the any-type.
pub const MAX_RECORD_DEPTH: usize = 5;

const ENUM_BASES: &[&str] = &["Enum", "StrEnum", "IntEnum", "Flag", "IntFlag"];
const MODEL_BASES: &[&str] = &["BaseModel"];
const TYPED_DICT_BASES: &[&str] = &["TypedDict"];

/// Schema primitive an annotation maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// `"type": "string"`.
    String,
    /// `"type": "integer"`.
    Integer,
    /// `"type": "number"`.
    Number,
    /// `"type": "boolean"`.
    Boolean,
    /// `"type": "null"`.
    Null,
    /// `"type": "array"`, with `items` when parameterized.
    Array,
    /// `"type": "object"`, with `additionalProperties` when parameterized.
    Object,
    /// Unconstrained.
    Any,
}

impl Primitive {
    fn type_name(self) -> Option<&'static str> {
        match self {
            Self::String => Some("string"),
            Self::Integer => Some("integer"),
            Self::Number => Some("number"),
            Self::Boolean => Some("boolean"),
            Self::Null => Some("null"),
            Self::Array => Some("array"),
            Self::Object => Some("object"),
            Self::Any => None,
        }
    }
}

/// Target of one type-map entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMapping {
    /// Schema primitive.
    pub primitive: Primitive,
    /// Optional `format` keyword.
    pub format: Option<String>,
}

impl TypeMapping {
    /// Mapping to a bare primitive.
    pub fn new(primitive: Primitive) -> Self {
        Self {
            primitive,
            format: None,
        }
    }

    /// Attach a `format`.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Unparameterized schema for this mapping.
    pub fn to_schema(&self) -> Value {
        let mut schema = Map::new();
        if let Some(name) = self.primitive.type_name() {
            schema.insert("type".into(), json!(name));
        }
        if let Some(format) = &self.format {
            schema.insert("format".into(), json!(format));
        }
        Value::Object(schema)
    }
}

/// Pluggable table from annotation names to schema primitives.
///
/// Lookups try the full dotted name first, then its last segment, so
/// `typing.List` and `List` resolve alike.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMap {
    entries: HashMap<String, TypeMapping>,
}

impl Default for TypeMap {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TypeMap {
    /// A map with no entries.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// The standard Python mappings.
    pub fn builtin() -> Self {
        let string = TypeMapping::new(Primitive::String);
        let mut map = Self::empty();
        for name in ["str", "bytearray", "Path", "PurePath"] {
            map.insert(name, string.clone());
        }
        map.insert("bytes", string.clone().with_format("binary"));
        map.insert("int", TypeMapping::new(Primitive::Integer));
        for name in ["float", "Decimal"] {
            map.insert(name, TypeMapping::new(Primitive::Number));
        }
        map.insert("bool", TypeMapping::new(Primitive::Boolean));
        for name in ["None", "NoneType"] {
            map.insert(name, TypeMapping::new(Primitive::Null));
        }
        for name in [
            "list", "List", "Sequence", "MutableSequence", "Iterable", "Collection", "set", "Set",
            "MutableSet", "AbstractSet", "frozenset", "FrozenSet", "tuple", "Tuple",
        ] {
            map.insert(name, TypeMapping::new(Primitive::Array));
        }
        for name in ["dict", "Dict", "Mapping", "MutableMapping"] {
            map.insert(name, TypeMapping::new(Primitive::Object));
        }
        map.insert("datetime", string.clone().with_format("date-time"));
        map.insert("date", string.clone().with_format("date"));
        map.insert("time", string.clone().with_format("time"));
        map.insert("timedelta", string.clone().with_format("duration"));
        map.insert("UUID", string.clone().with_format("uuid"));
        map.insert("EmailStr", string.clone().with_format("email"));
        for name in ["AnyUrl", "HttpUrl"] {
            map.insert(name, string.clone().with_format("uri"));
        }
        for name in ["Any", "object"] {
            map.insert(name, TypeMapping::new(Primitive::Any));
        }
        map
    }

    fn insert(&mut self, name: &str, mapping: TypeMapping) {
        self.entries.insert(name.to_string(), mapping);
    }

    /// Add or replace an entry.
    pub fn with_mapping(mut self, name: impl Into<String>, mapping: TypeMapping) -> Self {
        self.entries.insert(name.into(), mapping);
        self
    }

    /// Resolve a (possibly dotted) annotation name.
    pub fn lookup(&self, name: &str) -> Option<&TypeMapping> {
        self.entries.get(name).or_else(|| {
            let last = name.rsplit('.').next()?;
            self.entries.get(last)
        })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Classes visible to a component during inference.
pub trait RecordLookup {
    /// Class definition for a name, searching every visible module.
    fn class(&self, name: &str) -> Option<&ClassDef>;

    /// Original dotted name behind an import alias.
    fn resolve_alias(&self, _local: &str) -> Option<String> {
        None
    }
}

impl RecordLookup for ModuleOutline {
    fn class(&self, name: &str) -> Option<&ClassDef> {
        ModuleOutline::class(self, name)
    }

    fn resolve_alias(&self, local: &str) -> Option<String> {
        ModuleOutline::resolve_alias(self, local)
    }
}

/// The component module followed by its visible shared module.
#[derive(Debug, Clone, Copy)]
pub struct RecordScope<'a> {
    local: &'a ModuleOutline,
    shared: Option<&'a ModuleOutline>,
}

impl<'a> RecordScope<'a> {
    /// Scope over a component and, optionally, its shared module.
    pub fn new(local: &'a ModuleOutline, shared: Option<&'a ModuleOutline>) -> Self {
        Self { local, shared }
    }
}

impl RecordLookup for RecordScope<'_> {
    fn class(&self, name: &str) -> Option<&ClassDef> {
        self.local
            .class(name)
            .or_else(|| self.shared.and_then(|shared| shared.class(name)))
    }

    fn resolve_alias(&self, local: &str) -> Option<String> {
        self.local.resolve_alias(local)
    }
}

/// How a class participates in schema inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// Pydantic `BaseModel` subclass.
    Model,
    /// `TypedDict` subclass.
    TypedDict,
    /// `@dataclass`.
    Dataclass,
    /// `Enum` subclass; maps to an `enum` schema rather than an object.
    Enum,
}

/// Classify a class, following record bases through `scope`.
pub fn record_kind(class: &ClassDef, scope: &dyn RecordLookup) -> Option<RecordKind> {
    record_kind_at(class, scope, 0)
}

fn record_kind_at(class: &ClassDef, scope: &dyn RecordLookup, depth: usize) -> Option<RecordKind> {
    if depth > MAX_RECORD_DEPTH {
        return None;
    }
    if class.has_base(ENUM_BASES) {
        return Some(RecordKind::Enum);
    }
    if class.has_base(MODEL_BASES) {
        return Some(RecordKind::Model);
    }
    if class.has_base(TYPED_DICT_BASES) {
        return Some(RecordKind::TypedDict);
    }
    if class.has_decorator("dataclass") {
        return Some(RecordKind::Dataclass);
    }
    class
        .bases
        .iter()
        .filter_map(base_of)
        .filter(|name| *name != class.name)
        .filter_map(|name| scope.class(name))
        .find_map(|parent| record_kind_at(parent, scope, depth + 1))
}

/// Default carried by a parameter or record field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDefault<'e> {
    /// No default: the value is required.
    Required,
    /// A default expression.
    Value(&'e Expr),
    /// `Field(default_factory=...)`.
    Factory,
}

/// Default and description gathered from a `Field(...)` default and
/// `Annotated[T, Field(...)]` metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMeta<'e> {
    /// Effective default.
    pub default: FieldDefault<'e>,
    /// Human-readable description.
    pub description: Option<String>,
}

impl FieldMeta<'_> {
    /// Whether a caller must supply the value.
    pub fn is_required(&self) -> bool {
        matches!(self.default, FieldDefault::Required)
    }
}

/// Collect default and description for an annotated name.
pub fn field_meta<'e>(annotation: Option<&'e Expr>, default: Option<&'e Expr>) -> FieldMeta<'e> {
    let mut description = None;

    if let Some(Expr::Subscript { value, args }) = annotation {
        if value.base_name() == Some("Annotated") {
            description = args
                .iter()
                .skip(1)
                .filter(|arg| arg.is_call_to("Field"))
                .find_map(|arg| string_kwarg(arg, "description"));
        }
    }

    let default = match default {
        None => FieldDefault::Required,
        Some(field @ Expr::Call { args, .. }) if field.is_call_to("Field") => {
            if let Some(text) = string_kwarg(field, "description") {
                description = Some(text);
            }
            if let Some(value) = field.kwarg("default") {
                FieldDefault::Value(value)
            } else if field.kwarg("default_factory").is_some() {
                FieldDefault::Factory
            } else {
                match args.first() {
                    None | Some(Expr::Ellipsis) => FieldDefault::Required,
                    Some(value) => FieldDefault::Value(value),
                }
            }
        }
        Some(value) => FieldDefault::Value(value),
    };

    FieldMeta {
        default,
        description,
    }
}

fn string_kwarg(call: &Expr, key: &str) -> Option<String> {
    match call.kwarg(key)? {
        Expr::Str(s) => Some(s.clone()),
        _ => None,
    }
}

/// Annotation inference against a type map and a record scope.
pub struct SchemaInference<'a> {
    type_map: &'a TypeMap,
    scope: &'a dyn RecordLookup,
    unresolved: Vec<String>,
}

impl<'a> SchemaInference<'a> {
    /// Create an inference context.
    pub fn new(type_map: &'a TypeMap, scope: &'a dyn RecordLookup) -> Self {
        Self {
            type_map,
            scope,
            unresolved: Vec::new(),
        }
    }

    /// Annotation names that mapped to the any-type, in first-seen order.
    pub fn unresolved(&self) -> &[String] {
        &self.unresolved
    }

    /// Schema for an annotation. Never fails.
    pub fn infer(&mut self, annotation: &Expr) -> Value {
        self.infer_at(annotation, 0)
    }

    /// Output schema for a return annotation.
    ///
    /// Only structured records produce a schema; everything else
    /// (including enums and plain types) is unstructured output.
    pub fn output_schema(&mut self, returns: &Expr) -> Option<Value> {
        match returns {
            Expr::Subscript { value, args } if value.base_name() == Some("Annotated") => {
                self.output_schema(args.first()?)
            }
            Expr::Str(text) => {
                let parsed = parse_annotation(text)?;
                self.output_schema(&parsed)
            }
            Expr::Name(name) => {
                let scope = self.scope;
                let class = scope.class(last_segment(name))?;
                match record_kind(class, scope)? {
                    RecordKind::Enum => None,
                    _ => Some(self.record_schema(class, 0)),
                }
            }
            _ => None,
        }
    }

    fn note_unresolved(&mut self, name: impl Into<String>) -> Value {
        let name = name.into();
        if !self.unresolved.contains(&name) {
            self.unresolved.push(name);
        }
        any_schema()
    }

    fn infer_at(&mut self, annotation: &Expr, depth: usize) -> Value {
        match annotation {
            Expr::NoneLit => json!({"type": "null"}),
            Expr::Name(name) => self.named(name, depth),
            Expr::Str(text) => match parse_annotation(text) {
                Some(parsed) => self.infer_at(&parsed, depth),
                None => self.note_unresolved(text.clone()),
            },
            Expr::Subscript { value, args } => self.generic(value, args, depth),
            Expr::BinOr(members) => self.any_of(members, depth),
            other => self.note_unresolved(other.render()),
        }
    }

    fn canonical(&self, name: &str) -> String {
        let (head, tail) = match name.split_once('.') {
            Some((head, tail)) => (head, Some(tail)),
            None => (name, None),
        };
        match (self.scope.resolve_alias(head), tail) {
            (Some(original), Some(tail)) => format!("{original}.{tail}"),
            (Some(original), None) => original,
            (None, _) => name.to_string(),
        }
    }

    fn named(&mut self, name: &str, depth: usize) -> Value {
        let canonical = self.canonical(name);
        let scope = self.scope;
        if let Some(class) = scope.class(last_segment(&canonical)) {
            match record_kind(class, scope) {
                Some(RecordKind::Enum) => return enum_schema(class),
                Some(_) => return self.record_schema(class, depth + 1),
                None => {}
            }
        }
        match self.type_map.lookup(&canonical) {
            Some(mapping) => mapping.to_schema(),
            None => self.note_unresolved(name),
        }
    }

    fn generic(&mut self, value: &Expr, args: &[Expr], depth: usize) -> Value {
        let Some(name) = value.as_name() else {
            return self.note_unresolved(value.render());
        };
        let canonical = self.canonical(name);
        let base = last_segment(&canonical);

        match base {
            "Optional" => {
                let mut members = args.to_vec();
                members.push(Expr::NoneLit);
                return self.any_of(&members, depth);
            }
            "Union" => return self.any_of(args, depth),
            "Literal" => return self.literal(args),
            "Annotated" | "Required" | "NotRequired" | "ReadOnly" | "Final" => {
                return match args.first() {
                    Some(inner) => self.infer_at(inner, depth),
                    None => any_schema(),
                };
            }
            _ => {}
        }

        if self.scope.class(base).is_some() {
            // Generic record such as `Page[Item]`: parameters are erased.
            return self.named(name, depth);
        }

        let Some(mapping) = self.type_map.lookup(&canonical).cloned() else {
            return self.note_unresolved(name);
        };
        let mut schema = mapping.to_schema();
        let Some(map) = schema.as_object_mut() else {
            return any_schema();
        };

        match mapping.primitive {
            Primitive::Array => {
                let homogeneous = args.len() == 2 && args[1] == Expr::Ellipsis;
                if matches!(base, "tuple" | "Tuple") && args.len() > 1 && !homogeneous {
                    let items: Vec<Value> = args.iter().map(|a| self.infer_at(a, depth)).collect();
                    map.insert("minItems".into(), json!(items.len()));
                    map.insert("maxItems".into(), json!(items.len()));
                    map.insert("prefixItems".into(), Value::Array(items));
                } else if let Some(item) = args.first() {
                    let items = self.infer_at(item, depth);
                    map.insert("items".into(), items);
                }
                if matches!(base, "set" | "Set" | "frozenset" | "FrozenSet" | "MutableSet" | "AbstractSet") {
                    map.insert("uniqueItems".into(), json!(true));
                }
            }
            Primitive::Object => {
                if let Some(value) = args.get(1) {
                    let values = self.infer_at(value, depth);
                    map.insert("additionalProperties".into(), values);
                }
            }
            _ => {}
        }
        schema
    }

    fn any_of(&mut self, members: &[Expr], depth: usize) -> Value {
        let mut options: Vec<Value> = Vec::new();
        for member in members {
            let schema = self.infer_at(member, depth);
            let nested = match &schema {
                Value::Object(map) if map.len() == 1 => map.get("anyOf").and_then(Value::as_array).cloned(),
                _ => None,
            };
            for option in nested.unwrap_or_else(|| vec![schema]) {
                if !options.contains(&option) {
                    options.push(option);
                }
            }
        }
        if options.iter().any(|o| o == &any_schema()) {
            return any_schema();
        }
        match options.len() {
            0 => any_schema(),
            1 => options.remove(0),
            _ => json!({ "anyOf": options }),
        }
    }

    fn literal(&mut self, args: &[Expr]) -> Value {
        let Some(values) = args.iter().map(literal_value).collect::<Option<Vec<_>>>() else {
            let text = args.iter().map(Expr::render).collect::<Vec<_>>().join(", ");
            return self.note_unresolved(format!("Literal[{text}]"));
        };
        with_uniform_type(json!({ "enum": values }), &values)
    }

    /// Object schema for a record class.
    pub fn record_schema(&mut self, class: &'a ClassDef, depth: usize) -> Value {
        if depth > MAX_RECORD_DEPTH {
            return any_schema();
        }
        let kind = record_kind(class, self.scope);
        if kind == Some(RecordKind::Enum) {
            return enum_schema(class);
        }

        let mut properties = Map::new();
        let mut required = Vec::new();
        for (field, total) in self.collect_fields(class, 0) {
            let meta = field_meta(Some(&field.annotation), field.default.as_ref());
            let mut schema = self.infer_at(&field.annotation, depth);

            let is_required = if kind == Some(RecordKind::TypedDict) {
                match wrapper_name(&field.annotation) {
                    Some("Required") => true,
                    Some("NotRequired") => false,
                    _ => total,
                }
            } else {
                meta.is_required()
            };

            if let Value::Object(map) = &mut schema {
                if let Some(description) = meta.description {
                    map.insert("description".into(), json!(description));
                }
                if let FieldDefault::Value(default) = meta.default {
                    if let Some(value) = literal_value(default) {
                        map.insert("default".into(), value);
                    }
                }
            }
            if is_required {
                required.push(json!(field.name));
            }
            properties.insert(field.name.clone(), schema);
        }

        let mut schema = Map::new();
        schema.insert("type".into(), json!("object"));
        schema.insert("properties".into(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".into(), Value::Array(required));
        }
        Value::Object(schema)
    }

    /// Fields in MRO-ish order: record bases first, later definitions win.
    fn collect_fields(&self, class: &'a ClassDef, depth: usize) -> Vec<(&'a ClassField, bool)> {
        let scope = self.scope;
        let mut fields: Vec<(&'a ClassField, bool)> = Vec::new();
        if depth <= MAX_RECORD_DEPTH {
            for base in class.bases.iter().filter_map(base_of) {
                if base == class.name {
                    continue;
                }
                let Some(parent) = scope.class(base) else {
                    continue;
                };
                if record_kind(parent, scope).is_some() {
                    for inherited in self.collect_fields(parent, depth + 1) {
                        fields.retain(|(f, _)| f.name != inherited.0.name);
                        fields.push(inherited);
                    }
                }
            }
        }

        let total = !matches!(
            class.keywords.iter().find(|(k, _)| k == "total"),
            Some((_, Expr::Bool(false)))
        );
        for field in &class.fields {
            fields.retain(|(f, _)| f.name != field.name);
            fields.push((field, total));
        }
        fields
    }
}

/// The any-type schema.
pub fn any_schema() -> Value {
    json!({})
}

fn last_segment(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

fn wrapper_name(annotation: &Expr) -> Option<&str> {
    match annotation {
        Expr::Subscript { value, .. } => value.base_name(),
        _ => None,
    }
}

fn parse_annotation(text: &str) -> Option<Expr> {
    match parse_expression(text)? {
        Expr::Other(_) => None,
        expr => Some(expr),
    }
}

fn enum_schema(class: &ClassDef) -> Value {
    let values: Vec<Value> = class
        .constants
        .iter()
        .filter_map(|(_, value)| literal_value(value))
        .collect();
    if values.is_empty() {
        return any_schema();
    }
    with_uniform_type(json!({ "enum": values }), &values)
}

fn with_uniform_type(mut schema: Value, values: &[Value]) -> Value {
    let kind = |v: &Value| match v {
        Value::String(_) => Some("string"),
        Value::Bool(_) => Some("boolean"),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some("integer"),
        Value::Number(_) => Some("number"),
        Value::Null => Some("null"),
        _ => None,
    };
    let first = values.first().and_then(kind);
    if first.is_some() && values.iter().all(|v| kind(v) == first) {
        if let (Value::Object(map), Some(name)) = (&mut schema, first) {
            map.insert("type".into(), json!(name));
        }
    }
    schema
}

/// Input schema for an entry point's advertised parameters.
pub fn parameters_schema(parameters: &[Parameter]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for parameter in parameters {
        let mut schema = parameter.schema.clone();
        if let Value::Object(map) = &mut schema {
            if let Some(description) = &parameter.description {
                map.insert("description".into(), json!(description));
            }
            if let Some(default) = parameter.default.as_ref().and_then(|d| d.as_literal()) {
                map.insert("default".into(), default.clone());
            }
        }
        if parameter.required {
            required.push(json!(parameter.name));
        }
        properties.insert(parameter.name.clone(), schema);
    }
    let mut schema = Map::new();
    schema.insert("type".into(), json!("object"));
    schema.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".into(), Value::Array(required));
    }
    Value::Object(schema)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::python::parse_module;

    fn annotation(src: &str) -> Expr {
        let outline = parse_module(&format!("def f(x: {src}): pass\n")).unwrap();
        outline.functions[0].params[0].annotation.clone().unwrap()
    }

    fn infer_in(module: &ModuleOutline, src: &str) -> (Value, Vec<String>) {
        let type_map = TypeMap::builtin();
        let mut inference = SchemaInference::new(&type_map, module);
        let schema = inference.infer(&annotation(src));
        (schema, inference.unresolved().to_vec())
    }

    fn infer(src: &str) -> Value {
        infer_in(&ModuleOutline::default(), src).0
    }

    // -------------------------------------------------------------------------
    // TypeMap tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_builtin_primitives() {
        assert_eq!(infer("str"), json!({"type": "string"}));
        assert_eq!(infer("int"), json!({"type": "integer"}));
        assert_eq!(infer("float"), json!({"type": "number"}));
        assert_eq!(infer("bool"), json!({"type": "boolean"}));
        assert_eq!(infer("None"), json!({"type": "null"}));
        assert_eq!(infer("Any"), json!({}));
        assert_eq!(
            infer("datetime.datetime"),
            json!({"type": "string", "format": "date-time"})
        );
        assert_eq!(infer("UUID"), json!({"type": "string", "format": "uuid"}));
    }

    #[test]
    fn test_custom_mapping() {
        let type_map = TypeMap::builtin()
            .with_mapping("Money", TypeMapping::new(Primitive::Number).with_format("decimal"));
        let module = ModuleOutline::default();
        let mut inference = SchemaInference::new(&type_map, &module);
        assert_eq!(
            inference.infer(&annotation("Money")),
            json!({"type": "number", "format": "decimal"})
        );
        assert!(inference.unresolved().is_empty());
    }

    #[test]
    fn test_containers() {
        assert_eq!(
            infer("List[int]"),
            json!({"type": "array", "items": {"type": "integer"}})
        );
        assert_eq!(
            infer("dict[str, float]"),
            json!({"type": "object", "additionalProperties": {"type": "number"}})
        );
        assert_eq!(
            infer("set[str]"),
            json!({"type": "array", "items": {"type": "string"}, "uniqueItems": true})
        );
        assert_eq!(
            infer("tuple[int, ...]"),
            json!({"type": "array", "items": {"type": "integer"}})
        );
        assert_eq!(
            infer("Tuple[int, str]"),
            json!({
                "type": "array",
                "prefixItems": [{"type": "integer"}, {"type": "string"}],
                "minItems": 2,
                "maxItems": 2,
            })
        );
    }

    #[test]
    fn test_unions() {
        let expected = json!({"anyOf": [{"type": "string"}, {"type": "null"}]});
        assert_eq!(infer("Optional[str]"), expected);
        assert_eq!(infer("str | None"), expected);
        assert_eq!(infer("Union[str, None]"), expected);
        assert_eq!(infer("Union[str]"), json!({"type": "string"}));
    }

    #[test]
    fn test_literal_and_annotated() {
        assert_eq!(
            infer("Literal['a', 'b']"),
            json!({"enum": ["a", "b"], "type": "string"})
        );
        assert_eq!(
            infer("Annotated[int, Field(description='n')]"),
            json!({"type": "integer"})
        );
    }

    #[test]
    fn test_forward_reference_string() {
        assert_eq!(
            infer("'Optional[int]'"),
            json!({"anyOf": [{"type": "integer"}, {"type": "null"}]})
        );
    }

    #[test]
    fn test_unknown_name_is_any_and_reported() {
        let (schema, unresolved) = infer_in(&ModuleOutline::default(), "Widget");
        assert_eq!(schema, json!({}));
        assert_eq!(unresolved, ["Widget"]);
    }

    #[test]
    fn test_import_alias_resolves() {
        let module = parse_module("import datetime as dt\n").unwrap();
        let (schema, unresolved) = infer_in(&module, "dt.date");
        assert_eq!(schema, json!({"type": "string", "format": "date"}));
        assert!(unresolved.is_empty());
    }

    // -------------------------------------------------------------------------
    // Record tests
    // -------------------------------------------------------------------------

    const MODELS: &str = r#"
from pydantic import BaseModel, Field
from dataclasses import dataclass
from enum import Enum

class Status(str, Enum):
    OK = "ok"
    FAILED = "failed"

class Base(BaseModel):
    id: int

class Item(Base):
    name: str = Field(description="Display name")
    tags: list[str] = Field(default_factory=list)
    status: Status = "ok"

@dataclass
class Point:
    x: float
    y: float = 0.0

class Node(BaseModel):
    children: list["Node"]

class Plain:
    value: int
"#;

    #[test]
    fn test_record_kinds() {
        let module = parse_module(MODELS).unwrap();
        let kind = |name: &str| record_kind(module.class(name).unwrap(), &module);
        assert_eq!(kind("Status"), Some(RecordKind::Enum));
        assert_eq!(kind("Item"), Some(RecordKind::Model));
        assert_eq!(kind("Point"), Some(RecordKind::Dataclass));
        assert_eq!(kind("Plain"), None);
    }

    #[test]
    fn test_model_with_inheritance_and_fields() {
        let module = parse_module(MODELS).unwrap();
        let (schema, unresolved) = infer_in(&module, "Item");
        assert!(unresolved.is_empty());
        assert_eq!(
            schema,
            json!({
                "type": "object",
                "properties": {
                    "id": {"type": "integer"},
                    "name": {"type": "string", "description": "Display name"},
                    "tags": {"type": "array", "items": {"type": "string"}},
                    "status": {"enum": ["ok", "failed"], "type": "string", "default": "ok"},
                },
                "required": ["id", "name"],
            })
        );
    }

    #[test]
    fn test_dataclass_defaults() {
        let module = parse_module(MODELS).unwrap();
        let (schema, _) = infer_in(&module, "Point");
        assert_eq!(schema["required"], json!(["x"]));
        assert_eq!(schema["properties"]["y"]["default"], json!(0.0));
    }

    #[test]
    fn test_recursive_record_is_cut() {
        let module = parse_module(MODELS).unwrap();
        let (schema, _) = infer_in(&module, "Node");
        let mut cursor = &schema;
        let mut levels = 0;
        while let Some(items) = cursor.pointer("/properties/children/items") {
            cursor = items;
            levels += 1;
        }
        assert!(levels <= MAX_RECORD_DEPTH + 1);
        assert_eq!(cursor, &json!({}));
    }

    #[test]
    fn test_non_record_class_is_unresolved() {
        let module = parse_module(MODELS).unwrap();
        let (schema, unresolved) = infer_in(&module, "Plain");
        assert_eq!(schema, json!({}));
        assert_eq!(unresolved, ["Plain"]);
    }

    #[test]
    fn test_typed_dict_totality() {
        let module = parse_module(
            "class Opts(TypedDict, total=False):\n    a: str\n    b: Required[int]\n",
        )
        .unwrap();
        let (schema, _) = infer_in(&module, "Opts");
        assert_eq!(schema["required"], json!(["b"]));
    }

    #[test]
    fn test_output_schema_only_for_records() {
        let module = parse_module(MODELS).unwrap();
        let type_map = TypeMap::builtin();
        let mut inference = SchemaInference::new(&type_map, &module);
        assert!(inference.output_schema(&Expr::Name("Point".into())).is_some());
        assert!(inference.output_schema(&Expr::Name("Status".into())).is_none());
        assert!(inference.output_schema(&Expr::Name("str".into())).is_none());
        assert!(inference.output_schema(&Expr::Str("Point".into())).is_some());
    }

    #[test]
    fn test_record_scope_searches_shared_module() {
        let local = parse_module("x = 1\n").unwrap();
        let shared = parse_module(MODELS).unwrap();
        let scope = RecordScope::new(&local, Some(&shared));
        assert!(scope.class("Item").is_some());
        assert!(RecordScope::new(&local, None).class("Item").is_none());
    }

    // -------------------------------------------------------------------------
    // field_meta tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_field_meta_from_annotated() {
        let ann = annotation("Annotated[str, Field(description='Who')]");
        let meta = field_meta(Some(&ann), None);
        assert!(meta.is_required());
        assert_eq!(meta.description.as_deref(), Some("Who"));
    }

    #[test]
    fn test_field_meta_from_field_default() {
        let outline = parse_module("def f(x: str = Field('World', description='Who')): pass\n").unwrap();
        let param = &outline.functions[0].params[0];
        let meta = field_meta(param.annotation.as_ref(), param.default.as_ref());
        assert_eq!(meta.default, FieldDefault::Value(&Expr::Str("World".into())));
        assert_eq!(meta.description.as_deref(), Some("Who"));

        let ellipsis = Expr::Call {
            func: Box::new(Expr::Name("Field".into())),
            args: vec![Expr::Ellipsis],
            kwargs: vec![],
        };
        assert!(field_meta(None, Some(&ellipsis)).is_required());
    }
}
