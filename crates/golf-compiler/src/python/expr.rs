//! Signature expressions lowered from the Python AST.
//!
//! Annotations, defaults and decorator arguments are reduced to the
//! subset schema inference cares about: dotted names, literals,
//! containers, subscripts, calls and `|` unions. Anything else becomes
//! [`Expr::Other`] carrying its source text.

use rustpython_parser::ast::{self, Ranged};
use rustpython_parser::{parse, Mode};
use serde_json::{Map, Number, Value};

/// A lowered expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Possibly dotted name, e.g. `typing.Optional`.
    Name(String),
    /// Non-formatted string literal (adjacent literals concatenated).
    Str(String),
    /// Bytes literal.
    Bytes(String),
    /// Numeric literal as decimal text, including a leading sign.
    Number(String),
    /// `True` / `False`.
    Bool(bool),
    /// `None`.
    NoneLit,
    /// `...`.
    Ellipsis,
    /// `[a, b]`.
    List(Vec<Expr>),
    /// `(a, b)`.
    Tuple(Vec<Expr>),
    /// `{k: v}`.
    Dict(Vec<(Expr, Expr)>),
    /// `value[args]`; a tuple subscript is flattened into `args`.
    Subscript {
        /// Subscripted expression.
        value: Box<Expr>,
        /// Subscript arguments.
        args: Vec<Expr>,
    },
    /// `func(args, key=value)`.
    Call {
        /// Callee.
        func: Box<Expr>,
        /// Positional arguments.
        args: Vec<Expr>,
        /// Keyword arguments, in source order.
        kwargs: Vec<(String, Expr)>,
    },
    /// `a | b | c`.
    BinOr(Vec<Expr>),
    /// Anything outside the supported subset, as source text.
    Other(String),
}

impl Expr {
    /// The dotted name, if this is a name.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Expr::Name(n) => Some(n),
            _ => None,
        }
    }

    /// Last segment of a dotted name (`typing.List` → `List`).
    pub fn base_name(&self) -> Option<&str> {
        self.as_name().map(|n| n.rsplit('.').next().unwrap_or(n))
    }

    /// Keyword argument of a call expression.
    pub fn kwarg(&self, key: &str) -> Option<&Expr> {
        match self {
            Expr::Call { kwargs, .. } => kwargs.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Whether this is a call to a function whose last name segment is `name`.
    pub fn is_call_to(&self, name: &str) -> bool {
        matches!(self, Expr::Call { func, .. } if func.base_name() == Some(name))
    }

    /// Render back to Python source.
    pub fn render(&self) -> String {
        fn join(items: &[Expr]) -> String {
            items.iter().map(Expr::render).collect::<Vec<_>>().join(", ")
        }

        match self {
            Expr::Name(n) | Expr::Number(n) | Expr::Other(n) => n.clone(),
            Expr::Str(s) => format!("{s:?}"),
            Expr::Bytes(s) => format!("b{s:?}"),
            Expr::Bool(true) => "True".to_string(),
            Expr::Bool(false) => "False".to_string(),
            Expr::NoneLit => "None".to_string(),
            Expr::Ellipsis => "...".to_string(),
            Expr::List(items) => format!("[{}]", join(items)),
            Expr::Tuple(items) if items.len() == 1 => format!("({},)", items[0].render()),
            Expr::Tuple(items) => format!("({})", join(items)),
            Expr::Dict(entries) => {
                let entries: Vec<_> = entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.render(), v.render()))
                    .collect();
                format!("{{{}}}", entries.join(", "))
            }
            Expr::Subscript { value, args } => format!("{}[{}]", value.render(), join(args)),
            Expr::Call { func, args, kwargs } => {
                let mut parts: Vec<String> = args.iter().map(Expr::render).collect();
                parts.extend(kwargs.iter().map(|(k, v)| format!("{k}={}", v.render())));
                format!("{}({})", func.render(), parts.join(", "))
            }
            Expr::BinOr(members) => members
                .iter()
                .map(Expr::render)
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }
}

/// Parse a standalone expression such as a string forward reference.
///
/// Returns `None` if `text` is not a single valid expression.
pub fn parse_expression(text: &str) -> Option<Expr> {
    match parse(text, Mode::Expression, "<expression>").ok()? {
        ast::Mod::Expression(module) => Some(lower(&module.body, text)),
        _ => None,
    }
}

/// Source text an AST node was parsed from.
pub fn source_text<T: Ranged>(node: &T, source: &str) -> String {
    let range = node.range();
    source
        .get(usize::from(range.start())..usize::from(range.end()))
        .unwrap_or_default()
        .to_string()
}

/// Lower an AST expression. `source` is the text it was parsed from.
pub fn lower(expr: &ast::Expr, source: &str) -> Expr {
    let other = || Expr::Other(source_text(expr, source));
    match expr {
        ast::Expr::Constant(constant) => constant_expr(&constant.value).unwrap_or_else(other),
        ast::Expr::Name(name) => Expr::Name(name.id.as_str().to_string()),
        ast::Expr::Attribute(attribute) => match lower(&attribute.value, source) {
            Expr::Name(base) => Expr::Name(format!("{base}.{}", attribute.attr.as_str())),
            _ => other(),
        },
        ast::Expr::Subscript(subscript) => {
            let args = match subscript.slice.as_ref() {
                ast::Expr::Tuple(tuple) => lower_all(&tuple.elts, source),
                slice => vec![lower(slice, source)],
            };
            Expr::Subscript {
                value: Box::new(lower(&subscript.value, source)),
                args,
            }
        }
        ast::Expr::Call(call) => {
            let mut kwargs = Vec::with_capacity(call.keywords.len());
            for keyword in &call.keywords {
                // `**mapping` has no name to look up.
                let Some(key) = &keyword.arg else {
                    return other();
                };
                kwargs.push((key.as_str().to_string(), lower(&keyword.value, source)));
            }
            Expr::Call {
                func: Box::new(lower(&call.func, source)),
                args: lower_all(&call.args, source),
                kwargs,
            }
        }
        ast::Expr::BinOp(binop) if matches!(binop.op, ast::Operator::BitOr) => {
            let mut members = Vec::new();
            for side in [binop.left.as_ref(), binop.right.as_ref()] {
                match lower(side, source) {
                    Expr::BinOr(nested) => members.extend(nested),
                    member => members.push(member),
                }
            }
            Expr::BinOr(members)
        }
        ast::Expr::UnaryOp(unary) => match (&unary.op, lower(&unary.operand, source)) {
            (ast::UnaryOp::USub, Expr::Number(text)) => match text.strip_prefix('-') {
                Some(positive) => Expr::Number(positive.to_string()),
                None => Expr::Number(format!("-{text}")),
            },
            (ast::UnaryOp::UAdd, number @ Expr::Number(_)) => number,
            _ => other(),
        },
        ast::Expr::List(list) => Expr::List(lower_all(&list.elts, source)),
        ast::Expr::Tuple(tuple) => Expr::Tuple(lower_all(&tuple.elts, source)),
        ast::Expr::Dict(dict) => {
            let mut entries = Vec::with_capacity(dict.values.len());
            for (key, value) in dict.keys.iter().zip(&dict.values) {
                // `**other` inside a dict display.
                let Some(key) = key else {
                    return other();
                };
                entries.push((lower(key, source), lower(value, source)));
            }
            Expr::Dict(entries)
        }
        _ => other(),
    }
}

fn lower_all(exprs: &[ast::Expr], source: &str) -> Vec<Expr> {
    exprs.iter().map(|e| lower(e, source)).collect()
}

fn constant_expr(constant: &ast::Constant) -> Option<Expr> {
    Some(match constant {
        ast::Constant::None => Expr::NoneLit,
        ast::Constant::Bool(b) => Expr::Bool(*b),
        ast::Constant::Str(s) => Expr::Str(s.clone()),
        ast::Constant::Bytes(b) => Expr::Bytes(String::from_utf8_lossy(b).into_owned()),
        ast::Constant::Int(i) => Expr::Number(i.to_string()),
        ast::Constant::Float(f) => Expr::Number(format!("{f:?}")),
        ast::Constant::Ellipsis => Expr::Ellipsis,
        ast::Constant::Tuple(items) => Expr::Tuple(
            items
                .iter()
                .map(constant_expr)
                .collect::<Option<Vec<_>>>()?,
        ),
        _ => return None,
    })
}

/// Convert a literal expression to JSON.
///
/// Returns `None` for anything that is not a constant literal, and for
/// integers that do not fit in 64 bits.
pub fn literal_value(expr: &Expr) -> Option<Value> {
    match expr {
        Expr::Str(s) => Some(Value::String(s.clone())),
        Expr::Bool(b) => Some(Value::Bool(*b)),
        Expr::NoneLit => Some(Value::Null),
        Expr::Number(text) => number_value(text),
        Expr::List(items) | Expr::Tuple(items) => {
            items.iter().map(literal_value).collect::<Option<Vec<_>>>().map(Value::Array)
        }
        Expr::Dict(entries) => {
            let mut map = Map::new();
            for (key, value) in entries {
                let key = match literal_value(key)? {
                    Value::String(s) => s,
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                map.insert(key, literal_value(value)?);
            }
            Some(Value::Object(map))
        }
        _ => None,
    }
}

fn number_value(text: &str) -> Option<Value> {
    if let Ok(value) = text.parse::<i64>() {
        return Some(Value::from(value));
    }
    if let Ok(value) = text.parse::<u64>() {
        return Some(Value::from(value));
    }
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.bytes().all(|b| b.is_ascii_digit()) {
        // Wider than 64 bits: not representable without loss.
        return None;
    }
    let value = text.parse::<f64>().ok()?;
    Number::from_f64(value).map(Value::Number)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(src: &str) -> Expr {
        parse_expression(src).unwrap()
    }

    // -------------------------------------------------------------------------
    // Lowering tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_dotted_name() {
        assert_eq!(parse("typing.Optional"), Expr::Name("typing.Optional".into()));
        assert_eq!(parse("typing.Optional").base_name(), Some("Optional"));
    }

    #[test]
    fn test_subscript_arguments() {
        let expr = parse("Dict[str, List[int]]");
        let Expr::Subscript { value, args } = expr else {
            unreachable!("Expected subscript");
        };
        assert_eq!(value.as_name(), Some("Dict"));
        assert_eq!(args.len(), 2);
        assert!(matches!(&args[1], Expr::Subscript { args, .. } if args.len() == 1));
    }

    #[test]
    fn test_union_operator_flattens() {
        assert_eq!(
            parse("str | None"),
            Expr::BinOr(vec![Expr::Name("str".into()), Expr::NoneLit])
        );
        assert!(matches!(parse("int | str | None"), Expr::BinOr(members) if members.len() == 3));
    }

    #[test]
    fn test_call_with_kwargs() {
        let expr = parse("Field('World', description=\"Who to greet\")");
        assert!(expr.is_call_to("Field"));
        assert_eq!(
            expr.kwarg("description"),
            Some(&Expr::Str("Who to greet".into()))
        );
        let Expr::Call { args, .. } = expr else {
            unreachable!("Expected call");
        };
        assert_eq!(args, [Expr::Str("World".into())]);
    }

    #[test]
    fn test_adjacent_strings_concatenate() {
        assert_eq!(parse("'a' \"b\""), Expr::Str("ab".into()));
    }

    #[test]
    fn test_unsupported_falls_back_to_source_text() {
        assert_eq!(
            parse("datetime.now()  + delta"),
            Expr::Other("datetime.now()  + delta".into())
        );
        assert_eq!(parse("lambda: 1"), Expr::Other("lambda: 1".into()));
        assert_eq!(parse("f'{x}'"), Expr::Other("f'{x}'".into()));
        assert_eq!(parse("dict(**base)"), Expr::Other("dict(**base)".into()));
    }

    #[test]
    fn test_invalid_expression() {
        assert!(parse_expression("List[").is_none());
        assert!(parse_expression("x = 1").is_none());
    }

    #[test]
    fn test_parenthesized_and_tuples() {
        assert_eq!(parse("(1)"), Expr::Number("1".into()));
        assert_eq!(parse("()"), Expr::Tuple(vec![]));
        assert!(matches!(parse("(1, 2)"), Expr::Tuple(items) if items.len() == 2));
    }

    // -------------------------------------------------------------------------
    // Literal conversion tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_literal_scalars() {
        assert_eq!(literal_value(&parse("'World'")), Some(json!("World")));
        assert_eq!(literal_value(&parse("-3")), Some(json!(-3)));
        assert_eq!(literal_value(&parse("1_000")), Some(json!(1000)));
        assert_eq!(literal_value(&parse("0x10")), Some(json!(16)));
        assert_eq!(literal_value(&parse("2.5")), Some(json!(2.5)));
        assert_eq!(literal_value(&parse("-2.5")), Some(json!(-2.5)));
        assert_eq!(literal_value(&parse("True")), Some(json!(true)));
        assert_eq!(literal_value(&parse("None")), Some(json!(null)));
    }

    #[test]
    fn test_wide_integers() {
        assert_eq!(
            literal_value(&parse("18446744073709551615")),
            Some(json!(18446744073709551615u64))
        );
        assert_eq!(literal_value(&parse("100000000000000000000000000")), None);
        assert_eq!(literal_value(&parse("-100000000000000000000000000")), None);
    }

    #[test]
    fn test_literal_containers() {
        assert_eq!(
            literal_value(&parse("{'a': [1, 2], 'b': (True, None)}")),
            Some(json!({"a": [1, 2], "b": [true, null]}))
        );
    }

    #[test]
    fn test_non_literals() {
        assert_eq!(literal_value(&parse("SOME_CONSTANT")), None);
        assert_eq!(literal_value(&parse("[x, 1]")), None);
        assert_eq!(literal_value(&parse("b'raw'")), None);
        assert_eq!(literal_value(&parse("1j")), None);
    }

    #[test]
    fn test_render() {
        assert_eq!(
            parse("Field(default_factory=list, description='x')").render(),
            "Field(default_factory=list, description=\"x\")"
        );
        assert_eq!(parse("Optional[Dict[str, int]]").render(), "Optional[Dict[str, int]]");
        assert_eq!(parse("int | None").render(), "int | None");
    }
}
