//! Property-based tests for module parsing.

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::python::{literal_value, parse_module};
    use proptest::prelude::*;
    use serde_json::json;

    fn ident() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,8}".prop_map(|s| format!("p_{s}"))
    }

    proptest! {
        #[test]
        fn test_arbitrary_source_never_panics(source in "\\PC{0,200}") {
            let _ = parse_module(&source);
        }

        #[test]
        fn test_bracket_soup_never_panics(source in "[()\\[\\]{}:\"' \\n\\\\a=]{0,80}") {
            let _ = parse_module(&source);
        }

        #[test]
        fn test_parameters_and_int_defaults_survive(
            name in ident(),
            params in proptest::collection::btree_map(ident(), -1000i64..1000, 0..6),
            is_async in any::<bool>(),
        ) {
            let signature = params
                .iter()
                .map(|(p, d)| format!("{p}: int = {d}"))
                .collect::<Vec<_>>()
                .join(",\n    ");
            let source = format!(
                "{}def {name}(\n    {signature}\n) -> int:\n    return 0\n\nexport = {name}\n",
                if is_async { "async " } else { "" },
            );

            let outline = parse_module(&source).unwrap();
            let function = outline.function(&name).unwrap();
            prop_assert_eq!(function.is_async, is_async);
            prop_assert_eq!(function.params.len(), params.len());
            for (param, (expected_name, expected_default)) in function.params.iter().zip(&params) {
                prop_assert_eq!(&param.name, expected_name);
                let default = literal_value(param.default.as_ref().unwrap());
                prop_assert_eq!(default, Some(json!(expected_default)));
            }
        }

        #[test]
        fn test_integer_defaults_are_exact_or_absent(value in any::<u128>(), negative in any::<bool>()) {
            let negative = negative && value != 0;
            let text = if negative { format!("-{value}") } else { value.to_string() };
            let source = format!("def f(n: int = {text}): pass\n");
            let outline = parse_module(&source).unwrap();
            let param = &outline.functions[0].params[0];
            prop_assert_eq!(param.default_text.as_deref(), Some(text.as_str()));
            match literal_value(param.default.as_ref().unwrap()) {
                Some(json) => prop_assert_eq!(json.to_string(), text),
                None => prop_assert!(value > u128::from(u64::MAX) || (negative && value > 1 << 63)),
            }
        }
    }
}
