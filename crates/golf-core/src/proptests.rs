//! Property-based tests for identifier derivation.

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::category::{ComponentCategory, ComponentPath};
    use crate::error::Error;
    use crate::ids::{derive_id, IdAllocator};
    use proptest::prelude::*;
    use std::path::PathBuf;

    fn segment() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9-]{0,8}"
    }

    fn build(stem: &str, outermost_first: &[String]) -> ComponentPath {
        let root = PathBuf::from("/project/tools");
        let mut file = root.clone();
        for dir in outermost_first {
            file.push(dir);
        }
        file.push(format!("{stem}.py"));
        ComponentPath::new(ComponentCategory::Tool, root, file).unwrap()
    }

    proptest! {
        #[test]
        fn test_top_level_id_is_stem(stem in segment()) {
            let path = build(&stem, &[]);
            prop_assert_eq!(derive_id(&path), stem);
        }

        #[test]
        fn test_nested_id_appends_ancestors_nearest_first(
            stem in segment(),
            dirs in proptest::collection::vec(segment(), 1..5),
        ) {
            let path = build(&stem, &dirs);
            let mut expected = stem.clone();
            for dir in dirs.iter().rev() {
                expected.push('_');
                expected.push_str(dir);
            }
            prop_assert_eq!(derive_id(&path), expected);
        }

        #[test]
        fn test_colliding_paths_are_rejected(
            stem in segment(),
            dir in segment(),
        ) {
            // `<dir>/<stem>.py` and `<stem>_<dir>.py` always collide.
            let nested = build(&stem, std::slice::from_ref(&dir));
            let flat = build(&format!("{stem}_{dir}"), &[]);

            let mut allocator = IdAllocator::new();
            allocator.allocate(&nested).unwrap();
            let err = allocator.allocate(&flat).unwrap_err();
            let is_duplicate = matches!(err, Error::DuplicateId { .. });
            prop_assert!(is_duplicate);
        }
    }
}
