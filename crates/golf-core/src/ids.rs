//! Component identifier derivation.
//!
//! A component's externally visible name is derived from its path: the
//! file stem followed by every ancestor directory, nearest first, joined
//! with underscores.
//!
//! | Path                              | Id                       |
//! |-----------------------------------|--------------------------|
//! | `tools/hello.py`                  | `hello`                  |
//! | `tools/payments/submit.py`        | `submit_payments`        |
//! | `tools/billing/payments/submit.py`| `submit_payments_billing`|

use std::collections::HashMap;
use std::path::PathBuf;

use crate::category::{ComponentCategory, ComponentPath};
use crate::error::{Error, Result};

/// Separator placed between the stem and each ancestor directory.
pub const ID_SEPARATOR: char = '_';

/// Derive the identifier for a component path.
///
/// # Examples
///
/// ```
/// use golf_core::{derive_id, ComponentCategory, ComponentPath};
///
/// let path = ComponentPath::new(
///     ComponentCategory::Tool,
///     "/p/tools",
///     "/p/tools/payments/submit.py",
/// )
/// .unwrap();
/// assert_eq!(derive_id(&path), "submit_payments");
/// ```
pub fn derive_id(path: &ComponentPath) -> String {
    let mut id = path.stem().to_string();
    for dir in path.ancestors() {
        id.push(ID_SEPARATOR);
        id.push_str(dir);
    }
    id
}

/// Allocates identifiers and rejects collisions within a category.
///
/// Ids only need to be unique per category: a tool and a prompt may share
/// a name because they are dispatched through different mechanisms.
#[derive(Debug, Default)]
pub struct IdAllocator {
    allocated: HashMap<(ComponentCategory, String), PathBuf>,
}

impl IdAllocator {
    /// Create an empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive and reserve the id for `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateId`] naming both files if another path in
    /// the same category already holds the id.
    pub fn allocate(&mut self, path: &ComponentPath) -> Result<String> {
        let id = derive_id(path);
        let key = (path.category(), id.clone());

        if let Some(first) = self.allocated.get(&key) {
            if first != path.file() {
                return Err(Error::DuplicateId {
                    category: path.category(),
                    id,
                    first: first.clone(),
                    second: path.file().to_path_buf(),
                });
            }
            return Ok(id);
        }

        log::debug!("Allocated {} id '{id}' for {path}", path.category());
        self.allocated.insert(key, path.file().to_path_buf());
        Ok(id)
    }

    /// Number of allocated ids across all categories.
    pub fn len(&self) -> usize {
        self.allocated.len()
    }

    /// Whether no ids have been allocated.
    pub fn is_empty(&self) -> bool {
        self.allocated.is_empty()
    }
}
