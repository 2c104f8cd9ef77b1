//! Shared-code resolution.
//!
//! Every directory in a category tree may hold one `common.py`. A
//! component sees the nearest one between its own directory and the
//! category root. Shared modules are parsed once per directory, no matter
//! how many components (or threads) ask for them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use golf_core::{ComponentCategory, ComponentPath, Error, Result};
use serde::Serialize;

use crate::python::{parse_module, ModuleOutline};

/// Reserved file name of a shared-code module.
pub const SHARED_MODULE_FILE: &str = "common.py";

/// A loaded shared-code module.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SharedModule {
    /// Where the file sits in its category tree.
    #[serde(skip)]
    pub location: ComponentPath,
    /// Project-relative path, e.g. `tools/payments/common.py`.
    pub path: PathBuf,
    /// Dotted module name, e.g. `tools.payments.common`.
    pub module: String,
    /// Parsed top-level shape.
    #[serde(skip)]
    pub outline: ModuleOutline,
}

impl SharedModule {
    /// Read and parse a shared module.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidComponent`] naming the file if it cannot be
    /// read or parsed.
    pub fn load(location: &ComponentPath) -> Result<Self> {
        let invalid = |message: String| {
            Error::invalid_component(location.category(), location.file(), message)
        };
        let source = std::fs::read_to_string(location.file())
            .map_err(|e| invalid(format!("failed to read shared module: {e}")))?;
        let outline =
            parse_module(&source).map_err(|e| invalid(format!("syntax error at {e}")))?;

        Ok(Self {
            location: location.clone(),
            path: location.relative_path(),
            module: location.module_name(),
            outline,
        })
    }

    /// Directory whose subtree sees this module.
    pub fn directory(&self) -> &Path {
        self.location.directory()
    }
}

/// Cached outcome of a failed load; kept so every dependent sees the same error.
#[derive(Debug, Clone)]
struct LoadFailure {
    category: ComponentCategory,
    path: PathBuf,
    message: String,
}

impl LoadFailure {
    fn from_error(location: &ComponentPath, error: &Error) -> Self {
        let message = match error {
            Error::InvalidComponent { message, .. } => message.clone(),
            other => other.to_string(),
        };
        Self {
            category: location.category(),
            path: location.file().to_path_buf(),
            message,
        }
    }

    fn to_error(&self) -> Error {
        Error::invalid_component(self.category, &self.path, &self.message)
    }
}

type Slot = Arc<OnceLock<std::result::Result<Arc<SharedModule>, LoadFailure>>>;

/// Load-once cache of shared modules keyed by directory.
///
/// The map lock is held only to find or create a directory's slot; the
/// load itself runs inside that slot's `OnceLock`, so concurrent first
/// requests for one directory block on a single load while other
/// directories proceed.
#[derive(Debug, Default)]
pub struct SharedModuleCache {
    slots: Mutex<HashMap<PathBuf, Slot>>,
    loads: AtomicUsize,
}

impl SharedModuleCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, directory: &Path) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(directory.to_path_buf()).or_default())
    }

    /// Return the module at `location`, loading it on first request.
    ///
    /// # Errors
    ///
    /// Returns the (cached) load failure as [`Error::InvalidComponent`].
    pub fn get_or_load(&self, location: &ComponentPath) -> Result<Arc<SharedModule>> {
        let slot = self.slot(location.directory());
        let outcome = slot.get_or_init(|| {
            self.loads.fetch_add(1, Ordering::SeqCst);
            log::debug!("Loading shared module {location}");
            SharedModule::load(location)
                .map(Arc::new)
                .map_err(|e| LoadFailure::from_error(location, &e))
        });
        outcome.clone().map_err(|failure| failure.to_error())
    }

    /// Number of loads performed (successful or not).
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Successfully loaded modules, ordered by path.
    pub fn loaded(&self) -> Vec<Arc<SharedModule>> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let mut modules: Vec<_> = slots
            .values()
            .filter_map(|slot| slot.get().and_then(|r| r.as_ref().ok()).cloned())
            .collect();
        modules.sort_by(|a, b| a.path.cmp(&b.path));
        modules
    }
}

/// Finds the shared module visible to each component.
#[derive(Debug, Default)]
pub struct SharedResolver {
    cache: SharedModuleCache,
    located: Mutex<HashMap<PathBuf, Option<PathBuf>>>,
}

impl SharedResolver {
    /// Create a resolver with an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Underlying module cache.
    pub fn cache(&self) -> &SharedModuleCache {
        &self.cache
    }

    /// Directory of the nearest `common.py` visible to `path`, if any.
    ///
    /// Results are memoized for every directory on the walk.
    pub fn locate(&self, path: &ComponentPath) -> Option<PathBuf> {
        let root = path.category_root();
        let mut walked = Vec::new();
        let mut current = Some(path.directory());

        let found = loop {
            let Some(dir) = current.filter(|d| d.starts_with(root)) else {
                break None;
            };
            {
                let located = self.located.lock().unwrap_or_else(PoisonError::into_inner);
                if let Some(hit) = located.get(dir) {
                    break hit.clone();
                }
            }
            walked.push(dir.to_path_buf());
            if dir.join(SHARED_MODULE_FILE).is_file() {
                break Some(dir.to_path_buf());
            }
            if dir == root {
                break None;
            }
            current = dir.parent();
        };

        let mut located = self.located.lock().unwrap_or_else(PoisonError::into_inner);
        for dir in walked {
            located.insert(dir, found.clone());
        }
        found
    }

    /// Load the shared module visible to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidComponent`] naming the shared file if it
    /// fails to load.
    pub fn resolve(&self, path: &ComponentPath) -> Result<Option<Arc<SharedModule>>> {
        let Some(directory) = self.locate(path) else {
            return Ok(None);
        };
        let file = directory.join(SHARED_MODULE_FILE);
        let location = ComponentPath::new(path.category(), path.category_root(), &file)
            .ok_or_else(|| {
                Error::invalid_component(path.category(), &file, "shared module is outside its category root")
            })?;
        self.cache.get_or_load(&location).map(Some)
    }

    /// Load every discovered shared module up front.
    ///
    /// # Errors
    ///
    /// Returns the first load failure in `locations` order.
    pub fn preload(&self, locations: &[ComponentPath]) -> Result<()> {
        for location in locations {
            self.cache.get_or_load(location)?;
        }
        Ok(())
    }
}
