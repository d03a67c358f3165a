use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::runner::ds::object::JsObjectType;
use crate::runner::plugin::config::CachePolicy;

/// A module that finished loading.
pub struct LoadedModule {
    pub id: String,
    pub filename: PathBuf,
    pub exports: JsObjectType,
}

/// Cache key for a resolved path: the canonical path when it can be
/// computed, the path itself otherwise.
pub fn canonical_key(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Loaded modules keyed by canonical path.
///
/// Entries are added only after a module loaded successfully, and a reload
/// of the same path replaces the earlier entry. Nothing is kept when caching
/// is disabled.
pub struct ModuleCache {
    policy: CachePolicy,
    entries: RefCell<HashMap<PathBuf, Rc<LoadedModule>>>,
}

impl ModuleCache {
    pub fn new(policy: CachePolicy) -> Self {
        ModuleCache {
            policy,
            entries: RefCell::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// The module previously loaded from `key`. Always `None` when caching is
    /// disabled.
    pub fn lookup(&self, key: &Path) -> Option<Rc<LoadedModule>> {
        match self.policy {
            CachePolicy::Disabled => None,
            CachePolicy::Reuse | CachePolicy::Reject => self.entries.borrow().get(key).cloned(),
        }
    }

    pub fn insert(&self, key: PathBuf, module: LoadedModule) -> Rc<LoadedModule> {
        let module = Rc::new(module);
        if self.policy != CachePolicy::Disabled {
            self.entries.borrow_mut().insert(key, module.clone());
        }
        module
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
