use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::runner::ds::error::{ErrorKind, JErrorType};
use crate::runner::ds::function_object::new_function_object;
use crate::runner::ds::object::{new_object, JsObjectType};
use crate::runner::ds::value::JsValue;
use crate::runner::engine::ModuleRecord;
use crate::runner::module::cache::{canonical_key, LoadedModule, ModuleCache};
use crate::runner::module::dispatcher::{ModuleDispatcher, ModuleSource};
use crate::runner::plugin::config::{CachePolicy, CeporaConfig, ConfigError};
use crate::runner::plugin::types::{BuiltInFn, EvalContext};
use crate::runner::std_lib::{coffee, package};

/// Dispatcher plus cache, installed into an [`EvalContext`] to give scripts
/// `require`.
pub struct ModuleSystem {
    dispatcher: ModuleDispatcher,
    cache: ModuleCache,
    /// Modules currently loading, outermost first: (key, identifier, exports).
    loading: RefCell<Vec<(PathBuf, String, JsObjectType)>>,
}

impl ModuleSystem {
    pub fn new(dispatcher: ModuleDispatcher, policy: CachePolicy) -> Self {
        ModuleSystem {
            dispatcher,
            cache: ModuleCache::new(policy),
            loading: RefCell::new(Vec::new()),
        }
    }

    pub fn from_config(config: &CeporaConfig) -> Result<Self, ConfigError> {
        let paths = config.search_paths()?;
        Ok(Self::new(
            ModuleDispatcher::from_config(paths, &config.modules),
            config.modules.cache,
        ))
    }

    pub fn dispatcher(&self) -> &ModuleDispatcher {
        &self.dispatcher
    }

    pub fn cache(&self) -> &ModuleCache {
        &self.cache
    }

    /// Registers the `require` function and the `package` and `coffee`
    /// objects as globals of `ctx`, and makes this system the one `require`
    /// uses.
    pub fn install(self: Rc<Self>, ctx: &mut EvalContext) {
        let require = new_function_object("require", BuiltInFn::Native(require_fn));
        ctx.set_global("require", JsValue::Object(require));
        ctx.set_global("package", package::package_value(self.dispatcher.search_paths()));
        ctx.set_global("coffee", coffee::coffee_value());
        ctx.set_module_system(self);
    }

    /// Loads a module and returns its exports object.
    pub fn require(&self, ctx: &mut EvalContext, identifier: &str) -> Result<JsObjectType, JErrorType> {
        let path = self.dispatcher.resolve(identifier)?;
        let key = canonical_key(&path);

        if let Some(exports) = self.in_progress(&key, identifier)? {
            debug!("'{}' is still loading, returning its partial exports", identifier);
            return Ok(exports);
        }
        if let Some(module) = self.cache.lookup(&key) {
            return match self.cache.policy() {
                CachePolicy::Reject => Err(JErrorType::chained(
                    ErrorKind::Resolution,
                    format!(
                        "module '{}' already loaded from {}",
                        identifier,
                        module.filename.display()
                    ),
                )),
                _ => {
                    debug!("'{}' served from module cache", identifier);
                    Ok(module.exports.clone())
                }
            };
        }

        let exports = new_object();
        self.loading
            .borrow_mut()
            .push((key.clone(), identifier.to_string(), exports.clone()));
        let result = self.load(ctx, identifier, &path, &exports);
        self.loading.borrow_mut().pop();
        result?;

        self.cache.insert(
            key,
            LoadedModule {
                id: identifier.to_string(),
                filename: path,
                exports: exports.clone(),
            },
        );
        Ok(exports)
    }

    fn in_progress(&self, key: &Path, identifier: &str) -> Result<Option<JsObjectType>, JErrorType> {
        let loading = self.loading.borrow();
        let start = match loading.iter().position(|(k, _, _)| k == key) {
            Some(i) => i,
            None => return Ok(None),
        };
        if self.cache.policy() == CachePolicy::Reuse {
            return Ok(Some(loading[start].2.clone()));
        }
        let mut cycle: Vec<String> = loading[start..].iter().map(|(_, id, _)| id.clone()).collect();
        cycle.push(identifier.to_string());
        Err(JErrorType::chained(
            ErrorKind::Resolution,
            format!("circular require: {}", cycle.join(" -> ")),
        ))
    }

    fn load(
        &self,
        ctx: &mut EvalContext,
        identifier: &str,
        path: &Path,
        exports: &JsObjectType,
    ) -> Result<(), JErrorType> {
        match self.dispatcher.load_resolved(ctx, identifier, path, exports)? {
            ModuleSource::Native => Ok(()),
            ModuleSource::Text(source) => {
                let engine = ctx.engine().ok_or_else(|| {
                    JErrorType::ReferenceError(format!("no script engine to evaluate module '{}'", identifier))
                })?;
                let record = ModuleRecord {
                    id: identifier,
                    filename: path,
                    exports,
                };
                engine.eval_module(ctx, &record, &source)
            }
        }
    }
}

/// `require(id)` as seen by scripts.
fn require_fn(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let identifier = match args.first() {
        Some(JsValue::String(s)) => s.clone(),
        _ => return Err(JErrorType::TypeError("require expects a module identifier string".to_string())),
    };
    let modules = ctx
        .module_system()
        .ok_or_else(|| JErrorType::ReferenceError("module system is not installed".to_string()))?;
    modules.require(ctx, &identifier).map(JsValue::Object)
}
