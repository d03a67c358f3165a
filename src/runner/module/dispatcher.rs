//! The `require` handler: resolve an identifier, then produce either source
//! text for the engine or, for native modules, populated exports.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::runner::diagnostics::raise_chained;
use crate::runner::ds::error::{ErrorCode, ErrorKind, JErrorType};
use crate::runner::ds::object::JsObjectType;
use crate::runner::module::exports::merge_exports;
use crate::runner::module::library::{
    attach_to_exports, init_symbol_name, unload, DynamicLibraryLoader, LibraryHandle, LibraryLoader,
    NATIVE_EXTENSION,
};
use crate::runner::module::resolver::SearchPathList;
use crate::runner::plugin::config::{LibraryLifetime, ModulesConfig};
use crate::runner::plugin::types::EvalContext;

/// Extension of the CoffeeScript dialect.
pub const COFFEE_EXTENSION: &str = "coffee";
/// Global name of the CoffeeScript compiler object.
pub const COFFEE_COMPILER: &str = "CoffeeScript";

/// What `require_module` produced.
#[derive(Debug)]
pub enum ModuleSource {
    /// Source text the engine should evaluate as the module body.
    Text(String),
    /// A native module; its exports are already merged. A library kept
    /// loaded is owned by the exports object.
    Native,
}

impl ModuleSource {
    pub fn text(&self) -> Option<&str> {
        match self {
            ModuleSource::Text(s) => Some(s),
            ModuleSource::Native => None,
        }
    }

    /// True when there is nothing left to evaluate.
    pub fn is_no_source(&self) -> bool {
        matches!(self, ModuleSource::Native)
    }
}

/// How a resolved file is turned into a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleKind {
    /// Dialect source, compiled by the named global compiler object.
    Dialect(String),
    Native,
    Script,
}

pub struct ModuleDispatcher {
    search_paths: SearchPathList,
    loader: Box<dyn LibraryLoader>,
    dialects: HashMap<String, String>,
    native_extension: String,
    library_lifetime: LibraryLifetime,
}

impl ModuleDispatcher {
    pub fn new(search_paths: SearchPathList) -> Self {
        let mut dialects = HashMap::new();
        dialects.insert(COFFEE_EXTENSION.to_string(), COFFEE_COMPILER.to_string());
        ModuleDispatcher {
            search_paths,
            loader: Box::new(DynamicLibraryLoader),
            dialects,
            native_extension: NATIVE_EXTENSION.to_string(),
            library_lifetime: LibraryLifetime::default(),
        }
    }

    pub fn from_config(search_paths: SearchPathList, config: &ModulesConfig) -> Self {
        let mut dispatcher = Self::new(search_paths).with_library_lifetime(config.library_lifetime);
        dispatcher.dialects = config
            .dialects
            .iter()
            .map(|(ext, compiler)| (ext.clone(), compiler.clone()))
            .collect();
        if let Some(ext) = &config.native_extension {
            dispatcher.native_extension = ext.clone();
        }
        dispatcher
    }

    pub fn with_loader(mut self, loader: Box<dyn LibraryLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_dialect(mut self, extension: &str, compiler: &str) -> Self {
        self.dialects.insert(extension.to_string(), compiler.to_string());
        self
    }

    pub fn with_native_extension(mut self, extension: &str) -> Self {
        self.native_extension = extension.to_string();
        self
    }

    pub fn with_library_lifetime(mut self, lifetime: LibraryLifetime) -> Self {
        self.library_lifetime = lifetime;
        self
    }

    pub fn search_paths(&self) -> &SearchPathList {
        &self.search_paths
    }

    pub fn library_lifetime(&self) -> LibraryLifetime {
        self.library_lifetime
    }

    /// Resolves an identifier or fails with a ResolutionError naming it.
    pub fn resolve(&self, identifier: &str) -> Result<PathBuf, JErrorType> {
        self.search_paths.resolve(identifier).ok_or_else(|| {
            debug!("module '{}' not found in search path", identifier);
            JErrorType::chained(ErrorKind::Resolution, format!("cannot find module '{}'", identifier))
        })
    }

    pub fn classify(&self, path: &Path) -> ModuleKind {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext == self.native_extension => ModuleKind::Native,
            Some(ext) => match self.dialects.get(ext) {
                Some(compiler) => ModuleKind::Dialect(compiler.clone()),
                None => ModuleKind::Script,
            },
            None => ModuleKind::Script,
        }
    }

    /// Loads the module `identifier` names. Native exports go into `exports`.
    pub fn require_module(
        &self,
        ctx: &mut EvalContext,
        identifier: &str,
        exports: &JsObjectType,
    ) -> Result<ModuleSource, JErrorType> {
        let path = self.resolve(identifier)?;
        self.load_resolved(ctx, identifier, &path, exports)
    }

    /// Like [`require_module`](Self::require_module) for an already resolved path.
    pub fn load_resolved(
        &self,
        ctx: &mut EvalContext,
        identifier: &str,
        path: &Path,
        exports: &JsObjectType,
    ) -> Result<ModuleSource, JErrorType> {
        match self.classify(path) {
            ModuleKind::Dialect(compiler) => {
                info!("loading dialect module '{}' from {}", identifier, path.display());
                transpile_file(ctx, path, &compiler).map(ModuleSource::Text)
            }
            ModuleKind::Native => {
                info!("loading native module '{}' from {}", identifier, path.display());
                self.load_native(ctx, identifier, path, exports)
            }
            ModuleKind::Script => {
                info!("loading script module '{}' from {}", identifier, path.display());
                read_source(path).map(ModuleSource::Text)
            }
        }
    }

    fn load_native(
        &self,
        ctx: &mut EvalContext,
        identifier: &str,
        path: &Path,
        exports: &JsObjectType,
    ) -> Result<ModuleSource, JErrorType> {
        let handle = LibraryHandle::load(self.loader.as_ref(), path).map_err(|e| {
            JErrorType::chained(
                ErrorKind::LibraryLoad,
                format!("cannot load native module '{}': {}", identifier, e),
            )
        })?;
        let symbol = init_symbol_name(identifier);
        let init = match handle.resolve_symbol(&symbol) {
            Ok(init) => init,
            Err(e) => {
                unload(Some(handle));
                return raise_chained(
                    &JErrorType::from(e),
                    ErrorKind::SymbolLoad,
                    ErrorCode::SYMBOL_LOAD,
                    format!("native module '{}' has no entry point '{}'", identifier, symbol),
                );
            }
        };
        debug!("calling {} from {}", symbol, path.display());
        let merged = match init(ctx) {
            Ok(value) => match merge_exports(&value, exports) {
                Ok(count) => Ok(count),
                Err(e) => raise_chained(
                    &e,
                    ErrorKind::NativeInit,
                    ErrorCode::NATIVE_INIT,
                    format!("native module '{}' returned invalid exports", identifier),
                ),
            },
            Err(thrown) => raise_chained(
                &thrown,
                ErrorKind::NativeInit,
                ErrorCode::NATIVE_INIT,
                format!("native module '{}' failed to initialize", identifier),
            ),
        };
        match merged {
            Err(e) => {
                unload(Some(handle));
                Err(e)
            }
            Ok(count) => {
                debug!("merged {} exports from '{}'", count, identifier);
                match self.library_lifetime {
                    LibraryLifetime::UnloadAfterInit => unload(Some(handle)),
                    LibraryLifetime::RetainWithExports => attach_to_exports(handle, exports),
                }
                Ok(ModuleSource::Native)
            }
        }
    }
}

fn read_source(path: &Path) -> Result<String, JErrorType> {
    fs::read_to_string(path).map_err(|e| {
        JErrorType::chained(
            ErrorKind::Resolution,
            format!("cannot read module file '{}': {}", path.display(), e),
        )
    })
}

/// Reads a dialect file and compiles it with the compiler installed under
/// `compiler` in `ctx`.
pub fn transpile_file(ctx: &EvalContext, path: &Path, compiler: &str) -> Result<String, JErrorType> {
    let filename = path.display().to_string();
    let transpiler = ctx.transpiler(compiler).ok_or_else(|| {
        JErrorType::chained(
            ErrorKind::Compile,
            format!("Can't find global {} compiler object.", compiler),
        )
    })?;
    let source = match read_source(path) {
        Ok(source) => source,
        Err(e) => return raise_chained(&e, ErrorKind::Compile, ErrorCode::COMPILE, format!("cannot compile '{}'", filename)),
    };
    match transpiler.compile(&source, &filename) {
        Ok(compiled) => Ok(compiled),
        Err(msg) => raise_chained(
            &JErrorType::SyntaxError(msg.clone()),
            ErrorKind::Compile,
            ErrorCode::COMPILE,
            format!("cannot compile '{}': {}", filename, msg),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher() -> ModuleDispatcher {
        let paths = SearchPathList::new(vec![PathBuf::from("/nonexistent")]).unwrap();
        ModuleDispatcher::new(paths).with_native_extension("so")
    }

    #[test]
    fn test_classify_by_extension() {
        let d = dispatcher();
        assert_eq!(d.classify(Path::new("/a/util.coffee")), ModuleKind::Dialect("CoffeeScript".to_string()));
        assert_eq!(d.classify(Path::new("/a/dummy.so")), ModuleKind::Native);
        assert_eq!(d.classify(Path::new("/a/main.js")), ModuleKind::Script);
        assert_eq!(d.classify(Path::new("/a/util")), ModuleKind::Script);
    }

    #[test]
    fn test_extra_dialect() {
        let d = dispatcher().with_dialect("ls", "LiveScript");
        assert_eq!(d.classify(Path::new("x.ls")), ModuleKind::Dialect("LiveScript".to_string()));
    }

    #[test]
    fn test_missing_compiler_is_compile_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("util.coffee");
        fs::write(&file, "x = 1").unwrap();
        let ctx = EvalContext::new();
        let err = transpile_file(&ctx, &file, COFFEE_COMPILER).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Compile));
        assert_eq!(err.message(), "Can't find global CoffeeScript compiler object.");
    }
}
