//! Native module libraries.
//!
//! A native module is a shared library exporting one entry point,
//! `dukopen_<stem>`, with the [`NativeInitFn`] signature. The library is
//! opened with immediate binding and global symbol visibility, so a module
//! loaded later can link against symbols of one loaded earlier.
//!
//! Native modules are linked against this crate and called through the Rust
//! ABI: they must be built with the same toolchain and the same `cepora`
//! version as the host.
//!
//! Function pointers handed out by a library are only valid while it stays
//! mapped. [`LibraryHandle`] owns the mapping and closes it exactly once.

use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use uuid::Uuid;

use crate::runner::ds::error::{ErrorKind, JErrorType};
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

#[cfg(not(any(unix, windows)))]
compile_error!("native modules need a platform with dynamic library loading (unix or windows)");

/// Prefix of every native module entry point.
pub const INIT_SYMBOL_PREFIX: &str = "dukopen_";

/// Shared library file extension of the target platform (`so`, `dylib`, `dll`).
pub const NATIVE_EXTENSION: &str = std::env::consts::DLL_EXTENSION;

/// Entry point of a native module. The returned object's own properties
/// become the module's exports; `undefined` means "nothing to export".
pub type NativeInitFn = fn(ctx: &mut EvalContext) -> Result<JsValue, JErrorType>;

/// Stem of a module identifier: its last path component up to the last `.`.
///
/// `"util.coffee"` and `"lib/util.so"` both give `"util"`; `"util"` is unchanged.
pub fn identifier_stem(identifier: &str) -> &str {
    let name = identifier.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(identifier);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(i) => &name[..i],
    }
}

/// `dukopen_<stem>` for an identifier.
pub fn init_symbol_name(identifier: &str) -> String {
    format!("{}{}", INIT_SYMBOL_PREFIX, identifier_stem(identifier))
}

/// Failures of the library layer. The dispatcher turns these into
/// script-visible errors.
#[derive(Debug)]
pub enum LoadError {
    /// The OS loader could not map the library.
    Open { path: PathBuf, reason: String },
    /// The library is mapped but does not export the symbol.
    Symbol { path: PathBuf, symbol: String, reason: String },
    Close { path: PathBuf, reason: String },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Open { path, reason } => write!(f, "cannot open library {}: {}", path.display(), reason),
            LoadError::Symbol { path, symbol, reason } => {
                write!(f, "cannot find symbol '{}' in {}: {}", symbol, path.display(), reason)
            }
            LoadError::Close { path, reason } => write!(f, "cannot close library {}: {}", path.display(), reason),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<LoadError> for JErrorType {
    fn from(e: LoadError) -> Self {
        let kind = match e {
            LoadError::Symbol { .. } => ErrorKind::SymbolLoad,
            LoadError::Open { .. } | LoadError::Close { .. } => ErrorKind::LibraryLoad,
        };
        JErrorType::chained(kind, e.to_string())
    }
}

/// An opened shared library.
pub trait NativeLibrary {
    /// Looks up an entry point by exact name. The error is the loader's text.
    fn init_symbol(&self, name: &str) -> Result<NativeInitFn, String>;

    /// Releases the OS-level reference.
    fn close(self: Box<Self>) -> Result<(), String>;
}

/// Opens shared libraries.
pub trait LibraryLoader {
    fn open(&self, path: &Path) -> Result<Box<dyn NativeLibrary>, String>;
}

/// [`LibraryLoader`] backed by the operating system's dynamic loader.
#[derive(Debug, Default, Clone, Copy)]
pub struct DynamicLibraryLoader;

struct DynamicLibrary {
    library: libloading::Library,
}

impl NativeLibrary for DynamicLibrary {
    fn init_symbol(&self, name: &str) -> Result<NativeInitFn, String> {
        // SAFETY: the symbol is trusted to have the `NativeInitFn` signature;
        // that is the native module contract.
        let symbol = unsafe { self.library.get::<NativeInitFn>(name.as_bytes()) };
        symbol.map(|s| *s).map_err(|e| e.to_string())
    }

    fn close(self: Box<Self>) -> Result<(), String> {
        self.library.close().map_err(|e| e.to_string())
    }
}

impl LibraryLoader for DynamicLibraryLoader {
    #[cfg(unix)]
    fn open(&self, path: &Path) -> Result<Box<dyn NativeLibrary>, String> {
        use libloading::os::unix::{Library, RTLD_GLOBAL, RTLD_NOW};
        // SAFETY: running a library's initializers is inherent to loading a
        // native module.
        let library = unsafe { Library::open(Some(path), RTLD_NOW | RTLD_GLOBAL) }.map_err(|e| e.to_string())?;
        Ok(Box::new(DynamicLibrary {
            library: library.into(),
        }))
    }

    #[cfg(windows)]
    fn open(&self, path: &Path) -> Result<Box<dyn NativeLibrary>, String> {
        // SAFETY: see the unix variant.
        let library = unsafe { libloading::Library::new(path) }.map_err(|e| e.to_string())?;
        Ok(Box::new(DynamicLibrary { library }))
    }
}

/// Owned reference to one opened library.
pub struct LibraryHandle {
    id: Uuid,
    path: PathBuf,
    library: Option<Box<dyn NativeLibrary>>,
}

impl LibraryHandle {
    pub fn load(loader: &dyn LibraryLoader, path: &Path) -> Result<Self, LoadError> {
        let library = loader.open(path).map_err(|reason| LoadError::Open {
            path: path.to_path_buf(),
            reason,
        })?;
        let handle = LibraryHandle {
            id: Uuid::new_v4(),
            path: path.to_path_buf(),
            library: Some(library),
        };
        debug!("opened library {} as {}", handle.path.display(), handle.id);
        Ok(handle)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn resolve_symbol(&self, symbol: &str) -> Result<NativeInitFn, LoadError> {
        let symbol_error = |reason: String| LoadError::Symbol {
            path: self.path.clone(),
            symbol: symbol.to_string(),
            reason,
        };
        match &self.library {
            Some(library) => library.init_symbol(symbol).map_err(symbol_error),
            None => Err(symbol_error("library already closed".to_string())),
        }
    }

    /// Closes the library now, reporting the loader's error if any.
    pub fn close(mut self) -> Result<(), LoadError> {
        self.close_library()
    }

    fn close_library(&mut self) -> Result<(), LoadError> {
        match self.library.take() {
            Some(library) => {
                debug!("closing library {} ({})", self.path.display(), self.id);
                library.close().map_err(|reason| LoadError::Close {
                    path: self.path.clone(),
                    reason,
                })
            }
            None => Ok(()),
        }
    }
}

impl Drop for LibraryHandle {
    fn drop(&mut self) {
        if let Err(e) = self.close_library() {
            warn!("{}", e);
        }
    }
}

impl fmt::Debug for LibraryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryHandle")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("open", &self.library.is_some())
            .finish()
    }
}

/// Releases a handle. Absent handles are ignored; close failures are logged.
pub fn unload(handle: Option<LibraryHandle>) {
    if let Some(handle) = handle {
        if let Err(e) = handle.close() {
            warn!("{}", e);
        }
    }
}

/// Hands `handle` to `exports`: the library stays mapped until the last
/// reference to the exports object is dropped. A handle attached earlier is
/// released.
pub fn attach_to_exports(handle: LibraryHandle, exports: &JsObjectType) {
    debug!("library {} now owned by its exports", handle.id);
    let previous = exports.borrow_mut().base_mut().set_host_data(Rc::new(handle));
    drop(previous);
}

/// The library kept alive by an exports object, if any.
pub fn attached_library(exports: &JsObjectType) -> Option<Rc<LibraryHandle>> {
    exports.borrow().base().host_data::<LibraryHandle>()
}
