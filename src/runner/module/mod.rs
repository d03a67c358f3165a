//! Module loading: `require` for scripts, dialect sources and native libraries.
//!
//! ## Resolution
//!
//! A module identifier is looked up in an ordered list of directories, the
//! [`SearchPathList`](resolver::SearchPathList):
//!
//! ```text
//! require("util.coffee")
//!   1. /opt/app/bin/util.coffee           <- first existing file wins
//!   2. /opt/app/bin/../resources/util.coffee
//! ```
//!
//! Absolute identifiers skip the search. A miss is not an error at this layer;
//! the [`ModuleDispatcher`](dispatcher::ModuleDispatcher) turns it into a
//! `ResolutionError` naming the identifier the script wrote.
//!
//! ## Dispatch
//!
//! The resolved file's extension picks the loader:
//!
//! | extension            | result                                             |
//! |----------------------|----------------------------------------------------|
//! | dialect (`coffee`)   | source compiled by the dialect's global compiler  |
//! | `so`/`dylib`/`dll`   | `dukopen_<stem>` called, its object merged into `exports` |
//! | anything else / none | file contents, unchanged                           |
//!
//! Every failure is a chained error whose kind names the stage that failed:
//! `ResolutionError`, `CompileError`, `LibraryLoadError`, `SymbolLoadError` or
//! `NativeInitError`. The library of a native module is closed on every path
//! out of the load unless [`LibraryLifetime::RetainWithExports`] hands it to
//! the exports object, which then closes it when the last reference to the
//! exports goes away.
//!
//! ## Example: a native module
//!
//! ```no_run
//! use cepora::runner::ds::error::JErrorType;
//! use cepora::runner::ds::value::JsValue;
//! use cepora::runner::plugin::types::{BuiltInObject, EvalContext};
//!
//! fn add(_ctx: &mut EvalContext, _this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
//!     Ok(JsValue::Undefined)
//! }
//!
//! #[no_mangle]
//! pub fn dukopen_mathx(_ctx: &mut EvalContext) -> Result<JsValue, JErrorType> {
//!     Ok(BuiltInObject::new("mathx").add_method("add", add).into_value())
//! }
//! ```
//!
//! Built as a `cdylib` named `mathx.so`, `require("mathx.so")` returns an
//! object with an `add` function.
//!
//! [`LibraryLifetime::RetainWithExports`]: crate::runner::plugin::config::LibraryLifetime::RetainWithExports

pub mod cache;
pub mod dispatcher;
pub mod exports;
pub mod library;
pub mod resolver;
pub mod system;

pub use dispatcher::{ModuleDispatcher, ModuleKind, ModuleSource};
pub use exports::merge_exports;
pub use library::{attached_library, DynamicLibraryLoader, LibraryHandle, LibraryLoader, NativeInitFn, NativeLibrary};
pub use resolver::SearchPathList;
pub use system::ModuleSystem;
