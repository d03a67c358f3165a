//! Host-side plumbing shared by native functions and native modules.
//!
//! - **[`EvalContext`](types::EvalContext)**: the context every native
//!   function receives. It carries the global object, the script engine,
//!   installed transpilers, the module system and the fatal handler, so a
//!   callback never needs a process-wide global to find its engine.
//! - **[`BuiltInObject`]**: builder for host objects (methods, constants,
//!   tagged accessors), used by native module init functions.
//! - **[`CeporaConfig`]**: the TOML configuration file.

pub mod config;
pub mod types;

pub use config::{CachePolicy, CeporaConfig, ConfigError, LibraryLifetime};
pub use types::{BuiltInFn, BuiltInObject, EvalContext, NativeFn};
