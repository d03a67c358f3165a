//! # cepora - module host for an embedded JavaScript engine
//!
//! Gives an embedded script engine a `require` that understands three kinds
//! of modules:
//! - plain script files, handed to the engine as source text
//! - dialect files (CoffeeScript by default), compiled first by a transpiler
//! - native shared libraries exporting a `dukopen_<name>` entry point
//!
//! Failures carry a causal chain (`CompileError` caused by a
//! `ResolutionError`, `NativeInitError` caused by whatever the init function
//! threw) that can be printed with [`runner::diagnostics::dump_trace`].
//!
//! ## Quick Start
//!
//! ```
//! use std::rc::Rc;
//! use cepora::runner::module::{ModuleDispatcher, ModuleSystem, SearchPathList};
//! use cepora::runner::plugin::config::CachePolicy;
//! use cepora::runner::plugin::types::EvalContext;
//!
//! let dir = std::env::temp_dir();
//! let paths = SearchPathList::new(vec![dir]).unwrap();
//! let modules = Rc::new(ModuleSystem::new(ModuleDispatcher::new(paths), CachePolicy::Reuse));
//!
//! let mut ctx = EvalContext::new();
//! modules.install(&mut ctx);
//! assert!(ctx.get_binding("require").is_callable());
//!
//! let err = ctx.module_system().unwrap().require(&mut ctx, "no-such-module.js").unwrap_err();
//! assert_eq!(err.to_string(), "ResolutionError: cannot find module 'no-such-module.js'");
//! ```
//!
//! ## Architecture
//!
//! - **[`runner::module`]** - search path, dispatcher, native libraries, export merge, cache
//! - **[`runner::plugin`]** - evaluation context, host object builder, configuration
//! - **[`runner::ds`]** - values, objects and errors
//! - **[`runner::diagnostics`]** - chained errors and trace printing
//! - **[`runner::engine`]** - the script engine and transpiler seams

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

pub mod logging;
pub mod runner;
