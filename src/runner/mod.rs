pub mod diagnostics;
pub mod ds;
pub mod engine;
pub mod module;
pub mod plugin;
pub mod std_lib;
