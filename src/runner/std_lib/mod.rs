//! Script-visible host objects.
//!
//! `package` and `coffee` are installed by the module system; `error` turns
//! host errors into Error objects.

pub mod coffee;
pub mod error;
pub mod package;
