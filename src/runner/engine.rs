//! Seams to the collaborators the module system drives but does not implement:
//! the script engine that evaluates source text, and the transpilers that turn
//! a secondary dialect into that source text.

use std::path::Path;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

/// A module as handed to [`ScriptEngine::eval_module`].
pub struct ModuleRecord<'a> {
    /// Identifier exactly as the script passed it to `require`.
    pub id: &'a str,
    pub filename: &'a Path,
    /// The container the module populates. It is the value `require` returns.
    pub exports: &'a JsObjectType,
}

pub trait ScriptEngine {
    /// Evaluate a standalone script and return its completion value.
    fn eval(&self, ctx: &mut EvalContext, source: &str, filename: &str) -> Result<JsValue, JErrorType>;

    /// Evaluate module source. The engine binds `exports` (and whatever else
    /// its module wrapper provides) before running the code.
    fn eval_module(&self, ctx: &mut EvalContext, module: &ModuleRecord<'_>, source: &str) -> Result<(), JErrorType>;

    fn name(&self) -> &str;
}

pub trait Transpiler {
    /// Compile dialect source into engine source. The error string is the
    /// compiler's own diagnostic.
    fn compile(&self, source: &str, filename: &str) -> Result<String, String>;

    fn name(&self) -> &str;
}
