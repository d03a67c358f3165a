//! The `coffee` object: compile and run CoffeeScript files from script code.

use std::fs;
use std::path::{Path, PathBuf};

use crate::runner::ds::error::{ErrorKind, JErrorType};
use crate::runner::ds::value::JsValue;
use crate::runner::module::dispatcher::{transpile_file, ModuleKind, COFFEE_COMPILER, COFFEE_EXTENSION};
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

pub fn coffee_value() -> JsValue {
    BuiltInObject::new("coffee")
        .add_method("compileCoffee", compile_coffee)
        .add_method("evalCoffee", eval_coffee)
        .add_method("evalScript", eval_script)
        .into_value()
}

fn filename_arg(args: &[JsValue], method: &str) -> Result<PathBuf, JErrorType> {
    match args.first() {
        Some(JsValue::String(s)) => Ok(PathBuf::from(s)),
        _ => Err(JErrorType::TypeError(format!("{} expects a file name", method))),
    }
}

/// The compiler a file needs, if any. Follows the installed module system's
/// dialect table; without one only `.coffee` is a dialect.
fn compiler_for(ctx: &EvalContext, path: &Path) -> Option<String> {
    match ctx.module_system() {
        Some(modules) => match modules.dispatcher().classify(path) {
            ModuleKind::Dialect(compiler) => Some(compiler),
            _ => None,
        },
        None => match path.extension().and_then(|e| e.to_str()) {
            Some(COFFEE_EXTENSION) => Some(COFFEE_COMPILER.to_string()),
            _ => None,
        },
    }
}

fn eval_source(ctx: &mut EvalContext, source: &str, path: &Path) -> Result<JsValue, JErrorType> {
    let engine = ctx
        .engine()
        .ok_or_else(|| JErrorType::ReferenceError("no script engine installed".to_string()))?;
    engine.eval(ctx, source, &path.display().to_string())
}

fn compile_coffee(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let path = filename_arg(&args, "compileCoffee")?;
    transpile_file(ctx, &path, COFFEE_COMPILER).map(JsValue::String)
}

fn eval_coffee(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let path = filename_arg(&args, "evalCoffee")?;
    let source = transpile_file(ctx, &path, COFFEE_COMPILER)?;
    eval_source(ctx, &source, &path)
}

fn eval_script(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let path = filename_arg(&args, "evalScript")?;
    let source = match compiler_for(ctx, &path) {
        Some(compiler) => transpile_file(ctx, &path, &compiler)?,
        None => fs::read_to_string(&path).map_err(|e| {
            JErrorType::chained(
                ErrorKind::Resolution,
                format!("cannot read script '{}': {}", path.display(), e),
            )
        })?,
    };
    eval_source(ctx, &source, &path)
}
