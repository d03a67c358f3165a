//! The `package` object: the module search path as scripts see it.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::new_array;
use crate::runner::ds::value::JsValue;
use crate::runner::module::resolver::SearchPathList;
use crate::runner::plugin::types::{BuiltInFn, BuiltInObject, EvalContext};

/// `package.paths` (array of directory strings) and
/// `package.searchPath(name)` (resolved path string or `undefined`).
pub fn package_value(paths: &SearchPathList) -> JsValue {
    let dirs = paths
        .dirs()
        .iter()
        .map(|d| JsValue::from(d.display().to_string()))
        .collect();
    let resolver = paths.clone();
    BuiltInObject::new("package")
        .add_property("paths", JsValue::Object(new_array(dirs)))
        .add_closure(
            "searchPath",
            BuiltInFn::Plugin(Box::new(move |_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>| {
                search_path(&resolver, &args)
            })),
        )
        .into_value()
}

fn search_path(paths: &SearchPathList, args: &[JsValue]) -> Result<JsValue, JErrorType> {
    match args.first() {
        Some(JsValue::String(name)) => Ok(paths
            .resolve(name)
            .map(|p| JsValue::from(p.display().to_string()))
            .unwrap_or(JsValue::Undefined)),
        _ => Err(JErrorType::TypeError("searchPath expects a file name".to_string())),
    }
}
