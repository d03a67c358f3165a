use std::cell::RefCell;
use std::rc::Rc;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{JsObjectType, ObjectBase, ObjectType};
use crate::runner::ds::object_property::{PropertyDescriptor, PropertyKey};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::{BuiltInFn, EvalContext};

/// A host-implemented function value.
///
/// The callable is reference counted so it can be taken out of the object
/// before the call; a native function is free to touch its own function
/// object (or require more modules) while it runs.
pub struct JsFunctionObject {
    pub name: String,
    pub func: Rc<BuiltInFn>,
    pub object_base: ObjectBase,
}

pub fn new_function_object(name: impl Into<String>, func: BuiltInFn) -> JsObjectType {
    let name = name.into();
    let mut object_base = ObjectBase::new();
    object_base.force_define_own_property(
        PropertyKey::from("name"),
        PropertyDescriptor::Data {
            value: JsValue::String(name.clone()),
            writable: false,
            enumerable: false,
            configurable: true,
        },
    );
    Rc::new(RefCell::new(ObjectType::Function(JsFunctionObject {
        name,
        func: Rc::new(func),
        object_base,
    })))
}

pub fn call_function(
    ctx: &mut EvalContext,
    callee: &JsValue,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let func = match callee {
        JsValue::Object(o) => match &*o.borrow() {
            ObjectType::Function(f) => Some(f.func.clone()),
            _ => None,
        },
        _ => None,
    };
    match func {
        Some(f) => f.call(ctx, this, args),
        None => Err(JErrorType::TypeError(format!(
            "{} is not a function",
            callee.to_display_string()
        ))),
    }
}
