//! Script-visible Error objects.
//!
//! Host errors become ordinary Error objects with `name`, `message`, `code`,
//! `stack` and, for chained errors, `cause`.

use std::cell::RefCell;
use std::rc::Rc;

use crate::runner::ds::error::{ErrorCode, JErrorType};
use crate::runner::ds::object::{JsObjectType, ObjectBase, ObjectType};
use crate::runner::ds::object_property::{PropertyDescriptor, PropertyKey};
use crate::runner::ds::value::{JsNumberType, JsValue};

/// Creates an Error object.
pub fn new_error_object(name: &str, message: &str, code: ErrorCode) -> JsObjectType {
    let mut base = ObjectBase::new();
    let stack = if message.is_empty() {
        name.to_string()
    } else {
        format!("{}: {}", name, message)
    };
    base.force_define_own_property(PropertyKey::from("name"), PropertyDescriptor::new_non_enumerable(JsValue::from(name)));
    base.force_define_own_property(
        PropertyKey::from("message"),
        PropertyDescriptor::new_non_enumerable(JsValue::from(message)),
    );
    base.force_define_own_property(
        PropertyKey::from("code"),
        PropertyDescriptor::new_data(JsValue::from(i64::from(code.value()))),
    );
    base.force_define_own_property(PropertyKey::from("stack"), PropertyDescriptor::new_non_enumerable(JsValue::from(stack)));
    Rc::new(RefCell::new(ObjectType::Error(base)))
}

/// Sets `cause` on an Error object.
pub fn set_cause(error: &JsObjectType, cause: JsValue) {
    error
        .borrow_mut()
        .base_mut()
        .force_define_own_property(PropertyKey::from("cause"), PropertyDescriptor::new_non_enumerable(cause));
}

/// Reads `code` from an error value, if it carries a valid one.
pub fn error_code_of(value: &JsValue) -> Option<ErrorCode> {
    let code = match value {
        JsValue::Object(o) => o.borrow().base().get_data(&PropertyKey::from("code")),
        _ => return None,
    };
    match code {
        JsValue::Number(JsNumberType::Integer(i)) if i > 0 && i <= i64::from(ErrorCode::MAX) => ErrorCode::new(i as u32),
        _ => None,
    }
}

impl JErrorType {
    /// The value a script's `catch` sees for this error. A thrown value is
    /// returned as is; everything else becomes a fresh Error object whose
    /// cause chain mirrors the host chain.
    pub fn to_js_value(&self) -> JsValue {
        if let JErrorType::Thrown(v) = self {
            return v.clone();
        }
        let error = new_error_object(&self.name(), &self.message(), self.code());
        if let Some(cause) = self.cause() {
            set_cause(&error, cause.to_js_value());
        }
        JsValue::Object(error)
    }
}
