use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::object_property::{PropertyDescriptor, PropertyKey};
use crate::runner::ds::value::JsValue;

/// Copies every own property of `source` into `destination`.
///
/// Non-enumerable and hidden keys are included, source insertion order is
/// kept, and existing keys in `destination` are overwritten. Values are
/// shared, not copied. `undefined` merges nothing. Returns the number of
/// properties copied.
pub fn merge_exports(source: &JsValue, destination: &JsObjectType) -> Result<usize, JErrorType> {
    let source = match source {
        JsValue::Undefined => return Ok(0),
        JsValue::Object(o) => o,
        other => {
            return Err(JErrorType::TypeError(format!(
                "module exports must be an object, got {}",
                other
            )))
        }
    };
    let properties: Vec<(PropertyKey, PropertyDescriptor)> = source
        .borrow()
        .base()
        .own_properties()
        .map(|(k, d)| (k.clone(), d.clone()))
        .collect();
    let count = properties.len();
    let mut dest = destination.borrow_mut();
    let base = dest.base_mut();
    for (key, descriptor) in properties {
        base.force_define_own_property(key, descriptor);
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::object::new_object;
    use crate::runner::plugin::types::{BuiltInObject, EvalContext};

    fn hello(_ctx: &mut EvalContext, _this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
        Ok(JsValue::from("hello"))
    }

    #[test]
    fn test_merge_keeps_order_and_identity() {
        let source = BuiltInObject::new("m")
            .add_property("VERSION", JsValue::from(3i64))
            .add_method("hello", hello)
            .into_object();
        source.borrow_mut().base_mut().force_define_own_property(
            PropertyKey::Hidden("handle".to_string()),
            PropertyDescriptor::new_non_enumerable(JsValue::Null),
        );
        let dest = new_object();
        dest.borrow_mut().base_mut().put(PropertyKey::from("hello"), JsValue::from("old"));
        dest.borrow_mut().base_mut().put(PropertyKey::from("keep"), JsValue::from(true));

        let copied = merge_exports(&JsValue::Object(source.clone()), &dest).unwrap();
        assert_eq!(copied, 3);

        let d = dest.borrow();
        assert_eq!(
            d.base().own_property_keys(),
            vec![
                PropertyKey::from("hello"),
                PropertyKey::from("keep"),
                PropertyKey::from("VERSION"),
                PropertyKey::Hidden("handle".to_string()),
            ]
        );
        let src_fn = source.borrow().base().get_data(&PropertyKey::from("hello"));
        assert!(src_fn.is_callable());
        assert_eq!(d.base().get_data(&PropertyKey::from("hello")), src_fn);
        assert!(!d.base().get_own_property(&PropertyKey::from("hello")).unwrap().is_enumerable());
    }

    #[test]
    fn test_undefined_merges_nothing() {
        let dest = new_object();
        assert_eq!(merge_exports(&JsValue::Undefined, &dest).unwrap(), 0);
        assert!(dest.borrow().base().is_empty());
    }

    #[test]
    fn test_primitive_is_rejected() {
        let dest = new_object();
        assert!(merge_exports(&JsValue::from(42i64), &dest).is_err());
    }

    #[test]
    fn test_merge_into_itself() {
        let obj = new_object();
        obj.borrow_mut().base_mut().put(PropertyKey::from("a"), JsValue::from(1i64));
        assert_eq!(merge_exports(&JsValue::Object(obj.clone()), &obj).unwrap(), 1);
        assert_eq!(obj.borrow().base().len(), 1);
    }
}
