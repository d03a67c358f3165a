use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::{call_function, JsFunctionObject};
use crate::runner::ds::object_property::{PropertyDescriptor, PropertyKey};
use crate::runner::ds::value::{JsNumberType, JsValue};
use crate::runner::plugin::types::EvalContext;

pub type JsObjectType = Rc<RefCell<ObjectType>>;

pub enum ObjectType {
    Ordinary(ObjectBase),
    Function(JsFunctionObject),
    Error(ObjectBase),
}
impl std::fmt::Debug for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectType::Ordinary(_) => write!(f, "ObjectType::Ordinary(...)"),
            ObjectType::Function(_) => write!(f, "ObjectType::Function(...)"),
            ObjectType::Error(_) => write!(f, "ObjectType::Error(...)"),
        }
    }
}
impl ObjectType {
    pub fn is_callable(&self) -> bool {
        matches!(self, ObjectType::Function(_))
    }

    pub fn base(&self) -> &ObjectBase {
        match self {
            ObjectType::Ordinary(o) => o,
            ObjectType::Function(f) => &f.object_base,
            ObjectType::Error(o) => o,
        }
    }

    pub fn base_mut(&mut self) -> &mut ObjectBase {
        match self {
            ObjectType::Ordinary(o) => o,
            ObjectType::Function(f) => &mut f.object_base,
            ObjectType::Error(o) => o,
        }
    }

    pub fn to_display_string(&self) -> String {
        match self {
            ObjectType::Ordinary(_) => "[object Object]".to_string(),
            ObjectType::Function(f) => format!("function {}() {{ [native code] }}", f.name),
            ObjectType::Error(o) => {
                let name = o.get_string("name").unwrap_or_else(|| "Error".to_string());
                match o.get_string("message") {
                    Some(m) if !m.is_empty() => format!("{}: {}", name, m),
                    _ => name,
                }
            }
        }
    }
}

/// Own-property storage shared by every object kind. Keys keep insertion
/// order; overwriting a key keeps its original position.
///
/// An object may also own one piece of host data, invisible to scripts and
/// dropped after the properties when the object goes away.
pub struct ObjectBase {
    properties: IndexMap<PropertyKey, PropertyDescriptor>,
    is_extensible: bool,
    host_data: Option<Rc<dyn Any>>,
}
impl ObjectBase {
    pub fn new() -> Self {
        ObjectBase {
            properties: IndexMap::new(),
            is_extensible: true,
            host_data: None,
        }
    }

    /// Attaches host data, returning what was attached before.
    pub fn set_host_data(&mut self, data: Rc<dyn Any>) -> Option<Rc<dyn Any>> {
        self.host_data.replace(data)
    }

    pub fn take_host_data(&mut self) -> Option<Rc<dyn Any>> {
        self.host_data.take()
    }

    /// The attached host data if it is a `T`.
    pub fn host_data<T: Any>(&self) -> Option<Rc<T>> {
        self.host_data.clone().and_then(|d| d.downcast::<T>().ok())
    }

    pub fn is_extensible(&self) -> bool {
        self.is_extensible
    }

    pub fn prevent_extensions(&mut self) -> bool {
        self.is_extensible = false;
        true
    }

    pub fn get_own_property(&self, property: &PropertyKey) -> Option<&PropertyDescriptor> {
        self.properties.get(property)
    }

    pub fn has_own_property(&self, property: &PropertyKey) -> bool {
        self.properties.contains_key(property)
    }

    /// Defines or redefines a property. Fails on a non-extensible object for
    /// new keys, and on non-configurable existing keys unless only the value
    /// of a writable data property changes.
    pub fn define_own_property(
        &mut self,
        property: PropertyKey,
        descriptor: PropertyDescriptor,
    ) -> bool {
        match self.properties.get(&property) {
            None => {
                if !self.is_extensible {
                    return false;
                }
            }
            Some(current) => {
                if !current.is_configurable() {
                    let value_only_update = match (current, &descriptor) {
                        (
                            PropertyDescriptor::Data {
                                writable: true,
                                enumerable: e1,
                                ..
                            },
                            PropertyDescriptor::Data {
                                enumerable: e2,
                                configurable: false,
                                ..
                            },
                        ) => e1 == e2,
                        _ => false,
                    };
                    if !value_only_update {
                        return false;
                    }
                }
            }
        }
        self.properties.insert(property, descriptor);
        true
    }

    /// Replaces the descriptor under `property` unconditionally.
    pub fn force_define_own_property(&mut self, property: PropertyKey, descriptor: PropertyDescriptor) {
        self.properties.insert(property, descriptor);
    }

    /// Assignment of a data value. Setters are not invoked here; see [`set`].
    pub fn put(&mut self, property: PropertyKey, value: JsValue) -> bool {
        match self.properties.get_mut(&property) {
            Some(PropertyDescriptor::Data {
                value: current,
                writable,
                ..
            }) => {
                if *writable {
                    *current = value;
                    true
                } else {
                    false
                }
            }
            Some(PropertyDescriptor::Accessor { .. }) => false,
            None => self.define_own_property(property, PropertyDescriptor::new_data(value)),
        }
    }

    /// Reads a data property. Accessors and missing keys read as `undefined`.
    pub fn get_data(&self, property: &PropertyKey) -> JsValue {
        match self.properties.get(property) {
            Some(PropertyDescriptor::Data { value, .. }) => value.clone(),
            _ => JsValue::Undefined,
        }
    }

    pub fn get_string(&self, name: &str) -> Option<String> {
        match self.get_data(&PropertyKey::from(name)) {
            JsValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn delete(&mut self, property: &PropertyKey) -> bool {
        match self.properties.get(property) {
            None => true,
            Some(pd) => {
                if pd.is_configurable() {
                    self.properties.shift_remove(property);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Every own key in insertion order, including non-enumerable and hidden ones.
    pub fn own_property_keys(&self) -> Vec<PropertyKey> {
        self.properties.keys().cloned().collect()
    }

    /// Own keys an ordinary `for..in` over this object would see.
    pub fn enumerable_keys(&self) -> Vec<PropertyKey> {
        self.properties
            .iter()
            .filter(|(k, d)| d.is_enumerable() && !k.is_hidden())
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn own_properties(&self) -> impl Iterator<Item = (&PropertyKey, &PropertyDescriptor)> {
        self.properties.iter()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl Default for ObjectBase {
    fn default() -> Self {
        Self::new()
    }
}

pub fn new_object() -> JsObjectType {
    Rc::new(RefCell::new(ObjectType::Ordinary(ObjectBase::new())))
}

/// An array-like object: integer keys plus a non-enumerable `length`.
pub fn new_array(values: Vec<JsValue>) -> JsObjectType {
    let mut base = ObjectBase::new();
    let len = values.len();
    for (i, v) in values.into_iter().enumerate() {
        base.put(PropertyKey::Int(i as u32), v);
    }
    base.force_define_own_property(
        PropertyKey::from("length"),
        PropertyDescriptor::new_non_enumerable(JsValue::Number(JsNumberType::Integer(len as i64))),
    );
    Rc::new(RefCell::new(ObjectType::Ordinary(base)))
}

/// `[[Get]]` on an own property, invoking a getter when there is one.
/// The object is not borrowed while the getter runs.
pub fn get(
    ctx: &mut EvalContext,
    obj: &JsObjectType,
    property: &PropertyKey,
) -> Result<JsValue, JErrorType> {
    let getter = {
        let o = obj.borrow();
        match o.base().get_own_property(property) {
            None => return Ok(JsValue::Undefined),
            Some(PropertyDescriptor::Data { value, .. }) => return Ok(value.clone()),
            Some(PropertyDescriptor::Accessor { get, .. }) => get.clone(),
        }
    };
    match getter {
        None => Ok(JsValue::Undefined),
        Some(g) => call_function(ctx, &JsValue::Object(g), JsValue::Object(obj.clone()), vec![]),
    }
}

/// `[[Set]]` on an own property, invoking a setter when there is one.
pub fn set(
    ctx: &mut EvalContext,
    obj: &JsObjectType,
    property: PropertyKey,
    value: JsValue,
) -> Result<bool, JErrorType> {
    let setter = {
        let o = obj.borrow();
        match o.base().get_own_property(&property) {
            Some(PropertyDescriptor::Accessor { set, .. }) => Some(set.clone()),
            _ => None,
        }
    };
    match setter {
        None => Ok(obj.borrow_mut().base_mut().put(property, value)),
        Some(None) => Ok(false),
        Some(Some(s)) => {
            call_function(ctx, &JsValue::Object(s), JsValue::Object(obj.clone()), vec![value])?;
            Ok(true)
        }
    }
}
