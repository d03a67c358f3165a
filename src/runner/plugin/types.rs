//! Core types shared by the host, native modules and the module system.

use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::runner::diagnostics::{default_fatal_handler, FatalHandler};
use crate::runner::ds::error::{ErrorCode, JErrorType};
use crate::runner::ds::function_object::new_function_object;
use crate::runner::ds::object::{new_object, JsObjectType};
use crate::runner::ds::object_property::{PropertyDescriptor, PropertyKey};
use crate::runner::ds::value::JsValue;
use crate::runner::engine::{ScriptEngine, Transpiler};
use crate::runner::module::system::ModuleSystem;

/// Execution context passed to native functions and native module init
/// functions.
///
/// Everything a callback needs to get back to "its" engine lives here, so
/// several contexts can coexist in one process (tests do this all the time).
pub struct EvalContext {
    global: JsObjectType,
    engine: Option<Rc<dyn ScriptEngine>>,
    modules: Option<Rc<ModuleSystem>>,
    transpilers: HashMap<String, Rc<dyn Transpiler>>,
    fatal_handler: FatalHandler,
}

impl EvalContext {
    pub fn new() -> Self {
        EvalContext {
            global: new_object(),
            engine: None,
            modules: None,
            transpilers: HashMap::new(),
            fatal_handler: default_fatal_handler,
        }
    }

    pub fn with_engine(engine: Rc<dyn ScriptEngine>) -> Self {
        let mut ctx = Self::new();
        ctx.engine = Some(engine);
        ctx
    }

    pub fn global(&self) -> &JsObjectType {
        &self.global
    }

    pub fn get_binding(&self, name: &str) -> JsValue {
        self.global.borrow().base().get_data(&PropertyKey::from(name))
    }

    pub fn set_global(&mut self, name: &str, value: JsValue) {
        self.global
            .borrow_mut()
            .base_mut()
            .force_define_own_property(PropertyKey::from(name), PropertyDescriptor::new_non_enumerable(value));
    }

    pub fn set_engine(&mut self, engine: Rc<dyn ScriptEngine>) {
        self.engine = Some(engine);
    }

    pub fn engine(&self) -> Option<Rc<dyn ScriptEngine>> {
        self.engine.clone()
    }

    pub fn set_module_system(&mut self, modules: Rc<ModuleSystem>) {
        self.modules = Some(modules);
    }

    pub fn module_system(&self) -> Option<Rc<ModuleSystem>> {
        self.modules.clone()
    }

    /// Makes a transpiler available under a global name (for example
    /// `CoffeeScript`). Scripts see it as an object with a `compile` method.
    pub fn install_transpiler(&mut self, global_name: &str, transpiler: Rc<dyn Transpiler>) {
        let compiler = transpiler.clone();
        let compile = BuiltInFn::Plugin(Box::new(move |_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>| {
            let source = match args.first() {
                Some(JsValue::String(s)) => s.clone(),
                _ => return Err(JErrorType::TypeError("compile expects a source string".to_string())),
            };
            let filename = match args.get(1) {
                Some(JsValue::String(s)) => s.clone(),
                _ => "<anonymous>".to_string(),
            };
            compiler
                .compile(&source, &filename)
                .map(JsValue::String)
                .map_err(JErrorType::SyntaxError)
        }));
        let object = BuiltInObject::new(global_name)
            .add_property("name", JsValue::from(transpiler.name()))
            .add_closure("compile", compile)
            .into_object();
        self.set_global(global_name, JsValue::Object(object));
        self.transpilers.insert(global_name.to_string(), transpiler);
    }

    pub fn transpiler(&self, global_name: &str) -> Option<Rc<dyn Transpiler>> {
        self.transpilers.get(global_name).cloned()
    }

    pub fn set_fatal_handler(&mut self, handler: FatalHandler) {
        self.fatal_handler = handler;
    }

    /// Hands control to the fatal handler. Never returns.
    pub fn fatal(&self, code: ErrorCode, message: &str) -> ! {
        (self.fatal_handler)(code, message)
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Function signature for built-in methods.
/// Native functions receive the evaluation context, `this` value, and arguments.
pub type NativeFn = fn(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType>;

/// Built-in function - either a plain function pointer or a capturing closure.
pub enum BuiltInFn {
    /// Direct function pointer - zero overhead for compiled-in functions.
    Native(NativeFn),

    /// Closure-backed function - small vtable indirection cost.
    Plugin(Box<dyn Fn(&mut EvalContext, JsValue, Vec<JsValue>) -> Result<JsValue, JErrorType>>),
}

impl BuiltInFn {
    /// Execute this built-in function.
    pub fn call(
        &self,
        ctx: &mut EvalContext,
        this: JsValue,
        args: Vec<JsValue>,
    ) -> Result<JsValue, JErrorType> {
        match self {
            BuiltInFn::Native(f) => f(ctx, this, args),
            BuiltInFn::Plugin(f) => f(ctx, this, args),
        }
    }
}

/// Getter/setter pair for one tagged field.
pub type FieldGetter<T> = fn(ctx: &mut EvalContext, this: JsValue, field: T) -> Result<JsValue, JErrorType>;
pub type FieldSetter<T> =
    fn(ctx: &mut EvalContext, this: JsValue, field: T, value: JsValue) -> Result<(), JErrorType>;

/// Builder for a host object: a function list, a constant list and
/// accessors, materialized into a [`JsObjectType`].
///
/// This is what a native module's init function typically returns:
///
/// ```
/// use cepora::runner::plugin::types::{BuiltInObject, EvalContext};
/// use cepora::runner::ds::error::JErrorType;
/// use cepora::runner::ds::value::JsValue;
///
/// fn foo(_ctx: &mut EvalContext, _this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
///     Ok(JsValue::Undefined)
/// }
///
/// let exports = BuiltInObject::new("dummy")
///     .add_method("foo", foo)
///     .add_property("BAR", JsValue::from(-1i64))
///     .into_object();
/// assert_eq!(exports.borrow().base().len(), 2);
/// ```
pub struct BuiltInObject {
    /// Name of the object (e.g., "package", "dummy").
    pub name: String,

    /// Methods, installed non-enumerable, in insertion order.
    pub methods: IndexMap<String, BuiltInFn>,

    /// Constants, installed read-only and enumerable, in insertion order.
    pub properties: IndexMap<String, JsValue>,

    /// Accessor properties: name -> (getter, setter).
    pub accessors: IndexMap<String, (BuiltInFn, Option<BuiltInFn>)>,
}

impl BuiltInObject {
    /// Create a new built-in object with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        BuiltInObject {
            name: name.into(),
            methods: IndexMap::new(),
            properties: IndexMap::new(),
            accessors: IndexMap::new(),
        }
    }

    /// Add a native method.
    pub fn add_method(mut self, name: impl Into<String>, func: NativeFn) -> Self {
        self.methods.insert(name.into(), BuiltInFn::Native(func));
        self
    }

    /// Add a closure-backed method.
    pub fn add_closure(mut self, name: impl Into<String>, func: BuiltInFn) -> Self {
        self.methods.insert(name.into(), func);
        self
    }

    /// Add a property.
    pub fn add_property(mut self, name: impl Into<String>, value: JsValue) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    /// Bind a family of accessors that share one getter and one setter.
    ///
    /// Each field is identified by its tag value; the tag is captured by the
    /// accessor, so one handler serves every field without a numeric
    /// side channel.
    pub fn add_field_accessors<T: Copy + 'static>(
        mut self,
        fields: &[(&str, T)],
        getter: FieldGetter<T>,
        setter: Option<FieldSetter<T>>,
    ) -> Self {
        for (name, tag) in fields {
            let tag = *tag;
            let get = BuiltInFn::Plugin(Box::new(move |ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>| {
                getter(ctx, this, tag)
            }));
            let set = setter.map(|setter| {
                BuiltInFn::Plugin(Box::new(move |ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>| {
                    let value = args.into_iter().next().unwrap_or(JsValue::Undefined);
                    setter(ctx, this, tag, value).map(|_| JsValue::Undefined)
                }))
            });
            self.accessors.insert(name.to_string(), (get, set));
        }
        self
    }

    /// Materialize the object. Keys appear in the order they were added,
    /// constants first, then methods, then accessors.
    pub fn into_object(self) -> JsObjectType {
        let object = new_object();
        {
            let mut o = object.borrow_mut();
            let base = o.base_mut();
            for (name, value) in self.properties {
                base.force_define_own_property(PropertyKey::from(name), PropertyDescriptor::new_read_only(value));
            }
            for (name, func) in self.methods {
                let f = new_function_object(name.clone(), func);
                base.force_define_own_property(
                    PropertyKey::from(name),
                    PropertyDescriptor::new_non_enumerable(JsValue::Object(f)),
                );
            }
            for (name, (get, set)) in self.accessors {
                let getter = new_function_object(format!("get {}", name), get);
                let setter = set.map(|s| new_function_object(format!("set {}", name), s));
                base.force_define_own_property(
                    PropertyKey::from(name),
                    PropertyDescriptor::Accessor {
                        get: Some(getter),
                        set: setter,
                        enumerable: true,
                        configurable: false,
                    },
                );
            }
        }
        object
    }

    pub fn into_value(self) -> JsValue {
        JsValue::Object(self.into_object())
    }
}
