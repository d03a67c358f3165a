//! Shared fakes for the module tests: a counting library loader, a tiny
//! line-oriented script engine, and a CoffeeScript stand-in.
#![allow(dead_code)]

extern crate cepora;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use cepora::runner::ds::error::JErrorType;
use cepora::runner::ds::object::JsObjectType;
use cepora::runner::ds::object_property::PropertyKey;
use cepora::runner::ds::value::JsValue;
use cepora::runner::engine::{ModuleRecord, ScriptEngine, Transpiler};
use cepora::runner::module::library::{LibraryLoader, NativeInitFn, NativeLibrary};
use cepora::runner::module::{ModuleDispatcher, SearchPathList};
use cepora::runner::plugin::types::EvalContext;
use tempfile::TempDir;

/// Open/close counters shared between a [`FakeLoader`] and the test.
#[derive(Default)]
pub struct LoaderStats {
    pub opened: Cell<usize>,
    pub closed: Cell<usize>,
}

/// Serves libraries by file name from an in-memory table.
pub struct FakeLoader {
    libraries: HashMap<String, Option<(String, NativeInitFn)>>,
    pub stats: Rc<LoaderStats>,
}

impl FakeLoader {
    pub fn new() -> Self {
        FakeLoader {
            libraries: HashMap::new(),
            stats: Rc::new(LoaderStats::default()),
        }
    }

    pub fn with_library(mut self, file_name: &str, symbol: &str, init: NativeInitFn) -> Self {
        self.libraries
            .insert(file_name.to_string(), Some((symbol.to_string(), init)));
        self
    }

    /// A library that opens fine but exports nothing.
    pub fn with_empty_library(mut self, file_name: &str) -> Self {
        self.libraries.insert(file_name.to_string(), None);
        self
    }
}

struct FakeLibrary {
    symbol: Option<(String, NativeInitFn)>,
    stats: Rc<LoaderStats>,
}

impl NativeLibrary for FakeLibrary {
    fn init_symbol(&self, name: &str) -> Result<NativeInitFn, String> {
        match &self.symbol {
            Some((symbol, init)) if symbol == name => Ok(*init),
            _ => Err(format!("undefined symbol: {}", name)),
        }
    }

    fn close(self: Box<Self>) -> Result<(), String> {
        self.stats.closed.set(self.stats.closed.get() + 1);
        Ok(())
    }
}

impl LibraryLoader for FakeLoader {
    fn open(&self, path: &Path) -> Result<Box<dyn NativeLibrary>, String> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        match self.libraries.get(name) {
            Some(symbol) => {
                self.stats.opened.set(self.stats.opened.get() + 1);
                Ok(Box::new(FakeLibrary {
                    symbol: symbol.clone(),
                    stats: self.stats.clone(),
                }))
            }
            None => Err(format!("{}: wrong ELF class: ELFCLASS32", path.display())),
        }
    }
}

/// Understands three statements, one per line:
///
/// ```text
/// export <name> <word>
/// require <id> as <name>
/// throw <message...>
/// ```
///
/// Everything else is ignored. Every evaluation is recorded.
#[derive(Default)]
pub struct ScriptedEngine {
    pub evaluated: RefCell<Vec<(String, String)>>,
}

impl ScriptedEngine {
    pub fn new() -> Rc<Self> {
        Rc::new(ScriptedEngine::default())
    }

    pub fn evaluations_of(&self, id: &str) -> usize {
        self.evaluated.borrow().iter().filter(|(i, _)| i == id).count()
    }

    fn run(&self, ctx: &mut EvalContext, exports: &JsObjectType, source: &str) -> Result<(), JErrorType> {
        for line in source.lines() {
            let words: Vec<&str> = line.split_whitespace().collect();
            match words.as_slice() {
                ["export", name, value] => {
                    exports
                        .borrow_mut()
                        .base_mut()
                        .put(PropertyKey::from(*name), JsValue::from(*value));
                }
                ["require", id, "as", name] => {
                    let modules = ctx
                        .module_system()
                        .ok_or_else(|| JErrorType::ReferenceError("require".to_string()))?;
                    let module = modules.require(ctx, id)?;
                    exports
                        .borrow_mut()
                        .base_mut()
                        .put(PropertyKey::from(*name), JsValue::Object(module));
                }
                ["throw", message @ ..] => return Err(JErrorType::Thrown(JsValue::from(message.join(" ")))),
                _ => {}
            }
        }
        Ok(())
    }
}

impl ScriptEngine for ScriptedEngine {
    fn eval(&self, _ctx: &mut EvalContext, source: &str, filename: &str) -> Result<JsValue, JErrorType> {
        self.evaluated
            .borrow_mut()
            .push((filename.to_string(), source.to_string()));
        Ok(JsValue::from(source))
    }

    fn eval_module(&self, ctx: &mut EvalContext, module: &ModuleRecord<'_>, source: &str) -> Result<(), JErrorType> {
        self.evaluated
            .borrow_mut()
            .push((module.id.to_string(), source.to_string()));
        self.run(ctx, module.exports, source)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Prefixes a marker line; rejects any source containing `@@`.
pub struct FakeCoffee;

pub const COMPILED_MARKER: &str = "// generated by fake coffee";

impl Transpiler for FakeCoffee {
    fn compile(&self, source: &str, filename: &str) -> Result<String, String> {
        if source.contains("@@") {
            Err(format!("{}:1:1: error: unexpected @@", filename))
        } else {
            Ok(format!("{}\n{}", COMPILED_MARKER, source))
        }
    }

    fn name(&self) -> &str {
        "fake-coffee"
    }
}

/// A temporary search directory.
pub struct Scratch {
    pub dir: TempDir,
}

impl Scratch {
    pub fn new() -> Self {
        Scratch {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    pub fn paths(&self) -> SearchPathList {
        SearchPathList::new(vec![self.dir.path().to_path_buf()]).unwrap()
    }

    /// Dispatcher over this directory using `loader` and `so` as the native extension.
    pub fn dispatcher(&self, loader: FakeLoader) -> ModuleDispatcher {
        ModuleDispatcher::new(self.paths())
            .with_native_extension("so")
            .with_loader(Box::new(loader))
    }
}

pub fn key(name: &str) -> PropertyKey {
    PropertyKey::from(name)
}

pub fn get_prop(obj: &JsObjectType, name: &str) -> JsValue {
    obj.borrow().base().get_data(&key(name))
}
