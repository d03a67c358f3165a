//! Raising chained errors and printing causal chains.

use std::io::{self, Write};
use std::rc::Rc;

use crate::runner::ds::error::{ChainedError, ErrorCode, ErrorKind, JErrorType};
use crate::runner::ds::object::{JsObjectType, ObjectType};
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::value::JsValue;

/// Longest cause chain printed before the trace is cut short.
pub const MAX_TRACE_DEPTH: usize = 32;

pub const CAUSED_BY: &str = "Caused by:";

/// Called when the engine cannot continue. Must not return.
pub type FatalHandler = fn(code: ErrorCode, message: &str) -> !;

/// Logs the failure and exits the process with status 1.
pub fn default_fatal_handler(code: ErrorCode, message: &str) -> ! {
    error!("FATAL {}: {}", code, message);
    std::process::exit(1)
}

/// Builds an error of `kind` with `code` and `message` whose cause is
/// `cause`, and returns it as the error of a `Result`.
///
/// ```
/// use cepora::runner::diagnostics::raise_chained;
/// use cepora::runner::ds::error::{ErrorCode, ErrorKind, JErrorType};
///
/// let io = JErrorType::chained(ErrorKind::Resolution, "cannot read module file 'a.coffee'");
/// let r: Result<(), JErrorType> = raise_chained(&io, ErrorKind::Compile, ErrorCode::COMPILE, "cannot compile 'a.coffee'");
/// assert!(r.unwrap_err().cause().is_some());
/// ```
pub fn raise_chained<T>(
    cause: &JErrorType,
    kind: ErrorKind,
    code: ErrorCode,
    message: impl Into<String>,
) -> Result<T, JErrorType> {
    Err(JErrorType::Chained(Rc::new(
        ChainedError::new(kind, message).with_code(code).with_cause(cause),
    )))
}

enum Link<'a> {
    Host(&'a JErrorType),
    Script(JsValue),
}

fn link_of(err: &JErrorType) -> Link<'_> {
    match err {
        JErrorType::Thrown(v) => Link::Script(v.clone()),
        other => Link::Host(other),
    }
}

fn host_block(err: &JErrorType) -> String {
    match err {
        JErrorType::Chained(c) => format!("{} [{}]: {}", c.kind(), c.code(), c.message()),
        other => format!("{}: {}", other.name(), other.message()),
    }
}

/// The text of one script value, and its cause when it is an Error object.
fn script_block(value: &JsValue) -> (String, Option<JsValue>) {
    match value {
        JsValue::Object(o) => {
            let obj = o.borrow();
            match &*obj {
                ObjectType::Error(base) => {
                    let text = base.get_string("stack").unwrap_or_else(|| obj.to_display_string());
                    let cause = base.get_data(&PropertyKey::from("cause"));
                    (text, if cause.is_undefined() { None } else { Some(cause) })
                }
                _ => (obj.to_display_string(), None),
            }
        }
        other => (other.to_display_string(), None),
    }
}

/// The causal chain of `err`, one string per block: the error itself, then
/// `Caused by:` followed by each cause in turn.
///
/// Stops after [`MAX_TRACE_DEPTH`] causes, or when an Error object shows up
/// a second time.
pub fn render_trace(err: &JErrorType) -> Vec<String> {
    let mut lines = Vec::new();
    let mut seen: Vec<JsObjectType> = Vec::new();
    let mut next = Some(link_of(err));
    let mut depth = 0;
    while let Some(link) = next.take() {
        if depth > 0 {
            lines.push(CAUSED_BY.to_string());
        }
        if depth > MAX_TRACE_DEPTH {
            lines.push(format!("... cause chain longer than {} entries", MAX_TRACE_DEPTH));
            break;
        }
        depth += 1;
        match link {
            Link::Host(e) => {
                lines.push(host_block(e));
                next = e.cause().map(link_of);
            }
            Link::Script(value) => {
                if let JsValue::Object(o) = &value {
                    if seen.iter().any(|s| Rc::ptr_eq(s, o)) {
                        lines.push(format!("[circular cause: {}]", value.to_display_string()));
                        break;
                    }
                    seen.push(o.clone());
                }
                let (text, cause) = script_block(&value);
                lines.push(text);
                next = cause.map(Link::Script);
            }
        }
    }
    lines
}

pub fn write_trace<W: Write>(out: &mut W, err: &JErrorType) -> io::Result<()> {
    for line in render_trace(err) {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

/// Logs the causal chain of `err` at error level.
pub fn dump_trace(err: &JErrorType) {
    for line in render_trace(err) {
        error!("{}", line);
    }
}
