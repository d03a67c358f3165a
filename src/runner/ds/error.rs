//! Host error values and the causal chain between them.
//!
//! Engine-level failures keep the classic `JErrorType` variants. Module
//! system failures are [`ChainedError`]s: immutable, coded, and optionally
//! linked to the error that caused them. A cause is shared through an `Rc`,
//! never moved, and a chained error can only point at an error that already
//! existed when it was built, so a chain cannot loop back on itself.

use std::fmt;
use std::rc::Rc;

use crate::runner::ds::value::JsValue;

/// Numeric error code carried by every error. Valid range is `1..=0xFF_FFFF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(u32);

impl ErrorCode {
    pub const MAX: u32 = 0xFF_FFFF;

    pub const COMPILE: ErrorCode = ErrorCode(1);
    pub const RESOLUTION: ErrorCode = ErrorCode(2);
    pub const LIBRARY_LOAD: ErrorCode = ErrorCode(3);
    pub const SYMBOL_LOAD: ErrorCode = ErrorCode(4);
    pub const NATIVE_INIT: ErrorCode = ErrorCode(5);
    pub const FATAL: ErrorCode = ErrorCode(6);

    pub const ERROR: ErrorCode = ErrorCode(100);
    pub const RANGE_ERROR: ErrorCode = ErrorCode(102);
    pub const REFERENCE_ERROR: ErrorCode = ErrorCode(103);
    pub const SYNTAX_ERROR: ErrorCode = ErrorCode(104);
    pub const TYPE_ERROR: ErrorCode = ErrorCode(105);

    pub fn new(code: u32) -> Option<Self> {
        if code >= 1 && code <= Self::MAX {
            Some(ErrorCode(code))
        } else {
            None
        }
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The stage of module loading that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Resolution,
    Compile,
    LibraryLoad,
    SymbolLoad,
    NativeInit,
    Fatal,
}

impl ErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Resolution => "ResolutionError",
            ErrorKind::Compile => "CompileError",
            ErrorKind::LibraryLoad => "LibraryLoadError",
            ErrorKind::SymbolLoad => "SymbolLoadError",
            ErrorKind::NativeInit => "NativeInitError",
            ErrorKind::Fatal => "FatalEngineError",
        }
    }

    pub fn default_code(self) -> ErrorCode {
        match self {
            ErrorKind::Resolution => ErrorCode::RESOLUTION,
            ErrorKind::Compile => ErrorCode::COMPILE,
            ErrorKind::LibraryLoad => ErrorCode::LIBRARY_LOAD,
            ErrorKind::SymbolLoad => ErrorCode::SYMBOL_LOAD,
            ErrorKind::NativeInit => ErrorCode::NATIVE_INIT,
            ErrorKind::Fatal => ErrorCode::FATAL,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub struct ChainedError {
    kind: ErrorKind,
    code: ErrorCode,
    message: String,
    cause: Option<JErrorType>,
}

impl ChainedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ChainedError {
            kind,
            code: kind.default_code(),
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = code;
        self
    }

    pub fn with_cause(mut self, cause: &JErrorType) -> Self {
        self.cause = Some(cause.clone());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&JErrorType> {
        self.cause.as_ref()
    }
}

impl fmt::Debug for ChainedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainedError")
            .field("kind", &self.kind)
            .field("code", &self.code)
            .field("message", &self.message)
            .field("cause", &self.cause)
            .finish()
    }
}

#[derive(Clone)]
pub enum JErrorType {
    ReferenceError(String),
    TypeError(String),
    RangeError(String),
    SyntaxError(String),
    /// Any value raised by script or native code, kept exactly as thrown.
    Thrown(JsValue),
    Chained(Rc<ChainedError>),
}
impl JErrorType {
    pub fn chained(kind: ErrorKind, message: impl Into<String>) -> Self {
        JErrorType::Chained(Rc::new(ChainedError::new(kind, message)))
    }

    pub fn chained_with_cause(kind: ErrorKind, message: impl Into<String>, cause: &JErrorType) -> Self {
        JErrorType::Chained(Rc::new(ChainedError::new(kind, message).with_cause(cause)))
    }

    pub fn name(&self) -> String {
        match self {
            JErrorType::ReferenceError(_) => "ReferenceError".to_string(),
            JErrorType::TypeError(_) => "TypeError".to_string(),
            JErrorType::RangeError(_) => "RangeError".to_string(),
            JErrorType::SyntaxError(_) => "SyntaxError".to_string(),
            JErrorType::Thrown(v) => match v {
                JsValue::Object(o) => o
                    .borrow()
                    .base()
                    .get_string("name")
                    .unwrap_or_else(|| "Error".to_string()),
                _ => "Error".to_string(),
            },
            JErrorType::Chained(c) => c.kind.name().to_string(),
        }
    }

    pub fn message(&self) -> String {
        match self {
            JErrorType::ReferenceError(m)
            | JErrorType::TypeError(m)
            | JErrorType::RangeError(m)
            | JErrorType::SyntaxError(m) => m.clone(),
            JErrorType::Thrown(v) => match v {
                JsValue::Object(o) if v.is_error() => {
                    o.borrow().base().get_string("message").unwrap_or_default()
                }
                _ => v.to_display_string(),
            },
            JErrorType::Chained(c) => c.message.clone(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            JErrorType::ReferenceError(_) => ErrorCode::REFERENCE_ERROR,
            JErrorType::TypeError(_) => ErrorCode::TYPE_ERROR,
            JErrorType::RangeError(_) => ErrorCode::RANGE_ERROR,
            JErrorType::SyntaxError(_) => ErrorCode::SYNTAX_ERROR,
            JErrorType::Thrown(_) => ErrorCode::ERROR,
            JErrorType::Chained(c) => c.code,
        }
    }

    /// The module-loading stage this error reports, if it is a chained error.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            JErrorType::Chained(c) => Some(c.kind),
            _ => None,
        }
    }

    pub fn cause(&self) -> Option<&JErrorType> {
        match self {
            JErrorType::Chained(c) => c.cause(),
            _ => None,
        }
    }

    pub fn to_string(&self) -> String {
        match self {
            JErrorType::ReferenceError(m) => format!("Uncaught reference error: {}.", m),
            JErrorType::TypeError(m) => format!("Uncaught type error: {}.", m),
            JErrorType::RangeError(m) => format!("Uncaught range error: {}.", m),
            JErrorType::SyntaxError(m) => format!("Uncaught syntax error: {}.", m),
            JErrorType::Thrown(v) => format!("Uncaught {}", v.to_display_string()),
            JErrorType::Chained(c) => format!("{}: {}", c.kind, c.message),
        }
    }
}

impl fmt::Debug for JErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JErrorType::ReferenceError(m) => write!(f, "ReferenceError({:?})", m),
            JErrorType::TypeError(m) => write!(f, "TypeError({:?})", m),
            JErrorType::RangeError(m) => write!(f, "RangeError({:?})", m),
            JErrorType::SyntaxError(m) => write!(f, "SyntaxError({:?})", m),
            JErrorType::Thrown(v) => write!(f, "Thrown({:?})", v),
            JErrorType::Chained(c) => write!(f, "{:?}", c),
        }
    }
}

impl fmt::Display for JErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string())
    }
}

impl std::error::Error for JErrorType {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_range() {
        assert!(ErrorCode::new(0).is_none());
        assert_eq!(ErrorCode::new(1), Some(ErrorCode::COMPILE));
        assert!(ErrorCode::new(0xFF_FFFF).is_some());
        assert!(ErrorCode::new(0x100_0000).is_none());
    }

    #[test]
    fn test_chained_cause_is_shared() {
        let root = JErrorType::chained(ErrorKind::Resolution, "cannot find module 'x'");
        let top = JErrorType::chained_with_cause(ErrorKind::Compile, "cannot compile 'x'", &root);
        match (top.cause(), &root) {
            (Some(JErrorType::Chained(a)), JErrorType::Chained(b)) => assert!(Rc::ptr_eq(a, b)),
            _ => panic!("cause not attached"),
        }
        assert_eq!(top.code(), ErrorCode::COMPILE);
        assert_eq!(top.name(), "CompileError");
        assert_eq!(top.to_string(), "CompileError: cannot compile 'x'");
    }

    #[test]
    fn test_thrown_string_message() {
        let e = JErrorType::Thrown(JsValue::from("boom"));
        assert_eq!(e.message(), "boom");
        assert_eq!(e.name(), "Error");
        assert!(e.cause().is_none());
    }
}
