//! Causal chains: raising, converting to script values and printing.

extern crate cepora;

use cepora::runner::diagnostics::{raise_chained, render_trace, write_trace, CAUSED_BY, MAX_TRACE_DEPTH};
use cepora::runner::ds::error::{ErrorCode, ErrorKind, JErrorType};
use cepora::runner::ds::object_property::PropertyKey;
use cepora::runner::ds::value::JsValue;
use cepora::runner::plugin::types::EvalContext;
use cepora::runner::std_lib::error::{error_code_of, new_error_object, set_cause};

fn two_level_chain() -> JErrorType {
    let root = new_error_object("Error", "EACCES: permission denied", ErrorCode::ERROR);
    let read: Result<(), JErrorType> = raise_chained(
        &JErrorType::Thrown(JsValue::Object(root)),
        ErrorKind::Resolution,
        ErrorCode::RESOLUTION,
        "cannot read module file 'util.coffee'",
    );
    let compile: Result<(), JErrorType> = raise_chained(
        &read.unwrap_err(),
        ErrorKind::Compile,
        ErrorCode::COMPILE,
        "cannot compile 'util.coffee'",
    );
    compile.unwrap_err()
}

#[test]
fn test_two_causes_print_three_blocks_in_order() {
    let lines = render_trace(&two_level_chain());
    assert_eq!(
        lines,
        vec![
            "CompileError [1]: cannot compile 'util.coffee'".to_string(),
            CAUSED_BY.to_string(),
            "ResolutionError [2]: cannot read module file 'util.coffee'".to_string(),
            CAUSED_BY.to_string(),
            "Error: EACCES: permission denied".to_string(),
        ]
    );
}

#[test]
fn test_script_view_of_chain_prints_the_same_messages() {
    let value = two_level_chain().to_js_value();
    assert_eq!(error_code_of(&value), Some(ErrorCode::COMPILE));
    let lines = render_trace(&JErrorType::Thrown(value));
    assert_eq!(lines.iter().filter(|l| l.as_str() == CAUSED_BY).count(), 2);
    assert_eq!(lines[0], "CompileError: cannot compile 'util.coffee'");
    assert_eq!(lines[2], "ResolutionError: cannot read module file 'util.coffee'");
    assert_eq!(lines[4], "Error: EACCES: permission denied");
}

#[test]
fn test_custom_code_is_kept() {
    let cause = JErrorType::TypeError("bad".to_string());
    let code = ErrorCode::new(4242).unwrap();
    let err = raise_chained::<()>(&cause, ErrorKind::NativeInit, code, "wrapped").unwrap_err();
    assert_eq!(err.code(), code);
    let value = err.to_js_value();
    let cause_value = value.as_object().unwrap().borrow().base().get_data(&PropertyKey::from("cause"));
    assert_eq!(error_code_of(&cause_value), Some(ErrorCode::TYPE_ERROR));
}

#[test]
fn test_mutual_cause_loop_terminates() {
    let a = new_error_object("Error", "a", ErrorCode::ERROR);
    let b = new_error_object("Error", "b", ErrorCode::ERROR);
    set_cause(&a, JsValue::Object(b.clone()));
    set_cause(&b, JsValue::Object(a.clone()));
    let lines = render_trace(&JErrorType::Thrown(JsValue::Object(a)));
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], "Error: a");
    assert_eq!(lines[2], "Error: b");
    assert!(lines[4].starts_with("[circular cause"));
}

#[test]
fn test_long_chain_is_bounded() {
    let mut err = JErrorType::chained(ErrorKind::Resolution, "root");
    for i in 0..(MAX_TRACE_DEPTH * 2) {
        err = JErrorType::chained_with_cause(ErrorKind::Compile, format!("level {}", i), &err);
    }
    let lines = render_trace(&err);
    let blocks = lines.iter().filter(|l| l.as_str() != CAUSED_BY).count();
    assert_eq!(blocks, MAX_TRACE_DEPTH + 2);
    assert!(lines.last().unwrap().contains("longer than"));
}

#[test]
fn test_non_error_values_print_as_strings() {
    let err = JErrorType::chained_with_cause(ErrorKind::NativeInit, "init failed", &JErrorType::Thrown(JsValue::from(17i64)));
    let mut out = Vec::new();
    write_trace(&mut out, &err).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "NativeInitError [5]: init failed\nCaused by:\n17\n"
    );
}

fn panicking_fatal(code: ErrorCode, message: &str) -> ! {
    panic!("fatal {}: {}", code, message)
}

#[test]
#[should_panic(expected = "fatal 6: heap exhausted")]
fn test_fatal_goes_to_installed_handler() {
    let mut ctx = EvalContext::new();
    ctx.set_fatal_handler(panicking_fatal);
    ctx.fatal(ErrorCode::FATAL, "heap exhausted");
}
