//! Locating functions in a script and resolving their free names

use super::{call, call_err, failure_message, num};
use jsinterp::{Dispatcher, HostValue, Interpreter, JsError, JsInterpreter, JsValue, JsiContext};

#[test]
fn test_extract_function_code() {
    let source = "var a = 1; function add(x, y) { if (x) { return x + y; } return y; } var b = 2;";
    let (code, params) = Interpreter::extract_function_code("add", source).unwrap();
    assert_eq!(code.trim(), "if (x) { return x + y; } return y;");
    assert_eq!(params, ["x", "y"]);
}

#[test]
fn test_extract_assigned_function() {
    let source = "var helper;helper=function(a){return a*2};";
    let (code, params) = Interpreter::extract_function_code("helper", source).unwrap();
    assert_eq!(code, "return a*2");
    assert_eq!(params, ["a"]);
}

#[test]
fn test_braces_inside_strings_and_regexps() {
    let code = r#"function x() { var s = "}"; var r = /\}/; return s + '{' + r.source; }"#;
    assert_eq!(call(code, "x", &[]), HostValue::from(r"}{\}"));
}

#[test]
fn test_dispatcher_extract_is_memoized() {
    let dispatcher = Dispatcher::from_context(JsiContext::default());
    let source = "function f(a, b) { return a - b }";
    let first = dispatcher.extract_function_code("f", source).unwrap();
    let second = dispatcher.extract_function_code("f", source).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.params, ["a", "b"]);
}

#[test]
fn test_missing_function() {
    let err = call_err("function y() {}", "x", &[]);
    assert!(failure_message(&err).contains("Could not find JS function \"x\""));
}

#[test]
fn test_free_names_resolve_lazily() {
    let code = "
        var SCALE = 3;
        var table = {twice: function(v) { return v * 2; }};
        function unused() { return missing_name; }
        function f(x) { return table.twice(x) * SCALE; }
    ";
    assert_eq!(call(code, "f", &[num(7.0)]), num(42.0));
}

#[test]
fn test_mutually_recursive_helpers() {
    let code = "
        function even(n) { return n == 0 ? true : odd(n - 1); }
        function odd(n) { return n == 0 ? false : even(n - 1); }
    ";
    assert_eq!(call(code, "even", &[num(10.0)]), HostValue::Boolean(true));
    assert_eq!(call(code, "odd", &[num(7.0)]), HostValue::Boolean(true));
}

#[test]
fn test_unresolvable_name_is_reference_error() {
    let err = call_err("function f() { return nothing_here + 1; }", "f", &[]);
    assert!(failure_message(&err).contains("ReferenceError: nothing_here is not defined"));
}

#[test]
fn test_js_interpreter_call_function() {
    let mut interp = JsInterpreter::new("function greet(n) { return prefix + n; }")
        .with_objects([("prefix", JsValue::from("hello "))]);
    assert_eq!(
        interp.call_function("greet", &[JsValue::from("world")]).unwrap(),
        JsValue::from("hello world")
    );
    assert!(interp.code().contains("greet"));
}

#[test]
fn test_js_interpreter_objects_are_read_only() {
    let mut interp = JsInterpreter::new("function bump() { counter = counter + 1; return counter; }")
        .with_objects([("counter", JsValue::from(1))]);
    assert!(matches!(interp.call_function("bump", &[]), Err(JsError::Usage(_))));
}

#[test]
fn test_js_interpreter_extract_function_from_code() {
    let mut interp = JsInterpreter::new("function sq(v) { return v * v; }");
    let function = interp.extract_function_code("sq").unwrap();
    assert_eq!(function.params, ["v"]);
    let sq = interp.extract_function_from_code(&function).unwrap();
    let result = interp
        .interpreter()
        .call_function(&sq, JsValue::Undefined, &[JsValue::from(9)])
        .unwrap();
    assert_eq!(result, JsValue::from(81));
}
