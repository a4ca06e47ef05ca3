//! Calls, closures and the Function prototype

use super::{array, call, call_err, eval, failure_message, num};
use jsinterp::{HostValue, JsValue};

#[test]
fn test_call() {
    let code = "
        function x() { return 2; }
        function y(a) { return x() + (a?a:0); }
        function z() { return y(3); }
    ";
    assert_eq!(call(code, "z", &[]), num(5.0));
    assert_eq!(call(code, "y", &[]), num(2.0));
}

#[test]
fn test_return_function() {
    let code = "function x() { return [1, function(){return 1}][1] }";
    assert!(matches!(call(code, "x", &[]), HostValue::Function { .. }));
}

#[test]
fn test_object_helper_in_full_code() {
    let code = "
        var helper = {
            rev: function(a) { a.reverse() },
            swap: function(a, b) { var c = a[0]; a[0] = a[b % a.length]; a[b % a.length] = c }
        };
        function sig(s) {
            var a = s.split('');
            helper.rev(a);
            helper.swap(a, 2);
            return a.join('');
        }
    ";
    assert_eq!(call(code, "sig", &[HostValue::from("abcde")]), HostValue::from("cdeba"));
}

#[test]
fn test_closures() {
    let source = "
        function counter() { var n = 0; return function() { n += 1; return n; }; }
        var a = counter(); var b = counter();
        a(); a();
        [a(), b()]
    ";
    assert_eq!(eval(source).to_string(), "3,1");
}

#[test]
fn test_arrow_functions() {
    assert_eq!(eval("[1, 2, 3].map(x => x * 2).join('')"), JsValue::from("246"));
    assert_eq!(eval("var add = (a, b) => { return a + b }; add(2, 3)"), JsValue::from(5));
}

#[test]
fn test_default_and_rest_parameters() {
    let code = "function x(a, b = 10, ...rest) { return [a, b, rest.length]; }";
    assert_eq!(call(code, "x", &[num(1.0)]), array([1, 10, 0]));
    assert_eq!(call(code, "x", &[num(1.0), num(2.0), num(3.0), num(4.0)]), array([1, 2, 2]));
}

#[test]
fn test_arguments_object() {
    let code = "function x() { return arguments.length + arguments[0]; }";
    assert_eq!(call(code, "x", &[num(40.0), num(0.0)]), num(42.0));
}

#[test]
fn test_call_apply_bind() {
    let source = "
        function who(greeting, mark) { return greeting + ' ' + this.name + mark; }
        var o = {name: 'js'};
        [who.call(o, 'hi', '!'), who.apply(o, ['yo', '?']), who.bind(o, 'hey')('.')].join('|')
    ";
    assert_eq!(eval(source), JsValue::from("hi js!|yo js?|hey js."));
}

#[test]
fn test_method_this() {
    assert_eq!(eval("var o = {v: 7, get: function() { return this.v; }}; o.get()"), JsValue::from(7));
}

#[test]
fn test_recursion() {
    let code = "function fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); }";
    assert_eq!(call(code, "fib", &[num(15.0)]), num(610.0));
}

#[test]
fn test_named_function_expression() {
    assert_eq!(eval("var f = function fact(n) { return n ? n * fact(n - 1) : 1; }; f(5)"), JsValue::from(120));
}

#[test]
fn test_calling_non_function_fails() {
    let err = call_err("function x() { var o = {}; return o.nope(); }", "x", &[]);
    assert!(failure_message(&err).contains("TypeError"));
}

#[test]
fn test_constructor_function() {
    let source = "function Point(x, y) { this.x = x; this.y = y; } var p = new Point(3, 4); p.x * p.y";
    assert_eq!(eval(source), JsValue::from(12));
}

#[test]
fn test_function_constructor() {
    assert_eq!(eval("new Function('a', 'b', 'return a * b')(6, 7)"), JsValue::from(42));
    assert_eq!(eval("new Function('a, b = 2', 'return a * b')(21)"), JsValue::from(42));
}

#[test]
fn test_missing_arguments_are_undefined() {
    let code = "function f(a, b) { return b === undefined; }";
    assert_eq!(call(code, "f", &[num(1.0)]), HostValue::Boolean(true));
}

#[test]
fn test_default_referring_to_earlier_parameter() {
    let code = "function f(a, b = a * 2, c = [a, b].length) { return a + b + c; }";
    assert_eq!(call(code, "f", &[num(1.0)]), num(5.0));
}
