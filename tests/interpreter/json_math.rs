//! JSON, Math, Number and the global conversion functions

use super::{call, eval, eval_err, is_nan, num};
use jsinterp::{HostValue, JsError, JsValue};

#[test]
fn test_json_stringify() {
    assert_eq!(
        eval("JSON.stringify({a: 1, b: [true, null, undefined], c: 'x', d: undefined, e: 1.5})"),
        JsValue::from("{\"a\":1,\"b\":[true,null,null],\"c\":\"x\",\"e\":1.5}")
    );
    assert_eq!(eval("JSON.stringify([NaN, -0, Infinity])"), JsValue::from("[null,0,null]"));
    assert_eq!(eval("JSON.stringify(undefined)"), JsValue::Undefined);
    assert_eq!(eval("JSON.stringify({a: [1]}, null, 2)"), JsValue::from("{\n  \"a\": [\n    1\n  ]\n}"));
}

#[test]
fn test_json_parse() {
    assert_eq!(eval("var o = JSON.parse('{\"k\": [1, 2, {\"n\": null}]}'); o.k[1] + o.k.length"), JsValue::from(5));
    assert!(matches!(eval_err("JSON.parse('{bad')"), JsError::SyntaxError { .. }));
}

#[test]
fn test_json_cycle_is_rejected() {
    assert_eq!(
        eval("var a = []; a.push(a); var r; try { JSON.stringify(a); } catch (e) { r = e.name; } r"),
        JsValue::from("TypeError")
    );
}

#[test]
fn test_math() {
    assert_eq!(
        eval("[Math.floor(-1.5), Math.ceil(1.2), Math.round(2.5), Math.round(-2.5), Math.trunc(-4.7), Math.abs(-3)].join(' ')"),
        JsValue::from("-2 2 3 -2 -4 3")
    );
    assert_eq!(eval("[Math.max(1, 7, 3), Math.min(4, -2), Math.pow(2, 10), Math.sqrt(81)].join(' ')"), JsValue::from("7 -2 1024 9"));
    assert!(is_nan(&call("function x() { return Math.max(1, 'a'); }", "x", &[])));
    assert_eq!(eval("Math.max()"), JsValue::Number(f64::NEG_INFINITY));
}

#[test]
fn test_math_random_range() {
    assert_eq!(
        eval("var ok = true; for (var i = 0; i < 100; i++) { var r = Math.random(); ok = ok && r >= 0 && r < 1; } ok"),
        JsValue::Boolean(true)
    );
}

#[test]
fn test_parse_int_and_float() {
    assert_eq!(
        eval("[parseInt('42px'), parseInt('ff', 16), parseInt('  -7'), parseFloat('3.25abc'), parseFloat('.5')].join(' ')"),
        JsValue::from("42 255 -7 3.25 0.5")
    );
    assert!(is_nan(&call("function x() { return parseInt('px'); }", "x", &[])));
}

#[test]
fn test_number_formatting() {
    assert_eq!(
        eval("[(255).toString(16), (5).toString(2), (3.14159).toFixed(2), String(0.1 + 0.2), String(1e21), String(-0)].join(' ')"),
        JsValue::from("ff 101 3.14 0.30000000000000004 1e+21 0")
    );
}

#[test]
fn test_number_predicates() {
    assert_eq!(
        eval("[Number.isInteger(5), Number.isInteger(5.5), isNaN('x'), Number.isNaN('x'), isFinite('12')].join(' ')"),
        JsValue::from("true false true false true")
    );
    assert_eq!(eval("Number('  12  ') + Number('')"), JsValue::from(12));
}

#[test]
fn test_numbers_cross_the_host_boundary() {
    let code = "function x(a, b) { return a / b; }";
    assert_eq!(call(code, "x", &[num(1.0), num(4.0)]), num(0.25));
    assert_eq!(call(code, "x", &[num(1.0), num(0.0)]), num(f64::INFINITY));
    assert_eq!(call("function x(s) { return +s; }", "x", &[HostValue::from("0x10")]), num(16.0));
}
