//! Object literals, member access and the Object built-ins

use super::{array, call, eval, num};
use indexmap::IndexMap;
use jsinterp::{HostValue, JsValue};

#[test]
fn test_object() {
    assert_eq!(call("function x() { return {}; }", "x", &[]), HostValue::Object(IndexMap::new()));
    assert_eq!(
        call("function x() { let a = {m1: 42, m2: 0 }; return [a[\"m1\"], a.m2]; }", "x", &[]),
        array([42, 0])
    );
    assert_eq!(call("function x() { let a; return a?.qq; }", "x", &[]), HostValue::Undefined);
    assert_eq!(
        call("function x() { let a = {m1: 42, m2: 0 }; return a?.qq; }", "x", &[]),
        HostValue::Undefined
    );
}

#[test]
fn test_object_round_trip_keeps_key_order() {
    let HostValue::Object(entries) = call("function x() { return {z: 1, a: [true], m: null}; }", "x", &[]) else {
        panic!("expected an object");
    };
    assert_eq!(entries.keys().map(String::as_str).collect::<Vec<_>>(), ["z", "a", "m"]);
    assert_eq!(entries.get("a"), Some(&array([true])));
    assert_eq!(entries.get("m"), Some(&HostValue::Null));
}

#[test]
fn test_object_argument() {
    let mut arg = IndexMap::new();
    arg.insert("n".to_string(), num(20.0));
    let code = "function x(o) { o.n += 1; return o.n * 2; }";
    assert_eq!(call(code, "x", &[HostValue::Object(arg)]), num(42.0));
}

#[test]
fn test_computed_and_quoted_keys() {
    assert_eq!(eval("var k = 'dyn'; var o = {[k + 1]: 5, 'a b': 6}; o.dyn1 + o['a b']"), JsValue::from(11));
}

#[test]
fn test_object_spread() {
    assert_eq!(eval("var a = {x: 1, y: 2}; var b = {...a, y: 3}; b.x + b.y"), JsValue::from(4));
}

#[test]
fn test_object_builtins() {
    let source = "
        var o = {a: 1, b: 2};
        [
            Object.keys(o).join(''),
            Object.values(o).join(''),
            Object.entries(o).map(function(e) { return e.join('='); }).join('&'),
            Object.assign({}, o, {c: 3}).c,
            Object.fromEntries([['k', 'v']]).k,
            o.hasOwnProperty('a'),
            o.hasOwnProperty('z')
        ].join(' ')
    ";
    assert_eq!(eval(source), JsValue::from("ab 12 a=1&b=2 3 v true false"));
}

#[test]
fn test_delete_property() {
    assert_eq!(eval("var o = {a: 1, b: 2}; delete o.a; Object.keys(o).join('')"), JsValue::from("b"));
}

#[test]
fn test_missing_property_is_undefined() {
    assert_eq!(eval("var o = {}; o.missing"), JsValue::Undefined);
}

#[test]
fn test_reading_from_null_throws() {
    assert_eq!(
        eval("var r; try { var n = null; n.x; } catch (e) { r = e instanceof Error && e.name == 'TypeError'; } r"),
        JsValue::Boolean(true)
    );
}

#[test]
fn test_method_shorthand() {
    assert_eq!(eval("var o = {n: 2, twice(x) { return x * this.n }}; o.twice(21)"), JsValue::from(42));
    let code = "function x(a) { var h = {inc(v) { return v + 1 }}; return h.inc(a); }";
    assert_eq!(call(code, "x", &[num(41.0)]), num(42.0));
}
