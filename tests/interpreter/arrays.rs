//! Array literals and Array.prototype

use super::{array, call, eval, eval_err, num};
use jsinterp::{HostValue, JsError, JsValue};

#[test]
fn test_literal_list() {
    assert_eq!(call("function x() { return [1, 2, \"asdf\", [5, 6, 7]][3] }", "x", &[]), array([5, 6, 7]));
}

#[test]
fn test_nested_arrays() {
    assert_eq!(
        call("function x() { return [[1, 2], [], [3]]; }", "x", &[]),
        HostValue::Array(vec![array([1, 2]), HostValue::Array(Vec::new()), array([3])])
    );
}

#[test]
fn test_holes_and_length() {
    assert_eq!(eval("var a = []; a[3] = 1; a.length"), JsValue::from(4));
    assert_eq!(eval("var a = [1, 2, 3, 4]; a.length = 2; a.join('-')"), JsValue::from("1-2"));
    assert_eq!(
        call("function x() { var a = [1]; a[2] = 3; return a; }", "x", &[]),
        HostValue::Array(vec![num(1.0), HostValue::Undefined, num(3.0)])
    );
}

#[test]
fn test_mutators() {
    let source = "
        var a = [1, 2, 3];
        var out = [a.push(4, 5), a.pop(), a.shift(), a.unshift(0), a.join('')];
        out.join(' ')
    ";
    assert_eq!(eval(source), JsValue::from("5 5 1 4 0234"));
}

#[test]
fn test_splice() {
    let source = "var a = [1, 2, 3, 4, 5]; var removed = a.splice(1, 2, 'x'); removed.join('') + '|' + a.join('')";
    assert_eq!(eval(source), JsValue::from("23|1x45"));
    assert_eq!(eval("var a = [1, 2, 3]; a.splice(-1); a.join('')"), JsValue::from("12"));
}

#[test]
fn test_slice_concat_reverse() {
    assert_eq!(
        eval("var a = [1, 2, 3, 4]; [a.slice(1, 3).join(''), a.slice(-2).join(''), a.concat([5], 6).join(''), a.reverse().join('')]")
            .to_string(),
        "23,34,123456,4321"
    );
}

#[test]
fn test_sort() {
    assert_eq!(eval("[10, 9, 1].sort().join(',')"), JsValue::from("1,10,9"));
    assert_eq!(eval("[10, 9, 1].sort(function(a, b) { return a - b }).join(',')"), JsValue::from("1,9,10"));
}

#[test]
fn test_search() {
    assert_eq!(
        eval("var a = [1, 2, 3, 2]; [a.indexOf(2), a.lastIndexOf(2), a.indexOf(9), a.includes(3)]").to_string(),
        "1,3,-1,true"
    );
}

#[test]
fn test_callbacks() {
    let source = "
        var a = [1, 2, 3, 4];
        var seen = 0;
        a.forEach(function(v, i) { seen += v * i; });
        [
            a.map(function(v) { return v * v; }).join(''),
            a.filter(function(v) { return v % 2; }).join(''),
            a.reduce(function(acc, v) { return acc + v; }, 10),
            a.find(function(v) { return v > 2; }),
            a.findIndex(function(v) { return v > 2; }),
            a.every(function(v) { return v > 0; }),
            a.some(function(v) { return v > 3; }),
            seen
        ].join(' ')
    ";
    assert_eq!(eval(source), JsValue::from("14916 13 20 3 2 true true 20"));
}

#[test]
fn test_fill_and_is_array() {
    assert_eq!(eval("[0, 0, 0].fill(7, 1).join('')"), JsValue::from("077"));
    assert_eq!(eval("[Array.isArray([]), Array.isArray('a')]").to_string(), "true,false");
}

#[test]
fn test_spread() {
    assert_eq!(call("function x(a) { return [0, ...a, 9]; }", "x", &[array([1, 2])]), array([0, 1, 2, 9]));
}

#[test]
fn test_arrays_are_shared_by_reference() {
    assert_eq!(call("function x() { var a = [1]; var b = a; b.push(2); return a.length; }", "x", &[]), num(2.0));
}

#[test]
fn test_huge_lengths_are_range_errors() {
    for source in ["new Array(3e9)", "Array(1e8)", "var a = []; a[4294967294] = 0", "[].length = 3e9"] {
        let err = eval_err(source);
        assert!(matches!(err, JsError::RangeError { .. }), "{}: {}", source, err);
    }
    assert_eq!(eval("new Array(3).length"), JsValue::from(3));
}
