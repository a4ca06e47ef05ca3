//! Regular expression literals and RegExp methods

use super::{call, eval};
use jsinterp::{HostValue, JsValue};

fn regexp(pattern: &str, flags: &str) -> HostValue {
    HostValue::RegExp {
        pattern: pattern.to_string(),
        flags: flags.to_string(),
    }
}

#[test]
fn test_regex() {
    assert_eq!(call("function x() { let a=/,,[/,913,/](,)}/; }", "x", &[]), HostValue::Undefined);
    assert_eq!(
        call("function x() { let a=/,,[/,913,/](,)}/; return a; }", "x", &[]),
        regexp(",,[/,913,/](,)}", "")
    );
    assert_eq!(call(r"function x() { let a=[/[)\\]/]; return a[0]; }", "x", &[]), regexp(r"[)\\]", ""));
    assert_eq!(
        call("function x() { let a=/,,[/,913,/](,)}/i; return a; }", "x", &[]),
        regexp(",,[/,913,/](,)}", "i")
    );
}

#[test]
fn test_regexp_is_not_division() {
    assert_eq!(eval("var a = 8, g = 2; a / g / 2"), JsValue::from(2));
    assert_eq!(eval("var r = [/=/][0]; r.source"), JsValue::from("="));
}

#[test]
fn test_regexp_test_and_exec() {
    assert_eq!(eval("/^a.c$/.test('abc')"), JsValue::Boolean(true));
    assert_eq!(eval("/^a.c$/.test('abd')"), JsValue::Boolean(false));
    assert_eq!(eval("/ABC/i.test('xabcx')"), JsValue::Boolean(true));
    assert_eq!(eval("/(\\d+)-(\\d+)/.exec('tel 12-34').join(',')"), JsValue::from("12-34,12,34"));
    assert_eq!(eval("/z/.exec('abc')"), JsValue::Null);
}

#[test]
fn test_global_exec_advances_last_index() {
    let source = "
        var re = /o/g;
        var positions = [];
        while (re.exec('foo boo') !== null) positions.push(re.lastIndex);
        positions.join(',')
    ";
    assert_eq!(eval(source), JsValue::from("2,3,6,7"));
}

#[test]
fn test_regexp_constructor() {
    assert_eq!(eval("new RegExp('a+b', 'g').flags"), JsValue::from("g"));
    assert_eq!(eval("RegExp('x').test('box')"), JsValue::Boolean(true));
    assert_eq!(eval("new RegExp('a+b').source"), JsValue::from("a+b"));
}

#[test]
fn test_regexp_argument_round_trip() {
    let code = "function x(re) { return re.test('HELLO') ? re : null; }";
    assert_eq!(call(code, "x", &[regexp("hel+o", "i")]), regexp("hel+o", "i"));
}
