//! String built-ins

use super::{array, call, eval, eval_err, num};
use jsinterp::{HostValue, JsError, JsValue};

#[test]
fn test_char_code_at() {
    let code = "function x(i){return 'test'.charCodeAt(i)}";
    assert_eq!(call(code, "x", &[num(0.0)]), num(116.0));
    assert_eq!(call(code, "x", &[num(1.0)]), num(101.0));
    assert_eq!(call(code, "x", &[num(2.0)]), num(115.0));
    assert_eq!(call(code, "x", &[num(3.0)]), num(116.0));
    assert_eq!(call(code, "x", &[num(4.0)]), HostValue::Undefined);
    assert_eq!(call(code, "x", &[HostValue::from("not_a_number")]), num(116.0));
}

#[test]
fn test_from_char_code() {
    assert_eq!(eval("String.fromCharCode(104, 105)"), JsValue::from("hi"));
}

#[test]
fn test_split_join_reverse() {
    let code = "function x(s) { return s.split('').reverse().join(''); }";
    assert_eq!(call(code, "x", &[HostValue::from("abc")]), HostValue::from("cba"));
    assert_eq!(
        call("function x() { return 'a,b,,c'.split(','); }", "x", &[]),
        array(["a", "b", "", "c"])
    );
    assert_eq!(call("function x() { return 'a1b22c'.split(/\\d+/); }", "x", &[]), array(["a", "b", "c"]));
    assert_eq!(call("function x() { return 'abc'.split('', 2); }", "x", &[]), array(["a", "b"]));
}

#[test]
fn test_slicing() {
    assert_eq!(
        eval("['hello'.slice(1, -1), 'hello'.substring(3, 1), 'hello'.substr(-3, 2), 'hello'.charAt(4)]").to_string(),
        "ell,el,ll,o"
    );
}

#[test]
fn test_search_methods() {
    assert_eq!(
        eval("['banana'.indexOf('an'), 'banana'.lastIndexOf('an'), 'banana'.search(/n+/), 'banana'.indexOf('x')]")
            .to_string(),
        "1,3,2,-1"
    );
    assert_eq!(
        eval("['banana'.includes('nan'), 'banana'.startsWith('ba'), 'banana'.endsWith('nab')]").to_string(),
        "true,true,false"
    );
}

#[test]
fn test_replace() {
    assert_eq!(eval("'a-b-c'.replace('-', '+')"), JsValue::from("a+b-c"));
    assert_eq!(eval("'a-b-c'.replaceAll('-', '+')"), JsValue::from("a+b+c"));
    assert_eq!(eval("'a-b-c'.replace(/-/g, '')"), JsValue::from("abc"));
    assert_eq!(eval("'john smith'.replace(/(\\w+) (\\w+)/, '$2 $1')"), JsValue::from("smith john"));
    assert_eq!(
        eval("'a1b2'.replace(/\\d/g, function(d) { return d * 2; })"),
        JsValue::from("a2b4")
    );
}

#[test]
fn test_match() {
    assert_eq!(eval("'a1b22c333'.match(/\\d+/g).join('|')"), JsValue::from("1|22|333"));
    assert_eq!(eval("'key=value'.match(/(\\w+)=(\\w+)/)[2]"), JsValue::from("value"));
    assert_eq!(eval("'abc'.match(/\\d/)"), JsValue::Null);
}

#[test]
fn test_case_trim_pad_repeat() {
    assert_eq!(
        eval("['MiXeD'.toLowerCase(), 'MiXeD'.toUpperCase(), '  x  '.trim(), '5'.padStart(3, '0'), 'ab'.padEnd(4, '.'), 'ab'.repeat(3)]")
            .to_string(),
        "mixed,MIXED,x,005,ab..,ababab"
    );
    assert_eq!(eval("'a'.concat('b', 1)"), JsValue::from("ab1"));
}

#[test]
fn test_string_indexing_and_length() {
    assert_eq!(eval("var s = 'héllo'; s.length + s[1]"), JsValue::from("5é"));
}

#[test]
fn test_string_comparison() {
    assert_eq!(eval("['a' < 'b', 'B' < 'a', 'abc' === 'ab' + 'c']").to_string(), "true,true,true");
}

#[test]
fn test_huge_strings_are_range_errors() {
    assert!(matches!(eval_err("'ab'.repeat(1e9)"), JsError::RangeError { .. }));
    assert!(matches!(eval_err("'x'.padStart(1e12)"), JsError::RangeError { .. }));
}
