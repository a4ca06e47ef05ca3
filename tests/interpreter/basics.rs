//! Literals, operators, precedence and coercion

use super::{array, call, eval, is_nan, num};
use jsinterp::{HostValue, JsValue};

#[test]
fn test_basic() {
    assert_eq!(call("function x(){;}", "x", &[]), HostValue::Undefined);
    assert_eq!(call("function x3(){return 42;}", "x3", &[]), num(42.0));
    assert_eq!(call("function x3(){42}", "x3", &[]), HostValue::Undefined);
    assert_eq!(call("var x5 = function(){return 42;}", "x5", &[]), num(42.0));
}

#[test]
fn test_calc() {
    assert_eq!(call("function x4(a){return 2*a+1;}", "x4", &[num(3.0)]), num(7.0));
}

#[test]
fn test_empty_return() {
    assert_eq!(call("function f(){return; y()}", "f", &[]), HostValue::Undefined);
}

#[test]
fn test_morespace() {
    assert_eq!(call("function x (a) { return 2 * a + 1 ; }", "x", &[num(3.0)]), num(7.0));
    assert_eq!(call("function f () { x =  2  ; return x; }", "f", &[]), num(2.0));
}

#[test]
fn test_strange_chars() {
    let code = "function $_xY1 ($_axY1) { var $_axY2 = $_axY1 + 1; return $_axY2; }";
    assert_eq!(call(code, "$_xY1", &[num(20.0)]), num(21.0));
}

#[test]
fn test_operators() {
    assert_eq!(call("function f(){return 1 << 5;}", "f", &[]), num(32.0));
    assert_eq!(call("function f(){return 2 ** 5}", "f", &[]), num(32.0));
    assert_eq!(call("function f(){return 19 & 21;}", "f", &[]), num(17.0));
    assert_eq!(call("function f(){return 11 >> 2;}", "f", &[]), num(2.0));
    assert_eq!(call("function f(){return []? 2+3: 4;}", "f", &[]), num(5.0));
    assert_eq!(call("function f(){return 1 == 2}", "f", &[]), HostValue::Boolean(false));
    assert_eq!(call("function f(){return 0 && 1 || 2;}", "f", &[]), num(2.0));
    assert_eq!(call("function f(){return 0 ?? 42;}", "f", &[]), num(0.0));
    assert_eq!(call("function f(){return \"string\" < 42;}", "f", &[]), HostValue::Boolean(false));
}

#[test]
fn test_bitwise_operators_overflow() {
    assert_eq!(call("function x(){return -524999584 << 5}", "x", &[]), num(379882496.0));
    assert_eq!(call("function x(){return 1236566549 << 5}", "x", &[]), num(915423904.0));
    assert_eq!(call("function x(){return -1 >>> 0}", "x", &[]), num(4294967295.0));
    assert_eq!(call("function x(){return ~5 ^ 3}", "x", &[]), num(-7.0));
}

#[test]
fn test_array_access() {
    let code = "function f(){var x = [1,2,3]; x[0] = 4; x[0] = 5; x[2.0] = 7; return x;}";
    assert_eq!(call(code, "f", &[]), array([5, 2, 7]));
}

#[test]
fn test_parens() {
    assert_eq!(call("function f(){return (1) + (2) * ((( (( (((((3)))))) )) ));}", "f", &[]), num(7.0));
    assert_eq!(call("function f(){return (1 + 2) * 3;}", "f", &[]), num(9.0));
}

#[test]
fn test_quotes() {
    assert_eq!(call(r#"function f(){return "a\"\\("}"#, "f", &[]), HostValue::from(r#"a"\("#));
}

#[test]
fn test_assignments() {
    assert_eq!(call("function f(){var x = 20; x = 30 + 1; return x;}", "f", &[]), num(31.0));
    assert_eq!(call("function f(){var x = 20; x += 30 + 1; return x;}", "f", &[]), num(51.0));
    assert_eq!(call("function f(){var x = 20; x -= 30 + 1; return x;}", "f", &[]), num(-11.0));
    assert_eq!(call("function f(){var x = 7; x %= 4; x <<= 3; x |= 1; return x;}", "f", &[]), num(25.0));
}

#[test]
fn test_comments() {
    let code = "
        function x() {
            var x = /* 1 + */ 2;
            var y = /* 30
            * 40 */ 50;
            return x + y; // 52
        }
    ";
    assert_eq!(call(code, "x", &[]), num(52.0));

    let code = r#"
        function f() {
            var x = "/*";
            var y = 1 /* comment */ + 2;
            return y;
        }
    "#;
    assert_eq!(call(code, "f", &[]), num(3.0));
}

#[test]
fn test_precedence() {
    let code = "
        function x() {
            var a = [10, 20, 30, 40, 50];
            var b = 6;
            a[0]=a[b%a.length];
            return a;
        }";
    assert_eq!(call(code, "x", &[]), array([20, 20, 30, 40, 50]));
}

#[test]
fn test_comma() {
    assert_eq!(call("function x() { a=5; a -= 1, a+=3; return a }", "x", &[]), num(7.0));
    assert_eq!(call("function x() { a=5; return (a -= 1, a+=3, a); }", "x", &[]), num(7.0));
    assert_eq!(
        call("function x() { return (l=[0,1,2,3], function(a, b){return a+b})((l[1], l[2]), l[3]) }", "x", &[]),
        num(5.0)
    );
}

#[test]
fn test_void() {
    assert_eq!(call("function x() { return void 42; }", "x", &[]), HostValue::Undefined);
}

#[test]
fn test_null() {
    assert_eq!(call("function x() { return null; }", "x", &[]), HostValue::Null);
    assert_eq!(
        call("function x() { return [null > 0, null < 0, null == 0, null === 0]; }", "x", &[]),
        array([false, false, false, false])
    );
    assert_eq!(call("function x() { return [null >= 0, null <= 0]; }", "x", &[]), array([true, true]));
}

#[test]
fn test_undefined() {
    assert_eq!(call("function x() { return undefined === undefined; }", "x", &[]), HostValue::Boolean(true));
    assert_eq!(call("function x() { return undefined; }", "x", &[]), HostValue::Undefined);
    assert_eq!(call("function x() { let v; return v; }", "x", &[]), HostValue::Undefined);
    assert_eq!(
        call(
            "function x() { return [undefined === undefined, undefined == undefined, undefined < undefined, undefined > undefined]; }",
            "x",
            &[]
        ),
        array([true, true, false, false])
    );
    assert_eq!(
        call("function x() { return [undefined === 0, undefined == 0, undefined < 0, undefined > 0]; }", "x", &[]),
        array([false, false, false, false])
    );
    assert_eq!(call("function x() { return [undefined >= 0, undefined <= 0]; }", "x", &[]), array([false, false]));
    assert_eq!(
        call("function x() { return [undefined > null, undefined < null, undefined == null, undefined === null]; }", "x", &[]),
        array([false, false, true, false])
    );

    let HostValue::Array(items) = call("function x() { let v; return [42+v, v+42, v**42, 42**v, 0**v]; }", "x", &[]) else {
        panic!("expected an array");
    };
    assert!(items.iter().all(is_nan));

    assert_eq!(call("function x() { let v; return v**0; }", "x", &[]), num(1.0));
    assert_eq!(
        call("function x() { let v; return [v>42, v<=42, v&&42, 42&&v]; }", "x", &[]),
        HostValue::Array(vec![
            HostValue::Boolean(false),
            HostValue::Boolean(false),
            HostValue::Undefined,
            HostValue::Undefined,
        ])
    );
    assert_eq!(call("function x(){return undefined ?? 42; }", "x", &[]), num(42.0));
}

#[test]
fn test_nan_and_infinity() {
    assert!(is_nan(&call("function x() { return NaN }", "x", &[])));
    assert_eq!(call("function x() { return 1 / 0 === Infinity; }", "x", &[]), HostValue::Boolean(true));
    assert_eq!(call("function x() { return NaN == NaN; }", "x", &[]), HostValue::Boolean(false));
}

#[test]
fn test_typeof() {
    assert_eq!(
        eval("[typeof 1, typeof 'a', typeof undefined, typeof null, typeof [], typeof function(){}, typeof nothing]")
            .to_string(),
        "number,string,undefined,object,object,function,undefined"
    );
}

#[test]
fn test_string_concatenation_coercion() {
    assert_eq!(eval("'a' + 1 + 2"), JsValue::from("a12"));
    assert_eq!(eval("1 + 2 + 'a'"), JsValue::from("3a"));
    assert_eq!(eval("[1, 2] + ''"), JsValue::from("1,2"));
    assert_eq!(eval("'3' * '4'"), JsValue::from(12));
    assert_eq!(eval("'10' == 10"), JsValue::Boolean(true));
}

#[test]
fn test_update_operators() {
    assert_eq!(eval("var i = 1; var j = i++ + ++i; [i, j]").to_string(), "3,4");
    assert_eq!(eval("var o = {n: 1}; o.n--; --o.n; o.n"), JsValue::from(-1));
}

#[test]
fn test_template_literal() {
    assert_eq!(eval("var n = 3; `n=${n + 1}!`"), JsValue::from("n=4!"));
}

#[test]
fn test_in_operator() {
    assert_eq!(eval("['a' in {a: 1}, 'b' in {a: 1}, 0 in [5]]").to_string(), "true,false,true");
}
