//! Control flow: switch, loops, labels, try/catch/finally, throw

use super::{array, call, call_err, eval, eval_err, failure_message, num};
use jsinterp::{HostValue, JsError, JsValue};

// -----------------------------------------------------------------------------
// Switch
// -----------------------------------------------------------------------------

#[test]
fn test_switch() {
    let code = "
        function x(f) { switch(f){
            case 1:f+=1;
            case 2:f+=2;
            case 3:f+=3;break;
            case 4:f+=4;
            default:f=0;
        } return f }
    ";
    assert_eq!(call(code, "x", &[num(1.0)]), num(7.0));
    assert_eq!(call(code, "x", &[num(3.0)]), num(6.0));
    assert_eq!(call(code, "x", &[num(5.0)]), num(0.0));
}

#[test]
fn test_switch_default() {
    let code = "
        function x(f) { switch(f){
            case 2: f+=2;
            default: f-=1;
            case 5:
            case 6: f+=6;
            case 0: break;
            case 1: f+=1;
        } return f }
    ";
    assert_eq!(call(code, "x", &[num(1.0)]), num(2.0));
    assert_eq!(call(code, "x", &[num(5.0)]), num(11.0));
    assert_eq!(call(code, "x", &[num(9.0)]), num(14.0));
}

#[test]
fn test_switch_is_strict() {
    let code = "function x(v) { switch (v) { case 1: return 'number'; case '1': return 'string'; } return 'none'; }";
    assert_eq!(call(code, "x", &[HostValue::from("1")]), HostValue::from("string"));
    assert_eq!(call(code, "x", &[num(1.0)]), HostValue::from("number"));
    assert_eq!(call(code, "x", &[HostValue::Null]), HostValue::from("none"));
}

// -----------------------------------------------------------------------------
// Loops
// -----------------------------------------------------------------------------

#[test]
fn test_for_loop() {
    assert_eq!(call("function x() { a=0; for (i=0; i-10; i++) {a++} return a }", "x", &[]), num(10.0));
}

#[test]
fn test_for_loop_continue() {
    assert_eq!(call("function x() { a=0; for (i=0; i-10; i++) { continue; a++ } return a }", "x", &[]), num(0.0));
}

#[test]
fn test_for_loop_break() {
    assert_eq!(call("function x() { a=0; for (i=0; i-10; i++) { break; a++ } return a }", "x", &[]), num(0.0));
}

#[test]
fn test_for_loop_try() {
    let code = "
        function x() {
            for (i=0; i-10; i++) { try { if (i == 5) throw i} catch {return 10} finally {break} };
            return 42 }
    ";
    assert_eq!(call(code, "x", &[]), num(42.0));
}

#[test]
fn test_continue_skips_one_iteration() {
    let code = "function x() { var out = []; for (var i = 0; i < 5; i++) { if (i == 2) continue; out.push(i); } return out; }";
    assert_eq!(call(code, "x", &[]), array([0, 1, 3, 4]));
}

#[test]
fn test_while_and_do_while() {
    assert_eq!(eval("var n = 0; while (n < 5) n += 2; n"), JsValue::from(6));
    assert_eq!(eval("var n = 10; do { n++; } while (n < 5); n"), JsValue::from(11));
}

#[test]
fn test_for_in_and_for_of() {
    assert_eq!(eval("var keys = ''; for (var k in {a: 1, b: 2}) keys += k; keys"), JsValue::from("ab"));
    assert_eq!(eval("var sum = 0; for (const v of [1, 2, 3]) sum += v; sum"), JsValue::from(6));
    assert_eq!(eval("var s = ''; for (var c of 'abc') s = c + s; s"), JsValue::from("cba"));
}

#[test]
fn test_labeled_break() {
    let source = "
        var hits = 0;
        outer: for (var i = 0; i < 3; i++) {
            for (var j = 0; j < 3; j++) {
                if (j == 1) continue outer;
                if (i == 2) break outer;
                hits++;
            }
        }
        hits
    ";
    assert_eq!(eval(source), JsValue::from(2));
}

// -----------------------------------------------------------------------------
// Exceptions
// -----------------------------------------------------------------------------

#[test]
fn test_try() {
    assert_eq!(call("function x() { try{return 10} catch(e){return 5} }", "x", &[]), num(10.0));
}

#[test]
fn test_catch() {
    assert_eq!(call("function x() { try{throw 10} catch(e){return 5} }", "x", &[]), num(5.0));
    assert_eq!(call("function x() { try{throw 10} catch(e){return e + 1} }", "x", &[]), num(11.0));
}

#[test]
fn test_finally() {
    assert_eq!(call("function x() { try{throw 10} finally {return 42} }", "x", &[]), num(42.0));
    assert_eq!(call("function x() { try{throw 10} catch(e){return 5} finally {return 42} }", "x", &[]), num(42.0));
}

#[test]
fn test_nested_try() {
    let code = "
        function x() {try {
            try{throw 10} finally {throw 42}
            } catch(e){return 5} }
    ";
    assert_eq!(call(code, "x", &[]), num(5.0));
}

#[test]
fn test_finally_runs_after_return() {
    let source = "
        var log = [];
        function f() { try { log.push('try'); return 1; } finally { log.push('finally'); } }
        var r = f();
        log.join(',') + ':' + r
    ";
    assert_eq!(eval(source), JsValue::from("try,finally:1"));
}

#[test]
fn test_runtime_errors_are_catchable() {
    assert_eq!(
        eval("var m; try { null.x; } catch (e) { m = e.name; } m"),
        JsValue::from("TypeError")
    );
    assert_eq!(
        eval("var m; try { missing(); } catch (e) { m = e.message; } m"),
        JsValue::from("missing is not defined")
    );
    assert_eq!(
        eval("var m; try { throw new Error('boom'); } catch (e) { m = e.message; } m"),
        JsValue::from("boom")
    );
}

#[test]
fn test_uncaught_throw_fails_the_call() {
    let err = call_err("function x() { throw 'bad'; }", "x", &[]);
    assert!(failure_message(&err).contains("bad"));
}

#[test]
fn test_syntax_error() {
    assert!(matches!(eval_err("var = ;"), JsError::SyntaxError { .. }));
}

#[test]
fn test_break_outside_loop_is_rejected() {
    assert!(matches!(eval_err("break;"), JsError::SyntaxError { .. }));
}
