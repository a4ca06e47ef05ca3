//! Date construction, parsing and arithmetic

use super::{call, eval, is_nan, num};
use jsinterp::{HostValue, JsValue};

#[test]
fn test_date() {
    let code = "function x() { return new Date('Wednesday 31 December 1969 18:01:26 MDT') - 0; }";
    assert_eq!(call(code, "x", &[]), num(86000.0));

    let code = "function x(dt) { return new Date(dt) - 0; }";
    assert_eq!(
        call(code, "x", &[HostValue::from("Wednesday 31 December 1969 18:01:26 MDT")]),
        num(86000.0)
    );
}

#[test]
fn test_invalid_date() {
    assert!(is_nan(&call("function x() { return new Date('garbage') - 0; }", "x", &[])));
    assert_eq!(eval("String(new Date('garbage'))"), JsValue::from("Invalid Date"));
}

#[test]
fn test_date_getters_are_utc() {
    let source = "
        var d = new Date(Date.UTC(2024, 1, 29, 13, 45, 30, 250));
        [d.getFullYear(), d.getMonth(), d.getDate(), d.getDay(), d.getHours(), d.getMinutes(), d.getSeconds(), d.getMilliseconds()].join(' ')
    ";
    assert_eq!(eval(source), JsValue::from("2024 1 29 4 13 45 30 250"));
}

#[test]
fn test_date_iso_round_trip() {
    assert_eq!(eval("new Date(1000).toISOString()"), JsValue::from("1970-01-01T00:00:01.000Z"));
    assert_eq!(eval("Date.parse('1970-01-01T00:00:01Z')"), JsValue::from(1000));
    assert_eq!(eval("JSON.stringify({t: new Date(0)})"), JsValue::from("{\"t\":\"1970-01-01T00:00:00.000Z\"}"));
}

#[test]
fn test_date_now_is_recent() {
    // 2020-01-01T00:00:00Z
    assert_eq!(eval("Date.now() > 1577836800000"), JsValue::Boolean(true));
}

#[test]
fn test_date_becomes_time_value_on_the_host() {
    assert_eq!(call("function x() { return new Date(86000); }", "x", &[]), num(86000.0));
}
