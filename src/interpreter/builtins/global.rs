//! Global built-in functions (parseInt, parseFloat, console, Error, ...)

use std::rc::Rc;

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{JsFunction, JsValue, string_to_number};

use super::{arg, create_constructor, create_namespace, define_global, register_method};

/// Register global functions and values into the interpreter
pub fn register_global_functions(interp: &mut Interpreter) {
    define_global(interp, "undefined", JsValue::Undefined);
    define_global(interp, "NaN", JsValue::Number(f64::NAN));
    define_global(interp, "Infinity", JsValue::Number(f64::INFINITY));

    for (name, arity, func) in [
        ("parseInt", 2, global_parse_int as crate::value::NativeFn),
        ("parseFloat", 1, global_parse_float),
        ("isNaN", 1, global_is_nan),
        ("isFinite", 1, global_is_finite),
    ] {
        define_global(interp, name, JsValue::Function(Rc::new(JsFunction::native(name, arity, func))));
    }

    let console = create_namespace();
    register_method(&console, "log", console_log, 0);
    register_method(&console, "error", console_log, 0);
    define_global(interp, "console", JsValue::Object(console));

    define_global(
        interp,
        "Boolean",
        JsValue::Function(Rc::new(JsFunction::native("Boolean", 1, boolean_constructor))),
    );

    define_global(interp, "Error", JsValue::Function(create_constructor("Error", 1, error_constructor, error_constructor)));
    define_global(
        interp,
        "TypeError",
        JsValue::Function(create_constructor("TypeError", 1, type_error_constructor, type_error_constructor)),
    );
    define_global(
        interp,
        "RangeError",
        JsValue::Function(create_constructor("RangeError", 1, range_error_constructor, range_error_constructor)),
    );
    define_global(
        interp,
        "ReferenceError",
        JsValue::Function(create_constructor(
            "ReferenceError",
            1,
            reference_error_constructor,
            reference_error_constructor,
        )),
    );
}

pub fn global_parse_int(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let text = arg(args, 0).to_js_string();
    let text = text.trim_start_matches(crate::value::is_js_whitespace);

    let (negative, text) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let mut radix = match arg(args, 1) {
        JsValue::Undefined => 0,
        value => crate::value::to_int32(value.to_number()),
    };
    let mut digits = text;
    if radix == 0 || radix == 16 {
        if let Some(rest) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            digits = rest;
            radix = 16;
        }
    }
    if radix == 0 {
        radix = 10;
    }
    if !(2..=36).contains(&radix) {
        return Ok(JsValue::Number(f64::NAN));
    }

    let radix = radix as u32;
    let mut result: f64 = 0.0;
    let mut seen = false;
    for c in digits.chars() {
        let Some(digit) = c.to_digit(radix) else {
            break;
        };
        result = result * f64::from(radix) + f64::from(digit);
        seen = true;
    }
    if !seen {
        return Ok(JsValue::Number(f64::NAN));
    }
    Ok(JsValue::Number(if negative { -result } else { result }))
}

pub fn global_parse_float(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let text = arg(args, 0).to_js_string();
    let text = text.trim_start_matches(crate::value::is_js_whitespace);

    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    if unsigned.starts_with("Infinity") {
        let sign = if text.starts_with('-') { -1.0 } else { 1.0 };
        return Ok(JsValue::Number(sign * f64::INFINITY));
    }

    // Longest prefix that still parses as a decimal literal
    let mut end = 0;
    let mut seen_dot = false;
    let mut seen_exp = false;
    let bytes = text.as_bytes();
    let mut i = 0;
    while let Some(&b) = bytes.get(i) {
        match b {
            b'0'..=b'9' => end = i + 1,
            b'+' | b'-' if i == 0 => {}
            b'+' | b'-' if matches!(bytes.get(i.wrapping_sub(1)), Some(b'e' | b'E')) => {}
            b'.' if !seen_dot && !seen_exp => seen_dot = true,
            b'e' | b'E' if !seen_exp && end > 0 => seen_exp = true,
            _ => break,
        }
        i += 1;
    }
    let number = text.get(..end).map(string_to_number).unwrap_or(f64::NAN);
    Ok(JsValue::Number(if end == 0 { f64::NAN } else { number }))
}

pub fn global_is_nan(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::Boolean(arg(args, 0).to_number().is_nan()))
}

pub fn global_is_finite(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::Boolean(arg(args, 0).to_number().is_finite()))
}

/// `console.log` appends to the captured output and the debug log
pub fn console_log(interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let line = args
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    log::debug!("console: {}", line);
    interp.output.push_str(&line);
    interp.output.push('\n');
    Ok(JsValue::Undefined)
}

pub fn boolean_constructor(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::Boolean(arg(args, 0).to_boolean()))
}

fn make_error(name: &str, args: &[JsValue]) -> JsValue {
    let message = match arg(args, 0) {
        JsValue::Undefined => String::new(),
        value => value.to_js_string().to_string(),
    };
    JsValue::error_object(name, &message)
}

pub fn error_constructor(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(make_error("Error", args))
}

pub fn type_error_constructor(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(make_error("TypeError", args))
}

pub fn range_error_constructor(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(make_error("RangeError", args))
}

pub fn reference_error_constructor(
    _interp: &mut Interpreter,
    _this: &JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(make_error("ReferenceError", args))
}
