//! Number built-in methods

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{JsValue, number_to_string};

use super::global::{global_parse_float, global_parse_int};
use super::{arg, create_constructor, register_method};

/// Initialize the number method table with toFixed, toString and valueOf
pub fn init_number_prototype(interp: &mut Interpreter) {
    let proto = interp.number_prototype.clone();

    register_method(&proto, "toFixed", number_to_fixed, 1);
    register_method(&proto, "toString", number_to_string_method, 1);
    register_method(&proto, "valueOf", number_value_of, 0);
}

/// `Number(value)` converts; the static members mirror the global helpers
pub fn create_number_constructor() -> JsValue {
    let constructor = create_constructor("Number", 1, number_constructor_fn, number_constructor_fn);
    {
        let statics = &constructor.properties;
        register_method(statics, "isNaN", number_is_nan, 1);
        register_method(statics, "isFinite", number_is_finite, 1);
        register_method(statics, "isInteger", number_is_integer, 1);
        register_method(statics, "isSafeInteger", number_is_safe_integer, 1);
        register_method(statics, "parseFloat", global_parse_float, 1);
        register_method(statics, "parseInt", global_parse_int, 2);

        let mut statics = statics.borrow_mut();
        for (name, value) in [
            ("MAX_SAFE_INTEGER", 9_007_199_254_740_991.0),
            ("MIN_SAFE_INTEGER", -9_007_199_254_740_991.0),
            ("MAX_VALUE", f64::MAX),
            ("MIN_VALUE", 5e-324),
            ("EPSILON", f64::EPSILON),
            ("POSITIVE_INFINITY", f64::INFINITY),
            ("NEGATIVE_INFINITY", f64::NEG_INFINITY),
            ("NaN", f64::NAN),
        ] {
            statics.insert(name.into(), JsValue::Number(value));
        }
    }
    JsValue::Function(constructor)
}

pub fn number_constructor_fn(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::Number(args.first().map(JsValue::to_number).unwrap_or(0.0)))
}

fn this_number(this: &JsValue) -> Result<f64, JsError> {
    match this {
        JsValue::Number(n) => Ok(*n),
        other => Err(JsError::type_error(format!(
            "Number.prototype method called on {}",
            other.type_of()
        ))),
    }
}

pub fn number_value_of(_interp: &mut Interpreter, this: &JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::Number(this_number(this)?))
}

/// Number.isNaN does not coerce its argument
pub fn number_is_nan(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::Boolean(matches!(args.first(), Some(JsValue::Number(n)) if n.is_nan())))
}

pub fn number_is_finite(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::Boolean(matches!(args.first(), Some(JsValue::Number(n)) if n.is_finite())))
}

pub fn number_is_integer(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::Boolean(matches!(
        args.first(),
        Some(JsValue::Number(n)) if n.is_finite() && n.fract() == 0.0
    )))
}

pub fn number_is_safe_integer(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::Boolean(matches!(
        args.first(),
        Some(JsValue::Number(n)) if n.fract() == 0.0 && n.abs() <= 9_007_199_254_740_991.0
    )))
}

// Number.prototype.toFixed
pub fn number_to_fixed(_interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let n = this_number(this)?;
    let digits = arg(args, 0).to_number();
    let digits = if digits.is_nan() { 0.0 } else { digits.trunc() };

    if !(0.0..=100.0).contains(&digits) {
        return Err(JsError::range_error(
            "toFixed() digits argument must be between 0 and 100",
        ));
    }
    if !n.is_finite() || n.abs() >= 1e21 {
        return Ok(JsValue::from(number_to_string(n)));
    }
    Ok(JsValue::from(format!("{:.prec$}", n, prec = digits as usize)))
}

// Number.prototype.toString
pub fn number_to_string_method(_interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let n = this_number(this)?;
    let radix = match arg(args, 0) {
        JsValue::Undefined => 10.0,
        value => value.to_number().trunc(),
    };

    if !(2.0..=36.0).contains(&radix) {
        return Err(JsError::range_error(
            "toString() radix must be between 2 and 36",
        ));
    }
    if radix == 10.0 || !n.is_finite() {
        return Ok(JsValue::from(number_to_string(n)));
    }
    Ok(JsValue::from(to_radix_string(n, radix as u32)))
}

/// Render `n` in `radix`, including up to 52 fractional digits
fn to_radix_string(n: f64, radix: u32) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let digit = |d: u32| DIGITS.get(d as usize).map(|&c| c as char).unwrap_or('0');

    let negative = n < 0.0;
    let n = n.abs();
    let mut int_part = n.trunc();
    let mut frac_part = n - int_part;

    let mut int_digits = Vec::new();
    while int_part >= 1.0 {
        int_digits.push(digit((int_part % f64::from(radix)) as u32));
        int_part = (int_part / f64::from(radix)).trunc();
    }
    let mut result = String::new();
    if negative {
        result.push('-');
    }
    if int_digits.is_empty() {
        result.push('0');
    }
    result.extend(int_digits.iter().rev());

    if frac_part > 0.0 {
        result.push('.');
        for _ in 0..52 {
            frac_part *= f64::from(radix);
            let d = frac_part.trunc();
            result.push(digit(d as u32));
            frac_part -= d;
            if frac_part <= 0.0 {
                break;
            }
        }
    }
    result
}
