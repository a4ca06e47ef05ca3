//! Math built-in methods

use std::cell::Cell;

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{JsValue, NativeFn, js_pow};

use super::{create_namespace, register_method};

/// Create Math object with all math methods and constants
pub fn create_math_object() -> JsValue {
    let math = create_namespace();

    // Constants
    for (name, value) in [
        ("PI", std::f64::consts::PI),
        ("E", std::f64::consts::E),
        ("LN2", std::f64::consts::LN_2),
        ("LN10", std::f64::consts::LN_10),
        ("LOG2E", std::f64::consts::LOG2_E),
        ("LOG10E", std::f64::consts::LOG10_E),
        ("SQRT2", std::f64::consts::SQRT_2),
        ("SQRT1_2", std::f64::consts::FRAC_1_SQRT_2),
    ] {
        math.borrow_mut().insert(name.into(), JsValue::Number(value));
    }

    // Rounding methods
    register_method(&math, "abs", math_abs, 1);
    register_method(&math, "floor", math_floor, 1);
    register_method(&math, "ceil", math_ceil, 1);
    register_method(&math, "round", math_round, 1);
    register_method(&math, "trunc", math_trunc, 1);
    register_method(&math, "sign", math_sign, 1);

    // Min/max
    register_method(&math, "min", math_min, 2);
    register_method(&math, "max", math_max, 2);

    // Power, root and logarithm functions
    register_method(&math, "pow", math_pow, 2);
    register_method(&math, "sqrt", math_sqrt, 1);
    register_method(&math, "cbrt", math_cbrt, 1);
    register_method(&math, "hypot", math_hypot, 2);
    register_method(&math, "log", math_log, 1);
    register_method(&math, "log2", math_log2, 1);
    register_method(&math, "log10", math_log10, 1);
    register_method(&math, "exp", math_exp, 1);

    // Trigonometry
    let trig: [(&'static str, NativeFn); 7] = [
        ("sin", math_sin),
        ("cos", math_cos),
        ("tan", math_tan),
        ("asin", math_asin),
        ("acos", math_acos),
        ("atan", math_atan),
        ("atan2", math_atan2),
    ];
    for (name, func) in trig {
        register_method(&math, name, func, if name == "atan2" { 2 } else { 1 });
    }

    register_method(&math, "random", math_random, 0);

    JsValue::Object(math)
}

fn number_arg(args: &[JsValue], index: usize) -> f64 {
    args.get(index).map(JsValue::to_number).unwrap_or(f64::NAN)
}

macro_rules! unary_math {
    ($($name:ident => $op:expr;)*) => {
        $(
            pub fn $name(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
                let op: fn(f64) -> f64 = $op;
                Ok(JsValue::Number(op(number_arg(args, 0))))
            }
        )*
    };
}

unary_math! {
    math_abs => f64::abs;
    math_floor => f64::floor;
    math_ceil => f64::ceil;
    math_trunc => f64::trunc;
    math_sqrt => f64::sqrt;
    math_cbrt => f64::cbrt;
    math_log => f64::ln;
    math_log2 => f64::log2;
    math_log10 => f64::log10;
    math_exp => f64::exp;
    math_sin => f64::sin;
    math_cos => f64::cos;
    math_tan => f64::tan;
    math_asin => f64::asin;
    math_acos => f64::acos;
    math_atan => f64::atan;
}

/// Rounds half up, so `Math.round(-2.5)` is `-2`
pub fn math_round(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let n = number_arg(args, 0);
    if !n.is_finite() || n.fract() == 0.0 {
        return Ok(JsValue::Number(n));
    }
    let rounded = (n + 0.5).floor();
    // Keep the sign of negative values that round to zero
    Ok(JsValue::Number(if rounded == 0.0 && n < 0.0 { -0.0 } else { rounded }))
}

pub fn math_sign(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let n = number_arg(args, 0);
    Ok(JsValue::Number(if n.is_nan() || n == 0.0 { n } else { n.signum() }))
}

pub fn math_min(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let mut result = f64::INFINITY;
    for value in args {
        let n = value.to_number();
        if n.is_nan() {
            return Ok(JsValue::Number(f64::NAN));
        }
        result = result.min(n);
    }
    Ok(JsValue::Number(result))
}

pub fn math_max(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let mut result = f64::NEG_INFINITY;
    for value in args {
        let n = value.to_number();
        if n.is_nan() {
            return Ok(JsValue::Number(f64::NAN));
        }
        result = result.max(n);
    }
    Ok(JsValue::Number(result))
}

pub fn math_pow(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::Number(js_pow(number_arg(args, 0), number_arg(args, 1))))
}

pub fn math_hypot(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let sum: f64 = args.iter().map(|v| v.to_number().powi(2)).sum();
    Ok(JsValue::Number(sum.sqrt()))
}

pub fn math_atan2(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::Number(number_arg(args, 0).atan2(number_arg(args, 1))))
}

thread_local! {
    static RANDOM_STATE: Cell<u64> = Cell::new(seed());
}

fn seed() -> u64 {
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0) as u64;
    // xorshift must not start from zero
    nanos | 1
}

/// Pseudo-random number in [0, 1) from a per-thread xorshift64 generator
pub fn math_random(_interp: &mut Interpreter, _this: &JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    let next = RANDOM_STATE.with(|state| {
        let mut x = state.get();
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        state.set(x);
        x
    });
    Ok(JsValue::Number((next >> 11) as f64 / (1u64 << 53) as f64))
}
