//! Binary operator semantics

use crate::ast::BinaryOp;
use crate::error::JsError;
use crate::value::{FunctionKind, JsValue, js_pow, to_int32, to_uint32};

/// Apply a binary operator to two evaluated operands
pub fn binary_operation(op: BinaryOp, left: &JsValue, right: &JsValue) -> Result<JsValue, JsError> {
    let result = match op {
        BinaryOp::Add => {
            let left = left.to_primitive(false);
            let right = right.to_primitive(false);
            if matches!(left, JsValue::String(_)) || matches!(right, JsValue::String(_)) {
                let mut text = left.to_js_string().to_string();
                text.push_str(&right.to_js_string());
                JsValue::from(text)
            } else {
                JsValue::Number(left.to_number() + right.to_number())
            }
        }
        BinaryOp::Sub => JsValue::Number(left.to_number() - right.to_number()),
        BinaryOp::Mul => JsValue::Number(left.to_number() * right.to_number()),
        BinaryOp::Div => JsValue::Number(left.to_number() / right.to_number()),
        // f64 `%` already truncates toward zero like JavaScript
        BinaryOp::Mod => JsValue::Number(left.to_number() % right.to_number()),
        BinaryOp::Exp => JsValue::Number(js_pow(left.to_number(), right.to_number())),

        BinaryOp::Eq => JsValue::Boolean(left.loose_equals(right)),
        BinaryOp::NotEq => JsValue::Boolean(!left.loose_equals(right)),
        BinaryOp::StrictEq => JsValue::Boolean(left.strict_equals(right)),
        BinaryOp::StrictNotEq => JsValue::Boolean(!left.strict_equals(right)),

        BinaryOp::Lt => JsValue::Boolean(compare(left, right, |o| o.is_lt())),
        BinaryOp::LtEq => JsValue::Boolean(compare(left, right, |o| o.is_le())),
        BinaryOp::Gt => JsValue::Boolean(compare(left, right, |o| o.is_gt())),
        BinaryOp::GtEq => JsValue::Boolean(compare(left, right, |o| o.is_ge())),

        BinaryOp::BitAnd => int32(to_int32(left.to_number()) & to_int32(right.to_number())),
        BinaryOp::BitOr => int32(to_int32(left.to_number()) | to_int32(right.to_number())),
        BinaryOp::BitXor => int32(to_int32(left.to_number()) ^ to_int32(right.to_number())),
        BinaryOp::LShift => int32(to_int32(left.to_number()).wrapping_shl(shift_count(right))),
        BinaryOp::RShift => int32(to_int32(left.to_number()).wrapping_shr(shift_count(right))),
        BinaryOp::URShift => {
            JsValue::Number(f64::from(to_uint32(left.to_number()).wrapping_shr(shift_count(right))))
        }

        BinaryOp::In => JsValue::Boolean(has_property(right, left)?),
        BinaryOp::Instanceof => JsValue::Boolean(instance_of(left, right)?),
    };
    Ok(result)
}

fn int32(n: i32) -> JsValue {
    JsValue::Number(f64::from(n))
}

fn shift_count(value: &JsValue) -> u32 {
    to_uint32(value.to_number()) & 0x1f
}

/// Abstract relational comparison; any comparison involving NaN is false
fn compare(left: &JsValue, right: &JsValue, accept: fn(std::cmp::Ordering) -> bool) -> bool {
    let left = left.to_primitive(true);
    let right = right.to_primitive(true);
    if let (JsValue::String(a), JsValue::String(b)) = (&left, &right) {
        return accept(a.encode_utf16().cmp(b.encode_utf16()));
    }
    left.to_number()
        .partial_cmp(&right.to_number())
        .is_some_and(accept)
}

fn has_property(object: &JsValue, key: &JsValue) -> Result<bool, JsError> {
    match object {
        JsValue::Object(entries) => Ok(entries.borrow().contains_key(key.to_js_string().as_str())),
        JsValue::Array(items) => Ok(match key.as_index() {
            Some(index) => index < items.borrow().len(),
            None => key.to_js_string() == "length",
        }),
        JsValue::Function(func) => Ok(func.properties.borrow().contains_key(key.to_js_string().as_str())),
        other => Err(JsError::type_error(format!(
            "Cannot use 'in' operator to search for '{}' in {}",
            key.to_js_string(),
            other.to_js_string()
        ))),
    }
}

/// Without prototypes, `instanceof` recognises the built-in constructors
/// by the kind of value they produce
fn instance_of(value: &JsValue, constructor: &JsValue) -> Result<bool, JsError> {
    let JsValue::Function(func) = constructor else {
        return Err(JsError::type_error("Right-hand side of 'instanceof' is not callable"));
    };
    let FunctionKind::Native(native) = &func.kind else {
        return Ok(false);
    };
    Ok(match native.name {
        "Object" => !value.is_primitive(),
        "Array" => matches!(value, JsValue::Array(_)),
        "Function" => matches!(value, JsValue::Function(_)),
        "RegExp" => matches!(value, JsValue::RegExp(_)),
        "Date" => matches!(value, JsValue::Date(_)),
        "Error" => matches!(value, JsValue::Object(entries) if entries.borrow().contains_key("message")),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> JsValue {
        JsValue::Number(n)
    }

    #[test]
    fn test_bitwise_wraparound() {
        let shifted = binary_operation(BinaryOp::LShift, &num(-524999584.0), &num(5.0)).unwrap();
        assert_eq!(shifted, num(379882496.0));
        assert_eq!(binary_operation(BinaryOp::BitAnd, &num(19.0), &num(21.0)).unwrap(), num(17.0));
        assert_eq!(binary_operation(BinaryOp::URShift, &num(-1.0), &num(0.0)).unwrap(), num(4294967295.0));
        assert_eq!(binary_operation(BinaryOp::RShift, &num(-8.0), &num(33.0)).unwrap(), num(-4.0));
    }

    #[test]
    fn test_add_concatenates_strings() {
        let result = binary_operation(BinaryOp::Add, &JsValue::from("a"), &num(1.0)).unwrap();
        assert_eq!(result, JsValue::from("a1"));
        let result = binary_operation(BinaryOp::Add, &JsValue::new_array(vec![]), &num(1.0)).unwrap();
        assert_eq!(result, JsValue::from("1"));
    }

    #[test]
    fn test_relational_mixed_types() {
        let lt = binary_operation(BinaryOp::Lt, &JsValue::from("string"), &num(42.0)).unwrap();
        assert_eq!(lt, JsValue::Boolean(false));
        let ge = binary_operation(BinaryOp::GtEq, &JsValue::from("string"), &num(42.0)).unwrap();
        assert_eq!(ge, JsValue::Boolean(false));
        let strings = binary_operation(BinaryOp::Lt, &JsValue::from("a"), &JsValue::from("b")).unwrap();
        assert_eq!(strings, JsValue::Boolean(true));
    }

    #[test]
    fn test_in_requires_object() {
        assert!(binary_operation(BinaryOp::In, &JsValue::from("a"), &num(1.0)).is_err());
    }
}
