//! Object built-in methods

use indexmap::IndexMap;

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{JsString, JsValue};

use super::{arg, create_constructor, register_method};

/// Initialize the method table shared by plain objects and booleans
pub fn init_object_prototype(interp: &mut Interpreter) {
    let proto = interp.object_prototype.clone();
    register_method(&proto, "hasOwnProperty", object_has_own_property, 1);
    register_method(&proto, "toString", object_to_string, 0);
    register_method(&proto, "valueOf", object_value_of, 0);
}

/// Create the Object constructor with its static helpers
pub fn create_object_constructor() -> JsValue {
    let constructor = create_constructor("Object", 1, object_constructor_fn, object_constructor_fn);
    let statics = &constructor.properties;
    register_method(statics, "keys", object_keys, 1);
    register_method(statics, "values", object_values, 1);
    register_method(statics, "entries", object_entries, 1);
    register_method(statics, "assign", object_assign, 2);
    register_method(statics, "fromEntries", object_from_entries, 1);
    JsValue::Function(constructor)
}

pub fn object_constructor_fn(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(match arg(args, 0) {
        JsValue::Undefined | JsValue::Null => JsValue::new_object(IndexMap::new()),
        value => value,
    })
}

/// Own enumerable `(key, value)` pairs in insertion order
pub fn own_entries(value: &JsValue) -> Result<Vec<(JsString, JsValue)>, JsError> {
    Ok(match value {
        JsValue::Undefined | JsValue::Null => {
            return Err(JsError::type_error("Cannot convert undefined or null to object"));
        }
        JsValue::Object(entries) => entries
            .borrow()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
        JsValue::Array(items) => items
            .borrow()
            .iter()
            .enumerate()
            .map(|(index, value)| (JsString::from(index.to_string()), value.clone()))
            .collect(),
        JsValue::String(s) => s
            .encode_utf16()
            .enumerate()
            .map(|(index, unit)| {
                (
                    JsString::from(index.to_string()),
                    JsValue::from(String::from_utf16_lossy(&[unit])),
                )
            })
            .collect(),
        JsValue::Function(func) => func
            .properties
            .borrow()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
        _ => Vec::new(),
    })
}

pub fn object_keys(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let keys = own_entries(&arg(args, 0))?
        .into_iter()
        .map(|(key, _)| JsValue::String(key))
        .collect();
    Ok(JsValue::new_array(keys))
}

pub fn object_values(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let values = own_entries(&arg(args, 0))?
        .into_iter()
        .map(|(_, value)| value)
        .collect();
    Ok(JsValue::new_array(values))
}

pub fn object_entries(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let entries = own_entries(&arg(args, 0))?
        .into_iter()
        .map(|(key, value)| JsValue::new_array(vec![JsValue::String(key), value]))
        .collect();
    Ok(JsValue::new_array(entries))
}

pub fn object_assign(interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let target = arg(args, 0);
    if target.is_null_or_undefined() {
        return Err(JsError::type_error("Cannot convert undefined or null to object"));
    }
    for source in args.iter().skip(1) {
        if source.is_null_or_undefined() {
            continue;
        }
        for (key, value) in own_entries(source)? {
            interp.set_member(&target, &JsValue::String(key), value)?;
        }
    }
    Ok(target)
}

pub fn object_from_entries(interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let JsValue::Array(pairs) = arg(args, 0) else {
        return Err(JsError::type_error("Object.fromEntries requires an array of entries"));
    };
    let mut result = IndexMap::new();
    for pair in pairs.borrow().iter() {
        let key = interp.get_member(pair, &JsValue::from(0))?;
        let value = interp.get_member(pair, &JsValue::from(1))?;
        result.insert(key.to_js_string(), value);
    }
    Ok(JsValue::new_object(result))
}

pub fn object_has_own_property(_interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let key = arg(args, 0);
    let found = match this {
        JsValue::Object(entries) => entries.borrow().contains_key(key.to_js_string().as_str()),
        JsValue::Array(items) => {
            let items = items.borrow();
            key.as_index().is_some_and(|index| index < items.len())
                || key.to_js_string().as_str() == "length"
        }
        JsValue::Function(func) => func.properties.borrow().contains_key(key.to_js_string().as_str()),
        JsValue::String(s) => {
            key.as_index().is_some_and(|index| index < s.utf16_len())
                || key.to_js_string().as_str() == "length"
        }
        _ => false,
    };
    Ok(JsValue::Boolean(found))
}

pub fn object_to_string(_interp: &mut Interpreter, this: &JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(match this {
        JsValue::Object(_) => JsValue::from("[object Object]"),
        other => JsValue::String(other.to_js_string()),
    })
}

pub fn object_value_of(_interp: &mut Interpreter, this: &JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(this.clone())
}
