//! JSON built-in methods

use std::rc::Rc;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{JsString, JsValue};

use super::{arg, create_namespace, register_method};

/// Create the JSON namespace object
pub fn create_json_object() -> JsValue {
    let json = create_namespace();
    register_method(&json, "stringify", json_stringify, 3);
    register_method(&json, "parse", json_parse, 2);
    JsValue::Object(json)
}

pub fn json_stringify(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let value = arg(args, 0);
    // The replacer argument is not supported and ignored
    let Some(json) = value_to_json(&value)? else {
        return Ok(JsValue::Undefined);
    };

    let indent = match arg(args, 2) {
        JsValue::Number(n) if n >= 1.0 => " ".repeat(n.min(10.0) as usize),
        JsValue::String(s) => s.chars().take(10).collect(),
        _ => String::new(),
    };
    if indent.is_empty() {
        return Ok(JsValue::from(json.to_string()));
    }

    let mut out = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(indent.as_bytes()));
    json.serialize(&mut serializer)
        .map_err(|e| JsError::Internal(e.to_string()))?;
    Ok(JsValue::from(String::from_utf8_lossy(&out).into_owned()))
}

pub fn json_parse(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let text = arg(args, 0).to_js_string();
    let json: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| JsError::syntax_error(format!("JSON.parse: {}", e), e.line() as u32, e.column() as u32))?;
    Ok(json_to_value(&json))
}

/// Convert parsed JSON into a guest value
pub fn json_to_value(json: &serde_json::Value) -> JsValue {
    match json {
        serde_json::Value::Null => JsValue::Null,
        serde_json::Value::Bool(b) => JsValue::Boolean(*b),
        serde_json::Value::Number(n) => JsValue::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => JsValue::from(s.as_str()),
        serde_json::Value::Array(items) => JsValue::new_array(items.iter().map(json_to_value).collect()),
        serde_json::Value::Object(entries) => JsValue::new_object(
            entries
                .iter()
                .map(|(key, value)| (JsString::from(key.as_str()), json_to_value(value)))
                .collect::<IndexMap<_, _>>(),
        ),
    }
}

/// Convert a guest value to JSON the way `JSON.stringify` does.
///
/// Returns `None` for values that have no JSON form (`undefined`,
/// functions); nested inside an array those become `null`, inside an object
/// the key is dropped.
pub fn value_to_json(value: &JsValue) -> Result<Option<serde_json::Value>, JsError> {
    let mut stack = Vec::new();
    to_json_inner(value, &mut stack)
}

fn to_json_inner(value: &JsValue, stack: &mut Vec<usize>) -> Result<Option<serde_json::Value>, JsError> {
    Ok(Some(match value {
        JsValue::Undefined | JsValue::Function(_) => return Ok(None),
        JsValue::Null => serde_json::Value::Null,
        JsValue::Boolean(b) => serde_json::Value::Bool(*b),
        JsValue::Number(n) => number_to_json(*n),
        JsValue::String(s) => serde_json::Value::String(s.to_string()),
        JsValue::Date(time) => match super::date::to_iso_string(time.get()) {
            Some(iso) => serde_json::Value::String(iso),
            None => serde_json::Value::Null,
        },
        // RegExp objects have no enumerable own properties
        JsValue::RegExp(_) => serde_json::Value::Object(serde_json::Map::new()),
        JsValue::Array(items) => {
            let id = Rc::as_ptr(items) as *const () as usize;
            enter(stack, id)?;
            let mut result = Vec::new();
            for item in items.borrow().iter() {
                result.push(to_json_inner(item, stack)?.unwrap_or(serde_json::Value::Null));
            }
            stack.pop();
            serde_json::Value::Array(result)
        }
        JsValue::Object(entries) => {
            let id = Rc::as_ptr(entries) as *const () as usize;
            enter(stack, id)?;
            let mut result = serde_json::Map::new();
            for (key, item) in entries.borrow().iter() {
                if let Some(json) = to_json_inner(item, stack)? {
                    result.insert(key.to_string(), json);
                }
            }
            stack.pop();
            serde_json::Value::Object(result)
        }
    }))
}

fn enter(stack: &mut Vec<usize>, id: usize) -> Result<(), JsError> {
    if stack.contains(&id) {
        return Err(JsError::type_error("Converting circular structure to JSON"));
    }
    stack.push(id);
    Ok(())
}

/// Integral values print without a fraction, non-finite values become null
fn number_to_json(n: f64) -> serde_json::Value {
    if !n.is_finite() {
        return serde_json::Value::Null;
    }
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return serde_json::Value::from(n as i64);
    }
    serde_json::Number::from_f64(n)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}
