//! Owned values crossing the boundary between guest code and its callers
//!
//! [`JsValue`] is tied to one interpreter through `Rc` handles. A
//! [`HostValue`] is a self-contained copy that can be cached, sent between
//! threads, compared and serialized, which is what the dispatcher and the
//! external backends need.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::interpreter::builtins::json::value_to_json;
use crate::scope::Scope;
use crate::value::{FunctionKind, JsRegExp, JsString, JsValue};

/// A JavaScript value owned by the host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum HostValue {
    #[default]
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Array(Vec<HostValue>),
    Object(IndexMap<String, HostValue>),
    RegExp { pattern: String, flags: String },
    /// A guest function, kept as source text
    Function { name: String, params: Vec<String>, source: String },
}

impl HostValue {
    /// Copy a guest value out of the interpreter. Dates become their time
    /// value; reference cycles are rejected.
    pub fn from_js(value: &JsValue) -> Result<Self, JsError> {
        let mut stack = Vec::new();
        Self::from_js_inner(value, &mut stack)
    }

    fn from_js_inner(value: &JsValue, stack: &mut Vec<usize>) -> Result<Self, JsError> {
        Ok(match value {
            JsValue::Undefined => HostValue::Undefined,
            JsValue::Null => HostValue::Null,
            JsValue::Boolean(b) => HostValue::Boolean(*b),
            JsValue::Number(n) => HostValue::Number(*n),
            JsValue::String(s) => HostValue::String(s.to_string()),
            JsValue::Date(time) => HostValue::Number(time.get()),
            JsValue::RegExp(re) => HostValue::RegExp {
                pattern: re.source.to_string(),
                flags: re.flags.to_string(),
            },
            JsValue::Function(func) => HostValue::Function {
                name: func.name(),
                params: match &func.kind {
                    FunctionKind::Interpreted { node, .. } => {
                        node.params.iter().map(|p| p.name.to_string()).collect()
                    }
                    _ => Vec::new(),
                },
                source: func.source_text(),
            },
            JsValue::Array(items) => {
                let id = Rc::as_ptr(items) as *const () as usize;
                enter(stack, id)?;
                let converted = items
                    .borrow()
                    .iter()
                    .map(|item| Self::from_js_inner(item, stack))
                    .collect::<Result<Vec<_>, _>>();
                stack.pop();
                HostValue::Array(converted?)
            }
            JsValue::Object(entries) => {
                let id = Rc::as_ptr(entries) as *const () as usize;
                enter(stack, id)?;
                let converted = entries
                    .borrow()
                    .iter()
                    .map(|(key, item)| Ok((key.to_string(), Self::from_js_inner(item, stack)?)))
                    .collect::<Result<IndexMap<_, _>, JsError>>();
                stack.pop();
                HostValue::Object(converted?)
            }
        })
    }

    /// Materialize this value inside `interp`. Functions are re-evaluated
    /// from their source and close over the global scope only.
    pub fn to_js(&self, interp: &mut Interpreter) -> Result<JsValue, JsError> {
        Ok(match self {
            HostValue::Undefined => JsValue::Undefined,
            HostValue::Null => JsValue::Null,
            HostValue::Boolean(b) => JsValue::Boolean(*b),
            HostValue::Number(n) => JsValue::Number(*n),
            HostValue::String(s) => JsValue::from(s.as_str()),
            HostValue::Array(items) => JsValue::new_array(
                items
                    .iter()
                    .map(|item| item.to_js(interp))
                    .collect::<Result<_, _>>()?,
            ),
            HostValue::Object(entries) => {
                let mut converted = IndexMap::with_capacity(entries.len());
                for (key, item) in entries {
                    converted.insert(JsString::from(key.as_str()), item.to_js(interp)?);
                }
                JsValue::new_object(converted)
            }
            HostValue::RegExp { pattern, flags } => {
                JsValue::RegExp(Rc::new(JsRegExp::new(pattern.as_str(), flags.as_str())))
            }
            HostValue::Function { source, .. } => interp.eval(&format!("({})", source), &Scope::new())?,
        })
    }

    /// JSON form as produced by `JSON.stringify`; `None` when the value has
    /// no JSON representation
    pub fn to_json(&self) -> Option<serde_json::Value> {
        match self {
            HostValue::Undefined | HostValue::Function { .. } => None,
            HostValue::Null => Some(serde_json::Value::Null),
            HostValue::Boolean(b) => Some(serde_json::Value::Bool(*b)),
            HostValue::Number(n) => {
                Some(value_to_json(&JsValue::Number(*n)).ok().flatten().unwrap_or_default())
            }
            HostValue::String(s) => Some(serde_json::Value::String(s.clone())),
            HostValue::RegExp { .. } => Some(serde_json::Value::Object(serde_json::Map::new())),
            HostValue::Array(items) => Some(serde_json::Value::Array(
                items
                    .iter()
                    .map(|item| item.to_json().unwrap_or(serde_json::Value::Null))
                    .collect(),
            )),
            HostValue::Object(entries) => Some(serde_json::Value::Object(
                entries
                    .iter()
                    .filter_map(|(key, item)| Some((key.clone(), item.to_json()?)))
                    .collect(),
            )),
        }
    }

    /// Read a value decoded from an engine's JSON output
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => HostValue::Null,
            serde_json::Value::Bool(b) => HostValue::Boolean(*b),
            serde_json::Value::Number(n) => HostValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => HostValue::String(s.clone()),
            serde_json::Value::Array(items) => HostValue::Array(items.iter().map(Self::from_json).collect()),
            serde_json::Value::Object(entries) => HostValue::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), Self::from_json(value)))
                    .collect(),
            ),
        }
    }

    /// JSON text for embedding into generated scripts; values without a
    /// JSON form are written as `undefined`
    pub fn to_js_literal(&self) -> String {
        match self.to_json() {
            Some(json) => json.to_string(),
            None => "undefined".to_string(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HostValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

fn enter(stack: &mut Vec<usize>, id: usize) -> Result<(), JsError> {
    if stack.contains(&id) {
        return Err(JsError::type_error("Cannot convert a cyclic structure to a host value"));
    }
    stack.push(id);
    Ok(())
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Undefined => write!(f, "undefined"),
            HostValue::Function { source, .. } => write!(f, "{}", source),
            other => write!(f, "{}", other.to_js_literal()),
        }
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Boolean(b)
    }
}

impl From<f64> for HostValue {
    fn from(n: f64) -> Self {
        HostValue::Number(n)
    }
}

impl From<i32> for HostValue {
    fn from(n: i32) -> Self {
        HostValue::Number(f64::from(n))
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::String(s.to_string())
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::String(s)
    }
}

impl From<Vec<HostValue>> for HostValue {
    fn from(items: Vec<HostValue>) -> Self {
        HostValue::Array(items)
    }
}

impl From<serde_json::Value> for HostValue {
    fn from(json: serde_json::Value) -> Self {
        HostValue::from_json(&json)
    }
}
