//! Integration tests for the evaluator, organized by feature
//!
//! Most tests go through the dispatcher with only the native backend
//! configured, which is how callers reach the evaluator. `eval` runs a
//! program directly for tests that need guest values.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::indexing_slicing)]

mod arrays;
mod basics;
mod control_flow;
mod date;
mod extraction;
mod functions;
mod json_math;
mod objects;
mod regexp;
mod strings;

use jsinterp::{Dispatcher, HostValue, Interpreter, JsError, JsValue, JsiContext, JsiError, Scope};

/// Call the function `name` defined in `code` through the dispatcher
pub fn call(code: &str, name: &str, args: &[HostValue]) -> HostValue {
    let dispatcher = Dispatcher::from_context(JsiContext::default());
    match dispatcher.evaluate_function(name, code, args) {
        Ok(value) => value,
        Err(err) => panic!("calling {} failed: {}\n{}", name, err, jsinterp::dispatcher::describe_chain(&err)),
    }
}

/// Like [`call`], returning the error
pub fn call_err(code: &str, name: &str, args: &[HostValue]) -> JsiError {
    let dispatcher = Dispatcher::from_context(JsiContext::default());
    match dispatcher.evaluate_function(name, code, args) {
        Ok(value) => panic!("calling {} unexpectedly returned {}", name, value),
        Err(err) => err,
    }
}

/// The message of the single backend failure behind `err`
pub fn failure_message(err: &JsiError) -> String {
    match err.attempts().last() {
        Some(JsiError::Failed { error, .. }) => error.to_string(),
        _ => err.to_string(),
    }
}

pub fn eval(source: &str) -> JsValue {
    match Interpreter::new().eval(source, &Scope::new()) {
        Ok(value) => value,
        Err(err) => panic!("evaluating failed: {}", err),
    }
}

pub fn eval_err(source: &str) -> JsError {
    match Interpreter::new().eval(source, &Scope::new()) {
        Ok(value) => panic!("evaluation unexpectedly returned {:?}", value),
        Err(err) => err,
    }
}

pub fn num(n: f64) -> HostValue {
    HostValue::Number(n)
}

pub fn array<T: Into<HostValue>>(items: impl IntoIterator<Item = T>) -> HostValue {
    HostValue::Array(items.into_iter().map(Into::into).collect())
}

pub fn is_nan(value: &HostValue) -> bool {
    matches!(value, HostValue::Number(n) if n.is_nan())
}
