//! Embedded JavaScript evaluator with a fallback dispatcher over external
//! DOM-capable engines
//!
//! # Example
//!
//! ```
//! use jsinterp::{Dispatcher, HostValue, JsiContext};
//!
//! let dispatcher = Dispatcher::from_context(JsiContext::default());
//! let code = "function sig(a) { return a.split('').reverse().join(''); }";
//! let result = dispatcher
//!     .evaluate_function("sig", code, &[HostValue::from("abc")])
//!     .unwrap();
//! assert_eq!(result, HostValue::from("cba"));
//! ```

pub mod ast;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod host;
pub mod interpreter;
pub mod jsi;
pub mod lexer;
pub mod logging;
pub mod parser;
pub mod scope;
pub mod value;

pub use config::{BackendKind, JsiConfig, JsiContext};
pub use dispatcher::{Dispatched, Dispatcher, Registry};
pub use error::{JsError, JsiError};
pub use host::HostValue;
pub use interpreter::Interpreter;
pub use jsi::cookies::{Cookie, CookieJar};
pub use jsi::{FunctionCode, JsInterpreter, Jsi, JsiResult, RunRequest};
pub use scope::Scope;
pub use value::{JsString, JsValue};

/// Stack that must remain before a recursive step moves onto a fresh segment
const STACK_RED_ZONE: usize = 128 * 1024;
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// Run one level of parser or evaluator recursion, growing the native stack
/// when it runs low
pub(crate) fn with_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, f)
}
