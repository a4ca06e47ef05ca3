//! Error types for the evaluator and the backend dispatcher

use std::time::Duration;

use thiserror::Error;

use crate::value::JsValue;

/// Source location information for error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Error raised while parsing or evaluating guest code
#[derive(Debug, Error)]
pub enum JsError {
    #[error("SyntaxError: {message} at {location}")]
    SyntaxError {
        message: String,
        location: SourceLocation,
    },

    #[error("TypeError: {message}")]
    TypeError { message: String },

    #[error("ReferenceError: {name} is not defined")]
    ReferenceError { name: String },

    #[error("RangeError: {message}")]
    RangeError { message: String },

    /// The requested function could not be located in the source text
    #[error("Could not find JS function \"{name}\"")]
    NotFound { name: String },

    #[error("Execution timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Host-side precondition violated (e.g. writing through a frozen scope)
    #[error("{0}")]
    Usage(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// A guest `throw` that reached a function boundary without being caught
    #[error("Uncaught {0}")]
    Thrown(JsValue),
}

impl JsError {
    pub fn syntax_error(message: impl Into<String>, line: u32, column: u32) -> Self {
        JsError::SyntaxError {
            message: message.into(),
            location: SourceLocation { line, column },
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        JsError::TypeError {
            message: message.into(),
        }
    }

    pub fn reference_error(name: impl Into<String>) -> Self {
        JsError::ReferenceError { name: name.into() }
    }

    pub fn range_error(message: impl Into<String>) -> Self {
        JsError::RangeError {
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        JsError::Usage(message.into())
    }

    /// Whether a guest `try/catch` may intercept this error
    pub fn is_catchable(&self) -> bool {
        matches!(
            self,
            JsError::TypeError { .. }
                | JsError::ReferenceError { .. }
                | JsError::RangeError { .. }
                | JsError::Thrown(_)
        )
    }

    /// The value bound to a `catch` parameter for this error
    pub fn to_value(&self) -> JsValue {
        match self {
            JsError::Thrown(value) => value.clone(),
            JsError::TypeError { message } => JsValue::error_object("TypeError", message),
            JsError::ReferenceError { name } => {
                JsValue::error_object("ReferenceError", &format!("{} is not defined", name))
            }
            JsError::RangeError { message } => JsValue::error_object("RangeError", message),
            other => JsValue::error_object("Error", &other.to_string()),
        }
    }
}

/// Error raised by a backend or by the dispatcher
///
/// `Failed` records form a linked list through `previous`, so the error that
/// finally reaches the caller carries every backend attempt as its cause chain.
#[derive(Debug, Error)]
pub enum JsiError {
    /// The caller violated a precondition; never retried
    #[error("{0}")]
    Usage(String),

    /// This backend cannot perform the operation; the dispatcher skips it silently
    #[error("{jsi} does not support {operation}{}", format_hint(.hint))]
    NotSupported {
        jsi: String,
        operation: String,
        hint: Option<String>,
    },

    #[error("{0}")]
    Script(String),

    #[error("{exe} failed with returncode {}:\n{stderr}", format_code(.code))]
    ProcessFailed {
        exe: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{subject} timed out after {}s", .timeout.as_secs_f64())]
    Timeout { subject: String, timeout: Duration },

    #[error("malformed output: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// One failed backend attempt, chained to the attempt before it
    #[error("[{jsi}] {error}")]
    Failed {
        jsi: String,
        error: Box<JsiError>,
        #[source]
        previous: Option<Box<JsiError>>,
    },

    #[error("Unable to {operation}")]
    Exhausted {
        operation: String,
        #[source]
        last: Box<JsiError>,
    },

    #[error("No JS interpreter supports {operation}")]
    NoBackend { operation: String },
}

fn format_hint(hint: &Option<String>) -> String {
    match hint {
        Some(hint) => format!(". {}", hint),
        None => String::new(),
    }
}

fn format_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "<signal>".to_string(),
    }
}

impl JsiError {
    pub fn usage(message: impl Into<String>) -> Self {
        JsiError::Usage(message.into())
    }

    pub fn not_supported(jsi: impl Into<String>, operation: impl Into<String>) -> Self {
        JsiError::NotSupported {
            jsi: jsi.into(),
            operation: operation.into(),
            hint: None,
        }
    }

    pub fn is_not_supported(&self) -> bool {
        matches!(self, JsiError::NotSupported { .. })
    }

    pub fn is_usage(&self) -> bool {
        matches!(self, JsiError::Usage(_))
    }

    /// Failure records carried by this error, oldest attempt first
    pub fn attempts(&self) -> Vec<&JsiError> {
        let mut current = match self {
            JsiError::Exhausted { last, .. } => Some(last.as_ref()),
            other => Some(other),
        };
        let mut attempts = Vec::new();
        while let Some(record) = current {
            match record {
                JsiError::Failed { previous, .. } => {
                    attempts.push(record);
                    current = previous.as_deref();
                }
                _ => break,
            }
        }
        attempts.reverse();
        attempts
    }

    /// Name of the backend behind a `Failed` record
    pub fn backend(&self) -> Option<&str> {
        match self {
            JsiError::Failed { jsi, .. } => Some(jsi),
            _ => None,
        }
    }
}

impl From<JsError> for JsiError {
    fn from(error: JsError) -> Self {
        match error {
            JsError::Timeout { timeout_ms } => JsiError::Timeout {
                subject: "script".to_string(),
                timeout: Duration::from_millis(timeout_ms),
            },
            JsError::Usage(message) => JsiError::Usage(message),
            other => JsiError::Script(other.to_string()),
        }
    }
}
