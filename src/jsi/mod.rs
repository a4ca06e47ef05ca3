//! The capability contract shared by every backend
//!
//! A backend ("JSI") can locate a function in a script, turn a function body
//! into something callable and, if it drives a browser-like engine, run code
//! against a loaded HTML document. [`Jsi::run`] composes these operations;
//! the [`Dispatcher`](crate::dispatcher::Dispatcher) picks which backend
//! performs them.

pub mod cookies;
pub mod deno;
pub mod external;
pub mod native;
pub mod phantomjs;

use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::JsiError;
use crate::host::HostValue;
use crate::logging::JsiLogger;

pub use self::deno::DenoJsi;
pub use self::native::{JsInterpreter, NativeJsi};
pub use self::phantomjs::PhantomJsJsi;

/// The call a DOM script must make to finish; it saves the page and cookies
/// and terminates the engine
pub const SAVE_AND_EXIT: &str = "saveAndExit();";

/// Document loaded when only a URL is supplied
pub const DEFAULT_HTML: &str = "<!DOCTYPE html>";

/// Location used when a document is supplied without a URL
pub const DEFAULT_URL: &str = "about:invalid";

/// A function located inside a larger script
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionCode {
    pub code: String,
    pub params: Vec<String>,
}

/// A callable produced by [`Jsi::build_function`]
pub type BuiltFunction<'a> = Box<dyn FnMut(&[HostValue]) -> Result<HostValue, JsiError> + 'a>;

/// Outcome of [`Jsi::run`]
#[derive(Debug, Clone, PartialEq)]
pub struct JsiResult {
    /// Return value of the function call, when one was requested
    pub return_value: Option<HostValue>,
    /// Final document after the script ran
    pub html: String,
    /// Everything the script wrote to standard output
    pub stdout: String,
}

impl Default for JsiResult {
    fn default() -> Self {
        Self {
            return_value: None,
            html: DEFAULT_HTML.to_string(),
            stdout: String::new(),
        }
    }
}

/// Arguments of [`Jsi::run`]
///
/// Without a URL or HTML, `func_code` is called directly with `func_args`.
/// Arguments bind to `func_params` positionally: missing ones are
/// `undefined` and surplus ones stay reachable through `arguments`.
/// Otherwise the code runs inside a page: either the function call wrapped
/// in `page.evaluate(...)`, or `full_code` verbatim, which must then contain
/// [`SAVE_AND_EXIT`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunRequest {
    pub func_code: Option<String>,
    /// Parameter source texts, defaults and rest markers included
    pub func_params: Vec<String>,
    pub func_args: Vec<HostValue>,
    pub full_code: Option<String>,
    pub html: Option<String>,
    pub url: Option<String>,
    /// Overrides the configured timeout
    pub timeout: Option<Duration>,
}

impl RunRequest {
    /// Call a function body with named arguments
    pub fn function(code: impl Into<String>, args: IndexMap<String, HostValue>) -> Self {
        let (params, args): (Vec<String>, Vec<HostValue>) = args.into_iter().unzip();
        Self {
            func_code: Some(code.into()),
            func_params: params,
            func_args: args,
            ..Self::default()
        }
    }

    /// Call a function body taking `params` with positional `args`
    pub fn call(code: impl Into<String>, params: &[String], args: &[HostValue]) -> Self {
        Self {
            func_code: Some(code.into()),
            func_params: params.to_vec(),
            func_args: args.to_vec(),
            ..Self::default()
        }
    }

    /// Run a whole page script
    pub fn page(full_code: impl Into<String>) -> Self {
        Self {
            full_code: Some(full_code.into()),
            ..Self::default()
        }
    }

    pub fn with_full_code(mut self, full_code: impl Into<String>) -> Self {
        self.full_code = Some(full_code.into());
        self
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Whether the request needs a DOM-capable backend
    pub fn uses_dom(&self) -> bool {
        non_empty(&self.url).is_some() || non_empty(&self.html).is_some()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// A JavaScript backend
pub trait Jsi: Send + Sync {
    /// Stable lowercase identifier
    fn name(&self) -> &'static str;

    /// Whether the backend can be used at all; probed once at construction
    fn available(&self) -> bool {
        true
    }

    /// Bound on one invocation when the request does not carry its own
    fn default_timeout(&self) -> Duration;

    fn logger(&self) -> JsiLogger {
        JsiLogger::new(self.name())
    }

    /// Locate the function `name` in `full_code`
    fn extract_function_code(&self, name: &str, full_code: &str) -> Result<FunctionCode, JsiError> {
        let _ = (name, full_code);
        Err(JsiError::not_supported(self.name(), "extract_function_code"))
    }

    /// Turn a function body into a callable. `full_code` is the script the
    /// body was taken from, for backends that resolve other definitions
    /// lazily.
    fn build_function<'a>(
        &'a self,
        code: &str,
        params: &[String],
        full_code: Option<&str>,
        timeout: Duration,
    ) -> Result<BuiltFunction<'a>, JsiError>;

    /// Load `html` at `url`, run `code` once loading finished and return the
    /// final document together with the script's standard output
    fn run_with_dom(&self, code: &str, url: &str, html: &str, timeout: Duration) -> Result<(String, String), JsiError> {
        let _ = (code, url, html, timeout);
        Err(JsiError::not_supported(self.name(), "run_with_dom"))
    }

    /// Run a function or a page script
    fn run(&self, request: &RunRequest) -> Result<JsiResult, JsiError> {
        run_request(self, request)
    }
}

/// The composition behind [`Jsi::run`]
pub fn run_request<J: Jsi + ?Sized>(jsi: &J, request: &RunRequest) -> Result<JsiResult, JsiError> {
    let func_code = non_empty(&request.func_code);
    let full_code = non_empty(&request.full_code);
    let html = non_empty(&request.html);
    if func_code.is_none() && full_code.is_none() && html.is_none() {
        return Err(JsiError::usage("Nothing to do without code and html"));
    }

    let timeout = request.timeout.unwrap_or_else(|| jsi.default_timeout());
    let url = non_empty(&request.url).or(html.map(|_| DEFAULT_URL));
    let html = html.unwrap_or(DEFAULT_HTML);

    let Some(url) = url else {
        let Some(func_code) = func_code else {
            return Err(JsiError::usage("Cannot run full_code without html or url"));
        };
        let mut function = jsi.build_function(func_code, &request.func_params, full_code, timeout)?;
        return Ok(JsiResult {
            return_value: Some(function(&request.func_args)?),
            ..JsiResult::default()
        });
    };

    let script = match func_code {
        Some(func_code) => {
            if full_code.is_some() {
                return Err(JsiError::usage("Cannot specify both func_code and full_code"));
            }
            format!("{}\n{}", function_code(func_code, &request.func_params, &request.func_args, true), SAVE_AND_EXIT)
        }
        None => {
            let full_code = full_code.unwrap_or(SAVE_AND_EXIT);
            if !full_code.contains(SAVE_AND_EXIT) {
                return Err(JsiError::usage(format!("{} must be present in full_code", SAVE_AND_EXIT)));
            }
            if !request.func_params.is_empty() || !request.func_args.is_empty() {
                return Err(JsiError::usage("Cannot specify func_args without func_code"));
            }
            full_code.to_string()
        }
    };

    let (html, stdout) = jsi.run_with_dom(&script, url, html, timeout)?;
    let return_value = match func_code {
        Some(_) => Some(decode_stdout(&stdout)?),
        None => None,
    };
    Ok(JsiResult {
        return_value,
        html,
        stdout,
    })
}

/// Decode the JSON line a function-call script printed. Only the last
/// non-empty line counts; `undefined` has no JSON form and is passed through.
pub fn decode_stdout(stdout: &str) -> Result<HostValue, JsiError> {
    let line = stdout.lines().map(str::trim).rev().find(|line| !line.is_empty()).unwrap_or("");
    if line == "undefined" {
        return Ok(HostValue::Undefined);
    }
    Ok(HostValue::from_json(&serde_json::from_str(line)?))
}

/// Script that calls `body` taking `params` with `args` and prints the JSON
/// of the result on one line. With `use_page` the call is evaluated inside
/// the page.
pub fn function_code(body: &str, params: &[String], args: &[HostValue], use_page: bool) -> String {
    let params = params.join(", ");
    let arg_string = args.iter().map(HostValue::to_js_literal).collect::<Vec<_>>().join(", ");
    let function = format!("function({}) {{\n{}\n}}", params, body);
    let call = if use_page {
        if arg_string.is_empty() {
            format!("page.evaluate({})", function)
        } else {
            format!("page.evaluate({}, {})", function, arg_string)
        }
    } else {
        format!("({})({})", function, arg_string)
    };
    format!("console.log(JSON.stringify({}));", call)
}
