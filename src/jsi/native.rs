//! Backend running guest code on the embedded evaluator

use std::time::Duration;

use crate::config::JsiContext;
use crate::error::{JsError, JsiError};
use crate::host::HostValue;
use crate::interpreter::Interpreter;
use crate::scope::Scope;
use crate::value::{JsString, JsValue};

use super::{BuiltFunction, FunctionCode, Jsi};

/// The embedded evaluator. Always available; has no DOM.
#[derive(Debug, Clone, Default)]
pub struct NativeJsi {
    context: JsiContext,
}

impl NativeJsi {
    pub fn new(context: JsiContext) -> Self {
        Self { context }
    }
}

impl Jsi for NativeJsi {
    fn name(&self) -> &'static str {
        "native"
    }

    fn default_timeout(&self) -> Duration {
        self.context.config.timeout()
    }

    fn extract_function_code(&self, name: &str, full_code: &str) -> Result<FunctionCode, JsiError> {
        let (code, params) = Interpreter::extract_function_code(name, full_code)?;
        Ok(FunctionCode { code, params })
    }

    fn build_function<'a>(
        &'a self,
        code: &str,
        params: &[String],
        full_code: Option<&str>,
        timeout: Duration,
    ) -> Result<BuiltFunction<'a>, JsiError> {
        let mut interp = match full_code {
            Some(full_code) => Interpreter::new().with_full_code(full_code),
            None => Interpreter::new(),
        };
        let function = interp.build_function(code, params, &Scope::new())?;
        let logger = self.logger();

        Ok(Box::new(move |args: &[HostValue]| {
            interp.set_timeout(Some(timeout));
            let args = args
                .iter()
                .map(|arg| arg.to_js(&mut interp))
                .collect::<Result<Vec<_>, _>>()?;
            let result = interp.call_function(&function, JsValue::Undefined, &args);
            interp.set_timeout(None);
            if !interp.output.is_empty() {
                logger.debug(format!("console output:\n{}", interp.output.trim_end()));
                interp.output.clear();
            }
            Ok(HostValue::from_js(&result?)?)
        }))
    }
}

/// Evaluator bound to one script, resolving functions by name
///
/// `objects` are exposed to every function as a read-only outer namespace.
pub struct JsInterpreter {
    code: String,
    objects: Scope,
    interp: Interpreter,
}

impl JsInterpreter {
    pub fn new(code: impl Into<String>) -> Self {
        let code = code.into();
        let interp = Interpreter::new().with_full_code(&code);
        Self {
            code,
            objects: Scope::new().frozen(),
            interp,
        }
    }

    pub fn with_objects<K: Into<JsString>>(mut self, objects: impl IntoIterator<Item = (K, JsValue)>) -> Self {
        self.objects = Scope::with_bindings(objects.into_iter().map(|(name, value)| (name.into(), value))).frozen();
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.interp.set_timeout(timeout);
    }

    pub fn extract_function_code(&self, name: &str) -> Result<FunctionCode, JsError> {
        let (code, params) = Interpreter::extract_function_code(name, &self.code)?;
        Ok(FunctionCode { code, params })
    }

    /// The function `name` as a guest callable
    pub fn extract_function(&mut self, name: &str) -> Result<JsValue, JsError> {
        let function = self.extract_function_code(name)?;
        self.extract_function_from_code(&function)
    }

    pub fn extract_function_from_code(&mut self, function: &FunctionCode) -> Result<JsValue, JsError> {
        self.interp.build_function(&function.code, &function.params, &self.objects)
    }

    pub fn call_function(&mut self, name: &str, args: &[JsValue]) -> Result<JsValue, JsError> {
        let function = self.extract_function(name)?;
        self.interp.call_function(&function, JsValue::Undefined, args)
    }

    /// Direct access to the underlying evaluator
    pub fn interpreter(&mut self) -> &mut Interpreter {
        &mut self.interp
    }
}
