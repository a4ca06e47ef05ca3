//! Fallback dispatch over an ordered set of backends
//!
//! Each operation is tried on every available backend in priority order.
//! The first success wins. A backend that does not support the operation is
//! skipped quietly; any other failure is logged and chained onto the
//! failures before it, so the error the caller finally sees carries every
//! attempt. Caller mistakes ([`JsiError::Usage`]) stop the dispatch at once.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use serde::Serialize;

use crate::config::{BackendKind, JsiContext};
use crate::error::JsiError;
use crate::host::HostValue;
use crate::jsi::{DenoJsi, FunctionCode, Jsi, JsiResult, NativeJsi, PhantomJsJsi, RunRequest};

/// Builds a backend from the shared context
pub type Factory = Box<dyn Fn(&JsiContext) -> Box<dyn Jsi> + Send + Sync>;

struct Entry {
    name: String,
    factory: Factory,
    instance: OnceLock<Box<dyn Jsi>>,
}

/// Ordered list of backends the dispatcher may use
#[derive(Default)]
pub struct Registry {
    entries: Vec<Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry of the built-in backends, in the given order. Repeated kinds
    /// are registered once.
    pub fn from_kinds(kinds: &[BackendKind]) -> Self {
        kinds.iter().fold(Self::new(), |registry, &kind| match kind {
            BackendKind::Native => registry.register(kind.name(), |ctx| Box::new(NativeJsi::new(ctx.clone()))),
            BackendKind::PhantomJs => registry.register(kind.name(), |ctx| Box::new(PhantomJsJsi::new(ctx.clone()))),
            BackendKind::Deno => registry.register(kind.name(), |ctx| Box::new(DenoJsi::new(ctx.clone()))),
        })
    }

    /// Append a backend. A name that is already registered is ignored.
    pub fn register<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&JsiContext) -> Box<dyn Jsi> + Send + Sync + 'static,
    {
        let name = name.into();
        if !self.entries.iter().any(|entry| entry.name == name) {
            self.entries.push(Entry {
                name,
                factory: Box::new(factory),
                instance: OnceLock::new(),
            });
        }
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A successful dispatch together with the failures that preceded it
#[derive(Debug)]
pub struct Dispatched<T> {
    pub value: T,
    /// Name of the backend that succeeded
    pub jsi: &'static str,
    /// Chained failures of the backends tried before it
    pub previous: Option<JsiError>,
}

#[derive(Debug, Clone)]
enum Cached {
    Function(FunctionCode),
    Value(HostValue),
    Result(JsiResult),
}

/// Runs operations on the first backend able to perform them
pub struct Dispatcher {
    context: JsiContext,
    registry: Registry,
    memo: Mutex<HashMap<String, Cached>>,
}

impl Dispatcher {
    pub fn new(context: JsiContext, registry: Registry) -> Self {
        Self {
            context,
            registry,
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// Dispatcher over the backends listed in the configuration
    pub fn from_context(context: JsiContext) -> Self {
        let registry = Registry::from_kinds(&context.config.interpreters);
        Self::new(context, registry)
    }

    pub fn context(&self) -> &JsiContext {
        &self.context
    }

    /// Backend instance for `entry`, constructed on first use
    fn instance<'a>(&'a self, entry: &'a Entry) -> &'a dyn Jsi {
        let instance = entry.instance.get_or_init(|| {
            log::debug!("initializing JS interpreter {}", entry.name);
            (entry.factory)(&self.context)
        });
        &**instance
    }

    /// Available backends in priority order
    pub fn backends(&self) -> impl Iterator<Item = &dyn Jsi> {
        self.registry
            .entries
            .iter()
            .map(|entry| self.instance(entry))
            .filter(|jsi| {
                let available = jsi.available();
                if !available {
                    log::debug!("JS interpreter {} is unavailable", jsi.name());
                }
                available
            })
    }

    /// Names of the available backends
    pub fn available(&self) -> Vec<&'static str> {
        self.backends().map(|jsi| jsi.name()).collect()
    }

    /// Try `call` on every backend until one succeeds
    pub fn dispatch<T>(
        &self,
        operation: &str,
        mut call: impl FnMut(&dyn Jsi) -> Result<T, JsiError>,
    ) -> Result<Dispatched<T>, JsiError> {
        let mut last_error: Option<JsiError> = None;
        for jsi in self.backends() {
            let logger = jsi.logger();
            match call(jsi) {
                Ok(value) => {
                    return Ok(Dispatched {
                        value,
                        jsi: jsi.name(),
                        previous: last_error,
                    });
                }
                Err(err) if err.is_not_supported() => {
                    logger.debug(format!("skipped: {}", err));
                }
                Err(err) if err.is_usage() => return Err(err),
                Err(err) => {
                    logger.info(format!("Unable to {}: {}", operation, err));
                    let failure = JsiError::Failed {
                        jsi: jsi.name().to_string(),
                        error: Box::new(err),
                        previous: last_error.take().map(Box::new),
                    };
                    logger.debug(describe_chain(&failure));
                    last_error = Some(failure);
                }
            }
        }

        match last_error {
            Some(last) => Err(JsiError::Exhausted {
                operation: operation.to_string(),
                last: Box::new(last),
            }),
            None => Err(JsiError::NoBackend {
                operation: operation.to_string(),
            }),
        }
    }

    /// Locate the function `name` in `code`
    pub fn extract_function_code(&self, name: &str, code: &str) -> Result<FunctionCode, JsiError> {
        let key = memo_key(&("extract_function_code", name, code))?;
        if let Some(Cached::Function(function)) = self.cached(&key) {
            return Ok(function);
        }
        let function = self
            .dispatch("extract_function_code", |jsi| jsi.extract_function_code(name, code))?
            .value;
        self.remember(key, Cached::Function(function.clone()));
        Ok(function)
    }

    /// Run a request on the first capable backend. Requests without a page
    /// are pure and their results are memoized.
    pub fn run(&self, request: &RunRequest) -> Result<JsiResult, JsiError> {
        let key = if request.uses_dom() {
            None
        } else {
            Some(memo_key(&("run", request))?)
        };
        if let Some(Cached::Result(result)) = key.as_deref().and_then(|key| self.cached(key)) {
            return Ok(result);
        }
        let result = self.dispatch("run", |jsi| jsi.run(request))?.value;
        if let Some(key) = key {
            self.remember(key, Cached::Result(result.clone()));
        }
        Ok(result)
    }

    /// Call the function `name` defined in `code` with `args`. The function
    /// is located by the first backend able to extract it and run by the
    /// first backend able to run it, which need not be the same one.
    pub fn evaluate_function(&self, name: &str, code: &str, args: &[HostValue]) -> Result<HostValue, JsiError> {
        self.evaluate_function_with_timeout(name, code, args, None)
    }

    /// [`evaluate_function`](Self::evaluate_function) bounded by `timeout`
    /// instead of the configured one. Results are memoized per
    /// `(name, code, args, timeout)`.
    pub fn evaluate_function_with_timeout(
        &self,
        name: &str,
        code: &str,
        args: &[HostValue],
        timeout: Option<Duration>,
    ) -> Result<HostValue, JsiError> {
        let effective = timeout.unwrap_or_else(|| self.context.config.timeout());
        let key = memo_key(&("evaluate_function", name, code, args, effective))?;
        if let Some(Cached::Value(value)) = self.cached(&key) {
            return Ok(value);
        }

        let function = self.extract_function_code(name, code)?;
        let mut request = RunRequest::call(function.code, &function.params, args).with_full_code(code);
        if let Some(timeout) = timeout {
            request = request.with_timeout(timeout);
        }
        let value = self
            .dispatch("run", |jsi| jsi.run(&request))?
            .value
            .return_value
            .unwrap_or_default();
        self.remember(key, Cached::Value(value.clone()));
        Ok(value)
    }

    fn cached(&self, key: &str) -> Option<Cached> {
        self.memo.lock().ok()?.get(key).cloned()
    }

    fn remember(&self, key: String, value: Cached) {
        if let Ok(mut memo) = self.memo.lock() {
            memo.entry(key).or_insert(value);
        }
    }
}

/// Canonical form of an argument tuple
fn memo_key<T: Serialize + ?Sized>(args: &T) -> Result<String, JsiError> {
    Ok(serde_json::to_string(args)?)
}

/// Every attempt in a failure chain, oldest first, one per line
pub fn describe_chain(error: &JsiError) -> String {
    error
        .attempts()
        .iter()
        .map(|attempt| match attempt {
            JsiError::Failed { jsi, error, .. } => format!("{}: {}", jsi, error),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
