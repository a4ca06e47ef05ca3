//! Fallback, chaining and memoization behaviour of the dispatcher, driven by
//! scripted backends

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::indexing_slicing)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use jsinterp::dispatcher::describe_chain;
use jsinterp::jsi::{BuiltFunction, NativeJsi};
use jsinterp::{Dispatcher, FunctionCode, HostValue, Jsi, JsiContext, JsiError, Registry, RunRequest};

#[derive(Debug, Clone, Copy)]
enum Behavior {
    Return(f64),
    Fail(&'static str),
    TimeOut,
    Unsupported,
    Misuse,
}

struct Scripted {
    name: &'static str,
    behavior: Behavior,
    available: bool,
    /// External engines run code but cannot locate functions
    extracts: bool,
    calls: Arc<AtomicUsize>,
    timeouts: Arc<Mutex<Vec<Duration>>>,
}

impl Scripted {
    fn outcome(&self) -> Result<HostValue, JsiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Return(n) => Ok(HostValue::Number(n)),
            Behavior::Fail(message) => Err(JsiError::Script(message.to_string())),
            Behavior::TimeOut => Err(JsiError::Timeout {
                subject: self.name.to_string(),
                timeout: Duration::from_secs(1),
            }),
            Behavior::Unsupported => Err(JsiError::not_supported(self.name, "build_function")),
            Behavior::Misuse => Err(JsiError::usage("bad request")),
        }
    }
}

impl Jsi for Scripted {
    fn name(&self) -> &'static str {
        self.name
    }

    fn available(&self) -> bool {
        self.available
    }

    fn default_timeout(&self) -> Duration {
        Duration::from_secs(1)
    }

    fn extract_function_code(&self, name: &str, _full_code: &str) -> Result<FunctionCode, JsiError> {
        if !self.extracts {
            return Err(JsiError::not_supported(self.name, "extract_function_code"));
        }
        Ok(FunctionCode {
            code: format!("return {}", name),
            params: vec!["a".to_string()],
        })
    }

    fn build_function<'a>(
        &'a self,
        _code: &str,
        _params: &[String],
        _full_code: Option<&str>,
        timeout: Duration,
    ) -> Result<BuiltFunction<'a>, JsiError> {
        if let Ok(mut timeouts) = self.timeouts.lock() {
            timeouts.push(timeout);
        }
        Ok(Box::new(move |_args: &[HostValue]| self.outcome()))
    }

    fn run_with_dom(&self, _code: &str, _url: &str, html: &str, _timeout: Duration) -> Result<(String, String), JsiError> {
        let value = self.outcome()?;
        Ok((html.to_string(), format!("{}\n", value.to_js_literal())))
    }
}

/// Registers scripted backends and counts how often each one does work
struct Harness {
    registry: Registry,
    counters: Vec<(&'static str, Arc<AtomicUsize>)>,
    timeouts: Arc<Mutex<Vec<Duration>>>,
}

impl Harness {
    fn new() -> Self {
        Self {
            registry: Registry::new(),
            counters: Vec::new(),
            timeouts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn with(self, name: &'static str, behavior: Behavior) -> Self {
        self.add(name, behavior, true, true)
    }

    fn with_availability(self, name: &'static str, behavior: Behavior, available: bool) -> Self {
        self.add(name, behavior, available, true)
    }

    /// A backend that runs code but leaves extraction to others
    fn with_runner(self, name: &'static str, behavior: Behavior) -> Self {
        self.add(name, behavior, true, false)
    }

    fn with_native(mut self) -> Self {
        self.registry = self
            .registry
            .register("native", |ctx| Box::new(NativeJsi::new(ctx.clone())) as Box<dyn Jsi>);
        self
    }

    fn add(mut self, name: &'static str, behavior: Behavior, available: bool, extracts: bool) -> Self {
        let calls = Arc::new(AtomicUsize::new(0));
        let shared = Arc::clone(&calls);
        let timeouts = Arc::clone(&self.timeouts);
        self.registry = self.registry.register(name, move |_ctx| {
            Box::new(Scripted {
                name,
                behavior,
                available,
                extracts,
                calls: Arc::clone(&shared),
                timeouts: Arc::clone(&timeouts),
            }) as Box<dyn Jsi>
        });
        self.counters.push((name, calls));
        self
    }

    fn build(self) -> (Dispatcher, Vec<(&'static str, Arc<AtomicUsize>)>) {
        (Dispatcher::new(JsiContext::default(), self.registry), self.counters)
    }
}

fn calls(counters: &[(&'static str, Arc<AtomicUsize>)], name: &str) -> usize {
    counters
        .iter()
        .find(|(counter, _)| *counter == name)
        .map(|(_, calls)| calls.load(Ordering::SeqCst))
        .unwrap_or(0)
}

fn call_request() -> RunRequest {
    RunRequest::call("return a", &["a".to_string()], &[HostValue::Number(1.0)])
}

#[test]
fn test_falls_back_to_next_backend() {
    let (dispatcher, counters) = Harness::new()
        .with("broken", Behavior::Fail("boom"))
        .with("working", Behavior::Return(42.0))
        .build();

    let request = call_request();
    let dispatched = dispatcher.dispatch("run", |jsi| jsi.run(&request)).unwrap();
    assert_eq!(dispatched.jsi, "working");
    assert_eq!(dispatched.value.return_value, Some(HostValue::Number(42.0)));

    let previous = dispatched.previous.expect("the failed attempt is kept");
    assert_eq!(previous.backend(), Some("broken"));
    assert_eq!(describe_chain(&previous), "broken: boom");
    assert_eq!(calls(&counters, "broken"), 1);
}

#[test]
fn test_exhausted_chain_keeps_every_attempt() {
    let (dispatcher, _) = Harness::new()
        .with("first", Behavior::Fail("one"))
        .with("second", Behavior::TimeOut)
        .with("third", Behavior::Fail("three"))
        .build();

    let err = dispatcher.run(&call_request()).unwrap_err();
    assert!(matches!(err, JsiError::Exhausted { ref operation, .. } if operation == "run"));
    assert_eq!(err.to_string(), "Unable to run");

    let backends: Vec<_> = err.attempts().iter().filter_map(|attempt| attempt.backend()).collect();
    assert_eq!(backends, ["first", "second", "third"]);
    assert_eq!(
        describe_chain(&err),
        "first: one\nsecond: second timed out after 1s\nthird: three"
    );
}

#[test]
fn test_unsupported_backends_are_skipped() {
    let (dispatcher, _) = Harness::new()
        .with("cannot", Behavior::Unsupported)
        .with("can", Behavior::Return(1.0))
        .build();
    let dispatched = dispatcher.dispatch("run", |jsi| jsi.run(&call_request())).unwrap();
    assert_eq!(dispatched.jsi, "can");
    // Skipping is not a failure
    assert!(dispatched.previous.is_none());
}

#[test]
fn test_nothing_supported_is_no_backend() {
    let (dispatcher, _) = Harness::new().with("cannot", Behavior::Unsupported).build();
    let err = dispatcher.run(&call_request()).unwrap_err();
    assert!(matches!(err, JsiError::NoBackend { ref operation } if operation == "run"));
    assert!(err.attempts().is_empty());
}

#[test]
fn test_usage_error_stops_dispatch() {
    let (dispatcher, counters) = Harness::new()
        .with("strict", Behavior::Misuse)
        .with("lenient", Behavior::Return(1.0))
        .build();
    let err = dispatcher.run(&call_request()).unwrap_err();
    assert!(matches!(err, JsiError::Usage(_)));
    assert_eq!(calls(&counters, "lenient"), 0);
}

#[test]
fn test_invalid_request_is_usage_error() {
    let (dispatcher, counters) = Harness::new().with("working", Behavior::Return(1.0)).build();
    let err = dispatcher.run(&RunRequest::default()).unwrap_err();
    assert!(matches!(err, JsiError::Usage(_)));

    let err = dispatcher
        .run(&RunRequest::page("console.log(1)").with_url("https://example.com/"))
        .unwrap_err();
    assert!(err.to_string().contains("saveAndExit();"));
    assert_eq!(calls(&counters, "working"), 0);
}

#[test]
fn test_unavailable_backends_are_skipped() {
    let (dispatcher, counters) = Harness::new()
        .with_availability("missing", Behavior::Return(1.0), false)
        .with("present", Behavior::Return(2.0))
        .build();
    assert_eq!(dispatcher.available(), ["present"]);
    assert_eq!(dispatcher.evaluate_function("f", "", &[]).unwrap(), HostValue::Number(2.0));
    assert_eq!(calls(&counters, "missing"), 0);
}

#[test]
fn test_results_are_memoized_per_arguments() {
    let (dispatcher, counters) = Harness::new().with("working", Behavior::Return(5.0)).build();

    let args = [HostValue::from("x")];
    assert_eq!(dispatcher.evaluate_function("f", "code", &args).unwrap(), HostValue::Number(5.0));
    assert_eq!(dispatcher.evaluate_function("f", "code", &args).unwrap(), HostValue::Number(5.0));
    assert_eq!(calls(&counters, "working"), 1);

    dispatcher.evaluate_function("f", "code", &[HostValue::from("y")]).unwrap();
    dispatcher.evaluate_function("g", "code", &args).unwrap();
    assert_eq!(calls(&counters, "working"), 3);

    dispatcher.run(&call_request()).unwrap();
    dispatcher.run(&call_request()).unwrap();
    assert_eq!(calls(&counters, "working"), 4);
}

#[test]
fn test_failures_are_not_memoized() {
    let (dispatcher, counters) = Harness::new().with("broken", Behavior::Fail("boom")).build();
    assert!(dispatcher.evaluate_function("f", "code", &[]).is_err());
    assert!(dispatcher.evaluate_function("f", "code", &[]).is_err());
    assert_eq!(calls(&counters, "broken"), 2);
}

#[test]
fn test_page_runs_are_not_memoized() {
    let (dispatcher, counters) = Harness::new().with("browser", Behavior::Return(7.0)).build();
    let request = call_request().with_url("https://example.com/");
    assert!(request.uses_dom());

    let result = dispatcher.run(&request).unwrap();
    assert_eq!(result.return_value, Some(HostValue::Number(7.0)));
    assert_eq!(result.html, "<!DOCTYPE html>");
    dispatcher.run(&request).unwrap();
    assert_eq!(calls(&counters, "browser"), 2);
}

#[test]
fn test_default_context_uses_native_backend() {
    let dispatcher = Dispatcher::from_context(JsiContext::default());
    assert_eq!(dispatcher.available(), ["native"]);
    let function = dispatcher
        .extract_function_code("f", "function f(a, b) { return a * b; }")
        .unwrap();
    let request = RunRequest::call(function.code, &function.params, &[HostValue::Number(6.0), HostValue::Number(7.0)]);
    assert_eq!(dispatcher.run(&request).unwrap().return_value, Some(HostValue::Number(42.0)));
}

#[test]
fn test_native_cannot_load_pages() {
    let dispatcher = Dispatcher::from_context(JsiContext::default());
    let err = dispatcher
        .run(&RunRequest::page("saveAndExit();").with_url("https://example.com/"))
        .unwrap_err();
    assert!(matches!(err, JsiError::NoBackend { .. }));
}

#[test]
fn test_extraction_and_run_may_use_different_backends() {
    let (dispatcher, counters) = Harness::new()
        .with_runner("engine", Behavior::Return(99.0))
        .with_native()
        .build();
    let value = dispatcher
        .evaluate_function("f", "function f(a) { return a + 1; }", &[HostValue::Number(1.0)])
        .unwrap();
    assert_eq!(value, HostValue::Number(99.0));
    assert_eq!(calls(&counters, "engine"), 1);
}

#[test]
fn test_run_falls_back_after_extraction() {
    let (dispatcher, counters) = Harness::new()
        .with_runner("engine", Behavior::Fail("crashed"))
        .with_native()
        .build();
    let value = dispatcher
        .evaluate_function("f", "function f(a) { return a + 1; }", &[HostValue::Number(1.0)])
        .unwrap();
    assert_eq!(value, HostValue::Number(2.0));
    assert_eq!(calls(&counters, "engine"), 1);
}

#[test]
fn test_nobody_extracts() {
    let (dispatcher, counters) = Harness::new().with_runner("engine", Behavior::Return(1.0)).build();
    let err = dispatcher.evaluate_function("f", "function f() {}", &[]).unwrap_err();
    assert!(matches!(err, JsiError::NoBackend { ref operation } if operation == "extract_function_code"));
    assert_eq!(calls(&counters, "engine"), 0);
}

#[test]
fn test_arguments_bind_positionally() {
    let dispatcher = Dispatcher::from_context(JsiContext::default());
    let missing = dispatcher
        .evaluate_function("f", "function f(a, b) { return b === undefined; }", &[HostValue::Number(1.0)])
        .unwrap();
    assert_eq!(missing, HostValue::Boolean(true));

    let surplus = dispatcher
        .evaluate_function(
            "g",
            "function g(a) { return arguments.length * 10 + a; }",
            &[HostValue::Number(1.0), HostValue::Null, HostValue::Null],
        )
        .unwrap();
    assert_eq!(surplus, HostValue::Number(31.0));
}

#[test]
fn test_timeout_is_part_of_the_memo_key() {
    let harness = Harness::new().with("working", Behavior::Return(5.0));
    let timeouts = Arc::clone(&harness.timeouts);
    let (dispatcher, counters) = harness.build();

    let short = Some(Duration::from_millis(500));
    let long = Some(Duration::from_secs(5));
    dispatcher.evaluate_function_with_timeout("f", "code", &[], short).unwrap();
    dispatcher.evaluate_function_with_timeout("f", "code", &[], short).unwrap();
    assert_eq!(calls(&counters, "working"), 1);

    dispatcher.evaluate_function_with_timeout("f", "code", &[], long).unwrap();
    assert_eq!(calls(&counters, "working"), 2);
    assert_eq!(*timeouts.lock().unwrap(), [Duration::from_millis(500), Duration::from_secs(5)]);

    // No override means the configured timeout
    let configured = JsiContext::default().config.timeout();
    dispatcher.evaluate_function("f", "code", &[]).unwrap();
    dispatcher.evaluate_function_with_timeout("f", "code", &[], Some(configured)).unwrap();
    assert_eq!(calls(&counters, "working"), 3);
}
