//! Logging helpers on top of the `log` facade

use std::io::Write;

use log::{Level, LevelFilter, Log, Metadata, Record};

/// Logger handed to every backend; messages carry a `[JSI:<name>]` prefix
#[derive(Debug, Clone, Copy)]
pub struct JsiLogger {
    name: &'static str,
}

impl JsiLogger {
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn info(&self, message: impl std::fmt::Display) {
        log::info!(target: "jsinterp::jsi", "[JSI:{}] {}", self.name, message);
    }

    pub fn debug(&self, message: impl std::fmt::Display) {
        log::debug!(target: "jsinterp::jsi", "[JSI:{}] {}", self.name, message);
    }

    pub fn warning(&self, message: impl std::fmt::Display) {
        log::warn!(target: "jsinterp::jsi", "[JSI:{}] {}", self.name, message);
    }

    pub fn error(&self, message: impl std::fmt::Display) {
        log::error!(target: "jsinterp::jsi", "[JSI:{}] {}", self.name, message);
    }
}

/// Minimal logger writing `LEVEL message` lines to stderr
pub struct StderrLogger {
    level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let label = match record.level() {
            Level::Error => "ERROR",
            Level::Warn => "WARNING",
            Level::Info => "info",
            Level::Debug => "debug",
            Level::Trace => "trace",
        };
        let _ = writeln!(std::io::stderr().lock(), "{}: {}", label, record.args());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Install the stderr logger. `verbosity` 0 shows warnings, 1 info, 2 and
/// above debug output. Calling it twice keeps the first logger.
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let logger = Box::new(StderrLogger { level });
    if log::set_boxed_logger(logger).is_ok() {
        log::set_max_level(level);
    }
}
