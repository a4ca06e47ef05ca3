//! Backend configuration

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::JsiError;
use crate::jsi::cookies::CookieJar;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// The backends the dispatcher can be built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Native,
    PhantomJs,
    Deno,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [BackendKind::Native, BackendKind::PhantomJs, BackendKind::Deno];

    /// Stable lowercase identifier, also used as the logger name
    pub fn name(self) -> &'static str {
        match self {
            BackendKind::Native => "native",
            BackendKind::PhantomJs => "phantomjs",
            BackendKind::Deno => "deno",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = JsiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        BackendKind::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| JsiError::usage(format!("unknown JS interpreter \"{}\"", s)))
    }
}

/// Paths to external engines; `None` looks the binary up on `PATH`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Executables {
    pub phantomjs: Option<PathBuf>,
    pub deno: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsiConfig {
    pub user_agent: String,
    /// Bound on one backend invocation
    pub timeout_secs: u64,
    /// Backends in priority order
    pub interpreters: Vec<BackendKind>,
    pub executables: Executables,
    /// Show the browser window and keep engine output verbose
    pub debug: bool,
}

impl Default for JsiConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 10,
            interpreters: vec![BackendKind::Native],
            executables: Executables::default(),
            debug: false,
        }
    }
}

impl JsiConfig {
    pub fn from_json(text: &str) -> Result<Self, JsiError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, JsiError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Executable for `kind`, falling back to its conventional binary name
    pub fn executable(&self, kind: BackendKind) -> PathBuf {
        let configured = match kind {
            BackendKind::Native => None,
            BackendKind::PhantomJs => self.executables.phantomjs.clone(),
            BackendKind::Deno => self.executables.deno.clone(),
        };
        configured.unwrap_or_else(|| PathBuf::from(kind.name()))
    }
}

/// What every backend receives at construction: the configuration and the
/// caller's cookie jar
#[derive(Debug, Clone, Default)]
pub struct JsiContext {
    pub config: JsiConfig,
    cookies: Arc<Mutex<CookieJar>>,
}

impl JsiContext {
    pub fn new(config: JsiConfig) -> Self {
        Self {
            config,
            cookies: Arc::default(),
        }
    }

    pub fn with_cookies(config: JsiConfig, cookies: Arc<Mutex<CookieJar>>) -> Self {
        Self { config, cookies }
    }

    pub fn cookie_jar(&self) -> Arc<Mutex<CookieJar>> {
        Arc::clone(&self.cookies)
    }

    /// Lock the jar. A poisoned lock still holds a usable jar.
    pub fn cookies(&self) -> MutexGuard<'_, CookieJar> {
        self.cookies.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
