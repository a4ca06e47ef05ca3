//! Shared machinery for backends driving an external engine binary
//!
//! Every invocation writes the script to a temporary file, runs the engine
//! on it with a deadline and collects its output. Temporary files live in
//! [`TempPath`] guards and are removed on every exit path.

use std::ffi::OsStr;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use fancy_regex::Regex;
use tempfile::TempPath;

use crate::config::JsiContext;
use crate::error::JsiError;
use crate::host::HostValue;
use crate::logging::JsiLogger;

use super::{BuiltFunction, Jsi, decode_stdout, function_code};

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const TEMP_PREFIX: &str = "jsinterp_";

/// Captured result of a finished process
#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// An engine binary and the version found when it was probed
#[derive(Debug, Clone)]
pub struct ExternalProcess {
    logger: JsiLogger,
    exe: PathBuf,
    version: Option<String>,
}

impl ExternalProcess {
    /// Probe `exe` with `version_flag`. A binary that cannot be run has no
    /// version, which makes the backend unavailable.
    pub fn probe(name: &'static str, exe: PathBuf, version_flag: &str) -> Self {
        let logger = JsiLogger::new(name);
        let version = detect_version(&exe, version_flag, &logger);
        Self { logger, exe, version }
    }

    pub fn name(&self) -> &'static str {
        self.logger.name()
    }

    pub fn exe(&self) -> &Path {
        &self.exe
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn command(&self) -> Command {
        Command::new(&self.exe)
    }

    /// Write `code` to a temporary file, run the command built for it and
    /// return standard output. A non-zero exit status is a failure carrying
    /// the process's stderr.
    pub fn execute(
        &self,
        code: &str,
        timeout: Duration,
        make_cmd: impl FnOnce(&Path) -> Command,
    ) -> Result<String, JsiError> {
        let script = write_temp_file(code, ".js")?;
        let path: &Path = &script;
        let cmd = make_cmd(path);
        self.logger.debug(format!("command line: {}", shell_quote(&cmd)));

        let output = run_command(cmd, timeout, self.name())?;
        drop(script);

        if !output.status.success() {
            return Err(JsiError::ProcessFailed {
                exe: self.name().to_string(),
                code: output.status.code(),
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

/// A backend built on an [`ExternalProcess`]
pub trait ExternalJsi: Jsi {
    fn process(&self) -> &ExternalProcess;

    /// Command running the script at `jsfile`; `with_dom` when the script
    /// drives a page
    fn make_cmd(&self, jsfile: &Path, with_dom: bool) -> Command;

    /// Execute `code` and return its standard output
    fn execute(&self, code: &str, timeout: Duration, with_dom: bool) -> Result<String, JsiError> {
        self.process()
            .execute(code, timeout, |jsfile| self.make_cmd(jsfile, with_dom))
    }
}

/// [`Jsi::build_function`] for external engines: every call runs one script
/// printing the JSON of the result
pub fn build_function<'a, E: ExternalJsi + ?Sized>(
    jsi: &'a E,
    code: &str,
    params: &[String],
    timeout: Duration,
) -> BuiltFunction<'a> {
    let code = code.to_string();
    let params = params.to_vec();
    Box::new(move |args: &[HostValue]| {
        let stdout = jsi.execute(&function_code(&code, &params, args, false), timeout, false)?;
        decode_stdout(&stdout)
    })
}

/// Temporary files holding the cookie and document snapshots for one DOM run
pub struct DomSession {
    cookie_file: TempPath,
    html_file: TempPath,
}

impl DomSession {
    /// Snapshot the caller's cookies, scoped to `url`, and the document
    pub fn create(context: &JsiContext, url: &str, html: &str) -> Result<Self, JsiError> {
        let snapshot = context.cookies().snapshot(Some(url));
        let cookie_file = write_temp_file(&serde_json::to_string(&snapshot)?, ".json")?;
        let html_file = write_temp_file(html, ".html")?;
        Ok(Self { cookie_file, html_file })
    }

    /// Cookie file path as a JS string literal
    pub fn cookie_file_literal(&self) -> Result<String, JsiError> {
        path_literal(&self.cookie_file)
    }

    /// Document file path as a JS string literal
    pub fn html_file_literal(&self) -> Result<String, JsiError> {
        path_literal(&self.html_file)
    }

    /// Merge the cookies the engine saved into the caller's jar
    pub fn merge_cookies(&self, context: &JsiContext) -> Result<usize, JsiError> {
        context.cookies().merge_snapshot(&self.cookie_file)
    }

    pub fn read_html(&self) -> Result<String, JsiError> {
        Ok(fs::read_to_string(&self.html_file)?)
    }
}

/// Run a page script generated by `script` in a fresh [`DomSession`] and
/// return the final document with the script's standard output
pub fn run_with_dom<E: ExternalJsi + ?Sized>(
    jsi: &E,
    context: &JsiContext,
    url: &str,
    html: &str,
    timeout: Duration,
    script: impl FnOnce(&DomSession) -> Result<String, JsiError>,
) -> Result<(String, String), JsiError> {
    let session = DomSession::create(context, url, html)?;
    let result = jsi.execute(&script(&session)?, timeout, true);

    let merged = session.merge_cookies(context);
    let stdout = result?;
    let merged = merged?;
    jsi.logger().debug(format!("merged {} cookies", merged));
    Ok((session.read_html()?, stdout))
}

/// Write `contents` to a closed temporary file that is deleted when the
/// returned guard drops
pub fn write_temp_file(contents: &str, suffix: &str) -> Result<TempPath, JsiError> {
    let mut file = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(suffix)
        .tempfile()?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file.into_temp_path())
}

fn path_literal(path: &Path) -> Result<String, JsiError> {
    Ok(serde_json::to_string(&path.to_string_lossy())?)
}

/// Run `cmd` to completion, killing it once `timeout` elapses
pub fn run_command(mut cmd: Command, timeout: Duration, subject: &str) -> Result<ProcessOutput, JsiError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = cmd.spawn()?;

    let stdout = child.stdout.take().map(read_in_background);
    let stderr = child.stderr.take().map(read_in_background);

    let deadline = Instant::now() + timeout;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(JsiError::Timeout {
                subject: subject.to_string(),
                timeout,
            });
        }
        thread::sleep(POLL_INTERVAL);
    };

    let collect = |reader: Option<thread::JoinHandle<Vec<u8>>>| {
        let bytes = reader.map(|r| r.join().unwrap_or_default()).unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    };
    Ok(ProcessOutput {
        status,
        stdout: collect(stdout),
        stderr: collect(stderr),
    })
}

fn read_in_background<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        let _ = pipe.read_to_end(&mut buffer);
        buffer
    })
}

fn detect_version(exe: &Path, version_flag: &str, logger: &JsiLogger) -> Option<String> {
    let mut cmd = Command::new(exe);
    cmd.arg(version_flag);
    let output = match run_command(cmd, VERSION_PROBE_TIMEOUT, logger.name()) {
        Ok(output) => output,
        Err(err) => {
            logger.debug(format!("{} is unavailable: {}", exe.display(), err));
            return None;
        }
    };
    let version = parse_version(&format!("{}{}", output.stdout, output.stderr));
    logger.debug(format!("detected version {:?}", version));
    version
}

/// The first dotted number in a version banner
pub fn parse_version(banner: &str) -> Option<String> {
    let regex = Regex::new(r"(\d+(?:\.\d+)*)").ok()?;
    let captures = regex.captures(banner).ok()??;
    captures.get(1).map(|m| m.as_str().to_string())
}

/// Whether dotted `version` is at least `minimum`; missing components count
/// as zero
pub fn version_at_least(version: &str, minimum: &str) -> bool {
    let parse = |v: &str| -> Vec<u64> {
        v.split('.')
            .map(|part| part.parse().unwrap_or(0))
            .collect()
    };
    let (version, minimum) = (parse(version), parse(minimum));
    let len = version.len().max(minimum.len());
    for i in 0..len {
        let a = version.get(i).copied().unwrap_or(0);
        let b = minimum.get(i).copied().unwrap_or(0);
        if a != b {
            return a > b;
        }
    }
    true
}

/// Render a command line the way a POSIX shell would accept it
pub fn shell_quote(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(quote_arg)
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote_arg(arg: &OsStr) -> String {
    let arg = arg.to_string_lossy();
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "@%+=:,./-_".contains(c));
    if safe {
        arg.into_owned()
    } else {
        format!("'{}'", arg.replace('\'', "'\"'\"'"))
    }
}
