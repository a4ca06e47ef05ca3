//! Deno backend; DOM runs go through puppeteer

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use fancy_regex::Regex;

use crate::config::{BackendKind, JsiContext};
use crate::error::JsiError;

use super::external::{self, DomSession, ExternalJsi, ExternalProcess};
use super::{BuiltFunction, Jsi};

const MISSING_BROWSER: &str = "error: Uncaught Error: Could not find browser";
const INSTALL_HINT: &str = "Run: deno run -A https://deno.land/x/puppeteer@16.2.0/install.ts";

pub struct DenoJsi {
    context: JsiContext,
    process: ExternalProcess,
}

impl DenoJsi {
    pub fn new(context: JsiContext) -> Self {
        let exe = context.config.executable(BackendKind::Deno);
        let process = ExternalProcess::probe(BackendKind::Deno.name(), exe, "-V");
        Self { context, process }
    }

    pub fn version(&self) -> Option<&str> {
        self.process.version()
    }
}

impl Jsi for DenoJsi {
    fn name(&self) -> &'static str {
        BackendKind::Deno.name()
    }

    fn available(&self) -> bool {
        self.process.version().is_some()
    }

    fn default_timeout(&self) -> Duration {
        self.context.config.timeout()
    }

    fn build_function<'a>(
        &'a self,
        code: &str,
        params: &[String],
        _full_code: Option<&str>,
        timeout: Duration,
    ) -> Result<BuiltFunction<'a>, JsiError> {
        Ok(external::build_function(self, code, params, timeout))
    }

    fn run_with_dom(&self, code: &str, url: &str, html: &str, timeout: Duration) -> Result<(String, String), JsiError> {
        let config = &self.context.config;
        external::run_with_dom(self, &self.context, url, html, timeout, |session| {
            page_script(session, code, url, &config.user_agent, config.debug, timeout)
        })
    }
}

impl ExternalJsi for DenoJsi {
    fn process(&self) -> &ExternalProcess {
        &self.process
    }

    fn make_cmd(&self, jsfile: &Path, with_dom: bool) -> Command {
        let mut cmd = self.process.command();
        cmd.arg("run");
        if with_dom {
            cmd.arg("--allow-all");
        }
        cmd.arg(jsfile);
        cmd
    }

    fn execute(&self, code: &str, timeout: Duration, with_dom: bool) -> Result<String, JsiError> {
        match self.process.execute(code, timeout, |jsfile| self.make_cmd(jsfile, with_dom)) {
            Err(JsiError::ProcessFailed { stderr, .. }) if strip_terminal_sequences(&stderr).starts_with(MISSING_BROWSER) => {
                Err(JsiError::NotSupported {
                    jsi: self.name().to_string(),
                    operation: "run_with_dom".to_string(),
                    hint: Some(INSTALL_HINT.to_string()),
                })
            }
            other => other,
        }
    }
}

/// Remove ANSI colour and cursor sequences from engine output
fn strip_terminal_sequences(text: &str) -> String {
    match Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]") {
        Ok(regex) => regex.replace_all(text, "").into_owned(),
        Err(_) => text.to_string(),
    }
}

/// Puppeteer script: block every request, restore cookies and user agent,
/// fake the location, load `html`, then run `code`. Both the timeout and an
/// unexpected page close save state and exit with a failure status.
fn page_script(
    session: &DomSession,
    code: &str,
    url: &str,
    user_agent: &str,
    debug: bool,
    timeout: Duration,
) -> Result<String, JsiError> {
    let cookie_file = session.cookie_file_literal()?;
    let html_file = session.html_file_literal()?;
    let url = serde_json::to_string(url)?;
    let ua = serde_json::to_string(user_agent)?;
    let headless = !debug;
    let timeout = timeout.as_millis();
    Ok(format!(
        r#"
import puppeteer from "https://deno.land/x/puppeteer@16.2.0/mod.ts";
const browser = await puppeteer.launch({{
    headless: {headless},
    args: ["--disable-web-security"],
}});
const page = await browser.newPage();

async function saveAndExit(code) {{
    Deno.writeTextFileSync({cookie_file}, JSON.stringify(await page.cookies()));
    Deno.writeTextFileSync({html_file}, await page.content());
    await browser.close();
    Deno.exit(code);
}}
setTimeout(async () => await saveAndExit(1), {timeout});
page.on("close", async () => await saveAndExit(1));

await page.setRequestInterception(true);
page.on("request", request => request.abort());

await page.setCookie(...JSON.parse(await Deno.readTextFile({cookie_file})));
await page.setUserAgent({ua});
await page.evaluate("window.history.replaceState('', '', " + JSON.stringify({url}) + ")");
await page.setContent(await Deno.readTextFile({html_file}));

{code}
"#
    ))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::JsiConfig;

    fn missing_engine() -> DenoJsi {
        let mut config = JsiConfig::default();
        config.executables.deno = Some(PathBuf::from("/nonexistent/deno"));
        DenoJsi::new(JsiContext::new(config))
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let jsi = missing_engine();
        assert!(!jsi.available());
        assert_eq!(jsi.name(), "deno");
    }

    #[test]
    fn test_command_line() {
        let jsi = missing_engine();
        let plain = jsi.make_cmd(Path::new("/tmp/a.js"), false);
        let dom = jsi.make_cmd(Path::new("/tmp/a.js"), true);
        assert_eq!(external::shell_quote(&plain), "/nonexistent/deno run /tmp/a.js");
        assert_eq!(external::shell_quote(&dom), "/nonexistent/deno run --allow-all /tmp/a.js");
    }

    #[test]
    fn test_strip_terminal_sequences() {
        let stderr = "\x1b[0m\x1b[1m\x1b[31merror\x1b[0m: Uncaught Error: Could not find browser revision";
        assert!(strip_terminal_sequences(stderr).starts_with(MISSING_BROWSER));
    }

    #[test]
    fn test_page_script_headless_follows_debug() {
        let context = JsiContext::default();
        let session = DomSession::create(&context, "https://example.com/", "").unwrap();
        let script = page_script(&session, "saveAndExit();", "https://example.com/", "UA", false, Duration::from_secs(1)).unwrap();
        assert!(script.contains("headless: true,"));
        assert!(script.contains("setTimeout(async () => await saveAndExit(1), 1000);"));
        assert!(script.trim_end().ends_with("saveAndExit();"));

        let script = page_script(&session, "", "https://example.com/", "UA", true, Duration::from_secs(1)).unwrap();
        assert!(script.contains("headless: false,"));
    }
}
