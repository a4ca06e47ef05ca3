//! PhantomJS backend

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use crate::config::{BackendKind, JsiContext};
use crate::error::JsiError;

use super::external::{self, DomSession, ExternalJsi, ExternalProcess};
use super::{BuiltFunction, Jsi};

/// Oldest release whose cookie and page APIs the page script relies on
pub const MIN_VERSION: &str = "2.0";

const EXIT_CALL: &str = "phantom.exit();";

/// Reports uncaught errors on stderr and exits with a failure status
const BASE_JS: &str = r#"
phantom.onError = function(msg, trace) {
    var msgStack = ['PHANTOM ERROR: ' + msg];
    if (trace && trace.length) {
        msgStack.push('TRACE:');
        trace.forEach(function(t) {
            msgStack.push(' -> ' + (t.file || t.sourceURL) + ': ' + t.line
                + (t.function ? ' (in function ' + t.function + ')' : ''));
        });
    }
    console.error(msgStack.join('\n'));
    phantom.exit(1);
};
"#;

pub struct PhantomJsJsi {
    context: JsiContext,
    process: ExternalProcess,
}

impl PhantomJsJsi {
    pub fn new(context: JsiContext) -> Self {
        let exe = context.config.executable(BackendKind::PhantomJs);
        let process = ExternalProcess::probe(BackendKind::PhantomJs.name(), exe, "--version");
        Self { context, process }
    }

    pub fn version(&self) -> Option<&str> {
        self.process.version()
    }
}

impl Jsi for PhantomJsJsi {
    fn name(&self) -> &'static str {
        BackendKind::PhantomJs.name()
    }

    fn available(&self) -> bool {
        self.process
            .version()
            .is_some_and(|version| external::version_at_least(version, MIN_VERSION))
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
        external::run_with_dom(self, &self.context, url, html, timeout, |session| {
            page_script(session, code, url, &self.context.config.user_agent, timeout)
        })
    }
}

impl ExternalJsi for PhantomJsJsi {
    fn process(&self) -> &ExternalProcess {
        &self.process
    }

    fn make_cmd(&self, jsfile: &Path, _with_dom: bool) -> Command {
        let mut cmd = self.process.command();
        cmd.arg("--ssl-protocol=any").arg(jsfile);
        cmd
    }

    fn execute(&self, code: &str, timeout: Duration, with_dom: bool) -> Result<String, JsiError> {
        let mut script = format!("{}{}", BASE_JS, code);
        if !code.contains(EXIT_CALL) {
            script.push_str(";\n");
            script.push_str(EXIT_CALL);
        }
        self.process
            .execute(&script, timeout, |jsfile| self.make_cmd(jsfile, with_dom))
    }
}

/// Page script: restore cookies, load `html` at `url` without touching the
/// network, then run `code` once loading finished
fn page_script(
    session: &DomSession,
    code: &str,
    url: &str,
    user_agent: &str,
    timeout: Duration,
) -> Result<String, JsiError> {
    let cookie_file = session.cookie_file_literal()?;
    let html_file = session.html_file_literal()?;
    let url = serde_json::to_string(url)?;
    let ua = serde_json::to_string(user_agent)?;
    let timeout = timeout.as_millis();
    Ok(format!(
        r#"
var page = require('webpage').create();
var fs = require('fs');
var read = {{ mode: 'r', charset: 'utf-8' }};
var write = {{ mode: 'w', charset: 'utf-8' }};
JSON.parse(fs.read({cookie_file}, read)).forEach(function(x) {{
    phantom.addCookie(x);
}});
page.settings.resourceTimeout = {timeout};
page.settings.userAgent = {ua};
page.onLoadStarted = function() {{
    page.evaluate(function() {{
        delete window._phantom;
        delete window.callPhantom;
    }});
}};
var saveAndExit = function() {{
    fs.write({html_file}, page.content, write);
    fs.write({cookie_file}, JSON.stringify(phantom.cookies), write);
    phantom.exit();
}};
page.onLoadFinished = function(status) {{
    if (page.url === "") {{
        page.setContent(fs.read({html_file}, read), {url});
    }}
    else {{
        {code}
    }}
}};
page.open("");
"#
    ))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::JsiConfig;

    fn missing_engine() -> PhantomJsJsi {
        let mut config = JsiConfig::default();
        config.executables.phantomjs = Some(PathBuf::from("/nonexistent/phantomjs"));
        PhantomJsJsi::new(JsiContext::new(config))
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let jsi = missing_engine();
        assert!(!jsi.available());
        assert_eq!(jsi.version(), None);
        assert_eq!(jsi.name(), "phantomjs");
    }

    #[test]
    fn test_command_line() {
        let jsi = missing_engine();
        let cmd = jsi.make_cmd(Path::new("/tmp/script.js"), true);
        assert_eq!(external::shell_quote(&cmd), "/nonexistent/phantomjs --ssl-protocol=any /tmp/script.js");
    }

    #[test]
    fn test_page_script_embeds_literals() {
        let context = JsiContext::default();
        let session = DomSession::create(&context, "https://example.com/", "<p>hi</p>").unwrap();
        let script = page_script(
            &session,
            "saveAndExit();",
            "https://example.com/",
            "Agent \"1\"",
            Duration::from_secs(3),
        )
        .unwrap();
        assert!(script.contains(r#"page.settings.userAgent = "Agent \"1\"";"#));
        assert!(script.contains("page.settings.resourceTimeout = 3000;"));
        assert!(script.contains(r#"page.setContent(fs.read("#));
        assert!(script.contains(r#", "https://example.com/");"#));
        assert!(script.contains(&session.cookie_file_literal().unwrap()));
    }
}
