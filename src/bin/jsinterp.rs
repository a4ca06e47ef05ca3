//! Call a function from a script file through the backend dispatcher
//!
//! Usage: jsinterp [options] <script.js> <function> [json-arg...]
//!
//! Options:
//!   --backend <a,b>    Backends in priority order (default: native)
//!   --timeout <secs>   Bound on one backend invocation (default: 10)
//!   --config <file>    JSON configuration; flags override it
//!   -v, --verbose      More logging; repeat for debug output
//!
//! The JSON of the return value is printed on stdout.

use std::env;
use std::fs;
use std::path::PathBuf;

use jsinterp::{BackendKind, Dispatcher, HostValue, JsiConfig, JsiContext, logging};

struct Options {
    script: PathBuf,
    function: String,
    args: Vec<HostValue>,
    backends: Option<Vec<BackendKind>>,
    timeout_secs: Option<u64>,
    config: Option<PathBuf>,
    verbosity: u8,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn usage(program: &str) -> String {
    format!(
        "Usage: {} [--backend <a,b>] [--timeout <secs>] [--config <file>] [-v] <script.js> <function> [json-arg...]",
        program
    )
}

fn parse_args() -> Result<Options, String> {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map_or("jsinterp", |s| s.as_str());

    let mut backends = None;
    let mut timeout_secs = None;
    let mut config = None;
    let mut verbosity = 0u8;
    let mut positional: Vec<&str> = Vec::new();

    let mut i = 1;
    while let Some(arg) = args.get(i) {
        match arg.as_str() {
            "--backend" => {
                i += 1;
                let list = args.get(i).ok_or("--backend requires a value")?;
                let kinds = list
                    .split(',')
                    .map(str::parse::<BackendKind>)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| e.to_string())?;
                backends = Some(kinds);
            }
            "--timeout" => {
                i += 1;
                timeout_secs = Some(
                    args.get(i)
                        .ok_or("--timeout requires a value")?
                        .parse::<u64>()
                        .map_err(|_| "--timeout must be a positive integer".to_string())?,
                );
            }
            "--config" => {
                i += 1;
                config = Some(PathBuf::from(args.get(i).ok_or("--config requires a value")?));
            }
            "-v" | "--verbose" => verbosity = verbosity.saturating_add(1),
            "-h" | "--help" => return Err(usage(program)),
            other if other.starts_with('-') && other.len() > 1 && other.parse::<f64>().is_err() => {
                return Err(format!("Unknown option: {}", other));
            }
            other => positional.push(other),
        }
        i += 1;
    }

    let (script, function, rest) = match positional.as_slice() {
        [script, function, rest @ ..] => (*script, *function, rest),
        _ => return Err(usage(program)),
    };
    let args = rest
        .iter()
        .map(|arg| {
            serde_json::from_str::<serde_json::Value>(arg)
                .map(HostValue::from)
                .map_err(|e| format!("argument {:?} is not valid JSON: {}", arg, e))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Options {
        script: PathBuf::from(script),
        function: function.to_string(),
        args,
        backends,
        timeout_secs,
        config,
        verbosity,
    })
}

fn run() -> Result<(), String> {
    let options = parse_args()?;
    logging::init(options.verbosity);

    let mut config = match &options.config {
        Some(path) => JsiConfig::load(path).map_err(|e| format!("{}: {}", path.display(), e))?,
        None => JsiConfig::default(),
    };
    if let Some(backends) = options.backends {
        config.interpreters = backends;
    }
    if let Some(timeout_secs) = options.timeout_secs {
        config.timeout_secs = timeout_secs;
    }

    let code = fs::read_to_string(&options.script)
        .map_err(|e| format!("Failed to read {}: {}", options.script.display(), e))?;

    let dispatcher = Dispatcher::from_context(JsiContext::new(config));
    let result = dispatcher
        .evaluate_function(&options.function, &code, &options.args)
        .map_err(|e| {
            log::debug!("{}", jsinterp::dispatcher::describe_chain(&e));
            e.to_string()
        })?;

    println!("{}", result.to_js_literal());
    Ok(())
}
