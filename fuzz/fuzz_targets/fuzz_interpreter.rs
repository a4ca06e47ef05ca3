#![no_main]

use std::time::Duration;

use jsinterp::{HostValue, Interpreter, Scope};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    // Evaluation costs far more per byte than parsing
    if source.len() > 10_000 {
        return;
    }

    let mut interp = Interpreter::new();
    interp.set_timeout(Some(Duration::from_millis(200)));
    if let Ok(value) = interp.eval(source, &Scope::new()) {
        // Host conversion may reject cycles but must not panic
        if let Ok(host) = HostValue::from_js(&value) {
            let _ = host.to_js_literal();
        }
    }
});
