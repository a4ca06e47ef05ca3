#![no_main]

use jsinterp::Interpreter;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    if source.len() > 100_000 {
        return;
    }

    // The first identifier-like word is used as the name to look up
    let name = source
        .split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
        .find(|word| !word.is_empty())
        .unwrap_or("f");
    let _ = Interpreter::extract_function_code(name, source);
});
