//! Locating named definitions inside a larger script

use fancy_regex::Regex;

use crate::error::JsError;
use crate::parser::Parser;

fn header_pattern(name: &str) -> Result<Regex, JsError> {
    let name = fancy_regex::escape(name);
    let pattern = format!(
        r"(?x)
        (?:
            function\s+{name}
            |(?:^|[{{;,])\s*{name}\s*=\s*function
            |(?:var|const|let)\s+{name}\s*=\s*function
        )\s*
        (?P<open>\()"
    );
    Regex::new(&pattern).map_err(|e| JsError::Internal(e.to_string()))
}

/// Find `function NAME(...) {...}` or `NAME = function(...) {...}` in
/// `source` and return the function body with the source text of each
/// parameter, defaults and rest markers included
pub fn extract_function_code(name: &str, source: &str) -> Result<(String, Vec<String>), JsError> {
    let not_found = || JsError::NotFound {
        name: name.to_string(),
    };

    let captures = header_pattern(name)?
        .captures(source)
        .map_err(|e| JsError::Internal(e.to_string()))?
        .ok_or_else(not_found)?;
    let Some(open) = captures.name("open") else {
        return Err(not_found());
    };

    let header = source.get(open.start()..).ok_or_else(not_found)?;
    let (params, params_end) = Parser::new(header).param_list()?;
    let after_params = header.get(params_end..).ok_or_else(not_found)?;
    let rest = after_params.trim_start();
    if !rest.starts_with('{') {
        return Err(not_found());
    }
    let end = Parser::new(rest).block_end()?;
    // Strip the outer braces
    let body = rest
        .get(1..end.saturating_sub(1))
        .ok_or_else(not_found)?
        .to_string();

    Ok((body, params))
}

/// Find a `NAME = <expr>` definition and return the expression text
pub fn extract_definition<'a>(name: &str, source: &'a str) -> Result<Option<&'a str>, JsError> {
    let pattern = format!(
        r"(?:(?:var|let|const)\s+|(?:^|[{{;,])\s*){}\s*=(?!=)\s*",
        fancy_regex::escape(name)
    );
    let regex = Regex::new(&pattern).map_err(|e| JsError::Internal(e.to_string()))?;
    let Some(found) = regex.find(source).map_err(|e| JsError::Internal(e.to_string()))? else {
        return Ok(None);
    };

    let Some(rest) = source.get(found.end()..) else {
        return Ok(None);
    };
    let end = Parser::new(rest).expression_end()?;
    Ok(rest.get(..end))
}
