//! String built-in methods
//!
//! Indices and lengths are measured in UTF-16 code units, as in JavaScript.

use std::rc::Rc;

use crate::error::JsError;
use crate::interpreter::{Interpreter, MAX_STRING_LENGTH};
use crate::value::{JsRegExp, JsString, JsValue};

use super::regexp::{exec_at, expand_replacement, match_to_array};
use super::{arg, create_constructor, register_method, relative_index};

/// Initialize the string method table
pub fn init_string_prototype(interp: &mut Interpreter) {
    let proto = interp.string_prototype.clone();

    // Character access
    register_method(&proto, "charAt", string_char_at, 1);
    register_method(&proto, "charCodeAt", string_char_code_at, 1);

    // Search methods
    register_method(&proto, "indexOf", string_index_of, 1);
    register_method(&proto, "lastIndexOf", string_last_index_of, 1);
    register_method(&proto, "includes", string_includes, 1);
    register_method(&proto, "startsWith", string_starts_with, 1);
    register_method(&proto, "endsWith", string_ends_with, 1);
    register_method(&proto, "match", string_match, 1);
    register_method(&proto, "search", string_search, 1);

    // Extraction methods
    register_method(&proto, "slice", string_slice, 2);
    register_method(&proto, "substring", string_substring, 2);
    register_method(&proto, "substr", string_substr, 2);

    // Case conversion
    register_method(&proto, "toLowerCase", string_to_lower_case, 0);
    register_method(&proto, "toUpperCase", string_to_upper_case, 0);

    // Whitespace handling
    register_method(&proto, "trim", string_trim, 0);

    // Transformation methods
    register_method(&proto, "split", string_split, 2);
    register_method(&proto, "repeat", string_repeat, 1);
    register_method(&proto, "replace", string_replace, 2);
    register_method(&proto, "replaceAll", string_replace_all, 2);
    register_method(&proto, "padStart", string_pad_start, 2);
    register_method(&proto, "padEnd", string_pad_end, 2);
    register_method(&proto, "concat", string_concat, 1);

    register_method(&proto, "toString", string_to_string, 0);
    register_method(&proto, "valueOf", string_to_string, 0);
}

/// `String` converts its argument; `String.fromCharCode` builds from code units
pub fn create_string_constructor() -> JsValue {
    let constructor = create_constructor("String", 1, string_constructor, string_constructor);
    let statics = constructor.properties.clone();
    register_method(&statics, "fromCharCode", string_from_char_code, 1);
    JsValue::Function(constructor)
}

pub fn string_constructor(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(match args.first() {
        None => JsValue::from(""),
        Some(value) => JsValue::String(value.to_js_string()),
    })
}

fn this_string(this: &JsValue) -> Result<JsString, JsError> {
    match this {
        JsValue::Undefined | JsValue::Null => Err(JsError::type_error(
            "String.prototype method called on null or undefined",
        )),
        other => Ok(other.to_js_string()),
    }
}

fn units(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

fn from_units(units: &[u16]) -> JsValue {
    JsValue::from(String::from_utf16_lossy(units))
}

/// The single code unit at `index` as a string
pub fn code_unit_string(s: &str, index: usize) -> Option<JsString> {
    let unit = s.encode_utf16().nth(index)?;
    Some(JsString::from(String::from_utf16_lossy(&[unit])))
}

/// Integer argument with NaN treated as zero
fn integer_arg(args: &[JsValue], index: usize) -> f64 {
    let n = arg(args, index).to_number();
    if n.is_nan() { 0.0 } else { n.trunc() }
}

fn find_units(haystack: &[u16], needle: &[u16], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(from.min(haystack.len()));
    }
    let last_start = haystack.len().checked_sub(needle.len())?;
    (from..=last_start).find(|&i| haystack.get(i..i + needle.len()) == Some(needle))
}

pub fn string_to_string(_interp: &mut Interpreter, this: &JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::String(this_string(this)?))
}

pub fn string_char_at(_interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let s = this_string(this)?;
    let index = integer_arg(args, 0);
    if index < 0.0 {
        return Ok(JsValue::from(""));
    }
    Ok(code_unit_string(&s, index as usize)
        .map(JsValue::String)
        .unwrap_or_else(|| JsValue::from("")))
}

/// Out-of-range indices give `undefined`
pub fn string_char_code_at(_interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let s = this_string(this)?;
    let index = integer_arg(args, 0);
    if index < 0.0 {
        return Ok(JsValue::Undefined);
    }
    Ok(s.encode_utf16()
        .nth(index as usize)
        .map(|unit| JsValue::Number(f64::from(unit)))
        .unwrap_or_default())
}

pub fn string_from_char_code(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let units: Vec<u16> = args
        .iter()
        .map(|value| crate::value::to_uint32(value.to_number()) as u16)
        .collect();
    Ok(from_units(&units))
}

pub fn string_index_of(_interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let s = units(&this_string(this)?);
    let needle = units(&arg(args, 0).to_js_string());
    let from = integer_arg(args, 1).max(0.0) as usize;
    Ok(find_units(&s, &needle, from)
        .map(|i| JsValue::from(i))
        .unwrap_or(JsValue::Number(-1.0)))
}

pub fn string_last_index_of(_interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let s = units(&this_string(this)?);
    let needle = units(&arg(args, 0).to_js_string());
    let Some(last_start) = s.len().checked_sub(needle.len()) else {
        return Ok(JsValue::Number(-1.0));
    };
    let from = match arg(args, 1) {
        JsValue::Undefined => last_start,
        value => {
            let n = value.to_number();
            if n.is_nan() { last_start } else { (n.max(0.0) as usize).min(last_start) }
        }
    };
    Ok((0..=from)
        .rev()
        .find(|&i| s.get(i..i + needle.len()) == Some(needle.as_slice()))
        .map(JsValue::from)
        .unwrap_or(JsValue::Number(-1.0)))
}

pub fn string_includes(_interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let s = units(&this_string(this)?);
    let needle = units(&arg(args, 0).to_js_string());
    let from = integer_arg(args, 1).max(0.0) as usize;
    Ok(JsValue::Boolean(find_units(&s, &needle, from).is_some()))
}

pub fn string_starts_with(_interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let s = units(&this_string(this)?);
    let needle = units(&arg(args, 0).to_js_string());
    let from = (integer_arg(args, 1).max(0.0) as usize).min(s.len());
    Ok(JsValue::Boolean(
        s.get(from..).is_some_and(|rest| rest.starts_with(&needle)),
    ))
}

pub fn string_ends_with(_interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let s = units(&this_string(this)?);
    let needle = units(&arg(args, 0).to_js_string());
    let end = relative_index(&arg(args, 1), s.len(), s.len());
    Ok(JsValue::Boolean(
        s.get(..end).is_some_and(|head| head.ends_with(&needle)),
    ))
}

pub fn string_slice(_interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let s = units(&this_string(this)?);
    let start = relative_index(&arg(args, 0), s.len(), 0);
    let end = relative_index(&arg(args, 1), s.len(), s.len());
    Ok(from_units(s.get(start..end.max(start)).unwrap_or_default()))
}

pub fn string_substring(_interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let s = units(&this_string(this)?);
    let clamp = |value: JsValue, default: usize| match value {
        JsValue::Undefined => default,
        value => {
            let n = value.to_number();
            if n.is_nan() { 0 } else { n.max(0.0).min(s.len() as f64) as usize }
        }
    };
    let start = clamp(arg(args, 0), 0);
    let end = clamp(arg(args, 1), s.len());
    let (start, end) = if start > end { (end, start) } else { (start, end) };
    Ok(from_units(s.get(start..end).unwrap_or_default()))
}

pub fn string_substr(_interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let s = units(&this_string(this)?);
    let start = relative_index(&arg(args, 0), s.len(), 0);
    let length = match arg(args, 1) {
        JsValue::Undefined => s.len(),
        value => {
            let n = value.to_number();
            if n.is_nan() { 0 } else { n.max(0.0) as usize }
        }
    };
    let end = start.saturating_add(length).min(s.len());
    Ok(from_units(s.get(start..end).unwrap_or_default()))
}

pub fn string_to_lower_case(_interp: &mut Interpreter, this: &JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::from(this_string(this)?.to_lowercase()))
}

pub fn string_to_upper_case(_interp: &mut Interpreter, this: &JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::from(this_string(this)?.to_uppercase()))
}

pub fn string_trim(_interp: &mut Interpreter, this: &JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::from(
        this_string(this)?.trim_matches(crate::value::is_js_whitespace),
    ))
}

pub fn string_split(_interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let s = this_string(this)?;
    let limit = match arg(args, 1) {
        JsValue::Undefined => usize::MAX,
        value => crate::value::to_uint32(value.to_number()) as usize,
    };

    let parts: Vec<JsValue> = match arg(args, 0) {
        JsValue::Undefined => vec![JsValue::String(s)],
        JsValue::RegExp(re) => {
            let mut parts = Vec::new();
            let mut last = 0;
            let mut pos = 0;
            while pos < s.len() {
                let Some(found) = exec_at(&re, &s, pos)? else {
                    break;
                };
                if found.start >= s.len() {
                    break;
                }
                // An empty match at the previous split point is skipped
                if found.end == last {
                    pos = next_char_boundary(&s, found.start);
                    continue;
                }
                parts.push(JsValue::from(s.get(last..found.start).unwrap_or_default()));
                parts.extend(found.groups.iter().cloned());
                last = found.end;
                pos = if found.end > found.start { found.end } else { next_char_boundary(&s, found.end) };
            }
            parts.push(JsValue::from(s.get(last..).unwrap_or_default()));
            parts
        }
        separator => {
            let separator = separator.to_js_string();
            if separator.is_empty() {
                s.encode_utf16().map(|unit| from_units(&[unit])).collect()
            } else {
                s.split(separator.as_str()).map(JsValue::from).collect()
            }
        }
    };

    Ok(JsValue::new_array(parts.into_iter().take(limit).collect()))
}

fn next_char_boundary(s: &str, index: usize) -> usize {
    s.get(index..)
        .and_then(|rest| rest.chars().next())
        .map(|c| index + c.len_utf8())
        .unwrap_or(index + 1)
}

pub fn string_repeat(_interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let s = this_string(this)?;
    let count = integer_arg(args, 0);
    if count < 0.0 || count.is_infinite() {
        return Err(JsError::range_error(format!("Invalid count value: {}", count)));
    }
    if count * s.utf16_len() as f64 > MAX_STRING_LENGTH as f64 {
        return Err(JsError::range_error("Invalid string length"));
    }
    Ok(JsValue::from(s.repeat(count as usize)))
}

/// Replacement text for one match, calling a replacer function if given
fn replacement_for(
    interp: &mut Interpreter,
    replacement: &JsValue,
    matched: &str,
    groups: &[JsValue],
    position: usize,
    subject: &JsString,
) -> Result<String, JsError> {
    if replacement.is_callable() {
        let mut call_args = Vec::with_capacity(groups.len() + 3);
        call_args.push(JsValue::from(matched));
        call_args.extend(groups.iter().cloned());
        call_args.push(JsValue::from(subject.get(..position).unwrap_or_default().encode_utf16().count()));
        call_args.push(JsValue::String(subject.clone()));
        let result = interp.call_function(replacement, JsValue::Undefined, &call_args)?;
        return Ok(result.to_js_string().to_string());
    }
    Ok(expand_replacement(
        &replacement.to_js_string(),
        matched,
        groups,
        subject,
        position,
    ))
}

fn replace_impl(interp: &mut Interpreter, this: &JsValue, args: &[JsValue], all: bool) -> Result<JsValue, JsError> {
    let s = this_string(this)?;
    let replacement = arg(args, 1);

    let regexp: Rc<JsRegExp> = match arg(args, 0) {
        JsValue::RegExp(re) => re,
        pattern => {
            let needle = pattern.to_js_string();
            let mut result = String::new();
            let mut last = 0;
            let mut search_from = 0;
            while let Some(found) = s.get(search_from..).and_then(|rest| rest.find(needle.as_str())) {
                let start = search_from + found;
                let end = start + needle.len();
                result.push_str(s.get(last..start).unwrap_or_default());
                let text = replacement_for(interp, &replacement, &needle, &[], start, &s)?;
                result.push_str(&text);
                last = end;
                if !all {
                    break;
                }
                search_from = if needle.is_empty() { next_char_boundary(&s, end) } else { end };
                if search_from > s.len() {
                    break;
                }
            }
            result.push_str(s.get(last..).unwrap_or_default());
            return Ok(JsValue::from(result));
        }
    };

    let global = all || regexp.global();
    let mut result = String::new();
    let mut last = 0;
    let mut pos = 0;
    while pos <= s.len() {
        let Some(found) = exec_at(&regexp, &s, pos)? else {
            break;
        };
        result.push_str(s.get(last..found.start).unwrap_or_default());
        let matched = s.get(found.start..found.end).unwrap_or_default();
        let text = replacement_for(interp, &replacement, matched, &found.groups, found.start, &s)?;
        result.push_str(&text);
        last = found.end;
        if !global {
            break;
        }
        pos = if found.end > found.start { found.end } else { next_char_boundary(&s, found.end) };
    }
    if global {
        regexp.last_index.set(0);
    }
    result.push_str(s.get(last..).unwrap_or_default());
    Ok(JsValue::from(result))
}

pub fn string_replace(interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    replace_impl(interp, this, args, false)
}

pub fn string_replace_all(interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    replace_impl(interp, this, args, true)
}

pub fn string_match(_interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let s = this_string(this)?;
    let regexp = match arg(args, 0) {
        JsValue::RegExp(re) => re,
        JsValue::Undefined => Rc::new(JsRegExp::new("(?:)", "")),
        other => Rc::new(JsRegExp::new(other.to_js_string(), "")),
    };

    if !regexp.global() {
        return Ok(match exec_at(&regexp, &s, 0)? {
            Some(found) => match_to_array(&s, &found),
            None => JsValue::Null,
        });
    }

    let mut matches = Vec::new();
    let mut pos = 0;
    while pos <= s.len() {
        let Some(found) = exec_at(&regexp, &s, pos)? else {
            break;
        };
        matches.push(JsValue::from(s.get(found.start..found.end).unwrap_or_default()));
        pos = if found.end > found.start { found.end } else { next_char_boundary(&s, found.end) };
    }
    regexp.last_index.set(0);
    Ok(if matches.is_empty() { JsValue::Null } else { JsValue::new_array(matches) })
}

pub fn string_search(_interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let s = this_string(this)?;
    let regexp = match arg(args, 0) {
        JsValue::RegExp(re) => re,
        other => Rc::new(JsRegExp::new(other.to_js_string(), "")),
    };
    Ok(match exec_at(&regexp, &s, 0)? {
        Some(found) => JsValue::from(s.get(..found.start).unwrap_or_default().encode_utf16().count()),
        None => JsValue::Number(-1.0),
    })
}

fn pad(this: &JsValue, args: &[JsValue], at_start: bool) -> Result<JsValue, JsError> {
    let s = this_string(this)?;
    let target = integer_arg(args, 0).max(0.0) as usize;
    let filler: Vec<u16> = match arg(args, 1) {
        JsValue::Undefined => vec![u16::from(b' ')],
        value => units(&value.to_js_string()),
    };
    let current = s.utf16_len();
    if target <= current || filler.is_empty() {
        return Ok(JsValue::String(s));
    }
    if target > MAX_STRING_LENGTH {
        return Err(JsError::range_error("Invalid string length"));
    }

    let padding: Vec<u16> = filler.iter().copied().cycle().take(target - current).collect();
    let padding = String::from_utf16_lossy(&padding);
    Ok(JsValue::from(if at_start {
        format!("{}{}", padding, s)
    } else {
        format!("{}{}", s, padding)
    }))
}

pub fn string_pad_start(_interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    pad(this, args, true)
}

pub fn string_pad_end(_interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    pad(this, args, false)
}

pub fn string_concat(_interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let mut result = this_string(this)?.to_string();
    for value in args {
        result.push_str(&value.to_js_string());
    }
    Ok(JsValue::from(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::NativeFn;

    fn call(func: NativeFn, this: &str, args: &[JsValue]) -> JsValue {
        func(&mut Interpreter::new(), &JsValue::from(this), args).unwrap()
    }

    #[test]
    fn test_char_code_at_out_of_range() {
        assert_eq!(call(string_char_code_at, "abc", &[JsValue::from(1)]), JsValue::from(98));
        assert_eq!(call(string_char_code_at, "abc", &[JsValue::from(5)]), JsValue::Undefined);
        assert_eq!(call(string_char_code_at, "abc", &[JsValue::from("x")]), JsValue::from(97));
        assert_eq!(call(string_char_code_at, "abc", &[]), JsValue::from(97));
    }

    #[test]
    fn test_utf16_indices() {
        assert_eq!(call(string_slice, "a\u{1F600}b", &[JsValue::from(3)]), JsValue::from("b"));
        assert_eq!(call(string_index_of, "a\u{1F600}b", &[JsValue::from("b")]), JsValue::from(3));
    }

    #[test]
    fn test_substring_variants() {
        assert_eq!(call(string_substring, "abcdef", &[JsValue::from(4), JsValue::from(1)]), JsValue::from("bcd"));
        assert_eq!(call(string_substr, "abcdef", &[JsValue::from(-3), JsValue::from(2)]), JsValue::from("de"));
        assert_eq!(call(string_slice, "abcdef", &[JsValue::from(-2)]), JsValue::from("ef"));
    }

    #[test]
    fn test_split() {
        let parts = call(string_split, "a,b,,c", &[JsValue::from(",")]);
        assert_eq!(parts.to_js_string().as_str(), "a,b,,c");
        let JsValue::Array(items) = call(string_split, "abc", &[JsValue::from("")]) else {
            panic!("expected array");
        };
        assert_eq!(items.borrow().len(), 3);
    }

    #[test]
    fn test_split_by_regexp() {
        let re = JsValue::RegExp(Rc::new(JsRegExp::new("\\s*,\\s*", "")));
        let JsValue::Array(items) = call(string_split, "a , b,c", &[re]) else {
            panic!("expected array");
        };
        let items: Vec<String> = items.borrow().iter().map(|v| v.to_js_string().to_string()).collect();
        assert_eq!(items, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_replace_string_and_regexp() {
        assert_eq!(
            call(string_replace, "aaa", &[JsValue::from("a"), JsValue::from("b")]),
            JsValue::from("baa")
        );
        let re = JsValue::RegExp(Rc::new(JsRegExp::new("a(.)", "g")));
        assert_eq!(
            call(string_replace, "a1a2", &[re, JsValue::from("[$1]")]),
            JsValue::from("[1][2]")
        );
    }

    #[test]
    fn test_pad_start() {
        assert_eq!(call(string_pad_start, "5", &[JsValue::from(3), JsValue::from("0")]), JsValue::from("005"));
    }
}
