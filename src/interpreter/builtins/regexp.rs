//! RegExp built-in methods

use std::rc::Rc;

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{JsRegExp, JsValue};

use super::{arg, create_constructor, register_method};

/// One successful match, in byte offsets into the subject
#[derive(Debug, Clone)]
pub struct RegExpMatch {
    pub start: usize,
    pub end: usize,
    /// Capture groups 1..n, `undefined` where a group did not participate
    pub groups: Vec<JsValue>,
}

/// Initialize the regexp method table
pub fn init_regexp_prototype(interp: &mut Interpreter) {
    let proto = interp.regexp_prototype.clone();
    register_method(&proto, "test", regexp_test, 1);
    register_method(&proto, "exec", regexp_exec, 1);
    register_method(&proto, "toString", regexp_to_string, 0);
}

pub fn create_regexp_constructor() -> JsValue {
    JsValue::Function(create_constructor("RegExp", 2, regexp_constructor, regexp_constructor))
}

pub fn regexp_constructor(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let (source, inherited_flags) = match arg(args, 0) {
        JsValue::RegExp(re) => (re.source.clone(), re.flags.clone()),
        JsValue::Undefined => ("(?:)".into(), "".into()),
        pattern => (pattern.to_js_string(), "".into()),
    };
    let flags = match arg(args, 1) {
        JsValue::Undefined => inherited_flags,
        flags => flags.to_js_string(),
    };
    if let Some(bad) = flags.chars().find(|c| !"dgimsuy".contains(*c)) {
        return Err(JsError::syntax_error(
            format!("Invalid flags supplied to RegExp constructor '{}'", bad),
            0,
            0,
        ));
    }
    Ok(JsValue::RegExp(Rc::new(JsRegExp::new(source, flags))))
}

/// Search `subject` from byte offset `pos`. Sticky expressions only match
/// exactly at `pos`.
pub fn exec_at(re: &JsRegExp, subject: &str, pos: usize) -> Result<Option<RegExpMatch>, JsError> {
    if pos > subject.len() {
        return Ok(None);
    }
    let regex = re.regex()?;
    let captures = regex
        .captures_from_pos(subject, pos)
        .map_err(|e| JsError::range_error(format!("Regular expression failed: {}", e)))?;
    let Some(captures) = captures else {
        return Ok(None);
    };
    let Some(whole) = captures.get(0) else {
        return Ok(None);
    };
    if re.sticky() && whole.start() != pos {
        return Ok(None);
    }

    let groups = (1..captures.len())
        .map(|i| {
            captures
                .get(i)
                .map(|group| JsValue::from(group.as_str()))
                .unwrap_or_default()
        })
        .collect();
    Ok(Some(RegExpMatch {
        start: whole.start(),
        end: whole.end(),
        groups,
    }))
}

/// `[match, group1, ...]` as returned by `exec` and non-global `match`
pub fn match_to_array(subject: &str, found: &RegExpMatch) -> JsValue {
    let mut items = Vec::with_capacity(found.groups.len() + 1);
    items.push(JsValue::from(subject.get(found.start..found.end).unwrap_or_default()));
    items.extend(found.groups.iter().cloned());
    JsValue::new_array(items)
}

/// Expand `$&`, `$1`, `` $` ``, `$'` and `$$` in a replacement template
pub fn expand_replacement(template: &str, matched: &str, groups: &[JsValue], subject: &str, position: usize) -> String {
    let mut result = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('$') => {
                chars.next();
                result.push('$');
            }
            Some('&') => {
                chars.next();
                result.push_str(matched);
            }
            Some('`') => {
                chars.next();
                result.push_str(subject.get(..position).unwrap_or_default());
            }
            Some('\'') => {
                chars.next();
                result.push_str(subject.get(position + matched.len()..).unwrap_or_default());
            }
            Some(d) if d.is_ascii_digit() => {
                chars.next();
                let mut index = d.to_digit(10).unwrap_or(0) as usize;
                // Two-digit group references when such a group exists
                if let Some(next) = chars.peek().and_then(|n| n.to_digit(10)) {
                    let two = index * 10 + next as usize;
                    if two >= 1 && two <= groups.len() {
                        chars.next();
                        index = two;
                    }
                }
                match groups.get(index.wrapping_sub(1)) {
                    Some(value) if index >= 1 => {
                        if !matches!(value, JsValue::Undefined) {
                            result.push_str(&value.to_js_string());
                        }
                    }
                    _ => {
                        result.push('$');
                        result.push_str(&index.to_string());
                    }
                }
            }
            _ => result.push('$'),
        }
    }
    result
}

fn this_regexp(this: &JsValue) -> Result<&Rc<JsRegExp>, JsError> {
    match this {
        JsValue::RegExp(re) => Ok(re),
        other => Err(JsError::type_error(format!(
            "RegExp method called on incompatible receiver {}",
            other.type_of()
        ))),
    }
}

fn utf16_to_byte(s: &str, index: usize) -> usize {
    let mut units = 0;
    for (byte, c) in s.char_indices() {
        if units >= index {
            return byte;
        }
        units += c.len_utf16();
    }
    s.len()
}

fn byte_to_utf16(s: &str, byte: usize) -> usize {
    s.get(..byte).map(|head| head.encode_utf16().count()).unwrap_or(0)
}

/// Shared by `exec` and `test`: honours and updates `lastIndex` for global
/// and sticky expressions
fn exec_with_last_index(re: &JsRegExp, subject: &str) -> Result<Option<RegExpMatch>, JsError> {
    let tracks_index = re.global() || re.sticky();
    let start = if tracks_index {
        utf16_to_byte(subject, re.last_index.get())
    } else {
        0
    };
    if tracks_index && re.last_index.get() > subject.encode_utf16().count() {
        re.last_index.set(0);
        return Ok(None);
    }

    let found = exec_at(re, subject, start)?;
    if tracks_index {
        match &found {
            Some(m) => re.last_index.set(byte_to_utf16(subject, m.end)),
            None => re.last_index.set(0),
        }
    }
    Ok(found)
}

pub fn regexp_exec(_interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let re = this_regexp(this)?;
    let subject = arg(args, 0).to_js_string();
    Ok(match exec_with_last_index(re, &subject)? {
        Some(found) => match_to_array(&subject, &found),
        None => JsValue::Null,
    })
}

pub fn regexp_test(_interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let re = this_regexp(this)?;
    let subject = arg(args, 0).to_js_string();
    Ok(JsValue::Boolean(exec_with_last_index(re, &subject)?.is_some()))
}

pub fn regexp_to_string(_interp: &mut Interpreter, this: &JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    let re = this_regexp(this)?;
    Ok(JsValue::from(format!("/{}/{}", re.source, re.flags)))
}
