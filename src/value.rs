//! JavaScript value representation
//!
//! The core JsValue type and the coercion rules shared by the evaluator and
//! the built-ins. Objects carry no prototype chain: arrays, plain objects,
//! regular expressions, dates and functions are distinct variants and
//! their methods are resolved by the built-ins.

use std::cell::{Cell, OnceCell, RefCell};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::FunctionNode;
use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::scope::Scope;

pub type ArrayRef = Rc<RefCell<Vec<JsValue>>>;
pub type ObjectRef = Rc<RefCell<IndexMap<JsString, JsValue>>>;

/// A JavaScript value
#[derive(Clone, Default)]
pub enum JsValue {
    #[default]
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(JsString),
    Array(ArrayRef),
    Object(ObjectRef),
    RegExp(Rc<JsRegExp>),
    /// Milliseconds since the epoch, NaN for an invalid date
    Date(Rc<Cell<f64>>),
    Function(Rc<JsFunction>),
}

impl JsValue {
    pub fn new_array(items: Vec<JsValue>) -> Self {
        JsValue::Array(Rc::new(RefCell::new(items)))
    }

    pub fn new_object(entries: IndexMap<JsString, JsValue>) -> Self {
        JsValue::Object(Rc::new(RefCell::new(entries)))
    }

    pub fn new_date(time: f64) -> Self {
        JsValue::Date(Rc::new(Cell::new(time)))
    }

    /// A plain `{name, message}` object as produced by `new Error(...)`
    pub fn error_object(name: &str, message: &str) -> Self {
        let mut entries = IndexMap::new();
        entries.insert(JsString::from("name"), JsValue::from(name));
        entries.insert(JsString::from("message"), JsValue::from(message));
        JsValue::new_object(entries)
    }

    /// Check if this value is null or undefined
    pub fn is_null_or_undefined(&self) -> bool {
        matches!(self, JsValue::Null | JsValue::Undefined)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, JsValue::Function(_))
    }

    /// Get the typeof result for this value
    pub fn type_of(&self) -> &'static str {
        match self {
            JsValue::Undefined => "undefined",
            JsValue::Null => "object",
            JsValue::Boolean(_) => "boolean",
            JsValue::Number(_) => "number",
            JsValue::String(_) => "string",
            JsValue::Function(_) => "function",
            JsValue::Array(_) | JsValue::Object(_) | JsValue::RegExp(_) | JsValue::Date(_) => {
                "object"
            }
        }
    }

    /// Convert to boolean (ToBoolean)
    pub fn to_boolean(&self) -> bool {
        match self {
            JsValue::Undefined | JsValue::Null => false,
            JsValue::Boolean(b) => *b,
            JsValue::Number(n) => *n != 0.0 && !n.is_nan(),
            JsValue::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Convert to number (ToNumber)
    pub fn to_number(&self) -> f64 {
        match self {
            JsValue::Undefined => f64::NAN,
            JsValue::Null => 0.0,
            JsValue::Boolean(true) => 1.0,
            JsValue::Boolean(false) => 0.0,
            JsValue::Number(n) => *n,
            JsValue::String(s) => string_to_number(s.as_str()),
            JsValue::Date(time) => time.get(),
            other => string_to_number(other.to_js_string().as_str()),
        }
    }

    /// Convert to string (ToString)
    pub fn to_js_string(&self) -> JsString {
        match self {
            JsValue::String(s) => s.clone(),
            other => JsString::from(other.to_display_string()),
        }
    }

    fn to_display_string(&self) -> String {
        match self {
            JsValue::Undefined => "undefined".to_string(),
            JsValue::Null => "null".to_string(),
            JsValue::Boolean(b) => b.to_string(),
            JsValue::Number(n) => number_to_string(*n),
            JsValue::String(s) => s.to_string(),
            JsValue::Array(items) => join_values(&items.borrow(), ","),
            JsValue::Object(_) => "[object Object]".to_string(),
            JsValue::RegExp(re) => format!("/{}/{}", re.source, re.flags),
            JsValue::Date(time) => crate::interpreter::builtins::date::to_date_string(time.get()),
            JsValue::Function(func) => func.source_text(),
        }
    }

    /// Primitive conversion for operators. Dates prefer their time value only
    /// when `prefer_number` is set.
    pub fn to_primitive(&self, prefer_number: bool) -> JsValue {
        match self {
            JsValue::Date(time) if prefer_number => JsValue::Number(time.get()),
            JsValue::Array(_)
            | JsValue::Object(_)
            | JsValue::RegExp(_)
            | JsValue::Date(_)
            | JsValue::Function(_) => JsValue::String(self.to_js_string()),
            primitive => primitive.clone(),
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            JsValue::Undefined
                | JsValue::Null
                | JsValue::Boolean(_)
                | JsValue::Number(_)
                | JsValue::String(_)
        )
    }

    /// Strict equality (===)
    pub fn strict_equals(&self, other: &JsValue) -> bool {
        match (self, other) {
            (JsValue::Undefined, JsValue::Undefined) => true,
            (JsValue::Null, JsValue::Null) => true,
            (JsValue::Boolean(a), JsValue::Boolean(b)) => a == b,
            // NaN !== NaN falls out of IEEE comparison
            (JsValue::Number(a), JsValue::Number(b)) => a == b,
            (JsValue::String(a), JsValue::String(b)) => a == b,
            (JsValue::Array(a), JsValue::Array(b)) => Rc::ptr_eq(a, b),
            (JsValue::Object(a), JsValue::Object(b)) => Rc::ptr_eq(a, b),
            (JsValue::RegExp(a), JsValue::RegExp(b)) => Rc::ptr_eq(a, b),
            (JsValue::Date(a), JsValue::Date(b)) => Rc::ptr_eq(a, b),
            (JsValue::Function(a), JsValue::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Abstract equality (==)
    pub fn loose_equals(&self, other: &JsValue) -> bool {
        match (self, other) {
            (JsValue::Undefined | JsValue::Null, JsValue::Undefined | JsValue::Null) => true,
            (JsValue::Undefined | JsValue::Null, _) | (_, JsValue::Undefined | JsValue::Null) => {
                false
            }
            (JsValue::Number(_), JsValue::String(_)) | (JsValue::String(_), JsValue::Number(_)) => {
                self.to_number() == other.to_number()
            }
            (JsValue::Boolean(_), _) => JsValue::Number(self.to_number()).loose_equals(other),
            (_, JsValue::Boolean(_)) => self.loose_equals(&JsValue::Number(other.to_number())),
            (a, b) if a.is_primitive() && !b.is_primitive() => a.loose_equals(&b.to_primitive(false)),
            (a, b) if !a.is_primitive() && b.is_primitive() => a.to_primitive(false).loose_equals(b),
            _ => self.strict_equals(other),
        }
    }

    /// Array index for a property key, if the key is a canonical index
    pub fn as_index(&self) -> Option<usize> {
        match self {
            JsValue::Number(n) if *n >= 0.0 && n.fract() == 0.0 && *n < u32::MAX as f64 => {
                Some(*n as usize)
            }
            JsValue::String(s) => {
                let index: usize = s.as_str().parse().ok()?;
                (index.to_string() == s.as_str()).then_some(index)
            }
            _ => None,
        }
    }
}

/// Join array elements the way `Array.prototype.join` does
pub fn join_values(items: &[JsValue], separator: &str) -> String {
    items
        .iter()
        .map(|item| match item {
            JsValue::Undefined | JsValue::Null => String::new(),
            other => other.to_display_string(),
        })
        .collect::<Vec<_>>()
        .join(separator)
}

/// Format a number like `Number.prototype.toString`
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let abs = n.abs();
    if (1e-6..1e21).contains(&abs) {
        return format!("{}", n);
    }

    let formatted = format!("{:e}", n);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if exponent.starts_with('-') => {
            format!("{}e{}", mantissa, exponent)
        }
        Some((mantissa, exponent)) => format!("{}e+{}", mantissa, exponent),
        None => formatted,
    }
}

/// String to number conversion following the StringToNumber grammar
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim_matches(is_js_whitespace);
    if trimmed.is_empty() {
        return 0.0;
    }

    let radix = match trimmed.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return match trimmed.get(2..) {
            Some(digits) if !digits.is_empty() => u64::from_str_radix(digits, radix)
                .map(|n| n as f64)
                .unwrap_or(f64::NAN),
            _ => f64::NAN,
        };
    }

    let unsigned = trimmed.trim_start_matches(['+', '-']);
    if unsigned == "Infinity" && trimmed.len() - unsigned.len() <= 1 {
        return if trimmed.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    // Rust also accepts "inf", "nan" and "infinity", JavaScript does not
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return f64::NAN;
    }
    trimmed.parse().unwrap_or(f64::NAN)
}

pub fn is_js_whitespace(c: char) -> bool {
    c.is_whitespace() || c == '\u{FEFF}'
}

/// ToInt32: wrap to a 32-bit two's complement integer
pub fn to_int32(n: f64) -> i32 {
    to_uint32(n) as i32
}

/// ToUint32
pub fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() {
        return 0;
    }
    n.trunc().rem_euclid(4_294_967_296.0) as u32
}

/// Exponentiation with the JavaScript special cases that differ from `powf`
pub fn js_pow(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() {
        return f64::NAN;
    }
    if exponent == 0.0 {
        return 1.0;
    }
    if base.abs() == 1.0 && exponent.is_infinite() {
        return f64::NAN;
    }
    base.powf(exponent)
}

impl fmt::Debug for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => write!(f, "undefined"),
            JsValue::Null => write!(f, "null"),
            JsValue::Boolean(b) => write!(f, "{}", b),
            JsValue::Number(n) => write!(f, "{}", number_to_string(*n)),
            JsValue::String(s) => write!(f, "{:?}", s.as_str()),
            JsValue::Array(items) => write!(f, "Array({})", items.borrow().len()),
            JsValue::Object(entries) => {
                let entries = entries.borrow();
                let keys: Vec<&str> = entries.keys().map(|k| k.as_str()).collect();
                write!(f, "{{{}}}", keys.join(", "))
            }
            JsValue::RegExp(re) => write!(f, "/{}/{}", re.source, re.flags),
            JsValue::Date(time) => write!(f, "Date({})", time.get()),
            JsValue::Function(func) => write!(f, "[Function: {}]", func.name()),
        }
    }
}

impl fmt::Display for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Error-like objects print as "Name: message"
        if let JsValue::Object(entries) = self {
            let entries = entries.borrow();
            if let (Some(name), Some(message)) = (entries.get("name"), entries.get("message")) {
                return write!(f, "{}: {}", name.to_display_string(), message.to_display_string());
            }
        }
        write!(f, "{}", self.to_display_string())
    }
}

impl PartialEq for JsValue {
    fn eq(&self, other: &Self) -> bool {
        self.strict_equals(other)
    }
}

// Conversions from Rust types

impl From<bool> for JsValue {
    fn from(b: bool) -> Self {
        JsValue::Boolean(b)
    }
}

impl From<f64> for JsValue {
    fn from(n: f64) -> Self {
        JsValue::Number(n)
    }
}

impl From<i32> for JsValue {
    fn from(n: i32) -> Self {
        JsValue::Number(n as f64)
    }
}

impl From<usize> for JsValue {
    fn from(n: usize) -> Self {
        JsValue::Number(n as f64)
    }
}

impl From<&str> for JsValue {
    fn from(s: &str) -> Self {
        JsValue::String(JsString::from(s))
    }
}

impl From<String> for JsValue {
    fn from(s: String) -> Self {
        JsValue::String(JsString::from(s))
    }
}

impl From<JsString> for JsValue {
    fn from(s: JsString) -> Self {
        JsValue::String(s)
    }
}

/// Immutable, reference-counted string
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsString(Rc<str>);

impl JsString {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length in UTF-16 code units, as reported by `.length`
    pub fn utf16_len(&self) -> usize {
        self.0.encode_utf16().count()
    }
}

impl Default for JsString {
    fn default() -> Self {
        JsString::from("")
    }
}

impl std::ops::Deref for JsString {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for JsString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for JsString {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for JsString {
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for JsString {
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl From<&str> for JsString {
    fn from(s: &str) -> Self {
        JsString(s.into())
    }
}

impl From<String> for JsString {
    fn from(s: String) -> Self {
        JsString(s.into())
    }
}

impl fmt::Debug for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A regular expression literal or `new RegExp(...)` result.
///
/// Construction never fails: the pattern is compiled on first use, so an
/// unsupported pattern only errors when it is actually matched.
pub struct JsRegExp {
    pub source: JsString,
    pub flags: JsString,
    pub last_index: Cell<usize>,
    compiled: OnceCell<Result<fancy_regex::Regex, String>>,
}

impl JsRegExp {
    pub fn new(source: impl Into<JsString>, flags: impl Into<JsString>) -> Self {
        Self {
            source: source.into(),
            flags: flags.into(),
            last_index: Cell::new(0),
            compiled: OnceCell::new(),
        }
    }

    pub fn global(&self) -> bool {
        self.flags.contains('g')
    }

    pub fn sticky(&self) -> bool {
        self.flags.contains('y')
    }

    pub fn regex(&self) -> Result<&fancy_regex::Regex, JsError> {
        let compiled = self.compiled.get_or_init(|| {
            let pattern = translate_pattern(&self.source, &self.flags);
            fancy_regex::Regex::new(&pattern).map_err(|e| e.to_string())
        });
        compiled.as_ref().map_err(|message| {
            JsError::syntax_error(
                format!("Invalid regular expression /{}/: {}", self.source, message),
                0,
                0,
            )
        })
    }
}

/// Rewrite JavaScript regular expression syntax into fancy-regex syntax
fn translate_pattern(source: &str, flags: &str) -> String {
    let mut pattern = String::with_capacity(source.len() + 8);

    let inline: String = flags.chars().filter(|c| matches!(c, 'i' | 'm' | 's')).collect();
    if !inline.is_empty() {
        pattern.push_str("(?");
        pattern.push_str(&inline);
        pattern.push(')');
    }

    let mut chars = source.chars().peekable();
    let mut in_class = false;
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some('/') => pattern.push('/'),
                Some('d') if !in_class => pattern.push_str("[0-9]"),
                Some('d') => pattern.push_str("0-9"),
                Some('u') if chars.peek() != Some(&'{') => {
                    let hex: String = chars.by_ref().take(4).collect();
                    pattern.push_str("\\x{");
                    pattern.push_str(&hex);
                    pattern.push('}');
                }
                Some(next) => {
                    pattern.push('\\');
                    pattern.push(next);
                }
                None => pattern.push_str("\\\\"),
            },
            '[' if !in_class => {
                in_class = true;
                if chars.peek() == Some(&'^') {
                    chars.next();
                    if chars.peek() == Some(&']') {
                        // [^] matches anything, including newlines
                        chars.next();
                        in_class = false;
                        pattern.push_str("[\\s\\S]");
                        continue;
                    }
                    pattern.push_str("[^");
                } else {
                    pattern.push('[');
                }
                // A leading ] is literal in JavaScript
                if chars.peek() == Some(&']') {
                    chars.next();
                    pattern.push_str("\\]");
                }
            }
            '[' => pattern.push_str("\\["),
            ']' if in_class => {
                in_class = false;
                pattern.push(']');
            }
            other => pattern.push(other),
        }
    }

    pattern
}

pub type NativeFn = fn(&mut Interpreter, &JsValue, &[JsValue]) -> Result<JsValue, JsError>;

/// A built-in function implemented in Rust
#[derive(Clone, Copy)]
pub struct NativeFunction {
    pub name: &'static str,
    pub func: NativeFn,
    /// Behaviour under `new`, when different from a plain call
    pub constructor: Option<NativeFn>,
    pub arity: u32,
}

pub enum FunctionKind {
    Interpreted {
        node: Rc<FunctionNode>,
        closure: Scope,
    },
    Native(NativeFunction),
    /// Result of `Function.prototype.bind`
    Bound {
        target: Rc<JsFunction>,
        this: JsValue,
        args: Vec<JsValue>,
    },
}

/// A callable value with its own property bag (`String.fromCharCode`, ...)
pub struct JsFunction {
    pub kind: FunctionKind,
    pub properties: ObjectRef,
}

impl JsFunction {
    pub fn new(kind: FunctionKind) -> Self {
        Self {
            kind,
            properties: Rc::new(RefCell::new(IndexMap::new())),
        }
    }

    pub fn native(name: &'static str, arity: u32, func: NativeFn) -> Self {
        Self::new(FunctionKind::Native(NativeFunction {
            name,
            func,
            constructor: None,
            arity,
        }))
    }

    pub fn name(&self) -> String {
        match &self.kind {
            FunctionKind::Interpreted { node, .. } => node
                .name
                .as_ref()
                .map(|n| n.to_string())
                .unwrap_or_default(),
            FunctionKind::Native(native) => native.name.to_string(),
            FunctionKind::Bound { target, .. } => format!("bound {}", target.name()),
        }
    }

    pub fn length(&self) -> usize {
        match &self.kind {
            FunctionKind::Interpreted { node, .. } => node
                .params
                .iter()
                .take_while(|p| p.default.is_none() && !p.rest)
                .count(),
            FunctionKind::Native(native) => native.arity as usize,
            FunctionKind::Bound { target, args, .. } => target.length().saturating_sub(args.len()),
        }
    }

    pub fn source_text(&self) -> String {
        match &self.kind {
            FunctionKind::Interpreted { node, .. } => node.source.to_string(),
            FunctionKind::Native(native) => format!("function {}() {{ [native code] }}", native.name),
            FunctionKind::Bound { .. } => "function () { [native code] }".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_boolean() {
        assert!(!JsValue::Undefined.to_boolean());
        assert!(!JsValue::Null.to_boolean());
        assert!(!JsValue::Number(0.0).to_boolean());
        assert!(!JsValue::Number(f64::NAN).to_boolean());
        assert!(!JsValue::from("").to_boolean());
        assert!(JsValue::from("0").to_boolean());
        assert!(JsValue::new_array(vec![]).to_boolean());
    }

    #[test]
    fn test_to_number() {
        assert!(JsValue::Undefined.to_number().is_nan());
        assert_eq!(JsValue::Null.to_number(), 0.0);
        assert_eq!(JsValue::from(" 42 ").to_number(), 42.0);
        assert_eq!(JsValue::from("").to_number(), 0.0);
        assert_eq!(JsValue::from("0x1F").to_number(), 31.0);
        assert_eq!(JsValue::from("-Infinity").to_number(), f64::NEG_INFINITY);
        assert!(JsValue::from("inf").to_number().is_nan());
        assert!(JsValue::from("nan").to_number().is_nan());
        assert!(JsValue::from("12px").to_number().is_nan());
        assert_eq!(JsValue::new_array(vec![JsValue::from(5)]).to_number(), 5.0);
        assert_eq!(JsValue::new_array(vec![]).to_number(), 0.0);
    }

    #[test]
    fn test_number_to_string() {
        assert_eq!(number_to_string(5.0), "5");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(number_to_string(1e21), "1e+21");
        assert_eq!(number_to_string(1.5e-7), "1.5e-7");
        assert_eq!(number_to_string(123456789012.0), "123456789012");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_strict_equals() {
        assert!(JsValue::Undefined.strict_equals(&JsValue::Undefined));
        assert!(!JsValue::Undefined.strict_equals(&JsValue::Null));
        assert!(!JsValue::Number(f64::NAN).strict_equals(&JsValue::Number(f64::NAN)));
        let array = JsValue::new_array(vec![]);
        assert!(array.strict_equals(&array.clone()));
        assert!(!array.strict_equals(&JsValue::new_array(vec![])));
    }

    #[test]
    fn test_loose_equals() {
        assert!(JsValue::Undefined.loose_equals(&JsValue::Null));
        assert!(!JsValue::Null.loose_equals(&JsValue::Number(0.0)));
        assert!(JsValue::from("1").loose_equals(&JsValue::Number(1.0)));
        assert!(JsValue::Boolean(true).loose_equals(&JsValue::from("1")));
        assert!(JsValue::new_array(vec![JsValue::from(1), JsValue::from(2)])
            .loose_equals(&JsValue::from("1,2")));
        assert!(!JsValue::Number(f64::NAN).loose_equals(&JsValue::Number(f64::NAN)));
    }

    #[test]
    fn test_int32_wraparound() {
        assert_eq!(to_int32(4_294_967_296.0 + 5.0), 5);
        assert_eq!(to_int32(2_147_483_648.0), i32::MIN);
        assert_eq!(to_int32(-1.0), -1);
        assert_eq!(to_uint32(-1.0), u32::MAX);
        assert_eq!(to_int32(f64::NAN), 0);
        assert_eq!(to_int32(-524999584.0).wrapping_shl(5), 379882496);
    }

    #[test]
    fn test_js_pow() {
        assert_eq!(js_pow(f64::NAN, 0.0), 1.0);
        assert!(js_pow(1.0, f64::INFINITY).is_nan());
        assert!(js_pow(2.0, f64::NAN).is_nan());
        assert_eq!(js_pow(2.0, 5.0), 32.0);
    }

    #[test]
    fn test_translate_pattern() {
        assert_eq!(translate_pattern("a\\/b", "gi"), "(?i)a/b");
        assert_eq!(translate_pattern("[^]", ""), "[\\s\\S]");
        assert_eq!(translate_pattern("[]a]", ""), "[\\]a]");
        assert_eq!(translate_pattern("\\u0041", ""), "\\x{0041}");
    }

    #[test]
    fn test_regexp_compiles_lazily() {
        let bad = JsRegExp::new("(", "");
        assert!(bad.regex().is_err());
        let good = JsRegExp::new("a+", "i");
        assert!(matches!(good.regex().map(|r| r.is_match("xAA")), Ok(Ok(true))));
    }

    #[test]
    fn test_display_error_object() {
        let error = JsValue::error_object("TypeError", "boom");
        assert_eq!(error.to_string(), "TypeError: boom");
    }
}
