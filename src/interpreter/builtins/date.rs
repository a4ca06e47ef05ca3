//! Date built-in methods
//!
//! Dates are stored as milliseconds since the epoch and local time is UTC.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{JsValue, NativeFn};

use super::{create_constructor, register_method};

const MS_PER_DAY: f64 = 86_400_000.0;

/// Largest time value a Date can hold
const MAX_TIME: f64 = 8.64e15;

/// Create a date from components, handling JavaScript-style overflow
/// (month 12 becomes January of the next year, day 0 the last day of the
/// previous month)
fn make_date_from_components(year: f64, month: f64, day: f64, hours: f64, minutes: f64, seconds: f64, ms: f64) -> f64 {
    if [year, month, day, hours, minutes, seconds, ms].iter().any(|n| !n.is_finite()) {
        return f64::NAN;
    }
    let year = year.trunc();
    // Two-digit years map to 1900-1999
    let year = if (0.0..100.0).contains(&year) { year + 1900.0 } else { year };

    let total_months = year * 12.0 + month.trunc();
    let norm_year = total_months.div_euclid(12.0);
    let norm_month = total_months.rem_euclid(12.0) as u32 + 1;
    if norm_year.abs() > 400_000.0 {
        return f64::NAN;
    }
    let Some(first) = NaiveDate::from_ymd_opt(norm_year as i32, norm_month, 1) else {
        return f64::NAN;
    };
    let base = first.and_time(chrono::NaiveTime::MIN).and_utc().timestamp_millis() as f64;

    let time = base
        + (day.trunc() - 1.0) * MS_PER_DAY
        + hours.trunc() * 3_600_000.0
        + minutes.trunc() * 60_000.0
        + seconds.trunc() * 1000.0
        + ms.trunc();
    time_clip(time)
}

fn time_clip(time: f64) -> f64 {
    if !time.is_finite() || time.abs() > MAX_TIME {
        return f64::NAN;
    }
    time.trunc() + 0.0
}

fn to_datetime(time: f64) -> Option<DateTime<Utc>> {
    if time.is_nan() {
        return None;
    }
    DateTime::from_timestamp_millis(time as i64)
}

/// `Date.prototype.toString` form, also used for string coercion
pub fn to_date_string(time: f64) -> String {
    match to_datetime(time) {
        Some(dt) => dt.format("%a %b %d %Y %H:%M:%S GMT+0000 (Coordinated Universal Time)").to_string(),
        None => "Invalid Date".to_string(),
    }
}

/// `YYYY-MM-DDTHH:mm:ss.sssZ`, or `None` for an invalid date
pub fn to_iso_string(time: f64) -> Option<String> {
    to_datetime(time).map(|dt| dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
}

/// Offsets of the timezone abbreviations accepted in date strings, in hours
const TIMEZONES: &[(&str, i32)] = &[
    ("UTC", 0),
    ("UT", 0),
    ("GMT", 0),
    ("Z", 0),
    ("EST", -5),
    ("EDT", -4),
    ("CST", -6),
    ("CDT", -5),
    ("MST", -7),
    ("MDT", -6),
    ("PST", -8),
    ("PDT", -7),
];

/// Split a trailing timezone designator off a human-readable date string.
/// Returns the remaining text and the offset in seconds east of UTC.
fn split_timezone(s: &str) -> (&str, Option<i32>) {
    let Some((head, last)) = s.rsplit_once(' ') else {
        return (s, None);
    };

    // +0100, -05:00, GMT+0100, UTC-5
    let numeric = last
        .strip_prefix("GMT")
        .or_else(|| last.strip_prefix("UTC"))
        .unwrap_or(last);
    if let Some(sign) = numeric.chars().next().filter(|c| matches!(c, '+' | '-')) {
        let digits: String = numeric.chars().skip(1).filter(|c| *c != ':').collect();
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            let (hours, minutes) = match digits.len() {
                1 | 2 => (digits.parse::<i32>().unwrap_or(0), 0),
                _ => {
                    let split = digits.len() - 2;
                    (
                        digits.get(..split).and_then(|h| h.parse().ok()).unwrap_or(0),
                        digits.get(split..).and_then(|m| m.parse().ok()).unwrap_or(0),
                    )
                }
            };
            let offset = hours * 3600 + minutes * 60;
            return (head.trim_end(), Some(if sign == '-' { -offset } else { offset }));
        }
    }

    TIMEZONES
        .iter()
        .find(|(name, _)| last.eq_ignore_ascii_case(name))
        .map(|(_, hours)| (head.trim_end(), Some(hours * 3600)))
        .unwrap_or((s, None))
}

const DATETIME_FORMATS: &[&str] = &[
    "%d %B %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
    "%B %d %Y %H:%M:%S",
    "%b %d %Y %H:%M:%S",
    "%d %B %Y %H:%M",
    "%d %b %Y %H:%M",
    "%B %d %Y %H:%M",
    "%b %d %Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%d %B %Y", "%d %b %Y", "%B %d %Y", "%b %d %Y", "%Y/%m/%d", "%m/%d/%Y"];

/// Parse the date-time string forms accepted by `new Date(string)` and
/// `Date.parse`. Returns NaN when no format matches.
pub fn parse_date_string(s: &str) -> f64 {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.timestamp_millis() as f64;
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return dt.timestamp_millis() as f64;
    }
    // ISO 8601 without a timezone is treated as UTC
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return dt.and_utc().timestamp_millis() as f64;
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp_millis() as f64;
    }

    parse_human_readable(s).unwrap_or(f64::NAN)
}

/// `Wednesday 31 December 1969 18:01:26 MDT`, `Dec 25, 2024`, ...
fn parse_human_readable(s: &str) -> Option<f64> {
    let normalized = s.replace(',', " ");
    let mut words: Vec<&str> = normalized.split_whitespace().collect();
    // Leading weekday names carry no information
    if words.first().is_some_and(|word| is_weekday(word)) {
        words.remove(0);
    }
    let joined = words.join(" ");
    let (text, offset) = split_timezone(&joined);

    let naive = DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .map(|date| date.and_time(chrono::NaiveTime::MIN))
        })?;

    let offset = FixedOffset::east_opt(offset.unwrap_or(0))?;
    let local = offset.from_local_datetime(&naive).single()?;
    Some(local.timestamp_millis() as f64)
}

fn is_weekday(word: &str) -> bool {
    const DAYS: [&str; 7] = ["monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday"];
    let word = word.to_ascii_lowercase();
    word.len() >= 3 && DAYS.iter().any(|day| day.starts_with(word.as_str()))
}

/// Initialize the date method table
pub fn init_date_prototype(interp: &mut Interpreter) {
    let proto = interp.date_prototype.clone();

    register_method(&proto, "getTime", date_get_time, 0);
    register_method(&proto, "valueOf", date_get_time, 0);
    register_method(&proto, "setTime", date_set_time, 1);
    register_method(&proto, "getTimezoneOffset", date_get_timezone_offset, 0);

    // Getter methods (local time = UTC in this implementation)
    let getters: [(&'static str, &'static str, NativeFn); 8] = [
        ("getFullYear", "getUTCFullYear", date_get_full_year),
        ("getMonth", "getUTCMonth", date_get_month),
        ("getDate", "getUTCDate", date_get_date),
        ("getDay", "getUTCDay", date_get_day),
        ("getHours", "getUTCHours", date_get_hours),
        ("getMinutes", "getUTCMinutes", date_get_minutes),
        ("getSeconds", "getUTCSeconds", date_get_seconds),
        ("getMilliseconds", "getUTCMilliseconds", date_get_milliseconds),
    ];
    for (local, utc, func) in getters {
        register_method(&proto, local, func, 0);
        register_method(&proto, utc, func, 0);
    }

    // Formatting
    register_method(&proto, "toISOString", date_to_iso_string, 0);
    register_method(&proto, "toJSON", date_to_json, 0);
    register_method(&proto, "toString", date_to_string, 0);
    register_method(&proto, "toUTCString", date_to_utc_string, 0);
}

/// Create the Date constructor with `Date.now`, `Date.parse` and `Date.UTC`
pub fn create_date_constructor() -> JsValue {
    let constructor = create_constructor("Date", 7, date_call, date_constructor);
    let statics = &constructor.properties;
    register_method(statics, "now", date_now, 0);
    register_method(statics, "parse", date_parse, 1);
    register_method(statics, "UTC", date_utc, 7);
    JsValue::Function(constructor)
}

fn now_millis() -> f64 {
    Utc::now().timestamp_millis() as f64
}

/// `Date()` without `new` returns the current time as a string
pub fn date_call(_interp: &mut Interpreter, _this: &JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::from(to_date_string(now_millis())))
}

pub fn date_constructor(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let time = match args {
        [] => now_millis(),
        [JsValue::Date(other)] => other.get(),
        [JsValue::String(s)] => parse_date_string(s),
        [value] => match value.to_primitive(true) {
            JsValue::String(s) => parse_date_string(&s),
            primitive => time_clip(primitive.to_number()),
        },
        _ => components_to_time(args),
    };
    Ok(JsValue::new_date(time))
}

fn components_to_time(args: &[JsValue]) -> f64 {
    let component = |index: usize, default: f64| args.get(index).map(JsValue::to_number).unwrap_or(default);
    make_date_from_components(
        component(0, f64::NAN),
        component(1, 0.0),
        component(2, 1.0),
        component(3, 0.0),
        component(4, 0.0),
        component(5, 0.0),
        component(6, 0.0),
    )
}

pub fn date_now(_interp: &mut Interpreter, _this: &JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::Number(now_millis()))
}

pub fn date_parse(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let text = args.first().map(JsValue::to_js_string).unwrap_or_default();
    Ok(JsValue::Number(parse_date_string(&text)))
}

pub fn date_utc(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::Number(components_to_time(args)))
}

fn this_time(this: &JsValue) -> Result<f64, JsError> {
    match this {
        JsValue::Date(time) => Ok(time.get()),
        other => Err(JsError::type_error(format!("this is not a Date object ({})", other.type_of()))),
    }
}

pub fn date_get_time(_interp: &mut Interpreter, this: &JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::Number(this_time(this)?))
}

pub fn date_set_time(_interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let JsValue::Date(cell) = this else {
        return Err(JsError::type_error("this is not a Date object"));
    };
    let time = time_clip(args.first().map(JsValue::to_number).unwrap_or(f64::NAN));
    cell.set(time);
    Ok(JsValue::Number(time))
}

pub fn date_get_timezone_offset(_interp: &mut Interpreter, this: &JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    let time = this_time(this)?;
    Ok(JsValue::Number(if time.is_nan() { f64::NAN } else { 0.0 }))
}

/// Apply `field` to the date's UTC components, NaN for an invalid date
fn date_field(this: &JsValue, field: impl Fn(&DateTime<Utc>) -> f64) -> Result<JsValue, JsError> {
    let time = this_time(this)?;
    Ok(JsValue::Number(to_datetime(time).map(|dt| field(&dt)).unwrap_or(f64::NAN)))
}

pub fn date_get_full_year(_interp: &mut Interpreter, this: &JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    date_field(this, |dt| f64::from(dt.year()))
}

pub fn date_get_month(_interp: &mut Interpreter, this: &JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    date_field(this, |dt| f64::from(dt.month0()))
}

pub fn date_get_date(_interp: &mut Interpreter, this: &JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    date_field(this, |dt| f64::from(dt.day()))
}

pub fn date_get_day(_interp: &mut Interpreter, this: &JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    date_field(this, |dt| f64::from(dt.weekday().num_days_from_sunday()))
}

pub fn date_get_hours(_interp: &mut Interpreter, this: &JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    date_field(this, |dt| f64::from(dt.hour()))
}

pub fn date_get_minutes(_interp: &mut Interpreter, this: &JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    date_field(this, |dt| f64::from(dt.minute()))
}

pub fn date_get_seconds(_interp: &mut Interpreter, this: &JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    date_field(this, |dt| f64::from(dt.second()))
}

pub fn date_get_milliseconds(_interp: &mut Interpreter, this: &JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    date_field(this, |dt| f64::from(dt.timestamp_subsec_millis()))
}

pub fn date_to_iso_string(_interp: &mut Interpreter, this: &JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    match to_iso_string(this_time(this)?) {
        Some(iso) => Ok(JsValue::from(iso)),
        None => Err(JsError::range_error("Invalid time value")),
    }
}

pub fn date_to_json(_interp: &mut Interpreter, this: &JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(to_iso_string(this_time(this)?).map(JsValue::from).unwrap_or(JsValue::Null))
}

pub fn date_to_string(_interp: &mut Interpreter, this: &JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::from(to_date_string(this_time(this)?)))
}

pub fn date_to_utc_string(_interp: &mut Interpreter, this: &JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    let text = match to_datetime(this_time(this)?) {
        Some(dt) => dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
        None => "Invalid Date".to_string(),
    };
    Ok(JsValue::from(text))
}
