//! Cookie jar and the snapshot format exchanged with DOM-capable engines
//!
//! The snapshot is a JSON array of objects with the fields `name`, `value`,
//! `domain`, `path`, `port`, `expires`, `secure`, `discard` and an optional
//! `httponly`. Engines write the same array back after the script ran and
//! the jar merges it.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::JsiError;
use crate::interpreter::builtins::date::parse_date_string;

/// A cookie as held by the caller's jar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub domain_specified: bool,
    pub domain_initial_dot: bool,
    pub path: String,
    pub path_specified: bool,
    pub port: Option<String>,
    /// Expiry as seconds since the epoch; `None` for a session cookie
    pub expires: Option<i64>,
    pub secure: bool,
    pub discard: bool,
    pub http_only: bool,
}

impl Cookie {
    /// A session cookie for `domain` with path `/`
    pub fn new(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
        let domain = domain.into();
        Self {
            name: name.into(),
            value: value.into(),
            domain_specified: !domain.is_empty(),
            domain_initial_dot: domain.starts_with('.'),
            domain,
            path: "/".to_string(),
            path_specified: true,
            port: None,
            expires: None,
            secure: false,
            discard: true,
            http_only: false,
        }
    }

    /// Same slot in the jar: cookies are keyed by domain, path and name
    fn same_slot(&self, other: &Cookie) -> bool {
        self.domain == other.domain && self.path == other.path && self.name == other.name
    }
}

/// One entry of the snapshot file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CookieSnapshot {
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_port")]
    pub port: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_expiry")]
    pub expires: Option<i64>,
    /// PhantomJS reports the numeric expiry separately from a date string
    #[serde(default, skip_serializing, deserialize_with = "lenient_expiry")]
    pub expiry: Option<i64>,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub discard: bool,
    #[serde(default, alias = "httpOnly", skip_serializing_if = "Option::is_none")]
    pub httponly: Option<bool>,
}

fn default_path() -> String {
    "/".to_string()
}

/// Numbers, numeric strings and date strings are accepted; a negative
/// value is how browsers mark session cookies
fn lenient_expiry<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64().filter(|n| *n >= 0.0).map(|n| n as i64),
        Some(serde_json::Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(n) if n >= 0.0 => Some(n as i64),
            Ok(_) => None,
            Err(_) => {
                let millis = parse_date_string(&s);
                (!millis.is_nan()).then(|| (millis / 1000.0) as i64)
            }
        },
        _ => None,
    })
}

fn lenient_port<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// The host part of `url` (with its port, if any)
pub fn url_netloc(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once("://")?;
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let netloc = rest.get(..end)?;
    // Drop userinfo
    let netloc = netloc.rsplit_once('@').map(|(_, host)| host).unwrap_or(netloc);
    (!netloc.is_empty()).then_some(netloc)
}

/// Convert a jar cookie to its snapshot form. A cookie without an explicit
/// domain is scoped to the host of `url`.
pub fn cookie_to_dict(cookie: &Cookie, url: Option<&str>) -> CookieSnapshot {
    let domain = if cookie.domain_specified {
        Some(cookie.domain.clone())
    } else {
        url.and_then(url_netloc).map(str::to_string)
    };
    CookieSnapshot {
        name: cookie.name.clone(),
        value: cookie.value.clone(),
        domain,
        path: if cookie.path_specified {
            cookie.path.clone()
        } else {
            default_path()
        },
        port: cookie.port.clone(),
        expires: cookie.expires,
        expiry: None,
        secure: cookie.secure,
        discard: cookie.discard,
        httponly: cookie.http_only.then_some(true),
    }
}

/// Convert a snapshot entry back into a jar cookie. The conversion is lossy:
/// attributes the snapshot does not carry take their defaults.
pub fn dict_to_cookie(snapshot: &CookieSnapshot) -> Cookie {
    let domain = snapshot.domain.clone().unwrap_or_default();
    Cookie {
        name: snapshot.name.clone(),
        value: snapshot.value.clone(),
        domain_specified: !domain.is_empty(),
        domain_initial_dot: domain.starts_with('.'),
        domain,
        path: snapshot.path.clone(),
        path_specified: true,
        port: snapshot.port.clone(),
        expires: snapshot.expires.or(snapshot.expiry),
        secure: snapshot.secure,
        discard: snapshot.discard,
        http_only: snapshot.httponly.unwrap_or(false),
    }
}

/// The caller's cookie store
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    cookies: Vec<Cookie>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `cookie`, replacing the one with the same domain, path and name
    pub fn set_cookie(&mut self, cookie: Cookie) {
        match self.cookies.iter_mut().find(|c| c.same_slot(&cookie)) {
            Some(existing) => *existing = cookie,
            None => self.cookies.push(cookie),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Cookie> {
        self.cookies.iter().find(|c| c.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cookie> {
        self.cookies.iter()
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Snapshot of every cookie, scoped to `url`
    pub fn snapshot(&self, url: Option<&str>) -> Vec<CookieSnapshot> {
        self.cookies.iter().map(|c| cookie_to_dict(c, url)).collect()
    }

    /// Write the snapshot JSON to `path`
    pub fn save_snapshot(&self, path: &Path, url: Option<&str>) -> Result<(), JsiError> {
        let json = serde_json::to_string(&self.snapshot(url))?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Merge every cookie found in the snapshot file at `path`. Cookies absent
    /// from the file are kept.
    pub fn merge_snapshot(&mut self, path: &Path) -> Result<usize, JsiError> {
        let text = fs::read_to_string(path)?;
        if text.trim().is_empty() {
            return Ok(0);
        }
        let snapshot: Vec<CookieSnapshot> = serde_json::from_str(&text)?;
        let count = snapshot.len();
        for entry in &snapshot {
            self.set_cookie(dict_to_cookie(entry));
        }
        Ok(count)
    }
}

impl<'a> IntoIterator for &'a CookieJar {
    type Item = &'a Cookie;
    type IntoIter = std::slice::Iter<'a, Cookie>;

    fn into_iter(self) -> Self::IntoIter {
        self.cookies.iter()
    }
}
