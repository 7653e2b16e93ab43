//! Cookie helpers.
//!
//! Cookies are flat `key=value` pairs. Parsing is deliberately non-validating:
//! anything shaped like `key=value` separated by `;` or `,` is accepted.

use std::collections::BTreeMap;
use std::sync::{LazyLock, Mutex, PoisonError};

use regex::Regex;

/// One year, in seconds.
pub const DEFAULT_COOKIE_MAX_AGE: u64 = 31_536_000;

const EPOCH_UTC: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

pub type Cookies = BTreeMap<String, String>;

static COOKIE_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^=]+)=([^;,]+)(?:[;,] ?)?").expect("cookie regex is valid"));

/// Parses a `Cookie` header (or `document.cookie`-style string).
///
/// Later duplicates overwrite earlier ones.
#[must_use]
pub fn parse_cookies(header: &str) -> Cookies {
    let mut cookies = Cookies::new();
    for caps in COOKIE_PAIR.captures_iter(header) {
        let key = caps[1].trim();
        if key.is_empty() {
            continue;
        }
        cookies.insert(key.to_string(), caps[2].to_string());
    }
    cookies
}

/// `key=value;max-age=<max_age>`
#[must_use]
pub fn set_cookie_directive(key: &str, value: &str, max_age: u64) -> String {
    format!("{key}={value};max-age={max_age}")
}

/// `key=value;expires=<epoch>`, which makes the browser drop the cookie.
#[must_use]
pub fn expire_cookie_directive(key: &str, value: &str) -> String {
    format!("{key}={value};expires={EPOCH_UTC}")
}

#[derive(Debug, Default)]
struct JarInner {
    cookies: Cookies,
    directives: Vec<String>,
}

/// Client-side cookie store.
///
/// Mirrors what the browser's cookie jar would hold after each write, and
/// records every directive written so callers can forward them (or tests can
/// inspect them). Writes from concurrent setters are serialized by a mutex but
/// are otherwise uncoordinated: last write wins.
#[derive(Debug)]
pub struct CookieJar {
    max_age: u64,
    inner: Mutex<JarInner>,
}

impl Default for CookieJar {
    fn default() -> Self {
        Self::new(DEFAULT_COOKIE_MAX_AGE)
    }
}

impl CookieJar {
    #[must_use]
    pub fn new(max_age: u64) -> Self {
        Self {
            max_age,
            inner: Mutex::new(JarInner::default()),
        }
    }

    /// A jar pre-populated from an existing cookie string.
    #[must_use]
    pub fn from_header(header: &str, max_age: u64) -> Self {
        let jar = Self::new(max_age);
        jar.lock().cookies = parse_cookies(header);
        jar
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, JarInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn max_age(&self) -> u64 {
        self.max_age
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().cookies.get(key).cloned()
    }

    #[must_use]
    pub fn cookies(&self) -> Cookies {
        self.lock().cookies.clone()
    }

    /// Every directive written so far, oldest first.
    #[must_use]
    pub fn directives(&self) -> Vec<String> {
        self.lock().directives.clone()
    }

    pub fn set(&self, key: &str, value: &str) {
        let directive = set_cookie_directive(key, value, self.max_age);
        let mut inner = self.lock();
        inner.cookies.insert(key.to_string(), value.to_string());
        inner.directives.push(directive);
        tracing::debug!(key, value, "cookie set");
    }

    /// Expires every cookie in `keys` that is currently present.
    pub fn purge<'a>(&self, keys: impl IntoIterator<Item = &'a str>) {
        let mut inner = self.lock();
        let mut purged = Vec::new();
        for key in keys {
            if let Some(value) = inner.cookies.remove(key) {
                inner.directives.push(expire_cookie_directive(key, &value));
                purged.push(key.to_string());
            }
        }
        if !purged.is_empty() {
            tracing::debug!(cookies = ?purged, "cookies purged");
        }
    }

    /// Expires every cookie except those named in `keep`.
    pub fn purge_all_except(&self, keep: &[&str]) {
        let doomed: Vec<String> = self
            .lock()
            .cookies
            .keys()
            .filter(|k| !keep.contains(&k.as_str()))
            .cloned()
            .collect();
        self.purge(doomed.iter().map(String::as_str));
    }

    /// Makes the jar hold exactly `desired`: changed or new keys are set,
    /// keys absent from `desired` are purged.
    pub fn reconcile(&self, desired: &Cookies) {
        for (key, value) in desired {
            match self.get(key) {
                Some(existing) if existing == *value => {}
                Some(existing) => {
                    tracing::debug!(
                        key = %key,
                        from = %existing,
                        to = %value,
                        "cookie changes value"
                    );
                    self.set(key, value);
                }
                None => self.set(key, value),
            }
        }
        let remaining: Vec<String> = self
            .lock()
            .cookies
            .keys()
            .filter(|k| !desired.contains_key(*k))
            .cloned()
            .collect();
        self.purge(remaining.iter().map(String::as_str));
    }
}
