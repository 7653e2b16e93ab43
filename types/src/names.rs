//! Derived names of a global app state property.
//!
//! Every property claims three names in a single shared namespace: its key,
//! the plural key under which its universe of valid values is exposed, and
//! the name of its generated setter.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("property key must not be empty")]
    EmptyKey,
    #[error("[{key}]: plural key must not be empty")]
    EmptyPlural { key: String },
}

/// The three names a property occupies.
///
/// Invariant: all three are non-empty. `key_plural` defaults to `key + "s"`
/// and `setter_name` is always `"set" + key` with the first letter of the key
/// uppercased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyNames {
    key: String,
    key_plural: String,
    setter_name: String,
}

impl PropertyNames {
    pub fn new(key: impl Into<String>, key_plural: Option<String>) -> Result<Self, NameError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(NameError::EmptyKey);
        }
        let key_plural = match key_plural {
            Some(plural) if plural.trim().is_empty() => {
                return Err(NameError::EmptyPlural { key });
            }
            Some(plural) => plural,
            None => format!("{key}s"),
        };
        let setter_name = format!("set{}", capitalize_first(&key));
        Ok(Self {
            key,
            key_plural,
            setter_name,
        })
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn key_plural(&self) -> &str {
        &self.key_plural
    }

    #[must_use]
    pub fn setter_name(&self) -> &str {
        &self.setter_name
    }

    /// All names claimed by this property, key first.
    #[must_use]
    pub fn namespace(&self) -> [&str; 3] {
        [&self.key, &self.key_plural, &self.setter_name]
    }
}

/// Uppercases the first character, leaving the rest untouched.
#[must_use]
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
