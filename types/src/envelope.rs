//! The transport envelope: the only data that crosses from the server render
//! to client hydration.
//!
//! ```json
//! { "lang": { "value": "sv", "values": ["en", "sv", "fi"], "serializedContext": { .. } } }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One property's slice of the envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySnapshot {
    pub value: Value,
    pub values: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serialized_context: Option<Value>,
}

/// Keyed snapshots for every registered property.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Envelope(BTreeMap<String, PropertySnapshot>);

impl Envelope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, snapshot: PropertySnapshot) {
        self.0.insert(key.into(), snapshot);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&PropertySnapshot> {
        self.0.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertySnapshot)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, PropertySnapshot)> for Envelope {
    fn from_iter<I: IntoIterator<Item = (String, PropertySnapshot)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn omits_absent_context() {
        let mut envelope = Envelope::new();
        envelope.insert(
            "themeType",
            PropertySnapshot {
                value: json!("dark"),
                values: vec![json!("auto"), json!("light"), json!("dark")],
                serialized_context: None,
            },
        );
        let wire = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            wire,
            json!({ "themeType": { "value": "dark", "values": ["auto", "light", "dark"] } })
        );
    }

    #[test]
    fn reads_camel_case_context() {
        let wire =
            r#"{"lang":{"value":"fi","values":["en","fi"],"serializedContext":{"hello":"Hei"}}}"#;
        let envelope: Envelope = serde_json::from_str(wire).unwrap();
        let lang = envelope.get("lang").unwrap();
        assert_eq!(lang.value, json!("fi"));
        assert_eq!(lang.serialized_context, Some(json!({ "hello": "Hei" })));
    }
}
