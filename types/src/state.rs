//! Flat projections of hydrated registry state, as handed to the consumer layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Hydrated state after client phase 1.
///
/// `global_app_state` holds `key -> value` and `keyPlural -> [values]` for
/// every property; `contexts` holds `key -> context value` for properties that
/// carry one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HydratedState {
    pub global_app_state: BTreeMap<String, Value>,
    pub contexts: BTreeMap<String, Value>,
    pub mounted: bool,
}

impl HydratedState {
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.global_app_state.get(key)
    }

    /// The plural collection stored under `key_plural`, if it is an array.
    #[must_use]
    pub fn values(&self, key_plural: &str) -> Option<&[Value]> {
        self.global_app_state
            .get(key_plural)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
    }

    #[must_use]
    pub fn context(&self, key: &str) -> Option<&Value> {
        self.contexts.get(key)
    }

    /// Merges `delta` into this state. Does not touch `mounted`.
    pub fn apply(&mut self, delta: &DeltaState) {
        for (name, value) in &delta.global_app_state {
            self.global_app_state.insert(name.clone(), value.clone());
        }
        for (key, value) in &delta.contexts {
            self.contexts.insert(key.clone(), value.clone());
        }
    }
}

/// Sparse diff between phase 1 and phase 2 hydration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaState {
    pub global_app_state: BTreeMap<String, Value>,
    pub contexts: BTreeMap<String, Value>,
}

impl DeltaState {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.global_app_state.is_empty() && self.contexts.is_empty()
    }

    /// `None` when there is nothing to merge.
    #[must_use]
    pub fn non_empty(self) -> Option<Self> {
        if self.is_empty() { None } else { Some(self) }
    }
}

/// Set equality over JSON arrays: same length and every member of `a` is in `b`.
#[must_use]
pub fn same_json_members(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().all(|v| b.contains(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn apply_overwrites_only_delta_entries() {
        let mut state = HydratedState::default();
        state.global_app_state.insert("lang".into(), json!("en"));
        state.global_app_state.insert("languages".into(), json!(["en", "sv"]));

        let mut delta = DeltaState::default();
        delta.global_app_state.insert("lang".into(), json!("sv"));
        delta.contexts.insert("lang".into(), json!({ "hi": "Hej" }));
        state.apply(&delta);

        assert_eq!(state.value("lang"), Some(&json!("sv")));
        assert_eq!(state.values("languages").unwrap().len(), 2);
        assert_eq!(state.context("lang"), Some(&json!({ "hi": "Hej" })));
        assert!(!state.mounted);
    }

    #[test]
    fn empty_delta_is_none() {
        assert!(DeltaState::default().non_empty().is_none());
    }

    #[test]
    fn json_set_equality() {
        assert!(same_json_members(&[json!(1), json!(2)], &[json!(2), json!(1)]));
        assert!(!same_json_members(&[json!(1)], &[json!(1), json!(2)]));
        assert!(!same_json_members(&[json!(1), json!(3)], &[json!(1), json!(2)]));
    }
}
