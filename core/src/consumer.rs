//! The consumer-facing app state context.
//!
//! Holds the hydrated state, merges the phase-2 delta, and routes setter calls
//! to the owning property. One context is created per application bootstrap
//! and passed to whatever needs it.

use std::collections::BTreeMap;

use appstate_types::{CookieConsent, DeltaState, HydratedState};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;

use crate::cookie_consent::COOKIE_CONSENT_KEY;
use crate::environment::Environment;
use crate::erased::{ErasedSetter, ErasedSetterArgs};
use crate::errors::StateError;
use crate::hooks::ContextChannel;
use crate::registry::Registry;

struct SetterEntry {
    key: String,
    key_plural: String,
    sensitive: bool,
    cookie: Option<String>,
    setter: ErasedSetter,
}

/// Cookies hold bare strings; anything else keeps its JSON text.
fn cookie_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub struct AppStateContext {
    state: watch::Sender<HydratedState>,
    setters: BTreeMap<String, SetterEntry>,
    providers: BTreeMap<String, ContextChannel>,
    env: Environment,
}

impl std::fmt::Debug for AppStateContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppStateContext")
            .field("state", &*self.state.borrow())
            .field("setters", &self.setters.keys().collect::<Vec<_>>())
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl AppStateContext {
    /// Wraps the phase-1 state. Its context values are published right away.
    #[must_use]
    pub fn new(registry: &Registry, hydrated: HydratedState, env: Environment) -> Self {
        let mut erased = registry.get_setters();
        let setters = registry
            .get_property_keys()
            .into_iter()
            .filter_map(|keys| {
                let setter = erased.remove(&keys.setter_name)?;
                Some((
                    keys.setter_name,
                    SetterEntry {
                        key: keys.key,
                        key_plural: keys.key_plural,
                        sensitive: keys.sensitive,
                        cookie: keys.cookie,
                        setter,
                    },
                ))
            })
            .collect();
        let providers = registry.get_context_keys_and_providers();
        for (key, provider) in &providers {
            provider.publish(hydrated.context(key).cloned());
        }
        let (state, _rx) = watch::channel(hydrated);
        Self {
            state,
            setters,
            providers,
            env,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> HydratedState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<HydratedState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.state.borrow().mounted
    }

    /// The current value under `name` (a key or plural key), decoded.
    #[must_use]
    pub fn value<V: DeserializeOwned>(&self, name: &str) -> Option<V> {
        let state = self.state.borrow();
        serde_json::from_value(state.value(name)?.clone()).ok()
    }

    #[must_use]
    pub fn setter_names(&self) -> Vec<&str> {
        self.setters.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn provider(&self, key: &str) -> Option<&ContextChannel> {
        self.providers.get(key)
    }

    /// Applies the phase-2 delta, if any, and marks the state mounted.
    pub fn merge(&self, delta: Option<DeltaState>) {
        self.state.send_modify(|state| {
            if let Some(delta) = &delta {
                state.apply(delta);
            }
            state.mounted = true;
        });
        let Some(delta) = delta else { return };
        for (key, context) in delta.contexts {
            if let Some(provider) = self.providers.get(&key) {
                provider.publish(Some(context));
            }
        }
        tracing::debug!(changed = delta.global_app_state.len(), "hydration delta merged");
    }

    /// Carries a consent change over to every sensitive property.
    ///
    /// Granting copies their session items into local storage and writes their
    /// current values to cookies. Withdrawing removes their local items; the
    /// consent setter has already purged the cookies.
    fn apply_consent(&self, granted: bool) -> Result<(), StateError> {
        let browser = self.env.browser("applyCookieConsent")?;
        let state = self.state.borrow();
        let sensitive: Vec<&SetterEntry> =
            self.setters.values().filter(|entry| entry.sensitive).collect();
        if granted {
            let mut desired = browser.cookies().cookies();
            for entry in &sensitive {
                if let Some(item) = browser.session_storage().get(&entry.key) {
                    browser.local_storage().set(&entry.key, &item);
                }
                if let (Some(cookie), Some(value)) = (&entry.cookie, state.value(&entry.key)) {
                    desired.insert(cookie.clone(), cookie_text(value));
                }
            }
            browser.cookies().reconcile(&desired);
        } else {
            for entry in &sensitive {
                browser.local_storage().remove(&entry.key);
            }
        }
        tracing::debug!(
            granted,
            properties = sensitive.len(),
            "cookie consent applied to sensitive properties"
        );
        Ok(())
    }

    /// Calls the setter named `setter_name` with `value` and writes the
    /// result into the state.
    pub async fn set<V: Serialize>(&self, setter_name: &str, value: V) -> Result<(), StateError> {
        let entry = self.setters.get(setter_name).ok_or_else(|| StateError::UnknownSetter {
            name: setter_name.to_string(),
        })?;
        let value = serde_json::to_value(value).map_err(|source| StateError::Encode {
            key: entry.key.clone(),
            source,
        })?;
        let (values, cookie_consent) = {
            let state = self.state.borrow();
            if !state.mounted {
                return Err(StateError::NotMounted);
            }
            let values = state.values(&entry.key_plural).map(<[Value]>::to_vec).unwrap_or_default();
            let cookie_consent: CookieConsent = state
                .value(COOKIE_CONSENT_KEY)
                .and_then(|v| serde_json::from_value(v.clone()).ok())
                .unwrap_or(None);
            (values, cookie_consent)
        };

        let context = (entry.setter)(ErasedSetterArgs {
            value: value.clone(),
            values,
            cookie_consent,
            env: self.env.clone(),
        })
        .await?;

        self.state.send_modify(|state| {
            state.global_app_state.insert(entry.key.clone(), value);
            if let Some(context) = &context {
                state.contexts.insert(entry.key.clone(), context.clone());
            }
        });
        if let (Some(context), Some(provider)) = (context, self.providers.get(&entry.key)) {
            provider.publish(Some(context));
        }
        if entry.key == COOKIE_CONSENT_KEY {
            let granted = self.value::<CookieConsent>(COOKIE_CONSENT_KEY) == Some(Some(true));
            self.apply_consent(granted)?;
        }
        tracing::debug!(key = %entry.key, setter = setter_name, "global app state updated");
        Ok(())
    }
}
