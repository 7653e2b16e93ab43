//! The property registry and the hydration protocol.
//!
//! ```text
//! server:  Registry::new -> initialize_state_server_side -> Envelope
//! client:  Registry::new -> phase1(Envelope) -> HydratedState
//!                        -> phase2(HydratedState, env) -> Option<DeltaState>
//! ```
//!
//! Every fan-out runs all properties concurrently with no ordering between
//! them. What happens when one of them fails is decided by [`FailurePolicy`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use appstate_types::{DeltaState, Envelope, HydratedState, same_json_members};
use futures_util::future::join_all;
use serde::Deserialize;

use crate::cookie_consent::cookie_consent;
use crate::environment::{Environment, ServerContext, ServerRequest};
use crate::erased::{AnyProperty, ErasedSetter, PropertyDefinition};
use crate::errors::{PropertyFailure, StateError};
use crate::hooks::ContextChannel;

/// What a fan-out phase does when a property fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the failure, keep the property's previous state, and carry on.
    #[default]
    Isolate,
    /// Abort the phase with the first failure.
    FailFast,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryOptions {
    pub failure_policy: FailurePolicy,
}

/// The lifecycle step a registry has most recently completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Constructed,
    ServerInitialized,
    Injected,
    ClientInitialized,
}

/// A phase result along with the properties that failed under
/// [`FailurePolicy::Isolate`].
#[derive(Debug)]
pub struct Outcome<T> {
    pub value: T,
    pub failures: Vec<PropertyFailure>,
}

impl<T> Outcome<T> {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    #[must_use]
    pub fn into_value(self) -> T {
        self.value
    }
}

/// The names one property claims, and how it persists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyKeys {
    pub setter_name: String,
    pub key: String,
    pub key_plural: String,
    pub sensitive: bool,
    pub cookie: Option<String>,
}

pub struct Registry {
    properties: Vec<Box<dyn AnyProperty>>,
    options: RegistryOptions,
    lifecycle: Lifecycle,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<&str> = self.properties.iter().map(|p| p.names().key()).collect();
        f.debug_struct("Registry")
            .field("properties", &keys)
            .field("options", &self.options)
            .field("lifecycle", &self.lifecycle)
            .finish()
    }
}

fn settle(
    policy: FailurePolicy,
    keys: Vec<String>,
    results: Vec<Result<(), StateError>>,
) -> Result<Vec<PropertyFailure>, StateError> {
    let mut failures = Vec::new();
    for (key, result) in keys.into_iter().zip(results) {
        let Err(error) = result else { continue };
        match policy {
            FailurePolicy::FailFast => return Err(error),
            FailurePolicy::Isolate => {
                tracing::warn!(
                    key = %key,
                    error = %error,
                    "property failed; keeping its previous state"
                );
                failures.push(PropertyFailure { key, error });
            }
        }
    }
    Ok(failures)
}

impl Registry {
    /// Builds every property, appends cookie consent, and checks that no two
    /// properties claim the same key, plural key, or setter name.
    pub fn new(
        definitions: Vec<PropertyDefinition>,
        options: RegistryOptions,
    ) -> Result<Self, StateError> {
        let mut claimed = BTreeSet::new();
        let mut properties = Vec::with_capacity(definitions.len() + 1);
        let definitions = definitions
            .into_iter()
            .chain([PropertyDefinition::from(cookie_consent())]);
        for definition in definitions {
            let property = definition.build()?;
            for name in property.names().namespace() {
                if !claimed.insert(name.to_string()) {
                    return Err(StateError::NonUniqueKey {
                        key: property.names().key().to_string(),
                        name: name.to_string(),
                    });
                }
            }
            properties.push(property);
        }
        tracing::debug!(properties = properties.len(), "registry constructed");
        Ok(Self {
            properties,
            options,
            lifecycle: Lifecycle::Constructed,
        })
    }

    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    #[must_use]
    pub fn options(&self) -> RegistryOptions {
        self.options
    }

    fn keys(&self) -> Vec<String> {
        self.properties.iter().map(|p| p.names().key().to_string()).collect()
    }

    /// Computes every property's server-side state and serializes it.
    pub async fn initialize_state_server_side(
        &mut self,
        request: ServerRequest,
    ) -> Result<Outcome<Envelope>, StateError> {
        let ctx = Arc::new(ServerContext::from_request(request));
        let keys = self.keys();
        let results = join_all(
            self.properties
                .iter_mut()
                .map(|property| property.initialize_server_side(Arc::clone(&ctx))),
        )
        .await;
        let failures = settle(self.options.failure_policy, keys, results)?;

        let mut envelope = Envelope::new();
        for property in &self.properties {
            envelope.insert(property.names().key(), property.snapshot()?);
        }
        self.lifecycle = Lifecycle::ServerInitialized;
        tracing::info!(
            properties = envelope.len(),
            failures = failures.len(),
            "server-side state initialized"
        );
        Ok(Outcome {
            value: envelope,
            failures,
        })
    }

    /// Phase 1: injects the envelope and projects the result. Synchronous, so
    /// the first client render matches the server render.
    pub fn initialize_state_client_side_phase1(
        &mut self,
        envelope: &Envelope,
    ) -> Result<Outcome<HydratedState>, StateError> {
        let keys = self.keys();
        let results = self
            .properties
            .iter_mut()
            .map(|property| {
                let key = property.names().key();
                let snapshot = envelope.get(key).ok_or_else(|| StateError::MissingSnapshot {
                    key: key.to_string(),
                })?;
                property.inject(snapshot)
            })
            .collect();
        let failures = settle(self.options.failure_policy, keys, results)?;

        let mut hydrated = HydratedState::default();
        for property in &self.properties {
            let names = property.names();
            let projection = property.projection()?;
            hydrated.global_app_state.insert(names.key().to_string(), projection.value);
            hydrated
                .global_app_state
                .insert(names.key_plural().to_string(), projection.values.into());
            if let Some(context) = projection.context_value {
                hydrated.contexts.insert(names.key().to_string(), context);
            }
        }
        self.lifecycle = Lifecycle::Injected;
        Ok(Outcome {
            value: hydrated,
            failures,
        })
    }

    /// Phase 2: runs client-only hooks concurrently and reports what changed
    /// relative to `hydrated`. `None` means nothing changed.
    pub async fn initialize_state_client_side_phase2(
        &mut self,
        hydrated: &HydratedState,
        env: &Environment,
    ) -> Result<Outcome<Option<DeltaState>>, StateError> {
        let keys = self.keys();
        let results = join_all(
            self.properties
                .iter_mut()
                .map(|property| property.initialize_client_side(hydrated, env)),
        )
        .await;
        let failures = settle(self.options.failure_policy, keys, results)?;

        let mut delta = DeltaState::default();
        for property in &self.properties {
            let names = property.names();
            let projection = property.projection()?;
            if hydrated.value(names.key()) != Some(&projection.value) {
                delta.global_app_state.insert(names.key().to_string(), projection.value);
            }
            let unchanged_values = hydrated
                .values(names.key_plural())
                .is_some_and(|existing| same_json_members(existing, &projection.values));
            if !unchanged_values {
                delta
                    .global_app_state
                    .insert(names.key_plural().to_string(), projection.values.into());
            }
            if let Some(context) = projection.context_value
                && hydrated.context(names.key()) != Some(&context)
            {
                delta.contexts.insert(names.key().to_string(), context);
            }
        }
        self.lifecycle = Lifecycle::ClientInitialized;
        let delta = delta.non_empty();
        tracing::debug!(
            changed = delta.is_some(),
            failures = failures.len(),
            "client-side state initialized"
        );
        Ok(Outcome { value: delta, failures })
    }

    /// `setter_name -> setter` for every property.
    #[must_use]
    pub fn get_setters(&self) -> BTreeMap<String, ErasedSetter> {
        self.properties
            .iter()
            .map(|p| (p.names().setter_name().to_string(), p.erased_setter()))
            .collect()
    }

    /// `key -> provider` for every property with a context.
    #[must_use]
    pub fn get_context_keys_and_providers(&self) -> BTreeMap<String, ContextChannel> {
        self.properties
            .iter()
            .filter_map(|p| Some((p.names().key().to_string(), p.context_provider()?.clone())))
            .collect()
    }

    #[must_use]
    pub fn get_property_keys(&self) -> Vec<PropertyKeys> {
        self.properties
            .iter()
            .map(|p| {
                let names = p.names();
                PropertyKeys {
                    setter_name: names.setter_name().to_string(),
                    key: names.key().to_string(),
                    key_plural: names.key_plural().to_string(),
                    sensitive: p.is_sensitive(),
                    cookie: p.cookie_name().map(ToString::to_string),
                }
            })
            .collect()
    }
}
