//! A single global app state property.
//!
//! A property owns its state (`value`, `values`, `context_value`) and the
//! hooks that compute it on the server and refine it on the client. The
//! registry drives the lifecycle:
//!
//! ```text
//! new -> initialize_state_server_side -> snapshot        (server)
//! new -> inject_dehydrated_state -> initialize_state_client_side   (client)
//! ```

use std::future::Future;
use std::sync::Arc;

use appstate_types::{ContextTiming, PropertyNames, PropertySnapshot, PropertyValue, ValueSet};
use serde_json::Value;

use crate::environment::{Environment, ServerContext};
use crate::errors::{ConfigWarning, StateError};
use crate::hooks::{
    ContextChannel, ContextControl, ContextTransform, GetValues, InitializeValue, SetValueHook,
    Setter, SetterArgs, boxed,
};

/// Declarative definition of a property.
///
/// Every hook is optional. Missing hooks keep the value they would have
/// produced: defaults on the server, the hydrated state on the client.
pub struct PropertyConfig<T> {
    pub key: String,
    pub key_plural: Option<String>,
    pub default_value: T,
    pub default_values: ValueSet<T>,
    pub initialize_value: InitializeValue<T>,
    pub get_values: GetValues<T>,
    pub set_value: Option<SetValueHook<T>>,
    /// Sensitive properties only persist to cookies with cookie consent.
    pub is_sensitive_information: bool,
    /// The cookie the property persists its value to, if any.
    pub cookie: Option<String>,
    pub control_context: Option<ContextControl<T>>,
}

impl<T: PropertyValue> PropertyConfig<T> {
    pub fn new(
        key: impl Into<String>,
        default_value: T,
        default_values: impl Into<ValueSet<T>>,
    ) -> Self {
        Self {
            key: key.into(),
            key_plural: None,
            default_value,
            default_values: default_values.into(),
            initialize_value: InitializeValue::default(),
            get_values: GetValues::default(),
            set_value: None,
            is_sensitive_information: false,
            cookie: None,
            control_context: None,
        }
    }

    #[must_use]
    pub fn key_plural(mut self, plural: impl Into<String>) -> Self {
        self.key_plural = Some(plural.into());
        self
    }

    #[must_use]
    pub fn sensitive(mut self) -> Self {
        self.is_sensitive_information = true;
        self
    }

    #[must_use]
    pub fn cookie(mut self, name: impl Into<String>) -> Self {
        self.cookie = Some(name.into());
        self
    }

    #[must_use]
    pub fn server_value<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(ValueSet<T>, Arc<ServerContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        self.initialize_value.server_side =
            Some(Arc::new(move |values: ValueSet<T>, ctx: Arc<ServerContext>| {
                boxed(hook(values, ctx))
            }));
        self
    }

    #[must_use]
    pub fn client_value<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(ValueSet<T>, T, Environment) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        self.initialize_value.client_side =
            Some(Arc::new(move |values: ValueSet<T>, existing: T, env: Environment| {
                boxed(hook(values, existing, env))
            }));
        self
    }

    #[must_use]
    pub fn server_values<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<ValueSet<T>>> + Send + 'static,
    {
        self.get_values.server_side = Some(Arc::new(move || boxed(hook())));
        self
    }

    #[must_use]
    pub fn client_values<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Environment) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<ValueSet<T>>> + Send + 'static,
    {
        self.get_values.client_side = Some(Arc::new(move |env: Environment| boxed(hook(env))));
        self
    }

    #[must_use]
    pub fn set_value<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(SetterArgs<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.set_value = Some(Arc::new(move |args: SetterArgs<T>| boxed(hook(args))));
        self
    }

    #[must_use]
    pub fn control_context(mut self, control: ContextControl<T>) -> Self {
        self.control_context = Some(control);
        self
    }
}

struct PropertyState<T> {
    value: T,
    values: ValueSet<T>,
    context_value: Option<Value>,
}

struct ContextSlot<T> {
    transform: ContextTransform<T>,
    channel: ContextChannel,
}

pub struct Property<T> {
    names: PropertyNames,
    is_sensitive_information: bool,
    cookie: Option<String>,
    initialize_value: InitializeValue<T>,
    get_values: GetValues<T>,
    set_value: Option<SetValueHook<T>>,
    context: Option<ContextSlot<T>>,
    state: PropertyState<T>,
}

impl<T: PropertyValue> Property<T> {
    pub fn new(config: PropertyConfig<T>) -> Result<Self, StateError> {
        if !config.default_values.contains(&config.default_value) {
            return Err(StateError::Construction { key: config.key });
        }
        let names = PropertyNames::new(config.key, config.key_plural)?;
        let context = config.control_context.map(|control| ContextSlot {
            transform: control.transform,
            channel: control.provider.unwrap_or_default(),
        });
        Ok(Self {
            names,
            is_sensitive_information: config.is_sensitive_information,
            cookie: config.cookie,
            initialize_value: config.initialize_value,
            get_values: config.get_values,
            set_value: config.set_value,
            context,
            state: PropertyState {
                value: config.default_value,
                values: config.default_values,
                context_value: None,
            },
        })
    }

    #[must_use]
    pub fn names(&self) -> &PropertyNames {
        &self.names
    }

    #[must_use]
    pub fn key(&self) -> &str {
        self.names.key()
    }

    #[must_use]
    pub fn value(&self) -> &T {
        &self.state.value
    }

    #[must_use]
    pub fn values(&self) -> &ValueSet<T> {
        &self.state.values
    }

    #[must_use]
    pub fn context_value(&self) -> Option<&Value> {
        self.state.context_value.as_ref()
    }

    /// The channel broadcasting this property's context value.
    #[must_use]
    pub fn context_provider(&self) -> Option<&ContextChannel> {
        self.context.as_ref().map(|slot| &slot.channel)
    }

    #[must_use]
    pub fn context_timing(&self) -> Option<ContextTiming> {
        self.context.as_ref().map(|slot| slot.transform.timing())
    }

    #[must_use]
    pub fn is_sensitive(&self) -> bool {
        self.is_sensitive_information
    }

    #[must_use]
    pub fn cookie_name(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    fn hook_err(&self) -> impl Fn(anyhow::Error) -> StateError + '_ {
        |err| StateError::hook(self.key(), err)
    }

    fn encode<V: serde::Serialize>(&self, value: &V) -> Result<Value, StateError> {
        serde_json::to_value(value).map_err(|source| StateError::Encode {
            key: self.key().to_string(),
            source,
        })
    }

    fn decode<V: serde::de::DeserializeOwned>(&self, value: Value) -> Result<V, StateError> {
        serde_json::from_value(value).map_err(|source| StateError::Decode {
            key: self.key().to_string(),
            source,
        })
    }

    /// Computes the server-side state.
    ///
    /// All hooks run before any state is written, so a failing hook leaves the
    /// property exactly as it was.
    pub async fn initialize_state_server_side(
        &mut self,
        ctx: Arc<ServerContext>,
    ) -> Result<(), StateError> {
        let values = match &self.get_values.server_side {
            Some(get_values) => get_values().await.map_err(self.hook_err())?,
            None => self.state.values.clone(),
        };
        let value = match &self.initialize_value.server_side {
            Some(initialize) => initialize(values.clone(), ctx).await.map_err(self.hook_err())?,
            None => self.state.value.clone(),
        };
        let context_value = match self.context.as_ref().map(|slot| &slot.transform) {
            Some(ContextTransform::ServerComputed(Some(transform))) => {
                Some(transform(value.clone()).await.map_err(self.hook_err())?)
            }
            Some(ContextTransform::ServerComputed(None)) => {
                ConfigWarning::AmbiguousServerComputed.warn(self.key());
                Some(self.encode(&value)?)
            }
            _ => self.state.context_value.clone(),
        };
        tracing::debug!(key = self.key(), value = ?value, "server-side state initialized");
        self.state = PropertyState {
            value,
            values,
            context_value,
        };
        Ok(())
    }

    /// The state as it travels in the transport envelope.
    pub fn snapshot(&self) -> Result<PropertySnapshot, StateError> {
        let serialized_context = match self.context_timing() {
            Some(ContextTiming::ServerComputed) => self.state.context_value.clone(),
            _ => None,
        };
        Ok(PropertySnapshot {
            value: self.encode(&self.state.value)?,
            values: self
                .state
                .values
                .iter()
                .map(|v| self.encode(v))
                .collect::<Result<_, _>>()?,
            serialized_context,
        })
    }

    /// Replaces the state wholesale with a snapshot from the server.
    pub fn inject_dehydrated_state(
        &mut self,
        snapshot: &PropertySnapshot,
    ) -> Result<(), StateError> {
        let value: T = self.decode(snapshot.value.clone())?;
        let values: ValueSet<T> = self.decode(Value::Array(snapshot.values.clone()))?;
        self.inject_state(value, values, snapshot.serialized_context.clone())
    }

    /// Typed counterpart of [`Self::inject_dehydrated_state`].
    ///
    /// Server-computed contexts keep `serialized_context`; sync contexts are
    /// recomputed from `value` here; async contexts wait for phase 2.
    pub fn inject_state(
        &mut self,
        value: T,
        values: ValueSet<T>,
        serialized_context: Option<Value>,
    ) -> Result<(), StateError> {
        let context_value = match self.context.as_ref().map(|slot| &slot.transform) {
            Some(ContextTransform::SyncOnInject(Some(transform))) => Some(transform(&value)),
            Some(ContextTransform::SyncOnInject(None)) => Some(self.encode(&value)?),
            _ => serialized_context,
        };
        self.state = PropertyState {
            value,
            values,
            context_value,
        };
        Ok(())
    }

    /// Phase 2: refines the hydrated state with client-only hooks.
    ///
    /// Like the server-side step, nothing is written unless every hook succeeds.
    /// Sync contexts follow the refined value.
    pub async fn initialize_state_client_side(
        &mut self,
        existing_value: T,
        existing_values: ValueSet<T>,
        existing_context: Option<Value>,
        env: &Environment,
    ) -> Result<(), StateError> {
        let values = match &self.get_values.client_side {
            Some(get_values) => get_values(env.clone()).await.map_err(self.hook_err())?,
            None => existing_values,
        };
        let value = match &self.initialize_value.client_side {
            Some(initialize) => initialize(values.clone(), existing_value, env.clone())
                .await
                .map_err(self.hook_err())?,
            None => existing_value,
        };
        let context_value = match self.context.as_ref().map(|slot| &slot.transform) {
            Some(ContextTransform::AsyncPostHydration(Some(transform))) => {
                Some(transform(value.clone()).await.map_err(self.hook_err())?)
            }
            Some(ContextTransform::AsyncPostHydration(None)) => {
                ConfigWarning::AmbiguousAsyncPostHydration.warn(self.key());
                match existing_context {
                    Some(existing) => Some(existing),
                    None => Some(self.encode(&value)?),
                }
            }
            Some(ContextTransform::SyncOnInject(Some(transform))) => Some(transform(&value)),
            Some(ContextTransform::SyncOnInject(None)) => Some(self.encode(&value)?),
            _ => existing_context,
        };
        self.state = PropertyState {
            value,
            values,
            context_value,
        };
        Ok(())
    }

    /// The setter exposed to the consumer layer.
    ///
    /// With both a `set_value` hook and a transform, the setter performs the
    /// side effect and then recomputes the context value from the new value.
    /// With only `set_value`, it performs the side effect. Otherwise it does
    /// nothing.
    #[must_use]
    pub fn setter(&self) -> Setter<T> {
        let Some(set_value) = self.set_value.clone() else {
            return Arc::new(|_args: SetterArgs<T>| boxed(async { Ok(None::<Value>) }));
        };
        match self.context.as_ref().map(|slot| &slot.transform) {
            Some(
                ContextTransform::ServerComputed(Some(transform))
                | ContextTransform::AsyncPostHydration(Some(transform)),
            ) => {
                let transform = Arc::clone(transform);
                Arc::new(move |args: SetterArgs<T>| {
                    let set_value = Arc::clone(&set_value);
                    let transform = Arc::clone(&transform);
                    boxed(async move {
                        let value = args.value.clone();
                        set_value(args).await?;
                        Ok(Some(transform(value).await?))
                    })
                })
            }
            Some(ContextTransform::SyncOnInject(Some(transform))) => {
                let transform = Arc::clone(transform);
                Arc::new(move |args: SetterArgs<T>| {
                    let set_value = Arc::clone(&set_value);
                    let transform = Arc::clone(&transform);
                    boxed(async move {
                        let context = transform(&args.value);
                        set_value(args).await?;
                        Ok(Some(context))
                    })
                })
            }
            _ => Arc::new(move |args: SetterArgs<T>| {
                let set_value = Arc::clone(&set_value);
                boxed(async move {
                    set_value(args).await?;
                    Ok(None::<Value>)
                })
            }),
        }
    }
}
