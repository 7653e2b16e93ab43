//! Type-erased view of a property, so the registry can hold properties of
//! different value types side by side.

use std::fmt;
use std::sync::Arc;

use appstate_types::{
    CookieConsent, HydratedState, PropertyNames, PropertySnapshot, PropertyValue, ValueSet,
};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::environment::{Environment, ServerContext};
use crate::errors::StateError;
use crate::hooks::{ContextChannel, SetterArgs};
use crate::property::{Property, PropertyConfig};

/// A setter over JSON values. Resolves to the recomputed context value, if any.
pub type ErasedSetter = Arc<
    dyn Fn(ErasedSetterArgs) -> BoxFuture<'static, Result<Option<Value>, StateError>> + Send + Sync,
>;

#[derive(Debug, Clone)]
pub struct ErasedSetterArgs {
    pub value: Value,
    pub values: Vec<Value>,
    pub cookie_consent: CookieConsent,
    pub env: Environment,
}

/// A property's state in flat JSON form.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyProjection {
    pub value: Value,
    pub values: Vec<Value>,
    pub context_value: Option<Value>,
}

pub trait AnyProperty: Send + Sync {
    fn names(&self) -> &PropertyNames;

    fn is_sensitive(&self) -> bool;

    fn cookie_name(&self) -> Option<&str>;

    fn context_provider(&self) -> Option<&ContextChannel>;

    fn snapshot(&self) -> Result<PropertySnapshot, StateError>;

    fn projection(&self) -> Result<PropertyProjection, StateError>;

    fn initialize_server_side(
        &mut self,
        ctx: Arc<ServerContext>,
    ) -> BoxFuture<'_, Result<(), StateError>>;

    fn inject(&mut self, snapshot: &PropertySnapshot) -> Result<(), StateError>;

    /// Phase 2 for this property, starting from its entries in `hydrated`.
    fn initialize_client_side<'a>(
        &'a mut self,
        hydrated: &'a HydratedState,
        env: &'a Environment,
    ) -> BoxFuture<'a, Result<(), StateError>>;

    fn erased_setter(&self) -> ErasedSetter;
}

fn decode<V: DeserializeOwned>(key: &str, value: Value) -> Result<V, StateError> {
    serde_json::from_value(value).map_err(|source| StateError::Decode {
        key: key.to_string(),
        source,
    })
}

fn encode<V: serde::Serialize>(key: &str, value: &V) -> Result<Value, StateError> {
    serde_json::to_value(value).map_err(|source| StateError::Encode {
        key: key.to_string(),
        source,
    })
}

impl<T: PropertyValue> Property<T> {
    /// The hydrated entries for this property, falling back to its own state
    /// for entries `hydrated` does not carry.
    fn existing_state(
        &self,
        hydrated: &HydratedState,
    ) -> Result<(T, ValueSet<T>, Option<Value>), StateError> {
        let key = self.key();
        let value = match hydrated.value(key) {
            Some(value) => decode(key, value.clone())?,
            None => self.value().clone(),
        };
        let values = match hydrated.values(self.names().key_plural()) {
            Some(values) => decode(key, Value::Array(values.to_vec()))?,
            None => self.values().clone(),
        };
        let context = hydrated
            .context(key)
            .cloned()
            .or_else(|| self.context_value().cloned());
        Ok((value, values, context))
    }
}

impl<T: PropertyValue> AnyProperty for Property<T> {
    fn names(&self) -> &PropertyNames {
        Property::names(self)
    }

    fn is_sensitive(&self) -> bool {
        Property::is_sensitive(self)
    }

    fn cookie_name(&self) -> Option<&str> {
        Property::cookie_name(self)
    }

    fn context_provider(&self) -> Option<&ContextChannel> {
        Property::context_provider(self)
    }

    fn snapshot(&self) -> Result<PropertySnapshot, StateError> {
        Property::snapshot(self)
    }

    fn projection(&self) -> Result<PropertyProjection, StateError> {
        let key = self.key();
        Ok(PropertyProjection {
            value: encode(key, self.value())?,
            values: self
                .values()
                .iter()
                .map(|v| encode(key, v))
                .collect::<Result<_, _>>()?,
            context_value: self.context_value().cloned(),
        })
    }

    fn initialize_server_side(
        &mut self,
        ctx: Arc<ServerContext>,
    ) -> BoxFuture<'_, Result<(), StateError>> {
        self.initialize_state_server_side(ctx).boxed()
    }

    fn inject(&mut self, snapshot: &PropertySnapshot) -> Result<(), StateError> {
        self.inject_dehydrated_state(snapshot)
    }

    fn initialize_client_side<'a>(
        &'a mut self,
        hydrated: &'a HydratedState,
        env: &'a Environment,
    ) -> BoxFuture<'a, Result<(), StateError>> {
        async move {
            let (value, values, context) = self.existing_state(hydrated)?;
            self.initialize_state_client_side(value, values, context, env).await
        }
        .boxed()
    }

    fn erased_setter(&self) -> ErasedSetter {
        let setter = self.setter();
        let key = self.key().to_string();
        let sensitive = self.is_sensitive();
        Arc::new(move |args: ErasedSetterArgs| {
            let setter = Arc::clone(&setter);
            let key = key.clone();
            async move {
                let value: T = decode(&key, args.value)?;
                let values: ValueSet<T> = decode(&key, Value::Array(args.values))?;
                let typed = SetterArgs {
                    key: key.clone(),
                    values,
                    cookie_consent: args.cookie_consent,
                    value,
                    env: args.env,
                    sensitive,
                };
                setter(typed).await.map_err(|err| StateError::hook(&key, err))
            }
            .boxed()
        })
    }
}

/// A property definition handed to the registry.
///
/// Construction is deferred so the registry reports construction errors
/// alongside namespace collisions.
pub struct PropertyDefinition {
    key: String,
    build: Box<dyn FnOnce() -> Result<Box<dyn AnyProperty>, StateError> + Send>,
}

impl PropertyDefinition {
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn build(self) -> Result<Box<dyn AnyProperty>, StateError> {
        (self.build)()
    }
}

impl fmt::Debug for PropertyDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDefinition").field("key", &self.key).finish_non_exhaustive()
    }
}

impl<T: PropertyValue> From<PropertyConfig<T>> for PropertyDefinition {
    fn from(config: PropertyConfig<T>) -> Self {
        Self {
            key: config.key.clone(),
            build: Box::new(move || -> Result<Box<dyn AnyProperty>, StateError> {
                Ok(Box::new(Property::new(config)?))
            }),
        }
    }
}

impl<T: PropertyValue> From<Property<T>> for PropertyDefinition {
    fn from(property: Property<T>) -> Self {
        Self {
            key: property.key().to_string(),
            build: Box::new(move || -> Result<Box<dyn AnyProperty>, StateError> {
                Ok(Box::new(property))
            }),
        }
    }
}
