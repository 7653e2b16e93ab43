//! Hook signatures and the derived-context configuration of a property.
//!
//! Hooks are shared closures returning boxed futures. They take their
//! arguments by value so the returned future owns everything it touches.

use std::future::Future;
use std::sync::Arc;

use appstate_types::{ContextTiming, CookieConsent, PropertyValue, ValueSet};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde_json::Value;
use tokio::sync::watch;

use crate::environment::{Browser, Environment, ServerContext};
use crate::errors::StateError;

pub type HookFuture<T> = BoxFuture<'static, anyhow::Result<T>>;

/// `(values, request) -> value`, run during the server render.
pub type ServerValueHook<T> =
    Arc<dyn Fn(ValueSet<T>, Arc<ServerContext>) -> HookFuture<T> + Send + Sync>;
/// `(values, existing value, environment) -> value`, run in phase 2.
pub type ClientValueHook<T> =
    Arc<dyn Fn(ValueSet<T>, T, Environment) -> HookFuture<T> + Send + Sync>;
pub type ServerValuesHook<T> = Arc<dyn Fn() -> HookFuture<ValueSet<T>> + Send + Sync>;
pub type ClientValuesHook<T> = Arc<dyn Fn(Environment) -> HookFuture<ValueSet<T>> + Send + Sync>;
/// The externally visible side effect of changing a value.
pub type SetValueHook<T> = Arc<dyn Fn(SetterArgs<T>) -> HookFuture<()> + Send + Sync>;
pub type AsyncTransform<T> = Arc<dyn Fn(T) -> HookFuture<Value> + Send + Sync>;
pub type SyncTransform<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;

/// A property's setter: performs the side effect and yields the recomputed
/// context value, if the property has a transform.
pub type Setter<T> = Arc<dyn Fn(SetterArgs<T>) -> HookFuture<Option<Value>> + Send + Sync>;

pub(crate) fn boxed<Fut, T>(fut: Fut) -> HookFuture<T>
where
    Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
{
    fut.boxed()
}

pub struct InitializeValue<T> {
    pub server_side: Option<ServerValueHook<T>>,
    pub client_side: Option<ClientValueHook<T>>,
}

impl<T> Default for InitializeValue<T> {
    fn default() -> Self {
        Self {
            server_side: None,
            client_side: None,
        }
    }
}

pub struct GetValues<T> {
    pub server_side: Option<ServerValuesHook<T>>,
    pub client_side: Option<ClientValuesHook<T>>,
}

impl<T> Default for GetValues<T> {
    fn default() -> Self {
        Self {
            server_side: None,
            client_side: None,
        }
    }
}

/// When and how the derived context value is computed.
///
/// A missing transform is allowed but ambiguous: it is warned about when the
/// context is due, and the raw value is used as the context instead.
pub enum ContextTransform<T> {
    ServerComputed(Option<AsyncTransform<T>>),
    SyncOnInject(Option<SyncTransform<T>>),
    AsyncPostHydration(Option<AsyncTransform<T>>),
}

impl<T> ContextTransform<T> {
    #[must_use]
    pub fn timing(&self) -> ContextTiming {
        match self {
            Self::ServerComputed(_) => ContextTiming::ServerComputed,
            Self::SyncOnInject(_) => ContextTiming::SyncOnInject,
            Self::AsyncPostHydration(_) => ContextTiming::AsyncPostHydration,
        }
    }
}

/// Presentation-layer subscription handle broadcasting a context value.
#[derive(Debug, Clone)]
pub struct ContextChannel(Arc<watch::Sender<Option<Value>>>);

impl Default for ContextChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextChannel {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self(Arc::new(tx))
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Value>> {
        self.0.subscribe()
    }

    /// Replaces the broadcast value. Receivers are notified only on change.
    pub fn publish(&self, value: Option<Value>) {
        self.0.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    #[must_use]
    pub fn current(&self) -> Option<Value> {
        self.0.borrow().clone()
    }

    #[must_use]
    pub fn same_channel(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

pub struct ContextControl<T> {
    pub transform: ContextTransform<T>,
    /// Explicit provider. Without one, the property creates its own channel.
    pub provider: Option<ContextChannel>,
}

impl<T: PropertyValue> ContextControl<T> {
    pub fn server_computed<F, Fut>(transform: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        let transform: AsyncTransform<T> = Arc::new(move |v: T| boxed(transform(v)));
        Self {
            transform: ContextTransform::ServerComputed(Some(transform)),
            provider: None,
        }
    }

    pub fn sync_on_inject<F>(transform: F) -> Self
    where
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        let transform: SyncTransform<T> = Arc::new(transform);
        Self {
            transform: ContextTransform::SyncOnInject(Some(transform)),
            provider: None,
        }
    }

    pub fn async_post_hydration<F, Fut>(transform: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        let transform: AsyncTransform<T> = Arc::new(move |v: T| boxed(transform(v)));
        Self {
            transform: ContextTransform::AsyncPostHydration(Some(transform)),
            provider: None,
        }
    }

    /// A control of the given timing with no transform.
    #[must_use]
    pub fn without_transform(timing: ContextTiming) -> Self {
        let transform = match timing {
            ContextTiming::ServerComputed => ContextTransform::ServerComputed(None),
            ContextTiming::SyncOnInject => ContextTransform::SyncOnInject(None),
            ContextTiming::AsyncPostHydration => ContextTransform::AsyncPostHydration(None),
        };
        Self {
            transform,
            provider: None,
        }
    }

    #[must_use]
    pub fn with_provider(mut self, provider: ContextChannel) -> Self {
        self.provider = Some(provider);
        self
    }
}

/// Arguments handed to a `set_value` hook.
#[derive(Debug, Clone)]
pub struct SetterArgs<T> {
    pub key: String,
    pub values: ValueSet<T>,
    pub cookie_consent: CookieConsent,
    pub value: T,
    pub env: Environment,
    pub sensitive: bool,
}

impl<T: PropertyValue> SetterArgs<T> {
    pub fn browser(&self, operation: &'static str) -> Result<&Browser, StateError> {
        self.env.browser(operation)
    }

    /// Fails with `InvalidValue` unless the new value is in the universe.
    pub fn ensure_valid(&self) -> Result<(), StateError> {
        if self.values.contains(&self.value) {
            Ok(())
        } else {
            Err(StateError::InvalidValue {
                key: self.key.clone(),
                value: serde_json::to_string(&self.value)
                    .unwrap_or_else(|_| format!("{:?}", self.value)),
            })
        }
    }

    /// Writes a cookie, gated on consent for sensitive properties.
    ///
    /// Sensitive properties only persist when consent is `Some(true)`;
    /// otherwise any existing cookie of that name is purged.
    pub fn persist_cookie(&self, name: &str, value: &str) -> Result<(), StateError> {
        let browser = self.browser("persist_cookie")?;
        if !self.sensitive || self.cookie_consent == Some(true) {
            browser.cookies().set(name, value);
        } else {
            tracing::debug!(key = %self.key, cookie = name, "no cookie consent; not persisting");
            browser.cookies().purge([name]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(sensitive: bool, consent: CookieConsent) -> SetterArgs<String> {
        SetterArgs {
            key: "themeType".into(),
            values: ValueSet::from(["light".to_string(), "dark".to_string()]),
            cookie_consent: consent,
            value: "dark".into(),
            env: Environment::Browser(Browser::in_memory(Vec::new(), 60)),
            sensitive,
        }
    }

    #[test]
    fn sensitive_cookie_needs_consent() {
        let denied = args(true, Some(false));
        denied.persist_cookie("theme-type", "dark").unwrap();
        assert_eq!(denied.browser("t").unwrap().cookies().get("theme-type"), None);

        let granted = args(true, Some(true));
        granted.persist_cookie("theme-type", "dark").unwrap();
        assert_eq!(
            granted.browser("t").unwrap().cookies().get("theme-type").as_deref(),
            Some("dark")
        );
    }

    #[test]
    fn non_sensitive_cookie_always_persists() {
        let a = args(false, None);
        a.persist_cookie("lang", "sv").unwrap();
        assert_eq!(a.browser("t").unwrap().cookies().get("lang").as_deref(), Some("sv"));
    }

    #[test]
    fn ensure_valid_rejects_foreign_values() {
        let mut a = args(false, None);
        assert!(a.ensure_valid().is_ok());
        a.value = "sepia".into();
        let err = a.ensure_valid().unwrap_err();
        assert_eq!(
            err.to_string(),
            "[themeType]: \"sepia\" is not one of the property's valid values"
        );
    }

    #[test]
    fn channel_publishes_only_changes() {
        let channel = ContextChannel::new();
        let mut rx = channel.subscribe();
        channel.publish(Some(Value::from(1)));
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();
        channel.publish(Some(Value::from(1)));
        assert!(!rx.has_changed().unwrap());
        assert_eq!(channel.current(), Some(Value::from(1)));
    }

    #[test]
    fn control_reports_timing() {
        let control = ContextControl::<String>::sync_on_inject(|v| Value::from(v.len()));
        assert_eq!(control.transform.timing(), ContextTiming::SyncOnInject);
        let bare = ContextControl::<String>::without_transform(ContextTiming::AsyncPostHydration);
        assert!(matches!(bare.transform, ContextTransform::AsyncPostHydration(None)));
    }
}
