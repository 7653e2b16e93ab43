//! Core logic for appstate: properties, the registry, and hydration.
//!
//! A [`Registry`] owns a set of properties. On the server it computes each
//! property's state from the request and serializes it into an [`Envelope`].
//! On the client it rebuilds the same state synchronously (phase 1), then
//! refines it with browser-only information (phase 2) and reports the
//! difference as a [`DeltaState`]. [`AppStateContext`] is what the rest of the
//! application reads state from and sets state through.
//!
//! [`Envelope`]: appstate_types::Envelope
//! [`DeltaState`]: appstate_types::DeltaState

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

pub mod consumer;
pub mod cookie_consent;
pub mod environment;
pub mod erased;
pub mod errors;
pub mod hooks;
pub mod property;
pub mod registry;

pub use consumer::AppStateContext;
pub use cookie_consent::{COOKIE_CONSENT_COOKIE, COOKIE_CONSENT_KEY, cookie_consent};
pub use environment::{Browser, Environment, ServerContext, ServerRequest};
pub use erased::{
    AnyProperty, ErasedSetter, ErasedSetterArgs, PropertyDefinition, PropertyProjection,
};
pub use errors::{ConfigWarning, PropertyFailure, StateError};
pub use hooks::{ContextChannel, ContextControl, ContextTransform, HookFuture, Setter, SetterArgs};
pub use property::{Property, PropertyConfig};
pub use registry::{FailurePolicy, Lifecycle, Outcome, PropertyKeys, Registry, RegistryOptions};
