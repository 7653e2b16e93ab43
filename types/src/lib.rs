//! Core domain types for appstate.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application: the server render,
//! the client hydration code, and the consumer layer.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod envelope;
mod names;
mod state;
mod timing;
mod value_set;

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;

pub use envelope::{Envelope, PropertySnapshot};
pub use names::{NameError, PropertyNames, capitalize_first};
pub use state::{DeltaState, HydratedState, same_json_members};
pub use timing::ContextTiming;
pub use value_set::ValueSet;

/// A value that can live in a global app state property.
///
/// Values cross the server/client boundary as JSON, so every property value
/// must round-trip through serde without loss.
pub trait PropertyValue:
    Clone + PartialEq + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> PropertyValue for T where
    T: Clone + PartialEq + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// Cookie consent as the user expressed it: `Some(true)`, `Some(false)`, or
/// `None` when neither was chosen.
pub type CookieConsent = Option<bool>;
