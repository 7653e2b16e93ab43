//! Error taxonomy for the registry and its properties.

use appstate_types::NameError;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum StateError {
    /// The default value is not a member of the default values.
    #[error("[{key}]: the default value must be one of the property's default values")]
    Construction { key: String },

    #[error(transparent)]
    Name(#[from] NameError),

    /// A key, plural key, or setter name is already claimed by another property.
    #[error(
        "[{key}]: `{name}` (key, plural key, or setter name) already belongs to another property"
    )]
    NonUniqueKey { key: String, name: String },

    /// A client-only operation ran without a browser environment.
    #[error("{operation} was called in an environment that isn't the client's")]
    EnvironmentMismatch { operation: &'static str },

    /// A server-side or client-side hook rejected.
    #[error("[{key}]: hook failed: {source}")]
    Hook {
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("[{key}]: {value} is not one of the property's valid values")]
    InvalidValue { key: String, value: String },

    #[error("no global app state setter named `{name}`")]
    UnknownSetter { name: String },

    #[error("global app state setters are not active until hydration has been merged")]
    NotMounted,

    #[error("[{key}]: the transport envelope has no snapshot for this property")]
    MissingSnapshot { key: String },

    #[error("[{key}]: failed to decode state: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("[{key}]: failed to encode state: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StateError {
    /// Wraps a hook rejection. A `StateError` raised inside the hook is
    /// surfaced as itself.
    pub(crate) fn hook(key: &str, source: anyhow::Error) -> Self {
        match source.downcast::<Self>() {
            Ok(err) => err,
            Err(source) => Self::Hook {
                key: key.to_string(),
                source: source.into(),
            },
        }
    }

    /// The property key the error is about, if any.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Construction { key }
            | Self::NonUniqueKey { key, .. }
            | Self::Hook { key, .. }
            | Self::InvalidValue { key, .. }
            | Self::MissingSnapshot { key }
            | Self::Decode { key, .. }
            | Self::Encode { key, .. } => Some(key),
            Self::Name(_)
            | Self::EnvironmentMismatch { .. }
            | Self::UnknownSetter { .. }
            | Self::NotMounted => None,
        }
    }
}

/// Non-fatal configuration ambiguity. Logged, then a defined fallback applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigWarning {
    #[error("context is server-computed but has no transform; using the raw value as context")]
    AmbiguousServerComputed,
    #[error("post-hydration context has no transform; using the existing context or the raw value")]
    AmbiguousAsyncPostHydration,
}

impl ConfigWarning {
    pub(crate) fn warn(self, key: &str) {
        tracing::warn!(key, "{self}");
    }
}

/// One property's failure during a fan-out phase.
#[derive(Debug)]
pub struct PropertyFailure {
    pub key: String,
    pub error: StateError,
}
