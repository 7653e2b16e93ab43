use serde::{Deserialize, Serialize};

/// When a property's derived context value is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextTiming {
    /// Computed during the server render and carried over the wire.
    ServerComputed,
    /// Recomputed synchronously on the client when the envelope is injected.
    /// Never serialized.
    SyncOnInject,
    /// Computed on the client during phase 2 hydration.
    AsyncPostHydration,
}

impl ContextTiming {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ServerComputed => "server_computed",
            Self::SyncOnInject => "sync_on_inject",
            Self::AsyncPostHydration => "async_post_hydration",
        }
    }

    /// Whether the context value travels inside the envelope.
    #[must_use]
    pub const fn is_serialized(self) -> bool {
        matches!(self, Self::ServerComputed)
    }
}
