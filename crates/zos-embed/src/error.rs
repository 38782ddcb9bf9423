//! Error types for component embedding.
//!
//! Every failure mode of the host side is a variant of [`EmbedError`].
//! Synchronous validation failures are returned from construction and
//! `update_props`; render failures propagate to the caller of `render`;
//! lifecycle-terminal errors (timeouts) are handed to the instance's
//! `on_timeout`/`on_error` callbacks instead of being returned.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, EmbedError>;

/// Errors from embedding operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EmbedError {
    /// Malformed construction options (e.g. a container for a definition
    /// without iframe support, a non-numeric timeout).
    #[error("invalid options: {0}")]
    Validation(String),

    /// A prop violates the definition's prop schema.
    #[error("invalid prop `{key}`: {reason}")]
    PropValidation {
        /// Schema key of the offending prop
        key: String,
        /// What was wrong with it
        reason: String,
    },

    /// The browser refused to open the popup window.
    #[error("can not open popup window - blocked")]
    PopupBlocked,

    /// No usable rendering context.
    #[error("no rendering context available: {0}")]
    NoContext(String),

    /// The operation is not valid for the resolved context or state.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// A second instance of a singleton definition was requested.
    #[error("{tag} is a singleton, and can only be instantiated once")]
    SingletonViolation {
        /// Tag of the singleton definition
        tag: String,
    },

    /// The child did not complete the handshake in time.
    #[error("loading component {tag} at {url} timed out after {timeout_ms} milliseconds")]
    Timeout {
        /// Tag of the component definition
        tag: String,
        /// URL the child was loaded from
        url: String,
        /// Configured timeout
        timeout_ms: u32,
    },

    /// The transport failed to deliver a message (non-fatal).
    #[error("message delivery failed: {0}")]
    MessageDelivery(String),

    /// The child broke the message contract (bad payload, callback on a
    /// prop that is not a function).
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// A function prop invoked through PROP_CALLBACK reported an error.
    #[error("prop callback `{key}` failed: {reason}")]
    CallbackFailed {
        /// Prop key that was invoked
        key: String,
        /// Error reported by the callback
        reason: String,
    },

    /// The instance has already been cleaned up.
    #[error("component {0} has been destroyed")]
    Destroyed(String),
}

impl EmbedError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a prop validation error for `key`.
    pub fn prop(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PropValidation {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a no-context error.
    pub fn no_context(msg: impl Into<String>) -> Self {
        Self::NoContext(msg.into())
    }

    /// Create an unsupported-operation error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedOperation(msg.into())
    }

    /// Create a message delivery error.
    pub fn delivery(msg: impl Into<String>) -> Self {
        Self::MessageDelivery(msg.into())
    }

    /// Create a protocol violation error.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::ProtocolViolation(msg.into())
    }

    /// Errors that the caller may recover from without tearing the
    /// instance down.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EmbedError::PopupBlocked | EmbedError::MessageDelivery(_))
    }

    /// Errors that end the instance or abort construction.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EmbedError::NoContext(_)
                | EmbedError::SingletonViolation { .. }
                | EmbedError::Timeout { .. }
                | EmbedError::Destroyed(_)
        )
    }

    /// Check if this is a handshake timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, EmbedError::Timeout { .. })
    }

    /// Schema key referenced by a prop validation error.
    pub fn prop_key(&self) -> Option<&str> {
        match self {
            EmbedError::PropValidation { key, .. } => Some(key),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for EmbedError {
    fn from(e: serde_json::Error) -> Self {
        EmbedError::ProtocolViolation(format!("malformed payload: {}", e))
    }
}
