//! Error type shared by every relay module.

use std::io;

use thiserror::Error;

use crate::context::ContextName;

/// Errors surfaced by the relay.
///
/// "Native helper unavailable" is deliberately absent: the gate reports it as
/// `false`, not as an error.
#[derive(Debug, Error)]
pub enum RelayError {
    /// No dispatcher is registered for the addressed context.
    #[error("no receiver registered for context '{0}'")]
    NoReceiver(ContextName),

    /// A second dispatcher was registered for a context that already has one.
    #[error("context '{0}' already has a registered dispatcher")]
    AlreadyRegistered(ContextName),

    /// The destination context does not expose the requested operation.
    #[error("context '{context}' has no operation '{op}'")]
    UnknownOperation { context: ContextName, op: String },

    /// The positional arguments did not match the operation's signature.
    #[error("invalid arguments for '{op}': {detail}")]
    InvalidArguments { op: String, detail: String },

    /// The transport failed to deliver a message or to produce its reply.
    #[error("transport failure sending '{op}' to '{context}': {reason}")]
    Transport {
        context: ContextName,
        op: String,
        reason: String,
    },

    /// The remote handler answered, but not with the expected shape.
    #[error("unexpected reply to '{op}': {detail}")]
    UnexpectedReply { op: String, detail: String },

    /// The native helper failed or reported an error for a request.
    #[error("native helper failed on {request}: {reason}")]
    Native { request: String, reason: String },

    /// The native-host manifest is missing, unreadable or malformed.
    #[error("native host manifest problem: {detail}")]
    Manifest { detail: String },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl RelayError {
    pub(crate) fn invalid_args(op: &str, detail: impl Into<String>) -> Self {
        RelayError::InvalidArguments {
            op: op.to_string(),
            detail: detail.into(),
        }
    }

    pub(crate) fn native(request: impl Into<String>, reason: impl Into<String>) -> Self {
        RelayError::Native {
            request: request.into(),
            reason: reason.into(),
        }
    }
}
