//! Addressed messaging between extension contexts.
//!
//! Two halves:
//!
//! - **Sending**: [`ActiveTabMessenger`] delivers a [`Message`] to the named
//!   context in the active tab. Sending is eager: the message is on its way
//!   when `send_to_active_tab` returns, and the returned [`PendingReply`] only
//!   waits for the answer. That lets callers choose between awaiting the
//!   reply and explicitly [`detach`]ing it. Messages to one context arrive
//!   in the order they were sent.
//! - **Receiving**: a [`Router`] maps each [`ContextName`] to one
//!   [`Dispatcher`]. [`attribute_caller`] turns any [`Operations`]
//!   implementation into a dispatcher by parsing the operation name and
//!   positional arguments into a typed request.

mod router;

pub use router::Router;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::context::ContextName;
use crate::error::RelayError;

/// Reply to a message that has already been sent.
pub type PendingReply = BoxFuture<'static, Result<Value, RelayError>>;

/// One addressed unit of communication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub context: ContextName,
    pub op: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl Message {
    pub fn new(context: ContextName, op: impl Into<String>) -> Self {
        Self {
            context,
            op: op.into(),
            args: Vec::new(),
        }
    }

    /// Append one positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }
}

/// Transport that reaches contexts living in the currently active tab.
///
/// Resolving *which* tab is active is the transport's business.
pub trait ActiveTabMessenger: Send + Sync {
    fn send_to_active_tab(&self, message: Message) -> PendingReply;
}

/// Intentionally discard the outcome of an already-issued call.
///
/// The reply is driven on the runtime so transports that need polling still
/// complete; a failure is logged and otherwise ignored. Must be called from
/// within a Tokio runtime.
pub fn detach<T>(what: &'static str, pending: BoxFuture<'static, Result<T, RelayError>>)
where
    T: Send + 'static,
{
    tokio::spawn(async move {
        if let Err(err) = pending.await {
            tracing::debug!(call = what, error = %err, "detached call failed");
        }
    });
}

/// Receives every message addressed to one context.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, op: &str, args: Vec<Value>) -> Result<Value, RelayError>;
}

/// A value whose operations can be called by name.
///
/// `Request` is normally an enum with one variant per operation, so handling
/// is an exhaustive `match`.
#[async_trait]
pub trait Operations: Send + Sync + 'static {
    type Request: Send;

    /// Context these operations are registered under (used in errors).
    const CONTEXT: ContextName;

    fn parse(op: &str, args: Vec<Value>) -> Result<Self::Request, RelayError>;

    async fn call(&self, request: Self::Request) -> Result<Value, RelayError>;
}

/// Dispatcher produced by [`attribute_caller`].
pub struct AttributeCaller<T> {
    target: Arc<T>,
}

/// Expose `target`'s operations as a dispatcher: operation name selects the
/// handler and positional arguments are forwarded.
pub fn attribute_caller<T: Operations>(target: Arc<T>) -> AttributeCaller<T> {
    AttributeCaller { target }
}

#[async_trait]
impl<T: Operations> Dispatcher for AttributeCaller<T> {
    async fn dispatch(&self, op: &str, args: Vec<Value>) -> Result<Value, RelayError> {
        let request = T::parse(op, args)?;
        self.target.call(request).await
    }
}
