use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use futures_util::future;
use futures_util::FutureExt;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use super::{ActiveTabMessenger, Dispatcher, Message, PendingReply};
use crate::context::ContextName;
use crate::error::RelayError;

type Table = HashMap<ContextName, Arc<dyn Dispatcher>>;

/// A queued message and the slot its reply goes to.
struct Envelope {
    message: Message,
    reply: oneshot::Sender<Result<Value, RelayError>>,
}

type Queues = HashMap<ContextName, mpsc::UnboundedSender<Envelope>>;

/// Receiving side of the messaging layer: one dispatcher per context.
///
/// Each context drains its own queue on a single task, so messages addressed
/// to one context are handled in the order they were sent, one at a time. A
/// dispatcher must not await a request addressed to its own context.
///
/// Cloning shares the same table and queues.
#[derive(Clone, Default)]
pub struct Router {
    table: Arc<RwLock<Table>>,
    queues: Arc<Mutex<Queues>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `dispatcher` as the receiver for `context`.
    ///
    /// A context accepts exactly one dispatcher for the router's lifetime.
    pub fn add_listener<D>(&self, context: ContextName, dispatcher: D) -> Result<(), RelayError>
    where
        D: Dispatcher + 'static,
    {
        let mut table = self
            .table
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if table.contains_key(&context) {
            return Err(RelayError::AlreadyRegistered(context));
        }
        table.insert(context, Arc::new(dispatcher));
        tracing::debug!(context = %context, "registered dispatcher");
        Ok(())
    }

    pub fn is_registered(&self, context: ContextName) -> bool {
        self.table
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains_key(&context)
    }

    /// Hand `message` to its context's dispatcher and return the reply.
    ///
    /// Same as [`ActiveTabMessenger::send_to_active_tab`]; must be called
    /// within a Tokio runtime.
    pub async fn deliver(&self, message: Message) -> Result<Value, RelayError> {
        self.send_to_active_tab(message).await
    }

    fn dispatcher(&self, context: ContextName) -> Result<Arc<dyn Dispatcher>, RelayError> {
        self.table
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&context)
            .cloned()
            .ok_or(RelayError::NoReceiver(context))
    }

    /// Queue `message` behind everything already sent to its context.
    fn enqueue(
        &self,
        message: Message,
    ) -> Result<oneshot::Receiver<Result<Value, RelayError>>, RelayError> {
        let context = message.context;
        let dispatcher = self.dispatcher(context)?;
        let (reply, rx) = oneshot::channel();
        let mut queues = self
            .queues
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // A worker that died (panicking dispatcher, runtime gone) is replaced.
        let queue = queues
            .entry(context)
            .and_modify(|queue| {
                if queue.is_closed() {
                    *queue = spawn_worker(context, Arc::clone(&dispatcher));
                }
            })
            .or_insert_with(|| spawn_worker(context, Arc::clone(&dispatcher)));
        queue
            .send(Envelope { message, reply })
            .map_err(|rejected| RelayError::Transport {
                context,
                op: rejected.0.message.op,
                reason: "context queue closed".into(),
            })?;
        Ok(rx)
    }
}

fn spawn_worker(
    context: ContextName,
    dispatcher: Arc<dyn Dispatcher>,
) -> mpsc::UnboundedSender<Envelope> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Envelope>();
    tokio::spawn(async move {
        while let Some(Envelope { message, reply }) = rx.recv().await {
            tracing::debug!(context = %context, op = %message.op, "delivering message");
            let result = dispatcher.dispatch(&message.op, message.args).await;
            // The caller may have dropped a detached reply.
            let _ = reply.send(result);
        }
        tracing::debug!(context = %context, "context queue drained");
    });
    tx
}

/// In-process loopback: the "active tab" is whatever registered with this router.
///
/// The message is queued before this returns. Must be called within a Tokio
/// runtime, since the first send to a context starts its worker task.
impl ActiveTabMessenger for Router {
    fn send_to_active_tab(&self, message: Message) -> PendingReply {
        let context = message.context;
        let op = message.op.clone();
        match self.enqueue(message) {
            Ok(rx) => async move {
                rx.await.map_err(|_| RelayError::Transport {
                    context,
                    op,
                    reason: "context worker stopped before replying".into(),
                })?
            }
            .boxed(),
            Err(e) => future::ready(Err(e)).boxed(),
        }
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self
            .table
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f.debug_struct("Router")
            .field("contexts", &table.keys().collect::<Vec<_>>())
            .finish()
    }
}
