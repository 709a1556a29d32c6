//! Native helper bridge.
//!
//! The helper is a native-messaging host running outside the browser
//! sandbox. It understands two requests:
//!
//! | request | reply |
//! |---|---|
//! | `{"cmd": "version"}` | `{"version": "0.3.1", "code": 0}` |
//! | `{"cmd": "run", "command": "..."}` | `{"content": "<stdout>", "code": <exit status>}` |
//!
//! Any reply may carry `"error"`, which fails the request.
//!
//! [`NativeGate`] wraps a [`NativeTransport`] and implements [`NativeBridge`],
//! the seam the background controller uses. A missing or outdated helper is
//! not an error: [`NativeBridge::nativegate`] simply answers `false`.

pub mod framing;
#[cfg(feature = "native")]
pub mod stdio;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::{Deserialize, Serialize};

use crate::error::RelayError;

/// Request sent to the helper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "lowercase")]
pub enum NativeRequest {
    Version,
    Run {
        command: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
}

impl NativeRequest {
    pub fn run(command: impl Into<String>) -> Self {
        NativeRequest::Run {
            command: command.into(),
            content: None,
        }
    }

    /// Short label for logs and errors.
    pub fn describe(&self) -> String {
        match self {
            NativeRequest::Version => "version".to_string(),
            NativeRequest::Run { command, .. } => format!("run `{command}`"),
        }
    }
}

/// Reply from the helper. Which fields are present depends on the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of a command run through the helper.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status reported by the helper; `None` when it did not say.
    pub code: Option<i32>,
    /// Captured standard output.
    pub content: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code.unwrap_or(0) == 0
    }
}

/// Output of a command that has already been issued.
pub type PendingOutput = BoxFuture<'static, Result<CommandOutput, RelayError>>;

/// One request/reply exchange with the helper.
///
/// Like [`crate::messaging::ActiveTabMessenger`], sending is eager: the
/// request is issued before `send` returns.
pub trait NativeTransport: Send + Sync {
    fn send(&self, request: NativeRequest) -> BoxFuture<'static, Result<NativeResponse, RelayError>>;
}

/// `None` stands for "no helper installed": every request fails, so the
/// gate reports the bridge as unavailable.
impl<T: NativeTransport> NativeTransport for Option<T> {
    fn send(&self, request: NativeRequest) -> BoxFuture<'static, Result<NativeResponse, RelayError>> {
        match self {
            Some(transport) => transport.send(request),
            None => {
                let err = RelayError::native(request.describe(), "no native helper installed");
                futures_util::future::ready(Err(err)).boxed()
            }
        }
    }
}

/// What the background controller needs from the native side.
#[async_trait]
pub trait NativeBridge: Send + Sync {
    /// Is a usable helper reachable? Never fails; unavailability is `false`.
    async fn nativegate(&self) -> bool;

    /// Issue `command` through the helper.
    fn run(&self, command: &str) -> PendingOutput;
}

/// Gate over a concrete transport, enforcing a minimum helper version.
pub struct NativeGate<T> {
    transport: T,
    min_version: String,
}

impl<T: NativeTransport> NativeGate<T> {
    pub fn new(transport: T, min_version: impl Into<String>) -> Self {
        Self {
            transport,
            min_version: min_version.into(),
        }
    }

    /// Ask the helper for its version.
    pub async fn version(&self) -> Result<String, RelayError> {
        let reply = self.transport.send(NativeRequest::Version).await?;
        if let Some(err) = reply.error {
            return Err(RelayError::native("version", err));
        }
        reply
            .version
            .ok_or_else(|| RelayError::native("version", "reply carried no version"))
    }
}

#[async_trait]
impl<T: NativeTransport> NativeBridge for NativeGate<T> {
    async fn nativegate(&self) -> bool {
        match self.version().await {
            Ok(version) if version_at_least(&version, &self.min_version) => true,
            Ok(version) => {
                tracing::info!(
                    found = %version,
                    required = %self.min_version,
                    "native helper too old; using browser clipboard only"
                );
                false
            }
            Err(err) => {
                tracing::debug!(error = %err, "native helper unavailable");
                false
            }
        }
    }

    fn run(&self, command: &str) -> PendingOutput {
        let request = NativeRequest::run(command);
        let label = request.describe();
        let reply = self.transport.send(request);
        async move {
            let reply = reply.await?;
            if let Some(err) = reply.error {
                return Err(RelayError::native(label, err));
            }
            Ok(CommandOutput {
                code: reply.code,
                content: reply.content.unwrap_or_default(),
            })
        }
        .boxed()
    }
}

/// Compare dotted version strings numerically, component by component.
///
/// Missing components count as zero and any non-digit suffix on a component
/// is ignored, so `"0.2.1-pre"` satisfies `"0.2"`.
pub fn version_at_least(actual: &str, required: &str) -> bool {
    fn parts(v: &str) -> Vec<u64> {
        v.trim()
            .split('.')
            .map(|p| {
                let digits: String = p.chars().take_while(|c| c.is_ascii_digit()).collect();
                digits.parse().unwrap_or(0)
            })
            .collect()
    }
    let (a, r) = (parts(actual), parts(required));
    let n = a.len().max(r.len());
    for i in 0..n {
        let x = a.get(i).copied().unwrap_or(0);
        let y = r.get(i).copied().unwrap_or(0);
        if x != y {
            return x > y;
        }
    }
    true
}
