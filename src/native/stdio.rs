//! Talk to the helper the way the browser does: spawn it, write one framed
//! request to its stdin, read one framed reply from its stdout.

use std::path::PathBuf;
use std::process::Stdio;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::process::Command;

use super::framing::{read_frame, write_frame, MAX_FROM_HOST};
use super::{NativeRequest, NativeResponse, NativeTransport};
use crate::config::NativeConfig;
use crate::error::RelayError;
use crate::manifest::{self, Family};

/// Per-request process transport to the native helper.
#[derive(Debug, Clone)]
pub struct StdioTransport {
    program: PathBuf,
    args: Vec<String>,
}

impl StdioTransport {
    /// Launch `program` with `args` for every request.
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Resolve the helper from its installed manifest.
    ///
    /// `Ok(None)` means no manifest is installed, i.e. no helper.
    pub fn from_manifest(config: &NativeConfig) -> Result<Option<Self>, RelayError> {
        let Some(found) = manifest::locate(&config.host_name, &config.browser)? else {
            return Ok(None);
        };
        // Same launch arguments the browser itself would pass.
        let args = match found.family {
            Family::Firefox => vec![
                found.manifest_path.to_string_lossy().into_owned(),
                config.extension_id.clone(),
            ],
            Family::Chromium => vec![format!("chrome-extension://{}/", config.extension_id)],
        };
        Ok(Some(Self::new(found.manifest.path, args)))
    }

    async fn exchange(
        program: PathBuf,
        args: Vec<String>,
        request: NativeRequest,
    ) -> Result<NativeResponse, RelayError> {
        let label = request.describe();
        let mut child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RelayError::native(&label, format!("spawn {}: {e}", program.display())))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| RelayError::native(&label, "helper stdin unavailable"))?;
        write_frame(&mut stdin, &request).await?;
        // EOF tells the helper no further requests are coming.
        drop(stdin);

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| RelayError::native(&label, "helper stdout unavailable"))?;
        let raw = read_frame(&mut stdout, MAX_FROM_HOST).await?;
        tracing::debug!(request = %label, bytes = raw.len(), "native helper replied");
        Ok(serde_json::from_str(&raw)?)
    }
}

impl NativeTransport for StdioTransport {
    fn send(&self, request: NativeRequest) -> BoxFuture<'static, Result<NativeResponse, RelayError>> {
        let task = tokio::spawn(Self::exchange(self.program.clone(), self.args.clone(), request));
        async move {
            task.await
                .map_err(|e| RelayError::native("exchange", e.to_string()))?
        }
        .boxed()
    }
}
