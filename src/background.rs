//! The command-line background controller.
//!
//! Registered under [`ContextName::Background`], it answers the command-line
//! frame's requests for tabs and history, shows and hides the command line in
//! the active tab, receives submitted lines and fans them out to
//! [`LineListeners`], and bridges selection/clipboard through the native
//! helper when one is available.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::browser::{BrowserApi, HistoryItem, HistoryQuery, Tab, TabQuery};
use crate::config::RelayConfig;
use crate::context::ContextName;
use crate::error::RelayError;
use crate::listeners::{LineListeners, Unsubscribe};
use crate::messaging::{attribute_caller, detach, ActiveTabMessenger, Message, Operations, Router};
use crate::native::NativeBridge;

/// Operations the frame side may call on the background, by wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackgroundOp {
    AllWindowTabs,
    CurrentWindowTabs,
    History,
    RecvExStr,
    Show,
    Hide,
}

impl BackgroundOp {
    pub const ALL: [BackgroundOp; 6] = [
        BackgroundOp::AllWindowTabs,
        BackgroundOp::CurrentWindowTabs,
        BackgroundOp::History,
        BackgroundOp::RecvExStr,
        BackgroundOp::Show,
        BackgroundOp::Hide,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BackgroundOp::AllWindowTabs => "allWindowTabs",
            BackgroundOp::CurrentWindowTabs => "currentWindowTabs",
            BackgroundOp::History => "history",
            BackgroundOp::RecvExStr => "recvExStr",
            BackgroundOp::Show => "show",
            BackgroundOp::Hide => "hide",
        }
    }
}

impl FromStr for BackgroundOp {
    type Err = RelayError;

    fn from_str(op: &str) -> Result<Self, Self::Err> {
        BackgroundOp::ALL
            .into_iter()
            .find(|o| o.as_str() == op)
            .ok_or_else(|| RelayError::UnknownOperation {
                context: ContextName::Background,
                op: op.to_string(),
            })
    }
}

/// A parsed call to the background, one variant per operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackgroundRequest {
    AllWindowTabs,
    CurrentWindowTabs,
    History,
    RecvExStr(String),
    Show { focus: bool },
    Hide,
}

impl BackgroundRequest {
    pub fn parse(op: &str, args: Vec<Value>) -> Result<Self, RelayError> {
        let op = op.parse::<BackgroundOp>()?;
        let name = op.as_str();
        let mut args = args.into_iter();
        let request = match op {
            BackgroundOp::AllWindowTabs => BackgroundRequest::AllWindowTabs,
            BackgroundOp::CurrentWindowTabs => BackgroundRequest::CurrentWindowTabs,
            BackgroundOp::History => BackgroundRequest::History,
            BackgroundOp::Hide => BackgroundRequest::Hide,
            BackgroundOp::RecvExStr => match args.next() {
                Some(Value::String(exstr)) => BackgroundRequest::RecvExStr(exstr),
                Some(other) => {
                    return Err(RelayError::invalid_args(name, format!("expected string, got {other}")))
                }
                None => return Err(RelayError::invalid_args(name, "missing command line")),
            },
            // Absent or null means the default, focus = true.
            BackgroundOp::Show => match args.next() {
                None | Some(Value::Null) => BackgroundRequest::Show { focus: true },
                Some(Value::Bool(focus)) => BackgroundRequest::Show { focus },
                Some(other) => {
                    return Err(RelayError::invalid_args(name, format!("expected boolean, got {other}")))
                }
            },
        };
        // Trailing arguments are ignored.
        Ok(request)
    }
}

// Downstream operations on the frame and content contexts.
const FRAME_GET_CLIPBOARD: &str = "getClipboard";
const FRAME_SET_CLIPBOARD: &str = "setClipboard";
const FOCUS: &str = "focus";
const CONTENT_SHOW: &str = "show";
const CONTENT_HIDE: &str = "hide";
const CONTENT_BLUR: &str = "blur";

/// Background half of the command line.
pub struct CommandLineBackground {
    messenger: Arc<dyn ActiveTabMessenger>,
    browser: Arc<dyn BrowserApi>,
    native: Arc<dyn NativeBridge>,
    listeners: LineListeners,
    config: RelayConfig,
}

impl CommandLineBackground {
    pub fn new(
        messenger: Arc<dyn ActiveTabMessenger>,
        browser: Arc<dyn BrowserApi>,
        native: Arc<dyn NativeBridge>,
    ) -> Self {
        Self {
            messenger,
            browser,
            native,
            listeners: LineListeners::new(),
            config: RelayConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RelayConfig) -> Self {
        self.config = config;
        self
    }

    /// Subscribe to submitted command lines.
    pub fn add_line_listener<F>(&self, cb: F) -> Unsubscribe
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.listeners.add_listener(cb)
    }

    /// Register this controller's operations with `router`.
    pub fn register(self: &Arc<Self>, router: &Router) -> Result<(), RelayError> {
        router.add_listener(Self::CONTEXT, attribute_caller(Arc::clone(self)))
    }

    async fn request(&self, message: Message) -> Result<Value, RelayError> {
        tracing::debug!(context = %message.context, op = %message.op, "messaging active tab");
        self.messenger.send_to_active_tab(message).await
    }

    fn fire(&self, what: &'static str, message: Message) {
        tracing::debug!(context = %message.context, op = %message.op, "messaging active tab (detached)");
        detach(what, self.messenger.send_to_active_tab(message));
    }

    /// Receive a submitted command line and hand it to every listener.
    pub fn recv_ex_str(&self, exstr: &str) {
        tracing::debug!(listeners = self.listeners.len(), "fanning out command line");
        self.listeners.dispatch(exstr);
    }

    /// Tabs of the current window.
    pub async fn current_window_tabs(&self) -> Result<Vec<Tab>, RelayError> {
        self.browser.tabs_query(TabQuery::current_window()).await
    }

    /// Tabs of every window, in window order. Windows are queried one at a time.
    pub async fn all_window_tabs(&self) -> Result<Vec<Tab>, RelayError> {
        let mut all = Vec::new();
        for window in self.browser.windows_get_all().await? {
            let Some(id) = window.id else { continue };
            all.extend(self.browser.tabs_query(TabQuery::window(id)).await?);
        }
        Ok(all)
    }

    /// Recent history, as ordered by the browser.
    pub async fn history(&self) -> Result<Vec<HistoryItem>, RelayError> {
        let query = HistoryQuery {
            text: String::new(),
            max_results: self.config.history.max_results,
            start_time: self.config.history.start_time,
        };
        self.browser.history_search(query).await
    }

    /// Show the command line; with `focus`, focus the content surface and
    /// then the frame inside it.
    pub async fn show(&self, focus: bool) -> Result<(), RelayError> {
        self.fire("show", Message::new(ContextName::Content, CONTENT_SHOW));
        if focus {
            self.request(Message::new(ContextName::Content, FOCUS)).await?;
            self.request(Message::new(ContextName::Frame, FOCUS)).await?;
        }
        Ok(())
    }

    /// Hide and blur the command line without waiting for either.
    ///
    /// Must be called within a Tokio runtime.
    pub fn hide(&self) {
        self.fire("hide", Message::new(ContextName::Content, CONTENT_HIDE));
        self.fire("blur", Message::new(ContextName::Content, CONTENT_BLUR));
    }

    /// Primary selection if the helper can reach it, else the clipboard.
    pub async fn get_selection(&self) -> Result<String, RelayError> {
        if self.native.nativegate().await {
            let sync = &self.config.selection.sync_primary_command;
            let output = self.native.run(sync).await?;
            if !output.success() {
                tracing::debug!(code = ?output.code, "primary selection sync exited non-zero");
            }
        }
        let reply = self
            .request(Message::new(ContextName::Frame, FRAME_GET_CLIPBOARD))
            .await?;
        match reply {
            Value::String(s) => Ok(s),
            Value::Null => Ok(String::new()),
            other => Err(RelayError::UnexpectedReply {
                op: FRAME_GET_CLIPBOARD.to_string(),
                detail: format!("expected string, got {other}"),
            }),
        }
    }

    /// Put `text` on the clipboard, and mirror it into the primary selection
    /// when the helper is available.
    pub async fn set_selection(&self, text: &str) -> Result<(), RelayError> {
        self.request(Message::new(ContextName::Frame, FRAME_SET_CLIPBOARD).arg(text))
            .await?;
        if self.native.nativegate().await {
            let mirror = &self.config.selection.mirror_primary_command;
            detach("mirror primary selection", self.native.run(mirror));
        }
        Ok(())
    }
}

#[async_trait]
impl Operations for CommandLineBackground {
    type Request = BackgroundRequest;

    const CONTEXT: ContextName = ContextName::Background;

    fn parse(op: &str, args: Vec<Value>) -> Result<Self::Request, RelayError> {
        BackgroundRequest::parse(op, args)
    }

    async fn call(&self, request: BackgroundRequest) -> Result<Value, RelayError> {
        match request {
            BackgroundRequest::AllWindowTabs => Ok(serde_json::to_value(self.all_window_tabs().await?)?),
            BackgroundRequest::CurrentWindowTabs => {
                Ok(serde_json::to_value(self.current_window_tabs().await?)?)
            }
            BackgroundRequest::History => Ok(serde_json::to_value(self.history().await?)?),
            BackgroundRequest::RecvExStr(exstr) => {
                self.recv_ex_str(&exstr);
                Ok(Value::Null)
            }
            BackgroundRequest::Show { focus } => {
                self.show(focus).await?;
                Ok(Value::Null)
            }
            BackgroundRequest::Hide => {
                self.hide();
                Ok(Value::Null)
            }
        }
    }
}

impl std::fmt::Debug for CommandLineBackground {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandLineBackground")
            .field("listeners", &self.listeners)
            .field("config", &self.config)
            .finish()
    }
}
