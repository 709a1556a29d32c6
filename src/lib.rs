//! # commandline_relay
//!
//! The background half of a browser-extension command line:
//!
//! - Expose a small set of **remotely callable operations** (tab lists, history,
//!   show/hide) to the command-line frame running in the page
//! - Receive **submitted command lines** as fire-and-forget events and fan them
//!   out to subscribers
//! - Bridge **clipboard and X11 primary selection** through a native helper
//!   when one is installed, and degrade to the browser clipboard when not
//!
//! ---
//!
//! ## Contexts
//!
//! Three execution contexts take part. They share no memory; they only
//! exchange addressed messages.
//!
//! | context | wire name | role |
//! |---|---|---|
//! | [`ContextName::Background`] | `commandline_background` | this crate |
//! | [`ContextName::Frame`] | `commandline_frame` | input box, clipboard access |
//! | [`ContextName::Content`] | `commandline_content` | hosts the frame in the page |
//!
//! A [`Message`] is `{context, op, args}`. It is delivered once and produces
//! exactly one reply or one failure.
//!
//! ### Operations the background answers
//!
//! `allWindowTabs`, `currentWindowTabs`, `history`, `recvExStr`, `show`, `hide`.
//! Arguments are positional: `show` takes an optional boolean (`focus`,
//! default `true`), `recvExStr` takes the command-line string.
//!
//! ### Operations the background calls
//!
//! - on `commandline_frame`: `getClipboard`, `setClipboard`, `focus`
//! - on `commandline_content`: `show`, `focus`, `hide`, `blur`
//!
//! ---
//!
//! ## Most important behaviors (read this first)
//!
//! - **Sending is eager.** [`ActiveTabMessenger::send_to_active_tab`] issues the
//!   message before it returns; the returned future only waits for the reply.
//!   Messages addressed to the same context arrive in send order.
//!   Calls whose outcome is deliberately ignored go through [`detach`], so the
//!   intent is visible at the call site.
//! - **`show(true)` is sequential.** The content surface is focused (and the
//!   reply awaited) before the frame is asked to focus.
//! - **`hide()` never blocks.** Both `hide` and `blur` are detached.
//! - **A missing helper is not an error.** [`NativeBridge::nativegate`] answers
//!   `false` and the selection helpers use the browser clipboard only.
//! - **Ordering around the helper is strict.** `get_selection` finishes the
//!   primary → clipboard sync before reading the clipboard; `set_selection`
//!   finishes writing the clipboard before it fires clipboard → primary, and
//!   does not wait for that mirror.
//! - **Listeners are isolated.** A panicking line listener is logged and the
//!   others still run. Listeners may unsubscribe themselves (or each other)
//!   mid-dispatch.
//!
//! ---
//!
//! ## Crate layout
//!
//! - [`context`]: the closed set of context names.
//! - [`messaging`]: [`Message`], the [`ActiveTabMessenger`] seam, [`detach`],
//!   the [`Router`] and the attribute-caller adapter.
//! - [`listeners`]: the line-listener registry.
//! - [`browser`]: window/tab/history passthrough types and the [`BrowserApi`] seam.
//! - [`native`]: helper protocol, [`NativeGate`], framing and (feature `native`)
//!   the stdio transport.
//! - [`manifest`] (feature `native`): find the helper via its installed host manifest.
//! - [`background`]: the [`CommandLineBackground`] controller.
//! - [`config`]: TOML configuration.
//!
//! ---
//!
//! ## Wiring it up
//!
//! ```ignore
//! use std::sync::Arc;
//! use commandline_relay::{
//!     CommandLineBackground, NativeGate, RelayConfig, Router, StdioTransport,
//! };
//!
//! # async fn wire(messenger: Arc<dyn commandline_relay::ActiveTabMessenger>,
//! #               browser: Arc<dyn commandline_relay::BrowserApi>) -> Result<(), commandline_relay::RelayError> {
//! let config = RelayConfig::load("relay.toml")?;
//!
//! // `None` when no helper manifest is installed; the gate then always says no.
//! let transport = StdioTransport::from_manifest(&config.native)?;
//! let native = Arc::new(NativeGate::new(transport, config.native.min_version.clone()));
//!
//! let background = Arc::new(
//!     CommandLineBackground::new(messenger, browser, native).with_config(config),
//! );
//! let _sub = background.add_line_listener(|line| eprintln!("ex: {line}"));
//!
//! let router = Router::new();
//! background.register(&router)?;
//! # Ok(()) }
//! ```
//!
//! ---
//!
//! ## Talking to the helper
//!
//! The helper is a native-messaging host: each message is a 4-byte length in
//! native endianness followed by UTF-8 JSON. The framing helpers are usable on
//! their own:
//!
//! ```rust
//! use commandline_relay::native::framing::{decode_message, encode_message, MAX_FROM_HOST};
//! use commandline_relay::NativeRequest;
//! use std::io::Cursor;
//!
//! let frame = encode_message(&NativeRequest::Version).unwrap();
//! let raw = decode_message(&mut Cursor::new(frame), MAX_FROM_HOST).unwrap();
//! assert_eq!(raw, r#"{"cmd":"version"}"#);
//! ```
//!
//! **Logging:** this crate logs through `tracing` and never prints to stdout.
//! Install whichever subscriber you like.

pub mod background;
pub mod browser;
pub mod config;
pub mod context;
pub mod error;
pub mod listeners;
#[cfg(feature = "native")]
pub mod manifest;
pub mod messaging;
pub mod native;

// -------- Core re-exports --------

#[doc(inline)]
pub use background::{BackgroundOp, BackgroundRequest, CommandLineBackground};
#[doc(inline)]
pub use browser::{BrowserApi, HistoryItem, HistoryQuery, Tab, TabQuery, Window};
#[doc(inline)]
pub use config::RelayConfig;
#[doc(inline)]
pub use context::ContextName;
#[doc(inline)]
pub use error::RelayError;
#[doc(inline)]
pub use listeners::{LineListeners, Unsubscribe};
#[doc(inline)]
pub use messaging::{
    attribute_caller, detach, ActiveTabMessenger, Dispatcher, Message, Operations, PendingReply,
    Router,
};

// -------- Native re-exports --------

#[doc(inline)]
pub use native::{CommandOutput, NativeBridge, NativeGate, NativeRequest, NativeResponse, NativeTransport};

#[cfg(feature = "native")]
#[doc(inline)]
pub use native::stdio::StdioTransport;
