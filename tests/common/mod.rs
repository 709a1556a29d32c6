#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::{env, fs};

use async_trait::async_trait;
use commandline_relay::{
    ActiveTabMessenger, BrowserApi, CommandLineBackground, CommandOutput, ContextName, HistoryItem,
    HistoryQuery, Message, NativeBridge, PendingReply, RelayError, Tab, TabQuery, Window,
};
use futures_util::future::{self, BoxFuture};
use futures_util::FutureExt;
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::oneshot;

// ---------------------------------------------------------------------------
// Environment sandbox
// ---------------------------------------------------------------------------

/// Env guard that restores previous env vars on drop.
pub struct EnvGuard {
    old: HashMap<String, Option<String>>,
}

impl EnvGuard {
    pub fn set(vars: &[(&str, String)]) -> Self {
        let mut old = HashMap::new();
        for (k, v) in vars {
            old.insert((*k).to_string(), env::var(k).ok());
            env::set_var(k, v);
        }
        Self { old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (k, prev) in self.old.drain() {
            match prev {
                Some(v) => env::set_var(k, v),
                None => env::remove_var(k),
            }
        }
    }
}

/// Temp sandbox with HOME/APPDATA/... pointed inside it, so manifest lookups
/// never see the real profile.
pub fn sandbox_env() -> (TempDir, EnvGuard) {
    let td = TempDir::new().expect("tempdir");
    let root = td.path().to_path_buf();

    let home = root.join("home");
    let appdata = root.join("appdata_roaming");
    let localappdata = root.join("appdata_local");
    let programdata = root.join("programdata");

    for dir in [&home, &appdata, &localappdata, &programdata] {
        fs::create_dir_all(dir).unwrap();
    }

    let guard = EnvGuard::set(&[
        ("HOME", home.to_string_lossy().to_string()),
        ("APPDATA", appdata.to_string_lossy().to_string()),
        ("LOCALAPPDATA", localappdata.to_string_lossy().to_string()),
        ("PROGRAMDATA", programdata.to_string_lossy().to_string()),
    ]);

    (td, guard)
}

// ---------------------------------------------------------------------------
// Call log shared by the mocks
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.0.lock().unwrap().iter().any(|e| e == entry)
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.0.lock().unwrap().iter().position(|e| e == entry)
    }

    /// Yield to the runtime until `entry` shows up (bounded).
    pub async fn wait_for(&self, entry: &str) {
        for _ in 0..1000 {
            if self.contains(entry) {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("{entry} never logged; log = {:?}", self.entries());
    }
}

fn short(ctx: ContextName) -> &'static str {
    match ctx {
        ContextName::Background => "background",
        ContextName::Frame => "frame",
        ContextName::Content => "content",
    }
}

// ---------------------------------------------------------------------------
// Messenger
// ---------------------------------------------------------------------------

/// Scripted reply for one message.
pub enum Reply {
    Value(Value),
    Fail(String),
    /// Never resolves.
    Never,
    /// Resolves with the value once the sender fires.
    After(oneshot::Receiver<()>, Value),
}

/// Records each message at send time (`"frame:getClipboard"`) and answers
/// from a per-key script; unscripted messages resolve with `null`.
#[derive(Default)]
pub struct MockMessenger {
    pub log: CallLog,
    sent: Mutex<Vec<Message>>,
    script: Mutex<HashMap<String, VecDeque<Reply>>>,
}

impl MockMessenger {
    pub fn with_log(log: CallLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    pub fn script(&self, key: &str, reply: Reply) {
        self.script
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn sent(&self) -> Vec<Message> {
        self.sent.lock().unwrap().clone()
    }
}

impl ActiveTabMessenger for MockMessenger {
    fn send_to_active_tab(&self, message: Message) -> PendingReply {
        let key = format!("{}:{}", short(message.context), message.op);
        self.log.push(key.clone());
        self.sent.lock().unwrap().push(message.clone());
        let reply = self
            .script
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Reply::Value(Value::Null));
        match reply {
            Reply::Value(v) => future::ready(Ok(v)).boxed(),
            Reply::Fail(reason) => future::ready(Err(RelayError::Transport {
                context: message.context,
                op: message.op,
                reason,
            }))
            .boxed(),
            Reply::Never => future::pending().boxed(),
            Reply::After(rx, v) => async move {
                let _ = rx.await;
                Ok(v)
            }
            .boxed(),
        }
    }
}

// ---------------------------------------------------------------------------
// Native bridge
// ---------------------------------------------------------------------------

pub enum RunReply {
    Ok(CommandOutput),
    Fail(String),
    Never,
}

/// Records `"native:<command>"` when a command is issued.
pub struct MockNative {
    pub log: CallLog,
    available: bool,
    run_reply: Mutex<RunReply>,
    gate_calls: AtomicUsize,
}

impl MockNative {
    pub fn new(log: CallLog, available: bool) -> Self {
        Self {
            log,
            available,
            run_reply: Mutex::new(RunReply::Ok(CommandOutput {
                code: Some(0),
                content: String::new(),
            })),
            gate_calls: AtomicUsize::new(0),
        }
    }

    pub fn reply_with(self, reply: RunReply) -> Self {
        *self.run_reply.lock().unwrap() = reply;
        self
    }

    pub fn gate_calls(&self) -> usize {
        self.gate_calls.load(Ordering::SeqCst)
    }

    pub fn runs(&self) -> Vec<String> {
        self.log
            .entries()
            .into_iter()
            .filter_map(|e| e.strip_prefix("native:").map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl NativeBridge for MockNative {
    async fn nativegate(&self) -> bool {
        self.gate_calls.fetch_add(1, Ordering::SeqCst);
        self.available
    }

    fn run(&self, command: &str) -> BoxFuture<'static, Result<CommandOutput, RelayError>> {
        self.log.push(format!("native:{command}"));
        match &*self.run_reply.lock().unwrap() {
            RunReply::Ok(out) => future::ready(Ok(out.clone())).boxed(),
            RunReply::Fail(reason) => {
                future::ready(Err(RelayError::Native {
                    request: command.to_string(),
                    reason: reason.clone(),
                }))
                .boxed()
            }
            RunReply::Never => future::pending().boxed(),
        }
    }
}

// ---------------------------------------------------------------------------
// Browser APIs
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockBrowser {
    pub windows: Vec<Window>,
    pub tabs_by_window: HashMap<i64, Vec<Tab>>,
    pub current: Vec<Tab>,
    pub history: Vec<HistoryItem>,
    pub fail_window: Option<i64>,
    pub tab_queries: Mutex<Vec<TabQuery>>,
    pub history_queries: Mutex<Vec<HistoryQuery>>,
}

#[async_trait]
impl BrowserApi for MockBrowser {
    async fn windows_get_all(&self) -> Result<Vec<Window>, RelayError> {
        Ok(self.windows.clone())
    }

    async fn tabs_query(&self, query: TabQuery) -> Result<Vec<Tab>, RelayError> {
        self.tab_queries.lock().unwrap().push(query.clone());
        if query.current_window == Some(true) {
            return Ok(self.current.clone());
        }
        let id = query.window_id.unwrap_or_default();
        if self.fail_window == Some(id) {
            return Err(RelayError::Transport {
                context: ContextName::Background,
                op: "tabs.query".to_string(),
                reason: format!("window {id} went away"),
            });
        }
        Ok(self.tabs_by_window.get(&id).cloned().unwrap_or_default())
    }

    async fn history_search(&self, query: HistoryQuery) -> Result<Vec<HistoryItem>, RelayError> {
        let max = query.max_results as usize;
        self.history_queries.lock().unwrap().push(query);
        Ok(self.history.iter().take(max).cloned().collect())
    }
}

pub fn tab(id: i64, window_id: i64, index: i64) -> Tab {
    Tab {
        id: Some(id),
        window_id: Some(window_id),
        index,
        url: Some(format!("https://example.org/{id}")),
        title: Some(format!("tab {id}")),
        active: false,
        pinned: false,
    }
}

pub fn window(id: i64) -> Window {
    Window {
        id: Some(id),
        focused: false,
    }
}

pub fn history_item(n: u32) -> HistoryItem {
    HistoryItem {
        id: n.to_string(),
        url: Some(format!("https://example.org/h/{n}")),
        title: None,
        last_visit_time: Some(f64::from(n)),
        visit_count: Some(1),
    }
}

// ---------------------------------------------------------------------------
// Controller harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub log: CallLog,
    pub messenger: Arc<MockMessenger>,
    pub native: Arc<MockNative>,
    pub browser: Arc<MockBrowser>,
    pub background: Arc<CommandLineBackground>,
}

impl Harness {
    pub fn new(native_available: bool) -> Self {
        Self::build(native_available, MockBrowser::default(), |n| n)
    }

    pub fn with_browser(browser: MockBrowser) -> Self {
        Self::build(false, browser, |n| n)
    }

    pub fn with_native(native_available: bool, reply: RunReply) -> Self {
        Self::build(native_available, MockBrowser::default(), |n| n.reply_with(reply))
    }

    fn build(
        native_available: bool,
        browser: MockBrowser,
        tweak: impl FnOnce(MockNative) -> MockNative,
    ) -> Self {
        let log = CallLog::default();
        let messenger = Arc::new(MockMessenger::with_log(log.clone()));
        let native = Arc::new(tweak(MockNative::new(log.clone(), native_available)));
        let browser = Arc::new(browser);
        let background = Arc::new(CommandLineBackground::new(
            messenger.clone(),
            browser.clone(),
            native.clone(),
        ));
        Self {
            log,
            messenger,
            native,
            browser,
            background,
        }
    }
}
