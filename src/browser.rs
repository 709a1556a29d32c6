//! Read-only passthroughs to the browser's window, tab and history APIs.
//!
//! Field names follow the WebExtensions JSON shapes so values can be relayed
//! to the command-line frame unchanged.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RelayError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Window {
    pub id: Option<i64>,
    #[serde(default)]
    pub focused: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: Option<i64>,
    pub window_id: Option<i64>,
    pub index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub pinned: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_visit_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visit_count: Option<u64>,
}

/// Filter for [`BrowserApi::tabs_query`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_window: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_id: Option<i64>,
}

impl TabQuery {
    pub fn current_window() -> Self {
        Self {
            current_window: Some(true),
            ..Self::default()
        }
    }

    pub fn window(id: i64) -> Self {
        Self {
            window_id: Some(id),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub text: String,
    pub max_results: u32,
    pub start_time: u64,
}

#[async_trait]
pub trait BrowserApi: Send + Sync {
    async fn windows_get_all(&self) -> Result<Vec<Window>, RelayError>;

    async fn tabs_query(&self, query: TabQuery) -> Result<Vec<Tab>, RelayError>;

    async fn history_search(&self, query: HistoryQuery) -> Result<Vec<HistoryItem>, RelayError>;
}
