//! Relay configuration, read from TOML.
//!
//! Every field has a default, so an empty document (or no file at all) gives
//! the stock behavior:
//!
//! ```toml
//! [native]
//! host_name = "commandline_relay"
//! browser = "firefox"
//! extension_id = ""
//! min_version = "0.1.0"
//!
//! [selection]
//! sync_primary_command = "xsel -p -o | xsel -b -i"
//! mirror_primary_command = "xsel -b -o | xsel -p -i"
//!
//! [history]
//! max_results = 50
//! start_time = 0
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RelayError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub native: NativeConfig,
    pub selection: SelectionConfig,
    pub history: HistoryConfig,
}

/// How to find and talk to the native helper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeConfig {
    /// Name the helper's manifest is installed under.
    pub host_name: String,
    /// Browser key from the embedded browsers table.
    pub browser: String,
    /// Extension id passed to the helper on launch.
    pub extension_id: String,
    /// Oldest helper version the gate accepts.
    pub min_version: String,
}

impl Default for NativeConfig {
    fn default() -> Self {
        Self {
            host_name: "commandline_relay".to_string(),
            browser: "firefox".to_string(),
            extension_id: String::new(),
            min_version: "0.1.0".to_string(),
        }
    }
}

/// Shell commands used to keep the primary selection and clipboard in sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Copies the primary selection into the clipboard.
    pub sync_primary_command: String,
    /// Copies the clipboard into the primary selection.
    pub mirror_primary_command: String,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            sync_primary_command: "xsel -p -o | xsel -b -i".to_string(),
            mirror_primary_command: "xsel -b -o | xsel -p -i".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub max_results: u32,
    /// Milliseconds since the epoch; 0 searches all history.
    pub start_time: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_results: 50,
            start_time: 0,
        }
    }
}

impl RelayConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, RelayError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RelayError> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }
}
