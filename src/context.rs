//! The fixed set of execution contexts that can be addressed.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A logical execution context inside the extension.
///
/// The set is closed: there is no runtime discovery of new contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextName {
    /// The background relay itself.
    #[serde(rename = "commandline_background")]
    Background,
    /// The embedded command-line frame (input box, clipboard access).
    #[serde(rename = "commandline_frame")]
    Frame,
    /// The content script hosting the frame in the page.
    #[serde(rename = "commandline_content")]
    Content,
}

impl ContextName {
    pub const ALL: [ContextName; 3] = [
        ContextName::Background,
        ContextName::Frame,
        ContextName::Content,
    ];

    /// Wire name used when addressing this context.
    pub fn as_str(self) -> &'static str {
        match self {
            ContextName::Background => "commandline_background",
            ContextName::Frame => "commandline_frame",
            ContextName::Content => "commandline_content",
        }
    }
}

impl fmt::Display for ContextName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
