//! Locating the native helper through its installed host manifest.
//!
//! Browsers find native-messaging hosts through a small JSON manifest
//! installed per browser and scope. The relay reads the same manifest to
//! learn where the helper executable lives.

pub mod paths;

#[cfg(all(windows, feature = "windows-registry"))]
pub mod winreg;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::RelayError;
pub use paths::{Family, Scope};

/// A native-messaging host manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    pub description: String,
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_origins: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_extensions: Option<Vec<String>>,
}

/// A manifest found on disk, with the file it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub manifest_path: PathBuf,
    pub manifest: Manifest,
    pub family: Family,
}

impl Manifest {
    /// Parse and validate the manifest at `path` for host `host`.
    pub fn read(path: &Path, host: &str) -> Result<Self, RelayError> {
        let raw = fs::read_to_string(path)?;
        let manifest: Manifest = serde_json::from_str(&raw)?;
        manifest.validate(host)?;
        Ok(manifest)
    }

    fn validate(&self, host: &str) -> Result<(), RelayError> {
        if self.name != host {
            return Err(RelayError::Manifest {
                detail: format!("manifest names '{}', expected '{host}'", self.name),
            });
        }
        if self.kind != "stdio" {
            return Err(RelayError::Manifest {
                detail: format!("unsupported host type '{}'", self.kind),
            });
        }
        if cfg!(unix) && !self.path.is_absolute() {
            return Err(RelayError::Manifest {
                detail: format!("host path {:?} must be absolute", self.path),
            });
        }
        Ok(())
    }
}

fn candidates(host: &str, browser: &str) -> Result<Vec<PathBuf>, RelayError> {
    let mut out = Vec::new();

    #[cfg(all(windows, feature = "windows-registry"))]
    {
        let key = paths::winreg_key_path(browser, host)?;
        for scope in [Scope::User, Scope::System] {
            if let Some(p) = winreg::read_manifest_path_from_reg(scope, &key)? {
                out.push(p);
            }
        }
    }

    for scope in [Scope::User, Scope::System] {
        // A scope the browser doesn't define on this OS is just skipped.
        if let Ok(p) = paths::manifest_path(browser, scope, host) {
            out.push(p);
        }
    }
    Ok(out)
}

/// Find `host`'s manifest for `browser`, user scope first.
///
/// Returns `Ok(None)` when no manifest file exists; an existing but invalid
/// manifest is an error.
pub fn locate(host: &str, browser: &str) -> Result<Option<Located>, RelayError> {
    let family = paths::browser(browser)?.family;
    for manifest_path in candidates(host, browser)? {
        if !manifest_path.exists() {
            continue;
        }
        let manifest = Manifest::read(&manifest_path, host)?;
        tracing::debug!(path = %manifest_path.display(), "found native host manifest");
        return Ok(Some(Located {
            manifest_path,
            manifest,
            family,
        }));
    }
    Ok(None)
}

/// Is a valid manifest for `host` installed for `browser`?
pub fn verify_installed(host: &str, browser: &str) -> Result<bool, RelayError> {
    Ok(locate(host, browser)?.is_some())
}
