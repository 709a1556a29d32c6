use std::collections::HashMap;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::error::RelayError;

/// Install scope of a host manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    User,
    System,
}

/// Browser family; decides how the helper is launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Firefox,
    Chromium,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScopeDirs {
    pub user: Option<String>,
    pub system: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrowserEntry {
    pub family: Family,
    #[serde(default)]
    pub linux: ScopeDirs,
    #[serde(default)]
    pub macos: ScopeDirs,
    #[serde(default)]
    pub windows: ScopeDirs,
    pub registry: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BrowsersFile {
    browsers: HashMap<String, BrowserEntry>,
}

static BROWSERS: Lazy<Result<BrowsersFile, String>> = Lazy::new(|| {
    toml::from_str(include_str!("browsers.toml")).map_err(|e| e.to_string())
});

/// Look up a browser key (`"firefox"`, `"chrome"`, ...) in the embedded table.
pub fn browser(key: &str) -> Result<&'static BrowserEntry, RelayError> {
    let table = (*BROWSERS).as_ref().map_err(|e| RelayError::Manifest {
        detail: format!("embedded browsers.toml is invalid: {e}"),
    })?;
    table.browsers.get(key).ok_or_else(|| RelayError::Manifest {
        detail: format!("unknown browser '{key}'"),
    })
}

/// Every browser key the embedded table knows about.
pub fn browser_keys() -> Vec<&'static str> {
    match &*BROWSERS {
        Ok(table) => {
            let mut keys: Vec<&'static str> = table.browsers.keys().map(String::as_str).collect();
            keys.sort_unstable();
            keys
        }
        Err(_) => Vec::new(),
    }
}

fn os_dirs(entry: &BrowserEntry) -> &ScopeDirs {
    if cfg!(target_os = "windows") {
        &entry.windows
    } else if cfg!(target_os = "macos") {
        &entry.macos
    } else {
        &entry.linux
    }
}

/// Replace every `{VAR}` in `template` with the environment variable `VAR`.
pub(crate) fn expand_template(template: &str) -> Result<String, RelayError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after.find('}').ok_or_else(|| RelayError::Manifest {
            detail: format!("unterminated placeholder in '{template}'"),
        })?;
        let var = &after[..end];
        let value = std::env::var(var).map_err(|_| RelayError::Manifest {
            detail: format!("environment variable {var} is not set"),
        })?;
        out.push_str(&value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Directory holding host manifests for `browser` at `scope` on this OS.
pub fn manifest_dir(browser_key: &str, scope: Scope) -> Result<PathBuf, RelayError> {
    let dirs = os_dirs(browser(browser_key)?);
    let template = match scope {
        Scope::User => dirs.user.as_deref(),
        Scope::System => dirs.system.as_deref(),
    }
    .ok_or_else(|| RelayError::Manifest {
        detail: format!("{browser_key} has no {scope:?} manifest directory on this OS"),
    })?;
    Ok(PathBuf::from(expand_template(template)?))
}

/// Full path of `host`'s manifest for `browser` at `scope`.
pub fn manifest_path(browser_key: &str, scope: Scope, host: &str) -> Result<PathBuf, RelayError> {
    Ok(manifest_dir(browser_key, scope)?.join(format!("{host}.json")))
}

/// Registry key (under HKCU or HKLM) pointing at `host`'s manifest.
pub fn winreg_key_path(browser_key: &str, host: &str) -> Result<String, RelayError> {
    let base = browser(browser_key)?
        .registry
        .as_deref()
        .ok_or_else(|| RelayError::Manifest {
            detail: format!("{browser_key} has no registry location"),
        })?;
    Ok(format!(r"{base}\{host}"))
}
