use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Trim a self-asserted display name; empty input yields nothing.
pub fn normalize_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredIdentity {
    name: String,
}

/// Device-local display name, persisted as one small JSON file so it
/// outlives the session. Names are self-asserted; nothing validates them
/// against the roommate list.
pub struct NameStore {
    path: PathBuf,
    current: RwLock<Option<String>>,
}

impl NameStore {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let current = match fs::read_to_string(path) {
            Ok(contents) => {
                let stored: StoredIdentity = serde_json::from_str(&contents)
                    .with_context(|| format!("parse identity file {}", path.display()))?;
                normalize_name(&stored.name)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                return Err(e).with_context(|| format!("read identity file {}", path.display()))
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            current: RwLock::new(current),
        })
    }

    pub fn load(&self) -> Option<String> {
        self.current.read().expect("identity lock poisoned").clone()
    }

    /// Persist a new name. Input is trimmed; an empty result is a silent
    /// no-op and the stored value is left untouched.
    pub fn save(&self, raw: &str) -> anyhow::Result<()> {
        let Some(name) = normalize_name(raw) else {
            debug!("ignoring empty display name");
            return Ok(());
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create identity dir {}", parent.display()))?;
            }
        }
        let contents = serde_json::to_string_pretty(&StoredIdentity { name: name.clone() })?;
        fs::write(&self.path, contents)
            .with_context(|| format!("write identity file {}", self.path.display()))?;

        *self.current.write().expect("identity lock poisoned") = Some(name);
        Ok(())
    }
}
