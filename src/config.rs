use std::path::PathBuf;

use serde::Deserialize;

/// Environment-supplied settings. Presence of `DATABASE_URL` gates whether
/// remote sync activates; without it the service runs on the in-memory
/// fallback store and the board reports `mode: "local"`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub identity_path: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());
        let identity_path = std::env::var("PARKBOARD_IDENTITY_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".parkboard/identity.json"));
        Ok(Self {
            database_url,
            identity_path,
        })
    }
}
