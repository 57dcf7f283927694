//! Settings stored alongside the database.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use chrono::{DateTime, FixedOffset, Utc};
use likes_core::db::{ConnectionManager, ConnectionSpec};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const SETTINGS_FILE: &str = "settings.json";

fn default_pool_size() -> u32 {
    8
}

/// Service settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Where the data lives.
    pub connection: ConnectionSpec,
    /// Offset from UTC, in minutes, used to stamp new likes. The
    /// calendar day a like counts towards depends on it.
    #[serde(default)]
    pub utc_offset_minutes: i32,
    /// Maximum number of pooled connections.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

fn complete_if_dir(path: &Path) -> Cow<'_, Path> {
    if path.is_dir() {
        Cow::from(path.join(SETTINGS_FILE))
    } else {
        Cow::from(path)
    }
}

impl Settings {
    /// Settings for `connection` with default offset and pool size.
    pub fn new(connection: ConnectionSpec) -> Self {
        Settings {
            connection,
            utc_offset_minutes: 0,
            pool_size: default_pool_size(),
        }
    }

    /// Load settings. A directory resolves to `settings.json` inside it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = complete_if_dir(path.as_ref());
        let text = fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("invalid settings in {}: {e}", path.display())))
    }

    /// Save settings. A directory resolves to `settings.json` inside it.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = complete_if_dir(path.as_ref());
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("cannot serialize settings: {e}")))?;
        fs::write(&path, text)
            .map_err(|e| Error::Config(format!("cannot write {}: {e}", path.display())))
    }

    /// The configured offset from UTC.
    pub fn offset(&self) -> Result<FixedOffset> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                Error::Config(format!(
                    "utc_offset_minutes {} is out of range",
                    self.utc_offset_minutes
                ))
            })
    }

    /// The current time in the configured offset.
    pub fn now(&self) -> Result<DateTime<FixedOffset>> {
        Ok(Utc::now().with_timezone(&self.offset()?))
    }

    /// A connection pool for the configured database.
    pub fn pool(&self) -> Result<r2d2::Pool<ConnectionManager>> {
        if self.pool_size == 0 {
            return Err(Error::Config("pool_size must be at least 1".to_string()));
        }
        Ok(r2d2::Pool::builder()
            .max_size(self.pool_size)
            .build(ConnectionManager::new(self.connection.clone()))?)
    }
}
