use adw::Application;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::client::ReconnectPolicy;
use crate::error::{ChatError, Result};
use crate::session::SessionContext;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Host (and port) of the chat server, without scheme.
    pub server: String,
    pub secure: bool,
    pub room_id: String,
    pub user_id: String,
    pub fetch_history_on_open: bool,
    pub reconnect_interval_ms: u64,
    pub max_reconnect_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        let policy = ReconnectPolicy::default();
        Self {
            server: String::new(),
            secure: false,
            room_id: String::new(),
            user_id: String::new(),
            fetch_history_on_open: false,
            reconnect_interval_ms: policy.initial.as_millis() as u64,
            max_reconnect_interval_ms: policy.max.as_millis() as u64,
        }
    }
}

impl Settings {
    fn path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        Some(base.config_dir().join("roomchat.toml"))
    }

    pub fn load() -> Self {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(text) = fs::read_to_string(path) else {
            return Self::default();
        };
        match toml::from_str::<Settings>(&text) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("ignoring invalid settings at {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::path().ok_or_else(|| ChatError::Config("no config dir".into()))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ChatError::Config(e.to_string()))?;
        }
        let toml = toml::to_string_pretty(self).map_err(|e| ChatError::Config(e.to_string()))?;
        fs::write(path, toml).map_err(|e| ChatError::Config(e.to_string()))
    }

    pub fn is_complete(&self) -> bool {
        !self.server.trim().is_empty() && self.session().is_ok()
    }

    pub fn session(&self) -> Result<SessionContext> {
        SessionContext::new(self.room_id.as_str(), self.user_id.as_str())
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        let initial = Duration::from_millis(self.reconnect_interval_ms.max(1));
        ReconnectPolicy {
            initial,
            max: Duration::from_millis(self.max_reconnect_interval_ms).max(initial),
            ..ReconnectPolicy::default()
        }
    }
}

pub fn build_ui(app: &Application) {
    let settings = Settings::load();
    if settings.is_complete() {
        crate::ui::main_window::show_main_window(app, settings);
    } else {
        crate::ui::login::show_join_window(app, settings);
    }
}
