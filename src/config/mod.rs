//! Settings management for the Lumen bridge
//!
//! Three settings drive the bridge: the remote hub's base URL, username, and
//! password. They persist to a TOML file under the platform config directory
//! and every mutation is pushed through a watch channel so the daemon can
//! re-authenticate and re-discover.

pub mod file;

use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;

use crate::{Error, Result};

pub use file::{BridgeConfigFile, HubFileConfig};

/// Setting key for the remote hub base URL
pub const SETTING_BASE_URL: &str = "base_url";
/// Setting key for the remote hub username
pub const SETTING_USERNAME: &str = "username";
/// Setting key for the remote hub password
pub const SETTING_PASSWORD: &str = "password";

/// Mask shown in place of stored secrets
const SECRET_MASK: &str = "********";

/// Credentials for the remote hub
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Base URL of the remote hub
    pub base_url: String,

    /// Login username
    pub username: String,

    /// Login password
    pub password: SecretString,
}

impl Credentials {
    /// Build credentials from plain strings
    #[must_use]
    pub fn new(base_url: &str, username: &str, password: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            username: username.to_string(),
            password: SecretString::from(password.to_string()),
        }
    }

    /// Check that all three fields are present
    ///
    /// Called before any network interaction is attempted; an incomplete set
    /// of credentials never reaches the hub.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the missing fields.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.base_url.trim().is_empty() {
            missing.push("base URL");
        }
        if self.username.trim().is_empty() {
            missing.push("username");
        }
        if self.password.expose_secret().trim().is_empty() {
            missing.push("password");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(format!("missing {}", missing.join(", "))))
        }
    }
}

/// A single setting as rendered to a UI or CLI
#[derive(Debug, Clone)]
pub struct Setting {
    /// Setting key
    pub key: &'static str,

    /// Rendered value (masked for secrets)
    pub value: String,

    /// Whether the underlying value is a secret
    pub secret: bool,
}

/// Persistent settings store with a change-notification hook
pub struct SettingsStore {
    path: Option<PathBuf>,
    state: tokio::sync::RwLock<BridgeConfigFile>,
    tx: watch::Sender<Credentials>,
}

impl SettingsStore {
    /// Load settings from the given path, or the platform default
    ///
    /// A missing file yields empty settings. `LUMEN_HUB_URL`,
    /// `LUMEN_HUB_USERNAME`, and `LUMEN_HUB_PASSWORD` override file values.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let path = path.or_else(default_config_path);

        let mut state = match &path {
            Some(p) if p.exists() => toml::from_str(&std::fs::read_to_string(p)?)?,
            _ => BridgeConfigFile::default(),
        };
        apply_env_overrides(&mut state);

        let (tx, _) = watch::channel(credentials_of(&state));

        Ok(Self {
            path,
            state: tokio::sync::RwLock::new(state),
            tx,
        })
    }

    /// Create a store with no backing file (settings live in memory only)
    #[must_use]
    pub fn in_memory() -> Self {
        let state = BridgeConfigFile::default();
        let (tx, _) = watch::channel(credentials_of(&state));
        Self {
            path: None,
            state: tokio::sync::RwLock::new(state),
            tx,
        }
    }

    /// Subscribe to credential changes
    ///
    /// The daemon holds this receiver and runs a full re-authentication and
    /// re-discovery pass for every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Credentials> {
        self.tx.subscribe()
    }

    /// Current credentials (fields may be empty if unconfigured)
    pub async fn credentials(&self) -> Credentials {
        credentials_of(&*self.state.read().await)
    }

    /// Render all settings, masking secrets
    pub async fn get_settings(&self) -> Vec<Setting> {
        let state = self.state.read().await;
        vec![
            Setting {
                key: SETTING_BASE_URL,
                value: state.hub.base_url.clone().unwrap_or_default(),
                secret: false,
            },
            Setting {
                key: SETTING_USERNAME,
                value: state.hub.username.clone().unwrap_or_default(),
                secret: false,
            },
            Setting {
                key: SETTING_PASSWORD,
                value: if state.hub.password.as_deref().is_some_and(|p| !p.is_empty()) {
                    SECRET_MASK.to_string()
                } else {
                    String::new()
                },
                secret: true,
            },
        ]
    }

    /// Update one setting, persist, and notify subscribers
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unknown key, or an IO error if the
    /// file cannot be written.
    pub async fn put_setting(&self, key: &str, value: &str) -> Result<()> {
        {
            let mut state = self.state.write().await;
            match key {
                SETTING_BASE_URL => state.hub.base_url = Some(value.to_string()),
                SETTING_USERNAME => state.hub.username = Some(value.to_string()),
                SETTING_PASSWORD => state.hub.password = Some(value.to_string()),
                other => return Err(Error::Config(format!("unknown setting '{other}'"))),
            }
        }

        self.save().await?;

        // Every credential mutation forces re-authentication downstream
        self.tx.send_replace(self.credentials().await);
        Ok(())
    }

    /// Persist the current settings, write-then-rename
    async fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let body = {
            let state = self.state.read().await;
            toml::to_string_pretty(&*state)
                .map_err(|e| Error::Config(format!("failed to serialize settings: {e}")))?
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, path)?;

        tracing::debug!(path = %path.display(), "settings saved");
        Ok(())
    }
}

/// Default settings path: `<config dir>/lumen/bridge.toml`
fn default_config_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.config_dir().join("lumen").join("bridge.toml"))
}

fn credentials_of(state: &BridgeConfigFile) -> Credentials {
    Credentials {
        base_url: state.hub.base_url.clone().unwrap_or_default(),
        username: state.hub.username.clone().unwrap_or_default(),
        password: SecretString::from(state.hub.password.clone().unwrap_or_default()),
    }
}

fn apply_env_overrides(state: &mut BridgeConfigFile) {
    if let Ok(url) = std::env::var("LUMEN_HUB_URL") {
        state.hub.base_url = Some(url);
    }
    if let Ok(username) = std::env::var("LUMEN_HUB_USERNAME") {
        state.hub.username = Some(username);
    }
    if let Ok(password) = std::env::var("LUMEN_HUB_PASSWORD") {
        state.hub.password = Some(password);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_complete_credentials() {
        let creds = Credentials::new("https://hub.local:9443", "bridge", "hunter2");
        assert!(creds.validate().is_ok());
    }

    #[test]
    fn validate_names_missing_fields() {
        let creds = Credentials::new("", "bridge", "");
        let err = creds.validate().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("base URL"));
        assert!(msg.contains("password"));
        assert!(!msg.contains("username"));
    }

    #[tokio::test]
    async fn put_setting_rejects_unknown_key() {
        let store = SettingsStore::in_memory();
        assert!(store.put_setting("hostname", "x").await.is_err());
    }

    #[tokio::test]
    async fn put_setting_notifies_subscribers() {
        let store = SettingsStore::in_memory();
        let mut rx = store.subscribe();

        store.put_setting(SETTING_USERNAME, "bridge").await.unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().username, "bridge");
    }

    #[tokio::test]
    async fn password_is_masked_in_settings() {
        let store = SettingsStore::in_memory();
        store.put_setting(SETTING_PASSWORD, "hunter2").await.unwrap();

        let settings = store.get_settings().await;
        let password = settings.iter().find(|s| s.key == SETTING_PASSWORD).unwrap();
        assert!(password.secret);
        assert_eq!(password.value, SECRET_MASK);
        assert!(!settings.iter().any(|s| s.value.contains("hunter2")));
    }
}
