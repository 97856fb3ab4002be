//! TOML settings file schema
//!
//! Supports `~/.config/lumen/bridge.toml` as the persistent settings source.
//! All fields are optional — the file is a partial overlay on top of empty
//! defaults, with `LUMEN_HUB_*` environment variables taking precedence.

use serde::{Deserialize, Serialize};

/// Top-level TOML settings file schema
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct BridgeConfigFile {
    /// Remote hub connection settings
    #[serde(default)]
    pub hub: HubFileConfig,
}

/// Remote hub connection settings
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct HubFileConfig {
    /// Base URL of the remote hub (e.g. `https://hub.local:9443`)
    pub base_url: Option<String>,

    /// Login username
    pub username: Option<String>,

    /// Login password
    pub password: Option<String>,
}
