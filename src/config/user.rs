//! User configuration loading for lsp-event-bridge.
//!
//! This module handles loading user-wide configuration from the XDG config directory.
//! User config location: $XDG_CONFIG_HOME/lsp-event-bridge/lsp-event-bridge.toml
//! Fallback: the platform config directory (e.g. ~/.config on Linux)

use std::path::PathBuf;

use super::BridgeSettings;
use crate::error::BridgeResult;

const APP_DIR: &str = "lsp-event-bridge";
const CONFIG_FILE: &str = "lsp-event-bridge.toml";

/// Returns the path to the user configuration file.
///
/// The path is determined by:
/// 1. If $XDG_CONFIG_HOME is set: $XDG_CONFIG_HOME/lsp-event-bridge/lsp-event-bridge.toml
/// 2. Otherwise: `dirs::config_dir()`/lsp-event-bridge/lsp-event-bridge.toml
///
/// Returns None if no config directory can be determined.
pub fn user_config_path() -> Option<PathBuf> {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config.is_empty()
    {
        return Some(PathBuf::from(xdg_config).join(APP_DIR).join(CONFIG_FILE));
    }

    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

/// Load user settings if a user config file exists.
///
/// Returns `Ok(None)` when there is no config file (zero-config experience).
pub fn load_user_settings() -> BridgeResult<Option<BridgeSettings>> {
    let Some(path) = user_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }
    log::info!(
        target: "lsp_event_bridge::config",
        "Loading user config from {}",
        path.display()
    );
    BridgeSettings::load(&path).map(Some)
}
