//! Bridge configuration.
//!
//! Settings are plain data with defaults for every field, so an empty TOML
//! document (or no config file at all) yields a working bridge.

pub mod user;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, BridgeResult};

pub use user::{load_user_settings, user_config_path};

/// Channel carrying outbound JSON-RPC messages to the backend.
pub const DEFAULT_REQUEST_CHANNEL: &str = "lsp-request";
/// Channel carrying backend responses and notifications to the editor.
pub const DEFAULT_RESPONSE_CHANNEL: &str = "lsp-response";
/// One-shot channel fired once the backend server is listening.
pub const DEFAULT_READY_CHANNEL: &str = "lsp-initialized";

/// Names of the three bus channels the bridge uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelNames {
    pub request: String,
    pub response: String,
    pub ready: String,
}

impl Default for ChannelNames {
    fn default() -> Self {
        Self {
            request: DEFAULT_REQUEST_CHANNEL.to_string(),
            response: DEFAULT_RESPONSE_CHANNEL.to_string(),
            ready: DEFAULT_READY_CHANNEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeSettings {
    pub channels: ChannelNames,
}

impl BridgeSettings {
    /// Parse and validate settings from a TOML document.
    pub fn from_toml_str(contents: &str) -> BridgeResult<Self> {
        let settings: BridgeSettings = toml::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read, parse and validate settings from a TOML file.
    pub fn load(path: &Path) -> BridgeResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Check that channel names are non-empty and pairwise distinct.
    pub fn validate(&self) -> BridgeResult<()> {
        let ChannelNames {
            request,
            response,
            ready,
        } = &self.channels;

        for (field, name) in [("request", request), ("response", response), ("ready", ready)] {
            if name.trim().is_empty() {
                return Err(BridgeError::config(format!(
                    "channels.{} must not be empty",
                    field
                )));
            }
        }

        if request == response || request == ready || response == ready {
            return Err(BridgeError::config(
                "channels.request, channels.response and channels.ready must be distinct",
            ));
        }

        Ok(())
    }
}
