/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::path::Path;
use std::time::Duration;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::message::Address;

/// Runtime settings for message hubs.
///
/// Loaded from `$XDG_CONFIG_HOME/message-hub/config.toml`. Every section and
/// key is optional; missing values take their defaults.
///
/// ```toml
/// [timeouts]
/// callback_timeout_ms = 5000
///
/// [defaults]
/// root_kind = "app"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubSettings {
    /// Timeout configuration
    pub timeouts: TimeoutSettings,
    /// Limits configuration
    pub limits: LimitSettings,
    /// Default values
    pub defaults: DefaultSettings,
}

/// Timeout-related settings, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    /// How long an awaited response may take when the caller gives no timeout.
    pub callback_timeout_ms: u64,
    /// Upper bound for disposing every root hub of a runtime.
    pub dispose_timeout_ms: u64,
}

/// Limits applied during shutdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitSettings {
    /// Maximum flush rounds while draining a hub and its hosted hubs to quiescence.
    pub max_quiescence_rounds: usize,
}

/// Defaults used when the caller does not supply a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultSettings {
    /// Address kind of the default root hub.
    pub root_kind: String,
    /// Address id of the default root hub.
    pub root_id: String,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            callback_timeout_ms: 30_000,
            dispose_timeout_ms: 10_000,
        }
    }
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            max_quiescence_rounds: 64,
        }
    }
}

impl Default for DefaultSettings {
    fn default() -> Self {
        Self {
            root_kind: "hub".to_string(),
            root_id: "root".to_string(),
        }
    }
}

impl HubSettings {
    /// Default timeout for awaited responses.
    pub const fn callback_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.callback_timeout_ms)
    }

    /// Timeout for [`HubRuntime::shutdown_all`](crate::common::HubRuntime::shutdown_all).
    pub const fn dispose_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.dispose_timeout_ms)
    }

    /// Flush rounds allowed before shutdown gives up waiting for quiescence.
    /// Never less than one.
    pub fn max_quiescence_rounds(&self) -> usize {
        self.limits.max_quiescence_rounds.max(1)
    }

    /// Address of the default root hub.
    pub fn root_address(&self) -> Address {
        Address::new(
            self.defaults.root_kind.as_str(),
            self.defaults.root_id.as_str(),
        )
    }

    /// Parses settings from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Loads settings from `path`, falling back to defaults when the file is
    /// missing or malformed.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => match Self::from_toml_str(&text) {
                Ok(settings) => {
                    info!("Loaded hub settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    error!("Failed to parse hub settings {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                error!("Failed to read hub settings {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Loads settings from the XDG config directory.
    ///
    /// Looks for `message-hub/config.toml` under the XDG config home and
    /// config dirs; returns defaults if none exists.
    pub fn load() -> Self {
        let xdg_dirs = match xdg::BaseDirectories::with_prefix("message-hub") {
            Ok(dirs) => dirs,
            Err(e) => {
                error!("Failed to initialize XDG directories: {}", e);
                return Self::default();
            }
        };

        match xdg_dirs.find_config_file("config.toml") {
            Some(path) => Self::load_from(&path),
            None => {
                info!("No hub settings file found, using defaults");
                Self::default()
            }
        }
    }
}

lazy_static! {
    /// Settings loaded once from the XDG config directory.
    pub static ref CONFIG: HubSettings = HubSettings::load();
}
