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

use tracing::trace;

use crate::common::{HubRuntime, HubSettings, CONFIG};

/// Entry point for creating a [`HubRuntime`].
///
/// ```rust,ignore
/// let runtime = HubApp::launch_async().await;
/// let root = runtime.create_default_hub(HubConfiguration::new());
/// ```
#[derive(Default, Debug, Clone)]
pub struct HubApp;

impl HubApp {
    /// Launches a runtime with the settings loaded from the XDG config directory.
    pub async fn launch_async() -> HubRuntime {
        trace!("Launching hub runtime");
        let settings = CONFIG.clone();
        trace!("Settings loaded: {:?}", settings);
        HubRuntime::new(settings)
    }

    /// Launches a runtime with explicit settings.
    pub async fn launch_with_settings(settings: HubSettings) -> HubRuntime {
        trace!("Launching hub runtime with explicit settings: {:?}", settings);
        HubRuntime::new(settings)
    }
}
