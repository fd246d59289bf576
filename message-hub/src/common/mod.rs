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

//! Runtime entry points, settings, errors and shared helper types.

pub use config::{HubSettings, CONFIG};
pub use error::HubError;
pub use hub_app::HubApp;
pub use hub_runtime::HubRuntime;
pub use reply::Reply;
pub use types::*;

/// Settings loaded from TOML.
pub mod config;
/// Defines [`HubError`].
mod error;
/// Defines the [`HubApp`] entry point.
mod hub_app;
/// Defines [`HubRuntime`].
mod hub_runtime;
/// Defines the [`Reply`] helpers.
mod reply;
/// Shared type aliases.
mod types;
