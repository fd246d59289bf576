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

use async_trait::async_trait;

use crate::hub::{HandlerRegistry, Hub};

/// A component that contributes handler rules and lifecycle hooks to a hub.
///
/// Plugins attached through
/// [`HubConfiguration::with_plugin`](crate::hub::HubConfiguration::with_plugin)
/// register their rules after the configuration's own rules, and are
/// initialized, in attach order, before the hub handles its first delivery.
/// [`Hub::add_plugin`] attaches one to a running hub.
///
/// ```rust,ignore
/// struct Audit;
///
/// #[async_trait]
/// impl HubPlugin for Audit {
///     fn register(&self, registry: &mut HandlerRegistry) {
///         registry.register_any(|_| true, |_, delivery| {
///             tracing::info!(id = delivery.id(), "seen");
///             Reply::ready(delivery)
///         });
///     }
/// }
/// ```
#[async_trait]
pub trait HubPlugin: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Adds the plugin's handler rules.
    fn register(&self, _registry: &mut HandlerRegistry) {}

    /// Runs on the hub's execution queue before any delivery is handled.
    /// An error aborts the remaining start-up steps.
    async fn initialize(&self, _hub: &Hub) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs while the hub is disposed, after its hosted hubs are gone.
    async fn dispose(&self, _hub: &Hub) {}
}
