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

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::common::{BuildupAction, HandlerFuture, Job, Reply};
use crate::hub::{routing, HandlerRegistry, Hub};
use crate::message::{Address, Delivery, DeliveryState, MessageDelivery};
use crate::traits::{HubMessage, HubPlugin};

/// Everything a hub is started with: handler rules, plugins, buildup actions
/// and whether it tracks fan-out sets.
///
/// ```rust,ignore
/// let configuration = HubConfiguration::new()
///     .on::<Ping, _>(|hub, ping| {
///         hub.respond(&ping, Pong);
///         Reply::processed(ping)
///     })
///     .route_address_to_hosted("worker", |_| worker_configuration());
/// ```
#[derive(Default)]
pub struct HubConfiguration {
    pub(crate) registry: HandlerRegistry,
    pub(crate) plugins: Vec<Arc<dyn HubPlugin>>,
    pub(crate) buildup: Vec<BuildupAction>,
    pub(crate) fan_out: bool,
}

impl HubConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles payloads of exactly type `T` addressed to the hub.
    #[must_use]
    pub fn on<T, F>(mut self, handler: F) -> Self
    where
        T: HubMessage,
        F: Fn(Hub, Delivery<T>) -> HandlerFuture + Send + Sync + 'static,
    {
        self.registry.register::<T, F>(handler);
        self
    }

    #[must_use]
    pub fn on_filtered<T, P, F>(mut self, filter: P, handler: F) -> Self
    where
        T: HubMessage,
        P: Fn(&Delivery<T>) -> bool + Send + Sync + 'static,
        F: Fn(Hub, Delivery<T>) -> HandlerFuture + Send + Sync + 'static,
    {
        self.registry.register_filtered::<T, P, F>(filter, handler);
        self
    }

    /// Handles `B` and every payload declared to reach it.
    #[must_use]
    pub fn on_inherited<B, F>(mut self, handler: F) -> Self
    where
        B: HubMessage + Clone,
        F: Fn(Hub, Delivery<B>) -> HandlerFuture + Send + Sync + 'static,
    {
        self.registry.register_inherited::<B, F>(handler);
        self
    }

    /// Sees every delivery passing through the hub that matches `filter`.
    #[must_use]
    pub fn on_any<P, F>(mut self, filter: P, handler: F) -> Self
    where
        P: Fn(&MessageDelivery) -> bool + Send + Sync + 'static,
        F: Fn(Hub, MessageDelivery) -> HandlerFuture + Send + Sync + 'static,
    {
        self.registry.register_any(filter, handler);
        self
    }

    #[must_use]
    pub fn declare_lineage<D, B>(mut self, view: fn(&D) -> &B) -> Self
    where
        D: HubMessage,
        B: HubMessage,
    {
        self.registry.declare_lineage(view);
        self
    }

    /// Routes deliveries whose target lineage contains an address of `kind`.
    ///
    /// The first such ancestor that is neither this hub nor already visited
    /// is handed to `handler` together with the delivery, which by then
    /// records both this hub and the matched address as visited. The
    /// delivery is marked `Forwarded` once the returned job succeeds.
    #[must_use]
    pub fn route_address<F>(mut self, kind: impl Into<Arc<str>>, handler: F) -> Self
    where
        F: Fn(Hub, Address, MessageDelivery) -> Job + Send + Sync + 'static,
    {
        let kind: Arc<str> = kind.into();
        self.registry.register_any(
            |delivery| delivery.state() == DeliveryState::Submitted,
            move |hub, delivery| {
                let Some(matched) = routing::match_address(&hub, &delivery, &kind) else {
                    return Reply::ready(delivery);
                };
                let visited = delivery
                    .with_forwarded_to(hub.address().clone())
                    .with_forwarded_to(matched.clone());
                let route = handler(hub, matched, visited.clone());
                Reply::pending(async move {
                    route.await?;
                    Ok(visited.forwarded())
                })
            },
        );
        self
    }

    /// Routes deliveries for addresses of `kind` to hosted hubs, creating
    /// each hosted hub with `configure` the first time it is addressed.
    #[must_use]
    pub fn route_address_to_hosted<C>(self, kind: impl Into<Arc<str>>, configure: C) -> Self
    where
        C: Fn(&Address) -> HubConfiguration + Send + Sync + 'static,
    {
        self.route_address(kind, move |hub, matched, delivery| {
            let outcome = routing::forward_to_hosted(&hub, &matched, delivery, |address| configure(address));
            Reply::job(async move { outcome })
        })
    }

    /// Re-posts `T` deliveries addressed to this hub to the address computed
    /// by `address_map`.
    ///
    /// A request is re-posted with this hub as the sender, and the response
    /// is relayed back to the original requester correlated to the original
    /// request. Other messages keep their original sender.
    #[must_use]
    pub fn route_message<T, M, P>(mut self, address_map: M, filter: P) -> Self
    where
        T: HubMessage,
        M: Fn(&Delivery<T>) -> Option<Address> + Send + Sync + 'static,
        P: Fn(&Delivery<T>) -> bool + Send + Sync + 'static,
    {
        self.registry.register_filtered::<T, _, _>(
            move |delivery| delivery.state() == DeliveryState::Submitted && filter(delivery),
            move |hub, delivery| match address_map(&delivery) {
                Some(destination) => Reply::ready(routing::forward_message(
                    &hub,
                    delivery.into_envelope(),
                    destination,
                )),
                None => Reply::ready(delivery),
            },
        );
        self
    }

    /// Runs `action` on the hub's queue during start-up, before any held
    /// delivery is dispatched.
    #[must_use]
    pub fn with_buildup<F, Fut>(mut self, action: F) -> Self
    where
        F: FnOnce(Hub) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.buildup
            .push(Box::new(move |hub: Hub| -> Job { Box::pin(action(hub)) }));
        self
    }

    #[must_use]
    pub fn with_plugin<P: HubPlugin>(mut self, plugin: P) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    /// Tracks subscribers and subscriptions so the hub can post to
    /// [`Address::subscribers`] and [`Address::subscriptions`].
    #[must_use]
    pub fn with_fan_out(mut self) -> Self {
        self.fan_out = true;
        self
    }
}

impl fmt::Debug for HubConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plugins: Vec<&str> = self.plugins.iter().map(|plugin| plugin.name()).collect();
        f.debug_struct("HubConfiguration")
            .field("registry", &self.registry)
            .field("plugins", &plugins)
            .field("buildup", &self.buildup.len())
            .field("fan_out", &self.fan_out)
            .finish()
    }
}
