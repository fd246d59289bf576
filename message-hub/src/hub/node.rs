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

use std::any::{type_name, Any};
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use anyhow::Context;
use dashmap::DashMap;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use static_assertions::assert_impl_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument, trace, warn};

use crate::common::{panic_message, BuildupAction, DeliverySink, HubError, HubSettings};
use crate::hub::callbacks::CallbackTable;
use crate::hub::deferral::{DeferralChain, DeferralHandle};
use crate::hub::execution_queue::ExecutionQueue;
use crate::hub::fan_out::FanOut;
use crate::hub::hosted::HostedHubs;
use crate::hub::property_bag::PropertyBag;
use crate::hub::{HandlerRegistry, HubConfiguration};
use crate::message::{
    properties, Address, Delivery, DeliveryFailure, DeliveryState, Disconnect, DisposeRequest,
    MessageDelivery, PostOptions,
};
use crate::traits::{HubMessage, HubPlugin, Request};

/// An addressable node that handles deliveries one at a time.
///
/// `Hub` is a cheap, cloneable handle; clones refer to the same node and
/// compare equal. A delivery entering a hub passes its deferral chain, then
/// runs as a job on its execution queue: outstanding callbacks are resolved,
/// the handler rules are folded over it, and anything still addressed
/// elsewhere is routed onward to a hosted hub, a connected peer or the parent.
///
/// Handlers run on the hub's queue. Responses complete their callbacks as
/// they arrive, so a handler may await a request to another hub inline; a
/// request to the hub itself has to be awaited from spawned work.
#[derive(Clone)]
pub struct Hub {
    inner: Arc<HubInner>,
}

pub(crate) struct HubInner {
    address: Address,
    parent: Option<Weak<HubInner>>,
    settings: Arc<HubSettings>,
    queue: ExecutionQueue,
    deferrals: DeferralChain,
    registry: RwLock<Arc<HandlerRegistry>>,
    callbacks: Arc<CallbackTable>,
    hosted: HostedHubs,
    connections: DashMap<Address, Weak<HubInner>>,
    fan_out: Option<Mutex<FanOut>>,
    properties: PropertyBag,
    plugins: Mutex<Vec<Arc<dyn HubPlugin>>>,
    disposing: AtomicBool,
    started: CancellationToken,
    disposed: CancellationToken,
}

tokio::task_local! {
    /// Queue id of the hub whose start-up is running in the current task.
    static STARTING: usize;
}

fn in_startup_of(queue_id: usize) -> bool {
    STARTING.try_with(|id| *id == queue_id).unwrap_or(false)
}

impl Hub {
    /// Builds the hub and spawns its start-up.
    ///
    /// Every delivery except responses is held back until the plugins are
    /// initialized and the buildup actions have run. Deliveries submitted by
    /// the start-up itself go through, so it can await requests to the hub.
    pub(crate) fn start(
        address: Address,
        parent: Option<&Hub>,
        configuration: HubConfiguration,
        settings: Arc<HubSettings>,
    ) -> Self {
        let HubConfiguration {
            mut registry,
            plugins,
            buildup,
            fan_out,
        } = configuration;
        for plugin in &plugins {
            trace!(plugin = plugin.name(), "Registering plugin rules");
            plugin.register(&mut registry);
        }

        let inner = Arc::new_cyclic(|this: &Weak<HubInner>| {
            let this = this.clone();
            let sink: DeliverySink = Arc::new(move |delivery: MessageDelivery| match this.upgrade() {
                Some(inner) => Hub { inner }.schedule_dispatch(delivery),
                None => warn!(id = %delivery.id(), "Hub dropped, discarding delivery"),
            });
            HubInner {
                address,
                parent: parent.map(|parent| Arc::downgrade(&parent.inner)),
                settings,
                queue: ExecutionQueue::new(),
                deferrals: DeferralChain::new(sink),
                registry: RwLock::new(Arc::new(registry)),
                callbacks: Arc::default(),
                hosted: HostedHubs::default(),
                connections: DashMap::new(),
                fan_out: fan_out.then(|| Mutex::new(FanOut::default())),
                properties: PropertyBag::default(),
                plugins: Mutex::new(plugins.clone()),
                disposing: AtomicBool::new(false),
                started: CancellationToken::new(),
                disposed: CancellationToken::new(),
            }
        });
        let hub = Self { inner };

        let queue_id = hub.inner.queue.id();
        let gate = hub.defer(move |delivery| {
            delivery.request_id().is_none() && !in_startup_of(queue_id)
        });
        let startup = hub.clone();
        tokio::spawn(STARTING.scope(queue_id, async move {
            let _started = startup.inner.started.clone().drop_guard();
            let _gate = gate;
            let outcome = AssertUnwindSafe(startup.run_startup(plugins, buildup))
                .catch_unwind()
                .await;
            match outcome {
                Ok(Ok(())) => debug!(address = %startup.address(), "Hub started"),
                Ok(Err(e)) => error!(address = %startup.address(), "Hub start-up failed: {:#}", e),
                Err(panic) => error!(
                    address = %startup.address(),
                    "Hub start-up panicked: {}",
                    panic_message(panic.as_ref())
                ),
            }
        }));
        hub
    }

    async fn run_startup(
        &self,
        plugins: Vec<Arc<dyn HubPlugin>>,
        buildup: Vec<BuildupAction>,
    ) -> anyhow::Result<()> {
        for plugin in &plugins {
            plugin
                .initialize(self)
                .await
                .with_context(|| format!("plugin {} failed to initialize", plugin.name()))?;
        }
        for action in buildup {
            action(self.clone()).await?;
        }
        Ok(())
    }

    /// The hub's address.
    #[inline]
    pub fn address(&self) -> &Address {
        &self.inner.address
    }

    /// The hosting hub, unless this is a root or the parent is gone.
    pub fn parent(&self) -> Option<Hub> {
        self.inner
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Hub { inner })
    }

    /// Settings inherited from the runtime.
    pub fn settings(&self) -> &HubSettings {
        &self.inner.settings
    }

    pub(crate) fn callbacks(&self) -> &Arc<CallbackTable> {
        &self.inner.callbacks
    }

    /// Builds an envelope for `message` and delivers it through this hub.
    ///
    /// The sender defaults to this hub and a missing target means this hub.
    /// The returned view carries the envelope as submitted.
    pub fn post<T: HubMessage>(&self, message: T, options: PostOptions) -> Delivery<T> {
        let message = Arc::new(message);
        let envelope = MessageDelivery::from_options(
            Arc::clone(&message) as Arc<dyn HubMessage>,
            self.address(),
            options,
        );
        Delivery::from_parts(self.deliver_message(envelope), message)
    }

    /// Injects an envelope as is. Returns it `Submitted`, or `Failed` when
    /// the hub is disposed.
    pub fn deliver_message(&self, delivery: MessageDelivery) -> MessageDelivery {
        if self.inner.queue.is_closed() {
            warn!(hub = %self.address(), id = %delivery.id(), "Delivery to disposed hub");
            return delivery.failed(HubError::Disposed(self.address().clone()));
        }
        trace!(hub = %self.address(), id = %delivery.id(), message = delivery.message().type_name(), "Delivery submitted");
        // Responses complete their callback here, so a waiter running on this
        // hub's own queue is not stuck behind itself.
        let delivery = if delivery.is_for(self.address()) && self.inner.callbacks.resolve(&delivery) {
            trace!(id = %delivery.id(), "Response correlated");
            delivery.processed()
        } else {
            delivery
        };
        self.inner.deferrals.submit(delivery.clone());
        delivery
    }

    /// Sends `request` and waits for its typed response.
    ///
    /// Fails with [`HubError::Timeout`] after the options' timeout (or the
    /// configured callback timeout), [`HubError::Cancelled`] when the
    /// options' token fires, and [`HubError::DeliveryFailed`] as soon as the
    /// handling hub reports the request failed or undeliverable.
    pub async fn await_response<R: Request>(
        &self,
        request: R,
        options: PostOptions,
    ) -> Result<Delivery<R::Response>, HubError> {
        self.await_response_with(request, options, |response| {
            response
                .typed::<R::Response>()
                .ok_or_else(|| HubError::UnexpectedResponse {
                    expected: type_name::<R::Response>(),
                    actual: response.message().type_name(),
                })
        })
        .await
    }

    /// Sends `request` and projects the correlated response with `selector`.
    pub async fn await_response_with<M, T, S>(
        &self,
        request: M,
        options: PostOptions,
        selector: S,
    ) -> Result<T, HubError>
    where
        M: HubMessage,
        T: Send + 'static,
        S: FnOnce(MessageDelivery) -> Result<T, HubError> + Send + 'static,
    {
        let timeout = options.timeout;
        let cancellation = options.cancellation.clone();
        let envelope = MessageDelivery::from_options(Arc::new(request), self.address(), options)
            .with_property(properties::EXPECTS_RESPONSE, "true");

        // Registered before sending so a fast response cannot be missed.
        let pending = self.register_callback(&envelope, selector, timeout, cancellation);
        let submitted = self.deliver_message(envelope);
        if submitted.state() == DeliveryState::Failed {
            return Err(HubError::DeliveryFailed {
                id: submitted.id().to_string(),
                reason: submitted.error().unwrap_or_default().to_string(),
            });
        }
        pending.await
    }

    /// Waits for the response correlated to `request` without sending anything.
    ///
    /// The response must arrive at this hub, so `request` should carry this
    /// hub as its sender. `continuation` runs exactly once, on the response;
    /// a [`DeliveryFailure`] response fails the call instead.
    pub fn register_callback<T, F>(
        &self,
        request: &MessageDelivery,
        continuation: F,
        timeout: Option<Duration>,
        cancellation: Option<CancellationToken>,
    ) -> impl Future<Output = Result<T, HubError>> + Send + 'static
    where
        T: Send + 'static,
        F: FnOnce(MessageDelivery) -> Result<T, HubError> + Send + 'static,
    {
        let timeout = timeout.unwrap_or_else(|| self.inner.settings.callback_timeout());
        let pending = self.inner.callbacks.register(request.id(), timeout, cancellation);
        async move {
            let response = pending.await?;
            if let Some(failure) = response.message_as::<DeliveryFailure>() {
                return Err(HubError::DeliveryFailed {
                    id: failure.delivery_id.clone(),
                    reason: failure.reason.clone(),
                });
            }
            continuation(response)
        }
    }

    /// Posts `response` back to the sender of `request`, correlated to it.
    pub fn respond<R: HubMessage>(
        &self,
        request: &impl AsRef<MessageDelivery>,
        response: R,
    ) -> Delivery<R> {
        let request = request.as_ref();
        let mut options = PostOptions::default().in_response_to(request.id());
        match request.sender() {
            Some(sender) => options = options.with_target(sender.clone()),
            None => warn!(request = %request.id(), "Request has no sender, responding to self"),
        }
        self.post(response, options)
    }

    /// Holds back deliveries matching `predicate` until the handle is dropped.
    pub fn defer<P>(&self, predicate: P) -> DeferralHandle
    where
        P: Fn(&MessageDelivery) -> bool + Send + Sync + 'static,
    {
        self.inner.deferrals.defer(Arc::new(predicate))
    }

    /// Runs `job` on this hub's execution queue. Returns `false` once disposed.
    pub fn schedule<F>(&self, job: F) -> bool
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.inner.queue.schedule(job)
    }

    /// Waits for the work scheduled so far; returns whether more arrived meanwhile.
    pub async fn flush(&self) -> bool {
        self.inner.queue.flush().await
    }

    /// Disposes the hub.
    ///
    /// Flushes the queue until quiescent, disposes every hosted hub, disposes
    /// plugins, drops outstanding callbacks, then closes the queue. Later and
    /// concurrent calls wait for the first one to finish. Called from one of
    /// the hub's own handlers, the dispose continues in the background.
    pub fn dispose(&self) -> BoxFuture<'_, ()> {
        async move {
            if self.inner.queue.is_current() || in_startup_of(self.inner.queue.id()) {
                warn!(hub = %self.address(), "Dispose requested from within the hub, continuing in the background");
                let hub = self.clone();
                tokio::spawn(async move { hub.dispose().await });
                return;
            }
            if self.inner.disposing.swap(true, Ordering::AcqRel) {
                self.inner.disposed.cancelled().await;
                return;
            }
            self.dispose_now().await;
        }
        .boxed()
    }

    #[instrument(skip(self), fields(hub = %self.inner.address))]
    async fn dispose_now(&self) {
        debug!("Disposing hub");
        let max_rounds = self.inner.settings.max_quiescence_rounds();
        let mut rounds = 1;
        while self.settle().await {
            if rounds >= max_rounds {
                warn!(rounds, "Hub still busy, continuing shutdown");
                break;
            }
            rounds += 1;
        }
        trace!(rounds, "Hub and hosted hubs quiescent");

        self.inner.hosted.dispose_all().await;

        let plugins: Vec<Arc<dyn HubPlugin>> = self.inner.plugins.lock().drain(..).collect();
        for plugin in plugins.iter().rev() {
            trace!(plugin = plugin.name(), "Disposing plugin");
            plugin.dispose(self).await;
        }

        let dropped = self.inner.callbacks.clear();
        if dropped > 0 {
            debug!(dropped, "Dropped outstanding callbacks");
        }
        self.inner.queue.close().await;
        self.detach();
        self.inner.disposed.cancel();
        debug!("Hub disposed");
    }

    /// Flushes this hub and, together with it, every hub below it. Returns
    /// whether any of them had work scheduled since its previous settle.
    /// Hubs still starting are waited for, since their held deliveries are
    /// scheduled only once start-up ends.
    ///
    /// A round in which none had work ran no job anywhere in the subtree, so
    /// nothing is left that could still send to a sibling.
    pub(crate) fn settle(&self) -> BoxFuture<'_, bool> {
        async move {
            self.inner.started.cancelled().await;
            let (own, hosted) = tokio::join!(self.inner.queue.settle(), self.inner.hosted.settle());
            own || hosted
        }
        .boxed()
    }

    /// Whether disposal has completed.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.is_cancelled()
    }

    fn detach(&self) {
        if let Some(parent) = self.parent() {
            parent.inner.hosted.remove(self.address());
        }
        for entry in &self.inner.connections {
            if let Some(peer) = entry.value().upgrade() {
                peer.connections.remove(self.address());
            }
        }
        self.inner.connections.clear();
    }

    /// The hosted hub for `address`, created with `configure` on first use.
    ///
    /// The hosted hub's address is `address` re-rooted under this hub.
    pub fn get_hosted_hub<F>(&self, address: &Address, configure: F) -> Hub
    where
        F: FnOnce(&Address) -> HubConfiguration,
    {
        let address = address.clone().hosted(self.address());
        self.inner.hosted.get_or_create(address, |address| {
            let configuration = configure(&address);
            Hub::start(address, Some(self), configuration, Arc::clone(&self.inner.settings))
        })
    }

    /// The existing hosted hub for `address`, if any.
    pub fn hosted_hub(&self, address: &Address) -> Option<Hub> {
        self.inner
            .hosted
            .get(&address.clone().hosted(self.address()))
    }

    pub fn hosted_count(&self) -> usize {
        self.inner.hosted.len()
    }

    /// Links this hub and `other` so each can route deliveries to the other.
    pub fn connect_to(&self, other: &Hub) {
        if self == other {
            return;
        }
        self.inner
            .connections
            .insert(other.address().clone(), Arc::downgrade(&other.inner));
        other
            .inner
            .connections
            .insert(self.address().clone(), Arc::downgrade(&self.inner));
        debug!(hub = %self.address(), peer = %other.address(), "Hubs connected");
    }

    /// Tears down the link to `other`, removing each hub from the other's
    /// subscriber and subscription sets.
    pub fn disconnect(&self, other: &Hub) {
        let notice = MessageDelivery::new(
            Arc::new(Disconnect),
            Some(self.address().clone()),
            Some(other.address().clone()),
        );
        other.deliver_message(notice);

        let hub = self.clone();
        let peer = other.address().clone();
        self.schedule(async move {
            hub.forget(&peer);
            debug!(hub = %hub.address(), %peer, "Hubs disconnected");
            Ok(())
        });
    }

    fn forget(&self, peer: &Address) {
        if let Some(fan_out) = &self.inner.fan_out {
            fan_out.lock().remove(peer);
        }
        self.inner.connections.remove(peer);
    }

    /// Hubs that have sent to this hub. Empty unless fan-out is enabled.
    pub fn subscribers(&self) -> Vec<Address> {
        self.inner
            .fan_out
            .as_ref()
            .map(|fan_out| fan_out.lock().subscribers().iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Hubs this hub has sent to. Empty unless fan-out is enabled.
    pub fn subscriptions(&self) -> Vec<Address> {
        self.inner
            .fan_out
            .as_ref()
            .map(|fan_out| fan_out.lock().subscriptions().iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Stores `value` under its type and `context`, returning the value it replaced.
    pub fn set<T: Any + Send + Sync>(&self, value: T, context: &str) -> Option<Arc<T>> {
        self.inner.properties.set(value, context)
    }

    /// The value stored under `T` and `context`.
    pub fn get<T: Any + Send + Sync>(&self, context: &str) -> Option<Arc<T>> {
        self.inner.properties.get(context)
    }

    pub fn remove<T: Any + Send + Sync>(&self, context: &str) -> Option<Arc<T>> {
        self.inner.properties.remove(context)
    }

    /// Attaches `plugin` to the running hub.
    ///
    /// Its rules are appended to a copy of the registry and swapped in on the
    /// hub's queue, so deliveries already being handled keep the old rules.
    pub fn add_plugin<P: HubPlugin>(&self, plugin: P) -> bool {
        let plugin: Arc<dyn HubPlugin> = Arc::new(plugin);
        let hub = self.clone();
        self.schedule(async move {
            {
                let mut registry = hub.inner.registry.write();
                let mut extended = (**registry).clone();
                plugin.register(&mut extended);
                *registry = Arc::new(extended);
            }
            plugin
                .initialize(&hub)
                .await
                .with_context(|| format!("plugin {} failed to initialize", plugin.name()))?;
            hub.inner.plugins.lock().push(plugin);
            Ok(())
        })
    }

    /// Number of requests waiting for a response at this hub.
    pub fn pending_callbacks(&self) -> usize {
        self.inner.callbacks.len()
    }

    fn schedule_dispatch(&self, delivery: MessageDelivery) {
        let hub = self.clone();
        let id = delivery.id().to_string();
        let scheduled = self.inner.queue.schedule(async move {
            hub.dispatch(delivery).await;
            Ok(())
        });
        if !scheduled {
            warn!(hub = %self.address(), %id, "Hub is closed, dropping delivery");
        }
    }

    #[instrument(level = "trace", skip_all, fields(hub = %self.inner.address, id = %delivery.id()))]
    async fn dispatch(&self, delivery: MessageDelivery) -> MessageDelivery {
        let local = delivery.is_for(self.address());
        self.track_fan_out(&delivery, local);

        let mut delivery = delivery;
        if local {
            delivery = self.handle_system_message(delivery);
        }

        let registry = Arc::clone(&*self.inner.registry.read());
        let delivery = registry.dispatch(self, delivery).await;
        let delivery = self.route_onward(delivery);
        self.report_failure(&delivery);
        trace!(state = %delivery.state(), "Dispatch complete");
        delivery
    }

    fn handle_system_message(&self, delivery: MessageDelivery) -> MessageDelivery {
        if delivery.is::<DisposeRequest>() {
            let hub = self.clone();
            tokio::spawn(async move { hub.dispose().await });
            return delivery.processed();
        }
        if delivery.is::<Disconnect>() {
            if let Some(sender) = delivery.sender() {
                self.forget(sender);
            }
            return delivery.processed();
        }
        delivery
    }

    fn track_fan_out(&self, delivery: &MessageDelivery, local: bool) {
        let Some(fan_out) = &self.inner.fan_out else {
            return;
        };
        let me = self.address();
        if local {
            let sender = delivery
                .sender()
                .filter(|sender| *sender != me && !sender.is_fan_out());
            if let Some(sender) = sender {
                if !delivery.is::<Disconnect>() {
                    fan_out.lock().on_received(sender);
                }
            }
        } else if delivery.sender() == Some(me) {
            if let Some(target) = delivery.target().filter(|target| !target.is_fan_out()) {
                fan_out.lock().on_sent(target);
            }
        }
    }

    /// Hands a delivery addressed elsewhere to the next hub on its way.
    fn route_onward(&self, delivery: MessageDelivery) -> MessageDelivery {
        let Some(target) = delivery.target().cloned() else {
            return delivery;
        };
        if &target == self.address() || delivery.state() != DeliveryState::Submitted {
            return delivery;
        }
        if target.is_fan_out() {
            return self.fan_out(delivery, &target);
        }
        match self.next_hop(&target, &delivery) {
            Some(next) => self.forward(delivery, &next),
            None => {
                let error = HubError::Routing {
                    id: delivery.id().to_string(),
                    reason: format!("no route from {} to {}", self.address(), target),
                };
                delivery.not_found(error)
            }
        }
    }

    /// A hosted hub on the target's lineage, else a connected peer on it,
    /// else the parent unless the target lies below this hub. Hubs the
    /// delivery already visited are skipped.
    fn next_hop(&self, target: &Address, delivery: &MessageDelivery) -> Option<Hub> {
        let me = self.address();
        let unvisited = |hub: &Hub| !delivery.was_forwarded_to(hub.address());

        let hosted = target
            .lineage()
            .filter(|address| address.is_hosted_by(me))
            .find_map(|address| self.inner.hosted.get(address))
            .filter(unvisited);
        if hosted.is_some() {
            return hosted;
        }

        let peer = target
            .lineage()
            .find_map(|address| {
                self.inner
                    .connections
                    .get(address)
                    .and_then(|peer| peer.value().upgrade())
            })
            .map(|inner| Hub { inner })
            .filter(unvisited);
        if peer.is_some() {
            return peer;
        }

        if target.lineage().any(|address| address == me) {
            return None;
        }
        self.parent().filter(unvisited)
    }

    /// Delivers `delivery` to `next`, recording both hubs as visited.
    fn forward(&self, delivery: MessageDelivery, next: &Hub) -> MessageDelivery {
        let delivery = delivery
            .with_forwarded_to(self.address().clone())
            .with_forwarded_to(next.address().clone());
        trace!(from = %self.address(), to = %next.address(), id = %delivery.id(), "Forwarding delivery");
        let handed = next.deliver_message(delivery.clone());
        if handed.state() == DeliveryState::Failed {
            return delivery.failed(handed.error().unwrap_or("forwarding failed"));
        }
        delivery.forwarded()
    }

    fn fan_out(&self, delivery: MessageDelivery, target: &Address) -> MessageDelivery {
        let Some(fan_out) = &self.inner.fan_out else {
            let error = HubError::Routing {
                id: delivery.id().to_string(),
                reason: format!("fan-out is not enabled on {}", self.address()),
            };
            return delivery.not_found(error);
        };
        if delivery.sender() != Some(self.address()) {
            let error = HubError::Routing {
                id: delivery.id().to_string(),
                reason: format!("{target} only accepts deliveries posted by {}", self.address()),
            };
            return delivery.failed(error);
        }

        let recipients = fan_out.lock().recipients(target);
        debug!(hub = %self.address(), %target, count = recipients.len(), "Fanning out delivery");
        for recipient in recipients {
            let copy = self.route_onward(delivery.redirect(self.address().clone(), recipient));
            if matches!(copy.state(), DeliveryState::Failed | DeliveryState::NotFound) {
                warn!(id = %copy.id(), target = ?copy.target(), "Fan-out copy not delivered");
            }
        }
        delivery.forwarded()
    }

    /// Logs an unhandled delivery and answers its requester, if one is waiting.
    fn report_failure(&self, delivery: &MessageDelivery) {
        if !matches!(delivery.state(), DeliveryState::Failed | DeliveryState::NotFound) {
            return;
        }
        let reason = delivery.error().unwrap_or("unknown failure");
        warn!(hub = %self.address(), id = %delivery.id(), state = %delivery.state(), reason, "Delivery not handled");
        if !delivery.expects_response() {
            return;
        }
        let Some(requester) = delivery.sender().cloned() else {
            return;
        };
        let failure = DeliveryFailure::new(
            delivery.id().to_string(),
            delivery.message().type_name(),
            reason.to_string(),
        );
        self.post(failure, PostOptions::to(requester).in_response_to(delivery.id()));
    }
}

impl PartialEq for Hub {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Hub {}

impl fmt::Debug for Hub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hub")
            .field("address", &self.inner.address)
            .field("hosted", &self.inner.hosted.len())
            .field("deferrals", &self.inner.deferrals.active())
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

assert_impl_all!(Hub: Send, Sync, Clone);
