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

//! Type aliases shared across the hub implementation.

use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::hub::Hub;
use crate::message::MessageDelivery;

/// Future returned by handler rules: resolves to the envelope the next rule sees.
pub type HandlerFuture = Pin<Box<dyn Future<Output = anyhow::Result<MessageDelivery>> + Send + 'static>>;

/// A unit of work on a hub's execution queue.
pub type Job = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'static>>;

/// Decides whether a delivery is held back or handled.
pub type DeliveryPredicate = Arc<dyn Fn(&MessageDelivery) -> bool + Send + Sync + 'static>;

/// A rule operating on the untyped envelope.
pub(crate) type EnvelopeHandler = Arc<dyn Fn(Hub, MessageDelivery) -> HandlerFuture + Send + Sync + 'static>;

/// A rule receiving a view of the payload projected through the message lineage.
pub(crate) type ProjectedHandler =
    Arc<dyn Fn(Hub, MessageDelivery, &dyn Any) -> HandlerFuture + Send + Sync + 'static>;

/// Terminal consumer of the deferral chain.
pub(crate) type DeliverySink = Arc<dyn Fn(MessageDelivery) + Send + Sync + 'static>;

/// Action run once when a hub starts, before its initial deferral is released.
pub(crate) type BuildupAction = Box<dyn FnOnce(Hub) -> Job + Send + 'static>;

/// Renders a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}
