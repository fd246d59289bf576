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

//! Helpers behind the routing rules of [`HubConfiguration`](crate::hub::HubConfiguration).

use anyhow::bail;
use futures::future::BoxFuture;
use tracing::{debug, trace};

use crate::common::HubError;
use crate::hub::{Hub, HubConfiguration};
use crate::message::{Address, DeliveryFailure, DeliveryState, MessageDelivery, PostOptions};

/// The first address on the target's lineage of `kind` that is neither `hub`
/// nor visited by the delivery.
pub(crate) fn match_address(hub: &Hub, delivery: &MessageDelivery, kind: &str) -> Option<Address> {
    let target = delivery.target()?;
    if target == hub.address() || target.is_fan_out() {
        return None;
    }
    target
        .lineage()
        .find(|address| {
            address.kind() == kind && *address != hub.address() && !delivery.was_forwarded_to(address)
        })
        .cloned()
}

/// Hands `delivery` to the hosted hub for `matched`, creating it if needed.
pub(crate) fn forward_to_hosted<C>(
    hub: &Hub,
    matched: &Address,
    delivery: MessageDelivery,
    configure: C,
) -> anyhow::Result<()>
where
    C: FnOnce(&Address) -> HubConfiguration,
{
    let hosted = hub.get_hosted_hub(matched, configure);
    let mut delivery = delivery;
    if delivery.target() == Some(matched) && matched != hosted.address() {
        delivery = delivery.with_target(hosted.address().clone());
    }
    let delivery = delivery
        .with_forwarded_to(hub.address().clone())
        .with_forwarded_to(hosted.address().clone());
    trace!(from = %hub.address(), to = %hosted.address(), id = %delivery.id(), "Routing to hosted hub");

    let handed = hosted.deliver_message(delivery);
    if handed.state() == DeliveryState::Failed {
        bail!(
            "hosted hub {} rejected delivery {}: {}",
            hosted.address(),
            handed.id(),
            handed.error().unwrap_or_default()
        );
    }
    Ok(())
}

/// Re-posts a delivery addressed to `hub` towards `destination`.
///
/// Requests travel on under `hub`'s name and their response is relayed
/// back to the original requester.
pub(crate) fn forward_message(hub: &Hub, delivery: MessageDelivery, destination: Address) -> MessageDelivery {
    if &destination == hub.address() || delivery.was_forwarded_to(&destination) {
        trace!(id = %delivery.id(), %destination, "Not re-posting to a visited address");
        return delivery;
    }

    if delivery.expects_response() {
        let redirected = delivery.redirect(hub.address().clone(), destination.clone());
        let timeout = hub.settings().callback_timeout();
        let pending = hub.callbacks().register(redirected.id(), timeout, None);
        tokio::spawn(way_back(hub.clone(), delivery.clone(), pending));
        hub.deliver_message(redirected);
    } else {
        let sender = delivery
            .sender()
            .cloned()
            .unwrap_or_else(|| hub.address().clone());
        hub.deliver_message(delivery.redirect(sender, destination.clone()));
    }
    debug!(hub = %hub.address(), id = %delivery.id(), %destination, "Message re-posted");
    delivery.with_forwarded_to(destination).forwarded()
}

/// Relays the response to a re-posted request back to whoever sent the original.
async fn way_back(
    hub: Hub,
    request: MessageDelivery,
    pending: BoxFuture<'static, Result<MessageDelivery, HubError>>,
) {
    let Some(origin) = request.sender().cloned() else {
        trace!(request = %request.id(), "Request has no sender, dropping way-back response");
        return;
    };
    match pending.await {
        Ok(response) => {
            let options = PostOptions::to(origin)
                .with_properties(response.properties().clone())
                .in_response_to(request.id());
            let relayed = MessageDelivery::from_options(response.shared_message(), hub.address(), options);
            trace!(request = %request.id(), response = %relayed.id(), "Relaying response on the way back");
            hub.deliver_message(relayed);
        }
        Err(error) => {
            debug!(request = %request.id(), "Way-back route failed: {}", error);
            let failure = DeliveryFailure::new(
                request.id().to_string(),
                request.message().type_name(),
                error.to_string(),
            );
            hub.post(failure, PostOptions::to(origin).in_response_to(request.id()));
        }
    }
}
