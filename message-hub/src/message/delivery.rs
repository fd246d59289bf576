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

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use static_assertions::assert_impl_all;
use tracing::trace;
use uuid::Uuid;

use crate::message::{properties, Address, Delivery, PostOptions};
use crate::traits::HubMessage;

/// Processing state of a [`MessageDelivery`].
///
/// States only move forward: `Submitted`, then `Forwarded`, then one of the
/// terminal states. A transition that would move backwards is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryState {
    /// Accepted, not yet handled.
    Submitted,
    /// Handled locally.
    Processed,
    /// Handed on to another hub.
    Forwarded,
    /// A handler or route failed; see [`MessageDelivery::error`].
    Failed,
    /// No hub could be found for the target.
    NotFound,
}

impl DeliveryState {
    const fn rank(self) -> u8 {
        match self {
            Self::Submitted => 0,
            Self::Forwarded => 1,
            Self::Processed | Self::Failed | Self::NotFound => 2,
        }
    }

    /// Whether no further handling is expected.
    pub const fn is_terminal(self) -> bool {
        self.rank() == 2
    }
}

impl fmt::Display for DeliveryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Submitted => "submitted",
            Self::Processed => "processed",
            Self::Forwarded => "forwarded",
            Self::Failed => "failed",
            Self::NotFound => "not found",
        };
        f.write_str(name)
    }
}

#[derive(Clone)]
struct AccessTag {
    object: Arc<dyn Any + Send + Sync>,
    provided_by: Address,
}

/// The immutable envelope every message travels in.
///
/// Envelopes are values: every "with" method and state transition returns a
/// new envelope that shares the payload and keeps the same [`id`](Self::id)
/// and the accumulated [`forwarded_to`](Self::forwarded_to) set. Cloning is
/// cheap.
#[derive(Clone)]
pub struct MessageDelivery {
    id: Arc<str>,
    sender: Option<Address>,
    target: Option<Address>,
    message: Arc<dyn HubMessage>,
    state: DeliveryState,
    properties: Arc<BTreeMap<String, String>>,
    forwarded_to: Arc<BTreeSet<Address>>,
    access: Option<AccessTag>,
    error: Option<Arc<str>>,
}

impl MessageDelivery {
    /// Wraps `message` in a new `Submitted` envelope with a fresh id.
    pub fn new(message: Arc<dyn HubMessage>, sender: Option<Address>, target: Option<Address>) -> Self {
        Self {
            id: Uuid::new_v4().to_string().into(),
            sender,
            target,
            message,
            state: DeliveryState::Submitted,
            properties: Arc::default(),
            forwarded_to: Arc::default(),
            access: None,
            error: None,
        }
    }

    /// Builds an envelope from post options, defaulting the sender to `poster`.
    pub(crate) fn from_options(message: Arc<dyn HubMessage>, poster: &Address, options: PostOptions) -> Self {
        let sender = options.sender.unwrap_or_else(|| poster.clone());
        let mut delivery = Self::new(message, Some(sender), options.target);
        delivery.properties = Arc::new(options.properties);
        delivery
    }

    /// A new envelope for the same payload, sent by `sender` to `target`.
    ///
    /// Used when a route re-posts a message or fans it out: the result has a
    /// fresh id, `Submitted` state and an empty forwarding history, and keeps
    /// the properties.
    pub(crate) fn redirect(&self, sender: Address, target: Address) -> Self {
        Self {
            id: Uuid::new_v4().to_string().into(),
            sender: Some(sender),
            target: Some(target),
            message: Arc::clone(&self.message),
            state: DeliveryState::Submitted,
            properties: Arc::clone(&self.properties),
            forwarded_to: Arc::default(),
            access: None,
            error: None,
        }
    }

    /// Unique identity, stable across forwards and state transitions.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The sending hub.
    #[inline]
    pub fn sender(&self) -> Option<&Address> {
        self.sender.as_ref()
    }

    /// The target hub; `None` means the hub the envelope is delivered to.
    #[inline]
    pub fn target(&self) -> Option<&Address> {
        self.target.as_ref()
    }

    /// The payload.
    #[inline]
    pub fn message(&self) -> &dyn HubMessage {
        &*self.message
    }

    /// The shared payload.
    #[inline]
    pub fn shared_message(&self) -> Arc<dyn HubMessage> {
        Arc::clone(&self.message)
    }

    /// The payload's concrete type.
    #[inline]
    pub fn message_type_id(&self) -> TypeId {
        self.message().as_any().type_id()
    }

    /// Downcasts the payload.
    pub fn message_as<T: HubMessage>(&self) -> Option<&T> {
        self.message().as_any().downcast_ref::<T>()
    }

    /// Whether the payload is a `T`.
    pub fn is<T: HubMessage>(&self) -> bool {
        self.message().as_any().is::<T>()
    }

    /// A typed view of this envelope, if the payload is a `T`.
    pub fn typed<T: HubMessage>(&self) -> Option<Delivery<T>> {
        self.shared_message()
            .into_any_arc()
            .downcast::<T>()
            .ok()
            .map(|message| Delivery::from_parts(self.clone(), message))
    }

    /// Current processing state.
    #[inline]
    pub fn state(&self) -> DeliveryState {
        self.state
    }

    /// Out-of-band metadata.
    #[inline]
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// A single property.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// The id of the request this envelope answers, if it is a response.
    pub fn request_id(&self) -> Option<&str> {
        self.property(properties::REQUEST_ID)
    }

    /// Whether the sender awaits a correlated response.
    pub fn expects_response(&self) -> bool {
        self.properties.contains_key(properties::EXPECTS_RESPONSE)
    }

    /// Addresses this envelope has already been forwarded to.
    #[inline]
    pub fn forwarded_to(&self) -> &BTreeSet<Address> {
        &self.forwarded_to
    }

    /// Whether this envelope was already forwarded to `address`.
    pub fn was_forwarded_to(&self, address: &Address) -> bool {
        self.forwarded_to.contains(address)
    }

    /// The provenance tag attached by a handler, if it is a `T`.
    pub fn access_object<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.access
            .as_ref()
            .and_then(|tag| tag.object.downcast_ref::<T>())
    }

    /// The hub that attached the provenance tag.
    pub fn access_provided_by(&self) -> Option<&Address> {
        self.access.as_ref().map(|tag| &tag.provided_by)
    }

    /// Failure text, for `Failed` and `NotFound` envelopes.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the envelope is addressed to `address`, treating an unset target as a match.
    pub fn is_for(&self, address: &Address) -> bool {
        self.target.as_ref().map_or(true, |target| target == address)
    }

    fn transition(mut self, next: DeliveryState) -> Self {
        if next.rank() >= self.state.rank() {
            self.state = next;
        } else {
            trace!(id = %self.id, from = %self.state, to = %next, "Ignoring backwards state transition");
        }
        self
    }

    /// Marks the envelope handled.
    #[must_use]
    pub fn processed(self) -> Self {
        self.transition(DeliveryState::Processed)
    }

    /// Marks the envelope handed on to another hub.
    #[must_use]
    pub fn forwarded(self) -> Self {
        self.transition(DeliveryState::Forwarded)
    }

    /// Marks the envelope failed with `error` attached.
    #[must_use]
    pub fn failed(mut self, error: impl fmt::Display) -> Self {
        self.error = Some(error.to_string().into());
        self.transition(DeliveryState::Failed)
    }

    /// Marks the envelope undeliverable with `reason` attached.
    #[must_use]
    pub fn not_found(mut self, reason: impl fmt::Display) -> Self {
        self.error = Some(reason.to_string().into());
        self.transition(DeliveryState::NotFound)
    }

    /// Records `address` in the forwarding history.
    #[must_use]
    pub fn with_forwarded_to(mut self, address: Address) -> Self {
        Arc::make_mut(&mut self.forwarded_to).insert(address);
        self
    }

    /// Replaces the target.
    #[must_use]
    pub fn with_target(mut self, target: Address) -> Self {
        self.target = Some(target);
        self
    }

    /// Replaces the sender.
    #[must_use]
    pub fn with_sender(mut self, sender: Address) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Sets one property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.properties).insert(key.into(), value.into());
        self
    }

    /// Attaches a provenance tag.
    #[must_use]
    pub fn with_access(mut self, object: impl Any + Send + Sync, provided_by: Address) -> Self {
        self.access = Some(AccessTag {
            object: Arc::new(object),
            provided_by,
        });
        self
    }
}

impl fmt::Debug for MessageDelivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageDelivery")
            .field("id", &self.id)
            .field("sender", &self.sender)
            .field("target", &self.target)
            .field("message", &self.message)
            .field("state", &self.state)
            .field("properties", &self.properties)
            .field("forwarded_to", &self.forwarded_to)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

assert_impl_all!(MessageDelivery: Send, Sync, Clone);
