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
use std::sync::Arc;

use crate::message::{Address, DeliveryState, MessageDelivery};
use crate::traits::HubMessage;

/// A [`MessageDelivery`] whose payload is known to be a `T`.
///
/// Handlers registered for a concrete type receive this view; transitions
/// return the untyped envelope so the dispatch fold can continue with it.
pub struct Delivery<T> {
    envelope: MessageDelivery,
    message: Arc<T>,
}

impl<T> Clone for Delivery<T> {
    fn clone(&self) -> Self {
        Self {
            envelope: self.envelope.clone(),
            message: Arc::clone(&self.message),
        }
    }
}

impl<T: HubMessage> Delivery<T> {
    pub(crate) fn from_parts(envelope: MessageDelivery, message: Arc<T>) -> Self {
        Self { envelope, message }
    }

    /// The typed payload.
    #[inline]
    pub fn message(&self) -> &T {
        &self.message
    }

    /// The shared typed payload.
    #[inline]
    pub fn shared_message(&self) -> Arc<T> {
        Arc::clone(&self.message)
    }

    /// The untyped envelope.
    #[inline]
    pub fn envelope(&self) -> &MessageDelivery {
        &self.envelope
    }

    /// Unwraps into the untyped envelope.
    #[inline]
    pub fn into_envelope(self) -> MessageDelivery {
        self.envelope
    }

    #[inline]
    pub fn id(&self) -> &str {
        self.envelope.id()
    }

    #[inline]
    pub fn sender(&self) -> Option<&Address> {
        self.envelope.sender()
    }

    #[inline]
    pub fn target(&self) -> Option<&Address> {
        self.envelope.target()
    }

    #[inline]
    pub fn state(&self) -> DeliveryState {
        self.envelope.state()
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.envelope.property(key)
    }

    /// Marks the envelope handled.
    pub fn processed(self) -> MessageDelivery {
        self.envelope.processed()
    }

    /// Marks the envelope handed on to another hub.
    pub fn forwarded(self) -> MessageDelivery {
        self.envelope.forwarded()
    }

    /// Marks the envelope failed.
    pub fn failed(self, error: impl fmt::Display) -> MessageDelivery {
        self.envelope.failed(error)
    }
}

impl<T> From<Delivery<T>> for MessageDelivery {
    fn from(delivery: Delivery<T>) -> Self {
        delivery.envelope
    }
}

impl<T> AsRef<MessageDelivery> for Delivery<T> {
    fn as_ref(&self) -> &MessageDelivery {
        &self.envelope
    }
}

impl AsRef<MessageDelivery> for MessageDelivery {
    fn as_ref(&self) -> &MessageDelivery {
        self
    }
}

impl<T: fmt::Debug> fmt::Debug for Delivery<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delivery")
            .field("id", &self.envelope.id())
            .field("state", &self.envelope.state())
            .field("message", &self.message)
            .finish()
    }
}
