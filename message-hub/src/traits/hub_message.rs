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
use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

/// A marker trait for payloads carried by a [`MessageDelivery`](crate::message::MessageDelivery).
///
/// Payloads are shared between envelopes (forwarding and fan-out reuse the
/// same allocation), so the trait requires `Send + Sync` and supports
/// downcasting through [`Any`] rather than cloning.
///
/// A blanket implementation covers every `Any + Send + Sync + Debug` type, so
/// users only derive `Debug` (or use [`hub_message`](crate::prelude::hub_message)).
///
/// When holding an `Arc<dyn HubMessage>`, call these methods through a
/// `&dyn HubMessage` (`(*arc).as_any()`); the `Arc` itself also satisfies the
/// blanket implementation.
pub trait HubMessage: Any + Send + Sync + Debug {
    /// Returns the payload as a dynamic [`Any`] reference for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Converts a shared payload into a shared [`Any`] for typed downcasting.
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// The payload's Rust type name, used in logs and error reports.
    fn type_name(&self) -> &'static str;
}

impl<T> HubMessage for T
where
    T: Any + Send + Sync + Debug,
{
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    #[inline]
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A message that expects a correlated response.
///
/// The association is what lets [`Hub::await_response`](crate::hub::Hub::await_response)
/// return a typed [`Delivery`](crate::message::Delivery) of the response.
/// `#[hub_message(response = T)]` implements it.
pub trait Request: HubMessage {
    /// The payload type the handling hub responds with.
    type Response: HubMessage;
}
