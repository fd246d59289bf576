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

//! Envelopes, addresses and the messages the runtime understands.

pub use address::{Address, SUBSCRIBERS_KIND, SUBSCRIPTIONS_KIND};
pub use delivery::{DeliveryState, MessageDelivery};
pub use post_options::PostOptions;
pub use system::{Disconnect, DeliveryFailure, DisposeRequest};
pub use typed_delivery::Delivery;

/// Defines [`Address`].
mod address;
/// Defines [`MessageDelivery`] and [`DeliveryState`].
mod delivery;
/// Defines [`PostOptions`].
mod post_options;
/// Well-known property keys.
pub mod properties;
/// Runtime messages.
mod system;
/// Defines [`Delivery`].
mod typed_delivery;
