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

//! Messages the hub runtime itself posts or reacts to.

use derive_new::new;

/// Posted back to a requester when its request could not be handled.
///
/// Carries the `RequestId` of the failed request, so an outstanding
/// [`await_response`](crate::hub::Hub::await_response) resolves with
/// [`HubError::DeliveryFailed`](crate::common::HubError::DeliveryFailed)
/// instead of waiting for its timeout.
#[derive(new, Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    /// Id of the request that failed.
    pub delivery_id: String,
    /// Rust type name of the request payload.
    pub message_type: &'static str,
    /// Failure text.
    pub reason: String,
}

/// Asks the receiving hub to dispose itself.
///
/// The dispose runs outside the hub's execution queue, so a hub may post this
/// to itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisposeRequest;

/// Removes the sender from the receiving hub's subscriber and subscription sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Disconnect;
