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

use std::time::Duration;

use thiserror::Error;

use crate::message::Address;

/// Errors surfaced by hub operations.
///
/// Handler and job bodies return [`anyhow::Result`]; their failures reach
/// callers only as envelope state. `HubError` is what the hub itself reports.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HubError {
    /// No correlated response arrived before the deadline.
    #[error("no response to request {request_id} within {timeout:?}")]
    Timeout {
        /// Id of the request.
        request_id: String,
        /// The deadline that elapsed.
        timeout: Duration,
    },

    /// The caller's cancellation token fired before a response arrived.
    #[error("request {request_id} was cancelled")]
    Cancelled {
        /// Id of the request.
        request_id: String,
    },

    /// No route exists for a delivery, or a fan-out target was misused.
    #[error("cannot route delivery {id}: {reason}")]
    Routing {
        /// Id of the delivery.
        id: String,
        /// Why routing failed.
        reason: String,
    },

    /// The request failed at the hub that handled it.
    #[error("delivery {id} failed: {reason}")]
    DeliveryFailed {
        /// Id of the request.
        id: String,
        /// Failure text reported by the handling hub.
        reason: String,
    },

    /// The response payload was not of the expected type.
    #[error("expected a {expected} response, got {actual}")]
    UnexpectedResponse {
        /// Expected payload type.
        expected: &'static str,
        /// Payload type that arrived.
        actual: &'static str,
    },

    /// The hub no longer accepts deliveries.
    #[error("hub {0} is disposed")]
    Disposed(Address),

    /// A handler rule returned an error or panicked.
    #[error("handler failed: {0}")]
    Handler(String),

    /// The hub was disposed while the request was outstanding.
    #[error("callback for request {request_id} was dropped before a response arrived")]
    CallbackDropped {
        /// Id of the request.
        request_id: String,
    },

    /// Disposing the runtime's hubs took longer than allowed.
    #[error("shutdown did not complete within {timeout:?}")]
    ShutdownTimeout {
        /// The deadline that elapsed.
        timeout: Duration,
    },
}
