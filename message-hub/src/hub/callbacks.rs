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

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::common::HubError;
use crate::message::MessageDelivery;

/// Outstanding requests of a hub, keyed by request id.
///
/// Each entry resolves exactly once: the response path and the
/// timeout/cancellation path both have to remove the entry before acting, so
/// whichever loses the race does nothing.
#[derive(Default)]
pub(crate) struct CallbackTable {
    pending: Mutex<HashMap<Arc<str>, oneshot::Sender<MessageDelivery>>>,
}

/// Removes the entry if the waiting future is dropped early.
struct Registration {
    table: Arc<CallbackTable>,
    request_id: Arc<str>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.table.remove(&self.request_id);
    }
}

impl CallbackTable {
    /// Registers interest in the response to `request_id`.
    ///
    /// The entry is in place when this returns, so the request may be sent
    /// right after. The future resolves with the response envelope, or fails
    /// on timeout, cancellation, or when the table is cleared.
    pub(crate) fn register(
        self: &Arc<Self>,
        request_id: &str,
        timeout: Duration,
        cancellation: Option<CancellationToken>,
    ) -> BoxFuture<'static, Result<MessageDelivery, HubError>> {
        let request_id: Arc<str> = request_id.into();
        let (sender, mut receiver) = oneshot::channel();
        self.pending.lock().insert(Arc::clone(&request_id), sender);
        trace!(request = %request_id, ?timeout, "Callback registered");

        let registration = Registration {
            table: Arc::clone(self),
            request_id,
        };
        let cancellation = cancellation.unwrap_or_default();

        async move {
            let id = registration.request_id.to_string();
            let outcome = tokio::select! {
                biased;
                response = &mut receiver => {
                    return response.map_err(|_| HubError::CallbackDropped { request_id: id });
                }
                () = tokio::time::sleep(timeout) => HubError::Timeout { request_id: id.clone(), timeout },
                () = cancellation.cancelled() => HubError::Cancelled { request_id: id.clone() },
            };

            if registration.table.remove(&registration.request_id) {
                debug!(request = %id, "Callback abandoned: {}", outcome);
                Err(outcome)
            } else {
                // The response claimed the entry first and is being delivered.
                receiver
                    .await
                    .map_err(|_| HubError::CallbackDropped { request_id: id })
            }
        }
        .boxed()
    }

    /// Completes the callback the response `delivery` correlates to.
    ///
    /// Returns `false` for deliveries that are not responses or whose request
    /// already completed.
    pub(crate) fn resolve(&self, delivery: &MessageDelivery) -> bool {
        let Some(request_id) = delivery.request_id() else {
            return false;
        };
        let Some(sender) = self.pending.lock().remove(request_id) else {
            trace!(request = request_id, "No callback waiting, ignoring response");
            return false;
        };
        if sender.send(delivery.clone()).is_err() {
            trace!(request = request_id, "Callback waiter went away");
        }
        true
    }

    /// Drops every outstanding callback; their waiters fail with
    /// [`HubError::CallbackDropped`].
    pub(crate) fn clear(&self) -> usize {
        let drained: Vec<_> = self.pending.lock().drain().collect();
        drained.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.lock().len()
    }

    fn remove(&self, request_id: &str) -> bool {
        self.pending.lock().remove(request_id).is_some()
    }
}
