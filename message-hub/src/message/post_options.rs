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

use std::collections::BTreeMap;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::message::{properties, Address};

/// Build parameters for a new envelope.
///
/// Consumed by [`Hub::post`](crate::hub::Hub::post) and
/// [`Hub::await_response`](crate::hub::Hub::await_response). Unset fields fall
/// back to the posting hub: its address becomes the sender and a missing
/// target means "deliver to the posting hub itself".
///
/// ```rust,ignore
/// let options = PostOptions::to(worker.address().clone())
///     .with_property("tenant", "acme")
///     .with_timeout(Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PostOptions {
    pub(crate) sender: Option<Address>,
    pub(crate) target: Option<Address>,
    pub(crate) properties: BTreeMap<String, String>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) cancellation: Option<CancellationToken>,
}

impl PostOptions {
    /// Options targeting `target`.
    pub fn to(target: Address) -> Self {
        Self::default().with_target(target)
    }

    /// Overrides the target.
    #[must_use]
    pub fn with_target(mut self, target: Address) -> Self {
        self.target = Some(target);
        self
    }

    /// Overrides the sender, which otherwise is the posting hub.
    #[must_use]
    pub fn with_sender(mut self, sender: Address) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Adds one property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Adds every property from `properties`, overwriting existing keys.
    #[must_use]
    pub fn with_properties<I, K, V>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.properties
            .extend(properties.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Marks the new envelope as the response to the delivery with `request_id`.
    #[must_use]
    pub fn in_response_to(self, request_id: impl Into<String>) -> Self {
        self.with_property(properties::REQUEST_ID, request_id)
    }

    /// Deadline for awaiting a correlated response.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Cancels an awaited response when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// The explicit target, if any.
    pub fn target(&self) -> Option<&Address> {
        self.target.as_ref()
    }
}
