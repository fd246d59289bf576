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

use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use futures::future::join_all;
use tracing::{debug, trace};

use crate::hub::Hub;
use crate::message::Address;

/// Child hubs of a hub, keyed by address and created on first use.
#[derive(Debug, Default)]
pub(crate) struct HostedHubs {
    hubs: DashMap<Address, Arc<OnceLock<Hub>>>,
}

impl HostedHubs {
    /// The child at `address`, constructing it with `create` if it does not
    /// exist yet. Concurrent callers for one address get the same hub.
    ///
    /// `create` runs outside the map's locks, so it may look up or create
    /// other children of the same host.
    pub(crate) fn get_or_create(&self, address: Address, create: impl FnOnce(Address) -> Hub) -> Hub {
        let slot = Arc::clone(&self.hubs.entry(address.clone()).or_default());
        slot.get_or_init(|| {
            let hub = create(address);
            trace!(address = %hub.address(), "Hosted hub created");
            hub
        })
        .clone()
    }

    pub(crate) fn get(&self, address: &Address) -> Option<Hub> {
        self.hubs
            .get(address)
            .and_then(|entry| entry.value().get().cloned())
    }

    pub(crate) fn remove(&self, address: &Address) -> Option<Hub> {
        self.hubs
            .remove(address)
            .and_then(|(_, slot)| slot.get().cloned())
    }

    pub(crate) fn len(&self) -> usize {
        self.hubs
            .iter()
            .filter(|entry| entry.value().get().is_some())
            .count()
    }

    fn snapshot(&self) -> Vec<Hub> {
        self.hubs
            .iter()
            .filter_map(|entry| entry.value().get().cloned())
            .collect()
    }

    /// Settles every child, see [`Hub::settle`]. Returns whether any of them
    /// had work.
    pub(crate) async fn settle(&self) -> bool {
        let children = self.snapshot();
        let busy = join_all(children.iter().map(Hub::settle))
            .await
            .into_iter()
            .filter(|busy| *busy)
            .count();
        if busy > 0 {
            trace!(busy, "Hosted hubs still busy");
        }
        busy > 0
    }

    /// Disposes every child concurrently, removing each as it completes.
    pub(crate) async fn dispose_all(&self) {
        let children = self.snapshot();
        join_all(children.iter().map(|child| async move {
            child.dispose().await;
            self.remove(child.address());
            debug!(address = %child.address(), "Hosted hub disposed");
        }))
        .await;
    }
}
