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

use parking_lot::Mutex;
use tracing::trace;

use crate::common::{DeliveryPredicate, DeliverySink};
use crate::message::MessageDelivery;

/// Ordered set of predicate gates in front of a hub's dispatch.
///
/// A delivery walks the links from the most recently installed to the oldest.
/// The first link whose predicate matches buffers it; a delivery no link
/// matches goes to the sink. Releasing a link hands its buffer, in arrival
/// order, to the links installed before it and finally to the sink.
pub(crate) struct DeferralChain {
    shared: Arc<ChainShared>,
}

struct ChainShared {
    state: Mutex<ChainState>,
    sink: DeliverySink,
}

#[derive(Default)]
struct ChainState {
    /// Head first.
    links: Vec<Link>,
    next_id: u64,
}

struct Link {
    id: u64,
    predicate: DeliveryPredicate,
    buffer: Vec<MessageDelivery>,
}

impl DeferralChain {
    pub(crate) fn new(sink: DeliverySink) -> Self {
        Self {
            shared: Arc::new(ChainShared {
                state: Mutex::new(ChainState::default()),
                sink,
            }),
        }
    }

    /// Installs a gate at the head of the chain.
    pub(crate) fn defer(&self, predicate: DeliveryPredicate) -> DeferralHandle {
        let mut state = self.shared.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.links.insert(
            0,
            Link {
                id,
                predicate,
                buffer: Vec::new(),
            },
        );
        trace!(link = id, active = state.links.len(), "Deferral installed");
        DeferralHandle {
            shared: Arc::clone(&self.shared),
            id,
            released: false,
        }
    }

    /// Passes `delivery` through the chain.
    ///
    /// Predicates run under the chain lock and must not submit to or release
    /// from the same chain.
    pub(crate) fn submit(&self, delivery: MessageDelivery) {
        let mut state = self.shared.state.lock();
        if let Some(link) = state
            .links
            .iter_mut()
            .find(|link| (link.predicate)(&delivery))
        {
            trace!(link = link.id, id = %delivery.id(), "Delivery deferred");
            link.buffer.push(delivery);
            return;
        }
        (self.shared.sink)(delivery);
    }

    pub(crate) fn active(&self) -> usize {
        self.shared.state.lock().links.len()
    }
}

impl ChainShared {
    fn release(&self, id: u64) {
        let mut state = self.state.lock();
        let Some(position) = state.links.iter().position(|link| link.id == id) else {
            return;
        };
        let link = state.links.remove(position);
        trace!(link = id, buffered = link.buffer.len(), "Deferral released");

        // Links after `position` are the ones downstream of the released link.
        for delivery in link.buffer {
            match state.links[position..]
                .iter_mut()
                .find(|downstream| (downstream.predicate)(&delivery))
            {
                Some(downstream) => downstream.buffer.push(delivery),
                None => (self.sink)(delivery),
            }
        }
    }
}

/// Keeps a deferral gate active. Dropping it releases the gate.
#[must_use = "dropping the handle releases the deferral immediately"]
pub struct DeferralHandle {
    shared: Arc<ChainShared>,
    id: u64,
    released: bool,
}

impl DeferralHandle {
    /// Releases the gate, handing its buffered deliveries downstream in arrival order.
    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if !self.released {
            self.released = true;
            self.shared.release(self.id);
        }
    }
}

impl Drop for DeferralHandle {
    fn drop(&mut self) {
        self.release_once();
    }
}

impl fmt::Debug for DeferralHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferralHandle")
            .field("id", &self.id)
            .field("released", &self.released)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Held(u32);

    #[derive(Debug)]
    struct Passed(u32);

    fn recording_chain() -> (DeferralChain, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let chain = DeferralChain::new(Arc::new(move |delivery: MessageDelivery| {
            let label = if let Some(Held(n)) = delivery.message_as::<Held>() {
                format!("held-{n}")
            } else if let Some(Passed(n)) = delivery.message_as::<Passed>() {
                format!("passed-{n}")
            } else {
                "other".to_string()
            };
            sink_seen.lock().push(label);
        }));
        (chain, seen)
    }

    fn delivery<T: crate::traits::HubMessage>(message: T) -> MessageDelivery {
        MessageDelivery::new(Arc::new(message), None, None)
    }

    fn holds<T: crate::traits::HubMessage>() -> DeliveryPredicate {
        Arc::new(|delivery: &MessageDelivery| delivery.is::<T>())
    }

    #[test]
    fn matching_deliveries_wait_for_release_in_order() {
        let (chain, seen) = recording_chain();
        let gate = chain.defer(holds::<Held>());

        chain.submit(delivery(Held(1)));
        chain.submit(delivery(Passed(1)));
        chain.submit(delivery(Held(2)));
        assert_eq!(*seen.lock(), vec!["passed-1"]);

        gate.release();
        assert_eq!(*seen.lock(), vec!["passed-1", "held-1", "held-2"]);
        assert_eq!(chain.active(), 0);
    }

    #[test]
    fn released_items_are_rechecked_by_older_links() {
        let (chain, seen) = recording_chain();
        let older = chain.defer(holds::<Held>());
        let newer = chain.defer(holds::<Held>());

        chain.submit(delivery(Held(1)));
        drop(newer);
        assert!(seen.lock().is_empty(), "older gate still holds the delivery");

        drop(older);
        assert_eq!(*seen.lock(), vec!["held-1"]);
    }

    #[test]
    fn first_matching_link_short_circuits() {
        let (chain, seen) = recording_chain();
        let everything = chain.defer(Arc::new(|_: &MessageDelivery| true));
        let held_only = chain.defer(holds::<Held>());

        chain.submit(delivery(Held(1)));
        chain.submit(delivery(Passed(1)));

        // Held(1) sits in the newer link, so releasing the older one frees only Passed(1).
        drop(everything);
        assert_eq!(*seen.lock(), vec!["passed-1"]);

        drop(held_only);
        assert_eq!(*seen.lock(), vec!["passed-1", "held-1"]);
    }
}
