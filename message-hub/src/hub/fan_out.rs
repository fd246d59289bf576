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

use std::collections::BTreeSet;

use tracing::trace;

use crate::message::{Address, SUBSCRIBERS_KIND, SUBSCRIPTIONS_KIND};

/// Implicit publish/subscribe bookkeeping of a hub.
///
/// Hubs that send to this hub become subscribers; hubs this hub sends to
/// become subscriptions. An address is never in both sets, which keeps two
/// hubs from fanning out to each other in a cycle.
#[derive(Debug, Default)]
pub(crate) struct FanOut {
    subscribers: BTreeSet<Address>,
    subscriptions: BTreeSet<Address>,
}

impl FanOut {
    /// Records a delivery received from `sender`.
    pub(crate) fn on_received(&mut self, sender: &Address) -> bool {
        if self.subscriptions.contains(sender) {
            return false;
        }
        let added = self.subscribers.insert(sender.clone());
        if added {
            trace!(%sender, "Subscriber added");
        }
        added
    }

    /// Records a delivery sent to `target`.
    pub(crate) fn on_sent(&mut self, target: &Address) -> bool {
        if self.subscribers.contains(target) {
            return false;
        }
        let added = self.subscriptions.insert(target.clone());
        if added {
            trace!(%target, "Subscription added");
        }
        added
    }

    /// Forgets `address` in both directions.
    pub(crate) fn remove(&mut self, address: &Address) {
        self.subscribers.remove(address);
        self.subscriptions.remove(address);
    }

    /// Recipients for a delivery targeting one of the fan-out pseudo-addresses.
    pub(crate) fn recipients(&self, target: &Address) -> Vec<Address> {
        match target.kind() {
            SUBSCRIBERS_KIND => self.subscribers.iter().cloned().collect(),
            SUBSCRIPTIONS_KIND => self.subscriptions.iter().cloned().collect(),
            _ => Vec::new(),
        }
    }

    pub(crate) fn subscribers(&self) -> &BTreeSet<Address> {
        &self.subscribers
    }

    pub(crate) fn subscriptions(&self) -> &BTreeSet<Address> {
        &self.subscriptions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_peer_is_never_both_subscriber_and_subscription() {
        let peer = Address::new("app", "peer");
        let mut fan_out = FanOut::default();

        assert!(fan_out.on_received(&peer));
        assert!(!fan_out.on_sent(&peer));
        assert!(fan_out.subscribers().contains(&peer));
        assert!(fan_out.subscriptions().is_empty());
    }

    #[test]
    fn recipients_follow_the_pseudo_target() {
        let a = Address::new("app", "a");
        let b = Address::new("app", "b");
        let mut fan_out = FanOut::default();
        fan_out.on_received(&a);
        fan_out.on_sent(&b);

        assert_eq!(fan_out.recipients(&Address::subscribers()), vec![a.clone()]);
        assert_eq!(fan_out.recipients(&Address::subscriptions()), vec![b.clone()]);

        fan_out.remove(&a);
        assert!(fan_out.recipients(&Address::subscribers()).is_empty());
    }
}
