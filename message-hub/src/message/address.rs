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

use static_assertions::assert_impl_all;

/// Kind of the reserved pseudo-address that fans a message out to subscribers.
pub const SUBSCRIBERS_KIND: &str = "$subscribers";
/// Kind of the reserved pseudo-address that fans a message out to subscriptions.
pub const SUBSCRIPTIONS_KIND: &str = "$subscriptions";

/// Identifies a hub.
///
/// An address is a `kind` (the address type that address routing matches on)
/// plus an `id`. A *hosted* address additionally carries the address of the
/// hub hosting it, so the full hierarchy can be recovered with
/// [`Address::lineage`].
///
/// Addresses are cheap to clone and compare by value: kind, id and host all
/// take part in equality, ordering and hashing.
///
/// ```rust,ignore
/// let root = Address::new("app", "root");
/// let worker = Address::new("worker", "1").hosted(&root);
/// assert_eq!(worker.to_string(), "app/root/worker/1");
/// assert_eq!(worker.lineage().count(), 2);
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    kind: Arc<str>,
    id: Arc<str>,
    host: Option<Arc<Address>>,
}

impl Address {
    /// Creates a top-level address.
    pub fn new(kind: impl Into<Arc<str>>, id: impl Into<Arc<str>>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
            host: None,
        }
    }

    /// Returns this address re-rooted under `host`.
    ///
    /// Any host the address already carried is replaced.
    #[must_use]
    pub fn hosted(mut self, host: &Address) -> Self {
        self.host = Some(Arc::new(host.clone()));
        self
    }

    /// The reserved target that fans a delivery out to every known subscriber.
    #[must_use]
    pub fn subscribers() -> Self {
        Self::new(SUBSCRIBERS_KIND, "")
    }

    /// The reserved target that fans a delivery out to every known subscription.
    #[must_use]
    pub fn subscriptions() -> Self {
        Self::new(SUBSCRIPTIONS_KIND, "")
    }

    /// The address type.
    #[inline]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The identifier within the address type.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The hosting hub's address, if this is a hosted address.
    #[inline]
    pub fn host(&self) -> Option<&Address> {
        self.host.as_deref()
    }

    /// Whether this address is hosted directly by `host`.
    pub fn is_hosted_by(&self, host: &Address) -> bool {
        self.host() == Some(host)
    }

    /// Whether this is one of the reserved fan-out pseudo-addresses.
    pub fn is_fan_out(&self) -> bool {
        self.host.is_none() && (&*self.kind == SUBSCRIBERS_KIND || &*self.kind == SUBSCRIPTIONS_KIND)
    }

    /// Walks the address hierarchy: this address, then its host, then the
    /// host's host, up to the top-level address.
    pub fn lineage(&self) -> impl Iterator<Item = &Address> {
        std::iter::successors(Some(self), |address| address.host())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(host) = self.host() {
            write!(f, "{host}/")?;
        }
        write!(f, "{}/{}", self.kind, self.id)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

assert_impl_all!(Address: Send, Sync, Clone);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lineage_walks_up_to_the_top_level_address() {
        let root = Address::new("app", "root");
        let worker = Address::new("worker", "1").hosted(&root);
        let task = Address::new("task", "7").hosted(&worker);

        let kinds: Vec<&str> = task.lineage().map(Address::kind).collect();
        assert_eq!(kinds, vec!["task", "worker", "app"]);
        assert!(task.is_hosted_by(&worker));
        assert!(!task.is_hosted_by(&root));
    }

    #[test]
    fn host_participates_in_equality() {
        let a = Address::new("worker", "1");
        let b = Address::new("worker", "1").hosted(&Address::new("app", "root"));
        assert_ne!(a, b);
        assert_eq!(b.to_string(), "app/root/worker/1");
    }

    #[test]
    fn fan_out_targets_are_reserved() {
        assert!(Address::subscribers().is_fan_out());
        assert!(Address::subscriptions().is_fan_out());
        assert!(!Address::new("worker", "1").is_fan_out());
    }
}
