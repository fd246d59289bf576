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

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::join_all;
use tracing::{debug, error, instrument, trace};

use crate::common::{HubError, HubSettings};
use crate::hub::{Hub, HubConfiguration};
use crate::message::Address;

/// Owns the root hubs of an application.
///
/// Created by [`HubApp`](crate::common::HubApp). Clones share the same roots.
#[derive(Debug, Clone)]
pub struct HubRuntime {
    inner: Arc<RuntimeInner>,
}

#[derive(Debug)]
struct RuntimeInner {
    roots: DashMap<Address, Hub>,
    settings: Arc<HubSettings>,
}

impl HubRuntime {
    pub(crate) fn new(settings: HubSettings) -> Self {
        Self {
            inner: Arc::new(RuntimeInner {
                roots: DashMap::new(),
                settings: Arc::new(settings),
            }),
        }
    }

    /// Creates and starts a root hub at `address`.
    ///
    /// If a root already exists at that address it is returned and
    /// `configuration` is discarded.
    #[instrument(skip(self, configuration))]
    pub fn create_hub(&self, address: Address, configuration: HubConfiguration) -> Hub {
        self.inner
            .roots
            .entry(address.clone())
            .or_insert_with(|| {
                trace!("Starting root hub");
                Hub::start(address, None, configuration, Arc::clone(&self.inner.settings))
            })
            .clone()
    }

    /// Creates a root hub at the configured default root address.
    pub fn create_default_hub(&self, configuration: HubConfiguration) -> Hub {
        self.create_hub(self.inner.settings.root_address(), configuration)
    }

    /// The root hub at `address`, if one was created.
    pub fn root(&self, address: &Address) -> Option<Hub> {
        self.inner.roots.get(address).map(|entry| entry.value().clone())
    }

    #[inline]
    #[must_use]
    pub fn hub_count(&self) -> usize {
        self.inner.roots.len()
    }

    /// Settings shared by every hub of this runtime.
    pub fn settings(&self) -> &HubSettings {
        &self.inner.settings
    }

    /// Disposes every root hub, and with them all hosted hubs.
    ///
    /// Roots are disposed concurrently. Fails with
    /// [`HubError::ShutdownTimeout`] if disposal outlasts the configured
    /// dispose timeout.
    #[instrument(skip(self))]
    pub async fn shutdown_all(&self) -> Result<(), HubError> {
        let roots: Vec<Hub> = self
            .inner
            .roots
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        debug!(count = roots.len(), "Disposing root hubs");

        let timeout = self.inner.settings.dispose_timeout();
        let disposals = join_all(roots.iter().map(Hub::dispose));
        if tokio::time::timeout(timeout, disposals).await.is_err() {
            error!(?timeout, "Root hubs did not dispose in time");
            return Err(HubError::ShutdownTimeout { timeout });
        }

        for root in &roots {
            self.inner.roots.remove(root.address());
        }
        trace!("All root hubs disposed");
        Ok(())
    }
}
