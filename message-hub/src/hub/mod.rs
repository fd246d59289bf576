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

//! Hubs and the machinery each one runs on.

pub use configuration::HubConfiguration;
pub use deferral::DeferralHandle;
pub use lineage::{MessageLineage, Projection};
pub use node::Hub;
pub use registry::HandlerRegistry;

/// Outstanding response correlations.
mod callbacks;
/// Defines [`HubConfiguration`].
mod configuration;
/// Ordered predicate buffers in front of the queue.
mod deferral;
/// The per-hub sequential job queue.
mod execution_queue;
/// Subscriber and subscription sets.
mod fan_out;
/// Child hubs keyed by address.
mod hosted;
/// Defines [`MessageLineage`].
mod lineage;
/// Defines [`Hub`].
mod node;
/// Typed per-hub values.
mod property_bag;
/// Defines [`HandlerRegistry`].
mod registry;
/// Routing rule helpers.
mod routing;
