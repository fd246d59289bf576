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

#![forbid(unsafe_code)]

//! # Message Hub
//!
//! An in-process runtime of addressable hubs exchanging immutable delivery
//! envelopes. Each hub handles its deliveries strictly one at a time on its
//! own execution queue, hosts child hubs, routes deliveries between hubs,
//! correlates requests with their responses and fans messages out to the
//! hubs it talks to.
//!
//! ## Key Concepts
//!
//! - **Hubs (`Hub`)**: Addressable nodes with a sequential execution queue,
//!   a deferral chain and an ordered set of handler rules.
//! - **Envelopes (`MessageDelivery`)**: Immutable deliveries with an id,
//!   sender, target, properties, visited hubs and a monotonic state.
//! - **Rules (`HubConfiguration`)**: Typed, filtered, inherited and catch-all
//!   handlers, plus declarative routing to hosted hubs and addresses.
//! - **Correlation**: `Hub::await_response` pairs a request with the response
//!   carrying its id, with timeouts and cancellation.
//! - **Runtime (`HubRuntime`)**: Owns the root hubs and shuts them down.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use message_hub::prelude::*;
//!
//! #[hub_message(response = Pong)]
//! struct Ping;
//!
//! #[hub_message]
//! struct Pong;
//!
//! let runtime = HubApp::launch_async().await;
//! let root = runtime.create_default_hub(
//!     HubConfiguration::new().route_address_to_hosted("worker", |_| {
//!         HubConfiguration::new().on::<Ping, _>(|hub, ping| {
//!             hub.respond(&ping, Pong);
//!             Reply::processed(ping)
//!         })
//!     }),
//! );
//! let pong = root
//!     .await_response(Ping, PostOptions::to(Address::new("worker", "1")))
//!     .await?;
//! ```

extern crate self as message_hub;

/// Runtime entry points, settings and errors.
pub(crate) mod common;

/// Hubs, their configuration and handler rules.
pub(crate) mod hub;

/// Envelopes, addresses and runtime messages.
pub(crate) mod message;

/// Core traits.
pub(crate) mod traits;

pub use traits::{HubMessage, Request};

/// Well-known envelope property keys.
pub mod properties {
    pub use crate::message::properties::*;
}

/// Settings types and the process-wide [`CONFIG`](config::CONFIG).
pub mod config {
    pub use crate::common::config::*;
}

/// Commonly used items.
///
/// # Re-exports
///
/// ## Macros (from `hub-macro`)
/// *   [`hub_macro::hub_message`]: Attribute macro for defining hub messages.
///
/// ## External Crates
/// *   [`async_trait::async_trait`](https://docs.rs/async-trait/latest/async_trait/attr.async_trait.html): For implementing [`HubPlugin`](crate::traits::HubPlugin).
///
/// ## Core Types
/// *   [`crate::hub::Hub`]: An addressable node.
/// *   [`crate::hub::HubConfiguration`]: Rules, plugins and buildup for a new hub.
/// *   [`crate::hub::HandlerRegistry`]: The ordered rule set.
/// *   [`crate::common::HubApp`]: Entry point for launching the runtime.
/// *   [`crate::common::HubRuntime`]: Owns root hubs.
/// *   [`crate::common::Reply`]: Helpers for handler return values.
/// *   [`crate::message::MessageDelivery`]: The immutable envelope.
/// *   [`crate::message::Delivery`]: A typed view of an envelope.
/// *   [`crate::message::PostOptions`]: Parameters for posting.
pub mod prelude {
    pub use hub_macro::*;

    pub use async_trait::async_trait;
    pub use tokio_util::sync::CancellationToken;

    pub use crate::common::{
        HandlerFuture, HubApp, HubError, HubRuntime, HubSettings, Job, Reply, CONFIG,
    };
    pub use crate::hub::{
        DeferralHandle, HandlerRegistry, Hub, HubConfiguration, MessageLineage, Projection,
    };
    pub use crate::message::{
        properties, Address, Delivery, DeliveryFailure, DeliveryState, Disconnect, DisposeRequest,
        MessageDelivery, PostOptions,
    };
    pub use crate::traits::{HubMessage, HubPlugin, Request};
}
