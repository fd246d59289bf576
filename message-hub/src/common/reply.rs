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

//! Helpers for building handler return values.
//!
//! Handler rules return a boxed future resolving to the envelope the next
//! rule sees. [`Reply`] builds those futures without boilerplate.
//!
//! ```rust,ignore
//! // Synchronous handling
//! config.on::<Tick>(|_hub, delivery| Reply::processed(delivery));
//!
//! // Async handling
//! config.on::<Ping>(|hub, delivery| {
//!     Reply::pending(async move {
//!         hub.respond(&delivery, Pong);
//!         Ok(delivery.processed())
//!     })
//! });
//! ```

use std::fmt::Display;
use std::future::Future;

use crate::common::{HandlerFuture, Job};
use crate::message::MessageDelivery;

/// A namespace for creating handler return values.
pub struct Reply;

impl Reply {
    /// Resolves immediately with `delivery` unchanged.
    #[inline]
    #[must_use]
    pub fn ready(delivery: impl Into<MessageDelivery>) -> HandlerFuture {
        let delivery = delivery.into();
        Box::pin(async move { Ok(delivery) })
    }

    /// Resolves immediately with `delivery` marked processed.
    #[inline]
    #[must_use]
    pub fn processed(delivery: impl Into<MessageDelivery>) -> HandlerFuture {
        let delivery = delivery.into().processed();
        Box::pin(async move { Ok(delivery) })
    }

    /// Resolves immediately with `delivery` marked failed.
    #[inline]
    #[must_use]
    pub fn failed(delivery: impl Into<MessageDelivery>, error: impl Display) -> HandlerFuture {
        let delivery = delivery.into().failed(error);
        Box::pin(async move { Ok(delivery) })
    }

    /// Wraps async handling.
    ///
    /// An `Err` from `future` marks the envelope failed with the error text.
    #[inline]
    pub fn pending<F>(future: F) -> HandlerFuture
    where
        F: Future<Output = anyhow::Result<MessageDelivery>> + Send + 'static,
    {
        Box::pin(future)
    }

    /// Wraps an async job.
    #[inline]
    pub fn job<F>(future: F) -> Job
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Box::pin(future)
    }
}
