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

//! Test support for message hubs.
//!
//! ```rust,ignore
//! use hub_test::prelude::*;
//!
//! #[hub_test]
//! async fn resolves_ping() -> anyhow::Result<()> {
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::time::Duration;

/// Commonly used test items.
pub mod prelude {
    pub use hub_test_macro::hub_test;

    pub use crate::eventually;
}

/// Polls `condition` every few milliseconds until it holds or `within` elapses.
///
/// Returns whether the condition was observed to hold. Hubs process work on
/// their own tasks, so tests use this instead of fixed sleeps when waiting for
/// a side effect to become visible.
pub async fn eventually<F, Fut>(within: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + within;
    loop {
        if condition().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            tracing::warn!(?within, "condition not reached before deadline");
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
