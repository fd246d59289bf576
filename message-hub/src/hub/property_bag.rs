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

use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;

/// Typed values attached to a hub, keyed by type and a context string.
#[derive(Debug, Default)]
pub(crate) struct PropertyBag {
    values: DashMap<(TypeId, String), Arc<dyn Any + Send + Sync>>,
}

impl PropertyBag {
    pub(crate) fn set<T: Any + Send + Sync>(&self, value: T, context: &str) -> Option<Arc<T>> {
        self.values
            .insert((TypeId::of::<T>(), context.to_string()), Arc::new(value))
            .and_then(|previous| previous.downcast::<T>().ok())
    }

    pub(crate) fn get<T: Any + Send + Sync>(&self, context: &str) -> Option<Arc<T>> {
        self.values
            .get(&(TypeId::of::<T>(), context.to_string()))
            .and_then(|entry| Arc::clone(entry.value()).downcast::<T>().ok())
    }

    pub(crate) fn remove<T: Any + Send + Sync>(&self, context: &str) -> Option<Arc<T>> {
        self.values
            .remove(&(TypeId::of::<T>(), context.to_string()))
            .and_then(|(_, value)| value.downcast::<T>().ok())
    }
}
