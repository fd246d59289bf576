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

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use dashmap::DashMap;
use futures::FutureExt;
use tracing::{error, trace};

use crate::common::{panic_message, EnvelopeHandler, HandlerFuture, HubError, ProjectedHandler, Reply};
use crate::hub::{Hub, MessageLineage};
use crate::message::{Delivery, MessageDelivery};
use crate::traits::HubMessage;

#[derive(Clone, Copy)]
enum Matcher {
    Exact(TypeId),
    Inherited(TypeId),
    Any,
}

#[derive(Clone)]
enum RuleHandler {
    Envelope(EnvelopeHandler),
    Projected { base: TypeId, handler: ProjectedHandler },
}

#[derive(Clone)]
struct Rule {
    name: &'static str,
    matcher: Matcher,
    handler: RuleHandler,
}

/// Ordered handler rules of a hub.
///
/// Dispatch folds a delivery through every rule whose matcher accepts the
/// payload type, in registration order; each rule returns the envelope the
/// next one sees. The rules that apply to a payload type are resolved once
/// and memoized.
///
/// Typed rules (`register`, `register_filtered`, `register_inherited`) only
/// see deliveries addressed to the hub. `register_any` rules see every
/// delivery passing through it, including ones on their way elsewhere.
#[derive(Default)]
pub struct HandlerRegistry {
    rules: Vec<Rule>,
    lineage: MessageLineage,
    index: DashMap<TypeId, Arc<[usize]>>,
}

impl Clone for HandlerRegistry {
    fn clone(&self) -> Self {
        Self {
            rules: self.rules.clone(),
            lineage: self.lineage.clone(),
            index: DashMap::new(),
        }
    }
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles payloads of exactly type `T`.
    pub fn register<T, F>(&mut self, handler: F) -> &mut Self
    where
        T: HubMessage,
        F: Fn(Hub, Delivery<T>) -> HandlerFuture + Send + Sync + 'static,
    {
        self.register_filtered::<T, _, _>(|_| true, handler)
    }

    /// Handles payloads of exactly type `T` that pass `filter`.
    pub fn register_filtered<T, P, F>(&mut self, filter: P, handler: F) -> &mut Self
    where
        T: HubMessage,
        P: Fn(&Delivery<T>) -> bool + Send + Sync + 'static,
        F: Fn(Hub, Delivery<T>) -> HandlerFuture + Send + Sync + 'static,
    {
        let handler: EnvelopeHandler = Arc::new(move |hub: Hub, delivery: MessageDelivery| {
            if !delivery.is_for(hub.address()) {
                return Reply::ready(delivery);
            }
            match delivery.typed::<T>() {
                Some(typed) if filter(&typed) => handler(hub, typed),
                _ => Reply::ready(delivery),
            }
        });
        self.push(Rule {
            name: type_name::<T>(),
            matcher: Matcher::Exact(TypeId::of::<T>()),
            handler: RuleHandler::Envelope(handler),
        })
    }

    /// Handles `B` payloads and every payload type declared to reach `B`
    /// through [`declare_lineage`](Self::declare_lineage).
    ///
    /// Derived payloads are projected to `B` and cloned into the typed view.
    pub fn register_inherited<B, F>(&mut self, handler: F) -> &mut Self
    where
        B: HubMessage + Clone,
        F: Fn(Hub, Delivery<B>) -> HandlerFuture + Send + Sync + 'static,
    {
        let handler: ProjectedHandler =
            Arc::new(move |hub: Hub, delivery: MessageDelivery, view: &dyn Any| {
                if !delivery.is_for(hub.address()) {
                    return Reply::ready(delivery);
                }
                if let Some(typed) = delivery.typed::<B>() {
                    return handler(hub, typed);
                }
                match view.downcast_ref::<B>() {
                    Some(base) => {
                        let base = Arc::new(base.clone());
                        handler(hub, Delivery::from_parts(delivery, base))
                    }
                    None => Reply::ready(delivery),
                }
            });
        self.push(Rule {
            name: type_name::<B>(),
            matcher: Matcher::Inherited(TypeId::of::<B>()),
            handler: RuleHandler::Projected {
                base: TypeId::of::<B>(),
                handler,
            },
        })
    }

    /// Handles every delivery passing `filter`, whatever its payload or target.
    pub fn register_any<P, F>(&mut self, filter: P, handler: F) -> &mut Self
    where
        P: Fn(&MessageDelivery) -> bool + Send + Sync + 'static,
        F: Fn(Hub, MessageDelivery) -> HandlerFuture + Send + Sync + 'static,
    {
        let handler: EnvelopeHandler = Arc::new(move |hub: Hub, delivery: MessageDelivery| {
            if filter(&delivery) {
                handler(hub, delivery)
            } else {
                Reply::ready(delivery)
            }
        });
        self.push(Rule {
            name: "any",
            matcher: Matcher::Any,
            handler: RuleHandler::Envelope(handler),
        })
    }

    /// Declares that `D` payloads can be viewed as `B` for inherited rules.
    pub fn declare_lineage<D, B>(&mut self, view: fn(&D) -> &B) -> &mut Self
    where
        D: HubMessage,
        B: HubMessage,
    {
        self.lineage.declare(view);
        self.index.clear();
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn push(&mut self, rule: Rule) -> &mut Self {
        trace!(rule = rule.name, position = self.rules.len(), "Registering handler rule");
        self.rules.push(rule);
        self.index.clear();
        self
    }

    /// Indices of the rules applying to payload type `type_id`.
    fn candidates(&self, type_id: TypeId) -> Arc<[usize]> {
        if let Some(hit) = self.index.get(&type_id) {
            return Arc::clone(hit.value());
        }
        let resolved: Arc<[usize]> = self
            .rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| match rule.matcher {
                Matcher::Exact(exact) => exact == type_id,
                Matcher::Inherited(base) => self.lineage.reaches(type_id, base),
                Matcher::Any => true,
            })
            .map(|(position, _)| position)
            .collect();
        self.index.insert(type_id, Arc::clone(&resolved));
        resolved
    }

    /// Folds `delivery` through the applicable rules.
    ///
    /// A rule that returns an error or panics leaves the envelope `Failed`
    /// with the error text; later rules still run.
    pub(crate) async fn dispatch(&self, hub: &Hub, delivery: MessageDelivery) -> MessageDelivery {
        let candidates = self.candidates(delivery.message_type_id());
        let mut current = delivery;
        for &position in candidates.iter() {
            let rule = &self.rules[position];
            trace!(rule = rule.name, id = %current.id(), state = %current.state(), "Applying rule");
            let fallback = current.clone();
            let attempt = self.invoke(rule, hub.clone(), current);
            current = match AssertUnwindSafe(attempt).catch_unwind().await {
                Ok(Ok(next)) => next,
                Ok(Err(e)) => {
                    error!(rule = rule.name, id = %fallback.id(), "Handler failed: {:#}", e);
                    fallback.failed(HubError::Handler(format!("{e:#}")))
                }
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    error!(rule = rule.name, id = %fallback.id(), "Handler panicked: {}", message);
                    fallback.failed(HubError::Handler(message))
                }
            };
        }
        current
    }

    async fn invoke(&self, rule: &Rule, hub: Hub, delivery: MessageDelivery) -> anyhow::Result<MessageDelivery> {
        match &rule.handler {
            RuleHandler::Envelope(handler) => handler(hub, delivery).await,
            RuleHandler::Projected { base, handler } => {
                let pending = {
                    let payload = delivery.shared_message();
                    let Some(view) = self.lineage.project((*payload).as_any(), *base) else {
                        return Ok(delivery);
                    };
                    handler(hub, delivery, view)
                };
                pending.await
            }
        }
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.rules.iter().map(|rule| rule.name).collect();
        f.debug_struct("HandlerRegistry")
            .field("rules", &names)
            .field("lineage", &self.lineage)
            .finish()
    }
}
