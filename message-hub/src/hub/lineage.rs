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
use std::fmt;
use std::sync::Arc;

use crate::traits::HubMessage;

/// Maps one payload type onto a type it embeds.
pub trait Projection: Send + Sync {
    /// The type projected from.
    fn source(&self) -> TypeId;
    /// The type projected to.
    fn target(&self) -> TypeId;
    /// Projects `message`, which must be a `source` value.
    fn project<'a>(&self, message: &'a dyn Any) -> Option<&'a dyn Any>;
}

struct FnProjection<D, B> {
    view: fn(&D) -> &B,
}

impl<D: HubMessage, B: HubMessage> Projection for FnProjection<D, B> {
    fn source(&self) -> TypeId {
        TypeId::of::<D>()
    }

    fn target(&self) -> TypeId {
        TypeId::of::<B>()
    }

    fn project<'a>(&self, message: &'a dyn Any) -> Option<&'a dyn Any> {
        message
            .downcast_ref::<D>()
            .map(|derived| (self.view)(derived) as &dyn Any)
    }
}

/// Declared "is-a" relations between payload types.
///
/// Rust has no runtime subtype discovery, so inherited dispatch works from
/// explicit declarations: `declare::<Derived, Base>(view)` states that every
/// `Derived` can be viewed as a `Base`. Declarations compose, so declaring
/// `A -> B` and `B -> C` lets a handler for `C` receive `A` payloads.
#[derive(Clone, Default)]
pub struct MessageLineage {
    projections: Vec<Arc<dyn Projection>>,
}

impl MessageLineage {
    /// Declares that `D` payloads can be viewed as `B`.
    pub fn declare<D: HubMessage, B: HubMessage>(&mut self, view: fn(&D) -> &B) -> &mut Self {
        self.projections.push(Arc::new(FnProjection { view }));
        self
    }

    /// Whether a `from` payload can be viewed as `to`.
    pub fn reaches(&self, from: TypeId, to: TypeId) -> bool {
        let mut visited = vec![from];
        let mut frontier = vec![from];
        while let Some(current) = frontier.pop() {
            if current == to {
                return true;
            }
            for projection in self.projections.iter().filter(|p| p.source() == current) {
                let next = projection.target();
                if !visited.contains(&next) {
                    visited.push(next);
                    frontier.push(next);
                }
            }
        }
        false
    }

    /// Views `message` as a `to` value, following declarations transitively.
    pub fn project<'a>(&self, message: &'a dyn Any, to: TypeId) -> Option<&'a dyn Any> {
        self.project_from(message, message.type_id(), to, &mut Vec::new())
    }

    fn project_from<'a>(
        &self,
        message: &'a dyn Any,
        from: TypeId,
        to: TypeId,
        visited: &mut Vec<TypeId>,
    ) -> Option<&'a dyn Any> {
        if from == to {
            return Some(message);
        }
        if visited.contains(&from) {
            return None;
        }
        visited.push(from);
        self.projections
            .iter()
            .filter(|p| p.source() == from)
            .find_map(|p| {
                let view = p.project(message)?;
                self.project_from(view, p.target(), to, visited)
            })
    }

    pub fn is_empty(&self) -> bool {
        self.projections.is_empty()
    }
}

impl fmt::Debug for MessageLineage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageLineage")
            .field("declarations", &self.projections.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Event {
        source: &'static str,
    }

    #[derive(Debug)]
    struct UserEvent {
        event: Event,
    }

    #[derive(Debug)]
    struct LoginEvent {
        user: UserEvent,
    }

    fn user_event(login: &LoginEvent) -> &UserEvent {
        &login.user
    }

    fn event(user: &UserEvent) -> &Event {
        &user.event
    }

    fn lineage() -> MessageLineage {
        let mut lineage = MessageLineage::default();
        lineage.declare::<LoginEvent, UserEvent>(user_event);
        lineage.declare::<UserEvent, Event>(event);
        lineage
    }

    #[test]
    fn declarations_compose_transitively() {
        let lineage = lineage();
        assert!(lineage.reaches(TypeId::of::<LoginEvent>(), TypeId::of::<Event>()));
        assert!(lineage.reaches(TypeId::of::<Event>(), TypeId::of::<Event>()));
        assert!(!lineage.reaches(TypeId::of::<Event>(), TypeId::of::<LoginEvent>()));
    }

    #[test]
    fn projection_yields_the_embedded_value() {
        let lineage = lineage();
        let login = LoginEvent {
            user: UserEvent {
                event: Event { source: "web" },
            },
        };
        let viewed = lineage
            .project(&login, TypeId::of::<Event>())
            .and_then(|view| view.downcast_ref::<Event>())
            .expect("LoginEvent is an Event");
        assert_eq!(viewed.source, "web");
    }

    #[derive(Debug)]
    struct Ping;

    #[derive(Debug)]
    struct Pong;

    #[derive(Debug)]
    struct Unrelated;

    static PING: Ping = Ping;
    static PONG: Pong = Pong;

    fn as_pong(_: &Ping) -> &Pong {
        &PONG
    }

    fn as_ping(_: &Pong) -> &Ping {
        &PING
    }

    #[test]
    fn cyclic_declarations_terminate() {
        let mut lineage = MessageLineage::default();
        lineage.declare::<Ping, Pong>(as_pong);
        lineage.declare::<Pong, Ping>(as_ping);

        assert!(lineage.reaches(TypeId::of::<Ping>(), TypeId::of::<Pong>()));
        assert!(!lineage.reaches(TypeId::of::<Ping>(), TypeId::of::<Unrelated>()));
        assert!(lineage.project(&Ping, TypeId::of::<Unrelated>()).is_none());
    }
}
