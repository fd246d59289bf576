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
#![allow(unused)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::anyhow;
use message_hub::prelude::*;
use parking_lot::Mutex;

use crate::setup::messages::{Explode, Faulty, Note, Ping, Pong, Unanswered};

/// A runtime with default settings, independent of any config file.
pub async fn launch() -> HubRuntime {
    HubApp::launch_with_settings(HubSettings::default()).await
}

pub fn worker(id: &str) -> Address {
    Address::new("worker", id)
}

/// Answers `Ping` with a `Pong` naming itself and counts the pings in `hits`.
/// Handles `Unanswered` silently and fails `Faulty`.
pub fn worker_configuration(hits: Arc<AtomicUsize>) -> HubConfiguration {
    HubConfiguration::new()
        .on::<Ping, _>(move |hub, ping| {
            hits.fetch_add(1, Ordering::SeqCst);
            hub.respond(
                &ping,
                Pong {
                    from: hub.address().to_string(),
                },
            );
            Reply::processed(ping)
        })
        .on::<Unanswered, _>(|_, request| Reply::processed(request))
        .on::<Faulty, _>(|_, _| Reply::pending(async { Err(anyhow!("faulty by construction")) }))
        .on::<Explode, _>(|_, _| Reply::pending(async { panic!("exploded") }))
}

/// A root hub that hosts workers on demand.
pub fn root_with_workers(runtime: &HubRuntime, hits: Arc<AtomicUsize>) -> Hub {
    runtime.create_default_hub(
        HubConfiguration::new()
            .route_address_to_hosted("worker", move |_| worker_configuration(Arc::clone(&hits))),
    )
}

/// Records the value of every `Note` it handles.
pub fn note_recorder(seen: Arc<Mutex<Vec<u32>>>) -> HubConfiguration {
    HubConfiguration::new().on::<Note, _>(move |_, note| {
        seen.lock().push(note.message().0);
        Reply::processed(note)
    })
}
