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
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use hub_test::prelude::*;
use message_hub::prelude::*;
use parking_lot::Mutex;

use crate::setup::hubs::{launch, worker, worker_configuration};
use crate::setup::messages::{Note, Ping};
use crate::setup::*;

mod setup;

/// Hosts workers, a front hub that re-posts pings to `worker/1`, and a
/// relay hub that re-posts notes to `sink/1`, which records their senders.
fn root_with_front(runtime: &HubRuntime, senders: Arc<Mutex<Vec<Option<Address>>>>) -> Hub {
    runtime.create_default_hub(
        HubConfiguration::new()
            .route_address_to_hosted("worker", |_| worker_configuration(Arc::default()))
            .route_address_to_hosted("front", |_| {
                HubConfiguration::new().route_message::<Ping, _, _>(|_| Some(worker("1")), |_| true)
            })
            .route_address_to_hosted("relay", |_| {
                HubConfiguration::new()
                    .route_message::<Note, _, _>(|_| Some(Address::new("sink", "1")), |_| true)
            })
            .route_address_to_hosted("sink", move |_| {
                let senders = Arc::clone(&senders);
                HubConfiguration::new().on::<Note, _>(move |_, note| {
                    senders.lock().push(note.sender().cloned());
                    Reply::processed(note)
                })
            }),
    )
}

#[hub_test]
async fn route_message_relays_the_response_on_the_way_back() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = launch().await;
    let root = root_with_front(&runtime, Arc::default());

    let pong = root
        .await_response(
            Ping,
            PostOptions::to(Address::new("front", "1")).with_timeout(Duration::from_secs(5)),
        )
        .await?;

    assert_eq!(pong.message().from, "hub/root/worker/1");
    let front = root.hosted_hub(&Address::new("front", "1")).context("front is hosted")?;
    assert!(eventually(Duration::from_secs(1), || async { front.pending_callbacks() == 0 }).await);
    assert_eq!(root.pending_callbacks(), 0);
    Ok(())
}

#[hub_test]
async fn route_message_keeps_the_sender_of_plain_messages() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = launch().await;
    let senders = Arc::new(Mutex::new(Vec::new()));
    let root = root_with_front(&runtime, Arc::clone(&senders));

    root.post(Note(1), PostOptions::to(Address::new("relay", "1")));

    assert!(eventually(Duration::from_secs(2), || async { senders.lock().len() == 1 }).await);
    assert_eq!(*senders.lock(), vec![Some(root.address().clone())]);
    Ok(())
}

#[hub_test]
async fn hosted_hubs_are_created_per_address() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = launch().await;
    let hits = Arc::new(AtomicUsize::new(0));
    let root = runtime.create_default_hub(HubConfiguration::new().route_address_to_hosted("worker", {
        let hits = Arc::clone(&hits);
        move |_| worker_configuration(Arc::clone(&hits))
    }));

    for id in ["1", "2", "1", "2", "3"] {
        root.await_response(Ping, PostOptions::to(worker(id))).await?;
    }

    assert_eq!(root.hosted_count(), 3);
    assert_eq!(hits.load(Ordering::SeqCst), 5);
    Ok(())
}

#[hub_test]
async fn siblings_reach_each_other_through_their_host() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = launch().await;
    let root = runtime.create_default_hub(HubConfiguration::new());
    let a = root.get_hosted_hub(&worker("a"), |_| HubConfiguration::new());
    let b = root.get_hosted_hub(&worker("b"), |_| worker_configuration(Arc::default()));

    let pong = a.await_response(Ping, PostOptions::to(b.address().clone())).await?;

    assert_eq!(pong.message().from, b.address().to_string());
    assert_eq!(a.address().host(), Some(root.address()));
    Ok(())
}

#[hub_test]
async fn connected_peers_route_directly_until_disconnected() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = launch().await;
    let left = runtime.create_hub(Address::new("hub", "left"), HubConfiguration::new());
    let right = runtime.create_hub(
        Address::new("hub", "right"),
        worker_configuration(Arc::default()),
    );

    left.connect_to(&right);
    let pong = left.await_response(Ping, PostOptions::to(right.address().clone())).await?;
    assert_eq!(pong.message().from, "hub/right");

    left.disconnect(&right);
    let result = left
        .await_response(
            Ping,
            PostOptions::to(right.address().clone()).with_timeout(Duration::from_secs(5)),
        )
        .await;
    assert!(matches!(result, Err(HubError::DeliveryFailed { .. })), "got {result:?}");

    runtime.shutdown_all().await?;
    Ok(())
}

#[hub_test]
async fn route_loops_end_in_not_found() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = launch().await;
    let routed = Arc::new(AtomicUsize::new(0));

    // Both hubs hand anything for `ghost/*` to their peer.
    let to_peer = |routed: Arc<AtomicUsize>| {
        HubConfiguration::new().route_address("ghost", move |hub, _, delivery| {
            routed.fetch_add(1, Ordering::SeqCst);
            let peer = hub.get::<Hub>("peer");
            Reply::job(async move {
                let peer = peer.context("no peer configured")?;
                peer.deliver_message(delivery);
                Ok(())
            })
        })
    };
    let a = runtime.create_hub(Address::new("hub", "a"), to_peer(Arc::clone(&routed)));
    let b = runtime.create_hub(Address::new("hub", "b"), to_peer(Arc::clone(&routed)));
    a.connect_to(&b);
    a.set(b.clone(), "peer");
    b.set(a.clone(), "peer");

    let result = a
        .await_response(
            Ping,
            PostOptions::to(Address::new("ghost", "1")).with_timeout(Duration::from_secs(5)),
        )
        .await;

    match result {
        Err(HubError::DeliveryFailed { reason, .. }) => {
            assert!(reason.contains("no route"), "reason was {reason}");
        }
        other => panic!("expected a routing failure, got {other:?}"),
    }
    assert_eq!(routed.load(Ordering::SeqCst), 1, "the peer must not route it back");

    a.remove::<Hub>("peer");
    b.remove::<Hub>("peer");
    runtime.shutdown_all().await?;
    Ok(())
}

#[hub_test]
async fn catch_all_rules_see_deliveries_in_transit() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = launch().await;
    let targets = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&targets);
    let root = runtime.create_default_hub(
        HubConfiguration::new()
            .on_any(
                |delivery| delivery.is::<Ping>(),
                move |_, delivery| {
                    seen.lock().push(delivery.target().cloned());
                    Reply::ready(delivery)
                },
            )
            .route_address_to_hosted("worker", |_| worker_configuration(Arc::default())),
    );

    root.await_response(Ping, PostOptions::to(worker("1"))).await?;

    assert_eq!(*targets.lock(), vec![Some(worker("1"))]);
    Ok(())
}

#[hub_test]
async fn hosted_hub_configuration_may_create_its_siblings() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = launch().await;
    let root = runtime.create_default_hub(HubConfiguration::new());
    let host = root.clone();

    let created = tokio::time::timeout(
        Duration::from_secs(2),
        tokio::task::spawn_blocking(move || {
            let mut first = None;
            for id in 0..32 {
                let address = worker(&id.to_string());
                let inner = host.clone();
                let hub = host.get_hosted_hub(&address, move |_| {
                    let sibling = worker(&format!("sibling-{id}"));
                    inner.get_hosted_hub(&sibling, |_| worker_configuration(Arc::default()));
                    worker_configuration(Arc::default())
                });
                if first.is_none() {
                    first = Some(hub);
                }
            }
            first
        }),
    )
    .await
    .context("creating hosted hubs from a configuration must not deadlock")??;

    assert!(created.is_some());
    assert_eq!(root.hosted_count(), 64);
    assert!(root.hosted_hub(&worker("sibling-0")).is_some());
    Ok(())
}
