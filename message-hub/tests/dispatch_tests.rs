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
use std::time::Duration;

use hub_test::prelude::*;
use message_hub::prelude::*;
use parking_lot::Mutex;

use crate::setup::hubs::{launch, note_recorder};
use crate::setup::messages::{animal_of, Animal, Dog, Explode, Faulty, Note};
use crate::setup::*;

mod setup;

#[hub_test]
async fn failed_handlers_leave_the_delivery_failed() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = launch().await;
    let states = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&states);
    let hub = runtime.create_default_hub(
        HubConfiguration::new()
            .on::<Faulty, _>(|_, _| Reply::pending(async { anyhow::bail!("no good") }))
            .on_any(
                |delivery| delivery.is::<Faulty>(),
                move |_, delivery| {
                    seen.lock().push((delivery.state(), delivery.error().map(str::to_string)));
                    Reply::ready(delivery)
                },
            ),
    );

    hub.post(Faulty, PostOptions::default());

    assert!(eventually(Duration::from_secs(2), || async { !states.lock().is_empty() }).await);
    let (state, error) = states.lock()[0].clone();
    assert_eq!(state, DeliveryState::Failed);
    assert_eq!(error.as_deref(), Some("handler failed: no good"));
    Ok(())
}

#[hub_test]
async fn a_panicking_handler_does_not_stop_the_hub() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = launch().await;
    let seen = Arc::new(Mutex::new(Vec::new()));
    let hub = runtime.create_default_hub(
        note_recorder(Arc::clone(&seen))
            .on::<Explode, _>(|_, _| Reply::pending(async { panic!("boom") })),
    );

    hub.post(Note(1), PostOptions::default());
    hub.post(Explode, PostOptions::default());
    hub.post(Note(2), PostOptions::default());

    assert!(eventually(Duration::from_secs(2), || async { seen.lock().len() == 2 }).await);
    assert_eq!(*seen.lock(), vec![1, 2]);
    Ok(())
}

#[hub_test]
async fn rules_fold_in_registration_order() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = launch().await;
    let trail = Arc::new(Mutex::new(Vec::new()));
    let (first, second) = (Arc::clone(&trail), Arc::clone(&trail));
    let hub = runtime.create_default_hub(
        HubConfiguration::new()
            .on::<Note, _>(move |_, note| {
                first.lock().push(("first", note.state()));
                Reply::processed(note)
            })
            .on::<Note, _>(move |_, note| {
                second.lock().push(("second", note.state()));
                Reply::ready(note)
            }),
    );

    hub.post(Note(1), PostOptions::default());

    assert!(eventually(Duration::from_secs(2), || async { trail.lock().len() == 2 }).await);
    assert_eq!(
        *trail.lock(),
        vec![("first", DeliveryState::Submitted), ("second", DeliveryState::Processed)]
    );
    Ok(())
}

#[hub_test]
async fn filtered_rules_only_see_matching_payloads() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = launch().await;
    let evens = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&evens);
    let hub = runtime.create_default_hub(HubConfiguration::new().on_filtered::<Note, _, _>(
        |note| note.message().0 % 2 == 0,
        move |_, note| {
            seen.lock().push(note.message().0);
            Reply::processed(note)
        },
    ));

    for n in 1..=6 {
        hub.post(Note(n), PostOptions::default());
    }
    hub.flush().await;

    assert!(eventually(Duration::from_secs(2), || async { evens.lock().len() == 3 }).await);
    assert_eq!(*evens.lock(), vec![2, 4, 6]);
    Ok(())
}

#[hub_test]
async fn inherited_rules_see_declared_derivations() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = launch().await;
    let names = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&names);
    let hub = runtime.create_default_hub(
        HubConfiguration::new()
            .declare_lineage::<Dog, Animal>(animal_of)
            .on_inherited::<Animal, _>(move |_, animal| {
                seen.lock().push(animal.message().name.clone());
                Reply::processed(animal)
            }),
    );

    hub.post(
        Animal {
            name: "generic".into(),
        },
        PostOptions::default(),
    );
    hub.post(
        Dog {
            animal: Animal { name: "rex".into() },
            breed: "collie".into(),
        },
        PostOptions::default(),
    );

    assert!(eventually(Duration::from_secs(2), || async { names.lock().len() == 2 }).await);
    assert_eq!(*names.lock(), vec!["generic".to_string(), "rex".to_string()]);
    Ok(())
}

#[hub_test]
async fn exact_rules_ignore_derived_payloads() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = launch().await;
    let names = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&names);
    let hub = runtime.create_default_hub(
        HubConfiguration::new()
            .declare_lineage::<Dog, Animal>(animal_of)
            .on::<Animal, _>(move |_, animal| {
                seen.lock().push(animal.message().name.clone());
                Reply::processed(animal)
            }),
    );

    hub.post(
        Dog {
            animal: Animal { name: "rex".into() },
            breed: "collie".into(),
        },
        PostOptions::default(),
    );
    hub.post(Animal { name: "cat".into() }, PostOptions::default());

    assert!(eventually(Duration::from_secs(2), || async { names.lock().len() == 1 }).await);
    hub.flush().await;
    assert_eq!(*names.lock(), vec!["cat".to_string()]);
    Ok(())
}

#[hub_test]
async fn later_rules_see_access_tags_from_earlier_ones() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = launch().await;
    let tags = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&tags);
    let hub = runtime.create_default_hub(
        HubConfiguration::new()
            .on_any(
                |delivery| delivery.is::<Note>(),
                |hub, delivery| {
                    let tenant = String::from("acme");
                    Reply::ready(delivery.with_access(tenant, hub.address().clone()))
                },
            )
            .on::<Note, _>(move |_, note| {
                let envelope = note.envelope();
                seen.lock().push((
                    envelope.access_object::<String>().cloned(),
                    envelope.access_provided_by().cloned(),
                ));
                Reply::processed(note)
            }),
    );

    hub.post(Note(1), PostOptions::default());

    assert!(eventually(Duration::from_secs(2), || async { !tags.lock().is_empty() }).await);
    assert_eq!(
        tags.lock()[0],
        (Some("acme".to_string()), Some(hub.address().clone()))
    );
    Ok(())
}
