//! Documents the external worker would have written

use challenge_platform::constants::collections;
use challenge_platform::store::{DocumentStore, InMemoryDocumentStore};
use serde_json::{json, Value};

pub async fn seed_image(store: &InMemoryDocumentStore, creator: &str, name: &str, tag: &str) {
    store
        .insert_one(
            collections::IMAGE,
            json!({
                "corId": "seed-image",
                "creatorName": creator,
                "imageName": name,
                "imageTag": tag,
                "imageRegistryLink": format!("registry.local/{creator}/{name}:{tag}"),
            }),
        )
        .await
        .expect("seed image");
}

pub async fn seed_challenge(store: &InMemoryDocumentStore, creator: &str, name: &str) {
    store
        .insert_one(
            collections::CHALLENGE,
            json!({
                "corId": "seed-challenge",
                "creatorName": creator,
                "challengeName": name,
                "imageName": "nginx",
                "imageTag": "v1",
                "duration": 60,
                "participants": ["a@x.com"],
            }),
        )
        .await
        .expect("seed challenge");
}

pub async fn seed_attempt(store: &InMemoryDocumentStore, token: &str, participant: &str) {
    store
        .insert_one(
            collections::ATTEMPT,
            json!({
                "token": token,
                "challengeName": "quiz1",
                "creatorName": "bob",
                "participant": participant,
                "imageRegistryLink": "registry.local/bob/nginx:v1",
            }),
        )
        .await
        .expect("seed attempt");
}

/// Append a status event the way the worker does
pub async fn seed_status(store: &InMemoryDocumentStore, cor_id: &str, event: &str, timestamp: &str) {
    seed_status_with(store, cor_id, event, timestamp, json!({})).await;
}

pub async fn seed_status_with(
    store: &InMemoryDocumentStore,
    cor_id: &str,
    event: &str,
    timestamp: &str,
    extra: Value,
) {
    let mut document = json!({
        "corId": cor_id,
        "event": event,
        "timestamp": timestamp,
    });
    if let (Some(target), Value::Object(fields)) = (document.as_object_mut(), extra) {
        target.extend(fields);
    }
    store
        .insert_one(collections::PROCESS_ENGINE, document)
        .await
        .expect("seed status");
}
