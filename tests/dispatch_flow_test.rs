//! End-to-end dispatch flows over the in-memory broker and store: request in,
//! command on the exchange, worker events seeded, status polled back.

mod common;

use bytes::Bytes;
use serde_json::json;
use challenge_platform::error::{PlatformError, PreconditionKind};
use challenge_platform::orchestration::{
    archive_path, CreateChallengeRequest, ImageBuildRequest, StartAttemptRequest,
};
use challenge_platform::store::DocumentStore;
use challenge_platform::{EventOutcome, EventStatus};
use common::*;

fn quiz_request() -> CreateChallengeRequest {
    CreateChallengeRequest {
        image_name: "nginx".to_string(),
        image_tag: "v1".to_string(),
        challenge_name: "quiz1".to_string(),
        creator_name: "bob".to_string(),
        duration: 60,
        participants: vec!["a@x.com".to_string()],
    }
}

#[tokio::test]
async fn test_challenge_create_then_poll_until_terminal() {
    let platform = TestPlatform::new();
    seed_image(&platform.store, "bob", "nginx", "v1").await;

    let cor_id = platform
        .context
        .challenges
        .create_challenge(quiz_request())
        .await
        .unwrap();
    assert!(!cor_id.as_str().is_empty());

    let (message, body) = platform.single_published();
    assert_eq!(message.exchange, "topic.router");
    assert_eq!(message.routing_key, "platform.fromService.challengeCreate");
    assert!(message.persistent);
    assert_eq!(body["corId"], cor_id.as_str());
    assert_eq!(body["eventStatus"], "challengeCreating");
    assert_eq!(body["challengeName"], "quiz1");
    assert_eq!(body["duration"], 60);
    assert_eq!(body["participants"][0], "a@x.com");

    // Before the worker writes anything the id is indistinguishable from an unknown one
    let err = platform
        .context
        .dispatcher
        .get_latest_status(cor_id.as_str())
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::QueryNotFound { .. }));

    seed_status(&platform.store, cor_id.as_str(), "challengeCreating", "2024-01-01T10:00:00Z").await;
    let latest = platform
        .context
        .dispatcher
        .get_latest_status(cor_id.as_str())
        .await
        .unwrap();
    assert_eq!(latest.event, EventStatus::ChallengeCreating);
    assert!(!latest.is_terminal());

    seed_status(&platform.store, cor_id.as_str(), "challengeCreated", "2024-01-01T10:02:00Z").await;
    let latest = platform
        .context
        .dispatcher
        .get_latest_status(cor_id.as_str())
        .await
        .unwrap();
    assert_eq!(latest.event, EventStatus::ChallengeCreated);
    assert_eq!(latest.outcome(), EventOutcome::Success);
    assert!(latest.is_terminal());

    let history = platform
        .context
        .dispatcher
        .get_status_history(cor_id.as_str())
        .await
        .unwrap();
    let events: Vec<_> = history.iter().map(|r| r.event).collect();
    assert_eq!(
        events,
        vec![EventStatus::ChallengeCreating, EventStatus::ChallengeCreated]
    );
}

#[tokio::test]
async fn test_challenge_for_missing_image_is_not_published() {
    let platform = TestPlatform::new();

    let err = platform
        .context
        .challenges
        .create_challenge(quiz_request())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PlatformError::PreconditionNotMet {
            kind: PreconditionKind::NotFound,
            ..
        }
    ));
    assert!(platform.broker.published().is_empty());
}

#[tokio::test]
async fn test_duplicate_challenge_name_is_a_conflict() {
    let platform = TestPlatform::new();
    seed_image(&platform.store, "bob", "nginx", "v1").await;
    seed_challenge(&platform.store, "bob", "quiz1").await;

    let err = platform
        .context
        .challenges
        .create_challenge(quiz_request())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PlatformError::PreconditionNotMet {
            kind: PreconditionKind::Conflict,
            ..
        }
    ));
    assert!(platform.broker.published().is_empty());
}

#[tokio::test]
async fn test_same_challenge_name_for_another_creator_is_allowed() {
    let platform = TestPlatform::new();
    seed_image(&platform.store, "bob", "nginx", "v1").await;
    seed_challenge(&platform.store, "alice", "quiz1").await;

    platform
        .context
        .challenges
        .create_challenge(quiz_request())
        .await
        .unwrap();
    assert_eq!(platform.broker.published().len(), 1);
}

#[tokio::test]
async fn test_image_build_uploads_archive_before_publishing() {
    let platform = TestPlatform::new();
    let archive = Bytes::from_static(b"PK\x03\x04build-context");

    let cor_id = platform
        .context
        .images
        .build_image(ImageBuildRequest {
            image_name: "nginx".to_string(),
            image_tag: "v2".to_string(),
            creator_name: "bob".to_string(),
            archive: archive.clone(),
        })
        .await
        .unwrap();

    let expected_path = archive_path("bob", &cor_id);
    assert_eq!(expected_path, format!("challenge-zips/bob-{cor_id}.zip"));
    let stored = platform.uploader.read(&expected_path).await.unwrap();
    assert_eq!(stored, archive);

    let (message, body) = platform.single_published();
    assert_eq!(message.routing_key, "platform.fromService.imageCreate");
    assert_eq!(body["eventStatus"], "imageCreating");
    assert_eq!(body["s3Path"], expected_path.as_str());
    assert_eq!(body["corId"], cor_id.as_str());
}

#[tokio::test]
async fn test_existing_image_triple_is_rejected_before_upload() {
    let platform = TestPlatform::new();
    seed_image(&platform.store, "bob", "nginx", "v1").await;

    let err = platform
        .context
        .images
        .build_image(ImageBuildRequest {
            image_name: "nginx".to_string(),
            image_tag: "v1".to_string(),
            creator_name: "bob".to_string(),
            archive: Bytes::from_static(b"zip"),
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PlatformError::PreconditionNotMet {
            kind: PreconditionKind::Conflict,
            ..
        }
    ));
    assert!(platform.broker.published().is_empty());
}

#[tokio::test]
async fn test_attempt_start_carries_stored_attempt_fields() {
    let platform = TestPlatform::new();
    seed_attempt(&platform.store, "tok-123", "a@x.com").await;

    let cor_id = platform
        .context
        .attempts
        .start_attempt(StartAttemptRequest {
            token: "tok-123".to_string(),
        })
        .await
        .unwrap();

    let (message, body) = platform.single_published();
    assert_eq!(message.routing_key, "platform.fromService.challengeStart");
    assert_eq!(body["corId"], cor_id.as_str());
    assert_eq!(body["eventStatus"], "challengeStarting");
    assert_eq!(body["token"], "tok-123");
    assert_eq!(body["participant"], "a@x.com");
    assert_eq!(body["challengeName"], "quiz1");
}

#[tokio::test]
async fn test_unknown_attempt_token_is_not_found() {
    let platform = TestPlatform::new();

    let err = platform
        .context
        .attempts
        .start_attempt(StartAttemptRequest {
            token: "nope".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PlatformError::PreconditionNotMet {
            kind: PreconditionKind::NotFound,
            ..
        }
    ));
    assert!(platform.broker.published().is_empty());
}

#[tokio::test]
async fn test_broker_down_yields_no_correlation_id() {
    let platform = TestPlatform::new();
    seed_image(&platform.store, "bob", "nginx", "v1").await;
    platform.break_broker();

    let err = platform
        .context
        .challenges
        .create_challenge(quiz_request())
        .await
        .unwrap_err();

    assert!(matches!(err, PlatformError::BrokerUnavailable { .. }));
    assert!(platform.broker.published().is_empty());
    assert_eq!(platform.broker.open_channel_count(), 0);
}

#[tokio::test]
async fn test_dropped_connection_recovers_on_next_command() {
    let platform = TestPlatform::new();
    seed_image(&platform.store, "bob", "nginx", "v1").await;
    platform.broker.drop_connection();

    platform
        .context
        .challenges
        .create_challenge(quiz_request())
        .await
        .unwrap();

    assert!(platform.broker.is_connected());
    assert_eq!(platform.broker.reconnect_count(), 1);
    assert_eq!(platform.broker.published().len(), 1);
}

#[tokio::test]
async fn test_store_failure_during_precondition_is_a_store_error() {
    let platform = TestPlatform::new();
    platform.store.fail_next_queries(1);

    let err = platform
        .context
        .challenges
        .create_challenge(quiz_request())
        .await
        .unwrap_err();

    assert!(matches!(err, PlatformError::Store { .. }));
    assert!(platform.broker.published().is_empty());
}

#[tokio::test]
async fn test_repeated_reads_do_not_change_the_log() {
    let platform = TestPlatform::new();
    seed_status(&platform.store, "c-9", "imageCreating", "2024-01-01T10:00:00Z").await;
    seed_status(&platform.store, "c-9", "imageFailed", "2024-01-01T10:05:00Z").await;
    let dispatcher = &platform.context.dispatcher;

    let first = dispatcher.get_latest_status("c-9").await.unwrap();
    let second = dispatcher.get_latest_status("c-9").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.outcome(), EventOutcome::Failure);

    let history_a = dispatcher.get_status_history("c-9").await.unwrap();
    let history_b = dispatcher.get_status_history("c-9").await.unwrap();
    assert_eq!(history_a, history_b);
    assert_eq!(platform.store.count("process_engine"), 2);
}

#[tokio::test]
async fn test_numeric_timestamp_does_not_poison_polling() {
    let platform = TestPlatform::new();
    seed_status(&platform.store, "c-7", "challengeCreating", "2024-01-01T00:00:01Z").await;
    seed_status(&platform.store, "c-7", "challengeCreated", "2024-01-01T00:00:02Z").await;
    platform
        .store
        .insert_one(
            "process_engine",
            json!({"corId": "c-7", "event": "challengeCreated", "timestamp": 1704067203}),
        )
        .await
        .unwrap();
    let dispatcher = &platform.context.dispatcher;

    let latest = dispatcher.get_latest_status("c-7").await.unwrap();
    assert_eq!(latest.event, EventStatus::ChallengeCreated);
    assert_eq!(latest.timestamp.to_rfc3339(), "2024-01-01T00:00:02+00:00");

    let history = dispatcher.get_status_history("c-7").await.unwrap();
    let events: Vec<_> = history.iter().map(|r| r.event).collect();
    assert_eq!(
        events,
        vec![EventStatus::ChallengeCreating, EventStatus::ChallengeCreated]
    );
}
