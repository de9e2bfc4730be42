//! Properties of correlation ids and status resolution

mod common;

use std::collections::HashSet;

use chrono::{Duration, TimeZone, Utc};
use challenge_platform::messaging::{ChallengeCreateCommand, CorrelationId};
use challenge_platform::EventStatus;
use futures::future::join_all;
use proptest::prelude::*;

use common::*;

fn challenge_command(name: &str) -> ChallengeCreateCommand {
    ChallengeCreateCommand {
        image_name: "nginx".to_string(),
        image_tag: "v1".to_string(),
        challenge_name: name.to_string(),
        creator_name: "bob".to_string(),
        duration: 30,
        participants: vec!["a@x.com".to_string()],
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Whatever order the worker's events land in, the latest status is the
    /// one with the greatest timestamp
    #[test]
    fn latest_status_is_max_timestamp(offsets in prop::collection::vec(0i64..10_000, 1..12)) {
        tokio_test::block_on(async {
            let platform = TestPlatform::new();
            let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

            let mut distinct: Vec<i64> = Vec::new();
            for offset in offsets {
                if !distinct.contains(&offset) {
                    distinct.push(offset);
                }
            }
            let max_offset = *distinct.iter().max().unwrap();

            for offset in &distinct {
                let event = if *offset == max_offset {
                    "challengeCreated"
                } else {
                    "challengeCreating"
                };
                let timestamp = (base + Duration::seconds(*offset)).to_rfc3339();
                seed_status(&platform.store, "prop", event, &timestamp).await;
            }

            let latest = platform
                .context
                .dispatcher
                .get_latest_status("prop")
                .await
                .unwrap();
            assert_eq!(latest.timestamp, base + Duration::seconds(max_offset));
            assert_eq!(latest.event, EventStatus::ChallengeCreated);

            let history = platform
                .context
                .dispatcher
                .get_status_history("prop")
                .await
                .unwrap();
            assert_eq!(history.len(), distinct.len());
            assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        });
    }

    #[test]
    fn generated_ids_never_repeat(count in 1usize..500) {
        let ids: HashSet<String> = (0..count)
            .map(|_| CorrelationId::generate().into_string())
            .collect();
        prop_assert_eq!(ids.len(), count);
        prop_assert!(ids.iter().all(|id| !id.is_empty()));
    }
}

#[tokio::test]
async fn test_concurrent_publishes_get_distinct_ids() {
    let platform = TestPlatform::new();
    let dispatcher = &platform.context.dispatcher;

    let results = join_all(
        (0..50).map(|i| dispatcher.publish_command(challenge_command(&format!("quiz{i}")))),
    )
    .await;

    let ids: HashSet<String> = results
        .into_iter()
        .map(|r| r.unwrap().into_string())
        .collect();
    assert_eq!(ids.len(), 50);

    let published = platform.broker.published();
    assert_eq!(published.len(), 50);
    let published_ids: HashSet<String> = published
        .iter()
        .map(|m| m.json().unwrap()["corId"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(published_ids, ids);
    assert_eq!(platform.broker.open_channel_count(), 0);
}
