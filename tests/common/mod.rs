#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use profile_feed::domain::entities::{FeedSnapshot, Post, User};
use profile_feed::domain::value_objects::{PostId, UserId};
use profile_feed::infrastructure::remote::InMemoryProfileDataSource;
use profile_feed::ProfileFeedService;
use std::time::Duration;

pub const VIEWER: &str = "alice";

/// alice follows bob; carol follows alice. bob owns two posts, alice one.
pub async fn seeded_source(latency: Duration) -> InMemoryProfileDataSource {
    let source = InMemoryProfileDataSource::new(Some(UserId::from(VIEWER))).with_latency(latency);
    for name in [VIEWER, "bob", "carol"] {
        source.add_user(User::new(UserId::from(name), name)).await;
    }

    source
        .add_post(post("bob-1", "bob", "morning", 1_000))
        .await;
    source
        .add_post(post("bob-2", "bob", "evening", 2_000))
        .await;
    source
        .add_post(post("alice-1", VIEWER, "hello", 1_500))
        .await;
    source.add_like(&PostId::from("bob-1"), &UserId::from(VIEWER)).await;

    source
        .add_follow(&UserId::from(VIEWER), &UserId::from("bob"))
        .await;
    source
        .add_follow(&UserId::from("carol"), &UserId::from(VIEWER))
        .await;
    source
}

pub fn post(id: &str, owner: &str, caption: &str, secs: i64) -> Post {
    Post::new_with_id(
        PostId::from(id),
        UserId::from(owner),
        format!("https://img.test/{id}.jpg"),
        caption,
        Utc.timestamp_opt(secs, 0).unwrap(),
    )
}

/// Polls the service until `check` holds or two seconds pass.
pub async fn wait_until<F>(service: &ProfileFeedService, check: F) -> bool
where
    F: Fn(&FeedSnapshot) -> bool,
{
    let poll = async {
        while !check(&service.snapshot().await) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(2), poll)
        .await
        .is_ok()
}
