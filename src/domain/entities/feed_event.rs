use crate::domain::value_objects::{PostId, UserId, ViewMode};
use serde::{Deserialize, Serialize};

/// What changed in the feed state. Views re-render the affected part only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StateChange {
    ProfileLoaded { user_id: UserId },
    /// The whole post sequence was replaced.
    PostsReplaced { count: usize },
    /// A single post row changed in place.
    PostUpdated { post_id: PostId, index: usize },
    FollowingReplaced { count: usize },
    FollowersReplaced { count: usize },
    FollowStatusChanged { target: UserId, following: bool },
    ViewModeChanged { mode: ViewMode },
    Deactivated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FeedEvent {
    StateChanged(StateChange),
    /// Follow counts for `user_id` are stale and should be fetched again.
    SocialCountsInvalidated { user_id: UserId },
    FeedRefreshRequested,
}

impl FeedEvent {
    pub fn state(change: StateChange) -> Self {
        FeedEvent::StateChanged(change)
    }

    /// True for events that replace the whole feed rather than a single row.
    pub fn is_full_reload(&self) -> bool {
        matches!(
            self,
            FeedEvent::StateChanged(StateChange::PostsReplaced { .. })
                | FeedEvent::FeedRefreshRequested
        )
    }
}
