use crate::domain::value_objects::{PostId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub id: PostId,
    pub owner: UserId,
    pub caption: String,
    pub image_url: String,
    pub image_width: f64,
    pub image_height: f64,
    pub created_at: DateTime<Utc>,
    /// Like state for the viewing user.
    pub is_liked: bool,
}

impl Post {
    pub fn new_with_id(
        id: PostId,
        owner: UserId,
        image_url: impl Into<String>,
        caption: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner,
            caption: caption.into(),
            image_url: image_url.into(),
            image_width: 0.0,
            image_height: 0.0,
            created_at,
            is_liked: false,
        }
    }

    pub fn with_dimensions(mut self, width: f64, height: f64) -> Self {
        self.image_width = width;
        self.image_height = height;
        self
    }

    pub fn with_liked(mut self, liked: bool) -> Self {
        self.is_liked = liked;
        self
    }
}

/// Orders posts newest first. `sort_by` is stable, so posts sharing a
/// timestamp keep the order they were fetched in.
pub fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
