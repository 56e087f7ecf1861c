use crate::domain::entities::{FeedSnapshot, Post};
use crate::domain::value_objects::ViewMode;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Everything a profile screen renders, derived from one [`FeedSnapshot`].
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProfileFeedView {
    pub header: ProfileHeaderDto,
    pub view_mode: ViewMode,
    pub items: Vec<FeedItemDto>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProfileHeaderDto {
    pub user_id: Option<String>,
    pub username: Option<String>,
    /// Navigation title; only shown on the viewer's own profile.
    pub title: Option<String>,
    pub profile_image_url: Option<String>,
    pub post_count: usize,
    pub following_count: usize,
    pub followers_count: usize,
    pub action: HeaderAction,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HeaderAction {
    EditProfile,
    Follow { following: bool },
    /// Follow status for another user's profile has not arrived yet.
    Loading,
    /// Nobody is signed in.
    Hidden,
}

/// One feed cell. The layout is chosen once from the view mode instead of
/// being re-read from a shared flag while rendering each cell.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum FeedItemDto {
    Grid(GridItemDto),
    List(ListItemDto),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GridItemDto {
    pub post_id: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ListItemDto {
    pub post_id: String,
    pub image_url: String,
    pub image_width: f64,
    pub image_height: f64,
    pub caption: String,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_liked: bool,
}

impl From<&FeedSnapshot> for ProfileFeedView {
    fn from(snapshot: &FeedSnapshot) -> Self {
        let username = snapshot.profile.as_ref().map(|user| user.username.clone());
        let own_profile = snapshot.is_own_profile();

        let action = if snapshot.viewer.is_none() {
            HeaderAction::Hidden
        } else if own_profile {
            HeaderAction::EditProfile
        } else {
            match snapshot.follow_status {
                Some(following) => HeaderAction::Follow { following },
                None => HeaderAction::Loading,
            }
        };

        let header = ProfileHeaderDto {
            user_id: snapshot
                .profile
                .as_ref()
                .map(|user| user.id.to_string()),
            username: username.clone(),
            title: if own_profile { username.clone() } else { None },
            profile_image_url: snapshot
                .profile
                .as_ref()
                .and_then(|user| user.profile_image_url.clone()),
            post_count: snapshot.posts.len(),
            following_count: snapshot.following.len(),
            followers_count: snapshot.followers.len(),
            action,
        };

        let items = snapshot
            .posts
            .iter()
            .map(|post| match snapshot.view_mode {
                ViewMode::Grid => FeedItemDto::Grid(GridItemDto::from(post)),
                ViewMode::Chronological => {
                    FeedItemDto::List(ListItemDto::from_post(post, username.clone()))
                }
            })
            .collect();

        Self {
            header,
            view_mode: snapshot.view_mode,
            items,
        }
    }
}

impl From<&Post> for GridItemDto {
    fn from(post: &Post) -> Self {
        Self {
            post_id: post.id.to_string(),
            image_url: post.image_url.clone(),
        }
    }
}

impl ListItemDto {
    fn from_post(post: &Post, username: Option<String>) -> Self {
        Self {
            post_id: post.id.to_string(),
            image_url: post.image_url.clone(),
            image_width: post.image_width,
            image_height: post.image_height,
            caption: post.caption.clone(),
            username,
            created_at: post.created_at,
            is_liked: post.is_liked,
        }
    }
}
