use crate::domain::entities::{Post, User};
use crate::domain::value_objects::{PostId, UserId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use std::collections::HashSet;

/// Remote user/post/social-graph backend consumed by the profile feed.
#[async_trait]
pub trait ProfileDataSource: Send + Sync {
    /// Identity of the signed-in user, if any.
    fn current_identity(&self) -> Option<UserId>;

    async fn fetch_user(&self, id: &UserId) -> Result<User, AppError>;

    /// Posts owned by `owner`, in whatever order the backend returns them.
    async fn fetch_posts(&self, owner: &UserId) -> Result<Vec<Post>, AppError>;

    async fn fetch_following(&self, id: &UserId) -> Result<HashSet<UserId>, AppError>;

    async fn fetch_followers(&self, id: &UserId) -> Result<HashSet<UserId>, AppError>;

    async fn is_following(&self, viewer: &UserId, target: &UserId) -> Result<bool, AppError>;

    async fn follow(&self, target: &UserId) -> Result<(), AppError>;

    async fn unfollow(&self, target: &UserId) -> Result<(), AppError>;

    async fn set_like(&self, post: &PostId, viewer: &UserId, liked: bool) -> Result<(), AppError>;
}
