use crate::application::ports::ProfileDataSource;
use crate::domain::entities::{Post, User};
use crate::domain::value_objects::{PostId, UserId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RemoteOperation {
    FetchUser,
    FetchPosts,
    FetchFollowing,
    FetchFollowers,
    IsFollowing,
    Follow,
    Unfollow,
    SetLike,
}

/// In-process backend for the demo harness and tests. Optional latency and
/// per-operation failure switches stand in for a flaky network.
pub struct InMemoryProfileDataSource {
    viewer: Option<UserId>,
    users: RwLock<HashMap<UserId, User>>,
    posts: RwLock<Vec<Post>>,
    // follower -> followed users
    follows: RwLock<HashMap<UserId, HashSet<UserId>>>,
    likes: RwLock<HashMap<PostId, HashSet<UserId>>>,
    failing: RwLock<HashSet<RemoteOperation>>,
    latency: Duration,
}

impl InMemoryProfileDataSource {
    pub fn new(viewer: Option<UserId>) -> Self {
        Self {
            viewer,
            users: RwLock::new(HashMap::new()),
            posts: RwLock::new(Vec::new()),
            follows: RwLock::new(HashMap::new()),
            likes: RwLock::new(HashMap::new()),
            failing: RwLock::new(HashSet::new()),
            latency: Duration::ZERO,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub async fn add_user(&self, user: User) {
        self.users.write().await.insert(user.id.clone(), user);
    }

    /// Stores a post; its like state is tracked separately per viewer.
    pub async fn add_post(&self, post: Post) {
        self.posts.write().await.push(post.with_liked(false));
    }

    pub async fn add_follow(&self, follower: &UserId, target: &UserId) {
        self.follows
            .write()
            .await
            .entry(follower.clone())
            .or_default()
            .insert(target.clone());
    }

    pub async fn add_like(&self, post: &PostId, user: &UserId) {
        self.likes
            .write()
            .await
            .entry(post.clone())
            .or_default()
            .insert(user.clone());
    }

    pub async fn set_failing(&self, operation: RemoteOperation, failing: bool) {
        let mut set = self.failing.write().await;
        if failing {
            set.insert(operation);
        } else {
            set.remove(&operation);
        }
    }

    pub async fn likes_for(&self, post: &PostId) -> HashSet<UserId> {
        self.likes
            .read()
            .await
            .get(post)
            .cloned()
            .unwrap_or_default()
    }

    async fn simulate(&self, operation: RemoteOperation) -> Result<(), AppError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.failing.read().await.contains(&operation) {
            return Err(AppError::network(format!("{operation:?} unavailable")));
        }
        Ok(())
    }

    fn require_viewer(&self) -> Result<&UserId, AppError> {
        self.viewer.as_ref().ok_or(AppError::NoIdentity)
    }

    async fn ensure_user(&self, id: &UserId) -> Result<(), AppError> {
        if self.users.read().await.contains_key(id) {
            Ok(())
        } else {
            Err(AppError::not_found(format!("user {id}")))
        }
    }
}

#[async_trait]
impl ProfileDataSource for InMemoryProfileDataSource {
    fn current_identity(&self) -> Option<UserId> {
        self.viewer.clone()
    }

    async fn fetch_user(&self, id: &UserId) -> Result<User, AppError> {
        self.simulate(RemoteOperation::FetchUser).await?;
        self.users
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("user {id}")))
    }

    async fn fetch_posts(&self, owner: &UserId) -> Result<Vec<Post>, AppError> {
        self.simulate(RemoteOperation::FetchPosts).await?;
        let likes = self.likes.read().await;
        let posts = self
            .posts
            .read()
            .await
            .iter()
            .filter(|post| &post.owner == owner)
            .map(|post| {
                let liked = match &self.viewer {
                    Some(viewer) => likes
                        .get(&post.id)
                        .is_some_and(|users| users.contains(viewer)),
                    None => false,
                };
                post.clone().with_liked(liked)
            })
            .collect();
        Ok(posts)
    }

    async fn fetch_following(&self, id: &UserId) -> Result<HashSet<UserId>, AppError> {
        self.simulate(RemoteOperation::FetchFollowing).await?;
        Ok(self
            .follows
            .read()
            .await
            .get(id)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_followers(&self, id: &UserId) -> Result<HashSet<UserId>, AppError> {
        self.simulate(RemoteOperation::FetchFollowers).await?;
        Ok(self
            .follows
            .read()
            .await
            .iter()
            .filter(|(_, targets)| targets.contains(id))
            .map(|(follower, _)| follower.clone())
            .collect())
    }

    async fn is_following(&self, viewer: &UserId, target: &UserId) -> Result<bool, AppError> {
        self.simulate(RemoteOperation::IsFollowing).await?;
        Ok(self
            .follows
            .read()
            .await
            .get(viewer)
            .is_some_and(|targets| targets.contains(target)))
    }

    async fn follow(&self, target: &UserId) -> Result<(), AppError> {
        self.simulate(RemoteOperation::Follow).await?;
        let viewer = self.require_viewer()?;
        self.ensure_user(target).await?;
        self.add_follow(viewer, target).await;
        Ok(())
    }

    async fn unfollow(&self, target: &UserId) -> Result<(), AppError> {
        self.simulate(RemoteOperation::Unfollow).await?;
        let viewer = self.require_viewer()?;
        if let Some(targets) = self.follows.write().await.get_mut(viewer) {
            targets.remove(target);
        }
        Ok(())
    }

    async fn set_like(&self, post: &PostId, viewer: &UserId, liked: bool) -> Result<(), AppError> {
        self.simulate(RemoteOperation::SetLike).await?;
        if !self.posts.read().await.iter().any(|p| &p.id == post) {
            return Err(AppError::not_found(format!("post {post}")));
        }
        let mut likes = self.likes.write().await;
        let users = likes.entry(post.clone()).or_default();
        if liked {
            users.insert(viewer.clone());
        } else {
            users.remove(viewer);
        }
        Ok(())
    }
}
