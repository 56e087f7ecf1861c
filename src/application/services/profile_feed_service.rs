use crate::application::ports::{FeedNotifier, ProfileDataSource};
use crate::domain::entities::{FeedEvent, FeedSnapshot, FeedState, StateChange, User};
use crate::domain::value_objects::{FetchKind, PostId, UserId, ViewMode};
use crate::shared::config::FeedConfig;
use crate::shared::error::AppError;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Result of a fetch that completed without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The result replaced the state; carries the number of items applied.
    Applied(usize),
    /// A newer fetch of the same kind (or a reset) made this result stale.
    Superseded,
}

/// Outcome of the two independent social-graph fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialCountsReport {
    pub following: Result<FetchOutcome, AppError>,
    pub followers: Result<FetchOutcome, AppError>,
}

#[derive(Debug, Clone, Copy)]
enum SocialList {
    Following,
    Followers,
}

impl SocialList {
    fn fetch_kind(self) -> FetchKind {
        match self {
            SocialList::Following => FetchKind::Following,
            SocialList::Followers => FetchKind::Followers,
        }
    }
}

/// Drives one profile screen: resolves the profile, loads its posts and social
/// graph, and applies follow/like mutations once the backend confirms them.
///
/// State sits behind an async lock that is never held across a remote call.
/// Every fetch takes a generation ticket first and only writes back while that
/// ticket is still the newest of its kind, so late completions cannot clobber
/// fresher data.
pub struct ProfileFeedService {
    data: Arc<dyn ProfileDataSource>,
    notifier: Arc<dyn FeedNotifier>,
    state: RwLock<FeedState>,
    pending_follows: Mutex<HashSet<UserId>>,
    pending_likes: Mutex<HashSet<PostId>>,
    initial_view_mode: ViewMode,
    fetch_timeout: Duration,
}

impl ProfileFeedService {
    pub fn new(
        data: Arc<dyn ProfileDataSource>,
        notifier: Arc<dyn FeedNotifier>,
        config: &FeedConfig,
    ) -> Self {
        Self {
            data,
            notifier,
            state: RwLock::new(FeedState::new(config.initial_view_mode)),
            pending_follows: Mutex::new(HashSet::new()),
            pending_likes: Mutex::new(HashSet::new()),
            initial_view_mode: config.initial_view_mode,
            fetch_timeout: config.fetch_timeout(),
        }
    }

    pub async fn snapshot(&self) -> FeedSnapshot {
        self.state.read().await.snapshot()
    }

    pub async fn view_mode(&self) -> ViewMode {
        self.state.read().await.view_mode()
    }

    /// Resolves the profile to show and loads everything for it.
    ///
    /// `user_id` falls back to the signed-in identity. Posts, social counts and
    /// follow status are fetched concurrently once the user record arrives;
    /// their failures are logged and do not fail the profile load.
    pub async fn load_profile(&self, user_id: Option<UserId>) -> Result<User, AppError> {
        let viewer = self.data.current_identity();
        let Some(target) = user_id.or_else(|| viewer.clone()) else {
            warn!("Cannot load profile without a target or signed-in user");
            return Err(AppError::NoIdentity);
        };

        let ticket = self.state.write().await.begin_fetch(FetchKind::Profile);
        let user = self
            .call("fetch_user", self.data.fetch_user(&target))
            .await?;

        {
            let mut state = self.state.write().await;
            if !state.is_current(&ticket) {
                debug!(user_id = %target, "Discarding superseded profile load");
                return Ok(user);
            }
            state.activate(user.clone(), viewer);
        }
        info!(user_id = %user.id, username = %user.username, "Profile loaded");
        self.emit(StateChange::ProfileLoaded {
            user_id: user.id.clone(),
        });

        let (posts, social, follow_status) = tokio::join!(
            self.load_posts(),
            self.load_social_counts(),
            self.load_follow_status()
        );
        if let Err(err) = posts {
            debug!(error = %err, "Posts not loaded with profile");
        }
        if social.following.is_err() || social.followers.is_err() {
            debug!(?social, "Social counts partially loaded with profile");
        }
        if let Err(err) = follow_status {
            debug!(error = %err, "Follow status not loaded with profile");
        }

        Ok(user)
    }

    /// Fetches the profile user's posts and swaps them in, newest first.
    pub async fn load_posts(&self) -> Result<FetchOutcome, AppError> {
        let (owner, ticket) = {
            let mut state = self.state.write().await;
            let owner = state
                .profile_id()
                .cloned()
                .ok_or(AppError::ProfileNotLoaded)?;
            (owner, state.begin_fetch(FetchKind::Posts))
        };

        let posts = self
            .call("fetch_posts", self.data.fetch_posts(&owner))
            .await?;

        let count = {
            let mut state = self.state.write().await;
            if !state.is_current(&ticket) {
                debug!(owner = %owner, "Discarding superseded post fetch");
                return Ok(FetchOutcome::Superseded);
            }
            state.replace_posts(posts)
        };
        debug!(owner = %owner, count, "Posts replaced");
        self.emit(StateChange::PostsReplaced { count });
        Ok(FetchOutcome::Applied(count))
    }

    /// Fetches following and followers side by side; each list is applied on
    /// its own, so one failing leaves the other intact.
    pub async fn load_social_counts(&self) -> SocialCountsReport {
        let (following, followers) = tokio::join!(
            self.load_social_list(SocialList::Following),
            self.load_social_list(SocialList::Followers)
        );
        SocialCountsReport {
            following,
            followers,
        }
    }

    async fn load_social_list(&self, list: SocialList) -> Result<FetchOutcome, AppError> {
        let (user_id, ticket) = {
            let mut state = self.state.write().await;
            let user_id = state
                .profile_id()
                .cloned()
                .ok_or(AppError::ProfileNotLoaded)?;
            (user_id, state.begin_fetch(list.fetch_kind()))
        };

        let ids = match list {
            SocialList::Following => {
                self.call("fetch_following", self.data.fetch_following(&user_id))
                    .await?
            }
            SocialList::Followers => {
                self.call("fetch_followers", self.data.fetch_followers(&user_id))
                    .await?
            }
        };

        let count = {
            let mut state = self.state.write().await;
            if !state.is_current(&ticket) {
                debug!(user_id = %user_id, kind = list.fetch_kind().as_str(), "Discarding superseded social fetch");
                return Ok(FetchOutcome::Superseded);
            }
            match list {
                SocialList::Following => state.replace_following(ids),
                SocialList::Followers => state.replace_followers(ids),
            }
        };
        self.emit(match list {
            SocialList::Following => StateChange::FollowingReplaced { count },
            SocialList::Followers => StateChange::FollowersReplaced { count },
        });
        Ok(FetchOutcome::Applied(count))
    }

    /// Fetches whether the viewer follows the profile user.
    ///
    /// Returns `None` on the viewer's own profile, when nobody is signed in, or
    /// when the answer was superseded.
    pub async fn load_follow_status(&self) -> Result<Option<bool>, AppError> {
        let (viewer, target, ticket) = {
            let mut state = self.state.write().await;
            let target = state
                .profile_id()
                .cloned()
                .ok_or(AppError::ProfileNotLoaded)?;
            let Some(viewer) = state.viewer().cloned() else {
                return Ok(None);
            };
            if viewer == target {
                return Ok(None);
            }
            (viewer, target, state.begin_fetch(FetchKind::FollowStatus))
        };

        let following = self
            .call("is_following", self.data.is_following(&viewer, &target))
            .await?;

        {
            let mut state = self.state.write().await;
            if !state.is_current(&ticket) {
                debug!(target = %target, "Discarding superseded follow status");
                return Ok(None);
            }
            state.set_follow_status(following);
        }
        self.emit(StateChange::FollowStatusChanged { target, following });
        Ok(Some(following))
    }

    /// Clears the post list and reloads it when a profile is loaded.
    /// Social counts have their own channel, see [`Self::refresh_social_counts`].
    pub async fn refresh(&self) -> Result<Option<FetchOutcome>, AppError> {
        let has_profile = {
            let mut state = self.state.write().await;
            state.clear_posts();
            state.profile().is_some()
        };
        info!("Refreshing profile feed");
        self.emit(StateChange::PostsReplaced { count: 0 });

        if !has_profile {
            return Ok(None);
        }
        self.load_posts().await.map(Some)
    }

    pub async fn refresh_social_counts(&self) -> SocialCountsReport {
        self.state.write().await.clear_social();
        debug!("Refreshing social counts");
        self.emit(StateChange::FollowingReplaced { count: 0 });
        self.emit(StateChange::FollowersReplaced { count: 0 });
        self.load_social_counts().await
    }

    pub async fn set_view_mode(&self, mode: ViewMode) {
        self.state.write().await.set_view_mode(mode);
        debug!(mode = %mode, "View mode set");
        self.emit(StateChange::ViewModeChanged { mode });
    }

    pub async fn toggle_view_mode(&self) -> ViewMode {
        let mode = {
            let mut state = self.state.write().await;
            let mode = state.view_mode().toggled();
            state.set_view_mode(mode);
            mode
        };
        debug!(mode = %mode, "View mode toggled");
        self.emit(StateChange::ViewModeChanged { mode });
        mode
    }

    /// Follows `target` if the viewer does not follow them yet, unfollows
    /// otherwise. Returns the confirmed following state.
    ///
    /// The local indicator only moves after the backend confirms the mutation.
    /// On failure it is re-announced with its previous value.
    pub async fn toggle_follow(&self, target: &UserId) -> Result<bool, AppError> {
        let viewer = self.data.current_identity().ok_or(AppError::NoIdentity)?;
        if &viewer == target {
            return Err(AppError::InvalidInput(
                "cannot follow your own profile".to_string(),
            ));
        }
        if !self.pending_follows.lock().await.insert(target.clone()) {
            return Err(AppError::MutationPending(format!("follow {target}")));
        }

        let result = self.apply_follow_toggle(&viewer, target).await;
        self.pending_follows.lock().await.remove(target);
        result
    }

    async fn apply_follow_toggle(&self, viewer: &UserId, target: &UserId) -> Result<bool, AppError> {
        let known = {
            let state = self.state.read().await;
            if state.profile_id() == Some(target) {
                state.follow_status()
            } else {
                None
            }
        };
        let was_following = match known {
            Some(following) => following,
            None => {
                self.call("is_following", self.data.is_following(viewer, target))
                    .await?
            }
        };

        let mutation = if was_following {
            self.call("unfollow", self.data.unfollow(target)).await
        } else {
            self.call("follow", self.data.follow(target)).await
        };

        let following = match mutation {
            Ok(()) => !was_following,
            Err(err) => {
                if self.restore_follow_status(target, was_following).await {
                    self.emit(StateChange::FollowStatusChanged {
                        target: target.clone(),
                        following: was_following,
                    });
                }
                return Err(err);
            }
        };

        let on_profile = {
            let mut state = self.state.write().await;
            if state.profile_id() == Some(target) {
                state.confirm_follow_status(following);
                true
            } else {
                false
            }
        };
        info!(viewer = %viewer, target = %target, following, "Follow state changed");
        if on_profile {
            self.emit(StateChange::FollowStatusChanged {
                target: target.clone(),
                following,
            });
        }
        self.notifier.notify(FeedEvent::SocialCountsInvalidated {
            user_id: target.clone(),
        });
        Ok(following)
    }

    async fn restore_follow_status(&self, target: &UserId, following: bool) -> bool {
        let mut state = self.state.write().await;
        if state.profile_id() != Some(target) {
            return false;
        }
        state.set_follow_status(following);
        true
    }

    /// Flips the viewer's like on one post. The row changes only after the
    /// backend accepts the new value, and only that row is announced.
    ///
    /// The pending slot is claimed before the current flag is read and held
    /// until the row is written, so a later toggle always negates the
    /// confirmed value.
    pub async fn toggle_like(&self, post_id: &PostId) -> Result<bool, AppError> {
        let viewer = self.data.current_identity().ok_or(AppError::NoIdentity)?;
        if !self.pending_likes.lock().await.insert(post_id.clone()) {
            return Err(AppError::MutationPending(format!("like {post_id}")));
        }

        let result = self.apply_like_toggle(&viewer, post_id).await;
        self.pending_likes.lock().await.remove(post_id);
        result
    }

    async fn apply_like_toggle(&self, viewer: &UserId, post_id: &PostId) -> Result<bool, AppError> {
        let was_liked = {
            let state = self.state.read().await;
            state
                .find_post(post_id)
                .map(|(_, post)| post.is_liked)
                .ok_or_else(|| AppError::not_found(format!("post {post_id}")))?
        };

        let liked = !was_liked;
        self.call("set_like", self.data.set_like(post_id, viewer, liked))
            .await?;

        let index = self.state.write().await.set_post_liked(post_id, liked);
        match index {
            Some(index) => self.emit(StateChange::PostUpdated {
                post_id: post_id.clone(),
                index,
            }),
            None => debug!(post_id = %post_id, "Liked post left the feed before confirmation"),
        }
        Ok(liked)
    }

    /// Asks every feed listener to reload, e.g. after a new photo was shared.
    pub fn request_feed_refresh(&self) {
        self.notifier.notify(FeedEvent::FeedRefreshRequested);
    }

    /// Discards the session. Results of fetches still in flight are dropped.
    pub async fn deactivate(&self) {
        self.state.write().await.reset(self.initial_view_mode);
        info!("Profile feed deactivated");
        self.emit(StateChange::Deactivated);
    }

    fn emit(&self, change: StateChange) {
        self.notifier.notify(FeedEvent::state(change));
    }

    /// Runs one remote call under the fetch timeout and logs its failure here,
    /// at the call site.
    async fn call<T, F>(&self, operation: &'static str, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        let result = match tokio::time::timeout(self.fetch_timeout, fut).await {
            Ok(result) => result,
            Err(elapsed) => Err(AppError::from(elapsed)),
        };
        if let Err(err) = &result {
            warn!(operation, error = %err, "Remote call failed");
        }
        result
    }
}

#[cfg(test)]
mod tests;
