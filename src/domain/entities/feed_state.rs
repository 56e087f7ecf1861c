use super::post::{sort_newest_first, Post};
use super::user::User;
use crate::domain::value_objects::{
    FetchGenerations, FetchKind, FetchTicket, PostId, UserId, ViewMode,
};
use serde::Serialize;
use std::collections::HashSet;

/// Mutable state behind a profile screen. Owned by the feed service; views
/// only ever see a [`FeedSnapshot`].
#[derive(Debug, Clone)]
pub struct FeedState {
    profile: Option<User>,
    viewer: Option<UserId>,
    posts: Vec<Post>,
    following: HashSet<UserId>,
    followers: HashSet<UserId>,
    follow_status: Option<bool>,
    view_mode: ViewMode,
    generations: FetchGenerations,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FeedSnapshot {
    pub profile: Option<User>,
    pub viewer: Option<UserId>,
    pub posts: Vec<Post>,
    pub following: HashSet<UserId>,
    pub followers: HashSet<UserId>,
    /// Whether the viewer follows the profile user. `None` on the viewer's
    /// own profile or before the status has been fetched.
    pub follow_status: Option<bool>,
    pub view_mode: ViewMode,
}

impl FeedSnapshot {
    pub fn is_own_profile(&self) -> bool {
        match (&self.profile, &self.viewer) {
            (Some(profile), Some(viewer)) => &profile.id == viewer,
            _ => false,
        }
    }

    pub fn post_ids(&self) -> Vec<&str> {
        self.posts.iter().map(|p| p.id.as_str()).collect()
    }
}

impl FeedState {
    pub fn new(view_mode: ViewMode) -> Self {
        Self {
            profile: None,
            viewer: None,
            posts: Vec::new(),
            following: HashSet::new(),
            followers: HashSet::new(),
            follow_status: None,
            view_mode,
            generations: FetchGenerations::default(),
        }
    }

    pub fn profile(&self) -> Option<&User> {
        self.profile.as_ref()
    }

    pub fn profile_id(&self) -> Option<&UserId> {
        self.profile.as_ref().map(|user| &user.id)
    }

    pub fn viewer(&self) -> Option<&UserId> {
        self.viewer.as_ref()
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn following(&self) -> &HashSet<UserId> {
        &self.following
    }

    pub fn followers(&self) -> &HashSet<UserId> {
        &self.followers
    }

    pub fn follow_status(&self) -> Option<bool> {
        self.follow_status
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn is_own_profile(&self) -> bool {
        match (self.profile_id(), &self.viewer) {
            (Some(profile), Some(viewer)) => profile == viewer,
            _ => false,
        }
    }

    /// Installs a freshly fetched profile. Switching to a different identity
    /// discards everything loaded for the previous one.
    pub fn activate(&mut self, user: User, viewer: Option<UserId>) {
        let same_identity = self.profile_id() == Some(&user.id);
        if !same_identity {
            self.clear_posts();
            self.clear_social();
            self.follow_status = None;
            self.generations.supersede(FetchKind::FollowStatus);
        }
        if viewer.as_ref() == Some(&user.id) {
            self.follow_status = None;
        }
        self.profile = Some(user);
        self.viewer = viewer;
    }

    /// Drops all session data. The view mode survives so the next activation
    /// starts from the configured layout.
    pub fn reset(&mut self, view_mode: ViewMode) {
        self.profile = None;
        self.viewer = None;
        self.posts.clear();
        self.following.clear();
        self.followers.clear();
        self.follow_status = None;
        self.view_mode = view_mode;
        self.generations.supersede_all();
    }

    pub fn begin_fetch(&mut self, kind: FetchKind) -> FetchTicket {
        self.generations.begin(kind)
    }

    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.generations.is_current(ticket)
    }

    /// Sorts `posts` newest first and swaps them in as one step.
    pub fn replace_posts(&mut self, mut posts: Vec<Post>) -> usize {
        sort_newest_first(&mut posts);
        self.posts = posts;
        self.posts.len()
    }

    pub fn clear_posts(&mut self) {
        self.posts.clear();
        self.generations.supersede(FetchKind::Posts);
    }

    pub fn replace_following(&mut self, ids: HashSet<UserId>) -> usize {
        self.following = ids;
        self.following.len()
    }

    pub fn replace_followers(&mut self, ids: HashSet<UserId>) -> usize {
        self.followers = ids;
        self.followers.len()
    }

    pub fn clear_social(&mut self) {
        self.following.clear();
        self.followers.clear();
        self.generations.supersede(FetchKind::Following);
        self.generations.supersede(FetchKind::Followers);
    }

    pub fn set_follow_status(&mut self, following: bool) {
        self.follow_status = Some(following);
    }

    /// A confirmed follow mutation is newer than any status query still in flight.
    pub fn confirm_follow_status(&mut self, following: bool) {
        self.follow_status = Some(following);
        self.generations.supersede(FetchKind::FollowStatus);
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }

    pub fn find_post(&self, id: &PostId) -> Option<(usize, &Post)> {
        self.posts.iter().enumerate().find(|(_, post)| &post.id == id)
    }

    /// Sets the like flag on one post and returns its row index.
    pub fn set_post_liked(&mut self, id: &PostId, liked: bool) -> Option<usize> {
        let index = self.posts.iter().position(|post| &post.id == id)?;
        self.posts[index].is_liked = liked;
        Some(index)
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            profile: self.profile.clone(),
            viewer: self.viewer.clone(),
            posts: self.posts.clone(),
            following: self.following.clone(),
            followers: self.followers.clone(),
            follow_status: self.follow_status,
            view_mode: self.view_mode,
        }
    }
}

impl Default for FeedState {
    fn default() -> Self {
        Self::new(ViewMode::default())
    }
}
