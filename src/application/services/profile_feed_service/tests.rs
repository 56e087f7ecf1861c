use super::*;
use crate::domain::entities::Post;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use mockall::{mock, predicate::*};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex as StdMutex;
use tokio::sync::Notify;

mock! {
    pub DataSource {}

    #[async_trait]
    impl ProfileDataSource for DataSource {
        fn current_identity(&self) -> Option<UserId>;
        async fn fetch_user(&self, id: &UserId) -> Result<User, AppError>;
        async fn fetch_posts(&self, owner: &UserId) -> Result<Vec<Post>, AppError>;
        async fn fetch_following(&self, id: &UserId) -> Result<HashSet<UserId>, AppError>;
        async fn fetch_followers(&self, id: &UserId) -> Result<HashSet<UserId>, AppError>;
        async fn is_following(&self, viewer: &UserId, target: &UserId) -> Result<bool, AppError>;
        async fn follow(&self, target: &UserId) -> Result<(), AppError>;
        async fn unfollow(&self, target: &UserId) -> Result<(), AppError>;
        async fn set_like(&self, post: &PostId, viewer: &UserId, liked: bool) -> Result<(), AppError>;
    }
}

#[derive(Default)]
struct RecordingNotifier {
    events: StdMutex<Vec<FeedEvent>>,
}

impl RecordingNotifier {
    fn take(&self) -> Vec<FeedEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl FeedNotifier for RecordingNotifier {
    fn notify(&self, event: FeedEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn user(id: &str) -> User {
    User::new(UserId::from(id), id)
}

fn post(id: &str, ts: i64) -> Post {
    Post::new_with_id(
        PostId::from(id),
        UserId::from("alice"),
        format!("https://img.example/{id}.jpg"),
        "",
        Utc.timestamp_opt(ts, 0).unwrap(),
    )
}

fn ids(values: &[&str]) -> HashSet<UserId> {
    values.iter().map(|v| UserId::from(*v)).collect()
}

fn service_with(
    data: Arc<dyn ProfileDataSource>,
) -> (ProfileFeedService, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let service = ProfileFeedService::new(data, notifier.clone(), &FeedConfig::default());
    (service, notifier)
}

/// Mock for alice viewing her own profile with three posts and small social lists.
fn own_profile_mock() -> MockDataSource {
    let mut data = MockDataSource::new();
    data.expect_current_identity()
        .returning(|| Some(UserId::from("alice")));
    data.expect_fetch_user()
        .with(eq(UserId::from("alice")))
        .returning(|_| Ok(user("alice")));
    data.expect_fetch_posts()
        .with(eq(UserId::from("alice")))
        .returning(|_| Ok(vec![post("1", 100), post("2", 300), post("3", 200)]));
    data.expect_fetch_following()
        .returning(|_| Ok(ids(&["bob", "carol"])));
    data.expect_fetch_followers()
        .returning(|_| Ok(ids(&["bob"])));
    data
}

/// Mock for alice viewing bob's profile.
fn other_profile_mock(following: bool) -> MockDataSource {
    let mut data = MockDataSource::new();
    data.expect_current_identity()
        .returning(|| Some(UserId::from("alice")));
    data.expect_fetch_user()
        .with(eq(UserId::from("bob")))
        .returning(|_| Ok(user("bob")));
    data.expect_fetch_posts().returning(|_| Ok(vec![]));
    data.expect_fetch_following().returning(|_| Ok(HashSet::new()));
    data.expect_fetch_followers().returning(|_| Ok(HashSet::new()));
    data.expect_is_following()
        .with(eq(UserId::from("alice")), eq(UserId::from("bob")))
        .returning(move |_, _| Ok(following));
    data
}

#[tokio::test]
async fn test_load_profile_falls_back_to_current_identity() {
    let (service, notifier) = service_with(Arc::new(own_profile_mock()));

    let loaded = service.load_profile(None).await.unwrap();

    assert_eq!(loaded.id.as_str(), "alice");
    let snapshot = service.snapshot().await;
    assert!(snapshot.is_own_profile());
    assert_eq!(snapshot.post_ids(), vec!["2", "3", "1"]);
    assert_eq!(snapshot.following.len(), 2);
    assert_eq!(snapshot.followers.len(), 1);
    assert_eq!(snapshot.follow_status, None);

    let events = notifier.take();
    assert_eq!(
        events.first(),
        Some(&FeedEvent::state(StateChange::ProfileLoaded {
            user_id: UserId::from("alice")
        }))
    );
    assert!(events.contains(&FeedEvent::state(StateChange::PostsReplaced { count: 3 })));
}

#[tokio::test]
async fn test_load_profile_without_any_identity_fails() {
    let mut data = MockDataSource::new();
    data.expect_current_identity().returning(|| None);
    let (service, notifier) = service_with(Arc::new(data));

    let result = service.load_profile(None).await;

    assert_eq!(result, Err(AppError::NoIdentity));
    assert!(service.snapshot().await.profile.is_none());
    assert!(notifier.take().is_empty());
}

#[tokio::test]
async fn test_load_profile_with_explicit_id_works_signed_out() {
    let mut data = MockDataSource::new();
    data.expect_current_identity().returning(|| None);
    data.expect_fetch_user()
        .with(eq(UserId::from("bob")))
        .times(1)
        .returning(|_| Ok(user("bob")));
    data.expect_fetch_posts().returning(|_| Ok(vec![post("9", 10)]));
    data.expect_fetch_following().returning(|_| Ok(HashSet::new()));
    data.expect_fetch_followers().returning(|_| Ok(HashSet::new()));
    data.expect_is_following().never();
    let (service, _) = service_with(Arc::new(data));

    service.load_profile(Some(UserId::from("bob"))).await.unwrap();

    let snapshot = service.snapshot().await;
    assert_eq!(snapshot.post_ids(), vec!["9"]);
    assert_eq!(snapshot.follow_status, None);
}

#[tokio::test]
async fn test_failed_user_fetch_keeps_previous_profile() {
    let mut data = own_profile_mock();
    data.expect_fetch_user()
        .with(eq(UserId::from("ghost")))
        .returning(|_| Err(AppError::not_found("user ghost")));
    let (service, notifier) = service_with(Arc::new(data));
    service.load_profile(None).await.unwrap();
    let before = service.snapshot().await;
    notifier.take();

    let result = service.load_profile(Some(UserId::from("ghost"))).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert_eq!(service.snapshot().await, before);
    assert!(notifier.take().is_empty());
}

#[tokio::test]
async fn test_load_posts_requires_loaded_profile() {
    let (service, _) = service_with(Arc::new(MockDataSource::new()));

    assert_eq!(service.load_posts().await, Err(AppError::ProfileNotLoaded));
    let report = service.load_social_counts().await;
    assert_eq!(report.following, Err(AppError::ProfileNotLoaded));
    assert_eq!(report.followers, Err(AppError::ProfileNotLoaded));
}

#[tokio::test]
async fn test_load_posts_keeps_fetch_order_for_equal_timestamps() {
    let mut data = MockDataSource::new();
    data.expect_current_identity()
        .returning(|| Some(UserId::from("alice")));
    data.expect_fetch_user().returning(|_| Ok(user("alice")));
    data.expect_fetch_posts().returning(|_| {
        Ok(vec![
            post("a", 50),
            post("b", 80),
            post("c", 50),
            post("d", 80),
        ])
    });
    data.expect_fetch_following().returning(|_| Ok(HashSet::new()));
    data.expect_fetch_followers().returning(|_| Ok(HashSet::new()));
    let (service, _) = service_with(Arc::new(data));

    service.load_profile(None).await.unwrap();

    assert_eq!(service.snapshot().await.post_ids(), vec!["b", "d", "a", "c"]);
}

#[tokio::test]
async fn test_failed_post_fetch_keeps_previous_posts() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut data = MockDataSource::new();
    data.expect_current_identity()
        .returning(|| Some(UserId::from("alice")));
    data.expect_fetch_user().returning(|_| Ok(user("alice")));
    let counter = calls.clone();
    data.expect_fetch_posts().returning(move |_| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(vec![post("1", 100)])
        } else {
            Err(AppError::network("offline"))
        }
    });
    data.expect_fetch_following().returning(|_| Ok(HashSet::new()));
    data.expect_fetch_followers().returning(|_| Ok(HashSet::new()));
    let (service, _) = service_with(Arc::new(data));
    service.load_profile(None).await.unwrap();

    let result = service.load_posts().await;

    assert_eq!(result, Err(AppError::network("offline")));
    assert_eq!(service.snapshot().await.post_ids(), vec!["1"]);
}

#[tokio::test]
async fn test_social_list_failure_does_not_block_the_other() {
    let mut data = MockDataSource::new();
    data.expect_current_identity()
        .returning(|| Some(UserId::from("alice")));
    data.expect_fetch_user().returning(|_| Ok(user("alice")));
    data.expect_fetch_posts().returning(|_| Ok(vec![]));
    data.expect_fetch_following()
        .returning(|_| Ok(ids(&["bob", "carol"])));
    data.expect_fetch_followers()
        .returning(|_| Err(AppError::network("followers unavailable")));
    let (service, _) = service_with(Arc::new(data));
    service.load_profile(None).await.unwrap();

    let report = service.refresh_social_counts().await;

    assert_eq!(report.following, Ok(FetchOutcome::Applied(2)));
    assert!(matches!(report.followers, Err(AppError::Network(_))));
    let snapshot = service.snapshot().await;
    assert_eq!(snapshot.following, ids(&["bob", "carol"]));
    assert!(snapshot.followers.is_empty());
}

#[tokio::test]
async fn test_social_lists_land_in_their_own_sets() {
    let mut data = MockDataSource::new();
    data.expect_current_identity()
        .returning(|| Some(UserId::from("alice")));
    data.expect_fetch_user().returning(|_| Ok(user("alice")));
    data.expect_fetch_posts().returning(|_| Ok(vec![]));
    data.expect_fetch_following()
        .returning(|_| Ok(ids(&["bob", "carol"])));
    data.expect_fetch_followers()
        .returning(|_| Ok(ids(&["dave"])));
    let (service, notifier) = service_with(Arc::new(data));
    service.load_profile(None).await.unwrap();
    notifier.take();

    let report = service.load_social_counts().await;

    assert_eq!(report.following, Ok(FetchOutcome::Applied(2)));
    assert_eq!(report.followers, Ok(FetchOutcome::Applied(1)));
    let snapshot = service.snapshot().await;
    assert_eq!(snapshot.following, ids(&["bob", "carol"]));
    assert_eq!(snapshot.followers, ids(&["dave"]));
    let events = notifier.take();
    assert!(events.contains(&FeedEvent::state(StateChange::FollowingReplaced { count: 2 })));
    assert!(events.contains(&FeedEvent::state(StateChange::FollowersReplaced { count: 1 })));
}

#[tokio::test]
async fn test_refresh_with_empty_result_yields_empty_feed() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut data = MockDataSource::new();
    data.expect_current_identity()
        .returning(|| Some(UserId::from("alice")));
    data.expect_fetch_user().returning(|_| Ok(user("alice")));
    let counter = calls.clone();
    data.expect_fetch_posts().returning(move |_| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(vec![post("1", 100), post("2", 200)])
        } else {
            Ok(vec![])
        }
    });
    data.expect_fetch_following().returning(|_| Ok(HashSet::new()));
    data.expect_fetch_followers().returning(|_| Ok(HashSet::new()));
    let (service, _) = service_with(Arc::new(data));
    service.load_profile(None).await.unwrap();
    assert_eq!(service.snapshot().await.posts.len(), 2);

    let outcome = service.refresh().await.unwrap();

    assert_eq!(outcome, Some(FetchOutcome::Applied(0)));
    assert!(service.snapshot().await.posts.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_refresh_without_profile_only_clears() {
    let (service, notifier) = service_with(Arc::new(MockDataSource::new()));

    assert_eq!(service.refresh().await, Ok(None));
    assert_eq!(
        notifier.take(),
        vec![FeedEvent::state(StateChange::PostsReplaced { count: 0 })]
    );
}

#[tokio::test]
async fn test_view_mode_switches_without_remote_calls() {
    let (service, notifier) = service_with(Arc::new(MockDataSource::new()));
    assert_eq!(service.view_mode().await, ViewMode::Grid);

    assert_eq!(service.toggle_view_mode().await, ViewMode::Chronological);
    service.set_view_mode(ViewMode::Grid).await;
    assert_eq!(service.toggle_view_mode().await, ViewMode::Chronological);

    assert_eq!(service.view_mode().await, ViewMode::Chronological);
    assert_eq!(
        notifier.take(),
        vec![
            FeedEvent::state(StateChange::ViewModeChanged {
                mode: ViewMode::Chronological
            }),
            FeedEvent::state(StateChange::ViewModeChanged {
                mode: ViewMode::Grid
            }),
            FeedEvent::state(StateChange::ViewModeChanged {
                mode: ViewMode::Chronological
            }),
        ]
    );
}

#[tokio::test]
async fn test_initial_view_mode_comes_from_config() {
    let config = FeedConfig {
        initial_view_mode: ViewMode::Chronological,
        ..FeedConfig::default()
    };
    let service = ProfileFeedService::new(
        Arc::new(MockDataSource::new()),
        Arc::new(RecordingNotifier::default()),
        &config,
    );

    assert_eq!(service.view_mode().await, ViewMode::Chronological);
    service.toggle_view_mode().await;
    service.deactivate().await;
    assert_eq!(service.view_mode().await, ViewMode::Chronological);
}

fn like_mock() -> MockDataSource {
    let mut data = MockDataSource::new();
    data.expect_current_identity()
        .returning(|| Some(UserId::from("alice")));
    data.expect_fetch_user().returning(|_| Ok(user("alice")));
    data.expect_fetch_posts()
        .returning(|_| Ok(vec![post("4", 100), post("5", 200)]));
    data.expect_fetch_following().returning(|_| Ok(HashSet::new()));
    data.expect_fetch_followers().returning(|_| Ok(HashSet::new()));
    data
}

#[tokio::test]
async fn test_toggle_like_updates_single_row_on_success() {
    let mut data = like_mock();
    data.expect_set_like()
        .with(eq(PostId::from("5")), eq(UserId::from("alice")), eq(true))
        .times(1)
        .returning(|_, _, _| Ok(()));
    let (service, notifier) = service_with(Arc::new(data));
    service.load_profile(None).await.unwrap();
    notifier.take();

    let liked = service.toggle_like(&PostId::from("5")).await.unwrap();

    assert!(liked);
    let snapshot = service.snapshot().await;
    assert!(snapshot.posts[0].is_liked);
    assert!(!snapshot.posts[1].is_liked);
    let events = notifier.take();
    assert_eq!(
        events,
        vec![FeedEvent::state(StateChange::PostUpdated {
            post_id: PostId::from("5"),
            index: 0,
        })]
    );
    assert!(events.iter().all(|event| !event.is_full_reload()));
}

#[tokio::test]
async fn test_toggle_like_failure_leaves_flag_unchanged() {
    let mut data = like_mock();
    data.expect_set_like()
        .with(eq(PostId::from("4")), eq(UserId::from("alice")), eq(true))
        .times(1)
        .returning(|_, _, _| Err(AppError::network("write rejected")));
    let (service, notifier) = service_with(Arc::new(data));
    service.load_profile(None).await.unwrap();
    notifier.take();

    let result = service.toggle_like(&PostId::from("4")).await;

    assert!(matches!(result, Err(AppError::Network(_))));
    assert!(!service.snapshot().await.posts[1].is_liked);
    assert!(notifier.take().is_empty());
}

#[tokio::test]
async fn test_second_toggle_failing_keeps_value_from_before_it() {
    let mut data = like_mock();
    data.expect_set_like()
        .with(eq(PostId::from("5")), eq(UserId::from("alice")), eq(true))
        .times(1)
        .returning(|_, _, _| Ok(()));
    data.expect_set_like()
        .with(eq(PostId::from("5")), eq(UserId::from("alice")), eq(false))
        .times(1)
        .returning(|_, _, _| Err(AppError::network("timeout")));
    let (service, _) = service_with(Arc::new(data));
    service.load_profile(None).await.unwrap();

    assert_eq!(service.toggle_like(&PostId::from("5")).await, Ok(true));
    assert!(service.toggle_like(&PostId::from("5")).await.is_err());

    assert!(service.snapshot().await.posts[0].is_liked);
}

#[tokio::test]
async fn test_toggle_like_unknown_post_is_not_found() {
    let mut data = like_mock();
    data.expect_set_like().never();
    let (service, _) = service_with(Arc::new(data));
    service.load_profile(None).await.unwrap();

    let result = service.toggle_like(&PostId::from("missing")).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_toggle_follow_failure_keeps_indicator() {
    let mut data = other_profile_mock(false);
    data.expect_follow()
        .with(eq(UserId::from("bob")))
        .times(1)
        .returning(|_| Err(AppError::network("unreachable")));
    let (service, notifier) = service_with(Arc::new(data));
    service.load_profile(Some(UserId::from("bob"))).await.unwrap();
    assert_eq!(service.snapshot().await.follow_status, Some(false));
    notifier.take();

    let result = service.toggle_follow(&UserId::from("bob")).await;

    assert!(matches!(result, Err(AppError::Network(_))));
    assert_eq!(service.snapshot().await.follow_status, Some(false));
    let events = notifier.take();
    assert_eq!(
        events,
        vec![FeedEvent::state(StateChange::FollowStatusChanged {
            target: UserId::from("bob"),
            following: false,
        })]
    );
}

#[tokio::test]
async fn test_toggle_follow_unfollows_and_invalidates_counts() {
    let mut data = other_profile_mock(true);
    data.expect_unfollow()
        .with(eq(UserId::from("bob")))
        .times(1)
        .returning(|_| Ok(()));
    data.expect_follow().never();
    let (service, notifier) = service_with(Arc::new(data));
    service.load_profile(Some(UserId::from("bob"))).await.unwrap();
    notifier.take();

    let following = service.toggle_follow(&UserId::from("bob")).await.unwrap();

    assert!(!following);
    assert_eq!(service.snapshot().await.follow_status, Some(false));
    assert_eq!(
        notifier.take(),
        vec![
            FeedEvent::state(StateChange::FollowStatusChanged {
                target: UserId::from("bob"),
                following: false,
            }),
            FeedEvent::SocialCountsInvalidated {
                user_id: UserId::from("bob")
            },
        ]
    );
}

#[tokio::test]
async fn test_toggle_follow_off_profile_queries_status_first() {
    let mut data = own_profile_mock();
    data.expect_is_following()
        .with(eq(UserId::from("alice")), eq(UserId::from("dave")))
        .times(1)
        .returning(|_, _| Ok(false));
    data.expect_follow()
        .with(eq(UserId::from("dave")))
        .times(1)
        .returning(|_| Ok(()));
    let (service, notifier) = service_with(Arc::new(data));
    service.load_profile(None).await.unwrap();
    notifier.take();

    assert_eq!(service.toggle_follow(&UserId::from("dave")).await, Ok(true));
    assert_eq!(service.snapshot().await.follow_status, None);
    assert_eq!(
        notifier.take(),
        vec![FeedEvent::SocialCountsInvalidated {
            user_id: UserId::from("dave")
        }]
    );
}

#[tokio::test]
async fn test_toggle_follow_rejects_self() {
    let (service, _) = service_with(Arc::new(own_profile_mock()));

    let result = service.toggle_follow(&UserId::from("alice")).await;

    assert!(matches!(result, Err(AppError::InvalidInput(_))));
}

#[tokio::test]
async fn test_request_feed_refresh_emits_signal() {
    let (service, notifier) = service_with(Arc::new(MockDataSource::new()));

    service.request_feed_refresh();

    assert_eq!(notifier.take(), vec![FeedEvent::FeedRefreshRequested]);
}

/// Hand-rolled source whose mutations and chosen post fetches block until released.
struct GatedSource {
    follow_entered: Notify,
    follow_release: Notify,
    follow_error: StdMutex<Option<AppError>>,
    posts: StdMutex<VecDeque<(bool, Vec<Post>)>>,
    posts_entered: Notify,
    posts_release: Notify,
    like_entered: Notify,
    like_release: Notify,
    likes_sent: StdMutex<Vec<bool>>,
}

impl GatedSource {
    fn new() -> Self {
        Self {
            follow_entered: Notify::new(),
            follow_release: Notify::new(),
            follow_error: StdMutex::new(None),
            posts: StdMutex::new(VecDeque::new()),
            posts_entered: Notify::new(),
            posts_release: Notify::new(),
            like_entered: Notify::new(),
            like_release: Notify::new(),
            likes_sent: StdMutex::new(Vec::new()),
        }
    }

    fn queue_posts(&self, gated: bool, posts: Vec<Post>) {
        self.posts.lock().unwrap().push_back((gated, posts));
    }
}

#[async_trait]
impl ProfileDataSource for GatedSource {
    fn current_identity(&self) -> Option<UserId> {
        Some(UserId::from("alice"))
    }

    async fn fetch_user(&self, id: &UserId) -> Result<User, AppError> {
        Ok(User::new(id.clone(), id.as_str()))
    }

    async fn fetch_posts(&self, _owner: &UserId) -> Result<Vec<Post>, AppError> {
        let next = self.posts.lock().unwrap().pop_front();
        let Some((gated, posts)) = next else {
            return Ok(vec![]);
        };
        if gated {
            self.posts_entered.notify_one();
            self.posts_release.notified().await;
        }
        Ok(posts)
    }

    async fn fetch_following(&self, _id: &UserId) -> Result<HashSet<UserId>, AppError> {
        Ok(HashSet::new())
    }

    async fn fetch_followers(&self, _id: &UserId) -> Result<HashSet<UserId>, AppError> {
        Ok(HashSet::new())
    }

    async fn is_following(&self, _viewer: &UserId, _target: &UserId) -> Result<bool, AppError> {
        Ok(false)
    }

    async fn follow(&self, _target: &UserId) -> Result<(), AppError> {
        self.follow_entered.notify_one();
        self.follow_release.notified().await;
        match self.follow_error.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn unfollow(&self, target: &UserId) -> Result<(), AppError> {
        self.follow(target).await
    }

    async fn set_like(&self, _post: &PostId, _viewer: &UserId, liked: bool) -> Result<(), AppError> {
        self.likes_sent.lock().unwrap().push(liked);
        self.like_entered.notify_one();
        self.like_release.notified().await;
        Ok(())
    }
}

fn gated_service(source: &Arc<GatedSource>) -> (Arc<ProfileFeedService>, Arc<RecordingNotifier>) {
    let (service, notifier) = service_with(source.clone());
    (Arc::new(service), notifier)
}

#[tokio::test]
async fn test_follow_indicator_waits_for_confirmation() {
    let source = Arc::new(GatedSource::new());
    let (service, _) = gated_service(&source);
    service.load_profile(Some(UserId::from("bob"))).await.unwrap();

    let task = tokio::spawn({
        let service = service.clone();
        async move { service.toggle_follow(&UserId::from("bob")).await }
    });
    source.follow_entered.notified().await;

    assert_eq!(service.snapshot().await.follow_status, Some(false));

    source.follow_release.notify_one();
    assert_eq!(task.await.unwrap(), Ok(true));
    assert_eq!(service.snapshot().await.follow_status, Some(true));
}

#[tokio::test]
async fn test_delayed_follow_failure_never_flips_indicator() {
    let source = Arc::new(GatedSource::new());
    *source.follow_error.lock().unwrap() = Some(AppError::network("dropped"));
    let (service, _) = gated_service(&source);
    service.load_profile(Some(UserId::from("bob"))).await.unwrap();

    let task = tokio::spawn({
        let service = service.clone();
        async move { service.toggle_follow(&UserId::from("bob")).await }
    });
    source.follow_entered.notified().await;
    assert_eq!(service.snapshot().await.follow_status, Some(false));

    source.follow_release.notify_one();
    assert!(task.await.unwrap().is_err());
    assert_eq!(service.snapshot().await.follow_status, Some(false));
}

#[tokio::test]
async fn test_overlapping_follow_toggle_is_rejected() {
    let source = Arc::new(GatedSource::new());
    let (service, _) = gated_service(&source);
    service.load_profile(Some(UserId::from("bob"))).await.unwrap();

    let task = tokio::spawn({
        let service = service.clone();
        async move { service.toggle_follow(&UserId::from("bob")).await }
    });
    source.follow_entered.notified().await;

    let second = service.toggle_follow(&UserId::from("bob")).await;
    assert!(matches!(second, Err(AppError::MutationPending(_))));

    source.follow_release.notify_one();
    assert_eq!(task.await.unwrap(), Ok(true));
}

#[tokio::test]
async fn test_stale_post_fetch_does_not_overwrite_refresh() {
    let source = Arc::new(GatedSource::new());
    source.queue_posts(true, vec![post("old", 100)]);
    source.queue_posts(false, vec![post("new-1", 300), post("new-2", 400)]);
    let (service, _) = gated_service(&source);

    let initial = tokio::spawn({
        let service = service.clone();
        async move { service.load_profile(None).await }
    });
    source.posts_entered.notified().await;

    let refreshed = service.refresh().await.unwrap();
    assert_eq!(refreshed, Some(FetchOutcome::Applied(2)));

    source.posts_release.notify_one();
    initial.await.unwrap().unwrap();

    assert_eq!(service.snapshot().await.post_ids(), vec!["new-2", "new-1"]);
}

#[tokio::test]
async fn test_deactivate_discards_in_flight_results() {
    let source = Arc::new(GatedSource::new());
    source.queue_posts(true, vec![post("late", 100)]);
    let (service, notifier) = gated_service(&source);

    let initial = tokio::spawn({
        let service = service.clone();
        async move { service.load_profile(None).await }
    });
    source.posts_entered.notified().await;
    service.deactivate().await;
    source.posts_release.notify_one();
    initial.await.unwrap().unwrap();

    let snapshot = service.snapshot().await;
    assert!(snapshot.profile.is_none());
    assert!(snapshot.posts.is_empty());
    assert!(notifier
        .take()
        .contains(&FeedEvent::state(StateChange::Deactivated)));
}

#[tokio::test]
async fn test_like_toggles_serialize_on_the_confirmed_value() {
    let source = Arc::new(GatedSource::new());
    source.queue_posts(false, vec![post("p1", 100)]);
    let (service, _) = gated_service(&source);
    service.load_profile(None).await.unwrap();

    let first = tokio::spawn({
        let service = service.clone();
        async move { service.toggle_like(&PostId::from("p1")).await }
    });
    source.like_entered.notified().await;

    let overlapping = service.toggle_like(&PostId::from("p1")).await;
    assert!(matches!(overlapping, Err(AppError::MutationPending(_))));

    source.like_release.notify_one();
    assert_eq!(first.await.unwrap(), Ok(true));
    assert!(service.snapshot().await.posts[0].is_liked);

    source.like_release.notify_one();
    assert_eq!(service.toggle_like(&PostId::from("p1")).await, Ok(false));
    assert_eq!(*source.likes_sent.lock().unwrap(), vec![true, false]);
}

#[tokio::test]
async fn test_unknown_post_releases_like_slot() {
    let source = Arc::new(GatedSource::new());
    source.queue_posts(false, vec![post("p1", 100)]);
    let (service, _) = gated_service(&source);
    service.load_profile(None).await.unwrap();

    let missing = service.toggle_like(&PostId::from("gone")).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
    let again = service.toggle_like(&PostId::from("gone")).await;
    assert!(matches!(again, Err(AppError::NotFound(_))));
}
