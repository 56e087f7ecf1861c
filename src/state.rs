use crate::application::ports::{FeedNotifier, ProfileDataSource};
use crate::application::services::ProfileFeedService;
use crate::domain::entities::FeedEvent;
use crate::infrastructure::event::{spawn_feed_event_listener, BroadcastFeedNotifier};
use crate::infrastructure::remote::FirebaseRestDataSource;
use crate::shared::config::AppConfig;
use crate::shared::error::AppError;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::info;

/// A wired profile screen: the feed service, its event channel, and the
/// listener that reacts to invalidation events.
pub struct ProfileFeedState {
    pub service: Arc<ProfileFeedService>,
    pub notifier: BroadcastFeedNotifier,
    listener: JoinHandle<()>,
}

impl ProfileFeedState {
    /// Must be called from within a tokio runtime; the event listener is spawned here.
    pub fn new(config: &AppConfig, data: Arc<dyn ProfileDataSource>) -> Result<Self, AppError> {
        config.validate().map_err(AppError::Configuration)?;

        let notifier = BroadcastFeedNotifier::new(config.feed.event_capacity);
        let feed_notifier: Arc<dyn FeedNotifier> = Arc::new(notifier.clone());
        let service = Arc::new(ProfileFeedService::new(data, feed_notifier, &config.feed));
        let listener = spawn_feed_event_listener(service.clone(), notifier.subscribe());

        info!(
            view_mode = %config.feed.initial_view_mode,
            event_capacity = config.feed.event_capacity,
            "Profile feed initialized"
        );
        Ok(Self {
            service,
            notifier,
            listener,
        })
    }

    /// Wires the Firebase REST backend described by `config.remote`.
    pub fn with_firebase(config: &AppConfig) -> Result<Self, AppError> {
        let data: Arc<dyn ProfileDataSource> =
            Arc::new(FirebaseRestDataSource::from_config(&config.remote)?);
        Self::new(config, data)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.notifier.subscribe()
    }

    /// Stops the listener and drops the session state.
    pub async fn shutdown(self) {
        self.listener.abort();
        self.service.deactivate().await;
    }
}
