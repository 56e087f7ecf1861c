use crate::application::services::ProfileFeedService;
use crate::domain::entities::FeedEvent;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Reloads the parts of the feed other screens have invalidated.
///
/// `SocialCountsInvalidated` re-fetches following/followers and
/// `FeedRefreshRequested` reloads the posts. The service keeps the sending
/// side alive, so callers normally stop the task by aborting the handle.
pub fn spawn_feed_event_listener(
    service: Arc<ProfileFeedService>,
    mut receiver: broadcast::Receiver<FeedEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(FeedEvent::SocialCountsInvalidated { user_id }) => {
                    debug!(user_id = %user_id, "Social counts invalidated");
                    service.refresh_social_counts().await;
                }
                Ok(FeedEvent::FeedRefreshRequested) => {
                    if let Err(err) = service.refresh().await {
                        warn!(error = %err, "Feed refresh failed");
                    }
                }
                Ok(FeedEvent::StateChanged(_)) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Feed event listener lagged behind");
                }
                Err(RecvError::Closed) => {
                    info!("Feed event channel closed; listener stopping");
                    break;
                }
            }
        }
    })
}
