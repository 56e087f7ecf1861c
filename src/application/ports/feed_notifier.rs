use crate::domain::entities::FeedEvent;

/// Delivers feed events to whoever renders the profile screen.
pub trait FeedNotifier: Send + Sync {
    fn notify(&self, event: FeedEvent);
}
