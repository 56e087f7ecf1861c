use crate::application::ports::FeedNotifier;
use crate::domain::entities::FeedEvent;
use tokio::sync::broadcast;
use tracing::trace;

/// Fans feed events out to every subscribed view over a bounded broadcast channel.
#[derive(Clone)]
pub struct BroadcastFeedNotifier {
    sender: broadcast::Sender<FeedEvent>,
}

impl BroadcastFeedNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl FeedNotifier for BroadcastFeedNotifier {
    fn notify(&self, event: FeedEvent) {
        // No subscribers is fine: nothing is on screen to update.
        if let Err(broadcast::error::SendError(event)) = self.sender.send(event) {
            trace!(?event, "Feed event dropped without subscribers");
        }
    }
}
