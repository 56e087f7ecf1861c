pub mod broadcast_notifier;
pub mod feed_event_listener;

pub use broadcast_notifier::BroadcastFeedNotifier;
pub use feed_event_listener::spawn_feed_event_listener;
