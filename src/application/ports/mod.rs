pub mod feed_notifier;
pub mod profile_data;

pub use feed_notifier::FeedNotifier;
pub use profile_data::ProfileDataSource;
