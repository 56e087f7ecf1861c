pub mod profile_feed_service;

pub use profile_feed_service::{FetchOutcome, ProfileFeedService, SocialCountsReport};
