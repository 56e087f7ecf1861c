pub mod feed_event;
pub mod feed_state;
pub mod post;
pub mod user;

pub use feed_event::{FeedEvent, StateChange};
pub use feed_state::{FeedSnapshot, FeedState};
pub use post::{sort_newest_first, Post};
pub use user::User;
