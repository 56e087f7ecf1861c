pub mod fetch_generation;
pub mod post_id;
pub mod user_id;
pub mod view_mode;

pub use fetch_generation::{FetchGenerations, FetchKind, FetchTicket};
pub use post_id::PostId;
pub use user_id::UserId;
pub use view_mode::ViewMode;
