pub mod profile_feed_dto;

pub use profile_feed_dto::{
    FeedItemDto, GridItemDto, HeaderAction, ListItemDto, ProfileFeedView, ProfileHeaderDto,
};
