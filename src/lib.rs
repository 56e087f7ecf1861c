pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
pub mod shared;
pub mod state;

pub use application::services::{FetchOutcome, ProfileFeedService, SocialCountsReport};
pub use shared::{AppConfig, AppError, Result};
pub use state::ProfileFeedState;

/// Installs the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "profile_feed=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
