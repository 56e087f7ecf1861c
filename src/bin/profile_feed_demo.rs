use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, Utc};
use clap::Parser;
use profile_feed::domain::entities::{Post, User};
use profile_feed::domain::value_objects::{PostId, UserId, ViewMode};
use profile_feed::infrastructure::remote::InMemoryProfileDataSource;
use profile_feed::presentation::dto::ProfileFeedView;
use profile_feed::{AppConfig, ProfileFeedState};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "profile-feed-demo")]
#[command(about = "Load a profile feed and print the rendered view as JSON", long_about = None)]
struct Cli {
    /// Profile to show; defaults to the signed-in user
    #[arg(short, long, env = "PROFILE_FEED_USER", value_parser = parse_user_id)]
    user: Option<UserId>,

    /// Signed-in user for the in-memory backend
    #[arg(long, default_value = "jason", value_parser = parse_user_id)]
    viewer: UserId,

    /// Layout to render (grid or list)
    #[arg(long)]
    view: Option<ViewMode>,

    /// Toggle the like on this post before rendering
    #[arg(long, value_parser = parse_post_id)]
    like: Option<PostId>,

    /// Toggle following this user before rendering
    #[arg(long, value_parser = parse_user_id)]
    follow: Option<UserId>,

    /// Simulated latency of the in-memory backend in milliseconds
    #[arg(long, default_value_t = 0)]
    latency_ms: u64,
}

fn parse_user_id(value: &str) -> Result<UserId, String> {
    UserId::new(value)
}

fn parse_post_id(value: &str) -> Result<PostId, String> {
    PostId::new(value)
}

async fn seeded_backend(viewer: &UserId, latency: Duration) -> InMemoryProfileDataSource {
    let source = InMemoryProfileDataSource::new(Some(viewer.clone())).with_latency(latency);
    let viewer = viewer.as_str();
    let now = Utc::now();

    for name in [viewer, "mia", "noah"] {
        let user = User::new(UserId::from(name), name)
            .with_profile_image(format!("https://images.example/avatars/{name}.jpg"));
        source.add_user(user).await;
    }
    for (i, (owner, caption)) in [
        (viewer, "first light"),
        ("mia", "harbour"),
        (viewer, "coffee"),
        ("noah", "trailhead"),
        (viewer, "late train"),
    ]
    .iter()
    .enumerate()
    {
        let post = Post::new_with_id(
            PostId::from(format!("post-{i}").as_str()),
            UserId::from(*owner),
            format!("https://images.example/{i}.jpg"),
            *caption,
            now - ChronoDuration::hours(24 * (5 - i as i64)),
        )
        .with_dimensions(1080.0, 1080.0);
        source.add_post(post).await;
    }
    source
        .add_follow(&UserId::from(viewer), &UserId::from("mia"))
        .await;
    source
        .add_follow(&UserId::from("noah"), &UserId::from(viewer))
        .await;
    source
}

#[tokio::main]
async fn main() -> Result<()> {
    profile_feed::init_logging();
    let cli = Cli::parse();
    let config = AppConfig::from_env();

    let state = if config.remote.firebase_url.is_some() {
        info!("Using Firebase REST backend");
        ProfileFeedState::with_firebase(&config)?
    } else {
        info!(viewer = %cli.viewer, "Using seeded in-memory backend");
        let backend = seeded_backend(&cli.viewer, Duration::from_millis(cli.latency_ms)).await;
        ProfileFeedState::new(&config, Arc::new(backend))?
    };
    let service = state.service.clone();

    let user = service
        .load_profile(cli.user.clone())
        .await
        .context("failed to load profile")?;
    info!(user_id = %user.id, "Loaded profile");

    if let Some(mode) = cli.view {
        service.set_view_mode(mode).await;
    }
    if let Some(post_id) = &cli.like {
        match service.toggle_like(post_id).await {
            Ok(liked) => info!(post_id = %post_id, liked, "Like toggled"),
            Err(err) => warn!(post_id = %post_id, error = %err, "Like toggle failed"),
        }
    }
    if let Some(target) = &cli.follow {
        match service.toggle_follow(target).await {
            Ok(following) => {
                info!(target = %target, following, "Follow toggled");
                // Counts are reloaded by the listener; do it inline so the
                // printed view reflects the change.
                service.refresh_social_counts().await;
            }
            Err(err) => warn!(target = %target, error = %err, "Follow toggle failed"),
        }
    }

    let view = ProfileFeedView::from(&service.snapshot().await);
    println!("{}", serde_json::to_string_pretty(&view)?);

    state.shutdown().await;
    Ok(())
}
