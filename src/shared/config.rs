use crate::domain::value_objects::ViewMode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub feed: FeedConfig,
    pub remote: RemoteConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default)]
    pub initial_view_mode: ViewMode,
    pub event_capacity: usize,
    pub fetch_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub firebase_url: Option<String>,
    pub auth_token: Option<String>,
    pub viewer_id: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            initial_view_mode: ViewMode::Grid,
            event_capacity: 64,
            fetch_timeout_ms: 10_000,
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            firebase_url: None,
            auth_token: None,
            viewer_id: None,
            request_timeout_secs: 15,
        }
    }
}

impl FeedConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

impl RemoteConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(v) = lookup("PROFILE_FEED_VIEW_MODE") {
            if let Ok(mode) = v.parse::<ViewMode>() {
                cfg.feed.initial_view_mode = mode;
            }
        }
        if let Some(value) = lookup("PROFILE_FEED_EVENT_CAPACITY").and_then(|v| parse_usize(&v)) {
            cfg.feed.event_capacity = value;
        }
        if let Some(value) = lookup("PROFILE_FEED_FETCH_TIMEOUT_MS").and_then(|v| parse_u64(&v)) {
            cfg.feed.fetch_timeout_ms = value;
        }

        cfg.remote.firebase_url = lookup("PROFILE_FEED_FIREBASE_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty());
        cfg.remote.auth_token = lookup("PROFILE_FEED_FIREBASE_AUTH")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        cfg.remote.viewer_id = lookup("PROFILE_FEED_VIEWER_ID")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        if let Some(value) =
            lookup("PROFILE_FEED_REQUEST_TIMEOUT_SECS").and_then(|v| parse_u64(&v))
        {
            cfg.remote.request_timeout_secs = value;
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.feed.event_capacity == 0 {
            return Err("Feed event_capacity must be greater than 0".to_string());
        }
        if self.feed.fetch_timeout_ms == 0 {
            return Err("Feed fetch_timeout_ms must be greater than 0".to_string());
        }
        if self.remote.request_timeout_secs == 0 {
            return Err("Remote request_timeout_secs must be greater than 0".to_string());
        }
        if let Some(url) = &self.remote.firebase_url {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(format!("Remote firebase_url must be an http(s) URL: {url}"));
            }
        }
        Ok(())
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

fn parse_usize(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok()
}
