use crate::application::ports::ProfileDataSource;
use crate::domain::entities::{Post, User};
use crate::domain::value_objects::{PostId, UserId};
use crate::shared::config::RemoteConfig;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("profile-feed/", env!("CARGO_PKG_VERSION"));

/// Firebase Realtime Database over its REST interface.
///
/// Layout: `users/{uid}`, `posts/{uid}/{postId}`, `following/{uid}/{uid}`,
/// `followers/{uid}/{uid}` and `likes/{postId}/{uid}`.
pub struct FirebaseRestDataSource {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
    viewer: Option<UserId>,
}

#[derive(Debug, Deserialize)]
struct UserRecord {
    username: String,
    #[serde(rename = "profileImageUrl", default)]
    profile_image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostRecord {
    #[serde(default)]
    caption: String,
    #[serde(rename = "imageUrl")]
    image_url: String,
    #[serde(rename = "imageWidth", default)]
    image_width: f64,
    #[serde(rename = "imageHeight", default)]
    image_height: f64,
    /// Seconds since the Unix epoch.
    #[serde(rename = "creationDate")]
    creation_date: f64,
}

impl FirebaseRestDataSource {
    pub fn new(
        base_url: impl Into<String>,
        auth_token: Option<String>,
        viewer: Option<UserId>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token,
            viewer,
        })
    }

    pub fn from_config(config: &RemoteConfig) -> Result<Self, AppError> {
        let base_url = config
            .firebase_url
            .clone()
            .ok_or_else(|| AppError::Configuration("firebase_url is not set".to_string()))?;
        Self::new(
            base_url,
            config.auth_token.clone(),
            config
                .viewer_id
                .clone()
                .map(UserId::new)
                .transpose()
                .map_err(AppError::Configuration)?,
            config.request_timeout(),
        )
    }

    fn url(&self, segments: &[&str]) -> Result<String, AppError> {
        for segment in segments {
            validate_segment(segment)?;
        }
        Ok(format!("{}/{}.json", self.base_url, segments.join("/")))
    }

    async fn request(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<Value>,
    ) -> Result<Value, AppError> {
        let url = self.url(segments)?;
        let path = format!("/{}", segments.join("/"));
        debug!(%method, path = %path, "Firebase request");

        let mut request = self.client.request(method.clone(), &url);
        if let Some(token) = &self.auth_token {
            request = request.query(&[("auth", token.as_str())]);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AppError::network(format!(
                "{method} {path} was rejected ({status})"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::network(format!(
                "{method} {path} returned {status}: {body}"
            )));
        }
        Ok(response.json::<Value>().await?)
    }

    async fn get(&self, segments: &[&str]) -> Result<Value, AppError> {
        self.request(Method::GET, segments, None).await
    }

    async fn patch_flag(&self, segments: &[&str], key: &str, value: i64) -> Result<(), AppError> {
        validate_segment(key)?;
        let mut body = Map::new();
        body.insert(key.to_string(), Value::from(value));
        self.request(Method::PATCH, segments, Some(Value::Object(body)))
            .await
            .map(|_| ())
    }

    /// Writes both sides of a follow edge in one multi-location update at the
    /// database root; `Value::Null` removes them. Either both land or neither.
    async fn write_follow_edge(
        &self,
        viewer: &UserId,
        target: &UserId,
        value: Value,
    ) -> Result<(), AppError> {
        let body = follow_edge_update(viewer, target, value)?;
        self.request(Method::PATCH, &[], Some(body))
            .await
            .map(|_| ())
    }

    fn require_viewer(&self) -> Result<&UserId, AppError> {
        self.viewer.as_ref().ok_or(AppError::NoIdentity)
    }

    async fn is_liked_by(&self, post: &PostId, viewer: &UserId) -> Result<bool, AppError> {
        let value = self.get(&["likes", post.as_str(), viewer.as_str()]).await?;
        Ok(is_truthy(&value))
    }
}

#[async_trait]
impl ProfileDataSource for FirebaseRestDataSource {
    fn current_identity(&self) -> Option<UserId> {
        self.viewer.clone()
    }

    async fn fetch_user(&self, id: &UserId) -> Result<User, AppError> {
        let value = self.get(&["users", id.as_str()]).await?;
        parse_user(id, value)
    }

    async fn fetch_posts(&self, owner: &UserId) -> Result<Vec<Post>, AppError> {
        let value = self.get(&["posts", owner.as_str()]).await?;
        let posts = parse_posts(owner, value)?;
        let Some(viewer) = &self.viewer else {
            return Ok(posts);
        };

        let liked = try_join_all(posts.iter().map(|post| self.is_liked_by(&post.id, viewer))).await?;
        Ok(posts
            .into_iter()
            .zip(liked)
            .map(|(post, liked)| post.with_liked(liked))
            .collect())
    }

    async fn fetch_following(&self, id: &UserId) -> Result<HashSet<UserId>, AppError> {
        let value = self.get(&["following", id.as_str()]).await?;
        Ok(parse_id_set(&value))
    }

    async fn fetch_followers(&self, id: &UserId) -> Result<HashSet<UserId>, AppError> {
        let value = self.get(&["followers", id.as_str()]).await?;
        Ok(parse_id_set(&value))
    }

    async fn is_following(&self, viewer: &UserId, target: &UserId) -> Result<bool, AppError> {
        let value = self
            .get(&["following", viewer.as_str(), target.as_str()])
            .await?;
        Ok(is_truthy(&value))
    }

    async fn follow(&self, target: &UserId) -> Result<(), AppError> {
        let viewer = self.require_viewer()?;
        self.write_follow_edge(viewer, target, Value::from(1))
            .await
    }

    async fn unfollow(&self, target: &UserId) -> Result<(), AppError> {
        let viewer = self.require_viewer()?;
        self.write_follow_edge(viewer, target, Value::Null).await
    }

    async fn set_like(&self, post: &PostId, viewer: &UserId, liked: bool) -> Result<(), AppError> {
        self.patch_flag(&["likes", post.as_str()], viewer.as_str(), i64::from(liked))
            .await
    }
}

/// Firebase keys may not be empty or contain `.`, `$`, `#`, `[`, `]` or `/`.
fn validate_segment(segment: &str) -> Result<(), AppError> {
    if segment.is_empty()
        || segment
            .chars()
            .any(|c| matches!(c, '.' | '$' | '#' | '[' | ']' | '/') || c.is_control())
    {
        return Err(AppError::InvalidInput(format!(
            "invalid database key: {segment:?}"
        )));
    }
    Ok(())
}

fn follow_edge_update(viewer: &UserId, target: &UserId, value: Value) -> Result<Value, AppError> {
    validate_segment(viewer.as_str())?;
    validate_segment(target.as_str())?;
    let mut body = Map::new();
    body.insert(format!("following/{viewer}/{target}"), value.clone());
    body.insert(format!("followers/{target}/{viewer}"), value);
    Ok(Value::Object(body))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        _ => false,
    }
}

fn parse_user(id: &UserId, value: Value) -> Result<User, AppError> {
    if value.is_null() {
        return Err(AppError::not_found(format!("user {id}")));
    }
    let record: UserRecord = serde_json::from_value(value)?;
    let user = User::new(id.clone(), record.username);
    Ok(match record.profile_image_url {
        Some(url) => user.with_profile_image(url),
        None => user,
    })
}

fn parse_posts(owner: &UserId, value: Value) -> Result<Vec<Post>, AppError> {
    let entries = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Object(entries) => entries,
        other => {
            return Err(AppError::Serialization(format!(
                "expected post map, got {other}"
            )))
        }
    };

    entries
        .into_iter()
        .map(|(key, value)| -> Result<Post, AppError> {
            let record: PostRecord = serde_json::from_value(value)?;
            let created_at = timestamp_from_secs(record.creation_date).ok_or_else(|| {
                AppError::Serialization(format!("post {key} has invalid creationDate"))
            })?;
            let id = PostId::new(key.as_str()).map_err(AppError::Serialization)?;
            Ok(Post::new_with_id(
                id,
                owner.clone(),
                record.image_url,
                record.caption,
                created_at,
            )
            .with_dimensions(record.image_width, record.image_height))
        })
        .collect()
}

fn timestamp_from_secs(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1_000_000_000.0).round() as u32;
    DateTime::<Utc>::from_timestamp(whole as i64, nanos.min(999_999_999))
}

fn parse_id_set(value: &Value) -> HashSet<UserId> {
    match value {
        Value::Object(entries) => entries
            .iter()
            .filter(|(_, flag)| is_truthy(flag))
            .map(|(key, _)| UserId::from(key.as_str()))
            .collect(),
        _ => HashSet::new(),
    }
}
