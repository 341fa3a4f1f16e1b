//! Collaborators that supply the initial user collection.
//!
//! The dashboard's data is a static mock resource: either served over HTTP
//! or read from a local JSON file. Both must yield a JSON array of records.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::UserRecord;

use super::FetchError;

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Zero-argument fetch of the full user collection.
#[async_trait]
pub trait UserSource: Send + Sync {
    async fn fetch_users(&self) -> Result<Vec<UserRecord>, FetchError>;
}

/// Decode a response body, insisting on a top-level JSON array.
///
/// Elements that do not decode as a user record are logged and skipped, so
/// one bad record does not empty the dashboard.
pub fn parse_user_array(body: &str) -> Result<Vec<UserRecord>, FetchError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| FetchError::InvalidResponse(format!("Body is not JSON: {}", e)))?;
    let Value::Array(items) = value else {
        return Err(FetchError::InvalidResponse(
            "Expected a JSON array of users".to_string(),
        ));
    };

    let total = items.len();
    let users: Vec<UserRecord> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(index, error = %e, "Skipping malformed user record");
                None
            }
        })
        .collect();
    if users.len() < total {
        debug!(kept = users.len(), total, "Some user records were skipped");
    }
    Ok(users)
}

/// Fetches the mock resource over HTTP.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpUserSource {
    client: Client,
    url: String,
}

impl HttpUserSource {
    pub fn new(url: impl Into<String>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, FetchError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(FetchError::from_status(status, &body))
        }
    }
}

#[async_trait]
impl UserSource for HttpUserSource {
    async fn fetch_users(&self) -> Result<Vec<UserRecord>, FetchError> {
        debug!(url = %self.url, "Fetching users");
        let response = self
            .client
            .get(&self.url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;
        let response = Self::check_response(response).await?;
        let body = response.text().await?;
        parse_user_array(&body)
    }
}

/// Reads the mock resource from a local JSON file.
#[derive(Debug, Clone)]
pub struct FileUserSource {
    path: PathBuf,
}

impl FileUserSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl UserSource for FileUserSource {
    async fn fetch_users(&self) -> Result<Vec<UserRecord>, FetchError> {
        debug!(path = %self.path.display(), "Reading users");
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| FetchError::Io {
                path: self.path.display().to_string(),
                source,
            })?;
        parse_user_array(&body)
    }
}
