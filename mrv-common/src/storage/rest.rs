//! REST client for the hosted object storage API

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ObjectStore, StorageError, StoredObject, LIST_LIMIT};
use crate::models::parse_timestamp;

const USER_AGENT: &str = concat!("mrv-dash/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// List request body
#[derive(Debug, Serialize)]
struct ListRequest<'a> {
    prefix: &'a str,
    limit: usize,
    offset: usize,
    #[serde(rename = "sortBy")]
    sort_by: SortBy,
}

#[derive(Debug, Serialize)]
struct SortBy {
    column: &'static str,
    order: &'static str,
}

/// One entry of a list response
#[derive(Debug, Deserialize)]
struct ListEntry {
    name: String,
    #[serde(default)]
    created_at: Option<String>,
}

/// Object store backed by the hosted storage REST endpoint
#[derive(Clone)]
pub struct RestObjectStore {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    bucket: String,
}

impl RestObjectStore {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| StorageError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            bucket: bucket.into(),
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.is_empty() {
            request
        } else {
            request.header("apikey", &self.api_key).bearer_auth(&self.api_key)
        }
    }

    async fn check_status(response: reqwest::Response, path: &str) -> Result<reqwest::Response, StorageError> {
        let status = response.status();
        if status == 404 {
            return Err(StorageError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StorageError::Backend {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ObjectStore for RestObjectStore {
    async fn list(&self, folder: &str) -> Result<Vec<StoredObject>, StorageError> {
        let url = format!("{}/storage/v1/object/list/{}", self.base_url, self.bucket);
        let body = ListRequest {
            prefix: folder,
            limit: LIST_LIMIT,
            offset: 0,
            sort_by: SortBy {
                column: "created_at",
                order: "desc",
            },
        };

        tracing::debug!(bucket = %self.bucket, folder = %folder, "Listing storage objects");

        let response = self
            .authorize(self.http_client.post(&url).json(&body))
            .send()
            .await
            .map_err(|e| StorageError::Network(e.to_string()))?;
        let response = Self::check_status(response, folder).await?;

        let entries: Vec<ListEntry> = response
            .json()
            .await
            .map_err(|e| StorageError::Decode(e.to_string()))?;

        Ok(entries
            .into_iter()
            .map(|entry| StoredObject {
                created_at: entry.created_at.as_deref().and_then(parse_timestamp),
                name: entry.name,
            })
            .collect())
    }

    async fn download_text(&self, path: &str) -> Result<String, StorageError> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path);

        tracing::debug!(bucket = %self.bucket, path = %path, "Downloading storage object");

        let response = self
            .authorize(self.http_client.get(&url))
            .send()
            .await
            .map_err(|e| StorageError::Network(e.to_string()))?;
        let response = Self::check_status(response, path).await?;

        response
            .text()
            .await
            .map_err(|e| StorageError::Decode(e.to_string()))
    }
}
