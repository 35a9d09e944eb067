//! REST client for the hosted backend's table API
//!
//! Request shape:
//! `GET {base}/rest/v1/{table}?select=..&{field}=eq.{value}&order={field}.{asc|desc}&limit=N&offset=M`
//! authenticated with the `apikey` header plus a bearer token.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::{validate_identifier, GatewayError, Row, SortOrder, TableGateway, TableQuery};

const USER_AGENT: &str = concat!("mrv-dash/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Table gateway backed by the hosted backend's REST endpoint
#[derive(Clone)]
pub struct RestGateway {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestGateway {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }
}

#[async_trait]
impl TableGateway for RestGateway {
    async fn fetch(&self, table: &str, query: &TableQuery) -> Result<Vec<Row>, GatewayError> {
        validate_identifier(table)?;
        let params = query_params(query)?;
        let url = self.table_url(table);

        tracing::debug!(table = %table, params = ?params, "Querying backend table");

        let mut request = self.http_client.get(&url).query(&params);
        if !self.api_key.is_empty() {
            request = request
                .header("apikey", &self.api_key)
                .bearer_auth(&self.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GatewayError::Backend {
                status: status.as_u16(),
                message: backend_message(&error_text),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        match body {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(row) => Ok(row),
                    other => Err(GatewayError::Decode(format!("expected row object, got {}", other))),
                })
                .collect(),
            other => Err(GatewayError::Decode(format!("expected row array, got {}", other))),
        }
    }
}

/// Translate a query into REST query parameters
///
/// Offset without limit is sent as an open-ended offset; no page size is implied.
pub fn query_params(query: &TableQuery) -> Result<Vec<(String, String)>, GatewayError> {
    let mut params = Vec::new();

    let select = query.select.as_deref().unwrap_or("*");
    for column in select.split(',').map(str::trim) {
        if column != "*" {
            validate_identifier(column)?;
        }
    }
    params.push(("select".to_string(), select.replace(' ', "")));

    for (field, value) in &query.filters {
        validate_identifier(field)?;
        params.push((field.clone(), filter_expression(value)));
    }

    if let Some((field, order)) = &query.order_by {
        validate_identifier(field)?;
        let direction = match order {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        };
        params.push(("order".to_string(), format!("{}.{}", field, direction)));
    }

    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    if let Some(offset) = query.offset {
        params.push(("offset".to_string(), offset.to_string()));
    }

    Ok(params)
}

fn filter_expression(value: &Value) -> String {
    match value {
        Value::Null => "is.null".to_string(),
        Value::String(s) => format!("eq.{}", s),
        other => format!("eq.{}", other),
    }
}

/// Prefer the backend's `message` field when the error body is JSON
fn backend_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
