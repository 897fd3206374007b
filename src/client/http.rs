//! `FeeBackend` over HTTP

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::BackendConfig;
use crate::records::normalize_list;
use crate::traits::*;
use crate::types::*;

/// Fee backend talking JSON to the school REST API
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Build a backend from configuration
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self::with_client(client, &config.base_url))
    }

    /// Use an existing client, e.g. one shared with the rest of the application
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET a JSON document; `None` when the backend answers 404
    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Option<Value>, BackendError> {
        let url = self.endpoint(path);
        debug!(%url, ?query, "GET");

        let resp = self
            .client
            .get(&url)
            .query(query)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            debug!(%url, "not found");
            return Ok(None);
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(Some(Value::Null));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let value = resp
            .json::<Value>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(Some(value))
    }
}

#[async_trait]
impl FeeBackend for HttpBackend {
    async fn list_fees(&self, student_id: &StudentId) -> Result<Vec<Value>, BackendError> {
        let body = self
            .get_json("fees", &[("studentId", student_id.as_str())])
            .await?;
        Ok(body.map(normalize_list).unwrap_or_default())
    }

    async fn list_transactions(&self, session_id: &SessionId) -> Result<Vec<Value>, BackendError> {
        let body = self
            .get_json("transactions", &[("sessionId", session_id.as_str())])
            .await?;
        Ok(body.map(normalize_list).unwrap_or_default())
    }

    async fn create_transaction(&self, transaction: &NewTransaction) -> Result<Value, BackendError> {
        let url = self.endpoint("transactions");
        info!(%url, user_id = %transaction.user_id, amount = %transaction.amount, "POST payment");

        let resp = self
            .client
            .post(&url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(transaction)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<Value>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn get_student(&self, student_id: &StudentId) -> Result<Option<Value>, BackendError> {
        self.get_json(&format!("users/{}", student_id), &[]).await
    }
}
