//! HTTP client for the remote financial records API
//!
//! Endpoints, relative to the configured base URL:
//! - GET    /financial-records/getAllByUserID/{userId}
//! - POST   /financial-records
//! - PUT    /financial-records/{id}
//! - DELETE /financial-records/{id}

pub mod error;

use std::time::Duration;

use async_trait::async_trait;
use fintrack_config::Config;
use fintrack_core::{CoreResult, FinancialRecord, RecordsApi};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

pub use error::{ClientError, ClientResult};

const RECORDS_PATH: &str = "financial-records";

/// `RecordsApi` over HTTP
#[derive(Debug, Clone)]
pub struct HttpRecordsApi {
    client: Client,
    base_url: String,
}

impl HttpRecordsApi {
    /// Build a client for `base_url` with a per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Setup {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> ClientResult<Self> {
        Self::new(
            config.api_base_url(),
            Duration::from_secs(config.api.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}/{}", self.base_url, RECORDS_PATH)
    }

    fn record_url(&self, id: &str) -> String {
        format!("{}/{}/{}", self.base_url, RECORDS_PATH, urlencoding::encode(id))
    }

    fn user_records_url(&self, user_id: &str) -> String {
        format!(
            "{}/{}/getAllByUserID/{}",
            self.base_url,
            RECORDS_PATH,
            urlencoding::encode(user_id)
        )
    }

    async fn fetch_all_inner(&self, user_id: &str) -> ClientResult<Vec<FinancialRecord>> {
        let url = self.user_records_url(user_id);
        log::debug!("GET {}", url);
        let response = self.client.get(&url).send().await?;
        decode(check(response)?).await
    }

    async fn create_inner(&self, record: &FinancialRecord) -> ClientResult<FinancialRecord> {
        let url = self.collection_url();
        log::debug!("POST {}", url);
        let response = self.client.post(&url).json(record).send().await?;
        decode(check(response)?).await
    }

    async fn update_inner(&self, id: &str, record: &FinancialRecord) -> ClientResult<FinancialRecord> {
        let url = self.record_url(id);
        log::debug!("PUT {}", url);
        let response = self.client.put(&url).json(record).send().await?;
        decode(check(response)?).await
    }

    async fn delete_inner(&self, id: &str) -> ClientResult<()> {
        let url = self.record_url(id);
        log::debug!("DELETE {}", url);
        let response = self.client.delete(&url).send().await?;
        check(response)?;
        Ok(())
    }
}

fn check(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ClientError::Status {
            status: status.as_u16(),
        })
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| ClientError::Decode {
        message: e.to_string(),
    })
}

#[async_trait]
impl RecordsApi for HttpRecordsApi {
    async fn fetch_all(&self, user_id: &str) -> CoreResult<Vec<FinancialRecord>> {
        Ok(self.fetch_all_inner(user_id).await?)
    }

    async fn create(&self, record: &FinancialRecord) -> CoreResult<FinancialRecord> {
        Ok(self.create_inner(record).await?)
    }

    async fn update(&self, id: &str, record: &FinancialRecord) -> CoreResult<FinancialRecord> {
        Ok(self.update_inner(id, record).await?)
    }

    async fn delete(&self, id: &str) -> CoreResult<()> {
        Ok(self.delete_inner(id).await?)
    }
}
