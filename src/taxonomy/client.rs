//! Taxonomy API client

use std::time::Duration;

use reqwest::StatusCode;
use tracing::{debug, error};

use super::parser::{parse_taxonomy, DepartmentIter};
use crate::config::ApiConfig;
use crate::error::{AppError, AppResult};

pub struct TaxonomyClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
}

impl TaxonomyClient {
    pub fn new(config: &ApiConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self::with_http(http, config))
    }

    /// Use a preconfigured HTTP client; `timeout_secs` is ignored
    pub fn with_http(http: reqwest::Client, config: &ApiConfig) -> Self {
        Self {
            http,
            url: config.taxonomy_url(),
            api_key: config.api_key.clone(),
        }
    }

    /// Request the full taxonomy once and return its departments in
    /// pre-order. Not restartable: call again to re-read.
    pub async fn fetch_departments(&self) -> AppResult<DepartmentIter> {
        let body = self.get_body().await?;
        parse_taxonomy(&body)
    }

    async fn get_body(&self) -> AppResult<String> {
        debug!("GET {}", self.url);

        let response = self
            .http
            .get(&self.url)
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            error!("{}:\n{}", status.as_u16(), body);
            return Err(AppError::invalid_response(format!(
                "taxonomy request failed with status {}",
                status
            )));
        }

        Ok(body)
    }
}
