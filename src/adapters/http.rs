use crate::domain::ports::{ApiResponse, ApiTransport, AuthHeaders};
use crate::utils::error::{ExportError, Result};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://app.asana.com/api/1.0";

/// Sends API requests over reqwest against a fixed base URL.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    base_url: String,
    client: Client,
}

impl ReqwestTransport {
    pub fn new(base_url: &str) -> Result<Self> {
        Url::parse(base_url).map_err(|e| ExportError::InvalidConfigValueError {
            field: "api.base_url".to_string(),
            value: base_url.to_string(),
            reason: format!("Invalid URL format: {}", e),
        })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        })
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl ApiTransport for ReqwestTransport {
    async fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
        auth: &AuthHeaders,
    ) -> Result<ApiResponse> {
        let url = self.url_for(path);
        tracing::debug!("Making API request to: {}", url);

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, auth.authorization())
            .query(query)
            .send()
            .await?;

        let status = response.status().as_u16();
        tracing::debug!("API response status: {}", status);
        let body = response.text().await?;

        Ok(ApiResponse { status, body })
    }
}
