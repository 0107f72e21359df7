use crate::domain::model::ExportStage;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Authorization header sent with every API request.
#[derive(Clone)]
pub struct AuthHeaders {
    token: String,
}

impl AuthHeaders {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl std::fmt::Debug for AuthHeaders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthHeaders").field("token", &"***").finish()
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Issues one GET against `path`, relative to the API base URL.
    async fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
        auth: &AuthHeaders,
    ) -> Result<ApiResponse>;
}

pub trait Storage: Send + Sync {
    /// Stores `data` under `path` and returns where it ended up.
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

pub trait ExportObserver: Send + Sync {
    fn on_error(&self, message: &str);

    fn on_progress(&self, _stage: &ExportStage) {}
}
