use crate::domain::ports::{ApiResponse, ApiTransport, AuthHeaders};
use crate::utils::error::{ExportError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub query: Vec<(String, String)>,
    pub authorization: String,
    pub at: Instant,
}

/// In-memory transport that replays queued responses per path.
/// Paths with nothing queued answer 404.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Result<ApiResponse>>>>,
    calls: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, path: &str, response: Result<ApiResponse>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(response);
        self
    }

    pub fn status(self, path: &str, status: u16) -> Self {
        self.push(
            path,
            Ok(ApiResponse {
                status,
                body: String::new(),
            }),
        )
    }

    pub fn json(self, path: &str, status: u16, body: serde_json::Value) -> Self {
        self.raw(path, status, &body.to_string())
    }

    pub fn raw(self, path: &str, status: u16, body: &str) -> Self {
        self.push(
            path,
            Ok(ApiResponse {
                status,
                body: body.to_string(),
            }),
        )
    }

    pub fn network_failure(self, path: &str) -> Self {
        self.push(
            path,
            Err(ExportError::IoError(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            ))),
        )
    }

    pub fn calls(&self) -> Vec<RecordedRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.path).collect()
    }
}

#[async_trait]
impl ApiTransport for ScriptedTransport {
    async fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
        auth: &AuthHeaders,
    ) -> Result<ApiResponse> {
        self.calls.lock().unwrap().push(RecordedRequest {
            path: path.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            authorization: auth.authorization(),
            at: Instant::now(),
        });

        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(path)
            .and_then(VecDeque::pop_front);
        next.unwrap_or(Ok(ApiResponse {
            status: 404,
            body: String::new(),
        }))
    }
}
