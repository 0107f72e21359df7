use crate::domain::model::{ItemsEnvelope, PortfolioNode};
use crate::domain::ports::{ApiTransport, ApiResponse, AuthHeaders};
use crate::utils::error::{ExportError, Result};
use std::time::Duration;

/// Fields requested for every portfolio item, so no follow-up call per item is needed.
pub const ITEM_OPT_FIELDS: &str = "name,resource_type,archived,color,created_at,current_status_update.(created_by.name|status_type|created_at|text),notes,modified_at,public,owner.name,start_on,due_on,custom_fields.(name|display_value|type|number_value|datetime_value)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base_delay: Duration::from_millis(120),
        }
    }
}

impl RetryPolicy {
    /// Wait after the given failed attempt (1-based): `attempt² × base_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt.saturating_mul(attempt)
    }
}

#[derive(Debug)]
pub enum FetchOutcome {
    Items(Vec<PortfolioNode>),
    /// Every attempt hit a transient failure. Not the same as an empty portfolio.
    Exhausted { attempts: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttemptClass {
    Success,
    Retryable,
    Terminal,
}

fn classify(response: &ApiResponse) -> AttemptClass {
    match response.status {
        _ if response.is_success() => AttemptClass::Success,
        429 | 500 => AttemptClass::Retryable,
        status if status >= 400 => AttemptClass::Terminal,
        _ => AttemptClass::Retryable,
    }
}

pub struct PortfolioFetcher<T: ApiTransport> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: ApiTransport> PortfolioFetcher<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetches the direct children of one portfolio, retrying rate limits,
    /// server errors and network failures.
    pub async fn fetch_items(&self, portfolio_id: &str, auth: &AuthHeaders) -> Result<FetchOutcome> {
        let path = format!("/portfolios/{}/items", portfolio_id);
        let query = [("opt_fields", ITEM_OPT_FIELDS)];
        let max_attempts = self.policy.max_attempts;

        for attempt in 1..=max_attempts {
            let delay = self.policy.delay_for(attempt);
            match self.transport.get(&path, &query, auth).await {
                Ok(response) => match classify(&response) {
                    AttemptClass::Success => {
                        let envelope: ItemsEnvelope = serde_json::from_str(&response.body)?;
                        if attempt > 1 {
                            tracing::info!(
                                portfolio = portfolio_id,
                                attempts = attempt,
                                "Portfolio items fetched after retry"
                            );
                        }
                        tracing::debug!(
                            portfolio = portfolio_id,
                            items = envelope.data.len(),
                            "Fetched portfolio items"
                        );
                        return Ok(FetchOutcome::Items(envelope.data));
                    }
                    AttemptClass::Terminal => {
                        tracing::warn!(
                            portfolio = portfolio_id,
                            status = response.status,
                            "Portfolio request rejected"
                        );
                        return Err(ExportError::ApiStatus {
                            status: response.status,
                            portfolio: portfolio_id.to_string(),
                        });
                    }
                    AttemptClass::Retryable => {
                        tracing::warn!(
                            portfolio = portfolio_id,
                            status = response.status,
                            attempt,
                            max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            "Transient API status"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        portfolio = portfolio_id,
                        error = %e,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Request failed before a response arrived"
                    );
                }
            }

            tokio::time::sleep(delay).await;
        }

        tracing::error!(
            portfolio = portfolio_id,
            attempts = max_attempts,
            "Giving up on portfolio after all retry attempts"
        );
        Ok(FetchOutcome::Exhausted {
            attempts: max_attempts,
        })
    }
}
