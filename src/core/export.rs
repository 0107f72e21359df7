use crate::core::extractor::TreeExtractor;
use crate::core::fetcher::{PortfolioFetcher, RetryPolicy};
use crate::core::table::build_table;
use crate::domain::model::{ExportStage, ExportSummary, FlatRow};
use crate::domain::ports::{ApiTransport, AuthHeaders, ExportObserver, Storage};
use crate::utils::error::{ExportError, Result};
use crate::utils::validation::{parse_portfolio_reference, validate_token};
use chrono::Utc;

pub const EXPORT_FILE_NAME: &str = "portfolio_export.csv";

pub struct PortfolioExporter<T: ApiTransport, S: Storage, O: ExportObserver> {
    fetcher: PortfolioFetcher<T>,
    storage: S,
    observer: O,
}

impl<T: ApiTransport, S: Storage, O: ExportObserver> PortfolioExporter<T, S, O> {
    pub fn new(transport: T, storage: S, observer: O, policy: RetryPolicy) -> Self {
        Self {
            fetcher: PortfolioFetcher::new(transport, policy),
            storage,
            observer,
        }
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Runs one full export: validate, check the token, walk the tree, write the CSV.
    ///
    /// Input and credential problems abort before anything is written.
    /// Branch failures during extraction only make the result partial.
    pub async fn run(&self, token: &str, portfolio_link: &str) -> Result<ExportSummary> {
        let started_at = Utc::now();

        self.observer.on_progress(&ExportStage::ValidatingInput);
        let portfolio_id = self.fatal(
            validate_token(token).and_then(|_| parse_portfolio_reference(portfolio_link)),
        )?;
        tracing::info!(portfolio = %portfolio_id, "Starting portfolio export");

        let auth = AuthHeaders::bearer(token.trim());

        self.observer.on_progress(&ExportStage::CheckingCredentials);
        let probe = self.check_credentials(&auth).await;
        self.fatal(probe)?;

        let report = TreeExtractor::new(&self.fetcher, &self.observer, &auth)
            .extract(&portfolio_id, FlatRow::new())
            .await;
        tracing::info!(
            rows = report.rows.len(),
            exhausted = report.exhausted.len(),
            failed_branches = report.failed_branches,
            "Extraction finished"
        );

        self.observer.on_progress(&ExportStage::BuildingTable {
            rows: report.rows.len(),
        });
        let incomplete_portfolios = report.exhausted;
        let failed_branches = report.failed_branches;
        let table = build_table(report.rows);
        let csv = table.to_csv();

        self.observer.on_progress(&ExportStage::Writing {
            file: EXPORT_FILE_NAME.to_string(),
        });
        let output_path = self.fatal(self.storage.write_file(EXPORT_FILE_NAME, csv.as_bytes()).await)?;

        let finished_at = Utc::now();
        tracing::info!(
            projects = table.rows.len(),
            columns = table.headers.len(),
            elapsed_ms = (finished_at - started_at).num_milliseconds(),
            "Export written to {}",
            output_path
        );
        self.observer.on_progress(&ExportStage::Finished);

        Ok(ExportSummary {
            output_path,
            project_count: table.rows.len(),
            column_count: table.headers.len(),
            incomplete_portfolios,
            failed_branches,
            started_at,
            finished_at,
        })
    }

    async fn check_credentials(&self, auth: &AuthHeaders) -> Result<()> {
        let response = self.fetcher.transport().get("/users/me", &[], auth).await?;
        if !response.is_success() {
            return Err(ExportError::InvalidCredential {
                status: response.status,
            });
        }
        tracing::debug!("Credential accepted");
        Ok(())
    }

    /// Reports an error that ends the run, then passes it on.
    fn fatal<V>(&self, result: Result<V>) -> Result<V> {
        result.map_err(|e| {
            tracing::error!(error = %e, category = ?e.category(), "Export aborted");
            if let Some(message) = e.user_message() {
                self.observer.on_error(&message);
            }
            e
        })
    }
}
