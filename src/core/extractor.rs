use crate::core::fetcher::{FetchOutcome, PortfolioFetcher};
use crate::core::flatten::{flatten_custom_fields, flatten_project, override_chain};
use crate::domain::model::{ExportStage, ExtractionReport, FlatRow, ResourceKind};
use crate::domain::ports::{ApiTransport, AuthHeaders, ExportObserver};
use crate::utils::error::ExportError;
use futures::future::{join_all, BoxFuture, FutureExt};
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Walks a portfolio tree and collects one flat row per project it reaches.
pub struct TreeExtractor<'a, T: ApiTransport, O: ExportObserver> {
    fetcher: &'a PortfolioFetcher<T>,
    observer: &'a O,
    auth: &'a AuthHeaders,
    visited: Mutex<HashSet<String>>,
}

impl<'a, T: ApiTransport, O: ExportObserver> TreeExtractor<'a, T, O> {
    pub fn new(fetcher: &'a PortfolioFetcher<T>, observer: &'a O, auth: &'a AuthHeaders) -> Self {
        Self {
            fetcher,
            observer,
            auth,
            visited: Mutex::new(HashSet::new()),
        }
    }

    /// Extracts every project below `portfolio_id`.
    ///
    /// `inherited` holds portfolio-level values that override a project's own
    /// like-named columns. Failures stay local to the branch they happen in.
    /// Each portfolio is fetched at most once per extractor.
    pub async fn extract(&self, portfolio_id: &str, inherited: FlatRow) -> ExtractionReport {
        self.extract_branch(portfolio_id.to_string(), inherited).await
    }

    /// Returns false when the portfolio has already been claimed by some branch.
    fn claim(&self, portfolio_id: &str) -> bool {
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(portfolio_id.to_string())
    }

    fn extract_branch(&self, portfolio_id: String, inherited: FlatRow) -> BoxFuture<'_, ExtractionReport> {
        async move {
            let mut report = ExtractionReport::default();

            if !self.claim(&portfolio_id) {
                self.report_error(&ExportError::PortfolioRevisited {
                    portfolio: portfolio_id,
                });
                report.failed_branches += 1;
                return report;
            }

            self.observer.on_progress(&ExportStage::FetchingPortfolio {
                portfolio: portfolio_id.clone(),
            });

            let items = match self.fetcher.fetch_items(&portfolio_id, self.auth).await {
                Ok(FetchOutcome::Items(items)) => items,
                Ok(FetchOutcome::Exhausted { attempts }) => {
                    self.observer.on_error(&format!(
                        "Gave up on portfolio {portfolio_id} after {attempts} attempts - the export may be incomplete"
                    ));
                    report.exhausted.push(portfolio_id.clone());
                    Vec::new()
                }
                Err(e) => {
                    self.report_error(&e);
                    report.failed_branches += 1;
                    Vec::new()
                }
            };

            let mut branches = Vec::new();

            for item in &items {
                let own_fields = flatten_custom_fields(item);
                match item.resource_type {
                    ResourceKind::Project => {
                        let standard = flatten_project(item);
                        report
                            .rows
                            .push(override_chain([&standard, &own_fields, &inherited]));
                    }
                    ResourceKind::Portfolio => {
                        let context = override_chain([&own_fields, &inherited]);
                        branches.push(self.extract_branch(item.gid.clone(), context));
                    }
                    ResourceKind::Other => {
                        tracing::debug!(gid = %item.gid, "Skipping item that is neither project nor portfolio");
                    }
                }
            }

            for child in join_all(branches).await {
                report.absorb(child);
            }

            report
        }
        .boxed()
    }

    fn report_error(&self, error: &ExportError) {
        tracing::warn!(error = %error, category = ?error.category(), "Portfolio branch failed");
        if let Some(message) = error.user_message() {
            self.observer.on_error(&message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::observer::CollectingObserver;
    use crate::core::fetcher::RetryPolicy;
    use crate::core::test_support::ScriptedTransport;
    use crate::domain::model::CellValue;
    use crate::utils::error::status_message;
    use serde_json::{json, Value};

    fn items_path(id: &str) -> String {
        format!("/portfolios/{id}/items")
    }

    fn project(gid: &str, fields: Value) -> Value {
        json!({"gid": gid, "resource_type": "project", "name": format!("Project {gid}"), "custom_fields": fields})
    }

    fn portfolio(gid: &str, fields: Value) -> Value {
        json!({"gid": gid, "resource_type": "portfolio", "custom_fields": fields})
    }

    fn text_field(name: &str, value: &str) -> Value {
        json!({"name": name, "type": "text", "display_value": value})
    }

    async fn run(transport: ScriptedTransport, root: &str) -> (ExtractionReport, CollectingObserver) {
        let fetcher = PortfolioFetcher::new(transport, RetryPolicy::default());
        let observer = CollectingObserver::default();
        let auth = AuthHeaders::bearer("tok");
        let report = TreeExtractor::new(&fetcher, &observer, &auth)
            .extract(root, FlatRow::new())
            .await;
        (report, observer)
    }

    fn ids(report: &ExtractionReport) -> Vec<String> {
        report
            .rows
            .iter()
            .map(|row| row.get("Project Id").unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_one_row_per_project_in_skewed_tree() {
        let transport = ScriptedTransport::new()
            .json(
                &items_path("100"),
                200,
                json!({"data": [project("1", json!([])), portfolio("200", json!([]))]}),
            )
            .json(
                &items_path("200"),
                200,
                json!({"data": [portfolio("300", json!([])), project("2", json!([]))]}),
            )
            .json(
                &items_path("300"),
                200,
                json!({"data": [project("3", json!([])), project("4", json!([]))]}),
            );

        let (report, observer) = run(transport, "100").await;

        assert_eq!(ids(&report), vec!["\"1\"", "\"2\"", "\"3\"", "\"4\""]);
        assert!(report.is_complete());
        assert!(observer.errors().is_empty());
    }

    #[tokio::test]
    async fn test_single_level_and_empty_portfolio() {
        let transport = ScriptedTransport::new()
            .json(
                &items_path("100"),
                200,
                json!({"data": [project("1", json!([])), portfolio("200", json!([])), {"gid": "9", "resource_type": "goal"}]}),
            )
            .json(&items_path("200"), 200, json!({"data": []}));

        let (report, _) = run(transport, "100").await;

        assert_eq!(ids(&report), vec!["\"1\""]);
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn test_precedence_across_three_levels() {
        // Each level defines "Region"; the outermost portfolio must win.
        let transport = ScriptedTransport::new()
            .json(
                &items_path("100"),
                200,
                json!({"data": [portfolio("200", json!([text_field("Region", "top"), text_field("Tier", "gold")]))]}),
            )
            .json(
                &items_path("200"),
                200,
                json!({"data": [portfolio("300", json!([text_field("Region", "middle"), text_field("Owner Team", "ops")]))]}),
            )
            .json(
                &items_path("300"),
                200,
                json!({"data": [project("1", json!([
                    text_field("Region", "project"),
                    text_field("Owner Team", "project team"),
                    text_field("Project Name", "renamed"),
                    text_field("Stage", "build")
                ]))]}),
            );

        let (report, _) = run(transport, "100").await;

        assert_eq!(report.rows.len(), 1);
        let row = &report.rows[0];
        assert_eq!(row.get("Region"), Some(&CellValue::from("\"top\"")));
        assert_eq!(row.get("Tier"), Some(&CellValue::from("\"gold\"")));
        assert_eq!(row.get("Owner Team"), Some(&CellValue::from("\"ops\"")));
        assert_eq!(row.get("Project Name"), Some(&CellValue::from("\"renamed\"")));
        assert_eq!(row.get("Stage"), Some(&CellValue::from("\"build\"")));
    }

    #[tokio::test]
    async fn test_failed_branch_does_not_stop_siblings() {
        let transport = ScriptedTransport::new()
            .json(
                &items_path("100"),
                200,
                json!({"data": [portfolio("200", json!([])), portfolio("300", json!([])), project("1", json!([]))]}),
            )
            .status(&items_path("200"), 404)
            .json(&items_path("300"), 200, json!({"data": [project("2", json!([]))]}));

        let (report, observer) = run(transport, "100").await;

        assert_eq!(ids(&report), vec!["\"1\"", "\"2\""]);
        assert_eq!(report.failed_branches, 1);
        assert_eq!(observer.errors(), vec![status_message(404).unwrap().to_string()]);
    }

    #[tokio::test]
    async fn test_silent_status_counts_as_failure_without_message() {
        let transport = ScriptedTransport::new().status(&items_path("100"), 422);

        let (report, observer) = run(transport, "100").await;

        assert!(report.rows.is_empty());
        assert_eq!(report.failed_branches, 1);
        assert!(observer.errors().is_empty());
    }

    #[tokio::test]
    async fn test_cycle_is_detected_and_terminates() {
        let transport = ScriptedTransport::new()
            .json(
                &items_path("100"),
                200,
                json!({"data": [portfolio("200", json!([])), project("1", json!([]))]}),
            )
            .json(
                &items_path("200"),
                200,
                json!({"data": [portfolio("100", json!([])), project("2", json!([]))]}),
            );

        let (report, observer) = run(transport, "100").await;

        assert_eq!(ids(&report), vec!["\"1\"", "\"2\""]);
        assert_eq!(report.failed_branches, 1);
        assert_eq!(observer.errors().len(), 1);
        assert!(observer.errors()[0].contains("100"));
    }

    #[tokio::test]
    async fn test_shared_portfolio_is_fetched_once() {
        let transport = ScriptedTransport::new()
            .json(
                &items_path("100"),
                200,
                json!({"data": [
                    portfolio("200", json!([text_field("Group", "left")])),
                    portfolio("300", json!([text_field("Group", "right")]))
                ]}),
            )
            .json(&items_path("200"), 200, json!({"data": [portfolio("400", json!([]))]}))
            .json(&items_path("300"), 200, json!({"data": [portfolio("400", json!([]))]}))
            .json(&items_path("400"), 200, json!({"data": [project("1", json!([]))]}));

        let fetcher = PortfolioFetcher::new(transport, RetryPolicy::default());
        let observer = CollectingObserver::default();
        let auth = AuthHeaders::bearer("tok");
        let report = TreeExtractor::new(&fetcher, &observer, &auth)
            .extract("100", FlatRow::new())
            .await;

        let shared_fetches = fetcher
            .transport()
            .paths()
            .iter()
            .filter(|path| path.as_str() == items_path("400"))
            .count();
        assert_eq!(shared_fetches, 1);
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].get("Group"), Some(&CellValue::from("\"left\"")));
        assert_eq!(report.failed_branches, 1);
        assert_eq!(observer.errors().len(), 1);
        assert!(observer.errors()[0].contains("400"));
    }

    #[tokio::test]
    async fn test_layered_graph_fetches_each_portfolio_once() {
        // Six layers of two portfolios, each linked to both portfolios below it.
        let mut transport = ScriptedTransport::new().json(
            &items_path("root"),
            200,
            json!({"data": [portfolio("L0a", json!([])), portfolio("L0b", json!([]))]}),
        );
        for layer in 0..6 {
            let children = if layer < 5 {
                json!({"data": [
                    portfolio(&format!("L{}a", layer + 1), json!([])),
                    portfolio(&format!("L{}b", layer + 1), json!([]))
                ]})
            } else {
                json!({"data": [project("1", json!([]))]})
            };
            for side in ["a", "b"] {
                transport = transport.json(&items_path(&format!("L{layer}{side}")), 200, children.clone());
            }
        }

        let fetcher = PortfolioFetcher::new(transport, RetryPolicy::default());
        let observer = CollectingObserver::default();
        let auth = AuthHeaders::bearer("tok");
        let report = TreeExtractor::new(&fetcher, &observer, &auth)
            .extract("root", FlatRow::new())
            .await;

        assert_eq!(fetcher.transport().calls().len(), 13);
        // One row from each bottom portfolio; the table merges them later.
        assert_eq!(report.rows.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_branch_is_marked_incomplete() {
        let mut transport = ScriptedTransport::new().json(
            &items_path("100"),
            200,
            json!({"data": [portfolio("200", json!([])), project("1", json!([]))]}),
        );
        for _ in 0..10 {
            transport = transport.status(&items_path("200"), 500);
        }

        let (report, observer) = run(transport, "100").await;

        assert_eq!(ids(&report), vec!["\"1\""]);
        assert_eq!(report.exhausted, vec!["200".to_string()]);
        assert_eq!(report.failed_branches, 0);
        assert!(!report.is_complete());
        assert!(observer.errors()[0].contains("may be incomplete"));
    }
}
