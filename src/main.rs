use clap::Parser;
use portfolio_etl::utils::{logger, validation::Validate};
use portfolio_etl::{
    CliConfig, CollectingObserver, LocalStorage, PortfolioExporter, ReqwestTransport,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting portfolio-etl CLI");

    let config = match cli.resolve().and_then(|config| config.validate().map(|_| config)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };
    if cli.verbose {
        tracing::debug!("Resolved config: base_url={}, output_path={}", config.base_url(), config.output_path());
    }

    let transport = ReqwestTransport::new(config.base_url())?;
    let storage = LocalStorage::new(config.output_path().to_string());
    let exporter = PortfolioExporter::new(
        transport,
        storage,
        CollectingObserver::default(),
        config.retry_policy(),
    );

    let result = exporter
        .run(&config.api.token, &config.export.portfolio)
        .await;

    for message in exporter.observer().errors() {
        eprintln!("❌ {}", message);
    }

    match result {
        Ok(summary) => {
            println!(
                "✅ Exported {} projects ({} columns) to {}",
                summary.project_count, summary.column_count, summary.output_path
            );
            if summary.is_partial() {
                eprintln!(
                    "⚠️  Export is incomplete: {} portfolio(s) gave up after retries, {} branch(es) failed",
                    summary.incomplete_portfolios.len(),
                    summary.failed_branches
                );
                std::process::exit(2);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Export failed: {} (Category: {:?})",
                e,
                e.category()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    }

    Ok(())
}
