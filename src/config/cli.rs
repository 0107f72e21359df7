use crate::config::toml_config::ExportConfig;
use crate::utils::error::Result;
use clap::Parser;

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "portfolio-etl")]
#[command(about = "Export every project in an Asana portfolio tree to CSV")]
pub struct CliConfig {
    /// Personal Access Token used as the bearer credential
    #[arg(long)]
    pub token: Option<String>,

    /// Portfolio link, e.g. https://app.asana.com/0/portfolio/12345/list
    #[arg(long)]
    pub portfolio: Option<String>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Directory that receives portfolio_export.csv
    #[arg(long)]
    pub output_path: Option<String>,

    #[arg(long)]
    pub base_url: Option<String>,

    #[arg(long)]
    pub max_attempts: Option<u32>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl CliConfig {
    /// Loads the config file, if one was given, and lays command-line values over it.
    pub fn resolve(&self) -> Result<ExportConfig> {
        let mut config = match &self.config {
            Some(path) => ExportConfig::from_file(path)?,
            None => ExportConfig::default(),
        };

        if let Some(token) = &self.token {
            config.api.token = token.clone();
        }
        if let Some(portfolio) = &self.portfolio {
            config.export.portfolio = portfolio.clone();
        }
        if let Some(output_path) = &self.output_path {
            config.export.output_path = output_path.clone();
        }
        if let Some(base_url) = &self.base_url {
            config.api.base_url = base_url.clone();
        }
        if let Some(max_attempts) = self.max_attempts {
            config.retry.max_attempts = max_attempts;
        }

        Ok(config)
    }
}
