pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::ExportConfig;

pub use crate::adapters::{http::ReqwestTransport, observer::CollectingObserver, storage::LocalStorage};
pub use crate::core::{
    export::{PortfolioExporter, EXPORT_FILE_NAME},
    fetcher::RetryPolicy,
};
pub use utils::error::{ExportError, Result};
