pub mod export;
pub mod extractor;
pub mod fetcher;
pub mod flatten;
pub mod table;

#[cfg(test)]
pub(crate) mod test_support;

pub use crate::domain::model::{ExtractionReport, FlatRow, Table};
pub use crate::domain::ports::{ApiTransport, ExportObserver, Storage};
pub use crate::utils::error::Result;
