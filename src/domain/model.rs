use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Project,
    Portfolio,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NamedRef {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusUpdate {
    pub status_type: Option<String>,
    pub created_by: Option<NamedRef>,
    pub created_at: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomFieldType {
    MultiEnum,
    Enum,
    Text,
    People,
    Date,
    Number,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomField {
    pub name: String,
    pub display_value: Option<String>,
    #[serde(rename = "type")]
    pub field_type: CustomFieldType,
    pub number_value: Option<serde_json::Number>,
}

/// One child item of a portfolio, as returned by `/portfolios/{id}/items`.
#[derive(Debug, Clone, Deserialize)]
pub struct PortfolioNode {
    pub gid: String,
    pub resource_type: ResourceKind,
    pub name: Option<String>,
    pub notes: Option<String>,
    pub color: Option<String>,
    pub created_at: Option<String>,
    pub modified_at: Option<String>,
    pub archived: Option<bool>,
    pub public: Option<bool>,
    pub current_status_update: Option<StatusUpdate>,
    pub owner: Option<NamedRef>,
    pub start_on: Option<String>,
    pub due_on: Option<String>,
    pub custom_fields: Option<Vec<CustomField>>,
}

#[derive(Debug, Deserialize)]
pub struct ItemsEnvelope {
    pub data: Vec<PortfolioNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
    Empty,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(text) => f.write_str(text),
            CellValue::Number(number) => write!(f, "{number}"),
            CellValue::Bool(flag) => write!(f, "{flag}"),
            CellValue::Empty => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

/// Column name to value mapping that remembers the order keys first appeared.
///
/// Overwriting an existing key keeps its position, so composing rows behaves
/// like layering one record on top of another.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatRow {
    cells: Vec<(String, CellValue)>,
}

impl FlatRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(key, _)| key == column)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: CellValue) {
        let column = column.into();
        match self.cells.iter_mut().find(|(key, _)| *key == column) {
            Some((_, existing)) => *existing = value,
            None => self.cells.push((column, value)),
        }
    }

    /// Adds the value only when the column is not already set.
    pub fn insert_if_absent(&mut self, column: &str, value: &CellValue) {
        if !self.contains(column) {
            self.cells.push((column.to_string(), value.clone()));
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, CellValue)> for FlatRow {
    fn from_iter<I: IntoIterator<Item = (K, CellValue)>>(iter: I) -> Self {
        let mut row = FlatRow::new();
        for (key, value) in iter {
            row.insert(key, value);
        }
        row
    }
}

/// Everything one recursive extraction call produced.
#[derive(Debug, Default)]
pub struct ExtractionReport {
    pub rows: Vec<FlatRow>,
    /// Portfolios whose item fetch ran out of retries.
    pub exhausted: Vec<String>,
    pub failed_branches: usize,
}

impl ExtractionReport {
    pub fn absorb(&mut self, child: ExtractionReport) {
        self.rows.extend(child.rows);
        self.exhausted.extend(child.exhausted);
        self.failed_branches += child.failed_branches;
    }

    pub fn is_complete(&self) -> bool {
        self.exhausted.is_empty() && self.failed_branches == 0
    }
}

#[derive(Debug, Clone)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<FlatRow>,
}

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub output_path: String,
    pub project_count: usize,
    pub column_count: usize,
    pub incomplete_portfolios: Vec<String>,
    pub failed_branches: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ExportSummary {
    pub fn is_partial(&self) -> bool {
        !self.incomplete_portfolios.is_empty() || self.failed_branches > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportStage {
    ValidatingInput,
    CheckingCredentials,
    FetchingPortfolio { portfolio: String },
    BuildingTable { rows: usize },
    Writing { file: String },
    Finished,
}

impl fmt::Display for ExportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportStage::ValidatingInput => f.write_str("validating input"),
            ExportStage::CheckingCredentials => f.write_str("checking credentials"),
            ExportStage::FetchingPortfolio { portfolio } => {
                write!(f, "fetching portfolio {portfolio}")
            }
            ExportStage::BuildingTable { rows } => write!(f, "building table from {rows} rows"),
            ExportStage::Writing { file } => write!(f, "writing {file}"),
            ExportStage::Finished => f.write_str("finished"),
        }
    }
}
