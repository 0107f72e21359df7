use crate::domain::model::{CellValue, CustomFieldType, FlatRow, PortfolioNode};

pub const PROJECT_ID_COLUMN: &str = "Project Id";

/// Wraps text in double quotes, doubling any quote inside it.
pub fn escape_text(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

fn status_color(status_type: &str) -> Option<&'static str> {
    match status_type {
        "on_track" => Some("green"),
        "at_risk" => Some("yellow"),
        "off_track" => Some("red"),
        "on_hold" => Some("blue"),
        "complete" => Some("complete"),
        _ => None,
    }
}

fn escaped(value: Option<&str>) -> CellValue {
    CellValue::Text(escape_text(value.unwrap_or_default()))
}

fn raw(value: Option<&str>) -> CellValue {
    match value {
        Some(text) if !text.is_empty() => CellValue::Text(text.to_string()),
        _ => CellValue::Empty,
    }
}

/// Maps the standard project attributes to descriptive report columns.
pub fn flatten_project(node: &PortfolioNode) -> FlatRow {
    let status = node.current_status_update.as_ref();
    let status_author = status
        .and_then(|s| s.created_by.as_ref())
        .and_then(|author| author.name.as_deref());
    let color = status
        .and_then(|s| s.status_type.as_deref())
        .and_then(status_color)
        .map_or(CellValue::Empty, CellValue::from);
    let owner = node.owner.as_ref().and_then(|owner| owner.name.as_deref());

    let archived = match node.archived {
        Some(true) => CellValue::Bool(true),
        _ => CellValue::from("false"),
    };
    let public = match node.public {
        Some(true) => CellValue::Bool(true),
        _ => CellValue::Empty,
    };

    [
        (PROJECT_ID_COLUMN, escaped(Some(node.gid.as_str()))),
        ("Project Name", escaped(node.name.as_deref())),
        ("Project Notes", escaped(node.notes.as_deref())),
        ("Project Color", escaped(node.color.as_deref())),
        ("Project Created At", raw(node.created_at.as_deref())),
        ("Project Data Archived", archived),
        ("Project Current Status Color", color),
        ("Project Current Status Posted By", escaped(status_author)),
        (
            "Project Current Status Posted On",
            raw(status.and_then(|s| s.created_at.as_deref())),
        ),
        (
            "Project Current Status Text",
            escaped(status.and_then(|s| s.text.as_deref())),
        ),
        ("Project Modified At", raw(node.modified_at.as_deref())),
        ("Project Owner Name", escaped(owner)),
        ("Project Public", public),
        ("Project Start On", raw(node.start_on.as_deref())),
        ("Project Due On", raw(node.due_on.as_deref())),
    ]
    .into_iter()
    .collect()
}

/// Flattens a node's custom fields into `field name -> value`.
///
/// Enum, people and text values are quoted. Dates and numbers are written
/// raw. A field without a display value always becomes an empty cell.
pub fn flatten_custom_fields(node: &PortfolioNode) -> FlatRow {
    let mut row = FlatRow::new();

    for field in node.custom_fields.iter().flatten() {
        let display = match field.display_value.as_deref() {
            Some(display) if !display.is_empty() => display,
            _ => {
                row.insert(field.name.as_str(), CellValue::Empty);
                continue;
            }
        };

        let value = match field.field_type {
            CustomFieldType::MultiEnum
            | CustomFieldType::Enum
            | CustomFieldType::Text
            | CustomFieldType::People => CellValue::Text(escape_text(display)),
            CustomFieldType::Date => CellValue::Text(display.to_string()),
            CustomFieldType::Number => field
                .number_value
                .clone()
                .map_or(CellValue::Empty, CellValue::Number),
            CustomFieldType::Unknown => {
                tracing::debug!(field = %field.name, "Skipping custom field of unsupported type");
                continue;
            }
        };
        row.insert(field.name.as_str(), value);
    }

    row
}

/// Layers rows from lowest to highest precedence.
///
/// A later layer overwrites like-named columns of earlier ones. Columns keep
/// the position in which they first appeared.
pub fn override_chain<'a>(layers: impl IntoIterator<Item = &'a FlatRow>) -> FlatRow {
    let mut merged = FlatRow::new();
    for layer in layers {
        for (column, value) in layer.iter() {
            merged.insert(column, value.clone());
        }
    }
    merged
}
