//! Rendering of already-fetched row sets into downloadable PDF, CSV or JSON
//! artifacts.

pub mod csv;
pub mod pdf;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AppError;

pub const MAX_EXPORT_ROWS: usize = 10_000;
pub const MAX_EXPORT_COLUMNS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Csv,
    Json,
}

impl ExportFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportColumn {
    pub header: String,
    pub key: String,
}

impl ExportColumn {
    pub fn new(header: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            key: key.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportRequest {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    pub columns: Vec<ExportColumn>,
    #[serde(default)]
    pub rows: Vec<Value>,
    pub format: ExportFormat,
}

#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub filename: String,
    pub content_type: &'static str,
    pub body: Bytes,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ExportError {
    #[error("at least one column is required")]
    NoColumns,
    #[error("too many columns: {0} (max {max})", max = MAX_EXPORT_COLUMNS)]
    TooManyColumns(usize),
    #[error("too many rows: {0} (max {max})", max = MAX_EXPORT_ROWS)]
    TooManyRows(usize),
    #[error("row {0} is not a JSON object")]
    RowNotObject(usize),
}

impl From<ExportError> for AppError {
    fn from(error: ExportError) -> Self {
        AppError::Validation(format!("Export rejected: {}", error))
    }
}

/// Looks up `key` in a row. Falls back to a dotted path (`contact.name`)
/// when the flat key is absent.
pub fn lookup<'a>(row: &'a Value, key: &str) -> Option<&'a Value> {
    if let Some(value) = row.get(key) {
        return Some(value);
    }
    if !key.contains('.') {
        return None;
    }
    key.split('.').try_fold(row, |current, segment| current.get(segment))
}

/// Plain-text rendering of a cell. Missing and null cells are empty.
pub fn cell_text(row: &Value, key: &str) -> String {
    match lookup(row, key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}

/// `"Weekly Report: May"` becomes `weekly-report-may.csv`.
pub fn export_filename(title: &str, format: ExportFormat) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    let stem = if slug.is_empty() { "export" } else { slug };
    format!("{}.{}", stem, format.extension())
}

fn validate(request: &ExportRequest) -> Result<(), ExportError> {
    if request.columns.is_empty() {
        return Err(ExportError::NoColumns);
    }
    if request.columns.len() > MAX_EXPORT_COLUMNS {
        return Err(ExportError::TooManyColumns(request.columns.len()));
    }
    if request.rows.len() > MAX_EXPORT_ROWS {
        return Err(ExportError::TooManyRows(request.rows.len()));
    }
    if let Some(index) = request.rows.iter().position(|row| !row.is_object()) {
        return Err(ExportError::RowNotObject(index));
    }
    Ok(())
}

fn render_json(request: &ExportRequest, generated_at: DateTime<Utc>) -> Result<Vec<u8>, AppError> {
    let rows: Vec<Value> = request
        .rows
        .iter()
        .map(|row| {
            let mut mapped = Map::new();
            for column in &request.columns {
                let value = lookup(row, &column.key).cloned().unwrap_or(Value::Null);
                mapped.insert(column.header.clone(), value);
            }
            Value::Object(mapped)
        })
        .collect();

    let mut document = Map::new();
    document.insert("title".to_string(), Value::String(request.title.clone()));
    if let Some(subtitle) = &request.subtitle {
        document.insert("subtitle".to_string(), Value::String(subtitle.clone()));
    }
    document.insert("generatedAt".to_string(), Value::String(generated_at.to_rfc3339()));
    document.insert("columns".to_string(), serde_json::to_value(&request.columns)?);
    document.insert("rows".to_string(), Value::Array(rows));

    Ok(serde_json::to_vec_pretty(&Value::Object(document))?)
}

pub fn render(request: &ExportRequest, generated_at: DateTime<Utc>) -> Result<ExportArtifact, AppError> {
    validate(request)?;

    let body = match request.format {
        ExportFormat::Csv => csv::render(&request.columns, &request.rows).into_bytes(),
        ExportFormat::Json => render_json(request, generated_at)?,
        ExportFormat::Pdf => pdf::render(
            &request.title,
            request.subtitle.as_deref(),
            generated_at,
            &request.columns,
            &request.rows,
        ),
    };

    log::debug!(
        "Rendered {} export '{}' with {} rows ({} bytes)",
        request.format.extension(),
        request.title,
        request.rows.len(),
        body.len()
    );

    Ok(ExportArtifact {
        filename: export_filename(&request.title, request.format),
        content_type: request.format.content_type(),
        body: Bytes::from(body),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn request(format: ExportFormat) -> ExportRequest {
        ExportRequest {
            title: "Conversations".to_string(),
            subtitle: Some("Last 7 days".to_string()),
            columns: vec![ExportColumn::new("Contact", "contact.name"), ExportColumn::new("Messages", "count")],
            rows: vec![
                json!({ "contact": { "name": "Ana" }, "count": 12 }),
                json!({ "contact": { "name": "Ben" }, "count": null }),
            ],
            format,
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_filename_slugging() {
        assert_eq!(export_filename("Weekly Report: May", ExportFormat::Csv), "weekly-report-may.csv");
        assert_eq!(export_filename("  ", ExportFormat::Pdf), "export.pdf");
        assert_eq!(export_filename("Ünïcode", ExportFormat::Json), "n-code.json");
    }

    #[test]
    fn test_lookup_prefers_flat_key() {
        let row = json!({ "a.b": 1, "a": { "b": 2 } });
        assert_eq!(lookup(&row, "a.b"), Some(&json!(1)));
        let nested = json!({ "a": { "b": 2 } });
        assert_eq!(lookup(&nested, "a.b"), Some(&json!(2)));
        assert_eq!(lookup(&nested, "a.c"), None);
    }

    #[test]
    fn test_cell_text_renders_scalars_and_nested_values() {
        let row = json!({ "s": "x", "n": 1.5, "b": true, "z": null, "o": { "k": [1, 2] } });
        assert_eq!(cell_text(&row, "s"), "x");
        assert_eq!(cell_text(&row, "n"), "1.5");
        assert_eq!(cell_text(&row, "b"), "true");
        assert_eq!(cell_text(&row, "z"), "");
        assert_eq!(cell_text(&row, "missing"), "");
        assert_eq!(cell_text(&row, "o"), r#"{"k":[1,2]}"#);
    }

    #[test]
    fn test_render_json_maps_rows_by_header() {
        let artifact = render(&request(ExportFormat::Json), at()).unwrap();
        assert_eq!(artifact.filename, "conversations.json");
        assert_eq!(artifact.content_type, "application/json");

        let document: Value = serde_json::from_slice(&artifact.body).unwrap();
        assert_eq!(document["subtitle"], "Last 7 days");
        assert_eq!(document["generatedAt"], "2026-05-01T12:00:00+00:00");
        assert_eq!(
            document["rows"],
            json!([{ "Contact": "Ana", "Messages": 12 }, { "Contact": "Ben", "Messages": null }])
        );
    }

    #[test]
    fn test_render_csv_artifact() {
        let artifact = render(&request(ExportFormat::Csv), at()).unwrap();
        assert_eq!(artifact.filename, "conversations.csv");
        assert_eq!(&artifact.body[..], b"Contact,Messages\nAna,12\nBen,\n");
    }

    #[test]
    fn test_validation_errors() {
        let mut no_columns = request(ExportFormat::Csv);
        no_columns.columns.clear();
        assert_eq!(validate(&no_columns), Err(ExportError::NoColumns));

        let mut bad_row = request(ExportFormat::Csv);
        bad_row.rows.push(json!([1, 2]));
        assert_eq!(validate(&bad_row), Err(ExportError::RowNotObject(2)));

        let mut too_many = request(ExportFormat::Csv);
        too_many.rows = vec![json!({}); MAX_EXPORT_ROWS + 1];
        assert!(matches!(render(&too_many, at()), Err(AppError::Validation(_))));
    }
}
