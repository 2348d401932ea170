use serde_json::Value;

use super::{cell_text, ExportColumn};

fn needs_quoting(field: &str) -> bool {
    field.contains([',', '"', '\r', '\n'])
}

pub fn escape_field(field: &str) -> String {
    if needs_quoting(field) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn push_line<I: IntoIterator<Item = String>>(out: &mut String, fields: I) {
    let line = fields
        .into_iter()
        .map(|f| escape_field(&f))
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(&line);
    out.push('\n');
}

/// Header line followed by one line per row.
pub fn render(columns: &[ExportColumn], rows: &[Value]) -> String {
    let mut csv = String::new();
    push_line(&mut csv, columns.iter().map(|c| c.header.clone()));
    for row in rows {
        push_line(&mut csv, columns.iter().map(|c| cell_text(row, &c.key)));
    }
    csv
}
