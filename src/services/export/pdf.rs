//! Minimal PDF 1.4 writer for tabular exports.
//!
//! Output uses the standard Helvetica fonts (no embedding), one text line per
//! table row, and a fixed number of rows per page.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{cell_text, ExportColumn};

const PAGE_WIDTH: u32 = 595;
const PAGE_HEIGHT: u32 = 842;
const MARGIN: u32 = 40;
const ROWS_PER_PAGE: usize = 50;
const ROW_LEADING: u32 = 13;
const MAX_LINE_CHARS: usize = 110;
const CELL_SEPARATOR: &str = " | ";

/// Escapes text for a PDF literal string. Characters outside Latin-1 become
/// `?` since the fonts use WinAnsiEncoding.
fn pdf_text(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                out.push(c as u8);
            }
            c if (c as u32) < 0x20 => out.push(b' '),
            c if (c as u32) <= 0xFF => out.push(c as u32 as u8),
            _ => out.push(b'?'),
        }
    }
    out
}

fn truncate(line: &str) -> String {
    if line.chars().count() <= MAX_LINE_CHARS {
        return line.to_string();
    }
    let mut truncated: String = line.chars().take(MAX_LINE_CHARS - 3).collect();
    truncated.push_str("...");
    truncated
}

fn text_line(content: &mut Vec<u8>, font: &str, size: u32, y: u32, text: &str) {
    content.extend_from_slice(format!("BT /{} {} Tf {} {} Td (", font, size, MARGIN, y).as_bytes());
    content.extend_from_slice(&pdf_text(text));
    content.extend_from_slice(b") Tj ET\n");
}

fn page_content(
    title: &str,
    subtitle: Option<&str>,
    footer: &str,
    header_line: &str,
    lines: &[String],
) -> Vec<u8> {
    let mut content = Vec::new();
    let mut y = PAGE_HEIGHT - MARGIN - 16;

    text_line(&mut content, "F2", 16, y, &truncate(title));
    if let Some(subtitle) = subtitle {
        y -= 16;
        text_line(&mut content, "F1", 11, y, &truncate(subtitle));
    }

    y -= 24;
    text_line(&mut content, "F2", 9, y, &truncate(header_line));

    for line in lines {
        y -= ROW_LEADING;
        text_line(&mut content, "F1", 9, y, line);
    }

    text_line(&mut content, "F1", 8, MARGIN / 2, footer);
    content
}

struct PdfWriter {
    buffer: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn new() -> Self {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        Self {
            buffer,
            offsets: Vec::new(),
        }
    }

    /// Objects must be written in id order starting at 1.
    fn object(&mut self, body: &[u8]) {
        self.offsets.push(self.buffer.len());
        let id = self.offsets.len();
        self.buffer.extend_from_slice(format!("{} 0 obj\n", id).as_bytes());
        self.buffer.extend_from_slice(body);
        self.buffer.extend_from_slice(b"\nendobj\n");
    }

    fn stream(&mut self, data: &[u8]) {
        let mut body = format!("<< /Length {} >>\nstream\n", data.len()).into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(b"\nendstream");
        self.object(&body);
    }

    fn finish(mut self) -> Vec<u8> {
        let xref_offset = self.buffer.len();
        let size = self.offsets.len() + 1;
        self.buffer.extend_from_slice(format!("xref\n0 {}\n", size).as_bytes());
        self.buffer.extend_from_slice(b"0000000000 65535 f \n");
        for offset in &self.offsets {
            self.buffer.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        self.buffer.extend_from_slice(
            format!("trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n", size, xref_offset).as_bytes(),
        );
        self.buffer
    }
}

pub fn render(
    title: &str,
    subtitle: Option<&str>,
    generated_at: DateTime<Utc>,
    columns: &[ExportColumn],
    rows: &[Value],
) -> Vec<u8> {
    let header_line = columns
        .iter()
        .map(|c| c.header.as_str())
        .collect::<Vec<_>>()
        .join(CELL_SEPARATOR);

    let lines: Vec<String> = rows
        .iter()
        .map(|row| {
            let cells: Vec<String> = columns.iter().map(|c| cell_text(row, &c.key)).collect();
            truncate(&cells.join(CELL_SEPARATOR))
        })
        .collect();

    let chunks: Vec<&[String]> = if lines.is_empty() {
        vec![&lines[..]]
    } else {
        lines.chunks(ROWS_PER_PAGE).collect()
    };
    let page_count = chunks.len();

    // 1 catalog, 2 pages, 3-4 fonts, then a (page, content) pair per page
    let page_id = |index: usize| 5 + 2 * index;

    let mut writer = PdfWriter::new();
    writer.object(b"<< /Type /Catalog /Pages 2 0 R >>");

    let kids = (0..page_count)
        .map(|i| format!("{} 0 R", page_id(i)))
        .collect::<Vec<_>>()
        .join(" ");
    writer.object(format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, page_count).as_bytes());
    writer.object(b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>");
    writer.object(b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>");

    let generated = generated_at.format("%Y-%m-%d %H:%M UTC").to_string();

    for (index, chunk) in chunks.iter().enumerate() {
        writer.object(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
                PAGE_WIDTH,
                PAGE_HEIGHT,
                page_id(index) + 1
            )
            .as_bytes(),
        );
        let footer = format!("Generated {} - page {} of {}", generated, index + 1, page_count);
        writer.stream(&page_content(title, subtitle, &footer, &header_line, chunk));
    }

    writer.finish()
}
