//! Tabular PDF export of record lists.
//!
//! A4 portrait, Helvetica. The first page carries the title; every page
//! repeats the bold header row and a page footer. Cells that do not fit
//! their column are cut with `...`.

use std::io::BufWriter;
use std::ops::Range;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use tracing::{info, instrument};

use crate::error::{AppError, AppResult};
use crate::models::{Appointment, Doctor, HealthMetric, Medication, Prescription, Report};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_X: f32 = 20.0;
const TOP: f32 = 280.0;
const BOTTOM: f32 = 20.0;
const FOOTER_Y: f32 = 10.0;
/// Title plus the "generated" line on the first page.
const TITLE_BLOCK: f32 = 18.0;
const HEADER_ROW: f32 = 7.0;
const ROW_HEIGHT: f32 = 5.5;

const TITLE_FONT_SIZE: f32 = 14.0;
const HEADER_FONT_SIZE: f32 = 9.0;
const CELL_FONT_SIZE: f32 = 8.0;
const META_FONT_SIZE: f32 = 8.0;
/// Rough average Helvetica glyph width at the cell font size.
const CHAR_WIDTH_MM: f32 = 1.6;

/// Records that can be laid out as table rows.
pub trait Tabular {
    fn headers() -> Vec<&'static str>;
    /// One cell per header, in header order.
    fn row(&self) -> Vec<String>;
}

/// A titled table ready to be rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct TableExport {
    pub title: String,
    pub generated_on: NaiveDate,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableExport {
    pub fn from_records<T: Tabular>(title: &str, records: &[T]) -> Self {
        Self {
            title: title.to_string(),
            generated_on: Utc::now().date_naive(),
            headers: T::headers().into_iter().map(str::to_string).collect(),
            rows: records.iter().map(T::row).collect(),
        }
    }

    /// `<title-slug>-<date>.pdf`
    pub fn file_name(&self) -> String {
        let slug = self
            .title
            .to_lowercase()
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("-");
        let slug = if slug.is_empty() { "export".to_string() } else { slug };
        format!("{}-{}.pdf", slug, self.generated_on.format("%Y-%m-%d"))
    }
}

/// Row index ranges, one per page.
pub fn page_ranges(row_count: usize) -> Vec<Range<usize>> {
    let first = rows_fitting(TOP - BOTTOM - TITLE_BLOCK - HEADER_ROW);
    let rest = rows_fitting(TOP - BOTTOM - HEADER_ROW);

    let mut ranges = vec![0..row_count.min(first)];
    let mut start = row_count.min(first);
    while start < row_count {
        let end = (start + rest).min(row_count);
        ranges.push(start..end);
        start = end;
    }
    ranges
}

fn rows_fitting(available_mm: f32) -> usize {
    ((available_mm / ROW_HEIGHT).floor() as usize).max(1)
}

/// Shorten `text` to at most `max_chars` characters, on a single line.
pub fn truncate_cell(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let keep = max_chars.saturating_sub(3);
    let mut cut: String = flat.chars().take(keep).collect();
    cut.push_str("...");
    cut
}

#[instrument(skip_all, fields(title = %export.title, rows = export.rows.len()))]
pub fn render_pdf(export: &TableExport) -> AppResult<Vec<u8>> {
    if export.headers.is_empty() {
        return Err(AppError::Validation("export has no columns".to_string()));
    }

    let (doc, page1, layer1) =
        PdfDocument::new(&export.title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| AppError::Export(format!("PDF font error: {e}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| AppError::Export(format!("PDF font error: {e}")))?;

    let column_width = (PAGE_WIDTH - 2.0 * MARGIN_X) / export.headers.len() as f32;
    let max_chars = ((column_width / CHAR_WIDTH_MM).floor() as usize).max(4);
    let pages = page_ranges(export.rows.len());
    let page_count = pages.len();

    for (index, range) in pages.into_iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(page1).get_layer(layer1)
        } else {
            let (page, layer) = doc.add_page(
                Mm(PAGE_WIDTH),
                Mm(PAGE_HEIGHT),
                format!("Layer {}", index + 1),
            );
            doc.get_page(page).get_layer(layer)
        };

        let mut y = Mm(TOP);
        if index == 0 {
            layer.use_text(&export.title, TITLE_FONT_SIZE, Mm(MARGIN_X), y, &bold);
            y -= Mm(7.0);
            let meta = format!(
                "Generated {} - {} rows",
                export.generated_on.format("%Y-%m-%d"),
                export.rows.len()
            );
            layer.use_text(meta, META_FONT_SIZE, Mm(MARGIN_X), y, &font);
            y -= Mm(TITLE_BLOCK - 7.0);
        }

        let cells = Cells {
            layer: &layer,
            column_width,
            max_chars,
        };
        cells.draw(&export.headers, y, &bold, HEADER_FONT_SIZE);
        y -= Mm(HEADER_ROW);

        for row in &export.rows[range] {
            cells.draw(row, y, &font, CELL_FONT_SIZE);
            y -= Mm(ROW_HEIGHT);
        }

        let footer = format!("Page {} of {}", index + 1, page_count);
        layer.use_text(footer, META_FONT_SIZE, Mm(MARGIN_X), Mm(FOOTER_Y), &font);
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| AppError::Export(format!("PDF save error: {e}")))?;
    let bytes = buf
        .into_inner()
        .map_err(|e| AppError::Export(format!("PDF buffer error: {e}")))?;

    info!(pages = page_count, bytes = bytes.len(), "PDF rendered");
    Ok(bytes)
}

/// Render and write the PDF into `dir`, returning its path.
pub async fn write_pdf(export: &TableExport, dir: &Path) -> AppResult<PathBuf> {
    let bytes = render_pdf(export)?;
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(export.file_name());
    tokio::fs::write(&path, bytes).await?;
    info!(path = %path.display(), "Export written");
    Ok(path)
}

struct Cells<'a> {
    layer: &'a PdfLayerReference,
    column_width: f32,
    max_chars: usize,
}

impl Cells<'_> {
    fn draw(&self, cells: &[String], y: Mm, font: &IndirectFontRef, size: f32) {
        for (column, cell) in cells.iter().enumerate() {
            let x = MARGIN_X + column as f32 * self.column_width;
            self.layer
                .use_text(truncate_cell(cell, self.max_chars), size, Mm(x), y, font);
        }
    }
}

// --- Record layouts ---

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn opt_date(value: Option<NaiveDate>) -> String {
    value.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

impl Tabular for Doctor {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "Specialty", "Hospital", "Phone", "Email"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.specialty.clone(),
            opt(&self.hospital),
            opt(&self.phone),
            opt(&self.email),
        ]
    }
}

impl Tabular for Medication {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "Dosage", "Frequency", "Start", "End", "Active"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.dosage.clone(),
            self.frequency.clone(),
            opt_date(self.start_date),
            opt_date(self.end_date),
            if self.is_active { "Yes" } else { "No" }.to_string(),
        ]
    }
}

impl Tabular for Prescription {
    fn headers() -> Vec<&'static str> {
        vec!["Issued", "Diagnosis", "Notes", "Attachment"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.issued_on.format("%Y-%m-%d").to_string(),
            opt(&self.diagnosis),
            opt(&self.notes),
            if self.file_url.is_some() { "Yes" } else { "No" }.to_string(),
        ]
    }
}

impl Tabular for Report {
    fn headers() -> Vec<&'static str> {
        vec!["Date", "Title", "Type", "Lab", "Findings"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.report_date.format("%Y-%m-%d").to_string(),
            self.title.clone(),
            self.report_type.clone(),
            opt(&self.lab_name),
            opt(&self.findings),
        ]
    }
}

impl Tabular for Appointment {
    fn headers() -> Vec<&'static str> {
        vec!["When", "Title", "Location", "Status"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.scheduled_at.format("%Y-%m-%d %H:%M").to_string(),
            self.title.clone(),
            opt(&self.location),
            self.status.label().to_string(),
        ]
    }
}

impl Tabular for HealthMetric {
    fn headers() -> Vec<&'static str> {
        vec!["Recorded", "Metric", "Value", "Unit", "Notes"]
    }

    fn row(&self) -> Vec<String> {
        let value = match self.secondary_value {
            Some(secondary) => format!("{}/{}", self.value, secondary),
            None => self.value.to_string(),
        };
        vec![
            self.recorded_at.format("%Y-%m-%d %H:%M").to_string(),
            self.metric_type.label().to_string(),
            value,
            self.unit.clone(),
            opt(&self.notes),
        ]
    }
}
