//! A4 PDF rendering with the built-in Helvetica fonts.
//!
//! Layout is computed first as a list of positioned text runs per page, so
//! paging can be tested without decoding a PDF. `render` then replays the
//! runs through `printpdf`.

use printpdf::{BuiltinFont, Mm, PdfDocument};

use crate::{error::AppError, reports::ReportDocument};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 15.0;
const LINE_MM: f32 = 5.5;

const TITLE_SIZE: f32 = 16.0;
const HEADING_SIZE: f32 = 11.0;
const BODY_SIZE: f32 = 9.0;

/// Average Helvetica glyph width at `BODY_SIZE`, used to clip cells.
const BODY_CHAR_MM: f32 = 1.75;

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x_mm: f32,
    pub y_mm: f32,
    pub size: f32,
    pub bold: bool,
}

struct Cursor {
    pages: Vec<Vec<TextRun>>,
    y_mm: f32,
}

impl Cursor {
    fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            y_mm: PAGE_HEIGHT_MM - MARGIN_MM,
        }
    }

    fn fits(&self, lines: f32) -> bool {
        self.y_mm - lines * LINE_MM >= MARGIN_MM
    }

    fn new_page(&mut self) {
        self.pages.push(Vec::new());
        self.y_mm = PAGE_HEIGHT_MM - MARGIN_MM;
    }

    fn put(&mut self, text: String, x_mm: f32, size: f32, bold: bool) {
        if let Some(page) = self.pages.last_mut() {
            page.push(TextRun {
                text,
                x_mm,
                y_mm: self.y_mm,
                size,
                bold,
            });
        }
    }

    fn line(&mut self, text: String, size: f32, bold: bool) {
        if !self.fits(1.0) {
            self.new_page();
        }
        self.put(text, MARGIN_MM, size, bold);
        self.y_mm -= LINE_MM;
    }

    fn row(&mut self, cells: &[String], widths: &[f32], bold: bool) {
        let mut x = MARGIN_MM;
        for (cell, width) in cells.iter().zip(widths) {
            self.put(clip(cell, *width), x, BODY_SIZE, bold);
            x += width;
        }
        self.y_mm -= LINE_MM;
    }
}

/// Truncate `text` to what fits in `width_mm`.
fn clip(text: &str, width_mm: f32) -> String {
    let max = ((width_mm / BODY_CHAR_MM) as usize).saturating_sub(1).max(1);
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(max.saturating_sub(2).max(1)).collect();
    clipped.push_str("..");
    clipped
}

/// Column widths proportional to the longest cell, header included.
fn column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<f32> {
    let usable = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
    let longest: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            rows.iter()
                .filter_map(|row| row.get(idx))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(header.len()))
                .max()
                .unwrap_or(1)
                .clamp(4, 40)
        })
        .collect();
    let total: usize = longest.iter().sum();
    longest
        .iter()
        .map(|len| usable * *len as f32 / total.max(1) as f32)
        .collect()
}

/// Position every text run of `doc`, one inner `Vec` per page.
pub fn layout(doc: &ReportDocument) -> Vec<Vec<TextRun>> {
    let mut cursor = Cursor::new();

    cursor.line(doc.title.clone(), TITLE_SIZE, true);
    cursor.line(
        format!("Generated {}", doc.generated_at.format("%Y-%m-%d %H:%M UTC")),
        BODY_SIZE,
        false,
    );
    for line in &doc.summary {
        cursor.line(line.clone(), BODY_SIZE, false);
    }

    for table in &doc.tables {
        cursor.y_mm -= LINE_MM;
        if !cursor.fits(3.0) {
            cursor.new_page();
        }
        cursor.line(table.title.clone(), HEADING_SIZE, true);

        let headers: Vec<String> = table.headers.iter().map(|h| h.to_string()).collect();
        let widths = column_widths(&table.headers, &table.rows);
        cursor.row(&headers, &widths, true);

        if table.rows.is_empty() {
            cursor.line("No data".to_string(), BODY_SIZE, false);
        }
        for row in &table.rows {
            if !cursor.fits(1.0) {
                cursor.new_page();
                cursor.row(&headers, &widths, true);
            }
            cursor.row(row, &widths, false);
        }
    }

    cursor.pages
}

/// Render `doc` to PDF bytes.
pub fn render(doc: &ReportDocument) -> Result<Vec<u8>, AppError> {
    let pages = layout(doc);

    let (pdf, first_page, first_layer) =
        PdfDocument::new(&doc.title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
    let regular = pdf
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| AppError::Report(e.to_string()))?;
    let bold = pdf
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| AppError::Report(e.to_string()))?;

    for (idx, runs) in pages.iter().enumerate() {
        let (page, layer) = if idx == 0 {
            (first_page, first_layer)
        } else {
            pdf.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1")
        };
        let layer = pdf.get_page(page).get_layer(layer);
        for run in runs {
            let font = if run.bold { &bold } else { &regular };
            layer.use_text(run.text.clone(), run.size, Mm(run.x_mm), Mm(run.y_mm), font);
        }
        layer.use_text(
            format!("Page {} of {}", idx + 1, pages.len()),
            BODY_SIZE,
            Mm(PAGE_WIDTH_MM - MARGIN_MM - 25.0),
            Mm(MARGIN_MM / 2.0),
            &regular,
        );
    }

    pdf.save_to_bytes().map_err(|e| AppError::Report(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::Table;
    use chrono::Utc;

    fn document(rows: usize) -> ReportDocument {
        ReportDocument {
            title: "Sales".into(),
            generated_at: Utc::now(),
            summary: vec!["Period: 2025-01-01 to 2025-01-31".into()],
            tables: vec![Table {
                title: "By brand".into(),
                headers: vec!["Brand", "Units", "Revenue"],
                rows: (0..rows)
                    .map(|i| vec![format!("Brand {i}"), "1".into(), "ARS 1,00".into()])
                    .collect(),
            }],
        }
    }

    #[test]
    fn test_short_report_fits_one_page() {
        let pages = layout(&document(5));
        assert_eq!(pages.len(), 1);
        assert!(pages[0].iter().any(|r| r.text == "Sales" && r.bold));
    }

    #[test]
    fn test_long_table_pages_and_repeats_headers() {
        let pages = layout(&document(200));
        assert!(pages.len() > 1);
        for page in &pages[1..] {
            assert!(page.iter().any(|r| r.text == "Brand" && r.bold));
        }
        for run in pages.iter().flatten() {
            assert!(run.y_mm >= MARGIN_MM);
        }
        let body_rows = pages
            .iter()
            .flatten()
            .filter(|r| r.text.starts_with("Brand ") && !r.bold)
            .count();
        assert_eq!(body_rows, 200);
    }

    #[test]
    fn test_clip_long_cells() {
        assert_eq!(clip("short", 30.0), "short");
        let clipped = clip(&"x".repeat(100), 20.0);
        assert!(clipped.ends_with(".."));
        assert!(clipped.chars().count() < 20);
    }

    #[test]
    fn test_render_produces_pdf() {
        let bytes = render(&document(80)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
