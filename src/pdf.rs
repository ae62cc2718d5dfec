//! PDF output of a finished sheet: the sheet is printed onto A4 pages at
//! its print zoom, title rows repeated on every page.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use printpdf::path::{PaintMode, WindingOrder};
use printpdf::*;

use crate::column::HorizontalAlign;
use crate::error::AppError;
use crate::sheet::{CellStyle, GridSheet, Sheet};
use crate::value::CellContent;

// ============================================================================
// Constants
// ============================================================================

const MM_PER_POINT: f32 = 0.3528;

/// Average glyph advance of Helvetica, in em.
const AVG_CHAR_EM: f32 = 0.5;

/// Line height of multi-line cells, in font heights.
const LINE_SPACING: f32 = 1.2;

/// Room taken by the running header at the top of every page.
const HEADER_HEIGHT_MM: f32 = 9.0;
const HEADER_FONT_SIZE: f32 = 10.0;

/// Inner padding of cells without an explicit one, 1/100 mm.
const DEFAULT_PADDING: u32 = 100;

const BORDER_THICKNESS: f32 = 0.3;

// ============================================================================
// Pagination
// ============================================================================

/// Split the data rows `title_rows..heights.len()` into pages.
///
/// Rows in `joined` continue a merged cell from the row above and stay on
/// the same page as it. A page ends before an explicit break and before a
/// block of rows that would not fit into `available`. Every page holds at
/// least one block, so a block taller than a page still gets printed.
pub fn paginate(
    heights: &[f32],
    title_rows: usize,
    breaks: &BTreeSet<usize>,
    joined: &BTreeSet<usize>,
    available: f32,
) -> Vec<Vec<usize>> {
    let mut pages = Vec::new();
    let mut current: Vec<usize> = Vec::new();
    let mut used = 0.0;

    let mut row = title_rows;
    while row < heights.len() {
        let mut end = row + 1;
        while end < heights.len() && joined.contains(&end) {
            end += 1;
        }
        let h: f32 = heights[row..end].iter().sum();

        if !current.is_empty() && (breaks.contains(&row) || used + h > available) {
            pages.push(std::mem::take(&mut current));
            used = 0.0;
        }
        current.extend(row..end);
        used += h;
        row = end;
    }
    if !current.is_empty() || pages.is_empty() {
        pages.push(current);
    }
    pages
}

/// Row heights in scaled millimetres.
fn row_heights(sheet: &GridSheet) -> Vec<f32> {
    let scale = sheet.page_style().scale.max(1) as f32 / 100.0;
    let (_, rows) = sheet.extent();
    (0..rows)
        .map(|row| sheet.row_height(row) as f32 / 100.0 * scale)
        .collect()
}

/// Data rows of every printed page of `sheet`.
pub fn page_rows(sheet: &GridSheet) -> Vec<Vec<usize>> {
    let page = sheet.page_style();
    let heights = row_heights(sheet);

    let header_h = if page.header.is_some() { HEADER_HEIGHT_MM } else { 0.0 };
    let title_rows = sheet.title_rows().min(heights.len());
    let title_h: f32 = heights[..title_rows].iter().sum();
    let available = (page.height as f32 - 2.0 * page.margin as f32) / 100.0 - header_h - title_h;

    let breaks: BTreeSet<usize> = sheet.page_breaks().collect();
    let joined: BTreeSet<usize> = sheet
        .merges()
        .iter()
        .flat_map(|m| m.y1 + 1..=m.y2)
        .collect();
    paginate(&heights, title_rows, &breaks, &joined, available)
}

// ============================================================================
// PDF Generation
// ============================================================================

pub fn save(sheet: &GridSheet, path: &Path) -> Result<(), AppError> {
    let page = sheet.page_style();
    let page_w = page.width as f32 / 100.0;
    let page_h = page.height as f32 / 100.0;
    let margin = page.margin as f32 / 100.0;

    let (doc, page1, layer1) = PdfDocument::new(sheet.name(), Mm(page_w), Mm(page_h), "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| AppError::PdfError(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| AppError::PdfError(e.to_string()))?;

    let canvas = Canvas::new(sheet, font, bold);

    let content_w = canvas.col_x.last().copied().unwrap_or(0.0);
    let printable_w = page_w - 2.0 * margin;
    let left = if page.center_horizontally && content_w < printable_w {
        margin + (printable_w - content_w) / 2.0
    } else {
        margin
    };

    let title_rows = sheet.title_rows().min(canvas.row_h.len());
    let pages = page_rows(sheet);

    for (n, rows) in pages.iter().enumerate() {
        let layer = if n == 0 {
            doc.get_page(page1).get_layer(layer1)
        } else {
            let (p, l) = doc.add_page(Mm(page_w), Mm(page_h), "Layer 1");
            doc.get_page(p).get_layer(l)
        };

        let mut top = margin;
        if let Some(header) = &page.header {
            layer.set_fill_color(black());
            layer.use_text(
                header.as_str(),
                HEADER_FONT_SIZE,
                Mm(margin),
                Mm(page_h - margin - HEADER_FONT_SIZE * MM_PER_POINT),
                &canvas.font,
            );
            top += HEADER_HEIGHT_MM;
        }

        for row in (0..title_rows).chain(rows.iter().copied()) {
            canvas.draw_row(&layer, row, left, page_h - top);
            top += canvas.row_h[row];
        }
    }

    log::debug!(
        "{} pages at {}% for {}",
        pages.len(),
        page.scale,
        sheet.name()
    );

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    doc.save(&mut writer)
        .map_err(|e| AppError::PdfError(e.to_string()))?;

    Ok(())
}

/// The sheet measured in scaled millimetres.
struct Canvas<'a> {
    sheet: &'a GridSheet,
    scale: f32,
    /// Left edge of every column, plus the right edge of the last one.
    col_x: Vec<f32>,
    row_h: Vec<f32>,
    font: IndirectFontRef,
    bold: IndirectFontRef,
}

impl<'a> Canvas<'a> {
    fn new(sheet: &'a GridSheet, font: IndirectFontRef, bold: IndirectFontRef) -> Self {
        let scale = sheet.page_style().scale.max(1) as f32 / 100.0;
        let (cols, _) = sheet.extent();

        let mut col_x = Vec::with_capacity(cols + 1);
        let mut x = 0.0;
        col_x.push(x);
        for col in 0..cols {
            x += sheet.column_width(col) as f32 / 100.0 * scale;
            col_x.push(x);
        }
        let row_h = row_heights(sheet);

        Canvas {
            sheet,
            scale,
            col_x,
            row_h,
            font,
            bold,
        }
    }

    /// Draw sheet row `row` with its top edge at `top` (PDF coordinates).
    fn draw_row(&self, layer: &PdfLayerReference, row: usize, left: f32, top: f32) {
        let cols = self.col_x.len().saturating_sub(1);
        for col in 0..cols {
            if self.sheet.is_covered(col, row) {
                continue;
            }
            let (x2, y2) = match self.sheet.merge_at(col, row) {
                Some(m) => (m.x2.min(cols - 1), m.y2.min(self.row_h.len() - 1)),
                None if self.sheet.cell(col, row).is_some() => (col, row),
                None => continue,
            };

            let x = left + self.col_x[col];
            let w = self.col_x[x2 + 1] - self.col_x[col];
            let h: f32 = self.row_h[row..=y2].iter().sum();
            let style = self.sheet.effective_style(col, row);

            if let Some(rgb) = style.background {
                fill_rect(layer, x, top - h, w, h, rgb);
            }
            draw_borders(layer, &style, x, top, w, h);
            if let Some(content) = self.sheet.content(col, row) {
                self.draw_text(layer, content, &style, x, top, w, h);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_text(
        &self,
        layer: &PdfLayerReference,
        content: &CellContent,
        style: &CellStyle,
        x: f32,
        top: f32,
        w: f32,
        h: f32,
    ) {
        let text = content.display_text();
        let size = style.effective_char_height() as f32 * self.scale;
        let line_h = size * MM_PER_POINT * LINE_SPACING;
        let pad = style.padding.unwrap_or(DEFAULT_PADDING) as f32 / 100.0 * self.scale;
        let font = if style.is_bold() { &self.bold } else { &self.font };

        let lines: Vec<&str> = text.lines().collect();
        let block = lines.len() as f32 * line_h;
        let first_top = if style.vertical_center.unwrap_or(false) {
            top - (h - block).max(0.0) / 2.0
        } else {
            top - (h - block).max(0.0)
        };

        layer.set_fill_color(black());
        for (i, line) in lines.iter().enumerate() {
            let advance = line.chars().count() as f32 * size * MM_PER_POINT * AVG_CHAR_EM;
            let tx = match style.align {
                Some(HorizontalAlign::Center) => x + (w - advance) / 2.0,
                Some(HorizontalAlign::Right) => x + w - pad - advance,
                Some(HorizontalAlign::Left) => x + pad,
                Some(HorizontalAlign::Standard) | None if content.is_numeric() => {
                    x + w - pad - advance
                }
                Some(HorizontalAlign::Standard) | None => x + pad,
            };
            let baseline = first_top - (i as f32 + 0.8) * line_h;
            layer.use_text(*line, size, Mm(tx), Mm(baseline), font);
        }
    }
}

// ============================================================================
// Drawing Utilities
// ============================================================================

fn black() -> Color {
    Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None))
}

fn rgb_color(rgb: u32) -> Color {
    let channel = |shift: u32| ((rgb >> shift) & 0xff) as f32 / 255.0;
    Color::Rgb(Rgb::new(channel(16), channel(8), channel(0), None))
}

fn fill_rect(layer: &PdfLayerReference, x: f32, y: f32, w: f32, h: f32, rgb: u32) {
    let ring = vec![
        (Point::new(Mm(x), Mm(y)), false),
        (Point::new(Mm(x + w), Mm(y)), false),
        (Point::new(Mm(x + w), Mm(y + h)), false),
        (Point::new(Mm(x), Mm(y + h)), false),
    ];
    layer.set_fill_color(rgb_color(rgb));
    layer.add_polygon(Polygon {
        rings: vec![ring],
        mode: PaintMode::Fill,
        winding_order: WindingOrder::NonZero,
    });
}

fn draw_borders(layer: &PdfLayerReference, style: &CellStyle, x: f32, top: f32, w: f32, h: f32) {
    let borders = style.borders;
    if !borders.any() {
        return;
    }
    layer.set_outline_color(black());
    layer.set_outline_thickness(BORDER_THICKNESS);

    let bottom = top - h;
    if borders.top {
        draw_line(layer, x, top, x + w, top);
    }
    if borders.bottom {
        draw_line(layer, x, bottom, x + w, bottom);
    }
    if borders.left {
        draw_line(layer, x, bottom, x, top);
    }
    if borders.right {
        draw_line(layer, x + w, bottom, x + w, top);
    }
}

fn draw_line(layer: &PdfLayerReference, x1: f32, y1: f32, x2: f32, y2: f32) {
    let points = vec![
        (Point::new(Mm(x1), Mm(y1)), false),
        (Point::new(Mm(x2), Mm(y2)), false),
    ];
    let line = Line {
        points,
        is_closed: false,
    };
    layer.add_line(line);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::{Borders, CellRange, Orientation, PageStyle};

    fn breaks(rows: &[usize]) -> BTreeSet<usize> {
        rows.iter().copied().collect()
    }

    fn none() -> BTreeSet<usize> {
        BTreeSet::new()
    }

    #[test]
    fn rows_flow_onto_the_next_page() {
        let heights = [5.0; 7];
        let pages = paginate(&heights, 1, &breaks(&[]), &none(), 12.0);
        assert_eq!(pages, vec![vec![1, 2], vec![3, 4], vec![5, 6]]);
    }

    #[test]
    fn explicit_breaks_start_pages() {
        let heights = [5.0; 6];
        let pages = paginate(&heights, 0, &breaks(&[2, 4]), &none(), 100.0);
        assert_eq!(pages, vec![vec![0, 1], vec![2, 3], vec![4, 5]]);
    }

    #[test]
    fn oversized_row_gets_its_own_page() {
        let pages = paginate(&[50.0, 3.0], 0, &breaks(&[]), &none(), 10.0);
        assert_eq!(pages, vec![vec![0], vec![1]]);
    }

    #[test]
    fn title_only_sheet_prints_one_page() {
        assert_eq!(paginate(&[5.0], 1, &breaks(&[]), &none(), 10.0), vec![Vec::<usize>::new()]);
        assert_eq!(paginate(&[], 0, &breaks(&[]), &none(), 10.0), vec![Vec::<usize>::new()]);
    }

    #[test]
    fn merged_rows_stay_on_one_page() {
        // rows 2 and 4 continue the rows above; row 2 would overflow alone
        let heights = [5.0; 6];
        let pages = paginate(&heights, 0, &none(), &breaks(&[2, 4]), 12.0);
        assert_eq!(pages, vec![vec![0], vec![1, 2], vec![3, 4], vec![5]]);

        // an explicit break inside a merge is not honoured
        let pages = paginate(&heights, 0, &breaks(&[2]), &breaks(&[2]), 100.0);
        assert_eq!(pages, vec![vec![0, 1, 2, 3, 4, 5]]);
    }

    #[test]
    fn location_page_records_are_not_split() {
        use crate::builder::{PageOptions, ReportBuilder};
        use crate::column::ColumnFormat;
        use crate::style::RowStyle;
        use crate::value::CellValue;

        let record = |i: usize| {
            vec![
                CellValue::Text(format!("{}", 1000 + i)),
                CellValue::Text(format!("Apfel {}", i)),
                CellValue::from("DE"),
                CellValue::from("Kg"),
                CellValue::Amount(2.0),
                CellValue::Amount(2.5),
            ]
        };
        let list: Vec<_> = (0..40).map(record).collect();

        let mut b = ReportBuilder::new(GridSheet::new("Waagenliste"), 1, 1);
        b.add_page_list(&[list], RowStyle::Block).unwrap();
        b.add_columns(&[
            ColumnFormat::new().height(24).width(18).bold(),
            ColumnFormat::new().height(29).width(100).bold(),
            ColumnFormat::new().width(8),
            ColumnFormat::new().height(22).width(35),
            ColumnFormat::new().height(22).width(35),
        ]);
        b.format_columns();
        b.set_page_style(&PageOptions {
            fit: false,
            date: chrono::NaiveDate::from_ymd_opt(2024, 5, 1),
            ..Default::default()
        });
        let sheet = b.finish();

        let pages = page_rows(&sheet);
        assert!(pages.len() > 1);
        for rows in &pages {
            // every page starts on the first row of a record
            assert_eq!(rows[0] % 2, 1, "page starts at row {}", rows[0]);
            assert_eq!(rows.len() % 2, 0);
        }
        let printed: usize = pages.iter().map(Vec::len).sum();
        assert_eq!(printed, 80);
    }

    #[test]
    fn writes_a_pdf() {
        let mut sheet = GridSheet::new("KassenlisteGemüse");
        sheet.set_value(0, 0, CellContent::Text("Gemüse".into()));
        sheet.set_value(1, 1, CellContent::Currency(1.99));
        sheet.set_value(2, 1, CellContent::Text("Kg".into()));
        sheet.merge(CellRange::new(0, 1, 0, 2));
        sheet.style_range(
            CellRange::row(0, 1, 3),
            &CellStyle {
                borders: Borders::ALL,
                background: Some(0xdddddd),
                align: Some(HorizontalAlign::Center),
                ..Default::default()
            },
        );
        sheet.set_page_break(2);
        sheet.set_title_rows(1);
        sheet.set_page_style(PageStyle {
            header: Some("01.05.2024".into()),
            scale: 80,
            ..PageStyle::a4(Orientation::Landscape)
        });

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        save(&sheet, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn grey_is_converted_per_channel() {
        match rgb_color(0xff8000) {
            Color::Rgb(c) => {
                assert_eq!(c.r, 1.0);
                assert!((c.g - 128.0 / 255.0).abs() < 1e-6);
                assert_eq!(c.b, 0.0);
            }
            _ => panic!("expected rgb"),
        }
    }
}
