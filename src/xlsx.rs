//! Excel output of a finished sheet.

use std::path::Path;

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet};

use crate::column::HorizontalAlign;
use crate::error::AppError;
use crate::sheet::{CellStyle, GridSheet, Sheet};
use crate::value::{CellContent, CURRENCY_FORMAT};

/// 1/100 mm per character of column width (Calibri 11, 7 px at 96 dpi).
const HMM_PER_CHAR: f64 = 185.2;

/// 1/100 mm per point.
const HMM_PER_POINT: f64 = 35.28;

const HMM_PER_INCH: f64 = 2540.0;

/// Excel's paper size code for A4.
const PAPER_A4: u8 = 9;

/// Print zoom Excel accepts.
const MIN_PRINT_SCALE: u32 = 10;
const MAX_PRINT_SCALE: u32 = 400;

const HEADER_MARGIN_INCHES: f64 = 0.1;

pub fn save(sheet: &GridSheet, path: &Path) -> Result<(), AppError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet.name())?;

    let (cols, rows) = sheet.extent();
    for col in (0..cols).filter(|&c| sheet.has_explicit_width(c)) {
        let width = sheet.column_width(col) as f64 / HMM_PER_CHAR;
        worksheet.set_column_width(col as u16, width)?;
    }
    for row in 0..rows {
        let height = sheet.row_height(row) as f64 / HMM_PER_POINT;
        worksheet.set_row_height(row as u32, height)?;
    }

    for range in sheet.merges() {
        let format = cell_format(&sheet.effective_style(range.x1, range.y1), None);
        worksheet.merge_range(
            range.y1 as u32,
            range.x1 as u16,
            range.y2 as u32,
            range.x2 as u16,
            "",
            &format,
        )?;
    }

    for ((x, y), cell) in sheet.cells() {
        if sheet.is_covered(x, y) {
            continue;
        }
        let style = sheet.effective_style(x, y);
        let format = cell_format(&style, cell.content.as_ref());
        let (row, col) = (y as u32, x as u16);
        match &cell.content {
            Some(CellContent::Text(s)) => {
                worksheet.write_string_with_format(row, col, s, &format)?;
            }
            Some(CellContent::Number(n)) | Some(CellContent::Currency(n)) => {
                worksheet.write_number_with_format(row, col, *n, &format)?;
            }
            None if sheet.merge_at(x, y).is_none() => {
                worksheet.write_blank(row, col, &format)?;
            }
            None => {}
        }
    }

    setup_page(worksheet, sheet)?;

    workbook.save(path)?;
    log::debug!("wrote {} x {} cells to {}", cols, rows, path.display());
    Ok(())
}

fn setup_page(worksheet: &mut Worksheet, sheet: &GridSheet) -> Result<(), AppError> {
    let page = sheet.page_style();

    worksheet.set_paper_size(PAPER_A4);
    if page.is_landscape() {
        worksheet.set_landscape();
    } else {
        worksheet.set_portrait();
    }

    let margin = page.margin as f64 / HMM_PER_INCH;
    worksheet.set_margins(
        margin,
        margin,
        margin,
        margin,
        HEADER_MARGIN_INCHES,
        HEADER_MARGIN_INCHES,
    );
    worksheet.set_print_center_horizontally(page.center_horizontally);

    let scale = page.scale.clamp(MIN_PRINT_SCALE, MAX_PRINT_SCALE);
    if scale != page.scale {
        log::warn!(
            "print zoom {}% is out of range, Excel gets {}%",
            page.scale,
            scale
        );
    }
    worksheet.set_print_scale(scale as u16);

    if let Some(header) = &page.header {
        worksheet.set_header(&format!("&L{}", header));
    }

    if sheet.title_rows() > 0 {
        worksheet.set_repeat_rows(0, sheet.title_rows() as u32 - 1)?;
    }

    let breaks: Vec<u32> = sheet.page_breaks().map(|r| r as u32).collect();
    if !breaks.is_empty() {
        worksheet.set_page_breaks(&breaks)?;
    }
    Ok(())
}

fn cell_format(style: &CellStyle, content: Option<&CellContent>) -> Format {
    let mut format = Format::new().set_font_size(style.effective_char_height() as f64);

    if style.is_bold() {
        format = format.set_bold();
    }
    if let Some(rgb) = style.background {
        format = format.set_background_color(Color::RGB(rgb));
    }

    let borders = style.borders;
    if borders.left {
        format = format.set_border_left(FormatBorder::Thin);
    }
    if borders.right {
        format = format.set_border_right(FormatBorder::Thin);
    }
    if borders.top {
        format = format.set_border_top(FormatBorder::Thin);
    }
    if borders.bottom {
        format = format.set_border_bottom(FormatBorder::Thin);
    }

    match style.align {
        Some(HorizontalAlign::Left) => format = format.set_align(FormatAlign::Left),
        Some(HorizontalAlign::Center) => format = format.set_align(FormatAlign::Center),
        Some(HorizontalAlign::Right) => format = format.set_align(FormatAlign::Right),
        Some(HorizontalAlign::Standard) | None => {}
    }
    if style.vertical_center.unwrap_or(false) {
        format = format.set_align(FormatAlign::VerticalCenter);
    }
    if style.padding.is_some() {
        format = format.set_indent(1);
    }

    if let Some(CellContent::Currency(_)) = content {
        format = format.set_num_format(CURRENCY_FORMAT);
    }
    if let Some(CellContent::Text(s)) = content {
        if s.contains('\n') {
            format = format.set_text_wrap();
        }
    }
    format
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::{Borders, CellRange, Orientation, PageStyle};

    fn sample() -> GridSheet {
        let mut sheet = GridSheet::new("Waagenliste");
        sheet.set_value(0, 0, CellContent::Text("Nicht-\nmitglieder".into()));
        sheet.set_value(0, 1, CellContent::Number(4711.0));
        sheet.set_value(1, 1, CellContent::Currency(2.49));
        sheet.merge(CellRange::new(2, 1, 2, 2));
        sheet.style_range(
            CellRange::row(0, 1, 3),
            &CellStyle {
                borders: Borders::ALL,
                background: Some(0xdddddd),
                ..Default::default()
            },
        );
        sheet.set_column_width(0, 3000);
        sheet.set_row_height(1, 900);
        sheet.set_page_break(2);
        sheet.set_title_rows(1);
        sheet.set_page_style(PageStyle {
            header: Some("01.05.2024".into()),
            scale: 5,
            ..PageStyle::a4(Orientation::Landscape)
        });
        sheet
    }

    #[test]
    fn writes_a_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        save(&sample(), &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn empty_sheet_is_still_a_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.xlsx");
        save(&GridSheet::new("leer"), &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn out_of_range_zoom_is_clamped() {
        // sample() asks for 5%, which Excel would reject
        let dir = tempfile::tempdir().unwrap();
        let mut sheet = sample();
        sheet.set_page_style(PageStyle {
            scale: 1000,
            ..sheet.page_style().clone()
        });
        save(&sheet, &dir.path().join("big.xlsx")).unwrap();
    }
}
