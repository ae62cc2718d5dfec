use chrono::NaiveDate;

use crate::column::{ColumnFormat, HeaderTitle, HorizontalAlign};
use crate::error::AppError;
use crate::fit::PageFitter;
use crate::layout::{Pos, TableLayout};
use crate::sheet::{CellRange, CellStyle, Orientation, PageStyle, Sheet};
use crate::style::RowStyle;
use crate::value::{CellContent, Row};

// ============================================================================
// Constants
// ============================================================================

/// Width of the blank column between two column-groups.
pub const SPACER_COLUMN_WIDTH: u32 = 800;

/// Default char height of list labels.
pub const LABEL_CHAR_HEIGHT: u32 = 14;

/// Records of a page list: EAN, description, country, unit, two prices.
pub const PAGE_LIST_WIDTH: usize = 6;

/// Sheet columns a page list occupies.
const PAGE_LIST_COLUMNS: usize = 5;

/// Unit strings of this length are discrete units, except "Kg".
const UNIT_LENGTH: usize = 2;
const WEIGHT_UNIT: &str = "Kg";

// ============================================================================
// Page Options
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageOptions {
    pub landscape: bool,
    /// Compute the print zoom from the sheet extent.
    pub fit: bool,
    /// Pages the rows are spread over when fitting.
    pub pages: usize,
    /// Put this date into the running header.
    pub date: Option<NaiveDate>,
}

impl Default for PageOptions {
    fn default() -> Self {
        PageOptions {
            landscape: false,
            fit: true,
            pages: 1,
            date: None,
        }
    }
}

// ============================================================================
// Report Builder
// ============================================================================

/// Fills one sheet with lists, formats its columns and sets up the page.
pub struct ReportBuilder<S: Sheet> {
    sheet: S,
    group_columns: usize,
    title_rows: usize,
    col_cols: usize,
    total_cols: usize,
    total_rows: usize,
    header_positions: Vec<Pos>,
    columns: Vec<ColumnFormat>,
}

impl<S: Sheet> ReportBuilder<S> {
    /// `group_columns` side-by-side column-groups below `title_rows`
    /// reserved rows.
    pub fn new(sheet: S, group_columns: usize, title_rows: usize) -> Self {
        ReportBuilder {
            sheet,
            group_columns: group_columns.max(1),
            title_rows,
            col_cols: 0,
            total_cols: 0,
            total_rows: 0,
            header_positions: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn sheet(&self) -> &S {
        &self.sheet
    }

    pub fn finish(self) -> S {
        self.sheet
    }

    pub fn header_positions(&self) -> &[Pos] {
        &self.header_positions
    }

    /// Sheet extent as (columns, rows below the title rows).
    pub fn extent(&self) -> (usize, usize) {
        (self.total_cols, self.total_rows)
    }

    /// Tile `lists` over the column-groups and write them.
    pub fn add_data(&mut self, lists: &[Vec<Row>], style: RowStyle) -> Result<(), AppError> {
        let layout = TableLayout::plan(lists, self.group_columns, self.title_rows)?;
        layout.populate(&mut self.sheet, style);

        let geometry = layout.geometry();
        self.col_cols = geometry.col_cols;
        self.total_cols = geometry.total_cols;
        self.total_rows = geometry.total_rows;
        self.header_positions = layout.header_positions();
        Ok(())
    }

    /// Fixed two-rows-per-record layout, one printed page per list.
    ///
    /// EAN, description and both prices fill merged cells spanning the two
    /// rows; the middle column holds the country above the unit.
    pub fn add_page_list(&mut self, lists: &[Vec<Row>], style: RowStyle) -> Result<(), AppError> {
        for (group, list) in lists.iter().enumerate() {
            if let Some((row, r)) = list.iter().enumerate().find(|(_, r)| r.len() != PAGE_LIST_WIDTH) {
                return Err(AppError::InconsistentRowWidth {
                    group,
                    row,
                    expected: PAGE_LIST_WIDTH,
                    found: r.len(),
                });
            }
        }
        if lists.iter().all(Vec::is_empty) {
            return Err(AppError::EmptyInput);
        }

        self.col_cols = PAGE_LIST_COLUMNS;
        self.total_cols = PAGE_LIST_COLUMNS;
        self.header_positions.clear();

        let mut y = self.title_rows;
        for list in lists {
            if y > self.title_rows && !list.is_empty() {
                self.sheet.set_page_break(y);
            }
            self.header_positions.push(Pos::new(0, y));
            for row in list {
                self.write_merged(0, y, row[0].to_content());
                self.write_merged(1, y, row[1].to_content());
                self.sheet.set_value(2, y, row[2].to_content());
                self.sheet.set_value(2, y + 1, row[3].to_content());
                self.write_merged(3, y, row[4].to_content());
                self.write_merged(4, y, row[5].to_content());

                style.apply(&mut self.sheet, 0, y, PAGE_LIST_COLUMNS);
                style.apply(&mut self.sheet, 0, y + 1, PAGE_LIST_COLUMNS);
                y += 2;
            }
        }

        self.total_rows = y - self.title_rows;
        log::debug!(
            "page list: {} lists, {} sheet rows",
            lists.len(),
            self.total_rows
        );
        Ok(())
    }

    fn write_merged(&mut self, x: usize, y: usize, content: CellContent) {
        self.sheet.merge(CellRange::new(x, y, x, y + 1));
        self.sheet.set_value(x, y, content);
    }

    pub fn add_columns(&mut self, formats: &[ColumnFormat]) {
        self.columns.extend_from_slice(formats);
    }

    /// Apply the column formats to every column-group and size the spacer
    /// columns between them.
    pub fn format_columns(&mut self) {
        let stride = self.col_cols + 1;
        for t in 0..self.group_columns {
            for i in 0..self.columns.len() {
                let format = self.columns[i];
                self.format_column(t * stride + i, &format);
            }
            if t + 1 < self.group_columns {
                self.sheet
                    .set_column_width((t + 1) * stride - 1, SPACER_COLUMN_WIDTH);
            }
        }
    }

    fn format_column(&mut self, col: usize, format: &ColumnFormat) {
        let width = if format.try_optimal_width {
            self.sheet.optimal_column_width(col).min(format.width_hmm())
        } else {
            format.width_hmm()
        };
        self.sheet.set_column_width(col, width);

        if format.grey_unit {
            self.mark_units(col);
        }

        self.sheet.style_column(
            col,
            &CellStyle {
                bold: format.bold.then_some(true),
                char_height: format.has_custom_height().then_some(format.char_height),
                align: match format.align {
                    HorizontalAlign::Left | HorizontalAlign::Right => Some(format.align),
                    _ => None,
                },
                vertical_center: Some(true),
                ..Default::default()
            },
        );
    }

    /// Bold two-letter unit strings ("St", "Bd"), weights excepted.
    fn mark_units(&mut self, col: usize) {
        for y in self.title_rows..self.title_rows + self.total_rows {
            let is_unit = self
                .sheet
                .cell_text(col, y)
                .is_some_and(|t| t.chars().count() == UNIT_LENGTH && t != WEIGHT_UNIT);
            if is_unit {
                self.sheet.style_range(
                    CellRange::cell(col, y),
                    &CellStyle {
                        bold: Some(true),
                        ..Default::default()
                    },
                );
            }
        }
    }

    /// Write each label one column right of its list's header slot.
    pub fn set_list_labels(&mut self, labels: &[&str], char_height: u32) {
        if labels.len() > self.header_positions.len() {
            log::warn!(
                "{} labels for {} lists, ignoring the rest",
                labels.len(),
                self.header_positions.len()
            );
        }
        for (label, pos) in labels.iter().zip(self.header_positions.clone()) {
            self.sheet
                .set_value(pos.x + 1, pos.y, CellContent::Text(label.to_string()));
            self.sheet.style_range(
                CellRange::cell(pos.x + 1, pos.y),
                &CellStyle {
                    bold: Some(true),
                    char_height: Some(char_height),
                    ..Default::default()
                },
            );
        }
    }

    /// Titles in row 0 of every column-group; row 0 repeats on each page.
    pub fn set_header_row(&mut self, titles: &[HeaderTitle]) {
        self.sheet.set_title_rows(1);
        let stride = self.col_cols + 1;
        for t in 0..self.group_columns {
            for title in titles {
                let x = t * stride + title.column;
                self.sheet.set_value(x, 0, CellContent::Text(title.text.clone()));
                self.sheet.style_range(
                    CellRange::cell(x, 0),
                    &CellStyle {
                        bold: title.format.bold.then_some(true),
                        char_height: title
                            .format
                            .has_custom_height()
                            .then_some(title.format.char_height),
                        align: (title.format.align != HorizontalAlign::Standard)
                            .then_some(title.format.align),
                        ..Default::default()
                    },
                );
            }
        }
    }

    /// Set up the printed page and, with `fit`, the zoom. Returns the zoom.
    pub fn set_page_style(&mut self, options: &PageOptions) -> u32 {
        let orientation = if options.landscape {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        };
        let mut page = PageStyle::a4(orientation);
        page.header = options.date.map(|d| d.format("%d.%m.%Y").to_string());

        if options.fit {
            let fitter = PageFitter::new(orientation, options.pages, options.date.is_some());
            let widths: Vec<u32> = (0..self.total_cols)
                .map(|c| self.sheet.column_width(c))
                .collect();
            let mut heights: Vec<u32> = (0..self.title_rows + self.total_rows)
                .map(|r| self.sheet.row_height(r))
                .collect();

            let fit = fitter.fit(&widths, &mut heights, self.title_rows);
            if fit.stretch.is_some() {
                for (row, height) in heights.into_iter().enumerate() {
                    self.sheet.set_row_height(row, height);
                }
            }
            page.scale = fit.scale;
        }

        let scale = page.scale;
        self.sheet.set_page_style(page);
        scale
    }
}
