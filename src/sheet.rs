//! The rendering sink: a spreadsheet-like grid the report builder writes
//! into, plus the in-memory document every report is built on.
//!
//! Coordinates are `(x, y)` = (column, row), zero-based. Lengths are in
//! 1/100 mm, font heights in points.

use std::collections::{BTreeMap, BTreeSet};

use crate::column::{HorizontalAlign, DEFAULT_CHAR_HEIGHT};
use crate::value::CellContent;

// ============================================================================
// Constants
// ============================================================================

/// Column width of a fresh sheet.
pub const DEFAULT_COLUMN_WIDTH: u32 = 2258;

/// Row height per point of the tallest font in the row.
const ROW_HEIGHT_PER_POINT: u32 = 45;

/// Estimated advance of one character per point of font height.
const CHAR_WIDTH_PER_POINT: f64 = 19.4;

/// Inner cell padding added to an optimal column width (both sides).
const CELL_PADDING: u32 = 200;

/// A4 in portrait orientation.
pub const A4_WIDTH: u32 = 21000;
pub const A4_HEIGHT: u32 = 29700;

/// Page margin on every side.
pub const PAGE_MARGIN: u32 = 500;

/// Background of the alternating bands.
pub const GREY_BAND: u32 = 0xdddddd;

// ============================================================================
// Ranges and Styles
// ============================================================================

/// Inclusive rectangle of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    pub x1: usize,
    pub y1: usize,
    pub x2: usize,
    pub y2: usize,
}

impl CellRange {
    pub fn new(x1: usize, y1: usize, x2: usize, y2: usize) -> Self {
        CellRange { x1, y1, x2, y2 }
    }

    pub fn cell(x: usize, y: usize) -> Self {
        CellRange::new(x, y, x, y)
    }

    /// `n` cells of row `y`, starting at column `x`.
    pub fn row(x: usize, y: usize, n: usize) -> Self {
        CellRange::new(x, y, x + n.saturating_sub(1), y)
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        (self.x1..=self.x2).contains(&x) && (self.y1..=self.y2).contains(&y)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Borders {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

impl Borders {
    pub const ALL: Borders = Borders {
        left: true,
        right: true,
        top: true,
        bottom: true,
    };

    pub fn any(&self) -> bool {
        self.left || self.right || self.top || self.bottom
    }

    fn union(self, other: Borders) -> Borders {
        Borders {
            left: self.left || other.left,
            right: self.right || other.right,
            top: self.top || other.top,
            bottom: self.bottom || other.bottom,
        }
    }
}

/// Cell attributes. `None` means "inherit": when styles are layered the
/// later one only overrides what it sets, borders accumulate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellStyle {
    pub borders: Borders,
    pub background: Option<u32>,
    pub bold: Option<bool>,
    pub char_height: Option<u32>,
    pub align: Option<HorizontalAlign>,
    pub vertical_center: Option<bool>,
    /// Left and right paragraph margin.
    pub padding: Option<u32>,
}

impl CellStyle {
    pub fn layer(&mut self, over: &CellStyle) {
        self.borders = self.borders.union(over.borders);
        self.background = over.background.or(self.background);
        self.bold = over.bold.or(self.bold);
        self.char_height = over.char_height.or(self.char_height);
        self.align = over.align.or(self.align);
        self.vertical_center = over.vertical_center.or(self.vertical_center);
        self.padding = over.padding.or(self.padding);
    }

    pub fn is_bold(&self) -> bool {
        self.bold.unwrap_or(false)
    }

    pub fn effective_char_height(&self) -> u32 {
        self.char_height.unwrap_or(DEFAULT_CHAR_HEIGHT)
    }
}

// ============================================================================
// Page Style
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageStyle {
    pub orientation: Orientation,
    /// Paper size as oriented.
    pub width: u32,
    pub height: u32,
    pub margin: u32,
    /// Left part of the running header, usually today's date.
    pub header: Option<String>,
    /// Print zoom in percent.
    pub scale: u32,
    pub center_horizontally: bool,
}

impl PageStyle {
    pub fn a4(orientation: Orientation) -> Self {
        let (width, height) = match orientation {
            Orientation::Portrait => (A4_WIDTH, A4_HEIGHT),
            Orientation::Landscape => (A4_HEIGHT, A4_WIDTH),
        };
        PageStyle {
            orientation,
            width,
            height,
            margin: PAGE_MARGIN,
            header: None,
            scale: 100,
            center_horizontally: true,
        }
    }

    pub fn is_landscape(&self) -> bool {
        self.orientation == Orientation::Landscape
    }
}

impl Default for PageStyle {
    fn default() -> Self {
        PageStyle::a4(Orientation::Portrait)
    }
}

// ============================================================================
// Sheet Trait
// ============================================================================

/// The primitives the report builder needs from a spreadsheet document.
pub trait Sheet {
    fn set_value(&mut self, x: usize, y: usize, content: CellContent);

    /// Displayed text of a cell, `None` when the cell is empty.
    fn cell_text(&self, x: usize, y: usize) -> Option<String>;

    fn style_range(&mut self, range: CellRange, style: &CellStyle);

    fn style_column(&mut self, col: usize, style: &CellStyle);

    fn column_width(&self, col: usize) -> u32;

    fn set_column_width(&mut self, col: usize, width: u32);

    /// Width that fits the column's content.
    fn optimal_column_width(&self, col: usize) -> u32;

    fn row_height(&self, row: usize) -> u32;

    fn set_row_height(&mut self, row: usize, height: u32);

    fn merge(&mut self, range: CellRange);

    /// Start a new printed page at `row`.
    fn set_page_break(&mut self, row: usize);

    /// Rows `0..rows` repeat on every printed page.
    fn set_title_rows(&mut self, rows: usize);

    fn set_page_style(&mut self, style: PageStyle);
}

// ============================================================================
// In-memory Sheet
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    pub content: Option<CellContent>,
    pub style: CellStyle,
}

/// The document a report is built on. Created fresh per report and handed
/// to one of the output backends afterwards.
#[derive(Debug, Clone)]
pub struct GridSheet {
    name: String,
    /// Keyed `(y, x)` so iteration is row-major.
    cells: BTreeMap<(usize, usize), Cell>,
    column_widths: BTreeMap<usize, u32>,
    column_styles: BTreeMap<usize, CellStyle>,
    row_heights: BTreeMap<usize, u32>,
    merges: Vec<CellRange>,
    page_breaks: BTreeSet<usize>,
    title_rows: usize,
    page_style: PageStyle,
}

impl GridSheet {
    pub fn new(name: &str) -> Self {
        GridSheet {
            name: name.to_string(),
            cells: BTreeMap::new(),
            column_widths: BTreeMap::new(),
            column_styles: BTreeMap::new(),
            row_heights: BTreeMap::new(),
            merges: Vec::new(),
            page_breaks: BTreeSet::new(),
            title_rows: 0,
            page_style: PageStyle::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        self.cells.get(&(y, x))
    }

    pub fn content(&self, x: usize, y: usize) -> Option<&CellContent> {
        self.cell(x, y).and_then(|c| c.content.as_ref())
    }

    /// All touched cells in row-major order as `((x, y), cell)`.
    pub fn cells(&self) -> impl Iterator<Item = ((usize, usize), &Cell)> {
        self.cells.iter().map(|(&(y, x), cell)| ((x, y), cell))
    }

    /// Column style with the cell's own style layered on top.
    pub fn effective_style(&self, x: usize, y: usize) -> CellStyle {
        let mut style = self.column_styles.get(&x).copied().unwrap_or_default();
        if let Some(cell) = self.cell(x, y) {
            style.layer(&cell.style);
        }
        style
    }

    /// Number of columns and rows that hold anything.
    pub fn extent(&self) -> (usize, usize) {
        let mut cols = self.column_widths.keys().next_back().map_or(0, |c| c + 1);
        let mut rows = 0;
        for &(y, x) in self.cells.keys() {
            cols = cols.max(x + 1);
            rows = rows.max(y + 1);
        }
        (cols, rows)
    }

    pub fn merges(&self) -> &[CellRange] {
        &self.merges
    }

    /// The merge whose top-left corner is `(x, y)`.
    pub fn merge_at(&self, x: usize, y: usize) -> Option<CellRange> {
        self.merges.iter().copied().find(|m| m.x1 == x && m.y1 == y)
    }

    /// True for cells hidden under a merge.
    pub fn is_covered(&self, x: usize, y: usize) -> bool {
        self.merges
            .iter()
            .any(|m| m.contains(x, y) && !(m.x1 == x && m.y1 == y))
    }

    pub fn page_breaks(&self) -> impl Iterator<Item = usize> + '_ {
        self.page_breaks.iter().copied()
    }

    pub fn has_explicit_width(&self, col: usize) -> bool {
        self.column_widths.contains_key(&col)
    }

    pub fn has_explicit_height(&self, row: usize) -> bool {
        self.row_heights.contains_key(&row)
    }

    pub fn title_rows(&self) -> usize {
        self.title_rows
    }

    pub fn page_style(&self) -> &PageStyle {
        &self.page_style
    }

    fn cell_mut(&mut self, x: usize, y: usize) -> &mut Cell {
        self.cells.entry((y, x)).or_default()
    }
}

impl Sheet for GridSheet {
    fn set_value(&mut self, x: usize, y: usize, content: CellContent) {
        self.cell_mut(x, y).content = Some(content);
    }

    fn cell_text(&self, x: usize, y: usize) -> Option<String> {
        self.content(x, y).map(CellContent::display_text)
    }

    fn style_range(&mut self, range: CellRange, style: &CellStyle) {
        for y in range.y1..=range.y2 {
            for x in range.x1..=range.x2 {
                self.cell_mut(x, y).style.layer(style);
            }
        }
    }

    fn style_column(&mut self, col: usize, style: &CellStyle) {
        self.column_styles.entry(col).or_default().layer(style);
    }

    fn column_width(&self, col: usize) -> u32 {
        self.column_widths.get(&col).copied().unwrap_or(DEFAULT_COLUMN_WIDTH)
    }

    fn set_column_width(&mut self, col: usize, width: u32) {
        self.column_widths.insert(col, width);
    }

    fn optimal_column_width(&self, col: usize) -> u32 {
        let widest = self
            .cells
            .iter()
            .filter(|(key, _)| key.1 == col)
            .filter_map(|(&(y, x), cell)| {
                let text = cell.content.as_ref()?.display_text();
                let chars = text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
                let points = self.effective_style(x, y).effective_char_height();
                Some((chars as f64 * points as f64 * CHAR_WIDTH_PER_POINT) as u32)
            })
            .max();

        match widest {
            Some(w) => w + CELL_PADDING,
            None => DEFAULT_COLUMN_WIDTH,
        }
    }

    fn row_height(&self, row: usize) -> u32 {
        if let Some(&h) = self.row_heights.get(&row) {
            return h;
        }

        let tallest = self
            .cells
            .range((row, 0)..(row + 1, 0))
            .filter(|(_, cell)| cell.content.is_some())
            .map(|(&(y, x), cell)| {
                let lines = cell
                    .content
                    .as_ref()
                    .map_or(1, |c| c.display_text().lines().count().max(1)) as u32;
                self.effective_style(x, y).effective_char_height() * lines
            })
            .max()
            .unwrap_or(DEFAULT_CHAR_HEIGHT)
            .max(DEFAULT_CHAR_HEIGHT);

        tallest * ROW_HEIGHT_PER_POINT
    }

    fn set_row_height(&mut self, row: usize, height: u32) {
        self.row_heights.insert(row, height);
    }

    fn merge(&mut self, range: CellRange) {
        self.merges.retain(|m| m.x1 != range.x1 || m.y1 != range.y1);
        self.merges.push(range);
    }

    fn set_page_break(&mut self, row: usize) {
        self.page_breaks.insert(row);
    }

    fn set_title_rows(&mut self, rows: usize) {
        self.title_rows = rows;
    }

    fn set_page_style(&mut self, style: PageStyle) {
        self.page_style = style;
    }
}
