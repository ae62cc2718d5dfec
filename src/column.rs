// ============================================================================
// Column Formats
// ============================================================================

/// Char height every sheet starts with, in points.
pub const DEFAULT_CHAR_HEIGHT: u32 = 12;

/// Default column width in mm.
pub const DEFAULT_COLUMN_WIDTH_MM: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HorizontalAlign {
    #[default]
    Standard,
    Left,
    Center,
    Right,
}

/// Presentation options for one column of a list.
///
/// Built with the chaining setters below, starting from the defaults:
///
/// ```
/// use price_sheets::ColumnFormat;
///
/// let ean = ColumnFormat::new().width(10).bold();
/// assert_eq!(ean.char_height, 12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnFormat {
    /// Width in mm. With `try_optimal_width` this is the upper bound.
    pub width_mm: u32,
    /// Char height in points.
    pub char_height: u32,
    pub bold: bool,
    /// Make cells bold whose text looks like a discrete unit ("St", "Bd").
    pub grey_unit: bool,
    /// Fit the width to the content first, capped at `width_mm`.
    pub try_optimal_width: bool,
    pub align: HorizontalAlign,
}

impl ColumnFormat {
    pub const fn new() -> Self {
        ColumnFormat {
            width_mm: DEFAULT_COLUMN_WIDTH_MM,
            char_height: DEFAULT_CHAR_HEIGHT,
            bold: false,
            grey_unit: false,
            try_optimal_width: false,
            align: HorizontalAlign::Standard,
        }
    }

    pub const fn width(mut self, mm: u32) -> Self {
        self.width_mm = mm;
        self
    }

    pub const fn height(mut self, points: u32) -> Self {
        self.char_height = points;
        self
    }

    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub const fn grey_unit(mut self) -> Self {
        self.grey_unit = true;
        self
    }

    pub const fn optimal_width(mut self) -> Self {
        self.try_optimal_width = true;
        self
    }

    pub const fn align(mut self, align: HorizontalAlign) -> Self {
        self.align = align;
        self
    }

    /// Width in 1/100 mm, the unit the sheet works in.
    pub const fn width_hmm(&self) -> u32 {
        self.width_mm * 100
    }

    pub const fn has_custom_height(&self) -> bool {
        self.char_height != DEFAULT_CHAR_HEIGHT
    }
}

impl Default for ColumnFormat {
    fn default() -> Self {
        Self::new()
    }
}

/// A title written into the header row of every column-group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderTitle {
    /// Column offset inside the column-group.
    pub column: usize,
    pub text: String,
    pub format: ColumnFormat,
}

impl HeaderTitle {
    pub fn new(column: usize, text: &str, format: ColumnFormat) -> Self {
        HeaderTitle {
            column,
            text: text.to_string(),
            format,
        }
    }
}
