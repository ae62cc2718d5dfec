use crate::sheet::{Borders, CellRange, CellStyle, Sheet, GREY_BAND};

/// Paragraph margin inside bordered blocks.
const BLOCK_PADDING: u32 = 100;

/// How a placed data row is decorated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowStyle {
    /// Lines around every cell.
    #[default]
    Block,
    /// Outer lines only, grey background on odd sheet rows.
    AltGrey,
}

impl RowStyle {
    /// Style `n` cells of row `y` starting at column `x`.
    pub fn apply<S: Sheet + ?Sized>(&self, sheet: &mut S, x: usize, y: usize, n: usize) {
        if n == 0 {
            return;
        }
        match self {
            RowStyle::Block => {
                sheet.style_range(
                    CellRange::row(x, y, n),
                    &CellStyle {
                        borders: Borders::ALL,
                        padding: Some(BLOCK_PADDING),
                        ..Default::default()
                    },
                );
            }
            RowStyle::AltGrey => {
                sheet.style_range(
                    CellRange::cell(x, y),
                    &CellStyle {
                        borders: Borders {
                            left: true,
                            ..Default::default()
                        },
                        ..Default::default()
                    },
                );
                sheet.style_range(
                    CellRange::cell(x + n - 1, y),
                    &CellStyle {
                        borders: Borders {
                            right: true,
                            ..Default::default()
                        },
                        ..Default::default()
                    },
                );
                if y & 1 == 1 {
                    sheet.style_range(
                        CellRange::row(x, y, n),
                        &CellStyle {
                            background: Some(GREY_BAND),
                            ..Default::default()
                        },
                    );
                }
            }
        }
    }
}
