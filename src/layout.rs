//! Tiling of several lists into side-by-side column-groups of equal height.
//!
//! Every list takes one label row, one row per record and one blank
//! separator row (none after the last list). The sheet needs
//! `needed = 2 * lists - 1 + records` slots, spread over `group_columns`
//! column-groups of `ceil(needed / group_columns)` rows each. The rounding
//! slack goes to the first lists as one extra blank row apiece.

use crate::error::AppError;
use crate::sheet::Sheet;
use crate::style::RowStyle;
use crate::value::Row;

// ============================================================================
// Positions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub fn new(x: usize, y: usize) -> Self {
        Pos { x, y }
    }
}

/// Walks down one column-group and wraps to the top of the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pos: Pos,
    stride: usize,
    rows: usize,
    top: usize,
}

impl Cursor {
    /// `col_cols` data columns per group, `rows` rows per column-group,
    /// starting below `top` reserved title rows.
    pub fn new(col_cols: usize, rows: usize, top: usize) -> Self {
        Cursor {
            pos: Pos::new(0, top),
            stride: col_cols + 1,
            rows,
            top,
        }
    }

    pub fn pos(&self) -> Pos {
        self.pos
    }

    pub fn advance(&mut self) {
        self.pos.y += 1;
        if self.pos.y == self.rows + self.top {
            self.pos.x += self.stride;
            self.pos.y = self.top;
        }
    }
}

// ============================================================================
// Geometry
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutGeometry {
    pub group_columns: usize,
    /// Data columns per record (widest list).
    pub col_cols: usize,
    /// Sheet columns including the spacer column between column-groups.
    pub total_cols: usize,
    /// Rows per column-group, not counting title rows.
    pub total_rows: usize,
    pub needed: usize,
    /// Slots left over after rounding `total_rows` up.
    pub rest: usize,
    pub title_rows: usize,
}

impl LayoutGeometry {
    /// Column-group a sheet column belongs to.
    pub fn column_group(&self, x: usize) -> usize {
        x / (self.col_cols + 1)
    }

    /// First sheet column of column-group `t`.
    pub fn column_group_start(&self, t: usize) -> usize {
        t * (self.col_cols + 1)
    }
}

/// Where one list ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPlacement {
    /// Label slot, the row before the first record.
    pub header: Pos,
    pub rows: Vec<Pos>,
    pub separator: Option<Pos>,
    /// Extra blank row absorbing rounding slack.
    pub slack: Option<Pos>,
}

impl GroupPlacement {
    /// Every slot the list consumes, top to bottom.
    pub fn slots(&self) -> impl Iterator<Item = Pos> + '_ {
        std::iter::once(self.header)
            .chain(self.rows.iter().copied())
            .chain(self.separator)
            .chain(self.slack)
    }
}

// ============================================================================
// Table Layout
// ============================================================================

#[derive(Debug, Clone)]
pub struct TableLayout<'a> {
    lists: &'a [Vec<Row>],
    geometry: LayoutGeometry,
    placements: Vec<GroupPlacement>,
}

impl<'a> TableLayout<'a> {
    /// Place `lists` into `group_columns` column-groups (at least one).
    pub fn plan(
        lists: &'a [Vec<Row>],
        group_columns: usize,
        title_rows: usize,
    ) -> Result<Self, AppError> {
        let group_columns = group_columns.max(1);
        let col_cols = column_count(lists)?;

        let records: usize = lists.iter().map(Vec::len).sum();
        let needed = lists.len() * 2 - 1 + records;
        let total_rows = needed.div_ceil(group_columns);
        let rest = total_rows * group_columns - needed;

        let geometry = LayoutGeometry {
            group_columns,
            col_cols,
            total_cols: group_columns * (col_cols + 1) - 1,
            total_rows,
            needed,
            rest,
            title_rows,
        };

        let mut cursor = Cursor::new(col_cols, total_rows, title_rows);
        let mut slack_left = rest;
        let mut placements = Vec::with_capacity(lists.len());

        for (index, list) in lists.iter().enumerate() {
            let header = cursor.pos();
            cursor.advance();

            let mut rows = Vec::with_capacity(list.len());
            for _ in list {
                rows.push(cursor.pos());
                cursor.advance();
            }

            let separator = if index + 1 < lists.len() {
                let pos = cursor.pos();
                cursor.advance();
                Some(pos)
            } else {
                None
            };

            let slack = if slack_left > 0 {
                slack_left -= 1;
                let pos = cursor.pos();
                cursor.advance();
                Some(pos)
            } else {
                None
            };

            placements.push(GroupPlacement {
                header,
                rows,
                separator,
                slack,
            });
        }

        log::debug!(
            "layout: {} lists, {} records, {} column-groups -> {} cols x {} rows (needed {}, rest {})",
            lists.len(),
            records,
            group_columns,
            geometry.total_cols,
            total_rows,
            needed,
            rest,
        );

        Ok(TableLayout {
            lists,
            geometry,
            placements,
        })
    }

    pub fn geometry(&self) -> &LayoutGeometry {
        &self.geometry
    }

    pub fn placements(&self) -> &[GroupPlacement] {
        &self.placements
    }

    pub fn header_positions(&self) -> Vec<Pos> {
        self.placements.iter().map(|p| p.header).collect()
    }

    /// Write every record into `sheet` and decorate each row with `style`
    /// across the full record width.
    pub fn populate<S: Sheet + ?Sized>(&self, sheet: &mut S, style: RowStyle) {
        for (list, placement) in self.lists.iter().zip(&self.placements) {
            for (row, pos) in list.iter().zip(&placement.rows) {
                for (i, value) in row.iter().enumerate() {
                    sheet.set_value(pos.x + i, pos.y, value.to_content());
                }
                style.apply(sheet, pos.x, pos.y, self.geometry.col_cols);
            }
        }
    }
}

/// Width of the widest list. Rows inside one list must agree.
fn column_count(lists: &[Vec<Row>]) -> Result<usize, AppError> {
    let mut col_cols = 0;
    for (group, list) in lists.iter().enumerate() {
        let Some(first) = list.first() else {
            continue;
        };
        let expected = first.len();
        if let Some((row, found)) = list
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|&(_, len)| len != expected)
        {
            return Err(AppError::InconsistentRowWidth {
                group,
                row,
                expected,
                found,
            });
        }
        col_cols = col_cols.max(expected);
    }

    if col_cols == 0 {
        return Err(AppError::EmptyInput);
    }
    Ok(col_cols)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::{GridSheet, GREY_BAND};
    use crate::value::{CellContent, CellValue};
    use std::collections::HashMap;

    fn list(len: usize, width: usize) -> Vec<Row> {
        (0..len)
            .map(|r| (0..width).map(|c| CellValue::Integer((r * 10 + c) as i64)).collect())
            .collect()
    }

    fn lists(sizes: &[usize]) -> Vec<Vec<Row>> {
        sizes.iter().map(|&n| list(n, 3)).collect()
    }

    #[test]
    fn cursor_wraps_to_next_column_group() {
        let mut cursor = Cursor::new(4, 3, 1);
        assert_eq!(cursor.pos(), Pos::new(0, 1));
        cursor.advance();
        cursor.advance();
        assert_eq!(cursor.pos(), Pos::new(0, 3));
        cursor.advance();
        assert_eq!(cursor.pos(), Pos::new(5, 1));
    }

    #[test]
    fn two_lists_in_two_column_groups() {
        let data = lists(&[5, 3]);
        let layout = TableLayout::plan(&data, 2, 0).unwrap();
        let g = layout.geometry();
        assert_eq!(g.needed, 11);
        assert_eq!(g.total_rows, 6);
        assert_eq!(g.rest, 1);
        assert_eq!(g.col_cols, 3);
        assert_eq!(g.total_cols, 7);

        let first = &layout.placements()[0];
        assert_eq!(first.header, Pos::new(0, 0));
        assert_eq!(first.rows, (1..=5).map(|y| Pos::new(0, y)).collect::<Vec<_>>());
        assert_eq!(first.separator, Some(Pos::new(4, 0)));
        assert_eq!(first.slack, Some(Pos::new(4, 1)));
        assert_eq!(first.slots().count(), 8);

        let second = &layout.placements()[1];
        assert_eq!(second.header, Pos::new(4, 2));
        assert_eq!(second.rows, (3..=5).map(|y| Pos::new(4, y)).collect::<Vec<_>>());
        assert_eq!(second.separator, None);
        assert_eq!(second.slack, None);
    }

    #[test]
    fn total_rows_and_column_group_fill() {
        let cases: &[(&[usize], usize)] = &[
            (&[5, 3], 2),
            (&[1], 1),
            (&[7], 3),
            (&[0, 4, 9], 2),
            (&[12, 1, 1, 6, 30], 2),
            (&[3, 3, 3, 3], 3),
            (&[40, 2], 4),
            (&[2, 2], 5),
        ];

        for &(sizes, columns) in cases {
            let data = lists(sizes);
            let layout = TableLayout::plan(&data, columns, 0).unwrap();
            let g = *layout.geometry();
            let records: usize = sizes.iter().sum();
            let needed = 2 * sizes.len() - 1 + records;
            assert_eq!(g.total_rows, needed.div_ceil(columns), "{:?}", sizes);
            assert!(g.total_rows * columns >= needed);

            let mut per_group: HashMap<usize, usize> = HashMap::new();
            for pos in layout.placements().iter().flat_map(GroupPlacement::slots) {
                assert!(pos.y < g.total_rows, "{:?} {:?}", sizes, pos);
                *per_group.entry(g.column_group(pos.x)).or_default() += 1;
            }
            let used = per_group.len();
            for t in 0..used {
                let count = per_group.get(&t).copied().unwrap_or(0);
                if g.rest <= sizes.len() || t + 1 < used {
                    assert_eq!(count, g.total_rows, "{:?} column-group {}", sizes, t);
                }
            }
        }
    }

    #[test]
    fn record_rows_are_contiguous_and_ordered() {
        let data = lists(&[12, 1, 6, 30]);
        let layout = TableLayout::plan(&data, 3, 1).unwrap();
        let g = layout.geometry();

        for placement in layout.placements() {
            let mut slots = placement.slots();
            let mut prev = slots.next().unwrap();
            for pos in slots {
                if pos.x == prev.x {
                    assert_eq!(pos.y, prev.y + 1);
                } else {
                    assert_eq!(pos.x, prev.x + g.col_cols + 1);
                    assert_eq!(prev.y, g.title_rows + g.total_rows - 1);
                    assert_eq!(pos.y, g.title_rows);
                }
                prev = pos;
            }
        }
    }

    #[test]
    fn slack_goes_to_first_lists() {
        // needed = 2*4 - 1 + 2 = 9, 4 column-groups of 3 rows, rest 3
        let data = lists(&[0, 1, 0, 1]);
        let layout = TableLayout::plan(&data, 4, 0).unwrap();
        assert_eq!(layout.geometry().rest, 3);
        let slacked: Vec<bool> = layout.placements().iter().map(|p| p.slack.is_some()).collect();
        assert_eq!(slacked, vec![true, true, true, false]);
    }

    #[test]
    fn title_rows_shift_everything_down() {
        let data = lists(&[2, 2]);
        let layout = TableLayout::plan(&data, 1, 1).unwrap();
        assert_eq!(layout.header_positions(), vec![Pos::new(0, 1), Pos::new(0, 5)]);
        assert_eq!(layout.placements()[1].rows.last(), Some(&Pos::new(0, 7)));
    }

    #[test]
    fn single_record_list() {
        let data = vec![list(1, 5)];
        let layout = TableLayout::plan(&data, 1, 0).unwrap();
        let g = layout.geometry();
        assert_eq!(g.col_cols, 5);
        assert_eq!(g.total_rows, 2);
        assert_eq!(layout.placements()[0].rows, vec![Pos::new(0, 1)]);
    }

    #[test]
    fn empty_lists_are_rejected() {
        let none: Vec<Vec<Row>> = Vec::new();
        assert!(matches!(TableLayout::plan(&none, 2, 0), Err(AppError::EmptyInput)));

        let empty = vec![Vec::new(), Vec::new()];
        assert!(matches!(TableLayout::plan(&empty, 2, 0), Err(AppError::EmptyInput)));
    }

    #[test]
    fn ragged_list_is_rejected() {
        let mut data = lists(&[2, 3]);
        data[1][2].pop();
        match TableLayout::plan(&data, 2, 0) {
            Err(AppError::InconsistentRowWidth {
                group,
                row,
                expected,
                found,
            }) => {
                assert_eq!((group, row, expected, found), (1, 2, 3, 2));
            }
            other => panic!("unexpected {:?}", other.map(|l| *l.geometry())),
        }
    }

    #[test]
    fn lists_of_different_width_use_the_widest() {
        let data = vec![list(2, 2), list(2, 4)];
        let layout = TableLayout::plan(&data, 2, 0).unwrap();
        assert_eq!(layout.geometry().col_cols, 4);
        assert_eq!(layout.geometry().total_cols, 9);
    }

    #[test]
    fn populate_writes_values_and_styles() {
        let data = vec![vec![
            vec![CellValue::from("4001"), CellValue::from("Apfel"), CellValue::Amount(2.5)],
            vec![
                CellValue::Integer(4_000_000_000_123),
                CellValue::from("Birne"),
                CellValue::Amount(3.0),
            ],
        ]];
        let layout = TableLayout::plan(&data, 1, 0).unwrap();
        let mut sheet = GridSheet::new("t");
        layout.populate(&mut sheet, RowStyle::AltGrey);

        assert_eq!(sheet.content(1, 1), Some(&CellContent::Text("Apfel".into())));
        assert_eq!(sheet.content(2, 1), Some(&CellContent::Currency(2.5)));
        assert_eq!(
            sheet.content(0, 2),
            Some(&CellContent::Text("4000000000123".into()))
        );
        assert_eq!(sheet.content(0, 0), None);
        assert_eq!(sheet.effective_style(1, 1).background, Some(GREY_BAND));
        assert_eq!(sheet.effective_style(1, 2).background, None);
    }
}
