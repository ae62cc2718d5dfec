//! Print zoom for a filled sheet.
//!
//! The sheet is scaled so that its width fits the printable width and its
//! height fits the printable height. Whichever dimension is tighter decides
//! the zoom. When width decides, the rows are stretched to use some of the
//! vertical slack, which makes the list easier to read.

use crate::sheet::Orientation;

// ============================================================================
// Constants
// ============================================================================

/// Print area of the single-page form: 195 mm x 282 mm.
pub const SINGLE_PAGE_WIDTH: u32 = 19500;
pub const SINGLE_PAGE_HEIGHT: u32 = 28200;

/// Print area of the multi-page form, oriented portrait.
pub const PAGE_SHORT_SIDE: u32 = 19800;
pub const PAGE_LONG_SIDE: u32 = 28400;

/// Vertical space taken by the running header.
pub const HEADER_RESERVATION: u32 = 900;

pub const SINGLE_PAGE_STRETCH_CAP: f64 = 1.5;
pub const MULTI_PAGE_STRETCH_CAP: f64 = 1.8;

// ============================================================================
// Fit
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fit {
    /// Zoom in whole percent, truncated.
    pub scale: u32,
    /// Factor applied to the row heights, if any.
    pub stretch: Option<f64>,
}

impl Fit {
    pub const NEUTRAL: Fit = Fit {
        scale: 100,
        stretch: None,
    };
}

/// Target page for [`PageFitter::fit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageFitter {
    pub orientation: Orientation,
    /// Number of pages the rows are split over.
    pub pages: usize,
    /// Reserve room for the running header.
    pub header: bool,
}

impl PageFitter {
    pub fn new(orientation: Orientation, pages: usize, header: bool) -> Self {
        PageFitter {
            orientation,
            pages: pages.max(1),
            header,
        }
    }

    /// Landscape output or more than one page need the multi-page form.
    pub fn uses_multi_page_form(&self) -> bool {
        self.orientation == Orientation::Landscape || self.pages > 1
    }

    /// `row_heights` holds every sheet row, the first `title_rows` being the
    /// repeated title rows. Stretched heights are written back in place.
    pub fn fit(&self, column_widths: &[u32], row_heights: &mut [u32], title_rows: usize) -> Fit {
        if self.uses_multi_page_form() {
            fit_pages(
                column_widths,
                row_heights,
                title_rows,
                self.orientation,
                self.pages,
                self.header,
            )
        } else {
            fit_single_page(column_widths, row_heights)
        }
    }
}

/// Fit everything onto one portrait page.
pub fn fit_single_page(column_widths: &[u32], row_heights: &mut [u32]) -> Fit {
    let width = total(column_widths);
    let height = total(row_heights);
    if width == 0 || height == 0 {
        log::warn!("zero sheet extent ({} x {}), using 100%", width, height);
        return Fit::NEUTRAL;
    }

    let fit = choose(
        SINGLE_PAGE_WIDTH as f64 / width as f64,
        SINGLE_PAGE_HEIGHT as f64 / height as f64,
        SINGLE_PAGE_STRETCH_CAP,
    );
    if let Some(stretch) = fit.stretch {
        stretch_rows(row_heights, stretch);
    }
    log::debug!("single page fit: {} x {} -> {:?}", width, height, fit);
    fit
}

/// Fit the rows split over `pages` pages. Only one page worth of rows plus
/// the title rows is budgeted against the page height.
pub fn fit_pages(
    column_widths: &[u32],
    row_heights: &mut [u32],
    title_rows: usize,
    orientation: Orientation,
    pages: usize,
    header: bool,
) -> Fit {
    let title_rows = title_rows.min(row_heights.len());
    let data_rows = row_heights.len() - title_rows;
    let per_page = data_rows.div_ceil(pages.max(1));

    let width = total(column_widths);
    let height = total(&row_heights[..title_rows])
        + total(&row_heights[title_rows..title_rows + per_page]);
    if width == 0 || height == 0 {
        log::warn!("zero page extent ({} x {}), using 100%", width, height);
        return Fit::NEUTRAL;
    }

    let (to_width, mut to_height) = match orientation {
        Orientation::Landscape => (PAGE_LONG_SIDE, PAGE_SHORT_SIDE),
        Orientation::Portrait => (PAGE_SHORT_SIDE, PAGE_LONG_SIDE),
    };
    if header {
        to_height -= HEADER_RESERVATION;
    }

    let fit = choose(
        to_width as f64 / width as f64,
        to_height as f64 / height as f64,
        MULTI_PAGE_STRETCH_CAP,
    );
    if let Some(stretch) = fit.stretch {
        stretch_rows(&mut row_heights[title_rows..], stretch);
    }
    log::debug!(
        "{} page fit ({:?}): {} x {} -> {:?}",
        pages,
        orientation,
        width,
        height,
        fit
    );
    fit
}

fn choose(width_scale: f64, height_scale: f64, cap: f64) -> Fit {
    if height_scale < width_scale {
        return Fit {
            scale: percent(height_scale),
            stretch: None,
        };
    }

    let stretch = (height_scale / width_scale).min(cap);
    Fit {
        scale: percent(width_scale),
        stretch: (stretch > 1.0).then_some(stretch),
    }
}

fn percent(factor: f64) -> u32 {
    (factor * 100.0).floor() as u32
}

fn total(lengths: &[u32]) -> u64 {
    lengths.iter().map(|&l| l as u64).sum()
}

fn stretch_rows(row_heights: &mut [u32], stretch: f64) {
    for h in row_heights.iter_mut() {
        *h = (*h as f64 * stretch) as u32;
    }
}
