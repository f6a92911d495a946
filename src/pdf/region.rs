// src/pdf/region.rs
//! Header / body-column / footer geometry for a page.
//!
//! The body band between header and footer is cut into `column_count`
//! equal-width strips, left to right. All regions are half-open, so
//! together they tile the page without overlap.

use crate::config::SegmentationConfig;
use crate::pdf::{Page, Rect};
use crate::utils::error::DocumentReadError;

/// A rectangular area of a page.
pub struct Region<'p> {
    page: &'p dyn Page,
    bounds: Rect,
}

impl<'p> Region<'p> {
    pub fn new(page: &'p dyn Page, bounds: Rect) -> Self {
        Self { page, bounds }
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Layout-preserving text; empty regions yield `""` without touching the page.
    pub fn text(&self) -> Result<String, DocumentReadError> {
        if self.bounds.is_empty() {
            return Ok(String::new());
        }
        self.page.text_in(&self.bounds)
    }
}

pub fn header<'p>(page: &'p dyn Page, cfg: &SegmentationConfig) -> Region<'p> {
    Region::new(page, Rect::new(0.0, 0.0, page.width(), cfg.header_height))
}

pub fn footer<'p>(page: &'p dyn Page, cfg: &SegmentationConfig) -> Region<'p> {
    let height = page.height();
    Region::new(
        page,
        Rect::new(0.0, height - cfg.footer_height, page.width(), height),
    )
}

pub fn body_columns<'p>(page: &'p dyn Page, cfg: &SegmentationConfig) -> Vec<Region<'p>> {
    let width = page.width();
    let top = cfg.header_height;
    let bottom = page.height() - cfg.footer_height;
    let count = cfg.column_count.max(1);
    let step = width / count as f64;

    (0..count)
        .map(|i| {
            let x0 = i as f64 * step;
            // Pin the last edge to the page width to avoid float drift.
            let x1 = if i + 1 == count { width } else { (i + 1) as f64 * step };
            Region::new(page, Rect::new(x0, top, x1, bottom))
        })
        .collect()
}
