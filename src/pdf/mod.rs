// src/pdf/mod.rs
pub mod loader;
pub mod region;

use crate::utils::error::DocumentReadError;

/// Horizontal units per rendered character column.
const X_DENSITY: f64 = 7.25;
/// Vertical units per rendered text line.
const Y_DENSITY: f64 = 13.0;
/// Runs whose tops differ by less than this share a line.
const LINE_TOLERANCE: f64 = 3.0;

/// Axis-aligned rectangle, top-left origin, y grows downward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn new(x0: f64, top: f64, x1: f64, bottom: f64) -> Self {
        Self { x0, top, x1, bottom }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Half-open containment, so adjacent rects never both claim a point.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.top && y < self.bottom
    }
}

/// A single page of a source document.
pub trait Page {
    fn width(&self) -> f64;
    fn height(&self) -> f64;

    /// Layout-preserving text of everything anchored inside `rect`.
    fn text_in(&self, rect: &Rect) -> Result<String, DocumentReadError>;
}

/// A run of text positioned by its top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f64,
    pub top: f64,
    pub font_size: f64,
}

impl TextRun {
    pub fn new(text: impl Into<String>, x: f64, top: f64, font_size: f64) -> Self {
        Self {
            text: text.into(),
            x,
            top,
            font_size,
        }
    }
}

/// In-memory page made of positioned text runs.
#[derive(Debug, Clone, Default)]
pub struct TextPage {
    width: f64,
    height: f64,
    runs: Vec<TextRun>,
}

impl TextPage {
    pub fn new(width: f64, height: f64, runs: Vec<TextRun>) -> Self {
        Self { width, height, runs }
    }

    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    /// Renders the runs inside `rect` onto a character grid.
    fn render(&self, rect: &Rect) -> String {
        let mut runs: Vec<&TextRun> = self
            .runs
            .iter()
            .filter(|run| rect.contains(run.x, run.top))
            .collect();
        if runs.is_empty() {
            return String::new();
        }

        runs.sort_by(|a, b| {
            a.top
                .partial_cmp(&b.top)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
        });

        // Group into lines keyed by the top of the first run on the line.
        let mut lines: Vec<(f64, Vec<&TextRun>)> = Vec::new();
        for run in runs {
            let same_line = lines
                .last()
                .map_or(false, |(top, _)| (run.top - top).abs() < LINE_TOLERANCE);
            match lines.last_mut() {
                Some((_, members)) if same_line => members.push(run),
                _ => lines.push((run.top, vec![run])),
            }
        }

        let mut rendered: Vec<String> = Vec::with_capacity(lines.len());
        let mut previous_top: Option<f64> = None;
        for (top, mut members) in lines {
            if let Some(prev) = previous_top {
                let gap = ((top - prev) / Y_DENSITY).round() as usize;
                for _ in 1..gap {
                    rendered.push(String::new());
                }
            }
            previous_top = Some(top);

            members.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
            let mut line = String::new();
            let mut width = 0usize;
            for run in members {
                let column = ((run.x - rect.x0) / X_DENSITY).round().max(0.0) as usize;
                if width < column {
                    line.extend(std::iter::repeat(' ').take(column - width));
                    width = column;
                } else if width > 0 && !line.ends_with(' ') {
                    line.push(' ');
                    width += 1;
                }
                line.push_str(&run.text);
                width += run.text.chars().count();
            }
            rendered.push(line.trim_end().to_string());
        }

        rendered.join("\n")
    }
}

impl Page for TextPage {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn text_in(&self, rect: &Rect) -> Result<String, DocumentReadError> {
        Ok(self.render(rect))
    }
}
