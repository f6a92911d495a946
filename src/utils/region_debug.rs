// src/utils/region_debug.rs
use crate::config::SegmentationConfig;
use crate::pdf::{region, Page, Rect};
use crate::schedule::classifier::PageClassifier;
use crate::utils::error::{AppError, DocumentReadError};
use std::path::Path;

/// Renders every region of a page with its bounds, for tuning header/footer/column settings.
pub fn describe_page(page: &dyn Page, page_index: usize, cfg: &SegmentationConfig) -> Result<String, DocumentReadError> {
    let header = region::header(page, cfg);
    let header_text = header.text()?;
    let classification = PageClassifier::new(cfg).classify(&header_text);

    let mut out = format!(
        "Page {} ({} x {}) | schedule page: {} | continuation: {}\n",
        page_index,
        page.width(),
        page.height(),
        classification.is_schedule_page,
        classification.is_continuation
    );

    push_section(&mut out, "HEADER", header.bounds(), &header_text);
    for (i, column) in region::body_columns(page, cfg).iter().enumerate() {
        push_section(&mut out, &format!("COLUMN {}", i), column.bounds(), &column.text()?);
    }
    let footer = region::footer(page, cfg);
    push_section(&mut out, "FOOTER", footer.bounds(), &footer.text()?);

    Ok(out)
}

fn push_section(out: &mut String, label: &str, bounds: Rect, text: &str) {
    out.push_str(&format!(
        "===== {} [x {:.1}..{:.1}, y {:.1}..{:.1}] =====\n",
        label, bounds.x0, bounds.x1, bounds.top, bounds.bottom
    ));
    if bounds.is_empty() {
        out.push_str("(empty region)\n");
    } else {
        out.push_str(text);
        out.push('\n');
    }
}

/// Saves a page description to a file with a generation timestamp.
pub fn save_region_dump(description: &str, filename: &Path) -> Result<(), AppError> {
    let stamped = format!("# Generated {}\n{}", chrono::Utc::now().to_rfc3339(), description);
    std::fs::write(filename, stamped)?;

    tracing::info!("Saved region dump to {}", filename.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::{TextPage, TextRun};

    #[test]
    fn test_describe_page_lists_all_regions() {
        let page = TextPage::new(
            400.0,
            600.0,
            vec![
                TextRun::new("Schedule of Investments (continued)", 0.0, 5.0, 12.0),
                TextRun::new("Sony Group", 0.0, 100.0, 9.0),
                TextRun::new("Toyota Motor", 210.0, 100.0, 9.0),
            ],
        );
        let cfg = SegmentationConfig {
            header_height: 30.0,
            column_count: 2,
            ..SegmentationConfig::default()
        };

        let text = describe_page(&page, 3, &cfg).unwrap();
        assert!(text.starts_with("Page 3 (400 x 600) | schedule page: true | continuation: true"));
        assert!(text.contains("===== COLUMN 0 [x 0.0..200.0, y 30.0..600.0] =====\nSony Group\n"));
        assert!(text.contains("===== COLUMN 1 [x 200.0..400.0, y 30.0..600.0] =====\n Toyota Motor\n"));
        assert!(text.contains("===== FOOTER [x 0.0..400.0, y 600.0..600.0] =====\n(empty region)\n"));
    }

    #[test]
    fn test_save_region_dump() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regions.txt");
        save_region_dump("Page 0\n", &path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("# Generated "));
        assert!(contents.ends_with("Page 0\n"));
    }
}
