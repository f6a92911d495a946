// src/schedule/segmenter.rs
use crate::config::SegmentationConfig;
use crate::pdf::{region, Page};
use crate::schedule::classifier::PageClassifier;
use crate::schedule::models::RelevantPage;
use crate::utils::error::DocumentReadError;

/// Picks the schedule pages out of a document, in page order.
///
/// Each relevant page's text is its header, then every body column left to
/// right, then the footer (only when a footer is configured), each
/// newline-terminated. Any extraction failure aborts the whole document.
pub fn segment<P: Page>(
    pages: &[P],
    cfg: &SegmentationConfig,
) -> Result<Vec<RelevantPage>, DocumentReadError> {
    let classifier = PageClassifier::new(cfg);
    let mut relevant = Vec::new();

    for (index, page) in pages.iter().enumerate() {
        let page_number = index + 1;
        check_geometry(page, cfg, page_number)?;

        let header_text = region::header(page, cfg).text()?;
        let classification = classifier.classify(&header_text);
        if !classification.is_schedule_page {
            tracing::debug!("Page {} is not a schedule page, skipping", page_number);
            continue;
        }

        let mut text = String::with_capacity(header_text.len() + 1);
        text.push_str(&header_text);
        text.push('\n');
        for column in region::body_columns(page, cfg) {
            text.push_str(&column.text()?);
            text.push('\n');
        }
        if cfg.footer_height > 0.0 {
            text.push_str(&region::footer(page, cfg).text()?);
            text.push('\n');
        }

        tracing::debug!(
            "Page {} is a schedule page (continuation: {}), {} chars",
            page_number,
            classification.is_continuation,
            text.len()
        );
        relevant.push(RelevantPage {
            page_number,
            text,
            is_continuation: classification.is_continuation,
        });
    }

    tracing::info!("Found {} schedule pages out of {}", relevant.len(), pages.len());
    Ok(relevant)
}

fn check_geometry<P: Page>(
    page: &P,
    cfg: &SegmentationConfig,
    page_number: usize,
) -> Result<(), DocumentReadError> {
    let height = page.height();
    if cfg.header_height + cfg.footer_height > height {
        tracing::error!("Header/footer settings do not fit page {}", page_number);
        return Err(DocumentReadError::Geometry {
            page: page_number,
            header: cfg.header_height,
            footer: cfg.footer_height,
            height,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::{Rect, TextPage, TextRun};

    fn cfg(header: f64, footer: f64, columns: usize) -> SegmentationConfig {
        SegmentationConfig {
            header_height: header,
            footer_height: footer,
            column_count: columns,
            ..SegmentationConfig::default()
        }
    }

    fn page(header: &str, left: &str, right: &str) -> TextPage {
        TextPage::new(
            400.0,
            600.0,
            vec![
                TextRun::new(header, 0.0, 10.0, 12.0),
                TextRun::new(left, 0.0, 100.0, 9.0),
                TextRun::new(right, 200.0, 100.0, 9.0),
                TextRun::new("12", 0.0, 590.0, 8.0),
            ],
        )
    }

    fn report() -> Vec<TextPage> {
        vec![
            page("Letter to Shareholders", "Dear", "investor"),
            page("Schedule of Investments", "Apple Inc.", "Toyota"),
            page("Schedule of Investments (continued)", "Nestle", "Sony"),
            page("Statement of Operations", "Income", "Expenses"),
            page("SCHEDULE OF INVESTMENTS", "Bond A", "Bond B"),
        ]
    }

    #[test]
    fn test_filters_and_flags_in_page_order() {
        let pages = report();
        let relevant = segment(&pages, &cfg(40.0, 20.0, 2)).unwrap();

        let summary: Vec<(usize, bool)> = relevant
            .iter()
            .map(|p| (p.page_number, p.is_continuation))
            .collect();
        assert_eq!(summary, vec![(2, false), (3, true), (5, false)]);
        assert!(relevant.len() <= pages.len());
    }

    #[test]
    fn test_text_assembly_order() {
        let pages = report();
        let relevant = segment(&pages, &cfg(40.0, 20.0, 2)).unwrap();
        assert_eq!(relevant[0].text, "Schedule of Investments\nApple Inc.\nToyota\n12\n");
    }

    #[test]
    fn test_footer_omitted_without_footer_height() {
        let pages = report();
        let config = cfg(40.0, 0.0, 1);
        let relevant = segment(&pages, &config).unwrap();

        // Single column: the page number now sits in the body band.
        let body = region::body_columns(&pages[1], &config)[0].text().unwrap();
        assert!(body.ends_with("12"));
        assert_eq!(relevant[0].text, format!("Schedule of Investments\n{}\n", body));
    }

    #[test]
    fn test_no_header_means_no_schedule_pages() {
        let pages = report();
        let relevant = segment(&pages, &cfg(0.0, 0.0, 1)).unwrap();
        assert!(relevant.is_empty());
    }

    #[test]
    fn test_oversized_margins_fail() {
        let pages = report();
        let err = segment(&pages, &cfg(400.0, 300.0, 1)).unwrap_err();
        assert!(matches!(err, DocumentReadError::Geometry { page: 1, .. }));
    }

    struct BrokenPage;

    impl Page for BrokenPage {
        fn width(&self) -> f64 {
            100.0
        }
        fn height(&self) -> f64 {
            100.0
        }
        fn text_in(&self, _rect: &Rect) -> Result<String, DocumentReadError> {
            Err(DocumentReadError::Page { page: 1, message: "bad content stream".to_string() })
        }
    }

    #[test]
    fn test_extraction_failure_aborts() {
        let err = segment(&[BrokenPage], &cfg(10.0, 0.0, 1)).unwrap_err();
        assert!(matches!(err, DocumentReadError::Page { .. }));
    }
}
