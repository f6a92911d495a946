// src/schedule/assembler.rs
use crate::extraction::{self, Extractor};
use crate::schedule::models::{FundRecord, RelevantPage};
use crate::utils::error::{DanglingContinuation, ServiceError};
use std::sync::Arc;

/// Result of assembling one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assembly {
    pub funds: Vec<FundRecord>,
    pub dangling: Vec<DanglingContinuation>,
}

/// Folds per-page records into one record per primary schedule page.
///
/// Continuation pages only contribute holdings, appended in page order;
/// the primary page's fund name and report date always stand.
pub fn fold<I>(pages: I) -> Assembly
where
    I: IntoIterator<Item = (RelevantPage, FundRecord)>,
{
    pages
        .into_iter()
        .fold(Assembly::default(), |mut assembly, (page, record)| {
            if !page.is_continuation {
                assembly.funds.push(record);
                return assembly;
            }
            match assembly.funds.last_mut() {
                Some(parent) => {
                    tracing::debug!(
                        "Folding {} holdings from page {} into '{}'",
                        record.holdings.len(),
                        page.page_number,
                        parent.fund_name.as_deref().unwrap_or("<unnamed fund>")
                    );
                    parent.holdings.extend(record.holdings);
                }
                None => {
                    let dangling = DanglingContinuation {
                        page_number: page.page_number,
                    };
                    tracing::warn!("{}; dropping its {} holdings", dangling, record.holdings.len());
                    assembly.dangling.push(dangling);
                }
            }
            assembly
        })
}

/// Extracts every relevant page (concurrently) and folds the results in page order.
pub async fn assemble(
    pages: Vec<RelevantPage>,
    extractor: Arc<dyn Extractor>,
    concurrency: usize,
) -> Result<Assembly, ServiceError> {
    tracing::info!(
        "Extracting {} schedule pages with up to {} concurrent requests",
        pages.len(),
        concurrency.max(1)
    );
    let records = extraction::dispatch(&pages, extractor, concurrency).await?;
    let assembly = fold(pages.into_iter().zip(records));
    tracing::info!(
        "Assembled {} funds ({} dangling continuation pages)",
        assembly.funds.len(),
        assembly.dangling.len()
    );
    Ok(assembly)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::testing::CannedExtractor;
    use crate::schedule::models::Holding;

    fn page(number: usize, text: &str, is_continuation: bool) -> RelevantPage {
        RelevantPage {
            page_number: number,
            text: text.to_string(),
            is_continuation,
        }
    }

    fn holding(name: &str) -> Holding {
        Holding {
            security_name: Some(name.to_string()),
            ..Holding::default()
        }
    }

    fn record(fund: Option<&str>, date: Option<&str>, holdings: &[&str]) -> FundRecord {
        FundRecord {
            fund_name: fund.map(str::to_string),
            report_date: date.map(str::to_string),
            holdings: holdings.iter().map(|h| holding(h)).collect(),
        }
    }

    fn names(record: &FundRecord) -> Vec<&str> {
        record
            .holdings
            .iter()
            .map(|h| h.security_name.as_deref().unwrap())
            .collect()
    }

    #[test]
    fn test_merge_ordering() {
        let extractor = CannedExtractor::new()
            .with_record("A", record(Some("Fund A"), Some("2023-04-30"), &["a1", "a2"]))
            .with_record("B", record(Some("Fund A (cont.)"), Some("2099-01-01"), &["b1"]))
            .with_record("C", record(None, None, &["c1", "c2"]))
            .with_record("D", record(Some("Fund D"), Some("2023-04-30"), &["d1"]));
        let pages = vec![
            page(4, "A", false),
            page(5, "B", true),
            page(6, "C", true),
            page(9, "D", false),
        ];

        let assembly = tokio_test::block_on(assemble(pages, Arc::new(extractor), 2)).unwrap();

        assert_eq!(assembly.funds.len(), 2);
        assert!(assembly.dangling.is_empty());
        let first = &assembly.funds[0];
        assert_eq!(first.fund_name.as_deref(), Some("Fund A"), "primary page identity wins");
        assert_eq!(first.report_date.as_deref(), Some("2023-04-30"));
        assert_eq!(names(first), vec!["a1", "a2", "b1", "c1", "c2"]);
        assert_eq!(assembly.funds[1], record(Some("Fund D"), Some("2023-04-30"), &["d1"]));
    }

    #[test]
    fn test_dangling_continuation_is_reported() {
        let assembly = fold(vec![(page(2, "B", true), record(Some("B"), None, &["b1"]))]);
        assert!(assembly.funds.is_empty());
        assert_eq!(assembly.dangling, vec![DanglingContinuation { page_number: 2 }]);
    }

    #[test]
    fn test_dangling_then_primary() {
        let assembly = fold(vec![
            (page(1, "X", true), record(None, None, &["x1"])),
            (page(2, "Y", false), record(Some("Fund Y"), None, &["y1"])),
            (page(3, "Z", true), record(None, None, &["z1"])),
        ]);
        assert_eq!(assembly.funds.len(), 1);
        assert_eq!(names(&assembly.funds[0]), vec!["y1", "z1"]);
        assert_eq!(assembly.dangling.len(), 1);
    }

    #[test]
    fn test_primary_pages_stay_separate() {
        let assembly = fold(vec![
            (page(1, "A", false), record(Some("Same Fund"), None, &["a1"])),
            (page(2, "B", false), record(Some("Same Fund"), None, &["b1"])),
        ]);
        assert_eq!(assembly.funds.len(), 2, "only the continuation flag merges pages");
    }

    #[test]
    fn test_service_error_aborts_document() {
        let extractor = CannedExtractor::new()
            .with_record("A", record(Some("Fund A"), None, &["a1"]))
            .with_failure("B", "truncated JSON");
        let pages = vec![page(1, "A", false), page(2, "B", true)];

        let result = tokio_test::block_on(assemble(pages, Arc::new(extractor), 1));
        assert!(matches!(result, Err(ServiceError::MalformedResponse(_))));
    }

    #[test]
    fn test_no_pages() {
        let extractor = Arc::new(CannedExtractor::new());
        let assembly = tokio_test::block_on(assemble(Vec::new(), extractor, 4)).unwrap();
        assert_eq!(assembly, Assembly::default());
    }
}
