// src/extraction/mod.rs
pub mod client;
pub mod prompt;

use crate::schedule::models::{FundRecord, RelevantPage};
use crate::utils::error::ServiceError;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub const DEFAULT_CONCURRENCY: usize = 4;

/// Turns the text of one schedule page into a structured record.
#[async_trait::async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, page_text: &str) -> Result<FundRecord, ServiceError>;
}

/// Runs `extractor` over every page with at most `concurrency` requests in flight.
///
/// Results come back in page order regardless of completion order. The first
/// failure aborts the remaining requests and is returned.
pub async fn dispatch(
    pages: &[RelevantPage],
    extractor: Arc<dyn Extractor>,
    concurrency: usize,
) -> Result<Vec<FundRecord>, ServiceError> {
    let limiter = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for (index, page) in pages.iter().enumerate() {
        let extractor = Arc::clone(&extractor);
        let limiter = Arc::clone(&limiter);
        let text = page.text.clone();
        let page_number = page.page_number;
        tasks.spawn(async move {
            let _permit = limiter
                .acquire_owned()
                .await
                .map_err(|e| ServiceError::TaskFailed(e.to_string()))?;
            tracing::debug!("Requesting extraction for page {}", page_number);
            let record = extractor.extract(&text).await?;
            Ok::<_, ServiceError>((index, record))
        });
    }

    let mut results: Vec<Option<FundRecord>> = vec![None; pages.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok((index, record))) => {
                tracing::debug!(
                    "Page {} extracted: {} holdings",
                    pages[index].page_number,
                    record.holdings.len()
                );
                results[index] = Some(record);
            }
            Ok(Err(e)) => {
                tracing::error!("Extraction failed, cancelling {} pending requests: {}", tasks.len(), e);
                tasks.abort_all();
                return Err(e);
            }
            Err(e) => {
                tasks.abort_all();
                return Err(ServiceError::TaskFailed(e.to_string()));
            }
        }
    }

    results
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            record.ok_or_else(|| {
                ServiceError::TaskFailed(format!("no result for page {}", pages[index].page_number))
            })
        })
        .collect()
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Serves records keyed by exact page text.
    #[derive(Default)]
    pub struct CannedExtractor {
        records: HashMap<String, FundRecord>,
        failures: HashMap<String, String>,
        delays: HashMap<String, Duration>,
        pub calls: AtomicUsize,
        pub completed: AtomicUsize,
    }

    impl CannedExtractor {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_record(mut self, text: &str, record: FundRecord) -> Self {
            self.records.insert(text.to_string(), record);
            self
        }

        pub fn with_failure(mut self, text: &str, message: &str) -> Self {
            self.failures.insert(text.to_string(), message.to_string());
            self
        }

        pub fn with_delay(mut self, text: &str, delay: Duration) -> Self {
            self.delays.insert(text.to_string(), delay);
            self
        }
    }

    #[async_trait::async_trait]
    impl Extractor for CannedExtractor {
        async fn extract(&self, page_text: &str) -> Result<FundRecord, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delays.get(page_text) {
                tokio::time::sleep(*delay).await;
            }
            if let Some(message) = self.failures.get(page_text) {
                return Err(ServiceError::MalformedResponse(message.clone()));
            }
            let record = self
                .records
                .get(page_text)
                .cloned()
                .ok_or_else(|| ServiceError::MalformedResponse(format!("no canned record for '{}'", page_text)))?;
            self.completed.fetch_add(1, Ordering::SeqCst);
            Ok(record)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::CannedExtractor;
    use super::*;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn page(number: usize, text: &str) -> RelevantPage {
        RelevantPage {
            page_number: number,
            text: text.to_string(),
            is_continuation: false,
        }
    }

    fn named(name: &str) -> FundRecord {
        FundRecord {
            fund_name: Some(name.to_string()),
            ..FundRecord::default()
        }
    }

    #[tokio::test]
    async fn test_results_follow_page_order_not_completion_order() {
        let extractor = CannedExtractor::new()
            .with_record("first", named("First"))
            .with_record("second", named("Second"))
            .with_record("third", named("Third"))
            .with_delay("first", Duration::from_millis(60))
            .with_delay("second", Duration::from_millis(30));
        let pages = vec![page(1, "first"), page(2, "second"), page(3, "third")];

        let records = dispatch(&pages, Arc::new(extractor), 3).await.unwrap();
        let names: Vec<_> = records.iter().map(|r| r.fund_name.as_deref().unwrap()).collect();
        assert_eq!(names, vec!["First", "Second", "Third"]);
    }

    #[tokio::test]
    async fn test_failure_is_propagated_and_cancels_the_rest() {
        let extractor = Arc::new(
            CannedExtractor::new()
                .with_failure("bad", "not json")
                .with_record("slow", named("Slow"))
                .with_delay("slow", Duration::from_secs(5)),
        );
        let pages = vec![page(1, "slow"), page(2, "bad")];

        let err = dispatch(&pages, extractor.clone(), 2).await.unwrap_err();
        assert!(matches!(err, ServiceError::MalformedResponse(_)));
        assert_eq!(extractor.completed.load(Ordering::SeqCst), 0, "slow request was aborted");
    }

    #[tokio::test]
    async fn test_concurrency_of_one_still_completes() {
        let extractor = Arc::new(
            CannedExtractor::new()
                .with_record("a", named("A"))
                .with_record("b", named("B")),
        );
        let pages = vec![page(1, "a"), page(2, "b")];

        let records = dispatch(&pages, extractor.clone(), 0).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_empty_input() {
        let extractor = Arc::new(CannedExtractor::new());
        let records = tokio_test::block_on(dispatch(&[], extractor, DEFAULT_CONCURRENCY)).unwrap();
        assert!(records.is_empty());
    }
}
