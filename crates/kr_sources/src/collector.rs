use std::sync::Arc;

use futures::stream::{self, StreamExt};
use kr_core::config::DEFAULT_PAGE_SIZE;
use kr_core::{SerpRequest, SerpResultSet, SerpSource};
use tracing::{info, warn};

use crate::pacing::Pacer;

/// Looks up result pages for a batch of keywords.
///
/// Every request waits for the pacer first. A failed lookup is logged and the
/// keyword is recorded with no results, so one bad keyword never sinks the
/// batch. The returned set follows the order of `keywords` even when lookups
/// run concurrently.
pub struct SerpCollector {
    source: Arc<dyn SerpSource>,
    pacer: Arc<dyn Pacer>,
    concurrency: usize,
    page_size: usize,
}

impl SerpCollector {
    pub fn new(source: Arc<dyn SerpSource>, pacer: Arc<dyn Pacer>) -> Self {
        Self {
            source,
            pacer,
            concurrency: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub async fn collect(&self, keywords: &[String], location: &str, language: &str) -> SerpResultSet {
        let total = keywords.len();

        let lookups = stream::iter(keywords.iter().enumerate()).map(|(i, keyword)| async move {
            self.pacer.wait_turn().await;
            let request = SerpRequest {
                keyword: keyword.clone(),
                location: location.to_string(),
                language: language.to_string(),
            };

            let urls = match self.source.lookup(&request).await {
                Ok(mut urls) => {
                    urls.truncate(self.page_size);
                    info!("🔍 [{}/{}] {} ({} results)", i + 1, total, keyword, urls.len());
                    urls
                }
                Err(e) => {
                    warn!("⚠️ [{}/{}] SERP lookup failed for '{}', continuing without results: {}", i + 1, total, keyword, e);
                    Vec::new()
                }
            };
            (keyword.clone(), urls)
        });

        lookups
            .buffered(self.concurrency)
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect()
    }
}
