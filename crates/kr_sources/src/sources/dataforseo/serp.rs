use std::sync::Arc;

use async_trait::async_trait;
use kr_core::config::DEFAULT_PAGE_SIZE;
use kr_core::{Error, Result, SerpRequest, SerpSource};
use serde::{Deserialize, Serialize};

use super::{DataForSeoClient, LanguageField};
use crate::sources::utils;

const ENDPOINT: &str = "serp/google/organic/live/advanced";
const SEARCH_DOMAIN: &str = "google.com";

#[derive(Debug, Serialize)]
struct SerpTask<'a> {
    keyword: &'a str,
    location_name: &'a str,
    #[serde(flatten)]
    language: LanguageField<'a>,
    se_domain: &'a str,
    depth: usize,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SerpResult {
    #[serde(default)]
    items: Option<Vec<SerpItem>>,
}

#[derive(Debug, Deserialize)]
struct SerpItem {
    #[serde(default)]
    url: Option<String>,
}

/// Result URLs in rank order, at most `page_size` of them.
pub(crate) fn collect_urls(results: Vec<SerpResult>, page_size: usize) -> Vec<String> {
    results
        .into_iter()
        .next()
        .and_then(|result| result.items)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|item| item.url)
        .filter(|url| utils::is_result_url(url))
        .take(page_size)
        .collect()
}

/// Organic Google results from the SERP "live advanced" endpoint.
#[derive(Debug, Clone)]
pub struct DataForSeoSerpSource {
    client: Arc<DataForSeoClient>,
    page_size: usize,
}

impl DataForSeoSerpSource {
    pub fn new(client: Arc<DataForSeoClient>) -> Self {
        Self {
            client,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    async fn fetch(&self, request: &SerpRequest) -> Result<Vec<String>> {
        let tasks = [SerpTask {
            keyword: &request.keyword,
            location_name: &request.location,
            language: LanguageField::new(&request.language),
            se_domain: SEARCH_DOMAIN,
            depth: self.page_size,
        }];
        let task = self.client.post::<_, SerpResult>(ENDPOINT, &tasks).await?;
        Ok(collect_urls(task.result.unwrap_or_default(), self.page_size))
    }
}

#[async_trait]
impl SerpSource for DataForSeoSerpSource {
    fn name(&self) -> &str {
        "DataForSEO"
    }

    async fn lookup(&self, request: &SerpRequest) -> Result<Vec<String>> {
        self.fetch(request).await.map_err(|e| Error::Lookup {
            keyword: request.keyword.clone(),
            reason: e.to_string(),
        })
    }
}
