use std::sync::Arc;

use async_trait::async_trait;
use kr_core::{Error, ExpansionRequest, KeywordCandidate, KeywordSource, RawCompetition, Result};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{DataForSeoClient, LanguageField};

const ENDPOINT: &str = "keywords_data/google_ads/keywords_for_keywords/live";

#[derive(Debug, Serialize)]
struct KeywordsTask<'a> {
    keywords: Vec<&'a str>,
    location_name: &'a str,
    #[serde(flatten)]
    language: LanguageField<'a>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct KeywordItem {
    keyword: String,
    #[serde(default)]
    search_volume: Option<u64>,
    #[serde(default)]
    competition: Option<RawCompetition>,
}

impl KeywordItem {
    fn into_candidate(self) -> KeywordCandidate {
        KeywordCandidate::new(
            self.keyword,
            self.search_volume.unwrap_or(0),
            self.competition.map(|c| c.score()).unwrap_or(0.0),
        )
    }
}

/// Result entries are either keyword items or batches wrapping them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum KeywordResultEntry {
    Batch { items: Vec<BatchItem> },
    Item(KeywordItem),
    Other(IgnoredAny),
}

/// One batch member. A malformed member only loses itself, not its batch.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum BatchItem {
    Item(KeywordItem),
    Other(IgnoredAny),
}

/// Flattens result entries into candidates, keeping provider order.
pub(crate) fn collect_candidates(entries: Vec<KeywordResultEntry>, limit: usize) -> Vec<KeywordCandidate> {
    let mut candidates = Vec::new();
    let mut skipped = 0;
    for entry in entries {
        match entry {
            KeywordResultEntry::Batch { items } => {
                for item in items {
                    match item {
                        BatchItem::Item(item) => candidates.push(item.into_candidate()),
                        BatchItem::Other(_) => skipped += 1,
                    }
                }
            }
            KeywordResultEntry::Item(item) => candidates.push(item.into_candidate()),
            KeywordResultEntry::Other(_) => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!("Skipped {} keyword result entries without a usable keyword", skipped);
    }
    candidates.retain(|c| !c.keyword.trim().is_empty());
    candidates.truncate(limit);
    candidates
}

/// Keyword ideas from the Google Ads "keywords for keywords" endpoint.
#[derive(Debug, Clone)]
pub struct DataForSeoKeywordSource {
    client: Arc<DataForSeoClient>,
}

impl DataForSeoKeywordSource {
    pub fn new(client: Arc<DataForSeoClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl KeywordSource for DataForSeoKeywordSource {
    fn name(&self) -> &str {
        "DataForSEO"
    }

    async fn expand(&self, request: &ExpansionRequest) -> Result<Vec<KeywordCandidate>> {
        let tasks = [KeywordsTask {
            keywords: vec![request.seed_keyword.as_str()],
            location_name: &request.location,
            language: LanguageField::new(&request.language),
        }];

        let task = self.client.post::<_, KeywordResultEntry>(ENDPOINT, &tasks).await?;
        let entries = task.result.ok_or_else(|| {
            Error::DataSource(format!("no keyword data returned for '{}'", request.seed_keyword))
        })?;

        let candidates = collect_candidates(entries, request.limit);
        if candidates.is_empty() {
            return Err(Error::DataSource(format!(
                "no keyword ideas returned for '{}'",
                request.seed_keyword
            )));
        }
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::dataforseo::ApiResponse;

    const RESPONSE: &str = r#"{
        "status_code": 20000,
        "status_message": "Ok.",
        "tasks": [{
            "status_code": 20000,
            "status_message": "Ok.",
            "result": [
                {"keyword": "ai marketing tools", "search_volume": 2400, "competition": "LOW", "competition_index": 12},
                {"keyword": "ai marketing agency", "search_volume": null, "competition": "HIGH"},
                {"keyword": "ai for marketing", "search_volume": 880, "competition": 0.42},
                {"keyword": "marketing ai course", "search_volume": 90}
            ]
        }]
    }"#;

    #[test]
    fn test_parse_flat_items() {
        let response: ApiResponse<KeywordResultEntry> = serde_json::from_str(RESPONSE).unwrap();
        let entries = response.into_first_task().unwrap().result.unwrap();
        let candidates = collect_candidates(entries, 50);

        assert_eq!(candidates.len(), 4);
        assert_eq!(candidates[0], KeywordCandidate::new("ai marketing tools", 2400, 0.1));
        assert_eq!(candidates[1], KeywordCandidate::new("ai marketing agency", 0, 0.9));
        assert_eq!(candidates[2], KeywordCandidate::new("ai for marketing", 880, 0.42));
        assert_eq!(candidates[3], KeywordCandidate::new("marketing ai course", 90, 0.0));
    }

    #[test]
    fn test_parse_batched_items_and_limit() {
        let entries: Vec<KeywordResultEntry> = serde_json::from_str(
            r#"[
                {"seed": "ai", "items": [
                    {"keyword": "a", "search_volume": 1, "competition": "medium"},
                    {"keyword": "b", "search_volume": 2, "competition": "low"}
                ]},
                {"items": [{"keyword": "c", "search_volume": 3}]},
                {"items": null},
                42
            ]"#,
        )
        .unwrap();

        let candidates = collect_candidates(entries, 2);
        let names: Vec<_> = candidates.iter().map(|c| c.keyword.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(candidates[0].competition, 0.5);
    }

    #[test]
    fn test_malformed_item_keeps_rest_of_batch() {
        let entries: Vec<KeywordResultEntry> = serde_json::from_str(
            r#"[
                {"items": [
                    {"keyword": "a", "search_volume": 10},
                    {"keyword": 42, "search_volume": 5},
                    {"search_volume": 7},
                    {"keyword": "b", "search_volume": "lots"},
                    {"keyword": "c", "competition": "LOW"}
                ]}
            ]"#,
        )
        .unwrap();

        let candidates = collect_candidates(entries, 10);
        let names: Vec<_> = candidates.iter().map(|c| c.keyword.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(candidates[1].competition, 0.1);
    }

    #[test]
    fn test_blank_keywords_are_dropped() {
        let entries: Vec<KeywordResultEntry> =
            serde_json::from_str(r#"[{"keyword": "  ", "search_volume": 10}, {"keyword": "x"}]"#).unwrap();
        assert_eq!(collect_candidates(entries, 10).len(), 1);
    }

    #[test]
    fn test_task_payload_shape() {
        let tasks = [KeywordsTask {
            keywords: vec!["ai marketing"],
            location_name: "India",
            language: LanguageField::new("en"),
        }];
        assert_eq!(
            serde_json::to_value(&tasks).unwrap(),
            serde_json::json!([{"keywords": ["ai marketing"], "location_name": "India", "language_code": "en"}])
        );
    }
}
