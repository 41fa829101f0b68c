use std::collections::{HashMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use kr_core::{
    Error, ExpansionRequest, KeywordCandidate, KeywordSource, RawCompetition, Result, SerpRequest, SerpSource,
};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureKeyword {
    pub keyword: String,
    #[serde(default)]
    pub search_volume: Option<u64>,
    #[serde(default)]
    pub competition: Option<RawCompetition>,
}

/// Canned keyword ideas and result pages, loaded from JSON:
///
/// ```json
/// {
///   "keywords": [{"keyword": "ai tools", "search_volume": 900, "competition": "LOW"}],
///   "serps": {"ai tools": ["https://a.com/", "https://b.com/"]},
///   "failing": ["flaky keyword"]
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureData {
    pub keywords: Vec<FixtureKeyword>,
    #[serde(default)]
    pub serps: HashMap<String, Vec<String>>,
    /// Keywords whose SERP lookup fails.
    #[serde(default)]
    pub failing: HashSet<String>,
}

/// Serves both keyword expansion and SERP lookups from [`FixtureData`].
#[derive(Debug, Clone)]
pub struct FixtureSource {
    data: FixtureData,
}

impl FixtureSource {
    pub fn new(data: FixtureData) -> Self {
        Self { data }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let data = serde_json::from_str(&raw)?;
        Ok(Self::new(data))
    }
}

#[async_trait]
impl KeywordSource for FixtureSource {
    fn name(&self) -> &str {
        "fixture"
    }

    async fn expand(&self, request: &ExpansionRequest) -> Result<Vec<KeywordCandidate>> {
        if self.data.keywords.is_empty() {
            return Err(Error::DataSource(format!(
                "fixture has no keywords for '{}'",
                request.seed_keyword
            )));
        }
        Ok(self
            .data
            .keywords
            .iter()
            .take(request.limit)
            .map(|k| {
                KeywordCandidate::new(
                    k.keyword.clone(),
                    k.search_volume.unwrap_or(0),
                    k.competition.as_ref().map(RawCompetition::score).unwrap_or(0.0),
                )
            })
            .collect())
    }
}

#[async_trait]
impl SerpSource for FixtureSource {
    fn name(&self) -> &str {
        "fixture"
    }

    async fn lookup(&self, request: &SerpRequest) -> Result<Vec<String>> {
        if self.data.failing.contains(&request.keyword) {
            return Err(Error::Lookup {
                keyword: request.keyword.clone(),
                reason: "marked as failing in fixture".to_string(),
            });
        }
        Ok(self.data.serps.get(&request.keyword).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FIXTURE: &str = r#"{
        "keywords": [
            {"keyword": "ai tools", "search_volume": 900, "competition": "LOW"},
            {"keyword": "ai software", "search_volume": 400, "competition": 0.2},
            {"keyword": "ai apps"}
        ],
        "serps": {"ai tools": ["https://a.com/", "https://b.com/"]},
        "failing": ["ai apps"]
    }"#;

    fn request(keyword: &str) -> SerpRequest {
        SerpRequest {
            keyword: keyword.to_string(),
            location: "India".to_string(),
            language: "en".to_string(),
        }
    }

    #[tokio::test]
    async fn test_fixture_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FIXTURE.as_bytes()).unwrap();
        let source = FixtureSource::from_file(file.path()).unwrap();

        let expansion = ExpansionRequest {
            seed_keyword: "ai".to_string(),
            location: "India".to_string(),
            language: "en".to_string(),
            limit: 2,
        };
        let candidates = source.expand(&expansion).await.unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0], KeywordCandidate::new("ai tools", 900, 0.1));

        assert_eq!(source.lookup(&request("ai tools")).await.unwrap().len(), 2);
        assert!(source.lookup(&request("ai software")).await.unwrap().is_empty());
        assert!(matches!(source.lookup(&request("ai apps")).await, Err(Error::Lookup { .. })));
    }

    #[tokio::test]
    async fn test_empty_fixture_is_data_source_error() {
        let source = FixtureSource::new(FixtureData::default());
        let expansion = ExpansionRequest {
            seed_keyword: "ai".to_string(),
            location: "India".to_string(),
            language: "en".to_string(),
            limit: 50,
        };
        assert!(matches!(source.expand(&expansion).await, Err(Error::DataSource(_))));
    }
}
