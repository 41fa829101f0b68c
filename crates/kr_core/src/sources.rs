use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ResearchConfig;
use crate::types::KeywordCandidate;
use crate::Result;

/// Input to keyword expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpansionRequest {
    pub seed_keyword: String,
    pub location: String,
    pub language: String,
    pub limit: usize,
}

impl ExpansionRequest {
    pub fn from_config(seed_keyword: &str, config: &ResearchConfig) -> Self {
        Self {
            seed_keyword: seed_keyword.to_string(),
            location: config.location.clone(),
            language: config.language.clone(),
            limit: config.expansion_limit,
        }
    }
}

/// Input to a single SERP lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerpRequest {
    pub keyword: String,
    pub location: String,
    pub language: String,
}

#[async_trait]
pub trait KeywordSource: Send + Sync {
    /// Returns the name of the data provider
    fn name(&self) -> &str;

    /// Expands a seed into candidate keywords, in provider order
    async fn expand(&self, request: &ExpansionRequest) -> Result<Vec<KeywordCandidate>>;
}

#[async_trait]
pub trait SerpSource: Send + Sync {
    /// Returns the name of the data provider
    fn name(&self) -> &str;

    /// Returns the organic result URLs for one keyword, best ranked first
    async fn lookup(&self, request: &SerpRequest) -> Result<Vec<String>>;
}
