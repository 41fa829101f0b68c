use std::collections::HashSet;

use kr_core::{Error, KeywordCandidate, ResearchConfig, Result};

/// Volume/competition thresholds applied to raw keyword ideas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateFilter {
    pub min_volume: u64,
    pub max_competition: f64,
}

impl CandidateFilter {
    pub fn new(min_volume: u64, max_competition: f64) -> Self {
        Self { min_volume, max_competition }
    }

    pub fn from_config(config: &ResearchConfig) -> Self {
        Self::new(config.min_search_volume, config.max_competition)
    }

    pub fn accepts(&self, candidate: &KeywordCandidate) -> bool {
        candidate.search_volume >= self.min_volume && candidate.competition <= self.max_competition
    }

    /// Keeps accepted candidates in input order. An empty result is a
    /// configuration problem, reported as [`Error::NoCandidates`].
    pub fn apply<I>(&self, candidates: I) -> Result<Vec<KeywordCandidate>>
    where
        I: IntoIterator<Item = KeywordCandidate>,
    {
        let kept: Vec<_> = candidates.into_iter().filter(|c| self.accepts(c)).collect();
        if kept.is_empty() {
            return Err(Error::NoCandidates {
                min_volume: self.min_volume,
                max_competition: self.max_competition,
            });
        }
        Ok(kept)
    }
}

pub fn filter_candidates<I>(candidates: I, min_volume: u64, max_competition: f64) -> Result<Vec<KeywordCandidate>>
where
    I: IntoIterator<Item = KeywordCandidate>,
{
    CandidateFilter::new(min_volume, max_competition).apply(candidates)
}

/// Drops repeated keywords, keeping the first occurrence.
pub fn dedupe_candidates(candidates: Vec<KeywordCandidate>) -> Vec<KeywordCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.keyword.clone()))
        .collect()
}
