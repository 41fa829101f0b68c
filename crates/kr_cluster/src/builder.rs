use std::collections::HashSet;

use kr_core::{Cluster, ResearchConfig, SerpResultSet};
use tracing::debug;

use crate::overlap::OverlapScorer;

/// Groups keywords by SERP overlap in a single greedy pass.
///
/// Keywords are visited in the result set's insertion order. Each keyword not
/// yet assigned seeds a new cluster and absorbs every later unassigned keyword
/// whose overlap with the seed reaches the threshold. Membership is decided
/// against the seed only, so the grouping is not transitive: if `a~b` and
/// `b~c` but not `a~c`, seeding from `a` yields `{a, b}` and `{c}`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterBuilder {
    scorer: OverlapScorer,
    threshold: f64,
}

impl ClusterBuilder {
    pub fn new(threshold: f64) -> Self {
        Self {
            scorer: OverlapScorer::default(),
            threshold,
        }
    }

    pub fn from_config(config: &ResearchConfig) -> Self {
        Self::new(config.overlap_threshold).with_scorer(OverlapScorer::new(config.page_size))
    }

    pub fn with_scorer(mut self, scorer: OverlapScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn build(&self, serp: &SerpResultSet) -> Vec<Cluster> {
        let keywords: Vec<&str> = serp.keywords().collect();
        let url_sets: Vec<HashSet<&str>> = serp
            .iter()
            .map(|(_, urls)| urls.iter().map(String::as_str).collect())
            .collect();

        let mut visited = vec![false; keywords.len()];
        let mut clusters = Vec::new();

        for seed in 0..keywords.len() {
            if visited[seed] {
                continue;
            }
            visited[seed] = true;
            let mut cluster = Cluster::new(clusters.len() + 1, keywords[seed]);

            // Everything before `seed` is already assigned.
            for candidate in seed + 1..keywords.len() {
                if visited[candidate] {
                    continue;
                }
                let score = self.scorer.score_sets(&url_sets[seed], &url_sets[candidate]);
                if score >= self.threshold {
                    debug!("{} joins {} (overlap {:.2})", keywords[candidate], keywords[seed], score);
                    visited[candidate] = true;
                    cluster.push(keywords[candidate]);
                }
            }

            clusters.push(cluster);
        }

        clusters
    }
}

pub fn build_clusters(serp: &SerpResultSet, threshold: f64) -> Vec<Cluster> {
    ClusterBuilder::new(threshold).build(serp)
}
