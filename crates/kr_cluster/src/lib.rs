//! Candidate filtering, SERP-overlap clustering and per-cluster aggregation.

pub mod aggregate;
pub mod builder;
pub mod filter;
pub mod overlap;

pub use aggregate::{aggregate, aggregate_all, index_candidates, round_to};
pub use builder::{build_clusters, ClusterBuilder};
pub use filter::{dedupe_candidates, filter_candidates, CandidateFilter};
pub use overlap::{overlap, OverlapScorer};

pub mod prelude {
    pub use super::{aggregate_all, CandidateFilter, ClusterBuilder, OverlapScorer};
    pub use kr_core::{Cluster, ClusterSummary, Error, KeywordCandidate, KeywordRecord, Result};
}
