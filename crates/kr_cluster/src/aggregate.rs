use std::collections::HashMap;

use kr_core::{
    Cluster, ClusterSummary, Error, KeywordCandidate, KeywordRecord, PostRole, ResearchOutcome, Result,
};
use tracing::{error, warn};

/// Rounds to `decimals` places the way the exported reports always have:
/// the exact binary value is rounded, and exact ties go to the even digit.
/// `100.25` becomes `100.2`, while `0.15` (stored just below) becomes `0.1`.
pub fn round_to(value: f64, decimals: usize) -> f64 {
    format!("{:.*}", decimals, value).parse().unwrap_or(value)
}

/// Picks the pillar and computes the summary for one cluster.
///
/// The pillar is the member with the highest search volume; ties go to the
/// member that comes first in membership order. Members without keyword data
/// are skipped. A cluster where no member has keyword data means clustering
/// and candidate data went out of sync, and fails with
/// [`Error::EmptyCluster`].
pub fn aggregate(
    cluster: &Cluster,
    candidates_by_keyword: &HashMap<String, KeywordCandidate>,
) -> Result<(ClusterSummary, Vec<KeywordRecord>)> {
    let resolved: Vec<&KeywordCandidate> = cluster
        .members
        .iter()
        .filter_map(|keyword| {
            let candidate = candidates_by_keyword.get(keyword);
            if candidate.is_none() {
                warn!("{}: no keyword data for '{}', skipping", cluster.name, keyword);
            }
            candidate
        })
        .collect();

    if resolved.is_empty() {
        error!("{} has no resolvable members: {:?}", cluster.name, cluster.members);
        return Err(Error::EmptyCluster(cluster.name.clone()));
    }

    let mut pillar = 0;
    for (i, candidate) in resolved.iter().enumerate().skip(1) {
        if candidate.search_volume > resolved[pillar].search_volume {
            pillar = i;
        }
    }

    let count = resolved.len();
    let total_search_volume: u64 = resolved.iter().map(|c| c.search_volume).sum();
    let competition_sum: f64 = resolved.iter().map(|c| c.competition).sum();

    let records = resolved
        .iter()
        .enumerate()
        .map(|(i, candidate)| KeywordRecord {
            cluster: cluster.name.clone(),
            keyword: candidate.keyword.clone(),
            search_volume: candidate.search_volume,
            competition: candidate.competition,
            role: if i == pillar { PostRole::Pillar } else { PostRole::Cluster },
        })
        .collect();

    let summary = ClusterSummary {
        cluster: cluster.name.clone(),
        pillar_keyword: resolved[pillar].keyword.clone(),
        keyword_count: count,
        avg_search_volume: round_to(total_search_volume as f64 / count as f64, 1),
        total_search_volume,
        avg_competition: round_to(competition_sum / count as f64, 3),
    };

    Ok((summary, records))
}

/// Aggregates every cluster, in cluster order.
pub fn aggregate_all(
    clusters: &[Cluster],
    candidates_by_keyword: &HashMap<String, KeywordCandidate>,
) -> Result<ResearchOutcome> {
    let mut outcome = ResearchOutcome::default();
    for cluster in clusters {
        let (summary, mut records) = aggregate(cluster, candidates_by_keyword)?;
        outcome.clusters.push(cluster.clone().with_pillar(summary.pillar_keyword.as_str())?);
        outcome.summaries.push(summary);
        outcome.records.append(&mut records);
    }
    outcome.total_keywords = outcome.records.len();
    outcome.total_clusters = outcome.summaries.len();
    Ok(outcome)
}

/// Indexes candidates by keyword. The first occurrence of a keyword wins.
pub fn index_candidates(candidates: &[KeywordCandidate]) -> HashMap<String, KeywordCandidate> {
    let mut index = HashMap::with_capacity(candidates.len());
    for candidate in candidates {
        index.entry(candidate.keyword.clone()).or_insert_with(|| candidate.clone());
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster(members: &[&str]) -> Cluster {
        let mut cluster = Cluster::new(1, members[0]);
        for member in &members[1..] {
            cluster.push(*member);
        }
        cluster
    }

    #[test]
    fn test_pillar_is_highest_volume() {
        let candidates = index_candidates(&[
            KeywordCandidate::new("a", 500, 0.1),
            KeywordCandidate::new("b", 300, 0.2),
        ]);
        let (summary, records) = aggregate(&cluster(&["b", "a"]), &candidates).unwrap();

        assert_eq!(summary.pillar_keyword, "a");
        assert_eq!(summary.keyword_count, 2);
        assert_eq!(summary.total_search_volume, 800);
        assert_eq!(summary.avg_search_volume, 400.0);
        assert_eq!(summary.avg_competition, 0.15);

        assert_eq!(records[0].keyword, "b");
        assert_eq!(records[0].role, PostRole::Cluster);
        assert_eq!(records[1].keyword, "a");
        assert_eq!(records[1].role, PostRole::Pillar);
    }

    #[test]
    fn test_ties_go_to_first_member() {
        let candidates = index_candidates(&[
            KeywordCandidate::new("zebra", 400, 0.1),
            KeywordCandidate::new("apple", 400, 0.1),
            KeywordCandidate::new("mango", 100, 0.1),
        ]);
        let (summary, records) = aggregate(&cluster(&["zebra", "apple", "mango"]), &candidates).unwrap();
        assert_eq!(summary.pillar_keyword, "zebra");
        assert_eq!(records.iter().filter(|r| r.role == PostRole::Pillar).count(), 1);
    }

    #[test]
    fn test_rounding_precision() {
        let candidates = index_candidates(&[
            KeywordCandidate::new("a", 100, 0.1),
            KeywordCandidate::new("b", 101, 0.2),
            KeywordCandidate::new("c", 101, 0.2),
        ]);
        let (summary, _) = aggregate(&cluster(&["a", "b", "c"]), &candidates).unwrap();
        // 302 / 3 = 100.666..., 0.5 / 3 = 0.1666...
        assert_eq!(summary.avg_search_volume, 100.7);
        assert_eq!(summary.avg_competition, 0.167);
        assert_eq!(summary.pillar_keyword, "b");
    }

    #[test]
    fn test_missing_members_are_skipped() {
        let candidates = index_candidates(&[KeywordCandidate::new("b", 50, 0.2)]);
        let (summary, records) = aggregate(&cluster(&["a", "b"]), &candidates).unwrap();
        assert_eq!(summary.pillar_keyword, "b");
        assert_eq!(summary.keyword_count, 1);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_unresolvable_cluster_fails() {
        let result = aggregate(&cluster(&["ghost"]), &HashMap::new());
        assert!(matches!(result, Err(Error::EmptyCluster(name)) if name == "Cluster 1"));
    }

    #[test]
    fn test_aggregate_all_totals() {
        let candidates = index_candidates(&[
            KeywordCandidate::new("a", 500, 0.1),
            KeywordCandidate::new("b", 300, 0.2),
            KeywordCandidate::new("c", 200, 0.3),
        ]);
        let mut first = Cluster::new(1, "a");
        first.push("c");
        let second = Cluster::new(2, "b");

        let outcome = aggregate_all(&[first, second], &candidates).unwrap();
        assert_eq!(outcome.total_clusters, 2);
        assert_eq!(outcome.total_keywords, 3);
        for summary in &outcome.summaries {
            let total: u64 = outcome
                .records
                .iter()
                .filter(|r| r.cluster == summary.cluster)
                .map(|r| r.search_volume)
                .sum();
            assert_eq!(total, summary.total_search_volume);
        }
        assert_eq!(outcome.records[0].cluster, "Cluster 1");
        assert_eq!(outcome.records[2].cluster, "Cluster 2");

        assert_eq!(outcome.clusters.len(), 2);
        for (cluster, summary) in outcome.clusters.iter().zip(&outcome.summaries) {
            let pillar = cluster.pillar().unwrap();
            assert!(cluster.contains(pillar));
            assert_eq!(pillar, summary.pillar_keyword);
        }
        assert_eq!(outcome.clusters[0].pillar(), Some("a"));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(2.25, 1), 2.2);
        assert_eq!(round_to(100.25, 1), 100.2);
        assert_eq!(round_to(100.75, 1), 100.8);
        assert_eq!(round_to(0.0625, 3), 0.062);
        assert_eq!(round_to(1.0005, 3), 1.0);
        assert_eq!(round_to(0.15, 1), 0.1);
        assert_eq!(round_to(0.1234, 3), 0.123);
        assert_eq!(round_to(7.0, 1), 7.0);
    }

    #[test]
    fn test_average_volume_tie_rounds_to_even() {
        let candidates = index_candidates(&[
            KeywordCandidate::new("a", 101, 0.1),
            KeywordCandidate::new("b", 100, 0.1),
            KeywordCandidate::new("c", 100, 0.1),
            KeywordCandidate::new("d", 100, 0.1),
        ]);
        let (summary, _) = aggregate(&cluster(&["a", "b", "c", "d"]), &candidates).unwrap();
        // 401 / 4 = 100.25 exactly
        assert_eq!(summary.avg_search_volume, 100.2);
        assert_eq!(summary.total_search_volume, 401);
    }
}
