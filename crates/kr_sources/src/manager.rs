use std::sync::Arc;

use kr_cluster::{aggregate_all, dedupe_candidates, index_candidates, CandidateFilter, ClusterBuilder};
use kr_core::{
    Error, ExpansionRequest, KeywordSource, ResearchConfig, ResearchOutcome, ResearchStorage, Result, RunReport,
    SerpSource,
};

use crate::collector::SerpCollector;
use crate::logging::Logger;
use crate::pacing::{FixedSpacing, Pacer};

/// Runs the keyword research pipeline for one seed at a time:
/// expansion, filtering, SERP lookup, clustering and aggregation.
pub struct Researcher {
    keywords: Arc<dyn KeywordSource>,
    serps: Arc<dyn SerpSource>,
    pacer: Arc<dyn Pacer>,
    storage: Option<Arc<dyn ResearchStorage>>,
    config: ResearchConfig,
}

impl Researcher {
    pub fn new(
        keywords: Arc<dyn KeywordSource>,
        serps: Arc<dyn SerpSource>,
        config: ResearchConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            keywords,
            serps,
            pacer: Arc::new(FixedSpacing::new(config.serp_spacing)),
            storage: None,
            config,
        })
    }

    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn with_storage(mut self, storage: Arc<dyn ResearchStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn config(&self) -> &ResearchConfig {
        &self.config
    }

    /// Runs the pipeline and returns the results without recording a run.
    pub async fn research(&self, seed_keyword: &str) -> Result<ResearchOutcome> {
        self.research_with(seed_keyword, &Logger::new().with_prefix(format!("[{}]", seed_keyword.trim())))
            .await
    }

    async fn research_with(&self, seed_keyword: &str, logger: &Logger) -> Result<ResearchOutcome> {
        let seed = seed_keyword.trim();
        if seed.is_empty() {
            return Err(Error::Config("seed keyword must not be empty".to_string()));
        }

        logger.info(&format!("🌱 Expanding seed keyword via {}", self.keywords.name()));
        let request = ExpansionRequest::from_config(seed, &self.config);
        let candidates = self.keywords.expand(&request).await?;
        if candidates.is_empty() {
            return Err(Error::DataSource(format!("no keyword ideas returned for '{}'", seed)));
        }
        let candidates = dedupe_candidates(candidates);
        logger.info(&format!("📋 {} unique candidates", candidates.len()));

        let mut filtered = CandidateFilter::from_config(&self.config).apply(candidates)?;
        logger.info(&format!(
            "🧹 {} candidates with volume >= {} and competition <= {}",
            filtered.len(),
            self.config.min_search_volume,
            self.config.max_competition
        ));
        filtered.truncate(self.config.serp_lookup_limit);

        let keywords: Vec<String> = filtered.iter().map(|c| c.keyword.clone()).collect();
        logger.info(&format!("🔍 Looking up SERPs for {} keywords via {}", keywords.len(), self.serps.name()));
        logger.debug(&format!("SERP lookup set: {:?}", keywords));
        let serp = SerpCollector::new(self.serps.clone(), self.pacer.clone())
            .with_concurrency(self.config.serp_concurrency)
            .with_page_size(self.config.page_size)
            .collect(&keywords, &self.config.location, &self.config.language)
            .await;
        let missing = serp.empty_keywords();
        if !missing.is_empty() {
            logger.warn(&format!("⚠️ {} keywords without results: {:?}", missing.len(), missing));
        }

        let clusters = ClusterBuilder::from_config(&self.config).build(&serp);
        logger.info(&format!("🧩 {} clusters at threshold {}", clusters.len(), self.config.overlap_threshold));

        let outcome = aggregate_all(&clusters, &index_candidates(&filtered))?;
        logger.info(&format!(
            "✨ {} keywords in {} clusters",
            outcome.total_keywords, outcome.total_clusters
        ));
        Ok(outcome)
    }

    /// Runs the pipeline and records the terminal run report.
    ///
    /// Pipeline failures end up in the report as a `failed` status; only a
    /// storage failure is returned as an error.
    pub async fn run(&self, seed_keyword: &str) -> Result<RunReport> {
        let report = RunReport::start(seed_keyword.trim(), self.config.clone());
        let short_id = report.run_id.simple().to_string();
        let logger = Logger::new()
            .with_prefix(format!("[{}]", &short_id[..8]))
            .with_prefix(format!("[{}]", report.seed_keyword));

        logger.info("🚀 Starting research run");
        let report = match self.research_with(seed_keyword, &logger).await {
            Ok(outcome) => {
                logger.info("✅ Research run completed");
                report.complete(outcome)
            }
            Err(e) => {
                logger.error(&format!("❌ Research run failed: {}", e));
                report.fail(e.to_string())
            }
        };

        if let Some(storage) = &self.storage {
            logger.info("💾 Storing run report");
            storage.store_run(&report).await?;
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacing::Unpaced;
    use async_trait::async_trait;
    use kr_core::{KeywordCandidate, PostRole, RunStatus, SerpRequest};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use uuid::Uuid;

    struct MockKeywords {
        candidates: Vec<KeywordCandidate>,
        requests: Mutex<Vec<ExpansionRequest>>,
    }

    impl MockKeywords {
        fn new(candidates: Vec<KeywordCandidate>) -> Self {
            Self {
                candidates,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl KeywordSource for MockKeywords {
        fn name(&self) -> &str {
            "mock"
        }

        async fn expand(&self, request: &ExpansionRequest) -> Result<Vec<KeywordCandidate>> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(self.candidates.clone())
        }
    }

    struct MockSerps {
        pages: HashMap<String, Vec<String>>,
        looked_up: Mutex<Vec<String>>,
    }

    impl MockSerps {
        fn new(pages: &[(&str, &[&str])]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(k, urls)| (k.to_string(), urls.iter().map(|u| u.to_string()).collect()))
                    .collect(),
                looked_up: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SerpSource for MockSerps {
        fn name(&self) -> &str {
            "mock"
        }

        async fn lookup(&self, request: &SerpRequest) -> Result<Vec<String>> {
            self.looked_up.lock().unwrap().push(request.keyword.clone());
            self.pages.get(&request.keyword).cloned().ok_or_else(|| Error::Lookup {
                keyword: request.keyword.clone(),
                reason: "timed out".to_string(),
            })
        }
    }

    #[derive(Default)]
    struct MockStorage {
        runs: Mutex<Vec<RunReport>>,
    }

    #[async_trait]
    impl ResearchStorage for MockStorage {
        async fn store_run(&self, report: &RunReport) -> Result<()> {
            self.runs.lock().unwrap().push(report.clone());
            Ok(())
        }

        async fn get_run(&self, run_id: Uuid) -> Result<Option<RunReport>> {
            Ok(self.runs.lock().unwrap().iter().find(|r| r.run_id == run_id).cloned())
        }

        async fn list_runs(&self) -> Result<Vec<RunReport>> {
            Ok(self.runs.lock().unwrap().clone())
        }
    }

    fn researcher(keywords: MockKeywords, serps: MockSerps) -> Researcher {
        Researcher::new(Arc::new(keywords), Arc::new(serps), ResearchConfig::default())
            .unwrap()
            .with_pacer(Arc::new(Unpaced))
    }

    fn urls(range: std::ops::RangeInclusive<u32>) -> Vec<String> {
        range.map(|i| format!("https://u{}.com/", i)).collect()
    }

    #[tokio::test]
    async fn test_research_clusters_shared_results() {
        let a = urls(1..=10);
        let mut b = urls(1..=8);
        b.extend(urls(11..=12));
        let a: Vec<&str> = a.iter().map(String::as_str).collect();
        let b: Vec<&str> = b.iter().map(String::as_str).collect();

        let keywords = MockKeywords::new(vec![
            KeywordCandidate::new("a", 500, 0.1),
            KeywordCandidate::new("b", 300, 0.2),
        ]);
        let outcome = researcher(keywords, MockSerps::new(&[("a", &a), ("b", &b)]))
            .research("seed")
            .await
            .unwrap();

        assert_eq!(outcome.total_clusters, 1);
        assert_eq!(outcome.total_keywords, 2);
        assert_eq!(outcome.summaries[0].pillar_keyword, "a");
        assert_eq!(outcome.summaries[0].avg_search_volume, 400.0);
        assert_eq!(outcome.records[1].role, PostRole::Cluster);
    }

    #[tokio::test]
    async fn test_research_filters_dedupes_and_limits() {
        let mut candidates = vec![
            KeywordCandidate::new("too small", 50, 0.1),
            KeywordCandidate::new("too hard", 5000, 0.8),
            KeywordCandidate::new("a", 500, 0.1),
            KeywordCandidate::new("a", 900, 0.1),
        ];
        for i in 0..30 {
            candidates.push(KeywordCandidate::new(format!("k{}", i), 200, 0.2));
        }
        let keywords = MockKeywords::new(candidates);
        let serps = Arc::new(MockSerps::new(&[]));
        let researcher = Researcher::new(Arc::new(keywords), serps.clone(), ResearchConfig::default())
            .unwrap()
            .with_pacer(Arc::new(Unpaced));

        let outcome = researcher.research("  seed  ").await.unwrap();

        let looked_up = serps.looked_up.lock().unwrap();
        assert_eq!(looked_up.len(), 20);
        assert_eq!(looked_up[0], "a");
        assert_eq!(outcome.total_keywords, 20);
        assert_eq!(outcome.total_clusters, 20);
        assert_eq!(outcome.records[0].search_volume, 500);
    }

    #[tokio::test]
    async fn test_expansion_request_uses_config() {
        let keywords = Arc::new(MockKeywords::new(vec![KeywordCandidate::new("a", 500, 0.1)]));
        let researcher = Researcher::new(keywords.clone(), Arc::new(MockSerps::new(&[])), ResearchConfig::default())
            .unwrap()
            .with_pacer(Arc::new(Unpaced));
        researcher.research(" ai tools ").await.unwrap();

        let requests = keywords.requests.lock().unwrap();
        assert_eq!(requests[0].seed_keyword, "ai tools");
        assert_eq!(requests[0].location, "India");
        assert_eq!(requests[0].language, "en");
        assert_eq!(requests[0].limit, 50);
    }

    #[tokio::test]
    async fn test_blank_seed_is_rejected() {
        let researcher = researcher(MockKeywords::new(Vec::new()), MockSerps::new(&[]));
        assert!(matches!(researcher.research("   ").await, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_empty_expansion_is_data_source_error() {
        let researcher = researcher(MockKeywords::new(Vec::new()), MockSerps::new(&[]));
        assert!(matches!(researcher.research("seed").await, Err(Error::DataSource(_))));
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let config = ResearchConfig {
            overlap_threshold: 1.5,
            ..ResearchConfig::default()
        };
        let result = Researcher::new(
            Arc::new(MockKeywords::new(Vec::new())),
            Arc::new(MockSerps::new(&[])),
            config,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_run_records_failed_report() {
        let storage = Arc::new(MockStorage::default());
        let keywords = MockKeywords::new(vec![KeywordCandidate::new("a", 10, 0.1)]);
        let researcher = researcher(keywords, MockSerps::new(&[])).with_storage(storage.clone());

        let report = researcher.run("seed").await.unwrap();
        assert_eq!(report.status, RunStatus::Failed);
        assert!(report.error.as_deref().unwrap().contains("No keyword candidates"));
        assert!(report.outcome.is_none());
        assert!(report.finished_at.is_some());

        let stored = storage.get_run(report.run_id).await.unwrap().unwrap();
        assert_eq!(stored.status, RunStatus::Failed);
    }

    #[tokio::test]
    async fn test_run_records_completed_report() {
        let storage = Arc::new(MockStorage::default());
        let keywords = MockKeywords::new(vec![KeywordCandidate::new("a", 500, 0.1)]);
        let researcher = researcher(keywords, MockSerps::new(&[("a", &["https://u1.com/"])]))
            .with_storage(storage.clone());

        let report = researcher.run("seed").await.unwrap();
        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.seed_keyword, "seed");
        assert_eq!(report.outcome.as_ref().unwrap().total_clusters, 1);
        assert_eq!(storage.list_runs().await.unwrap().len(), 1);
    }
}
