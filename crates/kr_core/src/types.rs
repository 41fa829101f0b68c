use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ResearchConfig;
use crate::{Error, Result};

/// A keyword idea returned by expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordCandidate {
    pub keyword: String,
    pub search_volume: u64,
    /// Normalized to `[0, 1]`.
    pub competition: f64,
}

impl KeywordCandidate {
    pub fn new(keyword: impl Into<String>, search_volume: u64, competition: f64) -> Self {
        Self {
            keyword: keyword.into(),
            search_volume,
            competition: competition.clamp(0.0, 1.0),
        }
    }
}

/// Competition as reported by a keyword source: either a score or a
/// LOW/MEDIUM/HIGH label.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawCompetition {
    Score(f64),
    Label(String),
}

impl RawCompetition {
    pub fn score(&self) -> f64 {
        match self {
            RawCompetition::Score(value) if value.is_finite() => value.clamp(0.0, 1.0),
            RawCompetition::Score(_) => 0.0,
            RawCompetition::Label(label) => competition_label_score(label),
        }
    }
}

/// Maps a categorical competition label onto the numeric scale.
pub fn competition_label_score(label: &str) -> f64 {
    match label.trim().to_ascii_lowercase().as_str() {
        "low" => 0.1,
        "medium" => 0.5,
        "high" => 0.9,
        _ => 0.0,
    }
}

/// Result URLs per keyword, in the order keywords were inserted.
///
/// Insertion order is the clustering order, so callers control
/// reproducibility by controlling the order they insert in.
#[derive(Debug, Clone, Default)]
pub struct SerpResultSet {
    entries: Vec<(String, Vec<String>)>,
    index: HashMap<String, usize>,
}

impl SerpResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the URLs for `keyword`. A replaced keyword keeps
    /// its original position.
    pub fn insert(&mut self, keyword: impl Into<String>, urls: Vec<String>) {
        let keyword = keyword.into();
        match self.index.get(&keyword) {
            Some(&pos) => self.entries[pos].1 = urls,
            None => {
                self.index.insert(keyword.clone(), self.entries.len());
                self.entries.push((keyword, urls));
            }
        }
    }

    pub fn get(&self, keyword: &str) -> Option<&[String]> {
        self.index.get(keyword).map(|&pos| self.entries[pos].1.as_slice())
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(keyword, _)| keyword.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(keyword, urls)| (keyword.as_str(), urls.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keywords whose lookup produced no URLs.
    pub fn empty_keywords(&self) -> Vec<&str> {
        self.iter().filter(|(_, urls)| urls.is_empty()).map(|(keyword, _)| keyword).collect()
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<String>)> for SerpResultSet {
    fn from_iter<I: IntoIterator<Item = (K, Vec<String>)>>(iter: I) -> Self {
        let mut set = SerpResultSet::new();
        for (keyword, urls) in iter {
            set.insert(keyword, urls);
        }
        set
    }
}

/// A group of keywords sharing enough SERP results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub name: String,
    /// Membership order: the seed first, then absorbed keywords in scan order.
    pub members: Vec<String>,
    /// Set once the cluster is aggregated. Always one of `members`.
    #[serde(default)]
    pub pillar: Option<String>,
}

impl Cluster {
    /// Opens cluster number `ordinal` (1-based) seeded with `seed`.
    pub fn new(ordinal: usize, seed: impl Into<String>) -> Self {
        Self {
            name: format!("Cluster {}", ordinal),
            members: vec![seed.into()],
            pillar: None,
        }
    }

    /// Marks `keyword` as the pillar. Fails if it is not a member.
    pub fn with_pillar(mut self, keyword: impl Into<String>) -> Result<Self> {
        let keyword = keyword.into();
        if !self.contains(&keyword) {
            return Err(Error::PillarNotMember {
                cluster: self.name,
                keyword,
            });
        }
        self.pillar = Some(keyword);
        Ok(self)
    }

    pub fn pillar(&self) -> Option<&str> {
        self.pillar.as_deref()
    }

    pub fn seed(&self) -> &str {
        self.members.first().map(String::as_str).unwrap_or_default()
    }

    pub fn push(&mut self, keyword: impl Into<String>) {
        self.members.push(keyword.into());
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.members.iter().any(|member| member == keyword)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostRole {
    #[serde(rename = "Pillar Post")]
    Pillar,
    #[serde(rename = "Cluster Post")]
    Cluster,
}

impl fmt::Display for PostRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostRole::Pillar => write!(f, "Pillar Post"),
            PostRole::Cluster => write!(f, "Cluster Post"),
        }
    }
}

/// One row per (cluster, keyword).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRecord {
    #[serde(rename = "Cluster")]
    pub cluster: String,
    #[serde(rename = "Keyword")]
    pub keyword: String,
    #[serde(rename = "Search Volume")]
    pub search_volume: u64,
    #[serde(rename = "Competition")]
    pub competition: f64,
    #[serde(rename = "Role")]
    pub role: PostRole,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    #[serde(rename = "Cluster")]
    pub cluster: String,
    #[serde(rename = "Pillar Keyword")]
    pub pillar_keyword: String,
    #[serde(rename = "Keywords in Cluster")]
    pub keyword_count: usize,
    #[serde(rename = "Avg Search Volume")]
    pub avg_search_volume: f64,
    #[serde(rename = "Total Search Volume")]
    pub total_search_volume: u64,
    #[serde(rename = "Avg Competition")]
    pub avg_competition: f64,
}

/// Everything a research run hands to its storage collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchOutcome {
    /// Clusters with their pillar set, in build order.
    #[serde(default)]
    pub clusters: Vec<Cluster>,
    pub summaries: Vec<ClusterSummary>,
    pub records: Vec<KeywordRecord>,
    pub total_keywords: usize,
    pub total_clusters: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Running => write!(f, "running"),
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub seed_keyword: String,
    pub config: ResearchConfig,
    pub status: RunStatus,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub outcome: Option<ResearchOutcome>,
}

impl RunReport {
    pub fn start(seed_keyword: impl Into<String>, config: ResearchConfig) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            seed_keyword: seed_keyword.into(),
            config,
            status: RunStatus::Running,
            error: None,
            started_at: Utc::now(),
            finished_at: None,
            outcome: None,
        }
    }

    pub fn complete(mut self, outcome: ResearchOutcome) -> Self {
        self.status = RunStatus::Completed;
        self.outcome = Some(outcome);
        self.finished_at = Some(Utc::now());
        self
    }

    pub fn fail(mut self, message: impl Into<String>) -> Self {
        self.status = RunStatus::Failed;
        self.error = Some(message.into());
        self.finished_at = Some(Utc::now());
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status != RunStatus::Running
    }
}
