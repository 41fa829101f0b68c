use thiserror::Error;

/// Coarse classification of failures, used by the pipeline to decide
/// whether a failure aborts the run or is absorbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Thresholds or settings the caller can fix and retry.
    Configuration,
    /// The keyword source returned nothing usable.
    DataSource,
    /// A single SERP lookup failed.
    Lookup,
    /// A broken internal invariant.
    Invariant,
    /// Anything else (IO, serialization, storage).
    Internal,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No keyword candidates left after filtering (min search volume {min_volume}, max competition {max_competition})")]
    NoCandidates { min_volume: u64, max_competition: f64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Keyword data source error: {0}")]
    DataSource(String),

    #[error("SERP lookup failed for '{keyword}': {reason}")]
    Lookup { keyword: String, reason: String },

    #[error("Cluster '{0}' has no members with keyword data")]
    EmptyCluster(String),

    #[error("Pillar '{keyword}' is not a member of '{cluster}'")]
    PillarNotMember { cluster: String, keyword: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NoCandidates { .. } | Error::Config(_) => ErrorKind::Configuration,
            Error::DataSource(_) | Error::Http(_) => ErrorKind::DataSource,
            Error::Lookup { .. } => ErrorKind::Lookup,
            Error::EmptyCluster(_) | Error::PillarNotMember { .. } => ErrorKind::Invariant,
            Error::Io(_) | Error::Serialization(_) | Error::Storage(_) | Error::External(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Per-keyword lookup failures are the only ones a run survives.
    pub fn is_fatal(&self) -> bool {
        self.kind() != ErrorKind::Lookup
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_candidates_is_configuration() {
        let err = Error::NoCandidates { min_volume: 100, max_competition: 0.3 };
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.is_fatal());
        assert!(err.to_string().contains("min search volume 100"));
    }

    #[test]
    fn test_lookup_is_absorbable() {
        let err = Error::Lookup {
            keyword: "ai tools".to_string(),
            reason: "timed out".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Lookup);
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_empty_cluster_is_invariant() {
        let err = Error::EmptyCluster("Cluster 3".to_string());
        assert_eq!(err.kind(), ErrorKind::Invariant);
        assert_eq!(err.to_string(), "Cluster 'Cluster 3' has no members with keyword data");
    }

    #[test]
    fn test_pillar_outside_cluster_is_invariant() {
        let err = Error::PillarNotMember {
            cluster: "Cluster 1".to_string(),
            keyword: "crm".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Invariant);
        assert!(err.is_fatal());
    }
}
