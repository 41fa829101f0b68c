pub mod config;
pub mod error;
pub mod sources;
pub mod storage;
pub mod types;

pub use config::ResearchConfig;
pub use error::{Error, ErrorKind, Result};
pub use sources::{ExpansionRequest, KeywordSource, SerpRequest, SerpSource};
pub use storage::ResearchStorage;
pub use types::{
    Cluster, ClusterSummary, KeywordCandidate, KeywordRecord, PostRole, RawCompetition,
    ResearchOutcome, RunReport, RunStatus, SerpResultSet,
};
