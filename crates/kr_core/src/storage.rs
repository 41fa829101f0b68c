use async_trait::async_trait;
use uuid::Uuid;

use crate::types::RunReport;
use crate::Result;

#[async_trait]
pub trait ResearchStorage: Send + Sync {
    /// Stores a run report, replacing any earlier report with the same id
    async fn store_run(&self, report: &RunReport) -> Result<()>;

    /// Fetches a run report by id
    async fn get_run(&self, run_id: Uuid) -> Result<Option<RunReport>>;

    /// Lists all stored runs, oldest first
    async fn list_runs(&self) -> Result<Vec<RunReport>>;
}
