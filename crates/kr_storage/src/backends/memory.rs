use std::sync::Arc;

use async_trait::async_trait;
use kr_core::{ResearchStorage, Result, RunReport};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Run reports kept in insertion order.
#[derive(Debug, Default)]
pub struct RunStore {
    runs: Vec<RunReport>,
}

impl RunStore {
    pub fn new() -> Self {
        Self { runs: Vec::new() }
    }

    pub fn store_run(&mut self, report: &RunReport) {
        if let Some(existing) = self.runs.iter_mut().find(|r| r.run_id == report.run_id) {
            *existing = report.clone();
        } else {
            self.runs.push(report.clone());
        }
    }

    pub fn get_run(&self, run_id: Uuid) -> Option<RunReport> {
        self.runs.iter().find(|r| r.run_id == run_id).cloned()
    }

    pub fn list_runs(&self) -> Vec<RunReport> {
        self.runs.clone()
    }
}

/// Keeps run reports for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    store: Arc<RwLock<RunStore>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResearchStorage for InMemoryStorage {
    async fn store_run(&self, report: &RunReport) -> Result<()> {
        let mut store = self.store.write().await;
        store.store_run(report);
        Ok(())
    }

    async fn get_run(&self, run_id: Uuid) -> Result<Option<RunReport>> {
        let store = self.store.read().await;
        Ok(store.get_run(run_id))
    }

    async fn list_runs(&self) -> Result<Vec<RunReport>> {
        let store = self.store.read().await;
        Ok(store.list_runs())
    }
}
