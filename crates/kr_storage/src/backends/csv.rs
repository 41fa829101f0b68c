use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use kr_core::{Error, ResearchOutcome, ResearchStorage, Result, RunReport};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

pub const CLUSTERS_FILE: &str = "keyword_clusters.csv";
pub const SUMMARY_FILE: &str = "cluster_summary.csv";
pub const REPORT_FILE: &str = "run.json";

/// Writes each run to its own directory under `root`:
///
/// - `run.json` with the full report
/// - `keyword_clusters.csv` with one row per keyword, for completed runs
/// - `cluster_summary.csv` with one row per cluster, for completed runs
#[derive(Debug, Clone)]
pub struct CsvStorage {
    root: PathBuf,
}

impl CsvStorage {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn run_dir(&self, run_id: Uuid) -> PathBuf {
        self.root.join(run_id.to_string())
    }

    fn write_run(&self, report: &RunReport) -> Result<()> {
        let dir = self.run_dir(report.run_id);
        fs::create_dir_all(&dir)?;

        if let Some(outcome) = &report.outcome {
            write_outcome(&dir, outcome)?;
        }
        fs::write(dir.join(REPORT_FILE), serde_json::to_vec_pretty(report)?)?;
        debug!("Wrote run {} to {}", report.run_id, dir.display());
        Ok(())
    }

    fn read_run(&self, dir: &Path) -> Result<Option<RunReport>> {
        let path = dir.join(REPORT_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        let raw = fs::read(&path)?;
        Ok(Some(serde_json::from_slice(&raw)?))
    }

    fn read_all(&self) -> Result<Vec<RunReport>> {
        let mut runs = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            match self.read_run(&path) {
                Ok(Some(report)) => runs.push(report),
                Ok(None) => {}
                Err(e) => warn!("Skipping unreadable run in {}: {}", path.display(), e),
            }
        }
        runs.sort_by_key(|r| r.started_at);
        Ok(runs)
    }
}

fn write_outcome(dir: &Path, outcome: &ResearchOutcome) -> Result<()> {
    write_csv(&dir.join(CLUSTERS_FILE), &outcome.records)?;
    write_csv(&dir.join(SUMMARY_FILE), &outcome.summaries)
}

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    for row in rows {
        writer.serialize(row).map_err(csv_error)?;
    }
    writer.flush()?;
    Ok(())
}

fn csv_error(e: csv::Error) -> Error {
    Error::Storage(format!("CSV export failed: {}", e))
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Storage(format!("storage task failed: {}", e)))?
}

#[async_trait]
impl ResearchStorage for CsvStorage {
    async fn store_run(&self, report: &RunReport) -> Result<()> {
        let storage = self.clone();
        let report = report.clone();
        blocking(move || storage.write_run(&report)).await
    }

    async fn get_run(&self, run_id: Uuid) -> Result<Option<RunReport>> {
        let storage = self.clone();
        blocking(move || storage.read_run(&storage.run_dir(run_id))).await
    }

    async fn list_runs(&self) -> Result<Vec<RunReport>> {
        let storage = self.clone();
        blocking(move || storage.read_all()).await
    }
}
