use std::path::Path;
use std::sync::Arc;

use kr_core::{Error, ResearchStorage, Result};
use tracing::info;

pub mod backends;

pub use backends::*;

/// Directory the CSV backend writes to when none is given.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Builds a storage backend by name: `memory` or `csv`.
pub fn create_storage(kind: &str, output_dir: Option<&Path>) -> Result<Arc<dyn ResearchStorage>> {
    match kind.trim().to_lowercase().as_str() {
        "memory" => {
            info!("💾 Using in-memory run storage");
            Ok(Arc::new(InMemoryStorage::new()))
        }
        "csv" => {
            let dir = output_dir.unwrap_or_else(|| Path::new(DEFAULT_OUTPUT_DIR));
            info!("💾 Writing runs to {}", dir.display());
            Ok(Arc::new(CsvStorage::new(dir)?))
        }
        other => Err(Error::Config(format!(
            "Unknown storage backend '{}', expected 'memory' or 'csv'",
            other
        ))),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::create_storage;
}
