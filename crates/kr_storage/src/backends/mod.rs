pub mod csv;
pub mod memory;

pub use self::csv::{CsvStorage, CLUSTERS_FILE, REPORT_FILE, SUMMARY_FILE};
pub use memory::InMemoryStorage;
