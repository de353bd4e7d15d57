//! Ingestion boundary: competition registry, row schema and file loading

pub mod loader;
pub mod registry;
pub mod row;

pub use loader::{read_rows, LoadOutcome, LoadStats, ResultLoader, RESULTS_FILE_SUFFIX};
pub use registry::CompetitionRegistry;
pub use row::{IngestRow, RowRejection};
