// Pure and stateful stage logic, independent of snapshots and adapters

pub mod enrich;
pub mod export;
pub mod filter;
pub mod upload;
pub mod validate;

pub use enrich::ElevationEnricher;
pub use export::{rows_from_snapshot, ExportRow};
pub use filter::{categorize, filter_all, filter_missing_elevation, prioritize};
pub use upload::{UploadMode, UploadStats, Uploader};
pub use validate::{ElevationRange, ElevationValidator, ValidatedCategory, ValidationOutcome, ValidationReport};
