pub mod cache;
pub mod csv_file;
pub mod traits;

// Re-export
pub use cache::RecordSetCache;
pub use csv_file::{load, read_records, CsvRecordSource};
pub use traits::RecordSource;
