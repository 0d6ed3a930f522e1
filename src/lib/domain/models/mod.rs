pub mod occurrence;
pub mod raw_table;

pub use occurrence::{CellValue, Dataset, MinimalRecord, Numeric, OccurrenceRecord};
pub use raw_table::RawTable;
