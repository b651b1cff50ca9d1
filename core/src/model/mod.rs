pub mod aggregate;
pub mod field;
pub mod record;
pub mod selection;
pub mod source;

pub use aggregate::{AggregateResult, AggregateSpec, GroupKey, Grouping, SortOrder};
pub use field::{CategoricalField, NumericField, TemporalField};
pub use record::{CustomerType, Gender, Record, RecordSet};
pub use selection::FilterSelection;
pub use source::SourceId;
