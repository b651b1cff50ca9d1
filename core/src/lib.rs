pub mod config;
pub mod error;
pub mod input;
pub mod model;
pub mod repository;
pub mod service;
pub mod time;
pub mod usecase;

pub use config::Config;
pub use error::{PipelineError, Result};
pub use input::{expand_key, parse_args, parse_selection, ParsedInput};
pub use model::{
    AggregateResult, AggregateSpec, CategoricalField, FilterSelection, Grouping, NumericField,
    Record, RecordSet, SortOrder, TemporalField,
};
pub use repository::{load, CsvRecordSource, RecordSetCache, RecordSource};
pub use service::aggregate::aggregate;
pub use service::dto::{ChartKind, Panel, PanelData, ViewRequest, ViewResponse};
pub use service::filter::{filter, filter_set, observed_values};
pub use usecase::dashboard::DashboardUseCase;
pub use usecase::views::View;
