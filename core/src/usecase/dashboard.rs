use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::model::field::columns;
use crate::model::{AggregateResult, AggregateSpec, CategoricalField, FilterSelection, Record, RecordSet};
use crate::repository::{RecordSetCache, RecordSource};
use crate::service::aggregate::aggregate;
use crate::service::dto::{Panel, PanelData, ViewRequest, ViewResponse};
use crate::service::filter::{filter, filter_options};
use crate::usecase::views::{PanelSource, PanelSpec};

/// Request/response handler behind every UI interaction.
///
/// Each call reruns load (through the cache), filter and aggregate for the
/// request it is given; nothing about the previous request is remembered.
pub struct DashboardUseCase<S: RecordSource> {
    source: S,
    cache: RecordSetCache,
    config: Config,
}

impl<S: RecordSource> DashboardUseCase<S> {
    pub fn new(source: S, config: Config) -> Self {
        Self {
            source,
            cache: RecordSetCache::new(),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn records(&mut self) -> Result<Arc<RecordSet>> {
        self.cache.get_or_load(&self.source)
    }

    /// Forgets the loaded records; the next request reads the source again.
    pub fn reload(&mut self) {
        self.cache.clear();
    }

    /// Observed values for the City, Gender and Product line widgets.
    pub fn options(&mut self) -> Result<BTreeMap<CategoricalField, BTreeSet<String>>> {
        let records = self.records()?;
        Ok(filter_options(records.records()))
    }

    pub fn handle(&mut self, request: &ViewRequest) -> Result<ViewResponse> {
        let records = self.records()?;
        let filtered = filter(records.records(), &request.selection);
        debug!(
            view = %request.view,
            total = records.len(),
            filtered = filtered.len(),
            "handling view request"
        );

        let panels = request
            .view
            .panels(self.config.preview_rows)
            .into_iter()
            .map(|spec| build_panel(spec, &filtered))
            .collect::<Result<Vec<_>>>()?;

        Ok(ViewResponse {
            view: request.view,
            title: request.view.title().to_string(),
            total_rows: records.len(),
            filtered_rows: filtered.len(),
            panels,
        })
    }

    /// Runs a single aggregate outside the view catalog. Too few rows yield
    /// `PanelData::NoData`, the same placeholder a view panel gets.
    pub fn aggregate(&mut self, spec: &AggregateSpec, selection: &FilterSelection) -> Result<PanelData> {
        let records = self.records()?;
        let filtered = filter(records.records(), selection);
        recover(spec.name(), aggregate(&filtered, spec))
    }

    /// The first `rows` records matching `selection`.
    pub fn preview(&mut self, rows: usize, selection: &FilterSelection) -> Result<Vec<Record>> {
        let records = self.records()?;
        Ok(filter(records.records(), selection)
            .into_iter()
            .take(rows)
            .cloned()
            .collect())
    }
}

fn build_panel(spec: PanelSpec, filtered: &[&Record]) -> Result<Panel> {
    let data = match &spec.source {
        PanelSource::Aggregate(aggregate_spec) => {
            recover(&spec.title, aggregate(filtered, aggregate_spec))?
        }
        PanelSource::Preview(rows) => PanelData::Records {
            rows: filtered.iter().take(*rows).map(|r| (*r).clone()).collect(),
        },
        PanelSource::Columns => PanelData::Columns {
            names: columns::REQUIRED
                .iter()
                .chain(columns::OPTIONAL.iter())
                .chain([columns::MONTH, columns::DAY].iter())
                .map(|c| c.to_string())
                .collect(),
        },
    };

    Ok(Panel {
        title: spec.title,
        chart: spec.chart,
        axes: spec.axes,
        data,
    })
}

// Too few rows is local to one panel; anything else fails the request.
fn recover(panel: &str, result: Result<AggregateResult>) -> Result<PanelData> {
    match result {
        Ok(result) => Ok(PanelData::Aggregate { result }),
        Err(err @ PipelineError::InsufficientData { .. }) => {
            warn!(panel, "{}", err);
            Ok(PanelData::NoData {
                reason: err.to_string(),
            })
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Gender, NumericField, SourceId};
    use crate::usecase::views::View;
    use chrono::{NaiveDate, NaiveTime};
    use std::cell::Cell;
    use std::path::PathBuf;

    struct MockSource {
        records: Vec<Record>,
        loads: Cell<usize>,
    }

    impl RecordSource for MockSource {
        fn identity(&self) -> Result<SourceId> {
            Ok(SourceId {
                path: PathBuf::from("/mock/data.csv"),
                modified: None,
                len: self.records.len() as u64,
            })
        }

        fn load(&self) -> Result<RecordSet> {
            self.loads.set(self.loads.get() + 1);
            Ok(RecordSet::with_source(self.identity()?, self.records.clone()))
        }
    }

    fn record(city: &str, gender: Gender, total: f64, payment: &str) -> Record {
        let mut r = Record::new(
            NaiveDate::from_ymd_opt(2019, 1, 5).unwrap(),
            NaiveTime::from_hms_opt(13, 8, 0).unwrap(),
        );
        r.city = city.to_string();
        r.gender = gender;
        r.total = total;
        r.quantity = (total / 5.0) as u32;
        r.rating = total / 4.0;
        r.payment = Some(payment.to_string());
        r
    }

    fn usecase() -> DashboardUseCase<MockSource> {
        let source = MockSource {
            records: vec![
                record("A", Gender::Male, 10.0, "Cash"),
                record("A", Gender::Female, 20.0, "Ewallet"),
                record("B", Gender::Male, 5.0, "Cash"),
            ],
            loads: Cell::new(0),
        };
        DashboardUseCase::new(source, Config::default())
    }

    #[test]
    fn test_handle_descriptive_counts() {
        let mut usecase = usecase();
        let response = usecase
            .handle(&ViewRequest::new(View::Descriptive, FilterSelection::new()))
            .unwrap();

        assert_eq!(response.total_rows, 3);
        assert_eq!(response.filtered_rows, 3);
        assert_eq!(response.panels.len(), 4);
        for panel in &response.panels {
            let PanelData::Aggregate { result: AggregateResult::Counts(counts) } = &panel.data else {
                panic!("expected counts for {}", panel.title);
            };
            assert_eq!(counts.iter().map(|c| c.count).sum::<usize>(), 3);
        }
    }

    #[test]
    fn test_handle_applies_selection() {
        let mut usecase = usecase();
        let selection = FilterSelection::new().with(CategoricalField::City, ["B"]);
        let response = usecase
            .handle(&ViewRequest::new(View::PaymentMethods, selection))
            .unwrap();

        assert_eq!(response.filtered_rows, 1);
        let PanelData::Aggregate { result: AggregateResult::Counts(counts) } = &response.panels[0].data else {
            panic!("expected counts");
        };
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].key, "Cash");
    }

    #[test]
    fn test_single_row_correlation_degrades_to_no_data() {
        let mut usecase = usecase();
        let selection = FilterSelection::new().with(CategoricalField::City, ["B"]);
        let response = usecase
            .handle(&ViewRequest::new(View::NumericCorrelation, selection))
            .unwrap();

        assert!(matches!(response.panels[0].data, PanelData::NoData { .. }));
    }

    #[test]
    fn test_single_aggregate_degrades_to_no_data() {
        let mut usecase = usecase();
        let selection = FilterSelection::new().with(CategoricalField::City, ["B"]);
        let data = usecase
            .aggregate(&AggregateSpec::correlation(NumericField::CORRELATED), &selection)
            .unwrap();
        let PanelData::NoData { reason } = data else {
            panic!("expected a placeholder");
        };
        assert!(reason.contains("correlation_matrix"));

        let data = usecase
            .aggregate(&AggregateSpec::count_by(CategoricalField::Gender), &selection)
            .unwrap();
        assert!(matches!(data, PanelData::Aggregate { result: AggregateResult::Counts(_) }));
    }

    #[test]
    fn test_empty_selection_renders_every_view() {
        let mut usecase = usecase();
        let selection = FilterSelection::new().with(CategoricalField::City, ["Nowhere"]);
        for view in View::ALL {
            let response = usecase.handle(&ViewRequest::new(view, selection.clone())).unwrap();
            assert_eq!(response.filtered_rows, 0);
            assert!(!response.panels.is_empty());
        }
        // loaded once for all twelve requests
        assert_eq!(usecase.source.loads.get(), 1);
    }

    #[test]
    fn test_overview_preview_respects_config() {
        let mut usecase = usecase();
        usecase.config.preview_rows = 2;
        let response = usecase
            .handle(&ViewRequest::new(View::Overview, FilterSelection::new()))
            .unwrap();
        let PanelData::Records { rows } = &response.panels[0].data else {
            panic!("expected records");
        };
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_options_and_reload() {
        let mut usecase = usecase();
        let options = usecase.options().unwrap();
        assert_eq!(options[&CategoricalField::City].len(), 2);

        usecase.reload();
        usecase.preview(1, &FilterSelection::new()).unwrap();
        assert_eq!(usecase.source.loads.get(), 2);
    }
}
