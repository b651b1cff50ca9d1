use ratatui::widgets::ListState;
use salesdash_core::{
    CategoricalField, DashboardUseCase, FilterSelection, Panel, RecordSource, Result, View,
    ViewRequest, ViewResponse,
};
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Views,
    Filters,
}

/// One checkbox in the filter sidebar.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterEntry {
    pub field: CategoricalField,
    pub value: String,
}

pub struct DashboardApp<S: RecordSource> {
    dashboard: DashboardUseCase<S>,
    pub views: ListState,
    pub filters: ListState,
    pub entries: Vec<FilterEntry>,
    pub selection: FilterSelection,
    pub focus: Focus,
    pub response: Option<ViewResponse>,
    pub error: Option<String>,
    pub panel: usize,
}

impl<S: RecordSource> DashboardApp<S> {
    pub fn new(dashboard: DashboardUseCase<S>, view: View) -> Result<Self> {
        let mut views = ListState::default();
        views.select(View::ALL.iter().position(|v| *v == view).or(Some(0)));

        let mut app = Self {
            dashboard,
            views,
            filters: ListState::default(),
            entries: Vec::new(),
            selection: FilterSelection::new(),
            focus: Focus::Views,
            response: None,
            error: None,
            panel: 0,
        };
        app.load_entries()?;
        app.refresh();
        Ok(app)
    }

    fn load_entries(&mut self) -> Result<()> {
        let options = self.dashboard.options()?;
        self.entries = CategoricalField::FILTERABLE
            .iter()
            .filter_map(|field| options.get(field).map(|values| (*field, values)))
            .flat_map(|(field, values)| {
                values.iter().map(move |value| FilterEntry {
                    field,
                    value: value.clone(),
                })
            })
            .collect();

        let selected = match self.filters.selected() {
            _ if self.entries.is_empty() => None,
            Some(i) => Some(i.min(self.entries.len() - 1)),
            None => Some(0),
        };
        self.filters.select(selected);
        Ok(())
    }

    pub fn current_view(&self) -> View {
        self.views
            .selected()
            .and_then(|i| View::ALL.get(i).copied())
            .unwrap_or_default()
    }

    pub fn current_panel(&self) -> Option<&Panel> {
        self.response.as_ref().and_then(|r| r.panels.get(self.panel))
    }

    pub fn panel_count(&self) -> usize {
        self.response.as_ref().map_or(0, |r| r.panels.len())
    }

    /// Reruns the current view against the current selection.
    pub fn refresh(&mut self) {
        let request = ViewRequest::new(self.current_view(), self.selection.clone());
        match self.dashboard.handle(&request) {
            Ok(response) => {
                if self.panel >= response.panels.len() {
                    self.panel = 0;
                }
                self.response = Some(response);
                self.error = None;
            }
            Err(err) => {
                error!("{}", err);
                self.response = None;
                self.error = Some(err.to_string());
            }
        }
    }

    pub fn next(&mut self) {
        match self.focus {
            Focus::Views => {
                let i = step(self.views.selected(), View::ALL.len(), true);
                self.views.select(i);
                self.panel = 0;
                self.refresh();
            }
            Focus::Filters => {
                let i = step(self.filters.selected(), self.entries.len(), true);
                self.filters.select(i);
            }
        }
    }

    pub fn previous(&mut self) {
        match self.focus {
            Focus::Views => {
                let i = step(self.views.selected(), View::ALL.len(), false);
                self.views.select(i);
                self.panel = 0;
                self.refresh();
            }
            Focus::Filters => {
                let i = step(self.filters.selected(), self.entries.len(), false);
                self.filters.select(i);
            }
        }
    }

    pub fn switch_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Views => Focus::Filters,
            Focus::Filters => Focus::Views,
        };
    }

    pub fn toggle_filter(&mut self) {
        if self.focus != Focus::Filters {
            return;
        }
        let Some(entry) = self.filters.selected().and_then(|i| self.entries.get(i)) else {
            return;
        };
        let (field, value) = (entry.field, entry.value.clone());
        self.selection.toggle(field, &value);
        self.refresh();
    }

    pub fn is_checked(&self, entry: &FilterEntry) -> bool {
        self.selection.is_selected(entry.field, &entry.value)
    }

    pub fn clear_filters(&mut self) {
        self.selection.clear_all();
        self.refresh();
    }

    pub fn next_panel(&mut self) {
        let count = self.panel_count();
        if count > 0 {
            self.panel = (self.panel + 1) % count;
        }
    }

    pub fn previous_panel(&mut self) {
        let count = self.panel_count();
        if count > 0 {
            self.panel = (self.panel + count - 1) % count;
        }
    }

    /// Drops the cached records and reads the file again.
    pub fn reload(&mut self) {
        self.dashboard.reload();
        if let Err(err) = self.load_entries() {
            error!("{}", err);
            self.response = None;
            self.error = Some(err.to_string());
            return;
        }
        self.refresh();
    }
}

/// Wrapping list cursor.
fn step(current: Option<usize>, len: usize, forward: bool) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match current {
        Some(i) if forward => {
            if i >= len - 1 {
                0
            } else {
                i + 1
            }
        }
        Some(i) => {
            if i == 0 {
                len - 1
            } else {
                i - 1
            }
        }
        None => 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use salesdash_core::model::{Gender, SourceId};
    use salesdash_core::{Config, PanelData, Record, RecordSet};
    use std::path::PathBuf;

    struct MemorySource(Vec<Record>);

    impl RecordSource for MemorySource {
        fn identity(&self) -> Result<SourceId> {
            Ok(SourceId {
                path: PathBuf::from("/memory/sales.csv"),
                modified: None,
                len: self.0.len() as u64,
            })
        }

        fn load(&self) -> Result<RecordSet> {
            Ok(RecordSet::with_source(self.identity()?, self.0.clone()))
        }
    }

    fn record(city: &str, gender: Gender) -> Record {
        let mut r = Record::new(
            NaiveDate::from_ymd_opt(2019, 2, 8).unwrap(),
            NaiveTime::from_hms_opt(10, 37, 0).unwrap(),
        );
        r.city = city.to_string();
        r.gender = gender;
        r.product_line = "Sports and travel".to_string();
        r.total = 100.0;
        r.payment = Some("Cash".to_string());
        r
    }

    fn app() -> DashboardApp<MemorySource> {
        let source = MemorySource(vec![
            record("Yangon", Gender::Male),
            record("Mandalay", Gender::Female),
            record("Yangon", Gender::Female),
        ]);
        DashboardApp::new(DashboardUseCase::new(source, Config::default()), View::Descriptive).unwrap()
    }

    #[test]
    fn test_entries_cover_filterable_values() {
        let app = app();
        // 2 cities, 2 genders, 1 product line
        assert_eq!(app.entries.len(), 5);
        assert_eq!(app.entries[0].field, CategoricalField::City);
        assert_eq!(app.entries[0].value, "Mandalay");
        assert_eq!(app.current_view(), View::Descriptive);
        assert_eq!(app.response.as_ref().unwrap().filtered_rows, 3);
    }

    #[test]
    fn test_toggle_filter_narrows_response() {
        let mut app = app();
        app.toggle_filter();
        // Focus is on views; nothing changes.
        assert!(app.selection.is_unconstrained());

        app.switch_focus();
        app.next(); // Yangon
        app.toggle_filter();
        assert_eq!(app.response.as_ref().unwrap().filtered_rows, 2);
        assert!(app.is_checked(&app.entries[1]));

        app.toggle_filter();
        assert_eq!(app.response.as_ref().unwrap().filtered_rows, 3);
    }

    #[test]
    fn test_view_navigation_wraps_and_resets_panel() {
        let mut app = app();
        app.next_panel();
        assert_eq!(app.panel, 1);

        app.previous();
        assert_eq!(app.current_view(), View::Overview);
        assert_eq!(app.panel, 0);

        app.previous();
        assert_eq!(app.current_view(), View::GrossIncomeByBranchAndLine);
    }

    #[test]
    fn test_panel_cycle() {
        let mut app = app();
        let count = app.panel_count();
        assert_eq!(count, 4);
        app.previous_panel();
        assert_eq!(app.panel, count - 1);
        app.next_panel();
        assert_eq!(app.panel, 0);
        assert!(matches!(
            app.current_panel().unwrap().data,
            PanelData::Aggregate { .. }
        ));
    }

    #[test]
    fn test_step_empty_list() {
        assert_eq!(step(None, 0, true), None);
        assert_eq!(step(Some(2), 3, true), Some(0));
        assert_eq!(step(Some(0), 3, false), Some(2));
    }
}
