use serde::{Deserialize, Serialize};

use crate::model::{AggregateResult, FilterSelection, Record};
use crate::usecase::views::View;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Table,
    Bar,
    HorizontalBar,
    Line,
    Box,
    Scatter,
    Scatter3d,
    Histogram,
    Heatmap,
    Pie,
    Sunburst,
}

/// Which column drives each visual channel.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AxisBindings {
    pub x: Option<String>,
    pub y: Option<String>,
    pub z: Option<String>,
    pub color: Option<String>,
}

impl AxisBindings {
    pub fn xy(x: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            x: Some(x.into()),
            y: Some(y.into()),
            ..Self::default()
        }
    }

    pub fn with_z(mut self, z: impl Into<String>) -> Self {
        self.z = Some(z.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PanelData {
    Aggregate { result: AggregateResult },
    Records { rows: Vec<Record> },
    Columns { names: Vec<String> },
    /// The aggregate is undefined for the current filter; render a placeholder.
    NoData { reason: String },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Panel {
    pub title: String,
    pub chart: ChartKind,
    pub axes: AxisBindings,
    pub data: PanelData,
}

/// One UI event: the view to render and the current widget state.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ViewRequest {
    pub view: View,
    #[serde(default)]
    pub selection: FilterSelection,
}

impl ViewRequest {
    pub fn new(view: View, selection: FilterSelection) -> Self {
        Self { view, selection }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ViewResponse {
    pub view: View,
    pub title: String,
    pub total_rows: usize,
    pub filtered_rows: usize,
    pub panels: Vec<Panel>,
}
