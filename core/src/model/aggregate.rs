use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::field::{CategoricalField, NumericField, TemporalField};
use crate::model::record::Record;

/// One or two categorical fields forming a group key.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grouping {
    pub primary: CategoricalField,
    pub secondary: Option<CategoricalField>,
}

impl Grouping {
    pub fn by(field: CategoricalField) -> Self {
        Self {
            primary: field,
            secondary: None,
        }
    }

    pub fn by_pair(primary: CategoricalField, secondary: CategoricalField) -> Self {
        Self {
            primary,
            secondary: Some(secondary),
        }
    }

    /// `None` when the record lacks a value for any grouping field.
    pub fn key(&self, record: &Record) -> Option<GroupKey> {
        let mut parts = vec![self.primary.value(record)?.to_string()];
        if let Some(secondary) = self.secondary {
            parts.push(secondary.value(record)?.to_string());
        }
        Some(GroupKey(parts))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey(pub Vec<String>);

impl GroupKey {
    pub fn single(value: impl Into<String>) -> Self {
        GroupKey(vec![value.into()])
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" / "))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Key,
    ValueAscending,
    ValueDescending,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum AggregateSpec {
    CountBy {
        field: CategoricalField,
    },
    SumBy {
        target: NumericField,
        group: Grouping,
        #[serde(default)]
        order: SortOrder,
    },
    MeanBy {
        target: NumericField,
        group: Grouping,
        #[serde(default)]
        order: SortOrder,
    },
    CorrelationMatrix {
        fields: Vec<NumericField>,
    },
    TimeseriesSum {
        date: TemporalField,
        value: NumericField,
    },
    Histogram {
        field: NumericField,
        bins: usize,
    },
    BoxSummary {
        target: NumericField,
        group: CategoricalField,
    },
    Describe {
        fields: Vec<NumericField>,
    },
    Scatter {
        x: NumericField,
        y: NumericField,
        z: Option<NumericField>,
        hue: Option<NumericField>,
        color: Option<CategoricalField>,
    },
}

impl AggregateSpec {
    pub fn count_by(field: CategoricalField) -> Self {
        AggregateSpec::CountBy { field }
    }

    pub fn sum_by(target: NumericField, group: Grouping) -> Self {
        AggregateSpec::SumBy {
            target,
            group,
            order: SortOrder::Key,
        }
    }

    pub fn mean_by(target: NumericField, group: Grouping) -> Self {
        AggregateSpec::MeanBy {
            target,
            group,
            order: SortOrder::Key,
        }
    }

    pub fn correlation(fields: impl Into<Vec<NumericField>>) -> Self {
        AggregateSpec::CorrelationMatrix {
            fields: fields.into(),
        }
    }

    pub fn timeseries_sum(date: TemporalField, value: NumericField) -> Self {
        AggregateSpec::TimeseriesSum { date, value }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AggregateSpec::CountBy { .. } => "count_by",
            AggregateSpec::SumBy { .. } => "sum_by",
            AggregateSpec::MeanBy { .. } => "mean_by",
            AggregateSpec::CorrelationMatrix { .. } => "correlation_matrix",
            AggregateSpec::TimeseriesSum { .. } => "timeseries_sum",
            AggregateSpec::Histogram { .. } => "histogram",
            AggregateSpec::BoxSummary { .. } => "box_summary",
            AggregateSpec::Describe { .. } => "describe",
            AggregateSpec::Scatter { .. } => "scatter",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CountValue {
    pub key: String,
    pub count: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GroupValue {
    pub key: GroupKey,
    pub value: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub fields: Vec<NumericField>,
    /// Row-major; `values[i][j]` correlates `fields[i]` with `fields[j]`.
    /// NaN (serialized as null) where a column is constant.
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: NumericField, b: NumericField) -> Option<f64> {
        let i = self.fields.iter().position(|f| *f == a)?;
        let j = self.fields.iter().position(|f| *f == b)?;
        self.values.get(i).and_then(|row| row.get(j)).copied()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub key: String,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub field: NumericField,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub p25: Option<f64>,
    pub p50: Option<f64>,
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
    pub hue: Option<f64>,
    pub label: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum AggregateResult {
    /// Descending by count, ties by key.
    Counts(Vec<CountValue>),
    Groups(Vec<GroupValue>),
    Correlation(CorrelationMatrix),
    /// Ascending by date, one point per distinct bucket.
    Series(Vec<SeriesPoint>),
    Histogram(Vec<HistogramBin>),
    Boxes(Vec<BoxStats>),
    Summary(Vec<ColumnSummary>),
    Points(Vec<ScatterPoint>),
}

impl AggregateResult {
    /// Number of groups, bins, points or matrix rows.
    pub fn len(&self) -> usize {
        match self {
            AggregateResult::Counts(v) => v.len(),
            AggregateResult::Groups(v) => v.len(),
            AggregateResult::Correlation(m) => m.values.len(),
            AggregateResult::Series(v) => v.len(),
            AggregateResult::Histogram(v) => v.len(),
            AggregateResult::Boxes(v) => v.len(),
            AggregateResult::Summary(v) => v.len(),
            AggregateResult::Points(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_serializes_with_op_tag() {
        let spec = AggregateSpec::sum_by(NumericField::Total, Grouping::by(CategoricalField::City));
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["op"], "sum_by");
        assert_eq!(json["target"], "Total");
        assert_eq!(json["group"]["primary"], "City");

        let back: AggregateSpec = serde_json::from_value(json).unwrap();
        assert_eq!(back, spec);
    }

    #[test]
    fn test_group_key_display() {
        let key = GroupKey(vec!["A".to_string(), "Health and beauty".to_string()]);
        assert_eq!(key.to_string(), "A / Health and beauty");
    }
}
