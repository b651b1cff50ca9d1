use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::input::expand_key;
use crate::model::{
    AggregateSpec, CategoricalField, Grouping, NumericField, SortOrder, TemporalField,
};
use crate::service::dto::{AxisBindings, ChartKind};

/// The dashboard sections offered in the sidebar menu.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    Overview,
    Descriptive,
    Relationships,
    Scatter3d,
    SalesOverTime,
    IncomeByProductLine,
    RatingDistribution,
    SpendByCustomerType,
    CostVsGrossIncome,
    PaymentMethods,
    NumericCorrelation,
    GrossIncomeByBranchAndLine,
}

impl Default for View {
    fn default() -> Self {
        View::Overview
    }
}

impl View {
    pub const ALL: [View; 12] = [
        View::Overview,
        View::Descriptive,
        View::Relationships,
        View::Scatter3d,
        View::SalesOverTime,
        View::IncomeByProductLine,
        View::RatingDistribution,
        View::SpendByCustomerType,
        View::CostVsGrossIncome,
        View::PaymentMethods,
        View::NumericCorrelation,
        View::GrossIncomeByBranchAndLine,
    ];

    pub fn name(self) -> &'static str {
        match self {
            View::Overview => "overview",
            View::Descriptive => "descriptive",
            View::Relationships => "relationships",
            View::Scatter3d => "scatter3d",
            View::SalesOverTime => "sales-over-time",
            View::IncomeByProductLine => "income-by-product-line",
            View::RatingDistribution => "rating-distribution",
            View::SpendByCustomerType => "spend-by-customer-type",
            View::CostVsGrossIncome => "cost-vs-gross-income",
            View::PaymentMethods => "payment-methods",
            View::NumericCorrelation => "numeric-correlation",
            View::GrossIncomeByBranchAndLine => "gross-income-by-branch-and-line",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            View::Overview => "Dataset overview",
            View::Descriptive => "Most frequent categories",
            View::Relationships => "Relationships and distributions",
            View::Scatter3d => "Total vs Quantity vs Rating (3D)",
            View::SalesOverTime => "Total sales over time",
            View::IncomeByProductLine => "Income by product line",
            View::RatingDistribution => "Customer rating distribution",
            View::SpendByCustomerType => "Spend by customer type",
            View::CostVsGrossIncome => "Cost vs gross income",
            View::PaymentMethods => "Preferred payment methods",
            View::NumericCorrelation => "Correlation between numeric variables",
            View::GrossIncomeByBranchAndLine => "Gross income by branch and product line",
        }
    }

    /// The panels this view renders, in display order.
    pub fn panels(self, preview_rows: usize) -> Vec<PanelSpec> {
        use CategoricalField as C;
        use NumericField as N;

        match self {
            View::Overview => vec![
                PanelSpec::new("Data preview", ChartKind::Table, PanelSource::Preview(preview_rows)),
                PanelSpec::aggregate(
                    "Summary statistics",
                    ChartKind::Table,
                    AggregateSpec::Describe {
                        fields: N::ALL.to_vec(),
                    },
                ),
                PanelSpec::new("Available columns", ChartKind::Table, PanelSource::Columns),
            ],
            View::Descriptive => [C::Gender, C::CustomerType, C::Payment, C::City]
                .into_iter()
                .map(|field| {
                    PanelSpec::aggregate(field.column(), ChartKind::Bar, AggregateSpec::count_by(field))
                        .axes(AxisBindings::xy(field.column(), "count"))
                })
                .collect(),
            View::Relationships => vec![
                PanelSpec::aggregate(
                    "Total by payment method",
                    ChartKind::Box,
                    AggregateSpec::BoxSummary {
                        target: N::Total,
                        group: C::Payment,
                    },
                )
                .axes(AxisBindings::xy(C::Payment.column(), N::Total.column())),
                PanelSpec::aggregate(
                    "Total vs Quantity by Rating",
                    ChartKind::Scatter,
                    AggregateSpec::Scatter {
                        x: N::Total,
                        y: N::Quantity,
                        z: None,
                        hue: Some(N::Rating),
                        color: None,
                    },
                )
                .axes(AxisBindings::xy(N::Total.column(), N::Quantity.column()).with_color(N::Rating.column())),
                PanelSpec::aggregate(
                    "Rating distribution",
                    ChartKind::Histogram,
                    AggregateSpec::Histogram {
                        field: N::Rating,
                        bins: 10,
                    },
                )
                .axes(AxisBindings::xy(N::Rating.column(), "count")),
            ],
            View::Scatter3d => vec![PanelSpec::aggregate(
                self.title(),
                ChartKind::Scatter3d,
                AggregateSpec::Scatter {
                    x: N::Total,
                    y: N::Quantity,
                    z: Some(N::Rating),
                    hue: Some(N::Rating),
                    color: None,
                },
            )
            .axes(
                AxisBindings::xy(N::Total.column(), N::Quantity.column())
                    .with_z(N::Rating.column())
                    .with_color(N::Rating.column()),
            )],
            View::SalesOverTime => vec![PanelSpec::aggregate(
                "Total sales per day",
                ChartKind::Line,
                AggregateSpec::timeseries_sum(TemporalField::Date, N::Total),
            )
            .axes(AxisBindings::xy(TemporalField::Date.column(), N::Total.column()))],
            View::IncomeByProductLine => vec![PanelSpec::aggregate(
                self.title(),
                ChartKind::HorizontalBar,
                AggregateSpec::SumBy {
                    target: N::Total,
                    group: Grouping::by(C::ProductLine),
                    order: SortOrder::ValueAscending,
                },
            )
            .axes(AxisBindings::xy(N::Total.column(), C::ProductLine.column()))],
            View::RatingDistribution => vec![PanelSpec::aggregate(
                self.title(),
                ChartKind::Histogram,
                AggregateSpec::Histogram {
                    field: N::Rating,
                    bins: 20,
                },
            )
            .axes(AxisBindings::xy(N::Rating.column(), "count"))],
            View::SpendByCustomerType => vec![PanelSpec::aggregate(
                self.title(),
                ChartKind::Box,
                AggregateSpec::BoxSummary {
                    target: N::Total,
                    group: C::CustomerType,
                },
            )
            .axes(
                AxisBindings::xy(C::CustomerType.column(), N::Total.column())
                    .with_color(C::CustomerType.column()),
            )],
            View::CostVsGrossIncome => vec![PanelSpec::aggregate(
                self.title(),
                ChartKind::Scatter,
                AggregateSpec::Scatter {
                    x: N::Cogs,
                    y: N::GrossIncome,
                    z: None,
                    hue: None,
                    color: Some(C::Branch),
                },
            )
            .axes(AxisBindings::xy(N::Cogs.column(), N::GrossIncome.column()).with_color(C::Branch.column()))],
            View::PaymentMethods => vec![PanelSpec::aggregate(
                self.title(),
                ChartKind::Pie,
                AggregateSpec::count_by(C::Payment),
            )
            .axes(AxisBindings {
                color: Some(C::Payment.column().to_string()),
                ..AxisBindings::default()
            })],
            View::NumericCorrelation => vec![PanelSpec::aggregate(
                self.title(),
                ChartKind::Heatmap,
                AggregateSpec::correlation(N::CORRELATED),
            )],
            View::GrossIncomeByBranchAndLine => vec![PanelSpec::aggregate(
                self.title(),
                ChartKind::Sunburst,
                AggregateSpec::sum_by(N::GrossIncome, Grouping::by_pair(C::Branch, C::ProductLine)),
            )
            .axes(AxisBindings {
                color: Some(C::Branch.column().to_string()),
                ..AxisBindings::default()
            })],
        }
    }
}

impl FromStr for View {
    type Err = PipelineError;

    /// Accepts a view name or any unique prefix of one.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let names: Vec<&str> = View::ALL.iter().map(|v| v.name()).collect();
        let full = expand_key(&s.to_lowercase(), &names)?;
        View::ALL
            .into_iter()
            .find(|v| v.name() == full)
            .ok_or_else(|| PipelineError::InvalidRequest(format!("unknown view '{}'", s)))
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanelSource {
    Aggregate(AggregateSpec),
    /// The first N filtered records.
    Preview(usize),
    Columns,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelSpec {
    pub title: String,
    pub chart: ChartKind,
    pub axes: AxisBindings,
    pub source: PanelSource,
}

impl PanelSpec {
    pub fn new(title: impl Into<String>, chart: ChartKind, source: PanelSource) -> Self {
        Self {
            title: title.into(),
            chart,
            axes: AxisBindings::default(),
            source,
        }
    }

    pub fn aggregate(title: impl Into<String>, chart: ChartKind, spec: AggregateSpec) -> Self {
        Self::new(title, chart, PanelSource::Aggregate(spec))
    }

    pub fn axes(mut self, axes: AxisBindings) -> Self {
        self.axes = axes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_names_round_trip() {
        for view in View::ALL {
            assert_eq!(view.name().parse::<View>().unwrap(), view);
        }
    }

    #[test]
    fn test_view_prefix() {
        assert_eq!("sales".parse::<View>().unwrap(), View::SalesOverTime);
        assert_eq!("NUMERIC".parse::<View>().unwrap(), View::NumericCorrelation);
        assert!("s".parse::<View>().is_err());
    }

    #[test]
    fn test_every_view_has_panels() {
        for view in View::ALL {
            assert!(!view.panels(5).is_empty(), "{} has no panels", view);
        }
        assert_eq!(View::Descriptive.panels(5).len(), 4);
    }

    #[test]
    fn test_serde_uses_kebab_case() {
        let json = serde_json::to_string(&View::GrossIncomeByBranchAndLine).unwrap();
        assert_eq!(json, "\"gross-income-by-branch-and-line\"");
    }
}
