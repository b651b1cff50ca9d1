use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use salesdash_core::model::aggregate::{
    BoxStats, ColumnSummary, CorrelationMatrix, CountValue, GroupValue, HistogramBin, ScatterPoint,
    SeriesPoint,
};
use salesdash_core::{AggregateResult, CategoricalField, PanelData, Record, View, ViewResponse};
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::object::Rows;
use tabled::settings::{Color, Modify, Style};
use tabled::{Table, Tabled};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const MAX_CELL_WIDTH: usize = 24;
const MAX_POINTS: usize = 20;

#[derive(Tabled)]
struct ViewRow {
    #[tabled(rename = "View")]
    name: &'static str,
    #[tabled(rename = "Title")]
    title: &'static str,
}

#[derive(Tabled)]
struct OptionRow {
    #[tabled(rename = "Filter")]
    field: String,
    #[tabled(rename = "Key")]
    key: &'static str,
    #[tabled(rename = "Values")]
    values: String,
}

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Value")]
    key: String,
    #[tabled(rename = "Count")]
    count: usize,
    #[tabled(rename = "Share")]
    share: String,
}

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "Group")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct SeriesRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct BinRow {
    #[tabled(rename = "Range")]
    range: String,
    #[tabled(rename = "Count")]
    count: usize,
}

#[derive(Tabled)]
struct BoxRow {
    #[tabled(rename = "Group")]
    key: String,
    #[tabled(rename = "N")]
    count: usize,
    #[tabled(rename = "Min")]
    min: String,
    #[tabled(rename = "Q1")]
    q1: String,
    #[tabled(rename = "Median")]
    median: String,
    #[tabled(rename = "Q3")]
    q3: String,
    #[tabled(rename = "Max")]
    max: String,
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Column")]
    field: String,
    #[tabled(rename = "count")]
    count: usize,
    #[tabled(rename = "mean")]
    mean: String,
    #[tabled(rename = "std")]
    std: String,
    #[tabled(rename = "min")]
    min: String,
    #[tabled(rename = "25%")]
    p25: String,
    #[tabled(rename = "50%")]
    p50: String,
    #[tabled(rename = "75%")]
    p75: String,
    #[tabled(rename = "max")]
    max: String,
}

#[derive(Tabled)]
struct PointRow {
    x: String,
    y: String,
    z: String,
    hue: String,
    label: String,
}

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "Invoice")]
    invoice: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Br")]
    branch: String,
    #[tabled(rename = "City")]
    city: String,
    #[tabled(rename = "Customer")]
    customer: String,
    #[tabled(rename = "Gender")]
    gender: String,
    #[tabled(rename = "Product line")]
    product_line: String,
    #[tabled(rename = "Qty")]
    quantity: u32,
    #[tabled(rename = "Total")]
    total: String,
    #[tabled(rename = "Payment")]
    payment: String,
    #[tabled(rename = "Rating")]
    rating: String,
}

fn styled(mut table: Table) -> Table {
    table
        .with(Style::modern())
        .with(Modify::new(Rows::first()).with(Color::FG_CYAN));
    table
}

fn print_table<T: Tabled>(rows: Vec<T>) {
    println!("{}", styled(Table::new(rows)));
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Cuts `text` to at most `max` terminal columns, marking the cut with `…`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

pub fn number(value: f64) -> String {
    if value.is_nan() {
        "-".to_string()
    } else {
        format!("{:.2}", value)
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(number).unwrap_or_else(|| "-".to_string())
}

pub fn print_views() {
    let rows = View::ALL
        .iter()
        .map(|v| ViewRow {
            name: v.name(),
            title: v.title(),
        })
        .collect();
    print_table::<ViewRow>(rows);
}

pub fn print_options(options: &BTreeMap<CategoricalField, BTreeSet<String>>) {
    let rows = options
        .iter()
        .map(|(field, values)| OptionRow {
            field: field.column().to_string(),
            key: field.key(),
            values: values.iter().cloned().collect::<Vec<_>>().join(", "),
        })
        .collect();
    print_table::<OptionRow>(rows);
}

pub fn print_response(response: &ViewResponse) {
    println!(
        "\x1b[1;36m{}\x1b[0m ({} of {} rows)",
        response.title, response.filtered_rows, response.total_rows
    );
    for panel in &response.panels {
        println!("\n\x1b[1m{}\x1b[0m [{:?}]", panel.title, panel.chart);
        print_panel(&panel.data);
    }
}

pub fn print_panel(data: &PanelData) {
    match data {
        PanelData::Aggregate { result } => print_result(result),
        PanelData::Records { rows } => print_records(rows),
        PanelData::Columns { names } => println!("{}", names.join(", ")),
        PanelData::NoData { reason } => println!("No data: {}", reason),
    }
}

pub fn print_result(result: &AggregateResult) {
    if result.is_empty() {
        println!("No rows match the current filters.");
        return;
    }
    match result {
        AggregateResult::Counts(counts) => print_table(count_rows(counts)),
        AggregateResult::Groups(groups) => print_table(group_rows(groups)),
        AggregateResult::Correlation(matrix) => println!("{}", correlation_table(matrix)),
        AggregateResult::Series(points) => print_table(series_rows(points)),
        AggregateResult::Histogram(bins) => print_table(bin_rows(bins)),
        AggregateResult::Boxes(boxes) => print_table(box_rows(boxes)),
        AggregateResult::Summary(columns) => print_table(summary_rows(columns)),
        AggregateResult::Points(points) => {
            print_table(point_rows(points));
            if points.len() > MAX_POINTS {
                println!("... {} more points", points.len() - MAX_POINTS);
            }
        }
    }
}

pub fn print_records(records: &[Record]) {
    if records.is_empty() {
        println!("No rows match the current filters.");
        return;
    }
    print_table(record_rows(records));
}

fn count_rows(counts: &[CountValue]) -> Vec<CountRow> {
    let total: usize = counts.iter().map(|c| c.count).sum();
    counts
        .iter()
        .map(|c| CountRow {
            key: truncate(&c.key, MAX_CELL_WIDTH),
            count: c.count,
            share: format!("{:.1}%", 100.0 * c.count as f64 / total.max(1) as f64),
        })
        .collect()
}

fn group_rows(groups: &[GroupValue]) -> Vec<GroupRow> {
    groups
        .iter()
        .map(|g| GroupRow {
            key: truncate(&g.key.to_string(), 2 * MAX_CELL_WIDTH),
            value: number(g.value),
        })
        .collect()
}

fn series_rows(points: &[SeriesPoint]) -> Vec<SeriesRow> {
    points
        .iter()
        .map(|p| SeriesRow {
            date: p.date.format("%Y-%m-%d").to_string(),
            value: number(p.value),
        })
        .collect()
}

fn bin_rows(bins: &[HistogramBin]) -> Vec<BinRow> {
    let last = bins.len().saturating_sub(1);
    bins.iter()
        .enumerate()
        .map(|(i, b)| BinRow {
            range: format!(
                "[{}, {}{}",
                number(b.lower),
                number(b.upper),
                if i == last { "]" } else { ")" }
            ),
            count: b.count,
        })
        .collect()
}

fn box_rows(boxes: &[BoxStats]) -> Vec<BoxRow> {
    boxes
        .iter()
        .map(|b| BoxRow {
            key: truncate(&b.key, MAX_CELL_WIDTH),
            count: b.count,
            min: number(b.min),
            q1: number(b.q1),
            median: number(b.median),
            q3: number(b.q3),
            max: number(b.max),
        })
        .collect()
}

fn summary_rows(columns: &[ColumnSummary]) -> Vec<SummaryRow> {
    columns
        .iter()
        .map(|c| SummaryRow {
            field: c.field.column().to_string(),
            count: c.count,
            mean: optional(c.mean),
            std: optional(c.std),
            min: optional(c.min),
            p25: optional(c.p25),
            p50: optional(c.p50),
            p75: optional(c.p75),
            max: optional(c.max),
        })
        .collect()
}

fn point_rows(points: &[ScatterPoint]) -> Vec<PointRow> {
    points
        .iter()
        .take(MAX_POINTS)
        .map(|p| PointRow {
            x: number(p.x),
            y: number(p.y),
            z: optional(p.z),
            hue: optional(p.hue),
            label: p.label.clone().unwrap_or_else(|| "-".to_string()),
        })
        .collect()
}

fn record_rows(records: &[Record]) -> Vec<RecordRow> {
    records
        .iter()
        .map(|r| RecordRow {
            invoice: r.invoice_id.clone().unwrap_or_else(|| "-".to_string()),
            date: r.date.format("%Y-%m-%d").to_string(),
            time: r.time.format("%H:%M").to_string(),
            branch: r.branch.clone(),
            city: truncate(&r.city, MAX_CELL_WIDTH),
            customer: r.customer_type.to_string(),
            gender: r.gender.to_string(),
            product_line: truncate(&r.product_line, MAX_CELL_WIDTH),
            quantity: r.quantity,
            total: number(r.total),
            payment: r.payment.clone().unwrap_or_else(|| "-".to_string()),
            rating: format!("{:.1}", r.rating),
        })
        .collect()
}

fn correlation_table(matrix: &CorrelationMatrix) -> Table {
    let mut builder = Builder::default();
    builder.push_record(
        std::iter::once(String::new()).chain(matrix.fields.iter().map(|f| f.column().to_string())),
    );
    for (field, row) in matrix.fields.iter().zip(&matrix.values) {
        builder.push_record(
            std::iter::once(field.column().to_string()).chain(row.iter().map(|v| number(*v))),
        );
    }
    styled(builder.build())
}
