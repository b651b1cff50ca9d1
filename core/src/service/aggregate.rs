use std::borrow::Borrow;
use std::collections::BTreeMap;

use crate::error::{PipelineError, Result};
use crate::model::aggregate::{
    BoxStats, ColumnSummary, CorrelationMatrix, CountValue, GroupValue, HistogramBin,
    ScatterPoint, SeriesPoint,
};
use crate::model::{
    AggregateResult, AggregateSpec, CategoricalField, GroupKey, Grouping, NumericField, Record,
    SortOrder, TemporalField,
};

/// Computes one aggregate over already-filtered records.
///
/// An empty input yields an empty result for every kind. The only data-dependent
/// error is `InsufficientData` for a correlation over a single row.
pub fn aggregate<R: Borrow<Record>>(records: &[R], spec: &AggregateSpec) -> Result<AggregateResult> {
    match spec {
        AggregateSpec::CountBy { field } => Ok(AggregateResult::Counts(count_by(records, *field))),
        AggregateSpec::SumBy {
            target,
            group,
            order,
        } => Ok(AggregateResult::Groups(sort_groups(
            sum_by(records, *target, group),
            *order,
        ))),
        AggregateSpec::MeanBy {
            target,
            group,
            order,
        } => Ok(AggregateResult::Groups(sort_groups(
            mean_by(records, *target, group),
            *order,
        ))),
        AggregateSpec::CorrelationMatrix { fields } => {
            correlation_matrix(records, fields).map(AggregateResult::Correlation)
        }
        AggregateSpec::TimeseriesSum { date, value } => {
            Ok(AggregateResult::Series(timeseries_sum(records, *date, *value)))
        }
        AggregateSpec::Histogram { field, bins } => {
            histogram(records, *field, *bins).map(AggregateResult::Histogram)
        }
        AggregateSpec::BoxSummary { target, group } => {
            Ok(AggregateResult::Boxes(box_summary(records, *target, *group)))
        }
        AggregateSpec::Describe { fields } => Ok(AggregateResult::Summary(describe(records, fields))),
        AggregateSpec::Scatter {
            x,
            y,
            z,
            hue,
            color,
        } => Ok(AggregateResult::Points(scatter(records, *x, *y, *z, *hue, *color))),
    }
}

/// Frequency of each distinct value, most frequent first.
pub fn count_by<R: Borrow<Record>>(records: &[R], field: CategoricalField) -> Vec<CountValue> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        if let Some(value) = field.value(record.borrow()) {
            *counts.entry(value).or_default() += 1;
        }
    }

    let mut result: Vec<CountValue> = counts
        .into_iter()
        .map(|(key, count)| CountValue {
            key: key.to_string(),
            count,
        })
        .collect();
    // Stable sort keeps the key order among equal counts.
    result.sort_by(|a, b| b.count.cmp(&a.count));
    result
}

pub fn sum_by<R: Borrow<Record>>(records: &[R], target: NumericField, group: &Grouping) -> Vec<GroupValue> {
    accumulate(records, target, group)
        .into_iter()
        .map(|(key, (sum, _))| GroupValue { key, value: sum })
        .collect()
}

/// Mean per group. NaN for a group whose target is missing on every row.
pub fn mean_by<R: Borrow<Record>>(records: &[R], target: NumericField, group: &Grouping) -> Vec<GroupValue> {
    accumulate(records, target, group)
        .into_iter()
        .map(|(key, (sum, n))| GroupValue {
            key,
            value: if n == 0 { f64::NAN } else { sum / n as f64 },
        })
        .collect()
}

// Every keyed record creates its group, even when the target is missing,
// so the key set matches the values present.
fn accumulate<R: Borrow<Record>>(
    records: &[R],
    target: NumericField,
    group: &Grouping,
) -> BTreeMap<GroupKey, (f64, usize)> {
    let mut groups: BTreeMap<GroupKey, (f64, usize)> = BTreeMap::new();
    for record in records {
        let record: &Record = record.borrow();
        let Some(key) = group.key(record) else {
            continue;
        };
        let entry = groups.entry(key).or_insert((0.0, 0));
        if let Some(value) = target.value(record) {
            entry.0 += value;
            entry.1 += 1;
        }
    }
    groups
}

pub fn sort_groups(mut groups: Vec<GroupValue>, order: SortOrder) -> Vec<GroupValue> {
    match order {
        SortOrder::Key => groups.sort_by(|a, b| a.key.cmp(&b.key)),
        SortOrder::ValueAscending => groups.sort_by(|a, b| a.value.total_cmp(&b.value)),
        SortOrder::ValueDescending => groups.sort_by(|a, b| b.value.total_cmp(&a.value)),
    }
    groups
}

/// Pairwise Pearson correlation. Each cell uses the rows where both fields
/// have a value, so a sparse column does not shrink the others.
///
/// Symmetric; the diagonal is 1.0 unless the column is constant or has fewer
/// than two values, in which case its whole row and column are NaN.
pub fn correlation_matrix<R: Borrow<Record>>(
    records: &[R],
    fields: &[NumericField],
) -> Result<CorrelationMatrix> {
    if records.is_empty() {
        return Ok(CorrelationMatrix {
            fields: Vec::new(),
            values: Vec::new(),
        });
    }
    if records.len() < 2 {
        return Err(PipelineError::InsufficientData {
            operation: "correlation_matrix",
            rows: records.len(),
        });
    }

    let rows: Vec<&Record> = records.iter().map(|r| r.borrow()).collect();
    let columns: Vec<Vec<Option<f64>>> = fields
        .iter()
        .map(|f| rows.iter().map(|r| f.value(r)).collect())
        .collect();

    let n = fields.len();
    let mut values = vec![vec![f64::NAN; n]; n];
    for i in 0..n {
        for j in i..n {
            let (xs, ys): (Vec<f64>, Vec<f64>) = columns[i]
                .iter()
                .zip(&columns[j])
                .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
                .unzip();
            let r = if xs.len() < 2 {
                f64::NAN
            } else if i == j {
                if sum_sq_dev(&xs) > 0.0 { 1.0 } else { f64::NAN }
            } else {
                pearson(&xs, &ys)
            };
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(CorrelationMatrix {
        fields: fields.to_vec(),
        values,
    })
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

// Sum of squared deviations from the mean.
fn sum_sq_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum()
}

fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let mx = mean(xs);
    let my = mean(ys);
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mx;
        let dy = y - my;
        cov += dx * dy;
        vx += dx * dx;
        vy += dy * dy;
    }
    if vx == 0.0 || vy == 0.0 {
        return f64::NAN;
    }
    (cov / (vx.sqrt() * vy.sqrt())).clamp(-1.0, 1.0)
}

/// Sum per distinct date bucket, oldest first.
pub fn timeseries_sum<R: Borrow<Record>>(
    records: &[R],
    date: TemporalField,
    value: NumericField,
) -> Vec<SeriesPoint> {
    let mut buckets = BTreeMap::new();
    for record in records {
        let record: &Record = record.borrow();
        let entry = buckets.entry(date.bucket(record)).or_insert(0.0);
        if let Some(v) = value.value(record) {
            *entry += v;
        }
    }
    buckets
        .into_iter()
        .map(|(date, value)| SeriesPoint { date, value })
        .collect()
}

/// Upper bound on histogram bins; one counter is allocated per bin.
pub const MAX_HISTOGRAM_BINS: usize = 10_000;

/// Equal-width bins over `[min, max]`, the last bin closed on both ends.
/// Constant data is centered in `[v - 0.5, v + 0.5]`.
pub fn histogram<R: Borrow<Record>>(
    records: &[R],
    field: NumericField,
    bins: usize,
) -> Result<Vec<HistogramBin>> {
    if bins == 0 {
        return Err(PipelineError::InvalidRequest(
            "histogram needs at least one bin".to_string(),
        ));
    }
    if bins > MAX_HISTOGRAM_BINS {
        return Err(PipelineError::InvalidRequest(format!(
            "histogram bins {} exceeds the limit of {}",
            bins, MAX_HISTOGRAM_BINS
        )));
    }

    let values: Vec<f64> = records
        .iter()
        .filter_map(|r| field.value(r.borrow()))
        .collect();
    if values.is_empty() {
        return Ok(Vec::new());
    }

    let (mut lo, mut hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0usize; bins];
    for v in &values {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    Ok(counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: lo + width * i as f64,
            upper: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count,
        })
        .collect())
}

/// Five-number summary per group, ordered by key.
pub fn box_summary<R: Borrow<Record>>(
    records: &[R],
    target: NumericField,
    group: CategoricalField,
) -> Vec<BoxStats> {
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for record in records {
        let record: &Record = record.borrow();
        if let (Some(key), Some(value)) = (group.value(record), target.value(record)) {
            groups.entry(key).or_default().push(value);
        }
    }

    groups
        .into_iter()
        .map(|(key, mut values)| {
            values.sort_by(f64::total_cmp);
            BoxStats {
                key: key.to_string(),
                count: values.len(),
                min: values[0],
                q1: quantile(&values, 0.25),
                median: quantile(&values, 0.5),
                q3: quantile(&values, 0.75),
                max: values[values.len() - 1],
            }
        })
        .collect()
}

/// Linear interpolation between closest ranks. `sorted` must be non-empty and ascending.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (pos - lower as f64)
}

pub fn describe<R: Borrow<Record>>(records: &[R], fields: &[NumericField]) -> Vec<ColumnSummary> {
    fields
        .iter()
        .map(|field| {
            let mut values: Vec<f64> = records
                .iter()
                .filter_map(|r| field.value(r.borrow()))
                .collect();
            values.sort_by(f64::total_cmp);
            let count = values.len();

            if count == 0 {
                return ColumnSummary {
                    field: *field,
                    count,
                    mean: None,
                    std: None,
                    min: None,
                    p25: None,
                    p50: None,
                    p75: None,
                    max: None,
                };
            }

            let std = if count > 1 {
                Some((sum_sq_dev(&values) / (count - 1) as f64).sqrt())
            } else {
                None
            };

            ColumnSummary {
                field: *field,
                count,
                mean: Some(mean(&values)),
                std,
                min: values.first().copied(),
                p25: Some(quantile(&values, 0.25)),
                p50: Some(quantile(&values, 0.5)),
                p75: Some(quantile(&values, 0.75)),
                max: values.last().copied(),
            }
        })
        .collect()
}

/// Point cloud for 2-D and 3-D scatter plots. Rows missing a requested axis are skipped.
pub fn scatter<R: Borrow<Record>>(
    records: &[R],
    x: NumericField,
    y: NumericField,
    z: Option<NumericField>,
    hue: Option<NumericField>,
    color: Option<CategoricalField>,
) -> Vec<ScatterPoint> {
    records
        .iter()
        .filter_map(|r| {
            let r: &Record = r.borrow();
            let z = match z {
                Some(field) => Some(field.value(r)?),
                None => None,
            };
            Some(ScatterPoint {
                x: x.value(r)?,
                y: y.value(r)?,
                z,
                hue: hue.and_then(|f| f.value(r)),
                label: color.and_then(|f| f.value(r)).map(str::to_string),
            })
        })
        .collect()
}
