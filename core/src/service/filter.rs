use std::collections::{BTreeMap, BTreeSet};

use crate::model::{CategoricalField, FilterSelection, Record, RecordSet};

/// Rows whose constrained fields all hold an allowed value, in input order.
pub fn filter<'a>(records: &'a [Record], selection: &FilterSelection) -> Vec<&'a Record> {
    records.iter().filter(|r| selection.matches(r)).collect()
}

/// Owned variant of [`filter`] that keeps the source identity.
pub fn filter_set(set: &RecordSet, selection: &FilterSelection) -> RecordSet {
    let records = filter(set.records(), selection)
        .into_iter()
        .cloned()
        .collect();
    match set.source() {
        Some(source) => RecordSet::with_source(source.clone(), records),
        None => RecordSet::new(records),
    }
}

/// Distinct values of `field`, the options offered by a filter widget.
pub fn observed_values<'a, I>(records: I, field: CategoricalField) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a Record>,
{
    records
        .into_iter()
        .filter_map(|r| field.value(r))
        .map(str::to_string)
        .collect()
}

/// Widget options for every filterable field.
pub fn filter_options(records: &[Record]) -> BTreeMap<CategoricalField, BTreeSet<String>> {
    CategoricalField::FILTERABLE
        .into_iter()
        .map(|field| (field, observed_values(records, field)))
        .collect()
}
