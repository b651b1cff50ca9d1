use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::model::field::CategoricalField;
use crate::model::record::Record;

/// Allowed values per categorical field.
///
/// A field that is absent, or present with an empty set, imposes no
/// constraint: an untouched multiselect shows every row rather than none.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct FilterSelection {
    allowed: BTreeMap<CategoricalField, BTreeSet<String>>,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<I, S>(mut self, field: CategoricalField, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set(field, values);
        self
    }

    pub fn set<I, S>(&mut self, field: CategoricalField, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed
            .insert(field, values.into_iter().map(Into::into).collect());
    }

    pub fn allow(&mut self, field: CategoricalField, value: impl Into<String>) {
        self.allowed.entry(field).or_default().insert(value.into());
    }

    /// Adds the value if missing, removes it otherwise. Returns whether it is now allowed.
    pub fn toggle(&mut self, field: CategoricalField, value: &str) -> bool {
        let values = self.allowed.entry(field).or_default();
        if values.remove(value) {
            if values.is_empty() {
                self.allowed.remove(&field);
            }
            false
        } else {
            values.insert(value.to_string());
            true
        }
    }

    pub fn clear(&mut self, field: CategoricalField) {
        self.allowed.remove(&field);
    }

    pub fn clear_all(&mut self) {
        self.allowed.clear();
    }

    pub fn get(&self, field: CategoricalField) -> Option<&BTreeSet<String>> {
        self.allowed.get(&field)
    }

    pub fn is_selected(&self, field: CategoricalField, value: &str) -> bool {
        self.allowed
            .get(&field)
            .map(|values| values.contains(value))
            .unwrap_or(false)
    }

    /// True when no field constrains anything.
    pub fn is_unconstrained(&self) -> bool {
        self.allowed.values().all(BTreeSet::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CategoricalField, &BTreeSet<String>)> {
        self.allowed.iter().map(|(field, values)| (*field, values))
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.allowed.iter().all(|(field, values)| {
            values.is_empty()
                || field
                    .value(record)
                    .map(|v| values.contains(v))
                    .unwrap_or(false)
        })
    }

    /// The explicit "everything observed" selection for the filterable fields.
    pub fn all_observed<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut selection = Self::new();
        for record in records {
            for field in CategoricalField::FILTERABLE {
                if let Some(value) = field.value(record) {
                    selection.allow(field, value);
                }
            }
        }
        selection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn record(city: &str) -> Record {
        let mut r = Record::new(
            NaiveDate::from_ymd_opt(2019, 1, 5).unwrap(),
            NaiveTime::from_hms_opt(13, 8, 0).unwrap(),
        );
        r.city = city.to_string();
        r
    }

    #[test]
    fn test_empty_set_allows_all() {
        let selection = FilterSelection::new().with(CategoricalField::City, Vec::<String>::new());
        assert!(selection.matches(&record("Yangon")));
        assert!(selection.is_unconstrained());
    }

    #[test]
    fn test_toggle_round_trip_removes_field() {
        let mut selection = FilterSelection::new();
        assert!(selection.toggle(CategoricalField::City, "Yangon"));
        assert!(selection.is_selected(CategoricalField::City, "Yangon"));
        assert!(!selection.matches(&record("Mandalay")));

        assert!(!selection.toggle(CategoricalField::City, "Yangon"));
        assert!(selection.get(CategoricalField::City).is_none());
        assert!(selection.matches(&record("Mandalay")));
    }

    #[test]
    fn test_missing_optional_value_fails_constraint() {
        let selection = FilterSelection::new().with(CategoricalField::Payment, ["Cash"]);
        assert!(!selection.matches(&record("Yangon")));
    }

    #[test]
    fn test_all_observed_collects_filterable_fields() {
        let records = vec![record("Yangon"), record("Naypyitaw")];
        let selection = FilterSelection::all_observed(&records);
        let cities = selection.get(CategoricalField::City).unwrap();
        assert_eq!(cities.len(), 2);
        assert!(selection.get(CategoricalField::Branch).is_none());
    }
}
