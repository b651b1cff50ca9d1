use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::model::source::SourceId;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CustomerType {
    Member,
    Normal,
}

impl Default for CustomerType {
    fn default() -> Self {
        CustomerType::Normal
    }
}

impl CustomerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerType::Member => "Member",
            CustomerType::Normal => "Normal",
        }
    }
}

impl FromStr for CustomerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Member" => Ok(CustomerType::Member),
            "Normal" => Ok(CustomerType::Normal),
            other => Err(format!("unknown customer type '{}'", other)),
        }
    }
}

impl fmt::Display for CustomerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Gender {
    Male,
    Female,
}

impl Default for Gender {
    fn default() -> Self {
        Gender::Female
    }
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Male" => Ok(Gender::Male),
            "Female" => Ok(Gender::Female),
            other => Err(format!("unknown gender '{}'", other)),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sales transaction.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Record {
    pub invoice_id: Option<String>,
    pub branch: String,
    pub city: String,
    pub customer_type: CustomerType,
    pub gender: Gender,
    pub product_line: String,
    pub unit_price: f64,
    pub quantity: u32,
    pub tax: f64,
    pub total: f64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub payment: Option<String>,
    pub cogs: f64,
    pub gross_margin_percentage: Option<f64>,
    pub gross_income: f64,
    pub rating: f64,

    // Derived from `date` when the record is built.
    pub month: u32,
    pub day: u32,
}

impl Record {
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            invoice_id: None,
            branch: String::new(),
            city: String::new(),
            customer_type: CustomerType::default(),
            gender: Gender::default(),
            product_line: String::new(),
            unit_price: 0.0,
            quantity: 0,
            tax: 0.0,
            total: 0.0,
            date,
            time,
            payment: None,
            cogs: 0.0,
            gross_margin_percentage: None,
            gross_income: 0.0,
            rating: 0.0,
            month: date.month(),
            day: date.day(),
        }
    }
}

/// The loaded transactions, in source order. Never mutated after load.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    source: Option<SourceId>,
    records: Vec<Record>,
}

impl RecordSet {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            source: None,
            records,
        }
    }

    pub fn with_source(source: SourceId, records: Vec<Record>) -> Self {
        Self {
            source: Some(source),
            records,
        }
    }

    pub fn source(&self) -> Option<&SourceId> {
        self.source.as_ref()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
