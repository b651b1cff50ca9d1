use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::input::expand_key;
use crate::model::record::Record;

/// Header names, matched literally and case-sensitively.
pub mod columns {
    pub const INVOICE_ID: &str = "Invoice ID";
    pub const BRANCH: &str = "Branch";
    pub const CITY: &str = "City";
    pub const CUSTOMER_TYPE: &str = "Customer type";
    pub const GENDER: &str = "Gender";
    pub const PRODUCT_LINE: &str = "Product line";
    pub const UNIT_PRICE: &str = "Unit price";
    pub const QUANTITY: &str = "Quantity";
    pub const TAX: &str = "Tax 5%";
    pub const TOTAL: &str = "Total";
    pub const DATE: &str = "Date";
    pub const TIME: &str = "Time";
    pub const PAYMENT: &str = "Payment";
    pub const COGS: &str = "cogs";
    pub const GROSS_MARGIN_PERCENTAGE: &str = "gross margin percentage";
    pub const GROSS_INCOME: &str = "gross income";
    pub const RATING: &str = "Rating";
    pub const MONTH: &str = "Month";
    pub const DAY: &str = "Day";

    pub const REQUIRED: [&str; 14] = [
        DATE,
        TIME,
        BRANCH,
        CITY,
        CUSTOMER_TYPE,
        GENDER,
        PRODUCT_LINE,
        UNIT_PRICE,
        QUANTITY,
        TAX,
        TOTAL,
        COGS,
        GROSS_INCOME,
        RATING,
    ];

    pub const OPTIONAL: [&str; 3] = [INVOICE_ID, PAYMENT, GROSS_MARGIN_PERCENTAGE];
}

/// A column usable as a grouping key or filter.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CategoricalField {
    Branch,
    City,
    #[serde(rename = "Customer type")]
    CustomerType,
    Gender,
    #[serde(rename = "Product line")]
    ProductLine,
    Payment,
}

impl CategoricalField {
    pub const ALL: [CategoricalField; 6] = [
        CategoricalField::Branch,
        CategoricalField::City,
        CategoricalField::CustomerType,
        CategoricalField::Gender,
        CategoricalField::ProductLine,
        CategoricalField::Payment,
    ];

    /// The fields the dashboard exposes as multiselect filters.
    pub const FILTERABLE: [CategoricalField; 3] = [
        CategoricalField::City,
        CategoricalField::Gender,
        CategoricalField::ProductLine,
    ];

    pub fn column(self) -> &'static str {
        match self {
            CategoricalField::Branch => columns::BRANCH,
            CategoricalField::City => columns::CITY,
            CategoricalField::CustomerType => columns::CUSTOMER_TYPE,
            CategoricalField::Gender => columns::GENDER,
            CategoricalField::ProductLine => columns::PRODUCT_LINE,
            CategoricalField::Payment => columns::PAYMENT,
        }
    }

    /// Short key used on the command line (`city:Yangon`).
    pub fn key(self) -> &'static str {
        match self {
            CategoricalField::Branch => "branch",
            CategoricalField::City => "city",
            CategoricalField::CustomerType => "customer",
            CategoricalField::Gender => "gender",
            CategoricalField::ProductLine => "product",
            CategoricalField::Payment => "payment",
        }
    }

    pub fn from_column(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.column() == name)
    }

    pub fn from_key(key: &str) -> crate::error::Result<Self> {
        let keys: Vec<&str> = Self::ALL.iter().map(|f| f.key()).collect();
        let full = expand_key(&key.to_lowercase(), &keys)?;
        Self::ALL
            .into_iter()
            .find(|f| f.key() == full)
            .ok_or_else(|| PipelineError::InvalidRequest(format!("unknown field '{}'", key)))
    }

    /// `None` only for the optional `Payment` column when the source lacks it.
    pub fn value(self, record: &Record) -> Option<&str> {
        match self {
            CategoricalField::Branch => Some(&record.branch),
            CategoricalField::City => Some(&record.city),
            CategoricalField::CustomerType => Some(record.customer_type.as_str()),
            CategoricalField::Gender => Some(record.gender.as_str()),
            CategoricalField::ProductLine => Some(&record.product_line),
            CategoricalField::Payment => record.payment.as_deref(),
        }
    }
}

impl FromStr for CategoricalField {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::from_column(s) {
            Some(field) => Ok(field),
            None => Self::from_key(s),
        }
    }
}

impl fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NumericField {
    #[serde(rename = "Unit price")]
    UnitPrice,
    Quantity,
    #[serde(rename = "Tax 5%")]
    Tax,
    Total,
    #[serde(rename = "cogs")]
    Cogs,
    #[serde(rename = "gross margin percentage")]
    GrossMarginPercentage,
    #[serde(rename = "gross income")]
    GrossIncome,
    Rating,
    Month,
    Day,
}

impl NumericField {
    pub const ALL: [NumericField; 10] = [
        NumericField::UnitPrice,
        NumericField::Quantity,
        NumericField::Tax,
        NumericField::Total,
        NumericField::Cogs,
        NumericField::GrossMarginPercentage,
        NumericField::GrossIncome,
        NumericField::Rating,
        NumericField::Month,
        NumericField::Day,
    ];

    /// Columns of the correlation heatmap.
    pub const CORRELATED: [NumericField; 7] = [
        NumericField::UnitPrice,
        NumericField::Quantity,
        NumericField::Tax,
        NumericField::Total,
        NumericField::Cogs,
        NumericField::GrossIncome,
        NumericField::Rating,
    ];

    pub fn column(self) -> &'static str {
        match self {
            NumericField::UnitPrice => columns::UNIT_PRICE,
            NumericField::Quantity => columns::QUANTITY,
            NumericField::Tax => columns::TAX,
            NumericField::Total => columns::TOTAL,
            NumericField::Cogs => columns::COGS,
            NumericField::GrossMarginPercentage => columns::GROSS_MARGIN_PERCENTAGE,
            NumericField::GrossIncome => columns::GROSS_INCOME,
            NumericField::Rating => columns::RATING,
            NumericField::Month => columns::MONTH,
            NumericField::Day => columns::DAY,
        }
    }

    pub fn from_column(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.column() == name)
    }

    pub fn value(self, record: &Record) -> Option<f64> {
        match self {
            NumericField::UnitPrice => Some(record.unit_price),
            NumericField::Quantity => Some(f64::from(record.quantity)),
            NumericField::Tax => Some(record.tax),
            NumericField::Total => Some(record.total),
            NumericField::Cogs => Some(record.cogs),
            NumericField::GrossMarginPercentage => record.gross_margin_percentage,
            NumericField::GrossIncome => Some(record.gross_income),
            NumericField::Rating => Some(record.rating),
            NumericField::Month => Some(f64::from(record.month)),
            NumericField::Day => Some(f64::from(record.day)),
        }
    }
}

impl FromStr for NumericField {
    type Err = PipelineError;

    /// Accepts the literal column name, or any unique prefix of its lowercase form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(field) = Self::from_column(s) {
            return Ok(field);
        }
        let lowered: Vec<String> = Self::ALL.iter().map(|f| f.column().to_lowercase()).collect();
        let keys: Vec<&str> = lowered.iter().map(String::as_str).collect();
        let full = expand_key(&s.to_lowercase(), &keys)?;
        Self::ALL
            .into_iter()
            .find(|f| f.column().to_lowercase() == full)
            .ok_or_else(|| PipelineError::InvalidRequest(format!("unknown field '{}'", s)))
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Calendar granularity for time series.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalField {
    Date,
    Month,
}

impl TemporalField {
    /// Maps a record to its bucket. Months are keyed by their first day so keys sort chronologically.
    pub fn bucket(self, record: &Record) -> NaiveDate {
        match self {
            TemporalField::Date => record.date,
            TemporalField::Month => record.date.with_day(1).unwrap_or(record.date),
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            TemporalField::Date => columns::DATE,
            TemporalField::Month => columns::MONTH,
        }
    }
}

impl fmt::Display for TemporalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorical_from_str() {
        assert_eq!("Product line".parse::<CategoricalField>().unwrap(), CategoricalField::ProductLine);
        assert_eq!("prod".parse::<CategoricalField>().unwrap(), CategoricalField::ProductLine);
        assert_eq!("City".parse::<CategoricalField>().unwrap(), CategoricalField::City);
        assert_eq!("cu".parse::<CategoricalField>().unwrap(), CategoricalField::CustomerType);
        // "c" matches city and customer
        assert!("c".parse::<CategoricalField>().is_err());
        assert!("zone".parse::<CategoricalField>().is_err());
    }

    #[test]
    fn test_numeric_from_str() {
        assert_eq!("Tax 5%".parse::<NumericField>().unwrap(), NumericField::Tax);
        assert_eq!("tot".parse::<NumericField>().unwrap(), NumericField::Total);
        assert_eq!("gross i".parse::<NumericField>().unwrap(), NumericField::GrossIncome);
        assert!("gross".parse::<NumericField>().is_err());
    }

    #[test]
    fn test_month_bucket_is_first_day() {
        let date = NaiveDate::from_ymd_opt(2019, 2, 17).unwrap();
        let record = Record::new(date, chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(TemporalField::Month.bucket(&record), NaiveDate::from_ymd_opt(2019, 2, 1).unwrap());
        assert_eq!(TemporalField::Date.bucket(&record), date);
    }
}
