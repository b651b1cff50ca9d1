use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result};
use crate::model::field::columns;
use crate::model::{Record, RecordSet, SourceId};
use crate::repository::traits::RecordSource;
use crate::time::{parse_date, parse_time};

const DEFAULT_FILE_NAME: &str = "data.csv";

/// A delimited text file with a header row.
#[derive(Clone, Debug)]
pub struct CsvRecordSource {
    file_path: PathBuf,
}

impl CsvRecordSource {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            file_path: path.unwrap_or_else(|| PathBuf::from(DEFAULT_FILE_NAME)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

impl RecordSource for CsvRecordSource {
    fn identity(&self) -> Result<SourceId> {
        SourceId::of_file(&self.file_path).map_err(|e| unavailable(&self.file_path, e))
    }

    fn load(&self) -> Result<RecordSet> {
        let source = self.identity()?;
        let file = File::open(&self.file_path).map_err(|e| unavailable(&self.file_path, e))?;
        let records = read_records(BufReader::new(file), &self.file_path)?;
        info!(path = %self.file_path.display(), rows = records.len(), "loaded records");
        Ok(RecordSet::with_source(source, records))
    }
}

/// Reads and validates the whole file at `path`.
pub fn load(path: &Path) -> Result<RecordSet> {
    CsvRecordSource::new(Some(path.to_path_buf())).load()
}

/// Parses CSV text. `origin` only labels errors.
pub fn read_records<R: io::Read>(reader: R, origin: &Path) -> Result<Vec<Record>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = reader.headers().map_err(|e| csv_error(e, origin))?.clone();
    let layout = ColumnLayout::from_headers(&headers)?;
    debug!(columns = headers.len(), "header layout resolved");

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| csv_error(e, origin))?;
        records.push(layout.parse(&row)?);
    }
    Ok(records)
}

struct ColumnLayout {
    date: usize,
    time: usize,
    branch: usize,
    city: usize,
    customer_type: usize,
    gender: usize,
    product_line: usize,
    unit_price: usize,
    quantity: usize,
    tax: usize,
    total: usize,
    cogs: usize,
    gross_income: usize,
    rating: usize,
    invoice_id: Option<usize>,
    payment: Option<usize>,
    gross_margin_percentage: Option<usize>,
}

impl ColumnLayout {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let index: HashMap<&str, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim_start_matches('\u{feff}').trim(), i))
            .collect();

        let require = |name: &str| {
            index
                .get(name)
                .copied()
                .ok_or_else(|| PipelineError::schema(name, None, "missing column"))
        };
        let optional = |name: &str| {
            let found = index.get(name).copied();
            if found.is_none() {
                warn!(column = name, "optional column absent");
            }
            found
        };

        Ok(Self {
            date: require(columns::DATE)?,
            time: require(columns::TIME)?,
            branch: require(columns::BRANCH)?,
            city: require(columns::CITY)?,
            customer_type: require(columns::CUSTOMER_TYPE)?,
            gender: require(columns::GENDER)?,
            product_line: require(columns::PRODUCT_LINE)?,
            unit_price: require(columns::UNIT_PRICE)?,
            quantity: require(columns::QUANTITY)?,
            tax: require(columns::TAX)?,
            total: require(columns::TOTAL)?,
            cogs: require(columns::COGS)?,
            gross_income: require(columns::GROSS_INCOME)?,
            rating: require(columns::RATING)?,
            invoice_id: optional(columns::INVOICE_ID),
            payment: optional(columns::PAYMENT),
            gross_margin_percentage: optional(columns::GROSS_MARGIN_PERCENTAGE),
        })
    }

    fn parse(&self, row: &StringRecord) -> Result<Record> {
        let cells = Cells {
            row,
            line: row.position().map(|p| p.line()),
        };

        let date_raw = cells.text(self.date, columns::DATE)?;
        let date = parse_date(date_raw).ok_or_else(|| {
            PipelineError::schema(columns::DATE, cells.line, format!("invalid date '{}'", date_raw))
        })?;
        let time_raw = cells.text(self.time, columns::TIME)?;
        let time = parse_time(time_raw).ok_or_else(|| {
            PipelineError::schema(columns::TIME, cells.line, format!("invalid time '{}'", time_raw))
        })?;

        let mut record = Record::new(date, time);
        record.branch = cells.text(self.branch, columns::BRANCH)?.to_string();
        record.city = cells.text(self.city, columns::CITY)?.to_string();
        record.customer_type = cells.parse(self.customer_type, columns::CUSTOMER_TYPE)?;
        record.gender = cells.parse(self.gender, columns::GENDER)?;
        record.product_line = cells.text(self.product_line, columns::PRODUCT_LINE)?.to_string();
        record.unit_price = cells.number(self.unit_price, columns::UNIT_PRICE)?;
        record.quantity = cells.count(self.quantity, columns::QUANTITY)?;
        record.tax = cells.number(self.tax, columns::TAX)?;
        record.total = cells.number(self.total, columns::TOTAL)?;
        record.cogs = cells.number(self.cogs, columns::COGS)?;
        record.gross_income = cells.number(self.gross_income, columns::GROSS_INCOME)?;

        let rating = cells.number(self.rating, columns::RATING)?;
        if !(0.0..=10.0).contains(&rating) {
            return Err(PipelineError::schema(
                columns::RATING,
                cells.line,
                format!("rating {} outside 0-10", rating),
            ));
        }
        record.rating = rating;

        if let Some(idx) = self.invoice_id {
            record.invoice_id = Some(cells.text(idx, columns::INVOICE_ID)?.to_string());
        }
        if let Some(idx) = self.payment {
            record.payment = Some(cells.text(idx, columns::PAYMENT)?.to_string());
        }
        if let Some(idx) = self.gross_margin_percentage {
            record.gross_margin_percentage =
                Some(cells.number(idx, columns::GROSS_MARGIN_PERCENTAGE)?);
        }

        Ok(record)
    }
}

struct Cells<'r> {
    row: &'r StringRecord,
    line: Option<u64>,
}

impl<'r> Cells<'r> {
    fn text(&self, idx: usize, field: &str) -> Result<&'r str> {
        self.row
            .get(idx)
            .ok_or_else(|| PipelineError::schema(field, self.line, "missing cell"))
    }

    fn number(&self, idx: usize, field: &str) -> Result<f64> {
        let raw = self.text(idx, field)?;
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| PipelineError::schema(field, self.line, format!("invalid number '{}'", raw)))
    }

    fn count(&self, idx: usize, field: &str) -> Result<u32> {
        let raw = self.text(idx, field)?;
        raw.parse::<u32>().map_err(|_| {
            PipelineError::schema(field, self.line, format!("invalid non-negative integer '{}'", raw))
        })
    }

    fn parse<T: FromStr<Err = String>>(&self, idx: usize, field: &str) -> Result<T> {
        let raw = self.text(idx, field)?;
        raw.parse::<T>()
            .map_err(|detail| PipelineError::schema(field, self.line, detail))
    }
}

fn unavailable(path: &Path, err: io::Error) -> PipelineError {
    PipelineError::SourceUnavailable {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

fn csv_error(err: csv::Error, origin: &Path) -> PipelineError {
    let line = err.position().map(|p| p.line());
    match err.kind() {
        csv::ErrorKind::Io(_) | csv::ErrorKind::Utf8 { .. } => PipelineError::SourceUnavailable {
            path: origin.to_path_buf(),
            reason: err.to_string(),
        },
        _ => PipelineError::schema("record", line, err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CustomerType, Gender};

    const HEADER: &str = "Invoice ID,Branch,City,Customer type,Gender,Product line,Unit price,Quantity,Tax 5%,Total,Date,Time,Payment,cogs,gross margin percentage,gross income,Rating";

    fn parse(body: &str) -> Result<Vec<Record>> {
        let text = format!("{}\n{}", HEADER, body);
        read_records(text.as_bytes(), Path::new("test.csv"))
    }

    #[test]
    fn test_reads_export_column_order() {
        let records = parse(
            "750-67-8428,A,Yangon,Member,Female,Health and beauty,74.69,7,26.1415,548.9715,1/5/2019,13:08,Ewallet,522.83,4.761904762,26.1415,9.1\n",
        )
        .unwrap();

        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.invoice_id.as_deref(), Some("750-67-8428"));
        assert_eq!(r.city, "Yangon");
        assert_eq!(r.customer_type, CustomerType::Member);
        assert_eq!(r.gender, Gender::Female);
        assert_eq!(r.quantity, 7);
        assert_eq!(r.payment.as_deref(), Some("Ewallet"));
        assert_eq!(r.month, 1);
        assert_eq!(r.day, 5);
        assert!((r.total - 548.9715).abs() < 1e-9);
    }

    #[test]
    fn test_missing_required_column() {
        let text = "Branch,City\nA,Yangon\n";
        let err = read_records(text.as_bytes(), Path::new("test.csv")).unwrap_err();
        match err {
            PipelineError::Schema { field, line, .. } => {
                assert_eq!(field, "Date");
                assert_eq!(line, None);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_bad_number_names_field_and_line() {
        let err = parse(
            "1,A,Yangon,Member,Female,Health and beauty,74.69,7,26.14,oops,1/5/2019,13:08,Cash,522.83,4.76,26.14,9.1\n",
        )
        .unwrap_err();
        match err {
            PipelineError::Schema { field, line, detail } => {
                assert_eq!(field, "Total");
                assert_eq!(line, Some(2));
                assert!(detail.contains("oops"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_negative_quantity_and_unknown_gender() {
        let err = parse(
            "1,A,Yangon,Member,Female,Sports and travel,10,-1,0.5,10.5,1/5/2019,13:08,Cash,10,4.76,0.5,5\n",
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Schema { ref field, .. } if field == "Quantity"));

        let err = parse(
            "1,A,Yangon,Member,Other,Sports and travel,10,1,0.5,10.5,1/5/2019,13:08,Cash,10,4.76,0.5,5\n",
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Schema { ref field, .. } if field == "Gender"));
    }

    const ROW: &str = "750-67-8428,A,Yangon,Member,Female,Health and beauty,74.69,7,26.1415,548.9715,1/5/2019,13:08,Ewallet,522.83,4.761904762,26.1415,9.1";

    // ROW with the cell at `idx` replaced.
    fn with_cell(idx: usize, value: &str) -> String {
        let mut cells: Vec<&str> = ROW.split(',').collect();
        cells[idx] = value;
        cells.join(",")
    }

    #[test]
    fn test_rating_outside_scale() {
        let err = parse(&with_cell(16, "11")).unwrap_err();
        match err {
            PipelineError::Schema { field, line, detail } => {
                assert_eq!(field, "Rating");
                assert_eq!(line, Some(2));
                assert_eq!(detail, "rating 11 outside 0-10");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(parse(&with_cell(16, "10")).is_ok());
        assert!(parse(&with_cell(16, "0")).is_ok());
    }

    #[test]
    fn test_empty_numeric_cell() {
        let err = parse(&with_cell(9, "")).unwrap_err();
        assert!(matches!(err, PipelineError::Schema { ref field, line: Some(2), .. } if field == "Total"));
    }

    #[test]
    fn test_non_finite_numbers_rejected() {
        for raw in ["NaN", "inf", "-inf"] {
            let err = parse(&with_cell(6, raw)).unwrap_err();
            assert!(
                matches!(err, PipelineError::Schema { ref field, .. } if field == "Unit price"),
                "{} accepted",
                raw
            );
        }
    }

    #[test]
    fn test_header_byte_order_mark() {
        let text = format!("\u{feff}{}\n{}\n", HEADER, ROW);
        let records = read_records(text.as_bytes(), Path::new("test.csv")).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].invoice_id.as_deref(), Some("750-67-8428"));
    }

    #[test]
    fn test_invalid_utf8_is_unavailable() {
        let mut bytes = format!("{}\n", HEADER).into_bytes();
        bytes.extend_from_slice(ROW.replace("Yangon", "Yan\u{0}").as_bytes());
        // Replace the NUL placeholder with a byte that cannot start a UTF-8 sequence.
        let nul = bytes.iter().rposition(|b| *b == 0).unwrap();
        bytes[nul] = 0xff;
        bytes.push(b'\n');

        let err = read_records(&bytes[..], Path::new("test.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::SourceUnavailable { ref path, .. } if path == Path::new("test.csv")));
    }

    #[test]
    fn test_optional_columns_may_be_absent() {
        let text = "Date,Time,Branch,City,Customer type,Gender,Product line,Unit price,Quantity,Tax 5%,Total,cogs,gross income,Rating\n\
                    2019-03-08,10:29,C,Naypyitaw,Normal,Male,Electronic accessories,15.28,5,3.82,80.22,76.4,3.82,9.6\n";
        let records = read_records(text.as_bytes(), Path::new("test.csv")).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].payment, None);
        assert_eq!(records[0].gross_margin_percentage, None);
        assert_eq!(records[0].month, 3);
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let source = CsvRecordSource::new(Some(PathBuf::from("/definitely/not/here.csv")));
        assert!(matches!(
            source.load(),
            Err(PipelineError::SourceUnavailable { .. })
        ));
    }
}
