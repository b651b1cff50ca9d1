use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// The source file is missing or unreadable. Fatal for the session.
    #[error("cannot load data from {}: {reason}", .path.display())]
    SourceUnavailable { path: PathBuf, reason: String },

    /// A required column is missing, or a cell could not be parsed.
    #[error("schema error in column '{field}'{}: {detail}", line_suffix(.line))]
    Schema {
        field: String,
        line: Option<u64>,
        detail: String,
    },

    /// The aggregation is undefined for this many rows.
    #[error("not enough data for {operation}: {rows} row(s)")]
    InsufficientData { operation: &'static str, rows: usize },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("config error: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn schema(field: impl Into<String>, line: Option<u64>, detail: impl Into<String>) -> Self {
        PipelineError::Schema {
            field: field.into(),
            line,
            detail: detail.into(),
        }
    }

    /// Whether the error should end the session rather than degrade a single chart.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PipelineError::SourceUnavailable { .. } | PipelineError::Schema { .. }
        )
    }
}

fn line_suffix(line: &Option<u64>) -> String {
    match line {
        Some(l) => format!(" at line {}", l),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_message_mentions_field_and_line() {
        let err = PipelineError::schema("Total", Some(4), "invalid number 'abc'");
        assert_eq!(
            err.to_string(),
            "schema error in column 'Total' at line 4: invalid number 'abc'"
        );

        let err = PipelineError::schema("Rating", None, "missing column");
        assert_eq!(err.to_string(), "schema error in column 'Rating': missing column");
    }

    #[test]
    fn test_fatality() {
        assert!(PipelineError::schema("City", None, "missing column").is_fatal());
        assert!(!PipelineError::InsufficientData { operation: "correlation", rows: 1 }.is_fatal());
    }
}
