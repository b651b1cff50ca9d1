use chrono::{NaiveDate, NaiveTime};

// Tried in order; the first is the US layout used by the sales export.
const DATE_FORMATS: [&str; 3] = ["%m/%d/%Y", "%Y-%m-%d", "%d-%m-%Y"];
const TIME_FORMATS: [&str; 2] = ["%H:%M", "%H:%M:%S"];

/// Parses a naive calendar date. No timezone handling.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
}

pub fn parse_time(input: &str) -> Option<NaiveTime> {
    let input = input.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(input, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2019, 1, 5).unwrap();
        assert_eq!(parse_date("1/5/2019"), Some(expected));
        assert_eq!(parse_date("01/05/2019"), Some(expected));
        assert_eq!(parse_date("2019-01-05"), Some(expected));
        assert_eq!(parse_date("05-01-2019"), Some(expected));
        assert_eq!(parse_date(" 2019-01-05 "), Some(expected));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("2/30/2019"), None);
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("13:08"), NaiveTime::from_hms_opt(13, 8, 0));
        assert_eq!(parse_time("10:29:45"), NaiveTime::from_hms_opt(10, 29, 45));
        assert_eq!(parse_time("25:00"), None);
    }
}
