use chrono::NaiveDate;

use crate::common::error::{BacktestError, ErrCode};

/// Parse a trading date.
///
/// Supports "YYYY-MM-DD", "YYYY-MM-DD HH:MM:SS" (time and any offset are
/// ignored) and "YYYYMMDD".
pub fn parse_date(date_str: &str) -> Result<NaiveDate, BacktestError> {
    let s = date_str.trim();
    let parsed = if s.contains('-') {
        let date_part = s.get(..10).unwrap_or(s);
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
    } else {
        NaiveDate::parse_from_str(s, "%Y%m%d")
    };

    parsed.map_err(|e| {
        BacktestError::new(
            format!("invalid date '{}': {}", date_str, e),
            ErrCode::SrcDataFormatError,
        )
    })
}

pub fn to_date_str(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
        assert_eq!(parse_date("2020-01-02").unwrap(), expected);
        assert_eq!(parse_date("2020-01-02 00:00:00").unwrap(), expected);
        assert_eq!(parse_date("2020-01-02 00:00:00-05:00").unwrap(), expected);
        assert_eq!(parse_date("20200102").unwrap(), expected);
        assert_eq!(parse_date(" 2020-01-02 ").unwrap(), expected);
    }

    #[test]
    fn test_parse_date_invalid() {
        let err = parse_date("Ticker").unwrap_err();
        assert_eq!(err.errcode, ErrCode::SrcDataFormatError);
        assert!(parse_date("2020-13-40").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_to_date_str() {
        let date = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        assert_eq!(to_date_str(&date), "2023-12-31");
    }
}
