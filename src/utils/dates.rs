//! 日期解析与测试截止时间
//!
//! 日期统一为 `YYYY-MM-DD`；测试截止为当天 23:59:59.999 KST，即 UTC 14:59:59.999。

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::errors::StudyLinkError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 解析 `YYYY-MM-DD`
pub fn parse_date(value: &str) -> Result<NaiveDate, StudyLinkError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| StudyLinkError::validation(format!("Invalid date '{value}', expected YYYY-MM-DD")))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// 测试截止时刻（UTC）
pub fn test_deadline(due_date: &str) -> Result<DateTime<Utc>, StudyLinkError> {
    let date = parse_date(due_date)?;
    let time = NaiveTime::from_hms_milli_opt(14, 59, 59, 999)
        .ok_or_else(|| StudyLinkError::validation("Invalid deadline time"))?;
    Ok(Utc.from_utc_datetime(&date.and_time(time)))
}

/// 截止日期无法解析时视为未截止
pub fn is_before_deadline(due_date: Option<&str>, now: DateTime<Utc>) -> bool {
    match due_date {
        Some(due) => test_deadline(due).map(|d| now <= d).unwrap_or(true),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_format() {
        let date = parse_date(" 2024-02-29 ").unwrap();
        assert_eq!(format_date(date), "2024-02-29");
        assert!(parse_date("2025/01/01").is_err());
        assert!(parse_date("2025-02-30").is_err());
    }

    #[test]
    fn test_deadline_is_kst_end_of_day() {
        let deadline = test_deadline("2025-05-20").unwrap();
        assert_eq!(deadline.to_rfc3339(), "2025-05-20T14:59:59.999+00:00");

        let before = Utc.with_ymd_and_hms(2025, 5, 20, 14, 59, 59).unwrap();
        let after = Utc.with_ymd_and_hms(2025, 5, 20, 15, 0, 0).unwrap();
        assert!(is_before_deadline(Some("2025-05-20"), before));
        assert!(!is_before_deadline(Some("2025-05-20"), after));
        assert!(is_before_deadline(None, after));
    }
}
