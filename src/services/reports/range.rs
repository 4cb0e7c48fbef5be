//! 报告日期范围解析

use chrono::{Days, NaiveDate};

use crate::models::{ErrorCode, reports::requests::DateRangeParams};
use crate::services::common::{ApiError, ServiceResult};
use crate::utils::dates::parse_date;

pub const DEFAULT_REPORT_DAYS: u64 = 30;
pub const MAX_REPORT_DAYS: i64 = 365;

fn range_error(message: impl Into<String>) -> ApiError {
    ApiError::bad_request(ErrorCode::DateRangeInvalid, message)
}

/// 解析 YYYY-MM-DD，错误归为 DateRangeInvalid
pub fn parse_day(value: &str) -> ServiceResult<NaiveDate> {
    parse_date(value).map_err(|e| range_error(e.message()))
}

/// 闭区间转为 unix 秒：起始日 00:00:00 到结束日 23:59:59（UTC）
pub fn report_range(params: &DateRangeParams, today: NaiveDate) -> ServiceResult<(i64, i64)> {
    let end = match params.end_date.as_deref() {
        Some(value) => parse_day(value)?,
        None => today,
    };
    let start = match params.start_date.as_deref() {
        Some(value) => parse_day(value)?,
        None => end
            .checked_sub_days(Days::new(DEFAULT_REPORT_DAYS))
            .unwrap_or(end),
    };

    if start > end {
        return Err(range_error("start_date must not be after end_date."));
    }
    if (end - start).num_days() > MAX_REPORT_DAYS {
        return Err(range_error(format!(
            "Date range must not exceed {MAX_REPORT_DAYS} days."
        )));
    }

    let start_ts = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
    let end_ts = end.and_time(chrono::NaiveTime::MIN).and_utc().timestamp() + 86_399;
    Ok((start_ts, end_ts))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn params(start: Option<&str>, end: Option<&str>) -> DateRangeParams {
        DateRangeParams {
            start_date: start.map(String::from),
            end_date: end.map(String::from),
        }
    }

    #[test]
    fn test_default_range_is_last_thirty_days() {
        let today = day("2025-03-31");
        let (start, end) = report_range(&params(None, None), today).unwrap();
        assert_eq!(start, day("2025-03-01").and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp());
        assert_eq!(end, day("2025-03-31").and_hms_opt(23, 59, 59).unwrap().and_utc().timestamp());
    }

    #[test]
    fn test_end_only_counts_back_from_end() {
        let (start, _) = report_range(&params(None, Some("2025-01-31")), day("2025-06-01")).unwrap();
        assert_eq!(start, day("2025-01-01").and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp());
    }

    #[test]
    fn test_single_day_is_inclusive() {
        let (start, end) =
            report_range(&params(Some("2025-01-10"), Some("2025-01-10")), day("2025-06-01")).unwrap();
        assert_eq!(end - start, 86_399);
    }

    #[test]
    fn test_rejects_bad_ranges() {
        let today = day("2025-06-01");
        assert!(report_range(&params(Some("2025-02-01"), Some("2025-01-01")), today).is_err());
        assert!(report_range(&params(Some("2024-01-01"), Some("2025-06-01")), today).is_err());
        assert!(report_range(&params(Some("2025/01/01"), None), today).is_err());
        assert!(report_range(&params(Some("2024-06-01"), Some("2025-06-01")), today).is_ok());
    }
}
