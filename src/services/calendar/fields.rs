//! 日历请求校验：日期范围与事件字段

use chrono::{Datelike, Months, NaiveDate};

use crate::models::{
    ErrorCode,
    calendar::{
        entities::{CalendarEvent, EventType},
        requests::{CreateEventRequest, EventFields, UpdateEventRequest},
    },
    reports::requests::DateRangeParams,
};
use crate::services::common::{ApiError, ServiceResult};
use crate::services::reports::range::parse_day;

pub const MAX_CALENDAR_DAYS: i64 = 370;

fn event_invalid(message: impl Into<String>) -> ApiError {
    ApiError::bad_request(ErrorCode::CalendarEventInvalid, message)
}

fn month_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = today.with_day(1).unwrap_or(today);
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(first);
    (first, last)
}

/// 查询范围，默认当月
pub fn calendar_range(params: &DateRangeParams, today: NaiveDate) -> ServiceResult<(String, String)> {
    let (month_start, month_end) = month_bounds(today);
    let start = match params.start_date.as_deref() {
        Some(value) => parse_day(value)?,
        None => month_start,
    };
    let end = match params.end_date.as_deref() {
        Some(value) => parse_day(value)?,
        None => month_end.max(start),
    };

    if start > end {
        return Err(ApiError::bad_request(
            ErrorCode::DateRangeInvalid,
            "start_date must not be after end_date.",
        ));
    }
    if (end - start).num_days() > MAX_CALENDAR_DAYS {
        return Err(ApiError::bad_request(
            ErrorCode::DateRangeInvalid,
            format!("Date range must not exceed {MAX_CALENDAR_DAYS} days."),
        ));
    }

    Ok((start.to_string(), end.to_string()))
}

/// 规范化并校验事件字段；end_date 缺省为 start_date
pub fn normalize_fields(mut fields: EventFields) -> ServiceResult<EventFields> {
    fields.title = fields.title.trim().to_string();
    if fields.title.is_empty() {
        return Err(event_invalid("title is required."));
    }
    fields.description = fields
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    let start = parse_day(&fields.start_date).map_err(|_| event_invalid("Invalid start_date."))?;
    let end = parse_day(&fields.end_date).map_err(|_| event_invalid("Invalid end_date."))?;
    if end < start {
        return Err(event_invalid("end_date must not be before start_date."));
    }
    fields.start_date = start.to_string();
    fields.end_date = end.to_string();

    match fields.event_type {
        EventType::TestDeadline if fields.class_id.is_none() => {
            Err(event_invalid("class_id is required for test deadlines."))
        }
        EventType::TeacherSchedule => {
            fields.class_id = None;
            fields.test_id = None;
            Ok(fields)
        }
        EventType::TestDeadline => Ok(fields),
    }
}

pub fn fields_from_create(req: CreateEventRequest) -> EventFields {
    EventFields {
        event_type: req.event_type,
        title: req.title,
        description: req.description,
        end_date: req.end_date.unwrap_or_else(|| req.start_date.clone()),
        start_date: req.start_date,
        class_id: req.class_id,
        test_id: req.test_id,
        teacher_id: req.teacher_id,
    }
}

/// 以现有事件为底合并更新
pub fn fields_from_update(event: &CalendarEvent, req: UpdateEventRequest) -> EventFields {
    EventFields {
        event_type: req.event_type.unwrap_or(event.event_type),
        title: req.title.unwrap_or_else(|| event.title.clone()),
        description: req.description.unwrap_or_else(|| event.description.clone()),
        start_date: req.start_date.unwrap_or_else(|| event.start_date.clone()),
        end_date: req.end_date.unwrap_or_else(|| event.end_date.clone()),
        class_id: req.class_id.unwrap_or(event.class_id),
        test_id: req.test_id.unwrap_or(event.test_id),
        teacher_id: req.teacher_id.unwrap_or(event.teacher_id),
    }
}
