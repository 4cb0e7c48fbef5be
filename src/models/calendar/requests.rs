use serde::Deserialize;
use ts_rs::TS;

use super::entities::EventType;
use crate::models::common::double_option;

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/calendar.ts")]
pub struct CreateEventRequest {
    pub event_type: EventType,
    pub title: String,
    pub description: Option<String>,
    pub start_date: String,
    pub end_date: Option<String>,
    pub class_id: Option<i64>,
    pub test_id: Option<i64>,
    pub teacher_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/calendar.ts")]
pub struct UpdateEventRequest {
    pub event_type: Option<EventType>,
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub class_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub test_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub teacher_id: Option<Option<i64>>,
}

// 存储层写入的事件字段（已完成校验）
#[derive(Debug, Clone, PartialEq)]
pub struct EventFields {
    pub event_type: EventType,
    pub title: String,
    pub description: Option<String>,
    pub start_date: String,
    pub end_date: String,
    pub class_id: Option<i64>,
    pub test_id: Option<i64>,
    pub teacher_id: Option<i64>,
}

/// 日历事件查询范围
#[derive(Debug, Clone, PartialEq)]
pub enum CalendarScope {
    All,
    /// 负责班级的截止事件与本人的日程
    Teacher { teacher_id: i64, class_ids: Vec<i64> },
    /// 指定班级的截止事件
    Classes(Vec<i64>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEventQuery {
    pub start_date: String,
    pub end_date: String,
    pub scope: CalendarScope,
}
