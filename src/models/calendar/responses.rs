use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::entities::CalendarEvent;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/calendar.ts")]
pub struct RelatedStudent {
    pub id: i64,
    pub name: String,
}

/// 日历事件（带关联名称）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/calendar.ts")]
pub struct CalendarEventView {
    #[serde(flatten)]
    pub event: CalendarEvent,
    pub class_name: Option<String>,
    pub subject_name: Option<String>,
    pub test_title: Option<String>,
    pub teacher_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_students: Option<Vec<RelatedStudent>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/calendar.ts")]
pub struct CalendarClassRef {
    pub id: i64,
    pub name: String,
    pub subject_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/calendar.ts")]
pub struct CalendarTestRef {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/calendar.ts")]
pub struct CalendarChildRef {
    pub id: i64,
    pub name: String,
    pub class_id: Option<i64>,
    pub class_name: Option<String>,
}

/// 日历页面的上下文数据
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/calendar.ts")]
pub struct CalendarContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<CalendarClassRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tests: Option<Vec<CalendarTestRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<CalendarChildRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<CalendarClassRef>,
}
