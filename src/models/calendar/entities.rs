use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 日历事件类型
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/calendar.ts")]
pub enum EventType {
    TestDeadline,
    TeacherSchedule,
}

// 可见范围
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/calendar.ts")]
pub enum Visibility {
    TeacherOnly,
    Class,
}

impl EventType {
    /// 事件类型决定可见范围
    pub fn visibility(&self) -> Visibility {
        match self {
            EventType::TestDeadline => Visibility::Class,
            EventType::TeacherSchedule => Visibility::TeacherOnly,
        }
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<EventType>().map_err(|_| {
            serde::de::Error::custom(format!(
                "无效的事件类型: '{s}'. 支持的类型: test_deadline, teacher_schedule"
            ))
        })
    }
}

impl<'de> Deserialize<'de> for Visibility {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<Visibility>().map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::TestDeadline => write!(f, "test_deadline"),
            EventType::TeacherSchedule => write!(f, "teacher_schedule"),
        }
    }
}

impl std::str::FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "test_deadline" => Ok(EventType::TestDeadline),
            "teacher_schedule" => Ok(EventType::TeacherSchedule),
            _ => Err(format!("Invalid event type: {s}")),
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Visibility::TeacherOnly => write!(f, "teacher_only"),
            Visibility::Class => write!(f, "class"),
        }
    }
}

impl std::str::FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "teacher_only" => Ok(Visibility::TeacherOnly),
            "class" => Ok(Visibility::Class),
            _ => Err(format!("Invalid visibility: {s}")),
        }
    }
}

// 日历事件
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/calendar.ts")]
pub struct CalendarEvent {
    pub id: i64,
    pub event_type: EventType,
    pub title: String,
    pub description: Option<String>,
    pub start_date: String,
    pub end_date: String,
    pub class_id: Option<i64>,
    pub test_id: Option<i64>,
    pub teacher_id: Option<i64>,
    pub visibility: Visibility,
    pub created_by: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
