use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 通知类型
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/notification.ts")]
pub enum NotificationType {
    Assignment,   // 测试发布与截止
    Answer,       // 问答回复
    Grade,        // 成绩公布
    Announcement, // 公告
    ClassChange,  // 班级变更
    CourseChange, // 课程变更
}

impl<'de> Deserialize<'de> for NotificationType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<NotificationType>().map_err(|_| {
            serde::de::Error::custom(format!(
                "无效的通知类型: '{s}'. 支持的类型: assignment, answer, grade, announcement, class_change, course_change"
            ))
        })
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NotificationType::Assignment => "assignment",
            NotificationType::Answer => "answer",
            NotificationType::Grade => "grade",
            NotificationType::Announcement => "announcement",
            NotificationType::ClassChange => "class_change",
            NotificationType::CourseChange => "course_change",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "assignment" => Ok(NotificationType::Assignment),
            "answer" => Ok(NotificationType::Answer),
            "grade" => Ok(NotificationType::Grade),
            "announcement" => Ok(NotificationType::Announcement),
            "class_change" => Ok(NotificationType::ClassChange),
            "course_change" => Ok(NotificationType::CourseChange),
            _ => Err(format!("Invalid notification type: {s}")),
        }
    }
}

// 通知
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/notification.ts")]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub related_id: Option<i64>,
    pub is_read: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
