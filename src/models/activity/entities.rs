use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 活动类型
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/activity.ts")]
pub enum ActivityType {
    VideoWatch,
    TestComplete,
    QuestionAsk,
    Login,
}

impl<'de> Deserialize<'de> for ActivityType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<ActivityType>().map_err(|_| {
            serde::de::Error::custom(format!(
                "无效的活动类型: '{s}'. 支持的类型: video_watch, test_complete, question_ask, login"
            ))
        })
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ActivityType::VideoWatch => "video_watch",
            ActivityType::TestComplete => "test_complete",
            ActivityType::QuestionAsk => "question_ask",
            ActivityType::Login => "login",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ActivityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video_watch" => Ok(ActivityType::VideoWatch),
            "test_complete" => Ok(ActivityType::TestComplete),
            "question_ask" => Ok(ActivityType::QuestionAsk),
            "login" => Ok(ActivityType::Login),
            _ => Err(format!("Invalid activity type: {s}")),
        }
    }
}

// 活动日志
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/activity.ts")]
pub struct ActivityLog {
    pub id: i64,
    pub user_id: i64,
    pub activity_type: ActivityType,
    pub related_id: Option<i64>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// 带用户名的活动日志
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/activity.ts")]
pub struct ActivityLogWithUser {
    #[serde(flatten)]
    pub log: ActivityLog,
    pub user_name: Option<String>,
}
