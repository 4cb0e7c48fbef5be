use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 题目类型
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/test.ts")]
pub enum QuestionType {
    Ox,
    ShortAnswer,
    MultipleChoice,
    Essay,
}

impl<'de> Deserialize<'de> for QuestionType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<QuestionType>().map_err(|_| {
            serde::de::Error::custom(format!(
                "无效的题目类型: '{s}'. 支持的类型: ox, short_answer, multiple_choice, essay"
            ))
        })
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuestionType::Ox => write!(f, "ox"),
            QuestionType::ShortAnswer => write!(f, "short_answer"),
            QuestionType::MultipleChoice => write!(f, "multiple_choice"),
            QuestionType::Essay => write!(f, "essay"),
        }
    }
}

impl std::str::FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ox" => Ok(QuestionType::Ox),
            "short_answer" => Ok(QuestionType::ShortAnswer),
            "multiple_choice" => Ok(QuestionType::MultipleChoice),
            "essay" => Ok(QuestionType::Essay),
            _ => Err(format!("Invalid question type: {s}")),
        }
    }
}

// 测试
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/test.ts")]
pub struct Test {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub teacher_id: i64,
    pub course_id: Option<i64>,
    pub class_id: Option<i64>,
    pub time_limit: Option<i32>,
    pub total_score: i32,
    pub is_published: bool,
    pub publish_at: Option<chrono::DateTime<chrono::Utc>>,
    pub due_date: Option<String>, // YYYY-MM-DD
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

// 测试题目
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/test.ts")]
pub struct TestQuestion {
    pub id: i64,
    pub test_id: i64,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub question_text: String,
    pub question_data: serde_json::Value,
    pub points: i32,
    pub order_index: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// 测试提交
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/test.ts")]
pub struct TestSubmission {
    pub id: i64,
    pub test_id: i64,
    pub student_id: i64,
    pub answers: serde_json::Value,
    pub score: Option<f64>,
    pub is_graded: bool,
    pub is_published: bool,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
    pub graded_at: Option<chrono::DateTime<chrono::Utc>>,
}

// 单题评分结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/test.ts")]
pub struct QuestionResult {
    pub question_id: i64,
    pub response: serde_json::Value,
    pub is_correct: Option<bool>,
    pub awarded_score: Option<f64>,
    pub max_score: f64,
    pub requires_manual_grading: bool,
}
