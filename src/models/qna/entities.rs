use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 课程问答
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/qna.ts")]
pub struct Qna {
    pub id: i64,
    pub course_id: i64,
    pub student_id: i64,
    pub question: String,
    pub answer: Option<String>,
    pub teacher_id: Option<i64>,
    pub is_public: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub answered_at: Option<chrono::DateTime<chrono::Utc>>,
}

// 带名称的问答
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/qna.ts")]
pub struct QnaDetail {
    #[serde(flatten)]
    pub qna: Qna,
    pub student_name: Option<String>,
    pub teacher_name: Option<String>,
    pub course_title: Option<String>,
}
