use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/qna.ts")]
pub struct CreateQnaRequest {
    pub course_id: i64,
    pub question: String,
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/qna.ts")]
pub struct AnswerQnaRequest {
    pub answer: String,
}

/// 课程问答的可见范围
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QnaVisibility {
    All,
    PublicOrOwn(i64),
    PublicOnly,
}
