use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::entities::{QuestionResult, Test, TestQuestion, TestSubmission};
use crate::models::courses::responses::SubmissionStatus;

/// 提交统计（教师视角）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/test.ts")]
pub struct SubmissionStats {
    pub total: i64,
    pub published: i64,
    pub graded: i64,
}

/// 测试列表项
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/test.ts")]
pub struct TestListItem {
    #[serde(flatten)]
    pub test: Test,
    pub class_name: Option<String>,
    pub subject_name: Option<String>,
    pub course_title: Option<String>,
    pub block_id: Option<i64>,
    pub block_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_submitted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_status: Option<SubmissionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_stats: Option<SubmissionStats>,
}

impl TestListItem {
    pub fn new(test: Test) -> Self {
        Self {
            test,
            class_name: None,
            subject_name: None,
            course_title: None,
            block_id: None,
            block_title: None,
            has_submitted: None,
            submission_status: None,
            submission_stats: None,
        }
    }

    /// 是否携带课程/内容块信息
    pub fn has_course_info(&self) -> bool {
        self.block_id.is_some() || self.course_title.is_some()
    }
}

/// 测试详情
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/test.ts")]
pub struct TestDetailResponse {
    #[serde(flatten)]
    pub test: Test,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questions: Option<Vec<TestQuestion>>,
}

/// 作答视图（题目已去除答案）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/test.ts")]
pub struct TestAttemptResponse {
    pub test: Test,
    pub questions: Vec<TestQuestion>,
}

/// 提交结果
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/test.ts")]
pub struct SubmitTestResponse {
    pub submission_id: i64,
    pub score: Option<f64>,
    pub requires_manual_grading: bool,
    pub auto_results: Vec<QuestionResult>,
}

/// 带学生信息的提交
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/test.ts")]
pub struct SubmissionWithStudent {
    #[serde(flatten)]
    pub submission: TestSubmission,
    pub student_name: String,
    pub student_number: Option<String>,
}

/// 题目重排结果
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/test.ts")]
pub struct QuestionListResponse {
    pub questions: Vec<TestQuestion>,
}
