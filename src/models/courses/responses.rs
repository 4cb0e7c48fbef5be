use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::entities::{BlockType, ContentBlock, Course, CourseStudent};
use crate::models::video_progress::responses::VideoProgressSummary;

/// 学生的测试提交状态
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct SubmissionStatus {
    pub submission_id: i64,
    pub is_graded: bool,
    pub is_published: bool,
    pub score: Option<f64>,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

/// 学生视角下的内容块完成状态
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct BlockStudentStatus {
    pub is_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watched_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_watched_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_submission: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_status: Option<SubmissionStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct CourseBlockView {
    #[serde(flatten)]
    pub block: ContentBlock,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_status: Option<BlockStudentStatus>,
}

/// 学生课程进度
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct CourseProgress {
    pub progress_percentage: f64,
    pub completed_blocks: i64,
    pub total_blocks: i64,
    pub next_uncompleted_title: Option<String>,
    pub next_uncompleted_block_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub enum NextContentStatus {
    Completed,
    Pending,
}

/// 下一个学习内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct NextContent {
    pub block_id: i64,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub title: String,
    pub is_required: bool,
    pub status: NextContentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_id: Option<i64>,
}

/// 课程视频统计
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct CourseVideoStats {
    pub average_progress: f64,
    pub unique_students: i64,
    pub video_block_count: i64,
}

/// 课程列表项
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct CourseListItem {
    #[serde(flatten)]
    pub course: Course,
    pub class_name: Option<String>,
    pub subject_name: Option<String>,
    pub teacher_name: Option<String>,
    pub student_count: i64,
    pub block_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_progress: Option<CourseProgress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_content: Option<NextContent>,
}

/// 课程详情
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct CourseDetailResponse {
    #[serde(flatten)]
    pub course: Course,
    pub class_name: Option<String>,
    pub teacher_name: Option<String>,
    pub blocks: Vec<CourseBlockView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_progress: Option<CourseProgress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_content: Option<NextContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_summary: Option<Vec<VideoProgressSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_students: Option<Vec<CourseStudent>>,
}

/// 课程学生分配结果
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct CourseStudentsResponse {
    pub course_id: i64,
    pub students: Vec<CourseStudent>,
}

/// 课程元信息（带班级与教师名称），供列表与权限判断使用
#[derive(Debug, Clone)]
pub struct CourseWithNames {
    pub course: Course,
    pub class_name: Option<String>,
    pub class_teacher_id: Option<i64>,
    pub subject_name: Option<String>,
    pub teacher_name: Option<String>,
}
