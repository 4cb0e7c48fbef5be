use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::entities::VideoProgress;

/// 带学生与内容块信息的进度
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/video_progress.ts")]
pub struct VideoProgressDetail {
    #[serde(flatten)]
    pub progress: VideoProgress,
    pub student_name: Option<String>,
    pub course_id: Option<i64>,
    pub block_title: Option<String>,
}

/// 每个视频块的汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/video_progress.ts")]
pub struct VideoProgressSummary {
    pub block_id: i64,
    pub block_title: String,
    pub order_index: i32,
    pub is_required: bool,
    pub tracked_students: i64,
    pub completed_count: i64,
    pub average_progress: f64,
    pub last_activity_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// 教师课程视频概览
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/video_progress.ts")]
pub struct TeacherCourseVideoOverview {
    pub course_id: i64,
    pub title: String,
    pub video_block_count: i64,
    pub tracked_students: i64,
    pub average_progress: f64,
    pub completed_count: i64,
}

/// 单条进度（不存在时为 null）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/video_progress.ts")]
pub struct BlockProgressResponse {
    pub progress: Option<VideoProgress>,
}
