use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/video_progress.ts")]
pub struct UpdateVideoProgressRequest {
    pub video_block_id: i64,
    pub watched_duration: f64,
    pub total_duration: f64,
}

// 计算后的进度，写入存储
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpsert {
    pub student_id: i64,
    pub video_block_id: i64,
    pub watched_duration: f64,
    pub total_duration: f64,
    pub progress_percentage: f64,
    pub is_completed: bool,
}

/// 教师课程概览；管理员可指定教师
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/video_progress.ts")]
pub struct TeacherOverviewParams {
    pub teacher_id: Option<i64>,
}
