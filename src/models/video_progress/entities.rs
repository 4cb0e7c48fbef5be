use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 视频观看进度
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/video_progress.ts")]
pub struct VideoProgress {
    pub id: i64,
    pub student_id: i64,
    pub video_block_id: i64,
    pub watched_duration: f64,
    pub total_duration: f64,
    pub progress_percentage: f64,
    pub is_completed: bool,
    pub last_watched_at: chrono::DateTime<chrono::Utc>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
