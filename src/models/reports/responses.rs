use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/report.ts")]
pub struct VideoReport {
    pub total_videos: i64,
    pub completed_videos: i64,
    pub average_progress: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/report.ts")]
pub struct TestReport {
    pub total_tests: i64,
    pub graded_tests: i64,
    pub average_score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/report.ts")]
pub struct QuestionReport {
    pub total_questions: i64,
    pub answered_questions: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/report.ts")]
pub struct LoginReport {
    pub total_logins: i64,
}

/// 学生学习报告
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/report.ts")]
pub struct StudentReport {
    pub video_progress: VideoReport,
    pub test_submissions: TestReport,
    pub questions: QuestionReport,
    pub login_activity: LoginReport,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/report.ts")]
pub struct ClassVideoStats {
    pub active_students: i64,
    pub total_views: i64,
    pub average_progress: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/report.ts")]
pub struct ClassTestStats {
    pub active_students: i64,
    pub total_submissions: i64,
    pub average_score: Option<f64>,
}

/// 班级学习报告
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/report.ts")]
pub struct ClassReport {
    pub student_count: i64,
    pub video_stats: ClassVideoStats,
    pub test_stats: ClassTestStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/report.ts")]
pub struct DailyActivity {
    pub date: String,
    pub total_activities: i64,
    pub active_users: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/report.ts")]
pub struct ActivityTypeCount {
    pub activity_type: String,
    pub count: i64,
}

/// 管理员活动报告
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/report.ts")]
pub struct AdminActivityReport {
    pub daily_activity: Vec<DailyActivity>,
    pub activity_by_type: Vec<ActivityTypeCount>,
}
