use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::users::entities::UserRole;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/admin.ts")]
pub struct OverviewStats {
    pub total_students: i64,
    pub total_teachers: i64,
    pub total_parents: i64,
    pub total_courses: i64,
    pub pending_teachers: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/admin.ts")]
pub struct RecentUser {
    pub id: i64,
    pub name: String,
    pub role: UserRole,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/admin.ts")]
pub struct RecentCourse {
    pub id: i64,
    pub title: String,
    pub teacher_name: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/admin.ts")]
pub struct RecentActivity {
    pub id: i64,
    pub activity_type: String,
    pub user_name: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// 管理员首页概览
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/admin.ts")]
pub struct AdminOverview {
    pub stats: OverviewStats,
    pub recent_users: Vec<RecentUser>,
    pub recent_courses: Vec<RecentCourse>,
    pub recent_activities: Vec<RecentActivity>,
}
