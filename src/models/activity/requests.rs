use serde::Deserialize;
use ts_rs::TS;

use super::entities::ActivityType;

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/activity.ts")]
pub struct MyActivityParams {
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/activity.ts")]
pub struct ActivityListParams {
    pub user_id: Option<i64>,
    pub activity_type: Option<ActivityType>,
    pub limit: Option<u64>,
}

// 待写入的活动日志
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub user_id: i64,
    pub activity_type: ActivityType,
    pub related_id: Option<i64>,
    pub metadata: Option<serde_json::Value>,
}
