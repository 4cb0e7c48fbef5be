use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::users::entities::Relationship;

/// 家长视角的子女概要
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/parent.ts")]
pub struct ParentChildSummary {
    pub student_id: i64,
    pub student_name: String,
    pub student_number: String,
    pub grade: Option<i32>,
    pub class_id: Option<i64>,
    pub class_name: Option<String>,
    pub subject_name: Option<String>,
    pub relationship: Relationship,
    pub linked_at: chrono::DateTime<chrono::Utc>,
}
