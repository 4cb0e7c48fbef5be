use serde::Deserialize;
use ts_rs::TS;

use crate::models::common::double_option;

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct ClassListParams {
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct CreateClassRequest {
    pub name: String,
    pub subject_id: i64,
    pub teacher_id: Option<i64>,
    pub grade_level: Option<i32>,
    pub max_students: Option<i32>,
    pub is_active: Option<bool>,
    pub student_ids: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct UpdateClassRequest {
    pub name: Option<String>,
    pub subject_id: Option<i64>,
    /// null 表示取消分配教师
    #[serde(default, deserialize_with = "double_option")]
    pub teacher_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub grade_level: Option<Option<i32>>,
    pub max_students: Option<i32>,
    pub is_active: Option<bool>,
    pub student_ids: Option<Vec<i64>>,
}

// 存储层写入的班级字段（已完成校验）
#[derive(Debug, Clone)]
pub struct ClassFields {
    pub name: String,
    pub subject_id: i64,
    pub teacher_id: Option<i64>,
    pub grade_level: Option<i32>,
    pub max_students: i32,
    pub is_active: bool,
}
