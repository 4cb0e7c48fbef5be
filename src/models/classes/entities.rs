use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 班级
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct Class {
    pub id: i64,
    pub name: String,
    pub subject_id: i64,
    pub teacher_id: Option<i64>,
    pub grade_level: Option<i32>,
    pub max_students: i32,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

// 班级列表项（带科目、教师名称与学生数）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct ClassSummary {
    pub class: Class,
    pub subject_name: Option<String>,
    pub teacher_name: Option<String>,
    pub student_count: i64,
}

// 班级中的学生
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct ClassStudent {
    pub student_id: i64,
    pub username: String,
    pub name: String,
    pub email: Option<String>,
    pub student_number: String,
    pub grade: Option<i32>,
    pub class_id: Option<i64>,
    pub class_name: Option<String>,
}
