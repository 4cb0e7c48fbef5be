use serde::Serialize;
use ts_rs::TS;

use super::entities::{StudentProfile, User};
use crate::models::common::PaginationInfo;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct UserResponse {
    pub user: User,
}

// 当前用户信息（学生附带档案）
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct MeResponse {
    pub user: User,
    pub student_profile: Option<StudentProfile>,
}

// 管理端用户列表项
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct UserListItem {
    pub user: User,
    pub student_number: Option<String>,
    pub class_id: Option<i64>,
    pub linked_student_numbers: Vec<String>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct UserListResponse {
    pub items: Vec<UserListItem>,
    pub pagination: PaginationInfo,
}
