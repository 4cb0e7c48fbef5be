use serde::Deserialize;
use ts_rs::TS;

use crate::models::common::double_option;
use crate::models::users::entities::{Relationship, UserRole};

/// 管理员创建用户
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/admin.ts")]
pub struct AdminCreateUserRequest {
    pub username: String,
    pub password: String,
    pub name: String,
    pub role: UserRole,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub student_number: Option<String>,
    pub relationship: Option<Relationship>,
    pub is_approved: Option<bool>,
}

/// 管理员更新用户
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/admin.ts")]
pub struct AdminUpdateUserRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    pub role: Option<UserRole>,
    pub is_approved: Option<bool>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub class_id: Option<Option<i64>>,
}
