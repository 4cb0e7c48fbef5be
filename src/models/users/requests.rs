use super::entities::{Relationship, UserRole, UserStatusFilter};
use crate::models::common::PaginationQuery;
use serde::Deserialize;
use ts_rs::TS;

// 用户查询参数（来自HTTP请求）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct UserListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub role: Option<UserRole>,
    pub status: Option<UserStatusFilter>,
    pub search: Option<String>,
}

// 用户创建请求（存储层，password 为哈希后的值）
#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub role: UserRole,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_approved: bool,
}

// 学生档案（随学生账号一起创建）
#[derive(Debug, Clone)]
pub struct NewStudentProfile {
    pub student_number: String,
    pub grade: Option<i32>,
    pub class_id: Option<i64>,
}

// 家长关联（随家长账号一起创建）
#[derive(Debug, Clone)]
pub struct NewParentLink {
    pub student_id: i64,
    pub relationship: Relationship,
}

// 用户更新请求（存储层）
#[derive(Debug, Clone, Default)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub password: Option<String>,
    pub role: Option<UserRole>,
    pub is_approved: Option<bool>,
    pub is_active: Option<bool>,
}

// 用户列表查询参数（用于存储层）
#[derive(Debug, Clone)]
pub struct UserListQuery {
    pub page: u64,
    pub size: u64,
    pub role: Option<UserRole>,
    pub status: Option<UserStatusFilter>,
    pub search: Option<String>,
}

impl From<UserListParams> for UserListQuery {
    fn from(params: UserListParams) -> Self {
        let (page, size) = params.pagination.normalized();
        Self {
            page,
            size,
            role: params.role,
            status: params.status,
            search: params.search,
        }
    }
}
