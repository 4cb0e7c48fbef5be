use crate::models::users::entities::{User, UserRole};
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub struct LoginResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub user: User,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub struct RefreshTokenResponse {
    pub access_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub struct RegisterResponse {
    pub user_id: i64,
    pub username: String,
    pub name: String,
    pub role: UserRole,
    pub is_approved: bool,
    pub pending_approval: bool,
    pub student_number: Option<String>,
}

// 学号校验结果（家长注册前使用）
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub struct StudentNumberCheckResponse {
    pub is_valid: bool,
    pub student_name: Option<String>,
    pub can_link: Option<bool>,
}
