use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use crate::models::{
    ApiResponse, ErrorCode,
    activity::entities::ActivityType,
    auth::{LoginRequest, LoginResponse},
    users::entities::User,
};
use crate::services::activity;
use crate::services::common::{ApiError, ServiceResult};
use crate::utils::jwt;
use crate::models::users::requests::UpdateUserRequest;
use crate::utils::password::{hash_password, needs_rehash, verify_password};

use super::AuthService;

/// 账号状态检查：密码正确之后再判断，避免泄露账号是否存在
pub(crate) fn check_login_allowed(user: &User) -> ServiceResult<()> {
    if !user.is_active {
        return Err(ApiError::unauthorized_with(
            ErrorCode::AccountInactive,
            "Account is deactivated.",
        ));
    }
    if user.is_pending_teacher() {
        return Err(ApiError::forbidden(
            ErrorCode::TeacherNotApproved,
            "Teacher account is waiting for admin approval.",
        ));
    }
    Ok(())
}

fn auth_failed() -> ApiError {
    ApiError::unauthorized_with(ErrorCode::AuthFailed, "Username or password is incorrect.")
}

pub async fn handle_login(
    service: &AuthService,
    login_request: LoginRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let config = service.get_config();

    // 1. 查找用户并校验密码
    let user = storage
        .get_user_by_username(login_request.username.trim())
        .await
        .map_err(ApiError::from)?
        .ok_or_else(auth_failed)?;

    if !verify_password(&login_request.password, &user.password_hash) {
        return Err(auth_failed().into());
    }

    // 2. 启用与审批状态
    check_login_allowed(&user)?;

    // 3. 哈希参数变化后顺带升级密码哈希
    if needs_rehash(&user.password_hash) {
        match hash_password(&login_request.password) {
            Ok(password_hash) => {
                let update = UpdateUserRequest {
                    password: Some(password_hash),
                    ..Default::default()
                };
                if let Err(e) = storage.update_user(user.id, update).await {
                    error!("Failed to rehash password for {}: {}", user.username, e);
                }
            }
            Err(e) => error!("Failed to rehash password for {}: {}", user.username, e),
        }
    }

    // 4. 更新最后登录时间并记录活动
    if let Err(e) = storage.update_last_login(user.id).await {
        error!("Failed to update last login for {}: {}", user.username, e);
    }
    activity::record(&storage, user.id, ActivityType::Login, None, None).await;

    // 5. 生成令牌对
    let token_pair = user
        .generate_token_pair(
            login_request
                .remember_me
                .then(|| chrono::Duration::days(config.jwt.refresh_token_remember_me_expiry)),
        )
        .map_err(|e| {
            error!("Failed to generate JWT token: {}", e);
            ApiError::internal("Login failed, unable to generate token.")
        })?;

    info!("User {} logged in successfully", user.username);

    let response = LoginResponse {
        access_token: token_pair.access_token.clone(),
        expires_in: config.jwt.access_token_expiry * 60, // 转换为秒
        user,
        created_at: chrono::Utc::now(),
    };

    Ok(HttpResponse::Ok()
        .cookie(jwt::JwtUtils::create_refresh_token_cookie(&token_pair))
        .json(ApiResponse::success(response, "Login successful")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use actix_web::http::StatusCode;

    fn user(role: UserRole, is_approved: bool, is_active: bool) -> User {
        let now = chrono::Utc::now();
        User {
            id: 1,
            username: "user".to_string(),
            password_hash: String::new(),
            role,
            name: "사용자".to_string(),
            email: None,
            phone: None,
            is_approved,
            is_active,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_login_gates() {
        assert!(check_login_allowed(&user(UserRole::Student, true, true)).is_ok());
        // 学生与家长不受审批影响
        assert!(check_login_allowed(&user(UserRole::Parent, false, true)).is_ok());

        let err = check_login_allowed(&user(UserRole::Teacher, false, true)).unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.code, ErrorCode::TeacherNotApproved);

        let err = check_login_allowed(&user(UserRole::Teacher, true, false)).unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.code, ErrorCode::AccountInactive);
    }
}
