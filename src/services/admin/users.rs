use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::info;

use super::AdminService;
use crate::models::{
    ApiResponse, ErrorCode,
    admin::requests::{AdminCreateUserRequest, AdminUpdateUserRequest},
    users::{
        entities::{User, UserRole},
        requests::{NewStudentProfile, UpdateUserRequest, UserListParams},
        responses::UserResponse,
    },
};
use crate::services::auth::register::{Registration, register_user, unique_student_number};
use crate::services::common::{ApiError, ServiceResult, current_user, evict_cached_user, invalid};
use crate::services::system::DynamicConfig;
use crate::storage::Storage;
use crate::utils::validate::{normalize_optional, validate_email, validate_name};

fn user_not_found() -> ApiError {
    ApiError::not_found(ErrorCode::UserNotFound, "User not found.")
}

async fn load_user(storage: &Arc<dyn Storage>, id: i64) -> ServiceResult<User> {
    storage
        .get_user_by_id(id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(user_not_found)
}

pub async fn create_user(
    service: &AdminService,
    request: &HttpRequest,
    body: AdminCreateUserRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    if body.role == UserRole::Admin {
        return Err(ApiError::bad_request(
            ErrorCode::BadRequest,
            "Role must be one of student, teacher or parent.",
        )
        .into());
    }

    // 未指定时：教师跟随自动审批设置，其他角色默认未审批
    let is_approved = match body.is_approved {
        Some(approved) => approved,
        None if body.role == UserRole::Teacher => DynamicConfig::allow_registrations().await,
        None => false,
    };

    let response = register_user(
        &storage,
        Registration {
            username: body.username,
            password: body.password,
            name: body.name,
            email: body.email,
            phone: body.phone,
            role: body.role,
            grade: None,
            student_number: body.student_number,
            relationship: body.relationship,
            is_approved,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(response, "User created successfully")))
}

pub async fn list_users(
    service: &AdminService,
    request: &HttpRequest,
    params: UserListParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let users = storage
        .list_users_with_pagination(params.into())
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(users, "Users retrieved successfully")))
}

async fn apply_update(
    storage: &Arc<dyn Storage>,
    request: &HttpRequest,
    id: i64,
    update: UpdateUserRequest,
) -> ServiceResult<User> {
    let user = storage
        .update_user(id, update)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(user_not_found)?;
    // 缓存中的旧资料立即失效
    evict_cached_user(request, id).await;
    Ok(user)
}

pub async fn approve_user(
    service: &AdminService,
    request: &HttpRequest,
    id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = apply_update(
        &storage,
        request,
        id,
        UpdateUserRequest {
            is_approved: Some(true),
            ..Default::default()
        },
    )
    .await?;
    info!("User {} approved", user.username);

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        UserResponse { user },
        "User approved successfully",
    )))
}

pub async fn deactivate_user(
    service: &AdminService,
    request: &HttpRequest,
    id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let admin = current_user(request)?;
    if admin.id == id {
        return Err(ApiError::bad_request(
            ErrorCode::UserUpdateFailed,
            "You cannot deactivate your own account.",
        )
        .into());
    }

    let user = apply_update(
        &storage,
        request,
        id,
        UpdateUserRequest {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await?;
    info!("User {} deactivated", user.username);

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        UserResponse { user },
        "User deactivated successfully",
    )))
}

/// 把管理端请求转换为存储层更新，并校验字段
pub(crate) fn build_update(body: &AdminUpdateUserRequest) -> ServiceResult<UpdateUserRequest> {
    let name = match &body.name {
        Some(name) => {
            validate_name(name).map_err(invalid(ErrorCode::UserNameRequired))?;
            Some(name.trim().to_string())
        }
        None => None,
    };
    let email = match &body.email {
        Some(email) => {
            let email = normalize_optional(email.clone());
            if let Some(email) = &email {
                validate_email(email).map_err(invalid(ErrorCode::UserEmailInvalid))?;
            }
            Some(email)
        }
        None => None,
    };
    if body.role == Some(UserRole::Admin) {
        return Err(ApiError::bad_request(
            ErrorCode::BadRequest,
            "Role must be one of student, teacher or parent.",
        ));
    }

    Ok(UpdateUserRequest {
        name,
        email,
        phone: body.phone.clone().map(normalize_optional),
        password: None,
        role: body.role.clone(),
        is_approved: body.is_approved,
        is_active: body.is_active,
    })
}

pub async fn update_user(
    service: &AdminService,
    request: &HttpRequest,
    id: i64,
    body: AdminUpdateUserRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let existing = load_user(&storage, id).await?;
    let update = build_update(&body)?;
    let new_role = update.role.clone().unwrap_or(existing.role.clone());

    // 班级只对学生有效
    let class_change = match body.class_id {
        Some(Some(class_id)) if new_role == UserRole::Student => {
            storage
                .get_class_by_id(class_id)
                .await
                .map_err(ApiError::from)?
                .ok_or_else(|| ApiError::not_found(ErrorCode::ClassNotFound, "Class not found."))?;
            Some(Some(class_id))
        }
        Some(None) if new_role == UserRole::Student => Some(None),
        _ => None,
    };

    let user = apply_update(&storage, request, id, update).await?;

    if new_role == UserRole::Student {
        // 改为学生时补建档案
        let has_profile = storage
            .get_student_profile(id)
            .await
            .map_err(ApiError::from)?
            .is_some();
        if !has_profile {
            let student_number = unique_student_number(&storage).await?;
            storage
                .create_student_profile(
                    id,
                    NewStudentProfile {
                        student_number,
                        grade: None,
                        class_id: None,
                    },
                )
                .await
                .map_err(ApiError::from)?;
        }
        if let Some(class_id) = class_change {
            storage
                .set_student_class(id, class_id)
                .await
                .map_err(ApiError::from)?;
        }
    } else if existing.role == UserRole::Student {
        // 不再是学生时移出班级
        storage
            .set_student_class(id, None)
            .await
            .map_err(ApiError::from)?;
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        UserResponse { user },
        "User updated successfully",
    )))
}

pub async fn delete_user(
    service: &AdminService,
    request: &HttpRequest,
    id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let admin = current_user(request)?;

    if admin.id == id {
        return Err(ApiError::bad_request(
            ErrorCode::UserDeleteFailed,
            "You cannot delete your own account.",
        )
        .into());
    }

    if !storage.delete_user(id).await.map_err(ApiError::from)? {
        return Err(user_not_found().into());
    }
    evict_cached_user(request, id).await;
    info!("User {} deleted by {}", id, admin.username);

    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty("User deleted successfully")))
}
