//! 注册：学生、家长、教师三种入口共用一套校验与建号流程，
//! 管理员创建用户时也走这里（跳过开放注册开关）。

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::info;

use super::AuthService;
use crate::errors::StudyLinkError;
use crate::models::{
    ApiResponse, ErrorCode,
    auth::{
        requests::{RegisterParentRequest, RegisterStudentRequest, RegisterTeacherRequest},
        responses::{RegisterResponse, StudentNumberCheckResponse},
    },
    users::{
        entities::{Relationship, User, UserRole},
        requests::{CreateUserRequest, NewParentLink, NewStudentProfile},
    },
};
use crate::services::common::{ApiError, ServiceResult, invalid};
use crate::services::system::DynamicConfig;
use crate::storage::Storage;
use crate::utils::password::hash_password;
use crate::utils::student_number::{generate_student_number, normalize_student_number};
use crate::utils::validate::{
    normalize_optional, validate_email, validate_name, validate_password, validate_username,
};

/// 每个学生最多关联的家长数
pub const MAX_PARENT_LINKS: u64 = 2;
const STUDENT_NUMBER_ATTEMPTS: usize = 10;

/// 一次注册的全部输入
#[derive(Debug, Clone)]
pub(crate) struct Registration {
    pub username: String,
    pub password: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: UserRole,
    pub grade: Option<i32>,
    pub student_number: Option<String>,
    pub relationship: Option<Relationship>,
    pub is_approved: bool,
}

/// 字段校验，返回规范化后的注册信息
pub(crate) fn validate_registration(mut reg: Registration) -> ServiceResult<Registration> {
    reg.username = reg.username.trim().to_string();
    reg.name = reg.name.trim().to_string();
    reg.email = normalize_optional(reg.email);
    reg.phone = normalize_optional(reg.phone);

    validate_username(&reg.username).map_err(invalid(ErrorCode::UserNameInvalid))?;
    validate_password(&reg.password).map_err(invalid(ErrorCode::UserPasswordInvalid))?;
    validate_name(&reg.name).map_err(invalid(ErrorCode::UserNameRequired))?;
    if let Some(email) = &reg.email {
        validate_email(email).map_err(invalid(ErrorCode::UserEmailInvalid))?;
    }

    if reg.role == UserRole::Parent {
        let raw = reg.student_number.as_deref().ok_or_else(|| {
            ApiError::bad_request(
                ErrorCode::ParentLinkRequired,
                "student_number is required for parent accounts.",
            )
        })?;
        let number = normalize_student_number(raw).ok_or_else(|| {
            ApiError::bad_request(
                ErrorCode::StudentNumberInvalid,
                "Student number must be 8 characters of A-Z and 0-9.",
            )
        })?;
        reg.student_number = Some(number);
    }

    Ok(reg)
}

fn map_create_error(err: StudyLinkError) -> ApiError {
    if err.is_conflict() {
        ApiError::conflict(ErrorCode::UserNameAlreadyExists, "Username already exists.")
    } else {
        ApiError::from(err)
    }
}

pub(crate) async fn unique_student_number(storage: &Arc<dyn Storage>) -> ServiceResult<String> {
    for _ in 0..STUDENT_NUMBER_ATTEMPTS {
        let candidate = generate_student_number();
        if !storage
            .student_number_exists(&candidate)
            .await
            .map_err(ApiError::from)?
        {
            return Ok(candidate);
        }
    }
    Err(ApiError::internal("Failed to allocate a student number."))
}

/// 校验并创建账号
pub(crate) async fn register_user(
    storage: &Arc<dyn Storage>,
    reg: Registration,
) -> ServiceResult<RegisterResponse> {
    let reg = validate_registration(reg)?;

    if storage
        .get_user_by_username(&reg.username)
        .await
        .map_err(ApiError::from)?
        .is_some()
    {
        return Err(ApiError::conflict(
            ErrorCode::UserNameAlreadyExists,
            "Username already exists.",
        ));
    }

    let password_hash = hash_password(&reg.password).map_err(|e| {
        tracing::error!("Password hashing failed: {}", e);
        ApiError::internal("Registration failed.")
    })?;

    let create = CreateUserRequest {
        username: reg.username.clone(),
        password: password_hash,
        role: reg.role.clone(),
        name: reg.name.clone(),
        email: reg.email.clone(),
        phone: reg.phone.clone(),
        is_approved: reg.is_approved,
    };

    let (user, student_number): (User, Option<String>) = match reg.role {
        UserRole::Student => {
            let number = unique_student_number(storage).await?;
            let (user, profile) = storage
                .create_student_user(
                    create,
                    NewStudentProfile {
                        student_number: number,
                        grade: reg.grade,
                        class_id: None,
                    },
                )
                .await
                .map_err(map_create_error)?;
            (user, Some(profile.student_number))
        }
        UserRole::Parent => {
            let number = reg.student_number.clone().unwrap_or_default();
            let (student, _) = storage
                .get_student_by_number(&number)
                .await
                .map_err(ApiError::from)?
                .ok_or_else(|| {
                    ApiError::not_found(ErrorCode::StudentNotFound, "Student not found.")
                })?;

            let links = storage
                .count_parent_links(student.id)
                .await
                .map_err(ApiError::from)?;
            if links >= MAX_PARENT_LINKS {
                return Err(ApiError::conflict(
                    ErrorCode::ParentLinkLimitReached,
                    "This student already has the maximum number of linked parents.",
                ));
            }

            let user = storage
                .create_parent_user(
                    create,
                    NewParentLink {
                        student_id: student.id,
                        relationship: reg.relationship.clone().unwrap_or_default(),
                    },
                )
                .await
                .map_err(map_create_error)?;
            (user, None)
        }
        _ => {
            let user = storage.create_user(create).await.map_err(map_create_error)?;
            (user, None)
        }
    };

    info!("Registered {} account {}", user.role, user.username);

    Ok(RegisterResponse {
        user_id: user.id,
        username: user.username,
        name: user.name,
        pending_approval: user.role == UserRole::Teacher && !user.is_approved,
        role: user.role,
        is_approved: user.is_approved,
        student_number,
    })
}

async fn ensure_registration_open() -> ServiceResult<()> {
    if DynamicConfig::allow_registrations().await {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            ErrorCode::RegistrationDisabled,
            "Registration is currently disabled.",
        ))
    }
}

fn created(response: RegisterResponse) -> HttpResponse {
    let message = if response.pending_approval {
        "Registration successful, waiting for admin approval"
    } else {
        "Registration successful"
    };
    HttpResponse::Created().json(ApiResponse::success(response, message))
}

pub async fn register_student(
    service: &AuthService,
    body: RegisterStudentRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    ensure_registration_open().await?;
    let storage = service.get_storage(request)?;

    let response = register_user(
        &storage,
        Registration {
            username: body.username,
            password: body.password,
            name: body.name,
            email: body.email,
            phone: body.phone,
            role: UserRole::Student,
            grade: body.grade,
            student_number: None,
            relationship: None,
            is_approved: true,
        },
    )
    .await?;

    Ok(created(response))
}

pub async fn register_parent(
    service: &AuthService,
    body: RegisterParentRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    ensure_registration_open().await?;
    let storage = service.get_storage(request)?;

    let response = register_user(
        &storage,
        Registration {
            username: body.username,
            password: body.password,
            name: body.name,
            email: body.email,
            phone: body.phone,
            role: UserRole::Parent,
            grade: None,
            student_number: Some(body.student_number),
            relationship: body.relationship,
            is_approved: true,
        },
    )
    .await?;

    Ok(created(response))
}

pub async fn register_teacher(
    service: &AuthService,
    body: RegisterTeacherRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    ensure_registration_open().await?;
    let storage = service.get_storage(request)?;

    // 开放注册时自动审批
    let is_approved = DynamicConfig::allow_registrations().await;
    let response = register_user(
        &storage,
        Registration {
            username: body.username,
            password: body.password,
            name: body.name,
            email: body.email,
            phone: body.phone,
            role: UserRole::Teacher,
            grade: None,
            student_number: None,
            relationship: None,
            is_approved,
        },
    )
    .await?;

    Ok(created(response))
}

/// 家长注册前校验学号
pub async fn check_student_number(
    service: &AuthService,
    raw_number: &str,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    let invalid_response = StudentNumberCheckResponse {
        is_valid: false,
        student_name: None,
        can_link: None,
    };

    let response = match normalize_student_number(raw_number) {
        None => invalid_response,
        Some(number) => match storage
            .get_student_by_number(&number)
            .await
            .map_err(ApiError::from)?
        {
            None => invalid_response,
            Some((student, _)) => {
                let links = storage
                    .count_parent_links(student.id)
                    .await
                    .map_err(ApiError::from)?;
                StudentNumberCheckResponse {
                    is_valid: true,
                    student_name: Some(student.name),
                    can_link: Some(links < MAX_PARENT_LINKS),
                }
            }
        },
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        response,
        "Student number checked",
    )))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::storage::sea_orm_storage::SeaOrmStorage;
    use actix_web::http::StatusCode;

    pub(crate) fn registration(username: &str, role: UserRole) -> Registration {
        Registration {
            username: username.to_string(),
            password: "secret1".to_string(),
            name: "김민지".to_string(),
            email: None,
            phone: None,
            role,
            grade: None,
            student_number: None,
            relationship: None,
            is_approved: true,
        }
    }

    async fn storage() -> Arc<dyn Storage> {
        Arc::new(SeaOrmStorage::in_memory().await)
    }

    #[test]
    fn test_validation_rules() {
        let mut reg = registration("  minji_01 ", UserRole::Student);
        reg.email = Some("  ".to_string());
        let normalized = validate_registration(reg).unwrap();
        assert_eq!(normalized.username, "minji_01");
        assert_eq!(normalized.email, None);

        let err = validate_registration(registration("ab", UserRole::Student)).unwrap_err();
        assert_eq!(err.code, ErrorCode::UserNameInvalid);

        let mut short = registration("minji", UserRole::Student);
        short.password = "12345".to_string();
        assert_eq!(
            validate_registration(short).unwrap_err().code,
            ErrorCode::UserPasswordInvalid
        );

        let mut bad_email = registration("minji", UserRole::Student);
        bad_email.email = Some("nope".to_string());
        assert_eq!(
            validate_registration(bad_email).unwrap_err().code,
            ErrorCode::UserEmailInvalid
        );
    }

    #[test]
    fn test_parent_needs_valid_number() {
        let err = validate_registration(registration("mom", UserRole::Parent)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ParentLinkRequired);

        let mut reg = registration("mom", UserRole::Parent);
        reg.student_number = Some(" ab12cd34 ".to_string());
        let normalized = validate_registration(reg).unwrap();
        assert_eq!(normalized.student_number.as_deref(), Some("AB12CD34"));
    }

    #[tokio::test]
    async fn test_student_gets_number_and_duplicates_conflict() {
        let storage = storage().await;
        let response = register_user(&storage, registration("minji", UserRole::Student))
            .await
            .unwrap();
        let number = response.student_number.unwrap();
        assert_eq!(number.len(), 8);
        assert!(!response.pending_approval);

        let err = register_user(&storage, registration("minji", UserRole::Teacher))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_parent_link_limit() {
        let storage = storage().await;
        let student = register_user(&storage, registration("kid", UserRole::Student))
            .await
            .unwrap();
        let number = student.student_number.unwrap();

        for username in ["dad", "mom"] {
            let mut reg = registration(username, UserRole::Parent);
            reg.student_number = Some(number.to_lowercase());
            register_user(&storage, reg).await.unwrap();
        }

        let mut third = registration("aunt", UserRole::Parent);
        third.student_number = Some(number);
        let err = register_user(&storage, third).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ParentLinkLimitReached);

        let mut unknown = registration("uncle", UserRole::Parent);
        unknown.student_number = Some("ZZZZ9999".to_string());
        let err = register_user(&storage, unknown).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unapproved_teacher_is_pending() {
        let storage = storage().await;
        let mut reg = registration("teacher", UserRole::Teacher);
        reg.is_approved = false;
        let response = register_user(&storage, reg).await.unwrap();
        assert!(response.pending_approval);
        assert!(!response.is_approved);
    }
}
