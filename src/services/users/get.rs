use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use super::UserService;
use crate::models::{
    ApiResponse, ErrorCode,
    users::{
        entities::{User, UserRole},
        responses::MeResponse,
    },
};
use crate::services::common::{ApiError, ServiceResult, current_user};
use crate::storage::Storage;

async fn with_profile(storage: &Arc<dyn Storage>, user: User) -> ServiceResult<MeResponse> {
    let student_profile = if user.role == UserRole::Student {
        storage
            .get_student_profile(user.id)
            .await
            .map_err(ApiError::from)?
    } else {
        None
    };
    Ok(MeResponse {
        user,
        student_profile,
    })
}

/// 查看他人资料的权限
pub(crate) async fn can_view_user(
    storage: &Arc<dyn Storage>,
    viewer: &User,
    target: &User,
) -> ServiceResult<bool> {
    if viewer.id == target.id {
        return Ok(true);
    }
    Ok(match viewer.role {
        UserRole::Admin => true,
        UserRole::Teacher => target.role == UserRole::Student,
        UserRole::Parent => {
            target.role == UserRole::Student
                && storage
                    .is_parent_of(viewer.id, target.id)
                    .await
                    .map_err(ApiError::from)?
        }
        UserRole::Student => false,
    })
}

pub async fn get_me(service: &UserService, request: &HttpRequest) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        with_profile(&storage, user).await?,
        "User retrieved successfully",
    )))
}

pub async fn get_user(
    service: &UserService,
    user_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let viewer = current_user(request)?;

    let target = storage
        .get_user_by_id(user_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found(ErrorCode::UserNotFound, "User not found."))?;

    if !can_view_user(&storage, &viewer, &target).await? {
        return Err(ApiError::forbidden(
            ErrorCode::Forbidden,
            "You do not have permission to view this user.",
        )
        .into());
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        with_profile(&storage, target).await?,
        "User retrieved successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::register::{register_user, tests::registration};
    use crate::storage::sea_orm_storage::SeaOrmStorage;

    async fn load(storage: &Arc<dyn Storage>, id: i64) -> User {
        storage.get_user_by_id(id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_view_permissions() {
        let storage: Arc<dyn Storage> = Arc::new(SeaOrmStorage::in_memory().await);
        let kid = register_user(&storage, registration("kid", UserRole::Student))
            .await
            .unwrap();
        let other = register_user(&storage, registration("other", UserRole::Student))
            .await
            .unwrap();
        let mut parent = registration("mom", UserRole::Parent);
        parent.student_number = kid.student_number.clone();
        let parent = register_user(&storage, parent).await.unwrap();
        let teacher = register_user(&storage, registration("teach", UserRole::Teacher))
            .await
            .unwrap();

        let kid = load(&storage, kid.user_id).await;
        let other = load(&storage, other.user_id).await;
        let parent = load(&storage, parent.user_id).await;
        let teacher = load(&storage, teacher.user_id).await;

        assert!(can_view_user(&storage, &kid, &kid).await.unwrap());
        assert!(!can_view_user(&storage, &kid, &other).await.unwrap());
        assert!(can_view_user(&storage, &teacher, &kid).await.unwrap());
        assert!(!can_view_user(&storage, &teacher, &parent).await.unwrap());
        assert!(can_view_user(&storage, &parent, &kid).await.unwrap());
        assert!(!can_view_user(&storage, &parent, &other).await.unwrap());

        let me = with_profile(&storage, kid).await.unwrap();
        assert_eq!(me.student_profile.unwrap().student_number.len(), 8);
    }
}
