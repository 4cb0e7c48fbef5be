use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::NotificationService;
use crate::models::notifications::responses::MarkAllReadResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::common::{ApiError, current_user};

pub async fn mark_read(
    service: &NotificationService,
    request: &HttpRequest,
    id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    // 只能操作自己的通知
    if !storage
        .mark_notification_read(id, user.id)
        .await
        .map_err(ApiError::from)?
    {
        return Err(ApiError::not_found(
            ErrorCode::NotificationNotFound,
            "Notification not found.",
        )
        .into());
    }

    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty(
        "Notification marked as read",
    )))
}

pub async fn mark_all_read(
    service: &NotificationService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let updated = storage
        .mark_all_notifications_read(user.id)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        MarkAllReadResponse { updated },
        "All notifications marked as read",
    )))
}
