use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::NotificationService;
use crate::models::ApiResponse;
use crate::models::notifications::{
    requests::NotificationListParams, responses::UnreadCountResponse,
};
use crate::services::common::{ApiError, current_user};

const DEFAULT_LIMIT: u64 = 20;
const MAX_LIMIT: u64 = 100;

pub(crate) fn clamp_limit(limit: Option<u64>) -> u64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

pub async fn list_notifications(
    service: &NotificationService,
    request: &HttpRequest,
    params: NotificationListParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let notifications = storage
        .list_notifications(user.id, clamp_limit(params.limit))
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        notifications,
        "Notifications retrieved successfully",
    )))
}

pub async fn unread_count(
    service: &NotificationService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let unread_count = storage
        .count_unread_notifications(user.id)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        UnreadCountResponse { unread_count },
        "Unread count retrieved successfully",
    )))
}
