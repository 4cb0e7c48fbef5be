use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::AdminService;
use crate::models::{
    ApiResponse,
    admin::responses::{AdminOverview, OverviewStats, RecentActivity, RecentCourse, RecentUser},
    courses::requests::CourseScope,
    users::entities::{UserRole, UserStatusFilter},
};
use crate::services::common::ApiError;

const RECENT_USERS: u64 = 5;
const RECENT_COURSES: usize = 5;
const RECENT_ACTIVITIES: u64 = 10;

pub async fn get_overview(service: &AdminService, request: &HttpRequest) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    let count_active = |role: UserRole| {
        let storage = storage.clone();
        async move {
            storage
                .count_users(Some(role), Some(UserStatusFilter::Active))
                .await
                .map(|n| n as i64)
                .map_err(ApiError::from)
        }
    };

    let stats = OverviewStats {
        total_students: count_active(UserRole::Student).await?,
        total_teachers: count_active(UserRole::Teacher).await?,
        total_parents: count_active(UserRole::Parent).await?,
        total_courses: storage.count_courses().await.map_err(ApiError::from)? as i64,
        pending_teachers: storage
            .count_users(Some(UserRole::Teacher), Some(UserStatusFilter::Pending))
            .await
            .map_err(ApiError::from)? as i64,
    };

    let recent_users = storage
        .list_recent_users(RECENT_USERS)
        .await
        .map_err(ApiError::from)?
        .into_iter()
        .map(|u| RecentUser {
            id: u.id,
            name: u.name,
            role: u.role,
            created_at: u.created_at,
        })
        .collect();

    // 课程列表按创建时间倒序
    let recent_courses = storage
        .list_course_items(CourseScope::All)
        .await
        .map_err(ApiError::from)?
        .into_iter()
        .take(RECENT_COURSES)
        .map(|item| RecentCourse {
            id: item.course.id,
            title: item.course.title,
            teacher_name: item.teacher_name,
            created_at: item.course.created_at,
        })
        .collect();

    let recent_activities = storage
        .list_activities(None, None, RECENT_ACTIVITIES)
        .await
        .map_err(ApiError::from)?
        .into_iter()
        .map(|a| RecentActivity {
            id: a.log.id,
            activity_type: a.log.activity_type.to_string(),
            user_name: a.user_name,
            created_at: a.log.created_at,
        })
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        AdminOverview {
            stats,
            recent_users,
            recent_courses,
            recent_activities,
        },
        "Overview retrieved successfully",
    )))
}

pub async fn list_courses(service: &AdminService, request: &HttpRequest) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let courses = storage
        .list_course_items(CourseScope::All)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        courses,
        "Courses retrieved successfully",
    )))
}
