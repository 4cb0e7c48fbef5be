pub mod activity;
pub mod admin;
pub mod auth;
pub mod calendar;
pub mod courses;
pub mod notifications;
pub mod parent;
pub mod qna;
pub mod reports;
pub mod system;
pub mod tests;
pub mod users;
pub mod video_progress;

pub use activity::configure_activity_routes;
pub use admin::configure_admin_routes;
pub use auth::configure_auth_routes;
pub use calendar::configure_calendar_routes;
pub use courses::configure_course_routes;
pub use notifications::configure_notification_routes;
pub use parent::configure_parent_routes;
pub use qna::configure_qna_routes;
pub use reports::configure_report_routes;
pub use system::configure_system_routes;
pub use tests::configure_test_routes;
pub use users::configure_user_routes;
pub use video_progress::configure_video_progress_routes;

use actix_web::{Resource, guard, web};

/// 只匹配 GET 的资源；其他方法继续匹配后面的路由
pub(crate) fn get_resource(path: &str) -> Resource {
    web::resource(path).guard(guard::Get())
}

/// 只匹配 POST 的资源
pub(crate) fn post_resource(path: &str) -> Resource {
    web::resource(path).guard(guard::Post())
}

/// 按顺序注册全部路由
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_system_routes)
        .configure(configure_auth_routes)
        .configure(configure_user_routes)
        .configure(configure_admin_routes)
        .configure(configure_course_routes)
        .configure(configure_test_routes)
        .configure(configure_video_progress_routes)
        .configure(configure_notification_routes)
        .configure(configure_activity_routes)
        .configure(configure_report_routes)
        .configure(configure_parent_routes)
        .configure(configure_qna_routes)
        .configure(configure_calendar_routes);
}
