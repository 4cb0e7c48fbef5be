pub mod activity;
pub mod admin;
pub mod auth;
pub mod calendar;
pub mod common;
pub mod courses;
pub mod notifications;
pub mod parent;
pub mod qna;
pub mod reports;
pub mod system;
pub mod tests;
pub mod users;
pub mod video_progress;

pub use activity::ActivityService;
pub use admin::AdminService;
pub use auth::AuthService;
pub use calendar::CalendarService;
pub use courses::CourseService;
pub use notifications::NotificationService;
pub use parent::ParentService;
pub use qna::QnaService;
pub use reports::ReportService;
pub use system::SystemService;
pub use tests::TestService;
pub use users::UserService;
pub use video_progress::VideoProgressService;
