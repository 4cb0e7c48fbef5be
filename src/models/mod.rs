//! 数据模型定义
//!
//! 每个业务域分为 entities（业务实体）、requests（请求参数）、responses（响应结构）。

pub mod activity;
pub mod admin;
pub mod auth;
pub mod calendar;
pub mod classes;
pub mod common;
pub mod courses;
pub mod notifications;
pub mod parent;
pub mod qna;
pub mod reports;
pub mod subjects;
pub mod system;
pub mod tests;
pub mod users;
pub mod video_progress;

pub use common::{ApiResponse, PaginationInfo, PaginationQuery};

/// 程序启动时间
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

/// 业务错误码
///
/// 0 表示成功；1xxx 通用/认证，2xxx 用户，3xxx 教务，4xxx 课程，5xxx 测试，6xxx 其他。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    Conflict = 1009,
    RateLimitExceeded = 1029,
    InternalServerError = 1500,
    MaintenanceMode = 1503,

    // 认证
    AuthFailed = 1100,
    TeacherNotApproved = 1101,
    RegistrationDisabled = 1102,
    RegisterFailed = 1103,
    AccountInactive = 1104,

    // 用户
    UserNotFound = 2000,
    UserNameInvalid = 2001,
    UserNameAlreadyExists = 2002,
    UserEmailInvalid = 2003,
    UserPasswordInvalid = 2004,
    UserUpdateFailed = 2005,
    UserDeleteFailed = 2006,
    UserCreationFailed = 2007,
    UserNameRequired = 2008,
    StudentNotFound = 2010,
    StudentNumberInvalid = 2011,
    ParentLinkLimitReached = 2012,
    ParentLinkRequired = 2013,

    // 教务
    SubjectNotFound = 3000,
    SubjectInactive = 3001,
    SubjectInUse = 3002,
    SubjectInvalid = 3003,
    ClassNotFound = 3010,
    ClassFull = 3011,
    ClassPermissionDenied = 3012,
    ClassInvalid = 3013,
    TeacherInvalid = 3014,

    // 课程
    CourseNotFound = 4000,
    CoursePermissionDenied = 4001,
    CourseNotPublished = 4002,
    CourseInvalid = 4003,
    CourseTeacherRequired = 4004,
    BlockNotFound = 4010,
    BlockInvalid = 4011,
    InvalidYoutubeUrl = 4012,
    ReorderInvalid = 4013,

    // 测试
    TestNotFound = 5000,
    TestPermissionDenied = 5001,
    TestNotPublished = 5002,
    TestDeadlinePassed = 5003,
    TestAlreadySubmitted = 5004,
    TestInvalid = 5005,
    QuestionNotFound = 5010,
    QuestionInvalid = 5011,
    SubmissionNotFound = 5020,
    SubmissionInvalid = 5021,

    // 其他
    QnaNotFound = 6000,
    QnaInvalid = 6001,
    NotificationNotFound = 6010,
    CalendarEventNotFound = 6020,
    CalendarEventInvalid = 6021,
    DateRangeInvalid = 6030,
    SettingInvalid = 6040,
    VideoProgressInvalid = 6050,
}
