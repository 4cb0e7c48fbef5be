//! 预导入模块，方便使用

pub use super::activity_logs::{
    ActiveModel as ActivityLogActiveModel, Entity as ActivityLogs, Model as ActivityLogModel,
};
pub use super::calendar_events::{
    ActiveModel as CalendarEventActiveModel, Entity as CalendarEvents,
    Model as CalendarEventModel,
};
pub use super::classes::{ActiveModel as ClassActiveModel, Entity as Classes, Model as ClassModel};
pub use super::content_blocks::{
    ActiveModel as ContentBlockActiveModel, Entity as ContentBlocks, Model as ContentBlockModel,
};
pub use super::course_students::{
    ActiveModel as CourseStudentActiveModel, Entity as CourseStudents,
    Model as CourseStudentModel,
};
pub use super::courses::{ActiveModel as CourseActiveModel, Entity as Courses, Model as CourseModel};
pub use super::notifications::{
    ActiveModel as NotificationActiveModel, Entity as Notifications, Model as NotificationModel,
};
pub use super::parent_student_relations::{
    ActiveModel as ParentLinkActiveModel, Entity as ParentStudentRelations,
    Model as ParentLinkModel,
};
pub use super::qna::{ActiveModel as QnaActiveModel, Entity as Qnas, Model as QnaModel};
pub use super::students::{
    ActiveModel as StudentActiveModel, Entity as Students, Model as StudentModel,
};
pub use super::subjects::{
    ActiveModel as SubjectActiveModel, Entity as Subjects, Model as SubjectModel,
};
pub use super::system_settings::{
    ActiveModel as SystemSettingActiveModel, Entity as SystemSettings, Model as SystemSettingModel,
};
pub use super::system_settings_audit::{
    ActiveModel as SettingAuditActiveModel, Entity as SystemSettingsAudits,
    Model as SettingAuditModel,
};
pub use super::test_questions::{
    ActiveModel as TestQuestionActiveModel, Entity as TestQuestions, Model as TestQuestionModel,
};
pub use super::test_submissions::{
    ActiveModel as TestSubmissionActiveModel, Entity as TestSubmissions,
    Model as TestSubmissionModel,
};
pub use super::tests::{ActiveModel as TestActiveModel, Entity as Tests, Model as TestModel};
pub use super::users::{ActiveModel as UserActiveModel, Entity as Users, Model as UserModel};
pub use super::video_progress::{
    ActiveModel as VideoProgressActiveModel, Entity as VideoProgresses,
    Model as VideoProgressModel,
};
