//! SeaORM 实体定义
//!
//! 这些实体用于数据库操作，与 models 模块中的业务实体分离。
//! Storage 层使用这些实体进行 CRUD 操作，然后转换为 models 中的业务实体。

pub mod prelude;

pub mod activity_logs;
pub mod calendar_events;
pub mod classes;
pub mod content_blocks;
pub mod course_students;
pub mod courses;
pub mod notifications;
pub mod parent_student_relations;
pub mod qna;
pub mod students;
pub mod subjects;
pub mod system_settings;
pub mod system_settings_audit;
pub mod test_questions;
pub mod test_submissions;
pub mod tests;
pub mod users;
pub mod video_progress;
