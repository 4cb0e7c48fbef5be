//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod activity;
mod blocks;
mod calendar;
mod classes;
pub(crate) mod courses;
pub(crate) mod exams;
mod notifications;
mod qna;
mod reports;
mod students;
mod subjects;
mod submissions;
mod system_settings;
mod users;
mod video_progress;

use crate::config::AppConfig;
use crate::errors::{Result, StudyLinkError};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 创建新的 SeaORM 存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        let db_url = Self::build_database_url(&config.database.url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite://") {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        let storage = Self::from_connection(db).await?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(storage)
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| StudyLinkError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory")
            .pragma("mmap_size", "536870912")
            .pragma("wal_autocheckpoint", "1000");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.database.pool_size)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(opt)
            .await
            .map_err(|e| StudyLinkError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.database.pool_size)
            .min_connections(5)
            .connect_timeout(Duration::from_secs(config.database.timeout))
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| StudyLinkError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite://") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") || url == ":memory:" {
            Ok(format!("sqlite://{}?mode=rwc", url))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(StudyLinkError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }

    /// 从已有连接创建（运行迁移）
    pub async fn from_connection(db: DatabaseConnection) -> Result<Self> {
        Migrator::up(&db, None)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("数据库迁移失败: {e}")))?;
        Ok(Self { db })
    }

    /// 内存 SQLite（测试用）
    #[cfg(test)]
    pub(crate) async fn in_memory() -> Self {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(opt).await.expect("connect sqlite memory");
        Self::from_connection(db).await.expect("run migrations")
    }
}

// Storage trait 实现
use std::collections::HashMap;

use crate::models::{
    activity::{
        entities::{ActivityLog, ActivityLogWithUser, ActivityType},
        requests::NewActivity,
    },
    calendar::{
        entities::CalendarEvent,
        requests::{CalendarEventQuery, EventFields},
    },
    classes::{
        entities::{Class, ClassStudent, ClassSummary},
        requests::ClassFields,
    },
    courses::{
        entities::{ContentBlock, Course, CourseStudent},
        requests::{BlockUpdate, CourseScope, CourseUpdate, NewContentBlock, NewCourse},
        responses::{CourseListItem, CourseWithNames},
    },
    notifications::{entities::Notification, requests::NewNotification},
    parent::responses::ParentChildSummary,
    qna::{
        entities::{Qna, QnaDetail},
        requests::QnaVisibility,
    },
    reports::responses::{AdminActivityReport, ClassReport, StudentReport},
    subjects::{
        entities::Subject,
        requests::{CreateSubjectRequest, UpdateSubjectRequest},
    },
    system::{
        entities::SystemSetting, requests::SettingAuditQuery, responses::SettingAuditListResponse,
    },
    tests::{
        entities::{Test, TestQuestion, TestSubmission},
        requests::{NewQuestion, NewSubmission, SubmissionGrade, TestFields, UpdateQuestionRequest},
        responses::{SubmissionStats, SubmissionWithStudent},
    },
    users::{
        entities::{StudentProfile, User, UserRole, UserStatusFilter},
        requests::{
            CreateUserRequest, NewParentLink, NewStudentProfile, UpdateUserRequest, UserListQuery,
        },
        responses::UserListResponse,
    },
    video_progress::{
        entities::VideoProgress, requests::ProgressUpsert, responses::VideoProgressDetail,
    },
};

use crate::storage::Storage;
use async_trait::async_trait;

#[async_trait]
impl Storage for SeaOrmStorage {
    async fn create_user(&self, user: CreateUserRequest) -> Result<User> {
        self.create_user_impl(user).await
    }

    async fn create_student_user(
        &self,
        user: CreateUserRequest,
        profile: NewStudentProfile,
    ) -> Result<(User, StudentProfile)> {
        self.create_student_user_impl(user, profile).await
    }

    async fn create_parent_user(
        &self,
        user: CreateUserRequest,
        link: NewParentLink,
    ) -> Result<User> {
        self.create_parent_user_impl(user, link).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id_impl(id).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.get_user_by_username_impl(username).await
    }

    async fn get_users_by_ids(&self, ids: &[i64]) -> Result<Vec<User>> {
        self.get_users_by_ids_impl(ids).await
    }

    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse> {
        self.list_users_with_pagination_impl(query).await
    }

    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>> {
        self.update_user_impl(id, update).await
    }

    async fn update_last_login(&self, id: i64) -> Result<bool> {
        self.update_last_login_impl(id).await
    }

    async fn delete_user(&self, id: i64) -> Result<bool> {
        self.delete_user_impl(id).await
    }

    async fn count_users(
        &self,
        role: Option<UserRole>,
        status: Option<UserStatusFilter>,
    ) -> Result<u64> {
        self.count_users_impl(role, status).await
    }

    async fn list_recent_users(&self, limit: u64) -> Result<Vec<User>> {
        self.list_recent_users_impl(limit).await
    }

    async fn student_number_exists(&self, student_number: &str) -> Result<bool> {
        self.student_number_exists_impl(student_number).await
    }

    async fn create_student_profile(
        &self,
        user_id: i64,
        profile: NewStudentProfile,
    ) -> Result<StudentProfile> {
        self.create_student_profile_impl(user_id, profile).await
    }

    async fn get_student_profile(&self, user_id: i64) -> Result<Option<StudentProfile>> {
        self.get_student_profile_impl(user_id).await
    }

    async fn get_student_by_number(
        &self,
        student_number: &str,
    ) -> Result<Option<(User, StudentProfile)>> {
        self.get_student_by_number_impl(student_number).await
    }

    async fn set_student_class(&self, student_id: i64, class_id: Option<i64>) -> Result<bool> {
        self.set_student_class_impl(student_id, class_id).await
    }

    async fn count_parent_links(&self, student_id: i64) -> Result<u64> {
        self.count_parent_links_impl(student_id).await
    }

    async fn is_parent_of(&self, parent_id: i64, student_id: i64) -> Result<bool> {
        self.is_parent_of_impl(parent_id, student_id).await
    }

    async fn list_children(&self, parent_id: i64) -> Result<Vec<ParentChildSummary>> {
        self.list_children_impl(parent_id).await
    }

    async fn list_class_students(&self, class_id: i64) -> Result<Vec<ClassStudent>> {
        self.list_class_students_impl(class_id).await
    }

    async fn list_active_students(&self, class_id: Option<i64>) -> Result<Vec<ClassStudent>> {
        self.list_active_students_impl(class_id).await
    }

    async fn replace_class_students(&self, class_id: i64, student_ids: &[i64]) -> Result<()> {
        self.replace_class_students_impl(class_id, student_ids).await
    }

    async fn list_subjects(&self, include_inactive: bool) -> Result<Vec<Subject>> {
        self.list_subjects_impl(include_inactive).await
    }

    async fn get_subject_by_id(&self, id: i64) -> Result<Option<Subject>> {
        self.get_subject_by_id_impl(id).await
    }

    async fn create_subject(&self, req: CreateSubjectRequest) -> Result<Subject> {
        self.create_subject_impl(req).await
    }

    async fn update_subject(
        &self,
        id: i64,
        update: UpdateSubjectRequest,
    ) -> Result<Option<Subject>> {
        self.update_subject_impl(id, update).await
    }

    async fn delete_subject(&self, id: i64) -> Result<bool> {
        self.delete_subject_impl(id).await
    }

    async fn list_class_summaries(
        &self,
        include_inactive: bool,
        teacher_id: Option<i64>,
    ) -> Result<Vec<ClassSummary>> {
        self.list_class_summaries_impl(include_inactive, teacher_id).await
    }

    async fn get_class_by_id(&self, id: i64) -> Result<Option<Class>> {
        self.get_class_by_id_impl(id).await
    }

    async fn get_classes_by_ids(&self, ids: &[i64]) -> Result<Vec<Class>> {
        self.get_classes_by_ids_impl(ids).await
    }

    async fn list_classes_by_teacher(&self, teacher_id: i64) -> Result<Vec<Class>> {
        self.list_classes_by_teacher_impl(teacher_id).await
    }

    async fn create_class(&self, fields: ClassFields) -> Result<Class> {
        self.create_class_impl(fields).await
    }

    async fn update_class(&self, id: i64, fields: ClassFields) -> Result<Option<Class>> {
        self.update_class_impl(id, fields).await
    }

    async fn delete_class(&self, id: i64) -> Result<bool> {
        self.delete_class_impl(id).await
    }

    async fn create_course_with_first_block(
        &self,
        course: NewCourse,
        block: NewContentBlock,
    ) -> Result<(Course, ContentBlock)> {
        self.create_course_with_first_block_impl(course, block).await
    }

    async fn get_course_by_id(&self, id: i64) -> Result<Option<Course>> {
        self.get_course_by_id_impl(id).await
    }

    async fn get_course_with_names(&self, id: i64) -> Result<Option<CourseWithNames>> {
        self.get_course_with_names_impl(id).await
    }

    async fn list_course_items(&self, scope: CourseScope) -> Result<Vec<CourseListItem>> {
        self.list_course_items_impl(scope).await
    }

    async fn count_courses(&self) -> Result<u64> {
        self.count_courses_impl().await
    }

    async fn update_course(&self, id: i64, update: CourseUpdate) -> Result<Option<Course>> {
        self.update_course_impl(id, update).await
    }

    async fn delete_course(&self, id: i64) -> Result<bool> {
        self.delete_course_impl(id).await
    }

    async fn accessible_course_ids(&self, student_id: i64) -> Result<Vec<i64>> {
        self.accessible_course_ids_impl(student_id).await
    }

    async fn can_student_access_course(&self, student_id: i64, course_id: i64) -> Result<bool> {
        self.can_student_access_course_impl(student_id, course_id).await
    }

    async fn list_course_students(&self, course_id: i64) -> Result<Vec<CourseStudent>> {
        self.list_course_students_impl(course_id).await
    }

    async fn replace_course_students(&self, course_id: i64, student_ids: &[i64]) -> Result<()> {
        self.replace_course_students_impl(course_id, student_ids).await
    }

    async fn list_course_blocks(&self, course_id: i64) -> Result<Vec<ContentBlock>> {
        self.list_course_blocks_impl(course_id).await
    }

    async fn list_blocks_for_courses(&self, course_ids: &[i64]) -> Result<Vec<ContentBlock>> {
        self.list_blocks_for_courses_impl(course_ids).await
    }

    async fn get_block_by_id(&self, id: i64) -> Result<Option<ContentBlock>> {
        self.get_block_by_id_impl(id).await
    }

    async fn create_block(&self, course_id: i64, block: NewContentBlock) -> Result<ContentBlock> {
        self.create_block_impl(course_id, block).await
    }

    async fn update_block(&self, id: i64, update: BlockUpdate) -> Result<Option<ContentBlock>> {
        self.update_block_impl(id, update).await
    }

    async fn delete_block(&self, id: i64) -> Result<bool> {
        self.delete_block_impl(id).await
    }

    async fn reorder_blocks(
        &self,
        course_id: i64,
        ordered_ids: &[i64],
    ) -> Result<Vec<ContentBlock>> {
        self.reorder_blocks_impl(course_id, ordered_ids).await
    }

    async fn get_video_progress(
        &self,
        student_id: i64,
        block_id: i64,
    ) -> Result<Option<VideoProgress>> {
        self.get_video_progress_impl(student_id, block_id).await
    }

    async fn upsert_video_progress(&self, progress: ProgressUpsert) -> Result<VideoProgress> {
        self.upsert_video_progress_impl(progress).await
    }

    async fn list_student_progress(&self, student_id: i64) -> Result<Vec<VideoProgressDetail>> {
        self.list_student_progress_impl(student_id).await
    }

    async fn list_progress_for_blocks(&self, block_ids: &[i64]) -> Result<Vec<VideoProgress>> {
        self.list_progress_for_blocks_impl(block_ids).await
    }

    async fn list_course_progress(&self, course_id: i64) -> Result<Vec<VideoProgressDetail>> {
        self.list_course_progress_impl(course_id).await
    }

    async fn create_test(&self, fields: TestFields) -> Result<Test> {
        self.create_test_impl(fields).await
    }

    async fn get_test_by_id(&self, id: i64) -> Result<Option<Test>> {
        self.get_test_by_id_impl(id).await
    }

    async fn get_tests_by_ids(&self, ids: &[i64]) -> Result<Vec<Test>> {
        self.get_tests_by_ids_impl(ids).await
    }

    async fn update_test(&self, id: i64, fields: TestFields) -> Result<Option<Test>> {
        self.update_test_impl(id, fields).await
    }

    async fn delete_test(&self, id: i64) -> Result<bool> {
        self.delete_test_impl(id).await
    }

    async fn list_tests(&self, teacher_id: Option<i64>) -> Result<Vec<Test>> {
        self.list_tests_impl(teacher_id).await
    }

    async fn list_tests_for_class(&self, class_id: i64) -> Result<Vec<Test>> {
        self.list_tests_for_class_impl(class_id).await
    }

    async fn list_tests_for_courses(&self, course_ids: &[i64]) -> Result<Vec<Test>> {
        self.list_tests_for_courses_impl(course_ids).await
    }

    async fn publish_due_tests(&self, now: i64) -> Result<Vec<Test>> {
        self.publish_due_tests_impl(now).await
    }

    async fn submission_stats(&self, test_ids: &[i64]) -> Result<HashMap<i64, SubmissionStats>> {
        self.submission_stats_impl(test_ids).await
    }

    async fn list_questions(&self, test_id: i64) -> Result<Vec<TestQuestion>> {
        self.list_questions_impl(test_id).await
    }

    async fn get_question_by_id(&self, id: i64) -> Result<Option<TestQuestion>> {
        self.get_question_by_id_impl(id).await
    }

    async fn create_question(&self, question: NewQuestion) -> Result<TestQuestion> {
        self.create_question_impl(question).await
    }

    async fn update_question(
        &self,
        id: i64,
        update: UpdateQuestionRequest,
    ) -> Result<Option<TestQuestion>> {
        self.update_question_impl(id, update).await
    }

    async fn delete_question(&self, id: i64) -> Result<bool> {
        self.delete_question_impl(id).await
    }

    async fn reorder_questions(
        &self,
        test_id: i64,
        ordered_ids: &[i64],
    ) -> Result<Vec<TestQuestion>> {
        self.reorder_questions_impl(test_id, ordered_ids).await
    }

    async fn get_submission(
        &self,
        test_id: i64,
        student_id: i64,
    ) -> Result<Option<TestSubmission>> {
        self.get_submission_impl(test_id, student_id).await
    }

    async fn get_submission_by_id(&self, id: i64) -> Result<Option<TestSubmission>> {
        self.get_submission_by_id_impl(id).await
    }

    async fn create_submission(&self, submission: NewSubmission) -> Result<TestSubmission> {
        self.create_submission_impl(submission).await
    }

    async fn grade_submission(
        &self,
        id: i64,
        grade: SubmissionGrade,
    ) -> Result<Option<TestSubmission>> {
        self.grade_submission_impl(id, grade).await
    }

    async fn set_submission_published(
        &self,
        id: i64,
        published: bool,
    ) -> Result<Option<TestSubmission>> {
        self.set_submission_published_impl(id, published).await
    }

    async fn list_test_submissions(&self, test_id: i64) -> Result<Vec<SubmissionWithStudent>> {
        self.list_test_submissions_impl(test_id).await
    }

    async fn list_student_submissions(
        &self,
        student_id: i64,
        test_ids: &[i64],
    ) -> Result<Vec<TestSubmission>> {
        self.list_student_submissions_impl(student_id, test_ids).await
    }

    async fn create_qna(
        &self,
        course_id: i64,
        student_id: i64,
        question: String,
        is_public: bool,
    ) -> Result<Qna> {
        self.create_qna_impl(course_id, student_id, question, is_public).await
    }

    async fn get_qna_by_id(&self, id: i64) -> Result<Option<Qna>> {
        self.get_qna_by_id_impl(id).await
    }

    async fn list_course_qna(
        &self,
        course_id: i64,
        visibility: QnaVisibility,
    ) -> Result<Vec<QnaDetail>> {
        self.list_course_qna_impl(course_id, visibility).await
    }

    async fn list_student_qna(&self, student_id: i64) -> Result<Vec<QnaDetail>> {
        self.list_student_qna_impl(student_id).await
    }

    async fn list_teacher_qna(&self, teacher_id: Option<i64>) -> Result<Vec<QnaDetail>> {
        self.list_teacher_qna_impl(teacher_id).await
    }

    async fn answer_qna(&self, id: i64, teacher_id: i64, answer: String) -> Result<Option<Qna>> {
        self.answer_qna_impl(id, teacher_id, answer).await
    }

    async fn delete_qna(&self, id: i64) -> Result<bool> {
        self.delete_qna_impl(id).await
    }

    async fn create_notifications(&self, notifications: Vec<NewNotification>) -> Result<u64> {
        self.create_notifications_impl(notifications).await
    }

    async fn list_notifications(&self, user_id: i64, limit: u64) -> Result<Vec<Notification>> {
        self.list_notifications_impl(user_id, limit).await
    }

    async fn mark_notification_read(&self, id: i64, user_id: i64) -> Result<bool> {
        self.mark_notification_read_impl(id, user_id).await
    }

    async fn count_unread_notifications(&self, user_id: i64) -> Result<u64> {
        self.count_unread_notifications_impl(user_id).await
    }

    async fn mark_all_notifications_read(&self, user_id: i64) -> Result<u64> {
        self.mark_all_notifications_read_impl(user_id).await
    }

    async fn log_activity(&self, activity: NewActivity) -> Result<ActivityLog> {
        self.log_activity_impl(activity).await
    }

    async fn list_activities(
        &self,
        user_id: Option<i64>,
        activity_type: Option<ActivityType>,
        limit: u64,
    ) -> Result<Vec<ActivityLogWithUser>> {
        self.list_activities_impl(user_id, activity_type, limit).await
    }

    async fn student_report(
        &self,
        student_id: i64,
        start: i64,
        end: i64,
    ) -> Result<StudentReport> {
        self.student_report_impl(student_id, start, end).await
    }

    async fn class_report(&self, class_id: i64, start: i64, end: i64) -> Result<ClassReport> {
        self.class_report_impl(class_id, start, end).await
    }

    async fn admin_activity_report(&self, start: i64, end: i64) -> Result<AdminActivityReport> {
        self.admin_activity_report_impl(start, end).await
    }

    async fn list_calendar_events(&self, query: CalendarEventQuery) -> Result<Vec<CalendarEvent>> {
        self.list_calendar_events_impl(query).await
    }

    async fn get_calendar_event(&self, id: i64) -> Result<Option<CalendarEvent>> {
        self.get_calendar_event_impl(id).await
    }

    async fn create_calendar_event(
        &self,
        fields: EventFields,
        created_by: i64,
    ) -> Result<CalendarEvent> {
        self.create_calendar_event_impl(fields, created_by).await
    }

    async fn update_calendar_event(
        &self,
        id: i64,
        fields: EventFields,
    ) -> Result<Option<CalendarEvent>> {
        self.update_calendar_event_impl(id, fields).await
    }

    async fn delete_calendar_event(&self, id: i64) -> Result<bool> {
        self.delete_calendar_event_impl(id).await
    }

    async fn sync_test_deadline_event(
        &self,
        test_id: i64,
        fields: Option<EventFields>,
        created_by: i64,
    ) -> Result<()> {
        self.sync_test_deadline_event_impl(test_id, fields, created_by).await
    }

    async fn list_all_settings(&self) -> Result<Vec<SystemSetting>> {
        self.list_all_settings_impl().await
    }

    async fn update_setting(
        &self,
        key: &str,
        value: &str,
        user_id: i64,
        ip_address: Option<String>,
    ) -> Result<SystemSetting> {
        self.update_setting_impl(key, value, user_id, ip_address).await
    }

    async fn list_setting_audits(
        &self,
        query: SettingAuditQuery,
    ) -> Result<SettingAuditListResponse> {
        self.list_setting_audits_impl(query).await
    }

    async fn ping(&self) -> Result<()> {
        self.db
            .ping()
            .await
            .map_err(|e| StudyLinkError::database_connection(format!("数据库不可达: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_database_url() {
        assert_eq!(
            SeaOrmStorage::build_database_url("studylink.db").unwrap(),
            "sqlite://studylink.db?mode=rwc"
        );
        assert_eq!(
            SeaOrmStorage::build_database_url("postgres://u@h/db").unwrap(),
            "postgres://u@h/db"
        );
        assert!(SeaOrmStorage::build_database_url("ftp://nope").is_err());
    }

    #[tokio::test]
    async fn test_in_memory_migrations_seed_settings() {
        let storage = SeaOrmStorage::in_memory().await;
        storage.ping().await.unwrap();
        let settings = storage.list_all_settings().await.unwrap();
        assert_eq!(settings.len(), 4);
    }
}
