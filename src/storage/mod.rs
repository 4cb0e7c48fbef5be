use std::collections::HashMap;
use std::sync::Arc;

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

use crate::errors::Result;

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    // 连通性检查
    async fn ping(&self) -> Result<()>;

    /// 用户管理方法
    // 创建用户（教师、管理员）
    async fn create_user(&self, user: CreateUserRequest) -> Result<User>;
    // 创建学生账号及学生档案
    async fn create_student_user(
        &self,
        user: CreateUserRequest,
        profile: NewStudentProfile,
    ) -> Result<(User, StudentProfile)>;
    // 创建家长账号及与学生的关联
    async fn create_parent_user(&self, user: CreateUserRequest, link: NewParentLink)
    -> Result<User>;
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    // 通过用户名获取用户信息
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    // 批量获取用户
    async fn get_users_by_ids(&self, ids: &[i64]) -> Result<Vec<User>>;
    // 列出用户
    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse>;
    // 更新用户信息
    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>>;
    // 更新用户最后登录时间
    async fn update_last_login(&self, id: i64) -> Result<bool>;
    // 删除用户（按角色清理关联数据）
    async fn delete_user(&self, id: i64) -> Result<bool>;
    // 统计用户数量
    async fn count_users(
        &self,
        role: Option<UserRole>,
        status: Option<UserStatusFilter>,
    ) -> Result<u64>;
    // 最近注册的用户
    async fn list_recent_users(&self, limit: u64) -> Result<Vec<User>>;

    /// 学生与家长方法
    // 学号是否已存在
    async fn student_number_exists(&self, student_number: &str) -> Result<bool>;
    // 为已有用户创建学生档案
    async fn create_student_profile(
        &self,
        user_id: i64,
        profile: NewStudentProfile,
    ) -> Result<StudentProfile>;
    // 获取学生档案
    async fn get_student_profile(&self, user_id: i64) -> Result<Option<StudentProfile>>;
    // 通过学号获取学生
    async fn get_student_by_number(
        &self,
        student_number: &str,
    ) -> Result<Option<(User, StudentProfile)>>;
    // 设置学生所在班级
    async fn set_student_class(&self, student_id: i64, class_id: Option<i64>) -> Result<bool>;
    // 学生已关联的家长数量
    async fn count_parent_links(&self, student_id: i64) -> Result<u64>;
    // 是否为该学生的家长
    async fn is_parent_of(&self, parent_id: i64, student_id: i64) -> Result<bool>;
    // 家长的子女列表
    async fn list_children(&self, parent_id: i64) -> Result<Vec<ParentChildSummary>>;
    // 班级学生
    async fn list_class_students(&self, class_id: i64) -> Result<Vec<ClassStudent>>;
    // 可分配的在读学生（可按班级筛选）
    async fn list_active_students(&self, class_id: Option<i64>) -> Result<Vec<ClassStudent>>;
    // 替换班级学生
    async fn replace_class_students(&self, class_id: i64, student_ids: &[i64]) -> Result<()>;

    /// 科目管理方法
    // 列出科目
    async fn list_subjects(&self, include_inactive: bool) -> Result<Vec<Subject>>;
    // 通过ID获取科目
    async fn get_subject_by_id(&self, id: i64) -> Result<Option<Subject>>;
    // 创建科目
    async fn create_subject(&self, req: CreateSubjectRequest) -> Result<Subject>;
    // 更新科目
    async fn update_subject(&self, id: i64, update: UpdateSubjectRequest)
    -> Result<Option<Subject>>;
    // 删除科目（归档）
    async fn delete_subject(&self, id: i64) -> Result<bool>;

    /// 班级管理方法
    // 列出班级（带科目、教师名称与人数）
    async fn list_class_summaries(
        &self,
        include_inactive: bool,
        teacher_id: Option<i64>,
    ) -> Result<Vec<ClassSummary>>;
    // 通过ID获取班级
    async fn get_class_by_id(&self, id: i64) -> Result<Option<Class>>;
    // 批量获取班级
    async fn get_classes_by_ids(&self, ids: &[i64]) -> Result<Vec<Class>>;
    // 教师负责的班级
    async fn list_classes_by_teacher(&self, teacher_id: i64) -> Result<Vec<Class>>;
    // 创建班级
    async fn create_class(&self, fields: ClassFields) -> Result<Class>;
    // 更新班级
    async fn update_class(&self, id: i64, fields: ClassFields) -> Result<Option<Class>>;
    // 删除班级（归档）
    async fn delete_class(&self, id: i64) -> Result<bool>;

    /// 课程管理方法
    // 创建课程及第一个视频块
    async fn create_course_with_first_block(
        &self,
        course: NewCourse,
        block: NewContentBlock,
    ) -> Result<(Course, ContentBlock)>;
    // 通过ID获取课程
    async fn get_course_by_id(&self, id: i64) -> Result<Option<Course>>;
    // 获取课程及班级、教师名称
    async fn get_course_with_names(&self, id: i64) -> Result<Option<CourseWithNames>>;
    // 列出课程
    async fn list_course_items(&self, scope: CourseScope) -> Result<Vec<CourseListItem>>;
    // 统计课程数量
    async fn count_courses(&self) -> Result<u64>;
    // 更新课程
    async fn update_course(&self, id: i64, update: CourseUpdate) -> Result<Option<Course>>;
    // 删除课程（内容块、进度、测试、问答、分配）
    async fn delete_course(&self, id: i64) -> Result<bool>;
    // 学生可访问的课程ID
    async fn accessible_course_ids(&self, student_id: i64) -> Result<Vec<i64>>;
    // 学生能否访问课程
    async fn can_student_access_course(&self, student_id: i64, course_id: i64) -> Result<bool>;
    // 课程直接分配的学生
    async fn list_course_students(&self, course_id: i64) -> Result<Vec<CourseStudent>>;
    // 替换课程直接分配的学生
    async fn replace_course_students(&self, course_id: i64, student_ids: &[i64]) -> Result<()>;

    /// 内容块方法
    // 课程内容块（按顺序）
    async fn list_course_blocks(&self, course_id: i64) -> Result<Vec<ContentBlock>>;
    // 多个课程的内容块
    async fn list_blocks_for_courses(&self, course_ids: &[i64]) -> Result<Vec<ContentBlock>>;
    // 通过ID获取内容块
    async fn get_block_by_id(&self, id: i64) -> Result<Option<ContentBlock>>;
    // 追加内容块
    async fn create_block(&self, course_id: i64, block: NewContentBlock) -> Result<ContentBlock>;
    // 更新内容块
    async fn update_block(&self, id: i64, update: BlockUpdate) -> Result<Option<ContentBlock>>;
    // 删除内容块
    async fn delete_block(&self, id: i64) -> Result<bool>;
    // 重新排序内容块
    async fn reorder_blocks(&self, course_id: i64, ordered_ids: &[i64])
    -> Result<Vec<ContentBlock>>;

    /// 视频进度方法
    // 获取学生某个视频块的进度
    async fn get_video_progress(
        &self,
        student_id: i64,
        block_id: i64,
    ) -> Result<Option<VideoProgress>>;
    // 写入进度
    async fn upsert_video_progress(&self, progress: ProgressUpsert) -> Result<VideoProgress>;
    // 学生的全部进度
    async fn list_student_progress(&self, student_id: i64) -> Result<Vec<VideoProgressDetail>>;
    // 多个视频块的进度
    async fn list_progress_for_blocks(&self, block_ids: &[i64]) -> Result<Vec<VideoProgress>>;
    // 课程全部进度（带学生与块名称）
    async fn list_course_progress(&self, course_id: i64) -> Result<Vec<VideoProgressDetail>>;

    /// 测试方法
    // 创建测试
    async fn create_test(&self, fields: TestFields) -> Result<Test>;
    // 通过ID获取测试
    async fn get_test_by_id(&self, id: i64) -> Result<Option<Test>>;
    // 批量获取测试
    async fn get_tests_by_ids(&self, ids: &[i64]) -> Result<Vec<Test>>;
    // 更新测试
    async fn update_test(&self, id: i64, fields: TestFields) -> Result<Option<Test>>;
    // 删除测试（题目、提交、日历事件）
    async fn delete_test(&self, id: i64) -> Result<bool>;
    // 列出测试（None 表示全部）
    async fn list_tests(&self, teacher_id: Option<i64>) -> Result<Vec<Test>>;
    // 班级关联的已发布测试
    async fn list_tests_for_class(&self, class_id: i64) -> Result<Vec<Test>>;
    // 课程关联的已发布测试
    async fn list_tests_for_courses(&self, course_ids: &[i64]) -> Result<Vec<Test>>;
    // 发布已到发布时间的测试
    async fn publish_due_tests(&self, now: i64) -> Result<Vec<Test>>;
    // 提交统计
    async fn submission_stats(&self, test_ids: &[i64]) -> Result<HashMap<i64, SubmissionStats>>;

    /// 题目方法
    // 测试题目（按顺序）
    async fn list_questions(&self, test_id: i64) -> Result<Vec<TestQuestion>>;
    // 通过ID获取题目
    async fn get_question_by_id(&self, id: i64) -> Result<Option<TestQuestion>>;
    // 创建题目
    async fn create_question(&self, question: NewQuestion) -> Result<TestQuestion>;
    // 更新题目
    async fn update_question(
        &self,
        id: i64,
        update: UpdateQuestionRequest,
    ) -> Result<Option<TestQuestion>>;
    // 删除题目
    async fn delete_question(&self, id: i64) -> Result<bool>;
    // 重新排序题目
    async fn reorder_questions(
        &self,
        test_id: i64,
        ordered_ids: &[i64],
    ) -> Result<Vec<TestQuestion>>;

    /// 提交方法
    // 学生对某测试的提交
    async fn get_submission(&self, test_id: i64, student_id: i64)
    -> Result<Option<TestSubmission>>;
    // 通过ID获取提交
    async fn get_submission_by_id(&self, id: i64) -> Result<Option<TestSubmission>>;
    // 创建提交
    async fn create_submission(&self, submission: NewSubmission) -> Result<TestSubmission>;
    // 评分
    async fn grade_submission(
        &self,
        id: i64,
        grade: SubmissionGrade,
    ) -> Result<Option<TestSubmission>>;
    // 设置成绩公开状态
    async fn set_submission_published(
        &self,
        id: i64,
        published: bool,
    ) -> Result<Option<TestSubmission>>;
    // 测试的全部提交
    async fn list_test_submissions(&self, test_id: i64) -> Result<Vec<SubmissionWithStudent>>;
    // 学生在若干测试上的提交
    async fn list_student_submissions(
        &self,
        student_id: i64,
        test_ids: &[i64],
    ) -> Result<Vec<TestSubmission>>;

    /// 问答方法
    // 创建问题
    async fn create_qna(
        &self,
        course_id: i64,
        student_id: i64,
        question: String,
        is_public: bool,
    ) -> Result<Qna>;
    // 通过ID获取问答
    async fn get_qna_by_id(&self, id: i64) -> Result<Option<Qna>>;
    // 课程问答
    async fn list_course_qna(
        &self,
        course_id: i64,
        visibility: QnaVisibility,
    ) -> Result<Vec<QnaDetail>>;
    // 学生本人的问答
    async fn list_student_qna(&self, student_id: i64) -> Result<Vec<QnaDetail>>;
    // 教师课程上的问答（None 表示全部）
    async fn list_teacher_qna(&self, teacher_id: Option<i64>) -> Result<Vec<QnaDetail>>;
    // 回答问题
    async fn answer_qna(&self, id: i64, teacher_id: i64, answer: String) -> Result<Option<Qna>>;
    // 删除问答
    async fn delete_qna(&self, id: i64) -> Result<bool>;

    /// 通知方法
    // 批量创建通知
    async fn create_notifications(&self, notifications: Vec<NewNotification>) -> Result<u64>;
    // 用户通知（新到旧）
    async fn list_notifications(&self, user_id: i64, limit: u64) -> Result<Vec<Notification>>;
    // 标记单条已读
    async fn mark_notification_read(&self, id: i64, user_id: i64) -> Result<bool>;
    // 未读数量
    async fn count_unread_notifications(&self, user_id: i64) -> Result<u64>;
    // 全部标记已读
    async fn mark_all_notifications_read(&self, user_id: i64) -> Result<u64>;

    /// 活动日志方法
    // 记录活动
    async fn log_activity(&self, activity: NewActivity) -> Result<ActivityLog>;
    // 查询活动
    async fn list_activities(
        &self,
        user_id: Option<i64>,
        activity_type: Option<ActivityType>,
        limit: u64,
    ) -> Result<Vec<ActivityLogWithUser>>;

    /// 报告方法（时间为 unix 秒，闭区间）
    async fn student_report(&self, student_id: i64, start: i64, end: i64)
    -> Result<StudentReport>;
    async fn class_report(&self, class_id: i64, start: i64, end: i64) -> Result<ClassReport>;
    async fn admin_activity_report(&self, start: i64, end: i64) -> Result<AdminActivityReport>;

    /// 日历方法
    // 查询范围内的事件
    async fn list_calendar_events(&self, query: CalendarEventQuery)
    -> Result<Vec<CalendarEvent>>;
    // 通过ID获取事件
    async fn get_calendar_event(&self, id: i64) -> Result<Option<CalendarEvent>>;
    // 创建事件
    async fn create_calendar_event(
        &self,
        fields: EventFields,
        created_by: i64,
    ) -> Result<CalendarEvent>;
    // 更新事件
    async fn update_calendar_event(
        &self,
        id: i64,
        fields: EventFields,
    ) -> Result<Option<CalendarEvent>>;
    // 删除事件
    async fn delete_calendar_event(&self, id: i64) -> Result<bool>;
    // 同步测试截止事件（None 表示删除）
    async fn sync_test_deadline_event(
        &self,
        test_id: i64,
        fields: Option<EventFields>,
        created_by: i64,
    ) -> Result<()>;

    /// 系统设置方法
    // 获取所有设置
    async fn list_all_settings(&self) -> Result<Vec<SystemSetting>>;
    // 更新设置（写审计日志）
    async fn update_setting(
        &self,
        key: &str,
        value: &str,
        user_id: i64,
        ip_address: Option<String>,
    ) -> Result<SystemSetting>;
    // 获取审计日志
    async fn list_setting_audits(
        &self,
        query: SettingAuditQuery,
    ) -> Result<SettingAuditListResponse>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
