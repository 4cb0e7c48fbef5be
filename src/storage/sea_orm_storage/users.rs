//! 用户存储操作

use std::collections::HashMap;

use super::SeaOrmStorage;
use crate::entity::prelude::{
    ActivityLogs, CalendarEvents, Classes, CourseStudents, Notifications, ParentStudentRelations,
    Qnas, Students, TestSubmissions, Users, VideoProgresses,
};
use crate::entity::users::{ActiveModel, Column};
use crate::entity::{
    activity_logs, calendar_events, classes, course_students, notifications,
    parent_student_relations, qna, students, test_submissions, video_progress,
};
use crate::errors::{Result, StudyLinkError};
use crate::models::{
    PaginationInfo,
    users::{
        entities::{StudentProfile, User, UserRole, UserStatusFilter},
        requests::{
            CreateUserRequest, NewParentLink, NewStudentProfile, UpdateUserRequest, UserListQuery,
        },
        responses::{UserListItem, UserListResponse},
    },
};
use crate::utils::escape_like_pattern;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};

fn user_model(req: CreateUserRequest, now: i64) -> ActiveModel {
    ActiveModel {
        username: Set(req.username),
        password_hash: Set(req.password),
        role: Set(req.role.to_string()),
        name: Set(req.name),
        email: Set(req.email),
        phone: Set(req.phone),
        is_approved: Set(req.is_approved),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
}

fn apply_status_filter(select: Select<Users>, status: &UserStatusFilter) -> Select<Users> {
    match status {
        UserStatusFilter::Pending => select
            .filter(Column::IsActive.eq(true))
            .filter(Column::IsApproved.eq(false)),
        UserStatusFilter::Active => select.filter(Column::IsActive.eq(true)),
        UserStatusFilter::Inactive => select.filter(Column::IsActive.eq(false)),
    }
}

impl SeaOrmStorage {
    /// 创建用户
    pub async fn create_user_impl(&self, req: CreateUserRequest) -> Result<User> {
        let now = chrono::Utc::now().timestamp();

        let result = user_model(req, now)
            .insert(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("创建用户失败: {e}")))?;

        Ok(result.into_user())
    }

    /// 创建学生账号（用户 + 学生档案，同一事务）
    pub async fn create_student_user_impl(
        &self,
        req: CreateUserRequest,
        profile: NewStudentProfile,
    ) -> Result<(User, StudentProfile)> {
        let now = chrono::Utc::now().timestamp();
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("开启事务失败: {e}")))?;

        let user = user_model(req, now)
            .insert(&txn)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("创建学生用户失败: {e}")))?;

        let student = students::ActiveModel {
            user_id: Set(user.id),
            student_number: Set(profile.student_number),
            grade: Set(profile.grade),
            class_id: Set(profile.class_id),
            created_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| StudyLinkError::database_operation(format!("创建学生档案失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("提交事务失败: {e}")))?;

        Ok((user.into_user(), student.into_profile()))
    }

    /// 创建家长账号（用户 + 关联，同一事务）
    pub async fn create_parent_user_impl(
        &self,
        req: CreateUserRequest,
        link: NewParentLink,
    ) -> Result<User> {
        let now = chrono::Utc::now().timestamp();
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("开启事务失败: {e}")))?;

        let user = user_model(req, now)
            .insert(&txn)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("创建家长用户失败: {e}")))?;

        parent_student_relations::ActiveModel {
            parent_id: Set(user.id),
            student_id: Set(link.student_id),
            relationship: Set(link.relationship.to_string()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| StudyLinkError::database_operation(format!("创建家长关联失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(user.into_user())
    }

    /// 通过 ID 获取用户
    pub async fn get_user_by_id_impl(&self, id: i64) -> Result<Option<User>> {
        let result = Users::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 通过用户名获取用户
    pub async fn get_user_by_username_impl(&self, username: &str) -> Result<Option<User>> {
        let result = Users::find()
            .filter(Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 批量获取用户
    pub async fn get_users_by_ids_impl(&self, ids: &[i64]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let result = Users::find()
            .filter(Column::Id.is_in(ids.to_vec()))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("批量查询用户失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_user()).collect())
    }

    /// 分页列出用户（附带学号、班级、家长关联的学号）
    pub async fn list_users_with_pagination_impl(
        &self,
        query: UserListQuery,
    ) -> Result<UserListResponse> {
        let mut select = Users::find();

        // 搜索条件
        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(
                Condition::any()
                    .add(Column::Username.contains(&escaped))
                    .add(Column::Name.contains(&escaped))
                    .add(Column::Email.contains(&escaped)),
            );
        }

        // 角色筛选
        if let Some(ref role) = query.role {
            select = select.filter(Column::Role.eq(role.to_string()));
        }

        // 状态筛选
        if let Some(ref status) = query.status {
            select = apply_status_filter(select, status);
        }

        select = select.order_by_desc(Column::CreatedAt);

        let paginator = select.paginate(&self.db, query.size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询用户总数失败: {e}")))?;

        let users = paginator
            .fetch_page(query.page - 1)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询用户列表失败: {e}")))?;

        let ids: Vec<i64> = users.iter().map(|u| u.id).collect();

        // 学生档案
        let profiles: HashMap<i64, students::Model> = Students::find()
            .filter(students::Column::UserId.is_in(ids.clone()))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询学生档案失败: {e}")))?
            .into_iter()
            .map(|s| (s.user_id, s))
            .collect();

        // 家长关联的学生学号
        let links = ParentStudentRelations::find()
            .filter(parent_student_relations::Column::ParentId.is_in(ids))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询家长关联失败: {e}")))?;
        let linked_ids: Vec<i64> = links.iter().map(|l| l.student_id).collect();
        let linked_numbers: HashMap<i64, String> = Students::find()
            .filter(students::Column::UserId.is_in(linked_ids))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询学生档案失败: {e}")))?
            .into_iter()
            .map(|s| (s.user_id, s.student_number))
            .collect();
        let mut numbers_by_parent: HashMap<i64, Vec<String>> = HashMap::new();
        for link in links {
            if let Some(number) = linked_numbers.get(&link.student_id) {
                numbers_by_parent
                    .entry(link.parent_id)
                    .or_default()
                    .push(number.clone());
            }
        }

        let items = users
            .into_iter()
            .map(|m| {
                let profile = profiles.get(&m.id);
                let linked = numbers_by_parent.remove(&m.id).unwrap_or_default();
                UserListItem {
                    student_number: profile.map(|p| p.student_number.clone()),
                    class_id: profile.and_then(|p| p.class_id),
                    linked_student_numbers: linked,
                    user: m.into_user(),
                }
            })
            .collect();

        Ok(UserListResponse {
            items,
            pagination: PaginationInfo::new(query.page, query.size, total),
        })
    }

    /// 更新用户最后登录时间
    pub async fn update_last_login_impl(&self, id: i64) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = Users::update_many()
            .col_expr(Column::LastLogin, Expr::value(now))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| {
                StudyLinkError::database_operation(format!("更新最后登录时间失败: {e}"))
            })?;

        Ok(result.rows_affected > 0)
    }

    /// 更新用户信息
    pub async fn update_user_impl(
        &self,
        id: i64,
        update: UpdateUserRequest,
    ) -> Result<Option<User>> {
        // 先检查用户是否存在
        let existing = self.get_user_by_id_impl(id).await?;
        if existing.is_none() {
            return Ok(None);
        }

        let now = chrono::Utc::now().timestamp();

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(now),
            ..Default::default()
        };

        if let Some(name) = update.name {
            model.name = Set(name);
        }

        if let Some(email) = update.email {
            model.email = Set(email);
        }

        if let Some(phone) = update.phone {
            model.phone = Set(phone);
        }

        if let Some(password) = update.password {
            model.password_hash = Set(password);
        }

        if let Some(role) = update.role {
            model.role = Set(role.to_string());
        }

        if let Some(is_approved) = update.is_approved {
            model.is_approved = Set(is_approved);
        }

        if let Some(is_active) = update.is_active {
            model.is_active = Set(is_active);
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("更新用户失败: {e}")))?;

        self.get_user_by_id_impl(id).await
    }

    /// 删除用户，按角色清理关联数据（同一事务）
    pub async fn delete_user_impl(&self, id: i64) -> Result<bool> {
        let Some(user) = self.get_user_by_id_impl(id).await? else {
            return Ok(false);
        };

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("开启事务失败: {e}")))?;

        Notifications::delete_many()
            .filter(notifications::Column::UserId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("删除用户通知失败: {e}")))?;

        match user.role {
            UserRole::Student => delete_student_data(&txn, id).await?,
            UserRole::Teacher => delete_teacher_data(&txn, id).await?,
            UserRole::Parent => {
                ParentStudentRelations::delete_many()
                    .filter(parent_student_relations::Column::ParentId.eq(id))
                    .exec(&txn)
                    .await
                    .map_err(|e| {
                        StudyLinkError::database_operation(format!("删除家长关联失败: {e}"))
                    })?;
            }
            UserRole::Admin => {}
        }

        ActivityLogs::delete_many()
            .filter(activity_logs::Column::UserId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("删除活动日志失败: {e}")))?;

        let result = Users::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("删除用户失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 统计用户数量
    pub async fn count_users_impl(
        &self,
        role: Option<UserRole>,
        status: Option<UserStatusFilter>,
    ) -> Result<u64> {
        let mut select = Users::find();
        if let Some(role) = role {
            select = select.filter(Column::Role.eq(role.to_string()));
        }
        if let Some(ref status) = status {
            select = apply_status_filter(select, status);
        }

        select
            .count(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("统计用户数量失败: {e}")))
    }

    /// 最近注册的用户
    pub async fn list_recent_users_impl(&self, limit: u64) -> Result<Vec<User>> {
        let result = Users::find()
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询最近用户失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_user()).collect())
    }
}

/// 学生：进度、提交、问答、课程分配、家长关联、学生档案
async fn delete_student_data<C: ConnectionTrait>(conn: &C, id: i64) -> Result<()> {
    VideoProgresses::delete_many()
        .filter(video_progress::Column::StudentId.eq(id))
        .exec(conn)
        .await
        .map_err(|e| StudyLinkError::database_operation(format!("删除视频进度失败: {e}")))?;
    TestSubmissions::delete_many()
        .filter(test_submissions::Column::StudentId.eq(id))
        .exec(conn)
        .await
        .map_err(|e| StudyLinkError::database_operation(format!("删除测试提交失败: {e}")))?;
    Qnas::delete_many()
        .filter(qna::Column::StudentId.eq(id))
        .exec(conn)
        .await
        .map_err(|e| StudyLinkError::database_operation(format!("删除问答失败: {e}")))?;
    CourseStudents::delete_many()
        .filter(course_students::Column::StudentId.eq(id))
        .exec(conn)
        .await
        .map_err(|e| StudyLinkError::database_operation(format!("删除课程分配失败: {e}")))?;
    ParentStudentRelations::delete_many()
        .filter(parent_student_relations::Column::StudentId.eq(id))
        .exec(conn)
        .await
        .map_err(|e| StudyLinkError::database_operation(format!("删除家长关联失败: {e}")))?;
    Students::delete_by_id(id)
        .exec(conn)
        .await
        .map_err(|e| StudyLinkError::database_operation(format!("删除学生档案失败: {e}")))?;
    Ok(())
}

/// 教师：日历、测试、问答回答、课程；负责的班级保留但取消教师
async fn delete_teacher_data<C: ConnectionTrait>(conn: &C, id: i64) -> Result<()> {
    CalendarEvents::delete_many()
        .filter(calendar_events::Column::TeacherId.eq(id))
        .exec(conn)
        .await
        .map_err(|e| StudyLinkError::database_operation(format!("删除日历事件失败: {e}")))?;

    let test_ids = super::exams::test_ids_where(conn, crate::entity::tests::Column::TeacherId.eq(id))
        .await?;
    super::exams::delete_tests_deep(conn, &test_ids).await?;

    Qnas::update_many()
        .col_expr(qna::Column::TeacherId, Expr::value(Option::<i64>::None))
        .col_expr(qna::Column::Answer, Expr::value(Option::<String>::None))
        .col_expr(qna::Column::AnsweredAt, Expr::value(Option::<i64>::None))
        .filter(qna::Column::TeacherId.eq(id))
        .exec(conn)
        .await
        .map_err(|e| StudyLinkError::database_operation(format!("清除问答回答失败: {e}")))?;

    let course_ids =
        super::courses::course_ids_where(conn, crate::entity::courses::Column::TeacherId.eq(id))
            .await?;
    super::courses::delete_courses_deep(conn, &course_ids).await?;

    Classes::update_many()
        .col_expr(classes::Column::TeacherId, Expr::value(Option::<i64>::None))
        .filter(classes::Column::TeacherId.eq(id))
        .exec(conn)
        .await
        .map_err(|e| StudyLinkError::database_operation(format!("解除班级教师失败: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::Relationship;

    fn new_user(username: &str, role: UserRole) -> CreateUserRequest {
        CreateUserRequest {
            username: username.to_string(),
            password: "hash".to_string(),
            role,
            name: format!("{username} name"),
            email: None,
            phone: None,
            is_approved: true,
        }
    }

    fn profile(number: &str) -> NewStudentProfile {
        NewStudentProfile {
            student_number: number.to_string(),
            grade: Some(3),
            class_id: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_is_conflict() {
        let storage = SeaOrmStorage::in_memory().await;
        storage
            .create_user_impl(new_user("alice", UserRole::Teacher))
            .await
            .unwrap();
        let err = storage
            .create_user_impl(new_user("alice", UserRole::Teacher))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_list_users_includes_student_and_parent_info() {
        let storage = SeaOrmStorage::in_memory().await;
        let (student, _) = storage
            .create_student_user_impl(new_user("kid", UserRole::Student), profile("AB12CD34"))
            .await
            .unwrap();
        storage
            .create_parent_user_impl(
                new_user("mom", UserRole::Parent),
                NewParentLink {
                    student_id: student.id,
                    relationship: Relationship::Mother,
                },
            )
            .await
            .unwrap();

        let list = storage
            .list_users_with_pagination_impl(UserListQuery {
                page: 1,
                size: 10,
                role: None,
                status: None,
                search: None,
            })
            .await
            .unwrap();
        assert_eq!(list.pagination.total, 2);
        let kid = list.items.iter().find(|i| i.user.username == "kid").unwrap();
        assert_eq!(kid.student_number.as_deref(), Some("AB12CD34"));
        let mom = list.items.iter().find(|i| i.user.username == "mom").unwrap();
        assert_eq!(mom.linked_student_numbers, vec!["AB12CD34".to_string()]);
    }

    #[tokio::test]
    async fn test_status_filters() {
        let storage = SeaOrmStorage::in_memory().await;
        let mut pending = new_user("pending_t", UserRole::Teacher);
        pending.is_approved = false;
        storage.create_user_impl(pending).await.unwrap();
        let active = storage
            .create_user_impl(new_user("active_t", UserRole::Teacher))
            .await
            .unwrap();
        storage
            .update_user_impl(
                active.id,
                UpdateUserRequest {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let pending_count = storage
            .count_users_impl(Some(UserRole::Teacher), Some(UserStatusFilter::Pending))
            .await
            .unwrap();
        let inactive_count = storage
            .count_users_impl(None, Some(UserStatusFilter::Inactive))
            .await
            .unwrap();
        assert_eq!(pending_count, 1);
        assert_eq!(inactive_count, 1);
    }

    #[tokio::test]
    async fn test_delete_student_removes_profile_and_links() {
        let storage = SeaOrmStorage::in_memory().await;
        let (student, _) = storage
            .create_student_user_impl(new_user("kid", UserRole::Student), profile("ZZ00ZZ00"))
            .await
            .unwrap();
        let parent = storage
            .create_parent_user_impl(
                new_user("dad", UserRole::Parent),
                NewParentLink {
                    student_id: student.id,
                    relationship: Relationship::Father,
                },
            )
            .await
            .unwrap();

        assert!(storage.delete_user_impl(student.id).await.unwrap());
        assert!(storage.get_user_by_id_impl(student.id).await.unwrap().is_none());
        assert!(
            !storage
                .student_number_exists_impl("ZZ00ZZ00")
                .await
                .unwrap()
        );
        assert!(!storage.is_parent_of_impl(parent.id, student.id).await.unwrap());
        // 家长账号保留
        assert!(storage.get_user_by_id_impl(parent.id).await.unwrap().is_some());
    }
}
