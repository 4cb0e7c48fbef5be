//! 课程存储操作

use std::collections::{HashMap, HashSet};

use super::SeaOrmStorage;
use crate::entity::courses::{ActiveModel, Column, Entity as Courses};
use crate::entity::prelude::{
    Classes, ContentBlocks, CourseStudents, Qnas, Students, Subjects, Users, VideoProgresses,
};
use crate::entity::{
    classes, content_blocks, course_students, courses, qna, students, subjects, users,
    video_progress,
};
use crate::errors::{Result, StudyLinkError};
use crate::models::courses::{
    entities::{BlockType, ContentBlock, Course, CourseStudent},
    requests::{CourseScope, CourseUpdate, NewContentBlock, NewCourse},
    responses::{CourseListItem, CourseWithNames},
};
use sea_orm::sea_query::IntoCondition;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

/// 满足条件的课程 ID
pub(super) async fn course_ids_where<C: ConnectionTrait>(
    conn: &C,
    cond: impl IntoCondition,
) -> Result<Vec<i64>> {
    Courses::find()
        .select_only()
        .column(Column::Id)
        .filter(cond)
        .into_tuple::<i64>()
        .all(conn)
        .await
        .map_err(|e| StudyLinkError::database_operation(format!("查询课程失败: {e}")))
}

/// 删除课程及其内容块、进度、引用的测试、问答与分配
pub(super) async fn delete_courses_deep<C: ConnectionTrait>(
    conn: &C,
    course_ids: &[i64],
) -> Result<u64> {
    if course_ids.is_empty() {
        return Ok(0);
    }

    let blocks = ContentBlocks::find()
        .filter(content_blocks::Column::CourseId.is_in(course_ids.to_vec()))
        .all(conn)
        .await
        .map_err(|e| StudyLinkError::database_operation(format!("查询内容块失败: {e}")))?
        .into_iter()
        .map(|b| b.into_block())
        .collect::<Vec<_>>();

    let video_block_ids: Vec<i64> = blocks
        .iter()
        .filter(|b| b.block_type == BlockType::Video)
        .map(|b| b.id)
        .collect();
    let test_ids: Vec<i64> = blocks
        .iter()
        .filter_map(|b| b.test_id())
        .filter(|id| *id > 0)
        .collect();

    if !video_block_ids.is_empty() {
        VideoProgresses::delete_many()
            .filter(video_progress::Column::VideoBlockId.is_in(video_block_ids))
            .exec(conn)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("删除视频进度失败: {e}")))?;
    }

    super::exams::delete_tests_deep(conn, &test_ids).await?;

    Qnas::delete_many()
        .filter(qna::Column::CourseId.is_in(course_ids.to_vec()))
        .exec(conn)
        .await
        .map_err(|e| StudyLinkError::database_operation(format!("删除课程问答失败: {e}")))?;

    CourseStudents::delete_many()
        .filter(course_students::Column::CourseId.is_in(course_ids.to_vec()))
        .exec(conn)
        .await
        .map_err(|e| StudyLinkError::database_operation(format!("删除课程分配失败: {e}")))?;

    ContentBlocks::delete_many()
        .filter(content_blocks::Column::CourseId.is_in(course_ids.to_vec()))
        .exec(conn)
        .await
        .map_err(|e| StudyLinkError::database_operation(format!("删除内容块失败: {e}")))?;

    let result = Courses::delete_many()
        .filter(Column::Id.is_in(course_ids.to_vec()))
        .exec(conn)
        .await
        .map_err(|e| StudyLinkError::database_operation(format!("删除课程失败: {e}")))?;

    Ok(result.rows_affected)
}

impl SeaOrmStorage {
    /// 创建课程及第一个视频块（同一事务，块写入失败时课程一并回滚）
    pub async fn create_course_with_first_block_impl(
        &self,
        course: NewCourse,
        block: NewContentBlock,
    ) -> Result<(Course, ContentBlock)> {
        let now = chrono::Utc::now().timestamp();
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("开启事务失败: {e}")))?;

        let created = ActiveModel {
            title: Set(course.title),
            description: Set(course.description),
            class_id: Set(course.class_id),
            teacher_id: Set(course.teacher_id),
            is_published: Set(course.is_published),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| StudyLinkError::database_operation(format!("创建课程失败: {e}")))?;

        let first_block = super::blocks::insert_block(&txn, created.id, block).await?;

        txn.commit()
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("提交事务失败: {e}")))?;

        Ok((created.into_course(), first_block))
    }

    /// 通过 ID 获取课程
    pub async fn get_course_by_id_impl(&self, id: i64) -> Result<Option<Course>> {
        let result = Courses::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询课程失败: {e}")))?;

        Ok(result.map(|m| m.into_course()))
    }

    /// 获取课程及班级、科目、教师名称
    pub async fn get_course_with_names_impl(&self, id: i64) -> Result<Option<CourseWithNames>> {
        let Some(course) = Courses::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询课程失败: {e}")))?
        else {
            return Ok(None);
        };

        let class = Classes::find_by_id(course.class_id)
            .one(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询班级失败: {e}")))?;

        let subject_name = match &class {
            Some(c) => Subjects::find_by_id(c.subject_id)
                .one(&self.db)
                .await
                .map_err(|e| StudyLinkError::database_operation(format!("查询科目失败: {e}")))?
                .map(|s| s.name),
            None => None,
        };

        let teacher_name = Users::find_by_id(course.teacher_id)
            .one(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询教师失败: {e}")))?
            .map(|u| u.name);

        Ok(Some(CourseWithNames {
            class_name: class.as_ref().map(|c| c.name.clone()),
            class_teacher_id: class.and_then(|c| c.teacher_id),
            subject_name,
            teacher_name,
            course: course.into_course(),
        }))
    }

    /// 列出课程（带班级、科目、教师名称、学生数与块数）
    pub async fn list_course_items_impl(&self, scope: CourseScope) -> Result<Vec<CourseListItem>> {
        let mut select = Courses::find();

        match scope {
            CourseScope::All => {}
            CourseScope::Teacher(teacher_id) => {
                let owned_classes: Vec<i64> = Classes::find()
                    .select_only()
                    .column(classes::Column::Id)
                    .filter(classes::Column::TeacherId.eq(teacher_id))
                    .into_tuple::<i64>()
                    .all(&self.db)
                    .await
                    .map_err(|e| {
                        StudyLinkError::database_operation(format!("查询教师班级失败: {e}"))
                    })?;
                select = select.filter(
                    Condition::any()
                        .add(Column::TeacherId.eq(teacher_id))
                        .add(Column::ClassId.is_in(owned_classes)),
                );
            }
            CourseScope::Ids {
                ids,
                published_only,
            } => {
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                select = select.filter(Column::Id.is_in(ids));
                if published_only {
                    select = select.filter(Column::IsPublished.eq(true));
                }
            }
        }

        let course_list = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询课程列表失败: {e}")))?;

        self.enrich_courses(course_list).await
    }

    async fn enrich_courses(&self, course_list: Vec<courses::Model>) -> Result<Vec<CourseListItem>> {
        if course_list.is_empty() {
            return Ok(Vec::new());
        }

        let course_ids: Vec<i64> = course_list.iter().map(|c| c.id).collect();
        let class_ids: Vec<i64> = course_list.iter().map(|c| c.class_id).collect();

        let class_map: HashMap<i64, classes::Model> = Classes::find()
            .filter(classes::Column::Id.is_in(class_ids.clone()))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询班级失败: {e}")))?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let subject_ids: Vec<i64> = class_map.values().map(|c| c.subject_id).collect();
        let subject_names: HashMap<i64, String> = Subjects::find()
            .filter(subjects::Column::Id.is_in(subject_ids))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询科目失败: {e}")))?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();

        let teacher_ids: Vec<i64> = course_list.iter().map(|c| c.teacher_id).collect();
        let teacher_names: HashMap<i64, String> = Users::find()
            .filter(users::Column::Id.is_in(teacher_ids))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询教师失败: {e}")))?
            .into_iter()
            .map(|u| (u.id, u.name))
            .collect();

        // 学生数 = 班级成员 ∪ 直接分配
        let mut class_members: HashMap<i64, HashSet<i64>> = HashMap::new();
        for member in Students::find()
            .filter(students::Column::ClassId.is_in(class_ids))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询班级学生失败: {e}")))?
        {
            if let Some(class_id) = member.class_id {
                class_members
                    .entry(class_id)
                    .or_default()
                    .insert(member.user_id);
            }
        }
        let mut assigned: HashMap<i64, HashSet<i64>> = HashMap::new();
        for row in CourseStudents::find()
            .filter(course_students::Column::CourseId.is_in(course_ids.clone()))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询课程分配失败: {e}")))?
        {
            assigned.entry(row.course_id).or_default().insert(row.student_id);
        }

        let mut block_counts: HashMap<i64, i64> = HashMap::new();
        for course_id in ContentBlocks::find()
            .select_only()
            .column(content_blocks::Column::CourseId)
            .filter(content_blocks::Column::CourseId.is_in(course_ids))
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询内容块失败: {e}")))?
        {
            *block_counts.entry(course_id).or_default() += 1;
        }

        Ok(course_list
            .into_iter()
            .map(|c| {
                let class = class_map.get(&c.class_id);
                let mut students: HashSet<i64> =
                    class_members.get(&c.class_id).cloned().unwrap_or_default();
                if let Some(direct) = assigned.get(&c.id) {
                    students.extend(direct);
                }
                CourseListItem {
                    class_name: class.map(|cl| cl.name.clone()),
                    subject_name: class.and_then(|cl| subject_names.get(&cl.subject_id).cloned()),
                    teacher_name: teacher_names.get(&c.teacher_id).cloned(),
                    student_count: students.len() as i64,
                    block_count: block_counts.get(&c.id).copied().unwrap_or(0),
                    student_progress: None,
                    next_content: None,
                    course: c.into_course(),
                }
            })
            .collect())
    }

    /// 统计课程数量
    pub async fn count_courses_impl(&self) -> Result<u64> {
        Courses::find()
            .count(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("统计课程数量失败: {e}")))
    }

    /// 更新课程
    pub async fn update_course_impl(
        &self,
        id: i64,
        update: CourseUpdate,
    ) -> Result<Option<Course>> {
        if self.get_course_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(title) = update.title {
            model.title = Set(title);
        }
        if let Some(description) = update.description {
            model.description = Set(description);
        }
        if let Some(class_id) = update.class_id {
            model.class_id = Set(class_id);
        }
        if let Some(teacher_id) = update.teacher_id {
            model.teacher_id = Set(teacher_id);
        }
        if let Some(is_published) = update.is_published {
            model.is_published = Set(is_published);
        }

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("更新课程失败: {e}")))?;

        Ok(Some(result.into_course()))
    }

    /// 删除课程（同一事务）
    pub async fn delete_course_impl(&self, id: i64) -> Result<bool> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("开启事务失败: {e}")))?;

        let deleted = delete_courses_deep(&txn, &[id]).await?;

        txn.commit()
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(deleted > 0)
    }

    /// 学生可访问的课程：所在班级的课程与直接分配的课程
    pub async fn accessible_course_ids_impl(&self, student_id: i64) -> Result<Vec<i64>> {
        let mut ids: Vec<i64> = CourseStudents::find()
            .select_only()
            .column(course_students::Column::CourseId)
            .filter(course_students::Column::StudentId.eq(student_id))
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询课程分配失败: {e}")))?;

        let profile = Students::find_by_id(student_id)
            .one(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询学生档案失败: {e}")))?;

        if let Some(class_id) = profile.and_then(|p| p.class_id) {
            ids.extend(course_ids_where(&self.db, Column::ClassId.eq(class_id)).await?);
        }

        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    /// 学生能否访问课程
    pub async fn can_student_access_course_impl(
        &self,
        student_id: i64,
        course_id: i64,
    ) -> Result<bool> {
        Ok(self
            .accessible_course_ids_impl(student_id)
            .await?
            .contains(&course_id))
    }

    /// 课程直接分配的学生
    pub async fn list_course_students_impl(&self, course_id: i64) -> Result<Vec<CourseStudent>> {
        let student_ids: Vec<i64> = CourseStudents::find()
            .select_only()
            .column(course_students::Column::StudentId)
            .filter(course_students::Column::CourseId.eq(course_id))
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询课程分配失败: {e}")))?;

        let profiles: HashMap<i64, students::Model> = Students::find()
            .filter(students::Column::UserId.is_in(student_ids.clone()))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询学生档案失败: {e}")))?
            .into_iter()
            .map(|s| (s.user_id, s))
            .collect();

        let class_ids: Vec<i64> = profiles.values().filter_map(|p| p.class_id).collect();
        let class_names: HashMap<i64, String> = Classes::find()
            .filter(classes::Column::Id.is_in(class_ids))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询班级失败: {e}")))?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        let users = Users::find()
            .filter(users::Column::Id.is_in(student_ids))
            .order_by_asc(users::Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询学生用户失败: {e}")))?;

        Ok(users
            .into_iter()
            .map(|u| {
                let profile = profiles.get(&u.id);
                let class_id = profile.and_then(|p| p.class_id);
                CourseStudent {
                    id: u.id,
                    name: u.name,
                    email: u.email,
                    student_number: profile.map(|p| p.student_number.clone()),
                    class_id,
                    class_name: class_id.and_then(|id| class_names.get(&id).cloned()),
                }
            })
            .collect())
    }

    /// 替换课程直接分配的学生
    pub async fn replace_course_students_impl(
        &self,
        course_id: i64,
        student_ids: &[i64],
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let mut unique: Vec<i64> = student_ids.to_vec();
        unique.sort_unstable();
        unique.dedup();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("开启事务失败: {e}")))?;

        CourseStudents::delete_many()
            .filter(course_students::Column::CourseId.eq(course_id))
            .exec(&txn)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("清除课程分配失败: {e}")))?;

        if !unique.is_empty() {
            let rows = unique.into_iter().map(|student_id| course_students::ActiveModel {
                course_id: Set(course_id),
                student_id: Set(student_id),
                assigned_at: Set(now),
                ..Default::default()
            });
            CourseStudents::insert_many(rows)
                .exec(&txn)
                .await
                .map_err(|e| {
                    StudyLinkError::database_operation(format!("写入课程分配失败: {e}"))
                })?;
        }

        txn.commit()
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(())
    }
}
