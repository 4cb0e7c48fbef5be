//! 测试与题目存储操作

use std::collections::HashMap;

use super::SeaOrmStorage;
use crate::entity::prelude::{CalendarEvents, TestQuestions, TestSubmissions};
use crate::entity::tests::{ActiveModel, Column, Entity as Tests};
use crate::entity::{calendar_events, test_questions, test_submissions};
use crate::errors::{Result, StudyLinkError};
use crate::models::tests::{
    entities::{Test, TestQuestion},
    requests::{NewQuestion, TestFields, UpdateQuestionRequest},
    responses::SubmissionStats,
};
use sea_orm::sea_query::{Expr, IntoCondition};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

/// 满足条件的测试 ID
pub(super) async fn test_ids_where<C: ConnectionTrait>(
    conn: &C,
    cond: impl IntoCondition,
) -> Result<Vec<i64>> {
    Tests::find()
        .select_only()
        .column(Column::Id)
        .filter(cond)
        .into_tuple::<i64>()
        .all(conn)
        .await
        .map_err(|e| StudyLinkError::database_operation(format!("查询测试失败: {e}")))
}

/// 删除测试及其题目、提交与截止日历事件
pub(super) async fn delete_tests_deep<C: ConnectionTrait>(
    conn: &C,
    test_ids: &[i64],
) -> Result<u64> {
    if test_ids.is_empty() {
        return Ok(0);
    }

    TestSubmissions::delete_many()
        .filter(test_submissions::Column::TestId.is_in(test_ids.to_vec()))
        .exec(conn)
        .await
        .map_err(|e| StudyLinkError::database_operation(format!("删除测试提交失败: {e}")))?;

    TestQuestions::delete_many()
        .filter(test_questions::Column::TestId.is_in(test_ids.to_vec()))
        .exec(conn)
        .await
        .map_err(|e| StudyLinkError::database_operation(format!("删除测试题目失败: {e}")))?;

    CalendarEvents::delete_many()
        .filter(calendar_events::Column::TestId.is_in(test_ids.to_vec()))
        .exec(conn)
        .await
        .map_err(|e| StudyLinkError::database_operation(format!("删除日历事件失败: {e}")))?;

    let result = Tests::delete_many()
        .filter(Column::Id.is_in(test_ids.to_vec()))
        .exec(conn)
        .await
        .map_err(|e| StudyLinkError::database_operation(format!("删除测试失败: {e}")))?;

    Ok(result.rows_affected)
}

fn test_model(fields: TestFields) -> ActiveModel {
    ActiveModel {
        title: Set(fields.title),
        description: Set(fields.description),
        teacher_id: Set(fields.teacher_id),
        course_id: Set(fields.course_id),
        class_id: Set(fields.class_id),
        time_limit: Set(fields.time_limit),
        total_score: Set(fields.total_score),
        is_published: Set(fields.is_published),
        publish_at: Set(fields.publish_at.map(|t| t.timestamp())),
        due_date: Set(fields.due_date),
        ..Default::default()
    }
}

impl SeaOrmStorage {
    /// 创建测试
    pub async fn create_test_impl(&self, fields: TestFields) -> Result<Test> {
        let now = chrono::Utc::now().timestamp();
        let mut model = test_model(fields);
        model.created_at = Set(now);
        model.updated_at = Set(now);

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("创建测试失败: {e}")))?;

        Ok(result.into_test())
    }

    /// 通过 ID 获取测试
    pub async fn get_test_by_id_impl(&self, id: i64) -> Result<Option<Test>> {
        let result = Tests::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询测试失败: {e}")))?;

        Ok(result.map(|m| m.into_test()))
    }

    /// 批量获取测试
    pub async fn get_tests_by_ids_impl(&self, ids: &[i64]) -> Result<Vec<Test>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let result = Tests::find()
            .filter(Column::Id.is_in(ids.to_vec()))
            .order_by_desc(Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("批量查询测试失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_test()).collect())
    }

    /// 更新测试（字段已由服务层合并）
    pub async fn update_test_impl(&self, id: i64, fields: TestFields) -> Result<Option<Test>> {
        if self.get_test_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let mut model = test_model(fields);
        model.id = Set(id);
        model.updated_at = Set(chrono::Utc::now().timestamp());

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("更新测试失败: {e}")))?;

        Ok(Some(result.into_test()))
    }

    /// 删除测试（同一事务）
    pub async fn delete_test_impl(&self, id: i64) -> Result<bool> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("开启事务失败: {e}")))?;

        let deleted = delete_tests_deep(&txn, &[id]).await?;

        txn.commit()
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(deleted > 0)
    }

    /// 列出测试
    pub async fn list_tests_impl(&self, teacher_id: Option<i64>) -> Result<Vec<Test>> {
        let mut select = Tests::find();
        if let Some(teacher_id) = teacher_id {
            select = select.filter(Column::TeacherId.eq(teacher_id));
        }

        let result = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询测试列表失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_test()).collect())
    }

    /// 班级关联的已发布测试
    pub async fn list_tests_for_class_impl(&self, class_id: i64) -> Result<Vec<Test>> {
        let result = Tests::find()
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::IsPublished.eq(true))
            .order_by_desc(Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询班级测试失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_test()).collect())
    }

    /// 课程关联的已发布测试
    pub async fn list_tests_for_courses_impl(&self, course_ids: &[i64]) -> Result<Vec<Test>> {
        if course_ids.is_empty() {
            return Ok(Vec::new());
        }
        let result = Tests::find()
            .filter(Column::CourseId.is_in(course_ids.to_vec()))
            .filter(Column::IsPublished.eq(true))
            .order_by_desc(Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询课程测试失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_test()).collect())
    }

    /// 发布已到发布时间的测试，返回本次发布的测试
    pub async fn publish_due_tests_impl(&self, now: i64) -> Result<Vec<Test>> {
        let due_ids = test_ids_where(
            &self.db,
            Condition::all()
                .add(Column::IsPublished.eq(false))
                .add(Column::PublishAt.is_not_null())
                .add(Column::PublishAt.lte(now)),
        )
        .await?;
        if due_ids.is_empty() {
            return Ok(Vec::new());
        }

        Tests::update_many()
            .col_expr(Column::IsPublished, Expr::value(true))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Id.is_in(due_ids.clone()))
            .exec(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("发布测试失败: {e}")))?;

        self.get_tests_by_ids_impl(&due_ids).await
    }

    /// 提交统计
    pub async fn submission_stats_impl(
        &self,
        test_ids: &[i64],
    ) -> Result<HashMap<i64, SubmissionStats>> {
        let mut stats: HashMap<i64, SubmissionStats> = HashMap::new();
        if test_ids.is_empty() {
            return Ok(stats);
        }

        let rows: Vec<(i64, bool, bool)> = TestSubmissions::find()
            .select_only()
            .column(test_submissions::Column::TestId)
            .column(test_submissions::Column::IsPublished)
            .column(test_submissions::Column::IsGraded)
            .filter(test_submissions::Column::TestId.is_in(test_ids.to_vec()))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("统计测试提交失败: {e}")))?;

        for (test_id, is_published, is_graded) in rows {
            let entry = stats.entry(test_id).or_default();
            entry.total += 1;
            if is_published {
                entry.published += 1;
            }
            if is_graded {
                entry.graded += 1;
            }
        }

        Ok(stats)
    }

    /// 测试题目（按顺序）
    pub async fn list_questions_impl(&self, test_id: i64) -> Result<Vec<TestQuestion>> {
        let result = TestQuestions::find()
            .filter(test_questions::Column::TestId.eq(test_id))
            .order_by_asc(test_questions::Column::OrderIndex)
            .order_by_asc(test_questions::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询测试题目失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_question()).collect())
    }

    /// 通过 ID 获取题目
    pub async fn get_question_by_id_impl(&self, id: i64) -> Result<Option<TestQuestion>> {
        let result = TestQuestions::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询题目失败: {e}")))?;

        Ok(result.map(|m| m.into_question()))
    }

    /// 创建题目（未指定顺序时追加到末尾）
    pub async fn create_question_impl(&self, question: NewQuestion) -> Result<TestQuestion> {
        let order_index = match question.order_index {
            Some(index) => index,
            None => {
                let last = TestQuestions::find()
                    .filter(test_questions::Column::TestId.eq(question.test_id))
                    .order_by_desc(test_questions::Column::OrderIndex)
                    .one(&self.db)
                    .await
                    .map_err(|e| {
                        StudyLinkError::database_operation(format!("查询题目顺序失败: {e}"))
                    })?;
                last.map(|q| q.order_index + 1).unwrap_or(1)
            }
        };

        let result = test_questions::ActiveModel {
            test_id: Set(question.test_id),
            question_type: Set(question.question_type.to_string()),
            question_text: Set(question.question_text),
            question_data: Set(question.question_data.to_string()),
            points: Set(question.points),
            order_index: Set(order_index),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| StudyLinkError::database_operation(format!("创建题目失败: {e}")))?;

        Ok(result.into_question())
    }

    /// 更新题目
    pub async fn update_question_impl(
        &self,
        id: i64,
        update: UpdateQuestionRequest,
    ) -> Result<Option<TestQuestion>> {
        if self.get_question_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let mut model = test_questions::ActiveModel {
            id: Set(id),
            ..Default::default()
        };
        if let Some(question_type) = update.question_type {
            model.question_type = Set(question_type.to_string());
        }
        if let Some(text) = update.question_text {
            model.question_text = Set(text);
        }
        if let Some(data) = update.question_data {
            model.question_data = Set(data.to_string());
        }
        if let Some(points) = update.points {
            model.points = Set(points);
        }
        if let Some(order_index) = update.order_index {
            model.order_index = Set(order_index);
        }

        // 没有任何字段变化时直接返回
        if !model.is_changed() {
            return self.get_question_by_id_impl(id).await;
        }

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("更新题目失败: {e}")))?;

        Ok(Some(result.into_question()))
    }

    /// 删除题目
    pub async fn delete_question_impl(&self, id: i64) -> Result<bool> {
        let result = TestQuestions::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("删除题目失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 按给定顺序重排题目
    pub async fn reorder_questions_impl(
        &self,
        test_id: i64,
        ordered_ids: &[i64],
    ) -> Result<Vec<TestQuestion>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("开启事务失败: {e}")))?;

        for (index, question_id) in ordered_ids.iter().enumerate() {
            TestQuestions::update_many()
                .col_expr(test_questions::Column::OrderIndex, Expr::value(index as i32 + 1))
                .filter(test_questions::Column::Id.eq(*question_id))
                .filter(test_questions::Column::TestId.eq(test_id))
                .exec(&txn)
                .await
                .map_err(|e| {
                    StudyLinkError::database_operation(format!("更新题目顺序失败: {e}"))
                })?;
        }

        txn.commit()
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("提交事务失败: {e}")))?;

        self.list_questions_impl(test_id).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::tests::entities::QuestionType;
    use crate::storage::sea_orm_storage::courses::tests::{Fixture, fixture};
    use serde_json::json;

    pub(crate) fn test_fields(fx: &Fixture) -> TestFields {
        TestFields {
            title: "단원평가".to_string(),
            description: None,
            teacher_id: fx.teacher_id,
            course_id: Some(fx.course_id),
            class_id: Some(fx.class_id),
            time_limit: Some(30),
            total_score: 100,
            is_published: true,
            publish_at: None,
            due_date: Some("2030-01-31".to_string()),
        }
    }

    pub(crate) fn ox_question(test_id: i64) -> NewQuestion {
        NewQuestion {
            test_id,
            question_type: QuestionType::Ox,
            question_text: "지구는 둥글다".to_string(),
            question_data: json!({"correctAnswer": "O", "explanation": "사실"}),
            points: 10,
            order_index: None,
        }
    }

    #[tokio::test]
    async fn test_questions_append_and_reorder() {
        let storage = SeaOrmStorage::in_memory().await;
        let fx = fixture(&storage).await;
        let test = storage.create_test_impl(test_fields(&fx)).await.unwrap();

        let q1 = storage.create_question_impl(ox_question(test.id)).await.unwrap();
        let q2 = storage.create_question_impl(ox_question(test.id)).await.unwrap();
        assert_eq!((q1.order_index, q2.order_index), (1, 2));
        assert_eq!(q1.question_data["correctAnswer"], "O");

        let reordered = storage
            .reorder_questions_impl(test.id, &[q2.id, q1.id])
            .await
            .unwrap();
        assert_eq!(reordered[0].id, q2.id);
        assert_eq!(reordered[0].order_index, 1);
    }

    #[tokio::test]
    async fn test_publish_due_tests_only_touches_due_ones() {
        let storage = SeaOrmStorage::in_memory().await;
        let fx = fixture(&storage).await;
        let now = chrono::Utc::now();

        let mut due = test_fields(&fx);
        due.is_published = false;
        due.publish_at = Some(now - chrono::Duration::minutes(5));
        let due = storage.create_test_impl(due).await.unwrap();

        let mut later = test_fields(&fx);
        later.is_published = false;
        later.publish_at = Some(now + chrono::Duration::days(1));
        let later = storage.create_test_impl(later).await.unwrap();

        let published = storage.publish_due_tests_impl(now.timestamp()).await.unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].id, due.id);
        assert!(published[0].is_published);
        let later = storage.get_test_by_id_impl(later.id).await.unwrap().unwrap();
        assert!(!later.is_published);

        assert!(storage.publish_due_tests_impl(now.timestamp()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_test_is_deep() {
        let storage = SeaOrmStorage::in_memory().await;
        let fx = fixture(&storage).await;
        let test = storage.create_test_impl(test_fields(&fx)).await.unwrap();
        let question = storage.create_question_impl(ox_question(test.id)).await.unwrap();

        assert!(storage.delete_test_impl(test.id).await.unwrap());
        assert!(storage.get_question_by_id_impl(question.id).await.unwrap().is_none());
        assert!(storage.list_tests_impl(Some(fx.teacher_id)).await.unwrap().is_empty());
    }
}
