//! 日历事件存储操作

use super::SeaOrmStorage;
use crate::entity::calendar_events::{ActiveModel, Column, Entity as CalendarEvents};
use crate::errors::{Result, StudyLinkError};
use crate::models::calendar::{
    entities::{CalendarEvent, EventType},
    requests::{CalendarEventQuery, CalendarScope, EventFields},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

fn apply_fields(model: &mut ActiveModel, fields: EventFields) {
    model.event_type = Set(fields.event_type.to_string());
    model.visibility = Set(fields.event_type.visibility().to_string());
    model.title = Set(fields.title);
    model.description = Set(fields.description);
    model.start_date = Set(fields.start_date);
    model.end_date = Set(fields.end_date);
    model.class_id = Set(fields.class_id);
    model.test_id = Set(fields.test_id);
    model.teacher_id = Set(fields.teacher_id);
}

fn deadline_of(class_ids: Vec<i64>) -> Condition {
    Condition::all()
        .add(Column::EventType.eq(EventType::TestDeadline.to_string()))
        .add(Column::ClassId.is_in(class_ids))
}

impl SeaOrmStorage {
    /// 与日期范围重叠的事件（YYYY-MM-DD 字符串比较）
    pub async fn list_calendar_events_impl(
        &self,
        query: CalendarEventQuery,
    ) -> Result<Vec<CalendarEvent>> {
        let mut select = CalendarEvents::find()
            .filter(Column::StartDate.lte(query.end_date))
            .filter(Column::EndDate.gte(query.start_date));

        match query.scope {
            CalendarScope::All => {}
            CalendarScope::Teacher {
                teacher_id,
                class_ids,
            } => {
                select = select.filter(
                    Condition::any().add(deadline_of(class_ids)).add(
                        Condition::all()
                            .add(Column::EventType.eq(EventType::TeacherSchedule.to_string()))
                            .add(Column::TeacherId.eq(teacher_id)),
                    ),
                );
            }
            CalendarScope::Classes(class_ids) => {
                if class_ids.is_empty() {
                    return Ok(Vec::new());
                }
                select = select.filter(deadline_of(class_ids));
            }
        }

        let rows = select
            .order_by_asc(Column::StartDate)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询日历事件失败: {e}")))?;

        Ok(rows.into_iter().map(|m| m.into_event()).collect())
    }

    /// 通过 ID 获取事件
    pub async fn get_calendar_event_impl(&self, id: i64) -> Result<Option<CalendarEvent>> {
        let result = CalendarEvents::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询日历事件失败: {e}")))?;

        Ok(result.map(|m| m.into_event()))
    }

    /// 创建事件
    pub async fn create_calendar_event_impl(
        &self,
        fields: EventFields,
        created_by: i64,
    ) -> Result<CalendarEvent> {
        let now = chrono::Utc::now().timestamp();
        let mut model = ActiveModel {
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        apply_fields(&mut model, fields);

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("创建日历事件失败: {e}")))?;

        Ok(result.into_event())
    }

    /// 更新事件（整体覆盖字段）
    pub async fn update_calendar_event_impl(
        &self,
        id: i64,
        fields: EventFields,
    ) -> Result<Option<CalendarEvent>> {
        if self.get_calendar_event_impl(id).await?.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };
        apply_fields(&mut model, fields);

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("更新日历事件失败: {e}")))?;

        Ok(Some(result.into_event()))
    }

    /// 删除事件
    pub async fn delete_calendar_event_impl(&self, id: i64) -> Result<bool> {
        let result = CalendarEvents::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("删除日历事件失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 同步测试截止事件：有字段则 upsert，否则删除
    pub async fn sync_test_deadline_event_impl(
        &self,
        test_id: i64,
        fields: Option<EventFields>,
        created_by: i64,
    ) -> Result<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("开启事务失败: {e}")))?;

        let existing = CalendarEvents::find()
            .filter(Column::TestId.eq(test_id))
            .filter(Column::EventType.eq(EventType::TestDeadline.to_string()))
            .one(&txn)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询截止事件失败: {e}")))?;

        let now = chrono::Utc::now().timestamp();
        match (existing, fields) {
            (Some(event), Some(fields)) => {
                let mut model = ActiveModel {
                    id: Set(event.id),
                    updated_at: Set(now),
                    ..Default::default()
                };
                apply_fields(&mut model, fields);
                model.update(&txn).await.map_err(|e| {
                    StudyLinkError::database_operation(format!("更新截止事件失败: {e}"))
                })?;
            }
            (None, Some(fields)) => {
                let mut model = ActiveModel {
                    created_by: Set(created_by),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                apply_fields(&mut model, fields);
                model.insert(&txn).await.map_err(|e| {
                    StudyLinkError::database_operation(format!("创建截止事件失败: {e}"))
                })?;
            }
            (Some(_), None) => {
                CalendarEvents::delete_many()
                    .filter(Column::TestId.eq(test_id))
                    .filter(Column::EventType.eq(EventType::TestDeadline.to_string()))
                    .exec(&txn)
                    .await
                    .map_err(|e| {
                        StudyLinkError::database_operation(format!("删除截止事件失败: {e}"))
                    })?;
            }
            (None, None) => {}
        }

        txn.commit()
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(())
    }
}
