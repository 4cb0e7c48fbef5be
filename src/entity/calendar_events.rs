//! 日历事件实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "calendar_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub event_type: String,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub start_date: String,
    pub end_date: String,
    pub class_id: Option<i64>,
    pub test_id: Option<i64>,
    pub teacher_id: Option<i64>,
    pub visibility: String,
    pub created_by: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_event(self) -> crate::models::calendar::entities::CalendarEvent {
        use crate::models::calendar::entities::{CalendarEvent, EventType, Visibility};
        use chrono::{DateTime, Utc};

        let event_type = self
            .event_type
            .parse::<EventType>()
            .unwrap_or(EventType::TeacherSchedule);
        CalendarEvent {
            id: self.id,
            event_type,
            title: self.title,
            description: self.description,
            start_date: self.start_date,
            end_date: self.end_date,
            class_id: self.class_id,
            test_id: self.test_id,
            teacher_id: self.teacher_id,
            visibility: self
                .visibility
                .parse::<Visibility>()
                .unwrap_or_else(|_| event_type.visibility()),
            created_by: self.created_by,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}
