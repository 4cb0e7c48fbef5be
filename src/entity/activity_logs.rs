//! 活动日志实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "activity_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub activity_type: String,
    pub related_id: Option<i64>,
    #[sea_orm(column_type = "Text", nullable)]
    pub metadata: Option<String>, // JSON
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_activity(self) -> crate::models::activity::entities::ActivityLog {
        use crate::models::activity::entities::{ActivityLog, ActivityType};
        use chrono::{DateTime, Utc};

        ActivityLog {
            id: self.id,
            user_id: self.user_id,
            activity_type: self
                .activity_type
                .parse::<ActivityType>()
                .unwrap_or(ActivityType::Login),
            related_id: self.related_id,
            metadata: self
                .metadata
                .as_deref()
                .and_then(|m| serde_json::from_str(m).ok()),
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
        }
    }
}
