//! 视频观看进度实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "video_progress")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub student_id: i64,
    pub video_block_id: i64,
    pub watched_duration: f64,
    pub total_duration: f64,
    pub progress_percentage: f64,
    pub is_completed: bool,
    pub last_watched_at: i64,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::content_blocks::Entity",
        from = "Column::VideoBlockId",
        to = "super::content_blocks::Column::Id",
        on_delete = "Cascade"
    )]
    Block,
}

impl Related<super::content_blocks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Block.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_progress(self) -> crate::models::video_progress::entities::VideoProgress {
        use crate::models::video_progress::entities::VideoProgress;
        use chrono::{DateTime, Utc};

        VideoProgress {
            id: self.id,
            student_id: self.student_id,
            video_block_id: self.video_block_id,
            watched_duration: self.watched_duration,
            total_duration: self.total_duration,
            progress_percentage: self.progress_percentage,
            is_completed: self.is_completed,
            last_watched_at: DateTime::<Utc>::from_timestamp(self.last_watched_at, 0)
                .unwrap_or_default(),
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
        }
    }
}
