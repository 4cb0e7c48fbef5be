//! 课程内容块实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "content_blocks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub course_id: i64,
    pub block_type: String,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub content: String, // JSON
    pub order_index: i32,
    pub is_required: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::courses::Entity",
        from = "Column::CourseId",
        to = "super::courses::Column::Id",
        on_delete = "Cascade"
    )]
    Course,
}

impl Related<super::courses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_block(self) -> crate::models::courses::entities::ContentBlock {
        use crate::models::courses::entities::{BlockType, ContentBlock};
        use chrono::{DateTime, Utc};

        ContentBlock {
            id: self.id,
            course_id: self.course_id,
            block_type: self.block_type.parse::<BlockType>().unwrap_or(BlockType::Text),
            title: self.title,
            content: serde_json::from_str(&self.content).unwrap_or_default(),
            order_index: self.order_index,
            is_required: self.is_required,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}
