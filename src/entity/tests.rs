//! 测试实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tests")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub teacher_id: i64,
    pub course_id: Option<i64>,
    pub class_id: Option<i64>,
    pub time_limit: Option<i32>,
    pub total_score: i32,
    pub is_published: bool,
    pub publish_at: Option<i64>,
    pub due_date: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::test_questions::Entity")]
    Questions,
    #[sea_orm(has_many = "super::test_submissions::Entity")]
    Submissions,
}

impl Related<super::test_questions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Questions.def()
    }
}

impl Related<super::test_submissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_test(self) -> crate::models::tests::entities::Test {
        use crate::models::tests::entities::Test;
        use chrono::{DateTime, Utc};

        Test {
            id: self.id,
            title: self.title,
            description: self.description,
            teacher_id: self.teacher_id,
            course_id: self.course_id,
            class_id: self.class_id,
            time_limit: self.time_limit,
            total_score: self.total_score,
            is_published: self.is_published,
            publish_at: self
                .publish_at
                .map(|ts| DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default()),
            due_date: self.due_date,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}
