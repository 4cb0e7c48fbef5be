//! 视频进度存储操作

use std::collections::HashMap;

use super::SeaOrmStorage;
use crate::entity::prelude::{ContentBlocks, Users};
use crate::entity::video_progress::{ActiveModel, Column, Entity as VideoProgresses, Model};
use crate::entity::{content_blocks, users};
use crate::errors::{Result, StudyLinkError};
use crate::models::video_progress::{
    entities::VideoProgress, requests::ProgressUpsert, responses::VideoProgressDetail,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    /// 获取学生某个视频块的进度
    pub async fn get_video_progress_impl(
        &self,
        student_id: i64,
        block_id: i64,
    ) -> Result<Option<VideoProgress>> {
        let result = VideoProgresses::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::VideoBlockId.eq(block_id))
            .one(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询视频进度失败: {e}")))?;

        Ok(result.map(|m| m.into_progress()))
    }

    /// 写入进度（存在则更新）
    pub async fn upsert_video_progress_impl(
        &self,
        progress: ProgressUpsert,
    ) -> Result<VideoProgress> {
        let now = chrono::Utc::now().timestamp();

        let existing = VideoProgresses::find()
            .filter(Column::StudentId.eq(progress.student_id))
            .filter(Column::VideoBlockId.eq(progress.video_block_id))
            .one(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询视频进度失败: {e}")))?;

        let result = match existing {
            Some(row) => ActiveModel {
                id: Set(row.id),
                watched_duration: Set(progress.watched_duration),
                total_duration: Set(progress.total_duration),
                progress_percentage: Set(progress.progress_percentage),
                is_completed: Set(progress.is_completed),
                last_watched_at: Set(now),
                ..Default::default()
            }
            .update(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("更新视频进度失败: {e}")))?,
            None => ActiveModel {
                student_id: Set(progress.student_id),
                video_block_id: Set(progress.video_block_id),
                watched_duration: Set(progress.watched_duration),
                total_duration: Set(progress.total_duration),
                progress_percentage: Set(progress.progress_percentage),
                is_completed: Set(progress.is_completed),
                last_watched_at: Set(now),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("写入视频进度失败: {e}")))?,
        };

        Ok(result.into_progress())
    }

    /// 学生的全部进度
    pub async fn list_student_progress_impl(
        &self,
        student_id: i64,
    ) -> Result<Vec<VideoProgressDetail>> {
        let rows = VideoProgresses::find()
            .filter(Column::StudentId.eq(student_id))
            .order_by_desc(Column::LastWatchedAt)
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询视频进度失败: {e}")))?;

        self.attach_progress_details(rows).await
    }

    /// 多个视频块的进度
    pub async fn list_progress_for_blocks_impl(
        &self,
        block_ids: &[i64],
    ) -> Result<Vec<VideoProgress>> {
        if block_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = VideoProgresses::find()
            .filter(Column::VideoBlockId.is_in(block_ids.to_vec()))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询视频进度失败: {e}")))?;

        Ok(rows.into_iter().map(|m| m.into_progress()).collect())
    }

    /// 课程全部进度
    pub async fn list_course_progress_impl(
        &self,
        course_id: i64,
    ) -> Result<Vec<VideoProgressDetail>> {
        let block_ids: Vec<i64> = ContentBlocks::find()
            .filter(content_blocks::Column::CourseId.eq(course_id))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询内容块失败: {e}")))?
            .into_iter()
            .map(|b| b.id)
            .collect();
        if block_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = VideoProgresses::find()
            .filter(Column::VideoBlockId.is_in(block_ids))
            .order_by_desc(Column::LastWatchedAt)
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询视频进度失败: {e}")))?;

        self.attach_progress_details(rows).await
    }

    async fn attach_progress_details(&self, rows: Vec<Model>) -> Result<Vec<VideoProgressDetail>> {
        let student_ids: Vec<i64> = rows.iter().map(|r| r.student_id).collect();
        let block_ids: Vec<i64> = rows.iter().map(|r| r.video_block_id).collect();

        let names: HashMap<i64, String> = Users::find()
            .filter(users::Column::Id.is_in(student_ids))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询学生失败: {e}")))?
            .into_iter()
            .map(|u| (u.id, u.name))
            .collect();

        let blocks: HashMap<i64, (i64, String)> = ContentBlocks::find()
            .filter(content_blocks::Column::Id.is_in(block_ids))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询内容块失败: {e}")))?
            .into_iter()
            .map(|b| (b.id, (b.course_id, b.title)))
            .collect();

        Ok(rows
            .into_iter()
            .map(|row| {
                let block = blocks.get(&row.video_block_id);
                VideoProgressDetail {
                    student_name: names.get(&row.student_id).cloned(),
                    course_id: block.map(|(course_id, _)| *course_id),
                    block_title: block.map(|(_, title)| title.clone()),
                    progress: row.into_progress(),
                }
            })
            .collect())
    }
}
