//! 学生课程进度与视频汇总（纯计算，不访问存储）

use std::collections::HashMap;

use crate::models::{
    courses::{
        entities::{BlockType, ContentBlock},
        responses::{
            BlockStudentStatus, CourseBlockView, CourseProgress, NextContent, NextContentStatus,
            SubmissionStatus,
        },
    },
    tests::entities::TestSubmission,
    video_progress::{entities::VideoProgress, responses::VideoProgressSummary},
};

/// 学生在某课程上的已知记录
#[derive(Debug, Default)]
pub struct StudentRecords<'a> {
    /// video_block_id -> 进度
    pub video: HashMap<i64, &'a VideoProgress>,
    /// test_id -> 提交
    pub submissions: HashMap<i64, &'a TestSubmission>,
}

impl<'a> StudentRecords<'a> {
    pub fn new(
        progress: impl IntoIterator<Item = &'a VideoProgress>,
        submissions: impl IntoIterator<Item = &'a TestSubmission>,
    ) -> Self {
        Self {
            video: progress.into_iter().map(|p| (p.video_block_id, p)).collect(),
            submissions: submissions.into_iter().map(|s| (s.test_id, s)).collect(),
        }
    }

    fn submission_for(&self, block: &ContentBlock) -> Option<&'a TestSubmission> {
        block
            .test_id()
            .and_then(|test_id| self.submissions.get(&test_id).copied())
    }

    /// 视频看完、测试已提交即为完成；其他类型总是完成
    pub fn is_completed(&self, block: &ContentBlock) -> bool {
        match block.block_type {
            BlockType::Video => self.video.get(&block.id).is_some_and(|p| p.is_completed),
            BlockType::Test => self.submission_for(block).is_some(),
            BlockType::Mindmap | BlockType::Text => true,
        }
    }

    pub fn status(&self, block: &ContentBlock) -> BlockStudentStatus {
        match block.block_type {
            BlockType::Video => match self.video.get(&block.id) {
                Some(p) => BlockStudentStatus {
                    is_completed: p.is_completed,
                    progress_percentage: Some(p.progress_percentage),
                    watched_duration: Some(p.watched_duration),
                    total_duration: Some(p.total_duration),
                    last_watched_at: Some(p.last_watched_at),
                    ..Default::default()
                },
                None => BlockStudentStatus {
                    progress_percentage: Some(0.0),
                    ..Default::default()
                },
            },
            BlockType::Test => {
                let submission = self.submission_for(block);
                BlockStudentStatus {
                    is_completed: submission.is_some(),
                    has_submission: Some(submission.is_some()),
                    submission_status: submission.map(submission_status),
                    ..Default::default()
                }
            }
            BlockType::Mindmap | BlockType::Text => BlockStudentStatus {
                is_completed: true,
                ..Default::default()
            },
        }
    }
}

/// 成绩公开前不带分数
pub fn submission_status(submission: &TestSubmission) -> SubmissionStatus {
    SubmissionStatus {
        submission_id: submission.id,
        is_graded: submission.is_graded,
        is_published: submission.is_published,
        score: submission.score.filter(|_| submission.is_published),
        submitted_at: submission.submitted_at,
    }
}

fn sorted(blocks: &[ContentBlock]) -> Vec<&ContentBlock> {
    let mut sorted: Vec<&ContentBlock> = blocks.iter().collect();
    sorted.sort_by_key(|b| (b.order_index, b.id));
    sorted
}

fn is_required_tracked(block: &ContentBlock) -> bool {
    block.is_required && block.block_type.is_tracked()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn next_content(
    block: &ContentBlock,
    status: NextContentStatus,
    records: &StudentRecords<'_>,
) -> NextContent {
    let progress_percentage = match block.block_type {
        BlockType::Video => Some(
            records
                .video
                .get(&block.id)
                .map_or(0.0, |p| p.progress_percentage),
        ),
        _ => None,
    };
    NextContent {
        block_id: block.id,
        block_type: block.block_type,
        title: block.title.clone(),
        is_required: block.is_required,
        status,
        progress_percentage,
        video_id: block.video_id(),
        test_id: block.test_id(),
    }
}

/// 课程进度与下一个学习内容
pub fn course_progress(
    blocks: &[ContentBlock],
    records: &StudentRecords<'_>,
) -> (CourseProgress, Option<NextContent>) {
    let ordered = sorted(blocks);
    let required: Vec<&ContentBlock> = ordered
        .iter()
        .copied()
        .filter(|b| is_required_tracked(b))
        .collect();
    let completed = required.iter().filter(|b| records.is_completed(b)).count();
    let first_pending = required.iter().copied().find(|b| !records.is_completed(b));

    let progress_percentage = if required.is_empty() {
        if ordered.is_empty() { 0.0 } else { 100.0 }
    } else {
        round2(completed as f64 / required.len() as f64 * 100.0)
    };

    let next = match first_pending {
        Some(block) => Some(next_content(block, NextContentStatus::Pending, records)),
        None => required
            .last()
            .or(ordered.last())
            .map(|block| next_content(block, NextContentStatus::Completed, records)),
    };

    (
        CourseProgress {
            progress_percentage,
            completed_blocks: completed as i64,
            total_blocks: required.len() as i64,
            next_uncompleted_title: first_pending.map(|b| b.title.clone()),
            next_uncompleted_block_id: first_pending.map(|b| b.id),
        },
        next,
    )
}

/// 按顺序带上学生状态的内容块
pub fn student_block_views(
    blocks: Vec<ContentBlock>,
    records: &StudentRecords<'_>,
) -> Vec<CourseBlockView> {
    let mut blocks = blocks;
    blocks.sort_by_key(|b| (b.order_index, b.id));
    blocks
        .into_iter()
        .map(|block| CourseBlockView {
            student_status: Some(records.status(&block)),
            block,
        })
        .collect()
}

/// 每个视频块的观看汇总
pub fn video_summary(blocks: &[ContentBlock], records: &[VideoProgress]) -> Vec<VideoProgressSummary> {
    sorted(blocks)
        .into_iter()
        .filter(|b| b.block_type == BlockType::Video)
        .map(|block| {
            let rows: Vec<&VideoProgress> = records
                .iter()
                .filter(|p| p.video_block_id == block.id)
                .collect();
            let average_progress = if rows.is_empty() {
                0.0
            } else {
                round2(rows.iter().map(|p| p.progress_percentage).sum::<f64>() / rows.len() as f64)
            };
            VideoProgressSummary {
                block_id: block.id,
                block_title: block.title.clone(),
                order_index: block.order_index,
                is_required: block.is_required,
                tracked_students: rows.len() as i64,
                completed_count: rows.iter().filter(|p| p.is_completed).count() as i64,
                average_progress,
                last_activity_at: rows.iter().map(|p| p.last_watched_at).max(),
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn block(id: i64, block_type: BlockType, order_index: i32, is_required: bool) -> ContentBlock {
        let now = chrono::Utc::now();
        let content = match block_type {
            BlockType::Video => json!({"url": "https://youtu.be/dQw4w9WgXcQ", "video_id": "dQw4w9WgXcQ"}),
            BlockType::Test => json!({"test_id": id * 10}),
            BlockType::Mindmap => json!({"url": "https://example.com/map"}),
            BlockType::Text => json!({"body": "본문"}),
        };
        ContentBlock {
            id,
            course_id: 1,
            block_type,
            title: format!("block {id}"),
            content,
            order_index,
            is_required,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn progress(block_id: i64, pct: f64, done: bool) -> VideoProgress {
        let now = chrono::Utc::now();
        VideoProgress {
            id: block_id,
            student_id: 9,
            video_block_id: block_id,
            watched_duration: pct,
            total_duration: 100.0,
            progress_percentage: pct,
            is_completed: done,
            last_watched_at: now,
            created_at: now,
        }
    }

    fn submission(test_id: i64, published: bool) -> TestSubmission {
        TestSubmission {
            id: 1,
            test_id,
            student_id: 9,
            answers: json!({}),
            score: Some(80.0),
            is_graded: true,
            is_published: published,
            submitted_at: chrono::Utc::now(),
            graded_at: None,
        }
    }

    #[test]
    fn test_empty_course() {
        let (p, next) = course_progress(&[], &StudentRecords::default());
        assert_eq!(p.progress_percentage, 0.0);
        assert!(next.is_none());
    }

    #[test]
    fn test_no_required_blocks_is_complete() {
        let blocks = vec![block(1, BlockType::Text, 1, true), block(2, BlockType::Video, 2, false)];
        let (p, next) = course_progress(&blocks, &StudentRecords::default());
        assert_eq!(p.progress_percentage, 100.0);
        assert_eq!(p.total_blocks, 0);
        let next = next.unwrap();
        assert_eq!(next.block_id, 2);
        assert_eq!(next.status, NextContentStatus::Completed);
    }

    #[test]
    fn test_progress_and_next_pending() {
        // 乱序给出，按 order_index 计算
        let blocks = vec![
            block(3, BlockType::Test, 3, true),
            block(1, BlockType::Video, 1, true),
            block(2, BlockType::Mindmap, 2, true),
        ];
        let watched = [progress(1, 96.0, true)];
        let records = StudentRecords::new(watched.iter(), []);
        let (p, next) = course_progress(&blocks, &records);
        assert_eq!(p.completed_blocks, 1);
        assert_eq!(p.total_blocks, 2);
        assert_eq!(p.progress_percentage, 50.0);
        assert_eq!(p.next_uncompleted_block_id, Some(3));

        let next = next.unwrap();
        assert_eq!(next.status, NextContentStatus::Pending);
        assert_eq!(next.test_id, Some(30));
        assert_eq!(next.video_id, None);
    }

    #[test]
    fn test_all_done_points_to_last_required() {
        let blocks = vec![
            block(1, BlockType::Video, 1, true),
            block(2, BlockType::Test, 2, true),
            block(3, BlockType::Text, 3, false),
        ];
        let watched = [progress(1, 100.0, true)];
        let submitted = [submission(20, false)];
        let records = StudentRecords::new(watched.iter(), submitted.iter());
        let (p, next) = course_progress(&blocks, &records);
        assert_eq!(p.progress_percentage, 100.0);
        assert_eq!(p.next_uncompleted_title, None);
        let next = next.unwrap();
        assert_eq!(next.block_id, 2);
        assert_eq!(next.status, NextContentStatus::Completed);
    }

    #[test]
    fn test_video_next_carries_progress() {
        let blocks = vec![block(1, BlockType::Video, 1, true)];
        let watched = [progress(1, 42.5, false)];
        let records = StudentRecords::new(watched.iter(), []);
        let (p, next) = course_progress(&blocks, &records);
        assert_eq!(p.progress_percentage, 0.0);
        let next = next.unwrap();
        assert_eq!(next.progress_percentage, Some(42.5));
        assert_eq!(next.video_id.as_deref(), Some("dQw4w9WgXcQ"));
    }

    #[test]
    fn test_block_views_hide_unpublished_score() {
        let blocks = vec![block(2, BlockType::Test, 2, true), block(1, BlockType::Video, 1, true)];
        let submitted = [submission(20, false)];
        let records = StudentRecords::new([], submitted.iter());
        let views = student_block_views(blocks, &records);
        assert_eq!(views[0].block.id, 1);
        let status = views[1].student_status.clone().unwrap();
        assert_eq!(status.has_submission, Some(true));
        assert_eq!(status.submission_status.unwrap().score, None);
    }

    #[test]
    fn test_video_summary() {
        let blocks = vec![
            block(1, BlockType::Video, 1, true),
            block(2, BlockType::Text, 2, false),
            block(3, BlockType::Video, 3, false),
        ];
        let mut other = progress(1, 50.0, false);
        other.student_id = 10;
        let records = vec![progress(1, 100.0, true), other];
        let summary = video_summary(&blocks, &records);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].tracked_students, 2);
        assert_eq!(summary[0].completed_count, 1);
        assert_eq!(summary[0].average_progress, 75.0);
        assert_eq!(summary[1].average_progress, 0.0);
        assert_eq!(summary[1].last_activity_at, None);
    }
}
