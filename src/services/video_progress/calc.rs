//! 进度计算（单调不减）与教师概览

use std::collections::{HashMap, HashSet};

use crate::models::{
    courses::entities::{BlockType, ContentBlock},
    video_progress::{
        entities::VideoProgress, requests::ProgressUpsert, responses::TeacherCourseVideoOverview,
    },
};

pub const COMPLETION_THRESHOLD: f64 = 95.0;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 新的进度与是否需要记录观看活动
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressChange {
    pub upsert: ProgressUpsert,
    pub should_log: bool,
}

/// 观看时长与总时长只增不减；完成后保持完成
pub fn next_progress(
    previous: Option<&VideoProgress>,
    student_id: i64,
    video_block_id: i64,
    watched: f64,
    total: f64,
) -> ProgressChange {
    let prev_watched = previous.map_or(0.0, |p| p.watched_duration);
    let prev_total = previous.map_or(0.0, |p| p.total_duration);
    let was_completed = previous.is_some_and(|p| p.is_completed);

    let total_duration = total.max(prev_total).max(1.0);
    let watched_duration = watched.max(prev_watched).max(0.0).min(total_duration);
    let progress_percentage = round2(watched_duration / total_duration * 100.0).min(100.0);
    let is_completed = progress_percentage >= COMPLETION_THRESHOLD || was_completed;

    ProgressChange {
        should_log: watched_duration > prev_watched || (is_completed && !was_completed),
        upsert: ProgressUpsert {
            student_id,
            video_block_id,
            watched_duration,
            total_duration,
            progress_percentage,
            is_completed,
        },
    }
}

/// 课程平均进度取各学生平均进度的平均值
pub fn course_overview(
    course_id: i64,
    title: String,
    blocks: &[ContentBlock],
    records: &[VideoProgress],
) -> TeacherCourseVideoOverview {
    let video_ids: HashSet<i64> = blocks
        .iter()
        .filter(|b| b.course_id == course_id && b.block_type == BlockType::Video)
        .map(|b| b.id)
        .collect();
    let rows: Vec<&VideoProgress> = records
        .iter()
        .filter(|p| video_ids.contains(&p.video_block_id))
        .collect();

    let mut per_student: HashMap<i64, (f64, u32)> = HashMap::new();
    for row in &rows {
        let entry = per_student.entry(row.student_id).or_default();
        entry.0 += row.progress_percentage;
        entry.1 += 1;
    }
    let average_progress = if per_student.is_empty() {
        0.0
    } else {
        let sum: f64 = per_student
            .values()
            .map(|(total, count)| total / f64::from(*count))
            .sum();
        round2(sum / per_student.len() as f64)
    };

    TeacherCourseVideoOverview {
        course_id,
        title,
        video_block_count: video_ids.len() as i64,
        tracked_students: per_student.len() as i64,
        average_progress,
        completed_count: rows.iter().filter(|p| p.is_completed).count() as i64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::courses::progress::tests::{block, progress};

    #[test]
    fn test_first_report() {
        let change = next_progress(None, 1, 2, 30.0, 120.0);
        assert_eq!(change.upsert.progress_percentage, 25.0);
        assert!(!change.upsert.is_completed);
        assert!(change.should_log);
    }

    #[test]
    fn test_progress_never_decreases() {
        let mut prev = progress(2, 50.0, false);
        prev.watched_duration = 60.0;
        prev.total_duration = 120.0;

        // 回退播放不会降低进度，也不记录活动
        let change = next_progress(Some(&prev), 1, 2, 10.0, 100.0);
        assert_eq!(change.upsert.watched_duration, 60.0);
        assert_eq!(change.upsert.total_duration, 120.0);
        assert_eq!(change.upsert.progress_percentage, 50.0);
        assert!(!change.should_log);
    }

    #[test]
    fn test_completion_threshold_and_clamp() {
        let change = next_progress(None, 1, 2, 95.0, 100.0);
        assert!(change.upsert.is_completed);

        let over = next_progress(None, 1, 2, 500.0, 100.0);
        assert_eq!(over.upsert.watched_duration, 100.0);
        assert_eq!(over.upsert.progress_percentage, 100.0);

        let tiny = next_progress(None, 1, 2, -5.0, 0.0);
        assert_eq!(tiny.upsert.total_duration, 1.0);
        assert_eq!(tiny.upsert.watched_duration, 0.0);
        assert!(!tiny.should_log);
    }

    #[test]
    fn test_completed_stays_completed() {
        let mut prev = progress(2, 100.0, true);
        prev.total_duration = 100.0;
        prev.watched_duration = 100.0;
        let longer = next_progress(Some(&prev), 1, 2, 100.0, 400.0);
        assert_eq!(longer.upsert.progress_percentage, 25.0);
        assert!(longer.upsert.is_completed);
        assert!(!longer.should_log);
    }

    #[test]
    fn test_overview_averages_per_student() {
        let blocks = vec![
            block(1, BlockType::Video, 1, true),
            block(2, BlockType::Video, 2, true),
            block(3, BlockType::Text, 3, false),
        ];
        let mut a1 = progress(1, 100.0, true);
        a1.student_id = 10;
        let mut a2 = progress(2, 50.0, false);
        a2.student_id = 10;
        let mut b1 = progress(1, 20.0, false);
        b1.student_id = 11;

        let overview = course_overview(1, "읽기".to_string(), &blocks, &[a1, a2, b1]);
        assert_eq!(overview.video_block_count, 2);
        assert_eq!(overview.tracked_students, 2);
        // (75 + 20) / 2
        assert_eq!(overview.average_progress, 47.5);
        assert_eq!(overview.completed_count, 1);

        let empty = course_overview(1, "읽기".to_string(), &blocks, &[]);
        assert_eq!(empty.average_progress, 0.0);
    }
}
