//! 学习报告统计
//!
//! 按时间范围（unix 秒，闭区间）取出行后在内存中聚合，
//! 避免各数据库方言在日期函数上的差异。

use std::collections::{BTreeMap, HashMap, HashSet};

use super::SeaOrmStorage;
use crate::entity::prelude::{ActivityLogs, Qnas, Students, TestSubmissions, VideoProgresses};
use crate::entity::{activity_logs, qna, students, test_submissions, video_progress};
use crate::errors::{Result, StudyLinkError};
use crate::models::activity::entities::ActivityType;
use crate::models::reports::responses::{
    ActivityTypeCount, AdminActivityReport, ClassReport, ClassTestStats, ClassVideoStats,
    DailyActivity, LoginReport, QuestionReport, StudentReport, TestReport, VideoReport,
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect};

/// 平均值，保留两位小数；无数据时为 None
fn average(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0u32), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| (sum / f64::from(count) * 100.0).round() / 100.0)
}

impl SeaOrmStorage {
    /// 学生报告
    pub async fn student_report_impl(
        &self,
        student_id: i64,
        start: i64,
        end: i64,
    ) -> Result<StudentReport> {
        let progress = VideoProgresses::find()
            .filter(video_progress::Column::StudentId.eq(student_id))
            .filter(video_progress::Column::LastWatchedAt.between(start, end))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("统计视频进度失败: {e}")))?;

        let submissions = TestSubmissions::find()
            .filter(test_submissions::Column::StudentId.eq(student_id))
            .filter(test_submissions::Column::SubmittedAt.between(start, end))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("统计测试提交失败: {e}")))?;

        let questions = Qnas::find()
            .filter(qna::Column::StudentId.eq(student_id))
            .filter(qna::Column::CreatedAt.between(start, end))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("统计问答失败: {e}")))?;

        let logins = ActivityLogs::find()
            .filter(activity_logs::Column::UserId.eq(student_id))
            .filter(activity_logs::Column::ActivityType.eq(ActivityType::Login.to_string()))
            .filter(activity_logs::Column::CreatedAt.between(start, end))
            .count(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("统计登录次数失败: {e}")))?;

        Ok(StudentReport {
            video_progress: VideoReport {
                total_videos: progress.len() as i64,
                completed_videos: progress.iter().filter(|p| p.is_completed).count() as i64,
                average_progress: average(progress.iter().map(|p| p.progress_percentage)),
            },
            test_submissions: TestReport {
                total_tests: submissions.len() as i64,
                graded_tests: submissions.iter().filter(|s| s.is_graded).count() as i64,
                average_score: average(submissions.iter().filter_map(|s| s.score)),
            },
            questions: QuestionReport {
                total_questions: questions.len() as i64,
                answered_questions: questions.iter().filter(|q| q.answer.is_some()).count()
                    as i64,
            },
            login_activity: LoginReport {
                total_logins: logins as i64,
            },
        })
    }

    /// 班级报告
    pub async fn class_report_impl(
        &self,
        class_id: i64,
        start: i64,
        end: i64,
    ) -> Result<ClassReport> {
        let student_ids: Vec<i64> = Students::find()
            .select_only()
            .column(students::Column::UserId)
            .filter(students::Column::ClassId.eq(class_id))
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询班级学生失败: {e}")))?;

        if student_ids.is_empty() {
            return Ok(ClassReport::default());
        }

        let progress = VideoProgresses::find()
            .filter(video_progress::Column::StudentId.is_in(student_ids.clone()))
            .filter(video_progress::Column::LastWatchedAt.between(start, end))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("统计视频进度失败: {e}")))?;

        let submissions = TestSubmissions::find()
            .filter(test_submissions::Column::StudentId.is_in(student_ids.clone()))
            .filter(test_submissions::Column::SubmittedAt.between(start, end))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("统计测试提交失败: {e}")))?;

        let video_students: HashSet<i64> = progress.iter().map(|p| p.student_id).collect();
        let test_students: HashSet<i64> = submissions.iter().map(|s| s.student_id).collect();

        Ok(ClassReport {
            student_count: student_ids.len() as i64,
            video_stats: ClassVideoStats {
                active_students: video_students.len() as i64,
                total_views: progress.len() as i64,
                average_progress: average(progress.iter().map(|p| p.progress_percentage)),
            },
            test_stats: ClassTestStats {
                active_students: test_students.len() as i64,
                total_submissions: submissions.len() as i64,
                average_score: average(submissions.iter().filter_map(|s| s.score)),
            },
        })
    }

    /// 管理员活动报告：按日（UTC）与按类型统计
    pub async fn admin_activity_report_impl(
        &self,
        start: i64,
        end: i64,
    ) -> Result<AdminActivityReport> {
        let logs = ActivityLogs::find()
            .filter(activity_logs::Column::CreatedAt.between(start, end))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("统计活动日志失败: {e}")))?;

        let mut daily: BTreeMap<String, (i64, HashSet<i64>)> = BTreeMap::new();
        let mut by_type: HashMap<String, i64> = HashMap::new();
        for log in logs {
            let date = chrono::DateTime::<chrono::Utc>::from_timestamp(log.created_at, 0)
                .unwrap_or_default()
                .format("%Y-%m-%d")
                .to_string();
            let entry = daily.entry(date).or_default();
            entry.0 += 1;
            entry.1.insert(log.user_id);
            *by_type.entry(log.activity_type).or_default() += 1;
        }

        let mut activity_by_type: Vec<ActivityTypeCount> = by_type
            .into_iter()
            .map(|(activity_type, count)| ActivityTypeCount {
                activity_type,
                count,
            })
            .collect();
        activity_by_type.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.activity_type.cmp(&b.activity_type))
        });

        Ok(AdminActivityReport {
            daily_activity: daily
                .into_iter()
                .map(|(date, (total, users))| DailyActivity {
                    date,
                    total_activities: total,
                    active_users: users.len() as i64,
                })
                .collect(),
            activity_by_type,
        })
    }
}
