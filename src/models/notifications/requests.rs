use serde::Deserialize;
use ts_rs::TS;

use super::entities::NotificationType;

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/notification.ts")]
pub struct NotificationListParams {
    pub limit: Option<u64>,
}

// 待写入的通知
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub user_id: i64,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub related_id: Option<i64>,
}

/// 各类事件的通知内容
impl NewNotification {
    fn build(
        user_id: i64,
        notification_type: NotificationType,
        title: &str,
        message: String,
        related_id: Option<i64>,
    ) -> Self {
        Self {
            user_id,
            notification_type,
            title: title.to_string(),
            message,
            related_id,
        }
    }

    pub fn question_answered(student_id: i64, question: &str, course_id: i64) -> Self {
        Self::build(
            student_id,
            NotificationType::Answer,
            "질문에 답변이 등록되었습니다",
            format!("\"{question}\" 질문에 답변이 등록되었습니다."),
            Some(course_id),
        )
    }

    pub fn class_assigned(teacher_id: i64, class_name: &str, class_id: i64) -> Self {
        Self::build(
            teacher_id,
            NotificationType::ClassChange,
            "새 반이 배정되었습니다",
            format!("\"{class_name}\" 반이 배정되었습니다. 담당 교사로 지정되었습니다."),
            Some(class_id),
        )
    }

    pub fn class_updated(teacher_id: i64, class_name: &str, class_id: i64) -> Self {
        Self::build(
            teacher_id,
            NotificationType::ClassChange,
            "담당 반 정보가 변경되었습니다",
            format!("\"{class_name}\" 반의 정보가 수정되었습니다. 내용을 확인해주세요."),
            Some(class_id),
        )
    }

    pub fn class_unassigned(teacher_id: i64, class_name: &str, class_id: i64) -> Self {
        Self::build(
            teacher_id,
            NotificationType::ClassChange,
            "담당 반에서 해제되었습니다",
            format!("\"{class_name}\" 반의 담당에서 해제되었습니다."),
            Some(class_id),
        )
    }

    pub fn class_archived(teacher_id: i64, class_name: &str) -> Self {
        Self::build(
            teacher_id,
            NotificationType::ClassChange,
            "담당 반이 아카이브되었습니다",
            format!("\"{class_name}\" 반이 비활성화되었습니다."),
            None,
        )
    }

    pub fn course_assigned(teacher_id: i64, course_title: &str, course_id: i64) -> Self {
        Self::build(
            teacher_id,
            NotificationType::CourseChange,
            "새 강의가 배정되었습니다",
            format!("\"{course_title}\" 강의가 배정되었습니다. 담당 교사로 지정되었습니다."),
            Some(course_id),
        )
    }

    pub fn course_updated(teacher_id: i64, course_title: &str, course_id: i64) -> Self {
        Self::build(
            teacher_id,
            NotificationType::CourseChange,
            "담당 강의 정보가 변경되었습니다",
            format!("\"{course_title}\" 강의의 정보가 수정되었습니다. 내용을 확인해주세요."),
            Some(course_id),
        )
    }

    pub fn course_unassigned(teacher_id: i64, course_title: &str, course_id: i64) -> Self {
        Self::build(
            teacher_id,
            NotificationType::CourseChange,
            "담당 강의에서 해제되었습니다",
            format!("\"{course_title}\" 강의의 담당에서 해제되었습니다."),
            Some(course_id),
        )
    }

    pub fn course_deleted(teacher_id: i64, course_title: &str) -> Self {
        Self::build(
            teacher_id,
            NotificationType::CourseChange,
            "담당 강의가 아카이브되었습니다",
            format!("\"{course_title}\" 강의가 비활성화되었습니다."),
            None,
        )
    }

    pub fn course_publish_changed(
        teacher_id: i64,
        course_title: &str,
        course_id: i64,
        is_published: bool,
    ) -> Self {
        let state = if is_published { "공개" } else { "비공개" };
        Self::build(
            teacher_id,
            NotificationType::CourseChange,
            "강의 공개 상태가 변경되었습니다",
            format!("\"{course_title}\" 강의의 공개 상태가 \"{state}\"로 변경되었습니다."),
            Some(course_id),
        )
    }

    pub fn test_graded(student_id: i64, test_title: &str, score: Option<f64>, test_id: i64) -> Self {
        let score_text = score.map(|s| format!(" 점수: {s}점")).unwrap_or_default();
        Self::build(
            student_id,
            NotificationType::Grade,
            "테스트 채점 결과가 공개되었습니다",
            format!("\"{test_title}\" 테스트의 채점 결과가 공개되었습니다.{score_text}"),
            Some(test_id),
        )
    }

    pub fn test_result_published(student_id: i64, test_title: &str, test_id: i64) -> Self {
        Self::build(
            student_id,
            NotificationType::Grade,
            "테스트 결과가 공개되었습니다",
            format!("\"{test_title}\" 테스트 결과가 공개되었습니다. 확인해주세요."),
            Some(test_id),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_message_includes_score_when_known() {
        let with_score = NewNotification::test_graded(1, "단원평가", Some(85.0), 9);
        assert_eq!(with_score.notification_type, NotificationType::Grade);
        assert!(with_score.message.ends_with("점수: 85점"));
        assert_eq!(with_score.related_id, Some(9));

        let without = NewNotification::test_graded(1, "단원평가", None, 9);
        assert!(without.message.ends_with("공개되었습니다."));
    }

    #[test]
    fn test_publish_state_text() {
        let n = NewNotification::course_publish_changed(2, "읽기", 3, false);
        assert!(n.message.contains("\"비공개\""));
        assert_eq!(n.notification_type, NotificationType::CourseChange);
    }
}
