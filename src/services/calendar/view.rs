//! 日历事件的名称补全

use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{
    calendar::{
        entities::CalendarEvent,
        responses::{CalendarEventView, RelatedStudent},
    },
    parent::responses::ParentChildSummary,
};
use crate::services::common::{ApiError, ServiceResult};
use crate::storage::Storage;

fn ids(events: &[CalendarEvent], pick: impl Fn(&CalendarEvent) -> Option<i64>) -> Vec<i64> {
    let mut ids: Vec<i64> = events.iter().filter_map(pick).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// 家长视角：事件班级中的子女
pub fn related_children(event: &CalendarEvent, children: &[ParentChildSummary]) -> Vec<RelatedStudent> {
    children
        .iter()
        .filter(|c| c.class_id.is_some() && c.class_id == event.class_id)
        .map(|c| RelatedStudent {
            id: c.student_id,
            name: c.student_name.clone(),
        })
        .collect()
}

pub(crate) async fn annotate(
    storage: &Arc<dyn Storage>,
    events: Vec<CalendarEvent>,
    children: Option<&[ParentChildSummary]>,
) -> ServiceResult<Vec<CalendarEventView>> {
    let classes = storage
        .get_classes_by_ids(&ids(&events, |e| e.class_id))
        .await
        .map_err(ApiError::from)?;
    let subjects: HashMap<i64, String> = storage
        .list_subjects(true)
        .await
        .map_err(ApiError::from)?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect();
    let tests: HashMap<i64, String> = storage
        .get_tests_by_ids(&ids(&events, |e| e.test_id))
        .await
        .map_err(ApiError::from)?
        .into_iter()
        .map(|t| (t.id, t.title))
        .collect();
    let teachers: HashMap<i64, String> = storage
        .get_users_by_ids(&ids(&events, |e| e.teacher_id))
        .await
        .map_err(ApiError::from)?
        .into_iter()
        .map(|u| (u.id, u.name))
        .collect();
    let classes: HashMap<i64, (String, i64)> = classes
        .into_iter()
        .map(|c| (c.id, (c.name, c.subject_id)))
        .collect();

    Ok(events
        .into_iter()
        .map(|event| {
            let class = event.class_id.and_then(|id| classes.get(&id));
            CalendarEventView {
                class_name: class.map(|(name, _)| name.clone()),
                subject_name: class.and_then(|(_, subject_id)| subjects.get(subject_id).cloned()),
                test_title: event.test_id.and_then(|id| tests.get(&id).cloned()),
                teacher_name: event.teacher_id.and_then(|id| teachers.get(&id).cloned()),
                related_students: children.map(|c| related_children(&event, c)),
                event,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::calendar::entities::{EventType, Visibility};
    use crate::models::users::entities::Relationship;

    fn event(class_id: Option<i64>) -> CalendarEvent {
        let now = chrono::Utc::now();
        CalendarEvent {
            id: 1,
            event_type: EventType::TestDeadline,
            title: "마감".to_string(),
            description: None,
            start_date: "2025-04-01".to_string(),
            end_date: "2025-04-01".to_string(),
            class_id,
            test_id: None,
            teacher_id: None,
            visibility: Visibility::Class,
            created_by: 1,
            created_at: now,
            updated_at: now,
        }
    }

    fn child(id: i64, class_id: Option<i64>) -> ParentChildSummary {
        ParentChildSummary {
            student_id: id,
            student_name: format!("아이{id}"),
            student_number: format!("S{id}"),
            grade: None,
            class_id,
            class_name: None,
            subject_name: None,
            relationship: Relationship::Mother,
            linked_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_related_children_match_class() {
        let children = vec![child(1, Some(7)), child(2, Some(8)), child(3, None)];
        let related = related_children(&event(Some(7)), &children);
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].id, 1);
        assert!(related_children(&event(None), &children).is_empty());
    }
}
