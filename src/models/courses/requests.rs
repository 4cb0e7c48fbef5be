use serde::Deserialize;
use ts_rs::TS;

use super::entities::BlockType;
use crate::models::common::double_option;

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct CreateCourseRequest {
    pub title: String,
    pub description: Option<String>,
    pub class_id: i64,
    pub teacher_id: Option<i64>,
    pub initial_video_url: String,
    pub initial_video_title: Option<String>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub class_id: Option<i64>,
    pub teacher_id: Option<i64>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct PublishCourseRequest {
    pub is_published: bool,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct SetCourseStudentsRequest {
    pub student_ids: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct CreateBlockRequest {
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub title: String,
    pub content: serde_json::Value,
    pub is_required: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct UpdateBlockRequest {
    pub title: Option<String>,
    pub content: Option<serde_json::Value>,
    pub is_required: Option<bool>,
}

/// 重新排序（课程内容块、测试题目共用）
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct ReorderRequest {
    pub ordered_ids: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct AssignableStudentsParams {
    pub class_id: Option<i64>,
}

// 存储层写入的课程字段
#[derive(Debug, Clone)]
pub struct NewCourse {
    pub title: String,
    pub description: Option<String>,
    pub class_id: i64,
    pub teacher_id: i64,
    pub is_published: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CourseUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub class_id: Option<i64>,
    pub teacher_id: Option<i64>,
    pub is_published: Option<bool>,
}

// 存储层写入的内容块字段（content 已规范化）
#[derive(Debug, Clone)]
pub struct NewContentBlock {
    pub block_type: BlockType,
    pub title: String,
    pub content: serde_json::Value,
    pub is_required: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BlockUpdate {
    pub title: Option<String>,
    pub content: Option<serde_json::Value>,
    pub is_required: Option<bool>,
}

/// 课程列表范围
#[derive(Debug, Clone, PartialEq)]
pub enum CourseScope {
    All,
    /// 教师本人课程及其负责班级的课程
    Teacher(i64),
    /// 指定课程（学生/家长可访问的课程）
    Ids { ids: Vec<i64>, published_only: bool },
}
