use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 内容块类型
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub enum BlockType {
    Video,
    Test,
    Mindmap,
    Text,
}

impl BlockType {
    /// 参与进度统计的块类型
    pub fn is_tracked(&self) -> bool {
        matches!(self, BlockType::Video | BlockType::Test)
    }
}

impl<'de> Deserialize<'de> for BlockType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<BlockType>().map_err(|_| {
            serde::de::Error::custom(format!(
                "无效的内容块类型: '{s}'. 支持的类型: video, test, mindmap, text"
            ))
        })
    }
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockType::Video => write!(f, "video"),
            BlockType::Test => write!(f, "test"),
            BlockType::Mindmap => write!(f, "mindmap"),
            BlockType::Text => write!(f, "text"),
        }
    }
}

impl std::str::FromStr for BlockType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(BlockType::Video),
            "test" => Ok(BlockType::Test),
            "mindmap" => Ok(BlockType::Mindmap),
            "text" => Ok(BlockType::Text),
            _ => Err(format!("Invalid block type: {s}")),
        }
    }
}

// 课程
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub class_id: i64,
    pub teacher_id: i64,
    pub is_published: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

// 课程内容块
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct ContentBlock {
    pub id: i64,
    pub course_id: i64,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub title: String,
    pub content: serde_json::Value,
    pub order_index: i32,
    pub is_required: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl ContentBlock {
    /// video 块中的 YouTube 视频 ID
    pub fn video_id(&self) -> Option<String> {
        match self.block_type {
            BlockType::Video => self
                .content
                .get("video_id")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            _ => None,
        }
    }

    /// test 块引用的测试 ID
    pub fn test_id(&self) -> Option<i64> {
        match self.block_type {
            BlockType::Test => self.content.get("test_id").and_then(|v| v.as_i64()),
            _ => None,
        }
    }
}

// 课程直接分配的学生
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct CourseStudent {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub student_number: Option<String>,
    pub class_id: Option<i64>,
    pub class_name: Option<String>,
}
