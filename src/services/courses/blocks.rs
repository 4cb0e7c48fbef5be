//! 内容块：内容规范化、增删改与排序

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::Arc;

use super::CourseService;
use super::access::load_editable_course;
use crate::models::{
    ApiResponse, ErrorCode,
    courses::{
        entities::{BlockType, ContentBlock},
        requests::{BlockUpdate, CreateBlockRequest, NewContentBlock, ReorderRequest, UpdateBlockRequest},
    },
};
use crate::services::common::{ApiError, ServiceResult, current_user};
use crate::storage::Storage;
use crate::utils::youtube::validate_youtube_url;

fn block_invalid(message: impl Into<String>) -> ApiError {
    ApiError::bad_request(ErrorCode::BlockInvalid, message)
}

fn block_not_found() -> ApiError {
    ApiError::not_found(ErrorCode::BlockNotFound, "Content block not found.")
}

fn string_field<'a>(content: &'a Value, key: &str) -> Option<&'a str> {
    content.get(key).and_then(Value::as_str)
}

/// 按块类型规范化内容
pub fn normalize_block_content(block_type: BlockType, content: &Value) -> ServiceResult<Value> {
    if !content.is_object() {
        return Err(block_invalid("content must be an object."));
    }

    match block_type {
        BlockType::Video => {
            let url = string_field(content, "url")
                .ok_or_else(|| block_invalid("Video blocks need a url."))?;
            let link = validate_youtube_url(url).map_err(|_| {
                ApiError::bad_request(ErrorCode::InvalidYoutubeUrl, "Invalid YouTube URL.")
            })?;
            Ok(json!({"url": link.url, "video_id": link.video_id}))
        }
        BlockType::Mindmap => {
            let url = string_field(content, "url")
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .ok_or_else(|| block_invalid("Mindmap blocks need a url."))?;
            Ok(json!({"url": url}))
        }
        BlockType::Test => {
            let test_id = content
                .get("test_id")
                .and_then(Value::as_i64)
                .filter(|id| *id > 0)
                .ok_or_else(|| block_invalid("Test blocks need a positive test_id."))?;
            Ok(json!({"test_id": test_id}))
        }
        BlockType::Text => {
            let body = string_field(content, "body")
                .ok_or_else(|| block_invalid("Text blocks need a body."))?;
            Ok(json!({"body": body}))
        }
    }
}

/// ordered_ids 必须恰好是现有 ID 的一个排列
pub fn is_permutation(current: &[i64], ordered: &[i64]) -> bool {
    let unique: HashSet<i64> = ordered.iter().copied().collect();
    unique.len() == ordered.len()
        && ordered.len() == current.len()
        && current.iter().all(|id| unique.contains(id))
}

fn check_title(title: &str) -> ServiceResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(block_invalid("Block title is required."));
    }
    Ok(title.to_string())
}

async fn ensure_test_exists(storage: &Arc<dyn Storage>, content: &Value) -> ServiceResult<()> {
    if let Some(test_id) = content.get("test_id").and_then(Value::as_i64) {
        storage
            .get_test_by_id(test_id)
            .await
            .map_err(ApiError::from)?
            .ok_or_else(|| ApiError::not_found(ErrorCode::TestNotFound, "Test not found."))?;
    }
    Ok(())
}

async fn load_block(
    storage: &Arc<dyn Storage>,
    course_id: i64,
    block_id: i64,
) -> ServiceResult<ContentBlock> {
    storage
        .get_block_by_id(block_id)
        .await
        .map_err(ApiError::from)?
        .filter(|b| b.course_id == course_id)
        .ok_or_else(block_not_found)
}

pub async fn create_block(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
    body: CreateBlockRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;
    load_editable_course(&storage, &user, course_id).await?;

    let content = normalize_block_content(body.block_type, &body.content)?;
    if body.block_type == BlockType::Test {
        ensure_test_exists(&storage, &content).await?;
    }

    let block = storage
        .create_block(
            course_id,
            NewContentBlock {
                block_type: body.block_type,
                title: check_title(&body.title)?,
                content,
                is_required: body.is_required.unwrap_or(body.block_type.is_tracked()),
            },
        )
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Created().json(ApiResponse::success(block, "Block created successfully")))
}

pub async fn update_block(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
    block_id: i64,
    body: UpdateBlockRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;
    load_editable_course(&storage, &user, course_id).await?;
    let existing = load_block(&storage, course_id, block_id).await?;

    let content = match &body.content {
        Some(content) => {
            let content = normalize_block_content(existing.block_type, content)?;
            if existing.block_type == BlockType::Test {
                ensure_test_exists(&storage, &content).await?;
            }
            Some(content)
        }
        None => None,
    };

    let block = storage
        .update_block(
            block_id,
            BlockUpdate {
                title: body.title.as_deref().map(check_title).transpose()?,
                content,
                is_required: body.is_required,
            },
        )
        .await
        .map_err(ApiError::from)?
        .ok_or_else(block_not_found)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(block, "Block updated successfully")))
}

pub async fn delete_block(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
    block_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;
    load_editable_course(&storage, &user, course_id).await?;
    load_block(&storage, course_id, block_id).await?;

    storage.delete_block(block_id).await.map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty("Block deleted successfully")))
}

pub async fn reorder_blocks(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
    body: ReorderRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;
    load_editable_course(&storage, &user, course_id).await?;

    let current: Vec<i64> = storage
        .list_course_blocks(course_id)
        .await
        .map_err(ApiError::from)?
        .iter()
        .map(|b| b.id)
        .collect();
    if !is_permutation(&current, &body.ordered_ids) {
        return Err(ApiError::bad_request(
            ErrorCode::ReorderInvalid,
            "ordered_ids must list every block of the course exactly once.",
        )
        .into());
    }

    let blocks = storage
        .reorder_blocks(course_id, &body.ordered_ids)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(blocks, "Blocks reordered successfully")))
}
