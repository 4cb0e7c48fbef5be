use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::AdminService;
use crate::models::{
    ApiResponse, ErrorCode,
    subjects::requests::{CreateSubjectRequest, SubjectListParams, UpdateSubjectRequest},
};
use crate::services::common::{ApiError, ServiceResult};

const MAX_NAME_CHARS: usize = 100;
const MAX_DESCRIPTION_CHARS: usize = 500;
pub(crate) const GRADE_LEVELS: std::ops::RangeInclusive<i32> = 1..=12;

fn subject_invalid(message: &str) -> ApiError {
    ApiError::bad_request(ErrorCode::SubjectInvalid, message)
}

fn subject_not_found() -> ApiError {
    ApiError::not_found(ErrorCode::SubjectNotFound, "Subject not found.")
}

fn check_name(name: &str) -> ServiceResult<String> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_CHARS {
        return Err(subject_invalid("Subject name must be 1 to 100 characters."));
    }
    Ok(name.to_string())
}

fn check_description(description: Option<String>) -> ServiceResult<Option<String>> {
    let description = description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    if description
        .as_ref()
        .is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_CHARS)
    {
        return Err(subject_invalid("Description must be at most 500 characters."));
    }
    Ok(description)
}

fn check_grade(grade: Option<i32>) -> ServiceResult<Option<i32>> {
    match grade {
        Some(g) if !GRADE_LEVELS.contains(&g) => {
            Err(subject_invalid("Grade level must be between 1 and 12."))
        }
        _ => Ok(grade),
    }
}

pub(crate) fn validate_create(mut req: CreateSubjectRequest) -> ServiceResult<CreateSubjectRequest> {
    req.name = check_name(&req.name)?;
    req.description = check_description(req.description)?;
    req.grade_level = check_grade(req.grade_level)?;
    Ok(req)
}

pub(crate) fn validate_update(mut req: UpdateSubjectRequest) -> ServiceResult<UpdateSubjectRequest> {
    if let Some(name) = &req.name {
        req.name = Some(check_name(name)?);
    }
    if let Some(description) = req.description {
        req.description = Some(check_description(description)?);
    }
    if let Some(grade) = req.grade_level {
        req.grade_level = Some(check_grade(grade)?);
    }
    Ok(req)
}

pub async fn list_subjects(
    service: &AdminService,
    request: &HttpRequest,
    params: SubjectListParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let subjects = storage
        .list_subjects(params.include_inactive)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(subjects, "Subjects retrieved successfully")))
}

pub async fn create_subject(
    service: &AdminService,
    request: &HttpRequest,
    body: CreateSubjectRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let subject = storage
        .create_subject(validate_create(body)?)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Created().json(ApiResponse::success(subject, "Subject created successfully")))
}

pub async fn update_subject(
    service: &AdminService,
    request: &HttpRequest,
    id: i64,
    body: UpdateSubjectRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let subject = storage
        .update_subject(id, validate_update(body)?)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(subject_not_found)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(subject, "Subject updated successfully")))
}

pub async fn delete_subject(
    service: &AdminService,
    request: &HttpRequest,
    id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    if !storage.delete_subject(id).await.map_err(ApiError::from)? {
        return Err(subject_not_found().into());
    }

    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty("Subject deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(name: &str) -> CreateSubjectRequest {
        CreateSubjectRequest {
            name: name.to_string(),
            description: Some("  ".to_string()),
            grade_level: Some(3),
            is_active: None,
        }
    }

    #[test]
    fn test_create_validation() {
        let ok = validate_create(create(" 수학 ")).unwrap();
        assert_eq!(ok.name, "수학");
        assert_eq!(ok.description, None);

        assert!(validate_create(create("")).is_err());
        assert!(validate_create(create(&"가".repeat(101))).is_err());

        let mut bad_grade = create("과학");
        bad_grade.grade_level = Some(13);
        assert_eq!(
            validate_create(bad_grade).unwrap_err().code,
            ErrorCode::SubjectInvalid
        );
    }

    #[test]
    fn test_update_keeps_explicit_null() {
        let update = validate_update(UpdateSubjectRequest {
            description: Some(None),
            grade_level: Some(None),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(update.description, Some(None));
        assert_eq!(update.grade_level, Some(None));

        assert!(
            validate_update(UpdateSubjectRequest {
                description: Some(Some("x".repeat(501))),
                ..Default::default()
            })
            .is_err()
        );
    }
}
