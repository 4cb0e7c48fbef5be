//! 路径参数提取器
//!
//! 路径中的 ID 必须是正整数，否则直接返回 400 统一响应，处理函数无需再校验。

use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, error::InternalError};
use futures_util::future::{Ready, ready};

use crate::models::{ApiResponse, ErrorCode};

macro_rules! define_safe_id_extractors {
    ($($name:ident => $param:literal),* $(,)?) => {
        $(
            #[derive(Debug, Clone, Copy, PartialEq, Eq)]
            pub struct $name(pub i64);

            impl FromRequest for $name {
                type Error = actix_web::Error;
                type Future = Ready<Result<Self, Self::Error>>;

                fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
                    ready(parse_path_id(req, $param).map($name))
                }
            }
        )*
    };
}

define_safe_id_extractors! {
    SafeIDI64 => "id",
    SafeBlockIdI64 => "block_id",
    SafeClassIdI64 => "class_id",
    SafeCourseIdI64 => "course_id",
    SafeQuestionIdI64 => "question_id",
    SafeStudentIdI64 => "student_id",
    SafeSubmissionIdI64 => "submission_id",
    SafeTestIdI64 => "test_id",
}

fn parse_path_id(req: &HttpRequest, name: &str) -> Result<i64, actix_web::Error> {
    req.match_info()
        .get(name)
        .and_then(|raw| raw.parse::<i64>().ok())
        .filter(|id| *id > 0)
        .ok_or_else(|| {
            let response = HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::BadRequest,
                format!("Invalid path parameter: {name}"),
            ));
            InternalError::from_response(format!("invalid path parameter {name}"), response)
                .into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn test_valid_id_is_extracted() {
        let req = TestRequest::default().param("id", "42").to_http_request();
        let id = SafeIDI64::extract(&req).await.unwrap();
        assert_eq!(id, SafeIDI64(42));
    }

    #[actix_web::test]
    async fn test_invalid_ids_are_rejected() {
        for raw in ["abc", "0", "-3", "1.5"] {
            let req = TestRequest::default().param("block_id", raw).to_http_request();
            assert!(SafeBlockIdI64::extract(&req).await.is_err(), "{raw}");
        }
        let missing = TestRequest::default().to_http_request();
        assert!(SafeTestIdI64::extract(&missing).await.is_err());
    }
}
