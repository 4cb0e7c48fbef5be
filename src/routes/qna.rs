use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use super::{get_resource, post_resource};
use crate::middlewares;
use crate::models::qna::requests::{AnswerQnaRequest, CreateQnaRequest};
use crate::models::users::entities::UserRole;
use crate::services::QnaService;
use crate::utils::{SafeCourseIdI64, SafeIDI64};

// 懒加载的全局 QnaService 实例
static QNA_SERVICE: Lazy<QnaService> = Lazy::new(QnaService::new_lazy);

pub async fn create_question(
    request: HttpRequest,
    body: web::Json<CreateQnaRequest>,
) -> ActixResult<HttpResponse> {
    QNA_SERVICE.create_question(&request, body.into_inner()).await
}

pub async fn list_course_questions(
    request: HttpRequest,
    SafeCourseIdI64(course_id): SafeCourseIdI64,
) -> ActixResult<HttpResponse> {
    QNA_SERVICE
        .list_course_questions(&request, course_id)
        .await
}

pub async fn list_my_questions(request: HttpRequest) -> ActixResult<HttpResponse> {
    QNA_SERVICE.list_my_questions(&request).await
}

pub async fn list_teacher_questions(request: HttpRequest) -> ActixResult<HttpResponse> {
    QNA_SERVICE.list_teacher_questions(&request).await
}

pub async fn answer_question(
    request: HttpRequest,
    SafeIDI64(id): SafeIDI64,
    body: web::Json<AnswerQnaRequest>,
) -> ActixResult<HttpResponse> {
    QNA_SERVICE
        .answer_question(&request, id, body.into_inner())
        .await
}

pub async fn delete_question(request: HttpRequest, SafeIDI64(id): SafeIDI64) -> ActixResult<HttpResponse> {
    QNA_SERVICE.delete_question(&request, id).await
}

// 配置路由
pub fn configure_qna_routes(cfg: &mut web::ServiceConfig) {
    let student = || middlewares::RequireRole::new(&UserRole::Student);

    cfg.service(
        web::scope("/api/v1/qna")
            .wrap(middlewares::RateLimit::api())
            .wrap(middlewares::RequireApproval)
            .wrap(middlewares::RequireJWT)
            .service(post_resource("").wrap(student()).to(create_question))
            .service(post_resource("/").wrap(student()).to(create_question))
            .service(get_resource("/me").wrap(student()).to(list_my_questions))
            .service(get_resource("/course/{course_id}").to(list_course_questions))
            .service(
                web::resource("/{id}")
                    .guard(actix_web::guard::Delete())
                    .wrap(middlewares::RequireRole::new(&UserRole::Admin))
                    .to(delete_question),
            )
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles()))
                    .route("/teacher", web::get().to(list_teacher_questions))
                    .route("/{id}/answer", web::put().to(answer_question)),
            ),
    );
}
