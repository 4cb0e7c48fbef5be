use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use super::{get_resource, post_resource};
use crate::middlewares;
use crate::models::courses::requests::ReorderRequest;
use crate::models::tests::requests::{
    CreateQuestionRequest, CreateTestRequest, GradeSubmissionRequest, SubmissionQuery,
    SubmitTestRequest, UpdateQuestionRequest, UpdateTestRequest,
};
use crate::models::users::entities::UserRole;
use crate::services::TestService;
use crate::utils::{SafeIDI64, SafeQuestionIdI64, SafeSubmissionIdI64, SafeTestIdI64};

// 懒加载的全局 TestService 实例
static TEST_SERVICE: Lazy<TestService> = Lazy::new(TestService::new_lazy);

pub async fn list_user_tests(request: HttpRequest) -> ActixResult<HttpResponse> {
    TEST_SERVICE.list_user_tests(&request).await
}

pub async fn get_test(request: HttpRequest, SafeIDI64(id): SafeIDI64) -> ActixResult<HttpResponse> {
    TEST_SERVICE.get_test(&request, id).await
}

pub async fn get_attempt(request: HttpRequest, SafeIDI64(id): SafeIDI64) -> ActixResult<HttpResponse> {
    TEST_SERVICE.get_attempt(&request, id).await
}

pub async fn submit_test(
    request: HttpRequest,
    body: web::Json<SubmitTestRequest>,
) -> ActixResult<HttpResponse> {
    TEST_SERVICE.submit_test(&request, body.into_inner()).await
}

pub async fn get_submission(
    request: HttpRequest,
    SafeTestIdI64(test_id): SafeTestIdI64,
    query: web::Query<SubmissionQuery>,
) -> ActixResult<HttpResponse> {
    TEST_SERVICE
        .get_submission(&request, test_id, query.into_inner())
        .await
}

pub async fn create_test(
    request: HttpRequest,
    body: web::Json<CreateTestRequest>,
) -> ActixResult<HttpResponse> {
    TEST_SERVICE.create_test(&request, body.into_inner()).await
}

pub async fn update_test(
    request: HttpRequest,
    SafeIDI64(id): SafeIDI64,
    body: web::Json<UpdateTestRequest>,
) -> ActixResult<HttpResponse> {
    TEST_SERVICE
        .update_test(&request, id, body.into_inner())
        .await
}

pub async fn delete_test(request: HttpRequest, SafeIDI64(id): SafeIDI64) -> ActixResult<HttpResponse> {
    TEST_SERVICE.delete_test(&request, id).await
}

pub async fn reorder_questions(
    request: HttpRequest,
    SafeIDI64(id): SafeIDI64,
    body: web::Json<ReorderRequest>,
) -> ActixResult<HttpResponse> {
    TEST_SERVICE
        .reorder_questions(&request, id, body.into_inner())
        .await
}

pub async fn create_question(
    request: HttpRequest,
    body: web::Json<CreateQuestionRequest>,
) -> ActixResult<HttpResponse> {
    TEST_SERVICE.create_question(&request, body.into_inner()).await
}

pub async fn update_question(
    request: HttpRequest,
    SafeQuestionIdI64(question_id): SafeQuestionIdI64,
    body: web::Json<UpdateQuestionRequest>,
) -> ActixResult<HttpResponse> {
    TEST_SERVICE
        .update_question(&request, question_id, body.into_inner())
        .await
}

pub async fn delete_question(
    request: HttpRequest,
    SafeQuestionIdI64(question_id): SafeQuestionIdI64,
) -> ActixResult<HttpResponse> {
    TEST_SERVICE.delete_question(&request, question_id).await
}

pub async fn grade_submission(
    request: HttpRequest,
    SafeSubmissionIdI64(submission_id): SafeSubmissionIdI64,
    body: web::Json<GradeSubmissionRequest>,
) -> ActixResult<HttpResponse> {
    TEST_SERVICE
        .grade_submission(&request, submission_id, body.into_inner())
        .await
}

pub async fn publish_submission(
    request: HttpRequest,
    SafeIDI64(id): SafeIDI64,
) -> ActixResult<HttpResponse> {
    TEST_SERVICE
        .publish_submission(&request, id)
        .await
}

pub async fn unpublish_submission(
    request: HttpRequest,
    SafeIDI64(id): SafeIDI64,
) -> ActixResult<HttpResponse> {
    TEST_SERVICE
        .unpublish_submission(&request, id)
        .await
}

pub async fn list_submissions(
    request: HttpRequest,
    SafeIDI64(id): SafeIDI64,
) -> ActixResult<HttpResponse> {
    TEST_SERVICE.list_submissions(&request, id).await
}

// 配置路由
pub fn configure_test_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/tests")
            .wrap(middlewares::RateLimit::api())
            .wrap(middlewares::RequireApproval)
            .wrap(middlewares::RequireJWT)
            // 所有角色可读（服务内再按角色裁剪）
            .service(get_resource("/user/tests").to(list_user_tests))
            .service(get_resource("/submission/{test_id}").to(get_submission))
            .service(get_resource("/{id:\\d+}").to(get_test))
            // 学生作答
            .service(
                get_resource("/{id}/attempt")
                    .wrap(middlewares::RequireRole::new(&UserRole::Student))
                    .to(get_attempt),
            )
            .service(
                post_resource("/submit")
                    .wrap(middlewares::RequireRole::new(&UserRole::Student))
                    .to(submit_test),
            )
            // 教师与管理员
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles()))
                    .route("", web::post().to(create_test))
                    .route("/", web::post().to(create_test))
                    .route("/question", web::post().to(create_question))
                    .route("/question/{question_id}", web::put().to(update_question))
                    .route("/question/{question_id}", web::delete().to(delete_question))
                    .route("/grade/{submission_id}", web::put().to(grade_submission))
                    .route("/submission/{id}/publish", web::put().to(publish_submission))
                    .route("/submission/{id}/unpublish", web::put().to(unpublish_submission))
                    .route("/{id}/questions/reorder", web::put().to(reorder_questions))
                    .route("/{id}/submissions", web::get().to(list_submissions))
                    .route("/{id}", web::put().to(update_test))
                    .route("/{id}", web::delete().to(delete_test)),
            ),
    );
}
