pub mod login;
pub mod register;
pub mod token;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use super::common::{ServiceResult, storage_from_request};
use crate::config::AppConfig;
use crate::models::auth::requests::{
    LoginRequest, RegisterParentRequest, RegisterStudentRequest, RegisterTeacherRequest,
};
use crate::storage::Storage;

pub struct AuthService {
    storage: Option<Arc<dyn Storage>>,
}

impl AuthService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ServiceResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => storage_from_request(request),
        }
    }

    pub(crate) fn get_config(&self) -> &AppConfig {
        AppConfig::get()
    }

    // 登录验证
    pub async fn login(
        &self,
        login_request: LoginRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        login::handle_login(self, login_request, request).await
    }

    // 学生注册
    pub async fn register_student(
        &self,
        body: RegisterStudentRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        register::register_student(self, body, request).await
    }

    // 家长注册
    pub async fn register_parent(
        &self,
        body: RegisterParentRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        register::register_parent(self, body, request).await
    }

    // 教师注册
    pub async fn register_teacher(
        &self,
        body: RegisterTeacherRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        register::register_teacher(self, body, request).await
    }

    // 学号校验
    pub async fn check_student_number(
        &self,
        student_number: &str,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        register::check_student_number(self, student_number, request).await
    }

    // 刷新令牌
    pub async fn refresh_token(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        token::handle_refresh_token(self, request).await
    }

    // 登出
    pub async fn logout(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        token::handle_logout(request).await
    }

    // 当前用户
    pub async fn get_user(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        token::handle_get_user(request).await
    }
}
