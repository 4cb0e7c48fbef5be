//! 管理端：概览、用户、科目、班级
//!
//! 系统设置见 `services::system`，活动报告见 `services::reports`。

pub mod classes;
pub mod overview;
pub mod subjects;
pub mod users;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use super::common::{ServiceResult, storage_from_request};
use crate::models::{
    admin::requests::{AdminCreateUserRequest, AdminUpdateUserRequest},
    classes::requests::{ClassListParams, CreateClassRequest, UpdateClassRequest},
    subjects::requests::{CreateSubjectRequest, SubjectListParams, UpdateSubjectRequest},
    users::requests::UserListParams,
};
use crate::storage::Storage;

pub struct AdminService {
    storage: Option<Arc<dyn Storage>>,
}

impl AdminService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ServiceResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => storage_from_request(request),
        }
    }

    // 首页概览
    pub async fn get_overview(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        overview::get_overview(self, request).await
    }

    // 全部课程
    pub async fn list_courses(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        overview::list_courses(self, request).await
    }

    // 创建用户
    pub async fn create_user(
        &self,
        request: &HttpRequest,
        body: AdminCreateUserRequest,
    ) -> ActixResult<HttpResponse> {
        users::create_user(self, request, body).await
    }

    // 用户列表
    pub async fn list_users(
        &self,
        request: &HttpRequest,
        params: UserListParams,
    ) -> ActixResult<HttpResponse> {
        users::list_users(self, request, params).await
    }

    // 审批教师
    pub async fn approve_user(&self, request: &HttpRequest, id: i64) -> ActixResult<HttpResponse> {
        users::approve_user(self, request, id).await
    }

    // 更新用户
    pub async fn update_user(
        &self,
        request: &HttpRequest,
        id: i64,
        body: AdminUpdateUserRequest,
    ) -> ActixResult<HttpResponse> {
        users::update_user(self, request, id, body).await
    }

    // 停用用户
    pub async fn deactivate_user(
        &self,
        request: &HttpRequest,
        id: i64,
    ) -> ActixResult<HttpResponse> {
        users::deactivate_user(self, request, id).await
    }

    // 删除用户
    pub async fn delete_user(&self, request: &HttpRequest, id: i64) -> ActixResult<HttpResponse> {
        users::delete_user(self, request, id).await
    }

    // 科目列表
    pub async fn list_subjects(
        &self,
        request: &HttpRequest,
        params: SubjectListParams,
    ) -> ActixResult<HttpResponse> {
        subjects::list_subjects(self, request, params).await
    }

    // 创建科目
    pub async fn create_subject(
        &self,
        request: &HttpRequest,
        body: CreateSubjectRequest,
    ) -> ActixResult<HttpResponse> {
        subjects::create_subject(self, request, body).await
    }

    // 更新科目
    pub async fn update_subject(
        &self,
        request: &HttpRequest,
        id: i64,
        body: UpdateSubjectRequest,
    ) -> ActixResult<HttpResponse> {
        subjects::update_subject(self, request, id, body).await
    }

    // 删除科目
    pub async fn delete_subject(&self, request: &HttpRequest, id: i64) -> ActixResult<HttpResponse> {
        subjects::delete_subject(self, request, id).await
    }

    // 班级列表
    pub async fn list_classes(
        &self,
        request: &HttpRequest,
        params: ClassListParams,
    ) -> ActixResult<HttpResponse> {
        classes::list_classes(self, request, params).await
    }

    // 创建班级
    pub async fn create_class(
        &self,
        request: &HttpRequest,
        body: CreateClassRequest,
    ) -> ActixResult<HttpResponse> {
        classes::create_class(self, request, body).await
    }

    // 更新班级
    pub async fn update_class(
        &self,
        request: &HttpRequest,
        id: i64,
        body: UpdateClassRequest,
    ) -> ActixResult<HttpResponse> {
        classes::update_class(self, request, id, body).await
    }

    // 删除班级
    pub async fn delete_class(&self, request: &HttpRequest, id: i64) -> ActixResult<HttpResponse> {
        classes::delete_class(self, request, id).await
    }

    // 班级学生
    pub async fn list_class_students(
        &self,
        request: &HttpRequest,
        id: i64,
    ) -> ActixResult<HttpResponse> {
        classes::list_class_students(self, request, id).await
    }
}
