/*!
 * JWT 认证中间件
 *
 * 校验 `Authorization: Bearer <token>` 中的 access token，按 `user:{token}` 读取缓存，
 * 未命中时回源存储并写回缓存。用户必须处于启用状态。
 *
 * ```rust,ignore
 * web::scope("/api/v1/courses")
 *     .wrap(RequireJWT)
 *     .route("", web::get().to(list_courses))
 * ```
 *
 * 处理程序中通过 `RequireJWT::extract_user_claims(&req)` 取得当前用户。
 */

use crate::cache::{CacheResult, ObjectCache};
use crate::config::AppConfig;
use crate::models::{ErrorCode, users::entities};
use crate::storage::Storage;
use crate::utils::jwt::JwtUtils;
use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::{rc::Rc, sync::Arc};
use tracing::{debug, info};

use super::create_error_response;

const BEARER_PREFIX: &str = "Bearer ";
const AUTHORIZATION_HEADER: &str = "Authorization";

#[derive(Clone)]
pub struct RequireJWT;

/// 用户缓存键
pub fn user_cache_key(token: &str) -> String {
    format!("user:{token}")
}

/// 用户已缓存的 token 列表键
fn user_tokens_key(user_id: i64) -> String {
    format!("user_tokens:{user_id}")
}

/// 记录用户的 token，用于按用户清除缓存
async fn remember_token(cache: &Arc<dyn ObjectCache>, user_id: i64, token: &str, ttl: u64) {
    let key = user_tokens_key(user_id);
    let mut tokens = match cache.get_raw(&key).await {
        CacheResult::Found(tokens) => tokens,
        _ => String::new(),
    };
    if !tokens.lines().any(|t| t == token) {
        if !tokens.is_empty() {
            tokens.push('\n');
        }
        tokens.push_str(token);
    }
    cache.insert_raw(key, tokens, ttl).await;
}

/// 清除某个用户的全部缓存（停用、修改、删除时调用）
pub async fn evict_user_cache(cache: &Arc<dyn ObjectCache>, user_id: i64) {
    let key = user_tokens_key(user_id);
    if let CacheResult::Found(tokens) = cache.get_raw(&key).await {
        for token in tokens.lines() {
            cache.remove(&user_cache_key(token)).await;
        }
    }
    cache.remove(&key).await;
}

/// 提取 Bearer token
pub fn bearer_token(headers: &actix_web::http::header::HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

// 辅助函数：提取并验证 JWT access token
async fn extract_and_validate_jwt(req: &ServiceRequest) -> Result<entities::User, String> {
    let token = bearer_token(req.headers())
        .ok_or_else(|| "Missing or invalid Authorization header".to_string())?;

    let claims = JwtUtils::verify_access_token(token).map_err(|err| {
        info!("JWT token validation failed: {}", err);
        "Invalid JWT token".to_string()
    })?;

    let cache = req
        .app_data::<actix_web::web::Data<Arc<dyn ObjectCache>>>()
        .map(|data| data.get_ref().clone());
    let cache_key = user_cache_key(token);

    if let Some(cache) = &cache {
        match cache.get_raw(&cache_key).await {
            CacheResult::Found(json) => match serde_json::from_str::<entities::User>(&json) {
                Ok(user) if user.is_active => return Ok(user),
                Ok(_) => {
                    cache.remove(&cache_key).await;
                    return Err("User is not active".to_string());
                }
                Err(_) => {
                    cache.remove(&cache_key).await;
                    debug!("Failed to deserialize cached user, reloading from storage");
                }
            },
            _ => debug!("User not found in cache, reloading from storage"),
        }
    }

    let storage = req
        .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| "Storage not available".to_string())?;

    let user_id = claims
        .user_id()
        .ok_or_else(|| "Invalid user ID in JWT".to_string())?;

    let user = storage
        .get_user_by_id(user_id)
        .await
        .map_err(|_| "Failed to retrieve user from storage".to_string())?
        .ok_or_else(|| "User not found".to_string())?;

    if !user.is_active {
        return Err("User is not active".to_string());
    }

    if let Some(cache) = &cache
        && let Ok(user_json) = serde_json::to_string(&user)
    {
        let ttl = AppConfig::get().cache.default_ttl;
        cache.insert_raw(cache_key, user_json, ttl).await;
        remember_token(cache, user.id, token, ttl).await;
    }

    Ok(user)
}

impl<S, B> Transform<S, ServiceRequest> for RequireJWT
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireJWTMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireJWTMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireJWTMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireJWTMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        Box::pin(async move {
            // 处理 OPTIONS 请求
            if req.method() == actix_web::http::Method::OPTIONS {
                return Ok(req.into_response(
                    create_error_response(StatusCode::NO_CONTENT, ErrorCode::Success, "")
                        .map_into_right_body(),
                ));
            }

            // 验证 JWT token
            match extract_and_validate_jwt(&req).await {
                Ok(user) => {
                    debug!("JWT authentication successful for ID: {}", user.id);
                    req.extensions_mut().insert(user);
                    let res = srv.call(req).await?.map_into_left_body();
                    Ok(res)
                }
                Err(err) => {
                    info!(
                        "JWT authentication failed for request to {}: {}",
                        req.path(),
                        err
                    );
                    Ok(req.into_response(
                        create_error_response(
                            StatusCode::UNAUTHORIZED,
                            ErrorCode::Unauthorized,
                            &format!("Unauthorized: {err}"),
                        )
                        .map_into_right_body(),
                    ))
                }
            }
        })
    }
}

// 辅助函数：从请求中提取用户信息
impl RequireJWT {
    /// 从请求扩展中提取用户Claims信息
    /// 此函数应该在应用了RequireJWT中间件的路由处理程序中使用
    pub fn extract_user_claims(req: &actix_web::HttpRequest) -> Option<entities::User> {
        req.extensions().get::<entities::User>().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::object_cache::moka::MokaObjectCache;
    use crate::models::users::entities::UserRole;
    use crate::models::users::requests::CreateUserRequest;
    use crate::storage::sea_orm_storage::SeaOrmStorage;
    use actix_web::{App, HttpRequest, HttpResponse, test, web};

    async fn whoami(req: HttpRequest) -> HttpResponse {
        match RequireJWT::extract_user_claims(&req) {
            Some(user) => HttpResponse::Ok().body(user.id.to_string()),
            None => HttpResponse::InternalServerError().finish(),
        }
    }

    async fn seeded_storage(active: bool) -> (Arc<dyn Storage>, entities::User) {
        let storage = SeaOrmStorage::in_memory().await;
        let user = storage
            .create_user_impl(CreateUserRequest {
                username: "teacher1".to_string(),
                password: "hash".to_string(),
                role: UserRole::Teacher,
                name: "선생님".to_string(),
                email: None,
                phone: None,
                is_approved: true,
            })
            .await
            .unwrap();
        if !active {
            storage
                .update_user_impl(
                    user.id,
                    crate::models::users::requests::UpdateUserRequest {
                        is_active: Some(false),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }
        (Arc::new(storage), user)
    }

    #[actix_web::test]
    async fn test_valid_token_reaches_handler() {
        let (storage, user) = seeded_storage(true).await;
        let cache: Arc<dyn ObjectCache> = Arc::new(MokaObjectCache::new().await.unwrap());
        let token = JwtUtils::generate_access_token(user.id, "teacher").unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(storage))
                .app_data(web::Data::new(cache.clone()))
                .service(web::scope("/api").wrap(RequireJWT).route("/me", web::get().to(whoami))),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/me")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(matches!(
            cache.get_raw(&user_cache_key(&token)).await,
            CacheResult::Found(_)
        ));

        evict_user_cache(&cache, user.id).await;
        assert_eq!(
            cache.get_raw(&user_cache_key(&token)).await,
            CacheResult::NotFound
        );
    }

    #[actix_web::test]
    async fn test_missing_token_and_inactive_user_are_rejected() {
        let (storage, user) = seeded_storage(false).await;
        let token = JwtUtils::generate_access_token(user.id, "teacher").unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(storage))
                .service(web::scope("/api").wrap(RequireJWT).route("/me", web::get().to(whoami))),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/api/me").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/api/me")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let options = test::TestRequest::default()
            .method(actix_web::http::Method::OPTIONS)
            .uri("/api/me")
            .to_request();
        let resp = test::call_service(&app, options).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }
}
