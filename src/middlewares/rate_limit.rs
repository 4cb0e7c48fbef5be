//! 固定窗口限流中间件
//!
//! 计数键为「前缀 + 用户 ID」，未登录时用客户端 IP。窗口从该键第一次请求开始计时，
//! 超过上限返回 429 并在 `Retry-After` 中给出窗口剩余秒数。
//! 通用 API 限制的上限取自运行时设置 `apiRateLimit`，修改后下一个请求即生效。
//!
//! ```rust,ignore
//! web::resource("/login")
//!     .wrap(RateLimit::login())
//!     .route(web::post().to(login))
//! ```

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    http::header::{HeaderName, HeaderValue, RETRY_AFTER},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use moka::future::Cache;
use once_cell::sync::Lazy;
use std::net::IpAddr;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::warn;

use crate::models::{
    ApiResponse, ErrorCode, system::entities::KnownSettingKey, users::entities::User,
};
use crate::services::system::DynamicConfig;

const LIMIT_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const REMAINING_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const DEFAULT_API_LIMIT: u32 = KnownSettingKey::DEFAULT_API_RATE_LIMIT as u32;

#[derive(Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// 闲置一小时的键自动回收
static RATE_LIMIT_WINDOWS: Lazy<Cache<String, Window>> = Lazy::new(|| {
    Cache::builder()
        .time_to_idle(Duration::from_secs(3600))
        .max_capacity(100_000)
        .build()
});

#[derive(Clone)]
pub struct RateLimit {
    max_requests: u32,
    window_secs: u64,
    key_prefix: &'static str,
    /// 上限取自运行时设置
    dynamic: bool,
}

impl RateLimit {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs,
            key_prefix: "",
            dynamic: false,
        }
    }

    pub fn with_prefix(mut self, prefix: &'static str) -> Self {
        self.key_prefix = prefix;
        self
    }

    /// 登录：5 次/分钟
    pub fn login() -> Self {
        Self::new(5, 60).with_prefix("login")
    }

    /// 注册：3 次/分钟
    pub fn register() -> Self {
        Self::new(3, 60).with_prefix("register")
    }

    /// 刷新 access token：10 次/分钟
    pub fn refresh_token() -> Self {
        Self::new(10, 60).with_prefix("refresh")
    }

    /// 已登录 API：apiRateLimit 次/分钟
    pub fn api() -> Self {
        Self {
            dynamic: true,
            ..Self::new(DEFAULT_API_LIMIT, 60).with_prefix("api")
        }
    }

    fn cache_key(&self, identifier: &str) -> String {
        if self.key_prefix.is_empty() {
            identifier.to_string()
        } else {
            format!("{}:{}", self.key_prefix, identifier)
        }
    }
}

/// 连接地址优先；部署在反向代理后时依次看 X-Forwarded-For 首项与 X-Real-IP
fn extract_client_ip(req: &ServiceRequest) -> String {
    let connection_ip = req
        .connection_info()
        .realip_remote_addr()
        .map(str::to_string);
    if let Some(ip) = connection_ip.as_deref().filter(|ip| is_valid_ip(ip)) {
        return ip.to_string();
    }

    let forwarded = req
        .headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next());
    let real_ip = req.headers().get("X-Real-IP").and_then(|v| v.to_str().ok());
    [forwarded, real_ip]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|ip| is_valid_ip(ip))
        .map(str::to_string)
        .or(connection_ip)
        .unwrap_or_else(|| "unknown".to_string())
}

fn is_valid_ip(ip: &str) -> bool {
    ip.parse::<IpAddr>().is_ok()
}

/// 在当前窗口内计一次，返回计数后的窗口
async fn hit(key: String, window: Duration, now: Instant) -> Window {
    RATE_LIMIT_WINDOWS
        .entry(key)
        .and_upsert_with(|existing| {
            let next = match existing.map(|e| e.into_value()) {
                Some(w) if now.saturating_duration_since(w.started) < window => Window {
                    started: w.started,
                    count: w.count.saturating_add(1),
                },
                _ => Window {
                    started: now,
                    count: 1,
                },
            };
            std::future::ready(next)
        })
        .await
        .into_value()
}

fn too_many_requests(retry_after: u64, limit: u32) -> HttpResponse {
    HttpResponse::build(StatusCode::TOO_MANY_REQUESTS)
        .insert_header((RETRY_AFTER, retry_after.to_string()))
        .insert_header((LIMIT_HEADER, limit))
        .insert_header((REMAINING_HEADER, 0u32))
        .json(ApiResponse::<()>::error_empty(
            ErrorCode::RateLimitExceeded,
            "Too many requests, please try again later.",
        ))
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            config: self.clone(),
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    config: RateLimit,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    actix_service::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let config = self.config.clone();

        Box::pin(async move {
            let limit = if config.dynamic {
                DynamicConfig::api_rate_limit().await
            } else {
                config.max_requests
            };

            let user_id = req.extensions().get::<User>().map(|user| user.id);
            let identifier = match user_id {
                Some(id) => format!("user:{id}"),
                None => format!("ip:{}", extract_client_ip(&req)),
            };
            let key = config.cache_key(&identifier);

            let window = Duration::from_secs(config.window_secs);
            let now = Instant::now();
            let state = hit(key.clone(), window, now).await;

            if state.count > limit {
                let elapsed = now.saturating_duration_since(state.started);
                let retry_after = window.saturating_sub(elapsed).as_secs().max(1);
                warn!("Rate limit exceeded for {} ({}/{})", key, state.count, limit);
                return Ok(req.into_response(
                    too_many_requests(retry_after, limit).map_into_right_body(),
                ));
            }

            let mut res = srv.call(req).await?;
            let headers = res.headers_mut();
            headers.insert(LIMIT_HEADER, HeaderValue::from(limit));
            headers.insert(REMAINING_HEADER, HeaderValue::from(limit - state.count));
            Ok(res.map_into_left_body())
        })
    }
}
