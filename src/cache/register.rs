//! 缓存后端注册表
//!
//! 各后端在加载期通过 `declare_object_cache_plugin!` 注册构造函数，
//! 启动时由 [`build_object_cache`] 按配置挑选，失败则退回进程内缓存。

use crate::cache::ObjectCache;
use crate::errors::{Result, StudyLinkError};
use once_cell::sync::Lazy;
use std::{
    collections::BTreeMap,
    future::Future,
    pin::Pin,
    sync::{Arc, RwLock},
};
use tracing::{info, warn};

pub type BoxedObjectCacheFuture =
    Pin<Box<dyn Future<Output = Result<Box<dyn ObjectCache>>> + Send>>;
pub type ObjectCacheConstructor = Arc<dyn Fn() -> BoxedObjectCacheFuture + Send + Sync>;

/// 总能构建成功的兜底后端
pub const FALLBACK_BACKEND: &str = "moka";

static OBJECT_CACHE_REGISTRY: Lazy<RwLock<BTreeMap<String, ObjectCacheConstructor>>> =
    Lazy::new(|| RwLock::new(BTreeMap::new()));

pub fn register_object_cache_plugin<S: Into<String>>(name: S, constructor: ObjectCacheConstructor) {
    let mut registry = OBJECT_CACHE_REGISTRY
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    registry.insert(name.into(), constructor);
}

pub fn get_object_cache_plugin(name: &str) -> Option<ObjectCacheConstructor> {
    OBJECT_CACHE_REGISTRY
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .get(name)
        .cloned()
}

/// 已注册的后端名（有序）
pub fn registered_backends() -> Vec<String> {
    OBJECT_CACHE_REGISTRY
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .keys()
        .cloned()
        .collect()
}

async fn try_build(name: &str) -> Result<Box<dyn ObjectCache>> {
    let constructor = get_object_cache_plugin(name).ok_or_else(|| {
        StudyLinkError::cache_plugin_not_found(format!(
            "cache backend '{name}' is not registered (available: {})",
            registered_backends().join(", ")
        ))
    })?;
    constructor().await
}

/// 构建配置的缓存后端；不可用时退回 [`FALLBACK_BACKEND`]
pub async fn build_object_cache(preferred: &str) -> Result<Arc<dyn ObjectCache>> {
    match try_build(preferred).await {
        Ok(cache) => {
            info!("Cache backend '{}' ready", preferred);
            return Ok(Arc::from(cache));
        }
        Err(e) if preferred == FALLBACK_BACKEND => return Err(e),
        Err(e) => warn!("{}, falling back to '{}'", e, FALLBACK_BACKEND),
    }

    let cache = try_build(FALLBACK_BACKEND).await?;
    warn!("Using fallback cache backend '{}'", FALLBACK_BACKEND);
    Ok(Arc::from(cache))
}
