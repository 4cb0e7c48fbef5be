//! 对象缓存
//!
//! 后端以插件形式在加载期注册（`declare_object_cache_plugin!`），启动时按配置选择。

pub mod object_cache;
pub mod register;
mod traits;

pub use traits::{CacheResult, ObjectCache};

/// 声明缓存插件，程序加载时自动注册
///
/// 类型需提供 `async fn new() -> Result<Self, String>`。
#[macro_export]
macro_rules! declare_object_cache_plugin {
    ($name:expr, $ty:ty) => {
        #[ctor::ctor]
        unsafe fn __register_object_cache_plugin() {
            $crate::cache::register::register_object_cache_plugin(
                $name,
                std::sync::Arc::new(|| -> $crate::cache::register::BoxedObjectCacheFuture {
                    Box::pin(async {
                        let cache = <$ty>::new()
                            .await
                            .map_err($crate::errors::StudyLinkError::cache_connection)?;
                        Ok::<Box<dyn $crate::cache::ObjectCache>, $crate::errors::StudyLinkError>(
                            Box::new(cache),
                        )
                    })
                }),
            );
        }
    };
}

#[cfg(test)]
mod tests {
    use super::register::get_object_cache_plugin;
    use super::*;

    #[tokio::test]
    async fn test_moka_plugin_is_registered() {
        let constructor = get_object_cache_plugin("moka").expect("moka registered");
        let cache = constructor().await.unwrap();

        cache
            .insert_raw("user:token".to_string(), "{}".to_string(), 0)
            .await;
        assert_eq!(cache.get_raw("user:token").await, CacheResult::Found("{}".to_string()));

        cache.remove("user:token").await;
        assert_eq!(cache.get_raw("user:token").await, CacheResult::NotFound);
    }

    #[tokio::test]
    async fn test_unknown_backend_falls_back() {
        assert!(get_object_cache_plugin("memcached").is_none());
        let cache = register::build_object_cache("memcached").await.unwrap();
        cache.insert_raw("k".to_string(), "v".to_string(), 0).await;
        assert_eq!(cache.get_raw("k").await, CacheResult::Found("v".to_string()));
        assert!(register::registered_backends().contains(&"moka".to_string()));
    }
}
