//! 后台定时任务：发布到期测试、刷新系统设置

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::services::system::DynamicConfig;
use crate::services::tests::publish_due_tests;
use crate::storage::Storage;

/// 在 tokio 运行时中启动两个周期任务
pub fn spawn(storage: Arc<dyn Storage>) {
    let config = &AppConfig::get().scheduler;
    let publish_every = Duration::from_secs(config.publish_interval_secs.max(1));
    let refresh_every = Duration::from_secs(config.settings_refresh_secs.max(1));

    let publish_storage = storage.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(publish_every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            match publish_due_tests(&publish_storage).await {
                Ok(count) => debug!("Scheduled publish pass done, {} test(s) published", count),
                Err(e) => warn!("Scheduled test publishing failed: {}", e),
            }
        }
    });

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(refresh_every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // 首次 tick 立即返回，启动时已加载过
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if !DynamicConfig::is_stale().await {
                continue;
            }
            if let Err(e) = DynamicConfig::refresh(&storage).await {
                warn!("Failed to refresh system settings: {}", e);
            }
        }
    });
}
