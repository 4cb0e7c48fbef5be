use crate::cache::{ObjectCache, register::build_object_cache};
use crate::config::AppConfig;
use crate::models::users::entities::UserRole;
use crate::models::users::requests::{CreateUserRequest, UpdateUserRequest};
use crate::services::system::DynamicConfig;
use crate::storage::Storage;
use crate::utils::password::{hash_password, verify_password};

use super::scheduler;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
}

/// 生成随机密码
fn generate_random_password(length: usize) -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%";
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// 从数据库加载系统设置，失败时使用默认值
async fn init_dynamic_config(storage: &Arc<dyn Storage>) {
    match storage.list_all_settings().await {
        Ok(settings) => {
            let settings_vec: Vec<(String, String)> =
                settings.into_iter().map(|s| (s.key, s.value)).collect();
            DynamicConfig::init(settings_vec).await;
        }
        Err(e) => {
            warn!(
                "Failed to load dynamic config from database: {}, using defaults",
                e
            );
            DynamicConfig::init(vec![]).await;
        }
    }
}

/// 读取种子管理员的密码；未设置 ADMIN_PASSWORD 时为 None
fn configured_admin_password() -> Option<String> {
    std::env::var("ADMIN_PASSWORD")
        .ok()
        .filter(|p| !p.is_empty())
}

/// 初始化管理员账号
///
/// 账号不存在时创建（未设置 ADMIN_PASSWORD 则生成随机密码并打印）；
/// 已存在时仅在 ADMIN_PASSWORD 设置且与当前密码不同时更新密码。
async fn seed_admin(storage: &Arc<dyn Storage>) {
    let seed = &AppConfig::get().admin;

    let existing = match storage.get_user_by_username(&seed.username).await {
        Ok(user) => user,
        Err(e) => {
            warn!("Failed to look up admin account: {}, skipping admin seed", e);
            return;
        }
    };

    if let Some(admin) = existing {
        let Some(password) = configured_admin_password() else {
            debug!("Admin account '{}' exists, keeping its password", admin.username);
            return;
        };
        if verify_password(&password, &admin.password_hash) {
            debug!("Admin password unchanged");
            return;
        }
        let password_hash = match hash_password(&password) {
            Ok(hash) => hash,
            Err(e) => {
                warn!("Failed to hash admin password: {}, skipping refresh", e);
                return;
            }
        };
        let update = UpdateUserRequest {
            password: Some(password_hash),
            ..Default::default()
        };
        match storage.update_user(admin.id, update).await {
            Ok(_) => warn!("Admin password refreshed from ADMIN_PASSWORD"),
            Err(e) => warn!("Failed to refresh admin password: {}", e),
        }
        return;
    }

    info!("No admin account found, creating '{}'...", seed.username);
    let password = configured_admin_password().unwrap_or_else(|| {
        let pwd = generate_random_password(16);
        warn!("==========================================================");
        warn!("  ADMIN PASSWORD NOT SET - USING GENERATED PASSWORD");
        warn!("  Generated admin password: {}", pwd);
        warn!("  Please save this password or set ADMIN_PASSWORD env var");
        warn!("==========================================================");
        pwd
    });

    let password_hash = match hash_password(&password) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("Failed to hash admin password: {}, skipping admin seed", e);
            return;
        }
    };

    let admin_request = CreateUserRequest {
        username: seed.username.clone(),
        password: password_hash,
        role: UserRole::Admin,
        name: seed.name.clone(),
        email: Some(seed.email.clone()).filter(|e| !e.is_empty()),
        phone: None,
        is_approved: true,
    };

    match storage.create_user(admin_request).await {
        Ok(user) => {
            info!(
                "Admin account created (ID: {}, username: {})",
                user.id, user.username
            );
        }
        Err(e) => {
            warn!("Failed to create admin account: {}", e);
        }
    }
}

/// 准备服务器启动的上下文
pub async fn prepare_server_startup() -> Result<StartupContext, Box<dyn std::error::Error>> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| "Failed to install rustls crypto provider")?;

    debug!(
        "Registered cache backends: {:?}",
        crate::cache::register::registered_backends()
    );

    let storage = crate::storage::create_storage().await?;
    warn!("Storage backend initialized and migrations completed");

    init_dynamic_config(&storage).await;

    seed_admin(&storage).await;

    let cache = build_object_cache(&AppConfig::get().cache.cache_type).await?;

    if AppConfig::get().scheduler.enabled {
        scheduler::spawn(storage.clone());
        warn!("Background scheduler started");
    }

    Ok(StartupContext { storage, cache })
}
