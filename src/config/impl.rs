use config::{Config, ConfigError, Environment, File};
use std::sync::OnceLock;

use super::AppConfig;

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// 开发默认密钥，生产环境必须覆盖
const DEV_JWT_SECRET: &str = "change-me-in-production";

/// 直接映射到配置项的环境变量（优先级最高）
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("APP_ENV", "app.environment"),
    ("RUST_LOG", "app.log_level"),
    ("SERVER_HOST", "server.host"),
    ("SERVER_PORT", "server.port"),
    ("UNIX_SOCKET", "server.unix_socket_path"),
    ("CPU_COUNT", "server.workers"),
    ("JWT_SECRET", "jwt.secret"),
    ("DATABASE_URL", "database.url"),
    ("REDIS_URL", "cache.redis.url"),
    ("REDIS_KEY_PREFIX", "cache.redis.key_prefix"),
    ("CACHE_TTL", "cache.default_ttl"),
    ("ADMIN_USERNAME", "admin.username"),
    ("ADMIN_NAME", "admin.name"),
    ("ADMIN_EMAIL", "admin.email"),
];

impl AppConfig {
    /// 依次读取 config.toml、config.{APP_ENV}.toml、STUDYLINK_* 与 ENV_OVERRIDES
    pub fn load() -> Result<Self, ConfigError> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(File::with_name(&format!("config.{app_env}")).required(false))
            .add_source(
                Environment::with_prefix("STUDYLINK")
                    .separator("_")
                    .try_parsing(true),
            );
        for (var, key) in ENV_OVERRIDES {
            builder = builder.set_override_option(*key, std::env::var(var).ok())?;
        }

        let mut app_config: AppConfig = builder.build()?.try_deserialize()?;
        app_config.normalize();
        app_config.validate()?;
        Ok(app_config)
    }

    /// 填充 0 值的派生默认
    fn normalize(&mut self) {
        if self.server.workers == 0 {
            self.server.workers = num_cpus::get().min(self.server.max_workers.max(1));
        }
        if self.scheduler.publish_interval_secs == 0 {
            self.scheduler.publish_interval_secs = 60;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.trim().is_empty() {
            return Err(ConfigError::Message("jwt.secret must not be empty".into()));
        }
        if self.is_production() && self.jwt.secret == DEV_JWT_SECRET {
            return Err(ConfigError::Message(
                "jwt.secret must be overridden (JWT_SECRET) in production".into(),
            ));
        }
        if self.jwt.access_token_expiry <= 0 || self.jwt.refresh_token_expiry <= 0 {
            return Err(ConfigError::Message("jwt token expiry must be positive".into()));
        }
        if self.admin.username.trim().is_empty() {
            return Err(ConfigError::Message("admin.username must not be empty".into()));
        }
        Ok(())
    }

    pub fn get() -> &'static AppConfig {
        APP_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                eprintln!("Failed to load configuration: {e}");
                std::process::exit(1);
            })
        })
    }

    /// 启动时调用一次
    pub fn init() -> Result<(), ConfigError> {
        let config = Self::load()?;
        APP_CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("Configuration already initialized".to_string()))
    }

    pub fn is_production(&self) -> bool {
        self.app.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.app.environment == "development"
    }

    pub fn server_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    #[cfg(unix)]
    pub fn unix_socket_path(&self) -> Option<&str> {
        Some(self.server.unix_socket_path.as_str()).filter(|p| !p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_default_config_file() {
        let config = AppConfig::load().expect("config.toml should be loadable");
        assert!(config.server.workers >= 1);
        assert!(config.server.workers <= config.server.max_workers.max(1));
        assert!(config.scheduler.publish_interval_secs > 0);
        assert_eq!(config.cache.cache_type, "moka");
    }

    #[test]
    fn test_production_rejects_dev_secret() {
        let mut config = AppConfig::load().unwrap();
        config.app.environment = "production".to_string();
        config.jwt.secret = DEV_JWT_SECRET.to_string();
        assert!(config.validate().is_err());

        config.jwt.secret = "a-real-secret".to_string();
        assert!(config.validate().is_ok());

        config.jwt.access_token_expiry = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_values_are_derived() {
        let mut config = AppConfig::load().unwrap();
        config.server.workers = 0;
        config.scheduler.publish_interval_secs = 0;
        config.normalize();
        assert!(config.server.workers >= 1);
        assert_eq!(config.scheduler.publish_interval_secs, 60);
    }
}
