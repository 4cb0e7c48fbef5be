//! 日志初始化：开发环境可读文本，其余环境输出 JSON 行

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

/// log_level 无法解析时退回 info
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|e| {
        eprintln!("Invalid log level '{level}': {e}, falling back to 'info'");
        EnvFilter::new("info")
    })
}

/// 返回的 guard 必须存活到进程结束，否则缓冲中的日志会丢失
pub fn init(config: &AppConfig) -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(&config.app.log_level))
        .with_writer(writer)
        .with_level(true);

    if config.is_development() {
        builder
            .with_ansi(true)
            .with_file(true)
            .with_line_number(true)
            .init();
    } else {
        builder.with_ansi(false).json().init();
    }
    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_filter_falls_back() {
        assert!(EnvFilter::try_new("sqlx=loud").is_err());
        assert_eq!(
            env_filter("sqlx=loud").to_string(),
            EnvFilter::new("info").to_string()
        );
    }
}
