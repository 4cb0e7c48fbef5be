//! 配置管理
//!
//! 启动时从 `config.toml`、`config.{APP_ENV}.toml` 和环境变量加载，全局只读。

mod r#impl;
mod structs;

pub use structs::*;
