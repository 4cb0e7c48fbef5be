//! 运行时：日志、启动准备、后台任务与关闭

pub mod lifetime;
pub mod logging;
