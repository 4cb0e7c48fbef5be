//! 统一错误处理模块
//!
//! 存储层与基础设施返回 `StudyLinkError`，服务层再映射成带 HTTP 状态的 `ApiError`。
//! 错误码按来源分段：`SL1xx` 为基础设施，`SL2xx` 为请求本身的问题。

use std::fmt;

/// 定义错误类型的宏
///
/// 每个变体声明：错误码、类型名称、是否属于客户端错误。
/// 生成 `code()` / `error_type()` / `message()` / `is_client_error()`，
/// 以及 snake_case 的便捷构造函数。
macro_rules! define_studylink_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal, client = $client:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum StudyLinkError {
            $($variant(String),)*
        }

        impl StudyLinkError {
            pub fn code(&self) -> &'static str {
                match self {
                    $(StudyLinkError::$variant(_) => $code,)*
                }
            }

            pub fn error_type(&self) -> &'static str {
                match self {
                    $(StudyLinkError::$variant(_) => $type_name,)*
                }
            }

            pub fn message(&self) -> &str {
                match self {
                    $(StudyLinkError::$variant(msg) => msg,)*
                }
            }

            /// 客户端错误的信息可以原样返回给调用方
            pub fn is_client_error(&self) -> bool {
                match self {
                    $(StudyLinkError::$variant(_) => $client,)*
                }
            }
        }

        paste::paste! {
            impl StudyLinkError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        StudyLinkError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_studylink_errors! {
    CacheConnection("SL101", "Cache Connection Error", client = false),
    CachePluginNotFound("SL102", "Cache Backend Not Found", client = false),
    DatabaseConfig("SL103", "Database Configuration Error", client = false),
    DatabaseConnection("SL104", "Database Connection Error", client = false),
    DatabaseOperation("SL105", "Database Operation Error", client = false),
    Io("SL106", "IO Error", client = false),
    Serialization("SL107", "Serialization Error", client = false),
    Validation("SL201", "Validation Error", client = true),
    NotFound("SL202", "Resource Not Found", client = true),
    Conflict("SL203", "Conflict", client = true),
    Forbidden("SL204", "Forbidden", client = true),
}

impl StudyLinkError {
    /// 是否为唯一约束冲突（包括数据库直接报出的约束错误）
    pub fn is_conflict(&self) -> bool {
        match self {
            StudyLinkError::Conflict(_) => true,
            StudyLinkError::DatabaseOperation(msg) => {
                let lower = msg.to_lowercase();
                lower.contains("unique") || lower.contains("duplicate")
            }
            _ => false,
        }
    }
}

impl fmt::Display for StudyLinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code(), self.error_type(), self.message())
    }
}

impl std::error::Error for StudyLinkError {}

impl From<sea_orm::DbErr> for StudyLinkError {
    fn from(err: sea_orm::DbErr) -> Self {
        StudyLinkError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for StudyLinkError {
    fn from(err: std::io::Error) -> Self {
        StudyLinkError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StudyLinkError {
    fn from(err: serde_json::Error) -> Self {
        StudyLinkError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StudyLinkError>;
