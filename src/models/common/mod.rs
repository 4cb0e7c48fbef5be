pub mod pagination;
pub mod response;

pub use pagination::{PaginationInfo, PaginationQuery};
pub use response::ApiResponse;

/// 区分「字段缺省」与「显式 null」
///
/// 配合 `#[serde(default, deserialize_with = "double_option")]` 使用：
/// 缺省为 `None`，`null` 为 `Some(None)`，有值为 `Some(Some(v))`。
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        teacher_id: Option<Option<i64>>,
    }

    #[test]
    fn test_double_option_distinguishes_null() {
        let missing: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.teacher_id, None);

        let null: Patch = serde_json::from_str(r#"{"teacher_id":null}"#).unwrap();
        assert_eq!(null.teacher_id, Some(None));

        let value: Patch = serde_json::from_str(r#"{"teacher_id":7}"#).unwrap();
        assert_eq!(value.teacher_id, Some(Some(7)));
    }
}
