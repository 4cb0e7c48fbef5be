//! 运行时设置实体（键值对，管理员可改）

use sea_orm::entity::prelude::*;

use crate::models::system::entities::{KnownSettingKey, SettingValueType, SystemSetting};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "system_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    #[sea_orm(column_type = "Text")]
    pub value: String,
    pub value_type: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub updated_at: i64,
    pub updated_by: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UpdatedBy",
        to = "super::users::Column::Id",
        on_delete = "SetNull"
    )]
    Editor,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Editor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 值类型列无法识别时，已知键按其声明类型，其余按字符串
    fn resolved_value_type(&self) -> SettingValueType {
        self.value_type.parse().unwrap_or_else(|_| {
            self.key
                .parse::<KnownSettingKey>()
                .map(|known| known.value_type())
                .unwrap_or(SettingValueType::String)
        })
    }

    pub fn into_setting(self) -> SystemSetting {
        let value_type = self.resolved_value_type();
        SystemSetting {
            key: self.key,
            value: self.value,
            value_type,
            description: self.description,
            updated_at: chrono::DateTime::from_timestamp(self.updated_at, 0).unwrap_or_default(),
            updated_by: self.updated_by,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(key: &str, value_type: &str) -> Model {
        Model {
            key: key.to_string(),
            value: "1".to_string(),
            value_type: value_type.to_string(),
            description: None,
            updated_at: 0,
            updated_by: None,
        }
    }

    #[test]
    fn test_value_type_fallback() {
        assert_eq!(
            row("system.api_rate_limit", "bogus").into_setting().value_type,
            SettingValueType::Integer
        );
        assert_eq!(
            row("custom.flag", "bogus").into_setting().value_type,
            SettingValueType::String
        );
        assert_eq!(
            row("custom.flag", "boolean").into_setting().value_type,
            SettingValueType::Boolean
        );
    }
}
