//! PostgreSQL のバージョン
//!
//! バージョンごとの違い（API メッセージの variant 名、使える設定）は
//! すべてここに集約し、展開処理はバージョンを引数に取る一つの関数で行います。

use crate::error::{Result, SpecError};
use crate::model::enums::SharedPreloadLibrary;
use serde::{Deserialize, Serialize};

/// サポートしている PostgreSQL のバージョン
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PostgresVersion {
    #[serde(rename = "10")]
    V10,
    #[serde(rename = "10-1c")]
    V10_1C,
    #[serde(rename = "11")]
    V11,
    #[serde(rename = "11-1c")]
    V11_1C,
    #[default]
    #[serde(rename = "12")]
    V12,
    #[serde(rename = "12-1c")]
    V12_1C,
}

impl PostgresVersion {
    pub const ALL: [PostgresVersion; 6] = [
        PostgresVersion::V10,
        PostgresVersion::V10_1C,
        PostgresVersion::V11,
        PostgresVersion::V11_1C,
        PostgresVersion::V12,
        PostgresVersion::V12_1C,
    ];

    /// 設定ファイル上の表記（"12", "11-1c" など）
    pub fn as_str(&self) -> &'static str {
        match self {
            PostgresVersion::V10 => "10",
            PostgresVersion::V10_1C => "10-1c",
            PostgresVersion::V11 => "11",
            PostgresVersion::V11_1C => "11-1c",
            PostgresVersion::V12 => "12",
            PostgresVersion::V12_1C => "12-1c",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| SpecError::UnknownEnumValue {
                field: "version",
                value: s.to_string(),
                expected: Self::ALL.map(|v| v.as_str()).join(", "),
            })
    }

    pub fn major(&self) -> u8 {
        match self {
            PostgresVersion::V10 | PostgresVersion::V10_1C => 10,
            PostgresVersion::V11 | PostgresVersion::V11_1C => 11,
            PostgresVersion::V12 | PostgresVersion::V12_1C => 12,
        }
    }

    /// 1C 向けビルドかどうか
    pub fn is_1c(&self) -> bool {
        matches!(
            self,
            PostgresVersion::V10_1C | PostgresVersion::V11_1C | PostgresVersion::V12_1C
        )
    }

    /// 更新マスクで使う設定フィールド名
    pub fn config_field_name(&self) -> &'static str {
        match self {
            PostgresVersion::V10 => "postgresql_config_10",
            PostgresVersion::V10_1C => "postgresql_config_10_1c",
            PostgresVersion::V11 => "postgresql_config_11",
            PostgresVersion::V11_1C => "postgresql_config_11_1c",
            PostgresVersion::V12 => "postgresql_config_12",
            PostgresVersion::V12_1C => "postgresql_config_12_1c",
        }
    }

    pub fn supports_plan_cache_mode(&self) -> bool {
        self.major() >= 12
    }

    pub fn supports_library(&self, library: SharedPreloadLibrary) -> bool {
        match library {
            SharedPreloadLibrary::AutoExplain | SharedPreloadLibrary::PgHintPlan => true,
            SharedPreloadLibrary::Timescaledb => self.major() >= 11,
        }
    }
}

impl std::fmt::Display for PostgresVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
