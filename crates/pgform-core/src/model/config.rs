//! クラスター設定ブロック

use crate::error::{Result, SpecError};
use crate::model::enums::PoolingMode;
use crate::model::settings::PostgresqlSettings;
use crate::model::version::PostgresVersion;
use serde::{Deserialize, Serialize};

/// `config { ... }` ブロック
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfigBlock {
    /// PostgreSQL のバージョン（省略時は 12）
    pub version: PostgresVersion,

    /// マスター障害時の自動フェイルオーバー
    pub autofailover: Option<bool>,

    pub pooler_config: Option<PoolerConfigBlock>,

    pub resources: ResourcesBlock,

    /// バックアップ開始時刻（UTC）
    pub backup_window_start: Option<BackupWindowStart>,

    pub performance_diagnostics: Option<PerformanceDiagnosticsBlock>,

    pub access: Option<AccessBlock>,

    /// `postgresql_config { ... }` の内容
    pub postgresql_config: Option<PostgresqlSettings>,
}

impl ClusterConfigBlock {
    pub fn validate(&self) -> Result<()> {
        if let Some(window) = &self.backup_window_start {
            window.validate()?;
        }
        if let Some(settings) = &self.postgresql_config {
            settings.validate_for(self.version)?;
        }
        Ok(())
    }
}

/// コネクションプーラー設定
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolerConfigBlock {
    pub pooling_mode: Option<PoolingMode>,
    pub pool_discard: Option<bool>,
}

/// ホストのリソース
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcesBlock {
    /// リソースプリセット（s2.micro など）
    pub resource_preset_id: String,

    /// ディスクサイズ (GB)
    pub disk_size: u64,

    /// ディスクタイプ（network-ssd など）
    pub disk_type_id: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupWindowStart {
    pub hours: u8,
    pub minutes: u8,
}

impl BackupWindowStart {
    pub fn validate(&self) -> Result<()> {
        if self.hours > 23 || self.minutes > 59 {
            return Err(SpecError::InvalidConfig(format!(
                "backup_window_start は 00:00〜23:59 の範囲で指定してください（指定値: {}:{:02}）",
                self.hours, self.minutes
            )));
        }
        Ok(())
    }
}

/// パフォーマンス診断
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceDiagnosticsBlock {
    pub enabled: bool,
    /// セッションのサンプリング間隔（秒）
    pub sessions_sampling_interval: i64,
    /// ステートメントのサンプリング間隔（秒）
    pub statements_sampling_interval: i64,
}

/// 外部サービスからのアクセス許可
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessBlock {
    pub data_lens: bool,
    pub web_sql: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::enums::PlanCacheMode;

    #[test]
    fn test_backup_window_range() {
        assert!(BackupWindowStart { hours: 23, minutes: 59 }.validate().is_ok());
        assert!(BackupWindowStart { hours: 24, minutes: 0 }.validate().is_err());
        assert!(BackupWindowStart { hours: 1, minutes: 60 }.validate().is_err());
    }

    #[test]
    fn test_settings_checked_against_version() {
        let config = ClusterConfigBlock {
            version: PostgresVersion::V10,
            postgresql_config: Some(PostgresqlSettings {
                plan_cache_mode: Some(PlanCacheMode::ForceCustomPlan),
                ..Default::default()
            }),
            ..Default::default()
        };

        assert!(matches!(
            config.validate(),
            Err(SpecError::UnsupportedSetting { .. })
        ));
    }
}
