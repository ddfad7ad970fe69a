//! PostgreSQL 設定とユーザー設定
//!
//! 設定ファイルでは `key "value"` の文字列マップとして書かれる設定を、
//! 型付きの構造体との間で相互変換します。

use crate::error::{Result, SpecError};
use crate::model::enums::{
    EnumNames, HumanNames, LogStatement, PlanCacheMode, SharedPreloadLibrary, SynchronousCommit,
    TransactionIsolation, WalLevel,
};
use crate::model::version::PostgresVersion;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// サーバー側のデフォルト値（-1）は未設定と同じ扱い
pub const LOG_MIN_DURATION_STATEMENT_DEFAULT: i64 = -1;

/// クラスターの PostgreSQL 設定
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostgresqlSettings {
    pub max_connections: Option<i64>,
    pub shared_buffers: Option<i64>,
    pub temp_buffers: Option<i64>,
    pub work_mem: Option<i64>,
    pub maintenance_work_mem: Option<i64>,
    pub effective_cache_size: Option<i64>,
    pub autovacuum_max_workers: Option<i64>,
    pub default_statistics_target: Option<i64>,
    pub log_min_duration_statement: Option<i64>,
    pub random_page_cost: Option<f64>,
    pub enable_seqscan: Option<bool>,
    pub wal_level: Option<WalLevel>,
    pub synchronous_commit: Option<SynchronousCommit>,
    pub default_transaction_isolation: Option<TransactionIsolation>,
    pub log_statement: Option<LogStatement>,
    pub plan_cache_mode: Option<PlanCacheMode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shared_preload_libraries: Vec<SharedPreloadLibrary>,
}

impl PostgresqlSettings {
    /// 文字列マップから変換
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self> {
        let mut settings = Self::default();

        for (key, value) in map {
            match key.as_str() {
                "max_connections" => settings.max_connections = Some(parse_int(key, value)?),
                "shared_buffers" => settings.shared_buffers = Some(parse_int(key, value)?),
                "temp_buffers" => settings.temp_buffers = Some(parse_int(key, value)?),
                "work_mem" => settings.work_mem = Some(parse_int(key, value)?),
                "maintenance_work_mem" => {
                    settings.maintenance_work_mem = Some(parse_int(key, value)?)
                }
                "effective_cache_size" => {
                    settings.effective_cache_size = Some(parse_int(key, value)?)
                }
                "autovacuum_max_workers" => {
                    settings.autovacuum_max_workers = Some(parse_int(key, value)?)
                }
                "default_statistics_target" => {
                    settings.default_statistics_target = Some(parse_int(key, value)?)
                }
                "log_min_duration_statement" => {
                    settings.log_min_duration_statement = Some(parse_int(key, value)?)
                }
                "random_page_cost" => {
                    settings.random_page_cost = Some(value.parse().map_err(|_| invalid(key, value))?)
                }
                "enable_seqscan" => settings.enable_seqscan = Some(parse_bool(key, value)?),
                "wal_level" => settings.wal_level = Some(WalLevel::from_name(value)?),
                "synchronous_commit" => {
                    settings.synchronous_commit = Some(SynchronousCommit::from_name(value)?)
                }
                "default_transaction_isolation" => {
                    settings.default_transaction_isolation =
                        Some(TransactionIsolation::from_name(value)?)
                }
                "log_statement" => settings.log_statement = Some(LogStatement::from_name(value)?),
                "plan_cache_mode" => {
                    settings.plan_cache_mode = Some(PlanCacheMode::from_name(value)?)
                }
                "shared_preload_libraries" => {
                    settings.shared_preload_libraries = parse_libraries(value)?
                }
                other => return Err(SpecError::UnknownSetting(other.to_string())),
            }
        }

        Ok(settings)
    }

    /// 文字列マップへ変換（未設定の項目は含めない）
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        put(&mut map, "max_connections", self.max_connections);
        put(&mut map, "shared_buffers", self.shared_buffers);
        put(&mut map, "temp_buffers", self.temp_buffers);
        put(&mut map, "work_mem", self.work_mem);
        put(&mut map, "maintenance_work_mem", self.maintenance_work_mem);
        put(&mut map, "effective_cache_size", self.effective_cache_size);
        put(&mut map, "autovacuum_max_workers", self.autovacuum_max_workers);
        put(&mut map, "default_statistics_target", self.default_statistics_target);
        put(&mut map, "log_min_duration_statement", self.log_min_duration_statement);
        put(&mut map, "random_page_cost", self.random_page_cost);
        put(&mut map, "enable_seqscan", self.enable_seqscan);
        put(&mut map, "wal_level", self.wal_level.map(|v| v.name()));
        put(&mut map, "synchronous_commit", self.synchronous_commit.map(|v| v.name()));
        put(
            &mut map,
            "default_transaction_isolation",
            self.default_transaction_isolation.map(|v| v.name()),
        );
        put(&mut map, "log_statement", self.log_statement.map(|v| v.name()));
        put(&mut map, "plan_cache_mode", self.plan_cache_mode.map(|v| v.name()));
        if !self.shared_preload_libraries.is_empty() {
            map.insert(
                "shared_preload_libraries".to_string(),
                join_libraries(&self.shared_preload_libraries),
            );
        }
        map
    }

    /// 指定バージョンで使えない設定がないか確認
    pub fn validate_for(&self, version: PostgresVersion) -> Result<()> {
        if self.plan_cache_mode.is_some() && !version.supports_plan_cache_mode() {
            return Err(SpecError::UnsupportedSetting {
                version: version.to_string(),
                setting: "plan_cache_mode".to_string(),
            });
        }

        if let Some(library) = self
            .shared_preload_libraries
            .iter()
            .find(|lib| !version.supports_library(**lib))
        {
            return Err(SpecError::UnsupportedSetting {
                version: version.to_string(),
                setting: library.name().to_string(),
            });
        }

        Ok(())
    }
}

/// ユーザーごとの設定
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettingsBlock {
    pub default_transaction_isolation: Option<TransactionIsolation>,
    pub lock_timeout: Option<i64>,
    pub log_min_duration_statement: Option<i64>,
    pub synchronous_commit: Option<SynchronousCommit>,
    pub temp_file_limit: Option<i64>,
    pub log_statement: Option<LogStatement>,
}

impl UserSettingsBlock {
    /// 文字列マップから変換（列挙値は人間向けの名前も受け付ける）
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self> {
        let mut settings = Self::default();

        for (key, value) in map {
            match key.as_str() {
                "default_transaction_isolation" => {
                    settings.default_transaction_isolation =
                        Some(TransactionIsolation::from_human_name(value)?)
                }
                "lock_timeout" => settings.lock_timeout = Some(parse_int(key, value)?),
                "log_min_duration_statement" => {
                    let v = parse_int(key, value)?;
                    settings.log_min_duration_statement =
                        (v != LOG_MIN_DURATION_STATEMENT_DEFAULT).then_some(v);
                }
                "synchronous_commit" => {
                    settings.synchronous_commit = Some(SynchronousCommit::from_human_name(value)?)
                }
                "temp_file_limit" => settings.temp_file_limit = Some(parse_int(key, value)?),
                "log_statement" => {
                    settings.log_statement = Some(LogStatement::from_human_name(value)?)
                }
                other => return Err(SpecError::UnknownSetting(other.to_string())),
            }
        }

        Ok(settings)
    }

    /// 文字列マップへ変換（列挙値は人間向けの名前で出力）
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        put(
            &mut map,
            "default_transaction_isolation",
            self.default_transaction_isolation.map(|v| v.human_name()),
        );
        put(&mut map, "lock_timeout", self.lock_timeout);
        put(
            &mut map,
            "log_min_duration_statement",
            self.log_min_duration_statement
                .filter(|v| *v != LOG_MIN_DURATION_STATEMENT_DEFAULT),
        );
        put(
            &mut map,
            "synchronous_commit",
            self.synchronous_commit.map(|v| v.human_name()),
        );
        put(&mut map, "temp_file_limit", self.temp_file_limit);
        put(&mut map, "log_statement", self.log_statement.map(|v| v.human_name()));
        map
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// カンマ区切りのライブラリ名をパース（空要素は無視）
pub fn parse_libraries(value: &str) -> Result<Vec<SharedPreloadLibrary>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(SharedPreloadLibrary::from_name)
        .collect()
}

pub fn join_libraries(libraries: &[SharedPreloadLibrary]) -> String {
    libraries
        .iter()
        .map(|lib| lib.name())
        .collect::<Vec<_>>()
        .join(",")
}

fn put<T: ToString>(map: &mut BTreeMap<String, String>, key: &str, value: Option<T>) {
    if let Some(v) = value {
        map.insert(key.to_string(), v.to_string());
    }
}

fn parse_int(key: &str, value: &str) -> Result<i64> {
    value.trim().parse().map_err(|_| invalid(key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim() {
        "true" | "on" => Ok(true),
        "false" | "off" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

fn invalid(key: &str, value: &str) -> SpecError {
    SpecError::InvalidSettingValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
