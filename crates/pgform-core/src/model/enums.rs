//! 列挙型と名前テーブル
//!
//! API で使われる生成名（`WAL_LEVEL_REPLICA` など）と、ユーザー設定で使う
//! 人間向けの名前（`read committed` など）の対応表。テーブルはすべて
//! `const` で、実行時に変更されることはありません。

use crate::error::{Result, SpecError};
use serde::{Deserialize, Serialize};

/// 生成名テーブルを持つ列挙型
pub trait EnumNames: Sized + Copy + PartialEq + 'static {
    /// 設定項目名（エラーメッセージ用）
    const FIELD: &'static str;

    /// 値と生成名の対応
    const NAMES: &'static [(Self, &'static str)];

    /// 生成名を返す
    fn name(self) -> &'static str {
        lookup_name(Self::NAMES, self)
    }

    /// 生成名から値を得る
    fn from_name(name: &str) -> Result<Self> {
        lookup_value(Self::NAMES, name).ok_or_else(|| SpecError::UnknownEnumValue {
            field: Self::FIELD,
            value: name.to_string(),
            expected: joined_names(Self::NAMES),
        })
    }
}

/// 人間向けの名前テーブルも持つ列挙型（ユーザー設定用）
pub trait HumanNames: EnumNames {
    const HUMAN_NAMES: &'static [(Self, &'static str)];

    fn human_name(self) -> &'static str {
        lookup_name(Self::HUMAN_NAMES, self)
    }

    /// 人間向けの名前、または生成名から値を得る
    fn from_human_name(name: &str) -> Result<Self> {
        lookup_value(Self::HUMAN_NAMES, name)
            .or_else(|| lookup_value(Self::NAMES, name))
            .ok_or_else(|| SpecError::UnknownEnumValue {
                field: Self::FIELD,
                value: name.to_string(),
                expected: joined_names(Self::HUMAN_NAMES),
            })
    }
}

fn lookup_name<T: PartialEq>(table: &'static [(T, &'static str)], value: T) -> &'static str {
    table
        .iter()
        .find(|(v, _)| *v == value)
        .map(|(_, n)| *n)
        .unwrap_or_default()
}

fn lookup_value<T: Copy>(table: &[(T, &str)], name: &str) -> Option<T> {
    table.iter().find(|(_, n)| *n == name).map(|(v, _)| *v)
}

/// エラーメッセージ用にソート済みの名前一覧を作る
fn joined_names<T>(table: &[(T, &str)]) -> String {
    let mut names: Vec<&str> = table.iter().map(|(_, n)| *n).collect();
    names.sort_unstable();
    names.join(", ")
}

/// クラスター環境
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Environment {
    #[default]
    Production,
    Prestable,
}

impl EnumNames for Environment {
    const FIELD: &'static str = "environment";
    const NAMES: &'static [(Self, &'static str)] = &[
        (Environment::Production, "PRODUCTION"),
        (Environment::Prestable, "PRESTABLE"),
    ];
}

/// コネクションプーラーのモード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoolingMode {
    Session,
    Transaction,
    Statement,
}

impl EnumNames for PoolingMode {
    const FIELD: &'static str = "pooling_mode";
    const NAMES: &'static [(Self, &'static str)] = &[
        (PoolingMode::Session, "SESSION"),
        (PoolingMode::Transaction, "TRANSACTION"),
        (PoolingMode::Statement, "STATEMENT"),
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WalLevel {
    Replica,
    Logical,
}

impl EnumNames for WalLevel {
    const FIELD: &'static str = "wal_level";
    const NAMES: &'static [(Self, &'static str)] = &[
        (WalLevel::Replica, "WAL_LEVEL_REPLICA"),
        (WalLevel::Logical, "WAL_LEVEL_LOGICAL"),
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SynchronousCommit {
    On,
    Off,
    Local,
    RemoteWrite,
    RemoteApply,
}

impl EnumNames for SynchronousCommit {
    const FIELD: &'static str = "synchronous_commit";
    const NAMES: &'static [(Self, &'static str)] = &[
        (SynchronousCommit::On, "SYNCHRONOUS_COMMIT_ON"),
        (SynchronousCommit::Off, "SYNCHRONOUS_COMMIT_OFF"),
        (SynchronousCommit::Local, "SYNCHRONOUS_COMMIT_LOCAL"),
        (SynchronousCommit::RemoteWrite, "SYNCHRONOUS_COMMIT_REMOTE_WRITE"),
        (SynchronousCommit::RemoteApply, "SYNCHRONOUS_COMMIT_REMOTE_APPLY"),
    ];
}

impl HumanNames for SynchronousCommit {
    const HUMAN_NAMES: &'static [(Self, &'static str)] = &[
        (SynchronousCommit::On, "on"),
        (SynchronousCommit::Off, "off"),
        (SynchronousCommit::Local, "local"),
        (SynchronousCommit::RemoteWrite, "remote write"),
        (SynchronousCommit::RemoteApply, "remote apply"),
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionIsolation {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl EnumNames for TransactionIsolation {
    const FIELD: &'static str = "default_transaction_isolation";
    const NAMES: &'static [(Self, &'static str)] = &[
        (
            TransactionIsolation::ReadUncommitted,
            "TRANSACTION_ISOLATION_READ_UNCOMMITTED",
        ),
        (
            TransactionIsolation::ReadCommitted,
            "TRANSACTION_ISOLATION_READ_COMMITTED",
        ),
        (
            TransactionIsolation::RepeatableRead,
            "TRANSACTION_ISOLATION_REPEATABLE_READ",
        ),
        (
            TransactionIsolation::Serializable,
            "TRANSACTION_ISOLATION_SERIALIZABLE",
        ),
    ];
}

impl HumanNames for TransactionIsolation {
    const HUMAN_NAMES: &'static [(Self, &'static str)] = &[
        (TransactionIsolation::ReadUncommitted, "read uncommitted"),
        (TransactionIsolation::ReadCommitted, "read committed"),
        (TransactionIsolation::RepeatableRead, "repeatable read"),
        (TransactionIsolation::Serializable, "serializable"),
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogStatement {
    None,
    Ddl,
    Mod,
    All,
}

impl EnumNames for LogStatement {
    const FIELD: &'static str = "log_statement";
    const NAMES: &'static [(Self, &'static str)] = &[
        (LogStatement::None, "LOG_STATEMENT_NONE"),
        (LogStatement::Ddl, "LOG_STATEMENT_DDL"),
        (LogStatement::Mod, "LOG_STATEMENT_MOD"),
        (LogStatement::All, "LOG_STATEMENT_ALL"),
    ];
}

impl HumanNames for LogStatement {
    const HUMAN_NAMES: &'static [(Self, &'static str)] = &[
        (LogStatement::None, "none"),
        (LogStatement::Ddl, "ddl"),
        (LogStatement::Mod, "mod"),
        (LogStatement::All, "all"),
    ];
}

/// PostgreSQL 12 以降のみ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanCacheMode {
    Auto,
    ForceCustomPlan,
    ForceGenericPlan,
}

impl EnumNames for PlanCacheMode {
    const FIELD: &'static str = "plan_cache_mode";
    const NAMES: &'static [(Self, &'static str)] = &[
        (PlanCacheMode::Auto, "PLAN_CACHE_MODE_AUTO"),
        (PlanCacheMode::ForceCustomPlan, "PLAN_CACHE_MODE_FORCE_CUSTOM_PLAN"),
        (PlanCacheMode::ForceGenericPlan, "PLAN_CACHE_MODE_FORCE_GENERIC_PLAN"),
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SharedPreloadLibrary {
    AutoExplain,
    PgHintPlan,
    /// PostgreSQL 11 以降のみ
    Timescaledb,
}

impl EnumNames for SharedPreloadLibrary {
    const FIELD: &'static str = "shared_preload_libraries";
    const NAMES: &'static [(Self, &'static str)] = &[
        (
            SharedPreloadLibrary::AutoExplain,
            "SHARED_PRELOAD_LIBRARIES_AUTO_EXPLAIN",
        ),
        (
            SharedPreloadLibrary::PgHintPlan,
            "SHARED_PRELOAD_LIBRARIES_PG_HINT_PLAN",
        ),
        (
            SharedPreloadLibrary::Timescaledb,
            "SHARED_PRELOAD_LIBRARIES_TIMESCALEDB",
        ),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_names() {
        assert_eq!(WalLevel::Logical.name(), "WAL_LEVEL_LOGICAL");
        assert_eq!(
            PoolingMode::from_name("TRANSACTION").unwrap(),
            PoolingMode::Transaction
        );
    }

    #[test]
    fn test_unknown_name_lists_choices() {
        let err = Environment::from_name("STAGING").unwrap_err();
        match err {
            SpecError::UnknownEnumValue {
                field,
                value,
                expected,
            } => {
                assert_eq!(field, "environment");
                assert_eq!(value, "STAGING");
                assert_eq!(expected, "PRESTABLE, PRODUCTION");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_human_names() {
        assert_eq!(
            TransactionIsolation::ReadCommitted.human_name(),
            "read committed"
        );
        assert_eq!(
            SynchronousCommit::from_human_name("remote apply").unwrap(),
            SynchronousCommit::RemoteApply
        );
    }

    #[test]
    fn test_human_name_accepts_generated_name() {
        assert_eq!(
            LogStatement::from_human_name("LOG_STATEMENT_DDL").unwrap(),
            LogStatement::Ddl
        );
        assert!(LogStatement::from_human_name("verbose").is_err());
    }

    #[test]
    fn test_every_variant_has_a_name() {
        for (value, name) in SynchronousCommit::NAMES {
            assert_eq!(value.name(), *name);
            assert!(!value.human_name().is_empty());
        }
    }
}
