use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpecError {
    #[error("KDLパースエラー: {0}")]
    KdlParse(#[from] kdl::KdlError),

    #[error("ファイル読み込みエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO エラー: {path}\n理由: {message}")]
    IoError { path: PathBuf, message: String },

    #[error("無効な設定: {0}")]
    InvalidConfig(String),

    #[error("'{field}' の値は {expected} のいずれかである必要があります（指定値: `{value}`）")]
    UnknownEnumValue {
        field: &'static str,
        value: String,
        expected: String,
    },

    #[error("未対応の設定項目です: {0}")]
    UnknownSetting(String),

    #[error("設定 '{key}' の値が不正です: `{value}`")]
    InvalidSettingValue { key: String, value: String },

    #[error("PostgreSQL {version} では '{setting}' を使用できません")]
    UnsupportedSetting { version: String, setting: String },

    #[error("{kind} '{name}' が重複しています")]
    Duplicate { kind: &'static str, name: String },

    #[error("クラスターが見つかりません: {0}")]
    ClusterNotFound(String),

    #[error("クラスターが複数定義されています。名前を指定してください: {0}")]
    AmbiguousCluster(String),
}

pub type Result<T> = std::result::Result<T, SpecError>;
