//! データベース定義

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// `database "<name>" { ... }` ブロック
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseResource {
    pub name: String,

    /// オーナーとなるユーザー名
    pub owner: String,

    /// 省略時はサーバー側の値を使う
    pub lc_collate: Option<String>,

    /// 省略時はサーバー側の値を使う
    pub lc_type: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub extensions: BTreeSet<ExtensionBlock>,
}

impl DatabaseResource {
    pub fn new(name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: owner.into(),
            ..Default::default()
        }
    }

    /// 省略された項目を `other` の値で埋める
    pub fn fill_computed(&mut self, other: &DatabaseResource) {
        if self.lc_collate.is_none() {
            self.lc_collate = other.lc_collate.clone();
        }
        if self.lc_type.is_none() {
            self.lc_type = other.lc_type.clone();
        }
    }
}

/// 拡張機能（名前とバージョンの組で一意）
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExtensionBlock {
    pub name: String,
    pub version: Option<String>,
}
