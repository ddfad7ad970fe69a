//! ユーザー定義

use crate::model::settings::UserSettingsBlock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// `user "<name>" { ... }` ブロック
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResource {
    pub name: String,

    pub password: String,

    /// 省略時はサーバー側の値を使う
    pub login: Option<bool>,

    /// 省略時はサーバー側の値を使う
    pub conn_limit: Option<i64>,

    /// アクセスを許可するデータベース名
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub permissions: BTreeSet<String>,

    /// 付与するロール（mdb_admin など）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grants: Vec<String>,

    pub settings: Option<UserSettingsBlock>,
}

impl UserResource {
    pub fn new(name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    /// 省略された項目を `other` の値で埋める
    pub fn fill_computed(&mut self, other: &UserResource) {
        if self.login.is_none() {
            self.login = other.login;
        }
        if self.conn_limit.is_none() {
            self.conn_limit = other.conn_limit;
        }
        if self.settings.is_none() {
            self.settings = other.settings.clone();
        }
    }
}
