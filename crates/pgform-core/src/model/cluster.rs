//! クラスター定義

use crate::error::{Result, SpecError};
use crate::model::config::ClusterConfigBlock;
use crate::model::database::DatabaseResource;
use crate::model::enums::Environment;
use crate::model::host::HostResource;
use crate::model::user::UserResource;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// `cluster "<name>" { ... }` ブロック
///
/// 1つのマネージド PostgreSQL クラスターの宣言です。
/// データベース・ユーザーは名前で、ホストは FQDN で識別されます。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterResource {
    pub name: String,

    pub description: Option<String>,

    #[serde(default)]
    pub environment: Environment,

    pub network_id: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(default)]
    pub config: ClusterConfigBlock,

    #[serde(default)]
    pub databases: Vec<DatabaseResource>,

    #[serde(default)]
    pub hosts: Vec<HostResource>,

    #[serde(default)]
    pub users: Vec<UserResource>,
}

impl ClusterResource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// 宣言全体の整合性を検証
    ///
    /// - データベース名・ユーザー名・ホスト FQDN の重複
    /// - データベースのオーナーが宣言済みユーザーであること
    /// - ユーザーの permission が宣言済みデータベースを指すこと
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(SpecError::InvalidConfig(
                "cluster には名前が必要です".to_string(),
            ));
        }
        if self.network_id.is_empty() {
            return Err(SpecError::InvalidConfig(format!(
                "cluster '{}' に network_id が指定されていません",
                self.name
            )));
        }
        if self.hosts.is_empty() {
            return Err(SpecError::InvalidConfig(format!(
                "cluster '{}' には少なくとも1つの host が必要です",
                self.name
            )));
        }

        self.config.validate()?;

        ensure_unique("database", self.databases.iter().map(|d| d.name.as_str()))?;
        ensure_unique("user", self.users.iter().map(|u| u.name.as_str()))?;
        ensure_unique(
            "host",
            self.hosts
                .iter()
                .filter(|h| h.has_known_fqdn())
                .filter_map(|h| h.fqdn.as_deref()),
        )?;

        for database in &self.databases {
            if self.user(&database.owner).is_none() {
                return Err(SpecError::InvalidConfig(format!(
                    "database '{}' のオーナー '{}' が user として宣言されていません",
                    database.name, database.owner
                )));
            }
        }

        for user in &self.users {
            if user.password.is_empty() {
                return Err(SpecError::InvalidConfig(format!(
                    "user '{}' に password が指定されていません",
                    user.name
                )));
            }
            for permission in &user.permissions {
                if self.database(permission).is_none() {
                    return Err(SpecError::InvalidConfig(format!(
                        "user '{}' の permission '{}' が database として宣言されていません",
                        user.name, permission
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn database(&self, name: &str) -> Option<&DatabaseResource> {
        self.databases.iter().find(|d| d.name == name)
    }

    pub fn user(&self, name: &str) -> Option<&UserResource> {
        self.users.iter().find(|u| u.name == name)
    }

    /// ユーザー名からパスワードへのマップ
    pub fn passwords(&self) -> BTreeMap<String, String> {
        self.users
            .iter()
            .map(|u| (u.name.clone(), u.password.clone()))
            .collect()
    }
}

fn ensure_unique<'a>(kind: &'static str, names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(SpecError::Duplicate {
                kind,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}
