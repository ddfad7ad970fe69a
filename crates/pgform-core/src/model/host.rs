//! ホスト定義

use serde::{Deserialize, Serialize};

/// `host { ... }` ブロック
///
/// ホストの識別子（FQDN）はサーバーが作成時に割り当てます。
/// FQDN が未設定のホストは常に新規作成の対象です。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostResource {
    /// アベイラビリティゾーン
    pub zone: String,

    pub subnet_id: Option<String>,

    pub assign_public_ip: bool,

    /// 作成済みホストの FQDN
    pub fqdn: Option<String>,
}

impl HostResource {
    pub fn in_zone(zone: impl Into<String>) -> Self {
        Self {
            zone: zone.into(),
            ..Default::default()
        }
    }

    /// FQDN が確定しているか（空文字列は未確定扱い）
    pub fn has_known_fqdn(&self) -> bool {
        self.fqdn.as_deref().is_some_and(|f| !f.is_empty())
    }
}
