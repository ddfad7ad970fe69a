//! config ブロックのパース

use super::value::{bool_arg, integer_arg, integer_prop, required_string, scalar_arg, string_arg};
use crate::error::{Result, SpecError};
use crate::model::{
    AccessBlock, BackupWindowStart, ClusterConfigBlock, EnumNames, PerformanceDiagnosticsBlock,
    PoolerConfigBlock, PoolingMode, PostgresVersion, PostgresqlSettings, ResourcesBlock,
};
use kdl::{KdlNode, KdlValue};
use std::collections::BTreeMap;
use tracing::warn;

/// config ブロックをパース
pub fn parse_config(node: &KdlNode) -> Result<ClusterConfigBlock> {
    let mut config = ClusterConfigBlock::default();

    let Some(children) = node.children() else {
        return Ok(config);
    };

    for child in children.nodes() {
        match child.name().value() {
            "version" => config.version = parse_version(child)?,
            "autofailover" => config.autofailover = Some(bool_arg(child)?),
            "pooler_config" | "pooler-config" => {
                let mut pooler = PoolerConfigBlock::default();
                for n in child.children().map(|d| d.nodes()).unwrap_or_default() {
                    match n.name().value() {
                        "pooling_mode" => {
                            pooler.pooling_mode =
                                Some(PoolingMode::from_name(&required_string(n)?)?);
                        }
                        "pool_discard" => pooler.pool_discard = Some(bool_arg(n)?),
                        other => warn!(node = other, "Ignoring unknown pooler_config node"),
                    }
                }
                config.pooler_config = Some(pooler);
            }
            "resources" => config.resources = parse_resources(child)?,
            "backup_window_start" | "backup-window-start" => {
                let window = BackupWindowStart {
                    hours: time_part(child, "hours")?,
                    minutes: time_part(child, "minutes")?,
                };
                window.validate()?;
                config.backup_window_start = Some(window);
            }
            "performance_diagnostics" | "performance-diagnostics" => {
                let mut diagnostics = PerformanceDiagnosticsBlock::default();
                for n in child.children().map(|d| d.nodes()).unwrap_or_default() {
                    match n.name().value() {
                        "enabled" => diagnostics.enabled = bool_arg(n)?,
                        "sessions_sampling_interval" => {
                            diagnostics.sessions_sampling_interval = integer_arg(n)?;
                        }
                        "statements_sampling_interval" => {
                            diagnostics.statements_sampling_interval = integer_arg(n)?;
                        }
                        other => {
                            warn!(node = other, "Ignoring unknown performance_diagnostics node")
                        }
                    }
                }
                config.performance_diagnostics = Some(diagnostics);
            }
            "access" => {
                let mut access = AccessBlock::default();
                for n in child.children().map(|d| d.nodes()).unwrap_or_default() {
                    match n.name().value() {
                        "data_lens" => access.data_lens = bool_arg(n)?,
                        "web_sql" => access.web_sql = bool_arg(n)?,
                        other => warn!(node = other, "Ignoring unknown access node"),
                    }
                }
                config.access = Some(access);
            }
            "postgresql_config" | "postgresql-config" => {
                let mut raw = BTreeMap::new();
                for n in child.children().map(|d| d.nodes()).unwrap_or_default() {
                    if let Some(value) = scalar_arg(n) {
                        raw.insert(n.name().value().to_string(), value);
                    }
                }
                config.postgresql_config = Some(PostgresqlSettings::from_map(&raw)?);
            }
            other => warn!(node = other, "Ignoring unknown config node"),
        }
    }

    Ok(config)
}

/// `version "12"` と `version 12` の両方を受け付ける
fn parse_version(node: &KdlNode) -> Result<PostgresVersion> {
    let raw = match node.entries().first().map(|e| e.value()) {
        Some(KdlValue::Integer(i)) => i.to_string(),
        Some(KdlValue::String(s)) => s.clone(),
        _ => {
            return Err(SpecError::InvalidConfig(
                "version には \"12\" のようにバージョンを指定してください".to_string(),
            ));
        }
    };
    PostgresVersion::parse(&raw)
}

fn parse_resources(node: &KdlNode) -> Result<ResourcesBlock> {
    let mut resources = ResourcesBlock::default();

    for n in node.children().map(|d| d.nodes()).unwrap_or_default() {
        match n.name().value() {
            "resource_preset_id" => resources.resource_preset_id = required_string(n)?,
            "disk_type_id" => resources.disk_type_id = string_arg(n).unwrap_or_default(),
            "disk_size" => {
                let size = integer_arg(n)?;
                resources.disk_size = u64::try_from(size).map_err(|_| {
                    SpecError::InvalidConfig(format!(
                        "disk_size は 0 以上の値を指定してください（指定値: {size}）"
                    ))
                })?;
            }
            other => warn!(node = other, "Ignoring unknown resources node"),
        }
    }

    if resources.resource_preset_id.is_empty() {
        return Err(SpecError::InvalidConfig(
            "resources に resource_preset_id が指定されていません".to_string(),
        ));
    }

    Ok(resources)
}

fn time_part(node: &KdlNode, key: &str) -> Result<u8> {
    let value = integer_prop(node, key).unwrap_or(0);
    u8::try_from(value).map_err(|_| {
        SpecError::InvalidConfig(format!(
            "backup_window_start の {key} が範囲外です（指定値: {value}）"
        ))
    })
}
