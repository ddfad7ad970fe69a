//! cluster ノードのパース

use super::config::parse_config;
use super::value::{
    bool_arg, integer_arg, required_name, required_string, scalar_arg, string_arg, string_args,
};
use crate::error::{Result, SpecError};
use crate::model::{
    ClusterResource, DatabaseResource, EnumNames, Environment, ExtensionBlock, HostResource,
    UserResource, UserSettingsBlock,
};
use kdl::KdlNode;
use std::collections::BTreeMap;
use tracing::warn;

/// cluster ノードをパース
pub fn parse_cluster(node: &KdlNode) -> Result<ClusterResource> {
    let mut cluster = ClusterResource::new(required_name(node)?);

    let Some(children) = node.children() else {
        return Ok(cluster);
    };

    for child in children.nodes() {
        match child.name().value() {
            "description" => cluster.description = string_arg(child),
            "environment" => {
                cluster.environment = Environment::from_name(&required_string(child)?)?;
            }
            "network_id" | "network-id" => cluster.network_id = required_string(child)?,
            "labels" => {
                if let Some(labels) = child.children() {
                    for label in labels.nodes() {
                        cluster.labels.insert(
                            label.name().value().to_string(),
                            string_arg(label).unwrap_or_default(),
                        );
                    }
                }
            }
            "config" => cluster.config = parse_config(child)?,
            "database" => cluster.databases.push(parse_database(child)?),
            "host" => cluster.hosts.push(parse_host(child)?),
            "user" => cluster.users.push(parse_user(child)?),
            other => {
                warn!(cluster = %cluster.name, node = other, "Ignoring unknown node");
            }
        }
    }

    Ok(cluster)
}

/// database ノードをパース
fn parse_database(node: &KdlNode) -> Result<DatabaseResource> {
    let mut database = DatabaseResource {
        name: required_name(node)?,
        ..Default::default()
    };

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "owner" => database.owner = required_string(child)?,
                "lc_collate" | "lc-collate" => database.lc_collate = string_arg(child),
                "lc_type" | "lc-type" => database.lc_type = string_arg(child),
                "extension" => {
                    let extension = ExtensionBlock {
                        name: required_name(child)?,
                        version: child
                            .get("version")
                            .and_then(|v| v.as_string())
                            .map(|s| s.to_string()),
                    };
                    database.extensions.insert(extension);
                }
                other => {
                    warn!(database = %database.name, node = other, "Ignoring unknown node");
                }
            }
        }
    }

    if database.owner.is_empty() {
        return Err(SpecError::InvalidConfig(format!(
            "database '{}' に owner が指定されていません",
            database.name
        )));
    }

    Ok(database)
}

/// host ノードをパース
fn parse_host(node: &KdlNode) -> Result<HostResource> {
    let mut host = HostResource::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "zone" => host.zone = required_string(child)?,
                "subnet_id" | "subnet-id" => host.subnet_id = string_arg(child),
                "assign_public_ip" | "assign-public-ip" => host.assign_public_ip = bool_arg(child)?,
                "fqdn" => host.fqdn = string_arg(child),
                other => warn!(node = other, "Ignoring unknown host node"),
            }
        }
    }

    if host.zone.is_empty() {
        return Err(SpecError::InvalidConfig(
            "host に zone が指定されていません".to_string(),
        ));
    }

    Ok(host)
}

/// user ノードをパース
fn parse_user(node: &KdlNode) -> Result<UserResource> {
    let mut user = UserResource {
        name: required_name(node)?,
        ..Default::default()
    };

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "password" => user.password = required_string(child)?,
                "login" => user.login = Some(bool_arg(child)?),
                "conn_limit" | "conn-limit" => user.conn_limit = Some(integer_arg(child)?),
                // permission "app" "analytics"
                "permission" | "permissions" => user.permissions.extend(string_args(child)),
                "grants" | "grant" => user.grants.extend(string_args(child)),
                "settings" => {
                    let mut raw = BTreeMap::new();
                    if let Some(settings) = child.children() {
                        for setting in settings.nodes() {
                            if let Some(value) = scalar_arg(setting) {
                                raw.insert(setting.name().value().to_string(), value);
                            }
                        }
                    }
                    user.settings = Some(UserSettingsBlock::from_map(&raw)?);
                }
                other => {
                    warn!(user = %user.name, node = other, "Ignoring unknown node");
                }
            }
        }
    }

    Ok(user)
}
