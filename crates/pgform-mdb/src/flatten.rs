//! API message → declaration conversion
//!
//! Flattened values are compared against the declaration when planning and
//! printed by `pgform show`.

use crate::error::Result;
use crate::expand::to_gigabytes;
use crate::proto::{Cluster, ClusterConfig, Database, Host, User, UserSettings};
use pgform_core::{
    AccessBlock, BackupWindowStart, ClusterConfigBlock, ClusterResource, DatabaseResource,
    ExtensionBlock, HostResource, PerformanceDiagnosticsBlock, PoolerConfigBlock,
    PostgresVersion, ResourcesBlock, UserResource, UserSettingsBlock,
};
use std::collections::BTreeMap;

/// Flatten the observed configuration
///
/// `declared` is the configuration block the caller declared, if any. When
/// the API omits `shared_preload_libraries` the declared value is kept, since
/// the server only reports the libraries after a restart.
pub fn flatten_cluster_config(
    config: &ClusterConfig,
    declared: Option<&ClusterConfigBlock>,
) -> Result<ClusterConfigBlock> {
    let version = PostgresVersion::parse(&config.version)?;

    let mut postgresql_config = config
        .postgresql_config
        .as_ref()
        .map(|set| set.settings().clone());

    if let Some(declared_libs) = declared
        .and_then(|d| d.postgresql_config.as_ref())
        .map(|s| &s.shared_preload_libraries)
        .filter(|libs| !libs.is_empty())
    {
        let settings = postgresql_config.get_or_insert_with(Default::default);
        if settings.shared_preload_libraries.is_empty() {
            settings.shared_preload_libraries = declared_libs.clone();
        }
    }

    Ok(ClusterConfigBlock {
        version,
        autofailover: config.autofailover,
        pooler_config: config.pooler_config.as_ref().map(|p| PoolerConfigBlock {
            pooling_mode: p.pooling_mode,
            pool_discard: p.pool_discard,
        }),
        resources: ResourcesBlock {
            resource_preset_id: config.resources.resource_preset_id.clone(),
            disk_size: to_gigabytes(config.resources.disk_size),
            disk_type_id: config.resources.disk_type_id.clone(),
        },
        backup_window_start: config
            .backup_window_start
            .as_ref()
            .map(|t| BackupWindowStart {
                hours: u8::try_from(t.hours).unwrap_or_default(),
                minutes: u8::try_from(t.minutes).unwrap_or_default(),
            }),
        performance_diagnostics: config.performance_diagnostics.as_ref().map(|p| {
            PerformanceDiagnosticsBlock {
                enabled: p.enabled,
                sessions_sampling_interval: p.sessions_sampling_interval,
                statements_sampling_interval: p.statements_sampling_interval,
            }
        }),
        access: config.access.as_ref().map(|a| AccessBlock {
            data_lens: a.data_lens,
            web_sql: a.web_sql,
        }),
        postgresql_config,
    })
}

pub fn flatten_database(database: &Database) -> DatabaseResource {
    DatabaseResource {
        name: database.name.clone(),
        owner: database.owner.clone(),
        lc_collate: non_empty(&database.lc_collate),
        lc_type: non_empty(&database.lc_ctype),
        extensions: database
            .extensions
            .iter()
            .map(|e| ExtensionBlock {
                name: e.name.clone(),
                version: non_empty(&e.version),
            })
            .collect(),
    }
}

pub fn flatten_host(host: &Host) -> HostResource {
    HostResource {
        zone: host.zone_id.clone(),
        subnet_id: non_empty(&host.subnet_id),
        assign_public_ip: host.assign_public_ip,
        fqdn: Some(host.name.clone()),
    }
}

/// Flatten an observed user; the API never returns passwords, so they are
/// looked up in `passwords`
pub fn flatten_user(user: &User, passwords: &BTreeMap<String, String>) -> UserResource {
    UserResource {
        name: user.name.clone(),
        password: passwords.get(&user.name).cloned().unwrap_or_default(),
        login: user.login,
        conn_limit: Some(user.conn_limit),
        permissions: user
            .permissions
            .iter()
            .map(|p| p.database_name.clone())
            .collect(),
        grants: user.grants.clone(),
        settings: user
            .settings
            .as_ref()
            .map(flatten_user_settings)
            .filter(|s| !s.is_empty()),
    }
}

pub fn flatten_user_settings(settings: &UserSettings) -> UserSettingsBlock {
    UserSettingsBlock {
        default_transaction_isolation: settings.default_transaction_isolation,
        lock_timeout: settings.lock_timeout,
        log_min_duration_statement: settings
            .log_min_duration_statement
            .filter(|v| *v != pgform_core::LOG_MIN_DURATION_STATEMENT_DEFAULT),
        synchronous_commit: settings.synchronous_commit,
        temp_file_limit: settings.temp_file_limit,
        log_statement: settings.log_statement,
    }
}

/// Reorder observed hosts so that the i-th host sits in the zone of the
/// i-th declared host where possible
pub fn align_hosts_to_specs(hosts: &mut [Host], specs: &[HostResource]) {
    for (i, spec) in specs.iter().enumerate() {
        if i >= hosts.len() {
            break;
        }
        if hosts[i].zone_id == spec.zone {
            continue;
        }
        if let Some(offset) = hosts[i + 1..].iter().position(|h| h.zone_id == spec.zone) {
            hosts.swap(i, i + 1 + offset);
        }
    }
}

/// Flatten an observed cluster with its child resources
///
/// Passwords, declared shared libraries and host order come from `declared`.
pub fn flatten_cluster(
    cluster: &Cluster,
    databases: &[Database],
    hosts: &[Host],
    users: &[User],
    declared: Option<&ClusterResource>,
) -> Result<ClusterResource> {
    let passwords = declared.map(|d| d.passwords()).unwrap_or_default();

    let mut hosts = hosts.to_vec();
    if let Some(declared) = declared {
        align_hosts_to_specs(&mut hosts, &declared.hosts);
    }

    Ok(ClusterResource {
        name: cluster.name.clone(),
        description: non_empty(&cluster.description),
        environment: cluster.environment,
        network_id: cluster.network_id.clone(),
        labels: cluster.labels.clone(),
        config: flatten_cluster_config(&cluster.config, declared.map(|d| &d.config))?,
        databases: databases.iter().map(flatten_database).collect(),
        hosts: hosts.iter().map(flatten_host).collect(),
        users: users.iter().map(|u| flatten_user(u, &passwords)).collect(),
    })
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}
