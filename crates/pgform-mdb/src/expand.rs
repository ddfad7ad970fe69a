//! Declaration → API message conversion

use crate::error::Result;
use crate::proto::{
    Access, ConfigSpec, ConnectionPoolerConfig, CreateClusterRequest, DatabaseSpec, Extension,
    HostSpec, PerformanceDiagnostics, Permission, PostgresqlConfigSet, Resources, TimeOfDay,
    UserSettings, UserSpec,
};
use pgform_core::{
    AccessBlock, BackupWindowStart, ClusterConfigBlock, ClusterResource, DatabaseResource,
    HostResource, PerformanceDiagnosticsBlock, PoolerConfigBlock, ResourcesBlock, UserResource,
    UserSettingsBlock,
};

/// Bytes in one GiB
pub const GIB: i64 = 1 << 30;

pub fn to_bytes(gib: u64) -> i64 {
    i64::try_from(gib).unwrap_or(i64::MAX).saturating_mul(GIB)
}

pub fn to_gigabytes(bytes: i64) -> u64 {
    u64::try_from(bytes / GIB).unwrap_or(0)
}

/// A declared host together with its identity, if the server assigned one
#[derive(Debug, Clone, PartialEq)]
pub struct PostgresqlHostSpec {
    pub spec: HostSpec,
    pub fqdn: String,
    pub has_computed_fqdn: bool,
}

/// Expand the `config` block into a spec and the update-mask field name of
/// its version-specific settings
pub fn expand_config_spec(config: &ClusterConfigBlock) -> Result<(ConfigSpec, &'static str)> {
    config.validate()?;

    let mut spec = ConfigSpec::default();
    spec.set_version(config.version.as_str().to_string())
        .set_autofailover(config.autofailover)
        .set_pooler_config(config.pooler_config.as_ref().map(expand_pooler_config))
        .set_resources(expand_resources(&config.resources))
        .set_backup_window_start(config.backup_window_start.as_ref().map(expand_backup_window))
        .set_performance_diagnostics(
            config
                .performance_diagnostics
                .as_ref()
                .map(expand_performance_diagnostics),
        )
        .set_access(config.access.as_ref().map(expand_access))
        .set_postgresql_config(
            config
                .postgresql_config
                .clone()
                .map(|settings| PostgresqlConfigSet::new(config.version, settings)),
        );

    Ok((spec, config.version.config_field_name()))
}

fn expand_pooler_config(pooler: &PoolerConfigBlock) -> ConnectionPoolerConfig {
    let mut out = ConnectionPoolerConfig::default();
    out.set_pooling_mode(pooler.pooling_mode)
        .set_pool_discard(pooler.pool_discard);
    out
}

fn expand_resources(resources: &ResourcesBlock) -> Resources {
    let mut out = Resources::default();
    out.set_resource_preset_id(resources.resource_preset_id.clone())
        .set_disk_size(to_bytes(resources.disk_size))
        .set_disk_type_id(resources.disk_type_id.clone());
    out
}

fn expand_backup_window(window: &BackupWindowStart) -> TimeOfDay {
    let mut out = TimeOfDay::default();
    out.set_hours(i32::from(window.hours))
        .set_minutes(i32::from(window.minutes));
    out
}

fn expand_performance_diagnostics(pd: &PerformanceDiagnosticsBlock) -> PerformanceDiagnostics {
    let mut out = PerformanceDiagnostics::default();
    out.set_enabled(pd.enabled)
        .set_sessions_sampling_interval(pd.sessions_sampling_interval)
        .set_statements_sampling_interval(pd.statements_sampling_interval);
    out
}

fn expand_access(access: &AccessBlock) -> Access {
    let mut out = Access::default();
    out.set_data_lens(access.data_lens).set_web_sql(access.web_sql);
    out
}

pub fn expand_database(database: &DatabaseResource) -> DatabaseSpec {
    let extensions = database
        .extensions
        .iter()
        .map(|e| {
            let mut ext = Extension::default();
            ext.set_name(e.name.clone())
                .set_version(e.version.clone().unwrap_or_default());
            ext
        })
        .collect();

    let mut spec = DatabaseSpec::default();
    spec.set_name(database.name.clone())
        .set_owner(database.owner.clone())
        .set_lc_collate(database.lc_collate.clone().unwrap_or_default())
        .set_lc_ctype(database.lc_type.clone().unwrap_or_default())
        .set_extensions(extensions);
    spec
}

pub fn expand_host(host: &HostResource) -> PostgresqlHostSpec {
    let mut spec = HostSpec::default();
    spec.set_zone_id(host.zone.clone())
        .set_subnet_id(host.subnet_id.clone().unwrap_or_default())
        .set_assign_public_ip(host.assign_public_ip);

    PostgresqlHostSpec {
        spec,
        fqdn: host.fqdn.clone().unwrap_or_default(),
        has_computed_fqdn: host.has_known_fqdn(),
    }
}

pub fn expand_user(user: &UserResource) -> UserSpec {
    let permissions = user
        .permissions
        .iter()
        .map(|db| {
            let mut p = Permission::default();
            p.set_database_name(db.clone());
            p
        })
        .collect();

    let mut spec = UserSpec::default();
    spec.set_name(user.name.clone())
        .set_password(user.password.clone())
        .set_login(user.login)
        .set_conn_limit(user.conn_limit)
        .set_permissions(permissions)
        .set_grants(user.grants.clone())
        .set_settings(user.settings.as_ref().map(expand_user_settings));
    spec
}

/// User spec for creation: grants and permissions are granted by a later
/// update, once the databases they name exist
pub fn user_spec_for_create(user: &UserSpec) -> UserSpec {
    let mut spec = user.clone();
    spec.set_permissions(Vec::new()).set_grants(Vec::new());
    spec
}

pub fn expand_user_settings(settings: &UserSettingsBlock) -> UserSettings {
    let mut out = UserSettings::default();
    out.set_default_transaction_isolation(settings.default_transaction_isolation)
        .set_lock_timeout(settings.lock_timeout)
        .set_log_min_duration_statement(settings.log_min_duration_statement)
        .set_synchronous_commit(settings.synchronous_commit)
        .set_temp_file_limit(settings.temp_file_limit)
        .set_log_statement(settings.log_statement);
    out
}

/// Request creating the whole cluster in one call
pub fn expand_create_cluster(cluster: &ClusterResource) -> Result<CreateClusterRequest> {
    let (config_spec, _) = expand_config_spec(&cluster.config)?;

    let mut request = CreateClusterRequest::default();
    request
        .set_name(cluster.name.clone())
        .set_description(cluster.description.clone().unwrap_or_default())
        .set_labels(cluster.labels.clone())
        .set_environment(cluster.environment)
        .set_network_id(cluster.network_id.clone())
        .set_config_spec(config_spec)
        .set_database_specs(cluster.databases.iter().map(expand_database).collect())
        .set_user_specs(cluster.users.iter().map(expand_user).collect())
        .set_host_specs(cluster.hosts.iter().map(|h| expand_host(h).spec).collect());
    Ok(request)
}
