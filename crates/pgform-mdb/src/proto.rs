//! Message types of the managed PostgreSQL API
//!
//! Plain serde structs mirroring the API messages. Every message gets
//! `set_<field>` accessors from the `message!` macro, in the style of the
//! generated protobuf extensions.

use pgform_core::{
    Environment, LogStatement, PoolingMode, PostgresVersion, PostgresqlSettings,
    SynchronousCommit, TransactionIsolation,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declares a message struct together with its `set_<field>` accessors
macro_rules! message {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field:ident / $setter:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct $name {
            $(
                $(#[$field_meta])*
                pub $field: $ty,
            )*
        }

        impl $name {
            $(
                pub fn $setter(&mut self, value: $ty) -> &mut Self {
                    self.$field = value;
                    self
                }
            )*
        }
    };
}

message! {
    /// A managed PostgreSQL cluster
    pub struct Cluster {
        id / set_id: String,
        name / set_name: String,
        description / set_description: String,
        labels / set_labels: BTreeMap<String, String>,
        environment / set_environment: Environment,
        network_id / set_network_id: String,
        config / set_config: ClusterConfig,
        health / set_health: Health,
    }
}

message! {
    /// Configuration as reported by the API
    pub struct ClusterConfig {
        version / set_version: String,
        postgresql_config / set_postgresql_config: Option<PostgresqlConfigSet>,
        pooler_config / set_pooler_config: Option<ConnectionPoolerConfig>,
        resources / set_resources: Resources,
        autofailover / set_autofailover: Option<bool>,
        backup_window_start / set_backup_window_start: Option<TimeOfDay>,
        access / set_access: Option<Access>,
        performance_diagnostics / set_performance_diagnostics: Option<PerformanceDiagnostics>,
    }
}

message! {
    /// Configuration as sent to the API
    pub struct ConfigSpec {
        version / set_version: String,
        postgresql_config / set_postgresql_config: Option<PostgresqlConfigSet>,
        pooler_config / set_pooler_config: Option<ConnectionPoolerConfig>,
        resources / set_resources: Resources,
        autofailover / set_autofailover: Option<bool>,
        backup_window_start / set_backup_window_start: Option<TimeOfDay>,
        access / set_access: Option<Access>,
        performance_diagnostics / set_performance_diagnostics: Option<PerformanceDiagnostics>,
    }
}

/// Version-specific PostgreSQL settings (one variant per supported version)
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PostgresqlConfigSet {
    #[serde(rename = "postgresql_config_10")]
    V10(PostgresqlSettings),
    #[serde(rename = "postgresql_config_10_1c")]
    V10_1C(PostgresqlSettings),
    #[serde(rename = "postgresql_config_11")]
    V11(PostgresqlSettings),
    #[serde(rename = "postgresql_config_11_1c")]
    V11_1C(PostgresqlSettings),
    #[serde(rename = "postgresql_config_12")]
    V12(PostgresqlSettings),
    #[serde(rename = "postgresql_config_12_1c")]
    V12_1C(PostgresqlSettings),
}

impl PostgresqlConfigSet {
    pub fn new(version: PostgresVersion, settings: PostgresqlSettings) -> Self {
        match version {
            PostgresVersion::V10 => Self::V10(settings),
            PostgresVersion::V10_1C => Self::V10_1C(settings),
            PostgresVersion::V11 => Self::V11(settings),
            PostgresVersion::V11_1C => Self::V11_1C(settings),
            PostgresVersion::V12 => Self::V12(settings),
            PostgresVersion::V12_1C => Self::V12_1C(settings),
        }
    }

    pub fn version(&self) -> PostgresVersion {
        match self {
            Self::V10(_) => PostgresVersion::V10,
            Self::V10_1C(_) => PostgresVersion::V10_1C,
            Self::V11(_) => PostgresVersion::V11,
            Self::V11_1C(_) => PostgresVersion::V11_1C,
            Self::V12(_) => PostgresVersion::V12,
            Self::V12_1C(_) => PostgresVersion::V12_1C,
        }
    }

    pub fn settings(&self) -> &PostgresqlSettings {
        match self {
            Self::V10(s)
            | Self::V10_1C(s)
            | Self::V11(s)
            | Self::V11_1C(s)
            | Self::V12(s)
            | Self::V12_1C(s) => s,
        }
    }

    /// Update-mask field name of this variant (`postgresql_config_12`, ...)
    pub fn field_name(&self) -> &'static str {
        self.version().config_field_name()
    }
}

message! {
    pub struct ConnectionPoolerConfig {
        pooling_mode / set_pooling_mode: Option<PoolingMode>,
        pool_discard / set_pool_discard: Option<bool>,
    }
}

message! {
    pub struct Resources {
        resource_preset_id / set_resource_preset_id: String,
        /// Disk size in bytes
        disk_size / set_disk_size: i64,
        disk_type_id / set_disk_type_id: String,
    }
}

message! {
    pub struct TimeOfDay {
        hours / set_hours: i32,
        minutes / set_minutes: i32,
        seconds / set_seconds: i32,
        nanos / set_nanos: i32,
    }
}

message! {
    pub struct PerformanceDiagnostics {
        enabled / set_enabled: bool,
        sessions_sampling_interval / set_sessions_sampling_interval: i64,
        statements_sampling_interval / set_statements_sampling_interval: i64,
    }
}

message! {
    pub struct Access {
        data_lens / set_data_lens: bool,
        web_sql / set_web_sql: bool,
    }
}

message! {
    pub struct Database {
        name / set_name: String,
        cluster_id / set_cluster_id: String,
        owner / set_owner: String,
        lc_collate / set_lc_collate: String,
        lc_ctype / set_lc_ctype: String,
        extensions / set_extensions: Vec<Extension>,
    }
}

message! {
    pub struct DatabaseSpec {
        name / set_name: String,
        owner / set_owner: String,
        /// Empty means "server default"
        lc_collate / set_lc_collate: String,
        lc_ctype / set_lc_ctype: String,
        extensions / set_extensions: Vec<Extension>,
    }
}

message! {
    pub struct Extension {
        name / set_name: String,
        version / set_version: String,
    }
}

message! {
    pub struct Host {
        /// Host FQDN
        name / set_name: String,
        cluster_id / set_cluster_id: String,
        zone_id / set_zone_id: String,
        role / set_role: HostRole,
        health / set_health: Health,
        subnet_id / set_subnet_id: String,
        assign_public_ip / set_assign_public_ip: bool,
    }
}

message! {
    pub struct HostSpec {
        zone_id / set_zone_id: String,
        subnet_id / set_subnet_id: String,
        assign_public_ip / set_assign_public_ip: bool,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostRole {
    #[default]
    RoleUnknown,
    Master,
    Replica,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Health {
    #[default]
    HealthUnknown,
    Alive,
    Dead,
    Degraded,
}

message! {
    pub struct User {
        name / set_name: String,
        cluster_id / set_cluster_id: String,
        permissions / set_permissions: Vec<Permission>,
        conn_limit / set_conn_limit: i64,
        settings / set_settings: Option<UserSettings>,
        login / set_login: Option<bool>,
        grants / set_grants: Vec<String>,
    }
}

message! {
    pub struct UserSpec {
        name / set_name: String,
        password / set_password: String,
        permissions / set_permissions: Vec<Permission>,
        conn_limit / set_conn_limit: Option<i64>,
        settings / set_settings: Option<UserSettings>,
        login / set_login: Option<bool>,
        grants / set_grants: Vec<String>,
    }
}

impl UserSpec {
    /// Whether the user needs permissions or grants once its databases exist
    pub fn has_privileges(&self) -> bool {
        !self.permissions.is_empty() || !self.grants.is_empty()
    }
}

message! {
    pub struct Permission {
        database_name / set_database_name: String,
    }
}

message! {
    pub struct UserSettings {
        default_transaction_isolation / set_default_transaction_isolation: Option<TransactionIsolation>,
        lock_timeout / set_lock_timeout: Option<i64>,
        log_min_duration_statement / set_log_min_duration_statement: Option<i64>,
        synchronous_commit / set_synchronous_commit: Option<SynchronousCommit>,
        temp_file_limit / set_temp_file_limit: Option<i64>,
        log_statement / set_log_statement: Option<LogStatement>,
    }
}

message! {
    /// Paths of the fields an update request changes
    pub struct FieldMask {
        paths / set_paths: Vec<String>,
    }
}

impl FieldMask {
    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    pub fn push(&mut self, path: impl Into<String>) {
        self.paths.push(path.into());
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for FieldMask {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().map(Into::into).collect(),
        }
    }
}

message! {
    pub struct CreateClusterRequest {
        name / set_name: String,
        description / set_description: String,
        labels / set_labels: BTreeMap<String, String>,
        environment / set_environment: Environment,
        network_id / set_network_id: String,
        config_spec / set_config_spec: ConfigSpec,
        database_specs / set_database_specs: Vec<DatabaseSpec>,
        user_specs / set_user_specs: Vec<UserSpec>,
        host_specs / set_host_specs: Vec<HostSpec>,
    }
}

message! {
    pub struct UpdateClusterRequest {
        cluster_id / set_cluster_id: String,
        update_mask / set_update_mask: FieldMask,
        description / set_description: String,
        labels / set_labels: BTreeMap<String, String>,
        config_spec / set_config_spec: ConfigSpec,
    }
}

message! {
    pub struct CreateDatabaseRequest {
        cluster_id / set_cluster_id: String,
        database_spec / set_database_spec: DatabaseSpec,
    }
}

message! {
    pub struct UpdateDatabaseRequest {
        cluster_id / set_cluster_id: String,
        database_name / set_database_name: String,
        update_mask / set_update_mask: FieldMask,
        database_spec / set_database_spec: DatabaseSpec,
    }
}

message! {
    pub struct DeleteDatabaseRequest {
        cluster_id / set_cluster_id: String,
        database_name / set_database_name: String,
    }
}

message! {
    pub struct AddClusterHostsRequest {
        cluster_id / set_cluster_id: String,
        host_specs / set_host_specs: Vec<HostSpec>,
    }
}

message! {
    pub struct DeleteClusterHostsRequest {
        cluster_id / set_cluster_id: String,
        host_names / set_host_names: Vec<String>,
    }
}

message! {
    pub struct CreateUserRequest {
        cluster_id / set_cluster_id: String,
        user_spec / set_user_spec: UserSpec,
    }
}

message! {
    pub struct UpdateUserRequest {
        cluster_id / set_cluster_id: String,
        user_name / set_user_name: String,
        update_mask / set_update_mask: FieldMask,
        user_spec / set_user_spec: UserSpec,
    }
}

message! {
    pub struct DeleteUserRequest {
        cluster_id / set_cluster_id: String,
        user_name / set_user_name: String,
    }
}
