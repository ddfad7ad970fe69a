//! File-backed implementation of the PostgreSQL API
//!
//! Keeps every cluster in memory behind a `tokio::sync::RwLock` and writes
//! the whole store to a JSON file after each mutation. Used by the CLI as a
//! local stand-in for the remote service and by the tests.

use crate::api::PostgresqlApi;
use crate::error::{MdbError, Result};
use crate::expand::user_spec_for_create;
use crate::proto::{
    AddClusterHostsRequest, Cluster, ClusterConfig, ConfigSpec, CreateClusterRequest,
    CreateDatabaseRequest, CreateUserRequest, Database, DatabaseSpec, DeleteClusterHostsRequest,
    DeleteDatabaseRequest, DeleteUserRequest, FieldMask, Health, Host, HostRole, HostSpec,
    PostgresqlConfigSet, UpdateClusterRequest, UpdateDatabaseRequest, UpdateUserRequest, User,
    UserSpec,
};
use async_trait::async_trait;
use pgform_cloud::EntityKind;
use pgform_core::PostgresVersion;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;

const DEFAULT_LC: &str = "C";
const DEFAULT_CONN_LIMIT: i64 = 50;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Store {
    clusters: BTreeMap<String, ClusterRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct ClusterRecord {
    cluster: Cluster,
    databases: Vec<Database>,
    hosts: Vec<Host>,
    users: Vec<User>,
    /// Sequence used for generated host names
    host_counter: u32,
}

/// PostgreSQL API backed by a local JSON file
pub struct FileBackend {
    path: Option<PathBuf>,
    store: RwLock<Store>,
}

impl FileBackend {
    /// Open the store at `path`, starting empty if the file does not exist
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let store = if path.exists() {
            let content = fs::read_to_string(&path).await?;
            serde_json::from_str(&content)?
        } else {
            tracing::debug!("Backend file not found, starting empty: {}", path.display());
            Store::default()
        };

        Ok(Self {
            path: Some(path),
            store: RwLock::new(store),
        })
    }

    /// Store that is never written to disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            store: RwLock::new(Store::default()),
        }
    }

    async fn persist(&self, store: &Store) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(store)?;
        fs::write(path, content).await?;
        tracing::debug!("Saved backend store: {}", path.display());
        Ok(())
    }

    async fn read_record<T>(
        &self,
        cluster_id: &str,
        f: impl FnOnce(&ClusterRecord) -> T,
    ) -> Result<T> {
        let store = self.store.read().await;
        let record = store
            .clusters
            .get(cluster_id)
            .ok_or_else(|| MdbError::ClusterNotFound(cluster_id.to_string()))?;
        Ok(f(record))
    }

    /// Run `f` against a copy of the record; the store only sees the copy
    /// if `f` succeeds
    async fn mutate_record<T>(
        &self,
        cluster_id: &str,
        f: impl FnOnce(&mut ClusterRecord) -> Result<T>,
    ) -> Result<T> {
        let mut store = self.store.write().await;
        let record = store
            .clusters
            .get_mut(cluster_id)
            .ok_or_else(|| MdbError::ClusterNotFound(cluster_id.to_string()))?;
        let mut draft = record.clone();
        let out = f(&mut draft)?;
        *record = draft;
        self.persist(&store).await?;
        Ok(out)
    }
}

#[async_trait]
impl PostgresqlApi for FileBackend {
    async fn get_cluster(&self, cluster_id: &str) -> Result<Cluster> {
        self.read_record(cluster_id, |r| r.cluster.clone()).await
    }

    async fn create_cluster(&self, request: CreateClusterRequest) -> Result<Cluster> {
        let mut store = self.store.write().await;
        if store.clusters.contains_key(&request.name) {
            return Err(MdbError::AlreadyExists {
                kind: EntityKind::Cluster,
                name: request.name,
            });
        }
        if request.host_specs.is_empty() {
            return Err(MdbError::InvalidArgument(
                "at least one host is required".to_string(),
            ));
        }

        let mut record = ClusterRecord {
            cluster: Cluster {
                id: request.name.clone(),
                name: request.name.clone(),
                description: request.description,
                labels: request.labels,
                environment: request.environment,
                network_id: request.network_id,
                config: config_from_spec(&request.config_spec)?,
                health: Health::Alive,
            },
            ..Default::default()
        };

        // Users first, so databases can name them as owners; privileges last,
        // once the databases they refer to exist.
        for spec in &request.user_specs {
            insert_user(&mut record, &user_spec_for_create(spec))?;
        }
        for spec in &request.database_specs {
            insert_database(&mut record, spec)?;
        }
        for spec in request.user_specs.iter().filter(|s| s.has_privileges()) {
            let mask: FieldMask = ["permissions", "grants"].into_iter().collect();
            update_user(&mut record, &spec.name, &mask, spec)?;
        }
        insert_hosts(&mut record, &request.host_specs);

        let cluster = record.cluster.clone();
        store.clusters.insert(cluster.id.clone(), record);
        self.persist(&store).await?;

        tracing::info!("Created cluster {}", cluster.name);
        Ok(cluster)
    }

    async fn update_cluster(&self, request: UpdateClusterRequest) -> Result<Cluster> {
        self.mutate_record(&request.cluster_id, |record| {
            apply_cluster_update(&mut record.cluster, &request)?;
            Ok(record.cluster.clone())
        })
        .await
    }

    async fn list_databases(&self, cluster_id: &str) -> Result<Vec<Database>> {
        self.read_record(cluster_id, |r| r.databases.clone()).await
    }

    async fn create_database(&self, request: CreateDatabaseRequest) -> Result<Database> {
        self.mutate_record(&request.cluster_id, |record| {
            insert_database(record, &request.database_spec)
        })
        .await
    }

    async fn update_database(&self, request: UpdateDatabaseRequest) -> Result<Database> {
        self.mutate_record(&request.cluster_id, |record| {
            let owner_exists = |name: &str| record.users.iter().any(|u| u.name == name);
            if request.update_mask.contains("owner")
                && !owner_exists(&request.database_spec.owner)
            {
                return Err(MdbError::FailedPrecondition(format!(
                    "owner {} of database {} does not exist",
                    request.database_spec.owner, request.database_name
                )));
            }

            let database = record
                .databases
                .iter_mut()
                .find(|d| d.name == request.database_name)
                .ok_or_else(|| MdbError::NotFound {
                    kind: EntityKind::Database,
                    name: request.database_name.clone(),
                })?;

            let spec = &request.database_spec;
            for path in &request.update_mask.paths {
                match path.as_str() {
                    "owner" => {
                        database.set_owner(spec.owner.clone());
                    }
                    "extensions" => {
                        database.set_extensions(spec.extensions.clone());
                    }
                    "lc_collate" | "lc_ctype" => {
                        return Err(MdbError::InvalidArgument(format!(
                            "{path} of database {} cannot be changed",
                            request.database_name
                        )));
                    }
                    other => {
                        return Err(MdbError::InvalidArgument(format!(
                            "unknown update mask path: {other}"
                        )));
                    }
                }
            }
            Ok(database.clone())
        })
        .await
    }

    async fn delete_database(&self, request: DeleteDatabaseRequest) -> Result<()> {
        self.mutate_record(&request.cluster_id, |record| {
            let before = record.databases.len();
            record.databases.retain(|d| d.name != request.database_name);
            if record.databases.len() == before {
                return Err(MdbError::NotFound {
                    kind: EntityKind::Database,
                    name: request.database_name.clone(),
                });
            }
            for user in &mut record.users {
                user.permissions
                    .retain(|p| p.database_name != request.database_name);
            }
            Ok(())
        })
        .await
    }

    async fn list_hosts(&self, cluster_id: &str) -> Result<Vec<Host>> {
        self.read_record(cluster_id, |r| r.hosts.clone()).await
    }

    async fn add_hosts(&self, request: AddClusterHostsRequest) -> Result<Vec<Host>> {
        self.mutate_record(&request.cluster_id, |record| {
            Ok(insert_hosts(record, &request.host_specs))
        })
        .await
    }

    async fn delete_hosts(&self, request: DeleteClusterHostsRequest) -> Result<()> {
        self.mutate_record(&request.cluster_id, |record| {
            for name in &request.host_names {
                if !record.hosts.iter().any(|h| &h.name == name) {
                    return Err(MdbError::NotFound {
                        kind: EntityKind::Host,
                        name: name.clone(),
                    });
                }
            }
            let doomed: BTreeSet<&str> =
                request.host_names.iter().map(String::as_str).collect();
            if doomed.len() >= record.hosts.len() {
                return Err(MdbError::FailedPrecondition(
                    "cannot delete the last host of a cluster".to_string(),
                ));
            }

            record.hosts.retain(|h| !doomed.contains(h.name.as_str()));
            if !record.hosts.iter().any(|h| h.role == HostRole::Master)
                && let Some(first) = record.hosts.first_mut()
            {
                tracing::info!("Promoting {} to master", first.name);
                first.set_role(HostRole::Master);
            }
            Ok(())
        })
        .await
    }

    async fn list_users(&self, cluster_id: &str) -> Result<Vec<User>> {
        self.read_record(cluster_id, |r| r.users.clone()).await
    }

    async fn create_user(&self, request: CreateUserRequest) -> Result<User> {
        self.mutate_record(&request.cluster_id, |record| {
            insert_user(record, &request.user_spec)
        })
        .await
    }

    async fn update_user(&self, request: UpdateUserRequest) -> Result<User> {
        self.mutate_record(&request.cluster_id, |record| {
            update_user(
                record,
                &request.user_name,
                &request.update_mask,
                &request.user_spec,
            )
        })
        .await
    }

    async fn delete_user(&self, request: DeleteUserRequest) -> Result<()> {
        self.mutate_record(&request.cluster_id, |record| {
            if let Some(db) = record
                .databases
                .iter()
                .find(|d| d.owner == request.user_name)
            {
                return Err(MdbError::FailedPrecondition(format!(
                    "user {} owns database {}",
                    request.user_name, db.name
                )));
            }

            let before = record.users.len();
            record.users.retain(|u| u.name != request.user_name);
            if record.users.len() == before {
                return Err(MdbError::NotFound {
                    kind: EntityKind::User,
                    name: request.user_name.clone(),
                });
            }
            Ok(())
        })
        .await
    }
}

fn config_from_spec(spec: &ConfigSpec) -> Result<ClusterConfig> {
    let version = PostgresVersion::parse(&spec.version)?;
    if let Some(set) = &spec.postgresql_config
        && set.version() != version
    {
        return Err(MdbError::InvalidArgument(format!(
            "{} does not match version {}",
            set.field_name(),
            version
        )));
    }

    Ok(ClusterConfig {
        version: spec.version.clone(),
        postgresql_config: spec.postgresql_config.clone(),
        pooler_config: spec.pooler_config.clone(),
        resources: spec.resources.clone(),
        autofailover: spec.autofailover,
        backup_window_start: spec.backup_window_start.clone(),
        access: spec.access.clone(),
        performance_diagnostics: spec.performance_diagnostics.clone(),
    })
}

fn apply_cluster_update(cluster: &mut Cluster, request: &UpdateClusterRequest) -> Result<()> {
    let spec = &request.config_spec;
    let config = &mut cluster.config;

    for path in &request.update_mask.paths {
        match path.as_str() {
            "description" => {
                cluster.description = request.description.clone();
            }
            "labels" => {
                cluster.labels = request.labels.clone();
            }
            "config_spec.version" => {
                let version = PostgresVersion::parse(&spec.version)?;
                config.version = spec.version.clone();
                // Settings follow the cluster to the new version
                config.postgresql_config = config
                    .postgresql_config
                    .take()
                    .map(|set| PostgresqlConfigSet::new(version, set.settings().clone()));
            }
            "config_spec.autofailover" => config.autofailover = spec.autofailover,
            "config_spec.pooler_config" => config.pooler_config = spec.pooler_config.clone(),
            "config_spec.resources" => config.resources = spec.resources.clone(),
            "config_spec.resources.resource_preset_id" => {
                config.resources.resource_preset_id = spec.resources.resource_preset_id.clone();
            }
            "config_spec.resources.disk_size" => {
                if spec.resources.disk_size < config.resources.disk_size {
                    return Err(MdbError::InvalidArgument(
                        "disk size cannot be decreased".to_string(),
                    ));
                }
                config.resources.disk_size = spec.resources.disk_size;
            }
            "config_spec.resources.disk_type_id" => {
                config.resources.disk_type_id = spec.resources.disk_type_id.clone();
            }
            "config_spec.backup_window_start" => {
                config.backup_window_start = spec.backup_window_start.clone();
            }
            "config_spec.performance_diagnostics" => {
                config.performance_diagnostics = spec.performance_diagnostics.clone();
            }
            "config_spec.access" => config.access = spec.access.clone(),
            other => {
                let set = other
                    .strip_prefix("config_spec.")
                    .and_then(|field| {
                        spec.postgresql_config
                            .as_ref()
                            .filter(|set| set.field_name() == field)
                    })
                    .ok_or_else(|| {
                        MdbError::InvalidArgument(format!("unknown update mask path: {other}"))
                    })?;
                config.postgresql_config = Some(set.clone());
            }
        }
    }

    // Re-check after all paths are applied; version and settings may move together.
    config_from_spec(&ConfigSpec {
        version: config.version.clone(),
        postgresql_config: config.postgresql_config.clone(),
        ..Default::default()
    })?;
    Ok(())
}

fn insert_database(record: &mut ClusterRecord, spec: &DatabaseSpec) -> Result<Database> {
    if record.databases.iter().any(|d| d.name == spec.name) {
        return Err(MdbError::AlreadyExists {
            kind: EntityKind::Database,
            name: spec.name.clone(),
        });
    }
    if !record.users.iter().any(|u| u.name == spec.owner) {
        return Err(MdbError::FailedPrecondition(format!(
            "owner {} of database {} does not exist",
            spec.owner, spec.name
        )));
    }

    let or_default = |lc: &str| {
        if lc.is_empty() {
            DEFAULT_LC.to_string()
        } else {
            lc.to_string()
        }
    };

    let database = Database {
        name: spec.name.clone(),
        cluster_id: record.cluster.id.clone(),
        owner: spec.owner.clone(),
        lc_collate: or_default(&spec.lc_collate),
        lc_ctype: or_default(&spec.lc_ctype),
        extensions: spec.extensions.clone(),
    };
    record.databases.push(database.clone());
    Ok(database)
}

fn insert_user(record: &mut ClusterRecord, spec: &UserSpec) -> Result<User> {
    if record.users.iter().any(|u| u.name == spec.name) {
        return Err(MdbError::AlreadyExists {
            kind: EntityKind::User,
            name: spec.name.clone(),
        });
    }
    if spec.password.is_empty() {
        return Err(MdbError::InvalidArgument(format!(
            "password of user {} is empty",
            spec.name
        )));
    }
    check_permissions(record, spec)?;

    let user = User {
        name: spec.name.clone(),
        cluster_id: record.cluster.id.clone(),
        permissions: spec.permissions.clone(),
        conn_limit: spec.conn_limit.unwrap_or(DEFAULT_CONN_LIMIT),
        settings: spec.settings.clone(),
        login: Some(spec.login.unwrap_or(true)),
        grants: spec.grants.clone(),
    };
    record.users.push(user.clone());
    Ok(user)
}

fn update_user(
    record: &mut ClusterRecord,
    name: &str,
    mask: &FieldMask,
    spec: &UserSpec,
) -> Result<User> {
    if mask.contains("permissions") {
        check_permissions(record, spec)?;
    }

    let user = record
        .users
        .iter_mut()
        .find(|u| u.name == name)
        .ok_or_else(|| MdbError::NotFound {
            kind: EntityKind::User,
            name: name.to_string(),
        })?;

    for path in &mask.paths {
        match path.as_str() {
            // Passwords are write-only
            "password" => {}
            "permissions" => {
                user.set_permissions(spec.permissions.clone());
            }
            "grants" => {
                user.set_grants(spec.grants.clone());
            }
            "conn_limit" => {
                user.set_conn_limit(spec.conn_limit.unwrap_or(DEFAULT_CONN_LIMIT));
            }
            "login" => {
                user.set_login(Some(spec.login.unwrap_or(true)));
            }
            "settings" => {
                user.set_settings(spec.settings.clone());
            }
            other => {
                return Err(MdbError::InvalidArgument(format!(
                    "unknown update mask path: {other}"
                )));
            }
        }
    }
    Ok(user.clone())
}

fn check_permissions(record: &ClusterRecord, spec: &UserSpec) -> Result<()> {
    for permission in &spec.permissions {
        if !record
            .databases
            .iter()
            .any(|d| d.name == permission.database_name)
        {
            return Err(MdbError::FailedPrecondition(format!(
                "user {} is granted access to missing database {}",
                spec.name, permission.database_name
            )));
        }
    }
    Ok(())
}

fn insert_hosts(record: &mut ClusterRecord, specs: &[HostSpec]) -> Vec<Host> {
    let mut added = Vec::with_capacity(specs.len());
    for spec in specs {
        record.host_counter += 1;
        let role = if record.hosts.is_empty() {
            HostRole::Master
        } else {
            HostRole::Replica
        };
        let host = Host {
            name: format!(
                "{}-{}.{}.mdb.internal",
                spec.zone_id, record.host_counter, record.cluster.name
            ),
            cluster_id: record.cluster.id.clone(),
            zone_id: spec.zone_id.clone(),
            role,
            health: Health::Alive,
            subnet_id: spec.subnet_id.clone(),
            assign_public_ip: spec.assign_public_ip,
        };
        record.hosts.push(host.clone());
        added.push(host);
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{Permission, Resources};
    use tempfile::TempDir;

    fn user_spec(name: &str) -> UserSpec {
        UserSpec {
            name: name.to_string(),
            password: "secret123".to_string(),
            ..Default::default()
        }
    }

    fn db_spec(name: &str, owner: &str) -> DatabaseSpec {
        DatabaseSpec {
            name: name.to_string(),
            owner: owner.to_string(),
            ..Default::default()
        }
    }

    fn host_spec(zone: &str) -> HostSpec {
        HostSpec {
            zone_id: zone.to_string(),
            ..Default::default()
        }
    }

    fn create_request() -> CreateClusterRequest {
        CreateClusterRequest {
            name: "main".to_string(),
            network_id: "net-1".to_string(),
            config_spec: ConfigSpec {
                version: "12".to_string(),
                resources: Resources {
                    resource_preset_id: "s2.micro".to_string(),
                    disk_size: 10 << 30,
                    disk_type_id: "network-ssd".to_string(),
                },
                ..Default::default()
            },
            user_specs: vec![UserSpec {
                permissions: vec![Permission {
                    database_name: "app".to_string(),
                }],
                ..user_spec("alice")
            }],
            database_specs: vec![db_spec("app", "alice")],
            host_specs: vec![host_spec("zone-a"), host_spec("zone-b")],
            ..Default::default()
        }
    }

    async fn backend_with_cluster() -> FileBackend {
        let backend = FileBackend::in_memory();
        backend.create_cluster(create_request()).await.unwrap();
        backend
    }

    #[tokio::test]
    async fn test_create_cluster_with_children() {
        let backend = backend_with_cluster().await;

        let users = backend.list_users("main").await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].permissions[0].database_name, "app");
        assert_eq!(users[0].conn_limit, DEFAULT_CONN_LIMIT);

        let databases = backend.list_databases("main").await.unwrap();
        assert_eq!(databases[0].lc_collate, DEFAULT_LC);

        let hosts = backend.list_hosts("main").await.unwrap();
        assert_eq!(hosts[0].name, "zone-a-1.main.mdb.internal");
        assert_eq!(hosts[0].role, HostRole::Master);
        assert_eq!(hosts[1].name, "zone-b-2.main.mdb.internal");
        assert_eq!(hosts[1].role, HostRole::Replica);
    }

    #[tokio::test]
    async fn test_create_cluster_twice() {
        let backend = backend_with_cluster().await;
        let result = backend.create_cluster(create_request()).await;
        assert!(matches!(result, Err(MdbError::AlreadyExists { .. })));
    }

    #[tokio::test]
    async fn test_unknown_cluster() {
        let backend = FileBackend::in_memory();
        assert!(matches!(
            backend.list_users("missing").await,
            Err(MdbError::ClusterNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_database_owner_must_exist() {
        let backend = backend_with_cluster().await;
        let result = backend
            .create_database(CreateDatabaseRequest {
                cluster_id: "main".to_string(),
                database_spec: db_spec("analytics", "bob"),
            })
            .await;
        assert!(matches!(result, Err(MdbError::FailedPrecondition(_))));
    }

    #[tokio::test]
    async fn test_duplicate_database() {
        let backend = backend_with_cluster().await;
        let result = backend
            .create_database(CreateDatabaseRequest {
                cluster_id: "main".to_string(),
                database_spec: db_spec("app", "alice"),
            })
            .await;
        assert!(matches!(
            result,
            Err(MdbError::AlreadyExists {
                kind: EntityKind::Database,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_user_permission_must_name_database() {
        let backend = backend_with_cluster().await;
        let result = backend
            .create_user(CreateUserRequest {
                cluster_id: "main".to_string(),
                user_spec: UserSpec {
                    permissions: vec![Permission {
                        database_name: "missing".to_string(),
                    }],
                    ..user_spec("bob")
                },
            })
            .await;
        assert!(matches!(result, Err(MdbError::FailedPrecondition(_))));
    }

    #[tokio::test]
    async fn test_update_user_honours_mask() {
        let backend = backend_with_cluster().await;
        let updated = backend
            .update_user(UpdateUserRequest {
                cluster_id: "main".to_string(),
                user_name: "alice".to_string(),
                update_mask: ["conn_limit"].into_iter().collect(),
                user_spec: UserSpec {
                    conn_limit: Some(10),
                    grants: vec!["mdb_admin".to_string()],
                    ..user_spec("alice")
                },
            })
            .await
            .unwrap();

        assert_eq!(updated.conn_limit, 10);
        assert!(updated.grants.is_empty());
        assert_eq!(updated.permissions.len(), 1);
    }

    #[tokio::test]
    async fn test_update_database_rejects_collation_change() {
        let backend = backend_with_cluster().await;
        let result = backend
            .update_database(UpdateDatabaseRequest {
                cluster_id: "main".to_string(),
                database_name: "app".to_string(),
                update_mask: ["lc_collate"].into_iter().collect(),
                database_spec: db_spec("app", "alice"),
            })
            .await;
        assert!(matches!(result, Err(MdbError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_failed_database_update_leaves_record_untouched() {
        let backend = backend_with_cluster().await;
        backend
            .create_user(CreateUserRequest {
                cluster_id: "main".to_string(),
                user_spec: user_spec("bob"),
            })
            .await
            .unwrap();

        let result = backend
            .update_database(UpdateDatabaseRequest {
                cluster_id: "main".to_string(),
                database_name: "app".to_string(),
                update_mask: ["owner", "lc_collate"].into_iter().collect(),
                database_spec: db_spec("app", "bob"),
            })
            .await;
        assert!(matches!(result, Err(MdbError::InvalidArgument(_))));

        let databases = backend.list_databases("main").await.unwrap();
        assert_eq!(databases[0].owner, "alice");
    }

    #[tokio::test]
    async fn test_delete_database_revokes_permissions() {
        let backend = backend_with_cluster().await;
        backend
            .delete_database(DeleteDatabaseRequest {
                cluster_id: "main".to_string(),
                database_name: "app".to_string(),
            })
            .await
            .unwrap();

        let users = backend.list_users("main").await.unwrap();
        assert!(users[0].permissions.is_empty());
    }

    #[tokio::test]
    async fn test_delete_owner_fails() {
        let backend = backend_with_cluster().await;
        let result = backend
            .delete_user(DeleteUserRequest {
                cluster_id: "main".to_string(),
                user_name: "alice".to_string(),
            })
            .await;
        assert!(matches!(result, Err(MdbError::FailedPrecondition(_))));
    }

    #[tokio::test]
    async fn test_delete_unknown_user() {
        let backend = backend_with_cluster().await;
        let result = backend
            .delete_user(DeleteUserRequest {
                cluster_id: "main".to_string(),
                user_name: "nobody".to_string(),
            })
            .await;
        assert!(matches!(
            result,
            Err(MdbError::NotFound {
                kind: EntityKind::User,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_delete_master_promotes_replica() {
        let backend = backend_with_cluster().await;
        backend
            .delete_hosts(DeleteClusterHostsRequest {
                cluster_id: "main".to_string(),
                host_names: vec!["zone-a-1.main.mdb.internal".to_string()],
            })
            .await
            .unwrap();

        let hosts = backend.list_hosts("main").await.unwrap();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].role, HostRole::Master);
    }

    #[tokio::test]
    async fn test_cannot_delete_last_host() {
        let backend = backend_with_cluster().await;
        let result = backend
            .delete_hosts(DeleteClusterHostsRequest {
                cluster_id: "main".to_string(),
                host_names: vec![
                    "zone-a-1.main.mdb.internal".to_string(),
                    "zone-b-2.main.mdb.internal".to_string(),
                ],
            })
            .await;
        assert!(matches!(result, Err(MdbError::FailedPrecondition(_))));
    }

    #[tokio::test]
    async fn test_repeated_host_name_is_deleted_once() {
        let backend = backend_with_cluster().await;
        backend
            .delete_hosts(DeleteClusterHostsRequest {
                cluster_id: "main".to_string(),
                host_names: vec![
                    "zone-b-2.main.mdb.internal".to_string(),
                    "zone-b-2.main.mdb.internal".to_string(),
                ],
            })
            .await
            .unwrap();

        let hosts = backend.list_hosts("main").await.unwrap();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].name, "zone-a-1.main.mdb.internal");
    }

    #[tokio::test]
    async fn test_host_names_are_not_reused() {
        let backend = backend_with_cluster().await;
        backend
            .delete_hosts(DeleteClusterHostsRequest {
                cluster_id: "main".to_string(),
                host_names: vec!["zone-b-2.main.mdb.internal".to_string()],
            })
            .await
            .unwrap();

        let added = backend
            .add_hosts(AddClusterHostsRequest {
                cluster_id: "main".to_string(),
                host_specs: vec![host_spec("zone-b")],
            })
            .await
            .unwrap();
        assert_eq!(added[0].name, "zone-b-3.main.mdb.internal");
        assert_eq!(added[0].role, HostRole::Replica);
    }

    #[tokio::test]
    async fn test_update_cluster_version_moves_settings() {
        let backend = backend_with_cluster().await;
        let cluster = backend
            .update_cluster(UpdateClusterRequest {
                cluster_id: "main".to_string(),
                update_mask: ["config_spec.version", "description"].into_iter().collect(),
                description: "upgraded".to_string(),
                config_spec: ConfigSpec {
                    version: "11".to_string(),
                    ..Default::default()
                },
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(cluster.config.version, "11");
        assert_eq!(cluster.description, "upgraded");
        assert_eq!(cluster.config.resources.resource_preset_id, "s2.micro");
    }

    #[tokio::test]
    async fn test_failed_cluster_update_leaves_record_untouched() {
        let backend = backend_with_cluster().await;
        let result = backend
            .update_cluster(UpdateClusterRequest {
                cluster_id: "main".to_string(),
                update_mask: [
                    "config_spec.autofailover",
                    "config_spec.resources.disk_size",
                ]
                .into_iter()
                .collect(),
                config_spec: ConfigSpec {
                    autofailover: Some(false),
                    resources: Resources {
                        disk_size: 5 << 30,
                        ..Default::default()
                    },
                    ..Default::default()
                },
                ..Default::default()
            })
            .await;
        assert!(matches!(result, Err(MdbError::InvalidArgument(_))));

        let cluster = backend.get_cluster("main").await.unwrap();
        assert_eq!(cluster.config.autofailover, None);
        assert_eq!(cluster.config.resources.disk_size, 10 << 30);
    }

    #[tokio::test]
    async fn test_update_cluster_unknown_path() {
        let backend = backend_with_cluster().await;
        let result = backend
            .update_cluster(UpdateClusterRequest {
                cluster_id: "main".to_string(),
                update_mask: ["config_spec.postgresql_config_11"].into_iter().collect(),
                ..Default::default()
            })
            .await;
        assert!(matches!(result, Err(MdbError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_store_persists_to_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("backend").join("clusters.json");

        {
            let backend = FileBackend::open(&path).await.unwrap();
            backend.create_cluster(create_request()).await.unwrap();
        }
        assert!(path.exists());

        let reopened = FileBackend::open(&path).await.unwrap();
        let hosts = reopened.list_hosts("main").await.unwrap();
        assert_eq!(hosts.len(), 2);
    }
}
