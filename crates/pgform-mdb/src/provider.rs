//! Managed PostgreSQL cluster provider

use crate::api::PostgresqlApi;
use crate::error::{MdbError, Result};
use crate::expand::{
    PostgresqlHostSpec, expand_config_spec, expand_create_cluster, expand_database, expand_host,
    expand_user, user_spec_for_create,
};
use crate::flatten::flatten_cluster;
use crate::proto::{
    AddClusterHostsRequest, Cluster, CreateClusterRequest, CreateDatabaseRequest,
    CreateUserRequest, Database, DatabaseSpec, DeleteClusterHostsRequest, DeleteDatabaseRequest,
    DeleteUserRequest, FieldMask, Health, Host, UpdateClusterRequest, UpdateDatabaseRequest,
    UpdateUserRequest, User, UserSpec,
};
use async_trait::async_trait;
use pgform_cloud::{
    Action, ActionType, ApplyResult, ClusterProvider, EntityKind, Plan, ProviderState,
    ResourceState, ResourceStatus, changed_entities, compute_additions_and_removals,
};
use pgform_core::{ClusterResource, HostResource, PostgresqlSettings};
use std::collections::HashMap;

/// Provider for one managed PostgreSQL cluster
pub struct MdbPostgresqlProvider<A> {
    api: A,
    cluster_name: String,
}

/// Cluster and child resources as reported by the API
#[derive(Debug, Clone)]
struct ObservedCluster {
    cluster: Cluster,
    databases: Vec<Database>,
    hosts: Vec<Host>,
    users: Vec<User>,
}

impl ObservedCluster {
    fn flatten(&self, declared: Option<&ClusterResource>) -> Result<ClusterResource> {
        flatten_cluster(
            &self.cluster,
            &self.databases,
            &self.hosts,
            &self.users,
            declared,
        )
    }
}

impl<A: PostgresqlApi> MdbPostgresqlProvider<A> {
    pub fn new(api: A, cluster_name: impl Into<String>) -> Self {
        Self {
            api,
            cluster_name: cluster_name.into(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    /// `None` when the cluster does not exist yet
    async fn observe(&self) -> Result<Option<ObservedCluster>> {
        let cluster = match self.api.get_cluster(&self.cluster_name).await {
            Ok(cluster) => cluster,
            Err(MdbError::ClusterNotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        let databases = self.api.list_databases(&cluster.id).await?;
        let hosts = self.api.list_hosts(&cluster.id).await?;
        let users = self.api.list_users(&cluster.id).await?;

        tracing::debug!(
            cluster = cluster.name.as_str(),
            databases = databases.len(),
            hosts = hosts.len(),
            users = users.len(),
            "Observed cluster"
        );

        Ok(Some(ObservedCluster {
            cluster,
            databases,
            hosts,
            users,
        }))
    }

    /// Read the cluster back, taking passwords and host order from `declared`
    pub async fn read_declared(&self, declared: &ClusterResource) -> Result<ClusterResource> {
        let observed = self
            .observe()
            .await?
            .ok_or_else(|| MdbError::ClusterNotFound(self.cluster_name.clone()))?;
        observed.flatten(Some(declared))
    }

    fn plan_creation(&self, desired: &ClusterResource) -> Result<Vec<Action>> {
        let request = expand_create_cluster(desired)?;
        let action = Action::new(
            ActionType::Create,
            EntityKind::Cluster,
            &desired.name,
            format!(
                "Create cluster {} ({} hosts, {} databases, {} users)",
                desired.name,
                desired.hosts.len(),
                desired.databases.len(),
                desired.users.len()
            ),
        )
        .with_payload(&request)?;
        Ok(vec![action])
    }

    fn plan_changes(
        &self,
        observed: &ObservedCluster,
        desired: &ClusterResource,
        previous: Option<&ClusterResource>,
    ) -> Result<Vec<Action>> {
        let cluster_id = observed.cluster.id.clone();
        let flat = observed.flatten(Some(desired))?;
        let mut actions = Vec::new();

        // Cluster
        let mask = cluster_update_mask(&flat, desired);
        if !mask.is_empty() {
            let (config_spec, _) = expand_config_spec(&desired.config)?;
            let mut request = UpdateClusterRequest::default();
            request
                .set_cluster_id(cluster_id.clone())
                .set_update_mask(mask.clone())
                .set_description(desired.description.clone().unwrap_or_default())
                .set_labels(desired.labels.clone())
                .set_config_spec(config_spec);

            actions.push(
                Action::new(
                    ActionType::Update,
                    EntityKind::Cluster,
                    &desired.name,
                    format!("Update cluster {} ({})", desired.name, mask.paths.join(", ")),
                )
                .with_payload(&request)?,
            );
        }

        // Databases
        let old_databases = merge_previous(
            &flat.databases,
            previous.map(|p| p.databases.as_slice()),
            |d| d.name.as_str(),
        );
        let old_database_specs: Vec<DatabaseSpec> =
            old_databases.iter().map(expand_database).collect();
        let database_specs: Vec<DatabaseSpec> = desired
            .databases
            .iter()
            .map(|database| {
                let mut database = database.clone();
                if let Some(old) = old_databases.iter().find(|o| o.name == database.name) {
                    database.fill_computed(old);
                }
                expand_database(&database)
            })
            .collect();
        let databases = compute_additions_and_removals(&observed.databases, &database_specs)?;
        let changed_databases = changed_entities(&old_database_specs, &database_specs)?;

        // Users
        let old_users = merge_previous(
            &flat.users,
            previous.map(|p| p.users.as_slice()),
            |u| u.name.as_str(),
        );
        let old_user_specs: Vec<UserSpec> = old_users.iter().map(expand_user).collect();
        let user_specs: Vec<UserSpec> = desired
            .users
            .iter()
            .map(|user| {
                let mut user = user.clone();
                if let Some(old) = old_users.iter().find(|o| o.name == user.name) {
                    user.fill_computed(old);
                }
                expand_user(&user)
            })
            .collect();
        let users = compute_additions_and_removals(&observed.users, &user_specs)?;
        let changed_users = changed_entities(&old_user_specs, &user_specs)?;

        // Hosts
        let mut desired_hosts = desired.hosts.clone();
        let identities = previous.map_or(flat.hosts.as_slice(), |p| p.hosts.as_slice());
        inherit_host_identities(&mut desired_hosts, identities);
        let host_specs: Vec<PostgresqlHostSpec> = desired_hosts.iter().map(expand_host).collect();
        let hosts = compute_additions_and_removals(&observed.hosts, &host_specs)?;

        for spec in &users.to_add {
            let mut request = CreateUserRequest::default();
            request
                .set_cluster_id(cluster_id.clone())
                .set_user_spec(user_spec_for_create(spec));
            actions.push(
                Action::new(
                    ActionType::Create,
                    EntityKind::User,
                    &spec.name,
                    format!("Create user {}", spec.name),
                )
                .with_payload(&request)?,
            );
        }

        for spec in &databases.to_add {
            let mut request = CreateDatabaseRequest::default();
            request
                .set_cluster_id(cluster_id.clone())
                .set_database_spec(spec.clone());
            actions.push(
                Action::new(
                    ActionType::Create,
                    EntityKind::Database,
                    &spec.name,
                    format!("Create database {} owned by {}", spec.name, spec.owner),
                )
                .with_payload(&request)?,
            );
        }

        // Privileges of new users are granted once their databases exist
        let granted = users
            .to_add
            .iter()
            .filter(|spec| spec.has_privileges())
            .map(|spec| {
                let mask: FieldMask = ["permissions", "grants"].into_iter().collect();
                (spec, mask)
            });
        let old_user_specs: HashMap<&str, &UserSpec> = old_user_specs
            .iter()
            .map(|spec| (spec.name.as_str(), spec))
            .collect();
        let updated = changed_users.iter().filter_map(|spec| {
            old_user_specs
                .get(spec.name.as_str())
                .map(|old| (spec, user_update_mask(old, spec)))
        });

        for (spec, mask) in granted.chain(updated) {
            let mut request = UpdateUserRequest::default();
            request
                .set_cluster_id(cluster_id.clone())
                .set_user_name(spec.name.clone())
                .set_update_mask(mask.clone())
                .set_user_spec(spec.clone());
            actions.push(
                Action::new(
                    ActionType::Update,
                    EntityKind::User,
                    &spec.name,
                    format!("Update user {} ({})", spec.name, mask.paths.join(", ")),
                )
                .with_payload(&request)?,
            );
        }

        let old_database_specs: HashMap<&str, &DatabaseSpec> = old_database_specs
            .iter()
            .map(|spec| (spec.name.as_str(), spec))
            .collect();
        for spec in &changed_databases {
            let Some(old) = old_database_specs.get(spec.name.as_str()) else {
                continue;
            };
            let mask = database_update_mask(old, spec);
            let mut request = UpdateDatabaseRequest::default();
            request
                .set_cluster_id(cluster_id.clone())
                .set_database_name(spec.name.clone())
                .set_update_mask(mask.clone())
                .set_database_spec(spec.clone());
            actions.push(
                Action::new(
                    ActionType::Update,
                    EntityKind::Database,
                    &spec.name,
                    format!("Update database {} ({})", spec.name, mask.paths.join(", ")),
                )
                .with_payload(&request)?,
            );
        }

        for name in &databases.to_delete {
            let mut request = DeleteDatabaseRequest::default();
            request
                .set_cluster_id(cluster_id.clone())
                .set_database_name(name.clone());
            actions.push(
                Action::new(
                    ActionType::Delete,
                    EntityKind::Database,
                    name,
                    format!("Delete database {}", name),
                )
                .with_payload(&request)?,
            );
        }

        for name in &users.to_delete {
            let mut request = DeleteUserRequest::default();
            request
                .set_cluster_id(cluster_id.clone())
                .set_user_name(name.clone());
            actions.push(
                Action::new(
                    ActionType::Delete,
                    EntityKind::User,
                    name,
                    format!("Delete user {}", name),
                )
                .with_payload(&request)?,
            );
        }

        if !hosts.to_add.is_empty() {
            let zones: Vec<&str> = hosts
                .to_add
                .iter()
                .map(|h| h.spec.zone_id.as_str())
                .collect();
            let mut request = AddClusterHostsRequest::default();
            request
                .set_cluster_id(cluster_id.clone())
                .set_host_specs(hosts.to_add.iter().map(|h| h.spec.clone()).collect());
            actions.push(
                Action::new(
                    ActionType::Create,
                    EntityKind::Host,
                    zones.join(","),
                    format!("Add {} host(s) in {}", zones.len(), zones.join(", ")),
                )
                .with_payload(&request)?,
            );
        }

        if !hosts.to_delete.is_empty() {
            let names: Vec<String> = hosts.to_delete.iter().cloned().collect();
            let mut request = DeleteClusterHostsRequest::default();
            request
                .set_cluster_id(cluster_id.clone())
                .set_host_names(names.clone());
            actions.push(
                Action::new(
                    ActionType::Delete,
                    EntityKind::Host,
                    names.join(","),
                    format!("Delete host(s) {}", names.join(", ")),
                )
                .with_payload(&request)?,
            );
        }

        Ok(actions)
    }

    async fn execute(&self, action: &Action) -> Result<String> {
        match (action.kind, action.action_type) {
            (EntityKind::Cluster, ActionType::Create) => {
                let request: CreateClusterRequest = action.payload_as()?;
                let cluster = self.api.create_cluster(request).await?;
                Ok(format!("Created cluster {}", cluster.name))
            }
            (EntityKind::Cluster, ActionType::Update) => {
                let request: UpdateClusterRequest = action.payload_as()?;
                let cluster = self.api.update_cluster(request).await?;
                Ok(format!("Updated cluster {}", cluster.name))
            }
            (EntityKind::Database, ActionType::Create) => {
                let request: CreateDatabaseRequest = action.payload_as()?;
                let database = self.api.create_database(request).await?;
                Ok(format!("Created database {}", database.name))
            }
            (EntityKind::Database, ActionType::Update) => {
                let request: UpdateDatabaseRequest = action.payload_as()?;
                let database = self.api.update_database(request).await?;
                Ok(format!("Updated database {}", database.name))
            }
            (EntityKind::Database, ActionType::Delete) => {
                let request: DeleteDatabaseRequest = action.payload_as()?;
                let name = request.database_name.clone();
                self.api.delete_database(request).await?;
                Ok(format!("Deleted database {}", name))
            }
            (EntityKind::User, ActionType::Create) => {
                let request: CreateUserRequest = action.payload_as()?;
                let user = self.api.create_user(request).await?;
                Ok(format!("Created user {}", user.name))
            }
            (EntityKind::User, ActionType::Update) => {
                let request: UpdateUserRequest = action.payload_as()?;
                let user = self.api.update_user(request).await?;
                Ok(format!("Updated user {}", user.name))
            }
            (EntityKind::User, ActionType::Delete) => {
                let request: DeleteUserRequest = action.payload_as()?;
                let name = request.user_name.clone();
                self.api.delete_user(request).await?;
                Ok(format!("Deleted user {}", name))
            }
            (EntityKind::Host, ActionType::Create) => {
                let request: AddClusterHostsRequest = action.payload_as()?;
                let hosts = self.api.add_hosts(request).await?;
                let names: Vec<&str> = hosts.iter().map(|h| h.name.as_str()).collect();
                Ok(format!("Added host(s) {}", names.join(", ")))
            }
            (EntityKind::Host, ActionType::Delete) => {
                let request: DeleteClusterHostsRequest = action.payload_as()?;
                let names = request.host_names.join(", ");
                self.api.delete_hosts(request).await?;
                Ok(format!("Deleted host(s) {}", names))
            }
            (kind, action_type) => Err(MdbError::InvalidArgument(format!(
                "cannot {action_type} a {kind}"
            ))),
        }
    }
}

#[async_trait]
impl<A: PostgresqlApi> ClusterProvider for MdbPostgresqlProvider<A> {
    type Desired = ClusterResource;

    fn name(&self) -> &str {
        "mdb-postgresql"
    }

    async fn get_state(&self) -> pgform_cloud::Result<ProviderState> {
        let mut state = ProviderState::new();
        let Some(observed) = self.observe().await? else {
            return Ok(state);
        };

        for database in &observed.databases {
            state.add(
                ResourceState::new(&database.name, EntityKind::Database)
                    .with_status(ResourceStatus::Active)
                    .with_attribute("owner", serde_json::json!(database.owner)),
            );
        }

        for host in &observed.hosts {
            state.add(
                ResourceState::new(&host.name, EntityKind::Host)
                    .with_status(host_status(host.health))
                    .with_attribute("zone", serde_json::json!(host.zone_id))
                    .with_attribute("role", serde_json::json!(host.role)),
            );
        }

        for user in &observed.users {
            let permissions: Vec<&str> = user
                .permissions
                .iter()
                .map(|p| p.database_name.as_str())
                .collect();
            state.add(
                ResourceState::new(&user.name, EntityKind::User)
                    .with_status(ResourceStatus::Active)
                    .with_attribute("conn_limit", serde_json::json!(user.conn_limit))
                    .with_attribute("permissions", serde_json::json!(permissions)),
            );
        }

        Ok(state)
    }

    async fn read(&self) -> pgform_cloud::Result<ClusterResource> {
        let observed = self
            .observe()
            .await?
            .ok_or_else(|| MdbError::ClusterNotFound(self.cluster_name.clone()))?;
        Ok(observed.flatten(None)?)
    }

    async fn plan(
        &self,
        desired: &ClusterResource,
        previous: Option<&ClusterResource>,
    ) -> pgform_cloud::Result<Plan> {
        if desired.name != self.cluster_name {
            return Err(pgform_cloud::CloudError::InvalidConfig(format!(
                "declaration is for cluster {}, provider manages {}",
                desired.name, self.cluster_name
            )));
        }
        desired.validate().map_err(MdbError::from)?;

        let actions = match self.observe().await? {
            None => {
                tracing::info!("Cluster {} does not exist, planning creation", desired.name);
                self.plan_creation(desired)?
            }
            Some(observed) => self.plan_changes(&observed, desired, previous)?,
        };

        let plan = Plan::new(&self.cluster_name, actions);
        tracing::info!("Plan for {}: {}", self.cluster_name, plan.summary());
        Ok(plan)
    }

    async fn apply(&self, plan: &Plan) -> pgform_cloud::Result<ApplyResult> {
        let mut result = ApplyResult::new();
        let start = std::time::Instant::now();

        for (i, action) in plan.actions.iter().enumerate() {
            tracing::info!("{}", action.description);
            match self.execute(action).await {
                Ok(message) => result.add_success(action.id.clone(), message),
                Err(e) => {
                    tracing::error!("Action {} failed: {}", action.id, e);
                    result.add_failure(action.id.clone(), e.to_string());
                    result.skipped = plan.actions[i + 1..]
                        .iter()
                        .map(|a| a.id.clone())
                        .collect();
                    break;
                }
            }
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }
}

fn host_status(health: Health) -> ResourceStatus {
    match health {
        Health::Alive => ResourceStatus::Alive,
        Health::Degraded => ResourceStatus::Degraded,
        Health::Dead => ResourceStatus::Dead,
        Health::HealthUnknown => ResourceStatus::Unknown,
    }
}

/// Observed entities with the previously declared version substituted by name
fn merge_previous<T: Clone>(
    observed: &[T],
    previous: Option<&[T]>,
    name: impl Fn(&T) -> &str,
) -> Vec<T> {
    observed
        .iter()
        .map(|entity| {
            previous
                .and_then(|prev| prev.iter().find(|p| name(p) == name(entity)))
                .unwrap_or(entity)
                .clone()
        })
        .collect()
}

/// Give declared hosts the FQDN of the host at the same position in
/// `known`, if both sit in the same zone
fn inherit_host_identities(desired: &mut [HostResource], known: &[HostResource]) {
    for (host, known) in desired.iter_mut().zip(known) {
        if !host.has_known_fqdn() && host.zone == known.zone && known.has_known_fqdn() {
            host.fqdn = known.fqdn.clone();
        }
    }
}

/// Update mask for the cluster; only declared fields are compared
fn cluster_update_mask(observed: &ClusterResource, desired: &ClusterResource) -> FieldMask {
    let (o, d) = (&observed.config, &desired.config);
    let mut mask = FieldMask::default();

    if d.version != o.version {
        mask.push("config_spec.version");
    }
    if d.autofailover.is_some() && d.autofailover != o.autofailover {
        mask.push("config_spec.autofailover");
    }
    if d.pooler_config.is_some() && d.pooler_config != o.pooler_config {
        mask.push("config_spec.pooler_config");
    }
    if d.resources.resource_preset_id != o.resources.resource_preset_id {
        mask.push("config_spec.resources.resource_preset_id");
    }
    if d.resources.disk_size != o.resources.disk_size {
        mask.push("config_spec.resources.disk_size");
    }
    if d.resources.disk_type_id != o.resources.disk_type_id {
        mask.push("config_spec.resources.disk_type_id");
    }
    if d.backup_window_start.is_some() && d.backup_window_start != o.backup_window_start {
        mask.push("config_spec.backup_window_start");
    }
    if d.performance_diagnostics.is_some()
        && d.performance_diagnostics != o.performance_diagnostics
    {
        mask.push("config_spec.performance_diagnostics");
    }
    if d.access.is_some() && d.access != o.access {
        mask.push("config_spec.access");
    }
    if let Some(settings) = &d.postgresql_config
        && settings_differ(settings, o.postgresql_config.as_ref())
    {
        mask.push(format!("config_spec.{}", d.version.config_field_name()));
    }

    if desired.description.is_some() && desired.description != observed.description {
        mask.push("description");
    }
    if desired.labels != observed.labels {
        mask.push("labels");
    }
    mask
}

/// Whether any declared setting differs from the observed value
fn settings_differ(declared: &PostgresqlSettings, observed: Option<&PostgresqlSettings>) -> bool {
    let observed = observed.map(PostgresqlSettings::to_map).unwrap_or_default();
    declared
        .to_map()
        .iter()
        .any(|(key, value)| observed.get(key) != Some(value))
}

fn database_update_mask(old: &DatabaseSpec, new: &DatabaseSpec) -> FieldMask {
    let mut mask = FieldMask::default();
    if old.owner != new.owner {
        mask.push("owner");
    }
    if old.lc_collate != new.lc_collate {
        mask.push("lc_collate");
    }
    if old.lc_ctype != new.lc_ctype {
        mask.push("lc_ctype");
    }
    if old.extensions != new.extensions {
        mask.push("extensions");
    }
    mask
}

fn user_update_mask(old: &UserSpec, new: &UserSpec) -> FieldMask {
    let mut mask = FieldMask::default();
    if old.password != new.password {
        mask.push("password");
    }
    if old.permissions != new.permissions {
        mask.push("permissions");
    }
    if old.conn_limit != new.conn_limit {
        mask.push("conn_limit");
    }
    if old.login != new.login {
        mask.push("login");
    }
    if old.grants != new.grants {
        mask.push("grants");
    }
    if old.settings != new.settings {
        mask.push("settings");
    }
    mask
}
