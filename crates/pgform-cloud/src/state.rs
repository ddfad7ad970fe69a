//! State management for managed clusters
//!
//! Manages the `.pgform/state.json` file, which records the declaration of
//! every cluster as of its last successful apply. Observed state is never
//! cached here; it is read from the API on every run.

use crate::error::{CloudError, Result};
use crate::reconcile::EntityKind;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

const STATE_VERSION: u32 = 1;
const STATE_DIR: &str = ".pgform";
const STATE_FILE: &str = "state.json";
const STATE_BACKUP: &str = "state.json.backup";
const LOCK_FILE: &str = "lock.json";
const STALE_LOCK_MINUTES: i64 = 60;

/// Global state containing the applied declaration of every cluster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalState {
    /// State file version
    pub version: u32,

    /// Last modified timestamp
    pub updated_at: DateTime<Utc>,

    /// Applied declarations indexed by cluster name
    pub clusters: HashMap<String, AppliedState>,
}

impl Default for GlobalState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            updated_at: Utc::now(),
            clusters: HashMap::new(),
        }
    }
}

impl GlobalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the declaration a cluster was just brought to
    pub fn record_applied<T: Serialize>(&mut self, cluster: &str, declaration: &T) -> Result<()> {
        let applied = AppliedState {
            declaration: serde_json::to_value(declaration)?,
            applied_at: Utc::now(),
        };
        self.clusters.insert(cluster.to_string(), applied);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Declaration recorded by the last successful apply, if any
    pub fn previous_declaration<T: DeserializeOwned>(&self, cluster: &str) -> Result<Option<T>> {
        match self.clusters.get(cluster) {
            Some(applied) => Ok(Some(serde_json::from_value(applied.declaration.clone())?)),
            None => Ok(None),
        }
    }

}

/// Declaration of one cluster as of its last apply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedState {
    pub declaration: serde_json::Value,
    pub applied_at: DateTime<Utc>,
}

/// Observed child resources of one cluster
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderState {
    /// Resources indexed by kind:name
    pub resources: HashMap<String, ResourceState>,
}

impl ProviderState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, state: ResourceState) {
        self.resources.insert(state.key(), state);
    }

    pub fn by_kind(&self, kind: EntityKind) -> Vec<&ResourceState> {
        let mut resources: Vec<&ResourceState> = self
            .resources
            .values()
            .filter(|r| r.kind == kind)
            .collect();
        resources.sort_by(|a, b| a.name.cmp(&b.name));
        resources
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// State of a single observed resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceState {
    /// Name key (database/user name, host FQDN)
    pub name: String,

    /// Resource kind
    pub kind: EntityKind,

    /// Current status
    pub status: ResourceStatus,

    /// Resource attributes (owner, zone, role, ...)
    pub attributes: HashMap<String, serde_json::Value>,
}

impl ResourceState {
    pub fn new(name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            name: name.into(),
            kind,
            status: ResourceStatus::Unknown,
            attributes: HashMap::new(),
        }
    }

    pub fn key(&self) -> String {
        format!("{}:{}", self.kind, self.name)
    }

    pub fn with_status(mut self, status: ResourceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn get_attribute<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Status of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    /// Resource exists (databases, users)
    Active,
    /// Host is serving
    Alive,
    /// Host is serving with reduced capacity
    Degraded,
    /// Host is down
    Dead,
    /// Status is unknown
    Unknown,
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceStatus::Active => write!(f, "active"),
            ResourceStatus::Alive => write!(f, "alive"),
            ResourceStatus::Degraded => write!(f, "degraded"),
            ResourceStatus::Dead => write!(f, "dead"),
            ResourceStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// State manager for reading/writing state files
pub struct StateManager {
    /// Project root directory
    project_root: PathBuf,
}

impl StateManager {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
        }
    }

    fn state_dir(&self) -> PathBuf {
        self.project_root.join(STATE_DIR)
    }

    fn state_path(&self) -> PathBuf {
        self.state_dir().join(STATE_FILE)
    }

    fn backup_path(&self) -> PathBuf {
        self.state_dir().join(STATE_BACKUP)
    }

    fn lock_path(&self) -> PathBuf {
        self.state_dir().join(LOCK_FILE)
    }

    async fn ensure_state_dir(&self) -> Result<()> {
        let dir = self.state_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
            tracing::debug!("Created state directory: {}", dir.display());
        }
        Ok(())
    }

    /// Load the current state
    pub async fn load(&self) -> Result<GlobalState> {
        let path = self.state_path();
        if !path.exists() {
            tracing::debug!("State file not found, returning empty state");
            return Ok(GlobalState::new());
        }

        let content = fs::read_to_string(&path).await?;
        let state: GlobalState = serde_json::from_str(&content)?;

        if state.version > STATE_VERSION {
            return Err(CloudError::StateError(format!(
                "State file version {} is newer than supported version {}",
                state.version, STATE_VERSION
            )));
        }

        tracing::debug!("Loaded state with {} clusters", state.clusters.len());
        Ok(state)
    }

    /// Save the state, keeping the previous file as a backup
    pub async fn save(&self, state: &GlobalState) -> Result<()> {
        self.ensure_state_dir().await?;

        let path = self.state_path();
        let backup = self.backup_path();

        if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(&path, &backup).await?;
            tracing::debug!("Created state backup");
        }

        let content = serde_json::to_string_pretty(state)?;
        fs::write(&path, content).await?;

        tracing::debug!("Saved state with {} clusters", state.clusters.len());
        Ok(())
    }

    /// Take the apply lock on behalf of `cluster`
    ///
    /// A lock left behind by a crashed run is taken over once it is older
    /// than an hour.
    pub async fn acquire_lock(&self, cluster: &str) -> Result<StateLock> {
        self.ensure_state_dir().await?;

        let path = self.lock_path();
        if let Some(held) = read_lock(&path).await? {
            let age = Utc::now().signed_duration_since(held.acquired_at);
            if age.num_minutes() < STALE_LOCK_MINUTES {
                return Err(CloudError::LockError(format!(
                    "cluster {} is being applied by {} (pid {}) since {}",
                    held.cluster, held.holder, held.pid, held.acquired_at
                )));
            }
            tracing::warn!(
                cluster = %held.cluster,
                holder = %held.holder,
                "Taking over stale apply lock"
            );
        }

        let info = LockInfo {
            cluster: cluster.to_string(),
            holder: std::env::var("HOSTNAME")
                .or_else(|_| std::env::var("HOST"))
                .unwrap_or_else(|_| "unknown".to_string()),
            pid: std::process::id(),
            acquired_at: Utc::now(),
        };
        fs::write(&path, serde_json::to_string_pretty(&info)?).await?;

        tracing::debug!(cluster, "Acquired apply lock");
        Ok(StateLock {
            path,
            released: false,
        })
    }
}

async fn read_lock(path: &Path) -> Result<Option<LockInfo>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).await?;
    Ok(Some(serde_json::from_str(&content)?))
}

#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    cluster: String,
    holder: String,
    pid: u32,
    acquired_at: DateTime<Utc>,
}

/// Apply lock; removed on [`StateLock::release`] or when dropped
pub struct StateLock {
    path: PathBuf,
    released: bool,
}

impl StateLock {
    pub async fn release(mut self) -> Result<()> {
        self.released = true;
        if self.path.exists() {
            fs::remove_file(&self.path).await?;
            tracing::debug!("Released apply lock");
        }
        Ok(())
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if !self.released {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}
