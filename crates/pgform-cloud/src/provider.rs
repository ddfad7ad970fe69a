//! Cluster provider trait definition

use crate::action::{ApplyResult, Plan};
use crate::error::Result;
use crate::state::ProviderState;
use async_trait::async_trait;

/// Managed cluster provider abstraction trait
///
/// A provider reads the observed state of one cluster, plans the actions
/// that bring it to a declaration, and applies them.
#[async_trait]
pub trait ClusterProvider: Send + Sync {
    /// Declaration type the provider reconciles against
    type Desired: Send + Sync;

    /// Returns the provider name (e.g., "mdb-postgresql")
    fn name(&self) -> &str;

    /// Get the observed child resources of the cluster
    async fn get_state(&self) -> Result<ProviderState>;

    /// Read the observed cluster back into declaration form
    async fn read(&self) -> Result<Self::Desired>;

    /// Calculate the actions that move the cluster to `desired`
    ///
    /// `previous` is the declaration recorded by the last successful apply,
    /// used to detect attribute changes of entities that already exist.
    async fn plan(
        &self,
        desired: &Self::Desired,
        previous: Option<&Self::Desired>,
    ) -> Result<Plan>;

    /// Apply the planned actions
    async fn apply(&self, plan: &Plan) -> Result<ApplyResult>;
}
