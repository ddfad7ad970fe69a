//! pgform cloud layer
//!
//! Provider-independent pieces of cluster reconciliation: computing which
//! child resources to create or delete, the plan/action types a provider
//! produces, the provider trait, and the local state file.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                    pgform CLI                    │
//! │             (validate/plan/apply/show)           │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                 pgform-cloud                     │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │         trait ClusterProvider             │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │  Reconciler  │  │  State Mgmt  │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼────────┐
//! │   pgform-mdb   │
//! │   provider     │
//! └────────────────┘
//! ```

pub mod action;
pub mod error;
pub mod provider;
pub mod reconcile;
pub mod state;

// Re-exports
pub use action::{Action, ActionResult, ActionType, ApplyResult, Plan, PlanSummary};
pub use error::{CloudError, Result};
pub use provider::ClusterProvider;
pub use reconcile::{
    DesiredEntity, EntityKind, ObservedEntity, Reconciliation, changed_entities,
    compute_additions_and_removals, ensure_unique_names,
};
pub use state::{
    AppliedState, GlobalState, ProviderState, ResourceState, ResourceStatus, StateLock,
    StateManager,
};
