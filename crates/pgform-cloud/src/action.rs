//! Action types for cluster resource management

use crate::error::{CloudError, Result};
use crate::reconcile::EntityKind;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Represents a planned action for a cluster resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Unique identifier for the action
    pub id: String,

    /// Type of action to perform
    pub action_type: ActionType,

    /// Kind of resource the action touches
    pub kind: EntityKind,

    /// Resource identifier (database/user name, host FQDN or zone)
    pub resource_id: String,

    /// Description of the action
    pub description: String,

    /// Request message to send, serialized as JSON
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl Action {
    pub fn new(
        action_type: ActionType,
        kind: EntityKind,
        resource_id: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let resource_id = resource_id.into();
        Self {
            id: format!("{}-{}-{}", action_type, kind, resource_id),
            action_type,
            kind,
            resource_id,
            description: description.into(),
            payload: None,
        }
    }

    /// Attach the request message carried by this action
    pub fn with_payload<T: Serialize>(mut self, payload: &T) -> Result<Self> {
        self.payload = Some(serde_json::to_value(payload)?);
        Ok(self)
    }

    /// Decode the request message carried by this action
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T> {
        let value = self
            .payload
            .as_ref()
            .ok_or_else(|| CloudError::InvalidPayload {
                action: self.id.clone(),
                reason: "missing payload".to_string(),
            })?;

        serde_json::from_value(value.clone()).map_err(|e| CloudError::InvalidPayload {
            action: self.id.clone(),
            reason: e.to_string(),
        })
    }
}

/// Type of action to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Create a new resource
    Create,
    /// Update an existing resource
    Update,
    /// Delete a resource
    Delete,
}

impl ActionType {
    /// Marker used when printing plans
    pub fn symbol(&self) -> &'static str {
        match self {
            ActionType::Create => "+",
            ActionType::Update => "~",
            ActionType::Delete => "-",
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Create => write!(f, "create"),
            ActionType::Update => write!(f, "update"),
            ActionType::Delete => write!(f, "delete"),
        }
    }
}

/// Result of applying actions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyResult {
    /// Successfully applied actions
    pub succeeded: Vec<ActionResult>,

    /// Failed actions
    pub failed: Vec<ActionResult>,

    /// Actions not attempted because an earlier one failed
    pub skipped: Vec<String>,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl ApplyResult {
    pub fn new() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
            duration_ms: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn add_success(&mut self, action_id: String, message: String) {
        self.succeeded.push(ActionResult {
            action_id,
            success: true,
            message,
            error: None,
        });
    }

    pub fn add_failure(&mut self, action_id: String, error: String) {
        self.failed.push(ActionResult {
            action_id,
            success: false,
            message: String::new(),
            error: Some(error),
        });
    }
}

impl Default for ApplyResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a single action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    /// ID of the action
    pub action_id: String,

    /// Whether the action succeeded
    pub success: bool,

    /// Success message
    pub message: String,

    /// Error message if failed
    pub error: Option<String>,
}

/// Ordered list of actions for one cluster
///
/// Actions are applied in order; the planner is responsible for putting
/// dependencies (users before the databases they own, ...) first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Cluster the plan applies to
    pub cluster_id: String,

    /// List of actions to perform
    pub actions: Vec<Action>,

    /// Whether the plan has any changes
    pub has_changes: bool,
}

impl Plan {
    pub fn new(cluster_id: impl Into<String>, actions: Vec<Action>) -> Self {
        let has_changes = !actions.is_empty();
        Self {
            cluster_id: cluster_id.into(),
            actions,
            has_changes,
        }
    }

    /// Get actions by type
    pub fn actions_by_type(&self, action_type: ActionType) -> Vec<&Action> {
        self.actions
            .iter()
            .filter(|a| a.action_type == action_type)
            .collect()
    }

    /// Summary of the plan
    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            create: self.actions_by_type(ActionType::Create).len(),
            update: self.actions_by_type(ActionType::Update).len(),
            delete: self.actions_by_type(ActionType::Delete).len(),
        }
    }
}

/// Summary of planned actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSummary {
    pub create: usize,
    pub update: usize,
    pub delete: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to create, {} to update, {} to delete",
            self.create, self.update, self.delete
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_id() {
        let action = Action::new(ActionType::Create, EntityKind::Database, "app", "create db");
        assert_eq!(action.id, "create-database-app");
    }

    #[test]
    fn test_payload_roundtrip() {
        let action = Action::new(ActionType::Delete, EntityKind::User, "bob", "")
            .with_payload(&serde_json::json!({ "user_name": "bob" }))
            .unwrap();

        let payload: serde_json::Value = action.payload_as().unwrap();
        assert_eq!(payload["user_name"], "bob");
    }

    #[test]
    fn test_missing_payload() {
        let action = Action::new(ActionType::Delete, EntityKind::User, "bob", "");
        let result = action.payload_as::<serde_json::Value>();
        assert!(matches!(result, Err(CloudError::InvalidPayload { .. })));
    }

    #[test]
    fn test_plan_summary() {
        let plan = Plan::new(
            "c1",
            vec![
                Action::new(ActionType::Create, EntityKind::User, "alice", ""),
                Action::new(ActionType::Create, EntityKind::Database, "app", ""),
                Action::new(ActionType::Delete, EntityKind::Host, "h1", ""),
            ],
        );

        assert!(plan.has_changes);
        assert_eq!(plan.actions_by_type(ActionType::Create).len(), 2);
        assert_eq!(
            plan.summary().to_string(),
            "2 to create, 0 to update, 1 to delete"
        );
    }

    #[test]
    fn test_plan_without_actions_has_no_changes() {
        let plan = Plan::new("c1", Vec::new());
        assert!(!plan.has_changes);
        assert_eq!(plan.summary().create, 0);
    }
}
