//! Desired/observed reconciliation for named child resources
//!
//! Every child resource of a cluster (databases, hosts, users) is reconciled
//! the same way: observed names that are no longer declared are deleted,
//! declared entities that were never observed are created. Entities present
//! on both sides are left to the caller, which decides whether an in-place
//! update is needed (see [`changed_entities`]).

use crate::error::{CloudError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Kind of resource handled by a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// The cluster itself (configuration blocks)
    Cluster,
    Database,
    Host,
    User,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Cluster => write!(f, "cluster"),
            EntityKind::Database => write!(f, "database"),
            EntityKind::Host => write!(f, "host"),
            EntityKind::User => write!(f, "user"),
        }
    }
}

/// An entity as currently reported by the remote API
pub trait ObservedEntity {
    /// Name key, unique within the parent collection
    fn name(&self) -> &str;
}

/// An entity as declared by the caller
pub trait DesiredEntity {
    const KIND: EntityKind;

    /// Name key. Entities without a known identity may still carry the name
    /// they are expected to get.
    fn name(&self) -> &str;

    /// Whether this entity can be matched against observed state.
    ///
    /// Hosts only acquire their identity (FQDN) once the server creates them;
    /// until then every declared host is a creation candidate.
    fn has_known_identity(&self) -> bool {
        true
    }
}

/// Result of [`compute_additions_and_removals`]
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation<D> {
    /// Observed names that are no longer declared
    pub to_delete: BTreeSet<String>,

    /// Declared entities to create, in declaration order
    pub to_add: Vec<D>,
}

impl<D> Reconciliation<D> {
    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty() && self.to_add.is_empty()
    }
}

/// Compute which observed names to delete and which declared specs to create
pub fn compute_additions_and_removals<O, D>(
    observed: &[O],
    desired: &[D],
) -> Result<Reconciliation<D>>
where
    O: ObservedEntity,
    D: DesiredEntity + Clone,
{
    let kind = D::KIND;

    // name -> still a deletion candidate
    let mut candidates: HashMap<&str, bool> = HashMap::with_capacity(observed.len());
    for entity in observed {
        if candidates.insert(entity.name(), true).is_some() {
            return Err(CloudError::DuplicateKey {
                kind,
                name: entity.name().to_string(),
            });
        }
    }
    ensure_unique_names(desired)?;

    let mut to_add = Vec::new();
    for entity in desired {
        let name = entity.name();
        let was_observed = match candidates.get_mut(name) {
            Some(marked) if !name.is_empty() => {
                *marked = false;
                true
            }
            _ => false,
        };

        if !entity.has_known_identity() {
            tracing::debug!(%kind, name, "no known identity, scheduling creation");
            to_add.push(entity.clone());
        } else if !was_observed {
            tracing::debug!(%kind, name, "not observed, scheduling creation");
            to_add.push(entity.clone());
        }
    }

    let to_delete: BTreeSet<String> = candidates
        .into_iter()
        .filter(|(_, marked)| *marked)
        .map(|(name, _)| name.to_string())
        .collect();

    for name in &to_delete {
        tracing::debug!(%kind, name = name.as_str(), "no longer declared, scheduling deletion");
    }

    Ok(Reconciliation { to_delete, to_add })
}

/// Entities of `new_specs` whose attributes differ from the spec of the same
/// name in `old_specs`
///
/// Names that only exist in `new_specs` are creations and are not reported.
/// Entities without a known identity cannot be paired and are skipped.
pub fn changed_entities<D>(old_specs: &[D], new_specs: &[D]) -> Result<Vec<D>>
where
    D: DesiredEntity + PartialEq + Clone,
{
    ensure_unique_names(old_specs)?;
    ensure_unique_names(new_specs)?;

    let previous: HashMap<&str, &D> = old_specs
        .iter()
        .filter(|spec| spec.has_known_identity())
        .map(|spec| (spec.name(), spec))
        .collect();

    Ok(new_specs
        .iter()
        .filter(|spec| spec.has_known_identity())
        .filter(|spec| {
            previous
                .get(spec.name())
                .is_some_and(|old| *old != *spec)
        })
        .cloned()
        .collect())
}

/// Fail with [`CloudError::DuplicateKey`] if two identified entities share a name
pub fn ensure_unique_names<D: DesiredEntity>(specs: &[D]) -> Result<()> {
    let mut seen = HashSet::with_capacity(specs.len());
    for spec in specs.iter().filter(|s| s.has_known_identity()) {
        if !seen.insert(spec.name()) {
            return Err(CloudError::DuplicateKey {
                kind: D::KIND,
                name: spec.name().to_string(),
            });
        }
    }
    Ok(())
}
