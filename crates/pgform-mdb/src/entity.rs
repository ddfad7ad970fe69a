//! Reconciler keys for the API messages

use crate::expand::PostgresqlHostSpec;
use crate::proto::{Database, DatabaseSpec, Host, User, UserSpec};
use pgform_cloud::{DesiredEntity, EntityKind, ObservedEntity};

impl ObservedEntity for Database {
    fn name(&self) -> &str {
        &self.name
    }
}

impl ObservedEntity for User {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Hosts are keyed by FQDN
impl ObservedEntity for Host {
    fn name(&self) -> &str {
        &self.name
    }
}

impl DesiredEntity for DatabaseSpec {
    const KIND: EntityKind = EntityKind::Database;

    fn name(&self) -> &str {
        &self.name
    }
}

impl DesiredEntity for UserSpec {
    const KIND: EntityKind = EntityKind::User;

    fn name(&self) -> &str {
        &self.name
    }
}

impl DesiredEntity for PostgresqlHostSpec {
    const KIND: EntityKind = EntityKind::Host;

    fn name(&self) -> &str {
        &self.fqdn
    }

    fn has_known_identity(&self) -> bool {
        self.has_computed_fqdn
    }
}
