//! Managed PostgreSQL API abstraction

use crate::error::Result;
use crate::proto::{
    AddClusterHostsRequest, Cluster, CreateClusterRequest, CreateDatabaseRequest,
    CreateUserRequest, Database, DeleteClusterHostsRequest, DeleteDatabaseRequest,
    DeleteUserRequest, Host, UpdateClusterRequest, UpdateDatabaseRequest, UpdateUserRequest, User,
};
use async_trait::async_trait;

/// Operations of the managed PostgreSQL cluster API used by the provider
///
/// Every call is addressed by cluster name; unknown clusters fail with
/// [`MdbError::ClusterNotFound`](crate::MdbError::ClusterNotFound).
#[async_trait]
pub trait PostgresqlApi: Send + Sync {
    async fn get_cluster(&self, cluster_id: &str) -> Result<Cluster>;

    async fn create_cluster(&self, request: CreateClusterRequest) -> Result<Cluster>;

    async fn update_cluster(&self, request: UpdateClusterRequest) -> Result<Cluster>;

    async fn list_databases(&self, cluster_id: &str) -> Result<Vec<Database>>;

    async fn create_database(&self, request: CreateDatabaseRequest) -> Result<Database>;

    async fn update_database(&self, request: UpdateDatabaseRequest) -> Result<Database>;

    async fn delete_database(&self, request: DeleteDatabaseRequest) -> Result<()>;

    async fn list_hosts(&self, cluster_id: &str) -> Result<Vec<Host>>;

    async fn add_hosts(&self, request: AddClusterHostsRequest) -> Result<Vec<Host>>;

    async fn delete_hosts(&self, request: DeleteClusterHostsRequest) -> Result<()>;

    async fn list_users(&self, cluster_id: &str) -> Result<Vec<User>>;

    async fn create_user(&self, request: CreateUserRequest) -> Result<User>;

    async fn update_user(&self, request: UpdateUserRequest) -> Result<User>;

    async fn delete_user(&self, request: DeleteUserRequest) -> Result<()>;
}
