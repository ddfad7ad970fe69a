//! Managed PostgreSQL provider for pgform
//!
//! This crate implements the `ClusterProvider` trait for managed PostgreSQL
//! clusters: it expands declarations into API requests, flattens API
//! responses back into declarations, and plans/applies the changes between
//! them.
//!
//! # Features
//!
//! - Cluster configuration updates with field masks
//! - Database, user and host reconciliation
//! - A file-backed API implementation for local use
//!
//! # Example
//!
//! ```ignore
//! use pgform_cloud::ClusterProvider;
//! use pgform_mdb::{FileBackend, MdbPostgresqlProvider};
//!
//! let backend = FileBackend::open(".pgform/backend.json").await?;
//! let provider = MdbPostgresqlProvider::new(backend, "main");
//!
//! let plan = provider.plan(&cluster, None).await?;
//! let result = provider.apply(&plan).await?;
//! ```

pub mod api;
pub mod backend;
mod entity;
pub mod error;
pub mod expand;
pub mod flatten;
pub mod proto;
pub mod provider;

pub use api::PostgresqlApi;
pub use backend::FileBackend;
pub use error::{MdbError, Result};
pub use expand::PostgresqlHostSpec;
pub use provider::MdbPostgresqlProvider;
