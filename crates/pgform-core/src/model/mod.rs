//! モデル定義
//!
//! pgform で使用されるデータモデルを定義します。
//! 各モデルはリソースごとにモジュールに分離されています。

mod cluster;
mod config;
mod database;
pub mod enums;
mod host;
mod settings;
mod user;
pub mod version;

// Re-exports
pub use cluster::*;
pub use config::*;
pub use database::*;
pub use enums::{
    EnumNames, Environment, HumanNames, LogStatement, PlanCacheMode, PoolingMode,
    SharedPreloadLibrary, SynchronousCommit, TransactionIsolation, WalLevel,
};
pub use host::*;
pub use settings::*;
pub use user::*;
pub use version::PostgresVersion;
