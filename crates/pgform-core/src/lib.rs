//! pgform-core
//!
//! マネージド PostgreSQL クラスターの宣言モデルと KDL パーサー。
//!
//! ```kdl
//! cluster "main" {
//!     network_id "net-1"
//!     config {
//!         version "12"
//!         resources {
//!             resource_preset_id "s2.micro"
//!             disk_size 10
//!         }
//!     }
//!     database "app" {
//!         owner "alice"
//!     }
//!     host {
//!         zone "zone-a"
//!     }
//!     user "alice" {
//!         password "secret123"
//!         permission "app"
//!     }
//! }
//! ```

pub mod error;
pub mod loader;
pub mod model;
pub mod parser;

pub use error::{Result, SpecError};
pub use loader::{load_cluster, load_clusters};
pub use model::*;
pub use parser::{parse_kdl_file, parse_kdl_string};
