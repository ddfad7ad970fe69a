use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const MAIN_CLUSTER: &str = r#"
cluster "main" {
    network_id "net-1"
    config {
        version "12"
        resources {
            resource_preset_id "s2.micro"
            disk_size 10
            disk_type_id "network-ssd"
        }
    }
    database "app" {
        owner "alice"
    }
    host {
        zone "zone-a"
    }
    host {
        zone "zone-b"
    }
    user "alice" {
        password "secret123"
        permission "app"
    }
}
"#;

pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    pub fn write_cluster_kdl(&self, content: &str) {
        fs::write(self.cluster_file(), content).unwrap();
    }

    pub fn cluster_file(&self) -> PathBuf {
        self.root.path().join("pgform.kdl")
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn backend_file(&self) -> PathBuf {
        self.root.path().join(".pgform").join("backend.json")
    }

    pub fn state_file(&self) -> PathBuf {
        self.root.path().join(".pgform").join("state.json")
    }
}
