//! 統合ローダー
//!
//! パースと検証をまとめて、操作対象のクラスターを1つ選び出す

use crate::error::{Result, SpecError};
use crate::model::ClusterResource;
use crate::parser::parse_kdl_file;
use std::path::Path;
use tracing::{debug, info, instrument};

/// ファイル内の全クラスターをロードして検証
#[instrument(fields(path = %path.display()))]
pub fn load_clusters(path: &Path) -> Result<Vec<ClusterResource>> {
    let clusters = parse_kdl_file(path)?;
    for cluster in &clusters {
        debug!(cluster = %cluster.name, "Validating cluster");
        cluster.validate()?;
    }
    info!(count = clusters.len(), "Clusters loaded");
    Ok(clusters)
}

/// 名前を指定してクラスターをロード
///
/// 名前が省略された場合、ファイル内にクラスターが1つだけであればそれを返します。
#[instrument(fields(path = %path.display()))]
pub fn load_cluster(path: &Path, name: Option<&str>) -> Result<ClusterResource> {
    let clusters = load_clusters(path)?;
    select_cluster(clusters, name)
}

fn select_cluster(clusters: Vec<ClusterResource>, name: Option<&str>) -> Result<ClusterResource> {
    match name {
        Some(name) => clusters
            .into_iter()
            .find(|c| c.name == name)
            .ok_or_else(|| SpecError::ClusterNotFound(name.to_string())),
        None => {
            if clusters.len() > 1 {
                let names: Vec<&str> = clusters.iter().map(|c| c.name.as_str()).collect();
                return Err(SpecError::AmbiguousCluster(names.join(", ")));
            }
            clusters
                .into_iter()
                .next()
                .ok_or_else(|| SpecError::ClusterNotFound("(none declared)".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const TWO_CLUSTERS: &str = r#"
        cluster "main" {
            network_id "net-1"
            config {
                resources {
                    resource_preset_id "s2.micro"
                    disk_size 10
                }
            }
            host {
                zone "zone-a"
            }
        }
        cluster "analytics" {
            network_id "net-2"
            config {
                resources {
                    resource_preset_id "s2.medium"
                    disk_size 100
                }
            }
            host {
                zone "zone-b"
            }
        }
    "#;

    fn write(content: &str) -> (TempDir, std::path::PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pgform.kdl");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_cluster_by_name() {
        let (_dir, path) = write(TWO_CLUSTERS);

        let cluster = load_cluster(&path, Some("analytics")).unwrap();
        assert_eq!(cluster.network_id, "net-2");
        assert_eq!(cluster.config.resources.disk_size, 100);
    }

    #[test]
    fn test_load_cluster_requires_name_when_ambiguous() {
        let (_dir, path) = write(TWO_CLUSTERS);

        match load_cluster(&path, None) {
            Err(SpecError::AmbiguousCluster(names)) => assert_eq!(names, "main, analytics"),
            other => panic!("Expected AmbiguousCluster, got {:?}", other),
        }
    }

    #[test]
    fn test_load_single_cluster_without_name() {
        let (_dir, path) = write(
            r#"
            cluster "only" {
                network_id "net-1"
                host {
                    zone "zone-a"
                }
            }
            "#,
        );

        let cluster = load_cluster(&path, None).unwrap();
        assert_eq!(cluster.name, "only");
    }

    #[test]
    fn test_load_unknown_cluster() {
        let (_dir, path) = write(TWO_CLUSTERS);

        assert!(matches!(
            load_cluster(&path, Some("missing")),
            Err(SpecError::ClusterNotFound(_))
        ));
    }

    #[test]
    fn test_load_validates_declaration() {
        let (_dir, path) = write(
            r#"
            cluster "broken" {
                network_id "net-1"
                host {
                    zone "zone-a"
                }
                database "app" {
                    owner "nobody"
                }
            }
            "#,
        );

        assert!(matches!(
            load_cluster(&path, None),
            Err(SpecError::InvalidConfig(_))
        ));
    }
}
