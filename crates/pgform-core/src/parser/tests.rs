use super::*;
use crate::model::{
    Environment, PoolingMode, PostgresVersion, SharedPreloadLibrary, TransactionIsolation,
    WalLevel,
};

const FULL_CLUSTER: &str = r#"
    cluster "main" {
        description "primary database"
        environment "PRESTABLE"
        network_id "net-1"
        labels {
            team "payments"
        }
        config {
            version "12"
            autofailover #true
            pooler_config {
                pooling_mode "TRANSACTION"
                pool_discard #false
            }
            resources {
                resource_preset_id "s2.micro"
                disk_size 10
                disk_type_id "network-ssd"
            }
            backup_window_start hours=3 minutes=30
            performance_diagnostics {
                enabled #true
                sessions_sampling_interval 60
                statements_sampling_interval 600
            }
            access {
                data_lens #true
                web_sql #false
            }
            postgresql_config {
                max_connections 395
                enable_seqscan #false
                random_page_cost 1.5
                wal_level "WAL_LEVEL_LOGICAL"
                shared_preload_libraries "SHARED_PRELOAD_LIBRARIES_AUTO_EXPLAIN,SHARED_PRELOAD_LIBRARIES_PG_HINT_PLAN"
            }
        }
        database "app" {
            owner "alice"
            lc_collate "en_US.UTF-8"
            extension "uuid-ossp"
            extension "postgis" version="3.0"
        }
        host {
            zone "zone-a"
            subnet_id "subnet-a"
            assign_public_ip #true
        }
        host {
            zone "zone-b"
            fqdn "zone-b-1.main.mdb.internal"
        }
        user "alice" {
            password "secret123"
            login #true
            conn_limit 20
            permission "app"
            grants "mdb_admin" "mdb_replication"
            settings {
                default_transaction_isolation "read committed"
                lock_timeout 1000
            }
        }
    }
"#;

#[test]
fn test_parse_full_cluster() {
    let clusters = parse_kdl_string(FULL_CLUSTER).unwrap();
    assert_eq!(clusters.len(), 1);

    let cluster = &clusters[0];
    assert_eq!(cluster.name, "main");
    assert_eq!(cluster.description.as_deref(), Some("primary database"));
    assert_eq!(cluster.environment, Environment::Prestable);
    assert_eq!(cluster.network_id, "net-1");
    assert_eq!(cluster.labels["team"], "payments");
    assert!(cluster.validate().is_ok());
}

#[test]
fn test_parse_config_block() {
    let clusters = parse_kdl_string(FULL_CLUSTER).unwrap();
    let config = &clusters[0].config;

    assert_eq!(config.version, PostgresVersion::V12);
    assert_eq!(config.autofailover, Some(true));

    let pooler = config.pooler_config.as_ref().unwrap();
    assert_eq!(pooler.pooling_mode, Some(PoolingMode::Transaction));
    assert_eq!(pooler.pool_discard, Some(false));

    assert_eq!(config.resources.resource_preset_id, "s2.micro");
    assert_eq!(config.resources.disk_size, 10);
    assert_eq!(config.resources.disk_type_id, "network-ssd");

    let window = config.backup_window_start.unwrap();
    assert_eq!((window.hours, window.minutes), (3, 30));

    let diagnostics = config.performance_diagnostics.as_ref().unwrap();
    assert!(diagnostics.enabled);
    assert_eq!(diagnostics.statements_sampling_interval, 600);

    let access = config.access.as_ref().unwrap();
    assert!(access.data_lens);
    assert!(!access.web_sql);
}

#[test]
fn test_parse_postgresql_config_scalars() {
    let clusters = parse_kdl_string(FULL_CLUSTER).unwrap();
    let settings = clusters[0].config.postgresql_config.as_ref().unwrap();

    assert_eq!(settings.max_connections, Some(395));
    assert_eq!(settings.enable_seqscan, Some(false));
    assert_eq!(settings.random_page_cost, Some(1.5));
    assert_eq!(settings.wal_level, Some(WalLevel::Logical));
    assert_eq!(
        settings.shared_preload_libraries,
        vec![
            SharedPreloadLibrary::AutoExplain,
            SharedPreloadLibrary::PgHintPlan
        ]
    );
}

#[test]
fn test_parse_database_block() {
    let clusters = parse_kdl_string(FULL_CLUSTER).unwrap();
    let database = &clusters[0].databases[0];

    assert_eq!(database.name, "app");
    assert_eq!(database.owner, "alice");
    assert_eq!(database.lc_collate.as_deref(), Some("en_US.UTF-8"));
    assert!(database.lc_type.is_none());
    assert_eq!(database.extensions.len(), 2);
    assert!(
        database
            .extensions
            .iter()
            .any(|e| e.name == "postgis" && e.version.as_deref() == Some("3.0"))
    );
}

#[test]
fn test_parse_host_blocks() {
    let clusters = parse_kdl_string(FULL_CLUSTER).unwrap();
    let hosts = &clusters[0].hosts;

    assert_eq!(hosts.len(), 2);
    assert_eq!(hosts[0].zone, "zone-a");
    assert_eq!(hosts[0].subnet_id.as_deref(), Some("subnet-a"));
    assert!(hosts[0].assign_public_ip);
    assert!(!hosts[0].has_known_fqdn());
    assert!(hosts[1].has_known_fqdn());
}

#[test]
fn test_parse_user_block() {
    let clusters = parse_kdl_string(FULL_CLUSTER).unwrap();
    let user = &clusters[0].users[0];

    assert_eq!(user.name, "alice");
    assert_eq!(user.password, "secret123");
    assert_eq!(user.login, Some(true));
    assert_eq!(user.conn_limit, Some(20));
    assert!(user.permissions.contains("app"));
    assert_eq!(user.grants, vec!["mdb_admin", "mdb_replication"]);

    let settings = user.settings.as_ref().unwrap();
    assert_eq!(
        settings.default_transaction_isolation,
        Some(TransactionIsolation::ReadCommitted)
    );
    assert_eq!(settings.lock_timeout, Some(1000));
}

#[test]
fn test_version_defaults_to_12() {
    let kdl = r#"
        cluster "small" {
            network_id "net-1"
            config {
                resources {
                    resource_preset_id "s2.micro"
                    disk_size 10
                }
            }
        }
    "#;

    let clusters = parse_kdl_string(kdl).unwrap();
    assert_eq!(clusters[0].config.version, PostgresVersion::V12);
}

#[test]
fn test_integer_version_accepted() {
    let kdl = r#"
        cluster "small" {
            config {
                version 11
            }
        }
    "#;

    let clusters = parse_kdl_string(kdl).unwrap();
    assert_eq!(clusters[0].config.version, PostgresVersion::V11);
}

#[test]
fn test_unknown_version_rejected() {
    let kdl = r#"
        cluster "small" {
            config {
                version "9.6"
            }
        }
    "#;

    assert!(matches!(
        parse_kdl_string(kdl),
        Err(SpecError::UnknownEnumValue { field: "version", .. })
    ));
}

#[test]
fn test_duplicate_cluster_rejected() {
    let kdl = r#"
        cluster "main" {}
        cluster "main" {}
    "#;

    match parse_kdl_string(kdl) {
        Err(SpecError::Duplicate { kind, name }) => {
            assert_eq!(kind, "cluster");
            assert_eq!(name, "main");
        }
        other => panic!("Expected Duplicate, got {:?}", other),
    }
}

#[test]
fn test_unknown_pooling_mode_lists_choices() {
    let kdl = r#"
        cluster "main" {
            config {
                pooler_config {
                    pooling_mode "BATCH"
                }
            }
        }
    "#;

    let err = parse_kdl_string(kdl).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("SESSION, STATEMENT, TRANSACTION"), "{message}");
}

#[test]
fn test_unknown_postgresql_setting_rejected() {
    let kdl = r#"
        cluster "main" {
            config {
                postgresql_config {
                    fsync #false
                }
            }
        }
    "#;

    assert!(matches!(
        parse_kdl_string(kdl),
        Err(SpecError::UnknownSetting(_))
    ));
}

#[test]
fn test_backup_window_out_of_range() {
    let kdl = r#"
        cluster "main" {
            config {
                backup_window_start hours=24
            }
        }
    "#;

    assert!(parse_kdl_string(kdl).is_err());
}

#[test]
fn test_database_requires_owner() {
    let kdl = r#"
        cluster "main" {
            database "app" {}
        }
    "#;

    assert!(matches!(
        parse_kdl_string(kdl),
        Err(SpecError::InvalidConfig(_))
    ));
}

#[test]
fn test_unknown_nodes_are_skipped() {
    let kdl = r#"
        project "legacy"
        cluster "main" {
            network_id "net-1"
            comment "ignored"
        }
    "#;

    let clusters = parse_kdl_string(kdl).unwrap();
    assert_eq!(clusters.len(), 1);
}

#[test]
fn test_parse_kdl_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pgform.kdl");
    std::fs::write(&path, FULL_CLUSTER).unwrap();

    let clusters = parse_kdl_file(&path).unwrap();
    assert_eq!(clusters[0].name, "main");
}

#[test]
fn test_parse_missing_file() {
    let result = parse_kdl_file("/nonexistent/pgform.kdl");
    assert!(matches!(result, Err(SpecError::IoError { .. })));
}
