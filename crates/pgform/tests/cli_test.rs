#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! へ移行

mod common;

use assert_cmd::Command;
use common::{MAIN_CLUSTER, TestProject};
use predicates::prelude::*;

/// テスト用プロジェクトで pgform を実行するコマンド
fn pgform(project: &TestProject) -> Command {
    let mut cmd = Command::cargo_bin("pgform").unwrap();
    cmd.current_dir(project.path())
        .env("XDG_CONFIG_HOME", project.path().join("config"))
        .env("HOME", project.path())
        .env("NO_COLOR", "1")
        .env_remove("PGFORM_CONFIG_PATH")
        .env_remove("PGFORM_BACKEND")
        .env_remove("PGFORM_STATE_DIR")
        .env_remove("RUST_LOG");
    cmd
}

/// CLIヘルプが正しく表示されることを確認
#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("pgform").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("PostgreSQL"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("apply"))
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("status"));
}

/// バージョン表示が正しく動作することを確認
#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("pgform").unwrap();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pgform"));
}

#[test]
fn test_apply_help() {
    let mut cmd = Command::cargo_bin("pgform").unwrap();
    cmd.args(["apply", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--yes"))
        .stdout(predicate::str::contains("--backend"));
}

#[test]
fn test_validate_summary() {
    let project = TestProject::new();
    project.write_cluster_kdl(MAIN_CLUSTER);

    pgform(&project)
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("宣言ファイルは正常です"))
        .stdout(predicate::str::contains("main"))
        .stdout(predicate::str::contains("ホスト: 2台"));
}

#[test]
fn test_validate_rejects_unknown_owner() {
    let project = TestProject::new();
    project.write_cluster_kdl(&MAIN_CLUSTER.replace(r#"owner "alice""#, r#"owner "bob""#));

    pgform(&project)
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("宣言エラー"));
}

#[test]
fn test_validate_without_file() {
    let project = TestProject::new();

    pgform(&project).arg("validate").assert().failure();
}

#[test]
fn test_plan_new_cluster() {
    let project = TestProject::new();
    project.write_cluster_kdl(MAIN_CLUSTER);

    pgform(&project)
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("+ Create cluster main"))
        .stdout(predicate::str::contains("1 to create"));
}

#[test]
fn test_plan_writes_json() {
    let project = TestProject::new();
    project.write_cluster_kdl(MAIN_CLUSTER);
    let out = project.path().join("plan.json");

    pgform(&project)
        .args(["plan", "--out"])
        .arg(&out)
        .assert()
        .success();

    let plan: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(plan["cluster_id"], "main");
    assert_eq!(plan["actions"][0]["kind"], "cluster");
}

#[test]
fn test_apply_requires_yes() {
    let project = TestProject::new();
    project.write_cluster_kdl(MAIN_CLUSTER);

    pgform(&project)
        .arg("apply")
        .assert()
        .success()
        .stdout(predicate::str::contains("--yes"));

    assert!(!project.backend_file().exists());
    assert!(!project.state_file().exists());
}

#[test]
fn test_apply_then_plan_is_clean() {
    let project = TestProject::new();
    project.write_cluster_kdl(MAIN_CLUSTER);

    pgform(&project)
        .args(["apply", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("適用が完了しました"));

    assert!(project.backend_file().exists());
    assert!(project.state_file().exists());

    pgform(&project)
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("変更はありません"));
}

#[test]
fn test_apply_incremental_changes() {
    let project = TestProject::new();
    project.write_cluster_kdl(MAIN_CLUSTER);
    pgform(&project).args(["apply", "--yes"]).assert().success();

    let changed = MAIN_CLUSTER
        .replace(
            r#"    user "alice" {"#,
            r#"    database "analytics" {
        owner "alice"
    }
    user "alice" {"#,
        )
        .replace(
            r#"    host {
        zone "zone-b"
    }
"#,
            "",
        );
    project.write_cluster_kdl(&changed);

    pgform(&project)
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("+ Create database analytics"))
        .stdout(predicate::str::contains("- Delete host(s) zone-b-2.main.mdb.internal"));

    pgform(&project).args(["apply", "--yes"]).assert().success();

    pgform(&project)
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("analytics"))
        .stdout(predicate::str::contains("zone-a-1.main.mdb.internal"))
        .stdout(predicate::str::contains("zone-b-2").not());
}

#[test]
fn test_password_rotation_uses_applied_state() {
    let project = TestProject::new();
    project.write_cluster_kdl(MAIN_CLUSTER);
    pgform(&project).args(["apply", "--yes"]).assert().success();

    project.write_cluster_kdl(&MAIN_CLUSTER.replace("secret123", "rotated456"));

    pgform(&project)
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("~ Update user alice (password)"));
}

#[test]
fn test_show_missing_cluster() {
    let project = TestProject::new();
    project.write_cluster_kdl(MAIN_CLUSTER);

    pgform(&project).arg("show").assert().failure();
}

#[test]
fn test_show_with_explicit_backend() {
    let project = TestProject::new();
    project.write_cluster_kdl(MAIN_CLUSTER);
    let backend = project.path().join("shared-backend.json");

    pgform(&project)
        .args(["apply", "--yes", "--backend"])
        .arg(&backend)
        .assert()
        .success();
    assert!(backend.exists());
    assert!(!project.backend_file().exists());

    pgform(&project)
        .args(["show", "--cluster", "main"])
        .env("PGFORM_BACKEND", &backend)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"main\""));
}

#[test]
fn test_status_lists_observed_resources() {
    let project = TestProject::new();
    project.write_cluster_kdl(MAIN_CLUSTER);
    pgform(&project).args(["apply", "--yes"]).assert().success();

    pgform(&project)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("zone-a-1.main.mdb.internal"))
        .stdout(predicate::str::contains("master"))
        .stdout(predicate::str::contains("owner: alice"))
        .stdout(predicate::str::contains("permissions: app"));
}

#[test]
fn test_status_before_apply() {
    let project = TestProject::new();
    project.write_cluster_kdl(MAIN_CLUSTER);

    pgform(&project)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("存在しません"));
}
