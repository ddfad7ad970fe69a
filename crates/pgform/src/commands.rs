pub mod apply;
pub mod plan;
pub mod show;
pub mod status;
pub mod validate;

use anyhow::Context;
use colored::Colorize;
use pgform_cloud::{ActionType, Plan};
use pgform_config::CliSettings;
use pgform_core::ClusterResource;
use pgform_mdb::{FileBackend, MdbPostgresqlProvider};
use std::path::{Path, PathBuf};

/// 全コマンド共通のオプション
pub struct Options {
    pub file: Option<PathBuf>,
    pub cluster: Option<String>,
    pub backend: Option<PathBuf>,
    pub state_dir: Option<PathBuf>,
}

/// バックエンドと状態ファイルの場所
#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    pub state_dir: PathBuf,
    pub backend: PathBuf,
}

impl Options {
    pub fn cluster_file(&self) -> anyhow::Result<PathBuf> {
        match &self.file {
            Some(path) => Ok(path.clone()),
            None => pgform_config::find_cluster_file().context("宣言ファイルの検出に失敗しました"),
        }
    }

    /// 優先順位: コマンドライン > settings.yaml > 宣言ファイルのディレクトリ
    pub fn workspace(&self, cluster_file: Option<&Path>) -> anyhow::Result<Workspace> {
        let settings = CliSettings::load().context("CLI 設定の読み込みに失敗しました")?;
        Ok(resolve_workspace(self, &settings, cluster_file))
    }

    /// 宣言ファイルを読み込んで対象クラスターを選ぶ
    pub fn load_desired(&self) -> anyhow::Result<(ClusterResource, PathBuf)> {
        let file = self.cluster_file()?;
        let cluster = pgform_core::load_cluster(&file, self.cluster.as_deref())
            .with_context(|| format!("{} の読み込みに失敗しました", file.display()))?;
        Ok((cluster, file))
    }
}

fn resolve_workspace(
    options: &Options,
    settings: &CliSettings,
    cluster_file: Option<&Path>,
) -> Workspace {
    let state_dir = options
        .state_dir
        .clone()
        .or_else(|| settings.state_dir.clone())
        .unwrap_or_else(|| project_root(cluster_file));

    let backend = options
        .backend
        .clone()
        .or_else(|| settings.backend.clone())
        .unwrap_or_else(|| state_dir.join(".pgform").join("backend.json"));

    Workspace { state_dir, backend }
}

/// 宣言ファイルのあるディレクトリ（.pgform/ 内ならその親）
fn project_root(cluster_file: Option<&Path>) -> PathBuf {
    let dir = cluster_file
        .and_then(Path::parent)
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    if dir.file_name().is_some_and(|name| name == ".pgform") {
        dir.parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf()
    } else {
        dir.to_path_buf()
    }
}

pub async fn open_provider(
    workspace: &Workspace,
    cluster_name: &str,
) -> anyhow::Result<MdbPostgresqlProvider<FileBackend>> {
    tracing::debug!("Using backend {}", workspace.backend.display());
    let backend = FileBackend::open(&workspace.backend)
        .await
        .with_context(|| {
            format!(
                "バックエンド {} を開けませんでした",
                workspace.backend.display()
            )
        })?;
    Ok(MdbPostgresqlProvider::new(backend, cluster_name))
}

pub fn print_plan(plan: &Plan) {
    println!();
    if !plan.has_changes {
        println!(
            "{}",
            format!("クラスター {} に変更はありません", plan.cluster_id).green()
        );
        return;
    }

    println!("クラスター {} の変更:", plan.cluster_id.cyan());
    for action in &plan.actions {
        let line = format!("  {} {}", action.action_type.symbol(), action.description);
        let line = match action.action_type {
            ActionType::Create => line.green(),
            ActionType::Update => line.yellow(),
            ActionType::Delete => line.red(),
        };
        println!("{}", line);
    }
    println!();
    println!("{}", plan.summary().to_string().bold());
}
