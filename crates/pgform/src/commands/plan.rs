use super::{Options, open_provider, print_plan};
use anyhow::Context;
use colored::Colorize;
use pgform_cloud::{ClusterProvider, StateManager};
use pgform_core::ClusterResource;
use std::path::PathBuf;

pub async fn handle(options: &Options, out: Option<PathBuf>) -> anyhow::Result<()> {
    let (desired, file) = options.load_desired()?;
    let workspace = options.workspace(Some(&file))?;

    let state = StateManager::new(&workspace.state_dir)
        .load()
        .await
        .context("状態ファイルの読み込みに失敗しました")?;
    let previous: Option<ClusterResource> = state.previous_declaration(&desired.name)?;

    let provider = open_provider(&workspace, &desired.name).await?;
    let plan = provider.plan(&desired, previous.as_ref()).await?;
    print_plan(&plan);

    if let Some(path) = out {
        let content = serde_json::to_string_pretty(&plan)?;
        std::fs::write(&path, content)
            .with_context(|| format!("{} への書き込みに失敗しました", path.display()))?;
        println!();
        println!("プランを {} に保存しました", path.display().to_string().cyan());
    }

    Ok(())
}
