use super::{Options, Workspace, open_provider, print_plan};
use anyhow::Context;
use colored::Colorize;
use pgform_cloud::{ClusterProvider, StateManager};
use pgform_core::ClusterResource;

pub async fn handle(options: &Options, yes: bool) -> anyhow::Result<()> {
    let (desired, file) = options.load_desired()?;
    let workspace = options.workspace(Some(&file))?;

    let manager = StateManager::new(&workspace.state_dir);
    let lock = manager
        .acquire_lock(&desired.name)
        .await
        .context("状態ファイルのロックに失敗しました")?;

    let result = apply_locked(&manager, &desired, &workspace, yes).await;
    lock.release().await?;
    result
}

async fn apply_locked(
    manager: &StateManager,
    desired: &ClusterResource,
    workspace: &Workspace,
    yes: bool,
) -> anyhow::Result<()> {
    let mut state = manager.load().await?;
    let previous: Option<ClusterResource> = state.previous_declaration(&desired.name)?;

    let provider = open_provider(workspace, &desired.name).await?;
    let plan = provider.plan(desired, previous.as_ref()).await?;
    print_plan(&plan);

    if !plan.has_changes {
        return Ok(());
    }

    // 確認（--yesが指定されていない場合）
    if !yes {
        println!();
        println!("{}", "警告: クラスターに上記の変更を加えます。".yellow());
        println!("実行するには --yes オプションを指定してください");
        return Ok(());
    }

    println!();
    println!("{}", "適用中...".blue());
    let result = provider.apply(&plan).await?;

    for action in &result.succeeded {
        println!("  {} {}", "✓".green(), action.message);
    }
    for action in &result.failed {
        eprintln!(
            "  {} {}: {}",
            "✗".red(),
            action.action_id,
            action.error.as_deref().unwrap_or_default()
        );
    }
    for id in &result.skipped {
        eprintln!("  {} {} (スキップ)", "-".dimmed(), id);
    }

    if !result.is_success() {
        tracing::warn!(
            "Apply aborted after {} of {} actions",
            result.succeeded.len(),
            plan.actions.len()
        );
        anyhow::bail!(
            "適用に失敗しました（成功 {}件、失敗 {}件、スキップ {}件）",
            result.succeeded.len(),
            result.failed.len(),
            result.skipped.len()
        );
    }

    let applied = provider.read_declared(desired).await?;
    state.record_applied(&desired.name, &applied)?;
    manager.save(&state).await?;

    println!();
    println!(
        "{}",
        format!(
            "✓ 適用が完了しました ({}件, {}ms)",
            result.succeeded.len(),
            result.duration_ms
        )
        .green()
        .bold()
    );
    Ok(())
}
