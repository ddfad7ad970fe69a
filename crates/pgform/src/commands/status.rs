use super::{Options, open_provider};
use colored::Colorize;
use pgform_cloud::{ClusterProvider, EntityKind, ResourceState, ResourceStatus};

pub async fn handle(options: &Options) -> anyhow::Result<()> {
    let (name, file) = match &options.cluster {
        Some(name) => (name.clone(), options.cluster_file().ok()),
        None => {
            let (desired, file) = options.load_desired()?;
            (desired.name, Some(file))
        }
    };
    let workspace = options.workspace(file.as_deref())?;

    println!("{}", "クラスターの状態を取得中...".blue());
    let provider = open_provider(&workspace, &name).await?;
    let state = provider.get_state().await?;

    println!();
    if state.is_empty() {
        println!("{}", format!("クラスター {} は存在しません", name).dimmed());
        return Ok(());
    }

    println!(
        "{}",
        format!("{:<10} {:<36} {:<10} {}", "KIND", "NAME", "STATUS", "DETAIL").bold()
    );
    println!("{}", "─".repeat(80).dimmed());

    for kind in [EntityKind::Host, EntityKind::Database, EntityKind::User] {
        for resource in state.by_kind(kind) {
            println!(
                "{:<10} {:<36} {} {}",
                kind.to_string(),
                resource.name,
                colored_status(resource.status),
                detail(resource)
            );
        }
    }

    Ok(())
}

fn colored_status(status: ResourceStatus) -> colored::ColoredString {
    let text = format!("{:<10}", status.to_string());
    match status {
        ResourceStatus::Active | ResourceStatus::Alive => text.green(),
        ResourceStatus::Degraded => text.yellow(),
        ResourceStatus::Dead => text.red(),
        ResourceStatus::Unknown => text.dimmed(),
    }
}

fn detail(resource: &ResourceState) -> String {
    match resource.kind {
        EntityKind::Host => {
            let zone: String = resource.get_attribute("zone").unwrap_or_default();
            let role: String = resource.get_attribute("role").unwrap_or_default();
            format!("{} {}", zone, role.to_lowercase())
        }
        EntityKind::Database => {
            let owner: String = resource.get_attribute("owner").unwrap_or_default();
            format!("owner: {}", owner)
        }
        EntityKind::User => {
            let permissions: Vec<String> =
                resource.get_attribute("permissions").unwrap_or_default();
            format!("permissions: {}", permissions.join(", "))
        }
        EntityKind::Cluster => String::new(),
    }
}
