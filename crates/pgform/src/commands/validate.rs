use super::Options;
use colored::Colorize;

pub fn handle(options: &Options) -> anyhow::Result<()> {
    println!("{}", "宣言ファイルを検証中...".blue());

    let file = options.cluster_file()?;
    println!("宣言ファイル: {}", file.display().to_string().cyan());

    let clusters = match pgform_core::load_clusters(&file) {
        Ok(clusters) => clusters,
        Err(e) => {
            eprintln!();
            eprintln!("{}", "✗ 宣言エラー".red().bold());
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    };

    let selected: Vec<_> = clusters
        .iter()
        .filter(|c| options.cluster.as_deref().is_none_or(|name| c.name == name))
        .collect();
    if selected.is_empty() {
        anyhow::bail!(
            "クラスター {} が見つかりません",
            options.cluster.as_deref().unwrap_or_default()
        );
    }

    println!("{}", "✓ 宣言ファイルは正常です！".green().bold());
    println!();
    println!("サマリー:");
    for cluster in selected {
        println!(
            "  クラスター {} (PostgreSQL {}, {})",
            cluster.name.cyan(),
            cluster.config.version,
            cluster.config.resources.resource_preset_id
        );
        println!("    ホスト: {}台", cluster.hosts.len());
        for host in &cluster.hosts {
            let fqdn = host.fqdn.as_deref().filter(|f| !f.is_empty());
            match fqdn {
                Some(fqdn) => println!("      - {} ({})", host.zone, fqdn),
                None => println!("      - {}", host.zone),
            }
        }
        println!("    データベース: {}個", cluster.databases.len());
        for database in &cluster.databases {
            println!("      - {} (owner: {})", database.name.cyan(), database.owner);
        }
        println!("    ユーザー: {}人", cluster.users.len());
        for user in &cluster.users {
            println!("      - {}", user.name.cyan());
        }
    }

    Ok(())
}
