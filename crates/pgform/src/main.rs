mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pgform")]
#[command(about = "宣言どおりに、PostgreSQL クラスターを揃える。", long_about = None)]
struct Cli {
    /// クラスター宣言ファイル（省略時は自動検出）
    #[arg(short, long, global = true)]
    file: Option<PathBuf>,

    /// 対象クラスター名（宣言ファイルに複数ある場合は必須）
    #[arg(short, long, global = true)]
    cluster: Option<String>,

    /// バックエンドの JSON ファイル
    #[arg(long, global = true, env = "PGFORM_BACKEND")]
    backend: Option<PathBuf>,

    /// 状態ファイルを置くディレクトリ
    #[arg(long, global = true, env = "PGFORM_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 宣言ファイルを検証
    Validate,
    /// 宣言と実際のクラスターの差分を表示
    Plan {
        /// プランを JSON で書き出す
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// 差分を適用
    Apply {
        /// 確認なしで実行
        #[arg(short, long)]
        yes: bool,
    },
    /// 実際のクラスターを宣言の形で表示
    Show,
    /// ホスト・データベース・ユーザーの状態を一覧表示
    Status,
    /// バージョン情報を表示
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ログは stderr、デフォルトは warn
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let options = commands::Options {
        file: cli.file,
        cluster: cli.cluster,
        backend: cli.backend,
        state_dir: cli.state_dir,
    };

    match cli.command {
        Commands::Version => {
            println!("pgform {}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Validate => {
            commands::validate::handle(&options)?;
        }
        Commands::Plan { out } => {
            commands::plan::handle(&options, out).await?;
        }
        Commands::Apply { yes } => {
            commands::apply::handle(&options, yes).await?;
        }
        Commands::Show => {
            commands::show::handle(&options).await?;
        }
        Commands::Status => {
            commands::status::handle(&options).await?;
        }
    }

    Ok(())
}
