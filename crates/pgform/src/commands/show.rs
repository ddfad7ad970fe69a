use super::{Options, open_provider};
use anyhow::Context;
use pgform_cloud::ClusterProvider;

pub async fn handle(options: &Options) -> anyhow::Result<()> {
    // --cluster 指定時は宣言ファイルがなくてもよい
    let (name, file) = match &options.cluster {
        Some(name) => (name.clone(), options.cluster_file().ok()),
        None => {
            let (desired, file) = options.load_desired()?;
            (desired.name, Some(file))
        }
    };
    let workspace = options.workspace(file.as_deref())?;

    let provider = open_provider(&workspace, &name).await?;
    let cluster = provider
        .read()
        .await
        .with_context(|| format!("クラスター {} を読み込めませんでした", name))?;

    println!("{}", serde_json::to_string_pretty(&cluster)?);
    Ok(())
}
