use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("設定ディレクトリが見つかりません")]
    ConfigDirNotFound,

    #[error(
        "宣言ファイルが見つかりません。以下の場所を確認してください:\n\
        - カレントディレクトリ: pgform.kdl, pgform.local.kdl, .pgform.kdl, .pgform.local.kdl\n\
        - ./.pgform/ ディレクトリ\n\
        - ~/.config/pgform/pgform.kdl\n\
        または PGFORM_CONFIG_PATH 環境変数で直接指定できます"
    )]
    ClusterFileNotFound,

    #[error("設定ファイルの読み込みに失敗しました: {path}: {source}")]
    Settings {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
