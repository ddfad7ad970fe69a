pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "pgform";
const SETTINGS_FILE: &str = "settings.yaml";

/// pgform の設定ディレクトリを取得
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join(APP_DIR);

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// クラスター宣言ファイル (pgform.kdl) を探す
///
/// 以下の優先順位で検索:
/// 1. 環境変数 PGFORM_CONFIG_PATH (直接パス指定)
/// 2. カレントディレクトリ: pgform.local.kdl, .pgform.local.kdl, pgform.kdl, .pgform.kdl
/// 3. ./.pgform/ ディレクトリ内: 同様の順序
/// 4. ~/.config/pgform/pgform.kdl (グローバル設定)
pub fn find_cluster_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var("PGFORM_CONFIG_PATH") {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!(
            "PGFORM_CONFIG_PATH が存在しないファイルを指しています: {}",
            path.display()
        );
    }

    let current_dir = std::env::current_dir()?;
    let candidates = [
        "pgform.local.kdl",
        ".pgform.local.kdl",
        "pgform.kdl",
        ".pgform.kdl",
    ];

    for filename in &candidates {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    let project_dir = current_dir.join(".pgform");
    if project_dir.is_dir() {
        for filename in &candidates {
            let path = project_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join(APP_DIR).join("pgform.kdl");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::ClusterFileNotFound)
}

/// CLI の設定 (~/.config/pgform/settings.yaml)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliSettings {
    /// バックエンドの JSON ファイル
    pub backend: Option<PathBuf>,

    /// 状態ファイルを置くプロジェクトルート
    pub state_dir: Option<PathBuf>,
}

impl CliSettings {
    /// グローバル設定を読み込む（ファイルがなければデフォルト）
    pub fn load() -> Result<Self> {
        match dirs::config_dir() {
            Some(dir) => Self::load_from(dir.join(APP_DIR).join(SETTINGS_FILE)),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("設定ファイルがないためデフォルトを使用: {}", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content).map_err(|source| ConfigError::Settings {
            path: path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    fn test_get_config_dir() {
        let result = get_config_dir();
        assert!(result.is_ok());

        let config_dir = result.unwrap();
        assert!(config_dir.ends_with("pgform"));
        assert!(config_dir.exists());
    }

    #[test]
    #[serial]
    fn test_find_cluster_file_in_current_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        fs::write(temp_dir.path().join("pgform.kdl"), "// test").unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let result = find_cluster_file();
        std::env::set_current_dir(original_dir).unwrap();

        assert!(result.unwrap().ends_with("pgform.kdl"));
    }

    #[test]
    #[serial]
    fn test_find_cluster_file_local_priority() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        fs::write(temp_dir.path().join("pgform.kdl"), "// shared").unwrap();
        fs::write(temp_dir.path().join("pgform.local.kdl"), "// local").unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let result = find_cluster_file();
        std::env::set_current_dir(original_dir).unwrap();

        // pgform.local.kdl が優先される
        assert!(result.unwrap().ends_with("pgform.local.kdl"));
    }

    #[test]
    #[serial]
    fn test_find_cluster_file_in_project_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        let project_dir = temp_dir.path().join(".pgform");
        fs::create_dir(&project_dir).unwrap();
        fs::write(project_dir.join("pgform.kdl"), "// in project dir").unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let result = find_cluster_file();
        std::env::set_current_dir(original_dir).unwrap();

        assert!(result.unwrap().ends_with(".pgform/pgform.kdl"));
    }

    #[test]
    #[serial]
    fn test_find_cluster_file_env_var() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("custom.kdl");
        fs::write(&config_path, "// custom").unwrap();

        temp_env::with_var("PGFORM_CONFIG_PATH", Some(&config_path), || {
            assert_eq!(find_cluster_file().unwrap(), config_path);
        });
    }

    #[test]
    #[serial]
    fn test_find_cluster_file_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let result = temp_env::with_var_unset("PGFORM_CONFIG_PATH", find_cluster_file);
        std::env::set_current_dir(original_dir).unwrap();

        // ~/.config/pgform/pgform.kdl があれば見つかってしまう
        if let Err(e) = result {
            assert!(matches!(e, ConfigError::ClusterFileNotFound));
        }
    }

    #[test]
    #[serial]
    fn test_hidden_file_priority() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        fs::write(temp_dir.path().join(".pgform.local.kdl"), "// hidden local").unwrap();
        fs::write(temp_dir.path().join("pgform.kdl"), "// visible").unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let result = find_cluster_file();
        std::env::set_current_dir(original_dir).unwrap();

        assert!(result.unwrap().ends_with(".pgform.local.kdl"));
    }

    #[test]
    fn test_settings_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let settings = CliSettings::load_from(temp_dir.path().join("settings.yaml")).unwrap();
        assert_eq!(settings, CliSettings::default());
    }

    #[test]
    fn test_settings_from_yaml() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("settings.yaml");
        fs::write(&path, "backend: /var/lib/pgform/backend.json\n").unwrap();

        let settings = CliSettings::load_from(&path).unwrap();
        assert_eq!(
            settings.backend,
            Some(PathBuf::from("/var/lib/pgform/backend.json"))
        );
        assert!(settings.state_dir.is_none());
    }

    #[test]
    fn test_settings_invalid_yaml() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("settings.yaml");
        fs::write(&path, "backend: [unclosed\n").unwrap();

        assert!(matches!(
            CliSettings::load_from(&path),
            Err(ConfigError::Settings { .. })
        ));
    }
}
