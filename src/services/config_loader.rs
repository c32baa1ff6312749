// 設定ファイル読み込みサービス
//
// core::config の純粋性を保つため、ファイルI/Oはこのサービスに集約する。

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::config::Config;
use crate::core::error::ConfigError;

/// 設定ファイル読み込みサービス
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// YAMLファイルから設定を読み込み、検証する
    pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.display().to_string(),
                }
            } else {
                ConfigError::Parse {
                    path: path.display().to_string(),
                    cause: e.to_string(),
                }
            }
        })?;

        let config: Config = serde_saphyr::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            cause: e.to_string(),
        })?;
        config.validate()?;

        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// プロジェクトの設定を読み込む
    ///
    /// # Arguments
    ///
    /// * `project_path` - プロジェクトのルートパス
    /// * `explicit_path` - `--config` で指定されたパス（存在しなければエラー）
    ///
    /// # Returns
    ///
    /// 読み込んだ設定と、その設定ファイルのパス。
    /// 明示指定がなくデフォルトの設定ファイルも存在しない場合は組み込みのデフォルト設定を返す。
    pub fn load_or_default(
        project_path: &Path,
        explicit_path: Option<&Path>,
    ) -> Result<(Config, PathBuf), ConfigError> {
        if let Some(path) = explicit_path {
            let config = Self::from_file(path)?;
            return Ok((config, path.to_path_buf()));
        }

        let default_path = project_path.join(Config::DEFAULT_CONFIG_PATH);
        if default_path.exists() {
            let config = Self::from_file(&default_path)?;
            return Ok((config, default_path));
        }

        debug!(path = %default_path.display(), "Config file not found, using built-in defaults");
        Ok((Config::default(), default_path))
    }
}
