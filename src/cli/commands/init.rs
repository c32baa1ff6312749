// initコマンドハンドラー
//
// 組み込みのリスクポリシーと実行順序を含むデフォルト設定ファイル（.strand.yaml）を生成します。
// 既存の設定ファイルは --force 指定時のみ上書きします。

use anyhow::{anyhow, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::core::config::Config;
use crate::core::error::IoError;
use crate::services::config_serializer::ConfigSerializer;

/// initコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct InitCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// 書き出し先（指定されない場合はプロジェクト直下の .strand.yaml）
    pub config_path: Option<PathBuf>,
    /// 強制的に初期化（既存の設定を上書き）
    pub force: bool,
}

/// initコマンドハンドラー
#[derive(Debug, Default)]
pub struct InitCommandHandler {}

impl InitCommandHandler {
    /// 新しいInitCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// initコマンドを実行
    ///
    /// # Arguments
    ///
    /// * `command` - initコマンドのパラメータ
    ///
    /// # Returns
    ///
    /// 成功時は書き出した設定ファイルのパス
    pub fn execute(&self, command: &InitCommand) -> Result<PathBuf> {
        let config_path = self.config_path(command);

        if config_path.exists() && !command.force {
            return Err(anyhow!(
                "Config file already exists: {}. Use --force option to overwrite it.",
                config_path.display()
            ));
        }

        let yaml = ConfigSerializer::to_yaml(&Config::default())?;
        write_config(&config_path, &yaml)?;

        info!(path = %config_path.display(), "Config file written");
        Ok(config_path)
    }

    /// 書き出し先のパス
    fn config_path(&self, command: &InitCommand) -> PathBuf {
        match &command.config_path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => command.project_path.join(path),
            None => command.project_path.join(Config::DEFAULT_CONFIG_PATH),
        }
    }
}

fn write_config(path: &Path, yaml: &str) -> Result<(), IoError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| IoError::DirectoryCreate {
                path: parent.display().to_string(),
                cause: e.to_string(),
            })?;
        }
    }

    fs::write(path, yaml).map_err(|e| IoError::FileWrite {
        path: path.display().to_string(),
        cause: e.to_string(),
    })
}
