// コマンド共通コンテキスト
//
// 設定ファイル読み込みやパス解決の重複をCLI層で集約する。

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::config::Config;
use crate::core::error::IoError;
use crate::services::config_loader::ConfigLoader;
use crate::services::migration_pipeline::MigrationPipeline;

/// CLIコマンド共通の実行コンテキスト
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub project_path: PathBuf,
    pub config_path: PathBuf,
    pub config: Config,
}

impl CommandContext {
    /// プロジェクトルートから設定を読み込んでコンテキストを作成
    pub fn load(project_path: PathBuf) -> Result<Self> {
        Self::load_with_config(project_path, None)
    }

    /// カスタム設定ファイルパスを指定してコンテキストを作成
    ///
    /// 設定ファイルが存在しない場合は組み込みのデフォルト設定を使用します。
    /// ただし `custom_config_path` が指定された場合、そのファイルは存在しなければなりません。
    pub fn load_with_config(
        project_path: PathBuf,
        custom_config_path: Option<PathBuf>,
    ) -> Result<Self> {
        let (config, config_path) =
            ConfigLoader::load_or_default(&project_path, custom_config_path.as_deref())
                .with_context(|| "Failed to load config")?;

        Ok(Self {
            project_path,
            config_path,
            config,
        })
    }

    /// 設定に基づくパイプライン
    pub fn pipeline(&self) -> MigrationPipeline {
        MigrationPipeline::from_config(&self.config)
    }

    /// マイグレーションディレクトリの絶対パス
    pub fn migrations_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.migrations_dir)
    }

    /// 出力ディレクトリを解決（カスタム指定があれば優先）
    pub fn resolve_output_dir(&self, custom_dir: Option<&PathBuf>) -> PathBuf {
        match custom_dir {
            Some(dir) => self.resolve_path(dir),
            None => self.migrations_dir(),
        }
    }

    /// プロジェクトルートからの相対パスを絶対パスに変換
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_path.join(path)
        }
    }

    /// スキーマファイルを読み込む
    pub fn read_schema(&self, path: &Path) -> Result<String> {
        let path = self.resolve_path(path);
        let content = fs::read_to_string(&path).map_err(|e| IoError::from_read(&path, e))?;
        Ok(content)
    }
}
