// 設定ファイル管理
//
// プロジェクトの設定ファイル（YAML形式）の構造と検証を定義します。
// リスクポリシーと操作の実行順序はデプロイ先ごとに上書きできます。

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::core::error::ConfigError;
use crate::core::risk_policy::{OperationOrder, RiskPolicy};

/// 現在の設定ファイルバージョン
pub const CONFIG_VERSION: &str = "1.0";

/// プロジェクト設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// 設定ファイルのバージョン
    #[serde(default = "default_version")]
    pub version: String,

    /// マイグレーションの出力ディレクトリ
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: PathBuf,

    /// リスクポリシー
    #[serde(default)]
    pub risk_policy: RiskPolicy,

    /// 操作の実行順序
    #[serde(default)]
    pub operation_order: OperationOrder,
}

fn default_version() -> String {
    CONFIG_VERSION.to_string()
}

fn default_migrations_dir() -> PathBuf {
    PathBuf::from(crate::core::naming::MIGRATIONS_DIR)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            migrations_dir: default_migrations_dir(),
            risk_policy: RiskPolicy::default(),
            operation_order: OperationOrder::default(),
        }
    }
}

impl Config {
    /// デフォルトの設定ファイルパス
    pub const DEFAULT_CONFIG_PATH: &'static str = crate::core::naming::CONFIG_FILE;

    /// 設定の妥当性を検証
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "Config file version is not specified".to_string(),
            });
        }

        if self.migrations_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                message: "migrations_dir must not be empty".to_string(),
            });
        }

        if self
            .risk_policy
            .sensitive_tables
            .iter()
            .any(|name| name.trim().is_empty())
        {
            return Err(ConfigError::Invalid {
                message: "risk_policy.sensitive_tables contains an empty table name".to_string(),
            });
        }

        let duplicates = self.operation_order.duplicates();
        if !duplicates.is_empty() {
            let names: Vec<&str> = duplicates.iter().map(|c| c.as_str()).collect();
            return Err(ConfigError::Invalid {
                message: format!(
                    "operation_order lists the same change type more than once: {}",
                    names.join(", ")
                ),
            });
        }

        Ok(())
    }
}

/// std::str::FromStrトレイトの実装
impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(yaml: &str) -> Result<Self, Self::Err> {
        serde_saphyr::from_str(yaml).map_err(|e| ConfigError::Parse {
            path: "<inline>".to_string(),
            cause: e.to_string(),
        })
    }
}
