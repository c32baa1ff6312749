// マイグレーションパイプラインサービス
//
// 2つのスキーマテキストからマイグレーション成果物を生成する共通パイプライン。
// 抽出 → 差分検出 → 並べ替え → 描画 の各ステージを直線的に実行します。

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::debug;

use crate::core::config::Config;
use crate::core::error::ExtractionWarning;
use crate::core::naming::{ROLLBACK_SUFFIX, SQL_EXTENSION};
use crate::core::risk_policy::{OperationOrder, RiskPolicy};
use crate::core::schema_change::{RiskLevel, SchemaChange};
use crate::services::delta_engine::DeltaEngine;
use crate::services::migration_renderer::{migration_id, risk_counts, MigrationRenderer};
use crate::services::rollback_renderer::RollbackRenderer;
use crate::services::schema_extractor::SchemaExtractor;

/// パイプラインのエラー
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// Migration name is unusable
    #[error("Invalid migration name '{name}': it must contain at least one letter or digit")]
    InvalidMigrationName {
        /// 指定されたマイグレーション名
        name: String,
    },
}

/// 警告の発生元スキーマ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaSide {
    /// 変更前のスキーマ
    Old,
    /// 変更後のスキーマ
    New,
}

impl fmt::Display for SchemaSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaSide::Old => write!(f, "old"),
            SchemaSide::New => write!(f, "new"),
        }
    }
}

/// 発生元付きの抽出警告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaWarning {
    /// 発生元スキーマ
    pub side: SchemaSide,
    /// 抽出警告
    #[serde(flatten)]
    pub warning: ExtractionWarning,
}

impl SchemaWarning {
    /// 発生元付きでフォーマット
    pub fn format(&self) -> String {
        format!("[{} schema] {}", self.side, self.warning.format())
    }
}

/// 差分解析の結果
#[derive(Debug, Clone, Default)]
pub struct SchemaAnalysis {
    /// 実行順に並べた変更
    pub changes: Vec<SchemaChange>,
    /// 抽出時の警告
    pub warnings: Vec<SchemaWarning>,
}

/// マイグレーション成果物
#[derive(Debug, Clone)]
pub struct MigrationArtifacts {
    /// サニタイズ済みのマイグレーション名
    pub migration_name: String,
    /// マイグレーションID（<YYYYMMDDHHMMSS>_<name>）
    pub migration_id: String,
    /// 実行順に並べた変更
    pub changes: Vec<SchemaChange>,
    /// 順方向マイグレーションSQL
    pub migration_sql: String,
    /// ロールバックSQL
    pub rollback_sql: String,
    /// 抽出時の警告
    pub warnings: Vec<SchemaWarning>,
    /// 生成日時
    pub generated_at: DateTime<Utc>,
}

impl MigrationArtifacts {
    /// 変更がないかどうか
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// CRITICAL の変更件数
    pub fn critical_count(&self) -> usize {
        self.changes
            .iter()
            .filter(|change| change.risk_level == RiskLevel::Critical)
            .count()
    }

    /// リスクレベルごとの変更件数
    pub fn risk_counts(&self) -> BTreeMap<RiskLevel, usize> {
        risk_counts(&self.changes)
    }

    /// マイグレーションファイル名（<id>.sql）
    pub fn migration_file_name(&self) -> String {
        format!("{}.{}", self.migration_id, SQL_EXTENSION)
    }

    /// ロールバックファイル名（<id>_ROLLBACK.sql）
    pub fn rollback_file_name(&self) -> String {
        format!("{}{}.{}", self.migration_id, ROLLBACK_SUFFIX, SQL_EXTENSION)
    }
}

/// マイグレーション生成パイプライン
///
/// パイプラインは以下のステージで構成される:
/// 1. extract - 新旧スキーマの構造モデルを抽出（警告を収集）
/// 2. diff - 変更を検出し、リスクとロールバックSQLを確定
/// 3. sort - 実行順序に並べ替え
/// 4. render - 並べ替え済みのリストから順方向・ロールバックSQLを生成
#[derive(Debug, Default)]
pub struct MigrationPipeline {
    extractor: SchemaExtractor,
    engine: DeltaEngine,
    renderer: MigrationRenderer,
    rollback_renderer: RollbackRenderer,
}

impl MigrationPipeline {
    /// リスクポリシーと実行順序を指定して作成
    pub fn new(policy: RiskPolicy, order: OperationOrder) -> Self {
        Self {
            extractor: SchemaExtractor::new(),
            engine: DeltaEngine::new(policy),
            renderer: MigrationRenderer::new(order),
            rollback_renderer: RollbackRenderer::new(),
        }
    }

    /// 設定から作成
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.risk_policy.clone(), config.operation_order.clone())
    }

    /// 抽出・差分検出・並べ替えまでを実行（描画は行わない）
    ///
    /// # Arguments
    ///
    /// * `old_text` - 変更前のスキーマテキスト
    /// * `new_text` - 変更後のスキーマテキスト
    ///
    /// # Returns
    ///
    /// 実行順に並べた変更と、発生元付きの抽出警告
    pub fn analyze(&self, old_text: &str, new_text: &str) -> SchemaAnalysis {
        // ステージ1: extract
        let (old_model, old_warnings) = self.extractor.extract_with_warnings(old_text);
        let (new_model, new_warnings) = self.extractor.extract_with_warnings(new_text);
        let warnings: Vec<SchemaWarning> = old_warnings
            .into_iter()
            .map(|warning| SchemaWarning {
                side: SchemaSide::Old,
                warning,
            })
            .chain(new_warnings.into_iter().map(|warning| SchemaWarning {
                side: SchemaSide::New,
                warning,
            }))
            .collect();

        // ステージ2: diff
        let detected = self.engine.diff(&old_model, &new_model);

        // ステージ3: sort
        let changes = self.renderer.sort_changes(&detected);

        SchemaAnalysis { changes, warnings }
    }

    /// 現在時刻でパイプラインを実行
    ///
    /// # Arguments
    ///
    /// * `old_text` - 変更前のスキーマテキスト
    /// * `new_text` - 変更後のスキーマテキスト
    /// * `migration_name` - マイグレーション名（ファイル名用にサニタイズされる）
    ///
    /// # Returns
    ///
    /// マイグレーション成果物
    pub fn run(
        &self,
        old_text: &str,
        new_text: &str,
        migration_name: &str,
    ) -> Result<MigrationArtifacts, PipelineError> {
        self.run_at(old_text, new_text, migration_name, Utc::now())
    }

    /// 指定時刻でパイプラインを実行
    pub fn run_at(
        &self,
        old_text: &str,
        new_text: &str,
        migration_name: &str,
        generated_at: DateTime<Utc>,
    ) -> Result<MigrationArtifacts, PipelineError> {
        let name = sanitize_migration_name(migration_name);
        if name.is_empty() {
            return Err(PipelineError::InvalidMigrationName {
                name: migration_name.to_string(),
            });
        }

        let SchemaAnalysis { changes, warnings } = self.analyze(old_text, new_text);

        // ステージ4: render
        let migration_sql = self.renderer.render_at(&changes, &name, generated_at);
        let rollback_sql = self
            .rollback_renderer
            .render_rollback_at(&changes, generated_at);

        let migration_id = migration_id(&name, generated_at);
        debug!(
            migration_id = %migration_id,
            changes = changes.len(),
            warnings = warnings.len(),
            "Migration pipeline completed"
        );

        Ok(MigrationArtifacts {
            migration_name: name,
            migration_id,
            changes,
            migration_sql,
            rollback_sql,
            warnings,
            generated_at,
        })
    }
}

/// マイグレーション名をファイル名用にサニタイズ
///
/// 小文字に変換し、英数字以外の連続を1つの `_` にまとめます。
pub fn sanitize_migration_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .split('_')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}
