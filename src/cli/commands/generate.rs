// generateコマンドハンドラー
//
// 2つのスキーマダンプからマイグレーションファイルを生成します。
// - 新旧スキーマの読み込み
// - 差分検出とリスク分類
// - マイグレーション・ロールバックファイルの書き出し（dry-run時は表示のみ）

use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::cli::command_context::CommandContext;
use crate::cli::commands::risk_report_formatter::RiskReportFormatter;
use crate::cli::commands::{analysis_spinner, render_output, ChangeReport, CommandOutput};
use crate::cli::OutputFormat;
use crate::core::error::IoError;
use crate::core::schema_change::RiskLevel;
use crate::services::migration_pipeline::{MigrationArtifacts, SchemaWarning};

/// 変更がない場合のメッセージ
pub const NO_CHANGES_MESSAGE: &str = "No schema changes detected. Schema is stable.";

/// generateコマンドの出力構造体
#[derive(Debug, Clone, Serialize)]
pub struct GenerateOutput {
    /// Dry runモードかどうか
    pub dry_run: bool,
    /// マイグレーションID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migration_id: Option<String>,
    /// マイグレーションファイルのパス
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migration_path: Option<String>,
    /// ロールバックファイルのパス
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollback_path: Option<String>,
    /// マイグレーションSQL（dry-run時のみ）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migration_sql: Option<String>,
    /// ロールバックSQL（dry-run時のみ）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollback_sql: Option<String>,
    /// 実行順の変更
    pub changes: Vec<ChangeReport>,
    /// リスクレベルごとの件数
    pub risk_counts: BTreeMap<RiskLevel, usize>,
    /// CRITICAL の件数
    pub critical_count: usize,
    /// 抽出警告
    pub warnings: Vec<SchemaWarning>,
    /// メッセージ
    #[serde(skip)]
    pub message: String,
}

impl CommandOutput for GenerateOutput {
    fn to_text(&self) -> String {
        self.message.clone()
    }
}

/// generateコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct GenerateCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// 変更前のスキーマファイル
    pub old_schema: PathBuf,
    /// 変更後のスキーマファイル
    pub new_schema: PathBuf,
    /// マイグレーション名
    pub name: String,
    /// ドライラン（SQLを表示するがファイルは作成しない）
    pub dry_run: bool,
    /// 出力ディレクトリ（指定されない場合は設定ファイルから取得）
    pub output_dir: Option<PathBuf>,
    /// 出力フォーマット
    pub format: OutputFormat,
}

/// generateコマンドハンドラー
#[derive(Debug, Default)]
pub struct GenerateCommandHandler {
    formatter: RiskReportFormatter,
}

impl GenerateCommandHandler {
    /// 新しいGenerateCommandHandlerを作成
    pub fn new() -> Self {
        Self {
            formatter: RiskReportFormatter::new(),
        }
    }

    /// generateコマンドを実行
    ///
    /// # Arguments
    ///
    /// * `command` - generateコマンドのパラメータ
    ///
    /// # Returns
    ///
    /// 成功時は表示用の出力、失敗時はエラーメッセージ
    pub fn execute(&self, command: &GenerateCommand) -> Result<String> {
        let context = CommandContext::load_with_config(
            command.project_path.clone(),
            command.config_path.clone(),
        )?;

        debug!(
            old = %command.old_schema.display(),
            new = %command.new_schema.display(),
            "Loading schema files"
        );
        let old_text = context.read_schema(&command.old_schema)?;
        let new_text = context.read_schema(&command.new_schema)?;

        let spinner = analysis_spinner(&command.format);
        let result = context.pipeline().run(&old_text, &new_text, &command.name);
        spinner.finish_and_clear();
        let artifacts = result?;

        for warning in &artifacts.warnings {
            debug!(side = %warning.side, "{}", warning.warning.format());
        }

        if artifacts.is_empty() {
            let mut message = NO_CHANGES_MESSAGE.to_string();
            if !artifacts.warnings.is_empty() {
                message.push_str("\n\n");
                message.push_str(self.formatter.format_warnings(&artifacts.warnings).trim_end());
            }
            let output = self.build_output(command, &artifacts, None, message);
            return render_output(&output, &command.format);
        }

        let mut message = self.summary_text(&artifacts);

        if command.dry_run {
            message.push_str(&self.dry_run_text(&artifacts));
            let output = self.build_output(command, &artifacts, None, message);
            return render_output(&output, &command.format);
        }

        let output_dir = context.resolve_output_dir(command.output_dir.as_ref());
        let paths = write_artifacts(&output_dir, &artifacts)?;
        info!(
            migration_id = %artifacts.migration_id,
            dir = %output_dir.display(),
            "Migration files generated"
        );

        message.push_str("Migration files generated:\n");
        message.push_str(&format!("  {}\n", paths.0.display()));
        message.push_str(&format!("  {}", paths.1.display()));

        let output = self.build_output(command, &artifacts, Some(paths), message);
        render_output(&output, &command.format)
    }

    /// リスクレポート、CRITICAL警告、抽出警告をまとめたテキスト
    fn summary_text(&self, artifacts: &MigrationArtifacts) -> String {
        let mut text = self.formatter.format_report(&artifacts.changes);

        let critical_count = artifacts.critical_count();
        if critical_count > 0 {
            text.push('\n');
            text.push_str(&self.formatter.format_critical_notice(critical_count));
        }

        if !artifacts.warnings.is_empty() {
            text.push('\n');
            text.push_str(&self.formatter.format_warnings(&artifacts.warnings));
        }

        text.push('\n');
        text
    }

    /// dry-run時に表示する両ドキュメント
    fn dry_run_text(&self, artifacts: &MigrationArtifacts) -> String {
        format!(
            "=== {} ===\n{}\n=== {} ===\n{}",
            artifacts.migration_file_name(),
            artifacts.migration_sql,
            artifacts.rollback_file_name(),
            artifacts.rollback_sql.trim_end()
        )
    }

    fn build_output(
        &self,
        command: &GenerateCommand,
        artifacts: &MigrationArtifacts,
        paths: Option<(PathBuf, PathBuf)>,
        message: String,
    ) -> GenerateOutput {
        let has_changes = !artifacts.is_empty();
        let include_sql = command.dry_run && has_changes;
        let (migration_path, rollback_path) = match paths {
            Some((migration, rollback)) => (
                Some(migration.display().to_string()),
                Some(rollback.display().to_string()),
            ),
            None => (None, None),
        };

        GenerateOutput {
            dry_run: command.dry_run,
            migration_id: has_changes.then(|| artifacts.migration_id.clone()),
            migration_path,
            rollback_path,
            migration_sql: include_sql.then(|| artifacts.migration_sql.clone()),
            rollback_sql: include_sql.then(|| artifacts.rollback_sql.clone()),
            changes: artifacts.changes.iter().map(ChangeReport::from).collect(),
            risk_counts: artifacts.risk_counts(),
            critical_count: artifacts.critical_count(),
            warnings: artifacts.warnings.clone(),
            message,
        }
    }
}

/// マイグレーションとロールバックのファイルを書き出す
///
/// # Arguments
///
/// * `output_dir` - 出力ディレクトリ（存在しなければ作成）
/// * `artifacts` - パイプラインの成果物
///
/// # Returns
///
/// (マイグレーションファイルのパス, ロールバックファイルのパス)
pub fn write_artifacts(
    output_dir: &Path,
    artifacts: &MigrationArtifacts,
) -> Result<(PathBuf, PathBuf), IoError> {
    fs::create_dir_all(output_dir).map_err(|e| IoError::DirectoryCreate {
        path: output_dir.display().to_string(),
        cause: e.to_string(),
    })?;

    let migration_path = output_dir.join(artifacts.migration_file_name());
    let rollback_path = output_dir.join(artifacts.rollback_file_name());

    write_file(&migration_path, &artifacts.migration_sql)?;
    write_file(&rollback_path, &artifacts.rollback_sql)?;

    Ok((migration_path, rollback_path))
}

fn write_file(path: &Path, content: &str) -> Result<(), IoError> {
    fs::write(path, content).map_err(|e| IoError::FileWrite {
        path: path.display().to_string(),
        cause: e.to_string(),
    })
}
