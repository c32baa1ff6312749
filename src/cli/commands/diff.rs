// diffコマンドハンドラー
//
// 2つのスキーマダンプの差分とリスクを表示します。ファイルは書き出しません。

use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

use crate::cli::command_context::CommandContext;
use crate::cli::commands::generate::NO_CHANGES_MESSAGE;
use crate::cli::commands::risk_report_formatter::RiskReportFormatter;
use crate::cli::commands::{analysis_spinner, render_output, ChangeReport, CommandOutput};
use crate::cli::OutputFormat;
use crate::core::schema_change::RiskLevel;
use crate::services::migration_pipeline::SchemaWarning;
use crate::services::migration_renderer::risk_counts;

/// diffコマンドの出力構造体
#[derive(Debug, Clone, Serialize)]
pub struct DiffOutput {
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

impl CommandOutput for DiffOutput {
    fn to_text(&self) -> String {
        self.message.clone()
    }
}

/// diffコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct DiffCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// 変更前のスキーマファイル
    pub old_schema: PathBuf,
    /// 変更後のスキーマファイル
    pub new_schema: PathBuf,
    /// 出力フォーマット
    pub format: OutputFormat,
}

/// diffコマンドハンドラー
#[derive(Debug, Default)]
pub struct DiffCommandHandler {
    formatter: RiskReportFormatter,
}

impl DiffCommandHandler {
    /// 新しいDiffCommandHandlerを作成
    pub fn new() -> Self {
        Self {
            formatter: RiskReportFormatter::new(),
        }
    }

    /// diffコマンドを実行
    pub fn execute(&self, command: &DiffCommand) -> Result<String> {
        let context = CommandContext::load_with_config(
            command.project_path.clone(),
            command.config_path.clone(),
        )?;

        let old_text = context.read_schema(&command.old_schema)?;
        let new_text = context.read_schema(&command.new_schema)?;

        let spinner = analysis_spinner(&command.format);
        let analysis = context.pipeline().analyze(&old_text, &new_text);
        spinner.finish_and_clear();
        debug!(
            changes = analysis.changes.len(),
            warnings = analysis.warnings.len(),
            "Schema analysis finished"
        );

        let critical_count = analysis
            .changes
            .iter()
            .filter(|change| change.risk_level == RiskLevel::Critical)
            .count();

        let mut message = if analysis.changes.is_empty() {
            format!("{}\n", NO_CHANGES_MESSAGE)
        } else {
            self.formatter.format_report(&analysis.changes)
        };
        if critical_count > 0 {
            message.push('\n');
            message.push_str(&self.formatter.format_critical_notice(critical_count));
        }
        if !analysis.warnings.is_empty() {
            message.push('\n');
            message.push_str(&self.formatter.format_warnings(&analysis.warnings));
        }

        let output = DiffOutput {
            changes: analysis.changes.iter().map(ChangeReport::from).collect(),
            risk_counts: risk_counts(&analysis.changes),
            critical_count,
            warnings: analysis.warnings,
            message: message.trim_end().to_string(),
        };
        render_output(&output, &command.format)
    }
}
