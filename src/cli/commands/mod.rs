// コマンドハンドラー層
// 各CLIコマンドの実装

pub mod diff;
pub mod generate;
pub mod init;
pub mod risk_report_formatter;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::IsTerminal;
use std::time::Duration;

use crate::cli::OutputFormat;
use crate::core::schema_change::{ChangeType, RiskLevel, SchemaChange};

/// コマンド出力の共通インターフェース
pub trait CommandOutput: Serialize {
    /// テキスト形式の出力
    fn to_text(&self) -> String;
}

/// 出力フォーマットに応じてコマンド出力を文字列化
pub fn render_output<T: CommandOutput>(output: &T, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(output.to_text()),
        OutputFormat::Json => {
            serde_json::to_string_pretty(output).with_context(|| "Failed to serialize output")
        }
    }
}

/// JSON出力用の変更レポート行
#[derive(Debug, Clone, Serialize)]
pub struct ChangeReport {
    pub change_type: ChangeType,
    pub table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    pub risk_level: RiskLevel,
    pub rollback_sql: String,
}

impl From<&SchemaChange> for ChangeReport {
    fn from(change: &SchemaChange) -> Self {
        Self {
            change_type: change.change_type,
            table: change.target_label().to_string(),
            object: change.details.object_name().map(str::to_string),
            risk_level: change.risk_level,
            rollback_sql: change.rollback_sql().to_string(),
        }
    }
}

/// 解析中のスピナー
///
/// 標準エラーが端末でない場合、またはJSON出力の場合は表示しない。
pub(crate) fn analysis_spinner(format: &OutputFormat) -> ProgressBar {
    if *format == OutputFormat::Json || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Analyzing schema changes...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
