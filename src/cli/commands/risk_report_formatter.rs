// リスクレポートのフォーマッター
//
// 変更ごとのリスクレベルを色付きで一覧表示します。

use colored::{ColoredString, Colorize};
use std::collections::BTreeMap;

use crate::core::schema_change::{RiskLevel, SchemaChange};
use crate::services::migration_pipeline::SchemaWarning;

#[derive(Debug)]
pub struct RiskReportFormatter;

impl Default for RiskReportFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskReportFormatter {
    pub fn new() -> Self {
        Self
    }

    /// 変更一覧とリスク集計をフォーマット
    pub fn format_report(&self, changes: &[SchemaChange]) -> String {
        let mut output = String::new();

        output.push_str(&format!("{}\n", "Detected changes:".bold()));
        for (index, change) in changes.iter().enumerate() {
            let target = match change.details.object_name() {
                Some(object) if !change.is_global() => {
                    format!("{}.{}", change.target_label(), object)
                }
                Some(object) => format!("{} ({})", change.target_label(), object),
                None => change.target_label().to_string(),
            };
            output.push_str(&format!(
                "  {}. {} {} {}\n",
                index + 1,
                padded_level_label(change.risk_level),
                change.change_type,
                target
            ));
        }

        output.push('\n');
        output.push_str(&format!(
            "Risk summary: {}\n",
            format_risk_counts(&crate::services::migration_renderer::risk_counts(changes))
        ));

        output
    }

    /// CRITICAL変更の注意喚起
    pub fn format_critical_notice(&self, critical_count: usize) -> String {
        format!(
            "{} {} CRITICAL change(s) detected. Manual review required before execution.\n",
            "Warning:".red().bold(),
            critical_count
        )
    }

    /// 抽出警告の一覧
    pub fn format_warnings(&self, warnings: &[SchemaWarning]) -> String {
        let mut output = String::new();
        for warning in warnings {
            output.push_str(&format!("{}\n", warning.format().yellow()));
        }
        output
    }
}

/// リスクレベルを色付け（LOW 緑、MEDIUM 黄、HIGH 明るい赤、CRITICAL 赤太字）
pub fn colorize_level(level: RiskLevel) -> ColoredString {
    match level {
        RiskLevel::Low => level.as_str().green(),
        RiskLevel::Medium => level.as_str().yellow(),
        RiskLevel::High => level.as_str().bright_red(),
        RiskLevel::Critical => level.as_str().red().bold(),
    }
}

/// `[LEVEL]` ラベルの表示幅
const LEVEL_LABEL_WIDTH: usize = 10;

/// 色付きの `[LEVEL]` ラベル（色の制御文字を除いた表示幅で揃える）
fn padded_level_label(level: RiskLevel) -> String {
    let plain_width = level.as_str().len() + 2;
    format!(
        "[{}]{}",
        colorize_level(level),
        " ".repeat(LEVEL_LABEL_WIDTH.saturating_sub(plain_width))
    )
}

/// 重大度の高い順に「LEVEL N」を並べる
fn format_risk_counts(counts: &BTreeMap<RiskLevel, usize>) -> String {
    RiskLevel::ALL
        .iter()
        .rev()
        .filter_map(|level| {
            counts
                .get(level)
                .map(|count| format!("{} {}", colorize_level(*level), count))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{ColumnDefinition, TableDefinition};
    use crate::core::schema_change::{ChangeDetails, ChangeType};

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_format_report_lists_changes_and_summary() {
        plain();
        let changes = vec![
            SchemaChange::new(
                ChangeType::AddColumn,
                "patients",
                ChangeDetails::Column {
                    column: "email".to_string(),
                    definition: ColumnDefinition::new("VARCHAR(255)", true),
                },
                RiskLevel::Low,
                String::new(),
            ),
            SchemaChange::new(
                ChangeType::DropTable,
                "users",
                ChangeDetails::Table {
                    definition: TableDefinition::new(),
                },
                RiskLevel::Critical,
                String::new(),
            ),
        ];

        let report = RiskReportFormatter::new().format_report(&changes);

        assert!(report.contains("ADD_COLUMN patients.email"));
        assert!(report.contains("[CRITICAL] DROP_TABLE users"));
        assert!(report.contains("Risk summary: CRITICAL 1, LOW 1"));
    }

    #[test]
    fn test_level_label_padding_ignores_color_codes() {
        for level in RiskLevel::ALL {
            let label = padded_level_label(level);
            let padding = label.len() - label.trim_end().len();
            assert_eq!(padding, LEVEL_LABEL_WIDTH - (level.as_str().len() + 2));
            assert!(label.trim_end().ends_with(']'));
        }
    }

    #[test]
    fn test_critical_notice() {
        plain();
        let notice = RiskReportFormatter::new().format_critical_notice(2);
        assert_eq!(
            notice,
            "Warning: 2 CRITICAL change(s) detected. Manual review required before execution.\n"
        );
    }
}
