// マイグレーション描画サービス
//
// 変更を安全な実行順序に並べ替え、順方向マイグレーションのSQLドキュメントを生成します。
// 検証は行わない純粋なフォーマッターです。

use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;

use crate::adapters::sql_generator::postgres::PostgresSqlGenerator;
use crate::adapters::sql_generator::SqlGenerator;
use crate::core::risk_policy::OperationOrder;
use crate::core::schema_change::{RiskLevel, SchemaChange};

/// マイグレーションIDのタイムスタンプ形式
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// マイグレーションIDを生成（例: 20260122120000_add_email）
pub fn migration_id(migration_name: &str, generated_at: DateTime<Utc>) -> String {
    format!("{}_{}", generated_at.format(TIMESTAMP_FORMAT), migration_name)
}

/// ヘッダー用の生成日時（RFC 3339）
pub(crate) fn format_generated_at(generated_at: DateTime<Utc>) -> String {
    generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// リスクレベルごとの変更件数
pub fn risk_counts(changes: &[SchemaChange]) -> BTreeMap<RiskLevel, usize> {
    let mut counts = BTreeMap::new();
    for change in changes {
        *counts.entry(change.risk_level).or_insert(0) += 1;
    }
    counts
}

/// マイグレーション描画サービス
pub struct MigrationRenderer {
    order: OperationOrder,
    generator: Box<dyn SqlGenerator>,
}

impl Default for MigrationRenderer {
    fn default() -> Self {
        Self::new(OperationOrder::default())
    }
}

impl std::fmt::Debug for MigrationRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationRenderer")
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

impl MigrationRenderer {
    /// 実行順序を指定して作成（SQL生成はPostgreSQL）
    pub fn new(order: OperationOrder) -> Self {
        Self::with_generator(order, Box::new(PostgresSqlGenerator::new()))
    }

    /// 実行順序とSQLジェネレーターを指定して作成
    pub fn with_generator(order: OperationOrder, generator: Box<dyn SqlGenerator>) -> Self {
        Self { order, generator }
    }

    /// 変更を実行順序に並べ替え
    ///
    /// 操作の優先度、次にリスクの優先度で安定ソートします。
    /// 同じキーを持つ変更は入力順を保ちます。
    pub fn sort_changes(&self, changes: &[SchemaChange]) -> Vec<SchemaChange> {
        let mut sorted = changes.to_vec();
        sorted.sort_by_key(|change| {
            (
                self.order.priority(change.change_type),
                change.risk_level.priority(),
            )
        });
        sorted
    }

    /// 現在時刻でマイグレーションドキュメントを生成
    ///
    /// # Arguments
    ///
    /// * `changes` - 変更のリスト（順不同）
    /// * `migration_name` - マイグレーション名
    pub fn render(&self, changes: &[SchemaChange], migration_name: &str) -> String {
        self.render_at(changes, migration_name, Utc::now())
    }

    /// 指定時刻でマイグレーションドキュメントを生成
    ///
    /// # Arguments
    ///
    /// * `changes` - 変更のリスト（順不同）
    /// * `migration_name` - マイグレーション名
    /// * `generated_at` - 生成日時（マイグレーションIDとヘッダーに使用）
    ///
    /// # Returns
    ///
    /// ヘッダー、リスク集計、BEGIN/COMMITで囲まれた操作ブロックからなるSQL
    pub fn render_at(
        &self,
        changes: &[SchemaChange],
        migration_name: &str,
        generated_at: DateTime<Utc>,
    ) -> String {
        let mut sql = String::new();

        sql.push_str(&format!("-- Schema Migration: {}\n", migration_name));
        sql.push_str(&format!("-- Generated: {}\n", format_generated_at(generated_at)));
        sql.push_str(&format!(
            "-- Migration ID: {}\n",
            migration_id(migration_name, generated_at)
        ));
        sql.push('\n');
        sql.push_str("-- REVIEW REQUIRED: Review all changes before execution\n");
        sql.push_str("-- Risk Assessment:\n");

        let counts = risk_counts(changes);
        for level in RiskLevel::ALL.iter().rev() {
            if let Some(count) = counts.get(level) {
                let noun = if *count == 1 { "change" } else { "changes" };
                sql.push_str(&format!("--   {}: {} {}\n", level, count, noun));
            }
        }

        sql.push('\n');
        sql.push_str("-- Begin Transaction\n");
        sql.push_str("BEGIN;\n\n");

        for (index, change) in self.sort_changes(changes).iter().enumerate() {
            sql.push_str(&format!(
                "-- Operation {}: {} on {}\n",
                index + 1,
                change.change_type,
                change.target_label()
            ));
            sql.push_str(&format!("-- Risk Level: {}\n", change.risk_level));
            sql.push_str(&self.generator.render_forward(change));
            sql.push_str("\n\n");
        }

        sql.push_str("-- Commit Transaction\n");
        sql.push_str("COMMIT;\n");

        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{ColumnDefinition, TableDefinition};
    use crate::core::schema_change::{ChangeDetails, ChangeType};
    use chrono::TimeZone;

    fn change(change_type: ChangeType, table: &str, risk_level: RiskLevel) -> SchemaChange {
        let details = match change_type {
            ChangeType::AddTable | ChangeType::DropTable => ChangeDetails::Table {
                definition: TableDefinition::new(),
            },
            _ => ChangeDetails::Column {
                column: "c".to_string(),
                definition: ColumnDefinition::new("INT", true),
            },
        };
        SchemaChange::new(change_type, table, details, risk_level, String::new())
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 22, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_migration_id() {
        assert_eq!(
            migration_id("add_email", fixed_time()),
            "20260122120000_add_email"
        );
    }

    #[test]
    fn test_sort_by_operation_then_risk() {
        let renderer = MigrationRenderer::default();
        let changes = vec![
            change(ChangeType::DropTable, "a", RiskLevel::Critical),
            change(ChangeType::DropTable, "b", RiskLevel::High),
            change(ChangeType::AddColumn, "c", RiskLevel::Low),
            change(ChangeType::AddTable, "d", RiskLevel::Medium),
        ];

        let sorted = renderer.sort_changes(&changes);
        let tables: Vec<&str> = sorted.iter().map(|c| c.table_name.as_str()).collect();
        assert_eq!(tables, vec!["d", "c", "b", "a"]);
    }

    #[test]
    fn test_sort_is_stable_for_equal_keys() {
        let renderer = MigrationRenderer::default();
        let changes = vec![
            change(ChangeType::AddColumn, "x", RiskLevel::Low),
            change(ChangeType::AddColumn, "y", RiskLevel::Low),
            change(ChangeType::AddColumn, "z", RiskLevel::Low),
        ];

        let sorted = renderer.sort_changes(&changes);
        let tables: Vec<&str> = sorted.iter().map(|c| c.table_name.as_str()).collect();
        assert_eq!(tables, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_render_document_layout() {
        let renderer = MigrationRenderer::default();
        let changes = vec![
            change(ChangeType::DropColumn, "visits", RiskLevel::Medium),
            change(ChangeType::AddColumn, "visits", RiskLevel::Low),
        ];

        let sql = renderer.render_at(&changes, "tidy_visits", fixed_time());

        let expected = "\
-- Schema Migration: tidy_visits
-- Generated: 2026-01-22T12:00:00Z
-- Migration ID: 20260122120000_tidy_visits

-- REVIEW REQUIRED: Review all changes before execution
-- Risk Assessment:
--   MEDIUM: 1 change
--   LOW: 1 change

-- Begin Transaction
BEGIN;

-- Operation 1: ADD_COLUMN on visits
-- Risk Level: LOW
ALTER TABLE visits ADD COLUMN c INT;

-- Operation 2: DROP_COLUMN on visits
-- Risk Level: MEDIUM
ALTER TABLE visits DROP COLUMN c;

-- Commit Transaction
COMMIT;
";
        assert_eq!(sql, expected);
    }

    #[test]
    fn test_render_empty_change_list() {
        let sql = MigrationRenderer::default().render_at(&[], "noop", fixed_time());
        assert!(sql.contains("-- Risk Assessment:\n\n-- Begin Transaction\nBEGIN;\n\n-- Commit Transaction\nCOMMIT;\n"));
    }

    #[test]
    fn test_custom_operation_order() {
        let renderer = MigrationRenderer::new(OperationOrder::new(vec![ChangeType::DropTable]));
        let changes = vec![
            change(ChangeType::AddTable, "new_one", RiskLevel::Medium),
            change(ChangeType::DropTable, "old_one", RiskLevel::High),
        ];

        let sorted = renderer.sort_changes(&changes);
        assert_eq!(sorted[0].table_name, "old_one");
        assert_eq!(sorted[1].table_name, "new_one");
    }

    #[test]
    fn test_risk_counts() {
        let changes = vec![
            change(ChangeType::AddColumn, "a", RiskLevel::Low),
            change(ChangeType::AddColumn, "b", RiskLevel::Low),
            change(ChangeType::DropTable, "c", RiskLevel::Critical),
        ];
        let counts = risk_counts(&changes);
        assert_eq!(counts.get(&RiskLevel::Low), Some(&2));
        assert_eq!(counts.get(&RiskLevel::Critical), Some(&1));
        assert_eq!(counts.get(&RiskLevel::High), None);
    }
}
