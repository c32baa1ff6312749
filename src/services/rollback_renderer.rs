// ロールバック描画サービス
//
// 変更リストを逆順にたどり、構築時に確定したロールバックSQLをそのまま並べた
// 緊急用ロールバックドキュメントを生成します。並べ替えは行いません。

use chrono::{DateTime, Utc};

use crate::core::schema_change::SchemaChange;
use crate::services::migration_renderer::format_generated_at;

/// ロールバック描画サービス
#[derive(Debug, Clone, Default)]
pub struct RollbackRenderer;

impl RollbackRenderer {
    /// 新しいRollbackRendererを作成
    pub fn new() -> Self {
        Self
    }

    /// 現在時刻でロールバックドキュメントを生成
    pub fn render_rollback(&self, changes: &[SchemaChange]) -> String {
        self.render_rollback_at(changes, Utc::now())
    }

    /// 指定時刻でロールバックドキュメントを生成
    ///
    /// # Arguments
    ///
    /// * `changes` - 実行順の変更リスト（逆順に出力される）
    /// * `generated_at` - 生成日時
    pub fn render_rollback_at(&self, changes: &[SchemaChange], generated_at: DateTime<Utc>) -> String {
        let mut sql = String::new();

        sql.push_str("-- Emergency Rollback Script\n");
        sql.push_str(&format!("-- Generated: {}\n", format_generated_at(generated_at)));
        sql.push_str("-- EMERGENCY USE ONLY - Reverts schema changes\n");
        sql.push('\n');
        sql.push_str("-- Begin Rollback Transaction\n");
        sql.push_str("BEGIN;\n\n");

        for change in changes.iter().rev() {
            sql.push_str(&format!(
                "-- Rollback: {} on {}\n",
                change.change_type,
                change.target_label()
            ));
            sql.push_str(change.rollback_sql());
            sql.push_str("\n\n");
        }

        sql.push_str("-- Commit Rollback\n");
        sql.push_str("COMMIT;\n");

        sql
    }
}
