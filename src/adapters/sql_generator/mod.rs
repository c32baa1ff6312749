// SQL生成アダプター
//
// スキーマ変更（デルタ）から順方向DDLと逆方向DDLを生成するアダプター層。
// 各変更が保持する構造モデルの断片のみを入力とします。

pub mod postgres;

use crate::core::schema::{ColumnDefinition, TableDefinition};
use crate::core::schema_change::{ChangeDetails, ChangeType, SchemaChange};

/// 順方向SQLを合成できない変更種類のプレースホルダー
pub fn placeholder_sql(change_type: ChangeType) -> String {
    format!("-- TODO: Implement {} operation", change_type)
}

/// SQLジェネレータートレイト
///
/// 各データベース方言用のSQLジェネレーターが実装すべきインターフェース。
/// 個々のDDL文を実装すれば、変更単位の順方向・逆方向SQLはデフォルト実装で合成されます。
pub trait SqlGenerator {
    /// CREATE TABLE文を生成
    ///
    /// # Arguments
    ///
    /// * `table_name` - テーブル名
    /// * `table` - テーブル定義
    ///
    /// # Returns
    ///
    /// CREATE TABLE文のSQL文字列（制約とインデックスは含まない）
    fn render_table_create(&self, table_name: &str, table: &TableDefinition) -> String;

    /// ADD COLUMN文を生成
    ///
    /// # Arguments
    ///
    /// * `table_name` - テーブル名
    /// * `column_name` - カラム名
    /// * `definition` - カラム定義
    fn render_column_add(
        &self,
        table_name: &str,
        column_name: &str,
        definition: &ColumnDefinition,
    ) -> String;

    /// カラム型変更のALTER COLUMN文を生成
    ///
    /// # Arguments
    ///
    /// * `table_name` - テーブル名
    /// * `column_name` - カラム名
    /// * `definition` - 変更後の型を持つカラム定義
    fn render_column_alter_type(
        &self,
        table_name: &str,
        column_name: &str,
        definition: &ColumnDefinition,
    ) -> String;

    /// DROP TABLE文を生成
    fn render_table_drop(&self, table_name: &str) -> String;

    /// DROP COLUMN文を生成
    fn render_column_drop(&self, table_name: &str, column_name: &str) -> String;

    /// DROP FUNCTION文を生成
    fn render_function_drop(&self, function_name: &str) -> String;

    /// 変更の順方向SQLを生成
    ///
    /// 順方向SQLを合成できない変更（関数本体を持たない ADD_FUNCTION など）は
    /// プレースホルダーのコメントを返します。
    fn render_forward(&self, change: &SchemaChange) -> String {
        match (change.change_type, &change.details) {
            (ChangeType::AddTable, ChangeDetails::Table { definition }) => {
                self.render_table_create(&change.table_name, definition)
            }
            (ChangeType::DropTable, _) => self.render_table_drop(&change.table_name),
            (ChangeType::AddColumn, ChangeDetails::Column { column, definition }) => {
                self.render_column_add(&change.table_name, column, definition)
            }
            (ChangeType::DropColumn, ChangeDetails::Column { column, .. }) => {
                self.render_column_drop(&change.table_name, column)
            }
            (
                ChangeType::ModifyColumn,
                ChangeDetails::ColumnModification {
                    column,
                    new_definition,
                    ..
                },
            ) => self.render_column_alter_type(&change.table_name, column, new_definition),
            (change_type, _) => placeholder_sql(change_type),
        }
    }

    /// 変更の逆操作SQLを生成
    ///
    /// 削除と変更では旧定義から、追加では対応する削除文を生成します。
    ///
    /// # Arguments
    ///
    /// * `change_type` - 変更の種類
    /// * `table_name` - 対象テーブル名（グローバル変更では空文字列）
    /// * `details` - 変更の詳細
    fn render_inverse(
        &self,
        change_type: ChangeType,
        table_name: &str,
        details: &ChangeDetails,
    ) -> String {
        match (change_type, details) {
            (ChangeType::AddTable, _) => self.render_table_drop(table_name),
            (ChangeType::DropTable, ChangeDetails::Table { definition }) => {
                self.render_table_create(table_name, definition)
            }
            (ChangeType::AddColumn, ChangeDetails::Column { column, .. }) => {
                self.render_column_drop(table_name, column)
            }
            (ChangeType::DropColumn, ChangeDetails::Column { column, definition }) => {
                self.render_column_add(table_name, column, definition)
            }
            (
                ChangeType::ModifyColumn,
                ChangeDetails::ColumnModification {
                    column,
                    old_definition,
                    ..
                },
            ) => self.render_column_alter_type(table_name, column, old_definition),
            (ChangeType::AddFunction, ChangeDetails::Function { function }) => {
                self.render_function_drop(&function.name)
            }
            (change_type, _) => format!("-- TODO: Implement rollback of {} operation", change_type),
        }
    }
}
