// PostgreSQL用SQLジェネレーター
//
// 構造モデルの断片からPostgreSQL用のDDL文を生成します。

use crate::adapters::sql_generator::SqlGenerator;
use crate::core::schema::{ColumnDefinition, TableDefinition};

/// PostgreSQL用SQLジェネレーター
#[derive(Debug, Clone, Default)]
pub struct PostgresSqlGenerator {}

impl PostgresSqlGenerator {
    /// 新しいPostgresSqlGeneratorを作成
    pub fn new() -> Self {
        Self {}
    }

    /// カラム定義のSQL断片を生成（name type [NOT NULL] [DEFAULT expr]）
    ///
    /// カラムレベルの UNIQUE / PRIMARY KEY は出力しません。
    fn generate_column_definition(&self, column_name: &str, column: &ColumnDefinition) -> String {
        let mut parts = Vec::new();

        // カラム名
        parts.push(column_name.to_string());

        // データ型
        parts.push(column.data_type.clone());

        // NULL制約
        if !column.nullable {
            parts.push("NOT NULL".to_string());
        }

        // デフォルト値
        if let Some(ref default_value) = column.default {
            parts.push(format!("DEFAULT {}", default_value));
        }

        parts.join(" ")
    }
}

impl SqlGenerator for PostgresSqlGenerator {
    fn render_table_create(&self, table_name: &str, table: &TableDefinition) -> String {
        let columns: Vec<String> = table
            .columns
            .iter()
            .map(|(name, column)| self.generate_column_definition(name, column))
            .collect();

        format!("CREATE TABLE {} ({});", table_name, columns.join(", "))
    }

    fn render_column_add(
        &self,
        table_name: &str,
        column_name: &str,
        definition: &ColumnDefinition,
    ) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN {};",
            table_name,
            self.generate_column_definition(column_name, definition)
        )
    }

    fn render_column_alter_type(
        &self,
        table_name: &str,
        column_name: &str,
        definition: &ColumnDefinition,
    ) -> String {
        format!(
            "ALTER TABLE {} ALTER COLUMN {} TYPE {};",
            table_name, column_name, definition.data_type
        )
    }

    fn render_table_drop(&self, table_name: &str) -> String {
        format!("DROP TABLE IF EXISTS {};", table_name)
    }

    fn render_column_drop(&self, table_name: &str, column_name: &str) -> String {
        format!("ALTER TABLE {} DROP COLUMN {};", table_name, column_name)
    }

    fn render_function_drop(&self, function_name: &str) -> String {
        format!("DROP FUNCTION IF EXISTS {};", function_name)
    }
}
