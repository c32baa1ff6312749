// デルタ検出サービス
//
// 2つの構造モデル間の差分を SchemaChange の列として検出します。
// 各変更は構築時にリスクレベルとロールバックSQLが確定します。

use std::collections::HashSet;
use tracing::debug;

use crate::adapters::sql_generator::postgres::PostgresSqlGenerator;
use crate::adapters::sql_generator::SqlGenerator;
use crate::core::risk_policy::RiskPolicy;
use crate::core::schema::{StructuralModel, TableDefinition};
use crate::core::schema_change::{ChangeDetails, ChangeType, SchemaChange};
use crate::services::risk_classifier::RiskClassifier;

/// デルタ検出サービス
pub struct DeltaEngine {
    classifier: RiskClassifier,
    generator: Box<dyn SqlGenerator>,
}

impl Default for DeltaEngine {
    fn default() -> Self {
        Self::new(RiskPolicy::default())
    }
}

impl std::fmt::Debug for DeltaEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeltaEngine")
            .field("classifier", &self.classifier)
            .finish_non_exhaustive()
    }
}

impl DeltaEngine {
    /// リスクポリシーを指定して作成（SQL生成はPostgreSQL）
    pub fn new(policy: RiskPolicy) -> Self {
        Self::with_generator(RiskClassifier::new(policy), Box::new(PostgresSqlGenerator::new()))
    }

    /// 分類器とSQLジェネレーターを指定して作成
    pub fn with_generator(classifier: RiskClassifier, generator: Box<dyn SqlGenerator>) -> Self {
        Self {
            classifier,
            generator,
        }
    }

    /// 2つの構造モデル間の変更を検出
    ///
    /// 出力順序: 追加テーブル、削除テーブル、共通テーブルごとのカラム変更
    /// （追加は新定義の宣言順、削除と変更は旧定義の宣言順）、追加関数。
    ///
    /// # Arguments
    ///
    /// * `old` - 変更前の構造モデル
    /// * `new` - 変更後の構造モデル
    ///
    /// # Returns
    ///
    /// 検出された変更のリスト
    pub fn diff(&self, old: &StructuralModel, new: &StructuralModel) -> Vec<SchemaChange> {
        let mut changes = Vec::new();

        // 追加されたテーブル
        for (table_name, table) in &new.tables {
            if !old.has_table(table_name) {
                changes.push(self.build(
                    ChangeType::AddTable,
                    table_name,
                    ChangeDetails::Table {
                        definition: table.clone(),
                    },
                ));
            }
        }

        // 削除されたテーブル
        for (table_name, table) in &old.tables {
            if !new.has_table(table_name) {
                changes.push(self.build(
                    ChangeType::DropTable,
                    table_name,
                    ChangeDetails::Table {
                        definition: table.clone(),
                    },
                ));
            }
        }

        // 共通テーブルのカラム変更
        for (table_name, old_table) in &old.tables {
            if let Some(new_table) = new.get_table(table_name) {
                self.diff_columns(table_name, old_table, new_table, &mut changes);
            }
        }

        // 追加された関数
        let old_functions: HashSet<&str> = old.function_names().into_iter().collect();
        for function_name in new.function_names() {
            if old_functions.contains(function_name) {
                continue;
            }
            if let Some(function) = new.get_function(function_name) {
                changes.push(self.build(
                    ChangeType::AddFunction,
                    "",
                    ChangeDetails::Function {
                        function: function.clone(),
                    },
                ));
            }
        }

        debug!(count = changes.len(), "Detected schema changes");
        changes
    }

    /// 共通テーブルのカラム差分を検出
    fn diff_columns(
        &self,
        table_name: &str,
        old_table: &TableDefinition,
        new_table: &TableDefinition,
        changes: &mut Vec<SchemaChange>,
    ) {
        // 追加されたカラム（新定義の宣言順）
        for (column_name, definition) in &new_table.columns {
            if !old_table.has_column(column_name) {
                changes.push(self.build(
                    ChangeType::AddColumn,
                    table_name,
                    ChangeDetails::Column {
                        column: column_name.clone(),
                        definition: definition.clone(),
                    },
                ));
            }
        }

        // 削除・変更されたカラム（旧定義の宣言順）
        for (column_name, old_definition) in &old_table.columns {
            match new_table.get_column(column_name) {
                None => changes.push(self.build(
                    ChangeType::DropColumn,
                    table_name,
                    ChangeDetails::Column {
                        column: column_name.clone(),
                        definition: old_definition.clone(),
                    },
                )),
                Some(new_definition) if new_definition != old_definition => {
                    changes.push(self.build(
                        ChangeType::ModifyColumn,
                        table_name,
                        ChangeDetails::ColumnModification {
                            column: column_name.clone(),
                            old_definition: old_definition.clone(),
                            new_definition: new_definition.clone(),
                        },
                    ))
                }
                Some(_) => {}
            }
        }
    }

    /// リスクレベルとロールバックSQLを確定させて変更を構築
    fn build(&self, change_type: ChangeType, table_name: &str, details: ChangeDetails) -> SchemaChange {
        let risk_level = self.classifier.classify(change_type, table_name);
        let rollback_sql = self
            .generator
            .render_inverse(change_type, table_name, &details);

        SchemaChange::new(change_type, table_name, details, risk_level, rollback_sql)
    }
}
