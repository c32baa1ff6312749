// スキーマ変更（デルタ）ドメインモデル
//
// 2つのスキーマバージョン間の原子的な構造差分を表現する型システム。
// 各変更はリスクレベルと、構築時に一度だけ生成されるロールバックSQLを保持します。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::schema::{ColumnDefinition, FunctionDefinition, TableDefinition};

/// 変更の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    /// テーブル追加
    AddTable,
    /// テーブル削除
    DropTable,
    /// カラム追加
    AddColumn,
    /// カラム削除
    DropColumn,
    /// カラム変更
    ModifyColumn,
    /// 関数追加
    AddFunction,
}

impl ChangeType {
    /// すべての変更種類
    pub const ALL: [ChangeType; 6] = [
        ChangeType::AddTable,
        ChangeType::DropTable,
        ChangeType::AddColumn,
        ChangeType::DropColumn,
        ChangeType::ModifyColumn,
        ChangeType::AddFunction,
    ];

    /// 表示用の識別子（例: ADD_TABLE）
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::AddTable => "ADD_TABLE",
            ChangeType::DropTable => "DROP_TABLE",
            ChangeType::AddColumn => "ADD_COLUMN",
            ChangeType::DropColumn => "DROP_COLUMN",
            ChangeType::ModifyColumn => "MODIFY_COLUMN",
            ChangeType::AddFunction => "ADD_FUNCTION",
        }
    }

    /// 破壊的な変更かどうか
    pub fn is_destructive(&self) -> bool {
        matches!(self, ChangeType::DropTable | ChangeType::DropColumn)
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChangeType::ALL
            .iter()
            .copied()
            .find(|change_type| change_type.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown change type: {}", s))
    }
}

/// リスクレベル
///
/// 順序は LOW < MEDIUM < HIGH < CRITICAL です。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// 深刻度の低い順
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    /// 並び替え用の優先度（LOW=1 .. CRITICAL=4）
    pub fn priority(&self) -> u32 {
        match self {
            RiskLevel::Low => 1,
            RiskLevel::Medium => 2,
            RiskLevel::High => 3,
            RiskLevel::Critical => 4,
        }
    }

    /// 表示用の識別子
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 変更の詳細
///
/// 変更種類ごとに、SQL合成に必要な構造モデルの断片を保持します。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeDetails {
    /// テーブル全体の定義（ADD_TABLE / DROP_TABLE）
    Table { definition: TableDefinition },

    /// カラム定義（ADD_COLUMN / DROP_COLUMN）
    Column {
        column: String,
        definition: ColumnDefinition,
    },

    /// 変更前後のカラム定義（MODIFY_COLUMN）
    ColumnModification {
        column: String,
        old_definition: ColumnDefinition,
        new_definition: ColumnDefinition,
    },

    /// 関数定義（ADD_FUNCTION）
    Function { function: FunctionDefinition },
}

impl ChangeDetails {
    /// 対象カラム名（カラム単位の変更のみ）
    pub fn column_name(&self) -> Option<&str> {
        match self {
            ChangeDetails::Column { column, .. }
            | ChangeDetails::ColumnModification { column, .. } => Some(column.as_str()),
            _ => None,
        }
    }

    /// 対象オブジェクト名（カラム名または関数名）
    pub fn object_name(&self) -> Option<&str> {
        match self {
            ChangeDetails::Function { function } => Some(function.name.as_str()),
            other => other.column_name(),
        }
    }
}

/// スキーマ変更（デルタ）
///
/// 差分検出時に一度だけ構築され、以降は読み取り専用で各レンダラーに渡されます。
/// ロールバックSQLは構築時に確定し、`details` から再計算されることはありません。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaChange {
    /// 変更の種類
    pub change_type: ChangeType,

    /// 対象テーブル名（関数追加などグローバルな変更では空文字列）
    pub table_name: String,

    /// 変更の詳細
    pub details: ChangeDetails,

    /// リスクレベル
    pub risk_level: RiskLevel,

    /// 逆操作のSQL（構築時に確定）
    rollback_sql: String,
}

impl SchemaChange {
    /// 新しいスキーマ変更を作成
    pub fn new(
        change_type: ChangeType,
        table_name: impl Into<String>,
        details: ChangeDetails,
        risk_level: RiskLevel,
        rollback_sql: String,
    ) -> Self {
        Self {
            change_type,
            table_name: table_name.into(),
            details,
            risk_level,
            rollback_sql,
        }
    }

    /// 構築時に確定したロールバックSQLを取得
    pub fn rollback_sql(&self) -> &str {
        &self.rollback_sql
    }

    /// グローバル（テーブルに属さない）変更かどうか
    pub fn is_global(&self) -> bool {
        self.table_name.is_empty()
    }

    /// 表示用の対象名（グローバル変更は GLOBAL）
    pub fn target_label(&self) -> &str {
        if self.is_global() {
            "GLOBAL"
        } else {
            &self.table_name
        }
    }
}
