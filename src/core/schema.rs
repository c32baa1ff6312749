// スキーマ構造モデル（スキーマDNA）
//
// SQLスキーマテキストから抽出された構造を表現する型システム。
// StructuralModel, TableDefinition, ColumnDefinition, IndexDefinition などを提供します。
// いずれも構築後は不変の値として扱います。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// スキーマ構造モデル
///
/// 1つのスキーマバージョンの「DNA」。テーブルはテーブル名をキーとした
/// 順序付きマップで保持し、出力順序を決定的にします。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralModel {
    /// テーブル定義のマップ（テーブル名 -> TableDefinition）
    pub tables: BTreeMap<String, TableDefinition>,

    /// 関数定義（宣言順）
    pub functions: Vec<FunctionDefinition>,

    /// トリガー定義（宣言順）
    pub triggers: Vec<TriggerDefinition>,

    /// 型定義（宣言順）
    pub types: Vec<TypeDefinition>,
}

impl StructuralModel {
    /// 空のモデルを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// テーブルを追加（同名のテーブルは後勝ちで置き換え）
    pub fn add_table(&mut self, name: String, table: TableDefinition) {
        self.tables.insert(name, table);
    }

    /// 指定されたテーブルが存在するか確認
    pub fn has_table(&self, table_name: &str) -> bool {
        self.tables.contains_key(table_name)
    }

    /// 指定されたテーブルを取得
    pub fn get_table(&self, table_name: &str) -> Option<&TableDefinition> {
        self.tables.get(table_name)
    }

    /// テーブル名を大文字小文字を区別せずに解決
    ///
    /// クォート付きの名前は完全一致のみで解決します。
    pub fn resolve_table_name(&self, table_name: &str) -> Option<&str> {
        if let Some((name, _)) = self.tables.get_key_value(table_name) {
            return Some(name.as_str());
        }
        if table_name.contains('"') {
            return None;
        }
        self.tables
            .keys()
            .filter(|name| !name.contains('"'))
            .find(|name| name.eq_ignore_ascii_case(table_name))
            .map(|name| name.as_str())
    }

    /// テーブル数を取得
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// 関数名の一覧を宣言順・重複なしで取得
    pub fn function_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for function in &self.functions {
            if !names.contains(&function.name.as_str()) {
                names.push(function.name.as_str());
            }
        }
        names
    }

    /// 指定された名前の関数定義（最初の宣言）を取得
    pub fn get_function(&self, name: &str) -> Option<&FunctionDefinition> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// モデルが何も含まないかどうか
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
            && self.functions.is_empty()
            && self.triggers.is_empty()
            && self.types.is_empty()
    }
}

/// テーブル定義
///
/// カラムは宣言順を保持します。同名カラムの再宣言は位置を保ったまま定義を置き換えます。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    /// カラム定義のリスト（宣言順）
    pub columns: Vec<(String, ColumnDefinition)>,

    /// 制約定義のリスト
    pub constraints: Vec<ConstraintDefinition>,

    /// インデックス定義のリスト
    pub indexes: Vec<IndexDefinition>,
}

impl TableDefinition {
    /// 新しいテーブル定義を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// カラムを追加
    pub fn add_column(&mut self, name: String, column: ColumnDefinition) {
        match self.columns.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = column,
            None => self.columns.push((name, column)),
        }
    }

    /// 制約を追加
    pub fn add_constraint(&mut self, constraint: ConstraintDefinition) {
        self.constraints.push(constraint);
    }

    /// インデックスを追加
    pub fn add_index(&mut self, index: IndexDefinition) {
        self.indexes.push(index);
    }

    /// 指定されたカラムを取得
    pub fn get_column(&self, column_name: &str) -> Option<&ColumnDefinition> {
        self.columns
            .iter()
            .find(|(name, _)| name == column_name)
            .map(|(_, column)| column)
    }

    /// 指定されたカラムが存在するか確認
    pub fn has_column(&self, column_name: &str) -> bool {
        self.get_column(column_name).is_some()
    }

    /// カラム名の一覧（宣言順）
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }
}

/// カラム定義
///
/// 4つのフィールドすべてが等しい場合のみ等価とみなします。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// 生の型文字列（例: VARCHAR(255)）
    #[serde(rename = "type")]
    pub data_type: String,

    /// NULL許可フラグ
    pub nullable: bool,

    /// デフォルト値の式（生テキスト）
    pub default: Option<String>,

    /// カラムレベル制約（PRIMARY KEY, UNIQUE, NOT NULL の順）
    pub constraints: Vec<ColumnConstraint>,
}

impl ColumnDefinition {
    /// 新しいカラム定義を作成
    pub fn new(data_type: impl Into<String>, nullable: bool) -> Self {
        let mut column = Self {
            data_type: data_type.into(),
            nullable,
            default: None,
            constraints: Vec::new(),
        };
        if !nullable {
            column.constraints.push(ColumnConstraint::NotNull);
        }
        column
    }

    /// デフォルト値を設定
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// カラムレベル制約を追加（重複は無視し、正規の順序を保つ）
    pub fn with_constraint(mut self, constraint: ColumnConstraint) -> Self {
        if !self.constraints.contains(&constraint) {
            self.constraints.push(constraint);
            self.constraints.sort();
        }
        self
    }

    /// 指定された制約を持つかどうか
    pub fn has_constraint(&self, constraint: ColumnConstraint) -> bool {
        self.constraints.contains(&constraint)
    }
}

/// カラムレベル制約キーワード
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnConstraint {
    /// PRIMARY KEY
    PrimaryKey,
    /// UNIQUE
    Unique,
    /// NOT NULL
    NotNull,
}

impl ColumnConstraint {
    /// SQLキーワードとしての表記
    pub fn as_sql(&self) -> &'static str {
        match self {
            ColumnConstraint::PrimaryKey => "PRIMARY KEY",
            ColumnConstraint::Unique => "UNIQUE",
            ColumnConstraint::NotNull => "NOT NULL",
        }
    }
}

impl fmt::Display for ColumnConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// テーブル制約定義
///
/// `CONSTRAINT name ...` 形式は名前付き、`PRIMARY KEY (...)` などの
/// 無名テーブル制約は `name` が None になります。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintDefinition {
    /// 制約名
    pub name: Option<String>,

    /// 制約本体（生テキスト）
    pub definition: String,
}

impl ConstraintDefinition {
    /// 名前付き制約を作成
    pub fn named(name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            definition: definition.into(),
        }
    }

    /// 無名制約を作成
    pub fn anonymous(definition: impl Into<String>) -> Self {
        Self {
            name: None,
            definition: definition.into(),
        }
    }
}

/// インデックス定義
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    /// インデックス名
    pub name: String,

    /// インデックス対象のカラム（式を含む生テキスト、宣言順）
    pub columns: Vec<String>,

    /// ユニークインデックスかどうか
    pub unique: bool,
}

impl IndexDefinition {
    /// 新しいインデックスを作成
    pub fn new(name: String, columns: Vec<String>, unique: bool) -> Self {
        Self {
            name,
            columns,
            unique,
        }
    }
}

/// 関数定義
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// 関数名
    pub name: String,

    /// パラメータリスト（括弧内の生テキスト）
    pub parameters: String,
}

/// トリガー定義
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerDefinition {
    /// トリガー名
    pub name: String,
}

/// 型定義
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDefinition {
    /// 型名
    pub name: String,
}
