// リスクポリシー
//
// 機微テーブルの一覧、変更種類ごとのリスクルール、操作の実行順序を
// 設定値として表現します。リスク分類器とマイグレーションレンダラーは
// 構築時にこれらを受け取ります。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::schema_change::{ChangeType, RiskLevel};

/// 既定の機微テーブル
pub const DEFAULT_SENSITIVE_TABLES: [&str; 8] = [
    "patients",
    "treatments",
    "medications",
    "protocols",
    "users",
    "roles",
    "permissions",
    "audit_logs",
];

/// 実行順序に含まれない変更種類の優先度
pub const UNORDERED_PRIORITY: u32 = 999;

/// 変更種類ごとのリスクルール
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskRule {
    /// 通常テーブルに対するリスクレベル
    pub level: RiskLevel,

    /// 機微テーブルに対するリスクレベル（未指定なら level と同じ）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitive_level: Option<RiskLevel>,
}

impl RiskRule {
    /// 固定ポリシーにおける既定ルール
    pub fn builtin(change_type: ChangeType) -> Self {
        match change_type {
            ChangeType::AddTable => Self::flat(RiskLevel::Medium),
            ChangeType::DropTable => Self::escalated(RiskLevel::High, RiskLevel::Critical),
            ChangeType::AddColumn => Self::flat(RiskLevel::Low),
            ChangeType::DropColumn => Self::escalated(RiskLevel::Medium, RiskLevel::Critical),
            ChangeType::ModifyColumn => Self::flat(RiskLevel::Medium),
            ChangeType::AddFunction => Self::flat(RiskLevel::Low),
        }
    }

    /// テーブルの種類に関係なく同じレベルを返すルール
    pub fn flat(level: RiskLevel) -> Self {
        Self {
            level,
            sensitive_level: None,
        }
    }

    /// 機微テーブルでレベルを引き上げるルール
    pub fn escalated(level: RiskLevel, sensitive_level: RiskLevel) -> Self {
        Self {
            level,
            sensitive_level: Some(sensitive_level),
        }
    }

    /// テーブルの機微性に応じたレベルを解決
    pub fn resolve(&self, sensitive: bool) -> RiskLevel {
        if sensitive {
            self.sensitive_level.unwrap_or(self.level)
        } else {
            self.level
        }
    }
}

/// リスクポリシー
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskPolicy {
    /// 機微テーブル名の一覧
    #[serde(default = "default_sensitive_tables")]
    pub sensitive_tables: Vec<String>,

    /// 変更種類ごとのルール（未指定の種類は既定ルールを使用）
    #[serde(default)]
    pub rules: BTreeMap<ChangeType, RiskRule>,
}

fn default_sensitive_tables() -> Vec<String> {
    DEFAULT_SENSITIVE_TABLES
        .iter()
        .map(|name| name.to_string())
        .collect()
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            sensitive_tables: default_sensitive_tables(),
            rules: ChangeType::ALL
                .iter()
                .map(|change_type| (*change_type, RiskRule::builtin(*change_type)))
                .collect(),
        }
    }
}

impl RiskPolicy {
    /// 機微テーブルを指定してポリシーを作成（ルールは既定値）
    pub fn with_sensitive_tables<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sensitive_tables: tables.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// 指定されたテーブルが機微テーブルかどうか（ASCII大文字小文字を区別しない）
    ///
    /// クォート付きのテーブル名はクォートを外して照合します。
    pub fn is_sensitive(&self, table_name: &str) -> bool {
        let bare = table_name.replace('"', "");
        !bare.is_empty()
            && self
                .sensitive_tables
                .iter()
                .any(|name| name.eq_ignore_ascii_case(&bare))
    }

    /// 変更種類に対するルールを取得
    pub fn rule_for(&self, change_type: ChangeType) -> RiskRule {
        self.rules
            .get(&change_type)
            .copied()
            .unwrap_or_else(|| RiskRule::builtin(change_type))
    }
}

/// 操作の実行順序
///
/// リストの先頭ほど先に実行されます。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationOrder {
    sequence: Vec<ChangeType>,
}

impl Default for OperationOrder {
    fn default() -> Self {
        Self {
            sequence: vec![
                ChangeType::AddTable,
                ChangeType::AddColumn,
                ChangeType::ModifyColumn,
                ChangeType::AddFunction,
                ChangeType::DropColumn,
                ChangeType::DropTable,
            ],
        }
    }
}

impl OperationOrder {
    /// 指定された順序で作成
    pub fn new(sequence: Vec<ChangeType>) -> Self {
        Self { sequence }
    }

    /// 並び替え用の優先度（1始まり、未登録は999）
    pub fn priority(&self, change_type: ChangeType) -> u32 {
        self.sequence
            .iter()
            .position(|candidate| *candidate == change_type)
            .map(|index| index as u32 + 1)
            .unwrap_or(UNORDERED_PRIORITY)
    }

    /// 順序のリスト
    pub fn sequence(&self) -> &[ChangeType] {
        &self.sequence
    }

    /// 重複して登録されている変更種類
    pub fn duplicates(&self) -> Vec<ChangeType> {
        let mut seen = Vec::new();
        let mut duplicates = Vec::new();
        for change_type in &self.sequence {
            if seen.contains(change_type) {
                if !duplicates.contains(change_type) {
                    duplicates.push(*change_type);
                }
            } else {
                seen.push(*change_type);
            }
        }
        duplicates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_matches_fixed_table() {
        let policy = RiskPolicy::default();

        assert_eq!(policy.rule_for(ChangeType::AddTable).resolve(false), RiskLevel::Medium);
        assert_eq!(policy.rule_for(ChangeType::DropTable).resolve(false), RiskLevel::High);
        assert_eq!(policy.rule_for(ChangeType::DropTable).resolve(true), RiskLevel::Critical);
        assert_eq!(policy.rule_for(ChangeType::DropColumn).resolve(false), RiskLevel::Medium);
        assert_eq!(policy.rule_for(ChangeType::DropColumn).resolve(true), RiskLevel::Critical);
        assert_eq!(policy.rule_for(ChangeType::AddColumn).resolve(true), RiskLevel::Low);
        assert_eq!(policy.rule_for(ChangeType::ModifyColumn).resolve(true), RiskLevel::Medium);
        assert_eq!(policy.rule_for(ChangeType::AddFunction).resolve(false), RiskLevel::Low);
    }

    #[test]
    fn test_is_sensitive() {
        let policy = RiskPolicy::default();
        assert!(policy.is_sensitive("patients"));
        assert!(policy.is_sensitive("AUDIT_LOGS"));
        assert!(policy.is_sensitive("\"Patients\""));
        assert!(!policy.is_sensitive("legacy_notes"));
        assert!(!policy.is_sensitive(""));
    }

    #[test]
    fn test_missing_rule_falls_back_to_builtin() {
        let policy = RiskPolicy {
            sensitive_tables: vec![],
            rules: BTreeMap::new(),
        };
        assert_eq!(policy.rule_for(ChangeType::DropTable), RiskRule::builtin(ChangeType::DropTable));
    }

    #[test]
    fn test_operation_order_priority() {
        let order = OperationOrder::default();
        assert_eq!(order.priority(ChangeType::AddTable), 1);
        assert_eq!(order.priority(ChangeType::AddColumn), 2);
        assert_eq!(order.priority(ChangeType::ModifyColumn), 3);
        assert_eq!(order.priority(ChangeType::AddFunction), 4);
        assert_eq!(order.priority(ChangeType::DropColumn), 5);
        assert_eq!(order.priority(ChangeType::DropTable), 6);

        let partial = OperationOrder::new(vec![ChangeType::DropTable]);
        assert_eq!(partial.priority(ChangeType::DropTable), 1);
        assert_eq!(partial.priority(ChangeType::AddTable), UNORDERED_PRIORITY);
    }

    #[test]
    fn test_operation_order_duplicates() {
        let order = OperationOrder::new(vec![
            ChangeType::AddTable,
            ChangeType::DropTable,
            ChangeType::AddTable,
            ChangeType::AddTable,
        ]);
        assert_eq!(order.duplicates(), vec![ChangeType::AddTable]);
        assert!(OperationOrder::default().duplicates().is_empty());
    }
}
