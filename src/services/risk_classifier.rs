// リスク分類サービス
//
// 変更種類と対象テーブルからリスクレベルを決定します。
// 判定規則は注入されたリスクポリシーに従います。

use crate::core::risk_policy::RiskPolicy;
use crate::core::schema_change::{ChangeType, RiskLevel};

/// リスク分類サービス
#[derive(Debug, Clone, Default)]
pub struct RiskClassifier {
    policy: RiskPolicy,
}

impl RiskClassifier {
    /// ポリシーを指定して作成
    pub fn new(policy: RiskPolicy) -> Self {
        Self { policy }
    }

    /// 使用中のポリシー
    pub fn policy(&self) -> &RiskPolicy {
        &self.policy
    }

    /// 変更のリスクレベルを判定
    ///
    /// # Arguments
    ///
    /// * `change_type` - 変更の種類
    /// * `table_name` - 対象テーブル名（グローバル変更では空文字列）
    pub fn classify(&self, change_type: ChangeType, table_name: &str) -> RiskLevel {
        self.policy
            .rule_for(change_type)
            .resolve(self.policy.is_sensitive(table_name))
    }
}
