// Core Domain
// スキーマ構造モデル、スキーマ変更、リスクポリシー、設定の純粋なドメイン定義

pub mod config;
pub mod error;
pub mod naming;
pub mod risk_policy;
pub mod schema;
pub mod schema_change;
