// Strandライブラリのエントリーポイント
//
// モジュール構造:
// - cli: CLIレイヤー（ユーザー入力の受付とコマンドルーティング）
// - core: コアドメイン（構造モデル、スキーマ変更、リスクポリシー、設定）
// - services: スキーマ抽出、差分検出、リスク分類、マイグレーション描画
// - adapters: 構造モデルからSQL方言への変換

pub mod adapters;
pub mod cli;
pub mod core;
pub mod services;
