// サービス層
// スキーマ抽出・差分検出・リスク分類・マイグレーション描画

pub mod config_loader;
pub mod config_serializer;
pub mod delta_engine;
pub mod migration_pipeline;
pub mod migration_renderer;
pub mod risk_classifier;
pub mod rollback_renderer;
pub mod schema_extractor;
pub mod sql_lexer;
