// Adapters Layer
// 構造モデルからSQL方言への変換を抽象化

pub mod sql_generator;
pub mod sql_quote;
