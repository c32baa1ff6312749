// 命名ポリシー
//
// アプリケーション名と関連パスの単一ソースを提供します。

/// 現行アプリケーション名
pub const APP_NAME: &str = "strand";

/// 既定の設定ファイル名
pub const CONFIG_FILE: &str = ".strand.yaml";

/// 既定のマイグレーション出力ディレクトリ
pub const MIGRATIONS_DIR: &str = "migrations";

/// ロールバックファイル名のサフィックス
pub const ROLLBACK_SUFFIX: &str = "_ROLLBACK";

/// マイグレーションファイルの拡張子
pub const SQL_EXTENSION: &str = "sql";

/// ログレベル指定用の環境変数名
pub const LOG_ENV: &str = "STRAND_LOG";
