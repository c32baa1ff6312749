// エラー型定義
//
// アプリケーション全体で使用されるカスタムエラー型を提供します。
// thiserrorを使用して IoError, ConfigError を定義し、
// スキーマ抽出時の診断情報として ExtractionWarning を提供します。

use serde::Serialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// 抽出警告
///
/// スキーマテキストから構造を抽出する際に、モデルから除外された構文を報告します。
/// 警告が出ても抽出は失敗せず、除外の挙動自体は変わりません。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionWarning {
    /// 警告メッセージ
    pub message: String,
    /// 警告発生位置
    pub location: Option<SourceLocation>,
    /// 警告の種類
    pub kind: WarningKind,
}

/// 警告の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// モデルが扱わない CREATE / ALTER / DROP 文
    UnsupportedStatement,
    /// 構文が不完全で解釈できない定義
    MalformedDefinition,
    /// ドキュメント内で定義されていないテーブルへの参照
    UnknownTable,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WarningKind::UnsupportedStatement => "unsupported statement",
            WarningKind::MalformedDefinition => "malformed definition",
            WarningKind::UnknownTable => "unknown table",
        };
        f.write_str(label)
    }
}

impl ExtractionWarning {
    /// 新しい警告を作成
    pub fn new(message: String, location: Option<SourceLocation>, kind: WarningKind) -> Self {
        Self {
            message,
            location,
            kind,
        }
    }

    /// 未対応の文に関する警告を作成
    pub fn unsupported_statement(message: String, location: Option<SourceLocation>) -> Self {
        Self::new(message, location, WarningKind::UnsupportedStatement)
    }

    /// 不完全な定義に関する警告を作成
    pub fn malformed_definition(message: String, location: Option<SourceLocation>) -> Self {
        Self::new(message, location, WarningKind::MalformedDefinition)
    }

    /// 未定義テーブルに関する警告を作成
    pub fn unknown_table(message: String, location: Option<SourceLocation>) -> Self {
        Self::new(message, location, WarningKind::UnknownTable)
    }

    /// 位置情報付きでフォーマット
    pub fn format(&self) -> String {
        let location_str = self
            .location
            .as_ref()
            .map_or(String::new(), |loc| loc.format());
        format!("Warning: {}{}", self.message, location_str)
    }
}

/// ソース上の位置
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    /// 行番号（1始まり）
    pub line: usize,
    /// 対象オブジェクト名（テーブル名、インデックス名など）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
}

impl SourceLocation {
    /// 行番号のみの位置を作成
    pub fn at_line(line: usize) -> Self {
        Self { line, object: None }
    }

    /// オブジェクト名付きの位置を作成
    pub fn with_object(line: usize, object: impl Into<String>) -> Self {
        Self {
            line,
            object: Some(object.into()),
        }
    }

    /// 位置情報をフォーマット
    pub fn format(&self) -> String {
        match &self.object {
            Some(object) => format!(" (line: {}, object: {})", self.line, object),
            None => format!(" (line: {})", self.line),
        }
    }
}

/// I/Oエラー
///
/// ファイル操作時に発生するエラーを表現します。
#[derive(Debug, Error)]
pub enum IoError {
    /// File not found
    #[error("File not found: {path}")]
    FileNotFound {
        /// ファイルパス
        path: String,
    },

    /// File read error
    #[error("Failed to read file: {path} (cause: {cause})")]
    FileRead {
        /// ファイルパス
        path: String,
        /// エラー原因
        cause: String,
    },

    /// File write error
    #[error("Failed to write file: {path} (cause: {cause})")]
    FileWrite {
        /// ファイルパス
        path: String,
        /// エラー原因
        cause: String,
    },

    /// Directory creation error
    #[error("Failed to create directory: {path} (cause: {cause})")]
    DirectoryCreate {
        /// ディレクトリパス
        path: String,
        /// エラー原因
        cause: String,
    },
}

impl IoError {
    /// 読み込み時の std::io::Error を変換（NotFound は FileNotFound に）
    pub fn from_read(path: &Path, error: std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::NotFound {
            IoError::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            IoError::FileRead {
                path: path.display().to_string(),
                cause: error.to_string(),
            }
        }
    }

    /// ファイルが見つからないエラーかどうか
    pub fn is_file_not_found(&self) -> bool {
        matches!(self, IoError::FileNotFound { .. })
    }

    /// ファイル読み込みエラーかどうか
    pub fn is_file_read(&self) -> bool {
        matches!(self, IoError::FileRead { .. })
    }

    /// ファイル書き込みエラーかどうか
    pub fn is_file_write(&self) -> bool {
        matches!(self, IoError::FileWrite { .. })
    }

    /// ディレクトリ作成エラーかどうか
    pub fn is_directory_create(&self) -> bool {
        matches!(self, IoError::DirectoryCreate { .. })
    }
}

/// 設定エラー
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {path}")]
    NotFound {
        /// 設定ファイルパス
        path: String,
    },

    /// Config file parse error
    #[error("Failed to parse config file: {path} (cause: {cause})")]
    Parse {
        /// 設定ファイルパス
        path: String,
        /// エラー原因
        cause: String,
    },

    /// Invalid config value
    #[error("Invalid config: {message}")]
    Invalid {
        /// エラーメッセージ
        message: String,
    },
}

impl ConfigError {
    /// 設定ファイルが見つからないエラーかどうか
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConfigError::NotFound { .. })
    }

    /// パースエラーかどうか
    pub fn is_parse(&self) -> bool {
        matches!(self, ConfigError::Parse { .. })
    }

    /// 不正な設定値エラーかどうか
    pub fn is_invalid(&self) -> bool {
        matches!(self, ConfigError::Invalid { .. })
    }
}
