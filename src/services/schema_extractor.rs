// スキーマ抽出サービス
//
// SQLスキーマテキストから構造モデル（スキーマDNA）を抽出します。
// ステートメントごとに再帰下降で解析し、テーブル、カラム、制約、
// インデックス、関数、トリガー、型を収集します。
// 解釈できない構文はモデルから除外し、警告として報告します。抽出自体は失敗しません。

use tracing::debug;

use crate::core::error::{ExtractionWarning, SourceLocation};
use crate::core::schema::{
    ColumnConstraint, ColumnDefinition, ConstraintDefinition, FunctionDefinition,
    IndexDefinition, StructuralModel, TableDefinition, TriggerDefinition, TypeDefinition,
};
use crate::services::sql_lexer::{
    matching_close, source_text, split_statements, split_top_level_commas, Statement, Token,
    TokenCursor,
};

/// 無名テーブル制約の先頭キーワード
const TABLE_CONSTRAINT_KEYWORDS: [&[&str]; 4] = [
    &["PRIMARY", "KEY"],
    &["FOREIGN", "KEY"],
    &["CHECK"],
    &["EXCLUDE"],
];

/// スキーマ抽出サービス
#[derive(Debug, Clone, Default)]
pub struct SchemaExtractor;

/// テーブルへの割り当て待ちのインデックス
struct PendingIndex {
    table: String,
    index: IndexDefinition,
    line: usize,
}

/// 1回の抽出処理の作業状態
#[derive(Default)]
struct Extraction {
    model: StructuralModel,
    warnings: Vec<ExtractionWarning>,
    pending_indexes: Vec<PendingIndex>,
}

impl Extraction {
    fn warn_unsupported(&mut self, message: String, line: usize, object: Option<String>) {
        let location = match object {
            Some(object) => SourceLocation::with_object(line, object),
            None => SourceLocation::at_line(line),
        };
        self.warnings
            .push(ExtractionWarning::unsupported_statement(message, Some(location)));
    }

    fn warn_malformed(&mut self, message: String, line: usize, object: Option<String>) {
        let location = match object {
            Some(object) => SourceLocation::with_object(line, object),
            None => SourceLocation::at_line(line),
        };
        self.warnings
            .push(ExtractionWarning::malformed_definition(message, Some(location)));
    }
}

impl SchemaExtractor {
    /// 新しいSchemaExtractorを作成
    pub fn new() -> Self {
        Self
    }

    /// スキーマテキストから構造モデルを抽出
    ///
    /// # Arguments
    ///
    /// * `schema_text` - SQLスキーマテキスト
    ///
    /// # Returns
    ///
    /// 抽出された構造モデル（解釈できない構文は除外済み）
    pub fn extract(&self, schema_text: &str) -> StructuralModel {
        self.extract_with_warnings(schema_text).0
    }

    /// スキーマテキストから構造モデルを抽出し、除外した構文の警告も返す
    ///
    /// # Arguments
    ///
    /// * `schema_text` - SQLスキーマテキスト
    ///
    /// # Returns
    ///
    /// 構造モデルと警告のリストのタプル
    pub fn extract_with_warnings(
        &self,
        schema_text: &str,
    ) -> (StructuralModel, Vec<ExtractionWarning>) {
        let mut extraction = Extraction::default();

        for statement in split_statements(schema_text) {
            self.extract_statement(&statement, &mut extraction);
        }

        self.attach_indexes(&mut extraction);

        debug!(
            tables = extraction.model.table_count(),
            functions = extraction.model.functions.len(),
            triggers = extraction.model.triggers.len(),
            types = extraction.model.types.len(),
            warnings = extraction.warnings.len(),
            "Extracted schema model"
        );

        (extraction.model, extraction.warnings)
    }

    /// 1つのステートメントを解析
    fn extract_statement(&self, statement: &Statement, extraction: &mut Extraction) {
        let tokens = statement.tokens();
        let Some(first) = tokens.first() else {
            return;
        };
        let line = first.line;
        let mut cursor = TokenCursor::new(&tokens);

        if cursor.eat_keyword("CREATE") {
            self.extract_create(&statement.text, &mut cursor, line, extraction);
        } else if first.is_keyword("ALTER") || first.is_keyword("DROP") {
            let kind = describe_statement(&tokens);
            extraction.warn_unsupported(
                format!("{} statement is not modeled and was skipped", kind),
                line,
                None,
            );
        } else {
            debug!(line, statement = %first.text, "Ignoring non-DDL statement");
        }
    }

    /// CREATE 文を種類ごとに振り分け
    fn extract_create(
        &self,
        source: &str,
        cursor: &mut TokenCursor<'_>,
        line: usize,
        extraction: &mut Extraction,
    ) {
        let or_replace = cursor.eat_keywords(&["OR", "REPLACE"]);

        if !or_replace {
            for modifier in ["TEMP", "TEMPORARY", "UNLOGGED"] {
                if cursor.eat_keyword(modifier) {
                    break;
                }
            }
            if cursor.eat_keyword("TABLE") {
                self.extract_table(source, cursor, line, extraction);
                return;
            }
            if cursor.peek_keyword("UNIQUE") || cursor.peek_keyword("INDEX") {
                self.extract_index(source, cursor, line, extraction);
                return;
            }
            if cursor.eat_keyword("TYPE") {
                self.extract_type(cursor, line, extraction);
                return;
            }
        }

        if cursor.eat_keyword("FUNCTION") {
            self.extract_function(source, cursor, line, extraction);
            return;
        }

        let constraint_trigger = cursor.eat_keyword("CONSTRAINT");
        if cursor.eat_keyword("TRIGGER") {
            self.extract_trigger(cursor, line, extraction);
            return;
        }

        let kind = if constraint_trigger {
            "CREATE CONSTRAINT".to_string()
        } else {
            match cursor.peek() {
                Some(token) => format!("CREATE {}", token.text.to_uppercase()),
                None => "CREATE".to_string(),
            }
        };
        extraction.warn_unsupported(
            format!("{} statement is not modeled and was skipped", kind),
            line,
            None,
        );
    }

    /// CREATE TABLE [IF NOT EXISTS] name ( body ) を解析
    fn extract_table(
        &self,
        source: &str,
        cursor: &mut TokenCursor<'_>,
        line: usize,
        extraction: &mut Extraction,
    ) {
        cursor.eat_keywords(&["IF", "NOT", "EXISTS"]);

        let Some(table_name) = cursor.object_name() else {
            extraction.warn_malformed(
                "CREATE TABLE without a table name was skipped".to_string(),
                line,
                None,
            );
            return;
        };

        if !cursor.peek_symbol('(') {
            extraction.warn_unsupported(
                format!(
                    "CREATE TABLE {} has no column list and was skipped",
                    table_name
                ),
                line,
                Some(table_name),
            );
            return;
        }

        let Some(body) = cursor.group() else {
            extraction.warn_malformed(
                format!(
                    "Column list of table '{}' is not closed; table was skipped",
                    table_name
                ),
                line,
                Some(table_name),
            );
            return;
        };

        let mut table = TableDefinition::new();
        for segment in split_top_level_commas(body) {
            self.extract_table_element(source, &table_name, segment, &mut table, extraction);
        }

        if extraction.model.has_table(&table_name) {
            debug!(table = %table_name, "Table redefined; later definition wins");
        }
        extraction.model.add_table(table_name, table);
    }

    /// テーブル本体の要素（カラムまたはテーブル制約）を解析
    fn extract_table_element(
        &self,
        source: &str,
        table_name: &str,
        segment: &[Token],
        table: &mut TableDefinition,
        extraction: &mut Extraction,
    ) {
        let Some(first) = segment.first() else {
            return;
        };

        // 名前付き制約: CONSTRAINT name definition
        if first.is_keyword("CONSTRAINT") {
            match (segment.get(1).and_then(|t| t.identifier()), segment.get(2)) {
                (Some(name), Some(_)) => {
                    let definition = source_text(source, &segment[2..]).to_string();
                    table.add_constraint(ConstraintDefinition::named(name, definition));
                }
                _ => extraction.warn_malformed(
                    format!("Incomplete CONSTRAINT clause in table '{}'", table_name),
                    first.line,
                    Some(table_name.to_string()),
                ),
            }
            return;
        }

        if is_table_constraint(segment) {
            table.add_constraint(ConstraintDefinition::anonymous(source_text(source, segment)));
            return;
        }

        if segment.len() < 2 {
            debug!(table = %table_name, element = %first.text, "Skipping element with fewer than two tokens");
            return;
        }

        let (Some(column_name), true) = (first.identifier(), segment[1].is_identifier()) else {
            extraction.warn_malformed(
                format!(
                    "Unrecognized element '{}' in table '{}'",
                    source_text(source, segment),
                    table_name
                ),
                first.line,
                Some(table_name.to_string()),
            );
            return;
        };

        table.add_column(column_name, parse_column(source, &segment[1..]));
    }

    /// CREATE [UNIQUE] INDEX [CONCURRENTLY] [IF NOT EXISTS] name ON [ONLY] table [USING method] (cols)
    fn extract_index(
        &self,
        source: &str,
        cursor: &mut TokenCursor<'_>,
        line: usize,
        extraction: &mut Extraction,
    ) {
        let unique = cursor.eat_keyword("UNIQUE");
        if !cursor.eat_keyword("INDEX") {
            extraction.warn_unsupported(
                "CREATE UNIQUE statement is not modeled and was skipped".to_string(),
                line,
                None,
            );
            return;
        }
        cursor.eat_keyword("CONCURRENTLY");
        cursor.eat_keywords(&["IF", "NOT", "EXISTS"]);

        if cursor.peek_keyword("ON") {
            extraction.warn_malformed(
                "Index without a name was skipped".to_string(),
                line,
                None,
            );
            return;
        }
        let Some(index_name) = cursor.object_name() else {
            extraction.warn_malformed("CREATE INDEX without a name was skipped".to_string(), line, None);
            return;
        };

        if !cursor.eat_keyword("ON") {
            extraction.warn_malformed(
                format!("Index '{}' has no ON clause and was skipped", index_name),
                line,
                Some(index_name),
            );
            return;
        }
        cursor.eat_keyword("ONLY");

        let Some(table) = cursor.object_name() else {
            extraction.warn_malformed(
                format!("Index '{}' does not name a table and was skipped", index_name),
                line,
                Some(index_name),
            );
            return;
        };

        if cursor.eat_keyword("USING") {
            cursor.advance();
        }

        let Some(column_tokens) = cursor.group() else {
            extraction.warn_malformed(
                format!("Index '{}' has no column list and was skipped", index_name),
                line,
                Some(index_name),
            );
            return;
        };

        let columns = split_top_level_commas(column_tokens)
            .into_iter()
            .filter(|segment| !segment.is_empty())
            .map(|segment| source_text(source, segment).to_string())
            .collect();

        extraction.pending_indexes.push(PendingIndex {
            table,
            index: IndexDefinition::new(index_name, columns, unique),
            line,
        });
    }

    /// CREATE [OR REPLACE] FUNCTION name(params)
    fn extract_function(
        &self,
        source: &str,
        cursor: &mut TokenCursor<'_>,
        line: usize,
        extraction: &mut Extraction,
    ) {
        let Some(name) = cursor.object_name() else {
            extraction.warn_malformed("CREATE FUNCTION without a name was skipped".to_string(), line, None);
            return;
        };

        let Some(parameter_tokens) = cursor.group() else {
            extraction.warn_malformed(
                format!("Function '{}' has no parameter list and was skipped", name),
                line,
                Some(name),
            );
            return;
        };

        let parameters = source_text(source, parameter_tokens).to_string();

        extraction
            .model
            .functions
            .push(FunctionDefinition { name, parameters });
    }

    /// CREATE [OR REPLACE] [CONSTRAINT] TRIGGER name
    fn extract_trigger(&self, cursor: &mut TokenCursor<'_>, line: usize, extraction: &mut Extraction) {
        match cursor.object_name() {
            Some(name) => extraction.model.triggers.push(TriggerDefinition { name }),
            None => extraction.warn_malformed(
                "CREATE TRIGGER without a name was skipped".to_string(),
                line,
                None,
            ),
        }
    }

    /// CREATE TYPE name
    fn extract_type(&self, cursor: &mut TokenCursor<'_>, line: usize, extraction: &mut Extraction) {
        match cursor.object_name() {
            Some(name) => extraction.model.types.push(TypeDefinition { name }),
            None => extraction.warn_malformed(
                "CREATE TYPE without a name was skipped".to_string(),
                line,
                None,
            ),
        }
    }

    /// 収集したインデックスをテーブルに割り当てる
    fn attach_indexes(&self, extraction: &mut Extraction) {
        for pending in std::mem::take(&mut extraction.pending_indexes) {
            let resolved = extraction
                .model
                .resolve_table_name(&pending.table)
                .map(str::to_string);

            match resolved.and_then(|name| extraction.model.tables.get_mut(&name)) {
                Some(table) => table.add_index(pending.index),
                None => extraction.warnings.push(ExtractionWarning::unknown_table(
                    format!(
                        "Index '{}' references table '{}' which is not defined in this schema",
                        pending.index.name, pending.table
                    ),
                    Some(SourceLocation::with_object(pending.line, pending.index.name)),
                )),
            }
        }
    }
}

/// 無名テーブル制約かどうか
fn is_table_constraint(segment: &[Token]) -> bool {
    let starts_with = |keywords: &[&str]| {
        keywords
            .iter()
            .enumerate()
            .all(|(offset, keyword)| segment.get(offset).is_some_and(|t| t.is_keyword(keyword)))
    };

    if TABLE_CONSTRAINT_KEYWORDS
        .iter()
        .copied()
        .any(|keywords| starts_with(keywords))
    {
        return true;
    }

    // UNIQUE (cols) / UNIQUE NULLS NOT DISTINCT (cols)
    segment.first().is_some_and(|t| t.is_keyword("UNIQUE"))
        && segment
            .get(1)
            .is_some_and(|t| t.is_symbol('(') || t.is_keyword("NULLS"))
}

/// カラム定義を解析（先頭は型トークン）
fn parse_column(source: &str, tokens: &[Token]) -> ColumnDefinition {
    let type_len = type_token_len(tokens);
    let data_type = source_text(source, &tokens[..type_len]).to_string();
    let rest = &tokens[type_len..];

    // 制約キーワードは括弧内も含めて存在するかどうかで判定する（文字列リテラルは対象外）
    let has_pair = |a: &str, b: &str| {
        rest.windows(2)
            .any(|pair| pair[0].is_keyword(a) && pair[1].is_keyword(b))
    };

    let not_null = has_pair("NOT", "NULL");
    let mut column = ColumnDefinition::new(data_type, !not_null);

    if has_pair("PRIMARY", "KEY") {
        column = column.with_constraint(ColumnConstraint::PrimaryKey);
    }
    if rest.iter().any(|token| token.is_keyword("UNIQUE")) {
        column = column.with_constraint(ColumnConstraint::Unique);
    }

    if let Some(default_at) = top_level_indices(rest)
        .iter()
        .copied()
        .find(|&index| rest[index].is_keyword("DEFAULT"))
    {
        let unit = default_unit(&rest[default_at + 1..]);
        if !unit.is_empty() {
            column = column.with_default(source_text(source, unit));
        }
    }

    column
}

/// 型トークンの長さ（型名 + 直後に連続する括弧グループと `[]` サフィックス）
fn type_token_len(tokens: &[Token]) -> usize {
    let mut len = 1;
    while let Some(next) = tokens.get(len) {
        let attached = next.start == tokens[len - 1].end;
        if !(attached && (next.is_symbol('(') || next.is_symbol('['))) {
            break;
        }
        match matching_close(tokens, len) {
            Some(close) => len = close + 1,
            None => break,
        }
    }
    len
}

/// 括弧の外側にあるトークンの位置
fn top_level_indices(tokens: &[Token]) -> Vec<usize> {
    let mut depth = 0usize;
    let mut indices = Vec::new();
    for (index, token) in tokens.iter().enumerate() {
        if token.is_symbol('(') || token.is_symbol('[') {
            depth += 1;
        } else if token.is_symbol(')') || token.is_symbol(']') {
            depth = depth.saturating_sub(1);
        } else if depth == 0 {
            indices.push(index);
        }
    }
    indices
}

/// DEFAULT に続く1単位の式
///
/// 次の空白またはカンマで終わります。文字列リテラルと括弧グループは1単位として扱います。
fn default_unit(tokens: &[Token]) -> &[Token] {
    let mut len = 0;
    while let Some(token) = tokens.get(len) {
        if len > 0 && token.start != tokens[len - 1].end {
            break;
        }
        if token.is_symbol(',') {
            break;
        }
        if token.is_symbol('(') || token.is_symbol('[') {
            match matching_close(tokens, len) {
                Some(close) => {
                    len = close + 1;
                    continue;
                }
                None => break,
            }
        }
        len += 1;
    }
    &tokens[..len]
}

/// 警告メッセージ用の文の種類（例: ALTER TABLE）
fn describe_statement(tokens: &[Token]) -> String {
    tokens
        .iter()
        .take(2)
        .filter(|t| t.is_identifier())
        .map(|t| t.text.to_uppercase())
        .collect::<Vec<_>>()
        .join(" ")
}
