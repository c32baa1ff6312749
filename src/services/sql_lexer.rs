// SQL字句解析
//
// スキーマテキストをステートメントに分割し、各ステートメントをトークン列に変換します。
// シングルクォート、ダブルクォート、PostgreSQLドル引用符、
// 行コメント `--`、ブロックコメント `/* */` 内のセミコロンは区切りとして扱いません。
// トークンはステートメント内のバイト範囲と行番号を保持します。

use crate::adapters::sql_quote::quote_identifier_if_needed;

/// 分割されたSQLステートメント
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// ステートメント本体（末尾のセミコロンを含まない）
    pub text: String,
    /// ステートメント先頭の行番号（1始まり）
    pub line: usize,
}

impl Statement {
    /// ステートメントをトークン列に変換
    pub fn tokens(&self) -> Vec<Token> {
        tokenize(&self.text, self.line)
    }
}

/// トークンの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// キーワードまたは識別子
    Word,
    /// ダブルクォートで囲まれた識別子
    QuotedIdentifier,
    /// シングルクォートの文字列リテラル
    StringLiteral,
    /// ドル引用符で囲まれた文字列（関数本体など）
    DollarString,
    /// 数値リテラル
    Number,
    /// 記号（1文字）
    Symbol,
}

/// トークン
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// トークンの種類
    pub kind: TokenKind,
    /// 元テキスト
    pub text: String,
    /// ステートメント内の開始バイト位置
    pub start: usize,
    /// ステートメント内の終了バイト位置（排他）
    pub end: usize,
    /// 行番号（1始まり）
    pub line: usize,
}

impl Token {
    /// 指定されたキーワードかどうか（大文字小文字を区別しない）
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Word && self.text.eq_ignore_ascii_case(keyword)
    }

    /// 指定された記号かどうか
    pub fn is_symbol(&self, symbol: char) -> bool {
        self.kind == TokenKind::Symbol && self.text.chars().eq(std::iter::once(symbol))
    }

    /// 識別子として解釈できるかどうか
    pub fn is_identifier(&self) -> bool {
        matches!(self.kind, TokenKind::Word | TokenKind::QuotedIdentifier)
    }

    /// DDLにそのまま書き戻せる形の識別子
    ///
    /// クォートなしの語は元のまま返します。クォート付き識別子は、
    /// 中身が小文字の通常識別子であればクォートを外し、それ以外はクォートを保ちます。
    pub fn identifier(&self) -> Option<String> {
        match self.kind {
            TokenKind::Word => Some(self.text.clone()),
            TokenKind::QuotedIdentifier => {
                let inner = self
                    .text
                    .strip_prefix('"')
                    .map(|rest| rest.strip_suffix('"').unwrap_or(rest))
                    .unwrap_or(&self.text);
                Some(quote_identifier_if_needed(&inner.replace("\"\"", "\"")))
            }
            _ => None,
        }
    }
}

/// スキャナーの状態
enum ScanState {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    DollarQuoted(String),
    LineComment,
    /// ブロックコメント（ネスト深さを保持。PostgreSQLのネストされたコメントに対応）
    BlockComment(u32),
}

/// SQL文字列を個別のステートメントに分割
///
/// クォート内やコメント内のセミコロンを正しくスキップしながら、
/// SQL文を分割します。コメントのみのステートメントは除外されます。
///
/// # Arguments
///
/// * `sql` - 分割するSQL文字列
///
/// # Returns
///
/// ステートメントのベクター（前後の空白はトリム済み、行番号付き）
pub fn split_statements(sql: &str) -> Vec<Statement> {
    let mut statements = Vec::new();
    let mut state = ScanState::Normal;
    let chars: Vec<(usize, char)> = sql.char_indices().collect();
    let mut i = 0;
    let mut line = 1;
    // 現在のステートメントの開始位置（バイト位置, 行番号）
    let mut start: Option<(usize, usize)> = None;

    while i < chars.len() {
        let (byte_pos, c) = chars[i];
        let next = chars.get(i + 1).map(|(_, ch)| *ch);

        if start.is_none() && !c.is_whitespace() && !(c == ';' && matches!(state, ScanState::Normal)) {
            start = Some((byte_pos, line));
        }

        let step = match &state {
            ScanState::DollarQuoted(tag) => {
                if c == '$' && sql[byte_pos..].starts_with(tag.as_str()) {
                    let step = tag.chars().count();
                    state = ScanState::Normal;
                    step
                } else {
                    1
                }
            }
            ScanState::SingleQuoted => {
                if c == '\'' {
                    if next == Some('\'') {
                        // エスケープされたシングルクォート('')
                        2
                    } else {
                        state = ScanState::Normal;
                        1
                    }
                } else {
                    1
                }
            }
            ScanState::DoubleQuoted => {
                if c == '"' {
                    if next == Some('"') {
                        2
                    } else {
                        state = ScanState::Normal;
                        1
                    }
                } else {
                    1
                }
            }
            ScanState::LineComment => {
                if c == '\n' {
                    state = ScanState::Normal;
                }
                1
            }
            ScanState::BlockComment(depth) => {
                let depth = *depth;
                if c == '/' && next == Some('*') {
                    state = ScanState::BlockComment(depth + 1);
                    2
                } else if c == '*' && next == Some('/') {
                    state = if depth == 1 {
                        ScanState::Normal
                    } else {
                        ScanState::BlockComment(depth - 1)
                    };
                    2
                } else {
                    1
                }
            }
            ScanState::Normal => match c {
                '\'' => {
                    state = ScanState::SingleQuoted;
                    1
                }
                '"' => {
                    state = ScanState::DoubleQuoted;
                    1
                }
                '-' if next == Some('-') => {
                    state = ScanState::LineComment;
                    2
                }
                '/' if next == Some('*') => {
                    state = ScanState::BlockComment(1);
                    2
                }
                // 識別子内の `$`（例: x$y$）はドル引用符の開始ではない
                '$' if !follows_identifier_char(&chars, i) => match dollar_tag_at(sql, byte_pos) {
                    Some(tag) => {
                        let step = tag.chars().count();
                        state = ScanState::DollarQuoted(tag.to_string());
                        step
                    }
                    None => 1,
                },
                ';' => {
                    if let Some((begin, begin_line)) = start.take() {
                        push_statement(&mut statements, &sql[begin..byte_pos], begin_line);
                    }
                    1
                }
                _ => 1,
            },
        };

        let end = (i + step).min(chars.len());
        line += chars[i..end].iter().filter(|(_, ch)| *ch == '\n').count();
        i = end;
    }

    if let Some((begin, begin_line)) = start {
        push_statement(&mut statements, &sql[begin..], begin_line);
    }

    statements
}

/// ステートメントを追加（コメントのみの場合は除外）
fn push_statement(statements: &mut Vec<Statement>, text: &str, line: usize) {
    let text = text.trim_end();
    if text.is_empty() || tokenize(text, line).is_empty() {
        return;
    }
    statements.push(Statement {
        text: text.to_string(),
        line,
    });
}

/// 直前の文字が識別子を構成する文字かどうか
fn follows_identifier_char(chars: &[(usize, char)], index: usize) -> bool {
    index
        .checked_sub(1)
        .and_then(|prev| chars.get(prev))
        .is_some_and(|(_, ch)| ch.is_alphanumeric() || *ch == '_' || *ch == '$')
}

/// 指定位置から始まるドル引用符タグ（`$tag$` / `$$`）を取得
fn dollar_tag_at(sql: &str, byte_pos: usize) -> Option<&str> {
    let rest = &sql[byte_pos + 1..];
    let end = rest.find('$')?;
    let inner = &rest[..end];
    let valid = inner.chars().all(|ch| ch.is_alphanumeric() || ch == '_')
        && !inner.starts_with(|ch: char| ch.is_ascii_digit());
    if valid {
        Some(&sql[byte_pos..byte_pos + end + 2])
    } else {
        None
    }
}

/// ステートメントをトークン列に変換
///
/// コメントと空白は読み飛ばします。閉じられていないクォートは末尾までを1トークンとします。
///
/// # Arguments
///
/// * `text` - ステートメントのテキスト
/// * `first_line` - テキスト先頭の行番号
pub fn tokenize(text: &str, first_line: usize) -> Vec<Token> {
    let mut tokens = Vec::new();
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut i = 0;
    let mut line = first_line;

    while i < chars.len() {
        let (start, c) = chars[i];
        let next = chars.get(i + 1).map(|(_, ch)| *ch);
        let token_line = line;

        let (kind, consumed) = if c.is_whitespace() {
            (None, 1)
        } else if c == '-' && next == Some('-') {
            let len = chars[i..]
                .iter()
                .position(|(_, ch)| *ch == '\n')
                .unwrap_or(chars.len() - i);
            (None, len)
        } else if c == '/' && next == Some('*') {
            (None, block_comment_len(&chars[i..]))
        } else if c == '\'' {
            (Some(TokenKind::StringLiteral), quoted_len(&chars[i..], '\''))
        } else if c == '"' {
            (Some(TokenKind::QuotedIdentifier), quoted_len(&chars[i..], '"'))
        } else if c == '$' {
            match dollar_tag_at(text, start) {
                Some(tag) => (Some(TokenKind::DollarString), dollar_string_len(text, &chars[i..], tag)),
                None => (Some(TokenKind::Symbol), 1),
            }
        } else if c.is_alphabetic() || c == '_' {
            let len = chars[i..]
                .iter()
                .take_while(|(_, ch)| ch.is_alphanumeric() || *ch == '_' || *ch == '$')
                .count();
            (Some(TokenKind::Word), len)
        } else if c.is_ascii_digit() {
            let len = chars[i..]
                .iter()
                .take_while(|(_, ch)| ch.is_ascii_alphanumeric() || *ch == '.')
                .count();
            (Some(TokenKind::Number), len)
        } else {
            (Some(TokenKind::Symbol), 1)
        };

        let end_index = (i + consumed.max(1)).min(chars.len());
        let end = chars.get(end_index).map_or(text.len(), |(pos, _)| *pos);
        line += chars[i..end_index].iter().filter(|(_, ch)| *ch == '\n').count();

        if let Some(kind) = kind {
            tokens.push(Token {
                kind,
                text: text[start..end].to_string(),
                start,
                end,
                line: token_line,
            });
        }
        i = end_index;
    }

    tokens
}

/// クォートされた範囲の文字数（二重化によるエスケープに対応）
fn quoted_len(chars: &[(usize, char)], quote: char) -> usize {
    let mut i = 1;
    while i < chars.len() {
        if chars[i].1 == quote {
            if chars.get(i + 1).map(|(_, ch)| *ch) == Some(quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    chars.len()
}

/// ブロックコメントの文字数（ネスト対応）
fn block_comment_len(chars: &[(usize, char)]) -> usize {
    let mut depth: u32 = 1;
    let mut i = 2;
    while i < chars.len() && depth > 0 {
        let next = chars.get(i + 1).map(|(_, ch)| *ch);
        if chars[i].1 == '/' && next == Some('*') {
            depth += 1;
            i += 2;
        } else if chars[i].1 == '*' && next == Some('/') {
            depth -= 1;
            i += 2;
        } else {
            i += 1;
        }
    }
    i.min(chars.len())
}

/// ドル引用符文字列の文字数（開始タグから終了タグまで）
fn dollar_string_len(text: &str, chars: &[(usize, char)], tag: &str) -> usize {
    let open = tag.chars().count();
    let mut i = open;
    while i < chars.len() {
        let (pos, ch) = chars[i];
        if ch == '$' && text[pos..].starts_with(tag) {
            return i + open;
        }
        i += 1;
    }
    chars.len()
}

/// トークン列上のカーソル
///
/// 再帰下降パーサーがトークンを読み進めるためのヘルパーです。
#[derive(Debug, Clone)]
pub struct TokenCursor<'a> {
    tokens: &'a [Token],
    position: usize,
}

impl<'a> TokenCursor<'a> {
    /// 新しいカーソルを作成
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// 現在位置
    pub fn position(&self) -> usize {
        self.position
    }

    /// 終端に達したかどうか
    pub fn is_at_end(&self) -> bool {
        self.position >= self.tokens.len()
    }

    /// 現在のトークンを取得（読み進めない）
    pub fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.position)
    }

    /// n個先のトークンを取得（読み進めない）
    pub fn peek_nth(&self, n: usize) -> Option<&'a Token> {
        self.tokens.get(self.position + n)
    }

    /// 現在のトークンを取得して読み進める
    pub fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.position);
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    /// 現在のトークンが指定キーワードかどうか
    pub fn peek_keyword(&self, keyword: &str) -> bool {
        self.peek().is_some_and(|t| t.is_keyword(keyword))
    }

    /// 現在のトークンが指定記号かどうか
    pub fn peek_symbol(&self, symbol: char) -> bool {
        self.peek().is_some_and(|t| t.is_symbol(symbol))
    }

    /// 指定キーワードであれば読み進める
    pub fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    /// キーワード列がすべて一致する場合のみまとめて読み進める
    pub fn eat_keywords(&mut self, keywords: &[&str]) -> bool {
        let matched = keywords
            .iter()
            .enumerate()
            .all(|(offset, keyword)| self.peek_nth(offset).is_some_and(|t| t.is_keyword(keyword)));
        if matched {
            self.position += keywords.len();
        }
        matched
    }

    /// `name` または `schema.name` 形式のオブジェクト名を読み取る
    pub fn object_name(&mut self) -> Option<String> {
        let first = self.peek().filter(|t| t.is_identifier())?;
        self.position += 1;
        let mut parts = vec![first.identifier()?];

        while self.peek_symbol('.')
            && self.peek_nth(1).is_some_and(|t| t.is_identifier())
        {
            self.position += 1;
            if let Some(part) = self.advance().and_then(|t| t.identifier()) {
                parts.push(part);
            }
        }

        Some(parts.join("."))
    }

    /// 現在位置の括弧グループを読み取り、内側のトークンを返す
    ///
    /// 現在のトークンが `(` でない場合、または対応する `)` がない場合は None を返し、
    /// カーソルは移動しません。
    pub fn group(&mut self) -> Option<&'a [Token]> {
        let close = matching_close(self.tokens, self.position)?;
        let inner = &self.tokens[self.position + 1..close];
        self.position = close + 1;
        Some(inner)
    }
}

/// `open` 位置の開き括弧に対応する閉じ括弧の位置を探す
///
/// `(` と `[` の両方に対応します。
pub fn matching_close(tokens: &[Token], open: usize) -> Option<usize> {
    let (open_symbol, close_symbol) = match tokens.get(open) {
        Some(t) if t.is_symbol('(') => ('(', ')'),
        Some(t) if t.is_symbol('[') => ('[', ']'),
        _ => return None,
    };

    let mut depth = 0usize;
    for (index, token) in tokens.iter().enumerate().skip(open) {
        if token.is_symbol(open_symbol) {
            depth += 1;
        } else if token.is_symbol(close_symbol) {
            depth -= 1;
            if depth == 0 {
                return Some(index);
            }
        }
    }
    None
}

/// トップレベル（括弧の外）のカンマでトークン列を分割
pub fn split_top_level_commas(tokens: &[Token]) -> Vec<&[Token]> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut begin = 0;

    for (index, token) in tokens.iter().enumerate() {
        if token.is_symbol('(') || token.is_symbol('[') {
            depth += 1;
        } else if token.is_symbol(')') || token.is_symbol(']') {
            depth = depth.saturating_sub(1);
        } else if depth == 0 && token.is_symbol(',') {
            segments.push(&tokens[begin..index]);
            begin = index + 1;
        }
    }
    segments.push(&tokens[begin..]);

    segments
}

/// トークン列が覆う元テキストを取得
pub fn source_text<'s>(source: &'s str, tokens: &[Token]) -> &'s str {
    match (tokens.first(), tokens.last()) {
        (Some(first), Some(last)) => &source[first.start..last.end],
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(statements: &[Statement]) -> Vec<&str> {
        statements.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn test_split_simple_statements() {
        let sql = "CREATE TABLE a (id INT);\nCREATE TABLE b (id INT);";
        let statements = split_statements(sql);
        assert_eq!(
            texts(&statements),
            vec!["CREATE TABLE a (id INT)", "CREATE TABLE b (id INT)"]
        );
        assert_eq!(statements[0].line, 1);
        assert_eq!(statements[1].line, 2);
    }

    #[test]
    fn test_split_ignores_semicolon_in_quotes_and_comments() {
        let sql = "INSERT INTO t VALUES ('a;b');\n-- comment; here\nSELECT \"x;y\" FROM t; /* block; */ SELECT 1";
        let statements = split_statements(sql);
        assert_eq!(statements.len(), 3);
        assert_eq!(statements[0].text, "INSERT INTO t VALUES ('a;b')");
        assert!(statements[1].text.ends_with("SELECT \"x;y\" FROM t"));
        assert_eq!(statements[1].line, 2);
        assert!(statements[2].text.ends_with("SELECT 1"));
    }

    #[test]
    fn test_split_dollar_quoted_body() {
        let sql = "CREATE FUNCTION f() RETURNS trigger AS $body$\nBEGIN\n  NEW.x := 1;\n  RETURN NEW;\nEND;\n$body$ LANGUAGE plpgsql;\nCREATE TABLE t (id INT);";
        let statements = split_statements(sql);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].text.contains("RETURN NEW;"));
        assert_eq!(statements[1].text, "CREATE TABLE t (id INT)");
        assert_eq!(statements[1].line, 7);
    }

    #[test]
    fn test_split_skips_comment_only_statements() {
        let sql = "-- header only\n;\n/* nested /* comment */ still */;";
        assert!(split_statements(sql).is_empty());
    }

    #[test]
    fn test_tokenize_kinds_and_lines() {
        let tokens = tokenize("email VARCHAR(255)\n  DEFAULT 'a''b' -- note\n, \"Order\" 3.5", 10);
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Word,
                TokenKind::Word,
                TokenKind::Symbol,
                TokenKind::Number,
                TokenKind::Symbol,
                TokenKind::Word,
                TokenKind::StringLiteral,
                TokenKind::Symbol,
                TokenKind::QuotedIdentifier,
                TokenKind::Number,
            ]
        );
        assert_eq!(tokens[0].line, 10);
        assert_eq!(tokens[5].line, 11);
        assert_eq!(tokens[6].text, "'a''b'");
        assert_eq!(tokens[7].line, 12);
        assert_eq!(tokens[8].identifier().as_deref(), Some("\"Order\""));
    }

    #[test]
    fn test_split_dollar_inside_identifier_is_not_quote() {
        let sql = "CREATE TABLE a (x$y$ INT);\nCREATE TABLE b (id INT);";
        let statements = split_statements(sql);
        assert_eq!(
            texts(&statements),
            vec!["CREATE TABLE a (x$y$ INT)", "CREATE TABLE b (id INT)"]
        );
        assert_eq!(statements[1].line, 2);
    }

    #[test]
    fn test_quoted_identifier_keeps_quotes_only_when_needed() {
        let tokens = tokenize("\"patients\" \"user\" \"Note Text\" \"a\"\"b\"", 1);
        let names: Vec<String> = tokens.iter().filter_map(|t| t.identifier()).collect();
        assert_eq!(names, vec!["patients", "\"user\"", "\"Note Text\"", "\"a\"\"b\""]);
    }

    #[test]
    fn test_tokenize_dollar_string_is_single_token() {
        let tokens = tokenize("AS $$ SELECT 1; $$ LANGUAGE sql", 1);
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[1].kind, TokenKind::DollarString);
        assert_eq!(tokens[1].text, "$$ SELECT 1; $$");
    }

    #[test]
    fn test_positional_parameter_is_not_dollar_quote() {
        let tokens = tokenize("WHERE id = $1 AND x = $2", 1);
        assert!(tokens.iter().all(|t| t.kind != TokenKind::DollarString));
    }

    #[test]
    fn test_cursor_object_name_and_group() {
        let tokens = tokenize("public.\"Users\" (id INT, name TEXT) rest", 1);
        let mut cursor = TokenCursor::new(&tokens);

        assert_eq!(cursor.object_name().as_deref(), Some("public.\"Users\""));
        let inner = cursor.group().unwrap();
        let segments = split_top_level_commas(inner);
        assert_eq!(segments.len(), 2);
        assert!(cursor.eat_keyword("REST"));
        assert!(cursor.is_at_end());
    }

    #[test]
    fn test_split_top_level_commas_respects_parentheses() {
        let text = "price NUMERIC(10, 2), CHECK (a IN (1, 2))";
        let tokens = tokenize(text, 1);
        let segments = split_top_level_commas(&tokens);
        assert_eq!(segments.len(), 2);
        assert_eq!(source_text(text, segments[0]), "price NUMERIC(10, 2)");
        assert_eq!(source_text(text, segments[1]), "CHECK (a IN (1, 2))");
    }

    #[test]
    fn test_unclosed_group_returns_none() {
        let tokens = tokenize("(id INT", 1);
        let mut cursor = TokenCursor::new(&tokens);
        assert!(cursor.group().is_none());
        assert_eq!(cursor.position(), 0);
    }
}
