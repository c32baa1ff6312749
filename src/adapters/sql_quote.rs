// SQL識別子クォートユーティリティ
//
// 抽出した識別子をPostgreSQLのDDLにそのまま書き戻せる形に整えます。
// 小文字の通常識別子はそのまま、それ以外（大文字を含む、予約語、空白など）は
// ダブルクォートで囲みます。

/// PostgreSQLの予約語（識別子として使うにはクォートが必要）
const RESERVED_KEYWORDS: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric", "both",
    "case", "cast", "check", "collate", "column", "constraint", "create", "current_catalog",
    "current_date", "current_role", "current_time", "current_timestamp", "current_user",
    "default", "deferrable", "desc", "distinct", "do", "else", "end", "except", "false",
    "fetch", "for", "foreign", "from", "grant", "group", "having", "in", "initially",
    "intersect", "into", "lateral", "leading", "limit", "localtime", "localtimestamp", "not",
    "null", "offset", "on", "only", "or", "order", "placing", "primary", "references",
    "returning", "select", "session_user", "some", "symmetric", "system_user", "table", "then",
    "to", "trailing", "true", "union", "unique", "user", "using", "variadic", "when", "where",
    "window", "with",
];

/// PostgreSQL用識別子クォート（ダブルクォート）
///
/// 識別子内のダブルクォートは二重にエスケープします。
pub fn quote_identifier_postgres(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// クォートなしで書ける識別子かどうか
///
/// 先頭が小文字ASCIIまたは `_`、以降が小文字ASCII・数字・`_`・`$` で、予約語でないもの。
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_lowercase() || first == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '$')
        && !RESERVED_KEYWORDS.contains(&name)
}

/// 必要な場合のみクォート
pub fn quote_identifier_if_needed(name: &str) -> String {
    if is_plain_identifier(name) {
        name.to_string()
    } else {
        quote_identifier_postgres(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier_postgres() {
        assert_eq!(quote_identifier_postgres("users"), r#""users""#);
        assert_eq!(quote_identifier_postgres(r#"table"name"#), r#""table""name""#);
    }

    #[test]
    fn test_plain_identifier_stays_bare() {
        assert_eq!(quote_identifier_if_needed("patients"), "patients");
        assert_eq!(quote_identifier_if_needed("_tmp2"), "_tmp2");
        assert_eq!(quote_identifier_if_needed("x$y$"), "x$y$");
    }

    #[test]
    fn test_reserved_mixed_case_and_spaces_are_quoted() {
        assert_eq!(quote_identifier_if_needed("user"), r#""user""#);
        assert_eq!(quote_identifier_if_needed("Order"), r#""Order""#);
        assert_eq!(quote_identifier_if_needed("Note Text"), r#""Note Text""#);
        assert_eq!(quote_identifier_if_needed("2fa"), r#""2fa""#);
        assert_eq!(quote_identifier_if_needed(""), r#""""#);
    }
}
