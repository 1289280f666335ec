// SQLクォートユーティリティ
//
// 各データベース方言用の識別子クォート関数と、文字列リテラルのエスケープを提供します。
// コネクターとsql_generatorの両方から使用される共有モジュールです。

use crate::core::config::Dialect;

/// ANSI用識別子クォート（ダブルクォート）
///
/// 識別子内のダブルクォートは二重にエスケープします。
///
/// # Examples
/// ```
/// use schemaport::adapters::sql_quote::quote_identifier_ansi;
/// assert_eq!(quote_identifier_ansi("users"), r#""users""#);
/// assert_eq!(quote_identifier_ansi(r#"table"name"#), r#""table""name""#);
/// ```
pub fn quote_identifier_ansi(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// MySQL用識別子クォート（バッククォート）
///
/// # Examples
/// ```
/// use schemaport::adapters::sql_quote::quote_identifier_mysql;
/// assert_eq!(quote_identifier_mysql("table`name"), "`table``name`");
/// ```
pub fn quote_identifier_mysql(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Jet / SQL Server用識別子クォート（角括弧）
///
/// 識別子内の閉じ角括弧は二重にエスケープします。
///
/// # Examples
/// ```
/// use schemaport::adapters::sql_quote::quote_identifier_bracket;
/// assert_eq!(quote_identifier_bracket("Order Details"), "[Order Details]");
/// assert_eq!(quote_identifier_bracket("a]b"), "[a]]b]");
/// ```
pub fn quote_identifier_bracket(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

/// 方言に応じて識別子をクォート
pub fn quote_identifier(dialect: Dialect, name: &str) -> String {
    match dialect {
        Dialect::SQLite | Dialect::PostgreSQL => quote_identifier_ansi(name),
        Dialect::MySQL => quote_identifier_mysql(name),
        Dialect::SqlServer | Dialect::Jet => quote_identifier_bracket(name),
    }
}

/// 文字列値内のクォート文字をエスケープ
///
/// 内部のクォート文字を二重にし、値全体を囲むクォートはそのまま残します。
///
/// # Examples
/// ```
/// use schemaport::adapters::sql_quote::escape_literal;
/// assert_eq!(escape_literal("O'Brien", '\''), "O''Brien");
/// assert_eq!(escape_literal("'it's'", '\''), "'it''s'");
/// ```
pub fn escape_literal(value: &str, quote: char) -> String {
    let doubled = format!("{}{}", quote, quote);
    let enclosed = value.len() >= 2 * quote.len_utf8()
        && value.starts_with(quote)
        && value.ends_with(quote);

    if enclosed {
        let inner = &value[quote.len_utf8()..value.len() - quote.len_utf8()];
        format!("{}{}{}", quote, inner.replace(quote, &doubled), quote)
    } else {
        value.replace(quote, &doubled)
    }
}

/// SQL文字列リテラルを作成（シングルクォートで囲む）
pub fn string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier_ansi_with_embedded_quote() {
        assert_eq!(quote_identifier_ansi("users"), r#""users""#);
        assert_eq!(quote_identifier_ansi("\""), "\"\"\"\"");
        assert_eq!(quote_identifier_ansi(r#"a"b"c"#), r#""a""b""c""#);
        assert_eq!(quote_identifier_ansi(""), r#""""#);
    }

    #[test]
    fn test_quote_identifier_mysql_with_embedded_backtick() {
        assert_eq!(quote_identifier_mysql("users"), "`users`");
        assert_eq!(quote_identifier_mysql("`"), "````");
        // MySQLではダブルクォートはエスケープ不要
        assert_eq!(quote_identifier_mysql(r#"table"name"#), r#"`table"name`"#);
    }

    #[test]
    fn test_quote_identifier_bracket() {
        assert_eq!(quote_identifier_bracket("Categories"), "[Categories]");
        assert_eq!(quote_identifier_bracket("Order Details"), "[Order Details]");
        assert_eq!(quote_identifier_bracket("]"), "[]]]");
        // 開き角括弧はそのまま
        assert_eq!(quote_identifier_bracket("a[b"), "[a[b]");
    }

    #[test]
    fn test_quote_identifier_dispatch() {
        assert_eq!(quote_identifier(Dialect::SQLite, "t"), "\"t\"");
        assert_eq!(quote_identifier(Dialect::PostgreSQL, "t"), "\"t\"");
        assert_eq!(quote_identifier(Dialect::MySQL, "t"), "`t`");
        assert_eq!(quote_identifier(Dialect::SqlServer, "t"), "[t]");
        assert_eq!(quote_identifier(Dialect::Jet, "t"), "[t]");
    }

    #[test]
    fn test_escape_literal_doubles_inner_quotes() {
        assert_eq!(escape_literal("O'Brien", '\''), "O''Brien");
        assert_eq!(escape_literal("already 'quoted'", '\''), "already ''quoted''");
        assert_eq!(escape_literal("plain", '\''), "plain");
    }

    #[test]
    fn test_escape_literal_keeps_enclosing_quotes() {
        assert_eq!(escape_literal("'O'Brien'", '\''), "'O''Brien'");
        assert_eq!(escape_literal("'already 'quoted''", '\''), "'already ''quoted'''");
        assert_eq!(escape_literal("''", '\''), "''");
        assert_eq!(escape_literal("'", '\''), "''");
    }

    #[test]
    fn test_escape_literal_other_quote_character() {
        assert_eq!(escape_literal("say \"hi\"", '"'), "say \"\"hi\"\"");
        assert_eq!(escape_literal("\"a\"b\"", '"'), "\"a\"\"b\"");
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(string_literal("O'Brien"), "'O''Brien'");
        assert_eq!(string_literal(""), "''");
    }
}
