// SQL生成アダプター
//
// スキーマ定義から各データベース方言用のCREATE TABLE文を生成するアダプター層。
// 列・主キー・外部キーの組み立てはトレイトの既定実装で共通化し、
// 方言ごとの実装は型マッピングとクォート規則だけを提供します。

pub mod jet;
pub mod mysql;
pub mod postgres;
pub mod sqlite;
pub mod sqlserver;

pub use jet::JetSqlGenerator;
pub use mysql::MySqlSqlGenerator;
pub use postgres::PostgresSqlGenerator;
pub use sqlite::SqliteSqlGenerator;
pub use sqlserver::SqlServerSqlGenerator;

use crate::adapters::sql_quote::{escape_literal, quote_identifier};
use crate::core::config::Dialect;
use crate::core::schema::{Column, ForeignKey, Table};

/// 長さ未指定の文字型に使う既定の長さ
pub const DEFAULT_CHARACTER_LENGTH: u32 = 255;

/// SQLジェネレータートレイト
///
/// 各データベース方言用のSQLジェネレーターが実装すべきインターフェース。
pub trait SqlGenerator {
    /// 出力する方言
    fn dialect(&self) -> Dialect;

    /// カラムの論理型を方言の型キーワードにマッピング
    ///
    /// 自動採番カラムの場合は IDENTITY などのキーワードを含めて返します。
    fn map_column_type(&self, column: &Column) -> String;

    /// 識別子をクォート
    fn quote_identifier(&self, name: &str) -> String {
        quote_identifier(self.dialect(), name)
    }

    /// カラム定義内に主キーを直接書くかどうか
    fn is_inline_primary_key(&self, _table: &Table, _column: &Column) -> bool {
        false
    }

    /// 主キー制約名
    fn primary_key_name(&self, table: &Table) -> String {
        format!("PK_{}", table.name)
    }

    /// デフォルト値の表現を整形
    fn format_default(&self, value: &str) -> String {
        normalize_default(value)
    }

    /// カラム定義のSQL文字列を生成
    ///
    /// `<名前> <型> [UNIQUE] [NOT NULL | PRIMARY KEY AUTOINCREMENT] [DEFAULT <値>]`
    ///
    /// # Arguments
    ///
    /// * `table` - カラムを所有するテーブル
    /// * `column` - カラム定義
    fn generate_column_definition(&self, table: &Table, column: &Column) -> String {
        let mut parts = vec![
            self.quote_identifier(&column.name),
            self.map_column_type(column),
        ];

        let is_primary_key = table.primary_key.as_deref() == Some(column.name.as_str());
        if column.unique && !is_primary_key {
            parts.push("UNIQUE".to_string());
        }

        if self.is_inline_primary_key(table, column) {
            parts.push("PRIMARY KEY AUTOINCREMENT".to_string());
        } else if !column.nullable {
            parts.push("NOT NULL".to_string());
        }

        // 自動採番カラムは採番の仕組み自体がデフォルト値になる
        if let Some(default_value) = column.default_value.as_deref() {
            if !column.is_auto_number() && !default_value.trim().is_empty() {
                parts.push(format!("DEFAULT {}", self.format_default(default_value)));
            }
        }

        parts.join(" ")
    }

    /// 外部キー制約を生成
    ///
    /// NoAction の場合は ON 句を省略します。
    fn generate_foreign_key(&self, foreign_key: &ForeignKey) -> String {
        let mut sql = format!(
            "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}({})",
            self.quote_identifier(&foreign_key.name),
            self.quote_identifier(&foreign_key.child_column),
            self.quote_identifier(&foreign_key.parent_table),
            self.quote_identifier(&foreign_key.parent_column)
        );

        if let Some(action) = foreign_key.on_delete.as_sql() {
            sql.push_str(&format!(" ON DELETE {}", action));
        }
        if let Some(action) = foreign_key.on_update.as_sql() {
            sql.push_str(&format!(" ON UPDATE {}", action));
        }

        sql
    }

    /// 末尾の主キー制約を生成
    ///
    /// 主キーがない場合、またはカラム定義内に主キーを書いた場合は None。
    fn generate_primary_key(&self, table: &Table) -> Option<String> {
        let primary_key = table.primary_key.as_deref()?;
        if let Some(column) = table.get_column(primary_key) {
            if self.is_inline_primary_key(table, column) {
                return None;
            }
        }

        Some(format!(
            "CONSTRAINT {} PRIMARY KEY ({})",
            self.quote_identifier(&self.primary_key_name(table)),
            self.quote_identifier(primary_key)
        ))
    }

    /// CREATE TABLE文を生成
    ///
    /// 文は `;` で終わり、最後の文以外は空行を1つ続けます。
    ///
    /// # Arguments
    ///
    /// * `table` - テーブル定義
    /// * `is_last` - スクリプト内の最後の文かどうか
    fn generate_create_table(&self, table: &Table, is_last: bool) -> String {
        let mut elements: Vec<String> = table
            .ordered_columns()
            .into_iter()
            .map(|column| format!("    {}", self.generate_column_definition(table, column)))
            .collect();

        if let Some(primary_key) = self.generate_primary_key(table) {
            elements.push(format!("    {}", primary_key));
        }

        for foreign_key in &table.foreign_keys {
            elements.push(format!("    {}", self.generate_foreign_key(foreign_key)));
        }

        let mut sql = format!(
            "CREATE TABLE {} (\n{}\n);\n",
            self.quote_identifier(&table.name),
            elements.join(",\n")
        );
        if !is_last {
            sql.push('\n');
        }
        sql
    }

    /// 並べ替え済みテーブル列からスキーマ全体のスクリプトを生成
    fn generate_schema(&self, tables: &[&Table]) -> String {
        let last = tables.len().saturating_sub(1);
        tables
            .iter()
            .enumerate()
            .map(|(i, table)| self.generate_create_table(table, i == last))
            .collect()
    }
}

/// 方言に応じたSQLジェネレーターを作成
pub fn create_generator(dialect: Dialect) -> Box<dyn SqlGenerator> {
    match dialect {
        Dialect::SQLite => Box::new(SqliteSqlGenerator::new()),
        Dialect::MySQL => Box::new(MySqlSqlGenerator::new()),
        Dialect::PostgreSQL => Box::new(PostgresSqlGenerator::new()),
        Dialect::SqlServer => Box::new(SqlServerSqlGenerator::new()),
        Dialect::Jet => Box::new(JetSqlGenerator::new()),
    }
}

/// 文字型の長さ付き型キーワードを生成
///
/// 長さ0（不明）の場合は DEFAULT_CHARACTER_LENGTH を使います。
pub fn sized_type(keyword: &str, column: &Column) -> String {
    let length = if column.length == 0 {
        DEFAULT_CHARACTER_LENGTH
    } else {
        column.length
    };
    format!("{}({})", keyword, length)
}

/// カタログから読んだデフォルト値を正規化
///
/// シングルクォートで囲まれた値の内部に対になっていないクォートがある場合だけ
/// エスケープし、それ以外のSQL式はそのまま返します。
pub fn normalize_default(value: &str) -> String {
    let trimmed = value.trim();
    let enclosed = trimmed.len() >= 2 && trimmed.starts_with('\'') && trimmed.ends_with('\'');

    if enclosed && !is_escaped_literal_body(&trimmed[1..trimmed.len() - 1]) {
        escape_literal(trimmed, '\'')
    } else {
        trimmed.to_string()
    }
}

/// 文字列リテラルの中身で、すべてのクォートが二重化されているか
fn is_escaped_literal_body(body: &str) -> bool {
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\'' && chars.next_if_eq(&'\'').is_none() {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{ColumnType, ConstraintAction};

    fn sections_table() -> Table {
        let mut table = Table::new("Sections");
        table.add_column(
            Column::new("id", ColumnType::AutoNumber, false)
                .with_position(1)
                .primary(),
        );
        table.add_column(Column::new("category_id", ColumnType::Integer, false).with_position(2));
        table.add_column(
            Column::new("title", ColumnType::VarChar, true)
                .with_length(80)
                .with_position(3),
        );

        let mut fk = ForeignKey::new(
            "FK_Sections_Categories",
            "Sections",
            "category_id",
            "Categories",
            "id",
        );
        fk.on_delete = ConstraintAction::Cascade;
        table.add_foreign_key(fk);
        table
    }

    #[test]
    fn test_normalize_default() {
        assert_eq!(normalize_default("'O'Brien'"), "'O''Brien'");
        assert_eq!(normalize_default("'O''Brien'"), "'O''Brien'");
        assert_eq!(normalize_default(" 0 "), "0");
        assert_eq!(normalize_default("CURRENT_TIMESTAMP"), "CURRENT_TIMESTAMP");
        assert_eq!(normalize_default("''"), "''");
    }

    #[test]
    fn test_sized_type_uses_default_length() {
        let named = Column::new("name", ColumnType::VarChar, true).with_length(50);
        assert_eq!(sized_type("VARCHAR", &named), "VARCHAR(50)");

        let unbounded = Column::new("name", ColumnType::VarChar, true);
        assert_eq!(sized_type("VARCHAR", &unbounded), "VARCHAR(255)");
    }

    #[test]
    fn test_create_generator_dispatch() {
        for dialect in [
            Dialect::SQLite,
            Dialect::MySQL,
            Dialect::PostgreSQL,
            Dialect::SqlServer,
            Dialect::Jet,
        ] {
            assert_eq!(create_generator(dialect).dialect(), dialect);
        }
    }

    #[test]
    fn test_foreign_key_omits_no_action() {
        let generator = PostgresSqlGenerator::new();
        let table = sections_table();

        assert_eq!(
            generator.generate_foreign_key(&table.foreign_keys[0]),
            r#"CONSTRAINT "FK_Sections_Categories" FOREIGN KEY ("category_id") REFERENCES "Categories"("id") ON DELETE CASCADE"#
        );
    }

    #[test]
    fn test_schema_script_separates_statements_with_blank_line() {
        let generator = PostgresSqlGenerator::new();
        let mut categories = Table::new("Categories");
        categories.add_column(
            Column::new("id", ColumnType::AutoNumber, false)
                .with_position(1)
                .primary(),
        );
        let sections = sections_table();

        let script = generator.generate_schema(&[&categories, &sections]);
        assert!(script.starts_with("CREATE TABLE \"Categories\" (\n"));
        assert!(script.contains(");\n\nCREATE TABLE \"Sections\" (\n"));
        assert!(script.ends_with(");\n"));
        assert!(!script.ends_with(");\n\n"));
    }

    #[test]
    fn test_generate_schema_empty() {
        let generator = SqliteSqlGenerator::new();
        assert_eq!(generator.generate_schema(&[]), "");
    }

    #[test]
    fn test_unique_is_not_repeated_on_primary_key() {
        let generator = SqlServerSqlGenerator::new();
        let mut table = Table::new("Makers");
        table.add_column(Column::new("id", ColumnType::Integer, false).primary().unique());
        table.add_column(
            Column::new("code", ColumnType::Char, false)
                .with_length(4)
                .unique(),
        );

        let id = generator.generate_column_definition(&table, table.get_column("id").unwrap());
        assert_eq!(id, "[id] INT NOT NULL");

        let code = generator.generate_column_definition(&table, table.get_column("code").unwrap());
        assert_eq!(code, "[code] CHAR(4) UNIQUE NOT NULL");
    }
}
