// SQLite用SQLジェネレーター
//
// スキーマ定義からSQLite用のDDL文を生成します。
// SQLiteはALTER TABLEの機能が制限されているため、制約はCREATE TABLE内で定義します。

use crate::adapters::sql_generator::{normalize_default, sized_type, SqlGenerator};
use crate::core::config::Dialect;
use crate::core::schema::{Column, ColumnType, Table};

/// SQLite用SQLジェネレーター
#[derive(Debug, Clone)]
pub struct SqliteSqlGenerator {}

impl SqliteSqlGenerator {
    /// 新しいSqliteSqlGeneratorを作成
    pub fn new() -> Self {
        Self {}
    }
}

/// 括弧なしで DEFAULT に書けるリテラルかどうか
fn is_plain_literal(value: &str) -> bool {
    let upper = value.to_ascii_uppercase();
    value.starts_with('\'')
        || value.starts_with('(')
        || value.parse::<f64>().is_ok()
        || upper.starts_with("X'")
        || matches!(
            upper.as_str(),
            "NULL" | "TRUE" | "FALSE" | "CURRENT_TIMESTAMP" | "CURRENT_DATE" | "CURRENT_TIME"
        )
}

impl SqlGenerator for SqliteSqlGenerator {
    fn dialect(&self) -> Dialect {
        Dialect::SQLite
    }

    /// ColumnTypeをSQLiteの型文字列にマッピング
    ///
    /// 型アフィニティは宣言名から決まるため、読み戻したときに同じ論理型に
    /// 分類される名前を選びます。
    fn map_column_type(&self, column: &Column) -> String {
        match column.column_type {
            // SQLiteの自動採番は INTEGER PRIMARY KEY に限られる
            ColumnType::AutoNumber | ColumnType::Integer => "INTEGER".to_string(),
            ColumnType::BigInt => "BIGINT".to_string(),
            ColumnType::SmallInt => "SMALLINT".to_string(),
            ColumnType::TinyInt => "TINYINT".to_string(),
            ColumnType::Decimal => "DECIMAL".to_string(),
            ColumnType::Float => "FLOAT".to_string(),
            ColumnType::Double => "DOUBLE".to_string(),
            ColumnType::Currency => "CURRENCY".to_string(),
            ColumnType::Boolean => "BOOLEAN".to_string(),
            ColumnType::Char => sized_type("CHAR", column),
            ColumnType::VarChar => sized_type("VARCHAR", column),
            ColumnType::NVarChar => sized_type("NVARCHAR", column),
            ColumnType::Binary | ColumnType::Blob | ColumnType::OleObject => "BLOB".to_string(),
            ColumnType::DateTime => "DATETIME".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::Time => "TIME".to_string(),
            ColumnType::Timestamp => "TIMESTAMP".to_string(),
            ColumnType::Guid => "GUID".to_string(),
            ColumnType::Xml => "XML".to_string(),
            ColumnType::Json => "JSON".to_string(),
            ColumnType::Memo | ColumnType::Other => "TEXT".to_string(),
        }
    }

    fn is_inline_primary_key(&self, table: &Table, column: &Column) -> bool {
        column.is_auto_number() && table.primary_key.as_deref() == Some(column.name.as_str())
    }

    /// 関数呼び出しなどの式は括弧で囲む
    fn format_default(&self, value: &str) -> String {
        let normalized = normalize_default(value);
        if is_plain_literal(&normalized) {
            normalized
        } else {
            format!("({})", normalized)
        }
    }
}

impl Default for SqliteSqlGenerator {
    fn default() -> Self {
        Self::new()
    }
}
