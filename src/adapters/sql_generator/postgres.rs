// PostgreSQL用SQLジェネレーター
//
// スキーマ定義からPostgreSQL用のDDL文を生成します。

use crate::adapters::sql_generator::{sized_type, SqlGenerator};
use crate::core::config::Dialect;
use crate::core::schema::{Column, ColumnType};

/// PostgreSQL用SQLジェネレーター
#[derive(Debug, Clone)]
pub struct PostgresSqlGenerator {}

impl PostgresSqlGenerator {
    /// 新しいPostgresSqlGeneratorを作成
    pub fn new() -> Self {
        Self {}
    }
}

impl SqlGenerator for PostgresSqlGenerator {
    fn dialect(&self) -> Dialect {
        Dialect::PostgreSQL
    }

    fn map_column_type(&self, column: &Column) -> String {
        match column.column_type {
            ColumnType::AutoNumber => "SERIAL".to_string(),
            ColumnType::Integer => "INTEGER".to_string(),
            ColumnType::BigInt => "BIGINT".to_string(),
            // PostgreSQLに1バイト整数はない
            ColumnType::SmallInt | ColumnType::TinyInt => "SMALLINT".to_string(),
            ColumnType::Decimal => "NUMERIC".to_string(),
            ColumnType::Float => "REAL".to_string(),
            ColumnType::Double => "DOUBLE PRECISION".to_string(),
            ColumnType::Currency => "NUMERIC(19, 4)".to_string(),
            ColumnType::Boolean => "BOOLEAN".to_string(),
            ColumnType::Char => sized_type("CHAR", column),
            ColumnType::VarChar | ColumnType::NVarChar => sized_type("VARCHAR", column),
            ColumnType::Binary | ColumnType::Blob | ColumnType::OleObject => "BYTEA".to_string(),
            ColumnType::DateTime | ColumnType::Timestamp => "TIMESTAMP".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::Time => "TIME".to_string(),
            ColumnType::Guid => "UUID".to_string(),
            ColumnType::Xml => "XML".to_string(),
            ColumnType::Json => "JSONB".to_string(),
            ColumnType::Memo | ColumnType::Other => "TEXT".to_string(),
        }
    }
}

impl Default for PostgresSqlGenerator {
    fn default() -> Self {
        Self::new()
    }
}
