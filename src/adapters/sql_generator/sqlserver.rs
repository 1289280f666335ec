// SQL Server用SQLジェネレーター
//
// スキーマ定義からSQL Server用のDDL文を生成します。

use crate::adapters::sql_generator::{sized_type, SqlGenerator};
use crate::core::config::Dialect;
use crate::core::schema::{Column, ColumnType};

/// SQL Server用SQLジェネレーター
#[derive(Debug, Clone)]
pub struct SqlServerSqlGenerator {}

impl SqlServerSqlGenerator {
    /// 新しいSqlServerSqlGeneratorを作成
    pub fn new() -> Self {
        Self {}
    }
}

impl SqlGenerator for SqlServerSqlGenerator {
    fn dialect(&self) -> Dialect {
        Dialect::SqlServer
    }

    fn map_column_type(&self, column: &Column) -> String {
        match column.column_type {
            ColumnType::AutoNumber => "INT IDENTITY(1,1)".to_string(),
            ColumnType::Integer => "INT".to_string(),
            ColumnType::BigInt => "BIGINT".to_string(),
            ColumnType::SmallInt => "SMALLINT".to_string(),
            ColumnType::TinyInt => "TINYINT".to_string(),
            ColumnType::Decimal => "DECIMAL(18, 4)".to_string(),
            ColumnType::Float => "REAL".to_string(),
            ColumnType::Double => "FLOAT".to_string(),
            ColumnType::Currency => "MONEY".to_string(),
            ColumnType::Boolean => "BIT".to_string(),
            ColumnType::Char => sized_type("CHAR", column),
            ColumnType::VarChar => sized_type("VARCHAR", column),
            ColumnType::NVarChar => sized_type("NVARCHAR", column),
            ColumnType::Binary | ColumnType::Blob | ColumnType::OleObject => {
                "VARBINARY(MAX)".to_string()
            }
            ColumnType::DateTime | ColumnType::Timestamp => "DATETIME2".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::Time => "TIME".to_string(),
            ColumnType::Guid => "UNIQUEIDENTIFIER".to_string(),
            ColumnType::Xml => "XML".to_string(),
            ColumnType::Memo | ColumnType::Json | ColumnType::Other => {
                "NVARCHAR(MAX)".to_string()
            }
        }
    }
}

impl Default for SqlServerSqlGenerator {
    fn default() -> Self {
        Self::new()
    }
}
