// Jet(Access)用SQLジェネレーター
//
// レガシーなJet方言のDDL文を生成します。
// 識別子は角括弧で囲み、自動採番は IDENTITY、主キー制約名は PrimaryKey です。

use crate::adapters::sql_generator::{sized_type, SqlGenerator};
use crate::core::config::Dialect;
use crate::core::naming::JET_PRIMARY_KEY_NAME;
use crate::core::schema::{Column, ColumnType, Table};

/// Jet用SQLジェネレーター
#[derive(Debug, Clone)]
pub struct JetSqlGenerator {}

impl JetSqlGenerator {
    /// 新しいJetSqlGeneratorを作成
    pub fn new() -> Self {
        Self {}
    }
}

impl SqlGenerator for JetSqlGenerator {
    fn dialect(&self) -> Dialect {
        Dialect::Jet
    }

    fn map_column_type(&self, column: &Column) -> String {
        match column.column_type {
            ColumnType::AutoNumber => "IDENTITY".to_string(),
            ColumnType::Integer | ColumnType::BigInt => "INTEGER".to_string(),
            ColumnType::SmallInt => "SMALLINT".to_string(),
            ColumnType::TinyInt => "BYTE".to_string(),
            ColumnType::Decimal => "DECIMAL".to_string(),
            ColumnType::Float => "REAL".to_string(),
            ColumnType::Double => "DOUBLE".to_string(),
            ColumnType::Currency => "CURRENCY".to_string(),
            ColumnType::Boolean => "YESNO".to_string(),
            ColumnType::Char => sized_type("CHAR", column),
            ColumnType::VarChar | ColumnType::NVarChar => sized_type("VARCHAR", column),
            ColumnType::Binary => "BINARY".to_string(),
            ColumnType::Blob | ColumnType::OleObject => "OLEOBJECT".to_string(),
            ColumnType::DateTime
            | ColumnType::Date
            | ColumnType::Time
            | ColumnType::Timestamp => "DATETIME".to_string(),
            ColumnType::Guid => "GUID".to_string(),
            ColumnType::Memo | ColumnType::Xml | ColumnType::Json | ColumnType::Other => {
                "MEMO".to_string()
            }
        }
    }

    fn primary_key_name(&self, _table: &Table) -> String {
        JET_PRIMARY_KEY_NAME.to_string()
    }
}

impl Default for JetSqlGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::ForeignKey;

    #[test]
    fn test_legacy_type_keywords() {
        let generator = JetSqlGenerator::new();
        let cases = [
            (ColumnType::AutoNumber, "IDENTITY"),
            (ColumnType::Integer, "INTEGER"),
            (ColumnType::Memo, "MEMO"),
            (ColumnType::DateTime, "DATETIME"),
            (ColumnType::Currency, "CURRENCY"),
            (ColumnType::OleObject, "OLEOBJECT"),
            (ColumnType::Boolean, "YESNO"),
            (ColumnType::Other, "MEMO"),
        ];

        for (column_type, expected) in cases {
            let column = Column::new("c", column_type, true);
            assert_eq!(generator.map_column_type(&column), expected);
        }
    }

    #[test]
    fn test_generate_create_table() {
        let generator = JetSqlGenerator::new();
        let mut table = Table::new("Sections");
        table.add_column(
            Column::new("ID", ColumnType::AutoNumber, false)
                .with_position(1)
                .primary(),
        );
        table.add_column(Column::new("CategoryID", ColumnType::Integer, true).with_position(2));
        table.add_column(
            Column::new("Title", ColumnType::VarChar, true)
                .with_length(50)
                .with_position(3),
        );
        table.add_foreign_key(ForeignKey::new(
            "CategoriesSections",
            "Sections",
            "CategoryID",
            "Categories",
            "ID",
        ));

        let sql = generator.generate_create_table(&table, true);
        assert_eq!(
            sql,
            "CREATE TABLE [Sections] (\n    [ID] IDENTITY NOT NULL,\n    [CategoryID] INTEGER,\n    [Title] VARCHAR(50),\n    CONSTRAINT [PrimaryKey] PRIMARY KEY ([ID]),\n    CONSTRAINT [CategoriesSections] FOREIGN KEY ([CategoryID]) REFERENCES [Categories]([ID])\n);\n"
        );
    }
}
