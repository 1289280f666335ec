// MySQL用SQLジェネレーター
//
// スキーマ定義からMySQL用のDDL文を生成します。

use crate::adapters::sql_generator::{sized_type, SqlGenerator};
use crate::core::config::Dialect;
use crate::core::schema::{Column, ColumnType};

/// MySQL用SQLジェネレーター
#[derive(Debug, Clone)]
pub struct MySqlSqlGenerator {}

impl MySqlSqlGenerator {
    /// 新しいMySqlSqlGeneratorを作成
    pub fn new() -> Self {
        Self {}
    }
}

impl SqlGenerator for MySqlSqlGenerator {
    fn dialect(&self) -> Dialect {
        Dialect::MySQL
    }

    fn map_column_type(&self, column: &Column) -> String {
        match column.column_type {
            ColumnType::AutoNumber => "INT AUTO_INCREMENT".to_string(),
            ColumnType::Integer => "INT".to_string(),
            ColumnType::BigInt => "BIGINT".to_string(),
            ColumnType::SmallInt => "SMALLINT".to_string(),
            ColumnType::TinyInt => "TINYINT".to_string(),
            ColumnType::Decimal => "DECIMAL(18, 4)".to_string(),
            ColumnType::Float => "FLOAT".to_string(),
            ColumnType::Double => "DOUBLE".to_string(),
            ColumnType::Currency => "DECIMAL(19, 4)".to_string(),
            ColumnType::Boolean => "BOOLEAN".to_string(),
            ColumnType::Char => sized_type("CHAR", column),
            ColumnType::VarChar | ColumnType::NVarChar => sized_type("VARCHAR", column),
            ColumnType::Binary | ColumnType::Blob => "BLOB".to_string(),
            ColumnType::OleObject => "LONGBLOB".to_string(),
            ColumnType::DateTime => "DATETIME".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::Time => "TIME".to_string(),
            ColumnType::Timestamp => "TIMESTAMP".to_string(),
            ColumnType::Guid => "CHAR(36)".to_string(),
            ColumnType::Json => "JSON".to_string(),
            ColumnType::Memo | ColumnType::Xml | ColumnType::Other => "LONGTEXT".to_string(),
        }
    }
}

impl Default for MySqlSqlGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{ConstraintAction, ForeignKey, Table};

    #[test]
    fn test_new_generator() {
        let generator = MySqlSqlGenerator::new();
        assert!(format!("{:?}", generator).contains("MySqlSqlGenerator"));
    }

    #[test]
    fn test_generate_column_definition_with_auto_increment() {
        let generator = MySqlSqlGenerator::new();
        let mut table = Table::new("Series");
        table.add_column(Column::new("id", ColumnType::AutoNumber, false).primary());

        let def = generator.generate_column_definition(&table, table.get_column("id").unwrap());
        assert_eq!(def, "`id` INT AUTO_INCREMENT NOT NULL");
    }

    #[test]
    fn test_generate_create_table_with_foreign_key() {
        let generator = MySqlSqlGenerator::new();
        let mut table = Table::new("Series");
        table.add_column(
            Column::new("id", ColumnType::AutoNumber, false)
                .with_position(1)
                .primary(),
        );
        table.add_column(Column::new("maker_id", ColumnType::Integer, true).with_position(2));
        let mut fk = ForeignKey::new("FK_Series_Makers", "Series", "maker_id", "Makers", "id");
        fk.on_delete = ConstraintAction::SetNull;
        fk.on_update = ConstraintAction::Cascade;
        table.add_foreign_key(fk);

        let sql = generator.generate_create_table(&table, true);
        assert_eq!(
            sql,
            "CREATE TABLE `Series` (\n    `id` INT AUTO_INCREMENT NOT NULL,\n    `maker_id` INT,\n    CONSTRAINT `PK_Series` PRIMARY KEY (`id`),\n    CONSTRAINT `FK_Series_Makers` FOREIGN KEY (`maker_id`) REFERENCES `Makers`(`id`) ON DELETE SET NULL ON UPDATE CASCADE\n);\n"
        );
    }
}
