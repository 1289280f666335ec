// MySQLコネクター
//
// information_schema からスキーマ情報を取得します。
// 照合順序や符号の差異を避けるため、文字列は CHAR、数値は SIGNED にキャストします。

use super::{query_error, statement_error, RawColumnRow, RawForeignKeyRow, SchemaConnector};
use crate::adapters::connection_string::build_connection_string;
use crate::adapters::sql_quote::string_literal;
use crate::core::config::{DatabaseConfig, Dialect};
use crate::core::error::ConnectorError;
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::Row;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// 既定値がクォートなしで返される文字列・日時系の型
const QUOTED_DEFAULT_TYPES: &[&str] = &[
    "char",
    "varchar",
    "tinytext",
    "text",
    "mediumtext",
    "longtext",
    "enum",
    "set",
    "binary",
    "varbinary",
    "date",
    "datetime",
    "timestamp",
    "time",
    "year",
];

/// information_schema.COLUMNS の1行
#[derive(Debug, Clone, Default)]
struct ColumnInfo {
    name: String,
    data_type: String,
    extra: String,
    max_length: Option<i64>,
    nullable: bool,
    column_default: Option<String>,
    position: i64,
    column_key: String,
}

/// COLUMNS の1行を生のカラム行に変換
///
/// auto_increment は型名に含めて自動採番として分類させます。
/// 2^31-1 を超える最大長（LONGTEXT など）は MAX 扱いの -1 になります。
fn to_raw_column(info: ColumnInfo) -> RawColumnRow {
    let extra = info.extra.to_ascii_lowercase();
    let type_name = if extra.contains("auto_increment") {
        format!("{} auto_increment", info.data_type)
    } else {
        info.data_type.clone()
    };

    let length = match info.max_length {
        None => 0,
        Some(length) if length > i64::from(i32::MAX) => -1,
        Some(length) => length,
    };

    let generated = extra.contains("default_generated");
    let default_value = info
        .column_default
        .map(|value| quote_default(&info.data_type, value, generated));

    RawColumnRow {
        name: info.name,
        type_name,
        flags: 0,
        length,
        nullable: info.nullable,
        has_default: default_value.is_some(),
        default_value,
        position: u32::try_from(info.position).unwrap_or(0),
        primary_key: Some(info.column_key.eq_ignore_ascii_case("PRI")),
        unique: Some(info.column_key.eq_ignore_ascii_case("UNI")),
    }
}

/// COLUMN_DEFAULT をSQLリテラルに戻す
///
/// MySQL 8 はリテラルの既定値をクォートなしで返し、式の既定値には
/// EXTRA に DEFAULT_GENERATED を付けます。
fn quote_default(data_type: &str, value: String, generated: bool) -> String {
    let data_type = data_type.to_ascii_lowercase();
    if generated || !QUOTED_DEFAULT_TYPES.contains(&data_type.as_str()) {
        return value;
    }

    // 5.7 は CURRENT_TIMESTAMP に DEFAULT_GENERATED を付けない
    let upper = value.trim().to_ascii_uppercase();
    if upper.starts_with("CURRENT_TIMESTAMP") || upper.starts_with("NOW(") {
        return value;
    }

    string_literal(&value)
}

/// MySQL用コネクター
pub struct MySqlConnector {
    pool: MySqlPool,
}

impl MySqlConnector {
    /// 設定に従って接続
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, ConnectorError> {
        let url = build_connection_string(config).unwrap_or_default();
        let options = MySqlConnectOptions::from_str(&url).map_err(|e| ConnectorError::Connection {
            message: format!(
                "Invalid MySQL connection settings for database '{}'",
                config.database
            ),
            cause: e.to_string(),
        })?;

        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(config.timeout.unwrap_or(30)))
            .connect_with(options)
            .await
            .map_err(|e| ConnectorError::Connection {
                message: format!(
                    "Failed to connect to MySQL: {}:{}/{}",
                    config.host,
                    config.effective_port(),
                    config.database
                ),
                cause: e.to_string(),
            })?;

        info!(
            host = %config.host,
            database = %config.database,
            "Connected to MySQL database"
        );

        Ok(Self { pool })
    }
}

#[async_trait]
impl SchemaConnector for MySqlConnector {
    fn dialect(&self) -> Dialect {
        Dialect::MySQL
    }

    async fn get_table_names(&self) -> Result<Vec<String>, ConnectorError> {
        let sql = r#"
            SELECT CAST(TABLE_NAME AS CHAR(255)) AS TABLE_NAME
            FROM information_schema.TABLES
            WHERE TABLE_SCHEMA = DATABASE() AND TABLE_TYPE = 'BASE TABLE'
            ORDER BY TABLE_NAME
        "#;

        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error(sql))?;

        rows.iter()
            .map(|row| row.try_get::<String, _>(0).map_err(query_error(sql)))
            .collect()
    }

    async fn get_columns(&self, table_name: &str) -> Result<Vec<RawColumnRow>, ConnectorError> {
        let sql = r#"
            SELECT
                CAST(COLUMN_NAME AS CHAR(255)) AS COLUMN_NAME,
                CAST(DATA_TYPE AS CHAR(64)) AS DATA_TYPE,
                CAST(EXTRA AS CHAR(255)) AS EXTRA,
                CAST(CHARACTER_MAXIMUM_LENGTH AS SIGNED) AS MAX_LENGTH,
                CAST(IF(IS_NULLABLE = 'YES', 1, 0) AS SIGNED) AS IS_NULLABLE,
                CAST(COLUMN_DEFAULT AS CHAR(4000)) AS COLUMN_DEFAULT,
                CAST(ORDINAL_POSITION AS SIGNED) AS ORDINAL_POSITION,
                CAST(COLUMN_KEY AS CHAR(3)) AS COLUMN_KEY
            FROM information_schema.COLUMNS
            WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
            ORDER BY ORDINAL_POSITION
        "#;

        let rows = sqlx::query(sql)
            .bind(table_name)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error(sql))?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in rows {
            let info = ColumnInfo {
                name: row.try_get("COLUMN_NAME").map_err(query_error(sql))?,
                data_type: row.try_get("DATA_TYPE").map_err(query_error(sql))?,
                extra: row
                    .try_get::<Option<String>, _>("EXTRA")
                    .map_err(query_error(sql))?
                    .unwrap_or_default(),
                max_length: row.try_get("MAX_LENGTH").map_err(query_error(sql))?,
                nullable: row.try_get::<i64, _>("IS_NULLABLE").map_err(query_error(sql))? == 1,
                column_default: row.try_get("COLUMN_DEFAULT").map_err(query_error(sql))?,
                position: row.try_get("ORDINAL_POSITION").map_err(query_error(sql))?,
                column_key: row
                    .try_get::<Option<String>, _>("COLUMN_KEY")
                    .map_err(query_error(sql))?
                    .unwrap_or_default(),
            };
            columns.push(to_raw_column(info));
        }

        debug!(table = table_name, columns = columns.len(), "Read MySQL columns");
        Ok(columns)
    }

    async fn get_primary_keys(&self, table_name: &str) -> Result<Vec<String>, ConnectorError> {
        let sql = r#"
            SELECT CAST(COLUMN_NAME AS CHAR(255)) AS COLUMN_NAME
            FROM information_schema.KEY_COLUMN_USAGE
            WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? AND CONSTRAINT_NAME = 'PRIMARY'
            ORDER BY ORDINAL_POSITION
        "#;

        let rows = sqlx::query(sql)
            .bind(table_name)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error(sql))?;

        rows.iter()
            .map(|row| row.try_get::<String, _>(0).map_err(query_error(sql)))
            .collect()
    }

    async fn get_foreign_keys(
        &self,
        table_name: &str,
    ) -> Result<Vec<RawForeignKeyRow>, ConnectorError> {
        let sql = r#"
            SELECT
                CAST(kcu.CONSTRAINT_NAME AS CHAR(255)) AS CONSTRAINT_NAME,
                CAST(kcu.TABLE_NAME AS CHAR(255)) AS TABLE_NAME,
                CAST(kcu.COLUMN_NAME AS CHAR(255)) AS COLUMN_NAME,
                CAST(kcu.REFERENCED_TABLE_NAME AS CHAR(255)) AS REFERENCED_TABLE_NAME,
                CAST(kcu.REFERENCED_COLUMN_NAME AS CHAR(255)) AS REFERENCED_COLUMN_NAME,
                CAST(rc.UPDATE_RULE AS CHAR(32)) AS UPDATE_RULE,
                CAST(rc.DELETE_RULE AS CHAR(32)) AS DELETE_RULE
            FROM information_schema.KEY_COLUMN_USAGE kcu
            JOIN information_schema.REFERENTIAL_CONSTRAINTS rc
                ON rc.CONSTRAINT_SCHEMA = kcu.CONSTRAINT_SCHEMA
                AND rc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME
            WHERE kcu.TABLE_SCHEMA = DATABASE() AND kcu.TABLE_NAME = ?
                AND kcu.REFERENCED_TABLE_NAME IS NOT NULL
            ORDER BY kcu.CONSTRAINT_NAME, kcu.ORDINAL_POSITION
        "#;

        let rows = sqlx::query(sql)
            .bind(table_name)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error(sql))?;

        let mut foreign_keys = Vec::with_capacity(rows.len());
        for row in rows {
            foreign_keys.push(RawForeignKeyRow {
                constraint_name: row.try_get("CONSTRAINT_NAME").map_err(query_error(sql))?,
                child_table: row.try_get("TABLE_NAME").map_err(query_error(sql))?,
                child_column: row.try_get("COLUMN_NAME").map_err(query_error(sql))?,
                parent_table: row
                    .try_get("REFERENCED_TABLE_NAME")
                    .map_err(query_error(sql))?,
                parent_column: row
                    .try_get("REFERENCED_COLUMN_NAME")
                    .map_err(query_error(sql))?,
                update_rule: row.try_get("UPDATE_RULE").map_err(query_error(sql))?,
                delete_rule: row.try_get("DELETE_RULE").map_err(query_error(sql))?,
            });
        }

        Ok(foreign_keys)
    }

    async fn execute_statement(&self, sql: &str) -> Result<(), ConnectorError> {
        sqlx::raw_sql(sql)
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(statement_error(sql))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str, data_type: &str) -> ColumnInfo {
        ColumnInfo {
            name: name.to_string(),
            data_type: data_type.to_string(),
            nullable: true,
            position: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_auto_increment_is_folded_into_type_name() {
        let row = to_raw_column(ColumnInfo {
            extra: "auto_increment".to_string(),
            column_key: "PRI".to_string(),
            nullable: false,
            ..info("id", "int")
        });

        assert_eq!(row.type_name, "int auto_increment");
        assert_eq!(row.primary_key, Some(true));
        assert_eq!(row.unique, Some(false));
        assert!(!row.nullable);
    }

    #[test]
    fn test_character_length_mapping() {
        let varchar = to_raw_column(ColumnInfo {
            max_length: Some(50),
            ..info("name", "varchar")
        });
        assert_eq!(varchar.length, 50);

        let longtext = to_raw_column(ColumnInfo {
            max_length: Some(4_294_967_295),
            ..info("body", "longtext")
        });
        assert_eq!(longtext.length, -1);

        let number = to_raw_column(info("qty", "int"));
        assert_eq!(number.length, 0);
    }

    #[test]
    fn test_unique_key_is_reported() {
        let row = to_raw_column(ColumnInfo {
            column_key: "UNI".to_string(),
            ..info("code", "varchar")
        });
        assert_eq!(row.unique, Some(true));
        assert_eq!(row.primary_key, Some(false));

        // MUL（非ユニークインデックス）は対象外
        let row = to_raw_column(ColumnInfo {
            column_key: "MUL".to_string(),
            ..info("maker_id", "int")
        });
        assert_eq!(row.unique, Some(false));
    }

    #[test]
    fn test_string_defaults_are_quoted() {
        let row = to_raw_column(ColumnInfo {
            column_default: Some("draft".to_string()),
            ..info("status", "varchar")
        });
        assert!(row.has_default);
        assert_eq!(row.default_value.as_deref(), Some("'draft'"));

        let row = to_raw_column(ColumnInfo {
            column_default: Some("O'Brien".to_string()),
            ..info("owner", "char")
        });
        assert_eq!(row.default_value.as_deref(), Some("'O''Brien'"));

        let row = to_raw_column(ColumnInfo {
            column_default: Some("2024-01-01".to_string()),
            ..info("released", "date")
        });
        assert_eq!(row.default_value.as_deref(), Some("'2024-01-01'"));
    }

    #[test]
    fn test_numeric_and_generated_defaults_are_kept() {
        let row = to_raw_column(ColumnInfo {
            column_default: Some("0".to_string()),
            ..info("qty", "int")
        });
        assert_eq!(row.default_value.as_deref(), Some("0"));

        let row = to_raw_column(ColumnInfo {
            column_default: Some("CURRENT_TIMESTAMP".to_string()),
            extra: "DEFAULT_GENERATED".to_string(),
            ..info("added", "datetime")
        });
        assert_eq!(row.default_value.as_deref(), Some("CURRENT_TIMESTAMP"));

        let row = to_raw_column(ColumnInfo {
            column_default: Some("CURRENT_TIMESTAMP".to_string()),
            ..info("added", "timestamp")
        });
        assert_eq!(row.default_value.as_deref(), Some("CURRENT_TIMESTAMP"));

        let row = to_raw_column(info("note", "varchar"));
        assert!(!row.has_default);
        assert_eq!(row.default_value, None);
    }
}
