// PostgreSQLコネクター
//
// public スキーマの information_schema / pg_catalog からスキーマ情報を取得します。

use super::{query_error, statement_error, RawColumnRow, RawForeignKeyRow, SchemaConnector};
use crate::adapters::connection_string::build_connection_string;
use crate::core::config::{DatabaseConfig, Dialect};
use crate::core::error::ConnectorError;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::Row;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// PostgreSQL用コネクター
pub struct PostgresConnector {
    pool: PgPool,
}

impl PostgresConnector {
    /// 設定に従って接続
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, ConnectorError> {
        let url = build_connection_string(config).unwrap_or_default();
        let options = PgConnectOptions::from_str(&url).map_err(|e| ConnectorError::Connection {
            message: format!(
                "Invalid PostgreSQL connection settings for database '{}'",
                config.database
            ),
            cause: e.to_string(),
        })?;

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(config.timeout.unwrap_or(30)))
            .connect_with(options)
            .await
            .map_err(|e| ConnectorError::Connection {
                message: format!(
                    "Failed to connect to PostgreSQL: {}:{}/{}",
                    config.host,
                    config.effective_port(),
                    config.database
                ),
                cause: e.to_string(),
            })?;

        info!(
            host = %config.host,
            database = %config.database,
            "Connected to PostgreSQL database"
        );

        Ok(Self::from_pool(pool))
    }

    /// 既存のプールからコネクターを作成
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// シーケンス由来のデフォルト値かどうか
fn is_sequence_default(default_value: Option<&str>) -> bool {
    default_value
        .map(|value| value.trim_start().to_ascii_lowercase().starts_with("nextval("))
        .unwrap_or(false)
}

/// 文字列リテラルのデフォルト値から型キャストを外す
///
/// `'draft'::character varying` → `'draft'`
fn strip_literal_cast(default_value: &str) -> String {
    match default_value.rfind("'::") {
        Some(end) if default_value.starts_with('\'') => default_value[..=end].to_string(),
        _ => default_value.to_string(),
    }
}

#[async_trait]
impl SchemaConnector for PostgresConnector {
    fn dialect(&self) -> Dialect {
        Dialect::PostgreSQL
    }

    async fn get_table_names(&self) -> Result<Vec<String>, ConnectorError> {
        let sql = r#"
            SELECT table_name::text
            FROM information_schema.tables
            WHERE table_schema = 'public' AND table_type = 'BASE TABLE'
            ORDER BY table_name
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
                column_name::text,
                data_type::text,
                COALESCE(character_maximum_length, 0)::int4 AS max_length,
                (is_nullable = 'YES') AS nullable,
                column_default::text,
                ordinal_position::int4,
                (is_identity = 'YES') AS is_identity,
                EXISTS (
                    SELECT 1
                    FROM information_schema.table_constraints tc
                    JOIN information_schema.key_column_usage kcu
                        ON kcu.constraint_name = tc.constraint_name
                        AND kcu.table_schema = tc.table_schema
                        AND kcu.table_name = tc.table_name
                    WHERE tc.constraint_type = 'UNIQUE'
                        AND tc.table_schema = c.table_schema
                        AND tc.table_name = c.table_name
                        AND kcu.column_name = c.column_name
                        AND (
                            SELECT COUNT(*)
                            FROM information_schema.key_column_usage k2
                            WHERE k2.constraint_name = tc.constraint_name
                                AND k2.table_schema = tc.table_schema
                                AND k2.table_name = tc.table_name
                        ) = 1
                ) AS is_unique
            FROM information_schema.columns c
            WHERE c.table_name = $1 AND c.table_schema = 'public'
            ORDER BY c.ordinal_position
        "#;

        let rows = sqlx::query(sql)
            .bind(table_name)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error(sql))?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in rows {
            let data_type: String = row.try_get("data_type").map_err(query_error(sql))?;
            let mut default_value: Option<String> =
                row.try_get("column_default").map_err(query_error(sql))?;
            let is_identity: bool = row.try_get("is_identity").map_err(query_error(sql))?;
            let max_length: i32 = row.try_get("max_length").map_err(query_error(sql))?;
            let position: i32 = row.try_get("ordinal_position").map_err(query_error(sql))?;
            let is_unique: bool = row.try_get("is_unique").map_err(query_error(sql))?;

            // SERIAL / IDENTITY は自動採番として報告し、nextval() は引き継がない
            let type_name = if is_identity || is_sequence_default(default_value.as_deref()) {
                default_value = None;
                format!("{} serial", data_type)
            } else {
                default_value = default_value.as_deref().map(strip_literal_cast);
                data_type
            };

            columns.push(RawColumnRow {
                name: row.try_get("column_name").map_err(query_error(sql))?,
                type_name,
                flags: 0,
                length: i64::from(max_length),
                nullable: row.try_get("nullable").map_err(query_error(sql))?,
                has_default: default_value.is_some(),
                default_value,
                position: u32::try_from(position).unwrap_or(0),
                primary_key: None,
                unique: Some(is_unique),
            });
        }

        debug!(table = table_name, columns = columns.len(), "Read PostgreSQL columns");
        Ok(columns)
    }

    async fn get_primary_keys(&self, table_name: &str) -> Result<Vec<String>, ConnectorError> {
        let sql = r#"
            SELECT a.attname::text
            FROM pg_index i
            JOIN pg_attribute a ON a.attrelid = i.indrelid AND a.attnum = ANY(i.indkey)
            JOIN pg_class c ON c.oid = i.indrelid
            JOIN pg_namespace n ON n.oid = c.relnamespace
            WHERE i.indisprimary
                AND c.relname = $1
                AND n.nspname = 'public'
            ORDER BY array_position(i.indkey, a.attnum)
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
                tc.constraint_name::text AS constraint_name,
                kcu.table_name::text AS child_table,
                kcu.column_name::text AS child_column,
                ccu.table_name::text AS parent_table,
                ccu.column_name::text AS parent_column,
                rc.update_rule::text AS update_rule,
                rc.delete_rule::text AS delete_rule
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
                ON tc.constraint_name = kcu.constraint_name
                AND tc.table_schema = kcu.table_schema
            JOIN information_schema.constraint_column_usage ccu
                ON ccu.constraint_name = tc.constraint_name
                AND ccu.table_schema = tc.table_schema
            JOIN information_schema.referential_constraints rc
                ON rc.constraint_name = tc.constraint_name
                AND rc.constraint_schema = tc.table_schema
            WHERE tc.constraint_type = 'FOREIGN KEY'
                AND tc.table_name = $1
                AND tc.table_schema = 'public'
            ORDER BY tc.constraint_name, kcu.ordinal_position
        "#;

        let rows = sqlx::query(sql)
            .bind(table_name)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error(sql))?;

        let mut foreign_keys = Vec::with_capacity(rows.len());
        for row in rows {
            foreign_keys.push(RawForeignKeyRow {
                constraint_name: row.try_get("constraint_name").map_err(query_error(sql))?,
                child_table: row.try_get("child_table").map_err(query_error(sql))?,
                child_column: row.try_get("child_column").map_err(query_error(sql))?,
                parent_table: row.try_get("parent_table").map_err(query_error(sql))?,
                parent_column: row.try_get("parent_column").map_err(query_error(sql))?,
                update_rule: row.try_get("update_rule").map_err(query_error(sql))?,
                delete_rule: row.try_get("delete_rule").map_err(query_error(sql))?,
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
