// SQLiteコネクター
//
// sqlite_master と PRAGMA を使ってスキーマ情報を取得します。
// 主キーは PRAGMA table_info の pk 列で行ごとに報告されるため、
// PrimaryKeys コレクションは提供しません。

use super::{query_error, statement_error, RawColumnRow, RawForeignKeyRow, SchemaConnector};
use crate::adapters::sql_quote::quote_identifier_ansi;
use crate::core::config::{DatabaseConfig, Dialect};
use crate::core::error::ConnectorError;
use crate::core::naming::is_internal_table;
use async_trait::async_trait;
use regex::Regex;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info};

/// 宣言型 `VARCHAR(50)` / `DECIMAL(10,2)` を型名と長さに分解するパターン
static DECLARED_TYPE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^\s*([^(]*?)\s*(?:\(\s*(\d+)\s*(?:,\s*\d+\s*)?\))?\s*$").ok()
});

/// 宣言型を型名と長さに分解
///
/// 括弧がない場合の長さは0です。
pub(crate) fn split_declared_type(declared: &str) -> (String, i64) {
    let parsed = DECLARED_TYPE.as_ref().and_then(|re| re.captures(declared));

    match parsed {
        Some(caps) => {
            let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let length = caps
                .get(2)
                .and_then(|m| m.as_str().parse::<i64>().ok())
                .unwrap_or(0);
            (name.to_string(), length)
        }
        None => (declared.trim().to_string(), 0),
    }
}

/// SQLite用コネクター
pub struct SqliteConnector {
    pool: SqlitePool,
}

impl SqliteConnector {
    /// 設定のデータベースファイルに接続（存在しない場合は作成）
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, ConnectorError> {
        let options = SqliteConnectOptions::new()
            .filename(&config.database)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(config.timeout.unwrap_or(30)))
            .connect_with(options)
            .await
            .map_err(|e| ConnectorError::Connection {
                message: format!("Failed to open SQLite database: {}", config.database),
                cause: e.to_string(),
            })?;

        info!(database = %config.database, "Connected to SQLite database");

        Ok(Self::from_pool(pool))
    }

    /// 既存のプールからコネクターを作成
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn table_info(&self, table_name: &str) -> Result<Vec<SqliteRow>, ConnectorError> {
        let sql = format!("PRAGMA table_info({})", quote_identifier_ansi(table_name));
        sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error(&sql))
    }

    /// CREATE TABLE 文に AUTOINCREMENT が含まれるか
    async fn uses_autoincrement(&self, table_name: &str) -> Result<bool, ConnectorError> {
        let sql = "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?";
        let row = sqlx::query(sql)
            .bind(table_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error(sql))?;

        let ddl: Option<String> = match row {
            Some(row) => row.try_get(0).map_err(query_error(sql))?,
            None => None,
        };

        Ok(ddl
            .map(|ddl| ddl.to_ascii_uppercase().contains("AUTOINCREMENT"))
            .unwrap_or(false))
    }

    /// カラム制約として宣言された単一カラムのUNIQUEを持つカラム名を求める
    ///
    /// `CREATE UNIQUE INDEX` で作られたインデックス（origin `c`）と
    /// 主キー（origin `pk`）は対象外です。
    async fn unique_columns(&self, table_name: &str) -> Result<HashSet<String>, ConnectorError> {
        let sql = format!("PRAGMA index_list({})", quote_identifier_ansi(table_name));
        let indexes = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error(&sql))?;

        let mut columns = HashSet::new();
        for index in indexes {
            let is_unique: i64 = index.try_get("unique").map_err(query_error(&sql))?;
            let origin: String = index.try_get("origin").map_err(query_error(&sql))?;
            if is_unique != 1 || origin != "u" {
                continue;
            }

            let index_name: String = index.try_get("name").map_err(query_error(&sql))?;
            let info_sql = format!("PRAGMA index_info({})", quote_identifier_ansi(&index_name));
            let parts = sqlx::query(&info_sql)
                .fetch_all(&self.pool)
                .await
                .map_err(query_error(&info_sql))?;

            if let [part] = parts.as_slice() {
                let name: Option<String> = part.try_get("name").map_err(query_error(&info_sql))?;
                columns.extend(name);
            }
        }

        Ok(columns)
    }

    /// 参照先カラムが省略された外部キーのために親テーブルの主キーを求める
    async fn implicit_parent_column(&self, parent_table: &str) -> Result<String, ConnectorError> {
        let sql = format!("PRAGMA table_info({})", quote_identifier_ansi(parent_table));
        for row in self.table_info(parent_table).await? {
            let pk: i64 = row.try_get("pk").map_err(query_error(&sql))?;
            if pk > 0 {
                return row.try_get("name").map_err(query_error(&sql));
            }
        }
        Ok(String::new())
    }
}

#[async_trait]
impl SchemaConnector for SqliteConnector {
    fn dialect(&self) -> Dialect {
        Dialect::SQLite
    }

    async fn get_table_names(&self) -> Result<Vec<String>, ConnectorError> {
        let sql = "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name";
        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error(sql))?;

        let mut names = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = row.try_get(0).map_err(query_error(sql))?;
            if !is_internal_table(&name) {
                names.push(name);
            }
        }

        Ok(names)
    }

    async fn get_columns(&self, table_name: &str) -> Result<Vec<RawColumnRow>, ConnectorError> {
        let sql = format!("PRAGMA table_info({})", quote_identifier_ansi(table_name));
        let rows = self.table_info(table_name).await?;
        let autoincrement = self.uses_autoincrement(table_name).await?;
        let unique_columns = self.unique_columns(table_name).await?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in rows {
            let cid: i64 = row.try_get("cid").map_err(query_error(&sql))?;
            let name: String = row.try_get("name").map_err(query_error(&sql))?;
            let declared: String = row.try_get("type").map_err(query_error(&sql))?;
            let not_null: i64 = row.try_get("notnull").map_err(query_error(&sql))?;
            let default_value: Option<String> =
                row.try_get("dflt_value").map_err(query_error(&sql))?;
            let pk: i64 = row.try_get("pk").map_err(query_error(&sql))?;
            let unique = unique_columns.contains(&name);

            let (mut type_name, length) = split_declared_type(&declared);
            // INTEGER PRIMARY KEY AUTOINCREMENT は自動採番として報告
            if autoincrement && pk == 1 && type_name.eq_ignore_ascii_case("INTEGER") {
                type_name = "INTEGER AUTOINCREMENT".to_string();
            }

            columns.push(RawColumnRow {
                name,
                type_name,
                flags: 0,
                length,
                nullable: not_null == 0 && pk == 0,
                has_default: default_value.is_some(),
                default_value,
                position: u32::try_from(cid + 1).unwrap_or(u32::MAX),
                primary_key: Some(pk > 0),
                unique: Some(unique),
            });
        }

        debug!(table = table_name, columns = columns.len(), "Read SQLite columns");
        Ok(columns)
    }

    async fn get_foreign_keys(
        &self,
        table_name: &str,
    ) -> Result<Vec<RawForeignKeyRow>, ConnectorError> {
        let sql = format!(
            "PRAGMA foreign_key_list({})",
            quote_identifier_ansi(table_name)
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error(&sql))?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.try_get("id").map_err(query_error(&sql))?;
            let seq: i64 = row.try_get("seq").map_err(query_error(&sql))?;
            let parent_table: String = row.try_get("table").map_err(query_error(&sql))?;
            let child_column: String = row.try_get("from").map_err(query_error(&sql))?;
            let parent_column: Option<String> = row.try_get("to").map_err(query_error(&sql))?;
            let update_rule: String = row.try_get("on_update").map_err(query_error(&sql))?;
            let delete_rule: String = row.try_get("on_delete").map_err(query_error(&sql))?;

            let parent_column = match parent_column {
                Some(column) if !column.is_empty() => column,
                _ => self.implicit_parent_column(&parent_table).await?,
            };

            entries.push((
                id,
                seq,
                RawForeignKeyRow {
                    // SQLiteは外部キー制約に名前を保持しない
                    constraint_name: format!("FK_{}_{}_{}", table_name, parent_table, id),
                    child_table: table_name.to_string(),
                    child_column,
                    parent_table,
                    parent_column,
                    update_rule,
                    delete_rule,
                },
            ));
        }

        // PRAGMAは最後に宣言された制約から id を振るため、宣言順に戻す
        entries.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        Ok(entries.into_iter().map(|(_, _, row)| row).collect())
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
