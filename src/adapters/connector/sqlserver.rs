// SQL Serverコネクター
//
// tiberius（TDS）で接続し、INFORMATION_SCHEMA からスキーマ情報を取得します。
// 接続は1本だけ保持し、Mutex で逐次利用します。

use super::{RawColumnRow, RawForeignKeyRow, SchemaConnector};
use crate::core::config::{DatabaseConfig, Dialect};
use crate::core::error::ConnectorError;
use async_trait::async_trait;
use std::time::Duration;
use tiberius::{AuthMethod, Client, Config, Query, Row};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info, warn};

type TdsClient = Client<Compat<TcpStream>>;

/// SQL Server用コネクター
pub struct SqlServerConnector {
    client: Mutex<Option<TdsClient>>,
}

impl SqlServerConnector {
    /// 設定に従って接続
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, ConnectorError> {
        let mut tds_config = Config::new();
        tds_config.host(&config.host);
        tds_config.port(config.effective_port());
        tds_config.database(&config.database);
        tds_config.authentication(AuthMethod::sql_server(
            config.user.as_deref().unwrap_or("sa"),
            config.password.as_deref().unwrap_or_default(),
        ));
        tds_config.trust_cert();

        let timeout = Duration::from_secs(config.timeout.unwrap_or(30));
        let connection_error = |cause: String| ConnectorError::Connection {
            message: format!(
                "Failed to connect to SQL Server: {}:{}/{}",
                config.host,
                config.effective_port(),
                config.database
            ),
            cause,
        };

        let client = tokio::time::timeout(timeout, async {
            let tcp = TcpStream::connect(tds_config.get_addr())
                .await
                .map_err(|e| e.to_string())?;
            if let Err(e) = tcp.set_nodelay(true) {
                warn!("Failed to set TCP_NODELAY on SQL Server connection: {}", e);
            }
            Client::connect(tds_config, tcp.compat_write())
                .await
                .map_err(|e| e.to_string())
        })
        .await
        .map_err(|_| connection_error(format!("timed out after {}s", timeout.as_secs())))?
        .map_err(connection_error)?;

        info!(
            host = %config.host,
            database = %config.database,
            "Connected to SQL Server database"
        );

        Ok(Self {
            client: Mutex::new(Some(client)),
        })
    }

    /// パラメーター付きクエリを実行して最初の結果セットを返す
    async fn fetch(&self, sql: &str, params: &[&str]) -> Result<Vec<Row>, ConnectorError> {
        let mut guard = self.client.lock().await;
        let client = guard.as_mut().ok_or_else(closed_error)?;

        let mut query = Query::new(sql);
        for param in params {
            query.bind(*param);
        }

        let stream = query
            .query(client)
            .await
            .map_err(|e| ConnectorError::query(e.to_string(), sql))?;
        stream
            .into_first_result()
            .await
            .map_err(|e| ConnectorError::query(e.to_string(), sql))
    }
}

fn closed_error() -> ConnectorError {
    ConnectorError::Connection {
        message: "SQL Server connection is closed".to_string(),
        cause: "close() was already called".to_string(),
    }
}

fn text(row: &Row, index: usize) -> String {
    row.get::<&str, _>(index).unwrap_or_default().to_string()
}

/// SQL Server がデフォルト値に付ける外側の括弧を外す
///
/// `((0))` → `0`、`('abc')` → `'abc'`
pub(crate) fn strip_default_parens(value: &str) -> String {
    let mut current = value.trim();
    while is_wrapped_in_parens(current) {
        current = current[1..current.len() - 1].trim();
    }
    current.to_string()
}

/// 先頭の `(` が末尾の `)` と対応しているか
fn is_wrapped_in_parens(value: &str) -> bool {
    if value.len() < 2 || !value.starts_with('(') || !value.ends_with(')') {
        return false;
    }

    let mut depth = 0usize;
    for (i, c) in value.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 && i + 1 < value.len() {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

#[async_trait]
impl SchemaConnector for SqlServerConnector {
    fn dialect(&self) -> Dialect {
        Dialect::SqlServer
    }

    async fn get_table_names(&self) -> Result<Vec<String>, ConnectorError> {
        let sql = r#"
            SELECT CAST(TABLE_NAME AS NVARCHAR(128))
            FROM INFORMATION_SCHEMA.TABLES
            WHERE TABLE_TYPE = 'BASE TABLE' AND TABLE_SCHEMA = SCHEMA_NAME()
            ORDER BY TABLE_NAME
        "#;

        let rows = self.fetch(sql, &[]).await?;
        Ok(rows.iter().map(|row| text(row, 0)).collect())
    }

    async fn get_columns(&self, table_name: &str) -> Result<Vec<RawColumnRow>, ConnectorError> {
        // IDENTITY列は型名に含めて自動採番として分類させる
        let sql = r#"
            SELECT
                CAST(c.COLUMN_NAME AS NVARCHAR(128)),
                CAST(CASE
                    WHEN COLUMNPROPERTY(
                        OBJECT_ID(QUOTENAME(c.TABLE_SCHEMA) + '.' + QUOTENAME(c.TABLE_NAME)),
                        c.COLUMN_NAME,
                        'IsIdentity') = 1 THEN c.DATA_TYPE + ' identity'
                    ELSE c.DATA_TYPE
                END AS NVARCHAR(128)),
                CAST(COALESCE(c.CHARACTER_MAXIMUM_LENGTH, 0) AS INT),
                CAST(CASE WHEN c.IS_NULLABLE = 'YES' THEN 1 ELSE 0 END AS INT),
                CAST(c.COLUMN_DEFAULT AS NVARCHAR(4000)),
                CAST(c.ORDINAL_POSITION AS INT),
                CAST(CASE WHEN EXISTS (
                    SELECT 1
                    FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc
                    JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu
                        ON kcu.CONSTRAINT_NAME = tc.CONSTRAINT_NAME
                        AND kcu.TABLE_SCHEMA = tc.TABLE_SCHEMA
                    WHERE tc.CONSTRAINT_TYPE = 'UNIQUE'
                        AND tc.TABLE_SCHEMA = c.TABLE_SCHEMA
                        AND tc.TABLE_NAME = c.TABLE_NAME
                        AND kcu.COLUMN_NAME = c.COLUMN_NAME
                        AND (
                            SELECT COUNT(*)
                            FROM INFORMATION_SCHEMA.KEY_COLUMN_USAGE k2
                            WHERE k2.CONSTRAINT_NAME = tc.CONSTRAINT_NAME
                                AND k2.TABLE_SCHEMA = tc.TABLE_SCHEMA
                        ) = 1
                ) THEN 1 ELSE 0 END AS INT)
            FROM INFORMATION_SCHEMA.COLUMNS c
            WHERE c.TABLE_NAME = @P1 AND c.TABLE_SCHEMA = SCHEMA_NAME()
            ORDER BY c.ORDINAL_POSITION
        "#;

        let rows = self.fetch(sql, &[table_name]).await?;

        let columns: Vec<RawColumnRow> = rows
            .iter()
            .map(|row| {
                let default_value = row.get::<&str, _>(4).map(strip_default_parens);
                RawColumnRow {
                    name: text(row, 0),
                    type_name: text(row, 1),
                    flags: 0,
                    length: i64::from(row.get::<i32, _>(2).unwrap_or(0)),
                    nullable: row.get::<i32, _>(3).unwrap_or(0) == 1,
                    has_default: default_value.is_some(),
                    default_value,
                    position: u32::try_from(row.get::<i32, _>(5).unwrap_or(0)).unwrap_or(0),
                    primary_key: None,
                    unique: Some(row.get::<i32, _>(6).unwrap_or(0) == 1),
                }
            })
            .collect();

        debug!(table = table_name, columns = columns.len(), "Read SQL Server columns");
        Ok(columns)
    }

    async fn get_primary_keys(&self, table_name: &str) -> Result<Vec<String>, ConnectorError> {
        let sql = r#"
            SELECT CAST(kcu.COLUMN_NAME AS NVARCHAR(128))
            FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc
            JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu
                ON tc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME
                AND tc.TABLE_SCHEMA = kcu.TABLE_SCHEMA
            WHERE tc.CONSTRAINT_TYPE = 'PRIMARY KEY'
                AND tc.TABLE_NAME = @P1
                AND tc.TABLE_SCHEMA = SCHEMA_NAME()
            ORDER BY kcu.ORDINAL_POSITION
        "#;

        let rows = self.fetch(sql, &[table_name]).await?;
        Ok(rows.iter().map(|row| text(row, 0)).collect())
    }

    async fn get_foreign_keys(
        &self,
        table_name: &str,
    ) -> Result<Vec<RawForeignKeyRow>, ConnectorError> {
        let sql = r#"
            SELECT
                CAST(rc.CONSTRAINT_NAME AS NVARCHAR(128)),
                CAST(kcu.TABLE_NAME AS NVARCHAR(128)),
                CAST(kcu.COLUMN_NAME AS NVARCHAR(128)),
                CAST(pk.TABLE_NAME AS NVARCHAR(128)),
                CAST(pk.COLUMN_NAME AS NVARCHAR(128)),
                CAST(rc.UPDATE_RULE AS NVARCHAR(32)),
                CAST(rc.DELETE_RULE AS NVARCHAR(32))
            FROM INFORMATION_SCHEMA.REFERENTIAL_CONSTRAINTS rc
            JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu
                ON kcu.CONSTRAINT_SCHEMA = rc.CONSTRAINT_SCHEMA
                AND kcu.CONSTRAINT_NAME = rc.CONSTRAINT_NAME
            JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE pk
                ON pk.CONSTRAINT_SCHEMA = rc.UNIQUE_CONSTRAINT_SCHEMA
                AND pk.CONSTRAINT_NAME = rc.UNIQUE_CONSTRAINT_NAME
                AND pk.ORDINAL_POSITION = kcu.ORDINAL_POSITION
            WHERE kcu.TABLE_NAME = @P1 AND kcu.TABLE_SCHEMA = SCHEMA_NAME()
            ORDER BY rc.CONSTRAINT_NAME, kcu.ORDINAL_POSITION
        "#;

        let rows = self.fetch(sql, &[table_name]).await?;
        Ok(rows
            .iter()
            .map(|row| RawForeignKeyRow {
                constraint_name: text(row, 0),
                child_table: text(row, 1),
                child_column: text(row, 2),
                parent_table: text(row, 3),
                parent_column: text(row, 4),
                update_rule: text(row, 5),
                delete_rule: text(row, 6),
            })
            .collect())
    }

    async fn execute_statement(&self, sql: &str) -> Result<(), ConnectorError> {
        let mut guard = self.client.lock().await;
        let client = guard.as_mut().ok_or_else(closed_error)?;

        client
            .execute(sql, &[])
            .await
            .map(|_| ())
            .map_err(|e| ConnectorError::Statement {
                sql: sql.to_string(),
                cause: e.to_string(),
            })
    }

    async fn close(&self) {
        let client = self.client.lock().await.take();
        if let Some(client) = client {
            if let Err(e) = client.close().await {
                warn!("Failed to close SQL Server connection: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_default_parens() {
        assert_eq!(strip_default_parens("((0))"), "0");
        assert_eq!(strip_default_parens("('abc')"), "'abc'");
        assert_eq!(strip_default_parens("(getdate())"), "getdate()");
        assert_eq!(strip_default_parens("N'x'"), "N'x'");
        assert_eq!(strip_default_parens("((1)+(2))"), "(1)+(2)");
    }
}
