// エラー型定義
//
// ライブラリ全体で使用されるカスタムエラー型を提供します。
// thiserrorを使用して、ConnectorError, SchemaError, IoError を定義します。

use crate::core::config::Dialect;
use thiserror::Error;

/// コネクターエラー
///
/// データベースコネクター（スキーマ取得・文実行）で発生するエラーを表現します。
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// プロバイダーが該当するスキーマコレクションを提供していない
    #[error("Schema collection '{collection}' is not supported by this provider")]
    Unsupported {
        /// コレクション名（"PrimaryKeys", "ForeignKeys" など）
        collection: String,
    },

    /// Connection error
    #[error("Database connection error: {message} (cause: {cause})")]
    Connection {
        /// エラーメッセージ
        message: String,
        /// エラー原因
        cause: String,
    },

    /// Metadata query error
    #[error("Query execution error: {message}")]
    Query {
        /// エラーメッセージ
        message: String,
        /// 失敗したSQL
        sql: Option<String>,
    },

    /// DDL statement execution error
    #[error("Statement execution error: {cause}")]
    Statement {
        /// 失敗したSQL
        sql: String,
        /// エラー原因
        cause: String,
    },
}

impl ConnectorError {
    /// 未サポートコレクションのエラーを作成
    pub fn unsupported(collection: impl Into<String>) -> Self {
        ConnectorError::Unsupported {
            collection: collection.into(),
        }
    }

    /// クエリエラーを作成
    pub fn query(message: impl Into<String>, sql: impl Into<String>) -> Self {
        ConnectorError::Query {
            message: message.into(),
            sql: Some(sql.into()),
        }
    }

    /// 未サポートエラーかどうか
    pub fn is_unsupported(&self) -> bool {
        matches!(self, ConnectorError::Unsupported { .. })
    }

    /// 接続エラーかどうか
    pub fn is_connection(&self) -> bool {
        matches!(self, ConnectorError::Connection { .. })
    }

    /// クエリエラーかどうか
    pub fn is_query(&self) -> bool {
        matches!(self, ConnectorError::Query { .. })
    }

    /// 文実行エラーかどうか
    pub fn is_statement(&self) -> bool {
        matches!(self, ConnectorError::Statement { .. })
    }
}

/// I/Oエラー
///
/// スキーマファイル操作時に発生するエラーを表現します。
#[derive(Debug, Error)]
pub enum IoError {
    /// File not found
    #[error("File not found: {path}")]
    FileNotFound {
        /// ファイルパス
        path: String,
    },

    /// File read error
    #[error("Failed to read file: {path} (cause: {cause})")]
    FileRead {
        /// ファイルパス
        path: String,
        /// エラー原因
        cause: String,
    },

    /// File write error
    #[error("Failed to write file: {path} (cause: {cause})")]
    FileWrite {
        /// ファイルパス
        path: String,
        /// エラー原因
        cause: String,
    },
}

impl IoError {
    /// ファイルが見つからないエラーかどうか
    pub fn is_file_not_found(&self) -> bool {
        matches!(self, IoError::FileNotFound { .. })
    }

    /// ファイル読み込みエラーかどうか
    pub fn is_file_read(&self) -> bool {
        matches!(self, IoError::FileRead { .. })
    }

    /// ファイル書き込みエラーかどうか
    pub fn is_file_write(&self) -> bool {
        matches!(self, IoError::FileWrite { .. })
    }
}

/// スキーマエクスポート/インポートのエラー
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Connector error
    #[error(transparent)]
    Connector(#[from] ConnectorError),

    /// File I/O error
    #[error(transparent)]
    Io(#[from] IoError),

    /// インポート中の文実行失敗（以降の文は実行されない）
    #[error("Statement {index} failed after {applied} statement(s) were applied: {cause}")]
    Statement {
        /// 失敗した文の番号（1始まり）
        index: usize,
        /// 失敗前に適用済みの文の数
        applied: usize,
        /// 失敗したSQL
        sql: String,
        /// エラー原因
        cause: String,
    },

    /// この方言用のコネクターが存在しない
    #[error("No connector is available for dialect '{0}'")]
    NoConnector(Dialect),
}

impl SchemaError {
    /// 文実行エラーかどうか
    pub fn is_statement(&self) -> bool {
        matches!(self, SchemaError::Statement { .. })
    }

    /// 失敗したSQL文を取得
    pub fn failed_sql(&self) -> Option<&str> {
        match self {
            SchemaError::Statement { sql, .. } => Some(sql),
            SchemaError::Connector(ConnectorError::Statement { sql, .. }) => Some(sql),
            SchemaError::Connector(ConnectorError::Query { sql, .. }) => sql.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connector_error_variants() {
        let unsupported = ConnectorError::unsupported("ForeignKeys");
        assert!(unsupported.is_unsupported());
        assert!(unsupported.to_string().contains("ForeignKeys"));

        let conn_error = ConnectorError::Connection {
            message: "Connection failed".to_string(),
            cause: "Timeout".to_string(),
        };
        assert!(conn_error.is_connection());
        assert!(!conn_error.is_unsupported());

        let query_error = ConnectorError::query("bad pragma", "PRAGMA table_info(x)");
        assert!(query_error.is_query());

        let stmt_error = ConnectorError::Statement {
            sql: "CREATE TABEL x".to_string(),
            cause: "syntax error".to_string(),
        };
        assert!(stmt_error.is_statement());
    }

    #[test]
    fn test_schema_error_from_connector() {
        let error: SchemaError = ConnectorError::query("failed", "SELECT 1").into();
        assert!(matches!(error, SchemaError::Connector(_)));
        assert_eq!(error.failed_sql(), Some("SELECT 1"));
    }

    #[test]
    fn test_schema_error_statement() {
        let error = SchemaError::Statement {
            index: 2,
            applied: 1,
            sql: "CREATE TABEL broken".to_string(),
            cause: "syntax error".to_string(),
        };
        assert!(error.is_statement());
        assert_eq!(error.failed_sql(), Some("CREATE TABEL broken"));
        assert!(error.to_string().contains("Statement 2"));
    }

    #[test]
    fn test_io_error_variants() {
        let not_found = IoError::FileNotFound {
            path: "/path/to/schema.sql".to_string(),
        };
        assert!(not_found.is_file_not_found());

        let read_error = IoError::FileRead {
            path: "/path/to/schema.sql".to_string(),
            cause: "Permission denied".to_string(),
        };
        assert!(read_error.is_file_read());

        let write_error = IoError::FileWrite {
            path: "/path/to/schema.sql".to_string(),
            cause: "Disk full".to_string(),
        };
        assert!(write_error.is_file_write());
    }
}
