// データベースコネクター
//
// スキーマ読み取りとDDL実行に必要な最小限の操作を抽象化するレイヤー。
// プロバイダーごとに1つの実装を持ち、接続時に一度だけ選択されます。

pub mod mysql;
pub mod postgres;
pub mod sqlite;
pub mod sqlserver;

pub use mysql::MySqlConnector;
pub use postgres::PostgresConnector;
pub use sqlite::SqliteConnector;
pub use sqlserver::SqlServerConnector;

use crate::core::config::{DatabaseConfig, Dialect};
use crate::core::error::{ConnectorError, SchemaError};
use async_trait::async_trait;

/// 生のカラム行（プロバイダー固有フォーマット）
///
/// スキーマリーダーが型分類サービスを通して Column に変換します。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawColumnRow {
    /// カラム名
    pub name: String,
    /// プロバイダー固有の型名
    pub type_name: String,
    /// 型フラグ（Jet の COLUMN_FLAGS、他プロバイダーでは0）
    pub flags: i64,
    /// 文字型の最大長（不明な場合は0、MAXは負値）
    pub length: i64,
    /// NULL許可フラグ
    pub nullable: bool,
    /// デフォルト値を持つかどうか
    pub has_default: bool,
    /// デフォルト値
    pub default_value: Option<String>,
    /// 序数位置（1始まり）
    pub position: u32,
    /// 行に埋め込まれた主キーフラグ（プロバイダーが報告しない場合はNone）
    pub primary_key: Option<bool>,
    /// 単一カラムのUNIQUE制約を持つか（プロバイダーが報告しない場合はNone）
    pub unique: Option<bool>,
}

/// 生の外部キー行（プロバイダー固有フォーマット）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawForeignKeyRow {
    /// 制約名
    pub constraint_name: String,
    /// 参照元テーブル
    pub child_table: String,
    /// 参照元カラム
    pub child_column: String,
    /// 参照先テーブル
    pub parent_table: String,
    /// 参照先カラム
    pub parent_column: String,
    /// 更新規則（"CASCADE", "SET NULL", "NO ACTION" など）
    pub update_rule: String,
    /// 削除規則
    pub delete_rule: String,
}

/// データベースコネクターインターフェース
///
/// 1回のエクスポート/インポートの間、1つの接続を排他的に使う前提です。
#[async_trait]
pub trait SchemaConnector: Send + Sync {
    /// 接続先の方言
    fn dialect(&self) -> Dialect;

    /// テーブル名一覧を取得
    async fn get_table_names(&self) -> Result<Vec<String>, ConnectorError>;

    /// カラム情報を取得
    async fn get_columns(&self, table_name: &str) -> Result<Vec<RawColumnRow>, ConnectorError>;

    /// 主キーのカラム名を取得
    ///
    /// 主キーをカラム行に埋め込んで報告するプロバイダーは実装しません。
    async fn get_primary_keys(&self, _table_name: &str) -> Result<Vec<String>, ConnectorError> {
        Err(ConnectorError::unsupported("PrimaryKeys"))
    }

    /// 外部キー情報を取得
    async fn get_foreign_keys(
        &self,
        table_name: &str,
    ) -> Result<Vec<RawForeignKeyRow>, ConnectorError>;

    /// DDL文を1つ実行
    async fn execute_statement(&self, sql: &str) -> Result<(), ConnectorError>;

    /// 接続を閉じる
    async fn close(&self);
}

/// 設定に応じたコネクターを作成
pub async fn connect(config: &DatabaseConfig) -> Result<Box<dyn SchemaConnector>, SchemaError> {
    let connector: Box<dyn SchemaConnector> = match config.dialect {
        Dialect::SQLite => Box::new(SqliteConnector::connect(config).await?),
        Dialect::MySQL => Box::new(MySqlConnector::connect(config).await?),
        Dialect::PostgreSQL => Box::new(PostgresConnector::connect(config).await?),
        Dialect::SqlServer => Box::new(SqlServerConnector::connect(config).await?),
        Dialect::Jet => return Err(SchemaError::NoConnector(Dialect::Jet)),
    };

    Ok(connector)
}

/// sqlxのエラーをクエリエラーに変換
pub(crate) fn query_error(sql: &str) -> impl FnOnce(sqlx::Error) -> ConnectorError + '_ {
    move |e| ConnectorError::Query {
        message: e.to_string(),
        sql: Some(sql.to_string()),
    }
}

/// sqlxのエラーを文実行エラーに変換
pub(crate) fn statement_error(sql: &str) -> impl FnOnce(sqlx::Error) -> ConnectorError + '_ {
    move |e| ConnectorError::Statement {
        sql: sql.to_string(),
        cause: e.to_string(),
    }
}
