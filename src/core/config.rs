// 設定ファイル管理
//
// プロジェクトの設定ファイル（YAML形式）の読み込み、検証、
// 環境別のデータベース接続設定の管理を行います。

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// データベース方言
///
/// 接続先プロバイダーの種類と、DDL生成時の方言を兼ねます。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    #[serde(rename = "sqlite")]
    SQLite,
    #[serde(rename = "mysql")]
    MySQL,
    #[serde(rename = "postgresql", alias = "postgres")]
    PostgreSQL,
    #[serde(rename = "sqlserver", alias = "mssql")]
    SqlServer,
    /// Jet/Access（レガシー方言、DDL出力専用）
    #[serde(rename = "jet", alias = "access")]
    Jet,
}

impl Dialect {
    /// 既定のポート番号
    pub fn default_port(&self) -> u16 {
        match self {
            Dialect::PostgreSQL => 5432,
            Dialect::MySQL => 3306,
            Dialect::SqlServer => 1433,
            Dialect::SQLite | Dialect::Jet => 0,
        }
    }

    /// ライブ接続をサポートする方言かどうか
    ///
    /// Jetはこのプラットフォームから到達できないため、DDLの出力先としてのみ扱います。
    pub fn supports_connection(&self) -> bool {
        !matches!(self, Dialect::Jet)
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::SQLite => write!(f, "sqlite"),
            Dialect::MySQL => write!(f, "mysql"),
            Dialect::PostgreSQL => write!(f, "postgresql"),
            Dialect::SqlServer => write!(f, "sqlserver"),
            Dialect::Jet => write!(f, "jet"),
        }
    }
}

impl FromStr for Dialect {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Dialect::SQLite),
            "mysql" => Ok(Dialect::MySQL),
            "postgresql" | "postgres" => Ok(Dialect::PostgreSQL),
            "sqlserver" | "mssql" => Ok(Dialect::SqlServer),
            "jet" | "access" => Ok(Dialect::Jet),
            other => Err(anyhow!(
                "Unsupported database dialect: {}. Please specify one of: sqlite, mysql, postgresql, sqlserver, jet.",
                other
            )),
        }
    }
}

/// プロジェクト設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// 設定ファイルのバージョン
    pub version: String,

    /// 環境別のデータベース設定
    pub environments: HashMap<String, DatabaseConfig>,
}

impl Config {
    /// デフォルトの設定ファイルパス
    pub const DEFAULT_CONFIG_PATH: &'static str = crate::core::naming::CONFIG_FILE;

    /// 指定された環境のデータベース設定を取得
    pub fn get_database_config(&self, environment: &str) -> Result<DatabaseConfig> {
        self.environments.get(environment).cloned().ok_or_else(|| {
            let mut available: Vec<&String> = self.environments.keys().collect();
            available.sort();
            anyhow!(
                "Environment '{}' not found. Available environments: {:?}",
                environment,
                available
            )
        })
    }

    /// 設定の妥当性を検証
    pub fn validate(&self) -> Result<()> {
        if self.version.is_empty() {
            return Err(anyhow!("Config file version is not specified"));
        }

        if self.environments.is_empty() {
            return Err(anyhow!(
                "At least one environment configuration is required"
            ));
        }

        for (env_name, db_config) in &self.environments {
            db_config
                .validate()
                .with_context(|| format!("Invalid config for environment '{}'", env_name))?;
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(yaml: &str) -> Result<Self, Self::Err> {
        serde_saphyr::from_str(yaml).with_context(|| "Failed to parse config file")
    }
}

/// データベース接続設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// 接続先の方言
    pub dialect: Dialect,

    /// ホスト名（SQLiteの場合は不要）
    #[serde(default = "default_host")]
    pub host: String,

    /// ポート番号（省略時は方言の既定値）
    #[serde(default)]
    pub port: Option<u16>,

    /// データベース名（SQLiteの場合はファイルパス）
    pub database: String,

    /// ユーザー名
    pub user: Option<String>,

    /// パスワード
    pub password: Option<String>,

    /// 接続タイムアウト（秒）
    pub timeout: Option<u64>,
}

fn default_host() -> String {
    "localhost".to_string()
}

impl DatabaseConfig {
    /// SQLiteファイル用の設定を作成
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self {
            dialect: Dialect::SQLite,
            host: String::new(),
            port: None,
            database: path.into(),
            user: None,
            password: None,
            timeout: None,
        }
    }

    /// 実際に使用するポート番号
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.dialect.default_port())
    }

    /// Validate database configuration
    pub fn validate(&self) -> Result<()> {
        if self.database.is_empty() {
            return Err(anyhow!("Database name is not specified"));
        }

        if !self.dialect.supports_connection() {
            return Err(anyhow!(
                "Dialect '{}' can only be used as an export target, not as a connection",
                self.dialect
            ));
        }

        Ok(())
    }
}
