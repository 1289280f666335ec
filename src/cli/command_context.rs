// コマンド共通コンテキスト
//
// 設定ファイル読み込み、環境変数による上書き、接続確立の重複をCLI層で集約する。

use crate::adapters::connector::{connect, SchemaConnector};
use crate::cli::config_loader::ConfigLoader;
use crate::core::config::{Config, DatabaseConfig, Dialect};
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// 環境変数による上書きのプレフィックス
const ENV_OVERRIDE_PREFIX: &str = "SCHEMAPORT_DB_";

/// CLIコマンド共通の実行コンテキスト
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub project_path: PathBuf,
    pub config_path: PathBuf,
    pub config: Config,
}

impl CommandContext {
    /// カスタム設定ファイルパスを指定してコンテキストを作成
    ///
    /// 指定がない場合はプロジェクトルートの `.schemaport.yaml` を読み込みます。
    pub fn load_with_config(
        project_path: PathBuf,
        custom_config_path: Option<PathBuf>,
    ) -> Result<Self> {
        let config_path = custom_config_path
            .unwrap_or_else(|| project_path.join(Config::DEFAULT_CONFIG_PATH));

        if !config_path.exists() {
            return Err(anyhow!(
                "Config file not found: {:?}. Create it or pass --config.",
                config_path
            ));
        }

        let config = ConfigLoader::from_file(&config_path)?;

        Ok(Self {
            project_path,
            config_path,
            config,
        })
    }

    /// プロジェクトルートからの相対パスを解決
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_path.join(path)
        }
    }

    /// 環境に応じたデータベース設定を取得（環境変数で上書き）
    ///
    /// SQLiteの相対パスはプロジェクトルート基準で解決します。
    pub fn database_config(&self, env: &str) -> Result<DatabaseConfig> {
        let config = self.config.get_database_config(env)?;
        let mut config = apply_overrides(&config, |key| std::env::var(key).ok());

        if config.dialect == Dialect::SQLite {
            let path = self.resolve_path(Path::new(&config.database));
            config.database = path.to_string_lossy().to_string();
        }

        Ok(config)
    }

    /// データベースに接続
    pub async fn connect(&self, config: &DatabaseConfig) -> Result<Box<dyn SchemaConnector>> {
        config.validate()?;
        debug!(dialect = %config.dialect, database = %config.database, "Connecting");

        connect(config)
            .await
            .with_context(|| format!("Failed to connect to {} database", config.dialect))
    }
}

/// 環境変数による上書きを適用
///
/// `SCHEMAPORT_DB_HOST`, `_PORT`, `_DATABASE`, `_USER`, `_PASSWORD` を参照します。
fn apply_overrides(
    base: &DatabaseConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> DatabaseConfig {
    let var = |name: &str| lookup(&format!("{}{}", ENV_OVERRIDE_PREFIX, name));
    let mut config = base.clone();

    if let Some(host) = var("HOST") {
        config.host = host;
    }
    if let Some(port) = var("PORT").and_then(|p| p.parse::<u16>().ok()) {
        config.port = Some(port);
    }
    if let Some(database) = var("DATABASE") {
        config.database = database;
    }
    if let Some(user) = var("USER") {
        config.user = Some(user);
    }
    if let Some(password) = var("PASSWORD") {
        config.password = Some(password);
    }

    config
}
