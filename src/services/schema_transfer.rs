// スキーマ転送サービス
//
// エクスポート: スキーマ読み取り → 依存順ソート → DDL生成 → ファイル書き込み
// インポート: ファイル読み込み → ステートメント分割 → 1文ずつ実行
//
// インポートは最初に失敗した文で中断します。それまでに適用した文は
// ロールバックしません（スクリプト全体を囲むトランザクションはありません）。

use crate::adapters::connector::SchemaConnector;
use crate::adapters::sql_generator::create_generator;
use crate::core::config::Dialect;
use crate::core::error::{ConnectorError, IoError, SchemaError};
use crate::services::dependency_sorter::DependencySorter;
use crate::services::schema_reader::SchemaReader;
use crate::services::statement_splitter::{split_statements, StatementDelimiter};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{debug, error, info};

/// エクスポート結果の要約
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    /// 出力したテーブル（作成順）
    pub tables: Vec<String>,
    /// 書き込んだスクリプトのSHA-256（16進）
    pub checksum: String,
}

/// スクリプトのチェックサムを計算
pub fn script_checksum(script: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(script.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// スキーマエクスポートサービス
#[derive(Debug, Clone)]
pub struct SchemaExporter {
    reader: SchemaReader,
    sorter: DependencySorter,
}

impl SchemaExporter {
    /// 新しいSchemaExporterを作成
    pub fn new() -> Self {
        Self {
            reader: SchemaReader::new(),
            sorter: DependencySorter::new(),
        }
    }

    /// 接続先のスキーマを指定方言のスクリプトに変換
    ///
    /// # Arguments
    ///
    /// * `connector` - 読み取り元のコネクター
    /// * `target` - 出力する方言
    pub async fn render(
        &self,
        connector: &dyn SchemaConnector,
        target: Dialect,
    ) -> Result<String, SchemaError> {
        let (script, _) = self.render_ordered(connector, target).await?;
        Ok(script)
    }

    async fn render_ordered(
        &self,
        connector: &dyn SchemaConnector,
        target: Dialect,
    ) -> Result<(String, Vec<String>), SchemaError> {
        let schema = self.reader.read_schema(connector).await?;
        let tables = self.sorter.sort_tables(&schema);
        let script = create_generator(target).generate_schema(&tables);
        let order = tables.iter().map(|table| table.name.clone()).collect();
        Ok((script, order))
    }

    /// スキーマをファイルにエクスポートし、要約を返す
    ///
    /// # Returns
    ///
    /// 書き込みに失敗した場合は `Ok(None)`（エラーはログに出力済み）
    ///
    /// # Errors
    ///
    /// スキーマの読み取りに失敗した場合
    pub async fn export(
        &self,
        connector: &dyn SchemaConnector,
        target: Dialect,
        path: &Path,
    ) -> Result<Option<ExportSummary>, SchemaError> {
        let (script, tables) = self.render_ordered(connector, target).await?;

        if let Err(e) = tokio::fs::write(path, &script).await {
            let err = IoError::FileWrite {
                path: path.display().to_string(),
                cause: e.to_string(),
            };
            error!(error = %err, "Schema export failed");
            return Ok(None);
        }

        let summary = ExportSummary {
            tables,
            checksum: script_checksum(&script),
        };

        info!(
            path = %path.display(),
            source = %connector.dialect(),
            target = %target,
            tables = summary.tables.len(),
            "Exported schema"
        );

        Ok(Some(summary))
    }

    /// スキーマをファイルにエクスポート
    ///
    /// 書き込みに失敗した場合は `Ok(false)` を返します。
    pub async fn export_to_file(
        &self,
        connector: &dyn SchemaConnector,
        target: Dialect,
        path: &Path,
    ) -> Result<bool, SchemaError> {
        Ok(self.export(connector, target, path).await?.is_some())
    }
}

impl Default for SchemaExporter {
    fn default() -> Self {
        Self::new()
    }
}

/// スキーマインポートサービス
#[derive(Debug, Clone, Default)]
pub struct SchemaImporter {
    delimiter: StatementDelimiter,
}

impl SchemaImporter {
    /// 新しいSchemaImporterを作成
    pub fn new(delimiter: StatementDelimiter) -> Self {
        Self { delimiter }
    }

    /// スクリプト文字列をインポート
    ///
    /// # Returns
    ///
    /// 実行した文の数
    ///
    /// # Errors
    ///
    /// 文の実行に失敗した場合は `SchemaError::Statement`（残りの文は実行しない）
    pub async fn import_script(
        &self,
        connector: &dyn SchemaConnector,
        sql: &str,
    ) -> Result<usize, SchemaError> {
        let statements = split_statements(sql, self.delimiter);
        self.execute_statements(connector, &statements, |_, _| {})
            .await
    }

    /// スクリプトファイルをインポート
    ///
    /// ファイルが読めない場合は `Ok(false)` を返します。
    pub async fn import_file(
        &self,
        connector: &dyn SchemaConnector,
        path: &Path,
    ) -> Result<bool, SchemaError> {
        Ok(self
            .import_file_with_progress(connector, path, |_, _| {})
            .await?
            .is_some())
    }

    /// スクリプトファイルをインポートし、進捗をコールバックで通知
    ///
    /// # Arguments
    ///
    /// * `on_progress` - 文を1つ適用するたびに `(適用済み数, 総数)` で呼ばれる
    ///
    /// # Returns
    ///
    /// 実行した文の数。ファイルが読めない場合は `Ok(None)`
    pub async fn import_file_with_progress<F>(
        &self,
        connector: &dyn SchemaConnector,
        path: &Path,
        on_progress: F,
    ) -> Result<Option<usize>, SchemaError>
    where
        F: FnMut(usize, usize),
    {
        let sql = match tokio::fs::read_to_string(path).await {
            Ok(sql) => sql,
            Err(e) => {
                let err = if e.kind() == std::io::ErrorKind::NotFound {
                    IoError::FileNotFound {
                        path: path.display().to_string(),
                    }
                } else {
                    IoError::FileRead {
                        path: path.display().to_string(),
                        cause: e.to_string(),
                    }
                };
                error!(error = %err, "Schema import failed");
                return Ok(None);
            }
        };

        let statements = split_statements(&sql, self.delimiter);
        let applied = self
            .execute_statements(connector, &statements, on_progress)
            .await?;

        info!(
            path = %path.display(),
            target = %connector.dialect(),
            statements = applied,
            "Imported schema"
        );

        Ok(Some(applied))
    }

    async fn execute_statements<F>(
        &self,
        connector: &dyn SchemaConnector,
        statements: &[String],
        mut on_progress: F,
    ) -> Result<usize, SchemaError>
    where
        F: FnMut(usize, usize),
    {
        let total = statements.len();

        for (i, statement) in statements.iter().enumerate() {
            debug!(index = i + 1, total, "Executing statement");

            if let Err(e) = connector.execute_statement(statement).await {
                let cause = match e {
                    ConnectorError::Statement { cause, .. } => cause,
                    other => other.to_string(),
                };
                error!(
                    index = i + 1,
                    applied = i,
                    sql = %statement,
                    cause = %cause,
                    "Statement failed, aborting import"
                );
                return Err(SchemaError::Statement {
                    index: i + 1,
                    applied: i,
                    sql: statement.clone(),
                    cause,
                });
            }

            on_progress(i + 1, total);
        }

        Ok(total)
    }
}
