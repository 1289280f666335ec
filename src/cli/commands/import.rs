// importコマンドハンドラー
//
// スキーマスクリプトを1文ずつ接続先に適用します。
// 最初に失敗した文で中断し、適用済みの文はロールバックしません。

use crate::cli::command_context::CommandContext;
use crate::core::error::SchemaError;
use crate::services::schema_transfer::SchemaImporter;
use crate::services::statement_splitter::StatementDelimiter;
use anyhow::{anyhow, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

/// importコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct ImportCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// 環境名
    pub env: String,
    /// 入力ファイル
    pub input: PathBuf,
    /// ステートメントの区切り方
    pub delimiter: StatementDelimiter,
}

/// importコマンドハンドラー
#[derive(Debug, Default)]
pub struct ImportCommandHandler {}

impl ImportCommandHandler {
    /// 新しいImportCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// importコマンドを実行
    ///
    /// # Arguments
    ///
    /// * `command` - importコマンドのパラメータ
    ///
    /// # Returns
    ///
    /// 成功時は適用した文の数を含むメッセージ
    pub async fn execute(&self, command: &ImportCommand) -> Result<String> {
        let context = CommandContext::load_with_config(
            command.project_path.clone(),
            command.config_path.clone(),
        )?;
        let db_config = context.database_config(&command.env)?;
        let input = context.resolve_path(&command.input);

        let connector = context.connect(&db_config).await?;

        let progress = ProgressBar::new(0);
        progress.set_style(progress_style());
        progress.set_message("Applying statements");

        let result = SchemaImporter::new(command.delimiter)
            .import_file_with_progress(connector.as_ref(), &input, |applied, total| {
                progress.set_length(total as u64);
                progress.set_position(applied as u64);
            })
            .await;

        progress.finish_and_clear();
        connector.close().await;

        match result {
            Ok(Some(applied)) => Ok(format!(
                "{} Applied {} statement(s) from {} to {} ({})",
                "✓".green().bold(),
                applied,
                input.display().to_string().cyan(),
                command.env,
                db_config.dialect
            )),
            Ok(None) => Err(anyhow!("Failed to read schema file: {:?}", input)),
            Err(e) => Err(self.describe_failure(e)),
        }
    }

    /// 文の実行失敗を、失敗した文を含むエラーに変換
    fn describe_failure(&self, error: SchemaError) -> anyhow::Error {
        if let SchemaError::Statement {
            index,
            applied,
            sql,
            ..
        } = &error
        {
            return anyhow!(
                "{}\n\n{}\n{}\n\n{}",
                error,
                format!("Statement {}:", index).red().bold(),
                sql,
                format!(
                    "{} statement(s) were applied before the failure and were not rolled back.",
                    applied
                )
                .yellow()
            );
        }

        anyhow::Error::new(error).context("Failed to import schema")
    }
}

fn progress_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {pos}/{len}")
        .map(|style| style.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}
