// exportコマンドハンドラー
//
// 接続先のスキーマを依存順のCREATE TABLEスクリプトとしてファイルに書き出します。
// 読み取り・並べ替え・DDL生成は SchemaExporter（services層）が担当し、
// このモジュールは設定読み込み、接続の確立と解放、結果の表示を行います。

use crate::cli::command_context::CommandContext;
use crate::core::config::Dialect;
use crate::services::schema_transfer::{ExportSummary, SchemaExporter};
use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// exportコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct ExportCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// 環境名
    pub env: String,
    /// 出力ファイル
    pub output: PathBuf,
    /// 出力する方言（Noneの場合は接続先と同じ）
    pub target: Option<Dialect>,
}

/// exportコマンドハンドラー
#[derive(Debug, Default)]
pub struct ExportCommandHandler {}

impl ExportCommandHandler {
    /// 新しいExportCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// exportコマンドを実行
    ///
    /// # Arguments
    ///
    /// * `command` - exportコマンドのパラメータ
    ///
    /// # Returns
    ///
    /// 成功時はエクスポート結果のサマリー
    pub async fn execute(&self, command: &ExportCommand) -> Result<String> {
        let context = CommandContext::load_with_config(
            command.project_path.clone(),
            command.config_path.clone(),
        )?;
        let db_config = context.database_config(&command.env)?;
        let target = command.target.unwrap_or(db_config.dialect);
        let output = context.resolve_path(&command.output);

        let connector = context.connect(&db_config).await?;
        let result = SchemaExporter::new()
            .export(connector.as_ref(), target, &output)
            .await;
        connector.close().await;

        let summary = result.with_context(|| "Failed to export schema")?;
        let summary = summary
            .ok_or_else(|| anyhow!("Failed to write schema file: {:?}", output))?;

        Ok(self.format_summary(&summary, db_config.dialect, target, &output))
    }

    /// エクスポート結果をテキストに整形
    fn format_summary(
        &self,
        summary: &ExportSummary,
        source: Dialect,
        target: Dialect,
        output: &Path,
    ) -> String {
        let mut text = String::new();
        let _ = writeln!(
            text,
            "{} Exported {} table(s) to {} ({} → {})",
            "✓".green().bold(),
            summary.tables.len(),
            output.display().to_string().cyan(),
            source,
            target
        );

        for (i, table) in summary.tables.iter().enumerate() {
            let _ = writeln!(text, "  {:>3}. {}", i + 1, table);
        }

        let _ = write!(text, "Checksum: {}", summary.checksum.dimmed());
        text
    }
}
