// inspectコマンドハンドラー
//
// 接続先のスキーマを読み取り、作成順（依存順）にテーブル構造を表示します。

use crate::cli::command_context::CommandContext;
use crate::cli::OutputFormat;
use crate::core::config::Dialect;
use crate::core::schema::{Schema, Table};
use crate::services::dependency_sorter::DependencySorter;
use crate::services::schema_reader::SchemaReader;
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;

/// inspectコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct InspectCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// 環境名
    pub env: String,
    /// 出力フォーマット
    pub format: OutputFormat,
}

/// JSON出力の構造体
#[derive(Debug, Serialize)]
struct InspectOutput<'a> {
    dialect: Dialect,
    tables: Vec<&'a Table>,
}

/// inspectコマンドハンドラー
#[derive(Debug, Default)]
pub struct InspectCommandHandler {}

impl InspectCommandHandler {
    /// 新しいInspectCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// inspectコマンドを実行
    pub async fn execute(&self, command: &InspectCommand) -> Result<String> {
        let context = CommandContext::load_with_config(
            command.project_path.clone(),
            command.config_path.clone(),
        )?;
        let db_config = context.database_config(&command.env)?;

        let connector = context.connect(&db_config).await?;
        let result = SchemaReader::new().read_schema(connector.as_ref()).await;
        connector.close().await;

        let schema = result.with_context(|| "Failed to read schema")?;
        self.render(&schema, db_config.dialect, command.format)
    }

    /// スキーマを指定フォーマットで整形
    fn render(&self, schema: &Schema, dialect: Dialect, format: OutputFormat) -> Result<String> {
        let tables = DependencySorter::new().sort_tables(schema);

        match format {
            OutputFormat::Json => {
                let output = InspectOutput { dialect, tables };
                serde_json::to_string_pretty(&output)
                    .with_context(|| "Failed to serialize schema to JSON")
            }
            OutputFormat::Text => Ok(self.render_text(&tables, dialect)),
        }
    }

    fn render_text(&self, tables: &[&Table], dialect: Dialect) -> String {
        let mut text = String::new();
        let _ = writeln!(
            text,
            "{} ({} table(s), {})",
            "Schema".bold(),
            tables.len(),
            dialect
        );

        for table in tables {
            let _ = writeln!(text);
            let _ = writeln!(text, "{}", table.name.cyan().bold());

            for column in table.ordered_columns() {
                let mut line = format!("  {} {:?}", column.name, column.column_type);
                if column.length > 0 {
                    let _ = write!(line, "({})", column.length);
                }
                if table.primary_key.as_deref() == Some(column.name.as_str()) {
                    line.push_str(" PRIMARY KEY");
                }
                if !column.nullable {
                    line.push_str(" NOT NULL");
                }
                if column.unique {
                    line.push_str(" UNIQUE");
                }
                if let Some(default_value) = &column.default_value {
                    let _ = write!(line, " DEFAULT {}", default_value);
                }
                let _ = writeln!(text, "{}", line);
            }

            for fk in &table.foreign_keys {
                let _ = writeln!(
                    text,
                    "  {} {} → {}.{} ({})",
                    "FK".yellow(),
                    fk.child_column,
                    fk.parent_table,
                    fk.parent_column,
                    fk.name
                );
            }
        }

        text.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{Column, ColumnType, ForeignKey};

    fn sample_schema() -> Schema {
        let mut categories = Table::new("Categories");
        categories.add_column(
            Column::new("id", ColumnType::AutoNumber, false)
                .with_position(1)
                .primary(),
        );
        categories.add_column(
            Column::new("name", ColumnType::VarChar, false)
                .with_length(50)
                .with_position(2),
        );

        let mut sections = Table::new("Sections");
        sections.add_column(
            Column::new("id", ColumnType::AutoNumber, false)
                .with_position(1)
                .primary(),
        );
        sections.add_column(Column::new("category_id", ColumnType::Integer, true).with_position(2));
        sections.add_foreign_key(ForeignKey::new(
            "FK_Sections_Categories_0",
            "Sections",
            "category_id",
            "Categories",
            "id",
        ));

        let mut schema = Schema::new();
        schema.add_table(sections);
        schema.add_table(categories);
        schema
    }

    #[test]
    fn test_render_text() {
        colored::control::set_override(false);
        let text = InspectCommandHandler::new()
            .render(&sample_schema(), Dialect::SQLite, OutputFormat::Text)
            .unwrap();

        assert!(text.starts_with("Schema (2 table(s), sqlite)"));
        assert!(text.contains("  name VarChar(50) NOT NULL"));
        assert!(text.contains("  id AutoNumber PRIMARY KEY NOT NULL"));
        assert!(text.contains("  FK category_id → Categories.id (FK_Sections_Categories_0)"));
        assert!(text.find("Categories").unwrap() < text.find("Sections").unwrap());
    }

    #[test]
    fn test_render_json() {
        let json = InspectCommandHandler::new()
            .render(&sample_schema(), Dialect::PostgreSQL, OutputFormat::Json)
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["dialect"], "postgresql");
        assert_eq!(value["tables"][0]["name"], "Categories");
        assert_eq!(value["tables"][1]["foreign_keys"][0]["parent_table"], "Categories");
    }
}
