use anyhow::{Context, Result};
use clap::Parser;
use colored::control as color_control;
use schemaport::cli::commands::export::{ExportCommand, ExportCommandHandler};
use schemaport::cli::commands::import::{ImportCommand, ImportCommandHandler};
use schemaport::cli::commands::inspect::{InspectCommand, InspectCommandHandler};
use schemaport::cli::{Cli, Commands};
use schemaport::core::config::Dialect;
use schemaport::services::statement_splitter::StatementDelimiter;
use std::env;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    // CLIをパースして実行
    let cli = Cli::parse();

    init_logging(cli.verbose);

    // 非同期ランタイムを作成して実行
    let runtime = tokio::runtime::Runtime::new()
        .context("Failed to create Tokio runtime")
        .unwrap_or_else(|e| {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        });

    let result = runtime.block_on(run_command(cli));

    match result {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

/// ログ出力を初期化する
///
/// RUST_LOG が設定されていればそれに従い、なければ warn（--verbose で info）。
fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// コマンドを実行する
async fn run_command(cli: Cli) -> Result<String> {
    // --no-color フラグの処理
    if cli.no_color {
        color_control::set_override(false);
    }

    // プロジェクトのルートパスを取得
    let project_path = env::current_dir()?;

    // --config フラグの処理（絶対パスに変換）
    let config_path: Option<PathBuf> = cli.config.map(|p| {
        if p.is_absolute() {
            p
        } else {
            project_path.join(p)
        }
    });

    match cli.command {
        Commands::Export { env, output, target } => {
            let target = target
                .as_deref()
                .map(str::parse::<Dialect>)
                .transpose()?;
            let handler = ExportCommandHandler::new();
            let command = ExportCommand {
                project_path,
                config_path,
                env,
                output,
                target,
            };
            handler.execute(&command).await
        }

        Commands::Import {
            env,
            input,
            blank_line_delimited,
        } => {
            let delimiter = if blank_line_delimited {
                StatementDelimiter::BlankLine
            } else {
                StatementDelimiter::Semicolon
            };
            let handler = ImportCommandHandler::new();
            let command = ImportCommand {
                project_path,
                config_path,
                env,
                input,
                delimiter,
            };
            handler.execute(&command).await
        }

        Commands::Inspect { env, format } => {
            let handler = InspectCommandHandler::new();
            let command = InspectCommand {
                project_path,
                config_path,
                env,
                format,
            };
            handler.execute(&command).await
        }
    }
}
