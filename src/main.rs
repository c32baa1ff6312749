use anyhow::Result;
use clap::Parser;
use colored::control as color_control;
use std::env;
use std::path::PathBuf;
use std::process;
use strand::cli::commands::diff::{DiffCommand, DiffCommandHandler};
use strand::cli::commands::generate::{GenerateCommand, GenerateCommandHandler};
use strand::cli::commands::init::{InitCommand, InitCommandHandler};
use strand::cli::{Cli, Commands};
use strand::core::naming::LOG_ENV;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn main() {
    // CLIをパースして実行
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    match run_command(cli) {
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

/// トレーシングを初期化する
///
/// --verbose 指定時は debug、それ以外は STRAND_LOG / RUST_LOG、未設定なら warn。
/// ログは標準エラーに出力し、標準出力はコマンドの結果専用とする。
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("strand=debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("strand=warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// コマンドを実行する
fn run_command(cli: Cli) -> Result<String> {
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
        Commands::Generate {
            old,
            new,
            name,
            dry_run,
            output_dir,
        } => {
            let handler = GenerateCommandHandler::new();
            let command = GenerateCommand {
                project_path,
                config_path,
                old_schema: old,
                new_schema: new,
                name,
                dry_run,
                output_dir,
                format: cli.format,
            };
            handler.execute(&command)
        }

        Commands::Diff { old, new } => {
            let handler = DiffCommandHandler::new();
            let command = DiffCommand {
                project_path,
                config_path,
                old_schema: old,
                new_schema: new,
                format: cli.format,
            };
            handler.execute(&command)
        }

        Commands::Init { force } => {
            let handler = InitCommandHandler::new();
            let command = InitCommand {
                project_path,
                config_path,
                force,
            };
            let path = handler.execute(&command)?;
            Ok(format!("Config file written: {}", path.display()))
        }
    }
}
