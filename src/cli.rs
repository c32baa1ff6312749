// CLI Layer
// ユーザー入力の受付とコマンドルーティング

pub mod command_context;
pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// 出力フォーマット
#[derive(Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// Structured JSON output
    Json,
}

/// Strand - Schema DNA Diffing CLI
///
/// Compares two SQL schema dumps and produces a risk-annotated
/// forward migration together with an emergency rollback script.
#[derive(Parser, Debug)]
#[command(name = "strand")]
#[command(author = "Strand Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Schema diffing tool that generates risk-annotated migrations")]
#[command(long_about = "Strand - Schema DNA Diffing CLI

Compares two SQL schema dumps (old and new) and generates:
  • A forward migration script wrapped in a single transaction
  • An emergency rollback script that undoes it in reverse order
  • A risk assessment (LOW, MEDIUM, HIGH, CRITICAL) for every change

Destructive changes on sensitive tables (patients, users, accounts, ...)
are escalated to CRITICAL and require manual review.")]
#[command(propagate_version = true)]
#[command(after_help = "GETTING STARTED:
  1. Create an editable risk policy:   strand init
  2. Review the changes:               strand diff old.sql new.sql
  3. Generate migration files:         strand generate old.sql new.sql add_email

For detailed help on each command, use: strand <command> --help")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Output format (text or json)
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate migration and rollback files from two schema dumps
    ///
    /// Extracts both schemas, detects every structural change, classifies
    /// its risk and writes <timestamp>_<name>.sql and
    /// <timestamp>_<name>_ROLLBACK.sql.
    ///
    /// EXAMPLES:
    ///   # Generate into the configured migrations directory
    ///   strand generate schema_v1.sql schema_v2.sql add_email
    ///
    ///   # Preview both scripts without writing files
    ///   strand generate schema_v1.sql schema_v2.sql add_email --dry-run
    ///
    ///   # Write into a custom directory
    ///   strand generate old.sql new.sql cleanup --output-dir db/migrations
    Generate {
        /// Schema dump before the change
        #[arg(value_name = "OLD")]
        old: PathBuf,

        /// Schema dump after the change
        #[arg(value_name = "NEW")]
        new: PathBuf,

        /// Migration name (used in file names)
        #[arg(value_name = "NAME")]
        name: String,

        /// Dry run - print both scripts without creating files
        #[arg(long)]
        dry_run: bool,

        /// Output directory (defaults to migrations_dir from the config)
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Show the risk report for two schema dumps
    ///
    /// Detects and classifies changes without rendering or writing any files.
    ///
    /// EXAMPLES:
    ///   strand diff schema_v1.sql schema_v2.sql
    ///
    ///   # Machine-readable report
    ///   strand diff schema_v1.sql schema_v2.sql --format json
    Diff {
        /// Schema dump before the change
        #[arg(value_name = "OLD")]
        old: PathBuf,

        /// Schema dump after the change
        #[arg(value_name = "NEW")]
        new: PathBuf,
    },

    /// Write a default configuration file
    ///
    /// Creates .strand.yaml containing the built-in risk policy and
    /// operation order so they can be tuned per deployment.
    ///
    /// EXAMPLES:
    ///   strand init
    ///
    ///   # Overwrite an existing configuration
    ///   strand init --force
    Init {
        /// Overwrite the config file if it already exists
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate() {
        let cli = Cli::try_parse_from([
            "strand",
            "generate",
            "old.sql",
            "new.sql",
            "add_email",
            "--dry-run",
        ])
        .unwrap();

        match cli.command {
            Commands::Generate {
                old,
                new,
                name,
                dry_run,
                output_dir,
            } => {
                assert_eq!(old, PathBuf::from("old.sql"));
                assert_eq!(new, PathBuf::from("new.sql"));
                assert_eq!(name, "add_email");
                assert!(dry_run);
                assert!(output_dir.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "strand", "diff", "a.sql", "b.sql", "--format", "json", "--no-color", "-v",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.no_color);
        assert!(cli.verbose);
    }

    #[test]
    fn test_generate_requires_name() {
        assert!(Cli::try_parse_from(["strand", "generate", "old.sql", "new.sql"]).is_err());
    }
}
