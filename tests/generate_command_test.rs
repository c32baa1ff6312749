/// generate / diff / init コマンドハンドラーのテスト
///
/// スキーマファイルの読み込みからマイグレーションファイルの書き出しまでを
/// 一時ディレクトリ上で確認します。
#[cfg(test)]
mod generate_command_tests {
    use std::fs;
    use std::path::{Path, PathBuf};
    use strand::cli::commands::diff::{DiffCommand, DiffCommandHandler};
    use strand::cli::commands::generate::{GenerateCommand, GenerateCommandHandler};
    use strand::cli::commands::init::{InitCommand, InitCommandHandler};
    use strand::cli::OutputFormat;
    use strand::core::error::IoError;
    use tempfile::TempDir;

    const OLD_SCHEMA: &str = "CREATE TABLE patients (id SERIAL PRIMARY KEY, name TEXT NOT NULL);\n";
    const NEW_SCHEMA: &str =
        "CREATE TABLE patients (id SERIAL PRIMARY KEY, name TEXT NOT NULL, email VARCHAR(255) UNIQUE);\n";

    fn disable_color() {
        colored::control::set_override(false);
    }

    fn setup(old: &str, new: &str) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("old.sql"), old).unwrap();
        fs::write(temp_dir.path().join("new.sql"), new).unwrap();
        temp_dir
    }

    fn command(project_path: &Path, name: &str) -> GenerateCommand {
        GenerateCommand {
            project_path: project_path.to_path_buf(),
            config_path: None,
            old_schema: PathBuf::from("old.sql"),
            new_schema: PathBuf::from("new.sql"),
            name: name.to_string(),
            dry_run: false,
            output_dir: None,
            format: OutputFormat::Text,
        }
    }

    fn sql_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    /// コマンドハンドラーの作成テスト
    #[test]
    fn test_new_command_handler() {
        let handler = GenerateCommandHandler::new();
        assert!(format!("{:?}", handler).contains("GenerateCommandHandler"));
    }

    /// マイグレーションとロールバックのファイルが書き出される
    #[test]
    fn test_generate_writes_both_files() {
        disable_color();
        let temp_dir = setup(OLD_SCHEMA, NEW_SCHEMA);

        let output = GenerateCommandHandler::new()
            .execute(&command(temp_dir.path(), "Add Email"))
            .unwrap();

        let migrations_dir = temp_dir.path().join("migrations");
        let files = sql_files(&migrations_dir);
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("_add_email.sql"));
        assert!(files[1].ends_with("_add_email_ROLLBACK.sql"));

        let migration = fs::read_to_string(migrations_dir.join(&files[0])).unwrap();
        assert!(migration.contains("ALTER TABLE patients ADD COLUMN email VARCHAR(255);"));
        let rollback = fs::read_to_string(migrations_dir.join(&files[1])).unwrap();
        assert!(rollback.contains("ALTER TABLE patients DROP COLUMN email;"));

        assert!(output.contains("ADD_COLUMN patients.email"));
        assert!(output.contains("Migration files generated:"));
    }

    /// 変更がない場合はファイルを書き出さない
    #[test]
    fn test_generate_without_changes() {
        let temp_dir = setup(OLD_SCHEMA, OLD_SCHEMA);

        let output = GenerateCommandHandler::new()
            .execute(&command(temp_dir.path(), "noop"))
            .unwrap();

        assert_eq!(output, "No schema changes detected. Schema is stable.");
        assert!(!temp_dir.path().join("migrations").exists());
    }

    /// dry-run では両ドキュメントを表示し、ファイルを書き出さない
    #[test]
    fn test_generate_dry_run() {
        disable_color();
        let temp_dir = setup(OLD_SCHEMA, NEW_SCHEMA);
        let mut cmd = command(temp_dir.path(), "add email");
        cmd.dry_run = true;

        let output = GenerateCommandHandler::new().execute(&cmd).unwrap();

        assert!(output.contains("-- Schema Migration: add_email"));
        assert!(output.contains("-- Emergency Rollback Script"));
        assert!(!temp_dir.path().join("migrations").exists());
    }

    /// 出力ディレクトリの指定
    #[test]
    fn test_generate_custom_output_dir() {
        disable_color();
        let temp_dir = setup(OLD_SCHEMA, NEW_SCHEMA);
        let mut cmd = command(temp_dir.path(), "add email");
        cmd.output_dir = Some(PathBuf::from("db/out"));

        GenerateCommandHandler::new().execute(&cmd).unwrap();

        assert_eq!(sql_files(&temp_dir.path().join("db/out")).len(), 2);
    }

    /// CRITICAL 変更は警告付きで生成される（エラーにはならない）
    #[test]
    fn test_generate_critical_change_warns() {
        disable_color();
        let temp_dir = setup(OLD_SCHEMA, "");

        let output = GenerateCommandHandler::new()
            .execute(&command(temp_dir.path(), "drop patients"))
            .unwrap();

        assert!(output.contains("[CRITICAL] DROP_TABLE patients"));
        assert!(output.contains("Manual review required before execution."));
        assert_eq!(sql_files(&temp_dir.path().join("migrations")).len(), 2);
    }

    /// JSON出力
    #[test]
    fn test_generate_json_output() {
        let temp_dir = setup(OLD_SCHEMA, NEW_SCHEMA);
        let mut cmd = command(temp_dir.path(), "add email");
        cmd.format = OutputFormat::Json;
        cmd.dry_run = true;

        let output = GenerateCommandHandler::new().execute(&cmd).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["dry_run"], true);
        assert_eq!(value["changes"][0]["change_type"], "ADD_COLUMN");
        assert_eq!(value["changes"][0]["table"], "patients");
        assert_eq!(value["changes"][0]["object"], "email");
        assert_eq!(value["changes"][0]["risk_level"], "LOW");
        assert_eq!(value["risk_counts"]["LOW"], 1);
        assert_eq!(value["critical_count"], 0);
        assert!(value["migration_sql"].as_str().unwrap().contains("BEGIN;"));
    }

    /// スキーマファイルが存在しない場合のエラー
    #[test]
    fn test_generate_missing_schema_file() {
        let temp_dir = TempDir::new().unwrap();

        let error = GenerateCommandHandler::new()
            .execute(&command(temp_dir.path(), "x"))
            .unwrap_err();

        let io_error = error.downcast_ref::<IoError>().unwrap();
        assert!(io_error.is_file_not_found());
        assert!(error.to_string().contains("old.sql"));
    }

    /// 使用できないマイグレーション名はエラー
    #[test]
    fn test_generate_invalid_name() {
        let temp_dir = setup(OLD_SCHEMA, NEW_SCHEMA);

        let error = GenerateCommandHandler::new()
            .execute(&command(temp_dir.path(), "???"))
            .unwrap_err();

        assert!(error.to_string().contains("Invalid migration name"));
    }

    /// 設定ファイルの migrations_dir とリスクポリシーが使われる
    #[test]
    fn test_generate_uses_config() {
        disable_color();
        let temp_dir = setup(
            "CREATE TABLE ledger (id INT, memo TEXT);",
            "CREATE TABLE ledger (id INT);",
        );
        fs::write(
            temp_dir.path().join(".strand.yaml"),
            "version: \"1.0\"\nmigrations_dir: sql\nrisk_policy:\n  sensitive_tables:\n    - ledger\n",
        )
        .unwrap();

        let output = GenerateCommandHandler::new()
            .execute(&command(temp_dir.path(), "drop memo"))
            .unwrap();

        assert!(output.contains("[CRITICAL] DROP_COLUMN ledger.memo"));
        assert_eq!(sql_files(&temp_dir.path().join("sql")).len(), 2);
    }

    /// diff はファイルを書き出さずにレポートのみ返す
    #[test]
    fn test_diff_reports_only() {
        disable_color();
        let temp_dir = setup(OLD_SCHEMA, NEW_SCHEMA);

        let output = DiffCommandHandler::new()
            .execute(&DiffCommand {
                project_path: temp_dir.path().to_path_buf(),
                config_path: None,
                old_schema: PathBuf::from("old.sql"),
                new_schema: PathBuf::from("new.sql"),
                format: OutputFormat::Text,
            })
            .unwrap();

        assert!(output.contains("ADD_COLUMN patients.email"));
        assert!(output.contains("Risk summary: LOW 1"));
        assert!(!temp_dir.path().join("migrations").exists());
    }

    /// init で書き出した設定は generate で読み込める
    #[test]
    fn test_init_then_generate() {
        disable_color();
        let temp_dir = setup(OLD_SCHEMA, NEW_SCHEMA);

        let path = InitCommandHandler::new()
            .execute(&InitCommand {
                project_path: temp_dir.path().to_path_buf(),
                config_path: None,
                force: false,
            })
            .unwrap();
        assert!(path.exists());

        let output = GenerateCommandHandler::new()
            .execute(&command(temp_dir.path(), "add email"))
            .unwrap();
        assert!(output.contains("Migration files generated:"));
    }
}
