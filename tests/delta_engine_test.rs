/// デルタ検出のテスト
///
/// 構造モデル間の差分検出が対称性・非対称性・リスク単調性を満たすことを確認します。
#[cfg(test)]
mod delta_engine_tests {
    use strand::core::schema_change::{ChangeType, RiskLevel, SchemaChange};
    use strand::services::delta_engine::DeltaEngine;
    use strand::services::schema_extractor::SchemaExtractor;

    const BASE: &str = r#"
CREATE TABLE patients (id SERIAL PRIMARY KEY, name TEXT NOT NULL);
CREATE TABLE visits (id SERIAL PRIMARY KEY, patient_id INT NOT NULL, notes TEXT);
CREATE FUNCTION touch() RETURNS trigger AS $$ BEGIN RETURN NEW; END; $$ LANGUAGE plpgsql;
"#;

    fn diff(old: &str, new: &str) -> Vec<SchemaChange> {
        let extractor = SchemaExtractor::new();
        DeltaEngine::default().diff(&extractor.extract(old), &extractor.extract(new))
    }

    fn summary(changes: &[SchemaChange]) -> Vec<(ChangeType, String, Option<String>)> {
        changes
            .iter()
            .map(|c| {
                (
                    c.change_type,
                    c.table_name.clone(),
                    c.details.object_name().map(str::to_string),
                )
            })
            .collect()
    }

    /// 同一スキーマの差分は空
    #[test]
    fn test_symmetry() {
        assert!(diff(BASE, BASE).is_empty());
        assert!(diff("", "").is_empty());
    }

    /// テーブル1つの追加は ADD_TABLE 1件で、ロールバックは DROP TABLE IF EXISTS
    #[test]
    fn test_additive_round_trip() {
        let new = format!("{}\nCREATE TABLE invoices (id INT, total NUMERIC(10,2));", BASE);

        let changes = diff(BASE, &new);

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_type, ChangeType::AddTable);
        assert_eq!(changes[0].table_name, "invoices");
        assert_eq!(changes[0].rollback_sql(), "DROP TABLE IF EXISTS invoices;");
    }

    /// diff(a, b) と diff(b, a) は ADD と DROP が入れ替わる
    #[test]
    fn test_drop_detection_asymmetry() {
        let a = "CREATE TABLE t1 (id INT, a TEXT);\nCREATE TABLE t2 (id INT);";
        let b = "CREATE TABLE t1 (id INT, b TEXT);\nCREATE TABLE t3 (id INT);";

        let forward = summary(&diff(a, b));
        let backward = summary(&diff(b, a));

        let swap = |change_type: ChangeType| match change_type {
            ChangeType::AddTable => ChangeType::DropTable,
            ChangeType::DropTable => ChangeType::AddTable,
            ChangeType::AddColumn => ChangeType::DropColumn,
            ChangeType::DropColumn => ChangeType::AddColumn,
            other => other,
        };

        let mut swapped: Vec<_> = forward
            .into_iter()
            .map(|(change_type, table, object)| (swap(change_type), table, object))
            .collect();
        let mut backward = backward;
        swapped.sort();
        backward.sort();

        assert_eq!(swapped, backward);
        assert_eq!(swapped.len(), 4);
    }

    /// 破壊的変更のリスクは LOW にならず、機密テーブルでは CRITICAL になる
    #[test]
    fn test_risk_monotonicity() {
        let changes = diff(BASE, "");
        let drops: Vec<(&str, RiskLevel)> = changes
            .iter()
            .filter(|c| c.change_type == ChangeType::DropTable)
            .map(|c| (c.table_name.as_str(), c.risk_level))
            .collect();
        assert_eq!(
            drops,
            vec![("patients", RiskLevel::Critical), ("visits", RiskLevel::High)]
        );

        for change in diff("", BASE)
            .iter()
            .filter(|c| c.change_type == ChangeType::AddTable)
        {
            assert_eq!(change.risk_level, RiskLevel::Medium);
        }

        for change in changes.iter().filter(|c| c.change_type.is_destructive()) {
            assert_ne!(change.risk_level, RiskLevel::Low);
        }
    }

    /// カラム型・NULL制約・デフォルトの変更は MODIFY_COLUMN
    #[test]
    fn test_modify_column_rollback_restores_old_type() {
        let old = "CREATE TABLE visits (id INT, notes VARCHAR(100));";
        let new = "CREATE TABLE visits (id INT, notes TEXT NOT NULL);";

        let changes = diff(old, new);

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_type, ChangeType::ModifyColumn);
        assert_eq!(changes[0].risk_level, RiskLevel::Medium);
        assert_eq!(
            changes[0].rollback_sql(),
            "ALTER TABLE visits ALTER COLUMN notes TYPE VARCHAR(100);"
        );
    }

    /// 削除・変更された関数は検出しない
    #[test]
    fn test_function_changes() {
        assert!(diff(BASE, "CREATE TABLE patients (id SERIAL PRIMARY KEY, name TEXT NOT NULL);\nCREATE TABLE visits (id SERIAL PRIMARY KEY, patient_id INT NOT NULL, notes TEXT);")
            .is_empty());

        let added = diff("", "CREATE FUNCTION f(x int) RETURNS int AS 'select x' LANGUAGE sql;");
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].change_type, ChangeType::AddFunction);
        assert!(added[0].is_global());
        assert_eq!(added[0].rollback_sql(), "DROP FUNCTION IF EXISTS f;");
    }
}
