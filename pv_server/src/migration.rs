//! Relational schema for the PostgreSQL store.

use diesel_async::AsyncPgConnection;
use diesel_async::SimpleAsyncConnection;

/// Idempotent DDL for both tables and the initial counter row.
///
/// Tables left by earlier deployments (INTEGER ids and counter, nullable
/// columns, French status labels, no uniqueness constraint) are brought to
/// the current shape in place.
pub const MIGRATION_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS pvs (
    id      BIGINT PRIMARY KEY,
    date    VARCHAR(64) NOT NULL,
    caidat  VARCHAR(255) NOT NULL,
    status  VARCHAR(32) NOT NULL DEFAULT 'not_processed',
    CONSTRAINT pvs_date_caidat_key UNIQUE (date, caidat)
);

CREATE TABLE IF NOT EXISTS counter (
    id      INTEGER PRIMARY KEY DEFAULT 1,
    value   BIGINT NOT NULL DEFAULT 0
);

ALTER TABLE pvs ALTER COLUMN id TYPE BIGINT;
ALTER TABLE pvs ALTER COLUMN status DROP DEFAULT;
ALTER TABLE pvs ALTER COLUMN status TYPE VARCHAR(32) USING status::text;
UPDATE pvs SET status = 'processed' WHERE status = 'traité';
UPDATE pvs SET status = 'in_progress' WHERE status = 'en cours';
UPDATE pvs SET status = 'not_processed' WHERE status IS NULL OR status = 'non traité';
ALTER TABLE pvs ALTER COLUMN status SET DEFAULT 'not_processed';
ALTER TABLE pvs ALTER COLUMN status SET NOT NULL;
ALTER TABLE pvs ALTER COLUMN date SET NOT NULL;
ALTER TABLE pvs ALTER COLUMN caidat SET NOT NULL;

DO $$
BEGIN
    IF NOT EXISTS (
        SELECT 1 FROM pg_constraint
        WHERE conname = 'pvs_date_caidat_key' AND conrelid = 'pvs'::regclass
    ) THEN
        ALTER TABLE pvs ADD CONSTRAINT pvs_date_caidat_key UNIQUE (date, caidat);
    END IF;
END
$$;

CREATE INDEX IF NOT EXISTS idx_pvs_status ON pvs (status);

ALTER TABLE counter ALTER COLUMN value TYPE BIGINT;
UPDATE counter SET value = 0 WHERE value IS NULL;
ALTER TABLE counter ALTER COLUMN value SET DEFAULT 0;
ALTER TABLE counter ALTER COLUMN value SET NOT NULL;

INSERT INTO counter (id, value) VALUES (1, 0) ON CONFLICT (id) DO NOTHING;
"#;

/// Run the PV schema migration.
pub async fn run_migration(conn: &mut AsyncPgConnection) -> anyhow::Result<()> {
    conn.batch_execute(MIGRATION_SQL)
        .await
        .map_err(|e| anyhow::anyhow!("PV migration failed: {e}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_is_rerunnable() {
        let creates = MIGRATION_SQL
            .lines()
            .filter(|l| l.trim_start().starts_with("CREATE"))
            .collect::<Vec<_>>();
        assert_eq!(creates.len(), 3);
        assert!(creates.iter().all(|l| l.contains("IF NOT EXISTS")));
        assert!(MIGRATION_SQL.contains("ON CONFLICT (id) DO NOTHING"));
        assert!(MIGRATION_SQL.contains("FROM pg_constraint"));
    }

    #[test]
    fn legacy_tables_are_widened_and_normalized() {
        for stmt in [
            "ALTER TABLE pvs ALTER COLUMN id TYPE BIGINT;",
            "ALTER TABLE counter ALTER COLUMN value TYPE BIGINT;",
            "ADD CONSTRAINT pvs_date_caidat_key UNIQUE (date, caidat);",
        ] {
            assert!(MIGRATION_SQL.contains(stmt), "missing {stmt}");
        }
        for label in ["traité", "en cours", "non traité"] {
            assert!(MIGRATION_SQL.contains(&format!("status = '{label}'")));
        }

        // Labels are rewritten before the status index is built.
        let normalize = MIGRATION_SQL.find("WHERE status = 'traité'").unwrap();
        let index = MIGRATION_SQL.find("CREATE INDEX").unwrap();
        assert!(normalize < index);
    }
}
