//! Embedded, idempotent schema. Every statement is `CREATE ... IF NOT
//! EXISTS`, so `ensure_schema` is safe to call on every startup.

use sqlx::PgPool;

const STATEMENTS: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS artifacts (
        id UUID PRIMARY KEY,
        muni_id TEXT NOT NULL,
        content_sha256 TEXT NOT NULL,
        record_count BIGINT NOT NULL,
        bbox_min_lon DOUBLE PRECISION,
        bbox_min_lat DOUBLE PRECISION,
        bbox_max_lon DOUBLE PRECISION,
        bbox_max_lat DOUBLE PRECISION,
        etag TEXT,
        last_modified TIMESTAMPTZ,
        last_edit_date TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        UNIQUE (muni_id, content_sha256)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS heads (
        muni_id TEXT PRIMARY KEY,
        artifact_id UUID NOT NULL REFERENCES artifacts(id),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS events (
        id BIGSERIAL PRIMARY KEY,
        run_id TEXT NOT NULL,
        muni_id TEXT,
        kind TEXT NOT NULL,
        payload JSONB NOT NULL,
        duration_ms BIGINT,
        error TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_events_run_id ON events (run_id)",
    "CREATE INDEX IF NOT EXISTS idx_artifacts_muni_id ON artifacts (muni_id)",
];

pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
