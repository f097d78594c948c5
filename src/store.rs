use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{Connection, Row, params};
use serde_json::Value;

use crate::records::{PatternRecord, PerformanceSnapshot, parse_timestamp};
use crate::settings::app_cache_dir;

pub const DB_FILE: &str = "insight.sqlite";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternQuery {
    pub team_name: Option<String>,
    pub limit: usize,
}

impl Default for PatternQuery {
    fn default() -> Self {
        Self {
            team_name: None,
            limit: crate::pattern_view::VIEW_CAP,
        }
    }
}

pub fn default_db_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(DB_FILE))
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS team_patterns (
            id TEXT PRIMARY KEY,
            team_name TEXT NOT NULL,
            team_id TEXT NULL,
            pattern_type TEXT NOT NULL,
            pattern_data TEXT NOT NULL,
            confidence REAL NULL,
            occurrences INTEGER NULL,
            created_at TEXT NULL,
            last_seen TEXT NULL,
            created_by TEXT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_patterns_team ON team_patterns(team_name);
        CREATE INDEX IF NOT EXISTS idx_patterns_confidence ON team_patterns(confidence);

        CREATE TABLE IF NOT EXISTS model_performance (
            id TEXT PRIMARY KEY,
            model_name TEXT NOT NULL,
            model_version TEXT NOT NULL,
            accuracy REAL NULL,
            precision_score REAL NULL,
            recall_score REAL NULL,
            f1_score REAL NULL,
            total_predictions INTEGER NULL,
            correct_predictions INTEGER NULL,
            created_at TEXT NULL,
            updated_at TEXT NULL,
            metadata TEXT NOT NULL,
            created_ts INTEGER NULL,
            updated_ts INTEGER NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    migrate_snapshot_ts(conn)?;
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_performance_created_ts \
         ON model_performance(created_ts, updated_ts);",
    )
    .context("create snapshot time index")?;
    Ok(())
}

// `created_at` / `updated_at` keep the producer's text; ordering uses these
// epoch-millisecond columns since the text mixes offsets and naive forms.
fn epoch_millis(raw: Option<&str>) -> Option<i64> {
    raw.and_then(parse_timestamp).map(|dt| dt.timestamp_millis())
}

fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect {table} columns"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("read {table} columns"))?;
    for name in names {
        if name? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Databases created before the time columns existed get them added and
/// backfilled from the stored text.
fn migrate_snapshot_ts(conn: &Connection) -> Result<()> {
    if has_column(conn, "model_performance", "created_ts")? {
        return Ok(());
    }
    conn.execute_batch(
        r#"
        ALTER TABLE model_performance ADD COLUMN created_ts INTEGER NULL;
        ALTER TABLE model_performance ADD COLUMN updated_ts INTEGER NULL;
        "#,
    )
    .context("add snapshot time columns")?;

    let mut stmt = conn
        .prepare("SELECT rowid, created_at, updated_at FROM model_performance")
        .context("prepare snapshot backfill")?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })
        .context("query snapshot backfill")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("read snapshot backfill rows")?;

    let mut update = conn
        .prepare("UPDATE model_performance SET created_ts = ?2, updated_ts = ?3 WHERE rowid = ?1")
        .context("prepare snapshot backfill update")?;
    for (rowid, created, updated) in &rows {
        update
            .execute(params![
                rowid,
                epoch_millis(created.as_deref()),
                epoch_millis(updated.as_deref())
            ])
            .context("backfill snapshot times")?;
    }
    tracing::info!(rows = rows.len(), "added snapshot time columns");
    Ok(())
}

pub fn upsert_pattern(conn: &Connection, record: &PatternRecord) -> Result<()> {
    let data = serde_json::to_string(&record.pattern_data).context("serialize pattern_data")?;
    conn.execute(
        r#"
        INSERT INTO team_patterns (
            id, team_name, team_id, pattern_type, pattern_data, confidence,
            occurrences, created_at, last_seen, created_by
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ON CONFLICT(id) DO UPDATE SET
            team_name = excluded.team_name,
            team_id = excluded.team_id,
            pattern_type = excluded.pattern_type,
            pattern_data = excluded.pattern_data,
            confidence = excluded.confidence,
            occurrences = excluded.occurrences,
            created_at = excluded.created_at,
            last_seen = excluded.last_seen,
            created_by = excluded.created_by
        "#,
        params![
            record.id,
            record.team_name,
            record.team_id,
            record.pattern_type,
            data,
            record.confidence,
            record.occurrences,
            record.created_at,
            record.last_seen,
            record.created_by,
        ],
    )
    .with_context(|| format!("upsert pattern {}", record.id))?;
    Ok(())
}

pub fn upsert_snapshot(conn: &Connection, snap: &PerformanceSnapshot) -> Result<()> {
    let metadata = serde_json::to_string(&snap.metadata).context("serialize metadata")?;
    conn.execute(
        r#"
        INSERT INTO model_performance (
            id, model_name, model_version, accuracy, precision_score, recall_score,
            f1_score, total_predictions, correct_predictions, created_at, updated_at, metadata,
            created_ts, updated_ts
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
        ON CONFLICT(id) DO UPDATE SET
            model_name = excluded.model_name,
            model_version = excluded.model_version,
            accuracy = excluded.accuracy,
            precision_score = excluded.precision_score,
            recall_score = excluded.recall_score,
            f1_score = excluded.f1_score,
            total_predictions = excluded.total_predictions,
            correct_predictions = excluded.correct_predictions,
            created_at = excluded.created_at,
            updated_at = excluded.updated_at,
            metadata = excluded.metadata,
            created_ts = excluded.created_ts,
            updated_ts = excluded.updated_ts
        "#,
        params![
            snap.id,
            snap.model_name,
            snap.model_version,
            snap.accuracy,
            snap.precision_score,
            snap.recall_score,
            snap.f1_score,
            snap.total_predictions,
            snap.correct_predictions,
            snap.created_at,
            snap.updated_at,
            metadata,
            epoch_millis(snap.created_at.as_deref()),
            epoch_millis(snap.updated_at.as_deref()),
        ],
    )
    .with_context(|| format!("upsert snapshot {}", snap.id))?;
    Ok(())
}

/// Insert many rows in one transaction. Returns how many were written.
pub fn import_patterns(conn: &mut Connection, records: &[PatternRecord]) -> Result<usize> {
    let tx = conn.transaction().context("begin pattern import")?;
    for record in records {
        upsert_pattern(&tx, record)?;
    }
    tx.commit().context("commit pattern import")?;
    Ok(records.len())
}

pub fn import_snapshots(conn: &mut Connection, snaps: &[PerformanceSnapshot]) -> Result<usize> {
    let tx = conn.transaction().context("begin snapshot import")?;
    for snap in snaps {
        upsert_snapshot(&tx, snap)?;
    }
    tx.commit().context("commit snapshot import")?;
    Ok(snaps.len())
}

// Stored payloads are untrusted: unparseable JSON text reads back as null.
fn json_column(raw: Option<String>) -> Value {
    raw.and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or(Value::Null)
}

fn pattern_from_row(row: &Row<'_>) -> rusqlite::Result<PatternRecord> {
    Ok(PatternRecord {
        id: row.get(0)?,
        team_name: row.get(1)?,
        team_id: row.get(2)?,
        pattern_type: row.get(3)?,
        pattern_data: json_column(row.get(4)?),
        confidence: row.get(5)?,
        occurrences: row.get(6)?,
        created_at: row.get(7)?,
        last_seen: row.get(8)?,
        created_by: row.get(9)?,
    })
}

fn snapshot_from_row(row: &Row<'_>) -> rusqlite::Result<PerformanceSnapshot> {
    Ok(PerformanceSnapshot {
        id: row.get(0)?,
        model_name: row.get(1)?,
        model_version: row.get(2)?,
        accuracy: row.get(3)?,
        precision_score: row.get(4)?,
        recall_score: row.get(5)?,
        f1_score: row.get(6)?,
        total_predictions: row.get(7)?,
        correct_predictions: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
        metadata: json_column(row.get(11)?),
    })
}

/// Pattern rows ordered by confidence descending (nulls last, then insertion order).
pub fn load_patterns(conn: &Connection, query: &PatternQuery) -> Result<Vec<PatternRecord>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT id, team_name, team_id, pattern_type, pattern_data, confidence,
                   occurrences, created_at, last_seen, created_by
            FROM team_patterns
            WHERE (?1 IS NULL OR team_name = ?1)
            ORDER BY confidence IS NULL, confidence DESC, rowid ASC
            LIMIT ?2
            "#,
        )
        .context("prepare pattern query")?;
    let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
    let rows = stmt
        .query_map(params![query.team_name, limit], pattern_from_row)
        .context("query team_patterns")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("read team_patterns row")?);
    }
    Ok(out)
}

/// Snapshots newest first by parsed `created_at` (then `updated_at`);
/// rows whose timestamps do not parse come last.
pub fn load_snapshots(conn: &Connection, limit: usize) -> Result<Vec<PerformanceSnapshot>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT id, model_name, model_version, accuracy, precision_score, recall_score,
                   f1_score, total_predictions, correct_predictions, created_at, updated_at,
                   metadata
            FROM model_performance
            ORDER BY created_ts IS NULL, created_ts DESC,
                     updated_ts IS NULL, updated_ts DESC, rowid ASC
            LIMIT ?1
            "#,
        )
        .context("prepare snapshot query")?;
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = stmt
        .query_map(params![limit], snapshot_from_row)
        .context("query model_performance")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("read model_performance row")?);
    }
    Ok(out)
}

pub fn count_patterns(conn: &Connection) -> Result<usize> {
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM team_patterns", [], |row| row.get(0))
        .context("count team_patterns")?;
    Ok(n.max(0) as usize)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn rec(id: &str, team: &str, confidence: Option<f64>) -> PatternRecord {
        PatternRecord {
            id: id.to_string(),
            team_name: team.to_string(),
            team_id: None,
            pattern_type: "btts_tendency".to_string(),
            pattern_data: json!({"tendency": "high", "btts_percentage": 71}),
            confidence,
            occurrences: Some(4),
            created_at: Some("2025-02-01T10:00:00Z".to_string()),
            last_seen: None,
            created_by: None,
        }
    }

    #[test]
    fn upsert_replaces_existing_row() {
        let conn = open_in_memory().unwrap();
        upsert_pattern(&conn, &rec("a", "Arsenal", Some(40.0))).unwrap();
        upsert_pattern(&conn, &rec("a", "Arsenal", Some(90.0))).unwrap();
        assert_eq!(count_patterns(&conn).unwrap(), 1);
        let rows = load_patterns(&conn, &PatternQuery::default()).unwrap();
        assert_eq!(rows[0].confidence, Some(90.0));
        assert_eq!(rows[0].pattern_data["btts_percentage"], json!(71));
    }

    #[test]
    fn old_snapshot_table_gets_time_columns() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE model_performance (
                id TEXT PRIMARY KEY,
                model_name TEXT NOT NULL,
                model_version TEXT NOT NULL,
                accuracy REAL NULL,
                precision_score REAL NULL,
                recall_score REAL NULL,
                f1_score REAL NULL,
                total_predictions INTEGER NULL,
                correct_predictions INTEGER NULL,
                created_at TEXT NULL,
                updated_at TEXT NULL,
                metadata TEXT NOT NULL
            );
            INSERT INTO model_performance (id, model_name, model_version, created_at, metadata)
            VALUES ('shifted', 'ensemble', 'v1', '2025-03-02T01:00:00+05:00', '{}'),
                   ('utc', 'ensemble', 'v1', '2025-03-01T23:00:00Z', '{}');
            "#,
        )
        .unwrap();
        init_schema(&conn).unwrap();
        assert!(has_column(&conn, "model_performance", "created_ts").unwrap());

        let snaps = load_snapshots(&conn, 1).unwrap();
        assert_eq!(snaps[0].id, "utc");
        // Second run is a no-op.
        init_schema(&conn).unwrap();
    }

    #[test]
    fn corrupt_payload_reads_back_as_null() {
        let conn = open_in_memory().unwrap();
        upsert_pattern(&conn, &rec("a", "Arsenal", None)).unwrap();
        conn.execute("UPDATE team_patterns SET pattern_data = '{oops'", [])
            .unwrap();
        let rows = load_patterns(&conn, &PatternQuery::default()).unwrap();
        assert_eq!(rows[0].pattern_data, Value::Null);
    }
}
