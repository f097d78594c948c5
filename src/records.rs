use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One row of the `team_patterns` collection, as delivered by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRecord {
    pub id: String,
    pub team_name: String,
    // Lookup key into an external team directory, not an owned relation.
    #[serde(default)]
    pub team_id: Option<String>,
    pub pattern_type: String,
    #[serde(default)]
    pub pattern_data: Value,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub confidence: Option<f64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub occurrences: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub last_seen: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

/// One row of the `model_performance` collection. Produced by an external
/// evaluation job; this crate only reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    pub id: String,
    pub model_name: String,
    pub model_version: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub accuracy: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub precision_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub recall_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub f1_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub total_predictions: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub correct_predictions: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub metadata: Value,
}

impl PerformanceSnapshot {
    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(parse_timestamp)
    }

    pub fn updated(&self) -> Option<DateTime<Utc>> {
        self.updated_at.as_deref().and_then(parse_timestamp)
    }
}

// Exports coming out of spreadsheets and older jobs carry `3.0` for counts and
// `"72.5"` for scores. Anything that is not a finite number reads as absent.
fn loose_number(value: Option<Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn lenient_f64<'de, D: Deserializer<'de>>(de: D) -> Result<Option<f64>, D::Error> {
    Ok(loose_number(Option::<Value>::deserialize(de)?))
}

// Counts with a fractional part are rejected rather than truncated.
fn lenient_i64<'de, D: Deserializer<'de>>(de: D) -> Result<Option<i64>, D::Error> {
    Ok(loose_number(Option::<Value>::deserialize(de)?)
        .filter(|n| n.fract() == 0.0 && n.abs() < 9.0e15)
        .map(|n| n as i64))
}

/// Decode rows one at a time, dropping (and logging) the ones that do not fit
/// `T` so a single bad row does not sink a whole batch.
pub fn decode_rows<T: DeserializeOwned>(table: &str, rows: Vec<Value>) -> (Vec<T>, usize) {
    let mut out = Vec::with_capacity(rows.len());
    let mut skipped = 0;
    for (idx, row) in rows.into_iter().enumerate() {
        match serde_json::from_value::<T>(row) {
            Ok(parsed) => out.push(parsed),
            Err(err) => {
                skipped += 1;
                tracing::warn!(table, row = idx, %err, "skipping malformed row");
            }
        }
    }
    (out, skipped)
}

/// Parse the timestamp shapes the backend emits: RFC 3339 with offset, or a
/// naive `YYYY-MM-DD[ T]HH:MM:SS[.f]` which is taken as UTC. A bare date is
/// accepted as midnight UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Date label used on cards and chart axes.
pub fn date_label(raw: Option<&str>) -> Option<String> {
    raw.and_then(parse_timestamp)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
}

/// Date + time label used for "last updated" lines.
pub fn datetime_label(raw: Option<&str>) -> Option<String> {
    raw.and_then(parse_timestamp)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{PatternRecord, PerformanceSnapshot, date_label, decode_rows, parse_timestamp};

    #[test]
    fn parses_offsets_and_naive_forms() {
        let a = parse_timestamp("2025-03-01T12:00:00+02:00").expect("rfc3339");
        let b = parse_timestamp("2025-03-01 10:00:00").expect("naive");
        assert_eq!(a, b);
        assert!(parse_timestamp("2025-03-01").is_some());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("  ").is_none());
    }

    #[test]
    fn date_label_uses_utc_date() {
        assert_eq!(
            date_label(Some("2025-03-01T23:30:00-02:00")).as_deref(),
            Some("2025-03-02")
        );
        assert_eq!(date_label(None), None);
    }

    #[test]
    fn numeric_columns_accept_loose_shapes() {
        let row: PatternRecord = serde_json::from_value(json!({
            "id": "p1",
            "team_name": "Arsenal",
            "pattern_type": "streak",
            "confidence": "72.5",
            "occurrences": 3.0
        }))
        .expect("row should parse");
        assert_eq!(row.confidence, Some(72.5));
        assert_eq!(row.occurrences, Some(3));

        let row: PatternRecord = serde_json::from_value(json!({
            "id": "p2",
            "team_name": "Arsenal",
            "pattern_type": "streak",
            "confidence": "high",
            "occurrences": 2.5
        }))
        .expect("row should parse");
        assert_eq!(row.confidence, None);
        assert_eq!(row.occurrences, None);
    }

    #[test]
    fn snapshot_counts_accept_floats() {
        let snap: PerformanceSnapshot = serde_json::from_value(json!({
            "id": "s1",
            "model_name": "ensemble",
            "model_version": "v1",
            "accuracy": "61.5",
            "total_predictions": 200.0,
            "correct_predictions": null
        }))
        .expect("snapshot should parse");
        assert_eq!(snap.accuracy, Some(61.5));
        assert_eq!(snap.total_predictions, Some(200));
        assert_eq!(snap.correct_predictions, None);
    }

    #[test]
    fn decode_rows_skips_only_the_bad_ones() {
        let rows = vec![
            json!({"id": "a", "team_name": "Arsenal", "pattern_type": "streak"}),
            json!({"id": "b", "pattern_type": "streak"}),
            json!("not a row"),
            json!({"id": "c", "team_name": "Chelsea", "pattern_type": "btts_tendency", "occurrences": 3.0}),
        ];
        let (parsed, skipped) = decode_rows::<PatternRecord>("team_patterns", rows);
        let ids: Vec<&str> = parsed.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(skipped, 2);
    }
}
