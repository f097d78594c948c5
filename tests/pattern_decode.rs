use serde_json::{Value, json};

use insight_terminal::pattern_decode::{ColorRole, ConfidenceBucket, decode};
use insight_terminal::pattern_registry::{IconHint, PatternKind};
use insight_terminal::records::PatternRecord;

fn record(kind: &str, data: Value, confidence: Option<f64>) -> PatternRecord {
    PatternRecord {
        id: "row-1".to_string(),
        team_name: "Arsenal".to_string(),
        team_id: Some("t-42".to_string()),
        pattern_type: kind.to_string(),
        pattern_data: data,
        confidence,
        occurrences: Some(3),
        created_at: None,
        last_seen: Some("2025-03-04T18:30:00Z".to_string()),
        created_by: None,
    }
}

#[test]
fn winning_streak_is_high_confidence() {
    let s = decode(&record(
        "streak",
        json!({"streak_length": 5, "streak_type": "winning"}),
        Some(85.0),
    ));
    assert_eq!(s.title, "Streak");
    assert_eq!(s.description, "5 winning streak");
    assert_eq!(s.bucket, ConfidenceBucket::High);
    assert_eq!(s.bucket.color(), ColorRole::Positive);
    assert_eq!(s.icon, IconHint::TrendingUp);
    assert_eq!(s.kind, PatternKind::Streak);
    assert_eq!(s.last_seen.as_deref(), Some("2025-03-04"));
}

#[test]
fn late_scorer_reads_as_late_bloomer() {
    let s = decode(&record(
        "scoring_timing",
        json!({"timing": "late_scorer", "first_half_percentage": 30}),
        Some(45.0),
    ));
    assert_eq!(s.title, "Scoring Timing");
    assert_eq!(s.description, "Late bloomer (30% first half)");
    assert_eq!(s.bucket, ConfidenceBucket::Low);
    assert_eq!(s.icon, IconHint::Clock);
}

#[test]
fn early_scorer_keeps_fractional_percentage() {
    let s = decode(&record(
        "scoring_timing",
        json!({"timing": "early_scorer", "first_half_percentage": 62.5}),
        Some(60.0),
    ));
    assert_eq!(s.description, "Early scorer (62.5% first half)");
    assert_eq!(s.bucket, ConfidenceBucket::Medium);
}

#[test]
fn unknown_kind_degrades() {
    let s = decode(&record("mystery_kind", json!({}), None));
    assert_eq!(s.title, "Mystery Kind");
    assert_eq!(s.description, "Unknown pattern");
    assert_eq!(s.bucket, ConfidenceBucket::Unknown);
    assert_eq!(s.bucket.color(), ColorRole::Neutral);
    assert_eq!(s.icon, IconHint::None);
    assert_eq!(s.kind, PatternKind::Unrecognized("mystery_kind".to_string()));
}

#[test]
fn venue_and_btts_descriptions() {
    let venue = decode(&record(
        "venue_performance",
        json!({"stronger_venue": "home", "difference": 18}),
        Some(70.0),
    ));
    assert_eq!(venue.description, "Stronger home (18% difference)");
    assert_eq!(venue.icon, IconHint::Target);

    let btts = decode(&record(
        "btts_tendency",
        json!({"tendency": "high", "btts_percentage": 71}),
        Some(70.0),
    ));
    assert_eq!(btts.description, "High BTTS (71%)");
    assert_eq!(btts.title, "Btts Tendency");

    let btts_low = decode(&record(
        "btts_tendency",
        json!({"tendency": "medium", "btts_percentage": 40}),
        None,
    ));
    assert_eq!(btts_low.description, "Low BTTS (40%)");
}

#[test]
fn empty_payloads_use_documented_defaults() {
    let cases = [
        ("streak", "0 unknown streak"),
        ("scoring_timing", "Late bloomer (0% first half)"),
        ("venue_performance", "Stronger venue (0% difference)"),
        ("btts_tendency", "Low BTTS (0%)"),
    ];
    for (kind, expected) in cases {
        assert_eq!(decode(&record(kind, json!({}), Some(50.0))).description, expected);
        assert_eq!(decode(&record(kind, Value::Null, Some(50.0))).description, expected);
    }
}

#[test]
fn wrong_typed_fields_fall_back() {
    let s = decode(&record(
        "streak",
        json!({"streak_length": "five", "streak_type": 7}),
        Some(50.0),
    ));
    assert_eq!(s.description, "0 unknown streak");

    let s = decode(&record(
        "venue_performance",
        json!({"stronger_venue": ["home"], "difference": {"pct": 3}}),
        Some(50.0),
    ));
    assert_eq!(s.description, "Stronger venue (0% difference)");

    let s = decode(&record("btts_tendency", json!([1, 2, 3]), Some(50.0)));
    assert_eq!(s.description, "Low BTTS (0%)");

    let s = decode(&record("scoring_timing", json!("early_scorer"), Some(50.0)));
    assert_eq!(s.description, "Late bloomer (0% first half)");
}
