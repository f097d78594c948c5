use std::fs;
use std::path::PathBuf;

use insight_terminal::sportradar::{parse_ensemble_json, parse_match_json, parse_prediction_json};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_match_fixture() {
    let m = parse_match_json(&read_fixture("sportradar_match.json")).expect("fixture should parse");
    let ctx = &m.sport_event.sport_event_context;
    assert_eq!(ctx.competition.name, "Premier League");
    assert_eq!(ctx.stage.kind, "league");
    assert_eq!(ctx.competitors.len(), 2);
    assert_eq!(m.competitor("home").map(|c| c.abbreviation.as_str()), Some("ARS"));
    assert_eq!(m.sport_event_status.home_score, 2);
    assert_eq!(m.first_half_score(), Some((1, 0)));
    assert_eq!(
        m.statistics.teams[0].statistics.get("ball_possession"),
        Some(&58.0)
    );
}

#[test]
fn parses_prediction_fixture() {
    let p = parse_prediction_json(&read_fixture("sportradar_prediction.json"))
        .expect("fixture should parse");
    assert_eq!(p.predicted_winner, "home");
    assert!(p.probability.is_normalized(1e-9));
}

#[test]
fn parses_ensemble_fixture() {
    let e = parse_ensemble_json(&read_fixture("ensemble_breakdown.json"))
        .expect("fixture should parse");
    assert!(e.conflict_detected);
    assert_eq!(e.top_model(), Some(("elo", 0.62)));
    assert_eq!(e.total_votes(), 3.0);
    assert_eq!(e.weights_used.len(), 3);
}

#[test]
fn rejects_truncated_json() {
    assert!(parse_match_json("{\"id\": \"x\"").is_err());
    assert!(parse_prediction_json("{}").is_err());
}
