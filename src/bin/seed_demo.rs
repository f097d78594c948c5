use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use serde_json::{Value, json};

use insight_terminal::records::{PatternRecord, PerformanceSnapshot};
use insight_terminal::settings;
use insight_terminal::store;

const TEAMS: [&str; 8] = [
    "Arsenal",
    "Liverpool",
    "Manchester City",
    "Chelsea",
    "Tottenham",
    "Newcastle",
    "Aston Villa",
    "Brighton",
];

const KINDS: [&str; 5] = [
    "streak",
    "scoring_timing",
    "venue_performance",
    "btts_tendency",
    // Exercises the fallback path in the dashboard.
    "set_piece_threat",
];

fn main() -> Result<()> {
    settings::load_env_files();
    settings::init_logging();

    let db_path = settings::parse_db_path_arg()
        .or_else(|| std::env::var("INSIGHT_DB").ok().map(Into::into))
        .or_else(store::default_db_path)
        .context("unable to resolve sqlite path")?;

    let mut rng = rand::thread_rng();
    let now = Utc::now();

    let mut patterns = Vec::new();
    for (i, team) in TEAMS.iter().enumerate() {
        let count = rng.gen_range(2..=5);
        for j in 0..count {
            let kind = *KINDS.choose(&mut rng).unwrap_or(&"streak");
            let seen = now - ChronoDuration::days(rng.gen_range(0..30));
            patterns.push(PatternRecord {
                id: format!("demo-{i}-{j}"),
                team_name: team.to_string(),
                team_id: Some(format!("team-{i}")),
                pattern_type: kind.to_string(),
                pattern_data: demo_payload(kind, &mut rng),
                confidence: if rng.gen_bool(0.1) {
                    None
                } else {
                    Some((rng.gen_range(35.0..98.0_f64) * 10.0).round() / 10.0)
                },
                occurrences: Some(rng.gen_range(1..12)),
                created_at: Some(seen.to_rfc3339_opts(SecondsFormat::Secs, true)),
                last_seen: Some(seen.to_rfc3339_opts(SecondsFormat::Secs, true)),
                created_by: Some("seed_demo".to_string()),
            });
        }
    }

    let mut snapshots = Vec::new();
    let mut accuracy = rng.gen_range(52.0..58.0_f64);
    for week in 0..6 {
        accuracy = (accuracy + rng.gen_range(-1.5..3.0)).clamp(40.0, 90.0);
        let created = now - ChronoDuration::weeks(5 - week);
        let total = 40 + week * 25;
        let correct = ((total as f64) * accuracy / 100.0).round() as i64;
        snapshots.push(PerformanceSnapshot {
            id: format!("demo-perf-{week}"),
            model_name: "ensemble".to_string(),
            model_version: "v1.3".to_string(),
            accuracy: Some(accuracy),
            precision_score: Some((accuracy + rng.gen_range(-4.0..4.0)).clamp(0.0, 100.0)),
            recall_score: Some((accuracy + rng.gen_range(-6.0..2.0)).clamp(0.0, 100.0)),
            f1_score: None,
            total_predictions: Some(total),
            correct_predictions: Some(correct),
            created_at: Some(created.to_rfc3339_opts(SecondsFormat::Secs, true)),
            updated_at: Some(created.to_rfc3339_opts(SecondsFormat::Secs, true)),
            metadata: json!({"source": "seed_demo"}),
        });
    }

    let mut conn = store::open_db(&db_path)?;
    let n_patterns = store::import_patterns(&mut conn, &patterns)?;
    let n_snapshots = store::import_snapshots(&mut conn, &snapshots)?;

    println!("Demo data written");
    println!("DB: {}", db_path.display());
    println!("Patterns: {n_patterns}");
    println!("Performance snapshots: {n_snapshots}");
    Ok(())
}

fn demo_payload(kind: &str, rng: &mut impl Rng) -> Value {
    match kind {
        "streak" => json!({
            "streak_length": rng.gen_range(3..9),
            "streak_type": *["winning", "unbeaten", "scoring", "losing"]
                .choose(rng)
                .unwrap_or(&"winning"),
        }),
        "scoring_timing" => json!({
            "timing": if rng.gen_bool(0.5) { "early_scorer" } else { "late_scorer" },
            "first_half_percentage": rng.gen_range(20..75),
        }),
        "venue_performance" => json!({
            "stronger_venue": if rng.gen_bool(0.7) { "home" } else { "away" },
            "difference": rng.gen_range(5..40),
        }),
        "btts_tendency" => json!({
            "tendency": if rng.gen_bool(0.5) { "high" } else { "low" },
            "btts_percentage": rng.gen_range(20..85),
        }),
        _ => json!({"note": "producer-only kind"}),
    }
}
