use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value;

use insight_terminal::records::{PatternRecord, PerformanceSnapshot, decode_rows};
use insight_terminal::settings;
use insight_terminal::store;

/// Export shape: `{"team_patterns": [...], "model_performance": [...]}`,
/// rows exactly as the hosted tables return them. Rows are decoded one by one.
#[derive(Debug, Deserialize)]
struct ImportFile {
    #[serde(default)]
    team_patterns: Vec<Value>,
    #[serde(default)]
    model_performance: Vec<Value>,
}

fn main() -> Result<()> {
    settings::load_env_files();
    settings::init_logging();

    let input = parse_input_arg().ok_or_else(|| {
        anyhow!("usage: pattern_import <rows.json> [--db <path>]")
    })?;
    let db_path = settings::parse_db_path_arg()
        .or_else(|| std::env::var("INSIGHT_DB").ok().map(Into::into))
        .or_else(store::default_db_path)
        .context("unable to resolve sqlite path")?;

    let raw = fs::read_to_string(&input)
        .with_context(|| format!("read import file {}", input.display()))?;
    let file: ImportFile = serde_json::from_str(&raw).context("invalid import json")?;

    let (pattern_rows, bad_patterns) =
        decode_rows::<PatternRecord>("team_patterns", file.team_patterns);
    let (snapshot_rows, bad_snapshots) =
        decode_rows::<PerformanceSnapshot>("model_performance", file.model_performance);

    let mut conn = store::open_db(&db_path)?;
    let patterns = store::import_patterns(&mut conn, &pattern_rows)?;
    let snapshots = store::import_snapshots(&mut conn, &snapshot_rows)?;
    tracing::info!(patterns, snapshots, bad_patterns, bad_snapshots, "import finished");

    println!("Import complete");
    println!("DB: {}", db_path.display());
    println!("Patterns upserted: {patterns}");
    println!("Snapshots upserted: {snapshots}");
    if bad_patterns + bad_snapshots > 0 {
        println!("Rows skipped: {}", bad_patterns + bad_snapshots);
    }
    println!("Patterns stored: {}", store::count_patterns(&conn)?);
    Ok(())
}

fn parse_input_arg() -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut skip_next = false;
    for arg in &args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == "--db" {
            skip_next = true;
            continue;
        }
        if arg.starts_with("--") {
            continue;
        }
        return Some(PathBuf::from(arg));
    }
    None
}
