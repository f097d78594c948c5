use anyhow::{Context, Result};

use insight_terminal::pattern_view::build_team_views;
use insight_terminal::performance::{MetricCards, build_history};
use insight_terminal::settings::{self, Settings};
use insight_terminal::store::{self, PatternQuery};

fn main() -> Result<()> {
    let mut settings = Settings::load()?;
    settings::init_logging();
    if let Some(path) = settings::parse_db_path_arg() {
        settings.db_path = path;
    }

    let conn = store::open_db(&settings.db_path)?;
    let query = PatternQuery {
        team_name: settings.team_filter.clone(),
        limit: usize::MAX,
    };
    let records = store::load_patterns(&conn, &query).context("load team patterns")?;
    let views = build_team_views(&records);

    if views.is_empty() {
        println!("No patterns detected yet.");
    }
    for (team, view) in &views {
        println!("{team}");
        for summary in view {
            println!(
                "  {} {:<18} {:>16}  {}",
                summary.icon.glyph(),
                summary.title,
                summary.confidence_label(),
                summary.description
            );
        }
    }

    let snapshots = store::load_snapshots(&conn, settings.history_limit)?;
    let history = build_history(&snapshots);
    println!();
    match history.latest.as_ref() {
        Some(latest) => {
            let cards = MetricCards::from_snapshot(latest);
            for card in &cards.cards {
                println!("{:<18} {}", card.label, card.value);
            }
            if history.chartable() {
                for point in &history.trend {
                    println!(
                        "  {:<10} acc {:>5.1}  prec {:>5.1}",
                        point.period, point.accuracy, point.precision
                    );
                }
            }
            println!("{}", cards.footer());
        }
        None => println!("No performance data available yet."),
    }
    Ok(())
}
