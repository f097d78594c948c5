use std::cmp::Ordering;
use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::pattern_decode::{PatternSummary, clamp_confidence, decode};
use crate::records::PatternRecord;

/// Presentation cap on a pattern view, not a storage limit.
pub const VIEW_CAP: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PatternFilter {
    pub team_name: Option<String>,
}

impl PatternFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn team(name: impl Into<String>) -> Self {
        Self {
            team_name: Some(name.into()),
        }
    }

    pub fn matches(&self, record: &PatternRecord) -> bool {
        match self.team_name.as_deref() {
            Some(team) => record.team_name == team,
            None => true,
        }
    }

    pub fn heading(&self) -> String {
        match self.team_name.as_deref() {
            Some(team) => format!("Patterns for {team}"),
            None => "Recent patterns across all teams".to_string(),
        }
    }
}

// Nulls sort last; the caller's sort is stable, so equal keys keep retrieval order.
fn by_confidence_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Filter, order and cap raw rows, keeping them undecoded.
pub fn select_records<'a>(
    records: &'a [PatternRecord],
    filter: &PatternFilter,
) -> Vec<&'a PatternRecord> {
    let mut kept: Vec<&PatternRecord> = records.iter().filter(|r| filter.matches(r)).collect();
    kept.sort_by(|a, b| {
        by_confidence_desc(clamp_confidence(a.confidence), clamp_confidence(b.confidence))
    });
    kept.truncate(VIEW_CAP);
    kept
}

/// Build the display view for a set of fetched pattern rows.
pub fn build_view(records: &[PatternRecord], filter: &PatternFilter) -> Vec<PatternSummary> {
    select_records(records, filter)
        .into_iter()
        .map(decode)
        .collect()
}

/// One view per distinct team, ordered by team name.
pub fn build_team_views(records: &[PatternRecord]) -> Vec<(String, Vec<PatternSummary>)> {
    let mut by_team: BTreeMap<&str, Vec<PatternRecord>> = BTreeMap::new();
    for record in records {
        by_team
            .entry(record.team_name.as_str())
            .or_default()
            .push(record.clone());
    }

    let groups: Vec<(&str, Vec<PatternRecord>)> = by_team.into_iter().collect();
    groups
        .par_iter()
        .map(|(team, rows)| {
            let view = build_view(rows, &PatternFilter::all());
            (team.to_string(), view)
        })
        .collect()
}
