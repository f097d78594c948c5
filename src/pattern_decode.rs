use crate::pattern_registry::{self, IconHint, PatternKind};
use crate::payload::{DecodedPayload, to_fixed};
use crate::records::{PatternRecord, date_label};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfidenceBucket {
    Unknown,
    Low,
    Medium,
    High,
}

/// Semantic colour for a bucket; the presentation layer maps it to a palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRole {
    Neutral,
    Info,
    Caution,
    Positive,
}

impl ConfidenceBucket {
    pub fn color(self) -> ColorRole {
        match self {
            ConfidenceBucket::Unknown => ColorRole::Neutral,
            ConfidenceBucket::Low => ColorRole::Info,
            ConfidenceBucket::Medium => ColorRole::Caution,
            ConfidenceBucket::High => ColorRole::Positive,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConfidenceBucket::Unknown => "unknown",
            ConfidenceBucket::Low => "low",
            ConfidenceBucket::Medium => "medium",
            ConfidenceBucket::High => "high",
        }
    }
}

pub const HIGH_CONFIDENCE: f64 = 80.0;
pub const MEDIUM_CONFIDENCE: f64 = 60.0;

/// Clamp a stored confidence into [0, 100]. NaN is treated as absent.
pub fn clamp_confidence(raw: Option<f64>) -> Option<f64> {
    raw.filter(|c| !c.is_nan()).map(|c| c.clamp(0.0, 100.0))
}

pub fn bucket(confidence: Option<f64>) -> ConfidenceBucket {
    let Some(c) = clamp_confidence(confidence) else {
        return ConfidenceBucket::Unknown;
    };
    if c >= HIGH_CONFIDENCE {
        ConfidenceBucket::High
    } else if c >= MEDIUM_CONFIDENCE {
        ConfidenceBucket::Medium
    } else {
        ConfidenceBucket::Low
    }
}

/// `scoring_timing` -> `Scoring Timing`. Only the first character of each
/// `_`-separated segment changes, so already-titled input is left alone.
pub fn title_case(kind: &str) -> String {
    kind.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatternSummary {
    pub record_id: String,
    pub team_name: String,
    pub kind: PatternKind,
    pub title: String,
    pub description: String,
    pub icon: IconHint,
    pub bucket: ConfidenceBucket,
    // Clamped copy of the stored confidence.
    pub confidence: Option<f64>,
    pub occurrences: Option<u64>,
    pub last_seen: Option<String>,
}

impl PatternSummary {
    pub fn confidence_label(&self) -> String {
        format!("{}% confidence", to_fixed(self.confidence.unwrap_or(0.0), 0))
    }
}

/// Turn a stored row into its display summary. Total: payload problems fall
/// back to the documented defaults, unknown kinds to the fallback entry.
pub fn decode(record: &PatternRecord) -> PatternSummary {
    let entry = pattern_registry::lookup(&record.pattern_type);
    let payload = entry.parse_payload(&record.pattern_data);
    log_payload_issues(record, &payload);

    PatternSummary {
        record_id: record.id.clone(),
        team_name: record.team_name.clone(),
        kind: PatternKind::parse(&record.pattern_type),
        title: title_case(&record.pattern_type),
        description: payload.describe(),
        icon: entry.icon,
        bucket: bucket(record.confidence),
        confidence: clamp_confidence(record.confidence),
        occurrences: record.occurrences.map(|n| n.max(0) as u64),
        last_seen: date_label(record.last_seen.as_deref()),
    }
}

fn log_payload_issues(record: &PatternRecord, payload: &DecodedPayload) {
    if !tracing::enabled!(tracing::Level::TRACE) {
        return;
    }
    for (field, issue) in payload.issues() {
        tracing::trace!(
            record = %record.id,
            kind = %record.pattern_type,
            field,
            %issue,
            "pattern payload field defaulted"
        );
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn record(kind: &str, data: Value, confidence: Option<f64>) -> PatternRecord {
        PatternRecord {
            id: "p1".to_string(),
            team_name: "Arsenal".to_string(),
            team_id: None,
            pattern_type: kind.to_string(),
            pattern_data: data,
            confidence,
            occurrences: None,
            created_at: None,
            last_seen: None,
            created_by: None,
        }
    }

    #[test]
    fn bucket_ladder_edges() {
        assert_eq!(bucket(None), ConfidenceBucket::Unknown);
        assert_eq!(bucket(Some(f64::NAN)), ConfidenceBucket::Unknown);
        assert_eq!(bucket(Some(0.0)), ConfidenceBucket::Low);
        assert_eq!(bucket(Some(59.9)), ConfidenceBucket::Low);
        assert_eq!(bucket(Some(60.0)), ConfidenceBucket::Medium);
        assert_eq!(bucket(Some(79.9)), ConfidenceBucket::Medium);
        assert_eq!(bucket(Some(80.0)), ConfidenceBucket::High);
        assert_eq!(bucket(Some(100.0)), ConfidenceBucket::High);
        assert_eq!(bucket(Some(250.0)), ConfidenceBucket::High);
        assert_eq!(bucket(Some(-5.0)), ConfidenceBucket::Low);
    }

    #[test]
    fn bucket_is_monotonic() {
        let mut prev = bucket(Some(0.0));
        for step in 0..=1000 {
            let b = bucket(Some(step as f64 / 10.0));
            assert!(b >= prev, "bucket went down at {step}");
            prev = b;
        }
    }

    #[test]
    fn title_case_splits_on_underscore() {
        assert_eq!(title_case("btts_tendency"), "Btts Tendency");
        assert_eq!(title_case("streak"), "Streak");
        assert_eq!(title_case(""), "");
        assert_eq!(title_case("Venue_Performance"), "Venue Performance");
    }

    #[test]
    fn title_case_is_idempotent_with_separator() {
        let once = title_case("scoring_timing");
        let underscored = once.replace(' ', "_");
        assert_eq!(title_case(&underscored), once);
    }

    #[test]
    fn confidence_is_clamped_on_summary() {
        let s = decode(&record("streak", json!({}), Some(140.0)));
        assert_eq!(s.confidence, Some(100.0));
        assert_eq!(s.confidence_label(), "100% confidence");
        let s = decode(&record("streak", json!({}), None));
        assert_eq!(s.confidence_label(), "0% confidence");
    }

    #[test]
    fn confidence_label_rounds_halves_up() {
        assert_eq!(
            decode(&record("streak", json!({}), Some(72.5))).confidence_label(),
            "73% confidence"
        );
        assert_eq!(
            decode(&record("streak", json!({}), Some(64.5))).confidence_label(),
            "65% confidence"
        );
    }

    #[test]
    fn negative_occurrences_are_clamped() {
        let mut r = record("streak", json!({}), None);
        r.occurrences = Some(-4);
        assert_eq!(decode(&r).occurrences, Some(0));
    }
}
