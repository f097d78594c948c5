use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::payload::{
    BttsPayload, DecodedPayload, ScoringTimingPayload, StreakPayload, VenuePayload,
};

/// Pattern kinds this build knows how to describe. Producers evolve faster than
/// the dashboard, so anything else is carried as `Unrecognized` with its tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatternKind {
    Streak,
    ScoringTiming,
    VenuePerformance,
    BttsTendency,
    Unrecognized(String),
}

impl PatternKind {
    pub const KNOWN: [PatternKind; 4] = [
        PatternKind::Streak,
        PatternKind::ScoringTiming,
        PatternKind::VenuePerformance,
        PatternKind::BttsTendency,
    ];

    pub fn parse(raw: &str) -> Self {
        match raw {
            "streak" => PatternKind::Streak,
            "scoring_timing" => PatternKind::ScoringTiming,
            "venue_performance" => PatternKind::VenuePerformance,
            "btts_tendency" => PatternKind::BttsTendency,
            other => PatternKind::Unrecognized(other.to_string()),
        }
    }

    /// Wire tag for known kinds; `None` for `Unrecognized`.
    pub fn known_tag(&self) -> Option<&'static str> {
        match self {
            PatternKind::Streak => Some("streak"),
            PatternKind::ScoringTiming => Some("scoring_timing"),
            PatternKind::VenuePerformance => Some("venue_performance"),
            PatternKind::BttsTendency => Some("btts_tendency"),
            PatternKind::Unrecognized(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PatternKind::Unrecognized(raw) => raw,
            known => known.known_tag().unwrap_or_default(),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, PatternKind::Unrecognized(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconHint {
    TrendingUp,
    Clock,
    Target,
    TrendingDown,
    None,
}

impl IconHint {
    pub fn glyph(self) -> &'static str {
        match self {
            IconHint::TrendingUp => "↗",
            IconHint::Clock => "◷",
            IconHint::Target => "◎",
            IconHint::TrendingDown => "↘",
            IconHint::None => " ",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            IconHint::TrendingUp => "trending-up",
            IconHint::Clock => "clock",
            IconHint::Target => "target",
            IconHint::TrendingDown => "trending-down",
            IconHint::None => "none",
        }
    }
}

pub type PayloadParser = fn(&Value) -> DecodedPayload;

#[derive(Debug, Clone, Copy)]
pub struct RegistryEntry {
    pub icon: IconHint,
    pub parser: PayloadParser,
    pub is_known: bool,
}

impl RegistryEntry {
    pub fn parse_payload(&self, payload: &Value) -> DecodedPayload {
        (self.parser)(payload)
    }

    pub fn describe(&self, payload: &Value) -> String {
        self.parse_payload(payload).describe()
    }
}

pub const UNKNOWN_ENTRY: RegistryEntry = RegistryEntry {
    icon: IconHint::None,
    parser: parse_raw,
    is_known: false,
};

fn parse_streak(v: &Value) -> DecodedPayload {
    DecodedPayload::Streak(StreakPayload::decode(v))
}

fn parse_scoring_timing(v: &Value) -> DecodedPayload {
    DecodedPayload::ScoringTiming(ScoringTimingPayload::decode(v))
}

fn parse_venue(v: &Value) -> DecodedPayload {
    DecodedPayload::Venue(VenuePayload::decode(v))
}

fn parse_btts(v: &Value) -> DecodedPayload {
    DecodedPayload::Btts(BttsPayload::decode(v))
}

fn parse_raw(v: &Value) -> DecodedPayload {
    DecodedPayload::Raw(v.clone())
}

/// Exhaustive over known kinds; a new variant will not compile until it has a row here.
pub fn entry_for(kind: &PatternKind) -> RegistryEntry {
    let (icon, parser): (IconHint, PayloadParser) = match kind {
        PatternKind::Streak => (IconHint::TrendingUp, parse_streak as PayloadParser),
        PatternKind::ScoringTiming => (IconHint::Clock, parse_scoring_timing as PayloadParser),
        PatternKind::VenuePerformance => (IconHint::Target, parse_venue as PayloadParser),
        PatternKind::BttsTendency => (IconHint::TrendingDown, parse_btts as PayloadParser),
        PatternKind::Unrecognized(_) => return UNKNOWN_ENTRY,
    };
    RegistryEntry {
        icon,
        parser,
        is_known: true,
    }
}

static REGISTRY: Lazy<HashMap<&'static str, RegistryEntry>> = Lazy::new(|| {
    let mut table = HashMap::new();
    for kind in &PatternKind::KNOWN {
        if let Some(tag) = kind.known_tag() {
            table.insert(tag, entry_for(kind));
        }
    }
    table
});

/// Resolve a raw kind tag. Never fails: unknown tags get [`UNKNOWN_ENTRY`].
pub fn lookup(kind: &str) -> RegistryEntry {
    match REGISTRY.get(kind) {
        Some(entry) => *entry,
        None => {
            tracing::debug!(kind, "unrecognized pattern kind, using fallback entry");
            UNKNOWN_ENTRY
        }
    }
}

pub fn known_kinds() -> Vec<&'static str> {
    let mut out: Vec<&'static str> = REGISTRY.keys().copied().collect();
    out.sort_unstable();
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_round_trips_known_tags() {
        for kind in &PatternKind::KNOWN {
            assert_eq!(&PatternKind::parse(kind.as_str()), kind);
            assert!(lookup(kind.as_str()).is_known);
        }
        let other = PatternKind::parse("home_fortress");
        assert_eq!(other, PatternKind::Unrecognized("home_fortress".to_string()));
        assert_eq!(other.as_str(), "home_fortress");
    }

    #[test]
    fn unknown_kind_gets_fallback() {
        let entry = lookup("mystery_kind");
        assert!(!entry.is_known);
        assert_eq!(entry.icon, IconHint::None);
        assert_eq!(entry.describe(&json!({"streak_length": 3})), "Unknown pattern");
    }

    #[test]
    fn icons_follow_kind() {
        assert_eq!(lookup("streak").icon, IconHint::TrendingUp);
        assert_eq!(lookup("scoring_timing").icon, IconHint::Clock);
        assert_eq!(lookup("venue_performance").icon, IconHint::Target);
        assert_eq!(lookup("btts_tendency").icon, IconHint::TrendingDown);
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert!(!lookup("Streak").is_known);
    }

    #[test]
    fn known_kinds_are_sorted() {
        assert_eq!(
            known_kinds(),
            vec!["btts_tendency", "scoring_timing", "streak", "venue_performance"]
        );
    }
}
