//! Per-kind payload schemas for pattern rows.
//!
//! `pattern_data` arrives as an untyped JSON object whose shape depends on the
//! pattern kind. Every field read goes through [`number`] / [`text`], which
//! report *why* a field is unusable instead of panicking or coalescing inline.
//! The describe functions then map a [`FieldIssue`] onto the display default.

use std::fmt;

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldIssue {
    /// Absent, `null`, or an empty string.
    Missing,
    /// Present with a type the schema does not accept.
    WrongType,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldIssue::Missing => f.write_str("missing"),
            FieldIssue::WrongType => f.write_str("wrong type"),
        }
    }
}

pub type Field<T> = Result<T, FieldIssue>;

fn raw_field<'a>(payload: &'a Value, key: &str) -> Field<&'a Value> {
    match payload.get(key) {
        None | Some(Value::Null) => Err(FieldIssue::Missing),
        Some(v) => Ok(v),
    }
}

pub fn number(payload: &Value, key: &str) -> Field<f64> {
    let v = raw_field(payload, key)?;
    v.as_f64()
        .filter(|n| n.is_finite())
        .ok_or(FieldIssue::WrongType)
}

pub fn text(payload: &Value, key: &str) -> Field<String> {
    let v = raw_field(payload, key)?;
    let s = v.as_str().ok_or(FieldIssue::WrongType)?;
    if s.is_empty() {
        return Err(FieldIssue::Missing);
    }
    Ok(s.to_string())
}

/// Percentages are displayed inside [0, 100]; anything else is clamped on read.
pub fn percentage(payload: &Value, key: &str) -> Field<f64> {
    number(payload, key).map(|p| p.clamp(0.0, 100.0))
}

/// Render a number the way the dashboard always has: integers without a
/// fractional part, everything else in shortest form.
pub fn display_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Fixed-point rendering as the dashboard labels have always shown it: exact
/// halfway values round away from zero (`72.5` -> `"73"`), where `{:.N}`
/// alone would round them to even.
pub fn to_fixed(value: f64, digits: usize) -> String {
    if is_decimal_tie(value, digits) {
        // Next representable magnitude is strictly past the midpoint.
        let nudged = f64::from_bits(value.abs().to_bits() + 1).copysign(value);
        return format!("{nudged:.digits$}");
    }
    format!("{value:.digits$}")
}

// `value * 10^digits` has a fractional part of exactly one half. With
// `value = m * 2^e` that holds iff `trailing_zeros(m) + digits + 1 == -e`.
fn is_decimal_tie(value: f64, digits: usize) -> bool {
    if !value.is_finite() || value == 0.0 {
        return false;
    }
    let bits = value.to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i64;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mantissa, exp) = if biased == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), biased - 1075)
    };
    i64::from(mantissa.trailing_zeros()) + digits as i64 + 1 == -exp
}

fn number_or_zero(field: &Field<f64>) -> String {
    display_number(*field.as_ref().unwrap_or(&0.0))
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreakPayload {
    pub streak_length: Field<f64>,
    pub streak_type: Field<String>,
}

impl StreakPayload {
    pub fn decode(payload: &Value) -> Self {
        Self {
            streak_length: number(payload, "streak_length").map(|n| n.max(0.0)),
            streak_type: text(payload, "streak_type"),
        }
    }

    pub fn describe(&self) -> String {
        let kind = self.streak_type.as_deref().unwrap_or("unknown");
        format!("{} {kind} streak", number_or_zero(&self.streak_length))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringTimingPayload {
    pub timing: Field<String>,
    pub first_half_percentage: Field<f64>,
}

impl ScoringTimingPayload {
    pub fn decode(payload: &Value) -> Self {
        Self {
            timing: text(payload, "timing"),
            first_half_percentage: percentage(payload, "first_half_percentage"),
        }
    }

    pub fn is_early_scorer(&self) -> bool {
        self.timing.as_deref() == Ok("early_scorer")
    }

    pub fn describe(&self) -> String {
        let label = if self.is_early_scorer() {
            "Early scorer"
        } else {
            "Late bloomer"
        };
        format!(
            "{label} ({}% first half)",
            number_or_zero(&self.first_half_percentage)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VenuePayload {
    pub stronger_venue: Field<String>,
    pub difference: Field<f64>,
}

impl VenuePayload {
    pub fn decode(payload: &Value) -> Self {
        Self {
            stronger_venue: text(payload, "stronger_venue"),
            difference: percentage(payload, "difference"),
        }
    }

    pub fn describe(&self) -> String {
        let venue = self.stronger_venue.as_deref().unwrap_or("venue");
        format!(
            "Stronger {venue} ({}% difference)",
            number_or_zero(&self.difference)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BttsPayload {
    pub tendency: Field<String>,
    pub btts_percentage: Field<f64>,
}

impl BttsPayload {
    pub fn decode(payload: &Value) -> Self {
        Self {
            tendency: text(payload, "tendency"),
            btts_percentage: percentage(payload, "btts_percentage"),
        }
    }

    pub fn describe(&self) -> String {
        let label = if self.tendency.as_deref() == Ok("high") {
            "High"
        } else {
            "Low"
        };
        format!("{label} BTTS ({}%)", number_or_zero(&self.btts_percentage))
    }
}

/// A payload after the kind-indexed parse. `Raw` keeps the original value for
/// kinds nobody has registered yet.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedPayload {
    Streak(StreakPayload),
    ScoringTiming(ScoringTimingPayload),
    Venue(VenuePayload),
    Btts(BttsPayload),
    Raw(Value),
}

pub const UNKNOWN_DESCRIPTION: &str = "Unknown pattern";

impl DecodedPayload {
    pub fn describe(&self) -> String {
        match self {
            DecodedPayload::Streak(p) => p.describe(),
            DecodedPayload::ScoringTiming(p) => p.describe(),
            DecodedPayload::Venue(p) => p.describe(),
            DecodedPayload::Btts(p) => p.describe(),
            DecodedPayload::Raw(_) => UNKNOWN_DESCRIPTION.to_string(),
        }
    }

    /// Fields that fell back to a default while decoding, by name.
    pub fn issues(&self) -> Vec<(&'static str, FieldIssue)> {
        let mut out = Vec::new();
        let mut push = |name: &'static str, issue: Option<FieldIssue>| {
            if let Some(issue) = issue {
                out.push((name, issue));
            }
        };
        match self {
            DecodedPayload::Streak(p) => {
                push("streak_length", p.streak_length.as_ref().err().copied());
                push("streak_type", p.streak_type.as_ref().err().copied());
            }
            DecodedPayload::ScoringTiming(p) => {
                push("timing", p.timing.as_ref().err().copied());
                push(
                    "first_half_percentage",
                    p.first_half_percentage.as_ref().err().copied(),
                );
            }
            DecodedPayload::Venue(p) => {
                push("stronger_venue", p.stronger_venue.as_ref().err().copied());
                push("difference", p.difference.as_ref().err().copied());
            }
            DecodedPayload::Btts(p) => {
                push("tendency", p.tendency.as_ref().err().copied());
                push("btts_percentage", p.btts_percentage.as_ref().err().copied());
            }
            DecodedPayload::Raw(_) => {}
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn number_reports_missing_and_wrong_type() {
        let v = json!({"a": 3, "b": "3", "c": null});
        assert_eq!(number(&v, "a"), Ok(3.0));
        assert_eq!(number(&v, "b"), Err(FieldIssue::WrongType));
        assert_eq!(number(&v, "c"), Err(FieldIssue::Missing));
        assert_eq!(number(&v, "zzz"), Err(FieldIssue::Missing));
        assert_eq!(number(&json!([1, 2]), "a"), Err(FieldIssue::Missing));
    }

    #[test]
    fn empty_text_counts_as_missing() {
        let v = json!({"t": "", "u": 4});
        assert_eq!(text(&v, "t"), Err(FieldIssue::Missing));
        assert_eq!(text(&v, "u"), Err(FieldIssue::WrongType));
    }

    #[test]
    fn display_number_drops_integral_fraction() {
        assert_eq!(display_number(5.0), "5");
        assert_eq!(display_number(62.5), "62.5");
        assert_eq!(display_number(0.0), "0");
    }

    #[test]
    fn to_fixed_rounds_exact_halves_up() {
        assert_eq!(to_fixed(72.5, 0), "73");
        assert_eq!(to_fixed(62.25, 1), "62.3");
        assert_eq!(to_fixed(0.5, 0), "1");
        assert_eq!(to_fixed(-2.5, 0), "-3");
        assert_eq!(to_fixed(71.5, 0), "72");
    }

    #[test]
    fn to_fixed_leaves_non_ties_alone() {
        // 1.005 is stored just below the midpoint.
        assert_eq!(to_fixed(1.005, 2), "1.00");
        assert_eq!(to_fixed(61.27, 1), "61.3");
        assert_eq!(to_fixed(72.4, 0), "72");
        assert_eq!(to_fixed(100.0, 0), "100");
        assert_eq!(to_fixed(0.0, 1), "0.0");
    }

    #[test]
    fn percentages_are_clamped() {
        let p = BttsPayload::decode(&json!({"tendency": "high", "btts_percentage": 140}));
        assert_eq!(p.describe(), "High BTTS (100%)");
        let p = VenuePayload::decode(&json!({"stronger_venue": "away", "difference": -3}));
        assert_eq!(p.describe(), "Stronger away (0% difference)");
    }

    #[test]
    fn issues_name_the_defaulted_fields() {
        let p = DecodedPayload::Streak(StreakPayload::decode(&json!({"streak_length": "x"})));
        assert_eq!(
            p.issues(),
            vec![
                ("streak_length", FieldIssue::WrongType),
                ("streak_type", FieldIssue::Missing)
            ]
        );
    }
}
