//! Sports-data API shapes kept for future ingestion.
//!
//! Nothing in the pattern decoder consumes these yet; they pin down the wire
//! format so fixtures and importers can be written against it.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleBreakdown {
    pub winner: String,
    pub final_confidence: f64,
    pub conflict_detected: bool,
    pub conflict_margin: f64,
    #[serde(default)]
    pub votes: HashMap<String, f64>,
    #[serde(default)]
    pub weights_used: HashMap<String, f64>,
    #[serde(default)]
    pub scores: HashMap<String, f64>,
}

impl EnsembleBreakdown {
    /// Model with the highest score; ties go to the lexically smaller name.
    pub fn top_model(&self) -> Option<(&str, f64)> {
        let mut best: Option<(&str, f64)> = None;
        for (name, score) in &self.scores {
            let replace = match best {
                None => true,
                Some((best_name, best_score)) => {
                    *score > best_score || (*score == best_score && name.as_str() < best_name)
                }
            };
            if replace {
                best = Some((name.as_str(), *score));
            }
        }
        best
    }

    pub fn total_votes(&self) -> f64 {
        self.votes.values().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SportradarMatch {
    pub id: String,
    pub sport_event: SportEvent,
    pub sport_event_status: SportEventStatus,
    #[serde(default)]
    pub statistics: MatchStatistics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SportEvent {
    pub id: String,
    pub start_time: String,
    pub sport_event_context: SportEventContext,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SportEventContext {
    pub competition: Competition,
    pub stage: Stage,
    pub category: Category,
    #[serde(default)]
    pub competitors: Vec<Competitor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competition {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub order: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub country_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competitor {
    pub id: String,
    pub name: String,
    pub country: String,
    pub country_code: String,
    pub abbreviation: String,
    // "home" / "away"
    pub qualifier: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SportEventStatus {
    pub status: String,
    pub match_status: String,
    pub home_score: u32,
    pub away_score: u32,
    #[serde(default)]
    pub winner: Option<String>,
    #[serde(default)]
    pub period_scores: Vec<PeriodScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodScore {
    pub home_score: u32,
    pub away_score: u32,
    #[serde(rename = "type")]
    pub kind: String,
    pub number: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MatchStatistics {
    #[serde(default)]
    pub teams: Vec<TeamStatistics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStatistics {
    pub name: String,
    #[serde(default)]
    pub statistics: HashMap<String, f64>,
}

impl SportradarMatch {
    pub fn competitor(&self, qualifier: &str) -> Option<&Competitor> {
        self.sport_event
            .sport_event_context
            .competitors
            .iter()
            .find(|c| c.qualifier == qualifier)
    }

    /// Goals scored in the first period, `(home, away)`.
    pub fn first_half_score(&self) -> Option<(u32, u32)> {
        self.sport_event_status
            .period_scores
            .iter()
            .find(|p| p.number == 1)
            .map(|p| (p.home_score, p.away_score))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SportradarPrediction {
    pub match_id: String,
    pub predicted_winner: String,
    pub confidence: f64,
    pub probability: Probability,
    pub model_version: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Probability {
    pub home_win: f64,
    pub draw: f64,
    pub away_win: f64,
}

impl Probability {
    /// Conceptually 1.0; producers round, so callers should allow slack.
    pub fn total(&self) -> f64 {
        self.home_win + self.draw + self.away_win
    }

    pub fn is_normalized(&self, tolerance: f64) -> bool {
        (self.total() - 1.0).abs() <= tolerance
    }
}

pub fn parse_match_json(raw: &str) -> Result<SportradarMatch> {
    serde_json::from_str(raw).context("invalid sportradar match json")
}

pub fn parse_prediction_json(raw: &str) -> Result<SportradarPrediction> {
    serde_json::from_str(raw).context("invalid sportradar prediction json")
}

pub fn parse_ensemble_json(raw: &str) -> Result<EnsembleBreakdown> {
    serde_json::from_str(raw).context("invalid ensemble breakdown json")
}
