use std::cmp::Ordering;

use crate::payload::to_fixed;
use crate::records::{PerformanceSnapshot, date_label, datetime_label};

/// Default number of snapshots the dashboard pulls for the trend chart.
pub const DEFAULT_HISTORY_LIMIT: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    pub period: String,
    pub accuracy: f64,
    pub precision: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PerformanceHistory {
    pub latest: Option<PerformanceSnapshot>,
    // Oldest first.
    pub trend: Vec<TrendPoint>,
}

impl PerformanceHistory {
    /// A trend with fewer than two points is not drawn; only the metric cards are.
    pub fn chartable(&self) -> bool {
        self.trend.len() >= 2
    }
}

fn metric(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

// Unparseable timestamps rank below any parsed one.
fn newer(a: &PerformanceSnapshot, b: &PerformanceSnapshot) -> Ordering {
    a.created()
        .cmp(&b.created())
        .then_with(|| a.updated().cmp(&b.updated()))
}

/// `snapshots` is in retrieval order, which the store returns newest first.
pub fn build_history(snapshots: &[PerformanceSnapshot]) -> PerformanceHistory {
    let mut latest: Option<&PerformanceSnapshot> = None;
    for snap in snapshots {
        match latest {
            Some(cur) if newer(snap, cur) != Ordering::Greater => {}
            _ => latest = Some(snap),
        }
    }

    let trend = snapshots
        .iter()
        .rev()
        .map(|p| TrendPoint {
            period: date_label(p.created_at.as_deref()).unwrap_or_else(|| "Unknown".to_string()),
            accuracy: metric(p.accuracy),
            precision: metric(p.precision_score),
        })
        .collect();

    PerformanceHistory {
        latest: latest.cloned(),
        trend,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricCard {
    pub label: &'static str,
    pub value: String,
    // Gauge fill in [0, 1]; `None` for count-only cards.
    pub ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricCards {
    pub cards: Vec<MetricCard>,
    pub last_updated: String,
    pub model_label: String,
}

impl MetricCards {
    pub fn from_snapshot(snap: &PerformanceSnapshot) -> Self {
        let pct_card = |label: &'static str, value: Option<f64>| {
            let v = metric(value);
            MetricCard {
                label,
                value: format!("{}%", to_fixed(v, 1)),
                ratio: Some((v / 100.0).clamp(0.0, 1.0)),
            }
        };
        let count_card = |label: &'static str, value: Option<i64>| MetricCard {
            label,
            value: value.unwrap_or(0).max(0).to_string(),
            ratio: None,
        };

        Self {
            cards: vec![
                pct_card("Accuracy", snap.accuracy),
                pct_card("Precision", snap.precision_score),
                count_card("Total Predictions", snap.total_predictions),
                count_card("Correct", snap.correct_predictions),
            ],
            last_updated: datetime_label(snap.updated_at.as_deref())
                .unwrap_or_else(|| "Never".to_string()),
            model_label: format!("{} {}", snap.model_name, snap.model_version),
        }
    }

    pub fn footer(&self) -> String {
        format!(
            "Last updated: {} • Model: {}",
            self.last_updated, self.model_label
        )
    }
}
