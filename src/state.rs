use std::collections::VecDeque;
use std::time::SystemTime;

use crate::pattern_decode::PatternSummary;
use crate::pattern_view::{PatternFilter, build_view};
use crate::performance::{PerformanceHistory, build_history};
use crate::records::{PatternRecord, PerformanceSnapshot};

const LOG_CAPACITY: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Patterns,
    Performance,
}

/// Fetch state of one dashboard panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Load {
    Pending,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub filter: PatternFilter,
    pub patterns: Vec<PatternSummary>,
    pub patterns_load: Load,
    pub patterns_fetched_at: Option<SystemTime>,
    pub history: PerformanceHistory,
    pub performance_load: Load,
    pub performance_fetched_at: Option<SystemTime>,
    pub selected: usize,
    pub help_overlay: bool,
    pub logs: VecDeque<String>,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_filter(PatternFilter::all())
    }

    pub fn with_filter(filter: PatternFilter) -> Self {
        Self {
            screen: Screen::Patterns,
            filter,
            patterns: Vec::new(),
            patterns_load: Load::Pending,
            patterns_fetched_at: None,
            history: PerformanceHistory::default(),
            performance_load: Load::Pending,
            performance_fetched_at: None,
            selected: 0,
            help_overlay: false,
            logs: VecDeque::new(),
        }
    }

    pub fn toggle_screen(&mut self) {
        self.screen = match self.screen {
            Screen::Patterns => Screen::Performance,
            Screen::Performance => Screen::Patterns,
        };
    }

    pub fn select_next(&mut self) {
        if self.patterns.is_empty() {
            self.selected = 0;
            return;
        }
        self.selected = (self.selected + 1).min(self.patterns.len() - 1);
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn selected_pattern(&self) -> Option<&PatternSummary> {
        self.patterns.get(self.selected)
    }

    pub fn push_log(&mut self, line: String) {
        if self.logs.len() >= LOG_CAPACITY {
            self.logs.pop_front();
        }
        self.logs.push_back(line);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Patterns,
    Performance,
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetPatterns {
        filter: PatternFilter,
        records: Vec<PatternRecord>,
    },
    SetPerformance(Vec<PerformanceSnapshot>),
    FetchFailed {
        panel: Panel,
        message: String,
    },
    Log(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCommand {
    FetchPatterns { filter: PatternFilter },
    FetchPerformance,
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetPatterns { filter, records } => {
            // A reply for a filter the user already switched away from is stale.
            if filter != state.filter {
                return;
            }
            state.patterns = build_view(&records, &state.filter);
            state.patterns_load = Load::Ready;
            state.patterns_fetched_at = Some(SystemTime::now());
            if state.selected >= state.patterns.len() {
                state.selected = state.patterns.len().saturating_sub(1);
            }
        }
        Delta::SetPerformance(snapshots) => {
            state.history = build_history(&snapshots);
            state.performance_load = Load::Ready;
            state.performance_fetched_at = Some(SystemTime::now());
        }
        Delta::FetchFailed { panel, message } => {
            state.push_log(format!("[WARN] {message}"));
            // Keep whatever was shown before; only a first load shows the error.
            match panel {
                Panel::Patterns => {
                    if state.patterns_load == Load::Pending || state.patterns.is_empty() {
                        state.patterns_load = Load::Failed(message);
                    }
                }
                Panel::Performance => {
                    if state.performance_load == Load::Pending || state.history.latest.is_none() {
                        state.performance_load = Load::Failed(message);
                    }
                }
            }
        }
        Delta::Log(line) => state.push_log(line),
    }
}
