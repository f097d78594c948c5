use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::pattern_view::{PatternFilter, VIEW_CAP};
use crate::settings::Settings;
use crate::state::{Delta, Panel, ProviderCommand};
use crate::store::{self, PatternQuery};

/// Worker thread that owns the sqlite connection and answers dashboard
/// commands. It also re-reads both collections every `poll_interval`.
pub fn spawn_provider(
    settings: Settings,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut filter = settings
            .team_filter
            .clone()
            .map(PatternFilter::team)
            .unwrap_or_default();
        let mut conn: Option<Connection> = None;

        refresh_all(&settings, &mut conn, &filter, &tx);
        let mut last_refresh = Instant::now();

        loop {
            let wait = settings
                .poll_interval
                .checked_sub(last_refresh.elapsed())
                .unwrap_or(Duration::ZERO);
            match cmd_rx.recv_timeout(wait) {
                Ok(ProviderCommand::FetchPatterns { filter: next }) => {
                    filter = next;
                    send_patterns(&settings, &mut conn, &filter, &tx);
                }
                Ok(ProviderCommand::FetchPerformance) => {
                    send_performance(&settings, &mut conn, &tx);
                }
                Err(RecvTimeoutError::Timeout) => {
                    refresh_all(&settings, &mut conn, &filter, &tx);
                    last_refresh = Instant::now();
                }
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }
    })
}

fn refresh_all(
    settings: &Settings,
    conn: &mut Option<Connection>,
    filter: &PatternFilter,
    tx: &Sender<Delta>,
) {
    send_patterns(settings, conn, filter, tx);
    send_performance(settings, conn, tx);
}

// Opened lazily and dropped on error so the next poll retries from scratch.
fn connection<'a>(settings: &Settings, conn: &'a mut Option<Connection>) -> Result<&'a Connection> {
    if conn.is_none() {
        *conn = Some(store::open_db(&settings.db_path)?);
    }
    conn.as_ref().context("sqlite connection unavailable")
}

pub fn fetch_patterns(conn: &Connection, filter: &PatternFilter) -> Result<Delta> {
    let query = PatternQuery {
        team_name: filter.team_name.clone(),
        limit: VIEW_CAP,
    };
    let records = store::load_patterns(conn, &query).context("load team patterns")?;
    Ok(Delta::SetPatterns {
        filter: filter.clone(),
        records,
    })
}

pub fn fetch_performance(conn: &Connection, limit: usize) -> Result<Delta> {
    let snapshots = store::load_snapshots(conn, limit).context("load model performance")?;
    Ok(Delta::SetPerformance(snapshots))
}

fn send_patterns(
    settings: &Settings,
    conn: &mut Option<Connection>,
    filter: &PatternFilter,
    tx: &Sender<Delta>,
) {
    let started = Instant::now();
    let result = connection(settings, conn).and_then(|c| fetch_patterns(c, filter));
    match result {
        Ok(delta) => {
            tracing::debug!(elapsed_ms = started.elapsed().as_millis() as u64, "patterns fetched");
            let _ = tx.send(delta);
        }
        Err(err) => {
            *conn = None;
            tracing::warn!(error = %format!("{err:#}"), "pattern fetch failed");
            let _ = tx.send(Delta::FetchFailed {
                panel: Panel::Patterns,
                message: format!("{err:#}"),
            });
        }
    }
}

fn send_performance(settings: &Settings, conn: &mut Option<Connection>, tx: &Sender<Delta>) {
    let started = Instant::now();
    let result =
        connection(settings, conn).and_then(|c| fetch_performance(c, settings.history_limit));
    match result {
        Ok(delta) => {
            tracing::debug!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                "performance fetched"
            );
            let _ = tx.send(delta);
        }
        Err(err) => {
            *conn = None;
            tracing::warn!(error = %format!("{err:#}"), "performance fetch failed");
            let _ = tx.send(Delta::FetchFailed {
                panel: Panel::Performance,
                message: format!("{err:#}"),
            });
        }
    }
}
