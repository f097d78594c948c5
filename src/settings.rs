use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::performance::DEFAULT_HISTORY_LIMIT;

const CACHE_DIR: &str = "insight_terminal";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub db_path: PathBuf,
    pub team_filter: Option<String>,
    pub poll_interval: Duration,
    pub history_limit: usize,
}

impl Settings {
    /// Read `.env.local` / `.env` (if present) and then the process environment.
    pub fn load() -> Result<Self> {
        load_env_files();
        Self::from_env()
    }

    pub fn from_env() -> Result<Self> {
        let db_path = non_empty_var("INSIGHT_DB")
            .map(PathBuf::from)
            .or_else(crate::store::default_db_path)
            .context("unable to resolve sqlite path (set INSIGHT_DB or HOME)")?;
        let team_filter = non_empty_var("INSIGHT_TEAM");
        let poll_secs = env::var("INSIGHT_POLL_SECS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(60)
            .max(10);
        let history_limit = env::var("INSIGHT_HISTORY_LIMIT")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(2, 50);

        Ok(Self {
            db_path,
            team_filter,
            poll_interval: Duration::from_secs(poll_secs),
            history_limit,
        })
    }
}

/// `.env.local` then `.env`. Variables already set win, so repeat calls are harmless.
pub fn load_env_files() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

pub fn load_env_files_in(dir: &Path) {
    let _ = dotenvy::from_path(dir.join(".env.local"));
    let _ = dotenvy::from_path(dir.join(".env"));
}

fn non_empty_var(key: &str) -> Option<String> {
    let val = env::var(key).ok()?;
    let trimmed = val.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

pub fn app_cache_dir() -> Option<PathBuf> {
    // Prefer XDG cache.
    if let Some(base) = non_empty_var("XDG_CACHE_HOME") {
        return Some(PathBuf::from(base).join(CACHE_DIR));
    }
    let home = non_empty_var("HOME")?;
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

/// `--db <path>` or `--db=<path>` from the command line.
pub fn parse_db_path_arg() -> Option<PathBuf> {
    parse_db_path_from(std::env::args().skip(1))
}

pub fn parse_db_path_from(args: impl IntoIterator<Item = String>) -> Option<PathBuf> {
    let args = args.into_iter().collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--db=") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--db" {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}

fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
}

/// Filter built after the env files in `dir` are loaded, so a `RUST_LOG`
/// set there applies.
pub fn logging_filter_from(dir: &Path) -> tracing_subscriber::EnvFilter {
    load_env_files_in(dir);
    env_filter()
}

/// Install a `tracing` subscriber honouring `RUST_LOG` (default `info`).
/// Env files are loaded first.
pub fn init_logging() {
    load_env_files();
    let filter = env_filter();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Same as [`init_logging`] but into a file under the cache dir, for the TUI
/// where stderr is covered by the alternate screen.
pub fn init_file_logging() -> Option<PathBuf> {
    let dir = app_cache_dir()?;
    std::fs::create_dir_all(&dir).ok()?;
    let path = dir.join("insight_terminal.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .ok()?;
    load_env_files();
    let filter = env_filter();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .try_init()
        .ok()?;
    Some(path)
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;

    use super::{load_env_files_in, logging_filter_from, parse_db_path_from};

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn db_arg_forms() {
        assert_eq!(
            parse_db_path_from(args(&["--db=/tmp/a.sqlite"])),
            Some("/tmp/a.sqlite".into())
        );
        assert_eq!(
            parse_db_path_from(args(&["--team", "x", "--db", "b.sqlite"])),
            Some("b.sqlite".into())
        );
        assert_eq!(parse_db_path_from(args(&["--db"])), None);
        assert_eq!(parse_db_path_from(args(&["--db= "])), None);
    }

    fn scratch_dir(tag: &str) -> std::path::PathBuf {
        let dir = env::temp_dir().join(format!("insight_env_{tag}_{}", std::process::id()));
        fs::create_dir_all(&dir).expect("create scratch dir");
        dir
    }

    #[test]
    fn local_env_file_wins_over_shared() {
        let dir = scratch_dir("order");
        fs::write(dir.join(".env.local"), "INSIGHT_TEST_ENV_ORDER=local\n").unwrap();
        fs::write(
            dir.join(".env"),
            "INSIGHT_TEST_ENV_ORDER=shared\nINSIGHT_TEST_ENV_SHARED=shared\n",
        )
        .unwrap();
        load_env_files_in(&dir);
        assert_eq!(env::var("INSIGHT_TEST_ENV_ORDER").as_deref(), Ok("local"));
        assert_eq!(env::var("INSIGHT_TEST_ENV_SHARED").as_deref(), Ok("shared"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn rust_log_from_env_file_reaches_the_filter() {
        if env::var_os("RUST_LOG").is_some() {
            // The process value takes precedence; nothing to check.
            return;
        }
        let dir = scratch_dir("rust_log");
        fs::write(dir.join(".env"), "RUST_LOG=insight_terminal=trace\n").unwrap();
        let filter = logging_filter_from(&dir);
        assert!(filter.to_string().contains("insight_terminal=trace"));
        let _ = fs::remove_dir_all(&dir);
    }
}
