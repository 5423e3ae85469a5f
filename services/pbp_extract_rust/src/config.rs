//! Configuration constants and environment loading for the extract service
//!
//! This module manages all runtime configuration:
//! - Input table locations
//! - Output directory
//! - Pipeline calibration (zones, court geometry, cutoffs)

use pbp_rust_core::config::PipelineConfig;
use std::env;
use std::path::{Path, PathBuf};

/// Default directory holding the input tables
pub const DEFAULT_INPUT_DIR: &str = "data/pbp";

/// Default directory for output tables
pub const DEFAULT_OUTPUT_DIR: &str = "data/pbp/out";

pub const ROSTER_FILE: &str = "roster.csv";
pub const EVENTS_FILE: &str = "events.csv";
pub const ALIASES_FILE: &str = "aliases.csv";
/// Alternative alias file: a JSON object `{raw: canon}`
pub const ALIASES_JSON_FILE: &str = "aliases.json";
pub const GAME_CONTEXT_FILE: &str = "game_context.csv";
pub const LINEUPS_FILE: &str = "lineups.csv";

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub output_dir: PathBuf,
    pub roster_path: PathBuf,
    pub events_path: PathBuf,
    /// Missing file means no aliases
    pub aliases_path: PathBuf,
    pub game_context_path: PathBuf,
    pub lineups_path: PathBuf,
    pub pipeline: PipelineConfig,
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// `aliases.csv` when present, else `aliases.json`.
fn default_aliases_path(input_dir: &Path) -> PathBuf {
    let csv = input_dir.join(ALIASES_FILE);
    if csv.exists() {
        csv
    } else {
        input_dir.join(ALIASES_JSON_FILE)
    }
}

impl ServiceConfig {
    /// Standard file names under `input_dir`, default pipeline calibration.
    pub fn with_dirs(input_dir: impl AsRef<Path>, output_dir: impl AsRef<Path>) -> Self {
        let input_dir = input_dir.as_ref();
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            roster_path: input_dir.join(ROSTER_FILE),
            events_path: input_dir.join(EVENTS_FILE),
            aliases_path: default_aliases_path(input_dir),
            game_context_path: input_dir.join(GAME_CONTEXT_FILE),
            lineups_path: input_dir.join(LINEUPS_FILE),
            pipeline: PipelineConfig::default(),
        }
    }

    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> Self {
        let input_dir = env_path("PBP_INPUT_DIR").unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_DIR));
        let output_dir = env_path("PBP_OUTPUT_DIR").unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
        let base = Self::with_dirs(&input_dir, &output_dir);

        Self {
            roster_path: env_path("PBP_ROSTER_PATH").unwrap_or(base.roster_path),
            events_path: env_path("PBP_EVENTS_PATH").unwrap_or(base.events_path),
            aliases_path: env_path("PBP_ALIASES_PATH").unwrap_or(base.aliases_path),
            game_context_path: env_path("PBP_GAME_CONTEXT_PATH").unwrap_or(base.game_context_path),
            lineups_path: env_path("PBP_LINEUPS_PATH").unwrap_or(base.lineups_path),
            pipeline: PipelineConfig::from_env(),
            output_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_dirs_uses_standard_names() {
        let config = ServiceConfig::with_dirs("/nonexistent/in", "/tmp/out");
        assert_eq!(config.roster_path, PathBuf::from("/nonexistent/in/roster.csv"));
        assert_eq!(config.events_path, PathBuf::from("/nonexistent/in/events.csv"));
        assert_eq!(config.lineups_path, PathBuf::from("/nonexistent/in/lineups.csv"));
        // no alias csv on disk, so the json name is used
        assert_eq!(config.aliases_path, PathBuf::from("/nonexistent/in/aliases.json"));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_env_path_ignores_blank() {
        env::set_var("PBP_TEST_BLANK_PATH", "   ");
        env::set_var("PBP_TEST_SET_PATH", " /data/x.csv ");
        assert_eq!(env_path("PBP_TEST_BLANK_PATH"), None);
        assert_eq!(env_path("PBP_TEST_SET_PATH"), Some(PathBuf::from("/data/x.csv")));
        assert_eq!(env_path("PBP_TEST_UNSET_PATH"), None);
    }
}
