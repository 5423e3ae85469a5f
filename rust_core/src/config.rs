//! Calibration constants and environment loading for the pipeline
//!
//! Zone thresholds and court geometry are feed-scale calibration, not
//! behaviour: a feed with different coordinate units needs different
//! values, so all of them can be overridden from the environment.

use serde::{Deserialize, Serialize};
use std::env;

use crate::matching::suggest::DEFAULT_SUGGESTION_CUTOFF;

/// Rim zone: shot distance at or below this.
pub const DEFAULT_ZONE_RIM_MAX: f64 = 60.0;

/// Paint zone: shot distance at or below this.
pub const DEFAULT_ZONE_PAINT_MAX: f64 = 140.0;

/// Mid-range ends (exclusive) where three-point range starts.
pub const DEFAULT_ZONE_THREE_MIN: f64 = 240.0;

/// Three-pointers this far from the hoop along the baseline are corner threes.
pub const DEFAULT_ZONE_CORNER_MIN_X: f64 = 250.0;

/// Horizontal extent of the feed's coordinate system.
pub const DEFAULT_COURT_WIDTH: f64 = 1128.0;

/// Vertical extent of the feed's coordinate system.
pub const DEFAULT_COURT_HEIGHT: f64 = 600.0;

/// Lineups with fewer minutes are left out of lineup summaries.
pub const DEFAULT_LINEUP_MIN_MINUTES: f64 = 10.0;

fn env_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

/// Distance thresholds for shot zones.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneThresholds {
    pub rim_max: f64,
    pub paint_max: f64,
    pub three_min: f64,
    pub corner_min_x: f64,
}

impl Default for ZoneThresholds {
    fn default() -> Self {
        Self {
            rim_max: DEFAULT_ZONE_RIM_MAX,
            paint_max: DEFAULT_ZONE_PAINT_MAX,
            three_min: DEFAULT_ZONE_THREE_MIN,
            corner_min_x: DEFAULT_ZONE_CORNER_MIN_X,
        }
    }
}

impl ZoneThresholds {
    /// Load thresholds from environment variables with sensible defaults
    pub fn from_env() -> Self {
        Self {
            rim_max: env_f64("ZONE_RIM_MAX", DEFAULT_ZONE_RIM_MAX),
            paint_max: env_f64("ZONE_PAINT_MAX", DEFAULT_ZONE_PAINT_MAX),
            three_min: env_f64("ZONE_THREE_MIN", DEFAULT_ZONE_THREE_MIN),
            corner_min_x: env_f64("ZONE_CORNER_MIN_X", DEFAULT_ZONE_CORNER_MIN_X),
        }
    }
}

/// Extent of the raw coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CourtGeometry {
    pub width: f64,
    pub height: f64,
}

impl Default for CourtGeometry {
    fn default() -> Self {
        Self {
            width: DEFAULT_COURT_WIDTH,
            height: DEFAULT_COURT_HEIGHT,
        }
    }
}

impl CourtGeometry {
    pub fn from_env() -> Self {
        Self {
            width: env_f64("COURT_WIDTH", DEFAULT_COURT_WIDTH),
            height: env_f64("COURT_HEIGHT", DEFAULT_COURT_HEIGHT),
        }
    }

    pub fn mid_x(&self) -> f64 {
        self.width / 2.0
    }

    pub fn mid_y(&self) -> f64 {
        self.height / 2.0
    }
}

/// Everything the pipeline needs beyond its input tables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub zones: ZoneThresholds,
    pub court: CourtGeometry,
    pub suggestion_cutoff: f64,
    pub lineup_min_minutes: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            zones: ZoneThresholds::default(),
            court: CourtGeometry::default(),
            suggestion_cutoff: DEFAULT_SUGGESTION_CUTOFF,
            lineup_min_minutes: DEFAULT_LINEUP_MIN_MINUTES,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> Self {
        Self {
            zones: ZoneThresholds::from_env(),
            court: CourtGeometry::from_env(),
            suggestion_cutoff: env_f64("SUGGESTION_CUTOFF", DEFAULT_SUGGESTION_CUTOFF)
                .clamp(0.0, 1.0),
            lineup_min_minutes: env_f64("LINEUP_MIN_MINUTES", DEFAULT_LINEUP_MIN_MINUTES)
                .max(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_feed_calibration() {
        let config = PipelineConfig::default();
        assert_eq!(config.zones.rim_max, 60.0);
        assert_eq!(config.zones.paint_max, 140.0);
        assert_eq!(config.zones.three_min, 240.0);
        assert_eq!(config.zones.corner_min_x, 250.0);
        assert_eq!(config.court.mid_x(), 564.0);
        assert_eq!(config.court.mid_y(), 300.0);
        assert_eq!(config.lineup_min_minutes, 10.0);
    }

    #[test]
    fn test_env_override_and_garbage_fallback() {
        env::set_var("PBP_TEST_F64_OK", " 75.5 ");
        env::set_var("PBP_TEST_F64_BAD", "wide");
        env::set_var("PBP_TEST_F64_NAN", "NaN");
        assert_eq!(env_f64("PBP_TEST_F64_OK", 1.0), 75.5);
        assert_eq!(env_f64("PBP_TEST_F64_BAD", 1.0), 1.0);
        assert_eq!(env_f64("PBP_TEST_F64_NAN", 1.0), 1.0);
        assert_eq!(env_f64("PBP_TEST_F64_UNSET", 2.0), 2.0);
    }
}
