//! PBP Core - play-by-play attribution and lineup reconstruction.
//!
//! This module provides:
//! - Player name normalization and roster identity resolution
//! - Ordered, category-exclusive classification of event descriptions
//! - Situational context (score margin, clutch, transition, shot zone)
//! - Lineup stint segmentation from per-event on-court snapshots
//! - Per-player and per-lineup aggregation of attributed actions
//! - Batch processing across games via rayon

mod types;

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod context;
pub mod error;
pub mod matching;
pub mod models;
pub mod pipeline;
pub mod stints;
pub mod table;
pub mod utils;

pub use types::*;

pub use aggregate::AggregateReport;
pub use classify::{Bucket, EventClassifier, Role};
pub use config::PipelineConfig;
pub use error::{PbpError, Result};
pub use matching::{AliasTable, NameResolver, RosterIndex};
pub use models::{Action, AttributedAction, MarginBucket, Zone};
pub use pipeline::{Pipeline, PipelineOutput};
pub use table::{Capabilities, Table};
