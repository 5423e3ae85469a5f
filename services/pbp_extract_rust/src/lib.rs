//! Play-by-play extraction service: CSV tables in, attributed actions,
//! issues, stints and aggregates out.

pub mod config;
pub mod io;
pub mod records;
pub mod run;
