//! Game-clock arithmetic.
//!
//! The feed reports the time *remaining* in the current period. Elapsed
//! game time is rebuilt from fixed period lengths, never from wall-clock
//! timestamps.

/// Number of regulation periods.
pub const REGULATION_PERIODS: u32 = 4;

/// Length of a regulation period (10 minutes).
pub const REGULATION_PERIOD_SECONDS: u32 = 600;

/// Length of an overtime period (5 minutes).
pub const OVERTIME_PERIOD_SECONDS: u32 = 300;

/// Parse a `MM:SS` remaining-time string to seconds.
///
/// Returns `None` for anything that is not exactly two non-negative
/// integer fields separated by a colon.
pub fn parse_clock_seconds(clock: &str) -> Option<u32> {
    let (minutes, seconds) = clock.trim().split_once(':')?;
    if seconds.contains(':') {
        return None;
    }
    let minutes: u32 = minutes.trim().parse().ok()?;
    let seconds: u32 = seconds.trim().parse().ok()?;
    minutes.checked_mul(60)?.checked_add(seconds)
}

/// Length of the given period in seconds; `None` for period 0.
pub fn period_length_seconds(period: u32) -> Option<u32> {
    match period {
        0 => None,
        1..=REGULATION_PERIODS => Some(REGULATION_PERIOD_SECONDS),
        _ => Some(OVERTIME_PERIOD_SECONDS),
    }
}

/// Seconds of game time elapsed at the given period and remaining clock.
///
/// Sums the full lengths of every prior period and adds the portion of
/// the current one already played. A remaining time longer than the
/// period itself is treated as malformed.
pub fn elapsed_game_seconds(period: u32, remaining_seconds: u32) -> Option<u32> {
    let length = period_length_seconds(period)?;
    if remaining_seconds > length {
        return None;
    }
    let base: u32 = (1..period).filter_map(period_length_seconds).sum();
    Some(base + (length - remaining_seconds))
}
