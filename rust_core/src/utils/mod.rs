pub mod clock;
pub mod names;

pub use clock::{elapsed_game_seconds, parse_clock_seconds, period_length_seconds};
pub use names::normalize_name;
