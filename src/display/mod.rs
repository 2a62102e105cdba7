pub mod gauge;
pub mod temperature;
pub mod units;

pub use gauge::{display_ticks, ticks, to_gauge_state, GaugeState, Severity};
pub use temperature::{TemperatureBand, TemperatureTint};
pub use units::{compute_all, convert, range_for_unit, Prefix, PressureUnit};
