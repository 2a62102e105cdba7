/// Mapping of a scalar reading onto a 270° dial
use super::units::{convert, PressureUnit};

/// Percentage above which a reading is shown as a warning
pub const WARNING_PERCENT: f64 = 70.0;

/// Percentage above which a reading is shown as dangerous
pub const DANGER_PERCENT: f64 = 90.0;

/// Angle of the needle at 0%
pub const START_ANGLE_DEG: f64 = -135.0;

/// Total sweep of the dial face
pub const SWEEP_DEG: f64 = 270.0;

/// Default number of tick intervals (7 labeled points)
pub const DEFAULT_TICK_COUNT: usize = 6;

const _: () = assert!(WARNING_PERCENT < DANGER_PERCENT);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Normal,
    Warning,
    Danger,
}

impl Severity {
    pub fn from_percentage(percentage: f64) -> Severity {
        if percentage > DANGER_PERCENT {
            Severity::Danger
        } else if percentage > WARNING_PERCENT {
            Severity::Warning
        } else {
            Severity::Normal
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugeState {
    /// Fill level in [0, 100]
    pub percentage: f64,
    /// Needle angle in [-135, 135]
    pub angle_deg: f64,
    pub severity: Severity,
}

/// Map `value` against full scale `max`.
///
/// Overrange and negative readings are clamped; a NaN ratio (non-finite
/// input, or 0/0) reads as 0%.
pub fn to_gauge_state(value: f64, max: f64) -> GaugeState {
    let ratio = value / max * 100.0;
    let percentage = if ratio.is_nan() {
        0.0
    } else {
        ratio.clamp(0.0, 100.0)
    };

    GaugeState {
        percentage,
        angle_deg: percentage / 100.0 * SWEEP_DEG + START_ANGLE_DEG,
        severity: Severity::from_percentage(percentage),
    }
}

/// Evenly spaced tick values `i * max / count` for `i` in `0..=count`
pub fn ticks(max: f64, count: usize) -> Vec<f64> {
    if count == 0 {
        return vec![0.0];
    }

    let step = max / count as f64;
    (0..=count).map(|i| i as f64 * step).collect()
}

/// Ticks of a kPa range expressed in a display unit
pub fn display_ticks(max_kpa: f64, unit: PressureUnit, count: usize) -> Vec<f64> {
    ticks(max_kpa, count)
        .into_iter()
        .map(|tick| convert(tick, PressureUnit::BASE.symbol(), unit.symbol(), None))
        .collect()
}
