/// Pressure unit conversion through the kPa base unit
///
/// All arithmetic is plain `f64` with no rounding. Formatting for display is
/// left to the consumer so repeated conversions never compound rounding error.
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::MonitorError;

/// Gauge range used when a unit has no dedicated default
const DEFAULT_RANGE_KPA: f64 = 200.0;

/// Supported pressure units, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PressureUnit {
    KPa,
    Bar,
    Psi,
    MmHg,
    InH2O,
    KgfCm2,
}

impl PressureUnit {
    pub const BASE: PressureUnit = PressureUnit::KPa;

    pub const ALL: [PressureUnit; 6] = [
        PressureUnit::KPa,
        PressureUnit::Bar,
        PressureUnit::Psi,
        PressureUnit::MmHg,
        PressureUnit::InH2O,
        PressureUnit::KgfCm2,
    ];

    /// Multiplier from kPa to this unit
    pub const fn factor(&self) -> f64 {
        match self {
            PressureUnit::KPa => 1.0,
            PressureUnit::Bar => 0.01,
            PressureUnit::Psi => 0.145038,
            PressureUnit::MmHg => 7.50062,
            PressureUnit::InH2O => 4.01463,
            PressureUnit::KgfCm2 => 0.0101972,
        }
    }

    /// Wire/config symbol
    pub const fn symbol(&self) -> &'static str {
        match self {
            PressureUnit::KPa => "kPa",
            PressureUnit::Bar => "bar",
            PressureUnit::Psi => "psi",
            PressureUnit::MmHg => "mmHg",
            PressureUnit::InH2O => "inH2O",
            PressureUnit::KgfCm2 => "kgf/cm2",
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            PressureUnit::KgfCm2 => "kgf/cm²",
            other => other.symbol(),
        }
    }

    pub const fn long_name(&self) -> &'static str {
        match self {
            PressureUnit::KPa => "kilopascal",
            PressureUnit::Bar => "bar",
            PressureUnit::Psi => "pound-force per square inch",
            PressureUnit::MmHg => "millimetre of mercury",
            PressureUnit::InH2O => "inch of water column",
            PressureUnit::KgfCm2 => "kilogram-force per square centimetre",
        }
    }

    /// Full-scale value a gauge shows by default in this unit
    pub const fn default_range(&self) -> f64 {
        match self {
            PressureUnit::KPa => 200.0,
            PressureUnit::Bar => 2.0,
            PressureUnit::Psi => 30.0,
            PressureUnit::MmHg => 1500.0,
            PressureUnit::InH2O => 800.0,
            PressureUnit::KgfCm2 => 2.0,
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<PressureUnit> {
        PressureUnit::ALL
            .into_iter()
            .find(|unit| unit.symbol() == symbol)
    }
}

impl fmt::Display for PressureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for PressureUnit {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PressureUnit::from_symbol(s.trim())
            .ok_or_else(|| MonitorError::Config(format!("unknown pressure unit '{}'", s)))
    }
}

/// Magnitude prefix applied to an input value before conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    Kilo,
    Mega,
    Giga,
}

impl Prefix {
    pub const fn multiplier(&self) -> f64 {
        match self {
            Prefix::Kilo => 1e3,
            Prefix::Mega => 1e6,
            Prefix::Giga => 1e9,
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Prefix> {
        match symbol {
            "k" => Some(Prefix::Kilo),
            "M" => Some(Prefix::Mega),
            "G" => Some(Prefix::Giga),
            _ => None,
        }
    }
}

/// Scale applied to the input for an optional prefix.
///
/// Prefixes are magnitudes of the pascal, and the base unit already carries
/// the kilo, so `k` is neutral, `M` scales by 10^3 and `G` by 10^6.
/// No prefix means the value is already at the unit's own scale.
pub fn prefix_multiplier(prefix: Option<Prefix>) -> f64 {
    match prefix {
        Some(prefix) => prefix.multiplier() / Prefix::Kilo.multiplier(),
        None => 1.0,
    }
}

/// Factor for a unit symbol; unrecognized symbols map to 1.0
pub fn conversion_factor(symbol: &str) -> f64 {
    PressureUnit::from_symbol(symbol)
        .map(|unit| unit.factor())
        .unwrap_or(1.0)
}

/// Normalize a value into the base unit
pub fn to_base(value: f64, from_unit: &str, prefix: Option<Prefix>) -> f64 {
    let scaled = value * prefix_multiplier(prefix);
    if from_unit == PressureUnit::BASE.symbol() {
        scaled
    } else {
        scaled / conversion_factor(from_unit)
    }
}

/// Convert `value` between two unit symbols.
///
/// Unknown units behave as the identity factor instead of failing.
pub fn convert(value: f64, from_unit: &str, to_unit: &str, prefix: Option<Prefix>) -> f64 {
    to_base(value, from_unit, prefix) * conversion_factor(to_unit)
}

/// Express a value in every supported unit at once.
/// The kPa entry is exactly the normalized base value.
pub fn compute_all(
    value: f64,
    from_unit: &str,
    prefix: Option<Prefix>,
) -> BTreeMap<PressureUnit, f64> {
    let base = to_base(value, from_unit, prefix);

    PressureUnit::ALL
        .into_iter()
        .map(|unit| {
            let converted = if unit == PressureUnit::BASE {
                base
            } else {
                base * unit.factor()
            };
            (unit, converted)
        })
        .collect()
}

/// Default gauge range for a unit symbol, falling back to the kPa range
pub fn range_for_unit(symbol: &str) -> f64 {
    PressureUnit::from_symbol(symbol)
        .map(|unit| unit.default_range())
        .unwrap_or(DEFAULT_RANGE_KPA)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        let tolerance = 1e-9 * expected.abs().max(1.0);
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn round_trip_through_every_unit() {
        for unit in PressureUnit::ALL {
            for x in [0.0, 1.0, 101.325, 125.7, 9999.5] {
                let there = convert(x, "kPa", unit.symbol(), None);
                let back = convert(there, unit.symbol(), "kPa", None);
                assert_close(back, x);
            }
        }
    }

    #[test]
    fn compute_all_matches_table_factors() {
        let all = compute_all(100.0, "kPa", Some(Prefix::Kilo));

        assert_eq!(all.len(), 6);
        assert_eq!(all[&PressureUnit::KPa], 100.0);
        assert_close(all[&PressureUnit::Bar], 1.0);
        assert_close(all[&PressureUnit::Psi], 14.5038);
        assert_close(all[&PressureUnit::MmHg], 750.062);
        assert_close(all[&PressureUnit::InH2O], 401.463);
        assert_close(all[&PressureUnit::KgfCm2], 1.01972);
    }

    #[test]
    fn compute_all_base_entry_is_exact_normalized_value() {
        let all = compute_all(14.5038, "psi", None);
        assert_eq!(all[&PressureUnit::KPa], to_base(14.5038, "psi", None));
    }

    #[test]
    fn unknown_units_are_identity() {
        assert_eq!(convert(42.0, "furlongs", "kPa", None), 42.0);
        assert_eq!(convert(42.0, "kPa", "furlongs", None), 42.0);
        assert_eq!(conversion_factor("°C"), 1.0);
    }

    #[test]
    fn larger_prefixes_scale_the_input() {
        assert_close(convert(1.0, "kPa", "kPa", Some(Prefix::Mega)), 1e3);
        assert_close(convert(1.0, "kPa", "bar", Some(Prefix::Giga)), 1e4);
        assert_eq!(prefix_multiplier(Some(Prefix::Kilo)), 1.0);
    }

    #[test]
    fn parses_unit_symbols() {
        assert_eq!("kgf/cm2".parse::<PressureUnit>().unwrap(), PressureUnit::KgfCm2);
        assert_eq!(" psi ".parse::<PressureUnit>().unwrap(), PressureUnit::Psi);
        assert!("PSI".parse::<PressureUnit>().is_err());
        assert_eq!(Prefix::from_symbol("M"), Some(Prefix::Mega));
        assert_eq!(Prefix::from_symbol("m"), None);
    }

    #[test]
    fn default_ranges_per_unit() {
        assert_eq!(range_for_unit("psi"), 30.0);
        assert_eq!(range_for_unit("mmHg"), 1500.0);
        assert_eq!(range_for_unit("unknown"), 200.0);
        assert_eq!(PressureUnit::KgfCm2.label(), "kgf/cm²");
    }
}
