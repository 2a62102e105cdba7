/// Temperature classification bands in °C
use std::fmt;

/// Comfort band of an ambient temperature reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureBand {
    Cold,
    Normal,
    Comfortable,
    Warm,
    Hot,
}

impl TemperatureBand {
    pub fn classify(celsius: f64) -> TemperatureBand {
        if celsius < 18.0 {
            TemperatureBand::Cold
        } else if celsius < 22.0 {
            TemperatureBand::Normal
        } else if celsius < 26.0 {
            TemperatureBand::Comfortable
        } else if celsius < 30.0 {
            TemperatureBand::Warm
        } else {
            TemperatureBand::Hot
        }
    }
}

impl fmt::Display for TemperatureBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TemperatureBand::Cold => "cold",
            TemperatureBand::Normal => "normal",
            TemperatureBand::Comfortable => "comfortable",
            TemperatureBand::Warm => "warm",
            TemperatureBand::Hot => "hot",
        };
        f.write_str(name)
    }
}

/// Coarse tint bucket used for trend lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureTint {
    Cold,
    Warm,
    Hot,
}

impl TemperatureTint {
    pub fn classify(celsius: f64) -> TemperatureTint {
        if celsius < 20.0 {
            TemperatureTint::Cold
        } else if celsius > 26.0 {
            TemperatureTint::Hot
        } else {
            TemperatureTint::Warm
        }
    }
}
