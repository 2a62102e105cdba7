/// Utility functions for data processing and formatting
use time::{format_description, OffsetDateTime};

use crate::models::SensorReading;

/// Summary of the values held in a rolling window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub samples: usize,
}

/// Render a timestamp as `DD.MM.YYYY - HH:MM:SS` for the summary log.
/// Uses the `Display` form of the timestamp when the pattern cannot be applied.
pub fn format_datetime(dt: &OffsetDateTime) -> String {
    match format_description::parse("[day].[month].[year] - [hour]:[minute]:[second]") {
        Ok(format) => dt.format(&format).unwrap_or_else(|_| dt.to_string()),
        Err(_) => dt.to_string(),
    }
}

/// Calculate min, max and mean of the primary value across readings
///
/// Returns None for an empty window so callers can tell "no data yet"
/// apart from a window of zeros.
pub fn calculate_stats<'a, I>(readings: I) -> Option<HistoryStats>
where
    I: IntoIterator<Item = &'a SensorReading>,
{
    let mut stats: Option<HistoryStats> = None;
    let mut sum = 0.0;

    for reading in readings {
        let value = reading.value;
        sum += value;
        stats = Some(match stats {
            None => HistoryStats {
                min: value,
                max: value,
                mean: value,
                samples: 1,
            },
            Some(prev) => HistoryStats {
                min: prev.min.min(value),
                max: prev.max.max(value),
                mean: 0.0,
                samples: prev.samples + 1,
            },
        });
    }

    stats.map(|s| HistoryStats {
        mean: sum / s.samples as f64,
        ..s
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FilteredValues, SensorKind};
    use time::macros::datetime;

    fn reading(value: f64) -> SensorReading {
        SensorReading {
            kind: SensorKind::Temperature,
            value,
            raw: value,
            filtered: FilteredValues {
                ema: value,
                median: value,
                median_ema: value,
            },
            unit: "°C".to_string(),
            timestamp: datetime!(2024-05-01 12:00:00 UTC),
        }
    }

    #[test]
    fn stats_over_window() {
        let window = vec![reading(21.0), reading(23.0), reading(25.0)];
        let stats = calculate_stats(&window).unwrap();

        assert_eq!(stats.min, 21.0);
        assert_eq!(stats.max, 25.0);
        assert_eq!(stats.mean, 23.0);
        assert_eq!(stats.samples, 3);
    }

    #[test]
    fn empty_window_has_no_stats() {
        let window: Vec<SensorReading> = Vec::new();
        assert!(calculate_stats(&window).is_none());
    }

    #[test]
    fn formats_datetime() {
        let dt = datetime!(2024-05-01 08:09:10 UTC);
        assert_eq!(format_datetime(&dt), "01.05.2024 - 08:09:10");
    }
}
