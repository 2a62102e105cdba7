use std::env;
use std::time::Duration;
use url::Url;

use crate::display::PressureUnit;
use crate::error::{MonitorError, Result};

pub const DEFAULT_STREAM_URL: &str = "ws://localhost:3000/api/realtime";
const DEFAULT_SUMMARY_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub stream_url: Url,
    pub display_unit: PressureUnit,
    pub summary_interval: Duration,
}

impl MonitorConfig {
    pub fn new() -> Result<Self> {
        // Load environment variables
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = lookup("SENSOR_STREAM_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_STREAM_URL.to_string());
        let stream_url = Url::parse(&raw_url)?;
        if !matches!(stream_url.scheme(), "ws" | "wss") {
            return Err(MonitorError::Config(format!(
                "SENSOR_STREAM_URL must use ws:// or wss://, got '{}'",
                stream_url
            )));
        }

        let display_unit = match lookup("DISPLAY_UNIT") {
            Some(unit) => unit.parse()?,
            None => PressureUnit::BASE,
        };

        let summary_secs = match lookup("SUMMARY_INTERVAL_SECS") {
            Some(secs) => secs.trim().parse::<u64>().map_err(|_| {
                MonitorError::Config(format!("SUMMARY_INTERVAL_SECS is not a number: '{}'", secs))
            })?,
            None => DEFAULT_SUMMARY_INTERVAL_SECS,
        };
        if summary_secs == 0 {
            return Err(MonitorError::Config(
                "SUMMARY_INTERVAL_SECS must be greater than zero".into(),
            ));
        }

        Ok(MonitorConfig {
            stream_url,
            display_unit,
            summary_interval: Duration::from_secs(summary_secs),
        })
    }
}
