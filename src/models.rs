use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// Sensor type carried in the `type` field of every inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Pressure,
    Temperature,
}

impl SensorKind {
    pub const ALL: [SensorKind; 2] = [SensorKind::Pressure, SensorKind::Temperature];

    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Pressure => "pressure",
            SensorKind::Temperature => "temperature",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Smoothing variants computed upstream by the device/server.
/// Stored and forwarded as-is, never recomputed here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilteredValues {
    pub ema: f64,
    pub median: f64,
    pub median_ema: f64,
}

/// One decoded reading from the sensor stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    #[serde(rename = "type")]
    pub kind: SensorKind,
    pub value: f64,
    pub raw: f64,
    pub filtered: FilteredValues,
    pub unit: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Lifecycle state of the stream connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    Connecting,
    Connected,
    #[default]
    Disconnected,
    Error,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Error => "error",
        }
    }

    /// True while a transport is open or being opened
    pub fn is_active(&self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Control messages sent to the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundMessage {
    /// Keep-alive ping sent while connected
    Ping,
}
