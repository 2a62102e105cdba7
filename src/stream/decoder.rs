/// Wire format of the sensor stream
///
/// Inbound, one JSON object per reading:
/// - `type`: "pressure" | "temperature"
/// - `value`, `raw`: numbers in the sensor's native unit
/// - `filtered`: `{ ema, median, median_ema }` computed upstream
/// - `unit`: native unit label
/// - `timestamp`: ISO-8601 capture time assigned by the server
///
/// Outbound, only the keep-alive ping `{"type":"ping"}`.
use crate::error::Result;
use crate::models::{OutboundMessage, SensorReading};

/// Decode one inbound text frame into a typed reading
pub fn decode_sensor_message(text: &str) -> Result<SensorReading> {
    let reading: SensorReading = serde_json::from_str(text)?;
    Ok(reading)
}

pub fn encode_outbound(message: &OutboundMessage) -> Result<String> {
    Ok(serde_json::to_string(message)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MonitorError;
    use crate::models::SensorKind;
    use time::macros::datetime;

    const PRESSURE_FRAME: &str = r#"{
        "type": "pressure",
        "value": 125.7,
        "raw": 126.02,
        "filtered": { "ema": 125.5, "median": 125.6, "median_ema": 125.55 },
        "unit": "kPa",
        "timestamp": "2024-05-01T12:30:15.250Z"
    }"#;

    #[test]
    fn decodes_pressure_frame() {
        let reading = decode_sensor_message(PRESSURE_FRAME).unwrap();

        assert_eq!(reading.kind, SensorKind::Pressure);
        assert_eq!(reading.value, 125.7);
        assert_eq!(reading.raw, 126.02);
        assert_eq!(reading.filtered.median_ema, 125.55);
        assert_eq!(reading.unit, "kPa");
        assert_eq!(
            reading.timestamp,
            datetime!(2024-05-01 12:30:15.250 UTC)
        );
    }

    #[test]
    fn decodes_temperature_with_offset_timestamp() {
        let frame = r#"{"type":"temperature","value":23.4,"raw":23.41,
            "filtered":{"ema":23.3,"median":23.4,"median_ema":23.35},
            "unit":"°C","timestamp":"2024-05-01T14:30:15+02:00"}"#;
        let reading = decode_sensor_message(frame).unwrap();

        assert_eq!(reading.kind, SensorKind::Temperature);
        assert_eq!(reading.timestamp, datetime!(2024-05-01 12:30:15 UTC));
    }

    #[test]
    fn rejects_malformed_frames() {
        for frame in [
            "not json",
            r#"{"type":"pong"}"#,
            r#"{"type":"humidity","value":1,"raw":1,"filtered":{"ema":1,"median":1,"median_ema":1},"unit":"%","timestamp":"2024-05-01T12:00:00Z"}"#,
            r#"{"type":"pressure","value":"high","raw":1,"filtered":{"ema":1,"median":1,"median_ema":1},"unit":"kPa","timestamp":"2024-05-01T12:00:00Z"}"#,
            r#"{"type":"pressure","value":1,"raw":1,"filtered":{"ema":1,"median":1,"median_ema":1},"unit":"kPa","timestamp":"yesterday"}"#,
        ] {
            assert!(matches!(
                decode_sensor_message(frame),
                Err(MonitorError::Decode(_))
            ));
        }
    }

    #[test]
    fn encodes_ping() {
        assert_eq!(
            encode_outbound(&OutboundMessage::Ping).unwrap(),
            r#"{"type":"ping"}"#
        );
    }
}
