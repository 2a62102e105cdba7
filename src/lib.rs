//! Ingestion and normalization core for a pressure/temperature sensor stream.
//!
//! [`ConnectionManager`] keeps a WebSocket connection to the sensor service
//! alive and records decoded readings into a [`SensorChannelStore`].
//! The [`display`] module turns stored values into multi-unit and gauge
//! quantities for presentation layers.

pub mod config;
pub mod display;
pub mod error;
pub mod models;
pub mod store;
pub mod stream;
pub mod utils;

pub use config::MonitorConfig;
pub use error::{MonitorError, Result};
pub use models::{ConnectionState, FilteredValues, SensorKind, SensorReading};
pub use store::{SensorChannelStore, HISTORY_WINDOW};
pub use stream::{ConnectionManager, ConnectionStatus, WsConnector};
