pub mod connection;
pub mod decoder;
pub mod transport;

pub use connection::{
    ConnectionManager, ConnectionStatus, CLOSE_TIMEOUT, HEARTBEAT_INTERVAL, RECONNECT_DELAY,
};
pub use decoder::decode_sensor_message;
pub use transport::{
    Connector, FrameSink, FrameSource, Transport, WsConnector, WsSink, WsSource, WsTransport,
};
