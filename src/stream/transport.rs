/// Transport seam between the connection manager and the network
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::debug;
use std::future::Future;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::error::{MonitorError, Result};

/// Opens transports to the stream endpoint.
/// Cloned into each handshake so the attempt can run as an owned future.
pub trait Connector: Clone + Send + Sync + 'static {
    type Transport: Transport;

    fn connect(&self, url: &Url) -> impl Future<Output = Result<Self::Transport>> + Send;
}

/// An open, message-oriented connection, used as independent halves so a
/// slow write never holds up reads
pub trait Transport: Send + 'static {
    type Sink: FrameSink;
    type Source: FrameSource;

    fn split(self) -> (Self::Sink, Self::Source);
}

/// Outgoing half
pub trait FrameSink: Send + 'static {
    fn send_text(&mut self, text: String) -> impl Future<Output = Result<()>> + Send;

    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// Incoming half
pub trait FrameSource: Send + 'static {
    /// Next text payload. `None` means the peer closed the connection.
    fn next_text(&mut self) -> impl Future<Output = Option<Result<String>>> + Send;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket connector backed by tokio-tungstenite, for ws:// and wss://
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

pub struct WsTransport {
    stream: WsStream,
}

pub struct WsSink {
    sink: SplitSink<WsStream, Message>,
}

pub struct WsSource {
    stream: SplitStream<WsStream>,
}

impl Connector for WsConnector {
    type Transport = WsTransport;

    async fn connect(&self, url: &Url) -> Result<WsTransport> {
        let (stream, response) = connect_async(url.as_str()).await?;
        debug!("WebSocket handshake completed with status {}", response.status());
        Ok(WsTransport { stream })
    }
}

impl Transport for WsTransport {
    type Sink = WsSink;
    type Source = WsSource;

    fn split(self) -> (WsSink, WsSource) {
        let (sink, stream) = self.stream.split();
        (WsSink { sink }, WsSource { stream })
    }
}

impl FrameSink for WsSink {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.sink.send(Message::Text(text)).await?;
        Ok(())
    }

    async fn close(&mut self) {
        if let Err(e) = self.sink.close().await {
            debug!("Error while closing WebSocket: {}", e);
        }
    }
}

impl FrameSource for WsSource {
    async fn next_text(&mut self) -> Option<Result<String>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => debug!("Ignoring non UTF-8 binary frame"),
                },
                Ok(Message::Close(frame)) => {
                    debug!("Peer sent close frame: {:?}", frame);
                    return None;
                }
                // Ping/pong replies are handled inside tungstenite
                Ok(_) => continue,
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}

/// Transport errors raised after the peer went away
pub(crate) fn is_closed(error: &MonitorError) -> bool {
    use tokio_tungstenite::tungstenite::Error as WsError;

    matches!(
        error,
        MonitorError::TransportClosed
            | MonitorError::Transport(WsError::ConnectionClosed | WsError::AlreadyClosed)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::error::UrlError;
    use tokio_tungstenite::tungstenite::Error as WsError;

    #[tokio::test]
    async fn wss_urls_reach_the_tls_handshake() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            drop(socket);
        });

        let url = Url::parse(&format!("wss://{}/api/realtime", addr)).unwrap();
        let error = WsConnector
            .connect(&url)
            .await
            .err()
            .expect("handshake against a dropped socket must fail");

        assert!(
            !matches!(
                error,
                MonitorError::Transport(WsError::Url(UrlError::TlsFeatureNotEnabled))
            ),
            "wss rejected before reaching TLS: {error}"
        );
        server.await.unwrap();
    }

    #[test]
    fn peer_close_errors_are_orderly() {
        assert!(is_closed(&MonitorError::TransportClosed));
        assert!(is_closed(&MonitorError::Transport(WsError::ConnectionClosed)));
        assert!(!is_closed(&MonitorError::Transport(WsError::Io(
            std::io::Error::from(std::io::ErrorKind::ConnectionReset)
        ))));
    }
}
