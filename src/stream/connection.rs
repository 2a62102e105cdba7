/// Persistent sensor stream connection
///
/// A single worker task owns the read half of the transport, the in-flight
/// handshake, the heartbeat interval and the reconnect timer. Every suspension
/// point is a branch of one `select!` loop, so teardown drops all of them
/// together and nothing can fire against a stopped manager.
///
/// Writes go through a bounded outbox to a writer task per connection, so a
/// stalled send never holds up inbound frames or cancellation. Writer tasks
/// live in a `JoinSet` owned by the worker and close their half within
/// `CLOSE_TIMEOUT` once retired.
///
/// State cycle: `disconnected -> connecting -> connected -> disconnected`,
/// with `error` reachable from `connecting` (handshake failure) and
/// `connected` (transport or heartbeat failure). Both `disconnected` and
/// `error` schedule one reconnect attempt after a fixed delay.
use futures_util::future::BoxFuture;
use log::{debug, error, info, warn};
use std::future::pending;
use std::pin::Pin;
use time::OffsetDateTime;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::{
    interval_at, sleep, timeout, Duration, Instant, Interval, MissedTickBehavior, Sleep,
};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Result;
use crate::models::{ConnectionState, OutboundMessage, SensorKind, SensorReading};
use crate::store::SensorChannelStore;
use crate::stream::decoder::{decode_sensor_message, encode_outbound};
use crate::stream::transport::{is_closed, Connector, FrameSink, FrameSource, Transport};
use crate::utils::HistoryStats;

/// Fixed delay before each reconnect attempt (no backoff)
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Period of the keep-alive ping while connected
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Upper bound on closing a retired transport
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Outgoing messages queued per connection before heartbeats are skipped
const OUTBOX_CAPACITY: usize = 1;

/// Observable connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    /// Wall-clock time the current or most recent connection was established
    pub connected_at: Option<OffsetDateTime>,
}

enum Command {
    Connect,
}

/// Handle to the running connection worker.
///
/// Read accessors are cheap snapshots of state published by the worker.
/// Dropping the handle cancels the worker; `stop` additionally waits for
/// teardown to finish.
pub struct ConnectionManager {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<ConnectionStatus>,
    store: watch::Receiver<SensorChannelStore>,
    cancel: CancellationToken,
    worker: Option<JoinHandle<()>>,
}

impl ConnectionManager {
    /// Spawn the worker and begin connecting to `url` immediately.
    /// Must be called from within a tokio runtime.
    pub fn start<C: Connector>(url: Url, connector: C) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::default());
        let (store_tx, store_rx) = watch::channel(SensorChannelStore::new());
        let cancel = CancellationToken::new();

        let worker = ConnectionWorker {
            url,
            connector,
            commands: command_rx,
            status: status_tx,
            store: store_tx,
            cancel: cancel.clone(),
            handshake: None,
            source: None,
            link: None,
            writers: JoinSet::new(),
            generation: 0,
            heartbeat: None,
            reconnect: None,
        };
        let handle = tokio::spawn(worker.run());

        Self {
            commands: command_tx,
            status: status_rx,
            store: store_rx,
            cancel,
            worker: Some(handle),
        }
    }

    /// Request a connection. Ignored while already connecting or connected;
    /// otherwise any pending reconnect timer is replaced by an immediate attempt.
    pub fn connect(&self) {
        if self.commands.send(Command::Connect).is_err() {
            warn!("Connect requested after the connection manager stopped");
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.status.borrow().state
    }

    pub fn connected_at(&self) -> Option<OffsetDateTime> {
        self.status.borrow().connected_at
    }

    pub fn latest(&self, kind: SensorKind) -> Option<SensorReading> {
        self.store.borrow().latest(kind).cloned()
    }

    pub fn history(&self, kind: SensorKind) -> Vec<SensorReading> {
        self.store.borrow().history(kind)
    }

    pub fn stats(&self, kind: SensorKind) -> Option<HistoryStats> {
        self.store.borrow().stats(kind)
    }

    pub fn last_update(&self) -> Option<OffsetDateTime> {
        self.store.borrow().last_update()
    }

    /// Receiver notified on every state transition
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Receiver notified on every recorded reading
    pub fn subscribe_store(&self) -> watch::Receiver<SensorChannelStore> {
        self.store.clone()
    }

    /// Cancel timers, close the transport and wait for the worker to exit
    pub async fn stop(&mut self) {
        self.cancel.cancel();

        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                error!("Connection worker failed to join: {}", e);
            }
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

type SourceOf<C> = <<C as Connector>::Transport as Transport>::Source;

/// Write side of the current connection
struct Link {
    generation: u64,
    outbox: mpsc::Sender<String>,
    retire: CancellationToken,
}

struct ConnectionWorker<C: Connector> {
    url: Url,
    connector: C,
    commands: mpsc::UnboundedReceiver<Command>,
    status: watch::Sender<ConnectionStatus>,
    store: watch::Sender<SensorChannelStore>,
    cancel: CancellationToken,
    handshake: Option<BoxFuture<'static, Result<C::Transport>>>,
    source: Option<SourceOf<C>>,
    link: Option<Link>,
    writers: JoinSet<(u64, Result<()>)>,
    generation: u64,
    heartbeat: Option<Interval>,
    reconnect: Option<Pin<Box<Sleep>>>,
}

impl<C: Connector> ConnectionWorker<C> {
    async fn run(mut self) {
        info!("Starting sensor stream connection to {}", self.url);
        self.begin_connect();

        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break,
                command = self.commands.recv() => match command {
                    Some(Command::Connect) => self.begin_connect(),
                    None => break,
                },
                outcome = handshake_outcome(&mut self.handshake) => self.on_handshake(outcome),
                Some(joined) = self.writers.join_next() => self.on_writer_exit(joined),
                frame = next_frame(&mut self.source) => self.on_frame(frame),
                _ = heartbeat_due(&mut self.heartbeat) => self.send_heartbeat(),
                _ = reconnect_due(&mut self.reconnect) => {
                    self.reconnect = None;
                    info!("Attempting to reconnect to {}", self.url);
                    self.begin_connect();
                }
            }
        }

        self.teardown().await;
    }

    fn state(&self) -> ConnectionState {
        self.status.borrow().state
    }

    fn set_state(&self, state: ConnectionState) {
        self.status.send_modify(|status| status.state = state);
    }

    fn begin_connect(&mut self) {
        let state = self.state();
        if state.is_active() {
            debug!("Connect request ignored, connection already {}", state);
            return;
        }

        self.reconnect = None;
        self.set_state(ConnectionState::Connecting);

        let connector = self.connector.clone();
        let url = self.url.clone();
        self.handshake = Some(Box::pin(async move { connector.connect(&url).await }));
    }

    fn on_handshake(&mut self, outcome: Result<C::Transport>) {
        self.handshake = None;

        match outcome {
            Ok(transport) => {
                let (sink, source) = transport.split();

                self.generation += 1;
                let (outbox, queued) = mpsc::channel(OUTBOX_CAPACITY);
                let retire = self.cancel.child_token();
                self.writers
                    .spawn(write_loop(self.generation, sink, queued, retire.clone()));
                self.link = Some(Link {
                    generation: self.generation,
                    outbox,
                    retire,
                });
                self.source = Some(source);

                let mut heartbeat =
                    interval_at(Instant::now() + HEARTBEAT_INTERVAL, HEARTBEAT_INTERVAL);
                heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
                self.heartbeat = Some(heartbeat);

                let now = OffsetDateTime::now_utc();
                self.status.send_modify(|status| {
                    status.state = ConnectionState::Connected;
                    status.connected_at = Some(now);
                });
                info!("Sensor stream connection established");
            }
            Err(e) => {
                error!("Failed to connect to {}: {}", self.url, e);
                self.set_state(ConnectionState::Error);
                self.schedule_reconnect();
            }
        }
    }

    fn on_frame(&mut self, frame: Option<Result<String>>) {
        match frame {
            Some(Ok(text)) => self.on_message(&text),
            Some(Err(e)) if is_closed(&e) => {
                info!("Sensor stream connection closed: {}", e);
                self.drop_transport(ConnectionState::Disconnected);
            }
            Some(Err(e)) => {
                error!("Sensor stream transport error: {}", e);
                self.drop_transport(ConnectionState::Error);
            }
            None => {
                info!("Sensor stream connection closed");
                self.drop_transport(ConnectionState::Disconnected);
            }
        }
    }

    /// Malformed payloads are dropped without touching connection state
    fn on_message(&mut self, text: &str) {
        let reading = match decode_sensor_message(text) {
            Ok(reading) => reading,
            Err(e) => {
                warn!("Dropping malformed sensor message: {}", e);
                return;
            }
        };

        match reading.kind {
            SensorKind::Pressure => {
                info!("Received pressure reading: {:.2} {}", reading.value, reading.unit)
            }
            SensorKind::Temperature => {
                info!("Received temperature reading: {:.1} {}", reading.value, reading.unit)
            }
        }

        self.store.send_modify(|store| store.record(reading));
    }

    /// Queue a keep-alive ping without waiting for it to be written
    fn send_heartbeat(&mut self) {
        let Some(link) = self.link.as_ref() else {
            return;
        };

        let ping = match encode_outbound(&OutboundMessage::Ping) {
            Ok(ping) => ping,
            Err(e) => {
                error!("Failed to encode heartbeat: {}", e);
                return;
            }
        };

        match link.outbox.try_send(ping) {
            Ok(()) => debug!("Heartbeat queued"),
            Err(TrySendError::Full(_)) => warn!("Previous heartbeat still in flight, skipping"),
            // The writer already exited; its result arrives through `writers`
            Err(TrySendError::Closed(_)) => debug!("Heartbeat dropped, writer has exited"),
        }
    }

    fn on_writer_exit(&mut self, joined: std::result::Result<(u64, Result<()>), JoinError>) {
        match joined {
            Ok((generation, Err(e))) if self.is_current(generation) => {
                error!("Heartbeat failed: {}", e);
                self.drop_transport(ConnectionState::Error);
            }
            Ok((_, Err(e))) => debug!("Retired writer ended with error: {}", e),
            Ok((_, Ok(()))) => {}
            Err(e) if e.is_cancelled() => {}
            Err(e) => error!("Writer task failed: {}", e),
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.link
            .as_ref()
            .is_some_and(|link| link.generation == generation)
    }

    /// Leave the connected state: stop the heartbeat, retire the writer
    /// (which closes the transport) and schedule the next attempt
    fn drop_transport(&mut self, next: ConnectionState) {
        self.release_link();
        self.set_state(next);
        self.schedule_reconnect();
    }

    fn release_link(&mut self) {
        self.heartbeat = None;
        self.source = None;
        if let Some(link) = self.link.take() {
            link.retire.cancel();
        }
    }

    fn schedule_reconnect(&mut self) {
        info!("Reconnecting in {} seconds", RECONNECT_DELAY.as_secs());
        self.reconnect = Some(Box::pin(sleep(RECONNECT_DELAY)));
    }

    async fn teardown(&mut self) {
        self.reconnect = None;
        self.handshake = None;
        self.release_link();

        // Writers are children of the cancel token and bound their own close
        while let Some(joined) = self.writers.join_next().await {
            if let Err(e) = joined {
                if !e.is_cancelled() {
                    error!("Writer task failed: {}", e);
                }
            }
        }

        self.set_state(ConnectionState::Disconnected);
        info!("Sensor stream connection shut down");
    }
}

/// Drain the outbox into the sink until retired or a send fails, then close
async fn write_loop<S: FrameSink>(
    generation: u64,
    mut sink: S,
    mut queued: mpsc::Receiver<String>,
    retire: CancellationToken,
) -> (u64, Result<()>) {
    let outcome = loop {
        let text = tokio::select! {
            biased;

            _ = retire.cancelled() => break Ok(()),
            text = queued.recv() => match text {
                Some(text) => text,
                None => break Ok(()),
            },
        };

        tokio::select! {
            biased;

            _ = retire.cancelled() => break Ok(()),
            sent = sink.send_text(text) => {
                if let Err(e) = sent {
                    break Err(e);
                }
            }
        }
    };

    if timeout(CLOSE_TIMEOUT, sink.close()).await.is_err() {
        warn!("Timed out closing sensor stream transport");
    }

    (generation, outcome)
}

async fn handshake_outcome<T>(handshake: &mut Option<BoxFuture<'static, Result<T>>>) -> Result<T> {
    match handshake {
        Some(handshake) => handshake.await,
        None => pending().await,
    }
}

async fn next_frame<S: FrameSource>(source: &mut Option<S>) -> Option<Result<String>> {
    match source {
        Some(source) => source.next_text().await,
        None => pending().await,
    }
}

async fn heartbeat_due(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(heartbeat) => {
            heartbeat.tick().await;
        }
        None => pending().await,
    }
}

async fn reconnect_due(reconnect: &mut Option<Pin<Box<Sleep>>>) {
    match reconnect {
        Some(delay) => delay.as_mut().await,
        None => pending().await,
    }
}
