use std::{collections::VecDeque, net::SocketAddr, sync::Arc};

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use ts_types::SupervisorError;

use crate::record::LogRecord;

const DEFAULT_REPLAY_CAPACITY: usize = 100;
const SUBSCRIBER_CHANNEL_CAPACITY: usize = 256;
const STOP_JOIN_DEADLINE: std::time::Duration = std::time::Duration::from_secs(5);

/// `replay` and `subscribers` share one mutex so a backlog snapshot and
/// subscriber registration happen in a single critical section (spec §9:
/// "hold the endpoint mutex while snapshotting the buffer and registering
/// the subscriber"). Splitting them into two locks left a window where a
/// `broadcast` landing between the snapshot and the registration reached
/// neither the backlog the late subscriber saw nor its live channel.
struct State {
    replay: VecDeque<LogRecord>,
    subscribers: Vec<ts_integration::channel::UnboundedTx<LogRecord>>,
}

struct Shared {
    state: Mutex<State>,
    replay_capacity: usize,
}

impl Shared {
    fn broadcast(&self, record: LogRecord) {
        let mut state = self.state.lock();
        if state.replay.len() == self.replay_capacity {
            state.replay.pop_front();
        }
        state.replay.push_back(record.clone());
        state.subscribers.retain(|tx| tx.send(record.clone()).is_ok());
    }
}

/// Cheap, cloneable handle onto a [`LogStreamEndpoint`]'s broadcast side,
/// independent of the endpoint's own lifetime — [`crate::router::LogRouter`]
/// holds one of these rather than borrowing the endpoint directly, so a
/// worker can own both its `LogStreamEndpoint` (for `stop()`) and a
/// `LogRouter` sink that feeds it without a self-referential struct.
#[derive(Clone)]
pub struct LogStreamHandle {
    shared: Arc<Shared>,
}

impl LogStreamHandle {
    pub fn broadcast(&self, record: LogRecord) {
        self.shared.broadcast(record);
    }
}

/// One per-worker WebSocket log server. Binds `(host, port)`, accepts any
/// number of subscribers, replays its ring buffer to each on connect, then
/// forwards every subsequent [`Self::broadcast`] call. Every [`LogRecord`] is
/// one WebSocket text frame — the transport's own framing removes any need
/// for a line-delimited wire format.
pub struct LogStreamEndpoint {
    shared: Arc<Shared>,
    local_addr: SocketAddr,
    cancel: CancellationToken,
    accept_task: Option<JoinHandle<()>>,
}

impl LogStreamEndpoint {
    /// Binds immediately; `port = 0` asks the OS for a free port, resolved
    /// via `local_addr()` before this call returns so the caller can publish
    /// a concrete stream URL right away.
    pub async fn start(host: &str, port: u16) -> Result<Self, SupervisorError> {
        Self::start_with_capacity(host, port, DEFAULT_REPLAY_CAPACITY).await
    }

    pub async fn start_with_capacity(
        host: &str,
        port: u16,
        replay_capacity: usize,
    ) -> Result<Self, SupervisorError> {
        let listener = TcpListener::bind((host, port))
            .await
            .map_err(|e| SupervisorError::StreamStartupFailure {
                key: format!("{host}:{port}"),
                reason: e.to_string(),
            })?;
        let local_addr = listener.local_addr().map_err(|e| SupervisorError::StreamStartupFailure {
            key: format!("{host}:{port}"),
            reason: e.to_string(),
        })?;

        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                replay: VecDeque::with_capacity(replay_capacity),
                subscribers: Vec::new(),
            }),
            replay_capacity,
        });

        let cancel = CancellationToken::new();
        let accept_task = tokio::spawn(accept_loop(listener, shared.clone(), cancel.clone()));

        Ok(Self {
            shared,
            local_addr,
            cancel,
            accept_task: Some(accept_task),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.local_addr)
    }

    /// A cloneable handle that can outlive borrows of `self` and be moved
    /// into a [`crate::router::LogRouter`]'s sink list.
    pub fn handle(&self) -> LogStreamHandle {
        LogStreamHandle {
            shared: self.shared.clone(),
        }
    }

    /// Appends to the replay ring and fans the record out to every connected
    /// subscriber. A subscriber whose channel is full or closed is dropped
    /// silently — never allowed to block the producer or another subscriber.
    pub fn broadcast(&self, record: LogRecord) {
        self.shared.broadcast(record);
    }

    /// Cancels the accept loop and every subscriber write task, then waits
    /// up to a bounded deadline for the accept task to finish. Never blocks
    /// the caller indefinitely: past the deadline it logs a warning and
    /// detaches the task rather than awaiting it forever.
    pub async fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.accept_task.take() {
            if tokio::time::timeout(STOP_JOIN_DEADLINE, handle).await.is_err() {
                tracing::warn!(addr = %self.local_addr, "log stream accept task did not stop in time, detaching");
            }
        }
    }
}

async fn accept_loop(listener: TcpListener, shared: Arc<Shared>, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("log stream accept loop cancelled");
                return;
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((socket, peer)) => {
                        let shared = shared.clone();
                        let cancel = cancel.child_token();
                        tokio::spawn(async move {
                            if let Err(err) = serve_subscriber(socket, shared, cancel).await {
                                tracing::warn!(%peer, %err, "log stream subscriber closed with error");
                            }
                        });
                    }
                    Err(err) => {
                        tracing::warn!(%err, "log stream accept failure");
                    }
                }
            }
        }
    }
}

async fn serve_subscriber(
    socket: tokio::net::TcpStream,
    shared: Arc<Shared>,
    cancel: CancellationToken,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    let ws = tokio_tungstenite::accept_async(socket).await?;
    let (mut sink, mut source) = ws.split();

    let (tx, mut rx) = ts_integration::channel::mpsc_unbounded();
    let backlog: Vec<LogRecord> = {
        let mut state = shared.state.lock();
        state.subscribers.push(tx);
        state.replay.iter().cloned().collect()
    };

    for record in backlog {
        let Ok(json) = record.to_json() else { continue };
        if sink.send(Message::text(json)).await.is_err() {
            return Ok(());
        }
    }

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = sink.close().await;
                return Ok(());
            }
            incoming = source.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => return Ok(()),
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => return Err(err),
                }
            }
            next = rx.recv() => {
                let Some(record) = next else { return Ok(()) };
                let Ok(json) = record.to_json() else { continue };
                if sink.send(Message::text(json)).await.is_err() {
                    return Ok(());
                }
            }
        }
    }
}

// The subscriber channel's bounded fan-out capacity is reserved here for
// documentation purposes: `ts_integration::channel` is unbounded, so
// isolation against a slow subscriber is enforced by dropping the
// subscriber on send failure rather than by channel backpressure.
#[allow(dead_code)]
const _: usize = SUBSCRIBER_CHANNEL_CAPACITY;
