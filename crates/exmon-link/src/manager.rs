//! Connection supervisor.
//!
//! `ConnectionManager::start` spawns one supervisor task that walks the
//! state machine
//!
//! ```text
//! Idle -> Connecting -> Open -> Closed -> (retry delay) -> Connecting -> ...
//!                                       \-> Stopped (on stop)
//! ```
//!
//! Every termination (clean close, abrupt close, stream error, failed
//! handshake) takes the same path: the connection is dropped, the observer
//! hears `false`, and the next attempt is armed after the retry delay. The
//! retry timer only starts once the previous connection is fully gone, so
//! there is never more than one attempt in flight.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::endpoint::Endpoint;
use crate::error::TransportError;
use crate::observer::ConnectionObserver;
use crate::retry::{RetryPolicy, is_quiet_failure};
use crate::transport::{CloseInfo, Connector, Frame, FrameStream, WsConnector};

/// Upper bound on waiting for the peer to drop the socket after a close
/// frame.
const CLOSE_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(2);

/// Lifecycle state of the supervised link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Supervisor spawned, no attempt made yet.
    Idle,
    Connecting,
    Open,
    /// Last connection terminated; waiting out the retry delay.
    Closed,
    /// Supervisor shut down via [`ConnectionHandle::stop`] or drop.
    Stopped,
}

/// How a single connection ended.
#[derive(Debug)]
enum Termination {
    /// Handshake never completed.
    Failed(TransportError),
    /// Peer sent a close frame.
    Clean(Option<CloseInfo>),
    /// Stream errored or ended without a close frame.
    Abrupt(Option<TransportError>),
    Cancelled,
}

/// Builds and starts the connection supervisor.
pub struct ConnectionManager<C = WsConnector> {
    connector: C,
    retry: RetryPolicy,
}

impl ConnectionManager<WsConnector> {
    pub fn new() -> Self {
        Self::with_connector(WsConnector)
    }
}

impl Default for ConnectionManager<WsConnector> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connector> ConnectionManager<C> {
    pub fn with_connector(connector: C) -> Self {
        Self {
            connector,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Spawn the supervisor for `endpoint` and return immediately.
    ///
    /// `observer` is held for the supervisor's whole lifetime: every
    /// connection, including every reconnect, reports to it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<O: ConnectionObserver>(self, endpoint: Endpoint, observer: O) -> ConnectionHandle {
        let cancel = CancellationToken::new();
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Idle);
        let attempts = Arc::new(AtomicU32::new(0));

        let supervisor = Supervisor {
            connector: self.connector,
            retry: self.retry,
            endpoint,
            observer,
            status_tx,
            attempts: Arc::clone(&attempts),
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(supervisor.run());

        ConnectionHandle {
            cancel,
            status_rx,
            attempts,
            task: Some(task),
        }
    }
}

/// Control handle for a running supervisor. Dropping it cancels the
/// supervisor; [`stop`](Self::stop) also waits for it to exit.
pub struct ConnectionHandle {
    cancel: CancellationToken,
    status_rx: watch::Receiver<ConnectionStatus>,
    attempts: Arc<AtomicU32>,
    task: Option<JoinHandle<()>>,
}

impl ConnectionHandle {
    pub fn status(&self) -> ConnectionStatus {
        *self.status_rx.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_rx.clone()
    }

    /// Number of connection attempts made so far, the first one included.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Cancel the supervisor and wait until it has exited. An open
    /// connection is dropped and reported as `false` first.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("link: supervisor task failed: {e}");
            }
        }
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Supervisor<C, O> {
    connector: C,
    retry: RetryPolicy,
    endpoint: Endpoint,
    observer: O,
    status_tx: watch::Sender<ConnectionStatus>,
    attempts: Arc<AtomicU32>,
    cancel: CancellationToken,
}

impl<C: Connector, O: ConnectionObserver> Supervisor<C, O> {
    async fn run(self) {
        let mut consecutive_failures: u32 = 0;

        loop {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            self.status_tx.send_replace(ConnectionStatus::Connecting);
            tracing::debug!(url = %self.endpoint, attempt, "link: connecting");

            let connected = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                result = self.connector.connect(&self.endpoint) => Some(result),
            };
            let Some(result) = connected else {
                break;
            };

            let termination = match result {
                Ok(frames) => {
                    consecutive_failures = 0;
                    self.status_tx.send_replace(ConnectionStatus::Open);
                    tracing::info!(url = %self.endpoint, attempt, "link: connection opened");
                    self.observer.on_connectivity_change(true);
                    self.pump(frames).await
                }
                Err(e) => {
                    consecutive_failures = consecutive_failures.saturating_add(1);
                    Termination::Failed(e)
                }
            };

            self.status_tx.send_replace(ConnectionStatus::Closed);
            self.observer.on_connectivity_change(false);

            if let Termination::Cancelled = termination {
                tracing::info!(url = %self.endpoint, "link: connection dropped on stop");
                break;
            }
            self.log_termination(&termination, consecutive_failures);

            let delay = self.retry.delay();
            tracing::info!(
                url = %self.endpoint,
                retry_in_secs = delay.as_secs_f64(),
                attempt,
                "link: reconnect scheduled"
            );
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.status_tx.send_replace(ConnectionStatus::Stopped);
        tracing::debug!(url = %self.endpoint, "link: supervisor stopped");
    }

    /// Forward frames from one connection until it terminates. The stream
    /// is dropped on return.
    async fn pump(&self, mut frames: FrameStream) -> Termination {
        loop {
            let frame = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Termination::Cancelled,
                frame = frames.next() => frame,
            };
            match frame {
                Some(Ok(Frame::Text(payload))) => self.observer.on_message(&payload),
                Some(Ok(Frame::Close(info))) => return self.finish_close(&mut frames, info).await,
                Some(Err(e)) => return Termination::Abrupt(Some(e)),
                None => return Termination::Abrupt(None),
            }
        }
    }

    /// Peer sent a close frame. Keep polling so the transport can flush its
    /// reply and complete the closing handshake, then report a clean close.
    /// Frames arriving after the close frame are discarded.
    async fn finish_close(&self, frames: &mut FrameStream, info: Option<CloseInfo>) -> Termination {
        let drain = async {
            while let Some(frame) = frames.next().await {
                if let Err(e) = frame {
                    tracing::debug!(url = %self.endpoint, "link: error after close frame: {e}");
                    break;
                }
            }
        };
        let drained = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Termination::Cancelled,
            drained = tokio::time::timeout(CLOSE_HANDSHAKE_TIMEOUT, drain) => drained,
        };
        if drained.is_err() {
            tracing::debug!(
                url = %self.endpoint,
                timeout_secs = CLOSE_HANDSHAKE_TIMEOUT.as_secs(),
                "link: peer kept the socket open after close handshake"
            );
        }
        Termination::Clean(info)
    }

    fn log_termination(&self, termination: &Termination, consecutive_failures: u32) {
        let url = &self.endpoint;
        match termination {
            Termination::Clean(Some(info)) => tracing::info!(
                url = %url,
                code = info.code,
                reason = %info.reason,
                "link: connection closed cleanly"
            ),
            Termination::Clean(None) => {
                tracing::info!(url = %url, "link: connection closed cleanly")
            }
            Termination::Abrupt(Some(e)) => {
                tracing::warn!(url = %url, "link: connection abruptly closed: {e}")
            }
            Termination::Abrupt(None) => {
                tracing::warn!(url = %url, "link: connection abruptly closed")
            }
            Termination::Failed(e) if is_quiet_failure(consecutive_failures) => {
                tracing::debug!(url = %url, consecutive_failures, "link: connect failed: {e}")
            }
            Termination::Failed(e) => {
                tracing::warn!(url = %url, consecutive_failures, "link: connect failed: {e}")
            }
            Termination::Cancelled => {}
        }
    }
}
