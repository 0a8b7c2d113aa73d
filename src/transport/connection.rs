//! WebSocket connection and event loop.
//!
//! A [`Connection`] wraps the socket the extension background page opened
//! to us. Host API calls go out as [`Request`]s and come back as
//! [`Response`]s matched by request ID. Host listener invocations arrive as
//! [`Event`]s and are handed to the registered [`EventHandler`].
//!
//! # Event Loop
//!
//! The spawned loop task owns the socket and `select!`s over:
//!
//! - incoming text frames (responses and events)
//! - outgoing requests from [`Connection::send`]
//! - shutdown and correlation cleanup

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::{from_str, to_string};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::RequestId;
use crate::protocol::{Event, Request, Response};

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for a host call.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum in-flight host calls before new ones are rejected.
const MAX_PENDING_REQUESTS: usize = 100;

/// Timeout for the READY handshake.
const READY_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Types
// ============================================================================

type CorrelationMap = FxHashMap<RequestId, oneshot::Sender<Result<Response>>>;

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;

/// Callback invoked for each event received from the extension.
///
/// Runs on the connection's loop task, so it must not block. Handlers
/// normally forward the event to a channel or spawn a task.
pub type EventHandler = Box<dyn Fn(Event) + Send + Sync>;

// ============================================================================
// ReadyData
// ============================================================================

/// Data carried by the READY handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadyData {
    /// Extension name as declared in its manifest.
    pub extension: String,
    /// Extension version.
    pub version: String,
}

// ============================================================================
// LoopCommand
// ============================================================================

enum LoopCommand {
    Send {
        request: Request,
        response_tx: oneshot::Sender<Result<Response>>,
    },
    Forget(RequestId),
    Shutdown,
}

// ============================================================================
// Connection
// ============================================================================

/// WebSocket connection to the extension background page.
///
/// Cheap to clone; clones share the same loop task. Dropping a clone does
/// not close the socket, call [`Connection::shutdown`] for that.
#[derive(Clone)]
pub struct Connection {
    command_tx: mpsc::UnboundedSender<LoopCommand>,
    correlation: Arc<Mutex<CorrelationMap>>,
    event_handler: Arc<Mutex<Option<EventHandler>>>,
    request_timeout: Duration,
    closed_rx: watch::Receiver<bool>,
}

impl Connection {
    /// Wraps an accepted WebSocket stream and spawns its loop task.
    pub(crate) fn new(ws_stream: WebSocketStream<TcpStream>) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let correlation = Arc::new(Mutex::new(CorrelationMap::default()));
        let event_handler: Arc<Mutex<Option<EventHandler>>> = Arc::new(Mutex::new(None));
        let (closed_tx, closed_rx) = watch::channel(false);

        tokio::spawn(Self::run_event_loop(
            ws_stream,
            command_rx,
            Arc::clone(&correlation),
            Arc::clone(&event_handler),
            closed_tx,
        ));

        Self {
            command_tx,
            correlation,
            event_handler,
            request_timeout: DEFAULT_COMMAND_TIMEOUT,
            closed_rx,
        }
    }

    /// Sets the timeout applied by [`Connection::send`].
    #[must_use]
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Waits for the READY message the extension sends after connecting.
    ///
    /// READY is correlated under the nil request ID.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if READY is not received in time
    /// - [`Error::ConnectionClosed`] if the socket closes first
    pub async fn wait_ready(&self) -> Result<ReadyData> {
        let (tx, rx) = oneshot::channel();
        self.correlation.lock().insert(RequestId::ready(), tx);

        let response = timeout(READY_TIMEOUT, rx)
            .await
            .map_err(|_| Error::connection_timeout(READY_TIMEOUT.as_millis() as u64))??;
        let response = response?;

        let ready = ReadyData {
            extension: response.get_string("extension"),
            version: response.get_string("version"),
        };

        debug!(extension = %ready.extension, version = %ready.version, "READY handshake completed");

        Ok(ready)
    }

    /// Registers the event callback, replacing any previous one.
    pub fn set_event_handler(&self, handler: EventHandler) {
        *self.event_handler.lock() = Some(handler);
    }

    /// Removes the event callback.
    pub fn clear_event_handler(&self) {
        *self.event_handler.lock() = None;
    }

    /// Sends a request and waits for its response with the configured timeout.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the loop task has stopped
    /// - [`Error::RequestTimeout`] if no response arrives in time
    /// - [`Error::Protocol`] if too many requests are in flight
    pub async fn send(&self, request: Request) -> Result<Response> {
        self.send_with_timeout(request, self.request_timeout).await
    }

    /// Sends a request and waits for its response.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::send`].
    pub async fn send_with_timeout(
        &self,
        request: Request,
        request_timeout: Duration,
    ) -> Result<Response> {
        let request_id = request.id;

        {
            let pending = self.correlation.lock().len();
            if pending >= MAX_PENDING_REQUESTS {
                warn!(pending, max = MAX_PENDING_REQUESTS, "Too many pending requests");
                return Err(Error::protocol(format!(
                    "Too many pending requests: {pending}/{MAX_PENDING_REQUESTS}"
                )));
            }
        }

        let (response_tx, response_rx) = oneshot::channel();

        self.command_tx
            .send(LoopCommand::Send {
                request,
                response_tx,
            })
            .map_err(|_| Error::ConnectionClosed)?;

        match timeout(request_timeout, response_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Err(_) => {
                let _ = self.command_tx.send(LoopCommand::Forget(request_id));
                Err(Error::request_timeout(
                    request_id,
                    request_timeout.as_millis() as u64,
                ))
            }
        }
    }

    /// Returns the number of in-flight requests.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.correlation.lock().len()
    }

    /// Closes the socket. Pending requests fail with [`Error::ConnectionClosed`].
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(LoopCommand::Shutdown);
    }

    /// Returns `true` once the loop task has stopped.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        *self.closed_rx.borrow()
    }

    /// Resolves when the loop task stops.
    pub async fn closed(&self) {
        let mut closed_rx = self.closed_rx.clone();
        // The sender is dropped with the loop task, which also means closed.
        let _ = closed_rx.wait_for(|closed| *closed).await;
    }

    async fn run_event_loop(
        ws_stream: WebSocketStream<TcpStream>,
        mut command_rx: mpsc::UnboundedReceiver<LoopCommand>,
        correlation: Arc<Mutex<CorrelationMap>>,
        event_handler: Arc<Mutex<Option<EventHandler>>>,
        closed_tx: watch::Sender<bool>,
    ) {
        let (mut ws_write, mut ws_read) = ws_stream.split();

        loop {
            tokio::select! {
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            Self::handle_incoming_message(&text, &correlation, &event_handler);
                        }
                        Some(Ok(Message::Close(_))) => {
                            debug!("WebSocket closed by extension");
                            break;
                        }
                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            break;
                        }
                        None => {
                            debug!("WebSocket stream ended");
                            break;
                        }
                        _ => {}
                    }
                }

                command = command_rx.recv() => {
                    match command {
                        Some(LoopCommand::Send { request, response_tx }) => {
                            Self::handle_send(request, response_tx, &mut ws_write, &correlation).await;
                        }
                        Some(LoopCommand::Forget(request_id)) => {
                            correlation.lock().remove(&request_id);
                            debug!(%request_id, "Removed timed-out correlation");
                        }
                        Some(LoopCommand::Shutdown) => {
                            debug!("Shutdown requested");
                            let _ = ws_write.close().await;
                            break;
                        }
                        None => {
                            debug!("All connection handles dropped");
                            break;
                        }
                    }
                }
            }
        }

        Self::fail_pending_requests(&correlation);
        let _ = closed_tx.send(true);
        debug!("Event loop terminated");
    }

    fn handle_incoming_message(
        text: &str,
        correlation: &Mutex<CorrelationMap>,
        event_handler: &Mutex<Option<EventHandler>>,
    ) {
        if let Ok(response) = from_str::<Response>(text) {
            match correlation.lock().remove(&response.id) {
                Some(tx) => {
                    let _ = tx.send(Ok(response));
                }
                None => warn!(id = %response.id, "Response for unknown request"),
            }
            return;
        }

        if let Ok(event) = from_str::<Event>(text) {
            trace!(method = %event.method, "Event received");
            if let Some(ref handler) = *event_handler.lock() {
                handler(event);
            }
            return;
        }

        warn!(text = %text, "Failed to parse incoming message");
    }

    async fn handle_send(
        request: Request,
        response_tx: oneshot::Sender<Result<Response>>,
        ws_write: &mut WsSink,
        correlation: &Mutex<CorrelationMap>,
    ) {
        let request_id = request.id;

        let json = match to_string(&request) {
            Ok(j) => j,
            Err(e) => {
                let _ = response_tx.send(Err(Error::Json(e)));
                return;
            }
        };

        correlation.lock().insert(request_id, response_tx);

        if let Err(e) = ws_write.send(Message::Text(json.into())).await
            && let Some(tx) = correlation.lock().remove(&request_id)
        {
            let _ = tx.send(Err(Error::connection(e.to_string())));
            return;
        }

        trace!(%request_id, method = request.method(), "Request sent");
    }

    fn fail_pending_requests(correlation: &Mutex<CorrelationMap>) {
        let pending: Vec<_> = correlation.lock().drain().collect();
        let count = pending.len();

        for (_, tx) in pending {
            let _ = tx.send(Err(Error::ConnectionClosed));
        }

        if count > 0 {
            debug!(count, "Failed pending requests on shutdown");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(DEFAULT_COMMAND_TIMEOUT.as_secs(), 30);
        assert_eq!(MAX_PENDING_REQUESTS, 100);
        assert_eq!(READY_TIMEOUT.as_secs(), 30);
    }

    #[test]
    fn test_incoming_response_resolves_correlation() {
        let correlation = Mutex::new(CorrelationMap::default());
        let handler: Mutex<Option<EventHandler>> = Mutex::new(None);

        let id = RequestId::generate();
        let (tx, mut rx) = oneshot::channel();
        correlation.lock().insert(id, tx);

        let text = format!(r#"{{"id": "{id}", "type": "success", "result": 3}}"#);
        Connection::handle_incoming_message(&text, &correlation, &handler);

        let response = rx.try_recv().expect("resolved").expect("ok");
        assert!(response.is_success());
        assert!(correlation.lock().is_empty());
    }

    #[test]
    fn test_incoming_event_reaches_handler() {
        let correlation = Mutex::new(CorrelationMap::default());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler: Mutex<Option<EventHandler>> = Mutex::new(Some(Box::new(move |event| {
            sink.lock().push(event.method);
        })));

        let text = r#"{"id": "550e8400-e29b-41d4-a716-446655440000", "type": "event",
                       "method": "commands.onCommand", "params": {"command": "group-all"}}"#;
        Connection::handle_incoming_message(text, &correlation, &handler);

        assert_eq!(seen.lock().as_slice(), ["commands.onCommand"]);
    }

    #[test]
    fn test_fail_pending_requests() {
        let correlation = Mutex::new(CorrelationMap::default());
        let (tx, mut rx) = oneshot::channel();
        correlation.lock().insert(RequestId::generate(), tx);

        Connection::fail_pending_requests(&correlation);

        let result = rx.try_recv().expect("resolved");
        assert!(matches!(result, Err(Error::ConnectionClosed)));
    }
}
