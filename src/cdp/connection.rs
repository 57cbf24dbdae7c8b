//! CDP WebSocket connection implementation
//!
//! This module provides WebSocket-based connection to Chrome DevTools Protocol. The socket is
//! split: writes go through a locked sink, and a reader task owns the stream, routing responses
//! to pending commands and broadcasting events to subscribers.

use super::traits::{CdpConnection, CdpError as CdpErrorResponse, CdpEvent, CdpResponse};
use super::types::*;
use crate::Error;
use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type PendingMap = Arc<Mutex<HashMap<u64, PendingCommand>>>;
type Subscribers = Arc<Mutex<Vec<mpsc::UnboundedSender<CdpEvent>>>>;

/// Per-command response timeouts
#[derive(Debug, Clone)]
struct CdpTimeoutConfig {
    /// Default timeout for most commands
    default_timeout: Duration,
    /// Timeout for page navigation commands
    navigation_timeout: Duration,
    /// Timeout for JavaScript execution
    execution_timeout: Duration,
}

impl Default for CdpTimeoutConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(30),
            navigation_timeout: Duration::from_secs(60),
            execution_timeout: Duration::from_secs(30),
        }
    }
}

impl CdpTimeoutConfig {
    fn timeout_for(&self, method: &str) -> Duration {
        if method.starts_with("Page.navigate") || method.starts_with("Page.reload") {
            self.navigation_timeout
        } else if method.starts_with("Runtime.") {
            self.execution_timeout
        } else {
            self.default_timeout
        }
    }
}

/// Command waiting for its response
#[derive(Debug)]
struct PendingCommand {
    sender: oneshot::Sender<CdpResponse>,
    method: String,
}

/// CDP WebSocket connection implementation
#[derive(Debug)]
pub struct CdpWebSocketConnection {
    /// WebSocket URL
    url: String,
    /// Write half of the socket
    sink: Mutex<SplitSink<WsStream, Message>>,
    /// Next command ID
    next_id: AtomicU64,
    /// Pending commands (ID -> response sender)
    pending: PendingMap,
    /// Event subscribers
    subscribers: Subscribers,
    /// Cleared when the socket closes
    active: Arc<AtomicBool>,
    timeouts: CdpTimeoutConfig,
}

impl CdpWebSocketConnection {
    /// Connect to a target
    ///
    /// # Arguments
    /// * `url` - WebSocket URL (e.g., "ws://localhost:9222/devtools/page/ABC123")
    pub async fn new<S: Into<String>>(url: S) -> Result<Arc<Self>, Error> {
        let url = url.into();
        info!("Connecting to CDP target {}", url);

        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| Error::websocket(format!("Failed to connect to {}: {}", url, e)))?;
        let (sink, stream) = ws_stream.split();

        let connection = Arc::new(Self {
            url,
            sink: Mutex::new(sink),
            next_id: AtomicU64::new(1),
            pending: Arc::new(Mutex::new(HashMap::new())),
            subscribers: Arc::new(Mutex::new(Vec::new())),
            active: Arc::new(AtomicBool::new(true)),
            timeouts: CdpTimeoutConfig::default(),
        });

        let pending = Arc::clone(&connection.pending);
        let subscribers = Arc::clone(&connection.subscribers);
        let active = Arc::clone(&connection.active);
        tokio::spawn(async move {
            if let Err(e) = Self::read_loop(stream, &pending, &subscribers).await {
                error!("CDP read loop error: {}", e);
            }
            active.store(false, Ordering::SeqCst);
            // Dropping the senders wakes every waiter with a closed channel
            pending.lock().await.clear();
            subscribers.lock().await.clear();
            debug!("CDP read loop exited");
        });

        Ok(connection)
    }

    /// WebSocket URL of the target
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn read_loop(
        mut stream: SplitStream<WsStream>,
        pending: &PendingMap,
        subscribers: &Subscribers,
    ) -> Result<(), Error> {
        while let Some(message) = stream.next().await {
            match message {
                Ok(Message::Text(text)) => Self::dispatch(&text, pending, subscribers).await,
                Ok(Message::Close(_)) => {
                    info!("WebSocket close frame received");
                    break;
                }
                Ok(_) => {}
                Err(e) => return Err(Error::websocket(e.to_string())),
            }
        }
        Ok(())
    }

    /// Route one incoming frame
    async fn dispatch(text: &str, pending: &PendingMap, subscribers: &Subscribers) {
        if let Ok(response) = serde_json::from_str::<CdpRpcResponse>(text) {
            match pending.lock().await.remove(&response.id) {
                Some(command) => {
                    debug!("Response for command {} ({})", response.id, command.method);
                    let _ = command.sender.send(CdpResponse {
                        id: response.id,
                        result: Some(response.result),
                        error: response.error.map(|e| CdpErrorResponse {
                            code: e.code,
                            message: e.message,
                            data: e.data,
                        }),
                    });
                }
                None => warn!("Received response for unknown command ID: {}", response.id),
            }
            return;
        }

        if let Ok(notification) = serde_json::from_str::<CdpNotification>(text) {
            let event = CdpEvent {
                method: notification.method,
                params: notification.params,
                session_id: notification.session_id,
            };
            subscribers
                .lock()
                .await
                .retain(|sender| sender.send(event.clone()).is_ok());
            return;
        }

        warn!("Unknown message format: {}", text);
    }
}

#[async_trait]
impl CdpConnection for CdpWebSocketConnection {
    async fn send_command(&self, method: &str, params: serde_json::Value) -> Result<CdpResponse, Error> {
        if !self.is_active() {
            return Err(Error::websocket("Connection is not active"));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = CdpRequest {
            id,
            method: method.to_string(),
            params: if params.is_null() { None } else { Some(params) },
            session_id: None,
        };
        let json = serde_json::to_string(&request)?;
        debug!("Sending CDP command {}: {}", id, method);

        let (sender, receiver) = oneshot::channel();
        self.pending.lock().await.insert(
            id,
            PendingCommand {
                sender,
                method: method.to_string(),
            },
        );

        let sent = self.sink.lock().await.send(Message::Text(json)).await;
        if let Err(e) = sent {
            self.pending.lock().await.remove(&id);
            return Err(Error::websocket(format!("Failed to send message: {}", e)));
        }

        match tokio::time::timeout(self.timeouts.timeout_for(method), receiver).await {
            Ok(Ok(response)) => match &response.error {
                Some(error) => Err(Error::cdp(format!(
                    "{} (code: {}){}",
                    error.message,
                    error.code,
                    error.data.as_ref().map_or(String::new(), |d| format!(" {}", d))
                ))),
                None => Ok(response),
            },
            Ok(Err(_)) => Err(Error::websocket(format!(
                "Connection closed before command {} ({}) completed",
                id, method
            ))),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                Err(Error::timeout(format!("Command {} ({}) timed out", id, method)))
            }
        }
    }

    async fn listen_events(&self) -> Result<mpsc::Receiver<CdpEvent>, Error> {
        let (sender, receiver) = mpsc::channel(100);
        let (unbounded_sender, mut unbounded_receiver) = mpsc::unbounded_channel();

        self.subscribers.lock().await.push(unbounded_sender);

        tokio::spawn(async move {
            while let Some(event) = unbounded_receiver.recv().await {
                if sender.send(event).await.is_err() {
                    break;
                }
            }
        });

        Ok(receiver)
    }

    async fn close(&self) -> Result<(), Error> {
        info!("Closing CDP WebSocket connection to {}", self.url);

        if !self.active.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        self.sink
            .lock()
            .await
            .close()
            .await
            .map_err(|e| Error::websocket(format!("Failed to close WebSocket: {}", e)))
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_selection_by_method() {
        let timeouts = CdpTimeoutConfig::default();

        assert_eq!(timeouts.timeout_for("Page.navigate"), Duration::from_secs(60));
        assert_eq!(timeouts.timeout_for("Runtime.callFunctionOn"), Duration::from_secs(30));
        assert_eq!(timeouts.timeout_for("Browser.getVersion"), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_connect_to_closed_port_fails() {
        let result = CdpWebSocketConnection::new("ws://127.0.0.1:1/devtools/page/none").await;

        assert!(matches!(result, Err(Error::WebSocket(_))));
    }
}
